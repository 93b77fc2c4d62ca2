#![allow(clippy::expect_used, clippy::doc_markdown, clippy::uninlined_format_args)]
//! Example: Walk through a ManageSieve session
//!
//! Connects, upgrades with STARTTLS, logs in with SASL PLAIN, lists the
//! stored scripts, asks whether a 4 KiB script would fit and logs out.
//!
//! ## Running
//!
//! ```bash
//! SIEVER_SERVER=mail.example.com \
//! SIEVER_USERNAME=user@example.com \
//! SIEVER_PASSWORD=secret \
//! RUST_LOG=mailledger_sieve=debug,mailledger_sieve::wire=trace \
//! cargo run --package mailledger-sieve --example siever
//! ```
//!
//! `SIEVER_PORT` overrides the default port 4190.

use std::env;

use mailledger_sieve::{Client, Config, DEFAULT_PORT};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let server = env::var("SIEVER_SERVER").expect("SIEVER_SERVER must be set");
    let username = env::var("SIEVER_USERNAME").expect("SIEVER_USERNAME must be set");
    let password = env::var("SIEVER_PASSWORD").expect("SIEVER_PASSWORD must be set");
    let port = match env::var("SIEVER_PORT") {
        Ok(port) => port.parse()?,
        Err(_) => DEFAULT_PORT,
    };

    println!("Connecting to {}:{}...", server, port);
    let config = Config::builder(&server).port(port).build();
    let mut client = Client::connect(&config).await?;
    println!("✓ Connected ({})", client.capabilities().implementation);

    let result = run(&mut client, &username, &password).await;
    client.close().await;
    result
}

async fn run(
    client: &mut Client<mailledger_sieve::SieveStream>,
    username: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let message = client.start_tls().await?;
    println!("✓ STARTTLS: {}", message);

    let message = client.capability().await?;
    println!("✓ CAPABILITY: {}", message);
    println!("  SASL: {:?}", client.capabilities().sasl_mechanisms);

    let message = client.login(username, password).await?;
    println!("✓ Logged in: {}", message);

    let message = client.capability().await?;
    println!("✓ CAPABILITY: {}", message);
    println!("  Sieve extensions: {}", client.capabilities().sieve_extensions.join(" "));

    let (scripts, _) = client.list_scripts().await?;
    println!("Scripts:");
    for script in &scripts {
        let marker = if script.active { " (active)" } else { "" };
        println!("  - {}{}", script.name, marker);
    }

    match client.have_space("test3", 4096).await {
        Ok(message) => println!("✓ HAVESPACE: {}", message),
        Err(e) if e.is_command_failure() => println!("✗ HAVESPACE: {}", e),
        Err(e) => return Err(e.into()),
    }

    let message = client.logout().await?;
    println!("✓ Logged out: {}", message);
    Ok(())
}
