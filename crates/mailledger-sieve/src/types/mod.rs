//! Core ManageSieve types.

mod capabilities;
mod response;
mod response_code;
mod script;

pub use capabilities::Capabilities;
pub use response::{Response, Status};
pub use response_code::ResponseCode;
pub use script::{Script, ScriptName};

pub(crate) use script::validate_quotable;
