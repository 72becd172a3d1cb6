#![allow(unreachable_pub)]

mod error;
mod request;
mod result;

pub use error::ErrorKind;
pub use request::{DEFAULT_METHOD, Request};
pub use result::FetchResult;

/// The fetchall `Result` type
pub type Result<T> = std::result::Result<T, ErrorKind>;
