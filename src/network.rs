use std::error::Error;
use std::fmt;

pub mod api;
pub mod dto;
pub mod gateway;

pub use api::DonmaniApi;
pub use gateway::Gateway;

/// Failures of the remote JSON gateway. There are no retries; callers decide
/// whether to surface or swallow them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    InvalidUrlString,
    EncodingFailed,
    DecodingFailed,
    RequestFailed,
    ServerError { status_code: u16 },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::InvalidUrlString => write!(f, "invalid request URL"),
            NetworkError::EncodingFailed => write!(f, "failed to encode request body"),
            NetworkError::DecodingFailed => write!(f, "failed to decode response body"),
            NetworkError::RequestFailed => write!(f, "request failed before a response arrived"),
            NetworkError::ServerError { status_code } => {
                write!(f, "server responded with status {}", status_code)
            }
        }
    }
}

impl Error for NetworkError {}
