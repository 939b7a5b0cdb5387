pub mod client;
pub mod response;

pub use client::{FmcsaClient, FmcsaError};
pub use response::{interpret_response, UNAVAILABLE_MESSAGE};
