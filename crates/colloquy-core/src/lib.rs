// Live-session coordination without transport or UI dependencies

pub mod client;
pub mod config;
pub mod error;
pub mod live;
pub mod mediator;
pub mod test_utils;
pub mod transcript;
pub mod utils;

pub use error::{Error, Result};
