// Library for the publish binary and tests

pub mod collector;
pub mod config;
pub mod decimal;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod sender;
pub mod transport;
pub mod version;

pub use error::{Error, Result};
