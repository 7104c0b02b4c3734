//! magickit: execution results, logging setup, call wrappers and everyday
//! helpers.
//!
//! The centre of the crate is [`Response`], which runs a callable, times it
//! and turns any failure (an `Err` or a panic) into data.

pub mod config;
pub mod decorate;
pub mod error;
pub mod logger;
pub mod printer;
pub mod response;
pub mod tools;

pub use config::Config;
pub use decorate::{Catch, Retry};
pub use error::{MagicError, Result};
pub use logger::{LogConfig, LogFormat};
pub use response::{ErrorInfo, Invoke, Response, ResponseRecord};
