//! Everyday helpers: text checks, time, JSON, files, commands, hashing,
//! URLs, platform facts and address parsing.

pub mod address;
pub mod command;
pub mod encode;
pub mod file;
pub mod json;
pub mod system;
pub mod text;
pub mod time;
pub mod url;

pub use address::Address;
pub use command::{execute_checked, execute_command, CommandOutput};
