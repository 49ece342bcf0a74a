pub mod cluster;
pub mod compute;
pub mod config;
pub mod error;
pub mod pod;
pub mod source;
pub mod volume;

pub use self::error::{Result, TemplateError};
