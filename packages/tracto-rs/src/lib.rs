pub mod carbon;
pub mod config;
pub mod docker;
pub mod error;
pub mod flows;
pub mod gradients;
pub mod interfaces;
pub mod tools;
pub mod workflow;

pub use config::*;
pub use error::{Result, TractoError};
pub use workflow::{Interface, PortMap, PortValue, Workflow};
