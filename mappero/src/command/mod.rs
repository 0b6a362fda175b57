//! Command construction for external reconstruction tools.
//!
//! This module contains:
//! - Typed parameter values and the ordered stage parameter set
//! - The command type handed to the process runner
//! - The builder that turns parameters into `--key value` tokens

mod builder;
mod params;

pub use builder::{build_command, Command};
pub use params::{ParamValue, StageParameters};
