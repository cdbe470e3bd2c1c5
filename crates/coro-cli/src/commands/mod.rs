//! CLI command implementations.

pub mod common;
pub mod compare;
pub mod generate;
pub mod info;
pub mod params;
pub mod pitch;
pub mod process;
