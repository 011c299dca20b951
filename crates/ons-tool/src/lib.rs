//! Command-line inspector for ONScripter games.
//!
//! The tool opens a game directory the way the interpreter does and
//! reports what it finds:
//! - `list`: archives of the resolved chain and their directories
//! - `length` / `extract`: asset lookups through the chain
//! - `pack`: build SAR, NSA or NS2 archives from loose files
//! - `saves` / `save-info`: save slot listings and headers
//! - `config`: the effective configuration as JSON
//!
//! # Example
//!
//! ```no_run
//! use ons_tool::{ToolConfig, run};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ToolConfig::from_args();
//!     config.validate()?;
//!     run(&config, &mut std::io::stdout().lock())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod commands;
pub mod config;
pub mod error;

pub use commands::run;
pub use config::{Command, PackKind, ToolConfig};
pub use error::{CommandError, ConfigError};
