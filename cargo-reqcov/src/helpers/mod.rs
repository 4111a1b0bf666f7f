//! Helper modules for cargo-reqcov command implementations
//!
//! Common functionality shared by the command handlers: global argument
//! handling, configuration merging and terminal output.

pub mod config;
pub mod global_args;
pub mod output;

pub use config::{
    merge_thresholds,
    resolve_out_dir,
};
pub use global_args::GlobalArgs;
pub use output::OutputManager;
