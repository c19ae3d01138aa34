//! Library interface for sqirvy-cli
//!
//! Prompt assembly, configuration layering and query execution behind the
//! `sqirvy-cli` binary. Exposed as a library so the pieces can be tested
//! without spawning the binary.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        reason = "Allow for tests"
    )
)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod execute;
pub mod input;

pub use commands::{Mode, format_model_list};
pub use config::Config;
pub use execute::execute_query;
pub use input::{HtmlScraper, PageScraper, PromptAssembler};
