//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Command-line arguments for sqirvy-cli.
#[derive(Debug, Parser)]
#[command(name = "sqirvy-cli", version)]
#[command(about = "Send prompts from stdin, files and URLs to a large language model")]
#[command(
    long_about = "Send prompts from stdin, files and URLs to a large language model.\n\n\
    Usage: stdin | sqirvy-cli [command] [flags] [files| urls]\n\n\
    Without a command the input is sent as a general query."
)]
pub struct Cli {
    /// Flags shared by every command.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Command to run; defaults to `query`.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Files or URLs to include when no command is given.
    #[arg(value_name = "FILES|URLS")]
    pub inputs: Vec<String>,
}

impl Cli {
    /// Returns the command to run, treating a bare invocation as `query`.
    #[must_use]
    pub fn into_command(self) -> (GlobalArgs, Commands) {
        let command = self.command.unwrap_or(Commands::Query {
            inputs: self.inputs,
        });
        (self.global, command)
    }
}

/// Flags accepted before or after any command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// LLM model to use
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// LLM temperature to use (0.0 to 1.0)
    #[arg(short, long, global = true)]
    pub temperature: Option<f32>,

    /// Config file (default is $HOME/.config/sqirvy-cli/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Prompt sent when no stdin, file or URL input is given
    #[arg(long, global = true, value_name = "TEXT")]
    pub default_prompt: Option<String>,
}

/// Subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Execute a general query against the LLM
    Query {
        /// Files or URLs to include.
        #[arg(value_name = "FILES|URLS")]
        inputs: Vec<String>,
    },

    /// Generate a plan for the request
    Plan {
        /// Files or URLs to include.
        #[arg(value_name = "FILES|URLS")]
        inputs: Vec<String>,
    },

    /// Generate source code for the request
    Code {
        /// Files or URLs to include.
        #[arg(value_name = "FILES|URLS")]
        inputs: Vec<String>,
    },

    /// Review code from stdin, files and URLs
    Review {
        /// Files or URLs to include.
        #[arg(value_name = "FILES|URLS")]
        inputs: Vec<String>,
    },

    /// List the supported models and their providers
    Models,

    /// Print the version
    Version,
}
