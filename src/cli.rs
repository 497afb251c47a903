use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Front-end for the TestOps test-generation service.
///
/// Settings come from `--config`, then `TESTOPS_BASE_URL` /
/// `TESTOPS_TIMEOUT_SECS`, then the flags below.
#[derive(Parser, Debug)]
#[command(name = "testops-copilot", version, disable_help_subcommand = true)]
pub struct Cli
{   /// JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>
  , /// Generation service base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>
  , /// Debug logging (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    pub verbose: bool
  , #[command(subcommand)]
    pub command: Command
}

#[derive(Subcommand, Debug)]
pub enum Command
{   /// List the available generation modes
    Modes
  , /// Check whether the generation service is reachable
    Check
  , /// Run one generation and print the result
    Generate
    {   /// Mode id (unknown ids fall back to manual-ui)
        #[arg(short, long, default_value = "manual-ui")]
        mode: String
      , /// Requirement text
        #[arg(short, long, conflicts_with = "file")]
        prompt: Option<String>
      , /// Read the requirement from a .yaml, .yml or .txt file
        #[arg(short, long)]
        file: Option<PathBuf>
      , /// Also write the generated code to this file
        #[arg(short, long)]
        output: Option<PathBuf>
    }
  , /// Interactive session
    ///
    /// Lines starting with ':' are commands (:help lists them);
    /// any other line replaces the requirement text.
    Shell
}
