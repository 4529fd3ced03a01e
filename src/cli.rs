// src/cli.rs
//! CLI definitions for the cooker
//!
//! Command bodies live in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cooker")]
#[command(author, version)]
#[command(about = "Incremental content cooker for game assets", long_about = None)]
pub struct Cli {
    /// Path to cooker.toml (default: ./cooker.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Target platform: PC, IOS, Android or Linux
    #[arg(long, global = true, default_value = "PC")]
    pub platform: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cook all out of date content, or a single file
    Cook(CookArgs),

    /// List content whose cooked output is out of date
    Status {
        /// Only report this file type (e.g. Script, Texture0, UiMovie)
        #[arg(long = "type")]
        file_type: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
pub struct CookArgs {
    /// Cook only this file (content-relative, or a path under the source
    /// or content directory)
    #[arg(long)]
    pub out_file: Option<String>,

    /// Package configuration handed to tasks
    #[arg(long)]
    pub package_file: Option<PathBuf>,

    /// Keep debug information in cooked output
    #[arg(long)]
    pub debug_only: bool,

    /// Local cook: do not sync generated content first
    #[arg(long)]
    pub local: bool,

    /// Regenerate compression dictionaries even if they exist
    #[arg(long = "force-gen-cdict")]
    pub force_gen_cdict: bool,

    /// Changelist for depot add/edit/delete (must exist)
    #[arg(long)]
    pub p4_change: Option<u32>,

    /// Workspace name for depot operations
    #[arg(long)]
    pub p4_client: Option<String>,

    /// Server for depot operations (e.g. perforce:1666)
    #[arg(long)]
    pub p4_port: Option<String>,

    /// User for depot operations
    #[arg(long)]
    pub p4_user: Option<String>,

    /// Fail unless the built-in cooker version matches
    #[arg(long)]
    pub cooker_version: Option<u32>,

    /// Fail unless the single-cook file type's data version matches
    #[arg(long)]
    pub data_version: Option<u32>,
}

impl CookArgs {
    /// True if any depot flag was given
    pub fn has_perforce_args(&self) -> bool {
        self.p4_change.is_some() || self.p4_client.is_some() || self.p4_port.is_some() || self.p4_user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_single_cook() {
        let cli = Cli::try_parse_from([
            "cooker",
            "--platform",
            "IOS",
            "cook",
            "--out-file",
            "Scripts/Main.lua",
            "--debug-only",
            "--data-version",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.platform, "IOS");
        match cli.command {
            Commands::Cook(args) => {
                assert_eq!(args.out_file.as_deref(), Some("Scripts/Main.lua"));
                assert!(args.debug_only);
                assert_eq!(args.data_version, Some(7));
                assert!(!args.has_perforce_args());
            }
            Commands::Status { .. } => panic!("expected cook"),
        }
    }

    #[test]
    fn test_parse_status() {
        let cli = Cli::try_parse_from(["cooker", "status", "--type", "Script", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Status { file_type: Some(ref t) } if t == "Script"));
    }
}
