//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - generate: run the refinement pipeline over a discovery document
//! - sample: print the built-in discovery record
//! - prompts: print the prompt templates in use

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use sdrgen::prompt::PromptKind;

/// sdrgen - BRD/SDR generator for analytics tagging projects
#[derive(Parser, Debug)]
#[command(name = "sdrgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a BRD/SDR from a discovery document
    #[command(group(ArgGroup::new("source").required(true).args(["input", "sample"])))]
    Generate {
        /// Discovery document (.json is read as a structured record, anything else as text)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Use the built-in e-commerce discovery record
        #[arg(short, long)]
        sample: bool,

        /// Directory for the run artifacts, overriding the config
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Do not write run artifacts
        #[arg(long)]
        no_save: bool,
    },

    /// Print the built-in sample discovery record as JSON
    Sample,

    /// Print prompt templates
    Prompts {
        /// Only this stage (analysis, reasoning, generation, validation, revision)
        stage: Option<PromptKind>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["sdrgen"]).is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["sdrgen", "-v", "sample"]).unwrap();
        assert!(cli.is_verbose());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["sdrgen", "sample", "-c", "/path/to/sdrgen.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/sdrgen.yml")));
    }

    #[test]
    fn test_generate_requires_a_source() {
        assert!(Cli::try_parse_from(["sdrgen", "generate"]).is_err());
        assert!(Cli::try_parse_from(["sdrgen", "generate", "--no-save"]).is_err());
    }

    #[test]
    fn test_generate_sample() {
        let cli = Cli::try_parse_from(["sdrgen", "generate", "--sample"]).unwrap();
        match cli.command {
            Commands::Generate {
                input,
                sample,
                output_dir,
                no_save,
            } => {
                assert!(input.is_none());
                assert!(sample);
                assert!(output_dir.is_none());
                assert!(!no_save);
            }
            _ => panic!("Expected generate command"),
        }
    }

    #[test]
    fn test_generate_with_input() {
        let cli = Cli::try_parse_from([
            "sdrgen",
            "generate",
            "-i",
            "discovery.json",
            "-o",
            "out",
            "--no-save",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                input,
                output_dir,
                no_save,
                ..
            } => {
                assert_eq!(input, Some(PathBuf::from("discovery.json")));
                assert_eq!(output_dir, Some(PathBuf::from("out")));
                assert!(no_save);
            }
            _ => panic!("Expected generate command"),
        }
    }

    #[test]
    fn test_generate_input_conflicts_with_sample() {
        let result = Cli::try_parse_from(["sdrgen", "generate", "--sample", "--input", "d.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_prompts_command() {
        let cli = Cli::try_parse_from(["sdrgen", "prompts"]).unwrap();
        assert!(matches!(cli.command, Commands::Prompts { stage: None }));

        let cli = Cli::try_parse_from(["sdrgen", "prompts", "validation"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Prompts {
                stage: Some(PromptKind::Validation)
            }
        ));
    }

    #[test]
    fn test_prompts_unknown_stage() {
        assert!(Cli::try_parse_from(["sdrgen", "prompts", "summary"]).is_err());
    }

    #[test]
    fn test_help_works() {
        Cli::command().debug_assert();
    }
}
