//! CLI module for sdrgen - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
