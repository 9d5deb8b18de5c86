//! sdrgen - BRD/SDR generation for analytics tagging projects
//!
//! Turns a business requirements discovery document into a Business
//! Requirements Document / Solution Design Reference by running a fixed chain
//! of LLM prompts (analyze, reason, generate, validate) with a quality gate
//! that can send the draft through a revision pass.

pub mod config;
pub mod discovery;
pub mod error;
pub mod llm;
pub mod output;
pub mod prompt;
pub mod refine;

pub use error::{Result, SdrError};
