//! Command-line interface definition for MathGenius
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive tutoring, one-shot questions,
//! practice problems and offline math rendering.

use crate::config::MathOutputMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MathGenius - Socratic math tutor for grades 6 to 9
///
/// Relays questions to a hosted model under a grade-scoped tutoring
/// prompt and renders the math in the replies.
#[derive(Parser, Debug, Clone)]
#[command(name = "mathgenius")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the model from config
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for MathGenius
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive tutoring session
    Chat {
        /// Grade to start with (6-9); defaults to the configured grade
        #[arg(short, long)]
        grade: Option<u8>,

        /// File attached to the first message
        #[arg(short, long)]
        attach: Option<PathBuf>,
    },

    /// Ask a single tutoring question
    Ask {
        /// Grade of the student (6-9)
        #[arg(short, long)]
        grade: Option<u8>,

        /// Image or document sent with the question
        #[arg(short, long)]
        attach: Option<PathBuf>,

        /// The question
        text: String,
    },

    /// Generate one practice problem
    Practice {
        /// Grade of the student (6-9)
        #[arg(short, long)]
        grade: Option<u8>,

        /// Topic name from the grade's topic list
        #[arg(short, long)]
        topic: Option<String>,
    },

    /// Check an answer to a practice problem
    Check {
        /// Grade of the student (6-9)
        #[arg(short, long)]
        grade: Option<u8>,

        /// Problem text
        #[arg(short, long)]
        problem: String,

        /// Student's answer
        #[arg(short, long)]
        answer: String,
    },

    /// List grades and their topics
    Grades,

    /// Render math markup without contacting the model
    Render {
        /// Output mode; defaults to the configured mode
        #[arg(long, value_enum)]
        mode: Option<MathOutputMode>,

        /// Text containing $...$ or $$...$$ segments
        text: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            model: None,
            command: Commands::Grades,
        }
    }
}
