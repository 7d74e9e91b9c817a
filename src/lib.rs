//! MathGenius - Socratic math tutor for Vietnamese lower-secondary students
//!
//! This library relays a student's questions, attachments and practice
//! answers to a hosted Gemini model, wrapped in a grade-specific tutoring
//! prompt, and renders the math in the replies for a terminal.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `curriculum`: Grades 6-9, their topics and allowed/denied concepts
//! - `prompts`: System prompts and request text for each operation
//! - `moderation`: Local wording filter applied before any request
//! - `attachment`: Reading files into inline base64 payloads
//! - `providers`: Provider abstraction and the Gemini implementation
//! - `gateway`: Tutoring, problem generation and answer checking with fallbacks
//! - `session`: Per-student conversation and practice state
//! - `math_markup`: Splitting and typesetting `$...$` / `$$...$$` spans
//! - `presence`: Cosmetic "students online" counter
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use mathgenius::{Config, ModelGateway};
//! use mathgenius::curriculum::GradeLevel;
//! use mathgenius::providers::create_provider;
//! use mathgenius::session::{TurnOutcome, TutorSession};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let gateway = ModelGateway::new_boxed(create_provider(&config.provider)?, config.tutor.sampling);
//!     let mut session = TutorSession::new(GradeLevel::Grade6, config.tutor.max_attachment_bytes);
//!     if let TurnOutcome::Replied(reply) = session.send(&gateway, "Tìm x biết x + 5 = 3", None).await {
//!         println!("{}", reply.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod attachment;
pub mod cli;
pub mod commands;
pub mod config;
pub mod curriculum;
pub mod error;
pub mod gateway;
pub mod math_markup;
pub mod moderation;
pub mod presence;
pub mod prompts;
pub mod providers;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use curriculum::{GradeLevel, Topic};
pub use error::{MathGeniusError, Result};
pub use gateway::ModelGateway;
pub use session::TutorSession;

#[cfg(test)]
pub mod test_utils;
