//! Special commands parser for the interactive tutoring session
//!
//! Special commands let the student change grade, pick a practice topic,
//! work a practice problem, manage the pending attachment, and inspect the
//! session without sending anything to the tutor.
//!
//! Commands are prefixed with `/`. The command word is case-insensitive;
//! arguments keep their original case.

use crate::curriculum::GradeLevel;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during an interactive session
///
/// These commands change the session state or print information, rather
/// than being sent to the tutor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Display help information
    Help,

    /// Switch grade and reset the conversation
    SelectGrade(GradeLevel),

    /// List all grades with their subtitles
    ListGrades,

    /// List the practice topics of the current grade
    ListTopics,

    /// Choose the practice topic by name
    SelectTopic(String),

    /// Generate a new practice problem
    NewProblem,

    /// Submit an answer for the current practice problem
    Answer(String),

    /// Attach a file to the next message
    Attach(PathBuf),

    /// Drop the pending attachment
    Detach,

    /// Print the conversation log
    History,

    /// Show session status
    Status,

    /// Exit the session
    Exit,

    /// Not a special command (regular message for the tutor)
    None,
}

/// Splits `input` into a lowercase command word and the untouched remainder
fn split_command(input: &str) -> (String, &str) {
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (input.to_lowercase(), ""),
    }
}

fn require_argument<'a>(command: &str, usage: &str, arg: &'a str) -> Result<&'a str, CommandError> {
    if arg.is_empty() {
        Err(CommandError::MissingArgument {
            command: command.to_string(),
            usage: usage.to_string(),
        })
    } else {
        Ok(arg)
    }
}

fn reject_argument(command: &str, arg: &str) -> Result<(), CommandError> {
    if arg.is_empty() {
        Ok(())
    } else {
        Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        })
    }
}

/// Parse user input to detect special commands
///
/// # Arguments
///
/// * `input` - The user input string to parse
///
/// # Returns
///
/// Returns Ok(SpecialCommand) if the input is a valid command or a regular
/// message, or Err(CommandError) if it starts with `/` but is not valid.
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if the command word is not recognized.
/// Returns CommandError::UnsupportedArgument if an argument is invalid.
/// Returns CommandError::MissingArgument if a required argument is missing.
///
/// # Examples
///
/// ```
/// use mathgenius::commands::special_commands::{parse_special_command, SpecialCommand};
/// use mathgenius::curriculum::GradeLevel;
///
/// let cmd = parse_special_command("/grade 8").unwrap();
/// assert_eq!(cmd, SpecialCommand::SelectGrade(GradeLevel::Grade8));
///
/// let cmd = parse_special_command("Tìm x biết x + 5 = 3").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (command, arg) = split_command(trimmed);
    match command.as_str() {
        "/help" | "/?" => {
            reject_argument("/help", arg)?;
            Ok(SpecialCommand::Help)
        }
        "/grade" => {
            let arg = require_argument("/grade", "/grade <6|7|8|9>", arg)?;
            arg.parse::<GradeLevel>()
                .map(SpecialCommand::SelectGrade)
                .map_err(|_| CommandError::UnsupportedArgument {
                    command: "/grade".to_string(),
                    arg: arg.to_string(),
                })
        }
        "/grades" => {
            reject_argument("/grades", arg)?;
            Ok(SpecialCommand::ListGrades)
        }
        "/topics" => {
            reject_argument("/topics", arg)?;
            Ok(SpecialCommand::ListTopics)
        }
        "/topic" => {
            let arg = require_argument("/topic", "/topic <topic name>", arg)?;
            Ok(SpecialCommand::SelectTopic(arg.to_string()))
        }
        "/problem" | "/new" => {
            reject_argument(&command, arg)?;
            Ok(SpecialCommand::NewProblem)
        }
        "/answer" => {
            let arg = require_argument("/answer", "/answer <your answer>", arg)?;
            Ok(SpecialCommand::Answer(arg.to_string()))
        }
        "/attach" => {
            let arg = require_argument("/attach", "/attach <path>", arg)?;
            Ok(SpecialCommand::Attach(PathBuf::from(arg)))
        }
        "/detach" => {
            reject_argument("/detach", arg)?;
            Ok(SpecialCommand::Detach)
        }
        "/history" => {
            reject_argument("/history", arg)?;
            Ok(SpecialCommand::History)
        }
        "/status" => {
            reject_argument("/status", arg)?;
            Ok(SpecialCommand::Status)
        }
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Display help information for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Tutoring
=========================================

GRADE & CURRICULUM:
  /grade <6-9>    - Switch grade (clears the conversation)
  /grades         - List all grades
  /topics         - List practice topics for the current grade

PRACTICE:
  /topic <name>   - Choose the practice topic (e.g. /topic Số nguyên)
  /problem        - Generate a new practice problem
  /new            - Same as /problem
  /answer <text>  - Submit an answer for the current problem

ATTACHMENTS:
  /attach <path>  - Attach an image or document to the next message
  /detach         - Drop the pending attachment

SESSION:
  /history        - Show the conversation so far
  /status         - Show grade, topic, model and who is online
  /help           - Show this help message
  /exit, exit     - Exit the session

Anything else is sent to the tutor. Math between $...$ or $$...$$ is
rendered in the terminal.
"#
    );
}
