//! MathGenius - Socratic math tutor CLI
//!
#![doc = "MathGenius - Socratic math tutor CLI"]
#![doc = "Main entry point for the MathGenius application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mathgenius::cli::{Cli, Commands};
use mathgenius::commands;
use mathgenius::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { grade, attach } => {
            if let Some(g) = grade {
                tracing::debug!("Using grade override: {}", g);
            }
            if let Some(path) = &attach {
                tracing::debug!("Attaching to first message: {}", path.display());
            }

            // Moves `config` into the handler (match arms are exclusive)
            commands::chat::run_chat(config, grade, attach).await?;
            Ok(())
        }
        Commands::Ask {
            grade,
            attach,
            text,
        } => {
            tracing::info!("Asking a single question");
            commands::ask::run_ask(config, grade, attach, text).await?;
            Ok(())
        }
        Commands::Practice { grade, topic } => {
            tracing::info!("Generating a practice problem");
            commands::practice::run_practice(config, grade, topic).await?;
            Ok(())
        }
        Commands::Check {
            grade,
            problem,
            answer,
        } => {
            tracing::info!("Checking a practice answer");
            commands::check::run_check(config, grade, problem, answer).await?;
            Ok(())
        }
        Commands::Grades => {
            commands::grades::list_grades()?;
            Ok(())
        }
        Commands::Render { mode, text } => {
            commands::render::run_render(&config, mode, &text)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with env filter
///
/// Logs go to stderr so rendered replies on stdout stay clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "mathgenius=debug"
    } else {
        "mathgenius=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
