/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `chat`     - Interactive tutoring session
- `ask`      - One tutoring question
- `practice` - Generate one practice problem
- `check`    - Check an answer to a practice problem
- `grades`   - List grades and topics
- `render`   - Render math markup offline

The handlers are thin; the tutoring behavior lives in `session` and
`gateway`.
*/

use crate::config::{Config, MathOutputMode};
use crate::curriculum::GradeLevel;
use crate::error::{MathGeniusError, Result};
use crate::gateway::ModelGateway;
use crate::math_markup::MathRenderer;
use crate::providers::create_provider;

// Special commands parser for the interactive session
pub mod special_commands;

/// Grade from the command line, or the configured default
fn resolve_grade(config: &Config, grade: Option<u8>) -> Result<GradeLevel> {
    match grade {
        Some(number) => GradeLevel::from_number(number),
        None => config.tutor.grade(),
    }
}

/// Builds the gateway over the configured provider
fn build_gateway(config: &Config) -> Result<ModelGateway> {
    let has_key = config
        .provider
        .gemini
        .api_key
        .as_deref()
        .is_some_and(|key| !key.trim().is_empty());
    if !has_key {
        tracing::warn!("No API key configured; set GEMINI_API_KEY or every reply will be a fallback");
    }

    let provider = create_provider(&config.provider)?;
    Ok(ModelGateway::new_boxed(provider, config.tutor.sampling))
}

// Interactive tutoring handler
pub mod chat {
    //! Interactive tutoring session.
    //!
    //! Creates the gateway, a [`TutorSession`] and the math renderer, then
    //! runs a readline loop. Lines starting with `/` are special commands;
    //! everything else goes to the tutor.

    use super::*;
    use crate::attachment::AttachmentDescriptor;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::moderation;
    use crate::presence;
    use crate::session::{ChatMessage, MessageRole, SendOutcome, TutorSession};
    use colored::Colorize;
    use futures::FutureExt;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::any::Any;
    use std::io::Write;
    use std::panic::AssertUnwindSafe;
    use std::path::PathBuf;
    use tokio::sync::watch;

    /// Shown when handling a line fails unexpectedly
    pub const RESTART_BANNER: &str = "Giao diện gặp sự cố. Vui lòng khởi động lại hệ thống.";

    /// What the loop does after a line
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum LineOutcome {
        Continue,
        Exit,
    }

    /// Everything one interactive session needs
    struct ChatContext {
        session: TutorSession,
        gateway: ModelGateway,
        renderer: MathRenderer,
        online: watch::Receiver<u32>,
        attachment: Option<PathBuf>,
        math_output: MathOutputMode,
    }

    /// Start an interactive tutoring session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `grade` - Optional starting grade; defaults to the configured grade
    /// * `attach` - Optional file attached to the first message
    ///
    /// # Errors
    ///
    /// Returns error if the grade is invalid, the provider cannot be created,
    /// or the terminal editor cannot start.
    pub async fn run_chat(
        config: Config,
        grade: Option<u8>,
        attach: Option<PathBuf>,
    ) -> Result<()> {
        tracing::info!("Starting interactive tutoring session");

        let grade = resolve_grade(&config, grade)?;
        let gateway = build_gateway(&config)?;
        let (renderer, _loader) = MathRenderer::spawn_load(config.tutor.math_output);
        let (online, ticker) = presence::spawn_ticker(presence::TICK_PERIOD);

        let mut ctx = ChatContext {
            session: TutorSession::new(grade, config.tutor.max_attachment_bytes),
            gateway,
            renderer,
            online,
            attachment: attach,
            math_output: config.tutor.math_output,
        };

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&ctx);
        print_latest(&ctx);

        loop {
            let prompt = format_prompt(&ctx);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() && ctx.attachment.is_none() {
                        continue;
                    }
                    if !trimmed.is_empty() {
                        rl.add_history_entry(trimmed)?;
                    }

                    if process_line(&mut ctx, &line).await == LineOutcome::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        ticker.abort();
        println!("Tạm biệt!");
        Ok(())
    }

    /// Handles one line behind the recovery boundary
    ///
    /// An error or a panic while handling the line prints the restart banner
    /// and puts the session back to its welcome state.
    async fn process_line(ctx: &mut ChatContext, line: &str) -> LineOutcome {
        let result = AssertUnwindSafe(handle_line(ctx, line)).catch_unwind().await;
        let failure = match result {
            Ok(Ok(outcome)) => return outcome,
            Ok(Err(e)) => format!("{:#}", e),
            Err(panic) => panic_message(panic.as_ref()),
        };

        tracing::error!("Failed to handle input: {}", failure);
        eprintln!("\n{}\n", RESTART_BANNER.red().bold());
        ctx.session.reset();
        ctx.attachment = None;
        print_latest(ctx);
        LineOutcome::Continue
    }

    fn panic_message(panic: &(dyn Any + Send)) -> String {
        if let Some(message) = panic.downcast_ref::<&str>() {
            message.to_string()
        } else if let Some(message) = panic.downcast_ref::<String>() {
            message.clone()
        } else {
            "panic".to_string()
        }
    }

    async fn handle_line(ctx: &mut ChatContext, line: &str) -> Result<LineOutcome> {
        let command = match parse_special_command(line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}\n", e.to_string().red());
                return Ok(LineOutcome::Continue);
            }
        };

        match command {
            SpecialCommand::Help => print_help(),
            SpecialCommand::SelectGrade(grade) => {
                ctx.session.select_grade(grade);
                ctx.attachment = None;
                print_latest(ctx);
            }
            SpecialCommand::ListGrades => {
                super::grades::print_grades_table(Some(ctx.session.grade()));
            }
            SpecialCommand::ListTopics => print_topics(ctx),
            SpecialCommand::SelectTopic(name) => match ctx.session.select_topic(&name) {
                Ok(topic) => println!("Chủ đề luyện tập: {}\n", topic.to_string().green()),
                Err(e) => println!("{}\n", e.to_string().yellow()),
            },
            SpecialCommand::NewProblem => new_problem(ctx).await,
            SpecialCommand::Answer(answer) => check_answer(ctx, &answer).await,
            SpecialCommand::Attach(path) => {
                let descriptor = AttachmentDescriptor::for_path(&path);
                println!(
                    "Đính kèm: {} ({})\n",
                    descriptor.display_name.cyan(),
                    descriptor.media_type
                );
                ctx.attachment = Some(path);
            }
            SpecialCommand::Detach => {
                if ctx.attachment.take().is_some() {
                    println!("Đã bỏ tệp đính kèm.\n");
                }
            }
            SpecialCommand::History => print_history(ctx),
            SpecialCommand::Status => print_status_display(ctx),
            SpecialCommand::Exit => return Ok(LineOutcome::Exit),
            SpecialCommand::None => send(ctx, line).await,
        }

        std::io::stdout().flush()?;
        Ok(LineOutcome::Continue)
    }

    async fn send(ctx: &mut ChatContext, line: &str) {
        let attachment = ctx.attachment.take();
        let outcome = ctx.session.begin_send(line, attachment.as_deref()).await;
        match outcome {
            SendOutcome::Dispatch(turn) => {
                println!("{}", "Thầy đang suy nghĩ...".dimmed());
                let reply = ctx
                    .gateway
                    .send_message_detailed(
                        &turn.text,
                        turn.grade,
                        &turn.history,
                        turn.attachment.as_ref(),
                    )
                    .await;
                let message = ctx.session.finish_send(reply.text);
                print_message(&ctx.renderer, message);
            }
            SendOutcome::Rejected { .. } => {
                ctx.attachment = attachment;
                print_latest(ctx);
            }
            SendOutcome::Busy => {
                ctx.attachment = attachment;
                println!("{}\n", "Thầy đang trả lời, em chờ chút nhé.".yellow());
            }
            SendOutcome::Ignored => {}
        }
    }

    async fn new_problem(ctx: &mut ChatContext) {
        println!("{}", "Đang tạo câu hỏi...".dimmed());
        let topic = ctx.session.selected_topic();
        match ctx.session.new_practice_problem(&ctx.gateway).await {
            Some(problem) => {
                println!("\n{} {}", "Bài tập".bold().cyan(), format!("({})", topic).dimmed());
                println!("{}\n", ctx.renderer.render_to_string(&problem.text));
                println!("{}\n", "Gõ /answer <đáp án> để nộp bài.".dimmed());
            }
            None => println!("{}\n", "Đang xử lý, em chờ chút nhé.".yellow()),
        }
    }

    async fn check_answer(ctx: &mut ChatContext, answer: &str) {
        if ctx.session.practice().is_none() {
            println!(
                "{}\n",
                "Chưa có bài tập nào. Gõ /problem để tạo câu hỏi mới.".yellow()
            );
            return;
        }

        println!("{}", "Thầy đang xem bài...".dimmed());
        match ctx.session.check_practice_answer(&ctx.gateway, answer).await {
            Some(feedback) => {
                println!("\n{}", "Nhận xét".bold().green());
                println!("{}\n", ctx.renderer.render_to_string(feedback));
            }
            None => println!("{}\n", "Đang xử lý, em chờ chút nhé.".yellow()),
        }
    }

    fn format_prompt(ctx: &ChatContext) -> String {
        let grade = format!("[{}]", ctx.session.grade());
        match &ctx.attachment {
            Some(_) => format!("{} {} >>> ", grade.cyan(), "+tệp".yellow()),
            None => format!("{} >>> ", grade.cyan()),
        }
    }

    fn print_message(renderer: &MathRenderer, message: &ChatMessage) {
        match message.role {
            MessageRole::Model => {
                println!("\n{}", "Thầy".bold().cyan());
                println!("{}\n", renderer.render_to_string(&message.text));
            }
            MessageRole::Warning => {
                println!("\n{}\n", message.text.yellow());
            }
            MessageRole::User => {
                let attachment = message
                    .attachment
                    .as_ref()
                    .map(|a| format!(" [{}]", a.display_name))
                    .unwrap_or_default();
                println!("{}{} {}", "Em".bold(), attachment.dimmed(), message.text);
            }
        }
    }

    fn print_latest(ctx: &ChatContext) {
        if let Some(message) = ctx.session.messages().last() {
            print_message(&ctx.renderer, message);
        }
    }

    fn print_history(ctx: &ChatContext) {
        for message in ctx.session.messages() {
            print!("{} ", message.timestamp.format("%H:%M:%S").to_string().dimmed());
            print_message(&ctx.renderer, message);
        }
        println!();
    }

    fn print_topics(ctx: &ChatContext) {
        let selected = ctx.session.selected_topic();
        println!("\nChủ đề {}:", ctx.session.grade());
        for name in ctx.session.grade().topics() {
            if *name == selected.name() {
                println!("  {} {}", "*".green(), name.green());
            } else {
                println!("    {}", name);
            }
        }
        println!();
    }

    /// Display welcome banner at the start of the session
    fn print_welcome_banner(ctx: &ChatContext) {
        let info = ctx.session.grade().info();

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              MathGenius - Gia sư Toán THCS                   ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Lớp:   {} ({})", info.label.cyan().bold(), info.subtitle);
        println!("Model: {}", ctx.gateway.model());
        println!(
            "\nGõ '/help' để xem lệnh, 'exit' để thoát. {}",
            moderation::WARNING_TEXT.dimmed()
        );
    }

    /// Display detailed status information about the current session
    fn print_status_display(ctx: &ChatContext) {
        let session = &ctx.session;
        let typesetter = if ctx.renderer.is_ready() {
            "ready".green()
        } else if ctx.math_output == MathOutputMode::Raw {
            "off".normal()
        } else {
            "loading".yellow()
        };
        let practice = match session.practice() {
            Some(problem) if session.feedback().is_some() => {
                format!("{} (đã chấm)", problem.topic)
            }
            Some(problem) => format!("{} (chưa nộp)", problem.topic),
            None => "không có".to_string(),
        };
        let attachment = ctx
            .attachment
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "không có".to_string());

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   MathGenius Session Status                  ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Grade:             {}", session.grade().to_string().cyan());
        println!("Practice Topic:    {}", session.selected_topic());
        println!("Practice Problem:  {}", practice);
        println!("Model:             {}", ctx.gateway.model());
        println!("Math Output:       {} ({})", ctx.math_output, typesetter);
        println!("Conversation Size: {} messages", session.messages().len());
        println!("Attachment:        {}", attachment);
        println!(
            "Online:            {} học sinh",
            (*ctx.online.borrow()).to_string().green()
        );
        println!();
    }

}

// One-shot tutoring question
pub mod ask {
    use super::*;
    use crate::moderation;
    use crate::session::{TurnOutcome, TutorSession};
    use colored::Colorize;
    use std::path::PathBuf;

    /// Ask one question and print the tutor's reply
    ///
    /// # Errors
    ///
    /// Returns error if the grade is invalid, the message is empty, or the
    /// wording filter rejects it.
    pub async fn run_ask(
        config: Config,
        grade: Option<u8>,
        attach: Option<PathBuf>,
        text: String,
    ) -> Result<()> {
        let grade = resolve_grade(&config, grade)?;
        let gateway = build_gateway(&config)?;
        let renderer = MathRenderer::for_mode(config.tutor.math_output);
        let mut session = TutorSession::new(grade, config.tutor.max_attachment_bytes);

        match session.send(&gateway, &text, attach.as_deref()).await {
            TurnOutcome::Replied(reply) => {
                println!("{}", renderer.render_to_string(&reply.text));
                Ok(())
            }
            TurnOutcome::Rejected { .. } => {
                eprintln!("{}", moderation::WARNING_TEXT.yellow());
                Err(MathGeniusError::Command("Message rejected by wording filter".to_string()).into())
            }
            TurnOutcome::Ignored | TurnOutcome::Busy => {
                Err(MathGeniusError::Command("Nothing to send".to_string()).into())
            }
        }
    }
}

// Practice problem generation
pub mod practice {
    use super::*;

    /// Generate and print one practice problem
    ///
    /// # Errors
    ///
    /// Returns error if the grade or topic is invalid
    pub async fn run_practice(config: Config, grade: Option<u8>, topic: Option<String>) -> Result<()> {
        let grade = resolve_grade(&config, grade)?;
        let topic = match topic.as_deref() {
            Some(name) => grade.resolve_topic(name)?,
            None => Default::default(),
        };

        let gateway = build_gateway(&config)?;
        let renderer = MathRenderer::for_mode(config.tutor.math_output);
        tracing::info!("Generating {} problem on {}", grade, topic);

        let problem = gateway.generate_problem(grade, Some(topic)).await;
        println!("{}", renderer.render_to_string(&problem));
        Ok(())
    }
}

// Answer checking
pub mod check {
    use super::*;

    /// Check an answer and print the feedback
    ///
    /// # Errors
    ///
    /// Returns error if the grade is invalid or the answer is blank
    pub async fn run_check(
        config: Config,
        grade: Option<u8>,
        problem: String,
        answer: String,
    ) -> Result<()> {
        let grade = resolve_grade(&config, grade)?;
        if answer.trim().is_empty() {
            return Err(MathGeniusError::Command("Answer must not be empty".to_string()).into());
        }
        if problem.trim().is_empty() {
            return Err(MathGeniusError::Command("Problem must not be empty".to_string()).into());
        }

        let gateway = build_gateway(&config)?;
        let renderer = MathRenderer::for_mode(config.tutor.math_output);

        let feedback = gateway.check_answer(&problem, answer.trim(), grade).await;
        println!("{}", renderer.render_to_string(&feedback));
        Ok(())
    }
}

// Grade listing
pub mod grades {
    use super::*;
    use prettytable::{row, Table};

    /// Print every grade with its subtitle and topics
    pub fn list_grades() -> Result<()> {
        print_grades_table(None);
        Ok(())
    }

    /// Print the grade table, marking `current` if given
    pub fn print_grades_table(current: Option<GradeLevel>) {
        let mut table = Table::new();
        table.add_row(row!["Grade", "Label", "Subtitle", "Topics"]);

        for grade in GradeLevel::ALL {
            let info = grade.info();
            let marker = if current == Some(grade) { "*" } else { "" };
            table.add_row(row![
                format!("{}{}", grade.number(), marker),
                info.label,
                info.subtitle,
                grade.topics().join(", ")
            ]);
        }

        println!();
        table.printstd();
        println!();
    }
}

// Offline math rendering
pub mod render {
    use super::*;

    /// Render `text` and print it without contacting the model
    pub fn run_render(config: &Config, mode: Option<MathOutputMode>, text: &str) -> Result<()> {
        let mode = mode.unwrap_or(config.tutor.math_output);
        tracing::debug!("Rendering with {} output", mode);
        let renderer = MathRenderer::for_mode(mode);
        println!("{}", renderer.render_to_string(text));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_config;

    #[test]
    fn test_resolve_grade_prefers_argument() {
        let config = test_config();
        assert_eq!(resolve_grade(&config, Some(8)).unwrap(), GradeLevel::Grade8);
    }

    #[test]
    fn test_resolve_grade_falls_back_to_config() {
        let mut config = test_config();
        config.tutor.default_grade = 7;
        assert_eq!(resolve_grade(&config, None).unwrap(), GradeLevel::Grade7);
    }

    #[test]
    fn test_resolve_grade_rejects_out_of_range() {
        let config = test_config();
        assert!(resolve_grade(&config, Some(5)).is_err());
    }

    #[test]
    fn test_build_gateway_uses_configured_model() {
        let mut config = test_config();
        config.provider.gemini.model = "gemini-test".to_string();
        let gateway = build_gateway(&config).unwrap();
        assert_eq!(gateway.model(), "gemini-test");
    }

    #[test]
    fn test_build_gateway_rejects_unknown_provider() {
        let mut config = test_config();
        config.provider.provider_type = "openai".to_string();
        assert!(build_gateway(&config).is_err());
    }

    #[test]
    fn test_render_raw_mode_succeeds() {
        let config = test_config();
        assert!(render::run_render(&config, Some(MathOutputMode::Raw), "$x^2$").is_ok());
    }

    #[tokio::test]
    async fn test_check_rejects_blank_answer() {
        let result = check::run_check(
            test_config(),
            Some(6),
            "Tính 2 + 3".to_string(),
            "   ".to_string(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_practice_rejects_unknown_topic() {
        let result =
            practice::run_practice(test_config(), Some(9), Some("Tích phân".to_string())).await;
        assert!(result.is_err());
    }
}
