//! Per-session tutoring state
//!
//! A [`TutorSession`] owns the selected grade, the append-only message log,
//! the busy flags and the practice state. The interactive loop holds it by
//! value and hands it out as `&mut` to one handler at a time, so at most one
//! model call per session is ever in flight.

use crate::attachment::{self, Attachment, AttachmentDescriptor};
use crate::curriculum::{GradeLevel, Topic};
use crate::error::Result;
use crate::gateway::{GatewayReply, ModelGateway};
use crate::moderation::{self, ModerationVerdict};
use crate::providers::{HistoryEntry, TurnRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Id of the greeting that opens every session
pub const WELCOME_ID: &str = "welcome";

/// Who a log entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The student
    User,
    /// The tutor model
    Model,
    /// Local notice; never sent to the model
    Warning,
}

/// One entry of the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// UUID v4, or `welcome` for the greeting
    pub id: String,
    /// Author of the entry
    pub role: MessageRole,
    /// Text as entered or received
    pub text: String,
    /// Attachment sent with a user message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentDescriptor>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            attachment: None,
            timestamp: Utc::now(),
        }
    }

    /// A student message
    pub fn user(text: impl Into<String>, attachment: Option<AttachmentDescriptor>) -> Self {
        Self {
            attachment,
            ..Self::new(MessageRole::User, text)
        }
    }

    /// A tutor message
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Model, text)
    }

    /// A local warning
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Warning, text)
    }

    /// The greeting for a grade
    pub fn welcome(grade: GradeLevel) -> Self {
        Self {
            id: WELCOME_ID.to_string(),
            ..Self::model(grade.welcome_message())
        }
    }
}

/// The current practice problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeProblem {
    /// Problem text as generated (or the fallback string)
    pub text: String,
    /// Topic it was generated for
    pub topic: Topic,
    /// Grade it was generated for
    pub grade: GradeLevel,
}

/// Everything the gateway needs for one tutoring turn
#[derive(Debug, Clone)]
pub struct PendingTurn {
    /// Trimmed message text; may be empty when an attachment is sent
    pub text: String,
    /// Grade at the time of sending
    pub grade: GradeLevel,
    /// Prior turns, excluding the message being sent
    pub history: Vec<HistoryEntry>,
    /// Encoded attachment, absent if none was chosen or encoding failed
    pub attachment: Option<Attachment>,
}

/// Result of starting a send
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// Blocked by the wording filter; a warning entry was logged
    Rejected {
        /// The deny-list entry that matched
        term: &'static str,
    },
    /// Nothing to send
    Ignored,
    /// A reply is still pending
    Busy,
    /// Logged and ready for the gateway
    Dispatch(PendingTurn),
}

/// Result of a complete send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blocked by the wording filter
    Rejected {
        /// The deny-list entry that matched
        term: &'static str,
    },
    /// Nothing to send
    Ignored,
    /// A reply is still pending
    Busy,
    /// The gateway answered; the reply is already logged
    Replied(GatewayReply),
}

/// Conversation and practice state for one student
#[derive(Debug, Clone)]
pub struct TutorSession {
    grade: GradeLevel,
    messages: Vec<ChatMessage>,
    busy: bool,
    max_attachment_bytes: u64,
    selected_topic: Topic,
    practice: Option<PracticeProblem>,
    answer: Option<String>,
    feedback: Option<String>,
    practice_busy: bool,
}

impl TutorSession {
    /// Starts a session at `grade` with the welcome entry
    ///
    /// # Examples
    ///
    /// ```
    /// use mathgenius::curriculum::GradeLevel;
    /// use mathgenius::session::{MessageRole, TutorSession};
    ///
    /// let session = TutorSession::new(GradeLevel::Grade6, 1024);
    /// assert_eq!(session.messages().len(), 1);
    /// assert_eq!(session.messages()[0].role, MessageRole::Model);
    /// ```
    pub fn new(grade: GradeLevel, max_attachment_bytes: u64) -> Self {
        Self {
            grade,
            messages: vec![ChatMessage::welcome(grade)],
            busy: false,
            max_attachment_bytes,
            selected_topic: Topic::Random,
            practice: None,
            answer: None,
            feedback: None,
            practice_busy: false,
        }
    }

    /// Current grade
    pub fn grade(&self) -> GradeLevel {
        self.grade
    }

    /// The full log, oldest first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// True while a tutoring reply is pending
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// True while a practice call is pending
    pub fn is_practice_busy(&self) -> bool {
        self.practice_busy
    }

    /// Topic used for the next practice problem
    pub fn selected_topic(&self) -> Topic {
        self.selected_topic
    }

    /// The live practice problem, if any
    pub fn practice(&self) -> Option<&PracticeProblem> {
        self.practice.as_ref()
    }

    /// The last answer submitted for the live problem
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Feedback on the last submitted answer
    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    /// Switches grade and resets everything to the welcome state
    pub fn select_grade(&mut self, grade: GradeLevel) {
        tracing::info!("Switching to {}", grade);
        *self = Self::new(grade, self.max_attachment_bytes);
    }

    /// Resets to the welcome state at the current grade
    pub fn reset(&mut self) {
        self.select_grade(self.grade);
    }

    /// Prior turns as sent to the model
    ///
    /// Warnings are dropped; everything else keeps its order. An entry with
    /// empty text has no parts.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter_map(|message| {
                let role = match message.role {
                    MessageRole::User => TurnRole::User,
                    MessageRole::Model => TurnRole::Model,
                    MessageRole::Warning => return None,
                };
                Some(HistoryEntry::from_text(role, &message.text))
            })
            .collect()
    }

    /// Screens, logs and prepares a tutoring turn
    ///
    /// On `Dispatch` the user entry is already in the log and the session is
    /// busy until [`finish_send`](Self::finish_send) is called. The text is
    /// logged and sent as typed; trimming only decides whether it is blank.
    pub async fn begin_send(&mut self, text: &str, attachment_path: Option<&Path>) -> SendOutcome {
        if text.trim().is_empty() && attachment_path.is_none() {
            return SendOutcome::Ignored;
        }
        if self.busy {
            return SendOutcome::Busy;
        }

        if let ModerationVerdict::Rejected { term } = moderation::screen(text) {
            tracing::warn!(term, "Message rejected by wording filter");
            self.messages
                .push(ChatMessage::warning(moderation::WARNING_TEXT));
            return SendOutcome::Rejected { term };
        }

        let (attachment, descriptor) = match attachment_path {
            Some(path) => match attachment::encode_file(path, self.max_attachment_bytes).await {
                Ok(att) => {
                    let descriptor = att.descriptor();
                    (Some(att), Some(descriptor))
                }
                Err(e) => {
                    tracing::warn!("Sending without attachment: {}", e);
                    (None, Some(AttachmentDescriptor::for_path(path)))
                }
            },
            None => (None, None),
        };

        let history = self.history();
        self.messages.push(ChatMessage::user(text, descriptor));
        self.busy = true;

        SendOutcome::Dispatch(PendingTurn {
            text: text.to_string(),
            grade: self.grade,
            history,
            attachment,
        })
    }

    /// Logs the reply for a dispatched turn and clears the busy flag
    pub fn finish_send(&mut self, reply: impl Into<String>) -> &ChatMessage {
        self.busy = false;
        self.messages.push(ChatMessage::model(reply));
        &self.messages[self.messages.len() - 1]
    }

    /// Runs a full tutoring turn through the gateway
    pub async fn send(
        &mut self,
        gateway: &ModelGateway,
        text: &str,
        attachment_path: Option<&Path>,
    ) -> TurnOutcome {
        let turn = match self.begin_send(text, attachment_path).await {
            SendOutcome::Dispatch(turn) => turn,
            SendOutcome::Rejected { term } => return TurnOutcome::Rejected { term },
            SendOutcome::Ignored => return TurnOutcome::Ignored,
            SendOutcome::Busy => return TurnOutcome::Busy,
        };

        let reply = gateway
            .send_message_detailed(
                &turn.text,
                turn.grade,
                &turn.history,
                turn.attachment.as_ref(),
            )
            .await;
        self.finish_send(reply.text.clone());
        TurnOutcome::Replied(reply)
    }

    /// Chooses the topic for the next practice problem
    ///
    /// # Errors
    ///
    /// Returns error if the name is not one of the grade's topics
    pub fn select_topic(&mut self, name: &str) -> Result<Topic> {
        let topic = self.grade.resolve_topic(name)?;
        self.selected_topic = topic;
        Ok(topic)
    }

    /// Replaces the practice problem with a freshly generated one
    ///
    /// Returns `None` while another practice call is pending.
    pub async fn new_practice_problem(
        &mut self,
        gateway: &ModelGateway,
    ) -> Option<&PracticeProblem> {
        if self.practice_busy {
            return None;
        }
        self.practice_busy = true;
        self.answer = None;
        self.feedback = None;

        let topic = self.selected_topic;
        let text = gateway.generate_problem(self.grade, Some(topic)).await;
        self.practice = Some(PracticeProblem {
            text,
            topic,
            grade: self.grade,
        });
        self.practice_busy = false;
        self.practice.as_ref()
    }

    /// Checks an answer against the live problem and stores the feedback
    ///
    /// Returns `None` without a problem, with a blank answer, or while
    /// another practice call is pending.
    pub async fn check_practice_answer(
        &mut self,
        gateway: &ModelGateway,
        answer: &str,
    ) -> Option<&str> {
        let answer = answer.trim();
        if answer.is_empty() || self.practice_busy {
            return None;
        }
        let problem = self.practice.as_ref()?.text.clone();

        self.practice_busy = true;
        self.answer = Some(answer.to_string());
        let feedback = gateway.check_answer(&problem, answer, self.grade).await;
        self.feedback = Some(feedback);
        self.practice_busy = false;
        self.feedback.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingSettings;
    use crate::gateway::SEND_ERROR_FALLBACK;
    use crate::providers::ContentPart;
    use crate::test_utils::{create_test_file, temp_dir, MockProvider, MockReply};
    use std::sync::Arc;

    fn session() -> TutorSession {
        TutorSession::new(GradeLevel::Grade6, 1024)
    }

    fn gateway(provider: &Arc<MockProvider>) -> ModelGateway {
        ModelGateway::new(provider.clone(), SamplingSettings::default())
    }

    #[test]
    fn test_new_session_has_welcome_entry() {
        let s = session();
        assert_eq!(s.messages().len(), 1);
        assert_eq!(s.messages()[0].id, WELCOME_ID);
        assert!(s.messages()[0].text.contains("Lớp 6"));
        assert!(!s.is_busy());
    }

    #[test]
    fn test_history_skips_warnings() {
        let mut s = session();
        s.messages = vec![
            ChatMessage::user("A", None),
            ChatMessage::warning("careful"),
            ChatMessage::model("B"),
        ];
        assert_eq!(
            s.history(),
            vec![
                HistoryEntry::from_text(TurnRole::User, "A"),
                HistoryEntry::from_text(TurnRole::Model, "B"),
            ]
        );
    }

    #[test]
    fn test_history_keeps_empty_text_entries() {
        let mut s = session();
        s.messages.push(ChatMessage::user("", None));
        let history = s.history();
        assert_eq!(history.len(), 2);
        assert!(history[1].parts.is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut s = session();
        assert!(matches!(s.begin_send("   ", None).await, SendOutcome::Ignored));
        assert_eq!(s.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_text_is_logged_and_sent_as_typed() {
        let provider = Arc::new(MockProvider::new(vec![MockReply::text("Em làm tiếp nhé")]));
        let mut s = session();
        let typed = "  x + 5 = 3\n  x = ?  ";

        s.send(&gateway(&provider), typed, None).await;

        assert_eq!(s.messages()[1].role, MessageRole::User);
        assert_eq!(s.messages()[1].text, typed);
        let request = provider.last_request().unwrap();
        assert_eq!(request.parts, vec![ContentPart::text(typed)]);
    }

    #[tokio::test]
    async fn test_rejected_message_logs_warning() {
        let mut s = session();
        let outcome = s.begin_send("đồ ngu", None).await;
        assert!(matches!(outcome, SendOutcome::Rejected { term: "ngu" }));
        assert_eq!(s.messages().len(), 2);
        assert_eq!(s.messages()[1].role, MessageRole::Warning);
        assert_eq!(s.messages()[1].text, moderation::WARNING_TEXT);
        assert!(!s.is_busy());
    }

    #[tokio::test]
    async fn test_begin_send_sets_busy_and_refuses_second_send() {
        let mut s = session();
        let turn = match s.begin_send("Tìm x biết x + 5 = 3", None).await {
            SendOutcome::Dispatch(turn) => turn,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(turn.history.len(), 1);
        assert!(s.is_busy());
        assert!(matches!(s.begin_send("Còn bài nữa", None).await, SendOutcome::Busy));

        let reply = s.finish_send("Em thử trừ hai vế nhé");
        assert_eq!(reply.role, MessageRole::Model);
        assert!(!s.is_busy());
        assert_eq!(s.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_unreadable_attachment_degrades() {
        let mut s = session();
        let path = Path::new("/no/such/dir/bai.png");
        let turn = match s.begin_send("Xem ảnh", Some(path)).await {
            SendOutcome::Dispatch(turn) => turn,
            other => panic!("unexpected {:?}", other),
        };
        assert!(turn.attachment.is_none());
        let logged = s.messages().last().unwrap();
        assert_eq!(
            logged.attachment.as_ref().map(|a| a.display_name.as_str()),
            Some("bai.png")
        );
    }

    #[tokio::test]
    async fn test_attachment_only_send_reaches_gateway() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "de.png", b"\x89PNG\r\n\x1a\ndata");
        let provider = Arc::new(MockProvider::new(vec![MockReply::text("Thầy thấy rồi")]));
        let mut s = session();

        let outcome = s.send(&gateway(&provider), "", Some(&path)).await;
        assert!(matches!(outcome, TurnOutcome::Replied(_)));

        let request = provider.last_request().unwrap();
        assert_eq!(request.parts.len(), 1);
        assert!(matches!(
            &request.parts[0],
            ContentPart::InlineData { mime_type, .. } if mime_type == "image/png"
        ));
    }

    #[tokio::test]
    async fn test_send_failure_logs_fallback() {
        let provider = Arc::new(MockProvider::new(vec![MockReply::Fail("down".to_string())]));
        let mut s = session();
        let outcome = s
            .send(&gateway(&provider), "Tìm x biết x + 5 = 3", None)
            .await;
        match outcome {
            TurnOutcome::Replied(reply) => assert_eq!(reply.text, SEND_ERROR_FALLBACK),
            other => panic!("unexpected {:?}", other),
        }
        let last = s.messages().last().unwrap();
        assert_eq!(last.role, MessageRole::Model);
        assert_eq!(last.text, SEND_ERROR_FALLBACK);
    }

    #[tokio::test]
    async fn test_select_grade_resets_everything() {
        let provider = Arc::new(MockProvider::new(vec![
            MockReply::text("Bài 1"),
            MockReply::text("Chào em"),
        ]));
        let gw = gateway(&provider);
        let mut s = session();
        s.select_topic("Số nguyên").unwrap();
        s.new_practice_problem(&gw).await;
        s.send(&gw, "Xin chào", None).await;

        s.select_grade(GradeLevel::Grade8);
        assert_eq!(s.grade(), GradeLevel::Grade8);
        assert_eq!(s.messages().len(), 1);
        assert!(s.messages()[0].text.contains("Lớp 8"));
        assert!(s.practice().is_none());
        assert!(s.selected_topic().is_random());
    }

    #[tokio::test]
    async fn test_practice_problem_uses_selected_topic() {
        let provider = Arc::new(MockProvider::new(vec![MockReply::text("Tính $-3 + 5$")]));
        let mut s = session();
        s.select_topic("số nguyên").unwrap();

        let problem = s.new_practice_problem(&gateway(&provider)).await.unwrap();
        assert_eq!(problem.topic, Topic::Named("Số nguyên"));
        assert_eq!(problem.grade, GradeLevel::Grade6);
        assert!(provider
            .last_request()
            .unwrap()
            .system_instruction
            .contains("Chủ đề trọng tâm: Số nguyên"));
    }

    #[tokio::test]
    async fn test_check_answer_requires_problem_and_answer() {
        let provider = Arc::new(MockProvider::new(vec![
            MockReply::text("x + 5 = 3"),
            MockReply::text("Gần đúng rồi"),
        ]));
        let gw = gateway(&provider);
        let mut s = session();

        assert!(s.check_practice_answer(&gw, "x = -2").await.is_none());
        s.new_practice_problem(&gw).await;
        assert!(s.check_practice_answer(&gw, "   ").await.is_none());
        assert_eq!(provider.call_count(), 1);

        assert_eq!(
            s.check_practice_answer(&gw, "x = -2").await,
            Some("Gần đúng rồi")
        );
        assert_eq!(s.answer(), Some("x = -2"));
    }

    #[tokio::test]
    async fn test_new_problem_clears_feedback() {
        let provider = Arc::new(MockProvider::new(vec![
            MockReply::text("Bài 1"),
            MockReply::text("Sai rồi"),
            MockReply::text("Bài 2"),
        ]));
        let gw = gateway(&provider);
        let mut s = session();
        s.new_practice_problem(&gw).await;
        s.check_practice_answer(&gw, "5").await;
        assert!(s.feedback().is_some());

        s.new_practice_problem(&gw).await;
        assert!(s.feedback().is_none());
        assert!(s.answer().is_none());
        assert_eq!(s.practice().map(|p| p.text.as_str()), Some("Bài 2"));
    }
}
