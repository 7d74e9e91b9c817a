//! Model gateway: the single boundary between the tutor and the hosted model
//!
//! Every operation builds one request (system instruction, content parts,
//! sampling), calls the provider once, and returns text. Failures never
//! escape: the cause is logged and a fixed Vietnamese fallback string is
//! returned in its place. No retries, no backoff.

use crate::attachment::Attachment;
use crate::config::SamplingSettings;
use crate::curriculum::{GradeLevel, Topic};
use crate::prompts::{self, PromptMode};
use crate::providers::{
    ContentPart, GenerationRequest, HistoryEntry, Provider, SamplingConfig,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Tutoring reply when the call fails
pub const SEND_ERROR_FALLBACK: &str =
    "Có lỗi xảy ra khi kết nối. Vui lòng kiểm tra lại mạng hoặc ảnh/file em gửi.";
/// Tutoring reply when the model returns no text
pub const SEND_EMPTY_FALLBACK: &str =
    "Xin lỗi, thầy đang gặp chút trục trặc. Em hỏi lại được không?";
/// Problem text when the call fails
pub const PROBLEM_ERROR_FALLBACK: &str = "Lỗi kết nối. Vui lòng thử lại.";
/// Problem text when the model returns no text
pub const PROBLEM_EMPTY_FALLBACK: &str = "Không thể tạo câu hỏi lúc này.";
/// Feedback text when the call fails
pub const CHECK_ERROR_FALLBACK: &str = "Lỗi kết nối khi kiểm tra đáp án.";
/// Feedback text when the model returns no text
pub const CHECK_EMPTY_FALLBACK: &str = "Thầy chưa nghe rõ, em nói lại nhé?";

/// Fixed top-k for tutoring replies
pub const TUTORING_TOP_K: u32 = 40;
/// Fixed top-p for tutoring replies
pub const TUTORING_TOP_P: f32 = 0.95;

/// Text part sent when a message has neither text nor attachment
const PLACEHOLDER_TEXT: &str = ".";

/// How a gateway reply was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The model produced text
    Generated,
    /// The call succeeded but the model produced no text
    Empty,
    /// The call failed; the text is the error fallback
    Failed,
}

/// Text returned by the gateway plus how it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    /// Text to show; real model output or a fallback string
    pub text: String,
    /// Whether `text` came from the model
    pub outcome: ReplyOutcome,
}

impl GatewayReply {
    /// Returns true if the text is a fallback string
    pub fn is_fallback(&self) -> bool {
        self.outcome != ReplyOutcome::Generated
    }
}

/// Fallback strings for one operation
struct Fallbacks {
    error: &'static str,
    empty: &'static str,
}

const SEND_FALLBACKS: Fallbacks = Fallbacks {
    error: SEND_ERROR_FALLBACK,
    empty: SEND_EMPTY_FALLBACK,
};

const PROBLEM_FALLBACKS: Fallbacks = Fallbacks {
    error: PROBLEM_ERROR_FALLBACK,
    empty: PROBLEM_EMPTY_FALLBACK,
};

const CHECK_FALLBACKS: Fallbacks = Fallbacks {
    error: CHECK_ERROR_FALLBACK,
    empty: CHECK_EMPTY_FALLBACK,
};

/// Issues requests to the hosted model and normalizes every failure
///
/// # Examples
///
/// ```no_run
/// use mathgenius::config::Config;
/// use mathgenius::curriculum::GradeLevel;
/// use mathgenius::gateway::ModelGateway;
/// use mathgenius::providers::create_provider;
///
/// # async fn example() -> mathgenius::error::Result<()> {
/// let config = Config::default();
/// let provider = create_provider(&config.provider)?;
/// let gateway = ModelGateway::new_boxed(provider, config.tutor.sampling);
/// let problem = gateway.generate_problem(GradeLevel::Grade7, None).await;
/// println!("{}", problem);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ModelGateway {
    provider: Arc<dyn Provider>,
    sampling: SamplingSettings,
}

impl ModelGateway {
    /// Creates a gateway over a shared provider
    pub fn new(provider: Arc<dyn Provider>, sampling: SamplingSettings) -> Self {
        Self { provider, sampling }
    }

    /// Creates a gateway over a boxed provider
    ///
    /// Useful when the provider comes from `providers::create_provider`.
    pub fn new_boxed(provider: Box<dyn Provider>, sampling: SamplingSettings) -> Self {
        Self::new(Arc::from(provider), sampling)
    }

    /// Name of the model behind this gateway
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Tutoring reply for a student message
    ///
    /// # Arguments
    ///
    /// * `text` - The student's message (may be empty when an attachment is sent)
    /// * `grade` - The student's grade
    /// * `history` - Prior turns, oldest first
    /// * `attachment` - Optional image or document
    pub async fn send_message(
        &self,
        text: &str,
        grade: GradeLevel,
        history: &[HistoryEntry],
        attachment: Option<&Attachment>,
    ) -> String {
        self.send_message_detailed(text, grade, history, attachment)
            .await
            .text
    }

    /// Like `send_message`, also reporting whether the text is a fallback
    pub async fn send_message_detailed(
        &self,
        text: &str,
        grade: GradeLevel,
        history: &[HistoryEntry],
        attachment: Option<&Attachment>,
    ) -> GatewayReply {
        let request = GenerationRequest {
            system_instruction: prompts::build_system_prompt(grade, PromptMode::Tutoring, None),
            history: history.to_vec(),
            parts: message_parts(text, attachment),
            sampling: SamplingConfig {
                temperature: self.sampling.tutoring_temperature,
                top_k: Some(TUTORING_TOP_K),
                top_p: Some(TUTORING_TOP_P),
            },
        };

        self.dispatch(PromptMode::Tutoring, &request, &SEND_FALLBACKS)
            .await
    }

    /// A new practice problem for the grade
    ///
    /// `None` means no topic constraint.
    pub async fn generate_problem(&self, grade: GradeLevel, topic: Option<Topic>) -> String {
        self.generate_problem_detailed(grade, topic).await.text
    }

    /// Like `generate_problem`, also reporting whether the text is a fallback
    pub async fn generate_problem_detailed(
        &self,
        grade: GradeLevel,
        topic: Option<Topic>,
    ) -> GatewayReply {
        let topic = topic.unwrap_or_default();
        let request = GenerationRequest {
            system_instruction: prompts::build_system_prompt(
                grade,
                PromptMode::ProblemGeneration,
                Some(topic),
            ),
            history: Vec::new(),
            parts: vec![ContentPart::text(prompts::practice_request(grade, topic))],
            sampling: SamplingConfig::with_temperature(self.sampling.practice_temperature),
        };

        self.dispatch(PromptMode::ProblemGeneration, &request, &PROBLEM_FALLBACKS)
            .await
    }

    /// Feedback on a student's answer to a practice problem
    ///
    /// The prompt tells the model to give a hint instead of the correct
    /// answer when the attempt is wrong. Nothing here checks the reply.
    pub async fn check_answer(&self, problem: &str, answer: &str, grade: GradeLevel) -> String {
        self.check_answer_detailed(problem, answer, grade).await.text
    }

    /// Like `check_answer`, also reporting whether the text is a fallback
    pub async fn check_answer_detailed(
        &self,
        problem: &str,
        answer: &str,
        grade: GradeLevel,
    ) -> GatewayReply {
        let request = GenerationRequest {
            system_instruction: prompts::build_system_prompt(
                grade,
                PromptMode::AnswerChecking,
                None,
            ),
            history: Vec::new(),
            parts: vec![ContentPart::text(prompts::answer_check_request(
                problem, answer, grade,
            ))],
            sampling: SamplingConfig::with_temperature(self.sampling.checking_temperature),
        };

        self.dispatch(PromptMode::AnswerChecking, &request, &CHECK_FALLBACKS)
            .await
    }

    async fn dispatch(
        &self,
        mode: PromptMode,
        request: &GenerationRequest,
        fallbacks: &Fallbacks,
    ) -> GatewayReply {
        debug!(
            mode = %mode,
            model = %self.provider.model(),
            history = request.history.len(),
            parts = request.parts.len(),
            "Dispatching model request"
        );

        match self.provider.generate(request).await {
            Ok(response) => match response.text {
                Some(text) if !text.is_empty() => GatewayReply {
                    text,
                    outcome: ReplyOutcome::Generated,
                },
                _ => {
                    warn!(mode = %mode, "Model returned no text");
                    GatewayReply {
                        text: fallbacks.empty.to_string(),
                        outcome: ReplyOutcome::Empty,
                    }
                }
            },
            Err(e) => {
                error!(mode = %mode, "Model request failed: {:#}", e);
                GatewayReply {
                    text: fallbacks.error.to_string(),
                    outcome: ReplyOutcome::Failed,
                }
            }
        }
    }
}

/// Content parts for a tutoring turn: attachment first, then text
///
/// A turn with neither becomes a single placeholder text part.
pub fn message_parts(text: &str, attachment: Option<&Attachment>) -> Vec<ContentPart> {
    let mut parts = Vec::with_capacity(2);
    if let Some(att) = attachment {
        parts.push(ContentPart::inline_data(
            att.media_type.clone(),
            att.encoded_bytes.clone(),
        ));
    }
    if !text.is_empty() {
        parts.push(ContentPart::text(text));
    }
    if parts.is_empty() {
        parts.push(ContentPart::text(PLACEHOLDER_TEXT));
    }
    parts
}
