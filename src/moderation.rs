//! Client-side wording filter for outgoing student messages
//!
//! This is a UX convenience, not a safety boundary. It does a plain
//! case-insensitive substring scan against a short fixed list, so spacing,
//! stripped diacritics or creative spelling get straight through, and innocent
//! words that happen to contain a listed syllable are rejected. Anything that
//! needs real protection has to live on the model side.

/// Substrings that block a message from being sent
pub const DENY_LIST: &[&str] = &[
    "ngu", "đần", "chó", "lợn", "heo", "điên", "khùng", "câm", "cút", "đm", "vcl", "đéo", "chết",
    "giết",
];

/// Text of the warning entry appended to the log on rejection
pub const WARNING_TEXT: &str = "Ngôn từ không phù hợp với chuẩn mực cộng đồng.";

/// Outcome of screening one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationVerdict {
    /// Nothing matched; the message may go to the gateway
    Allowed,
    /// A deny-listed substring matched
    Rejected {
        /// The deny-list entry that matched first
        term: &'static str,
    },
}

impl ModerationVerdict {
    /// Returns true if the message may be sent
    pub fn is_allowed(&self) -> bool {
        matches!(self, ModerationVerdict::Allowed)
    }
}

/// Screens raw user text against `DENY_LIST`
///
/// # Examples
///
/// ```
/// use mathgenius::moderation::{screen, ModerationVerdict};
///
/// assert_eq!(screen("Tìm x biết x + 5 = 3"), ModerationVerdict::Allowed);
/// assert!(!screen("ĐỒ NGU").is_allowed());
/// ```
pub fn screen(text: &str) -> ModerationVerdict {
    let lower = text.to_lowercase();
    match DENY_LIST.iter().find(|term| lower.contains(*term)) {
        Some(term) => ModerationVerdict::Rejected { term: *term },
        None => ModerationVerdict::Allowed,
    }
}
