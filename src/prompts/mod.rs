//! System prompts for the three tutoring modes
//!
//! This module composes the instruction string sent with every model request.
//! Each prompt embeds only the selected grade's curriculum boundaries (what the
//! tutor may use and what it must not use) and the output-formatting rule that
//! keeps math parseable by the renderer.

pub mod check_prompt;
pub mod practice_prompt;
pub mod tutor_prompt;

use crate::curriculum::{GradeLevel, Topic};
use std::fmt;

/// Output-formatting rule shared by every mode
///
/// The `$` / `$$` delimiters are what `math_markup::split_segments` looks for.
pub const FORMATTING_RULE: &str =
    "- Sử dụng LaTeX cho TẤT CẢ các công thức toán học (đặt trong dấu $ cho inline và $$ cho block).";

/// What the model is being asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Socratic chat tutoring
    Tutoring,
    /// Generate a single practice problem
    ProblemGeneration,
    /// Grade a student's answer to a practice problem
    AnswerChecking,
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tutoring => write!(f, "tutoring"),
            Self::ProblemGeneration => write!(f, "problem-generation"),
            Self::AnswerChecking => write!(f, "answer-checking"),
        }
    }
}

/// Builds the system instruction for a grade and mode
///
/// The topic only affects problem generation; the other modes ignore it.
/// Output is deterministic for the same inputs.
///
/// # Arguments
///
/// * `grade` - The student's grade
/// * `mode` - The current PromptMode
/// * `topic` - Optional focus topic (`None` behaves like `Topic::Random`)
///
/// # Examples
///
/// ```
/// use mathgenius::curriculum::GradeLevel;
/// use mathgenius::prompts::{build_system_prompt, PromptMode};
///
/// let prompt = build_system_prompt(GradeLevel::Grade6, PromptMode::Tutoring, None);
/// assert!(prompt.contains("LỚP 6"));
/// assert!(prompt.contains("Phân số"));
/// ```
pub fn build_system_prompt(grade: GradeLevel, mode: PromptMode, topic: Option<Topic>) -> String {
    match mode {
        PromptMode::Tutoring => tutor_prompt::generate_tutor_prompt(grade),
        PromptMode::ProblemGeneration => {
            practice_prompt::generate_practice_prompt(grade, topic.unwrap_or_default())
        }
        PromptMode::AnswerChecking => check_prompt::generate_check_prompt(grade),
    }
}

/// Renders the allow/deny block for one grade
///
/// # Examples
///
/// ```
/// use mathgenius::curriculum::GradeLevel;
/// use mathgenius::prompts::curriculum_section;
///
/// let section = curriculum_section(GradeLevel::Grade9);
/// assert!(section.contains("Được dùng"));
/// assert!(!section.contains("Cấm dùng"));
/// ```
pub fn curriculum_section(grade: GradeLevel) -> String {
    let mut section = format!(
        "• {}:\n  - Được dùng: {}.",
        grade,
        grade.allowed_concepts().join(", ")
    );
    if let Some(clause) = deny_clause(grade) {
        section.push_str("\n  ");
        section.push_str(&clause);
    }
    section
}

/// The deny-list line of a grade's curriculum block, if it has one
pub fn deny_clause(grade: GradeLevel) -> Option<String> {
    let denied = grade.denied_concepts();
    if denied.is_empty() {
        None
    } else {
        Some(format!("- Cấm dùng: {}.", denied.join(", ")))
    }
}

/// User content for a problem-generation request
pub fn practice_request(grade: GradeLevel, topic: Topic) -> String {
    let topic_instruction = match topic {
        Topic::Random => "Chủ đề: Ngẫu nhiên (Đại số hoặc Hình học).".to_string(),
        Topic::Named(name) => format!(
            "Chủ đề trọng tâm: {}. Hãy tạo một bài toán thuộc chủ đề này.",
            name
        ),
    };

    format!(
        "Tạo một bài toán toán học phù hợp với chương trình Lớp {} (Sách Kết nối tri thức). {} Chỉ trả về nội dung câu hỏi.",
        grade.number(),
        topic_instruction
    )
}

/// User content for an answer-check request
pub fn answer_check_request(problem: &str, answer: &str, grade: GradeLevel) -> String {
    format!(
        "Đề bài: {}\n\nTrả lời của học sinh Lớp {}: {}\n\nHãy nhận xét.",
        problem,
        grade.number(),
        answer
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [PromptMode; 3] = [
        PromptMode::Tutoring,
        PromptMode::ProblemGeneration,
        PromptMode::AnswerChecking,
    ];

    /// Deny-list terms of other grades that `grade` does not itself teach.
    ///
    /// Curricula overlap upward (grade 7 teaches what grade 6 forbids), so a
    /// term counts only when no allowed concept of `grade` contains it or is
    /// contained by it.
    fn foreign_denied_terms(grade: GradeLevel) -> Vec<&'static str> {
        let allowed: Vec<String> = grade
            .allowed_concepts()
            .iter()
            .map(|a| a.to_lowercase())
            .collect();

        GradeLevel::ALL
            .iter()
            .filter(|other| **other != grade)
            .flat_map(|other| other.denied_concepts().iter().copied())
            .filter(|term| {
                let term = term.to_lowercase();
                !allowed
                    .iter()
                    .any(|a| a.contains(&term) || term.contains(a.as_str()))
            })
            .collect()
    }

    fn assert_grade_scoped(prompt: &str, grade: GradeLevel) {
        for term in grade.allowed_concepts() {
            assert!(
                prompt.contains(term),
                "{} prompt is missing allowed concept {:?}",
                grade,
                term
            );
        }

        let lower = prompt.to_lowercase();
        for term in foreign_denied_terms(grade) {
            assert!(
                !lower.contains(&term.to_lowercase()),
                "{} prompt mentions another grade's denied concept {:?}",
                grade,
                term
            );
        }

        for other in GradeLevel::ALL.iter().filter(|other| **other != grade) {
            if let Some(clause) = deny_clause(*other) {
                assert!(
                    !prompt.contains(&clause),
                    "{} prompt contains the deny clause of {}",
                    grade,
                    other
                );
            }
        }
    }

    #[test]
    fn test_every_mode_is_grade_scoped() {
        for grade in GradeLevel::ALL {
            for mode in MODES {
                let prompt = build_system_prompt(grade, mode, None);
                assert_grade_scoped(&prompt, grade);
            }
        }
    }

    #[test]
    fn test_every_topic_prompt_is_grade_scoped() {
        for grade in GradeLevel::ALL {
            for name in grade.topics() {
                let topic = grade.resolve_topic(name).unwrap();
                let prompt = build_system_prompt(grade, PromptMode::ProblemGeneration, Some(topic));
                assert_grade_scoped(&prompt, grade);
            }
        }
    }

    #[test]
    fn test_every_mode_includes_formatting_rule() {
        for grade in GradeLevel::ALL {
            for mode in MODES {
                let prompt = build_system_prompt(grade, mode, None);
                assert!(prompt.contains(FORMATTING_RULE), "{} / {}", grade, mode);
            }
        }
    }

    #[test]
    fn test_own_deny_clause_is_present() {
        for grade in GradeLevel::ALL {
            let prompt = build_system_prompt(grade, PromptMode::Tutoring, None);
            match deny_clause(grade) {
                Some(clause) => assert!(prompt.contains(&clause)),
                None => assert!(!prompt.contains("Cấm dùng")),
            }
        }
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let a = build_system_prompt(GradeLevel::Grade8, PromptMode::AnswerChecking, None);
        let b = build_system_prompt(GradeLevel::Grade8, PromptMode::AnswerChecking, None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_modes_produce_different_prompts() {
        let tutoring = build_system_prompt(GradeLevel::Grade7, PromptMode::Tutoring, None);
        let practice = build_system_prompt(GradeLevel::Grade7, PromptMode::ProblemGeneration, None);
        let checking = build_system_prompt(GradeLevel::Grade7, PromptMode::AnswerChecking, None);
        assert_ne!(tutoring, practice);
        assert_ne!(practice, checking);
        assert_ne!(tutoring, checking);
    }

    #[test]
    fn test_practice_request_random_topic() {
        let request = practice_request(GradeLevel::Grade6, Topic::Random);
        assert!(request.contains("Lớp 6"));
        assert!(request.contains("Ngẫu nhiên"));
        assert!(!request.contains("Chủ đề trọng tâm"));
    }

    #[test]
    fn test_practice_request_named_topic() {
        let request = practice_request(GradeLevel::Grade9, Topic::Named("Đường tròn"));
        assert!(request.contains("Chủ đề trọng tâm: Đường tròn."));
        assert!(request.ends_with("Chỉ trả về nội dung câu hỏi."));
    }

    #[test]
    fn test_answer_check_request_layout() {
        let request = answer_check_request("Tính $2+3$", "6", GradeLevel::Grade6);
        assert_eq!(
            request,
            "Đề bài: Tính $2+3$\n\nTrả lời của học sinh Lớp 6: 6\n\nHãy nhận xét."
        );
    }
}
