//! Problem-generation system prompt

use super::{curriculum_section, FORMATTING_RULE};
use crate::curriculum::{GradeLevel, Topic};

/// Generates the system prompt for problem generation
///
/// A named topic adds a focus line; `Topic::Random` leaves the choice to the
/// model.
///
/// # Examples
///
/// ```
/// use mathgenius::curriculum::{GradeLevel, Topic};
/// use mathgenius::prompts::practice_prompt::generate_practice_prompt;
///
/// let prompt = generate_practice_prompt(GradeLevel::Grade7, Topic::Named("Tam giác bằng nhau"));
/// assert!(prompt.contains("Chủ đề trọng tâm: Tam giác bằng nhau"));
/// ```
pub fn generate_practice_prompt(grade: GradeLevel, topic: Topic) -> String {
    let mut prompt = format!(
        r#"Bạn là người ra đề kiểm tra toán học cho học sinh Lớp {n} (Bộ sách Kết nối tri thức). Nhiệm vụ của bạn là tạo ra các bài tập toán ngắn gọn, thú vị và phù hợp chính xác với trình độ lớp học yêu cầu.
Quy tắc:
1. Chỉ đưa ra ĐỀ BÀI. Không đưa ra lời giải.
2. Đề bài phải rõ ràng, ngắn gọn.
3. Có thể là bài toán tìm x, bài toán đố, hoặc bài hình học (mô tả bằng lời).
4. Chỉ dùng kiến thức trong phạm vi sau:
{section}"#,
        n = grade.number(),
        section = curriculum_section(grade),
    );

    if let Topic::Named(name) = topic {
        prompt.push_str(&format!(
            "\n\nChủ đề trọng tâm: {}. Hãy tạo một bài toán thuộc chủ đề này.",
            name
        ));
    }

    prompt.push_str("\n\nYÊU CẦU ĐỊNH DẠNG:\n");
    prompt.push_str(FORMATTING_RULE);
    prompt
}
