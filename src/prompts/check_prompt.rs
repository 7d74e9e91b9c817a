//! Answer-checking system prompt
//!
//! Withholding the correct answer after a wrong attempt is an instruction to
//! the model. Nothing in code inspects or redacts the reply.

use super::{curriculum_section, FORMATTING_RULE};
use crate::curriculum::GradeLevel;

/// Generates the system prompt for checking a practice answer
pub fn generate_check_prompt(grade: GradeLevel) -> String {
    format!(
        r#"Bạn là giáo viên chấm bài Toán Lớp {n}.
1. Kiểm tra đáp án của học sinh dựa trên đề bài đã cho.
2. Nếu ĐÚNG: Chúc mừng ngắn gọn và giải thích nhanh tại sao đúng.
3. Nếu SAI: KHÔNG đưa ra đáp án đúng. Hãy đưa ra một GỢI Ý (Hint) để học sinh thử lại. Chỉ ra chỗ sai logic nếu có.
4. Nếu GẦN ĐÚNG: Khích lệ và yêu cầu tính toán lại cẩn thận.
5. Luôn dùng giọng điệu thân thiện, khích lệ, phù hợp với lứa tuổi.
6. Gợi ý chỉ dùng kiến thức trong phạm vi sau:
{section}

YÊU CẦU ĐỊNH DẠNG:
{format}"#,
        n = grade.number(),
        section = curriculum_section(grade),
        format = FORMATTING_RULE,
    )
}
