//! Grade and topic registry
//!
//! Static description of the four lower-secondary grades (6–9) of the
//! "Kết nối tri thức với cuộc sống" textbook series: display metadata,
//! practice topics, and the concepts the tutor may and may not use at each
//! grade. Everything here is `'static` data; nothing performs I/O.

use crate::error::{MathGeniusError, Result};
use std::fmt;
use std::str::FromStr;

/// Name of the topic that places no constraint on generated problems
pub const RANDOM_TOPIC: &str = "Ngẫu nhiên";

/// Student grade level
///
/// A closed set: the curriculum only covers grades 6 through 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GradeLevel {
    /// Lớp 6
    Grade6,
    /// Lớp 7
    Grade7,
    /// Lớp 8
    Grade8,
    /// Lớp 9
    Grade9,
}

/// Display metadata for a grade selection screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeInfo {
    /// Upper-case label, e.g. "LỚP 6"
    pub label: &'static str,
    /// Short motivational subtitle
    pub subtitle: &'static str,
}

/// Topic selection for practice problems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    /// No topic constraint
    Random,
    /// One of the grade's named topics
    Named(&'static str),
}

impl Topic {
    /// Display name of the topic
    pub fn name(&self) -> &'static str {
        match self {
            Topic::Random => RANDOM_TOPIC,
            Topic::Named(name) => name,
        }
    }

    /// Returns true when the topic adds no constraint
    pub fn is_random(&self) -> bool {
        matches!(self, Topic::Random)
    }
}

impl Default for Topic {
    fn default() -> Self {
        Topic::Random
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl GradeLevel {
    /// All grades in ascending order
    pub const ALL: [GradeLevel; 4] = [
        GradeLevel::Grade6,
        GradeLevel::Grade7,
        GradeLevel::Grade8,
        GradeLevel::Grade9,
    ];

    /// Look up a grade by its number
    ///
    /// # Errors
    ///
    /// Returns `MathGeniusError::Curriculum` for anything outside 6–9
    ///
    /// # Examples
    ///
    /// ```
    /// use mathgenius::curriculum::GradeLevel;
    ///
    /// assert_eq!(GradeLevel::from_number(8).unwrap(), GradeLevel::Grade8);
    /// assert!(GradeLevel::from_number(10).is_err());
    /// ```
    pub fn from_number(number: u8) -> Result<Self> {
        match number {
            6 => Ok(GradeLevel::Grade6),
            7 => Ok(GradeLevel::Grade7),
            8 => Ok(GradeLevel::Grade8),
            9 => Ok(GradeLevel::Grade9),
            other => Err(MathGeniusError::Curriculum(format!(
                "Unknown grade: {}. Must be one of: 6, 7, 8, 9",
                other
            ))
            .into()),
        }
    }

    /// Numeric grade (6–9)
    pub fn number(&self) -> u8 {
        match self {
            GradeLevel::Grade6 => 6,
            GradeLevel::Grade7 => 7,
            GradeLevel::Grade8 => 8,
            GradeLevel::Grade9 => 9,
        }
    }

    /// Display metadata for the grade
    pub fn info(&self) -> GradeInfo {
        match self {
            GradeLevel::Grade6 => GradeInfo {
                label: "LỚP 6",
                subtitle: "Khởi động hành trình",
            },
            GradeLevel::Grade7 => GradeInfo {
                label: "LỚP 7",
                subtitle: "Khám phá hình học",
            },
            GradeLevel::Grade8 => GradeInfo {
                label: "LỚP 8",
                subtitle: "Tư duy đại số",
            },
            GradeLevel::Grade9 => GradeInfo {
                label: "LỚP 9",
                subtitle: "Chinh phục đỉnh cao",
            },
        }
    }

    /// Practice topics offered for this grade, random topic first
    pub fn topics(&self) -> &'static [&'static str] {
        match self {
            GradeLevel::Grade6 => &[
                RANDOM_TOPIC,
                "Số tự nhiên",
                "Số nguyên",
                "Phân số & Số thập phân",
                "Hình học trực quan",
                "Thống kê & Xác suất",
            ],
            GradeLevel::Grade7 => &[
                RANDOM_TOPIC,
                "Số hữu tỉ & Số thực",
                "Góc & Đường thẳng song song",
                "Tam giác bằng nhau",
                "Biểu thức đại số",
            ],
            GradeLevel::Grade8 => &[
                RANDOM_TOPIC,
                "Đa thức & Hằng đẳng thức",
                "Phân thức đại số",
                "Tứ giác & Định lí Thalès",
                "Hàm số bậc nhất",
            ],
            GradeLevel::Grade9 => &[
                RANDOM_TOPIC,
                "Căn bậc hai",
                "Hệ phương trình",
                "Phương trình bậc hai",
                "Hệ thức lượng giác",
                "Đường tròn",
            ],
        }
    }

    /// Concepts the tutor may use at this grade
    pub fn allowed_concepts(&self) -> &'static [&'static str] {
        match self {
            GradeLevel::Grade6 => &[
                "Số tự nhiên",
                "Số nguyên (âm/dương)",
                "Phân số",
                "Số thập phân",
                "Hình học trực quan (tam giác đều, lục giác đều...)",
                "Xác suất thực nghiệm",
            ],
            GradeLevel::Grade7 => &[
                "Số hữu tỉ",
                "Số thực",
                "Tỉ lệ thức",
                "Biểu thức đại số",
                "Tam giác bằng nhau",
                "Góc và đường thẳng song song",
            ],
            GradeLevel::Grade8 => &[
                "Hằng đẳng thức",
                "Phân tích đa thức thành nhân tử",
                "Tứ giác",
                "Định lí Thalès",
                "Tam giác đồng dạng",
                "Hàm số bậc nhất",
            ],
            GradeLevel::Grade9 => &[
                "Căn bậc hai/ba",
                "Hệ phương trình",
                "Phương trình bậc hai (Viète)",
                "Hệ thức lượng giác",
                "Đường tròn",
                "Hình trụ/nón/cầu",
            ],
        }
    }

    /// Concepts the tutor must not use at this grade
    ///
    /// Grade 9 is the top of the range and forbids nothing.
    pub fn denied_concepts(&self) -> &'static [&'static str] {
        match self {
            GradeLevel::Grade6 => &[
                "Số hữu tỉ",
                "Căn bậc hai",
                "Đa thức",
                "Phương trình bậc nhất",
                "Tam giác đồng dạng",
            ],
            GradeLevel::Grade7 => &[
                "Hằng đẳng thức đáng nhớ",
                "Hình bình hành/thoi (tính chất sâu)",
                "Phương trình bậc 2",
            ],
            GradeLevel::Grade8 => &[
                "Hệ thức lượng trong tam giác vuông",
                "Đường tròn (góc nội tiếp...)",
                "Hệ phương trình",
            ],
            GradeLevel::Grade9 => &[],
        }
    }

    /// Resolve a user-supplied topic name against this grade's topics
    ///
    /// `random` and the Vietnamese random topic name map to `Topic::Random`;
    /// anything else must match one of `topics()` case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `MathGeniusError::Curriculum` naming the valid topics
    ///
    /// # Examples
    ///
    /// ```
    /// use mathgenius::curriculum::{GradeLevel, Topic};
    ///
    /// let grade = GradeLevel::Grade9;
    /// assert_eq!(grade.resolve_topic("random").unwrap(), Topic::Random);
    /// assert_eq!(
    ///     grade.resolve_topic("đường tròn").unwrap(),
    ///     Topic::Named("Đường tròn")
    /// );
    /// assert!(grade.resolve_topic("Tứ giác").is_err());
    /// ```
    pub fn resolve_topic(&self, name: &str) -> Result<Topic> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() || wanted == "random" || wanted == RANDOM_TOPIC.to_lowercase() {
            return Ok(Topic::Random);
        }

        self.topics()
            .iter()
            .skip(1)
            .find(|topic| topic.to_lowercase() == wanted)
            .map(|topic| Topic::Named(*topic))
            .ok_or_else(|| {
                MathGeniusError::Curriculum(format!(
                    "Unknown topic for {}: {}. Valid topics: {}",
                    self,
                    name.trim(),
                    self.topics().join(", ")
                ))
                .into()
            })
    }

    /// Greeting that opens every session at this grade
    pub fn welcome_message(&self) -> String {
        format!(
            "Chào mừng đến với không gian Toán học Lớp {}. Hôm nay chúng ta sẽ chinh phục thử thách nào?",
            self.number()
        )
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lớp {}", self.number())
    }
}

impl FromStr for GradeLevel {
    type Err = MathGeniusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let digits = lower
            .trim_start_matches("grade")
            .trim_start_matches("lớp")
            .trim_start_matches("lop")
            .trim();

        match digits.parse::<u8>() {
            Ok(6) => Ok(GradeLevel::Grade6),
            Ok(7) => Ok(GradeLevel::Grade7),
            Ok(8) => Ok(GradeLevel::Grade8),
            Ok(9) => Ok(GradeLevel::Grade9),
            _ => Err(MathGeniusError::Curriculum(format!(
                "Unknown grade: {}. Must be one of: 6, 7, 8, 9",
                s.trim()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_error_contains;

    #[test]
    fn test_from_number_round_trips_number() {
        for grade in GradeLevel::ALL {
            assert_eq!(GradeLevel::from_number(grade.number()).unwrap(), grade);
        }
    }

    #[test]
    fn test_from_number_rejects_out_of_range() {
        assert!(GradeLevel::from_number(5).is_err());
        assert!(GradeLevel::from_number(10).is_err());
        assert!(GradeLevel::from_number(0).is_err());
    }

    #[test]
    fn test_from_str_accepts_prefixes() {
        assert_eq!("6".parse::<GradeLevel>().unwrap(), GradeLevel::Grade6);
        assert_eq!("grade7".parse::<GradeLevel>().unwrap(), GradeLevel::Grade7);
        assert_eq!("Lớp 8".parse::<GradeLevel>().unwrap(), GradeLevel::Grade8);
        assert_eq!("lop9".parse::<GradeLevel>().unwrap(), GradeLevel::Grade9);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("twelve".parse::<GradeLevel>().is_err());
        assert!("12".parse::<GradeLevel>().is_err());
        assert!("".parse::<GradeLevel>().is_err());
        assert_error_contains("5".parse::<GradeLevel>(), "Must be one of: 6, 7, 8, 9");
    }

    #[test]
    fn test_display_uses_vietnamese_label() {
        assert_eq!(GradeLevel::Grade6.to_string(), "Lớp 6");
        assert_eq!(GradeLevel::Grade9.info().label, "LỚP 9");
    }

    #[test]
    fn test_every_grade_lists_random_topic_first() {
        for grade in GradeLevel::ALL {
            assert_eq!(grade.topics()[0], RANDOM_TOPIC);
            assert!(grade.topics().len() > 1);
        }
    }

    #[test]
    fn test_grade_nine_has_no_denied_concepts() {
        assert!(GradeLevel::Grade9.denied_concepts().is_empty());
        for grade in &GradeLevel::ALL[..3] {
            assert!(!grade.denied_concepts().is_empty());
        }
    }

    #[test]
    fn test_resolve_topic_random_variants() {
        let grade = GradeLevel::Grade6;
        assert_eq!(grade.resolve_topic("random").unwrap(), Topic::Random);
        assert_eq!(grade.resolve_topic("NGẪU NHIÊN").unwrap(), Topic::Random);
        assert_eq!(grade.resolve_topic("  ").unwrap(), Topic::Random);
    }

    #[test]
    fn test_resolve_topic_is_case_insensitive() {
        let topic = GradeLevel::Grade7.resolve_topic("tam giác bằng nhau").unwrap();
        assert_eq!(topic, Topic::Named("Tam giác bằng nhau"));
    }

    #[test]
    fn test_resolve_topic_from_other_grade_fails() {
        let err = GradeLevel::Grade6
            .resolve_topic("Hệ phương trình")
            .unwrap_err();
        assert!(err.to_string().contains("Unknown topic"));
        assert!(err.to_string().contains("Số tự nhiên"));
    }

    #[test]
    fn test_welcome_message_names_grade() {
        let message = GradeLevel::Grade8.welcome_message();
        assert!(message.starts_with("Chào mừng"));
        assert!(message.contains("Lớp 8"));
    }
}
