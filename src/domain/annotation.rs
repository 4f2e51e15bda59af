//! 批注领域模型
//!
//! Cell 内容指纹、标题提取与批注记录的值对象

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 无标题 Cell 的哨兵值
pub const NO_HEADING: &str = "[No Heading]";

/// 计算 Cell 内容指纹（小写十六进制 md5）
///
/// 指纹只取决于文本的精确字节内容，是批注匹配的强标识
pub fn content_hash(text: &str) -> String {
    let digest = md5::compute(text.as_bytes());
    format!("{:x}", digest)
}

/// 提取 Cell 标题：第一个以 `#` 开头的行（去除首尾空白）
///
/// 没有标题时返回哨兵值。跨编辑的模糊匹配也基于该标题，
/// 因此仅改标题尾部文字会使模糊匹配落空（与原实现一致，按现状保留）。
pub fn extract_heading(cell_text: &str) -> String {
    for line in cell_text.trim().split('\n') {
        if line.starts_with('#') {
            return line.trim().to_string();
        }
    }
    NO_HEADING.to_string()
}

/// 批注匹配置信度（封闭枚举，对应 sqlite 中的文本列）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchConfidence {
    /// Cell 内容与批注创建时完全一致
    Exact,
    /// 仅标题匹配，正文已被编辑
    Fuzzy,
}

impl MatchConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "exact" => Some(Self::Exact),
            "fuzzy" => Some(Self::Fuzzy),
            _ => None,
        }
    }
}

/// 一条已存储的批注
#[derive(Debug, Clone)]
pub struct Annotation {
    /// 单调递增主键
    pub id: i64,
    /// 归属文件的规范化绝对路径
    pub file_path: String,
    /// 创建时 Cell 的标题
    pub heading: String,
    /// 创建时 Cell 的内容指纹
    pub content_hash: String,
    /// 创建时的 Cell 序号（尽力而为，非权威）
    pub cell_index: i64,
    /// 批注正文
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub last_matched_at: DateTime<Utc>,
    pub confidence: MatchConfidence,
}

impl Annotation {
    /// 是否为 AI 生成的批注（`ask_ai` 存储的应答）
    pub fn is_generated(&self) -> bool {
        self.text.starts_with(AI_ANSWER_PREFIX)
    }
}

/// AI 提问批注的前缀
pub const AI_QUESTION_PREFIX: &str = "@chat ";

/// AI 应答批注的前缀
pub const AI_ANSWER_PREFIX: &str = "\u{1F916} AI: ";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        assert_eq!(content_hash("# A\nfoo"), content_hash("# A\nfoo"));
        assert_ne!(content_hash("# A\nfoo"), content_hash("# A\nfoo "));
    }

    #[test]
    fn test_content_hash_known_value() {
        // md5("abc")
        assert_eq!(content_hash("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_extract_heading_first_hash_line() {
        assert_eq!(extract_heading("# Intro\nbody"), "# Intro");
        assert_eq!(extract_heading("body\n## Deep \ntail"), "## Deep");
        assert_eq!(extract_heading("no heading here"), NO_HEADING);
        assert_eq!(extract_heading(""), NO_HEADING);
    }

    #[test]
    fn test_confidence_codec() {
        assert_eq!(MatchConfidence::Exact.as_str(), "exact");
        assert_eq!(
            MatchConfidence::from_str("fuzzy"),
            Some(MatchConfidence::Fuzzy)
        );
        assert_eq!(MatchConfidence::from_str("unknown"), None);
    }
}
