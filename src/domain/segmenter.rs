//! 文档分段器
//!
//! 将 Markdown 文本按标题行切分为有序的 Cell 序列，
//! 以及针对无标题粘贴文本的空行分段入口

use super::annotation::extract_heading;

/// 单个文件内容上限（字节），超过则不做逐行分段
pub const MAX_CONTENT_BYTES: usize = 5 * 1024 * 1024;

/// 单个文件行数上限，超出部分直接丢弃
pub const MAX_LINES: usize = 50_000;

/// Cell 数量上限，超出部分折叠为一个截断标记 Cell
pub const MAX_CELLS: usize = 1_000;

/// 文件过大时保留的内容前缀（字节）
const OVERSIZE_PREVIEW_BYTES: usize = 100_000;

/// 截断标记 Cell 的内容
pub const TRUNCATED_MARKER: &str = "[Remaining cells truncated - file too large]";

/// 文件过大时的标记 Cell 内容
pub const OVERSIZE_MARKER: &str =
    "[File too large to parse into cells - displaying as single block]";

/// 文档中的一个有序分段
///
/// `text` 包含标题行本身；`heading` 为第一个以 `#` 开头的行，
/// 没有标题时为哨兵值 `[No Heading]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// 在 Cell 序列中的位置（0 起始）
    pub index: usize,
    /// 原始内容（含标题行）
    pub text: String,
    /// 标题行（或哨兵值）
    pub heading: String,
}

impl Cell {
    fn new(index: usize, text: String) -> Self {
        let heading = extract_heading(&text);
        Self {
            index,
            text,
            heading,
        }
    }
}

/// 按标题行分段
///
/// 扫描每一行：遇到以 `#` 开头的行且当前已有累积内容时，
/// 关闭当前 Cell 并以该标题行开启新 Cell。
/// 保证：各 Cell 连续不重叠，用 `\n` 连接后可完整还原原文。
/// 空内容产生恰好一个空 Cell。
pub fn segment(content: &str) -> Vec<Cell> {
    if content.len() > MAX_CONTENT_BYTES {
        let preview = truncate_at_char_boundary(content, OVERSIZE_PREVIEW_BYTES);
        return vec![
            Cell::new(0, OVERSIZE_MARKER.to_string()),
            Cell::new(1, preview.to_string()),
        ];
    }

    let mut lines: Vec<&str> = content.split('\n').collect();
    if lines.len() > MAX_LINES {
        lines.truncate(MAX_LINES);
    }

    let mut texts: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in lines {
        if line.starts_with('#') && !current.is_empty() {
            texts.push(current.join("\n"));
            current = vec![line];
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        texts.push(current.join("\n"));
    }

    if texts.is_empty() {
        texts.push(content.to_string());
    }

    cap_and_index(texts)
}

/// 按空行分段（用于无标题的粘贴文本）
///
/// 规范化换行符后按空行段落切分，为每个非空块合成
/// `# Cell {n}` 标题（1 起始）并置于块首。
pub fn segment_by_blank_lines(content: &str) -> Vec<Cell> {
    if content.len() > MAX_CONTENT_BYTES {
        let preview = truncate_at_char_boundary(content, OVERSIZE_PREVIEW_BYTES);
        return vec![
            Cell::new(0, OVERSIZE_MARKER.to_string()),
            Cell::new(1, preview.to_string()),
        ];
    }

    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let trimmed = normalized.trim();

    let mut texts: Vec<String> = Vec::new();
    let mut numbered = 0usize;
    for block in split_on_blank_lines(trimmed) {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        numbered += 1;
        texts.push(format!("# Cell {}\n{}", numbered, block));
    }

    if texts.is_empty() {
        texts.push(content.to_string());
    }

    cap_and_index(texts)
}

/// 将文本在空行（仅含空白的行）处切开
fn split_on_blank_lines(text: &str) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }

    blocks
}

/// 应用 Cell 数量上限并编号
fn cap_and_index(mut texts: Vec<String>) -> Vec<Cell> {
    if texts.len() > MAX_CELLS {
        texts.truncate(MAX_CELLS);
        texts.push(TRUNCATED_MARKER.to_string());
    }

    texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| Cell::new(index, text))
        .collect()
}

/// 在字符边界处截断字符串前缀
fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// 用换行符拼接 Cell 内容，还原原始文本
pub fn reconstruct(cells: &[Cell]) -> String {
    cells
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::annotation::NO_HEADING;

    #[test]
    fn test_two_headings_two_cells() {
        let cells = segment("# A\nfoo\n# B\nbar");
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].text, "# A\nfoo");
        assert_eq!(cells[0].heading, "# A");
        assert_eq!(cells[1].text, "# B\nbar");
        assert_eq!(cells[1].index, 1);
    }

    #[test]
    fn test_leading_body_before_first_heading() {
        // 第一个标题前的内容归入第一个 Cell
        let cells = segment("intro\n# A\nfoo");
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].text, "intro");
        assert_eq!(cells[0].heading, NO_HEADING);
        assert_eq!(cells[1].text, "# A\nfoo");
    }

    #[test]
    fn test_no_headings_single_cell() {
        let cells = segment("just\nplain\ntext");
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].heading, NO_HEADING);
    }

    #[test]
    fn test_empty_content_single_empty_cell() {
        let cells = segment("");
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].text, "");
    }

    #[test]
    fn test_reconstruct_roundtrip() {
        let samples = [
            "# A\nfoo\n# B\nbar",
            "intro\n\n# One\nbody\n## Two\n\nmore\n",
            "no headings at all",
            "",
            "#immediate\n#another",
        ];
        for content in samples {
            let cells = segment(content);
            assert_eq!(reconstruct(&cells), content, "roundtrip for {:?}", content);
        }
    }

    #[test]
    fn test_reconstruct_roundtrip_generated() {
        // 随机混合标题/正文行的往返验证
        let mut content = String::new();
        for i in 0..500 {
            if i % 7 == 0 {
                content.push_str(&format!("# Heading {}\n", i));
            } else if i % 11 == 0 {
                content.push('\n');
            } else {
                content.push_str(&format!("line {}\n", i));
            }
        }
        let cells = segment(&content);
        assert_eq!(reconstruct(&cells), content);
    }

    #[test]
    fn test_cell_cap_appends_marker() {
        let mut content = String::new();
        for i in 0..(MAX_CELLS + 50) {
            content.push_str(&format!("# H{}\nbody\n", i));
        }
        let cells = segment(&content);
        assert_eq!(cells.len(), MAX_CELLS + 1);
        assert_eq!(cells.last().unwrap().text, TRUNCATED_MARKER);
    }

    #[test]
    fn test_blank_line_segmentation() {
        let cells = segment_by_blank_lines("first block\nstill first\n\nsecond block\n\n\nthird");
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].text, "# Cell 1\nfirst block\nstill first");
        assert_eq!(cells[0].heading, "# Cell 1");
        assert_eq!(cells[1].text, "# Cell 2\nsecond block");
        assert_eq!(cells[2].text, "# Cell 3\nthird");
    }

    #[test]
    fn test_blank_line_segmentation_normalizes_crlf() {
        let cells = segment_by_blank_lines("a\r\n\r\nb");
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].text, "# Cell 1\na");
        assert_eq!(cells[1].text, "# Cell 2\nb");
    }

    #[test]
    fn test_blank_line_segmentation_skips_whitespace_blocks() {
        let cells = segment_by_blank_lines("a\n\n   \n\nb");
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1].text, "# Cell 2\nb");
    }

    #[test]
    fn test_oversize_content_collapsed() {
        let content = "x".repeat(MAX_CONTENT_BYTES + 1);
        let cells = segment(&content);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].text, OVERSIZE_MARKER);
        assert!(cells[1].text.len() <= 100_000);
    }
}
