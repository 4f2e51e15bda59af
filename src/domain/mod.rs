//! Domain Layer - 领域层
//!
//! 纯逻辑，不依赖基础设施:
//! - segmenter: 文档分段（标题 / 空行两种入口）
//! - annotation: Cell 指纹、标题提取、批注值对象
//! - tree: 目录树展开状态的采集与恢复

pub mod annotation;
pub mod segmenter;
pub mod tree;

pub use annotation::{content_hash, extract_heading, Annotation, MatchConfidence, NO_HEADING};
pub use segmenter::{reconstruct, segment, segment_by_blank_lines, Cell};
