//! HTTP DTO
//!
//! 领域对象到 JSON 响应体的转换

use serde::Serialize;

use crate::application::{FileDetails, ResolvedCell};
use crate::domain::Annotation;

/// 批注响应体
#[derive(Debug, Serialize)]
pub struct AnnotationDto {
    pub id: i64,
    pub text: String,
    pub cell_index: i64,
    pub created_at: String,
    pub last_matched_at: String,
    pub confidence: &'static str,
    pub is_generated: bool,
}

impl From<&Annotation> for AnnotationDto {
    fn from(a: &Annotation) -> Self {
        Self {
            id: a.id,
            text: a.text.clone(),
            cell_index: a.cell_index,
            created_at: a.created_at.to_rfc3339(),
            last_matched_at: a.last_matched_at.to_rfc3339(),
            confidence: a.confidence.as_str(),
            is_generated: a.is_generated(),
        }
    }
}

/// Cell 及其批注的响应体
#[derive(Debug, Serialize)]
pub struct CellDto {
    pub index: usize,
    pub heading: String,
    pub text: String,
    pub comment_count: usize,
    pub fuzzy_count: usize,
    pub annotations: Vec<AnnotationDto>,
}

impl From<&ResolvedCell> for CellDto {
    fn from(resolved: &ResolvedCell) -> Self {
        Self {
            index: resolved.cell.index,
            heading: resolved.cell.heading.clone(),
            text: resolved.cell.text.clone(),
            comment_count: resolved.annotations.len(),
            fuzzy_count: resolved.fuzzy_count(),
            annotations: resolved.annotations.iter().map(AnnotationDto::from).collect(),
        }
    }
}

/// 文件详情响应体
#[derive(Debug, Serialize)]
pub struct FileDetailsDto {
    pub path: String,
    pub title: String,
    pub content: String,
    pub starred: bool,
    pub cells: Vec<CellDto>,
}

impl From<&FileDetails> for FileDetailsDto {
    fn from(details: &FileDetails) -> Self {
        Self {
            path: details.path.clone(),
            title: details.title.clone(),
            content: details.content.clone(),
            starred: details.starred,
            cells: details.cells.iter().map(CellDto::from).collect(),
        }
    }
}
