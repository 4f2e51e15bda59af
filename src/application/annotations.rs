//! 批注服务 - 组合根
//!
//! 对一个文档：读取内容、分段、解析每个 Cell 的批注，
//! 以及追加批注、AI 提问、导出带批注副本。
//! 分段永远基于当前磁盘内容重新计算，不跨调用缓存，
//! 保证外部编辑总能被看到。

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, Utc};

use crate::application::error::ApplicationError;
use crate::application::narration::{NarrationItem, NarrationScheduler};
use crate::application::paths::normalize_path;
use crate::application::ports::{
    AnnotationRepositoryPort, ChatContext, ChatEnginePort, ChatError, FavoriteRepositoryPort,
    NewAnnotation,
};
use crate::domain::annotation::{AI_ANSWER_PREFIX, AI_QUESTION_PREFIX};
use crate::domain::{content_hash, extract_heading, segment, Annotation, Cell, MatchConfidence};

/// 追加批注的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// 已插入，携带新批注 id
    Inserted(i64),
    /// 完全相同的 (file, heading, hash, text) 已存在，静默拒绝
    Duplicate,
}

/// 一个 Cell 及其解析出的批注
#[derive(Debug, Clone)]
pub struct ResolvedCell {
    pub cell: Cell,
    pub annotations: Vec<Annotation>,
}

impl ResolvedCell {
    pub fn fuzzy_count(&self) -> usize {
        self.annotations
            .iter()
            .filter(|a| a.confidence == MatchConfidence::Fuzzy)
            .count()
    }
}

/// 文件视图：浏览 UI 消费的基本读路径
#[derive(Debug, Clone)]
pub struct FileDetails {
    pub path: String,
    pub title: String,
    pub content: String,
    pub starred: bool,
    pub cells: Vec<ResolvedCell>,
}

/// AI 提问的结果
#[derive(Debug, Clone)]
pub struct AskAiResult {
    pub answer: String,
    /// 提问与应答入库后该 Cell 的最新批注列表
    pub annotations: Vec<Annotation>,
}

/// 批注服务
pub struct AnnotationService {
    annotations: Arc<dyn AnnotationRepositoryPort>,
    favorites: Arc<dyn FavoriteRepositoryPort>,
    chat: Arc<dyn ChatEnginePort>,
    narration: Arc<NarrationScheduler>,
}

impl AnnotationService {
    pub fn new(
        annotations: Arc<dyn AnnotationRepositoryPort>,
        favorites: Arc<dyn FavoriteRepositoryPort>,
        chat: Arc<dyn ChatEnginePort>,
        narration: Arc<NarrationScheduler>,
    ) -> Self {
        Self {
            annotations,
            favorites,
            chat,
            narration,
        }
    }

    /// 两级匹配：精确（file+heading+hash）优先，落空后退回
    /// 仅标题匹配的模糊级。命中即刷新 last_matched_at 并改写置信度。
    /// 两级都落空返回空列表，不是错误。
    pub async fn resolve(
        &self,
        file_path: &str,
        cell: &Cell,
    ) -> Result<Vec<Annotation>, ApplicationError> {
        let heading = extract_heading(&cell.text);
        let hash = content_hash(&cell.text);

        let exact = self
            .annotations
            .find_exact(file_path, &heading, &hash)
            .await?;
        if !exact.is_empty() {
            return self.touch(exact, MatchConfidence::Exact).await;
        }

        let fuzzy = self.annotations.find_by_heading(file_path, &heading).await?;
        if !fuzzy.is_empty() {
            return self.touch(fuzzy, MatchConfidence::Fuzzy).await;
        }

        Ok(Vec::new())
    }

    async fn touch(
        &self,
        mut matched: Vec<Annotation>,
        confidence: MatchConfidence,
    ) -> Result<Vec<Annotation>, ApplicationError> {
        let ids: Vec<i64> = matched.iter().map(|a| a.id).collect();
        self.annotations.mark_matched(&ids, confidence).await?;

        let now = Utc::now();
        for annotation in &mut matched {
            annotation.confidence = confidence;
            annotation.last_matched_at = now;
        }
        Ok(matched)
    }

    /// 以当前 Cell 的标题和指纹追加批注
    pub async fn attach(
        &self,
        file_path: &str,
        cell: &Cell,
        text: &str,
    ) -> Result<AttachOutcome, ApplicationError> {
        let new = NewAnnotation {
            file_path: file_path.to_string(),
            heading: extract_heading(&cell.text),
            content_hash: content_hash(&cell.text),
            cell_index: cell.index as i64,
            text: text.to_string(),
        };

        match self.annotations.insert(&new).await {
            Ok(id) => Ok(AttachOutcome::Inserted(id)),
            Err(crate::application::ports::RepositoryError::Duplicate(_)) => {
                tracing::debug!(file = %file_path, cell = cell.index, "Duplicate annotation rejected");
                Ok(AttachOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 读取并分段文件，逐 Cell 解析批注
    pub async fn file_details(&self, path: &str) -> Result<FileDetails, ApplicationError> {
        let normalized = normalize_path(path);
        let content = tokio::fs::read_to_string(&normalized)
            .await
            .map_err(|_| ApplicationError::not_found("File", &normalized))?;

        let cells = segment(&content);
        let mut resolved = Vec::with_capacity(cells.len());
        for cell in cells {
            let annotations = self.resolve(&normalized, &cell).await?;
            resolved.push(ResolvedCell { cell, annotations });
        }

        let title = PathBuf::from(&normalized)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| normalized.clone());

        Ok(FileDetails {
            starred: self.favorites.is_starred(&normalized).await?,
            path: normalized,
            title,
            content,
            cells: resolved,
        })
    }

    /// 追加批注到指定序号的 Cell，返回刷新后的批注列表
    ///
    /// Cell 从当前磁盘内容重新推导；序号越界在任何写入前拒绝
    pub async fn add_comment_for_cell(
        &self,
        path: &str,
        cell_index: usize,
        text: &str,
    ) -> Result<(AttachOutcome, Vec<Annotation>), ApplicationError> {
        let (normalized, cell) = self.live_cell(path, cell_index).await?;

        let outcome = self.attach(&normalized, &cell, text).await?;
        let refreshed = self.resolve(&normalized, &cell).await?;

        if let AttachOutcome::Inserted(_) = outcome {
            self.narration.enqueue(NarrationItem {
                text: text.to_string(),
                ordinal: refreshed.len(),
                is_generated: false,
            });
        }

        Ok((outcome, refreshed))
    }

    /// 针对某个 Cell 向对话补全服务提问
    ///
    /// 问题与应答都作为普通批注入库；服务失败不向外抛错，
    /// 错误文本就是应答，交互历史保持完整
    pub async fn ask_ai(
        &self,
        path: &str,
        cell_index: usize,
        question: &str,
    ) -> Result<AskAiResult, ApplicationError> {
        let (normalized, cell) = self.live_cell(path, cell_index).await?;

        let file_content = tokio::fs::read_to_string(&normalized)
            .await
            .map_err(|_| ApplicationError::not_found("File", &normalized))?;
        let prior = self.resolve(&normalized, &cell).await?;

        let context = ChatContext {
            question: question.to_string(),
            cell_text: cell.text.clone(),
            file_content,
            prior_annotations: prior.iter().map(|a| a.text.clone()).collect(),
        };

        let answer = match self.chat.ask(context).await {
            Ok(answer) => answer,
            Err(ChatError::MissingApiKey) => {
                "Error: OpenAI API key not configured. Please add it in Settings.".to_string()
            }
            Err(e) => {
                tracing::warn!(file = %normalized, cell = cell.index, error = %e, "Chat completion failed");
                format!("Error: {}", e)
            }
        };

        let question_text = format!("{}{}", AI_QUESTION_PREFIX, question);
        let answer_text = format!("{}{}", AI_ANSWER_PREFIX, answer);
        self.attach(&normalized, &cell, &question_text).await?;
        self.attach(&normalized, &cell, &answer_text).await?;

        let refreshed = self.resolve(&normalized, &cell).await?;

        if refreshed.len() >= 2 {
            self.narration.enqueue(NarrationItem {
                text: question.to_string(),
                ordinal: refreshed.len() - 1,
                is_generated: false,
            });
        }
        self.narration.enqueue(NarrationItem {
            text: answer.clone(),
            ordinal: refreshed.len(),
            is_generated: true,
        });

        Ok(AskAiResult {
            answer,
            annotations: refreshed,
        })
    }

    /// 导出带批注的副本到源文件旁，返回新文件路径
    ///
    /// 原文件不被修改
    pub async fn export_annotated(&self, path: &str) -> Result<String, ApplicationError> {
        let details = self.file_details(path).await?;

        let mut lines: Vec<String> = Vec::new();
        for resolved in &details.cells {
            lines.push(resolved.cell.text.clone());

            if !resolved.annotations.is_empty() {
                lines.push("\n".to_string());
                lines.push("---".to_string());
                lines.push("\n**\u{1F4AC} Comments:**\n".to_string());
                for annotation in &resolved.annotations {
                    let marker = if annotation.confidence == MatchConfidence::Fuzzy {
                        " \u{26A0}\u{FE0F} (may be outdated)"
                    } else {
                        ""
                    };
                    lines.push(format!(
                        "\n> **Comment** ({}){}:",
                        annotation.created_at.to_rfc3339(),
                        marker
                    ));
                    lines.push(format!("> {}", annotation.text));
                }
                lines.push("\n---\n".to_string());
            }
        }

        let source = PathBuf::from(&details.path);
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        let timestamp = Local::now().format("%Y%m%d_%H%M");
        let target = source
            .with_file_name(format!("{}__annotated__{}.md", stem, timestamp));

        tokio::fs::write(&target, lines.join("\n")).await?;

        let target = target.to_string_lossy().into_owned();
        tracing::info!(source = %details.path, target = %target, "Annotated copy exported");
        Ok(target)
    }

    /// 按需读取指定 Cell 的批注：相对上次读取位置步进 ±1
    ///
    /// 返回 (读取序号, 总数)；该 Cell 没有批注时返回 None
    pub async fn read_comment_relative(
        &self,
        path: &str,
        cell_index: usize,
        direction: i32,
    ) -> Result<Option<(usize, usize)>, ApplicationError> {
        let (normalized, cell) = self.live_cell(path, cell_index).await?;
        let annotations = self.resolve(&normalized, &cell).await?;
        self.narration.read_relative(&annotations, direction).await
    }

    /// 从当前磁盘内容重新推导指定序号的 Cell
    async fn live_cell(
        &self,
        path: &str,
        cell_index: usize,
    ) -> Result<(String, Cell), ApplicationError> {
        let normalized = normalize_path(path);
        let content = tokio::fs::read_to_string(&normalized)
            .await
            .map_err(|_| ApplicationError::not_found("File", &normalized))?;

        let mut cells = segment(&content);
        let total = cells.len();
        if cell_index >= total {
            return Err(ApplicationError::OutOfRange {
                index: cell_index,
                total,
            });
        }

        Ok((normalized, cells.swap_remove(cell_index)))
    }
}
