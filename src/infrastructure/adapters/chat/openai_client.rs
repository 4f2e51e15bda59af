//! OpenAI Chat Client - 调用 OpenAI Chat Completions API
//!
//! 实现 ChatEnginePort trait，通过 HTTPS 调用外部补全服务
//!
//! 外部 API:
//! POST https://api.openai.com/v1/chat/completions
//! Request: {"model": "...", "messages": [...], ...}  (JSON)
//! Response: {"choices": [{"message": {"content": "..."}}]}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    setting_keys, ChatContext, ChatEnginePort, ChatError, SettingsRepositoryPort,
};

const SYSTEM_PROMPT: &str = "You are a helpful assistant analyzing markdown content. \
The user is reviewing a markdown file and has questions about a specific section (cell). \
Provide concise, informative, and contextual responses based on the full file content, \
the current cell, and any previous comments.";

/// Chat 补全请求体 (JSON)
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// OpenAI 客户端配置
#[derive(Debug, Clone)]
pub struct OpenAiClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// 模型名
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for OpenAiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4".to_string(),
            timeout_secs: 60,
        }
    }
}

/// OpenAI Chat 客户端
///
/// API key 不在构造时固定：每次请求前从设置仓储读取，
/// 用户在设置页更新 key 后无需重启即可生效
pub struct OpenAiChatClient {
    client: Client,
    config: OpenAiClientConfig,
    settings: Arc<dyn SettingsRepositoryPort>,
}

impl OpenAiChatClient {
    pub fn new(
        config: OpenAiClientConfig,
        settings: Arc<dyn SettingsRepositoryPort>,
    ) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            settings,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }

    async fn api_key(&self) -> Result<String, ChatError> {
        let key = self
            .settings
            .get(setting_keys::OPENAI_API_KEY)
            .await
            .map_err(|e| ChatError::ServiceError(e.to_string()))?
            .unwrap_or_default();

        if key.trim().is_empty() {
            return Err(ChatError::MissingApiKey);
        }
        Ok(key)
    }

    /// 把问题与上下文拼成单条 user 消息
    fn build_user_content(context: &ChatContext) -> String {
        let mut comments_context = String::new();
        if !context.prior_annotations.is_empty() {
            comments_context.push_str("\n\n## Previous Comments on This Cell:\n");
            for (i, comment) in context.prior_annotations.iter().enumerate() {
                comments_context.push_str(&format!("\n{}. {}\n", i + 1, comment));
            }
        }

        format!(
            "## Full File Content:\n{}\n\n## Current Cell Being Discussed:\n{}\n{}\n\n## User Question:\n{}",
            context.file_content, context.cell_text, comments_context, context.question
        )
    }
}

#[async_trait]
impl ChatEnginePort for OpenAiChatClient {
    async fn ask(&self, context: ChatContext) -> Result<String, ChatError> {
        let api_key = self.api_key().await?;

        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: Self::build_user_content(&context),
                },
            ],
            temperature: 0.7,
            max_tokens: 500,
        };

        tracing::debug!(
            url = %self.completions_url(),
            model = %request.model,
            question_len = context.question.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout
                } else if e.is_connect() {
                    ChatError::NetworkError(format!("Cannot connect to chat service: {}", e))
                } else {
                    ChatError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChatError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        let answer = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ChatError::InvalidResponse("empty choices".to_string()))?;

        tracing::info!(answer_len = answer.len(), "Chat completion received");
        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = OpenAiClientConfig::default();
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.base_url, "https://api.openai.com");
    }

    #[test]
    fn test_user_content_includes_prior_comments() {
        let content = OpenAiChatClient::build_user_content(&ChatContext {
            question: "what?".to_string(),
            cell_text: "# A\nfoo".to_string(),
            file_content: "# A\nfoo\n# B\nbar".to_string(),
            prior_annotations: vec!["earlier note".to_string()],
        });

        assert!(content.contains("## Previous Comments on This Cell:"));
        assert!(content.contains("1. earlier note"));
        assert!(content.ends_with("## User Question:\nwhat?"));
    }

    #[test]
    fn test_user_content_omits_empty_comment_block() {
        let content = OpenAiChatClient::build_user_content(&ChatContext {
            question: "q".to_string(),
            cell_text: "c".to_string(),
            file_content: "f".to_string(),
            prior_annotations: vec![],
        });
        assert!(!content.contains("Previous Comments"));
    }
}
