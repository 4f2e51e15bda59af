//! Fake Chat Client - 用于测试的对话补全客户端
//!
//! 返回固定应答或固定错误，不发起任何网络请求

use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{ChatContext, ChatEnginePort, ChatError};

/// Fake Chat Client
pub struct FakeChatClient {
    answer: String,
    failure: Option<String>,
    /// 收到的问题历史
    questions: Mutex<Vec<String>>,
}

impl FakeChatClient {
    /// 对任何问题都返回固定应答
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            failure: None,
            questions: Mutex::new(Vec::new()),
        }
    }

    /// 对任何问题都返回网络错误
    pub fn failing(message: &str) -> Self {
        Self {
            answer: String::new(),
            failure: Some(message.to_string()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatEnginePort for FakeChatClient {
    async fn ask(&self, context: ChatContext) -> Result<String, ChatError> {
        self.questions.lock().unwrap().push(context.question);

        match &self.failure {
            Some(message) => Err(ChatError::NetworkError(message.clone())),
            None => Ok(self.answer.clone()),
        }
    }
}
