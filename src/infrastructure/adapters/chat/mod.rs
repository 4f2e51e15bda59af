//! Chat Adapter - 对话补全客户端实现

mod fake_client;
mod openai_client;

pub use fake_client::FakeChatClient;
pub use openai_client::{OpenAiChatClient, OpenAiClientConfig};
