//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 语音合成配置
    #[serde(default)]
    pub speech: SpeechConfig,

    /// 对话补全配置
    #[serde(default)]
    pub chat: ChatConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// 静态文件服务配置（打包的 Web UI）
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default = "default_static_enabled")]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,
}

fn default_static_enabled() -> bool {
    false
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: default_static_enabled(),
            dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 语音合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// 合成命令（macOS 为 `say`）
    #[serde(default = "default_speech_command")]
    pub command: String,

    /// 启动时是否开启自动朗读
    #[serde(default)]
    pub auto_narration: bool,
}

fn default_speech_command() -> String {
    "say".to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            command: default_speech_command(),
            auto_narration: false,
        }
    }
}

/// 对话补全配置
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// API 基础 URL
    #[serde(default = "default_chat_url")]
    pub url: String,

    /// 模型名
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,
}

fn default_chat_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_chat_model() -> String {
    "gpt-4".to_string()
}

fn default_chat_timeout() -> u64 {
    60
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            url: default_chat_url(),
            model: default_chat_model(),
            timeout_secs: default_chat_timeout(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// sqlite 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 连接池大小
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/lenk.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr(), "127.0.0.1:5000");
        assert_eq!(config.speech.command, "say");
        assert_eq!(config.chat.model, "gpt-4");
        assert_eq!(config.database.max_connections, 5);
        assert!(!config.server.static_files.enabled);
    }
}
