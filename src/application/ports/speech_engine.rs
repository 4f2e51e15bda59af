//! Speech Engine Port - 语音合成引擎抽象
//!
//! 朗读通过外部合成进程完成：调用方拿到一个 job 句柄，
//! 以固定间隔轮询存活状态，或主动终止。具体实现在
//! infrastructure/adapters 层（`say` 子进程 / 测试用 fake）

use thiserror::Error;

/// 语音合成错误
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Failed to spawn synthesis process: {0}")]
    SpawnFailed(String),

    #[error("Synthesis engine unavailable: {0}")]
    Unavailable(String),
}

/// 一次进行中的合成任务
///
/// 轮询语义：`is_running` 返回 false 后任务已结束；
/// 对已结束的任务调用 `terminate` 是空操作
pub trait SpeechJob: Send {
    fn is_running(&mut self) -> bool;

    fn terminate(&mut self);
}

/// 语音合成引擎端口
///
/// `speak` 启动合成但不阻塞等待结束；全系统同一时刻
/// 至多一个活跃任务由 NarrationScheduler 保证，引擎无需关心
pub trait SpeechEnginePort: Send + Sync {
    /// 以给定语速（词/分钟）朗读文本，返回任务句柄
    fn speak(&self, text: &str, rate: u32) -> Result<Box<dyn SpeechJob>, SpeechError>;
}
