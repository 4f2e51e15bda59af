//! Say Engine - 调用系统 `say` 命令的语音合成实现
//!
//! 每次朗读 spawn 一个子进程，速率通过 `-r`（词/分钟）传入。
//! 文本中的 `[[slnc N]]` 停顿标记由 `say` 原生解析

use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::application::ports::{SpeechEnginePort, SpeechError, SpeechJob};

/// Say Engine
pub struct SayEngine {
    /// 合成命令（默认 `say`，测试或移植环境可替换）
    command: String,
}

impl SayEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for SayEngine {
    fn default() -> Self {
        Self::new("say")
    }
}

/// 一个运行中的 `say` 子进程
struct SayJob {
    child: Child,
}

impl SpeechJob for SayJob {
    fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to poll synthesis process, treating as finished");
                false
            }
        }
    }

    fn terminate(&mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::debug!(error = %e, "Synthesis process already gone");
        }
    }
}

impl SpeechEnginePort for SayEngine {
    fn speak(&self, text: &str, rate: u32) -> Result<Box<dyn SpeechJob>, SpeechError> {
        tracing::debug!(
            command = %self.command,
            rate = rate,
            text_len = text.len(),
            "Spawning synthesis process"
        );

        let child = Command::new(&self.command)
            .arg("-r")
            .arg(rate.to_string())
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SpeechError::SpawnFailed(format!("{}: {}", self.command, e)))?;

        Ok(Box::new(SayJob { child }))
    }
}
