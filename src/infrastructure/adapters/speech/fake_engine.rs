//! Fake Speech Engine - 用于测试的语音合成引擎
//!
//! 不产生任何声音。记录朗读文本、并发峰值、被终止次数，
//! 供调度器测试断言 FIFO 与单活跃任务不变量

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::application::ports::{SpeechEnginePort, SpeechError, SpeechJob};

#[derive(Default)]
struct FakeState {
    spoken: Vec<String>,
    running: usize,
    max_concurrent: usize,
    terminated: usize,
    remaining_failures: usize,
}

/// Fake Speech Engine
pub struct FakeSpeechEngine {
    state: Arc<Mutex<FakeState>>,
    /// 每个任务的模拟时长
    duration: Duration,
}

impl FakeSpeechEngine {
    /// 任务立即结束
    pub fn instant() -> Self {
        Self::with_duration(Duration::ZERO)
    }

    /// 任务在给定时长后结束
    pub fn with_duration(duration: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
            duration,
        }
    }

    /// 前 n 次 `speak` 调用返回启动失败
    pub fn failing_first(self, n: usize) -> Self {
        self.state.lock().unwrap().remaining_failures = n;
        self
    }

    /// 已成功启动的朗读文本，按启动顺序
    pub fn spoken(&self) -> Vec<String> {
        self.state.lock().unwrap().spoken.clone()
    }

    /// 同时运行任务的峰值
    pub fn max_concurrent(&self) -> usize {
        self.state.lock().unwrap().max_concurrent
    }

    /// 被主动终止的任务数
    pub fn terminated_count(&self) -> usize {
        self.state.lock().unwrap().terminated
    }
}

struct FakeJob {
    state: Arc<Mutex<FakeState>>,
    deadline: Instant,
    done: bool,
}

impl FakeJob {
    fn finish(&mut self) {
        if !self.done {
            self.done = true;
            self.state.lock().unwrap().running -= 1;
        }
    }
}

impl SpeechJob for FakeJob {
    fn is_running(&mut self) -> bool {
        if self.done {
            return false;
        }
        if Instant::now() >= self.deadline {
            self.finish();
            return false;
        }
        true
    }

    fn terminate(&mut self) {
        if !self.done {
            self.state.lock().unwrap().terminated += 1;
            self.finish();
        }
    }
}

impl Drop for FakeJob {
    fn drop(&mut self) {
        self.finish();
    }
}

impl SpeechEnginePort for FakeSpeechEngine {
    fn speak(&self, text: &str, _rate: u32) -> Result<Box<dyn SpeechJob>, SpeechError> {
        let mut state = self.state.lock().unwrap();
        if state.remaining_failures > 0 {
            state.remaining_failures -= 1;
            return Err(SpeechError::SpawnFailed("injected failure".to_string()));
        }

        state.spoken.push(text.to_string());
        state.running += 1;
        state.max_concurrent = state.max_concurrent.max(state.running);

        Ok(Box::new(FakeJob {
            state: Arc::clone(&self.state),
            deadline: Instant::now() + self.duration,
            done: false,
        }))
    }
}
