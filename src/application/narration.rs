//! 朗读调度器
//!
//! 严格串行的批注朗读队列：全系统同一时刻至多一个合成进程。
//! 两种模式共用同一个进程管理原语：
//! - 自动朗读：新批注入队，FIFO 逐条播完
//! - 按需读取：相对上次读取位置 ±1（模循环），跳过队列、
//!   打断在播任务，只合成一条
//!
//! 完成检测采用协作式轮询（固定间隔查询进程存活），不阻塞线程。

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    setting_keys, SettingsRepositoryPort, SpeechEnginePort, SpeechJob,
};
use crate::domain::{Annotation, MatchConfidence};

/// 默认语速（词/分钟），与暂停时长换算的基准
pub const BASE_RATE: u32 = 200;

/// 基准语速下条目之间的暂停（毫秒）
const BASE_PAUSE_MS: u64 = 1500;

/// 编号与正文之间的固定停顿（毫秒）
const INTRO_PAUSE_MS: u64 = 800;

/// 进程存活轮询间隔
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 模糊匹配批注的朗读前缀
const FUZZY_CAVEAT: &str = "This comment may be outdated. ";

/// 队列中的一个朗读条目（仅存在于内存，从不持久化）
#[derive(Debug, Clone)]
pub struct NarrationItem {
    pub text: String,
    /// 显示编号（1 起始）
    pub ordinal: usize,
    /// AI 应答还是人工批注
    pub is_generated: bool,
}

struct SchedulerInner {
    queue: VecDeque<NarrationItem>,
    active: Option<Box<dyn SpeechJob>>,
    /// 自动朗读的 drain 任务是否在运行
    narrating: bool,
    /// 自动朗读开关
    enabled: bool,
    /// 按需读取模式的上次读取位置
    last_read_index: Option<usize>,
    /// stop/打断时递增，旧任务据此退出
    generation: u64,
}

/// 朗读调度器
pub struct NarrationScheduler {
    engine: Arc<dyn SpeechEnginePort>,
    settings: Arc<dyn SettingsRepositoryPort>,
    inner: Arc<Mutex<SchedulerInner>>,
    poll_interval: Duration,
}

impl NarrationScheduler {
    pub fn new(
        engine: Arc<dyn SpeechEnginePort>,
        settings: Arc<dyn SettingsRepositoryPort>,
    ) -> Self {
        Self {
            engine,
            settings,
            inner: Arc::new(Mutex::new(SchedulerInner {
                queue: VecDeque::new(),
                active: None,
                narrating: false,
                enabled: false,
                last_read_index: None,
                generation: 0,
            })),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// 测试用：缩短轮询间隔
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    // ------------------------------------------------------------------
    // 自动朗读
    // ------------------------------------------------------------------

    /// 追加一个朗读条目；调度器空闲时立即开始消费队列
    ///
    /// 自动朗读关闭时条目被丢弃
    pub fn enqueue(self: &Arc<Self>, item: NarrationItem) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.enabled {
            return;
        }
        inner.queue.push_back(item);

        if !inner.narrating {
            inner.narrating = true;
            let generation = inner.generation;
            drop(inner);
            self.spawn_drain(generation);
        }
    }

    fn spawn_drain(self: &Arc<Self>, generation: u64) {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            scheduler.drain(generation).await;
        });
    }

    /// 逐条消费队列，直到队列空或被 stop 打断
    async fn drain(&self, generation: u64) {
        loop {
            let item = {
                let mut inner = self.inner.lock().unwrap();
                if inner.generation != generation {
                    return;
                }
                match inner.queue.pop_front() {
                    Some(item) => item,
                    None => {
                        inner.narrating = false;
                        return;
                    }
                }
            };

            let rate = self.current_rate().await;
            let text = compose_auto_text(&item, rate);

            let job = match self.engine.speak(&text, rate) {
                Ok(job) => job,
                Err(e) => {
                    // 合成启动失败：重置并继续下一条
                    tracing::warn!(ordinal = item.ordinal, error = %e, "Narration spawn failed, skipping item");
                    continue;
                }
            };

            {
                let mut inner = self.inner.lock().unwrap();
                if inner.generation != generation {
                    let mut job = job;
                    job.terminate();
                    return;
                }
                inner.active = Some(job);
            }

            tracing::debug!(ordinal = item.ordinal, is_generated = item.is_generated, "Narration started");

            if !self.poll_until_finished(generation).await {
                return;
            }
        }
    }

    /// 轮询活跃任务直到结束；被打断时返回 false
    async fn poll_until_finished(&self, generation: u64) -> bool {
        loop {
            tokio::time::sleep(self.poll_interval).await;

            let mut inner = self.inner.lock().unwrap();
            if inner.generation != generation {
                return false;
            }
            match inner.active.as_mut() {
                Some(job) => {
                    if !job.is_running() {
                        inner.active = None;
                        return true;
                    }
                }
                None => return false,
            }
        }
    }

    // ------------------------------------------------------------------
    // 按需读取
    // ------------------------------------------------------------------

    /// 相对上次读取位置步进 ±1 读一条批注（模批注数循环）
    ///
    /// 打断在播任务但不清空队列；返回 (读取序号, 总数)，
    /// 批注为空时返回 None 并复位读取位置
    pub async fn read_relative(
        self: &Arc<Self>,
        annotations: &[Annotation],
        direction: i32,
    ) -> Result<Option<(usize, usize)>, ApplicationError> {
        let rate = self.current_rate().await;

        let mut inner = self.inner.lock().unwrap();
        inner.generation += 1;
        if let Some(mut job) = inner.active.take() {
            job.terminate();
        }
        inner.narrating = false;

        if annotations.is_empty() {
            inner.last_read_index = None;
            return Ok(None);
        }

        let total = annotations.len();
        let target = match inner.last_read_index {
            None => {
                if direction >= 0 {
                    0
                } else {
                    total - 1
                }
            }
            Some(last) => {
                (last as i64 + direction as i64).rem_euclid(total as i64) as usize
            }
        };
        inner.last_read_index = Some(target);

        let annotation = &annotations[target];
        let caveat = if annotation.confidence == MatchConfidence::Fuzzy {
            FUZZY_CAVEAT
        } else {
            ""
        };
        let text = format!("Comment {}. {}{}", target + 1, caveat, annotation.text);

        let job = self
            .engine
            .speak(&text, rate)
            .map_err(|e| ApplicationError::ExternalServiceError(e.to_string()))?;
        inner.active = Some(job);
        let generation = inner.generation;
        drop(inner);

        // 单条读完即空闲，不回到队列消费
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            scheduler.poll_until_finished(generation).await;
        });

        tracing::debug!(index = target, total, "On-demand comment reading started");
        Ok(Some((target, total)))
    }

    // ------------------------------------------------------------------
    // 控制
    // ------------------------------------------------------------------

    /// 终止在播任务、清空队列、复位读取位置，同步回到空闲
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.generation += 1;
        if let Some(mut job) = inner.active.take() {
            // 对已结束进程的 terminate 是空操作
            job.terminate();
        }
        inner.queue.clear();
        inner.narrating = false;
        inner.last_read_index = None;
        tracing::debug!("Narration stopped");
    }

    /// 切换自动朗读开关；关闭时同时停止并清空队列
    pub fn set_enabled(&self, enabled: bool) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.enabled = enabled;
        }
        if !enabled {
            self.stop();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.lock().unwrap().enabled
    }

    pub fn is_narrating(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.narrating || inner.active.is_some()
    }

    pub fn queue_len(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }

    /// 当前语速（settings 中的 voice_speed，缺省 200）
    async fn current_rate(&self) -> u32 {
        self.settings
            .get(setting_keys::VOICE_SPEED)
            .await
            .ok()
            .flatten()
            .and_then(|v| v.parse().ok())
            .unwrap_or(BASE_RATE)
    }
}

/// 合成自动朗读文本：`"{编号}. <停顿> {正文} <停顿>"`
///
/// 尾部停顿与语速成反比：慢速朗读仍有成比例的可感知间隔，
/// 快速朗读不会因固定时长显得拖沓
fn compose_auto_text(item: &NarrationItem, rate: u32) -> String {
    let intro = if item.is_generated {
        format!("A I response. [[slnc {}]]", INTRO_PAUSE_MS)
    } else {
        format!("Comment {}. [[slnc {}]]", item.ordinal, INTRO_PAUSE_MS)
    };
    let pause_ms = BASE_PAUSE_MS * u64::from(BASE_RATE) / u64::from(rate.max(1));
    format!("{} {} [[slnc {}]]", intro, item.text, pause_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::speech::FakeSpeechEngine;
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteSettingsRepository,
    };
    use chrono::Utc;

    async fn scheduler_with_engine(engine: Arc<FakeSpeechEngine>) -> Arc<NarrationScheduler> {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let settings = Arc::new(SqliteSettingsRepository::new(pool));

        let scheduler = NarrationScheduler::new(engine, settings)
            .with_poll_interval(Duration::from_millis(5));
        let scheduler = Arc::new(scheduler);
        scheduler.set_enabled(true);
        scheduler
    }

    fn item(n: usize) -> NarrationItem {
        NarrationItem {
            text: format!("note {}", n),
            ordinal: n,
            is_generated: false,
        }
    }

    fn annotation(id: i64, text: &str, confidence: MatchConfidence) -> Annotation {
        Annotation {
            id,
            file_path: "/doc.md".to_string(),
            heading: "# A".to_string(),
            content_hash: "hash".to_string(),
            cell_index: 0,
            text: text.to_string(),
            created_at: Utc::now(),
            last_matched_at: Utc::now(),
            confidence,
        }
    }

    #[tokio::test]
    async fn test_fifo_order_single_active_job() {
        let engine = Arc::new(FakeSpeechEngine::with_duration(Duration::from_millis(20)));
        let scheduler = scheduler_with_engine(engine.clone()).await;

        for n in 1..=3 {
            scheduler.enqueue(item(n));
        }

        tokio::time::sleep(Duration::from_millis(300)).await;

        let spoken = engine.spoken();
        assert_eq!(spoken.len(), 3);
        assert!(spoken[0].contains("Comment 1."));
        assert!(spoken[1].contains("Comment 2."));
        assert!(spoken[2].contains("Comment 3."));
        assert_eq!(engine.max_concurrent(), 1);
        assert!(!scheduler.is_narrating());
        assert_eq!(scheduler.queue_len(), 0);
    }

    #[tokio::test]
    async fn test_stop_discards_queue_and_terminates() {
        let engine = Arc::new(FakeSpeechEngine::with_duration(Duration::from_secs(5)));
        let scheduler = scheduler_with_engine(engine.clone()).await;

        for n in 1..=3 {
            scheduler.enqueue(item(n));
        }
        tokio::time::sleep(Duration::from_millis(30)).await;

        // 第一条在播，其余排队
        assert!(scheduler.is_narrating());
        scheduler.stop();

        assert!(!scheduler.is_narrating());
        assert_eq!(scheduler.queue_len(), 0);
        assert_eq!(engine.terminated_count(), 1);

        // 停止后不再有新任务启动
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(engine.spoken().len(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_ignored_when_disabled() {
        let engine = Arc::new(FakeSpeechEngine::instant());
        let scheduler = scheduler_with_engine(engine.clone()).await;
        scheduler.set_enabled(false);

        scheduler.enqueue(item(1));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(engine.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_spawn_failure_skips_to_next_item() {
        let engine = Arc::new(FakeSpeechEngine::instant().failing_first(1));
        let scheduler = scheduler_with_engine(engine.clone()).await;

        scheduler.enqueue(item(1));
        scheduler.enqueue(item(2));
        tokio::time::sleep(Duration::from_millis(100)).await;

        // 第一条启动失败被跳过，第二条照常朗读
        let spoken = engine.spoken();
        assert_eq!(spoken.len(), 1);
        assert!(spoken[0].contains("Comment 2."));
        assert!(!scheduler.is_narrating());
    }

    #[tokio::test]
    async fn test_read_relative_steps_forward_with_wraparound() {
        let engine = Arc::new(FakeSpeechEngine::instant());
        let scheduler = scheduler_with_engine(engine.clone()).await;

        let annotations = vec![
            annotation(1, "first", MatchConfidence::Exact),
            annotation(2, "second", MatchConfidence::Exact),
            annotation(3, "third", MatchConfidence::Exact),
        ];

        let mut seen = Vec::new();
        for _ in 0..4 {
            let (index, total) = scheduler
                .read_relative(&annotations, 1)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(total, 3);
            seen.push(index);
        }
        assert_eq!(seen, vec![0, 1, 2, 0]);
    }

    #[tokio::test]
    async fn test_read_relative_backward_starts_at_last() {
        let engine = Arc::new(FakeSpeechEngine::instant());
        let scheduler = scheduler_with_engine(engine.clone()).await;

        let annotations = vec![
            annotation(1, "first", MatchConfidence::Exact),
            annotation(2, "second", MatchConfidence::Exact),
        ];

        let (index, _) = scheduler
            .read_relative(&annotations, -1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(index, 1);
    }

    #[tokio::test]
    async fn test_read_relative_empty_resets_index() {
        let engine = Arc::new(FakeSpeechEngine::instant());
        let scheduler = scheduler_with_engine(engine.clone()).await;

        let result = scheduler.read_relative(&[], 1).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_read_relative_prefixes_fuzzy_caveat() {
        let engine = Arc::new(FakeSpeechEngine::instant());
        let scheduler = scheduler_with_engine(engine.clone()).await;

        let annotations = vec![annotation(1, "drifted", MatchConfidence::Fuzzy)];
        scheduler.read_relative(&annotations, 1).await.unwrap();

        let spoken = engine.spoken();
        assert!(spoken[0].contains("This comment may be outdated."));
    }

    #[test]
    fn test_pause_inversely_proportional_to_rate() {
        let slow = compose_auto_text(&item(1), 100);
        let fast = compose_auto_text(&item(1), 400);
        assert!(slow.ends_with("[[slnc 3000]]"));
        assert!(fast.ends_with("[[slnc 750]]"));
    }

    #[test]
    fn test_generated_item_uses_ai_intro() {
        let text = compose_auto_text(
            &NarrationItem {
                text: "answer".to_string(),
                ordinal: 2,
                is_generated: true,
            },
            BASE_RATE,
        );
        assert!(text.starts_with("A I response."));
    }
}
