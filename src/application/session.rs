//! 会话状态服务
//!
//! "当前目录 / 当前文件 / 当前 Cell" 单例状态与目录树
//! 展开状态的持久化；突发事件通过防抖合并为一次写入，
//! 重启后恢复到离开时的位置。

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    setting_keys, SessionRepositoryPort, SessionSnapshot, SettingsRepositoryPort,
};
use crate::domain::tree::TreeViewState;

/// 默认防抖窗口
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// 防抖器：每次调度都取消挂起的任务并重新计时，
/// 只有突发中最后一次调度真正执行
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// 延迟窗口结束后执行 `action`；再次调度会取消前一次
    pub fn schedule<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let mut pending = self.pending.lock().unwrap();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    /// 取消挂起的任务（如果有）
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}

/// 哪一棵树的展开状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    /// 主目录树
    Tree,
    /// 收藏树
    Favorites,
}

impl TreeKind {
    pub fn setting_key(&self) -> &'static str {
        match self {
            TreeKind::Tree => setting_keys::TREE_STATE,
            TreeKind::Favorites => setting_keys::FAVORITES_STATE,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tree" => Some(TreeKind::Tree),
            "favorites" => Some(TreeKind::Favorites),
            _ => None,
        }
    }
}

/// 会话状态服务
pub struct SessionService {
    sessions: Arc<dyn SessionRepositoryPort>,
    settings: Arc<dyn SettingsRepositoryPort>,
    session_debounce: Debouncer,
    tree_debounce: Debouncer,
    favorites_debounce: Debouncer,
}

impl SessionService {
    pub fn new(
        sessions: Arc<dyn SessionRepositoryPort>,
        settings: Arc<dyn SettingsRepositoryPort>,
        debounce: Duration,
    ) -> Self {
        Self {
            sessions,
            settings,
            session_debounce: Debouncer::new(debounce),
            tree_debounce: Debouncer::new(debounce),
            favorites_debounce: Debouncer::new(debounce),
        }
    }

    // ------------------------------------------------------------------
    // 会话单例
    // ------------------------------------------------------------------

    /// 上次保存的会话，没有则返回默认值 (None, None, 0)
    pub async fn load(&self) -> Result<SessionSnapshot, ApplicationError> {
        Ok(self
            .sessions
            .load()
            .await?
            .map(|record| record.snapshot)
            .unwrap_or_default())
    }

    /// 合并传入字段与既有会话并立即持久化（upsert 单例行）
    pub async fn update(
        &self,
        current_directory: Option<String>,
        current_file: Option<String>,
        current_cell: Option<i64>,
    ) -> Result<SessionSnapshot, ApplicationError> {
        let previous = self.load().await?;
        let merged = SessionSnapshot {
            current_directory: current_directory.or(previous.current_directory),
            current_file: current_file.or(previous.current_file),
            current_cell: current_cell.unwrap_or(previous.current_cell),
        };
        self.sessions.save(&merged).await?;
        Ok(merged)
    }

    /// 防抖保存：连续调用只落盘突发中最后一次的状态
    pub fn schedule_debounced_save(&self, snapshot: SessionSnapshot) {
        let sessions = Arc::clone(&self.sessions);
        self.session_debounce.schedule(async move {
            if let Err(e) = sessions.save(&snapshot).await {
                tracing::warn!(error = %e, "Debounced session save failed");
            }
        });
    }

    // ------------------------------------------------------------------
    // 树展开状态
    // ------------------------------------------------------------------

    /// 读取持久化的树视图状态；损坏的 JSON 降级为默认空状态
    pub async fn load_tree_state(&self, kind: TreeKind) -> Result<TreeViewState, ApplicationError> {
        let raw = self.settings.get(kind.setting_key()).await?;
        Ok(raw
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default())
    }

    /// 立即持久化树视图状态
    pub async fn save_tree_state(
        &self,
        kind: TreeKind,
        state: &TreeViewState,
    ) -> Result<(), ApplicationError> {
        let json = serde_json::to_string(state)
            .map_err(|e| ApplicationError::internal(e.to_string()))?;
        self.settings.set(kind.setting_key(), &json).await?;
        Ok(())
    }

    /// 防抖持久化树视图状态（每棵树独立的防抖窗口）
    pub fn schedule_tree_state_save(&self, kind: TreeKind, state: TreeViewState) {
        let settings = Arc::clone(&self.settings);
        let key = kind.setting_key();
        let debouncer = match kind {
            TreeKind::Tree => &self.tree_debounce,
            TreeKind::Favorites => &self.favorites_debounce,
        };
        debouncer.schedule(async move {
            match serde_json::to_string(&state) {
                Ok(json) => {
                    if let Err(e) = settings.set(key, &json).await {
                        tracing::warn!(key, error = %e, "Debounced tree state save failed");
                    }
                }
                Err(e) => tracing::warn!(key, error = %e, "Tree state serialization failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{RepositoryError, SessionRecord};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteSessionRepository,
        SqliteSettingsRepository,
    };

    /// 统计写入次数的会话仓储测试替身
    struct CountingSessionRepo {
        saves: AtomicUsize,
        last: Mutex<Option<SessionSnapshot>>,
    }

    impl CountingSessionRepo {
        fn new() -> Self {
            Self {
                saves: AtomicUsize::new(0),
                last: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl SessionRepositoryPort for CountingSessionRepo {
        async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), RepositoryError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(snapshot.clone());
            Ok(())
        }

        async fn load(&self) -> Result<Option<SessionRecord>, RepositoryError> {
            Ok(self.last.lock().unwrap().clone().map(|snapshot| {
                SessionRecord {
                    snapshot,
                    last_updated: chrono::Utc::now(),
                }
            }))
        }
    }

    async fn sqlite_service() -> SessionService {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SessionService::new(
            Arc::new(SqliteSessionRepository::new(pool.clone())),
            Arc::new(SqliteSettingsRepository::new(pool)),
            Duration::from_millis(30),
        )
    }

    fn snapshot(cell: i64) -> SessionSnapshot {
        SessionSnapshot {
            current_directory: Some("/docs".to_string()),
            current_file: Some("/docs/a.md".to_string()),
            current_cell: cell,
        }
    }

    #[tokio::test]
    async fn test_load_defaults_when_empty() {
        let service = sqlite_service().await;
        let loaded = service.load().await.unwrap();
        assert_eq!(loaded, SessionSnapshot::default());
        assert_eq!(loaded.current_cell, 0);
    }

    #[tokio::test]
    async fn test_update_merges_and_persists() {
        let service = sqlite_service().await;

        service
            .update(Some("/docs".to_string()), Some("/docs/a.md".to_string()), Some(3))
            .await
            .unwrap();
        // 只更新 cell，目录和文件沿用既有值
        let merged = service.update(None, None, Some(7)).await.unwrap();
        assert_eq!(merged.current_directory.as_deref(), Some("/docs"));
        assert_eq!(merged.current_file.as_deref(), Some("/docs/a.md"));
        assert_eq!(merged.current_cell, 7);

        let loaded = service.load().await.unwrap();
        assert_eq!(loaded, merged);
    }

    #[tokio::test]
    async fn test_debounced_burst_writes_once_with_final_state() {
        let repo = Arc::new(CountingSessionRepo::new());
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let service = SessionService::new(
            repo.clone(),
            Arc::new(SqliteSettingsRepository::new(pool)),
            Duration::from_millis(30),
        );

        for cell in 0..5 {
            service.schedule_debounced_save(snapshot(cell));
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(repo.saves.load(Ordering::SeqCst), 1);
        assert_eq!(repo.last.lock().unwrap().as_ref().unwrap().current_cell, 4);
    }

    #[tokio::test]
    async fn test_debounce_rearms_across_bursts() {
        let repo = Arc::new(CountingSessionRepo::new());
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let service = SessionService::new(
            repo.clone(),
            Arc::new(SqliteSettingsRepository::new(pool)),
            Duration::from_millis(30),
        );

        service.schedule_debounced_save(snapshot(1));
        tokio::time::sleep(Duration::from_millis(80)).await;
        service.schedule_debounced_save(snapshot(2));
        tokio::time::sleep(Duration::from_millis(80)).await;

        // 两次独立的突发，各写一次
        assert_eq!(repo.saves.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_tree_state_roundtrip() {
        let service = sqlite_service().await;
        let state = TreeViewState {
            open_paths: vec!["/docs".to_string()],
            selected_path: Some("/docs/a.md".to_string()),
        };

        service.save_tree_state(TreeKind::Tree, &state).await.unwrap();
        let loaded = service.load_tree_state(TreeKind::Tree).await.unwrap();
        assert_eq!(loaded.open_paths, state.open_paths);
        assert_eq!(loaded.selected_path, state.selected_path);

        // 另一棵树的命名空间独立
        let favorites = service.load_tree_state(TreeKind::Favorites).await.unwrap();
        assert!(favorites.open_paths.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_tree_state_degrades_to_default() {
        let service = sqlite_service().await;
        service
            .settings
            .set(setting_keys::TREE_STATE, "not json at all")
            .await
            .unwrap();

        let loaded = service.load_tree_state(TreeKind::Tree).await.unwrap();
        assert!(loaded.open_paths.is_empty());
        assert!(loaded.selected_path.is_none());
    }

    #[tokio::test]
    async fn test_debounced_tree_state_save() {
        let service = sqlite_service().await;

        for i in 0..4 {
            service.schedule_tree_state_save(
                TreeKind::Tree,
                TreeViewState {
                    open_paths: vec![format!("/d{}", i)],
                    selected_path: None,
                },
            );
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        let loaded = service.load_tree_state(TreeKind::Tree).await.unwrap();
        assert_eq!(loaded.open_paths, vec!["/d3".to_string()]);
    }
}
