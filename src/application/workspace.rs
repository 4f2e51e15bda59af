//! 工作区服务
//!
//! 目录浏览、收藏夹与顶层设置。批量扫描中坏掉的条目
//! 逐个吞掉，单个坏条目不拖垮整个列表。

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::application::error::ApplicationError;
use crate::application::paths::{home_directory, normalize_path};
use crate::application::ports::{
    setting_keys, FavoriteRepositoryPort, SettingsRepositoryPort,
};

/// 目录列表中的一项
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub is_markdown: bool,
    pub starred: bool,
}

/// 一次目录列举的结果
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryListing {
    pub path: String,
    pub entries: Vec<DirectoryEntry>,
    /// 上级目录；根目录时为 None
    pub parent: Option<String>,
}

/// 收藏夹中的一项（仅保留仍然存在的路径）
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
}

/// 顶层设置视图
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceSettings {
    pub home_directory: String,
    pub voice_speed: u32,
}

/// 工作区服务
pub struct WorkspaceService {
    favorites: Arc<dyn FavoriteRepositoryPort>,
    settings: Arc<dyn SettingsRepositoryPort>,
}

impl WorkspaceService {
    pub fn new(
        favorites: Arc<dyn FavoriteRepositoryPort>,
        settings: Arc<dyn SettingsRepositoryPort>,
    ) -> Self {
        Self {
            favorites,
            settings,
        }
    }

    // ------------------------------------------------------------------
    // 目录浏览
    // ------------------------------------------------------------------

    /// 列举目录内容：按名称排序、跳过隐藏条目、标记收藏与 Markdown
    ///
    /// 目录不可读时降级为空列表而非报错
    pub async fn list_directory(
        &self,
        path: Option<&str>,
        markdown_only: bool,
    ) -> Result<DirectoryListing, ApplicationError> {
        let directory = match path {
            Some(p) => normalize_path(p),
            None => self.home().await?,
        };

        let mut entries = Vec::new();
        if let Ok(mut read_dir) = tokio::fs::read_dir(&directory).await {
            while let Ok(Some(entry)) = read_dir.next_entry().await {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') {
                    continue;
                }
                // 单个条目的元数据失败不影响其余条目
                let is_dir = match entry.file_type().await {
                    Ok(file_type) => file_type.is_dir(),
                    Err(_) => continue,
                };
                let is_markdown = name.to_lowercase().ends_with(".md");
                if markdown_only && !(is_dir || is_markdown) {
                    continue;
                }
                let entry_path = entry.path().to_string_lossy().into_owned();
                entries.push(DirectoryEntry {
                    starred: self.favorites.is_starred(&entry_path).await.unwrap_or(false),
                    name,
                    path: entry_path,
                    is_dir,
                    is_markdown,
                });
            }
        } else {
            tracing::warn!(directory = %directory, "Directory unreadable, returning empty listing");
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let parent = if directory == "/" {
            None
        } else {
            Path::new(&directory)
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
        };

        Ok(DirectoryListing {
            path: directory,
            entries,
            parent,
        })
    }

    // ------------------------------------------------------------------
    // 收藏夹
    // ------------------------------------------------------------------

    /// 收藏列表，已消失的路径被静默过滤
    pub async fn favorites(&self) -> Result<Vec<FavoriteEntry>, ApplicationError> {
        let mut results = Vec::new();
        for path in self.favorites.list_starred().await? {
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(m) => m,
                Err(_) => continue,
            };
            let name = Path::new(&path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            results.push(FavoriteEntry {
                name,
                path,
                is_dir: metadata.is_dir(),
            });
        }
        Ok(results)
    }

    /// 切换收藏状态，返回切换后的状态
    pub async fn toggle_star(&self, path: &str) -> Result<bool, ApplicationError> {
        let normalized = normalize_path(path);
        if self.favorites.is_starred(&normalized).await? {
            self.favorites.unstar(&normalized).await?;
            Ok(false)
        } else {
            self.favorites.star(&normalized).await?;
            Ok(true)
        }
    }

    pub async fn is_starred(&self, path: &str) -> Result<bool, ApplicationError> {
        Ok(self.favorites.is_starred(&normalize_path(path)).await?)
    }

    // ------------------------------------------------------------------
    // 设置
    // ------------------------------------------------------------------

    /// 主目录设置，缺省为用户主目录
    pub async fn home(&self) -> Result<String, ApplicationError> {
        Ok(self
            .settings
            .get(setting_keys::HOME_DIRECTORY)
            .await?
            .unwrap_or_else(home_directory))
    }

    pub async fn current_settings(&self) -> Result<WorkspaceSettings, ApplicationError> {
        let voice_speed = self
            .settings
            .get(setting_keys::VOICE_SPEED)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(crate::application::narration::BASE_RATE);
        Ok(WorkspaceSettings {
            home_directory: self.home().await?,
            voice_speed,
        })
    }

    /// 更新顶层设置；home_directory 必须是已存在的目录
    pub async fn update_settings(
        &self,
        home_directory: Option<&str>,
        voice_speed: Option<u32>,
        openai_api_key: Option<&str>,
    ) -> Result<(), ApplicationError> {
        if let Some(dir) = home_directory {
            let normalized = normalize_path(dir);
            let metadata = tokio::fs::metadata(&normalized)
                .await
                .map_err(|_| ApplicationError::validation(format!("Not a directory: {}", normalized)))?;
            if !metadata.is_dir() {
                return Err(ApplicationError::validation(format!(
                    "Not a directory: {}",
                    normalized
                )));
            }
            self.settings
                .set(setting_keys::HOME_DIRECTORY, &normalized)
                .await?;
        }
        if let Some(speed) = voice_speed {
            if speed == 0 {
                return Err(ApplicationError::validation("voice_speed cannot be 0"));
            }
            self.settings
                .set(setting_keys::VOICE_SPEED, &speed.to_string())
                .await?;
        }
        if let Some(key) = openai_api_key {
            self.settings
                .set(setting_keys::OPENAI_API_KEY, key)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteFavoriteRepository,
        SqliteSettingsRepository,
    };

    async fn service() -> WorkspaceService {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        WorkspaceService::new(
            Arc::new(SqliteFavoriteRepository::new(pool.clone())),
            Arc::new(SqliteSettingsRepository::new(pool)),
        )
    }

    #[tokio::test]
    async fn test_list_directory_sorted_and_flagged() {
        let service = service().await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "# B").unwrap();
        std::fs::write(dir.path().join("a.txt"), "plain").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join(".hidden"), "x").unwrap();

        let listing = service
            .list_directory(Some(dir.path().to_str().unwrap()), false)
            .await
            .unwrap();

        let names: Vec<&str> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.md", "sub"]);
        assert!(listing.entries[1].is_markdown);
        assert!(listing.entries[2].is_dir);
        assert!(listing.parent.is_some());
    }

    #[tokio::test]
    async fn test_list_directory_markdown_only() {
        let service = service().await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keep.md"), "# K").unwrap();
        std::fs::write(dir.path().join("drop.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let listing = service
            .list_directory(Some(dir.path().to_str().unwrap()), true)
            .await
            .unwrap();

        let names: Vec<&str> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["keep.md", "sub"]);
    }

    #[tokio::test]
    async fn test_unreadable_directory_degrades_to_empty() {
        let service = service().await;
        let listing = service
            .list_directory(Some("/no/such/directory"), false)
            .await
            .unwrap();
        assert!(listing.entries.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_star_roundtrip() {
        let service = service().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();

        assert!(service.toggle_star(path).await.unwrap());
        assert!(service.is_starred(path).await.unwrap());
        assert!(!service.toggle_star(path).await.unwrap());
        assert!(!service.is_starred(path).await.unwrap());
        // 再次收藏后恰好一行
        assert!(service.toggle_star(path).await.unwrap());
        assert_eq!(service.favorites().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_favorites_filter_vanished_paths() {
        let service = service().await;
        let dir = tempfile::tempdir().unwrap();
        let keep = dir.path().join("keep.md");
        std::fs::write(&keep, "# K").unwrap();

        service.toggle_star(keep.to_str().unwrap()).await.unwrap();
        service.toggle_star("/gone/file.md").await.unwrap();

        let favorites = service.favorites().await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].name, "keep.md");
    }

    #[tokio::test]
    async fn test_update_settings_validates_home() {
        let service = service().await;
        let err = service
            .update_settings(Some("/definitely/not/here"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));

        let dir = tempfile::tempdir().unwrap();
        service
            .update_settings(Some(dir.path().to_str().unwrap()), Some(250), None)
            .await
            .unwrap();

        let settings = service.current_settings().await.unwrap();
        assert_eq!(settings.home_directory, dir.path().to_str().unwrap());
        assert_eq!(settings.voice_speed, 250);
    }
}
