//! SQLite 持久化实现

mod annotation_repo;
mod database;
mod favorite_repo;
mod session_repo;
mod settings_repo;

pub use annotation_repo::SqliteAnnotationRepository;
pub use database::{create_pool, run_migrations, DatabaseConfig, DbPool};
pub use favorite_repo::SqliteFavoriteRepository;
pub use session_repo::SqliteSessionRepository;
pub use settings_repo::SqliteSettingsRepository;
