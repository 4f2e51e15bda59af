//! Lenk - Markdown 批注与朗读引擎
//!
//! 组合根：配置 -> 日志 -> sqlite -> 服务 -> axum 服务器

use std::sync::Arc;

use lenk::application::{
    AnnotationService, NarrationScheduler, SessionService, WorkspaceService, DEFAULT_DEBOUNCE,
};
use lenk::config::{load_config, print_config};
use lenk::infrastructure::adapters::chat::{OpenAiChatClient, OpenAiClientConfig};
use lenk::infrastructure::adapters::speech::SayEngine;
use lenk::infrastructure::http::{AppState, HttpServer, ServerConfig};
use lenk::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteAnnotationRepository,
    SqliteFavoriteRepository, SqliteSessionRepository, SqliteSettingsRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},lenk={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Lenk - Markdown 批注与朗读引擎");
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: format!("sqlite:{}?mode=rwc", config.database.path),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    // 创建 Repository 适配器
    let annotation_repo = Arc::new(SqliteAnnotationRepository::new(pool.clone()));
    let favorite_repo = Arc::new(SqliteFavoriteRepository::new(pool.clone()));
    let settings_repo = Arc::new(SqliteSettingsRepository::new(pool.clone()));
    let session_repo = Arc::new(SqliteSessionRepository::new(pool));

    // 创建语音合成引擎与朗读调度器
    let speech_engine = Arc::new(SayEngine::new(&config.speech.command));
    let narration = Arc::new(NarrationScheduler::new(
        speech_engine,
        settings_repo.clone(),
    ));
    narration.set_enabled(config.speech.auto_narration);

    // 创建 OpenAI 客户端（API key 每次请求时从设置读取）
    let chat_config = OpenAiClientConfig {
        base_url: config.chat.url.clone(),
        model: config.chat.model.clone(),
        timeout_secs: config.chat.timeout_secs,
    };
    let chat_client = Arc::new(
        OpenAiChatClient::new(chat_config, settings_repo.clone())
            .map_err(|e| anyhow::anyhow!("Failed to create chat client: {}", e))?,
    );

    // 创建应用服务
    let annotations = Arc::new(AnnotationService::new(
        annotation_repo,
        favorite_repo.clone(),
        chat_client,
        narration.clone(),
    ));
    let workspace = Arc::new(WorkspaceService::new(favorite_repo, settings_repo.clone()));
    let session = Arc::new(SessionService::new(
        session_repo,
        settings_repo,
        DEFAULT_DEBOUNCE,
    ));

    // 创建 HTTP 服务器
    let mut server_config = ServerConfig::new(&config.server.host, config.server.port);
    if config.server.static_files.enabled {
        server_config = server_config
            .with_static_dir(config.server.static_files.dir.display().to_string());
    }
    let state = AppState::new(annotations, workspace, session, narration);

    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
