//! 路径规范化
//!
//! 所有持久化键都使用规范化的绝对路径

use std::path::{Path, PathBuf};

/// 用户主目录（HOME 环境变量，取不到时退回根目录）
pub fn home_directory() -> String {
    std::env::var("HOME").unwrap_or_else(|_| "/".to_string())
}

/// 规范化路径：展开 `~`，相对路径补全为绝对路径
///
/// 不要求路径存在，因此不使用 canonicalize
pub fn normalize_path(path: &str) -> String {
    let expanded: PathBuf = if path == "~" {
        PathBuf::from(home_directory())
    } else if let Some(rest) = path.strip_prefix("~/") {
        Path::new(&home_directory()).join(rest)
    } else {
        PathBuf::from(path)
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    };

    absolute.to_string_lossy().into_owned()
}
