//! HTTP Handlers

mod ai;
mod comments;
mod favorites;
mod file;
mod narration;
mod ping;
mod session;
mod settings;
mod tree;

pub use ai::*;
pub use comments::*;
pub use favorites::*;
pub use file::*;
pub use narration::*;
pub use ping::*;
pub use session::*;
pub use settings::*;
pub use tree::*;
