//! Application State
//!
//! 所有应用服务的组合状态，handler 通过 `State` 提取

use std::sync::Arc;

use crate::application::{
    AnnotationService, NarrationScheduler, SessionService, WorkspaceService,
};

/// 应用状态
pub struct AppState {
    pub annotations: Arc<AnnotationService>,
    pub workspace: Arc<WorkspaceService>,
    pub session: Arc<SessionService>,
    pub narration: Arc<NarrationScheduler>,
}

impl AppState {
    pub fn new(
        annotations: Arc<AnnotationService>,
        workspace: Arc<WorkspaceService>,
        session: Arc<SessionService>,
        narration: Arc<NarrationScheduler>,
    ) -> Self {
        Self {
            annotations,
            workspace,
            session,
            narration,
        }
    }
}
