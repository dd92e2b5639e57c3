use reel_core::{KeepInterval, SniffItem, Task};

use crate::BackendError;

/// Operations the download backend exposes to the reconciliation layer.
///
/// Every call is awaited; results come back to the dispatcher as messages.
#[async_trait::async_trait]
pub trait TaskBackend: Send + Sync {
    async fn create_task(&self, item: &SniffItem) -> Result<Task, BackendError>;
    async fn start_download(&self, task_id: &str) -> Result<(), BackendError>;
    async fn stop_download(&self, task_id: &str) -> Result<(), BackendError>;
    async fn delete_task(&self, task_id: &str) -> Result<(), BackendError>;
    async fn update_task_clips(
        &self,
        task_id: &str,
        clips: &[KeepInterval],
    ) -> Result<(), BackendError>;
    /// Points an existing task at a freshly sniffed source, keeping its id
    /// and save path.
    async fn rebind_task(&self, task_id: &str, item: &SniffItem) -> Result<(), BackendError>;
    async fn get_tasks(&self) -> Result<Vec<Task>, BackendError>;
    async fn set_expanded_window(&self, expanded: bool) -> Result<(), BackendError>;
    /// Returns the new pinned state.
    async fn toggle_pinned(&self) -> Result<bool, BackendError>;
    async fn open_download_directory(&self) -> Result<(), BackendError>;
    async fn launch_browser(&self) -> Result<(), BackendError>;
    async fn quit_application(&self) -> Result<(), BackendError>;
}
