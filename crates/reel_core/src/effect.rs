use crate::{KeepInterval, MediaType, SniffItem, TaskId};

/// Why a task is being created from a sniffed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePurpose {
    /// Open a marking session once the task exists.
    Mark,
    /// Start downloading the whole resource right away.
    Download,
}

/// Work the state machine asks the backend side to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadTasks,
    CreateTask {
        item: SniffItem,
        purpose: CreatePurpose,
    },
    StartDownload {
        task_id: TaskId,
    },
    StopDownload {
        task_id: TaskId,
    },
    DeleteTask {
        task_id: TaskId,
    },
    /// Must complete before `StartDownload` for a trimmed task; the start
    /// follows from the `ClipsUpdated` result when `start_after` is set.
    UpdateTaskClips {
        task_id: TaskId,
        clips: Vec<KeepInterval>,
        start_after: bool,
    },
    RebindTask {
        task_id: TaskId,
        item: SniffItem,
    },
    ProbeDuration {
        task_id: TaskId,
        media_type: MediaType,
        playable_url: String,
    },
    SetExpandedWindow(bool),
    TogglePinned,
    OpenDownloadDirectory,
    LaunchBrowser,
    QuitApplication,
}
