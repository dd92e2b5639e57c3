use crate::{
    ClipId, CreatePurpose, KeepInterval, PendingOp, SniffItem, TabId, Task, TaskId, TaskProgress,
};

/// How the user wants to use a sniffed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectIntent {
    Mark,
    Download,
}

impl From<SelectIntent> for CreatePurpose {
    fn from(intent: SelectIntent) -> Self {
        match intent {
            SelectIntent::Mark => CreatePurpose::Mark,
            SelectIntent::Download => CreatePurpose::Download,
        }
    }
}

/// Window and process operations that are not tied to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeAction {
    SetExpanded,
    TogglePinned,
    OpenDownloadDirectory,
    LaunchBrowser,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Backend sniffed a media request in a browser tab.
    Sniffed(SniffItem),
    /// Browser focus moved to a tab.
    TabFocused(TabId),
    /// Browser tab was closed.
    TabClosed(TabId),
    /// Backend announced its complete task list.
    TaskListReplaced(Vec<Task>),
    /// Backend reported a partial task update.
    TaskProgress(TaskProgress),
    /// The task list could not be fetched.
    TasksLoadFailed(String),
    /// App start: load the task list.
    Bootstrap,
    /// Drop all sniffed items, tasks and sessions.
    Reset,

    /// User picked an item from the visible sniff list.
    SniffItemSelected { url: String, intent: SelectIntent },
    StartClicked(TaskId),
    StopClicked(TaskId),
    DeleteClicked(TaskId),
    /// User wants to replace the stale source of a task.
    RebindClicked(TaskId),
    RebindCancelled,

    /// Split the clip under the playhead.
    SplitAtPlayhead { time: f64 },
    ClipSelected(ClipId),
    /// Merge the selected clip into its left neighbour.
    MergeSelected,
    ToggleClip(ClipId),
    CommitMarking,
    CancelMarking,
    /// Media metadata for a marking session finished loading.
    MediaDurationKnown { task_id: TaskId, duration_secs: f64 },
    MediaDurationUnavailable { task_id: TaskId, message: String },

    SetExpanded(bool),
    TogglePinnedClicked,
    OpenDownloadDirectoryClicked,
    LaunchBrowserClicked,
    QuitClicked,
    NoticesDismissed,

    /// Result of `Effect::CreateTask`.
    TaskCreated {
        purpose: CreatePurpose,
        result: Result<Task, String>,
    },
    /// Result of a start, stop or delete request.
    RequestCompleted {
        task_id: TaskId,
        op: PendingOp,
        result: Result<(), String>,
    },
    RebindCompleted {
        task_id: TaskId,
        item: SniffItem,
        result: Result<(), String>,
    },
    ClipsUpdated {
        task_id: TaskId,
        clips: Vec<KeepInterval>,
        start_after: bool,
        result: Result<(), String>,
    },
    PinnedChanged(bool),
    ChromeRequestFailed { action: ChromeAction, message: String },

    /// UI/render tick to coalesce rendering.
    Tick,
    NoOp,
}
