use url::Url;

use crate::{
    AppState, ClipId, ClipStatus, MarkingSession, MediaType, Notice, PendingOp, SniffItem, Task,
    TaskId, TaskStatus,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub active_tab: Option<String>,
    pub sniffs: Vec<SniffRowView>,
    pub active_tasks: Vec<TaskRowView>,
    pub done_tasks: Vec<TaskRowView>,
    pub marking: Option<MarkingView>,
    pub rebind_target: Option<TaskId>,
    pub expanded: bool,
    pub pinned: bool,
    pub notices: Vec<Notice>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SniffRowView {
    pub url: String,
    pub display_name: String,
    pub media_type: MediaType,
    pub size_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRowView {
    pub task_id: TaskId,
    pub file_name: String,
    pub status: TaskStatus,
    pub progress_percent: f64,
    pub speed: String,
    pub size_label: String,
    /// A request for this task is waiting on the backend.
    pub busy: bool,
    pub deleting: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkingView {
    pub task_id: TaskId,
    pub playable_url: Option<String>,
    /// False until the media duration is known.
    pub ready: bool,
    pub duration: f64,
    pub clips: Vec<ClipView>,
    pub kept_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipView {
    pub clip_id: ClipId,
    pub start: f64,
    pub end: f64,
    pub status: ClipStatus,
    pub selected: bool,
}

impl AppViewModel {
    pub(crate) fn project(state: &AppState) -> Self {
        let tasks = state.tasks();
        let row = |task: &Task| TaskRowView {
            task_id: task.id.clone(),
            file_name: file_name(task),
            status: task.status,
            progress_percent: task.progress_percent,
            speed: task.speed.clone(),
            size_label: format!(
                "{} / {}",
                format_bytes(task.downloaded_bytes),
                format_bytes(task.size_bytes)
            ),
            busy: [PendingOp::Start, PendingOp::Stop, PendingOp::Rebind, PendingOp::Clips]
                .into_iter()
                .any(|op| tasks.is_pending(&task.id, op)),
            deleting: tasks.is_pending(&task.id, PendingOp::Delete),
            error: task.last_error.clone(),
        };

        Self {
            active_tab: state.sniffs().active_tab().map(ToOwned::to_owned),
            sniffs: state.sniffs().visible().iter().map(sniff_row).collect(),
            active_tasks: tasks.active().map(row).collect(),
            done_tasks: tasks.completed().map(row).collect(),
            marking: state.marking().map(marking_view),
            rebind_target: state.rebind_target().map(ToOwned::to_owned),
            expanded: state.is_expanded(),
            pinned: state.is_pinned(),
            notices: state.notices().to_vec(),
            dirty: state.is_dirty(),
        }
    }

    /// Badge count for the sniff list of the active tab.
    pub fn sniff_count(&self) -> usize {
        self.sniffs.len()
    }
}

fn sniff_row(item: &SniffItem) -> SniffRowView {
    SniffRowView {
        url: item.url.clone(),
        display_name: display_name(&item.url),
        media_type: item.media_type,
        size_label: if item.size_bytes > 0 {
            format!("{:.1} MB", item.size_bytes as f64 / 1024.0 / 1024.0)
        } else {
            "unknown size".to_string()
        },
    }
}

fn marking_view(session: &MarkingSession) -> MarkingView {
    let track = &session.track;
    MarkingView {
        task_id: session.task_id.clone(),
        playable_url: session.playable_url.clone(),
        ready: track.is_editable(),
        duration: track.duration(),
        clips: track
            .clips()
            .iter()
            .map(|clip| ClipView {
                clip_id: clip.id,
                start: clip.start,
                end: clip.end,
                status: clip.status,
                selected: session.selected == Some(clip.id),
            })
            .collect(),
        kept_count: track.kept_intervals().len(),
    }
}

/// Last path segment of a media url, for listing sniffed items.
pub fn display_name(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.trim().is_empty())
            .map_or_else(|| "video.mp4".to_string(), ToOwned::to_owned),
        Err(_) => "video_resource".to_string(),
    }
}

fn file_name(task: &Task) -> String {
    task.save_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| task.title.clone())
}

/// Human readable byte count using binary units.
pub fn format_bytes(bytes: i64) -> String {
    if bytes <= 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
