use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use reel_logging::{reel_debug, reel_info, reel_warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::clip::KeepInterval;
use crate::sniff::{MediaType, SniffItem};

/// Backend-assigned task identifier (a UUID string).
pub type TaskId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created but never started. The backend calls this "sniffed".
    #[default]
    #[serde(alias = "sniffed")]
    Pending,
    /// Includes the backend's "merging" phase, which still precedes `done`.
    #[serde(alias = "merging")]
    Downloading,
    Paused,
    Done,
    /// Includes the backend's "expired" state: the source link went stale.
    #[serde(alias = "expired")]
    Error,
}

impl TaskStatus {
    /// Whether an incoming event may move a task from `self` to `next`.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        self == next
            || matches!(
                (self, next),
                (Pending, Downloading)
                    | (Downloading, Paused)
                    | (Paused, Downloading)
                    | (Downloading, Done)
                    | (Downloading, Error)
                    | (Error, Downloading)
            )
    }

    pub fn is_terminal(self) -> bool {
        self == TaskStatus::Done
    }

    /// Statuses from which a stale source link can be replaced.
    pub fn is_rebindable(self) -> bool {
        matches!(self, TaskStatus::Downloading | TaskStatus::Error)
    }
}

/// One download job as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(default)]
    pub origin_url: String,
    #[serde(rename = "type", default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub save_path: PathBuf,
    #[serde(rename = "size", default)]
    pub size_bytes: i64,
    #[serde(rename = "downloaded", default)]
    pub downloaded_bytes: i64,
    #[serde(rename = "progress", default)]
    pub progress_percent: f64,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clips: Vec<KeepInterval>,
    /// Message of the last failed backend call; local only.
    #[serde(skip)]
    pub last_error: Option<String>,
}

/// The backend serializes empty collections as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Partial task update. `None` fields leave the stored value alone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    pub id: TaskId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "url", default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub origin_url: Option<String>,
    #[serde(rename = "type", default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub save_path: Option<PathBuf>,
    #[serde(rename = "size", default)]
    pub size_bytes: Option<i64>,
    #[serde(rename = "downloaded", default)]
    pub downloaded_bytes: Option<i64>,
    #[serde(rename = "progress", default)]
    pub progress_percent: Option<f64>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Backend request issued for a task and not yet answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PendingOp {
    Start,
    Stop,
    Delete,
    Rebind,
    Clips,
}

/// Canonical list of tasks plus the requests in flight for them.
///
/// Status only ever changes through backend events or a failed awaited call;
/// requests never flip it optimistically.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    pending: BTreeMap<TaskId, BTreeSet<PendingOp>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole list; the backend's list is authoritative.
    ///
    /// Requests in flight survive for ids that are still listed. A pending
    /// delete whose id is gone counts as acknowledged.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        let previous = std::mem::replace(&mut self.tasks, tasks);
        for task in &mut self.tasks {
            if let Some(old) = previous.iter().find(|old| old.id == task.id) {
                if task.last_error.is_none() && task.status == TaskStatus::Error {
                    task.last_error = old.last_error.clone();
                }
            }
        }
        let tasks = &self.tasks;
        self.pending
            .retain(|id, _| tasks.iter().any(|task| &task.id == id));
        reel_info!("task list replaced: {} tasks", self.tasks.len());
    }

    /// Applies a partial update. Unknown ids are dropped and the registry is
    /// left exactly as it was. Returns whether a task was updated.
    ///
    /// The most recently delivered value wins for every field, including
    /// progress going backwards. A status change is taken only when the
    /// transition is allowed; the other fields still apply.
    pub fn apply_progress(&mut self, update: TaskProgress) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == update.id) else {
            reel_debug!("progress for unknown task {} dropped", update.id);
            return false;
        };

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(source_url) = update.source_url {
            task.source_url = source_url;
        }
        if let Some(origin_url) = update.origin_url {
            task.origin_url = origin_url;
        }
        if let Some(media_type) = update.media_type {
            task.media_type = media_type;
        }
        if let Some(save_path) = update.save_path {
            task.save_path = save_path;
        }
        if let Some(size_bytes) = update.size_bytes {
            task.size_bytes = size_bytes;
        }
        if let Some(downloaded_bytes) = update.downloaded_bytes {
            task.downloaded_bytes = downloaded_bytes;
        }
        if let Some(progress_percent) = update.progress_percent {
            task.progress_percent = progress_percent;
        }
        if let Some(speed) = update.speed {
            task.speed = speed;
        }
        if let Some(status) = update.status {
            if task.status.can_transition_to(status) {
                if status != TaskStatus::Error {
                    task.last_error = None;
                }
                task.status = status;
            } else {
                reel_debug!(
                    "task {} ignored status {:?} -> {:?}",
                    task.id,
                    task.status,
                    status
                );
            }
        }
        true
    }

    /// Stores a task returned by the backend, replacing any entry with the
    /// same id in place.
    pub fn upsert(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }

    /// Marks a start request as in flight. Returns false for unknown or
    /// finished tasks, which get no request.
    pub fn request_start(&mut self, id: &str) -> bool {
        self.request(id, PendingOp::Start)
    }

    pub fn request_stop(&mut self, id: &str) -> bool {
        self.request(id, PendingOp::Stop)
    }

    /// Marks a delete as in flight. The entry stays until the backend
    /// acknowledges it. `done` tasks are never deleted.
    pub fn request_delete(&mut self, id: &str) -> bool {
        self.request(id, PendingOp::Delete)
    }

    pub fn request_rebind(&mut self, id: &str) -> bool {
        self.request(id, PendingOp::Rebind)
    }

    pub fn request_clips(&mut self, id: &str) -> bool {
        self.request(id, PendingOp::Clips)
    }

    /// Clears an in-flight marker once the backend answered.
    pub fn settle(&mut self, id: &str, op: PendingOp) {
        if let Some(ops) = self.pending.get_mut(id) {
            ops.remove(&op);
            if ops.is_empty() {
                self.pending.remove(id);
            }
        }
    }

    pub fn is_pending(&self, id: &str, op: PendingOp) -> bool {
        self.pending.get(id).is_some_and(|ops| ops.contains(&op))
    }

    /// Drops a task after the backend confirmed its deletion.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        self.pending.remove(id);
        let index = self.tasks.iter().position(|task| task.id == id)?;
        Some(self.tasks.remove(index))
    }

    /// Moves a task to `error` after an awaited download call failed.
    /// Finished tasks stay finished.
    pub fn record_failure(&mut self, id: &str, message: impl Into<String>) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return false;
        };
        let message = message.into();
        reel_warn!("task {} failed: {}", id, message);
        task.last_error = Some(message);
        if !task.status.is_terminal() {
            task.status = TaskStatus::Error;
            task.speed.clear();
        }
        true
    }

    /// Points an existing task at a freshly sniffed source. Identity, save
    /// path and progress history are kept.
    pub fn rebind_source(&mut self, id: &str, item: &SniffItem) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return false;
        };
        task.source_url = item.url.clone();
        task.origin_url = item.origin_url.clone();
        task.headers = item.headers.clone();
        if item.size_bytes > 0 {
            task.size_bytes = i64::try_from(item.size_bytes).unwrap_or(i64::MAX);
        }
        task.last_error = None;
        reel_info!("task {} rebound to new source", id);
        true
    }

    pub fn set_clips(&mut self, id: &str, clips: Vec<KeepInterval>) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return false;
        };
        task.clips = clips;
        true
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks still in the download list (anything not done).
    pub fn active(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|task| task.status != TaskStatus::Done)
    }

    pub fn completed(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|task| task.status == TaskStatus::Done)
    }

    pub fn reset(&mut self) {
        self.tasks.clear();
        self.pending.clear();
    }

    fn request(&mut self, id: &str, op: PendingOp) -> bool {
        match self.get(id) {
            Some(task) if !task.status.is_terminal() => {
                self.mark_pending(id, op);
                true
            }
            Some(_) => {
                reel_debug!("{:?} ignored for finished task {}", op, id);
                false
            }
            None => {
                reel_debug!("{:?} ignored for unknown task {}", op, id);
                false
            }
        }
    }

    fn mark_pending(&mut self, id: &str, op: PendingOp) {
        self.pending.entry(id.to_string()).or_default().insert(op);
    }
}
