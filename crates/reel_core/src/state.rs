use crate::preview::DEFAULT_PROXY_BASE;
use crate::view_model::AppViewModel;
use crate::{ClipId, ClipTrack, SniffRegistry, TaskId, TaskRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Short message for the user (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// The single clip-editing session, bound to one task.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingSession {
    pub task_id: TaskId,
    /// Proxied URL the player loads; `None` if the proxy base is unusable.
    pub playable_url: Option<String>,
    pub track: ClipTrack,
    pub selected: Option<ClipId>,
}

impl MarkingSession {
    pub fn new(task_id: TaskId, playable_url: Option<String>) -> Self {
        Self {
            task_id,
            playable_url,
            track: ClipTrack::new(),
            selected: None,
        }
    }
}

/// Everything the reconciliation layer owns. Mutated only through
/// [`crate::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    sniffs: SniffRegistry,
    tasks: TaskRegistry,
    marking: Option<MarkingSession>,
    rebind_target: Option<TaskId>,
    expanded: bool,
    pinned: bool,
    notices: Vec<Notice>,
    proxy_base: String,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            sniffs: SniffRegistry::new(),
            tasks: TaskRegistry::new(),
            marking: None,
            rebind_target: None,
            expanded: false,
            pinned: false,
            notices: Vec::new(),
            proxy_base: DEFAULT_PROXY_BASE.to_string(),
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State whose preview URLs point at the proxy listening on `proxy_base`.
    pub fn with_proxy_base(proxy_base: impl Into<String>) -> Self {
        Self {
            proxy_base: proxy_base.into(),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::project(self)
    }

    pub fn sniffs(&self) -> &SniffRegistry {
        &self.sniffs
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn marking(&self) -> Option<&MarkingSession> {
        self.marking.as_ref()
    }

    pub fn rebind_target(&self) -> Option<&str> {
        self.rebind_target.as_deref()
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn proxy_base(&self) -> &str {
        &self.proxy_base
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether anything changed since the last call and clears the
    /// flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn sniffs_mut(&mut self) -> &mut SniffRegistry {
        &mut self.sniffs
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut TaskRegistry {
        &mut self.tasks
    }

    pub(crate) fn marking_mut(&mut self) -> Option<&mut MarkingSession> {
        self.marking.as_mut()
    }

    pub(crate) fn open_marking(&mut self, session: MarkingSession) {
        self.marking = Some(session);
        self.dirty = true;
    }

    pub(crate) fn close_marking(&mut self) -> Option<MarkingSession> {
        let session = self.marking.take();
        if session.is_some() {
            self.dirty = true;
        }
        session
    }

    pub(crate) fn set_rebind_target(&mut self, target: Option<TaskId>) {
        if self.rebind_target != target {
            self.rebind_target = target;
            self.dirty = true;
        }
    }

    /// Returns whether the value changed.
    pub(crate) fn set_expanded(&mut self, expanded: bool) -> bool {
        let changed = self.expanded != expanded;
        self.expanded = expanded;
        self.dirty |= changed;
        changed
    }

    pub(crate) fn set_pinned(&mut self, pinned: bool) {
        if self.pinned != pinned {
            self.pinned = pinned;
            self.dirty = true;
        }
    }

    pub(crate) fn push_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
        self.dirty = true;
    }

    pub(crate) fn clear_notices(&mut self) {
        if !self.notices.is_empty() {
            self.notices.clear();
            self.dirty = true;
        }
    }

    /// Forgets the marking session and rebind target when their task is no
    /// longer known. Returns whether the marking session was dropped.
    pub(crate) fn drop_orphaned_refs(&mut self) -> bool {
        let tasks = &self.tasks;
        let mut closed_marking = false;
        if let Some(session) = &self.marking {
            if tasks.get(&session.task_id).is_none() {
                self.marking = None;
                self.dirty = true;
                closed_marking = true;
            }
        }
        if let Some(target) = &self.rebind_target {
            if tasks.get(target).is_none() {
                self.rebind_target = None;
                self.dirty = true;
            }
        }
        closed_marking
    }

    pub(crate) fn reset(&mut self) {
        self.sniffs.reset();
        self.tasks.reset();
        self.marking = None;
        self.rebind_target = None;
        self.notices.clear();
        self.dirty = true;
    }
}
