//! FetchReel core: clip track, sniff and task registries, and the pure
//! reconciliation state machine that ties them to backend events.
mod clip;
mod effect;
mod msg;
pub mod preview;
mod sniff;
mod state;
mod task;
mod update;
mod view_model;

pub use clip::{Clip, ClipId, ClipStatus, ClipTrack, KeepInterval, TrackState};
pub use effect::{CreatePurpose, Effect};
pub use msg::{ChromeAction, Msg, SelectIntent};
pub use sniff::{MediaType, SniffItem, SniffRegistry, TabClosed, TabId};
pub use state::{AppState, MarkingSession, Notice, NoticeLevel};
pub use task::{PendingOp, Task, TaskId, TaskProgress, TaskRegistry, TaskStatus};
pub use update::update;
pub use view_model::{
    display_name, format_bytes, AppViewModel, ClipView, MarkingView, SniffRowView, TaskRowView,
};
