use reel_logging::{reel_debug, reel_info, reel_warn};

use crate::preview::proxy_url;
use crate::{
    AppState, ChromeAction, CreatePurpose, Effect, MarkingSession, Msg, NoticeLevel, PendingOp,
    TaskStatus,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Sniffed(item) => {
            if state.sniffs_mut().record(item) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TabFocused(tab_id) => {
            // A marking session deliberately survives tab switches.
            state.sniffs_mut().focus(tab_id);
            state.mark_dirty();
            Vec::new()
        }
        Msg::TabClosed(tab_id) => {
            let closed = state.sniffs_mut().close(&tab_id);
            if closed.cleared_active {
                state.push_notice(
                    NoticeLevel::Info,
                    "The active browser tab was closed; switch to a tab with a video",
                );
            } else if closed.dropped > 0 {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TaskListReplaced(tasks) => {
            state.tasks_mut().replace_all(tasks);
            state.mark_dirty();
            collapse_if_orphaned(&mut state)
        }
        Msg::TaskProgress(progress) => {
            if state.tasks_mut().apply_progress(progress) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TasksLoadFailed(message) => {
            state.push_notice(
                NoticeLevel::Error,
                format!("Could not load the task list: {message}"),
            );
            Vec::new()
        }
        Msg::Bootstrap => vec![Effect::LoadTasks],
        Msg::Reset => {
            state.reset();
            collapse_window(&mut state)
        }

        Msg::SniffItemSelected { url, intent } => {
            let Some(item) = state.sniffs().find_visible(&url).cloned() else {
                reel_debug!("selected sniff item is not visible: {}", url);
                return (state, Vec::new());
            };
            match state.rebind_target().map(ToOwned::to_owned) {
                Some(task_id) => {
                    state.set_rebind_target(None);
                    if state.tasks_mut().request_rebind(&task_id) {
                        state.mark_dirty();
                        vec![Effect::RebindTask { task_id, item }]
                    } else {
                        Vec::new()
                    }
                }
                None => vec![Effect::CreateTask {
                    item,
                    purpose: intent.into(),
                }],
            }
        }
        Msg::StartClicked(task_id) => request_start(&mut state, task_id),
        Msg::StopClicked(task_id) => {
            let downloading = state
                .tasks()
                .get(&task_id)
                .is_some_and(|task| task.status == TaskStatus::Downloading);
            if downloading
                && !state.tasks().is_pending(&task_id, PendingOp::Stop)
                && state.tasks_mut().request_stop(&task_id)
            {
                state.mark_dirty();
                vec![Effect::StopDownload { task_id }]
            } else {
                Vec::new()
            }
        }
        Msg::DeleteClicked(task_id) => {
            if !state.tasks().is_pending(&task_id, PendingOp::Delete)
                && state.tasks_mut().request_delete(&task_id)
            {
                state.mark_dirty();
                vec![Effect::DeleteTask { task_id }]
            } else {
                Vec::new()
            }
        }
        Msg::RebindClicked(task_id) => {
            let rebindable = state
                .tasks()
                .get(&task_id)
                .is_some_and(|task| task.status.is_rebindable());
            if rebindable {
                state.set_rebind_target(Some(task_id));
            } else {
                reel_debug!("rebind refused for task {}", task_id);
            }
            Vec::new()
        }
        Msg::RebindCancelled => {
            state.set_rebind_target(None);
            Vec::new()
        }

        Msg::SplitAtPlayhead { time } => {
            if let Some(session) = state.marking_mut() {
                if session.track.split_at(time).is_some() {
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::ClipSelected(clip_id) => {
            if let Some(session) = state.marking_mut() {
                if session.track.clip(clip_id).is_some() {
                    session.selected = Some(clip_id);
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::MergeSelected => {
            if let Some(session) = state.marking_mut() {
                if let Some(selected) = session.selected.take() {
                    session.track.merge_left(selected);
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::ToggleClip(clip_id) => {
            if let Some(session) = state.marking_mut() {
                if session.track.toggle_status(clip_id).is_some() {
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::CommitMarking => commit_marking(&mut state),
        Msg::CancelMarking => {
            if let Some(session) = state.close_marking() {
                reel_info!("marking cancelled for task {}", session.task_id);
            }
            collapse_window(&mut state)
        }
        Msg::MediaDurationKnown {
            task_id,
            duration_secs,
        } => {
            match state.marking_mut() {
                Some(session) if session.task_id == task_id => {
                    if session.track.seed(duration_secs) {
                        reel_info!("track seeded for task {}: {}s", task_id, duration_secs);
                        state.mark_dirty();
                    }
                }
                _ => reel_debug!("duration for task {} has no session", task_id),
            }
            Vec::new()
        }
        Msg::MediaDurationUnavailable { task_id, message } => {
            let current = state
                .marking()
                .is_some_and(|session| session.task_id == task_id);
            if current {
                state.push_notice(
                    NoticeLevel::Warning,
                    format!("Could not read the media duration: {message}"),
                );
            }
            Vec::new()
        }

        Msg::SetExpanded(expanded) => {
            if state.set_expanded(expanded) {
                vec![Effect::SetExpandedWindow(expanded)]
            } else {
                Vec::new()
            }
        }
        Msg::TogglePinnedClicked => vec![Effect::TogglePinned],
        Msg::OpenDownloadDirectoryClicked => vec![Effect::OpenDownloadDirectory],
        Msg::LaunchBrowserClicked => vec![Effect::LaunchBrowser],
        Msg::QuitClicked => vec![Effect::QuitApplication],
        Msg::NoticesDismissed => {
            state.clear_notices();
            Vec::new()
        }

        Msg::TaskCreated { purpose, result } => match result {
            Ok(task) => {
                let task_id = task.id.clone();
                reel_info!("task {} created for {:?}", task_id, purpose);
                state.tasks_mut().upsert(task);
                state.mark_dirty();
                match purpose {
                    CreatePurpose::Download => request_start(&mut state, task_id),
                    CreatePurpose::Mark => open_marking(&mut state, task_id),
                }
            }
            Err(message) => {
                state.push_notice(
                    NoticeLevel::Error,
                    format!("Could not create the task: {message}"),
                );
                Vec::new()
            }
        },
        Msg::RequestCompleted {
            task_id,
            op,
            result,
        } => {
            state.tasks_mut().settle(&task_id, op);
            state.mark_dirty();
            match (op, result) {
                (PendingOp::Delete, Ok(())) => {
                    state.tasks_mut().remove(&task_id);
                    collapse_if_orphaned(&mut state)
                }
                (PendingOp::Delete, Err(message)) => {
                    state.push_notice(
                        NoticeLevel::Error,
                        format!("Could not delete the task: {message}"),
                    );
                    Vec::new()
                }
                (_, Ok(())) => Vec::new(),
                (op, Err(message)) => {
                    state.tasks_mut().record_failure(&task_id, message.clone());
                    state.push_notice(NoticeLevel::Error, format!("{op:?} failed: {message}"));
                    Vec::new()
                }
            }
        }
        Msg::RebindCompleted {
            task_id,
            item,
            result,
        } => {
            state.tasks_mut().settle(&task_id, PendingOp::Rebind);
            state.mark_dirty();
            match result {
                Ok(()) => {
                    state.tasks_mut().rebind_source(&task_id, &item);
                    state.push_notice(
                        NoticeLevel::Info,
                        "Link updated; the download can continue",
                    );
                }
                Err(message) => {
                    state.tasks_mut().record_failure(&task_id, message.clone());
                    state.push_notice(
                        NoticeLevel::Error,
                        format!("Could not update the link: {message}"),
                    );
                }
            }
            Vec::new()
        }
        Msg::ClipsUpdated {
            task_id,
            clips,
            start_after,
            result,
        } => {
            state.tasks_mut().settle(&task_id, PendingOp::Clips);
            state.mark_dirty();
            match result {
                Ok(()) => {
                    state.tasks_mut().set_clips(&task_id, clips);
                    if start_after {
                        request_start(&mut state, task_id)
                    } else {
                        Vec::new()
                    }
                }
                Err(message) => {
                    state.tasks_mut().record_failure(&task_id, message.clone());
                    state.push_notice(
                        NoticeLevel::Error,
                        format!("Could not save the trim marks: {message}"),
                    );
                    Vec::new()
                }
            }
        }
        Msg::PinnedChanged(pinned) => {
            state.set_pinned(pinned);
            Vec::new()
        }
        Msg::ChromeRequestFailed { action, message } => {
            let what = match action {
                ChromeAction::SetExpanded => "resize the window",
                ChromeAction::TogglePinned => "pin the window",
                ChromeAction::OpenDownloadDirectory => "open the download folder",
                ChromeAction::LaunchBrowser => "launch the browser",
                ChromeAction::Quit => "quit",
            };
            state.push_notice(NoticeLevel::Error, format!("Could not {what}: {message}"));
            Vec::new()
        }

        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn request_start(state: &mut AppState, task_id: String) -> Vec<Effect> {
    let startable = state
        .tasks()
        .get(&task_id)
        .is_some_and(|task| task.status != TaskStatus::Downloading);
    if !startable || state.tasks().is_pending(&task_id, PendingOp::Start) {
        reel_debug!("start ignored for task {}", task_id);
        return Vec::new();
    }
    if state.tasks_mut().request_start(&task_id) {
        state.mark_dirty();
        vec![Effect::StartDownload { task_id }]
    } else {
        Vec::new()
    }
}

fn open_marking(state: &mut AppState, task_id: String) -> Vec<Effect> {
    let Some(task) = state.tasks().get(&task_id) else {
        return Vec::new();
    };
    if task.status.is_terminal() {
        state.push_notice(
            NoticeLevel::Info,
            "This download already finished; there is nothing to trim",
        );
        return Vec::new();
    }
    let media_type = task.media_type;
    let playable_url = proxy_url(state.proxy_base(), &task.source_url, &task.origin_url);
    if playable_url.is_none() {
        reel_warn!("proxy base {:?} is not a valid url", state.proxy_base());
    }

    // Opening a new session discards any previous one without side effects.
    state.open_marking(MarkingSession::new(task_id.clone(), playable_url.clone()));

    let mut effects = Vec::with_capacity(2);
    if state.set_expanded(true) {
        effects.push(Effect::SetExpandedWindow(true));
    }
    if let Some(playable_url) = playable_url {
        effects.push(Effect::ProbeDuration {
            task_id,
            media_type,
            playable_url,
        });
    }
    effects
}

fn commit_marking(state: &mut AppState) -> Vec<Effect> {
    let Some(session) = state.marking() else {
        return Vec::new();
    };
    if !session.track.is_editable() {
        reel_debug!("commit ignored: track for task {} not editable", session.task_id);
        return Vec::new();
    }
    if session.track.kept_intervals().is_empty() {
        state.push_notice(
            NoticeLevel::Warning,
            "Every clip is excluded; keep at least one clip",
        );
        return Vec::new();
    }

    let Some(mut session) = state.close_marking() else {
        return Vec::new();
    };
    let untrimmed = session.track.is_untrimmed();
    let clips = session.track.commit();
    let task_id = session.task_id;
    reel_info!(
        "marking committed for task {}: {} kept intervals",
        task_id,
        clips.len()
    );

    let mut effects = collapse_window(state);
    let finished = state
        .tasks()
        .get(&task_id)
        .is_some_and(|task| task.status.is_terminal());
    if finished {
        state.push_notice(
            NoticeLevel::Warning,
            "The download finished while marking; the trim marks were discarded",
        );
        return effects;
    }
    let had_clips = state
        .tasks()
        .get(&task_id)
        .is_some_and(|task| !task.clips.is_empty());
    if untrimmed && !had_clips {
        effects.extend(request_start(state, task_id));
    } else if state.tasks_mut().request_clips(&task_id) {
        effects.push(Effect::UpdateTaskClips {
            task_id,
            clips,
            start_after: true,
        });
    } else {
        state.push_notice(
            NoticeLevel::Warning,
            "The task is gone; the trim marks were discarded",
        );
    }
    effects
}

fn collapse_window(state: &mut AppState) -> Vec<Effect> {
    if state.set_expanded(false) {
        vec![Effect::SetExpandedWindow(false)]
    } else {
        Vec::new()
    }
}

fn collapse_if_orphaned(state: &mut AppState) -> Vec<Effect> {
    if state.drop_orphaned_refs() {
        collapse_window(state)
    } else {
        Vec::new()
    }
}
