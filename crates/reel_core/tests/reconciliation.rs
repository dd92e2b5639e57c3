use std::collections::BTreeMap;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use reel_core::{
    update, AppState, CreatePurpose, Effect, KeepInterval, MediaType, Msg, PendingOp,
    SelectIntent, SniffItem, Task, TaskProgress, TaskStatus,
};

fn init_logging() {
    reel_logging::initialize_for_tests();
}

fn sniff(tab: &str, url: &str) -> SniffItem {
    SniffItem {
        url: url.to_string(),
        origin_url: format!("https://site.example/{tab}"),
        title: "Episode".to_string(),
        media_type: MediaType::Mp4,
        size_bytes: 4096,
        tab_id: tab.to_string(),
        headers: BTreeMap::new(),
    }
}

fn task(id: &str, status: TaskStatus) -> Task {
    Task {
        id: id.to_string(),
        title: format!("Episode {id}"),
        source_url: "X".to_string(),
        origin_url: "https://site.example/watch".to_string(),
        media_type: MediaType::Mp4,
        save_path: PathBuf::from(format!("/downloads/Episode {id}.mp4")),
        size_bytes: 1000,
        downloaded_bytes: 0,
        progress_percent: 0.0,
        speed: String::new(),
        status,
        headers: BTreeMap::new(),
        clips: Vec::new(),
        last_error: None,
    }
}

fn apply(state: AppState, msgs: Vec<Msg>) -> (AppState, Vec<Effect>) {
    msgs.into_iter().fold((state, Vec::new()), |(state, mut all), msg| {
        let (state, effects) = update(state, msg);
        all.extend(effects);
        (state, all)
    })
}

fn with_tasks(tasks: Vec<Task>) -> AppState {
    update(AppState::new(), Msg::TaskListReplaced(tasks)).0
}

#[test]
fn bootstrap_requests_task_list() {
    init_logging();
    let (_, effects) = update(AppState::new(), Msg::Bootstrap);
    assert_eq!(effects, vec![Effect::LoadTasks]);
}

#[test]
fn sniff_dedupe_is_scoped_per_tab() {
    init_logging();
    let (mut state, effects) = apply(
        AppState::new(),
        vec![
            Msg::Sniffed(sniff("T1", "A")),
            Msg::Sniffed(sniff("T1", "A")),
            Msg::Sniffed(sniff("T2", "A")),
        ],
    );
    assert!(effects.is_empty());
    assert_eq!(state.sniffs().items("T1").len(), 1);
    assert_eq!(state.sniffs().items("T2").len(), 1);
    assert!(state.consume_dirty());

    let (state, _) = update(state, Msg::TabFocused("T2".to_string()));
    assert_eq!(state.view().sniff_count(), 1);
}

#[test]
fn closing_active_tab_is_surfaced() {
    init_logging();
    let (state, _) = apply(
        AppState::new(),
        vec![
            Msg::Sniffed(sniff("T1", "A")),
            Msg::Sniffed(sniff("T2", "B")),
            Msg::TabFocused("T1".to_string()),
            Msg::TabClosed("T1".to_string()),
        ],
    );
    let view = state.view();
    assert_eq!(view.active_tab, None);
    assert!(view.sniffs.is_empty());
    assert_eq!(view.notices.len(), 1);
    assert_eq!(state.sniffs().items("T2").len(), 1);
}

#[test]
fn progress_for_unknown_task_leaves_state_unchanged() {
    init_logging();
    let mut state = with_tasks(vec![task("1", TaskStatus::Downloading)]);
    state.consume_dirty();
    let before = state.clone();

    let (after, effects) = update(
        state,
        Msg::TaskProgress(TaskProgress {
            id: "404".to_string(),
            progress_percent: Some(50.0),
            status: Some(TaskStatus::Done),
            ..TaskProgress::default()
        }),
    );
    assert!(effects.is_empty());
    assert_eq!(after, before);
}

#[test]
fn out_of_order_progress_is_last_write_wins() {
    init_logging();
    let mut downloading = task("5", TaskStatus::Downloading);
    downloading.progress_percent = 40.0;
    let state = with_tasks(vec![downloading]);

    let (state, _) = update(
        state,
        Msg::TaskProgress(TaskProgress {
            id: "5".to_string(),
            progress_percent: Some(35.0),
            ..TaskProgress::default()
        }),
    );
    let stored = state.tasks().get("5").unwrap();
    assert_eq!(stored.progress_percent, 35.0);
    assert_eq!(stored.status, TaskStatus::Downloading);
}

#[test]
fn task_list_replace_is_not_a_merge() {
    init_logging();
    let state = with_tasks(vec![task("1", TaskStatus::Paused), task("2", TaskStatus::Paused)]);
    let (state, _) = update(state, Msg::TaskListReplaced(vec![task("3", TaskStatus::Done)]));
    let ids: Vec<_> = state.tasks().tasks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["3"]);
    assert_eq!(state.view().done_tasks.len(), 1);
}

#[test]
fn start_and_stop_do_not_flip_status_locally() {
    init_logging();
    let state = with_tasks(vec![task("1", TaskStatus::Paused)]);
    let (state, effects) = update(state, Msg::StartClicked("1".to_string()));
    assert_eq!(
        effects,
        vec![Effect::StartDownload {
            task_id: "1".to_string()
        }]
    );
    assert_eq!(state.tasks().get("1").unwrap().status, TaskStatus::Paused);
    assert!(state.view().active_tasks[0].busy);

    let (state, _) = apply(
        state,
        vec![
            Msg::RequestCompleted {
                task_id: "1".to_string(),
                op: PendingOp::Start,
                result: Ok(()),
            },
            Msg::TaskProgress(TaskProgress {
                id: "1".to_string(),
                status: Some(TaskStatus::Downloading),
                ..TaskProgress::default()
            }),
        ],
    );
    assert_eq!(state.tasks().get("1").unwrap().status, TaskStatus::Downloading);
    assert!(!state.view().active_tasks[0].busy);
}

#[test]
fn failed_start_enters_error_status() {
    init_logging();
    let state = with_tasks(vec![task("1", TaskStatus::Pending)]);
    let (state, _) = apply(
        state,
        vec![
            Msg::StartClicked("1".to_string()),
            Msg::RequestCompleted {
                task_id: "1".to_string(),
                op: PendingOp::Start,
                result: Err("connection refused".to_string()),
            },
        ],
    );
    let row = &state.view().active_tasks[0];
    assert_eq!(row.status, TaskStatus::Error);
    assert_eq!(row.error.as_deref(), Some("connection refused"));
}

#[test]
fn delete_waits_for_acknowledgement() {
    init_logging();
    let state = with_tasks(vec![task("1", TaskStatus::Paused)]);
    let (state, effects) = update(state, Msg::DeleteClicked("1".to_string()));
    assert_eq!(
        effects,
        vec![Effect::DeleteTask {
            task_id: "1".to_string()
        }]
    );
    assert!(state.tasks().get("1").is_some());
    assert!(state.view().active_tasks[0].deleting);

    let (state, effects) = update(state, Msg::DeleteClicked("1".to_string()));
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::RequestCompleted {
            task_id: "1".to_string(),
            op: PendingOp::Delete,
            result: Ok(()),
        },
    );
    assert!(state.tasks().is_empty());
}

#[test]
fn failed_delete_keeps_the_task() {
    init_logging();
    let state = with_tasks(vec![task("1", TaskStatus::Paused)]);
    let (state, _) = apply(
        state,
        vec![
            Msg::DeleteClicked("1".to_string()),
            Msg::RequestCompleted {
                task_id: "1".to_string(),
                op: PendingOp::Delete,
                result: Err("locked".to_string()),
            },
        ],
    );
    let stored = state.tasks().get("1").unwrap();
    assert_eq!(stored.status, TaskStatus::Paused);
    assert_eq!(state.notices().len(), 1);
}

#[test]
fn rebind_replaces_source_and_keeps_identity() {
    init_logging();
    let mut stale = task("7", TaskStatus::Error);
    stale.progress_percent = 62.0;
    let state = with_tasks(vec![stale]);
    let (state, effects) = apply(
        state,
        vec![
            Msg::Sniffed(sniff("T1", "Y")),
            Msg::TabFocused("T1".to_string()),
            Msg::RebindClicked("7".to_string()),
        ],
    );
    assert!(effects.is_empty());
    assert_eq!(state.rebind_target(), Some("7"));

    let (state, effects) = update(
        state,
        Msg::SniffItemSelected {
            url: "Y".to_string(),
            intent: SelectIntent::Download,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::RebindTask {
            task_id: "7".to_string(),
            item: sniff("T1", "Y"),
        }]
    );
    assert_eq!(state.rebind_target(), None);

    let (state, _) = update(
        state,
        Msg::RebindCompleted {
            task_id: "7".to_string(),
            item: sniff("T1", "Y"),
            result: Ok(()),
        },
    );
    assert_eq!(state.tasks().len(), 1);
    let rebound = state.tasks().get("7").unwrap();
    assert_eq!(rebound.id, "7");
    assert_eq!(rebound.source_url, "Y");
    assert_eq!(rebound.save_path, PathBuf::from("/downloads/Episode 7.mp4"));
    assert_eq!(rebound.progress_percent, 62.0);
    assert_eq!(rebound.size_bytes, 4096);
}

#[test]
fn rebind_is_refused_for_paused_and_done_tasks() {
    init_logging();
    let state = with_tasks(vec![task("1", TaskStatus::Paused), task("2", TaskStatus::Done)]);
    let (state, _) = update(state, Msg::RebindClicked("1".to_string()));
    assert_eq!(state.rebind_target(), None);
    let (state, _) = update(state, Msg::RebindClicked("2".to_string()));
    assert_eq!(state.rebind_target(), None);
}

#[test]
fn download_now_creates_then_starts() {
    init_logging();
    let (state, effects) = apply(
        AppState::new(),
        vec![
            Msg::Sniffed(sniff("T1", "https://cdn.example/a.mp4")),
            Msg::TabFocused("T1".to_string()),
            Msg::SniffItemSelected {
                url: "https://cdn.example/a.mp4".to_string(),
                intent: SelectIntent::Download,
            },
        ],
    );
    assert_eq!(
        effects,
        vec![Effect::CreateTask {
            item: sniff("T1", "https://cdn.example/a.mp4"),
            purpose: CreatePurpose::Download,
        }]
    );

    let (state, effects) = update(
        state,
        Msg::TaskCreated {
            purpose: CreatePurpose::Download,
            result: Ok(task("9", TaskStatus::Pending)),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::StartDownload {
            task_id: "9".to_string()
        }]
    );
    assert!(state.marking().is_none());
}

#[test]
fn selecting_an_item_outside_the_active_tab_does_nothing() {
    init_logging();
    let (_, effects) = apply(
        AppState::new(),
        vec![
            Msg::Sniffed(sniff("T1", "A")),
            Msg::TabFocused("T2".to_string()),
            Msg::SniffItemSelected {
                url: "A".to_string(),
                intent: SelectIntent::Mark,
            },
        ],
    );
    assert!(effects.is_empty());
}

#[test]
fn create_failure_becomes_a_notice() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::TaskCreated {
            purpose: CreatePurpose::Mark,
            result: Err("disk full".to_string()),
        },
    );
    assert!(effects.is_empty());
    assert!(state.marking().is_none());
    assert_eq!(state.notices().len(), 1);
    let (state, _) = update(state, Msg::NoticesDismissed);
    assert!(state.notices().is_empty());
}

#[test]
fn trimmed_commit_pushes_clips_before_start() {
    init_logging();
    let mut created = task("3", TaskStatus::Pending);
    created.source_url = "https://cdn.example/v.mp4".to_string();
    let (state, effects) = update(
        AppState::with_proxy_base("http://127.0.0.1:12345"),
        Msg::TaskCreated {
            purpose: CreatePurpose::Mark,
            result: Ok(created),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::SetExpandedWindow(true),
            Effect::ProbeDuration {
                task_id: "3".to_string(),
                media_type: MediaType::Mp4,
                playable_url: "http://127.0.0.1:12345/proxy?url=https%3A%2F%2Fcdn.example%2Fv.mp4\
                               &referer=https%3A%2F%2Fsite.example%2Fwatch"
                    .to_string(),
            },
        ]
    );

    // Edits before the duration is known are ignored.
    let (state, _) = update(state, Msg::SplitAtPlayhead { time: 10.0 });
    assert!(state.marking().unwrap().track.clips().is_empty());

    let (state, _) = apply(
        state,
        vec![
            Msg::MediaDurationKnown {
                task_id: "3".to_string(),
                duration_secs: 100.0,
            },
            Msg::SplitAtPlayhead { time: 30.0 },
            Msg::SplitAtPlayhead { time: 70.0 },
        ],
    );
    let middle = state.marking().unwrap().track.clips()[1].id;
    let (state, _) = update(state, Msg::ToggleClip(middle));
    assert_eq!(state.view().marking.unwrap().kept_count, 2);

    let (state, effects) = update(state, Msg::CommitMarking);
    let kept = vec![
        KeepInterval {
            index: 0,
            start: 0.0,
            end: 30.0,
        },
        KeepInterval {
            index: 1,
            start: 70.0,
            end: 100.0,
        },
    ];
    assert_eq!(
        effects,
        vec![
            Effect::SetExpandedWindow(false),
            Effect::UpdateTaskClips {
                task_id: "3".to_string(),
                clips: kept.clone(),
                start_after: true,
            },
        ]
    );
    assert!(state.marking().is_none());

    let (state, effects) = update(
        state,
        Msg::ClipsUpdated {
            task_id: "3".to_string(),
            clips: kept.clone(),
            start_after: true,
            result: Ok(()),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::StartDownload {
            task_id: "3".to_string()
        }]
    );
    assert_eq!(state.tasks().get("3").unwrap().clips, kept);
}

#[test]
fn untouched_commit_starts_directly() {
    init_logging();
    let (state, _) = apply(
        AppState::new(),
        vec![
            Msg::TaskCreated {
                purpose: CreatePurpose::Mark,
                result: Ok(task("4", TaskStatus::Pending)),
            },
            Msg::MediaDurationKnown {
                task_id: "4".to_string(),
                duration_secs: 42.0,
            },
        ],
    );
    let (_, effects) = update(state, Msg::CommitMarking);
    assert_eq!(
        effects,
        vec![
            Effect::SetExpandedWindow(false),
            Effect::StartDownload {
                task_id: "4".to_string()
            },
        ]
    );
}

#[test]
fn commit_with_everything_excluded_is_refused() {
    init_logging();
    let (state, _) = apply(
        AppState::new(),
        vec![
            Msg::TaskCreated {
                purpose: CreatePurpose::Mark,
                result: Ok(task("4", TaskStatus::Pending)),
            },
            Msg::MediaDurationKnown {
                task_id: "4".to_string(),
                duration_secs: 42.0,
            },
        ],
    );
    let only = state.marking().unwrap().track.clips()[0].id;
    let (state, _) = update(state, Msg::ToggleClip(only));
    let (state, effects) = update(state, Msg::CommitMarking);
    assert!(effects.is_empty());
    assert!(state.marking().unwrap().track.is_editable());
    assert_eq!(state.notices().len(), 1);
}

#[test]
fn finished_task_opens_no_marking_session() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::TaskCreated {
            purpose: CreatePurpose::Mark,
            result: Ok(task("5", TaskStatus::Done)),
        },
    );
    assert!(effects.is_empty());
    assert!(state.marking().is_none());
    assert_eq!(state.notices().len(), 1);
    assert!(state.notices()[0].message.contains("already finished"));
}

#[test]
fn commit_after_the_download_finished_discards_marks() {
    init_logging();
    let finish = |status| {
        Msg::TaskProgress(TaskProgress {
            id: "4".to_string(),
            status: Some(status),
            ..TaskProgress::default()
        })
    };
    let (state, _) = apply(
        AppState::new(),
        vec![
            Msg::TaskCreated {
                purpose: CreatePurpose::Mark,
                result: Ok(task("4", TaskStatus::Pending)),
            },
            Msg::MediaDurationKnown {
                task_id: "4".to_string(),
                duration_secs: 100.0,
            },
            Msg::SplitAtPlayhead { time: 30.0 },
            finish(TaskStatus::Downloading),
            finish(TaskStatus::Done),
        ],
    );
    let (state, effects) = update(state, Msg::CommitMarking);
    assert_eq!(effects, vec![Effect::SetExpandedWindow(false)]);
    assert!(state.marking().is_none());
    let messages: Vec<_> = state.notices().iter().map(|n| n.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["The download finished while marking; the trim marks were discarded"]
    );
    assert_eq!(state.tasks().get("4").map(|task| task.status), Some(TaskStatus::Done));
}

#[test]
fn marking_session_survives_tab_switch_and_cancel_has_no_side_effects() {
    init_logging();
    let (state, _) = apply(
        AppState::new(),
        vec![
            Msg::TabFocused("T1".to_string()),
            Msg::TaskCreated {
                purpose: CreatePurpose::Mark,
                result: Ok(task("4", TaskStatus::Pending)),
            },
            Msg::MediaDurationKnown {
                task_id: "4".to_string(),
                duration_secs: 42.0,
            },
            Msg::TabFocused("T2".to_string()),
            Msg::TabClosed("T1".to_string()),
        ],
    );
    assert!(state.marking().is_some());

    let before = state.tasks().clone();
    let (state, effects) = update(state, Msg::CancelMarking);
    assert_eq!(effects, vec![Effect::SetExpandedWindow(false)]);
    assert!(state.marking().is_none());
    assert_eq!(state.tasks(), &before);
}

#[test]
fn merge_uses_the_selected_clip() {
    init_logging();
    let (state, _) = apply(
        AppState::new(),
        vec![
            Msg::TaskCreated {
                purpose: CreatePurpose::Mark,
                result: Ok(task("4", TaskStatus::Pending)),
            },
            Msg::MediaDurationKnown {
                task_id: "4".to_string(),
                duration_secs: 90.0,
            },
            Msg::SplitAtPlayhead { time: 45.0 },
        ],
    );
    // Nothing selected yet.
    let (state, _) = update(state, Msg::MergeSelected);
    assert_eq!(state.marking().unwrap().track.clips().len(), 2);

    let second = state.marking().unwrap().track.clips()[1].id;
    let (state, _) = apply(state, vec![Msg::ClipSelected(second), Msg::MergeSelected]);
    let session = state.marking().unwrap();
    assert_eq!(session.track.clips().len(), 1);
    assert_eq!(session.selected, None);
}

#[test]
fn stale_duration_from_an_older_session_is_ignored() {
    init_logging();
    let (state, _) = apply(
        AppState::new(),
        vec![
            Msg::TaskCreated {
                purpose: CreatePurpose::Mark,
                result: Ok(task("1", TaskStatus::Pending)),
            },
            Msg::TaskCreated {
                purpose: CreatePurpose::Mark,
                result: Ok(task("2", TaskStatus::Pending)),
            },
            Msg::MediaDurationKnown {
                task_id: "1".to_string(),
                duration_secs: 10.0,
            },
        ],
    );
    let session = state.marking().unwrap();
    assert_eq!(session.task_id, "2");
    assert!(!session.track.is_editable());
}

#[test]
fn deleting_the_marked_task_closes_the_session() {
    init_logging();
    let (state, _) = apply(
        AppState::new(),
        vec![
            Msg::TaskCreated {
                purpose: CreatePurpose::Mark,
                result: Ok(task("4", TaskStatus::Pending)),
            },
            Msg::DeleteClicked("4".to_string()),
        ],
    );
    let (state, effects) = update(
        state,
        Msg::RequestCompleted {
            task_id: "4".to_string(),
            op: PendingOp::Delete,
            result: Ok(()),
        },
    );
    assert!(state.marking().is_none());
    assert_eq!(effects, vec![Effect::SetExpandedWindow(false)]);
}

#[test]
fn finished_task_is_not_deleted() {
    init_logging();
    let state = with_tasks(vec![task("1", TaskStatus::Done)]);
    let (state, effects) = update(state, Msg::DeleteClicked("1".to_string()));
    assert!(effects.is_empty());
    assert!(!state.tasks().is_pending("1", PendingOp::Delete));
    assert_eq!(state.tasks().get("1").map(|task| task.status), Some(TaskStatus::Done));
}

#[test]
fn reset_clears_registries() {
    init_logging();
    let (state, _) = apply(
        with_tasks(vec![task("1", TaskStatus::Paused)]),
        vec![Msg::Sniffed(sniff("T1", "A")), Msg::TabFocused("T1".to_string())],
    );
    let (state, _) = update(state, Msg::Reset);
    assert!(state.tasks().is_empty());
    assert_eq!(state.sniffs().tab_count(), 0);
    assert_eq!(state.sniffs().active_tab(), None);
}

#[test]
fn chrome_intents_map_to_effects() {
    init_logging();
    let (state, effects) = apply(
        AppState::new(),
        vec![
            Msg::SetExpanded(true),
            Msg::SetExpanded(true),
            Msg::TogglePinnedClicked,
            Msg::OpenDownloadDirectoryClicked,
            Msg::LaunchBrowserClicked,
            Msg::QuitClicked,
        ],
    );
    assert_eq!(
        effects,
        vec![
            Effect::SetExpandedWindow(true),
            Effect::TogglePinned,
            Effect::OpenDownloadDirectory,
            Effect::LaunchBrowser,
            Effect::QuitApplication,
        ]
    );
    let (state, _) = update(state, Msg::PinnedChanged(true));
    assert!(state.view().pinned);
    assert!(state.view().expanded);
}
