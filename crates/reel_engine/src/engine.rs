use std::sync::{mpsc, Arc};
use std::thread;

use reel_core::{ChromeAction, Effect, MediaType, Msg, PendingOp};
use reel_logging::{reel_debug, reel_error, reel_info, reel_warn};

use crate::{BackendError, MediaProbe, TaskBackend};

/// Runs effects on a tokio runtime in a background thread and feeds the
/// resulting messages back to the dispatcher.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<Effect>,
    worker: thread::JoinHandle<()>,
}

impl EngineHandle {
    pub fn new(
        backend: Arc<dyn TaskBackend>,
        probe: Arc<dyn MediaProbe>,
        msg_tx: mpsc::Sender<Msg>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Effect>();

        let worker = thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    reel_error!("engine runtime failed to start: {}", err);
                    return;
                }
            };
            while let Ok(effect) = cmd_rx.recv() {
                if matches!(effect, Effect::QuitApplication) {
                    // Stop taking work; requests still in flight are dropped
                    // with the runtime.
                    if let Err(err) = runtime.block_on(backend.quit_application()) {
                        reel_warn!("backend quit failed: {}", err);
                    }
                    break;
                }
                let backend = backend.clone();
                let probe = probe.clone();
                let msg_tx = msg_tx.clone();
                runtime.spawn(async move {
                    if let Some(msg) = execute(backend.as_ref(), probe.as_ref(), effect).await {
                        let _ = msg_tx.send(msg);
                    }
                });
            }
            reel_info!("engine stopped");
        });

        Self { cmd_tx, worker }
    }

    pub fn submit(&self, effect: Effect) {
        if self.cmd_tx.send(effect).is_err() {
            reel_warn!("engine is not running; effect dropped");
        }
    }

    /// Closes the command channel and waits for the engine thread.
    pub fn shutdown(self) {
        let Self { cmd_tx, worker } = self;
        drop(cmd_tx);
        if worker.join().is_err() {
            reel_error!("engine thread panicked");
        }
    }
}

/// Performs one effect against the backend and returns the message that
/// reports its outcome, if the state machine needs one.
pub async fn execute(
    backend: &dyn TaskBackend,
    probe: &dyn MediaProbe,
    effect: Effect,
) -> Option<Msg> {
    reel_debug!("executing {:?}", effect);
    match effect {
        Effect::LoadTasks => Some(match backend.get_tasks().await {
            Ok(tasks) => Msg::TaskListReplaced(tasks),
            Err(err) => {
                reel_warn!("loading tasks failed: {}", err);
                Msg::TasksLoadFailed(err.to_string())
            }
        }),
        Effect::CreateTask { item, purpose } => {
            let result = backend.create_task(&item).await.map_err(message);
            Some(Msg::TaskCreated { purpose, result })
        }
        Effect::StartDownload { task_id } => {
            let result = backend.start_download(&task_id).await.map_err(message);
            Some(Msg::RequestCompleted {
                task_id,
                op: PendingOp::Start,
                result,
            })
        }
        Effect::StopDownload { task_id } => {
            let result = backend.stop_download(&task_id).await.map_err(message);
            Some(Msg::RequestCompleted {
                task_id,
                op: PendingOp::Stop,
                result,
            })
        }
        Effect::DeleteTask { task_id } => {
            let result = backend.delete_task(&task_id).await.map_err(message);
            Some(Msg::RequestCompleted {
                task_id,
                op: PendingOp::Delete,
                result,
            })
        }
        Effect::UpdateTaskClips {
            task_id,
            clips,
            start_after,
        } => {
            let result = backend
                .update_task_clips(&task_id, &clips)
                .await
                .map_err(message);
            Some(Msg::ClipsUpdated {
                task_id,
                clips,
                start_after,
                result,
            })
        }
        Effect::RebindTask { task_id, item } => {
            let result = backend.rebind_task(&task_id, &item).await.map_err(message);
            Some(Msg::RebindCompleted {
                task_id,
                item,
                result,
            })
        }
        Effect::ProbeDuration {
            task_id,
            media_type,
            playable_url,
        } => {
            if media_type != MediaType::Hls {
                reel_debug!("duration of task {} comes from the player", task_id);
                return None;
            }
            Some(match probe.duration(&playable_url).await {
                Ok(duration_secs) if duration_secs.is_finite() && duration_secs > 0.0 => {
                    Msg::MediaDurationKnown {
                        task_id,
                        duration_secs,
                    }
                }
                Ok(_) => Msg::MediaDurationUnavailable {
                    task_id,
                    message: "the stream reports no duration".to_string(),
                },
                Err(err) => Msg::MediaDurationUnavailable {
                    task_id,
                    message: err.to_string(),
                },
            })
        }
        Effect::SetExpandedWindow(expanded) => chrome(
            ChromeAction::SetExpanded,
            backend.set_expanded_window(expanded).await,
        ),
        Effect::TogglePinned => match backend.toggle_pinned().await {
            Ok(pinned) => Some(Msg::PinnedChanged(pinned)),
            Err(err) => chrome(ChromeAction::TogglePinned, Err(err)),
        },
        Effect::OpenDownloadDirectory => chrome(
            ChromeAction::OpenDownloadDirectory,
            backend.open_download_directory().await,
        ),
        Effect::LaunchBrowser => chrome(ChromeAction::LaunchBrowser, backend.launch_browser().await),
        Effect::QuitApplication => chrome(ChromeAction::Quit, backend.quit_application().await),
    }
}

fn message(err: BackendError) -> String {
    err.to_string()
}

fn chrome(action: ChromeAction, result: Result<(), BackendError>) -> Option<Msg> {
    result.err().map(|err| {
        reel_warn!("{:?} failed: {}", action, err);
        Msg::ChromeRequestFailed {
            action,
            message: err.to_string(),
        }
    })
}
