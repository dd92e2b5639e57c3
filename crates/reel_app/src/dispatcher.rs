use std::sync::mpsc;

use reel_core::{update, AppState, AppViewModel, Effect, Msg};
use reel_logging::{reel_debug, reel_info};

/// Receives the effects produced by each update.
pub(crate) trait EffectSink {
    fn run(&mut self, effect: Effect);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

/// The single loop that owns [`AppState`]; every message goes through it.
pub(crate) struct Dispatcher<S: EffectSink> {
    state: AppState,
    sink: S,
    seq: u64,
}

impl<S: EffectSink> Dispatcher<S> {
    pub fn new(state: AppState, sink: S) -> Self {
        Self {
            state,
            sink,
            seq: 0,
        }
    }

    pub fn dispatch(&mut self, msg: Msg) -> Flow {
        self.seq += 1;

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            render(self.seq, &state.view());
        }
        self.state = state;

        let mut flow = Flow::Continue;
        for effect in effects {
            if matches!(effect, Effect::QuitApplication) {
                flow = Flow::Quit;
            }
            self.sink.run(effect);
        }
        flow
    }

    /// Applies messages until a quit is requested or every sender is gone.
    /// Returns the sink so the caller can shut it down.
    pub fn run(mut self, msg_rx: mpsc::Receiver<Msg>) -> S {
        for msg in msg_rx {
            if self.dispatch(msg) == Flow::Quit {
                reel_info!("quit requested");
                break;
            }
        }
        self.sink
    }
}

/// Headless rendering: a one-line summary of what a UI would redraw.
fn render(seq: u64, view: &AppViewModel) {
    reel_debug!(
        "#{} view: tab={:?} sniffs={} active={} done={} marking={} notices={}",
        seq,
        view.active_tab,
        view.sniff_count(),
        view.active_tasks.len(),
        view.done_tasks.len(),
        view.marking.is_some(),
        view.notices.len()
    );
    for notice in &view.notices {
        reel_info!("{:?}: {}", notice.level, notice.message);
    }
}
