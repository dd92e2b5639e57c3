use reel_core::Effect;
use reel_engine::EngineHandle;
use reel_logging::reel_debug;

use crate::dispatcher::EffectSink;

/// Hands effects to the engine thread.
pub(crate) struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn shutdown(self) {
        self.engine.shutdown();
    }
}

impl EffectSink for EffectRunner {
    fn run(&mut self, effect: Effect) {
        reel_debug!("effect {:?}", effect);
        self.engine.submit(effect);
    }
}
