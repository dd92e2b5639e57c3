//! FetchReel engine: backend RPC, inbound event decoding, stream probing and
//! effect execution.
mod backend;
mod engine;
mod error;
mod events;
mod http;
mod probe;

pub use backend::TaskBackend;
pub use engine::{execute, EngineHandle};
pub use error::{BackendError, DecodeError, ProbeError};
pub use events::decode_event;
pub use http::{BackendSettings, HttpBackend, DEFAULT_BACKEND_URL};
pub use probe::{parse_playlist, HlsDurationProbe, MediaProbe, Playlist, Variant};
