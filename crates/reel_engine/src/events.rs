use reel_core::{Msg, SniffItem, TabId, Task, TaskProgress};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::DecodeError;

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Tab notifications carry the devtools target id.
#[derive(Deserialize)]
struct TabRef {
    #[serde(rename = "targetId", alias = "tabId")]
    tab_id: TabId,
}

/// Decodes one backend notification `{"event": name, "data": payload}` into
/// the message the dispatcher applies.
pub fn decode_event(line: &str) -> Result<Msg, DecodeError> {
    let envelope: Envelope =
        serde_json::from_str(line).map_err(|err| DecodeError::Malformed(err.to_string()))?;
    let Envelope { event, data } = envelope;

    match event.as_str() {
        "video_sniffed" => payload::<SniffItem>(&event, data).map(Msg::Sniffed),
        "tab_focused" => tab_id(&event, data).map(Msg::TabFocused),
        "tab_closed" => tab_id(&event, data).map(Msg::TabClosed),
        "task_list_updated" => {
            payload::<Option<Vec<Task>>>(&event, data)
                .map(|tasks| Msg::TaskListReplaced(tasks.unwrap_or_default()))
        }
        "task_progress" => payload::<TaskProgress>(&event, data).map(Msg::TaskProgress),
        _ => Err(DecodeError::UnknownEvent(event)),
    }
}

fn payload<T: DeserializeOwned>(event: &str, data: Value) -> Result<T, DecodeError> {
    serde_json::from_value(data).map_err(|err| DecodeError::InvalidPayload {
        event: event.to_string(),
        message: err.to_string(),
    })
}

/// Accepts either a bare id string or an object with `targetId`.
fn tab_id(event: &str, data: Value) -> Result<TabId, DecodeError> {
    match data {
        Value::String(id) => Ok(id),
        other => payload::<TabRef>(event, other).map(|tab| tab.tab_id),
    }
}
