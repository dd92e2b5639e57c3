use std::collections::BTreeMap;
use std::time::Duration;

use reel_core::{KeepInterval, SniffItem, Task};
use reel_logging::{reel_debug, reel_warn};
use reqwest::header::CONTENT_TYPE;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{BackendError, TaskBackend};

/// Address of the backend's RPC listener when nothing is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:12346";

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// [`TaskBackend`] over JSON RPC: every call is `POST {base}/rpc/{method}`.
///
/// A non-2xx answer carrying `{"error": "..."}` becomes
/// [`BackendError::Rejected`]; any other non-2xx status becomes
/// [`BackendError::HttpStatus`]. An empty success body decodes as `null`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct Empty {}

#[derive(Serialize)]
struct CreateRequest<'a> {
    item: &'a SniffItem,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskRequest<'a> {
    task_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClipsRequest<'a> {
    task_id: &'a str,
    clips: &'a [KeepInterval],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RebindRequest<'a> {
    task_id: &'a str,
    url: &'a str,
    origin_url: &'a str,
    headers: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
struct ExpandedRequest {
    expanded: bool,
}

#[derive(Deserialize)]
struct Rejection {
    error: String,
}

impl HttpBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| BackendError::InvalidUrl(format!("{}: {err}", settings.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(settings.base_url));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::Network(err.to_string()))?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, method: &str) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .push("rpc")
            .push(method);
        Ok(url)
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned + Send,
    {
        let url = self.endpoint(method)?;
        let payload =
            serde_json::to_vec(body).map_err(|err| BackendError::Encode(err.to_string()))?;
        reel_debug!("rpc {} ({} bytes)", method, payload.len());

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            let error = match serde_json::from_slice::<Rejection>(&bytes) {
                Ok(rejection) if !rejection.error.trim().is_empty() => {
                    BackendError::Rejected(rejection.error)
                }
                _ => BackendError::HttpStatus(status.as_u16()),
            };
            reel_warn!("rpc {} failed: {}", method, error);
            return Err(error);
        }
        decode_body(&bytes)
    }
}

fn decode_body<R: DeserializeOwned>(bytes: &[u8]) -> Result<R, BackendError> {
    let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        bytes
    };
    serde_json::from_slice(body).map_err(|err| BackendError::Decode(err.to_string()))
}

#[async_trait::async_trait]
impl TaskBackend for HttpBackend {
    async fn create_task(&self, item: &SniffItem) -> Result<Task, BackendError> {
        self.call("create_task", &CreateRequest { item }).await
    }

    async fn start_download(&self, task_id: &str) -> Result<(), BackendError> {
        let _: IgnoredAny = self.call("start_download", &TaskRequest { task_id }).await?;
        Ok(())
    }

    async fn stop_download(&self, task_id: &str) -> Result<(), BackendError> {
        let _: IgnoredAny = self.call("stop_download", &TaskRequest { task_id }).await?;
        Ok(())
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), BackendError> {
        let _: IgnoredAny = self.call("delete_task", &TaskRequest { task_id }).await?;
        Ok(())
    }

    async fn update_task_clips(
        &self,
        task_id: &str,
        clips: &[KeepInterval],
    ) -> Result<(), BackendError> {
        let _: IgnoredAny = self
            .call("update_task_clips", &ClipsRequest { task_id, clips })
            .await?;
        Ok(())
    }

    async fn rebind_task(&self, task_id: &str, item: &SniffItem) -> Result<(), BackendError> {
        let request = RebindRequest {
            task_id,
            url: &item.url,
            origin_url: &item.origin_url,
            headers: &item.headers,
        };
        let _: IgnoredAny = self.call("rebind_task", &request).await?;
        Ok(())
    }

    async fn get_tasks(&self) -> Result<Vec<Task>, BackendError> {
        let tasks: Option<Vec<Task>> = self.call("get_tasks", &Empty {}).await?;
        Ok(tasks.unwrap_or_default())
    }

    async fn set_expanded_window(&self, expanded: bool) -> Result<(), BackendError> {
        let _: IgnoredAny = self
            .call("set_expanded_window", &ExpandedRequest { expanded })
            .await?;
        Ok(())
    }

    async fn toggle_pinned(&self) -> Result<bool, BackendError> {
        self.call("toggle_pinned", &Empty {}).await
    }

    async fn open_download_directory(&self) -> Result<(), BackendError> {
        let _: IgnoredAny = self.call("open_download_directory", &Empty {}).await?;
        Ok(())
    }

    async fn launch_browser(&self) -> Result<(), BackendError> {
        let _: IgnoredAny = self.call("launch_browser", &Empty {}).await?;
        Ok(())
    }

    async fn quit_application(&self) -> Result<(), BackendError> {
        let _: IgnoredAny = self.call("quit_application", &Empty {}).await?;
        Ok(())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::Timeout;
    }
    if err.is_builder() {
        return BackendError::InvalidUrl(err.to_string());
    }
    BackendError::Network(err.to_string())
}
