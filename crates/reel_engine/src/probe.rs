use std::time::Duration;

use reel_core::preview::proxy_url;
use reel_logging::reel_debug;
use url::Url;

use crate::ProbeError;

/// Master playlists may point at other master playlists; give up after this
/// many hops.
const MAX_PLAYLIST_HOPS: usize = 3;

/// Learns the playable duration of a stream.
#[async_trait::async_trait]
pub trait MediaProbe: Send + Sync {
    async fn duration(&self, playlist_url: &str) -> Result<f64, ProbeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub bandwidth: u64,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Playlist {
    Master(Vec<Variant>),
    Media { duration: f64, segments: usize },
}

/// Sums `#EXTINF` durations, following the highest-bandwidth variant of a
/// master playlist.
#[derive(Debug, Clone)]
pub struct HlsDurationProbe {
    client: reqwest::Client,
}

impl HlsDurationProbe {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|err| ProbeError::Network(err.to_string()))?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &Url) -> Result<String, ProbeError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::HttpStatus(status.as_u16()));
        }
        response.text().await.map_err(map_reqwest_error)
    }
}

#[async_trait::async_trait]
impl MediaProbe for HlsDurationProbe {
    async fn duration(&self, playlist_url: &str) -> Result<f64, ProbeError> {
        let mut url = Url::parse(playlist_url)
            .map_err(|err| ProbeError::InvalidUrl(format!("{playlist_url}: {err}")))?;
        for _ in 0..MAX_PLAYLIST_HOPS {
            let text = self.fetch(&url).await?;
            match parse_playlist(&text)? {
                Playlist::Media { duration, segments } => {
                    reel_debug!("playlist {} has {} segments, {}s", url, segments, duration);
                    return Ok(duration);
                }
                Playlist::Master(variants) => {
                    // Ties go to the first listed variant.
                    let best = variants
                        .iter()
                        .rev()
                        .max_by_key(|variant| variant.bandwidth)
                        .ok_or(ProbeError::NoVariants)?;
                    reel_debug!("following variant {} ({} bps)", best.uri, best.bandwidth);
                    url = resolve_uri(&url, &best.uri)?;
                }
            }
        }
        Err(ProbeError::TooDeep)
    }
}

/// Parses an m3u8 document just far enough to find variants or durations.
pub fn parse_playlist(text: &str) -> Result<Playlist, ProbeError> {
    let mut lines = text
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());
    if lines.next() != Some("#EXTM3U") {
        return Err(ProbeError::NotAPlaylist);
    }

    let mut variants = Vec::new();
    let mut saw_stream_inf = false;
    let mut pending_bandwidth = None;
    let mut duration = 0.0;
    let mut segments = 0;

    for line in lines {
        if let Some(attributes) = line.strip_prefix("#EXT-X-STREAM-INF:") {
            saw_stream_inf = true;
            pending_bandwidth = Some(
                attribute(attributes, "BANDWIDTH")
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(0),
            );
        } else if let Some(rest) = line.strip_prefix("#EXTINF:") {
            let value = rest.split(',').next().unwrap_or_default().trim();
            match value.parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs >= 0.0 => {
                    duration += secs;
                    segments += 1;
                }
                _ => reel_debug!("ignoring malformed EXTINF {:?}", line),
            }
        } else if line.starts_with('#') {
            continue;
        } else if let Some(bandwidth) = pending_bandwidth.take() {
            variants.push(Variant {
                bandwidth,
                uri: line.to_string(),
            });
        }
    }

    if saw_stream_inf {
        if variants.is_empty() {
            return Err(ProbeError::NoVariants);
        }
        return Ok(Playlist::Master(variants));
    }
    if segments == 0 {
        return Err(ProbeError::NoSegments);
    }
    Ok(Playlist::Media { duration, segments })
}

/// Looks up `name` in an attribute list such as
/// `BANDWIDTH=1280000,CODECS="avc1.4d401f,mp4a.40.2"`.
fn attribute<'a>(list: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = list;
    while !rest.is_empty() {
        let (key, after_key) = rest.split_once('=')?;
        let (value, tail) = match after_key.strip_prefix('"') {
            Some(quoted) => {
                let end = quoted.find('"')?;
                (&quoted[..end], quoted[end + 1..].trim_start_matches(','))
            }
            None => after_key.split_once(',').unwrap_or((after_key, "")),
        };
        if key.trim().eq_ignore_ascii_case(name) {
            return Some(value.trim());
        }
        rest = tail;
    }
    None
}

/// Resolves a playlist entry. Behind the local proxy, relative entries are
/// resolved against the proxied source and wrapped in the proxy again.
fn resolve_uri(playlist: &Url, uri: &str) -> Result<Url, ProbeError> {
    let invalid = |err: url::ParseError| ProbeError::InvalidUrl(format!("{uri}: {err}"));
    let query = |name: &str| {
        playlist
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    match query("url") {
        Some(source) if playlist.path() == "/proxy" => {
            let target = Url::parse(&source)
                .and_then(|source| source.join(uri))
                .map_err(invalid)?;
            let referer = query("referer").unwrap_or_default();
            let wrapped = proxy_url(playlist.as_str(), target.as_str(), &referer)
                .ok_or_else(|| ProbeError::InvalidUrl(playlist.to_string()))?;
            Url::parse(&wrapped).map_err(invalid)
        }
        _ => playlist.join(uri).map_err(invalid),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        return ProbeError::Timeout;
    }
    ProbeError::Network(err.to_string())
}
