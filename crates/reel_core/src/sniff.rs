use std::collections::{BTreeMap, HashMap};

use reel_logging::{reel_debug, reel_trace};
use serde::{Deserialize, Serialize};

/// Browser tab (devtools target) identifier.
pub type TabId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Mp4,
    Hls,
    #[default]
    #[serde(other)]
    Other,
}

/// One media resource observed on the network, before it becomes a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SniffItem {
    pub url: String,
    #[serde(default)]
    pub origin_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub media_type: MediaType,
    /// 0 when the sniffer could not learn the size.
    #[serde(rename = "size", default)]
    pub size_bytes: u64,
    #[serde(rename = "targetId", alias = "tabId")]
    pub tab_id: TabId,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Outcome of closing a tab, surfaced so the caller decides what to show
/// when the active tab disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabClosed {
    pub dropped: usize,
    pub cleared_active: bool,
}

/// Per-tab, deduplicated, newest-first sniff lists plus the active tab.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SniffRegistry {
    tabs: HashMap<TabId, Vec<SniffItem>>,
    active_tab: Option<TabId>,
}

impl SniffRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `item` at the front of its tab's list unless that tab already
    /// holds the same url. Returns whether the item was stored.
    pub fn record(&mut self, item: SniffItem) -> bool {
        let items = self.tabs.entry(item.tab_id.clone()).or_default();
        if items.iter().any(|existing| existing.url == item.url) {
            reel_trace!("sniff duplicate dropped tab={} url={}", item.tab_id, item.url);
            return false;
        }
        reel_debug!(
            "sniff recorded tab={} type={:?} url_len={}",
            item.tab_id,
            item.media_type,
            item.url.len()
        );
        items.insert(0, item);
        true
    }

    /// Points the visible list at `tab_id`. Unknown tabs are fine and show
    /// nothing until something is sniffed there.
    pub fn focus(&mut self, tab_id: TabId) {
        self.active_tab = Some(tab_id);
    }

    /// Forgets everything sniffed in `tab_id`. Closing the active tab leaves
    /// no active tab; no other tab is chosen in its place.
    pub fn close(&mut self, tab_id: &str) -> TabClosed {
        let dropped = self.tabs.remove(tab_id).map_or(0, |items| items.len());
        let cleared_active = self.active_tab.as_deref() == Some(tab_id);
        if cleared_active {
            self.active_tab = None;
        }
        reel_debug!(
            "tab closed tab={} dropped={} cleared_active={}",
            tab_id,
            dropped,
            cleared_active
        );
        TabClosed {
            dropped,
            cleared_active,
        }
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.as_deref()
    }

    /// Items of the active tab, newest first.
    pub fn visible(&self) -> &[SniffItem] {
        self.active_tab
            .as_deref()
            .map_or(&[][..], |tab_id| self.items(tab_id))
    }

    pub fn items(&self, tab_id: &str) -> &[SniffItem] {
        self.tabs.get(tab_id).map_or(&[][..], Vec::as_slice)
    }

    pub fn find_visible(&self, url: &str) -> Option<&SniffItem> {
        self.visible().iter().find(|item| item.url == url)
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn reset(&mut self) {
        self.tabs.clear();
        self.active_tab = None;
    }
}
