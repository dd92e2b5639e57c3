use reel_logging::{reel_debug, reel_warn};
use serde::{Deserialize, Serialize};

/// Track-local clip identifier. Never leaves the track.
pub type ClipId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipStatus {
    #[default]
    Keep,
    Exclude,
}

impl ClipStatus {
    pub fn toggled(self) -> Self {
        match self {
            ClipStatus::Keep => ClipStatus::Exclude,
            ClipStatus::Exclude => ClipStatus::Keep,
        }
    }
}

/// One contiguous interval of the source timeline, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub id: ClipId,
    pub start: f64,
    pub end: f64,
    pub status: ClipStatus,
}

impl Clip {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    fn contains_strictly(&self, t: f64) -> bool {
        self.start < t && t < self.end
    }
}

/// One kept interval handed to the backend. `index` is the output position,
/// unrelated to any clip id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeepInterval {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Duration not known yet; every edit is a no-op.
    #[default]
    Unseeded,
    Editable,
    Committed,
}

/// Ordered, gapless, non-overlapping partition of `[0, duration]`.
///
/// Every edit either preserves the partition or does nothing. Invalid edits
/// (a split on a boundary, an unknown clip id, anything before the track is
/// seeded or after it is committed) are silent no-ops so rapid key-repeat
/// input can never break the editor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClipTrack {
    state: TrackState,
    duration: f64,
    clips: Vec<Clip>,
    next_id: ClipId,
}

impl ClipTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a track that is already seeded with `duration`.
    pub fn seeded(duration: f64) -> Self {
        let mut track = Self::new();
        track.seed(duration);
        track
    }

    /// Seeds the track with one keep clip spanning `[0, duration]`.
    ///
    /// Duration discovery is one-shot: once seeded, later calls are ignored.
    /// Returns whether the track was seeded by this call.
    pub fn seed(&mut self, duration: f64) -> bool {
        if self.state != TrackState::Unseeded {
            reel_debug!("seed ignored: track already {:?}", self.state);
            return false;
        }
        if !duration.is_finite() || duration <= 0.0 {
            reel_warn!("seed ignored: unusable duration {}", duration);
            return false;
        }
        self.duration = duration;
        let id = self.fresh_id();
        self.clips = vec![Clip {
            id,
            start: 0.0,
            end: duration,
            status: ClipStatus::Keep,
        }];
        self.state = TrackState::Editable;
        true
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn is_editable(&self) -> bool {
        self.state == TrackState::Editable
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|clip| clip.id == id)
    }

    /// Clip under the playhead. A boundary belongs to the clip starting there;
    /// the track end belongs to the last clip.
    pub fn clip_at(&self, t: f64) -> Option<&Clip> {
        let last = self.clips.last()?;
        if t == last.end {
            return Some(last);
        }
        self.clips
            .iter()
            .find(|clip| clip.start <= t && t < clip.end)
    }

    /// Splits the clip strictly containing `t` into two clips with fresh ids
    /// and the parent's status. Returns the ids of the new halves.
    pub fn split_at(&mut self, t: f64) -> Option<(ClipId, ClipId)> {
        if !self.is_editable() {
            return None;
        }
        if !(t > 0.0 && t < self.duration) {
            reel_debug!("split ignored: {} outside (0, {})", t, self.duration);
            return None;
        }
        let Some(index) = self.clips.iter().position(|clip| clip.contains_strictly(t)) else {
            reel_debug!("split ignored: {} lies on a boundary", t);
            return None;
        };

        let parent = self.clips[index].clone();
        let parent_id = parent.id;
        let left_id = self.fresh_id();
        let right_id = self.fresh_id();
        let left = Clip {
            id: left_id,
            end: t,
            ..parent.clone()
        };
        let right = Clip {
            id: right_id,
            start: t,
            ..parent
        };
        self.clips.splice(index..=index, [left, right]);
        reel_debug!(
            "split at {}: clip {} -> {} + {} ({} clips)",
            t,
            parent_id,
            left_id,
            right_id,
            self.clips.len()
        );
        Some((left_id, right_id))
    }

    /// Merges `id` into its left neighbour; the neighbour's status wins.
    ///
    /// The first clip has no left neighbour, so it is merged into the second
    /// clip instead: the second clip's start moves down to 0 and it takes the
    /// first clip's status. Either way the earlier segment's disposition
    /// survives. A single-clip track is left untouched.
    ///
    /// Returns the id of the surviving clip.
    pub fn merge_left(&mut self, id: ClipId) -> Option<ClipId> {
        if !self.is_editable() {
            return None;
        }
        let index = self.clips.iter().position(|clip| clip.id == id)?;
        if self.clips.len() < 2 {
            reel_debug!("merge ignored: clip {} is the only clip", id);
            return None;
        }

        let survivor = if index == 0 {
            let first = self.clips.remove(0);
            let next = &mut self.clips[0];
            next.start = first.start;
            next.status = first.status;
            next.id
        } else {
            let target = self.clips.remove(index);
            let left = &mut self.clips[index - 1];
            left.end = target.end;
            left.id
        };
        reel_debug!(
            "merged clip {} into {} ({} clips)",
            id,
            survivor,
            self.clips.len()
        );
        Some(survivor)
    }

    /// Flips keep/exclude on one clip. Returns the new status.
    pub fn toggle_status(&mut self, id: ClipId) -> Option<ClipStatus> {
        if !self.is_editable() {
            return None;
        }
        let clip = self.clips.iter_mut().find(|clip| clip.id == id)?;
        clip.status = clip.status.toggled();
        Some(clip.status)
    }

    /// Kept intervals in timeline order, re-indexed from 0. Does not change
    /// the track state.
    pub fn kept_intervals(&self) -> Vec<KeepInterval> {
        self.clips
            .iter()
            .filter(|clip| clip.status == ClipStatus::Keep)
            .enumerate()
            .map(|(index, clip)| KeepInterval {
                index,
                start: clip.start,
                end: clip.end,
            })
            .collect()
    }

    /// Finalizes the track and returns its kept intervals. An unseeded track
    /// commits to nothing and stays unseeded.
    pub fn commit(&mut self) -> Vec<KeepInterval> {
        if self.state == TrackState::Editable {
            self.state = TrackState::Committed;
        }
        self.kept_intervals()
    }

    /// True when the track is a single keep clip covering everything.
    pub fn is_untrimmed(&self) -> bool {
        matches!(self.clips.as_slice(), [only] if only.status == ClipStatus::Keep)
    }

    /// Checks the partition law: first clip starts at 0, last ends at the
    /// duration, neighbours touch exactly and every clip is non-empty.
    pub fn is_partition(&self) -> bool {
        let (Some(first), Some(last)) = (self.clips.first(), self.clips.last()) else {
            return self.state == TrackState::Unseeded;
        };
        first.start == 0.0
            && last.end == self.duration
            && self.clips.iter().all(|clip| clip.start < clip.end)
            && self
                .clips
                .windows(2)
                .all(|pair| pair[0].end == pair[1].start)
    }

    fn fresh_id(&mut self) -> ClipId {
        self.next_id += 1;
        self.next_id
    }
}
