//! Decides what a freshly fetched track means for a followed user.

use std::fmt;

/// Composite `artist+album+name` key. Only ever compared, never parsed back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SongId(String);

impl SongId {
    pub fn new(artist: &str, album: &str, name: &str) -> Self {
        Self(format!("{}+{}+{}", artist, album, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SongId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    /// First observation: store the track without announcing it.
    Seed,
    NoChange,
    /// Store the track and announce it.
    Notify,
}

pub fn decide(previous: Option<&SongId>, current: &SongId) -> ChangeAction {
    match previous {
        None => ChangeAction::Seed,
        Some(previous) if previous == current => ChangeAction::NoChange,
        Some(_) => ChangeAction::Notify,
    }
}
