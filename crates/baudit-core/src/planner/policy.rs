//! Eligibility policy: which recorded keys take part in staleness tracking.

use crate::config::PolicyConfig;

/// Decides whether a key's category is re-verified when its timestamp moves.
pub trait EligibilityPolicy: Send + Sync {
    fn tracks(&self, key: &str) -> bool;
}

impl<F> EligibilityPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn tracks(&self, key: &str) -> bool {
        self(key)
    }
}

/// Tracks keys matching any watched prefix or substring. Directory
/// placeholders (keys ending in `/`) are excluded unless enabled.
#[derive(Debug, Clone, Default)]
pub struct WatchPolicy {
    prefixes: Vec<String>,
    substrings: Vec<String>,
    track_directory_markers: bool,
}

impl WatchPolicy {
    /// Track every key except directory placeholders.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes.extend(prefixes.into_iter().map(Into::into));
        self
    }

    pub fn with_substrings<I, S>(mut self, substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.substrings.extend(substrings.into_iter().map(Into::into));
        self
    }

    pub fn track_directory_markers(mut self, on: bool) -> Self {
        self.track_directory_markers = on;
        self
    }

    fn matches_watch_list(&self, key: &str) -> bool {
        if self.prefixes.is_empty() && self.substrings.is_empty() {
            return true;
        }
        self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
            || self.substrings.iter().any(|s| key.contains(s.as_str()))
    }
}

impl EligibilityPolicy for WatchPolicy {
    fn tracks(&self, key: &str) -> bool {
        if key.ends_with('/') && !self.track_directory_markers {
            return false;
        }
        self.matches_watch_list(key)
    }
}

impl From<&PolicyConfig> for WatchPolicy {
    fn from(cfg: &PolicyConfig) -> Self {
        WatchPolicy::all()
            .with_prefixes(cfg.watch_prefixes.iter().cloned())
            .with_substrings(cfg.watch_substrings.iter().cloned())
            .track_directory_markers(cfg.track_directory_markers)
    }
}
