use std::fmt;
use std::path::PathBuf;
use std::thread;

/// Which discoveries are recorded in the result set.
///
/// The filter governs recording only: internal pages are still traversed
/// under `ExternalOnly`, since they are the only route to further external
/// links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    InternalOnly,
    ExternalOnly,
}

impl FilterMode {
    /// Whether a link with the given classification is recorded.
    pub fn admits(&self, external: bool) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::InternalOnly => !external,
            FilterMode::ExternalOnly => external,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::All => write!(f, "all"),
            FilterMode::InternalOnly => write!(f, "internal-only"),
            FilterMode::ExternalOnly => write!(f, "external-only"),
        }
    }
}

/// Immutable parameters for a single crawl run. Built once at startup and
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed: String,
    /// Recursion bound. A branch entering at `depth >= max_depth` performs
    /// no fetch, so `max_depth = 0` suppresses even the seed fetch.
    pub max_depth: usize,
    pub filter: FilterMode,
    pub verbose: bool,
    pub output_path: Option<PathBuf>,
    pub show_tree: bool,
    /// Page fetch timeout in seconds. Validation probes use half of this.
    pub timeout_secs: u64,
    /// Concurrency gate capacity shared by page fetches and probes.
    pub workers: usize,
}

impl CrawlConfig {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            max_depth: 3,
            filter: FilterMode::All,
            verbose: false,
            output_path: None,
            show_tree: false,
            timeout_secs: 60,
            workers: default_workers(),
        }
    }
}

/// Gate capacity scales with the host, floored so small machines still get
/// useful request parallelism.
pub fn default_workers() -> usize {
    let cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
    (cores * 4).max(16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_all_admits_both() {
        assert!(FilterMode::All.admits(true));
        assert!(FilterMode::All.admits(false));
    }

    #[test]
    fn filter_internal_only_rejects_external() {
        assert!(FilterMode::InternalOnly.admits(false));
        assert!(!FilterMode::InternalOnly.admits(true));
    }

    #[test]
    fn filter_external_only_rejects_internal() {
        assert!(FilterMode::ExternalOnly.admits(true));
        assert!(!FilterMode::ExternalOnly.admits(false));
    }

    #[test]
    fn default_workers_has_a_floor() {
        assert!(default_workers() >= 16);
    }
}
