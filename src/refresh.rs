use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::cache::CacheLoader;
use super::config::FetcherConfig;
use super::records::Schedule;
use super::utils::spinner_with_message;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to start the async runtime: {0}")]
    Runtime(std::io::Error),

    #[error("Failed to start {program:?}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Fetcher did not finish within {0}s")]
    Timeout(u64),

    #[error("Failed waiting for the fetcher: {0}")]
    Wait(std::io::Error),

    #[error("Fetcher exited with status {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },
}

/// Something that can bring the cache file up to date.
pub trait Fetch {
    /// True when the cache file was rewritten successfully.
    fn fetch_fresh_data(&self) -> bool;
}

impl<F: Fn() -> bool> Fetch for F {
    fn fetch_fresh_data(&self) -> bool {
        self()
    }
}

/// Runs the external fetcher program with a bounded wait.
#[derive(Debug, Clone)]
pub struct Fetcher {
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Self {
        Fetcher { config }
    }

    fn run(&self) -> Result<Output, FetchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(FetchError::Runtime)?;
        let output = runtime.block_on(self.run_with_timeout())?;
        for (stream, text) in captured_streams(&output) {
            debug!("Fetcher {stream}: {text}");
        }

        if !output.status.success() {
            return Err(FetchError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    async fn run_with_timeout(&self) -> Result<Output, FetchError> {
        let child = Command::new(&self.config.program)
            .args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FetchError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        // Dropping the pending wait on timeout kills the child
        timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| FetchError::Timeout(self.config.timeout_secs))?
        .map_err(FetchError::Wait)
    }
}

/// The non-blank streams of a finished fetcher run, trimmed, stdout first.
fn captured_streams(output: &Output) -> Vec<(&'static str, String)> {
    [("stdout", &output.stdout), ("stderr", &output.stderr)]
        .into_iter()
        .map(|(stream, bytes)| (stream, String::from_utf8_lossy(bytes).trim().to_string()))
        .filter(|(_, text)| !text.is_empty())
        .collect()
}

impl Fetch for Fetcher {
    fn fetch_fresh_data(&self) -> bool {
        let spinner = spinner_with_message(format!("Running {}", self.config.program));
        let result = self.run();
        spinner.finish_and_clear();

        match result {
            Ok(_) => {
                info!("Successfully fetched fresh departure data");
                true
            }
            Err(err) => {
                error!("Error fetching fresh data: {}", err);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetch worked and the schedule was read again from disk
    Reloaded,
    /// The fetch failed and the schedule was left as it was
    KeptCached,
}

/// Fetch first, then reload from the cache file.
pub struct RefreshCoordinator<F: Fetch> {
    fetcher: F,
    cache: CacheLoader,
}

impl<F: Fetch> RefreshCoordinator<F> {
    pub fn new(fetcher: F, cache: CacheLoader) -> Self {
        RefreshCoordinator { fetcher, cache }
    }

    pub fn cache(&self) -> &CacheLoader {
        &self.cache
    }

    /// True when fresh data is on disk and the current view should be dropped.
    pub fn update_data(&self) -> bool {
        if self.fetcher.fetch_fresh_data() {
            info!("Successfully fetched fresh data, reloading");
            true
        } else {
            warn!("Failed to fetch fresh data, using cached data");
            false
        }
    }

    /// Replaces `current` with a fresh load after a successful fetch.
    /// On failure `current` keeps the last good schedule.
    pub fn refresh(&self, current: &mut Option<Schedule>) -> RefreshOutcome {
        if self.update_data() {
            *current = self.cache.load();
            RefreshOutcome::Reloaded
        } else {
            RefreshOutcome::KeptCached
        }
    }
}
