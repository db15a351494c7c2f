//! # Runtime
//!
//! Tokio runtime presets shared by the `ModuleHub` binaries.
//!
//! * **High performance**: servers; larger stacks and long-lived idle workers.
//! * **Memory efficient**: constrained hosts; half the workers, smaller stacks.
//! * **Default**: auto-detected parallelism, honoring `TOKIO_WORKER_THREADS`.
//!
//! ```rust,ignore
//! #[modhub_runtime::main(high_performance)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use modhub_derive::main;

use anyhow::Context;
use std::sync::OnceLock;
use std::thread::available_parallelism;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

const FALLBACK_WORKER_THREADS: usize = 4;
const MAX_WORKER_THREADS: usize = 1024;
const DEFAULT_STACK_SIZE: usize = 3 * 1024 * 1024;
const MIN_STACK_SIZE: usize = 1024 * 1024;
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
const DEFAULT_THREAD_NAME: &str = "modhub-worker";

static DETECTED_WORKERS: OnceLock<usize> = OnceLock::new();

fn detected_workers() -> usize {
    *DETECTED_WORKERS.get_or_init(|| {
        std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|&n| (1..=MAX_WORKER_THREADS).contains(&n))
            .unwrap_or_else(|| {
                available_parallelism().map_or(FALLBACK_WORKER_THREADS, std::num::NonZero::get)
            })
    })
}

/// Multi-thread runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: detected_workers(),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            thread_keep_alive: Duration::from_secs(60),
        }
    }
}

impl RuntimeConfig {
    /// Preset for the API server.
    #[must_use]
    pub fn high_performance() -> Self {
        Self {
            stack_size: 4 * 1024 * 1024,
            thread_name: "modhub-hp".to_owned(),
            thread_keep_alive: Duration::from_secs(300),
            ..Self::default()
        }
    }

    /// Preset for small hosts and tooling.
    #[must_use]
    pub fn memory_efficient() -> Self {
        Self {
            worker_threads: (detected_workers() / 2).max(1),
            stack_size: 2 * 1024 * 1024,
            thread_name: "modhub-mem".to_owned(),
            thread_keep_alive: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self.normalized()
    }

    #[must_use]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self.normalized()
    }

    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self.normalized()
    }

    /// Clamps every knob into its supported range.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.worker_threads = self.worker_threads.clamp(1, MAX_WORKER_THREADS);
        self.stack_size = self.stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        if self.thread_name.trim().is_empty() {
            DEFAULT_THREAD_NAME.clone_into(&mut self.thread_name);
        }
        self
    }
}

/// Builds a multi-thread runtime with I/O and timers enabled.
///
/// # Errors
/// Returns an error when the OS refuses to spawn the worker threads.
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.clone().normalized();
    debug!(?config, "Building tokio runtime");

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .context("Failed to initialize tokio runtime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knobs_are_clamped() {
        assert_eq!(RuntimeConfig::default().with_worker_threads(0).worker_threads, 1);
        assert_eq!(
            RuntimeConfig::default().with_worker_threads(5000).worker_threads,
            MAX_WORKER_THREADS
        );
        assert_eq!(RuntimeConfig::default().with_stack_size(10).stack_size, MIN_STACK_SIZE);
        assert_eq!(RuntimeConfig::default().with_thread_name(" ").thread_name, DEFAULT_THREAD_NAME);
    }

    #[test]
    fn presets_differ() {
        let hp = RuntimeConfig::high_performance();
        let mem = RuntimeConfig::memory_efficient();
        assert!(hp.stack_size > mem.stack_size);
        assert!(hp.worker_threads >= mem.worker_threads);
    }

    #[test]
    fn runtime_runs_futures() {
        let runtime = build_runtime_with_config(&RuntimeConfig::default().with_worker_threads(1))
            .expect("runtime");
        assert_eq!(runtime.block_on(async { 21 * 2 }), 42);
    }
}
