//! Rebuild-on-change loop for `serve`.
//!
//! ```text
//! notify -> WatchFilter -> Debouncer -> rebuild -> reload
//! ```
//!
//! One thread owns both the rebuild and the reload, so builds never overlap.
//! Events that arrive during a build wait in the channel and are coalesced
//! into the next rebuild.

mod debouncer;
mod filter;

use debouncer::{Debouncer, REBUILD_COOLDOWN};
use filter::WatchFilter;

use crate::config::{SiteConfig, cfg, reload_config};
use crate::logger::{status_error, status_success};
use crate::utils::plural::plural_count;
use crate::{debug, log};
use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, select};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Filesystem watcher with debounced, filtered batches.
pub struct SiteWatcher {
    events: Receiver<notify::Result<notify::Event>>,
    // kept alive for the lifetime of the loop
    _watcher: RecommendedWatcher,
    filter: WatchFilter,
    debouncer: Debouncer,
}

impl SiteWatcher {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let (tx, events) = channel::unbounded();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;

        for path in &config.watch.paths {
            if !path.exists() {
                log!("watch"; "skipping missing path {}", config.root_relative(path).display());
                continue;
            }
            watcher
                .watch(path, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch {}", path.display()))?;
        }

        Ok(Self {
            events,
            _watcher: watcher,
            filter: WatchFilter::new(config)?,
            debouncer: Debouncer::new(
                Duration::from_millis(config.watch.debounce_ms),
                REBUILD_COOLDOWN,
            ),
        })
    }

    /// Swap in the ignore rules of a reloaded config.
    ///
    /// Invalid rules are reported and the current ones stay in place.
    pub fn refresh_filter(&mut self, config: &SiteConfig) -> bool {
        match WatchFilter::new(config) {
            Ok(filter) => {
                self.filter = filter;
                true
            }
            Err(e) => {
                status_error("watch.ignore rejected, keeping previous rules", &e.to_string());
                false
            }
        }
    }

    /// Block until a debounced batch of relevant changes is ready.
    ///
    /// Returns `None` once `stop` fires or the watcher goes away.
    pub fn next_batch(&mut self, stop: &Receiver<()>) -> Option<Vec<PathBuf>> {
        loop {
            if let Some(changes) = self.debouncer.take_if_ready() {
                let mut paths: Vec<_> = changes.into_keys().collect();
                paths.sort();
                return Some(paths);
            }
            select! {
                recv(self.events) -> msg => match msg {
                    Ok(Ok(mut event)) => {
                        event.paths.retain(|p| self.filter.is_relevant(p));
                        if !event.paths.is_empty() {
                            self.debouncer.add_event(&event);
                        }
                    }
                    Ok(Err(e)) => log!("watch"; "notify error: {e}"),
                    Err(_) => return None,
                },
                recv(stop) -> _ => return None,
                default(self.debouncer.sleep_duration()) => {}
            }
        }
    }

    /// Start the rebuild cooldown.
    pub fn mark_built(&mut self) {
        self.debouncer.mark_built();
    }
}

/// Watch the site and call `rebuild` then `reload` for every batch.
///
/// A failed rebuild is reported and the loop keeps watching. When the
/// config file is among the changes it is reloaded first; an invalid config
/// skips the rebuild.
pub fn run<B, R>(stop: &Receiver<()>, mut rebuild: B, reload: R) -> Result<()>
where
    B: FnMut(&Arc<SiteConfig>) -> Result<()>,
    R: Fn() -> usize,
{
    let config = cfg();
    let mut watcher = SiteWatcher::new(&config)?;
    log!("watch"; "watching for changes");

    while let Some(changes) = watcher.next_batch(stop) {
        debug!("watch"; "{} changed", plural_count(changes.len(), "path"));

        if changes.iter().any(|p| *p == cfg().config_path) {
            match reload_config() {
                Ok(true) => {
                    log!("config"; "reloaded");
                    watcher.refresh_filter(&cfg());
                }
                Ok(false) => {}
                Err(e) => {
                    status_error("config reload failed", &format!("{e:#}"));
                    watcher.mark_built();
                    continue;
                }
            }
        }

        let config = cfg();
        match rebuild(&config) {
            Ok(()) => {
                let clients = reload();
                status_success(&format!(
                    "rebuilt after {} ({} reloaded)",
                    summarize(&changes, &config),
                    plural_count(clients, "client")
                ));
            }
            Err(e) => status_error("rebuild failed", &format!("{e:#}")),
        }
        watcher.mark_built();
    }
    Ok(())
}

/// `_posts/a.md` or `3 files`.
fn summarize(changes: &[PathBuf], config: &SiteConfig) -> String {
    match changes {
        [one] => config.root_relative(one).display().to_string(),
        _ => plural_count(changes.len(), "file"),
    }
}
