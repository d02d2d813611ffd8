//! Timing and per-path deduplication of filesystem events.

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::debug;
use crate::utils::path::normalize_path;

/// Quiet period after a rebuild before the next one may start.
pub const REBUILD_COOLDOWN: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }

    fn from_event(kind: &notify::EventKind) -> Option<Self> {
        use notify::EventKind;
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Remove(_) => Some(Self::Removed),
            // metadata-only changes (mtime, chmod) would loop rebuilds
            EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Modified),
            _ => None,
        }
    }
}

/// Pure debouncer: timing and deduplication only.
pub struct Debouncer {
    quiet: Duration,
    cooldown: Duration,
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
    last_build: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration, cooldown: Duration) -> Self {
        Self {
            quiet,
            cooldown,
            changes: FxHashMap::default(),
            last_event: None,
            last_build: None,
        }
    }

    pub fn add_event(&mut self, event: &notify::Event) {
        let Some(kind) = ChangeKind::from_event(&event.kind) else {
            return;
        };
        for path in &event.paths {
            if !is_temp_file(path) {
                self.add(normalize_path(path), kind);
            }
        }
    }

    /// Record one change:
    /// - Removed then Created/Modified: restored, keep the new kind
    /// - Modified then Removed: deleted
    /// - Created then Removed: appeared and vanished, dropped
    /// - anything else: first kind wins
    pub fn add(&mut self, path: PathBuf, kind: ChangeKind) {
        self.last_event = Some(Instant::now());
        let Some(&existing) = self.changes.get(&path) else {
            debug!("watch"; "{}: {}", kind.label(), path.display());
            self.changes.insert(path, kind);
            return;
        };
        match (existing, kind) {
            (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                self.changes.insert(path, kind);
            }
            (ChangeKind::Modified, ChangeKind::Removed) => {
                self.changes.insert(path, ChangeKind::Removed);
            }
            (ChangeKind::Created, ChangeKind::Removed) => {
                self.changes.remove(&path);
            }
            _ => {}
        }
    }

    /// Take the pending changes once the quiet window and cooldown elapsed.
    pub fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        Some(std::mem::take(&mut self.changes))
    }

    /// Start the cooldown; call when a rebuild finishes.
    pub fn mark_built(&mut self) {
        self.last_build = Some(Instant::now());
    }

    pub fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        if last_event.elapsed() < self.quiet {
            return false;
        }
        if self.last_build.is_some_and(|t| t.elapsed() < self.cooldown) {
            return false;
        }
        !self.changes.is_empty()
    }

    /// Time until the debouncer could next become ready.
    pub fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };
        let quiet_remaining = self.quiet.saturating_sub(last_event.elapsed());
        let cooldown_remaining = self
            .last_build
            .map_or(Duration::ZERO, |t| self.cooldown.saturating_sub(t.elapsed()));
        quiet_remaining
            .max(cooldown_remaining)
            .max(Duration::from_millis(1))
    }
}

/// Editor backup and swap files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp") || name.ends_with('~')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn fast() -> Debouncer {
        Debouncer::new(Duration::from_millis(20), Duration::from_millis(50))
    }

    #[test]
    fn test_waits_for_quiet_window() {
        let mut deb = fast();
        deb.add(PathBuf::from("/site/a.md"), ChangeKind::Modified);
        assert!(deb.take_if_ready().is_none());
        sleep(Duration::from_millis(30));
        let changes = deb.take_if_ready().unwrap();
        assert_eq!(changes.len(), 1);
        assert!(deb.take_if_ready().is_none());
    }

    #[test]
    fn test_dedup_per_path() {
        let mut deb = fast();
        let a = PathBuf::from("/site/a.md");
        let b = PathBuf::from("/site/b.md");
        deb.add(a.clone(), ChangeKind::Modified);
        deb.add(a.clone(), ChangeKind::Modified);
        deb.add(a.clone(), ChangeKind::Removed);
        deb.add(b.clone(), ChangeKind::Created);
        deb.add(b.clone(), ChangeKind::Removed);
        sleep(Duration::from_millis(30));
        let changes = deb.take_if_ready().unwrap();
        assert_eq!(changes.get(&a), Some(&ChangeKind::Removed));
        assert!(!changes.contains_key(&b));
    }

    #[test]
    fn test_cooldown_after_build() {
        let mut deb = fast();
        deb.mark_built();
        deb.add(PathBuf::from("/site/a.md"), ChangeKind::Modified);
        sleep(Duration::from_millis(25));
        assert!(!deb.is_ready());
        sleep(Duration::from_millis(40));
        assert!(deb.is_ready());
    }

    #[test]
    fn test_temp_files() {
        assert!(is_temp_file(Path::new("/site/.index.md.swp")));
        assert!(is_temp_file(Path::new("/site/index.md~")));
        assert!(!is_temp_file(Path::new("/site/.htaccess")));
    }
}
