//! Parallel fan-out of independent stages with a join barrier.
//!
//! Every stage gets its own scoped thread and `JoinHandle`. The first stage
//! that fails records its name and trips the shared [`CancelToken`]; the
//! others notice between files and return [`PipelineError::Cancelled`].
//! At the barrier the recorded failure wins over any cancellation.

use super::error::PipelineError;
use super::fileset::FileSet;
use super::stage::{Stage, StageContext, StageReport};
use crate::core::CancelToken;
use crate::logger::ProgressLine;
use std::path::Path;
use std::sync::OnceLock;
use std::thread;

/// A stage paired with the keys it claimed.
pub struct Job<'a> {
    pub stage: &'a Stage,
    pub keys: Vec<String>,
}

pub fn run_parallel(
    jobs: &[Job<'_>],
    input: &FileSet,
    output: &Path,
    ctx: &StageContext,
    cancel: &CancelToken,
) -> Result<Vec<StageReport>, PipelineError> {
    let counters: Vec<_> = jobs.iter().map(|j| (j.stage.name(), j.keys.len())).collect();
    let progress = ProgressLine::new("stages", &counters);
    let first_failure: OnceLock<&'static str> = OnceLock::new();

    let results: Vec<(&'static str, Result<StageReport, PipelineError>)> =
        thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .iter()
                .map(|job| {
                    let progress = &progress;
                    let first_failure = &first_failure;
                    let handle = scope.spawn(move || {
                        let result =
                            job.stage
                                .run(input, &job.keys, output, ctx, cancel, Some(progress));
                        if let Err(err) = &result
                            && !err.is_cancelled()
                        {
                            first_failure.get_or_init(|| job.stage.name());
                            cancel.cancel();
                        }
                        result
                    });
                    (job.stage.name(), handle)
                })
                .collect();

            // Barrier: every handle is joined before anything is reported.
            handles
                .into_iter()
                .map(|(name, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        cancel.cancel();
                        first_failure.get_or_init(|| name);
                        Err(PipelineError::Stage {
                            stage: name.to_string(),
                            path: String::new(),
                            message: "worker panicked".to_string(),
                        })
                    });
                    (name, result)
                })
                .collect()
        });

    let mut reports = Vec::with_capacity(results.len());
    let mut failure = None;
    let mut cancelled = None;
    for (name, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(err) if Some(&name) == first_failure.get() => failure = Some(err),
            Err(err) if err.is_cancelled() => {
                cancelled.get_or_insert(err);
            }
            // A later, independent failure; the first one is reported.
            Err(_) => {}
        }
    }

    if let Some(err) = failure.or(cancelled) {
        drop(progress);
        return Err(err);
    }
    progress.finish();
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fileset::write_file;
    use crate::pipeline::selector::Selector;
    use crate::pipeline::stage::Transform;
    use anyhow::{Result, bail};
    use tempfile::TempDir;

    struct Fail;

    impl Transform for Fail {
        fn name(&self) -> &'static str {
            "fail"
        }

        fn apply(&self, key: &str, _input: Vec<u8>, _ctx: &StageContext) -> Result<Vec<u8>> {
            bail!("cannot handle {key}")
        }
    }

    struct Reverse;

    impl Transform for Reverse {
        fn name(&self) -> &'static str {
            "reverse"
        }

        fn apply(&self, _key: &str, mut input: Vec<u8>, _ctx: &StageContext) -> Result<Vec<u8>> {
            input.reverse();
            Ok(input)
        }
    }

    fn fixture() -> (TempDir, FileSet) {
        let src = TempDir::new().unwrap();
        for (key, body) in [("a.css", "css-a"), ("b.js", "js-b"), ("c.txt", "txt-c"), ("d/e.js", "js-e")] {
            write_file(src.path(), key, body.as_bytes()).unwrap();
        }
        let set = FileSet::scan(src.path()).unwrap();
        (src, set)
    }

    fn keys(set: &FileSet, ext: &str) -> Vec<String> {
        set.keys().iter().filter(|k| k.ends_with(ext)).cloned().collect()
    }

    fn ctx(dir: &Path) -> StageContext {
        StageContext {
            minify: true,
            build_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_union_equals_independent_runs() {
        let (_src, set) = fixture();
        let css = Stage::new("css", Selector::new(&["**/*.css"]).unwrap()).with(Reverse);
        let js = Stage::new("js", Selector::new(&["**/*.js"]).unwrap()).with(Reverse);
        let copy = Stage::new("copy", Selector::new(&["*"]).unwrap());
        let jobs = [
            Job { stage: &css, keys: keys(&set, ".css") },
            Job { stage: &js, keys: keys(&set, ".js") },
            Job { stage: &copy, keys: keys(&set, ".txt") },
        ];

        let parallel = TempDir::new().unwrap();
        let reports =
            run_parallel(&jobs, &set, parallel.path(), &ctx(parallel.path()), &CancelToken::new())
                .unwrap();
        assert_eq!(reports.len(), 3);

        let sequential = TempDir::new().unwrap();
        for job in &jobs {
            job.stage
                .run(&set, &job.keys, sequential.path(), &ctx(sequential.path()), &CancelToken::new(), None)
                .unwrap();
        }

        let left = FileSet::scan(parallel.path()).unwrap();
        let right = FileSet::scan(sequential.path()).unwrap();
        assert_eq!(left.keys(), right.keys());
        for key in left.keys() {
            assert_eq!(left.read(key).unwrap(), right.read(key).unwrap(), "{key}");
        }
        assert_eq!(left.read("d/e.js").unwrap(), b"e-sj");
    }

    #[test]
    fn test_first_failure_is_reported() {
        let (_src, set) = fixture();
        let css = Stage::new("css", Selector::new(&["**/*.css"]).unwrap()).with(Fail);
        let copy = Stage::new("copy", Selector::new(&["*"]).unwrap());
        let jobs = [
            Job { stage: &css, keys: keys(&set, ".css") },
            Job { stage: &copy, keys: keys(&set, ".txt") },
        ];

        let out = TempDir::new().unwrap();
        let cancel = CancelToken::new();
        let err = run_parallel(&jobs, &set, out.path(), &ctx(out.path()), &cancel).unwrap_err();
        match err {
            PipelineError::Stage { stage, path, .. } => {
                assert_eq!(stage, "css");
                assert_eq!(path, "a.css");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(cancel.is_cancelled());
    }
}
