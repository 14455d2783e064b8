//! Batch progress reporting.
//!
//! The library emits file-level events through [`BatchProgressCallback`];
//! callers inject an implementation (the CLIs use an indicatif-backed one)
//! or none at all. Every method has a no-op default so implementors only
//! override what they display.

use crate::report::BatchStats;
use std::sync::Arc;

/// Observer for batch conversion progress.
///
/// `index` is 1-based and `total` is the number of files in the run.
pub trait BatchProgressCallback: Send + Sync {
    /// A batch of `total` files is about to start.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Conversion of one file is starting.
    fn on_file_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// One file converted successfully.
    fn on_file_complete(
        &self,
        index: usize,
        total: usize,
        name: &str,
        duration_ms: u64,
        used_fallback: bool,
    ) {
        let _ = (index, total, name, duration_ms, used_fallback);
    }

    /// One file failed (the batch may still continue).
    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// The batch finished; `stats` covers every attempted file.
    fn on_batch_complete(&self, stats: &BatchStats) {
        let _ = stats;
    }
}

/// Callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Shared handle to a progress observer.
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl BatchProgressCallback for Recorder {
        fn on_batch_start(&self, total: usize) {
            self.events.lock().unwrap().push(format!("start {total}"));
        }

        fn on_file_complete(
            &self,
            index: usize,
            _total: usize,
            name: &str,
            _duration_ms: u64,
            used_fallback: bool,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {index} {name} fallback={used_fallback}"));
        }
    }

    #[test]
    fn noop_callback_accepts_all_events() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(3);
        cb.on_file_start(1, 3, "a.pdf");
        cb.on_file_complete(1, 3, "a.pdf", 1000, false);
        cb.on_file_error(2, 3, "b.pdf", "boom");
        cb.on_batch_complete(&BatchStats::default());
    }

    #[test]
    fn overridden_methods_receive_events() {
        let recorder = Recorder::default();
        recorder.on_batch_start(2);
        recorder.on_file_complete(1, 2, "a.pdf", 100, true);
        // Unoverridden methods fall through to the no-op defaults.
        recorder.on_file_error(2, 2, "b.pdf", "boom");

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.as_slice(), ["start 2", "done 1 a.pdf fallback=true"]);
    }

    #[test]
    fn works_behind_a_shared_handle() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(1);
    }
}
