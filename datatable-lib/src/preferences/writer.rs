//! Debounced preference writes.
//!
//! Every [`schedule`](PreferencesWriter::schedule) bumps a generation counter,
//! stores the snapshot as pending and starts a timer. A timer only writes if
//! its generation is still the latest when it fires, so a burst of changes
//! inside the window collapses into one write of the final state.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::runtime::Handle;

use super::{PreferencesBackend, PreferencesConfig, PreferencesPayload, PreferencesState, resolve_key};

struct WriterInner {
    backend: Arc<dyn PreferencesBackend>,
    key: String,
    version: u32,
    debounce: Duration,
    generation: AtomicU64,
    pending: Mutex<Option<PreferencesState>>,
}

impl WriterInner {
    fn take_pending(&self) -> Option<PreferencesState> {
        match self.pending.lock() {
            Ok(mut pending) => pending.take(),
            Err(_) => None,
        }
    }

    /// Best-effort write; failures are logged, never returned.
    async fn write(&self, state: PreferencesState) -> bool {
        let payload = PreferencesPayload::new(self.version, state);
        let document = match payload.to_json() {
            Ok(document) => document,
            Err(err) => {
                log::warn!("[preferences] Failed to encode '{}': {}", self.key, err);
                return false;
            }
        };
        match self.backend.write(&self.key, document).await {
            Ok(()) => {
                log::debug!("[preferences] Saved '{}'", self.key);
                true
            }
            Err(err) => {
                log::warn!("[preferences] Failed to save '{}': {}", self.key, err);
                false
            }
        }
    }
}

/// Coalesces preference snapshots into debounced background writes.
///
/// Timers run on the ambient tokio runtime. Dropping the writer discards a
/// write that has not fired yet; call [`flush`](Self::flush) first to keep it.
pub struct PreferencesWriter {
    inner: Arc<WriterInner>,
}

impl PreferencesWriter {
    pub fn new(backend: Arc<dyn PreferencesBackend>, config: &PreferencesConfig) -> Self {
        Self {
            inner: Arc::new(WriterInner {
                backend,
                key: resolve_key(config),
                version: config.version,
                debounce: config.debounce,
                generation: AtomicU64::new(0),
                pending: Mutex::new(None),
            }),
        }
    }

    /// The resolved storage key.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Returns `true` if a snapshot is waiting for its timer.
    pub fn has_pending(&self) -> bool {
        self.inner
            .pending
            .lock()
            .map(|pending| pending.is_some())
            .unwrap_or(false)
    }

    /// Queues `state` and restarts the debounce window.
    pub fn schedule(&self, state: PreferencesState) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut pending) = self.inner.pending.lock() {
            *pending = Some(state);
        }

        let Ok(handle) = Handle::try_current() else {
            log::warn!(
                "[preferences] No async runtime; write to '{}' deferred until flush",
                self.inner.key
            );
            return;
        };

        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            if inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            if let Some(state) = inner.take_pending() {
                inner.write(state).await;
            }
        });
    }

    /// Writes the pending snapshot now, cancelling its timer.
    ///
    /// Returns `true` if something was written.
    pub async fn flush(&self) -> bool {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        match self.inner.take_pending() {
            Some(state) => self.inner.write(state).await,
            None => false,
        }
    }
}

impl Drop for PreferencesWriter {
    fn drop(&mut self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if self.inner.take_pending().is_some() {
            log::debug!("[preferences] Discarded pending write to '{}'", self.inner.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreferencesError;
    use crate::preferences::MemoryBackend;
    use crate::sort::SortEntry;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Counts writes and keeps the last payload.
    #[derive(Default)]
    struct CountingBackend {
        writes: AtomicUsize,
        memory: MemoryBackend,
    }

    #[async_trait]
    impl PreferencesBackend for CountingBackend {
        async fn read(&self, key: &str) -> Result<Option<String>, PreferencesError> {
            self.memory.read(key).await
        }

        async fn write(&self, key: &str, document: String) -> Result<(), PreferencesError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.memory.write(key, document).await
        }

        async fn remove(&self, key: &str) -> Result<(), PreferencesError> {
            self.memory.remove(key).await
        }

        async fn keys(&self, prefix: &str) -> Result<Vec<String>, PreferencesError> {
            self.memory.keys(prefix).await
        }
    }

    fn sorted_by(id: &str) -> PreferencesState {
        PreferencesState {
            sorting: vec![SortEntry::asc(id)],
            ..Default::default()
        }
    }

    async fn stored(backend: &CountingBackend, key: &str) -> PreferencesState {
        let document = backend.read(key).await.unwrap().unwrap();
        PreferencesPayload::from_json(&document).unwrap().state
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_into_one_write() {
        let backend = Arc::new(CountingBackend::default());
        let config = PreferencesConfig::new("t");
        let writer = PreferencesWriter::new(backend.clone(), &config);

        writer.schedule(sorted_by("a"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        writer.schedule(sorted_by("b"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        writer.schedule(sorted_by("c"));

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(backend.writes.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
        assert_eq!(stored(&backend, writer.key()).await, sorted_by("c"));
        assert!(!writer.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_discards_pending_write() {
        let backend = Arc::new(CountingBackend::default());
        let writer = PreferencesWriter::new(backend.clone(), &PreferencesConfig::new("t"));
        writer.schedule(sorted_by("a"));
        drop(writer);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(backend.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately_once() {
        let backend = Arc::new(CountingBackend::default());
        let writer = PreferencesWriter::new(backend.clone(), &PreferencesConfig::new("t"));
        writer.schedule(sorted_by("a"));

        assert!(writer.flush().await);
        assert!(!writer.flush().await);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_schedule_without_runtime_keeps_pending() {
        let backend = Arc::new(CountingBackend::default());
        let writer = PreferencesWriter::new(backend.clone(), &PreferencesConfig::new("t"));
        writer.schedule(sorted_by("a"));
        assert!(writer.has_pending());
        assert_eq!(backend.writes.load(Ordering::SeqCst), 0);
    }
}
