//! Serialized background loader for deferred key references.
//!
//! One worker drains a FIFO queue of load requests, so two loads never run
//! in parallel and backing-store access stays predictable. Results are
//! redelivered on the configured completion context. Failures are logged
//! and the callback is simply never invoked; the async path does not let a
//! caller distinguish "key never existed" from "load failed".

use ripple_core::{Record, RippleResult};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Load function supplied at construction: resolve one record given
/// namespace and key. The coordinator wires this to its uncached read
/// path, which takes the mutation lock internally.
pub type LoadFn<T> = Arc<dyn Fn(&str, &str) -> RippleResult<Option<Record<T>>> + Send + Sync>;

struct LoadTask<T> {
    namespace: String,
    key: String,
    on_complete: Box<dyn FnOnce(Record<T>) + Send>,
}

struct LoaderInner<T> {
    queue: Option<mpsc::UnboundedSender<LoadTask<T>>>,
    worker: Option<JoinHandle<()>>,
}

/// Single-worker FIFO task queue resolving deferred loads off the caller's
/// thread.
///
/// Lifecycle is `Stopped -> Running` on [`TaskLoader::start`] and back on
/// [`TaskLoader::stop`]. Stopping abandons queued-but-unstarted tasks; a
/// load already begun finishes its iteration.
pub struct TaskLoader<T> {
    load: LoadFn<T>,
    completion: Option<Handle>,
    inner: Mutex<LoaderInner<T>>,
}

impl<T> fmt::Debug for TaskLoader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskLoader")
            .field("running", &self.is_running())
            .finish()
    }
}

impl<T> TaskLoader<T> {
    /// Create a stopped loader delivering completions on the worker's own
    /// runtime.
    pub fn new(load: LoadFn<T>) -> Self {
        Self::with_completion(load, None)
    }

    /// Create a stopped loader delivering completions on the given runtime
    /// handle.
    pub fn with_completion(load: LoadFn<T>, completion: Option<Handle>) -> Self {
        Self {
            load,
            completion,
            inner: Mutex::new(LoaderInner {
                queue: None,
                worker: None,
            }),
        }
    }

    /// Whether the worker is running.
    pub fn is_running(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.queue.is_some())
            .unwrap_or(false)
    }

    /// Stop the worker. Queued tasks that have not started are abandoned.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().expect("loader state poisoned");
        inner.queue.take();
        if let Some(worker) = inner.worker.take() {
            worker.abort();
        }
    }

    /// Enqueue a load. Tasks run strictly in submission order. Submissions
    /// while stopped are dropped with a warning.
    pub fn submit(
        &self,
        namespace: &str,
        key: &str,
        on_complete: impl FnOnce(Record<T>) + Send + 'static,
    ) {
        let inner = self.inner.lock().expect("loader state poisoned");
        let task = LoadTask {
            namespace: namespace.to_string(),
            key: key.to_string(),
            on_complete: Box::new(on_complete),
        };
        match inner.queue.as_ref() {
            Some(tx) => {
                if tx.send(task).is_err() {
                    warn!(namespace, key, "Loader worker gone, task dropped");
                }
            }
            None => warn!(namespace, key, "Loader not running, task dropped"),
        }
    }

    /// Resolve one record synchronously, bypassing the queue. Intended for
    /// callers already off the critical thread.
    pub fn load_sync(&self, namespace: &str, key: &str) -> RippleResult<Option<Record<T>>> {
        (self.load)(namespace, key)
    }
}

impl<T: Send + 'static> TaskLoader<T> {
    /// Start the worker. Must be called within a tokio runtime. Calling
    /// start on a running loader is a no-op.
    pub fn start(&self) {
        let mut inner = self.inner.lock().expect("loader state poisoned");
        if inner.queue.is_some() {
            return;
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<LoadTask<T>>();
        let load = Arc::clone(&self.load);
        let completion = self
            .completion
            .clone()
            .unwrap_or_else(Handle::current);

        let worker = tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                match load(&task.namespace, &task.key) {
                    Ok(Some(record)) => {
                        let on_complete = task.on_complete;
                        completion.spawn(async move {
                            on_complete(record);
                        });
                    }
                    Ok(None) => {
                        debug!(
                            namespace = %task.namespace,
                            key = %task.key,
                            "Deferred load found nothing"
                        );
                    }
                    Err(err) => {
                        warn!(
                            namespace = %task.namespace,
                            key = %task.key,
                            error = %err,
                            "Deferred load failed"
                        );
                    }
                }
            }
        });

        inner.queue = Some(tx);
        inner.worker = Some(worker);
    }
}

// ============================================================================
// TESTS
// ============================================================================
