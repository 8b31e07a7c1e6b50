use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::thread;

use tokio::sync::oneshot;
use tracing::{debug, error};
use ud_core::AccessibilityElement;
use ud_platform::{AccessibilitySource, TierError, WindowId};

/// Name of the accessibility worker thread.
pub const WORKER_THREAD_NAME: &str = "ud-accessibility";

type Reply = Result<Vec<AccessibilityElement>, TierError>;

struct Job {
    window: WindowId,
    max_depth: u32,
    reply: oneshot::Sender<Reply>,
}

/// Handle to the thread that owns the accessibility source.
///
/// Every accessibility call of the process runs on that one thread, in submission order. Cloning
/// the handle shares the thread; it exits once the last handle is dropped and queued jobs are
/// done.
#[derive(Clone)]
pub struct AccessibilityWorker {
    jobs: mpsc::Sender<Job>,
}

impl AccessibilityWorker {
    /// Start a worker owning `source`.
    pub fn spawn<S>(source: S) -> io::Result<Self>
    where
        S: AccessibilitySource + 'static,
    {
        Self::spawn_with(move || source)
    }

    /// Start a worker whose source is created on the worker thread itself, for sources with
    /// thread-affine initialization.
    pub fn spawn_with<S, F>(factory: F) -> io::Result<Self>
    where
        S: AccessibilitySource + 'static,
        F: FnOnce() -> S + Send + 'static,
    {
        let (jobs, queue) = mpsc::channel::<Job>();
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run(factory(), queue))?;
        Ok(Self { jobs })
    }

    /// Queue one collection and wait for its result.
    pub async fn collect(&self, window: WindowId, max_depth: u32) -> Reply {
        let (reply, response) = oneshot::channel();
        self.jobs
            .send(Job {
                window,
                max_depth,
                reply,
            })
            .map_err(|_| TierError::Failed("accessibility worker has stopped".into()))?;

        response
            .await
            .map_err(|_| TierError::Failed("accessibility worker dropped the request".into()))?
    }
}

impl std::fmt::Debug for AccessibilityWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessibilityWorker").finish_non_exhaustive()
    }
}

fn run<S: AccessibilitySource>(mut source: S, queue: mpsc::Receiver<Job>) {
    debug!("accessibility worker started");
    while let Ok(job) = queue.recv() {
        if job.reply.is_closed() {
            debug!(window = job.window.raw(), "requester gone, skipping accessibility job");
            continue;
        }

        let result = catch_unwind(AssertUnwindSafe(|| {
            source.collect(job.window, job.max_depth)
        }))
        .unwrap_or_else(|_| {
            error!(window = job.window.raw(), "accessibility source panicked");
            Err(TierError::Failed("accessibility source panicked".into()))
        });

        // The requester may have timed out while the job ran.
        let _ = job.reply.send(result);
    }
    debug!("accessibility worker stopped");
}
