use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::input::{TableSource, load_table};
use crate::pipeline::{PipelineError, PipelineOptions, PipelineOutput, run_pipeline};

pub type RequestId = u64;

pub const GENERIC_FAILURE_MESSAGE: &str =
    "Rollup computation failed; see log output for details.";
pub const EMPTY_STATE_MESSAGE: &str = "No trackable applications in the current period.";

/// What the rendering layer reads: a progress line, an error line, and the
/// latest applied pipeline output (targets included). Mutated only by the
/// coordinator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub progress: String,
    pub error: Option<String>,
    pub output: Option<PipelineOutput>,
}

#[derive(Debug)]
pub enum JobError {
    Pipeline(PipelineError),
    /// A failure the pipeline has no message for (a panic in the job);
    /// rendered as a generic fallback line.
    Unrecognized,
}

/// Runs the full pipeline off the caller's thread and guarantees that only
/// the most recently issued request ever reaches visible state. Requests get
/// strictly increasing ids; a completion whose id is no longer the latest is
/// dropped without effect.
pub struct Coordinator {
    options: PipelineOptions,
    next_request: AtomicU64,
    state: Mutex<ViewState>,
}

impl Coordinator {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            next_request: AtomicU64::new(0),
            state: Mutex::new(ViewState::default()),
        }
    }

    fn state_guard(&self) -> MutexGuard<'_, ViewState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Allocates the next request id and clears visible state, targets
    /// included, so a failing run can never pair stale targets with a fresh
    /// display.
    pub fn begin(&self) -> RequestId {
        let id = self.next_request.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state_guard();
        *state = ViewState {
            progress: "Computing rollup...".to_string(),
            error: None,
            output: None,
        };
        id
    }

    /// Applies a finished request to visible state, unless a newer request
    /// has been issued in the meantime. Returns whether the result was
    /// applied.
    pub fn complete(&self, id: RequestId, outcome: Result<PipelineOutput, JobError>) -> bool {
        let mut state = self.state_guard();
        if self.next_request.load(Ordering::SeqCst) != id {
            tracing::info!(request = id, "discarding stale rollup result");
            return false;
        }
        match outcome {
            Ok(output) => {
                state.progress = if output.rollup.is_empty() {
                    EMPTY_STATE_MESSAGE.to_string()
                } else {
                    format!(
                        "Rolled up {} applications across {} top-level groups.",
                        output.rollup.root.total,
                        output.rollup.root.children.len()
                    )
                };
                state.error = None;
                state.output = Some(output);
            }
            Err(err) => {
                let message = match err {
                    JobError::Pipeline(e) => e.to_string(),
                    JobError::Unrecognized => GENERIC_FAILURE_MESSAGE.to_string(),
                };
                *state = ViewState {
                    progress: String::new(),
                    error: Some(message),
                    output: None,
                };
            }
        }
        true
    }

    pub fn snapshot(&self) -> ViewState {
        self.state_guard().clone()
    }

    /// Issues a request and runs the whole unit of work on a worker thread.
    /// An in-flight run superseded by a later `submit` completes and is
    /// discarded; nothing interrupts it.
    pub fn submit(
        self: &Arc<Self>,
        current: PathBuf,
        prior: Option<PathBuf>,
    ) -> (RequestId, JoinHandle<bool>) {
        let id = self.begin();
        let coordinator = Arc::clone(self);
        let handle = thread::spawn(move || {
            let outcome = run_job(&current, prior.as_deref(), &coordinator.options);
            coordinator.complete(id, outcome)
        });
        (id, handle)
    }
}

fn run_job(
    current: &Path,
    prior: Option<&Path>,
    options: &PipelineOptions,
) -> Result<PipelineOutput, JobError> {
    let result = std::panic::catch_unwind(AssertUnwindSafe(
        || -> Result<PipelineOutput, PipelineError> {
            let (current_source, prior_source) = load_sources(current, prior)?;
            run_pipeline(&current_source, prior_source.as_ref(), options)
        },
    ));
    match result {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(err)) => Err(JobError::Pipeline(err)),
        Err(_) => {
            tracing::error!("rollup job panicked");
            Err(JobError::Unrecognized)
        }
    }
}

/// The two raw-input reads have no ordering dependency; the current period
/// loads on its own thread while the prior loads here, and the pipeline
/// waits for both.
fn load_sources(
    current: &Path,
    prior: Option<&Path>,
) -> Result<(TableSource, Option<TableSource>), PipelineError> {
    thread::scope(|scope| {
        let current_handle = scope.spawn(|| load_table(current));
        let prior_source = match prior {
            Some(path) => Some(load_table(path)?),
            None => None,
        };
        let current_source = match current_handle.join() {
            Ok(loaded) => loaded?,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        Ok((current_source, prior_source))
    })
}
