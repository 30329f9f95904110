//! Asynchronous, cancellable syntax highlighting.
//!
//! # Overview
//!
//! A [`HighlightScheduler`] keeps a document's color buffer in step with its text without
//! running tokenizers on the interactive thread:
//!
//! 1. A new request first cancels the job in flight (if any) and waits for its completion
//!    message. This is the only blocking point of the engine; tokenizers poll the token per
//!    token, so the wait is short.
//! 2. The request captures an immutable text snapshot and a local copy of the colors together
//!    with the buffer's edit epoch, and hands them to the document's single worker thread.
//! 3. The worker tokenizes into the local copy. At the end it locks the shared buffer and swaps
//!    the local copy in only if the job was not cancelled and the epoch is unchanged, i.e. no
//!    synchronous edit touched the buffer since the snapshot. Otherwise the result is dropped.
//!
//! Each job is represented by a [`HighlightHandle`] whose completion is a [`JobOutcome`], so
//! cancellation is an observable result rather than a side channel.
//!
//! Tokenizer errors and panics are caught per job: the requested range falls back to
//! [`ColorTag::DEFAULT`] and the outcome is [`JobOutcome::PublishedFallback`].

use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use tracing::{debug, trace, warn};

use crate::cancel::CancellationToken;
use crate::config::HighlightConfig;
use crate::document::{ColorTag, SharedColors, TextDocument};
use crate::error::HighlightError;
use crate::tokenizer::Tokenizer;

/// Identifier of a highlight request, increasing in request order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    /// Get the raw value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// How a highlight job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Tokenized colors were swapped into the shared buffer.
    Published,
    /// The tokenizer failed; the range was reset to the default color and published.
    PublishedFallback,
    /// The job observed its cancellation token (before, during or at publish time).
    Cancelled,
    /// The document was edited after the snapshot; the result was discarded.
    Stale,
    /// Validation failed; nothing was touched.
    Rejected(HighlightError),
}

impl JobOutcome {
    /// Returns `true` if the job changed the shared color buffer.
    pub fn is_published(&self) -> bool {
        matches!(self, JobOutcome::Published | JobOutcome::PublishedFallback)
    }
}

/// What a highlight request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// A background job was queued.
    Scheduled(JobId),
    /// The document exceeds the large-file threshold; the range was filled with the default
    /// color synchronously and no tokenizer ran.
    FilledDefault,
}

/// Validate inputs and run `tokenizer` over `content[range]`, writing into `colors`.
///
/// On a validation failure the error is logged and `colors` is left untouched.
pub fn highlight_content(
    content: &[u8],
    colors: &mut [ColorTag],
    range: Range<usize>,
    tokenizer: &dyn Tokenizer,
    cancel: &CancellationToken,
) -> Result<(), HighlightError> {
    validate(content, colors.len(), &range).inspect_err(|err| {
        warn!(tokenizer = tokenizer.name(), %err, "highlight input rejected");
    })?;
    tokenizer.apply_highlighting(&content[range.clone()], colors, range.start, cancel)
}

fn validate(content: &[u8], colors_len: usize, range: &Range<usize>) -> Result<(), HighlightError> {
    if content.is_empty() {
        return Err(HighlightError::EmptyContent);
    }
    if colors_len != content.len() {
        return Err(HighlightError::SizeMismatch {
            text: content.len(),
            colors: colors_len,
        });
    }
    if range.start > range.end || range.end > content.len() {
        return Err(HighlightError::InvalidRange {
            start: range.start,
            end: range.end,
            len: content.len(),
        });
    }
    Ok(())
}

struct HighlightJob {
    id: JobId,
    content: Arc<[u8]>,
    shared: SharedColors,
    local: Vec<ColorTag>,
    epoch: u64,
    range: Range<usize>,
    language_key: String,
    tokenizer: Arc<dyn Tokenizer>,
    cancel: CancellationToken,
    done: Sender<JobOutcome>,
}

impl HighlightJob {
    fn run(mut self) -> JobOutcome {
        if self.cancel.is_cancelled() {
            trace!(job = self.id.0, "highlight job cancelled before start");
            return JobOutcome::Cancelled;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            highlight_content(
                &self.content,
                &mut self.local,
                self.range.clone(),
                self.tokenizer.as_ref(),
                &self.cancel,
            )
        }));

        let fallback = match result {
            Ok(Ok(())) => false,
            Ok(Err(HighlightError::Cancelled)) => {
                trace!(job = self.id.0, "highlight job cancelled while tokenizing");
                return JobOutcome::Cancelled;
            }
            Ok(Err(
                err @ (HighlightError::EmptyContent
                | HighlightError::SizeMismatch { .. }
                | HighlightError::InvalidRange { .. }),
            )) => return JobOutcome::Rejected(err),
            Ok(Err(err)) => {
                warn!(
                    job = self.id.0,
                    language = %self.language_key,
                    tokenizer = self.tokenizer.name(),
                    %err,
                    "tokenizer failed; falling back to default color"
                );
                true
            }
            Err(payload) => {
                warn!(
                    job = self.id.0,
                    language = %self.language_key,
                    tokenizer = self.tokenizer.name(),
                    panic = panic_message(payload.as_ref()),
                    "tokenizer panicked; falling back to default color"
                );
                true
            }
        };

        if fallback {
            let end = self.range.end.min(self.local.len());
            let start = self.range.start.min(end);
            self.local[start..end].fill(ColorTag::DEFAULT);
        }

        let expected_len = self.local.len();
        let cancel = &self.cancel;
        let epoch = self.epoch;
        let published = self.shared.publish_if(&mut self.local, |buffer| {
            !cancel.is_cancelled() && buffer.epoch() == epoch && buffer.tags.len() == expected_len
        });

        if published {
            debug!(job = self.id.0, range = ?self.range, fallback, "highlight published");
            if fallback {
                JobOutcome::PublishedFallback
            } else {
                JobOutcome::Published
            }
        } else if self.cancel.is_cancelled() {
            trace!(job = self.id.0, "highlight job cancelled at publish");
            JobOutcome::Cancelled
        } else {
            debug!(job = self.id.0, "highlight result stale; discarded");
            JobOutcome::Stale
        }
    }

    fn run_and_report(self) {
        let done = self.done.clone();
        let outcome = self.run();
        // The handle may already be gone (scheduler dropped); nothing to report to then.
        let _ = done.send(outcome);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Handle to one queued or running job.
#[derive(Debug)]
pub struct HighlightHandle {
    id: JobId,
    cancel: CancellationToken,
    done: Receiver<JobOutcome>,
    outcome: Option<JobOutcome>,
}

impl HighlightHandle {
    /// Job id.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Request cooperative cancellation. Does not wait.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` if the job finished.
    pub fn is_finished(&mut self) -> bool {
        self.try_outcome().is_some()
    }

    /// Non-blocking completion check.
    pub fn try_outcome(&mut self) -> Option<&JobOutcome> {
        if self.outcome.is_none() {
            match self.done.try_recv() {
                Ok(outcome) => self.outcome = Some(outcome),
                Err(TryRecvError::Disconnected) => self.outcome = Some(JobOutcome::Cancelled),
                Err(TryRecvError::Empty) => {}
            }
        }
        self.outcome.as_ref()
    }

    /// Block until the job has observably stopped.
    pub fn wait(mut self) -> JobOutcome {
        if let Some(outcome) = self.outcome.take() {
            return outcome;
        }
        // A disconnected channel means the worker dropped the job without running it.
        self.done.recv().unwrap_or(JobOutcome::Cancelled)
    }

    /// Cancel, then block until the job has stopped.
    pub fn cancel_and_wait(self) -> JobOutcome {
        self.cancel();
        self.wait()
    }
}

enum WorkerMessage {
    Run(Box<HighlightJob>),
    Shutdown,
}

/// The dedicated background thread of one document.
struct HighlightWorker {
    sender: Sender<WorkerMessage>,
    handle: Option<JoinHandle<()>>,
}

impl HighlightWorker {
    fn spawn(name: &str) -> std::io::Result<Self> {
        let (sender, receiver) = bounded::<WorkerMessage>(2);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Ok(message) = receiver.recv() {
                    match message {
                        WorkerMessage::Run(job) => job.run_and_report(),
                        WorkerMessage::Shutdown => break,
                    }
                }
                trace!("highlight worker exiting");
            })?;
        Ok(Self {
            sender,
            handle: Some(handle),
        })
    }

    fn submit(&self, job: HighlightJob) -> Result<(), HighlightJob> {
        self.sender
            .send(WorkerMessage::Run(Box::new(job)))
            .map_err(|err| match err.into_inner() {
                WorkerMessage::Run(job) => *job,
                WorkerMessage::Shutdown => unreachable!("only Run messages are submitted"),
            })
    }
}

impl Drop for HighlightWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(WorkerMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Per-document highlight scheduler.
///
/// At most one job is alive at any time. Jobs are ordered by request; a newer request always
/// cancels and supersedes the previous one.
pub struct HighlightScheduler {
    config: HighlightConfig,
    worker: Option<HighlightWorker>,
    in_flight: Option<HighlightHandle>,
    next_job_id: u64,
    last_outcome: Option<JobOutcome>,
    published_count: u64,
}

impl HighlightScheduler {
    /// Create a scheduler. The worker thread is started on the first request.
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            config,
            worker: None,
            in_flight: None,
            next_job_id: 1,
            last_outcome: None,
            published_count: 0,
        }
    }

    /// Scheduler configuration.
    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Request recoloring of `range` in `document`.
    ///
    /// Any job in flight is cancelled first (and waited for). Invalid inputs are logged,
    /// reported as an error, and leave the colors untouched.
    pub fn request(
        &mut self,
        document: &TextDocument,
        range: Range<usize>,
        language_key: &str,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<RequestStatus, HighlightError> {
        self.cancel_in_flight();

        let colors_len = document.colors().len();
        if let Err(err) = validate(document.text(), colors_len, &range) {
            warn!(language = language_key, %err, "highlight request rejected");
            self.last_outcome = Some(JobOutcome::Rejected(err.clone()));
            return Err(err);
        }

        if document.len() > self.config.large_file_threshold {
            debug!(
                len = document.len(),
                threshold = self.config.large_file_threshold,
                "large document; skipping tokenization"
            );
            document.fill_colors(range, ColorTag::DEFAULT);
            return Ok(RequestStatus::FilledDefault);
        }

        let (local, epoch) = document.colors().snapshot();
        let id = JobId(self.next_job_id);
        self.next_job_id += 1;

        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = bounded(1);
        let job = HighlightJob {
            id,
            content: document.snapshot(),
            shared: document.colors().clone(),
            local,
            epoch,
            range,
            language_key: language_key.to_string(),
            tokenizer,
            cancel: cancel.clone(),
            done: done_tx,
        };

        let mut handle = HighlightHandle {
            id,
            cancel,
            done: done_rx,
            outcome: None,
        };

        match self.ensure_worker() {
            Some(worker) => {
                if let Err(job) = worker.submit(job) {
                    warn!(job = id.0, "highlight worker gone; running job inline");
                    self.worker = None;
                    handle.outcome = Some(job.run());
                }
            }
            None => handle.outcome = Some(job.run()),
        }

        trace!(job = id.0, language = language_key, "highlight job scheduled");
        self.in_flight = Some(handle);
        Ok(RequestStatus::Scheduled(id))
    }

    fn ensure_worker(&mut self) -> Option<&HighlightWorker> {
        if self.worker.is_none() {
            match HighlightWorker::spawn(&self.config.worker_name) {
                Ok(worker) => self.worker = Some(worker),
                Err(err) => {
                    warn!(%err, "failed to spawn highlight worker; highlighting inline");
                    return None;
                }
            }
        }
        self.worker.as_ref()
    }

    /// Cancel the job in flight and wait until it has stopped.
    pub fn cancel_in_flight(&mut self) -> Option<JobOutcome> {
        let handle = self.in_flight.take()?;
        let outcome = handle.cancel_and_wait();
        Some(self.record(outcome))
    }

    /// Wait (without cancelling) for the job in flight to finish.
    pub fn wait_idle(&mut self) -> Option<JobOutcome> {
        let handle = self.in_flight.take()?;
        let outcome = handle.wait();
        Some(self.record(outcome))
    }

    /// Non-blocking: collect the outcome of a finished job.
    pub fn poll(&mut self) -> Option<JobOutcome> {
        let finished = self.in_flight.as_mut()?.try_outcome().is_some();
        if finished {
            return self.wait_idle();
        }
        None
    }

    /// Returns `true` while a job is queued or running.
    pub fn is_busy(&mut self) -> bool {
        match self.in_flight.as_mut() {
            Some(handle) => !handle.is_finished(),
            None => false,
        }
    }

    /// Id of the job in flight.
    pub fn in_flight_id(&self) -> Option<JobId> {
        self.in_flight.as_ref().map(HighlightHandle::id)
    }

    /// Handle of the job in flight, for non-blocking inspection or cancellation.
    pub fn in_flight_handle(&mut self) -> Option<&mut HighlightHandle> {
        self.in_flight.as_mut()
    }

    /// Outcome of the most recently completed job.
    pub fn last_outcome(&self) -> Option<&JobOutcome> {
        self.last_outcome.as_ref()
    }

    /// Number of jobs whose result was published.
    pub fn published_count(&self) -> u64 {
        self.published_count
    }

    fn record(&mut self, outcome: JobOutcome) -> JobOutcome {
        if outcome.is_published() {
            self.published_count += 1;
        }
        self.last_outcome = Some(outcome.clone());
        outcome
    }
}

impl Default for HighlightScheduler {
    fn default() -> Self {
        Self::new(HighlightConfig::default())
    }
}

impl Drop for HighlightScheduler {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

impl std::fmt::Debug for HighlightScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightScheduler")
            .field("in_flight", &self.in_flight_id())
            .field("last_outcome", &self.last_outcome)
            .field("published_count", &self.published_count)
            .finish()
    }
}
