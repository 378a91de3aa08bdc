//! Suggestion worker
//!
//! A single long-lived task that owns the job queue and the rate limiter.
//! The dispatcher talks to it through a [`SuggestionHandle`]: one request,
//! one reply, in FIFO order. Jobs are handled strictly one at a time so the
//! limiter actually bounds calls to the service.
//!
//! ```text
//!  Dispatcher ──Job──▶ [bounded queue] ──▶ worker: limiter → prompt → service
//!      ▲                                               │
//!      └──────────────── oneshot reply ◀───────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::client::SuggestionService;
use super::limiter::RateLimiter;
use super::prompts::{build_placement_prompt, folder_snapshot, PlacementContext};
use crate::models::describe_file;
use crate::FALLBACK_DESTINATION;

/// Default job queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// What the worker tells the model, and how
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionConfig {
    pub enabled: bool,
    pub model: String,
    pub instructions: String,
    /// Free text appended to the instructions, possibly empty
    pub knowledge_base: String,
    pub preserve_structure: bool,
}

/// One pending placement question
#[derive(Debug)]
pub struct Job {
    pub id: Uuid,
    pub source_path: PathBuf,
    reply: oneshot::Sender<String>,
}

impl Job {
    fn new(source_path: PathBuf) -> (Self, oneshot::Receiver<String>) {
        let (reply, rx) = oneshot::channel();
        let job = Self {
            id: Uuid::new_v4(),
            source_path,
            reply,
        };
        (job, rx)
    }

    /// Answer the job. Consumes it, so a job can only ever be answered once.
    fn respond(self, destination: String) {
        if self.reply.send(destination).is_err() {
            tracing::debug!(job_id = %self.id, "Requester went away before the reply");
        }
    }
}

/// Client side of the worker's queue
#[derive(Debug, Clone)]
pub struct SuggestionHandle {
    tx: mpsc::Sender<Job>,
}

impl SuggestionHandle {
    /// Ask for a destination and wait for it.
    ///
    /// Blocks while the queue is full. Resolves to the fallback when the
    /// worker is gone.
    pub async fn request(&self, source_path: &Path) -> String {
        let (job, reply) = Job::new(source_path.to_path_buf());
        let job_id = job.id;

        if self.tx.send(job).await.is_err() {
            tracing::warn!(%job_id, "Suggestion worker is not running");
            return FALLBACK_DESTINATION.to_string();
        }

        reply.await.unwrap_or_else(|_| {
            tracing::warn!(%job_id, "Suggestion job dropped without a reply");
            FALLBACK_DESTINATION.to_string()
        })
    }
}

/// The worker task's state
pub struct SuggestionWorker {
    jobs: mpsc::Receiver<Job>,
    limiter: RateLimiter,
    service: Arc<dyn SuggestionService>,
    config: SuggestionConfig,
    root: PathBuf,
    cancel: CancellationToken,
}

impl SuggestionWorker {
    /// Create a worker and the handle used to reach it
    pub fn new(
        config: SuggestionConfig,
        root: PathBuf,
        limiter: RateLimiter,
        service: Arc<dyn SuggestionService>,
        capacity: usize,
        cancel: CancellationToken,
    ) -> (Self, SuggestionHandle) {
        let (tx, jobs) = mpsc::channel(capacity.max(1));
        let worker = Self {
            jobs,
            limiter,
            service,
            config,
            root,
            cancel,
        };
        (worker, SuggestionHandle { tx })
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drain the queue until every handle is dropped or `cancel` fires.
    ///
    /// After cancellation the queue is closed and every job still in it is
    /// answered with the fallback.
    pub async fn run(mut self) {
        tracing::info!(
            model = %self.config.model,
            interval_ms = self.limiter.interval().as_millis() as u64,
            "Suggestion worker started"
        );

        loop {
            let job = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                job = self.jobs.recv() => match job {
                    Some(job) => job,
                    None => {
                        tracing::info!("Suggestion queue closed, worker stopping");
                        return;
                    }
                },
            };

            let destination = self.resolve(&job).await;
            tracing::info!(job_id = %job.id, destination = %destination, "Suggestion resolved");
            job.respond(destination);
        }

        self.jobs.close();
        while let Some(job) = self.jobs.recv().await {
            job.respond(FALLBACK_DESTINATION.to_string());
        }
        tracing::info!("Suggestion worker cancelled");
    }

    /// Produce a destination for one job. Never fails: every error path
    /// ends in the fallback.
    async fn resolve(&self, job: &Job) -> String {
        if let Err(e) = self.limiter.acquire(&self.cancel).await {
            tracing::warn!(job_id = %job.id, "Rate limiter error: {}", e);
            return FALLBACK_DESTINATION.to_string();
        }

        let file_name = job
            .source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let metadata = describe_file(&job.source_path);

        let root = self.root.clone();
        let folders = tokio::task::spawn_blocking(move || folder_snapshot(&root))
            .await
            .unwrap_or_default();

        let prompt = build_placement_prompt(&PlacementContext {
            instructions: &self.config.instructions,
            knowledge_base: &self.config.knowledge_base,
            file_name: &file_name,
            metadata: &metadata,
            folders: &folders,
            preserve_structure: self.config.preserve_structure,
        });

        tracing::debug!(job_id = %job.id, "Prompt:\n{}", prompt);

        let response = tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::warn!(job_id = %job.id, "Suggestion cancelled mid-request");
                return FALLBACK_DESTINATION.to_string();
            }
            response = self.service.suggest(&self.config.model, &prompt) => response,
        };

        match response {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    tracing::warn!(job_id = %job.id, "Empty suggestion for {}", file_name);
                    FALLBACK_DESTINATION.to_string()
                } else {
                    text.to_string()
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %job.id, "Suggestion service error: {}", e);
                FALLBACK_DESTINATION.to_string()
            }
        }
    }
}
