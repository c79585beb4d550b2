//! FIFO job queue for multi-page crawls
//!
//! Jobs are drained in insertion order. Each job loads its page through a
//! [`DocumentSource`] and optionally maps the document through a transform. A failing
//! job never stops the drain: its result is recorded as `None`.

use crate::{Document, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Maps a loaded document to a JSON value
pub type Transform = Box<dyn FnOnce(&Document) -> Result<serde_json::Value>>;

/// Loads a page and returns its parsed document
#[async_trait(?Send)]
pub trait DocumentSource {
    async fn load(&mut self, url: &str) -> Result<Document>;
}

/// A queued page load
pub struct Job {
    pub url: String,
    pub transform: Option<Transform>,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("url", &self.url)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// What a successful job produced
#[derive(Debug, Clone)]
pub enum JobOutput {
    /// The document itself (no transform given)
    Document(Document),
    /// The transform's result
    Value(serde_json::Value),
}

impl JobOutput {
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            JobOutput::Document(doc) => Some(doc),
            JobOutput::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            JobOutput::Value(value) => Some(value),
            JobOutput::Document(_) => None,
        }
    }
}

/// Per-URL outcomes of a drain; `None` marks a failed job
pub type QueueResults = HashMap<String, Option<JobOutput>>;

/// FIFO queue of page loads
#[derive(Debug, Default)]
pub struct QueueScheduler {
    jobs: VecDeque<Job>,
}

impl QueueScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job to the back of the queue
    pub fn enqueue(&mut self, url: impl Into<String>, transform: Option<Transform>) {
        self.jobs.push_back(Job {
            url: url.into(),
            transform,
        });
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Drains the queue in FIFO order
    ///
    /// Fetch and transform failures are logged and stored as `None`. When a URL
    /// was queued more than once, the last job's outcome wins. The queue is empty
    /// afterwards.
    pub async fn process<S>(&mut self, source: &mut S) -> QueueResults
    where
        S: DocumentSource + ?Sized,
    {
        let mut results = QueueResults::with_capacity(self.jobs.len());
        let total = self.jobs.len();

        if total > 0 {
            tracing::info!("Processing {} queued jobs", total);
        }

        while let Some(job) = self.jobs.pop_front() {
            let outcome = run_job(source, &job.url, job.transform).await;
            match outcome {
                Ok(output) => {
                    results.insert(job.url, Some(output));
                }
                Err(e) => {
                    tracing::error!("Queue job failed for {}: {}", job.url, e);
                    results.insert(job.url, None);
                }
            }
        }

        let failed = results.values().filter(|r| r.is_none()).count();
        if total > 0 {
            tracing::info!(
                "Queue drained: {} succeeded, {} failed",
                results.len() - failed,
                failed
            );
        }

        results
    }
}

async fn run_job<S>(source: &mut S, url: &str, transform: Option<Transform>) -> Result<JobOutput>
where
    S: DocumentSource + ?Sized,
{
    let document = source.load(url).await?;
    match transform {
        Some(transform) => Ok(JobOutput::Value(transform(&document)?)),
        None => Ok(JobOutput::Document(document)),
    }
}
