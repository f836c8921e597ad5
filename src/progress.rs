use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use tracing::{debug, info, warn};

const MAX_EVENTS_PER_JOB: usize = 200;
const MAX_RETAINED_JOBS: usize = 64;
const DEFAULT_STEP: &str = "provisioning";
const TERMINAL_STEPS: &[&str] = &["complete", "completed", "failed", "error"];

/// One report from the external provisioning job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub progress: f64,
    pub message: String,
    #[serde(default)]
    pub step: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        self.progress >= 100.0
            || self
                .step
                .as_deref()
                .map(|step| TERMINAL_STEPS.contains(&step.trim().to_lowercase().as_str()))
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDisplay {
    pub step: String,
    pub percent: u8,
    pub message: String,
    pub finished: bool,
}

impl ProgressDisplay {
    fn queued() -> Self {
        Self {
            step: "queued".to_string(),
            percent: 0,
            message: "Waiting for the provisioning job".to_string(),
            finished: false,
        }
    }
}

/// Display triple for an event. Events are shown as delivered, so an out-of-order
/// feed may move the percentage backwards.
pub fn project(event: &ProgressEvent) -> ProgressDisplay {
    let percent = if event.progress.is_nan() {
        0
    } else {
        event.progress.clamp(0.0, 100.0).round() as u8
    };
    let step = event
        .step
        .as_deref()
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .unwrap_or(DEFAULT_STEP)
        .to_string();
    ProgressDisplay {
        step,
        percent,
        message: event.message.clone(),
        finished: event.is_terminal(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobUpdate {
    pub job_id: String,
    pub display: ProgressDisplay,
}

struct JobProgress {
    latest: ProgressDisplay,
    events: VecDeque<ProgressEvent>,
}

impl JobProgress {
    fn queued() -> Self {
        Self {
            latest: ProgressDisplay::queued(),
            events: VecDeque::new(),
        }
    }
}

/// Jobs in registration order. Making room drops the oldest finished job, or the
/// oldest job when none has finished.
struct JobTable {
    jobs: HashMap<String, JobProgress>,
    order: VecDeque<String>,
    capacity: usize,
}

impl JobTable {
    fn job_mut(&mut self, job_id: &str) -> &mut JobProgress {
        if !self.jobs.contains_key(job_id) {
            self.make_room();
            self.order.push_back(job_id.to_string());
        }
        self.jobs
            .entry(job_id.to_string())
            .or_insert_with(JobProgress::queued)
    }

    fn make_room(&mut self) {
        while self.jobs.len() >= self.capacity {
            let jobs = &self.jobs;
            let position = self
                .order
                .iter()
                .position(|id| jobs.get(id).map(|job| job.latest.finished).unwrap_or(true))
                .unwrap_or(0);
            match self.order.remove(position) {
                Some(evicted) => {
                    self.jobs.remove(&evicted);
                    debug!(job_id = %evicted, "progress history evicted");
                }
                None => break,
            }
        }
    }
}

/// Latest progress per job, fanned out to subscribers.
#[derive(Clone)]
pub struct ProgressHub {
    jobs: Arc<Mutex<JobTable>>,
    sender: broadcast::Sender<JobUpdate>,
}

impl Default for ProgressHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHub {
    pub fn new() -> Self {
        Self::with_capacity(MAX_RETAINED_JOBS)
    }

    /// Hub retaining at most `capacity` jobs.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(200);
        Self {
            jobs: Arc::new(Mutex::new(JobTable {
                jobs: HashMap::new(),
                order: VecDeque::new(),
                capacity: capacity.max(1),
            })),
            sender,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobUpdate> {
        self.sender.subscribe()
    }

    pub async fn register(&self, job_id: &str) {
        self.jobs.lock().await.job_mut(job_id);
        info!(job_id, "provisioning job registered");
    }

    pub async fn is_known(&self, job_id: &str) -> bool {
        self.jobs.lock().await.jobs.contains_key(job_id)
    }

    pub async fn push(&self, job_id: &str, event: ProgressEvent) -> ProgressDisplay {
        let shown = project(&event);
        {
            let mut table = self.jobs.lock().await;
            let job = table.job_mut(job_id);
            job.events.push_back(event);
            if job.events.len() > MAX_EVENTS_PER_JOB {
                job.events.pop_front();
            }
            job.latest = shown.clone();
        }
        let percent = shown.percent;
        debug!(job_id, percent, step = %shown.step, "progress received");
        let _ = self.sender.send(JobUpdate {
            job_id: job_id.to_string(),
            display: shown.clone(),
        });
        shown
    }

    pub async fn latest(&self, job_id: &str) -> Option<ProgressDisplay> {
        let table = self.jobs.lock().await;
        table.jobs.get(job_id).map(|job| job.latest.clone())
    }

    pub async fn history(&self, job_id: &str, limit: usize) -> Vec<ProgressEvent> {
        let table = self.jobs.lock().await;
        match table.jobs.get(job_id) {
            Some(job) => {
                let start = job.events.len().saturating_sub(limit);
                job.events.iter().skip(start).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Current display of `job_id` followed by each update, ending after the job
    /// concludes or when the stream is dropped.
    pub async fn follow(&self, job_id: &str) -> ReceiverStream<ProgressDisplay> {
        let mut receiver = self.subscribe();
        let (tx, rx) = mpsc::channel(32);
        let current = self.latest(job_id).await;
        let job_id = job_id.to_string();

        tokio::spawn(async move {
            if let Some(display) = current {
                let finished = display.finished;
                if tx.send(display).await.is_err() || finished {
                    return;
                }
            }
            loop {
                match receiver.recv().await {
                    Ok(update) if update.job_id == job_id => {
                        let finished = update.display.finished;
                        if tx.send(update.display).await.is_err() || finished {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(job_id = %job_id, skipped, "progress subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!(job_id = %job_id, "progress subscription released");
        });

        ReceiverStream::new(rx)
    }
}

/// Consumes `events` until a terminal one, reporting each display. Returns the last display.
pub async fn observe<S, F>(mut events: S, mut on_update: F) -> Option<ProgressDisplay>
where
    S: Stream<Item = ProgressEvent> + Unpin,
    F: FnMut(&ProgressDisplay),
{
    let mut last = None;
    while let Some(event) = events.next().await {
        let display = project(&event);
        on_update(&display);
        let finished = display.finished;
        last = Some(display);
        if finished {
            break;
        }
    }
    last
}

/// Where job progress comes from. The transport lives outside this crate.
#[async_trait::async_trait]
pub trait ProgressSource: Send + Sync {
    async fn fetch_progress(&self, job_id: &str) -> Result<ProgressEvent, String>;
}

/// Polls `source` into `hub` until the job concludes. Gives up after
/// `max_failures` consecutive fetch errors.
pub async fn watch_job(
    source: Arc<dyn ProgressSource>,
    hub: ProgressHub,
    job_id: &str,
    interval: Duration,
    max_failures: u32,
) -> Result<ProgressDisplay, String> {
    let mut failures = 0u32;
    loop {
        match source.fetch_progress(job_id).await {
            Ok(event) => {
                failures = 0;
                let shown = hub.push(job_id, event).await;
                if shown.finished {
                    let percent = shown.percent;
                    info!(job_id, percent, "provisioning job concluded");
                    return Ok(shown);
                }
            }
            Err(err) => {
                failures += 1;
                warn!(job_id, failures, error = %err, "failed to fetch job progress");
                if failures >= max_failures {
                    return Err(format!("giving up on job {job_id}: {err}"));
                }
            }
        }
        tokio::time::sleep(interval).await;
    }
}
