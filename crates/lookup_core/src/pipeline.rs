//! crates/lookup_core/src/pipeline.rs
//!
//! The staged search: a run of randomized "progress" delays followed by either
//! a dataset lookup or the oracle, ending in a settled result that is recorded
//! in the search history.

use crate::dataset::{search, DatasetFetcher};
use crate::domain::{HistoryEntry, PlatformId, ResultData, SearchResult};
use crate::history::HistoryStore;
use crate::oracle::oracle;
use crate::ports::PortError;
use crate::validation::{ValidationError, ValidationPolicy};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

pub const STAGE_COUNT: usize = 4;

/// Captions shown while each progress stage is held.
pub const STAGE_LABELS: [&str; STAGE_COUNT] = [
    "برقراری ارتباط با سرور...",
    "جستجو در پایگاه داده...",
    "بررسی اطلاعات کاربر...",
    "تحلیل نتایج...",
];

//=========================================================================================
// Timing configuration
//=========================================================================================

/// An inclusive `[min, max]` window a delay is drawn from uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    pub min: Duration,
    pub max: Duration,
}

impl DelayWindow {
    pub const fn from_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    pub fn sample(&self) -> Duration {
        let (min, max) = (self.min.as_millis() as u64, self.max.as_millis() as u64);
        if max <= min {
            return self.min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimings {
    /// Held by each of the progress stages.
    pub stage: DelayWindow,
    /// Tail delay after the last stage, before the lookup itself.
    pub settle: DelayWindow,
}

impl Default for StageTimings {
    fn default() -> Self {
        Self {
            stage: DelayWindow::from_millis(20_000, 60_000),
            settle: DelayWindow::from_millis(20_000, 30_000),
        }
    }
}

/// Where the settled result comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMode {
    /// No live dataset: the hash oracle answers.
    Oracle,
    /// The platform dataset is fetched and scanned.
    Dataset,
}

//=========================================================================================
// States
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to load the {platform} dataset: {source}")]
pub struct DataFetchError {
    pub platform: PlatformId,
    #[source]
    pub source: PortError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Found(SearchResult),
    NotFound(SearchResult),
    Errored(DataFetchError),
}

impl Outcome {
    fn from_result(result: SearchResult) -> Self {
        if result.found {
            Outcome::Found(result)
        } else {
            Outcome::NotFound(result)
        }
    }

    pub fn result(&self) -> SearchResult {
        match self {
            Outcome::Found(result) | Outcome::NotFound(result) => result.clone(),
            Outcome::Errored(e) => SearchResult::failed(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Staging { stage: usize },
    Executing,
    Settled(Outcome),
}

impl PipelineState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, PipelineState::Staging { .. } | PipelineState::Executing)
    }

    /// Fraction of the progress bar to fill, `(stage + 1) / 4` while staging.
    pub fn progress(&self) -> Option<f32> {
        match self {
            PipelineState::Staging { stage } => Some((stage + 1) as f32 / STAGE_COUNT as f32),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("a search is already in progress")]
    Busy,
}

//=========================================================================================
// The pipeline
//=========================================================================================

/// Identifies the submission a spawned run belongs to.
struct Run {
    generation: u64,
    token: CancellationToken,
}

/// One search box: at most one search in flight, observable through a watch channel.
pub struct SearchPipeline {
    platform: PlatformId,
    mode: LookupMode,
    policy: ValidationPolicy,
    timings: StageTimings,
    fetcher: Arc<DatasetFetcher>,
    history: Arc<HistoryStore>,
    state_tx: watch::Sender<PipelineState>,
    run: Mutex<Run>,
}

impl SearchPipeline {
    pub fn new(
        platform: PlatformId,
        mode: LookupMode,
        policy: ValidationPolicy,
        timings: StageTimings,
        fetcher: Arc<DatasetFetcher>,
        history: Arc<HistoryStore>,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(PipelineState::Idle);
        Arc::new(Self {
            platform,
            mode,
            policy,
            timings,
            fetcher,
            history,
            state_tx,
            run: Mutex::new(Run {
                generation: 0,
                token: CancellationToken::new(),
            }),
        })
    }

    pub fn platform(&self) -> PlatformId {
        self.platform
    }

    pub fn state(&self) -> PipelineState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state_tx.subscribe()
    }

    fn lock_run(&self) -> std::sync::MutexGuard<'_, Run> {
        // The guarded section never panics, so a poisoned lock still holds a valid Run.
        self.run.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validates the username and starts a search in the background.
    ///
    /// A settled result is replaced by the new search; an in-flight one is not.
    pub fn submit(self: &Arc<Self>, username: &str) -> Result<JoinHandle<Option<Outcome>>, SubmitError> {
        self.policy.validate(username)?;

        let (generation, token) = {
            let mut run = self.lock_run();
            if self.state_tx.borrow().is_in_flight() {
                return Err(SubmitError::Busy);
            }
            run.generation += 1;
            run.token = CancellationToken::new();
            self.state_tx.send_replace(PipelineState::Staging { stage: 0 });
            (run.generation, run.token.clone())
        };

        let pipeline = self.clone();
        let username = username.trim().to_string();
        Ok(tokio::spawn(async move {
            pipeline.execute(username, generation, token).await
        }))
    }

    /// Returns to `Idle`, discarding the current result. Pending timers of the
    /// abandoned search can no longer change the state.
    pub fn reset(&self) {
        let mut run = self.lock_run();
        run.token.cancel();
        run.generation += 1;
        run.token = CancellationToken::new();
        self.state_tx.send_replace(PipelineState::Idle);
    }

    fn is_current(&self, generation: u64) -> bool {
        let run = self.lock_run();
        run.generation == generation && !run.token.is_cancelled()
    }

    /// Applies `state` only if the submission is still the current one.
    fn transition(&self, generation: u64, state: PipelineState) -> bool {
        let run = self.lock_run();
        if run.generation != generation || run.token.is_cancelled() {
            return false;
        }
        self.state_tx.send_replace(state);
        true
    }

    async fn execute(
        self: Arc<Self>,
        username: String,
        generation: u64,
        token: CancellationToken,
    ) -> Option<Outcome> {
        let search_id = Uuid::new_v4();
        info!("Search {} for '{}' on {} started.", search_id, username, self.platform);

        for stage in 0..STAGE_COUNT {
            if stage > 0 && !self.transition(generation, PipelineState::Staging { stage }) {
                return None;
            }
            if !pause(&token, self.timings.stage.sample()).await {
                info!("Search {} abandoned during stage {}.", search_id, stage);
                return None;
            }
        }
        if !pause(&token, self.timings.settle.sample()).await {
            info!("Search {} abandoned before lookup.", search_id);
            return None;
        }

        let outcome = match self.mode {
            LookupMode::Oracle => Outcome::from_result(oracle(&username)),
            LookupMode::Dataset => {
                if !self.transition(generation, PipelineState::Executing) {
                    return None;
                }
                match self.fetcher.fetch_dataset(self.platform).await {
                    Ok(dataset) => Outcome::from_result(match search(&dataset, &username) {
                        Some(record) => SearchResult::found(ResultData::Record(record.clone())),
                        None => SearchResult::not_found(),
                    }),
                    Err(source) => Outcome::Errored(DataFetchError {
                        platform: self.platform,
                        source,
                    }),
                }
            }
        };

        if !self.is_current(generation) {
            info!("Search {} settled after a reset; result discarded.", search_id);
            return None;
        }

        // History is written before `Settled` is published.
        match &outcome {
            Outcome::Found(result) | Outcome::NotFound(result) => {
                info!("Search {} settled: found={}.", search_id, result.found);
                let entry = HistoryEntry::new(username, self.platform, result.clone());
                if let Err(e) = self.history.append(entry).await {
                    error!("Failed to record search {} in history: {}", search_id, e);
                }
            }
            Outcome::Errored(e) => error!("Search {} failed: {}", search_id, e),
        }

        if !self.transition(generation, PipelineState::Settled(outcome.clone())) {
            info!("Search {} was reset while being recorded.", search_id);
            return None;
        }

        Some(outcome)
    }
}

/// Sleeps for `delay`; returns false if the token fired first.
async fn pause(token: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
