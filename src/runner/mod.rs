//! Background execution of risk-synthesis jobs.
//!
//! A single mutex guards both the active map and the bounded history,
//! so `submit`, `status`, and worker bookkeeping never race: two
//! concurrent submits for one key yield exactly one `Started`. Workers
//! are detached threads; on process shutdown in-flight work is
//! abandoned.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crate::config::RunnerConfig;
use crate::core::{RiskId, TenantScope};
use crate::errors::{CoreError, CoreResult};
use crate::repo::Repo;
use crate::synth::{RiskSynthesizer, Selection};

/// Outcome of a submit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Started,
    AlreadyRunning,
}

impl SubmitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitOutcome::Started => "started",
            SubmitOutcome::AlreadyRunning => "already_running",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Completed,
    Error,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Error => "error",
        }
    }
}

/// What a finished job produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResult {
    pub risk_ids: Vec<RiskId>,
    pub count: usize,
}

/// Point-in-time view of one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub state: JobState,
    /// Elapsed seconds: so-far for running jobs, total for finished.
    pub processing_secs: f64,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<JobResult>,
    pub error: Option<String>,
}

struct ActiveJob {
    started: Instant,
}

struct FinishedJob {
    elapsed_secs: f64,
    completed_at: DateTime<Utc>,
    outcome: Result<JobResult, String>,
}

#[derive(Default)]
struct RunnerState {
    active: HashMap<String, ActiveJob>,
    history: HashMap<String, FinishedJob>,
}

impl RunnerState {
    /// Retain only the `limit` most recently completed entries.
    fn prune_history(&mut self, limit: usize) {
        if self.history.len() <= limit {
            return;
        }
        let mut by_completion: Vec<(String, DateTime<Utc>)> = self
            .history
            .iter()
            .map(|(key, job)| (key.clone(), job.completed_at))
            .collect();
        by_completion.sort_by(|a, b| b.1.cmp(&a.1));
        for (key, _) in by_completion.into_iter().skip(limit) {
            self.history.remove(&key);
        }
    }
}

/// Single-process background scheduler for synthesis jobs.
pub struct AsyncRiskRunner {
    repo: Arc<dyn Repo>,
    synthesizer: Arc<RiskSynthesizer>,
    state: Arc<Mutex<RunnerState>>,
    config: RunnerConfig,
}

impl AsyncRiskRunner {
    pub fn new(repo: Arc<dyn Repo>, synthesizer: Arc<RiskSynthesizer>, config: RunnerConfig) -> Self {
        Self {
            repo,
            synthesizer,
            state: Arc::new(Mutex::new(RunnerState::default())),
            config,
        }
    }

    /// Submit a job under `key` for `selection`.
    ///
    /// Returns `AlreadyRunning` while a worker for the key is alive;
    /// after completion, a fresh submit starts a new job and overwrites
    /// the key's history entry.
    pub fn submit(
        &self,
        scope: &TenantScope,
        selection: Selection,
        key: impl Into<String>,
    ) -> CoreResult<SubmitOutcome> {
        scope.ensure(&selection.tenant)?;
        let key = key.into();

        {
            let mut state = self.state.lock();
            if state.active.contains_key(&key) {
                return Ok(SubmitOutcome::AlreadyRunning);
            }
            if state.active.len() >= self.config.max_workers {
                return Err(CoreError::internal(format!(
                    "all {} synthesis workers are busy",
                    self.config.max_workers
                )));
            }
            state.active.insert(
                key.clone(),
                ActiveJob {
                    started: Instant::now(),
                },
            );
        }

        let synthesizer = Arc::clone(&self.synthesizer);
        let state = Arc::clone(&self.state);
        let history_limit = self.config.history_limit;
        let scope = scope.clone();
        let worker_key = key.clone();
        let started = Instant::now();

        let spawned = std::thread::Builder::new()
            .name(format!("riskmap-synth-{}", key))
            .spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    synthesizer.generate(&scope, &selection, Utc::now())
                }));
                let outcome = match outcome {
                    Ok(Ok(risks)) => Ok(JobResult {
                        count: risks.len(),
                        risk_ids: risks.into_iter().map(|r| r.id).collect(),
                    }),
                    Ok(Err(err)) => Err(err.to_string()),
                    Err(_) => Err("synthesis worker panicked".to_string()),
                };
                Self::record_completion(&state, history_limit, &worker_key, started, outcome);
            });

        if let Err(err) = spawned {
            self.state.lock().active.remove(&key);
            return Err(CoreError::internal(format!(
                "failed to spawn synthesis worker: {}",
                err
            )));
        }
        Ok(SubmitOutcome::Started)
    }

    /// Submit keyed by the selection itself.
    pub fn submit_selection(
        &self,
        scope: &TenantScope,
        selection: Selection,
    ) -> CoreResult<(String, SubmitOutcome)> {
        let key = selection.job_key();
        let outcome = self.submit(scope, selection, key.clone())?;
        Ok((key, outcome))
    }

    /// Resolve an approval request to its selection and submit under
    /// the approval id.
    ///
    /// Fails with `CrossTenant` when the approval belongs to another
    /// tenant, before any job is started.
    pub fn submit_for_approval(
        &self,
        scope: &TenantScope,
        approval_id: &str,
    ) -> CoreResult<SubmitOutcome> {
        let approval = self
            .repo
            .find_approval(approval_id)?
            .ok_or_else(|| {
                CoreError::not_found(format!("approval request {} not found", approval_id))
            })?;
        scope.ensure(&approval.tenant)?;

        let selection = Selection {
            tenant: approval.tenant,
            entity: approval.entity,
            table: approval.table,
            row: approval.row,
        };
        self.submit(scope, selection, approval_id)
    }

    /// Current status of the job under `key`, or `None` when it is
    /// neither active nor in history.
    pub fn status(&self, key: &str) -> Option<JobStatus> {
        let state = self.state.lock();
        if let Some(active) = state.active.get(key) {
            return Some(JobStatus {
                state: JobState::Running,
                processing_secs: active.started.elapsed().as_secs_f64(),
                completed_at: None,
                result: None,
                error: None,
            });
        }
        state.history.get(key).map(|finished| match &finished.outcome {
            Ok(result) => JobStatus {
                state: JobState::Completed,
                processing_secs: finished.elapsed_secs,
                completed_at: Some(finished.completed_at),
                result: Some(result.clone()),
                error: None,
            },
            Err(message) => JobStatus {
                state: JobState::Error,
                processing_secs: finished.elapsed_secs,
                completed_at: Some(finished.completed_at),
                result: None,
                error: Some(message.clone()),
            },
        })
    }

    fn record_completion(
        state: &Mutex<RunnerState>,
        history_limit: usize,
        key: &str,
        started: Instant,
        outcome: Result<JobResult, String>,
    ) {
        if let Err(message) = &outcome {
            log::warn!("synthesis job {} failed: {}", key, message);
        }
        let mut state = state.lock();
        state.active.remove(key);
        state.history.insert(
            key.to_string(),
            FinishedJob {
                elapsed_secs: started.elapsed().as_secs_f64(),
                completed_at: Utc::now(),
                outcome,
            },
        );
        state.prune_history(history_limit);
    }
}
