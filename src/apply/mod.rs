//! Applies a step plan to a device inside a single running-datastore lock.
//!
//! Steps run in order and the first failure aborts the rest. Nothing already
//! applied is rolled back.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::DeviceEndpoint;
use crate::error::{Error, Result};
use crate::netconf::{ConfigLock, DeviceSession, SessionError, RUNNING};
use crate::snippets::{Fragment, Snippets};
use crate::steps::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Disconnected,
    Connected,
    Locked,
    Applying,
    Aborted,
    Unlocked,
    Done,
}

/// Outcome of one attempted step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// 1-based position in the plan.
    pub index: usize,
    pub label: String,
    pub completed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
}

impl StepRecord {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Console form of the record.
    pub fn line(&self) -> String {
        match &self.error {
            None => format!("Step {}: {}: success", self.index, self.label),
            Some(e) => format!("Step {}: {}: failed, aborting ({})", self.index, self.label, e),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// `Done` when every step was applied, `Aborted` otherwise.
    pub state: RunState,
    pub steps: Vec<StepRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.state == RunState::Done
            && self.unlock_error.is_none()
            && self.steps.iter().all(StepRecord::is_success)
    }
}

/// Rendered (or failed) fragment for one step, without touching a device.
#[derive(Debug)]
pub struct Preview {
    pub index: usize,
    pub label: String,
    pub fragment: Result<Fragment>,
}

pub fn preview(steps: &[Step], snippets: &Snippets) -> Vec<Preview> {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| Preview {
            index: i + 1,
            label: step.label(),
            fragment: step.render(snippets),
        })
        .collect()
}

/// Submit one fragment to the running datastore. Only a reply carrying
/// `<ok/>` counts as applied.
pub fn submit<S: DeviceSession>(session: &mut S, fragment: &Fragment) -> Result<()> {
    match session.edit_config(RUNNING, fragment) {
        Ok(reply) if reply.is_ok() => Ok(()),
        Ok(reply) => Err(Error::SubmissionFailure(reply.error_summary())),
        Err(e) => Err(Error::SubmissionFailure(e.to_string())),
    }
}

fn transition(state: &mut RunState, next: RunState) {
    tracing::debug!("Run state {:?} -> {:?}", state, next);
    *state = next;
}

struct Applied {
    records: Vec<StepRecord>,
    state: RunState,
    unlock_error: Option<String>,
}

/// Connect, lock, apply `steps` in order, unlock and close.
///
/// `on_step` sees each record as soon as its step finishes. Connection and
/// lock failures are returned as errors; everything after the lock is held
/// ends up in the report.
pub fn run<S, C, F>(
    endpoint: &DeviceEndpoint,
    steps: &[Step],
    snippets: &Snippets,
    connect: C,
    mut on_step: F,
) -> Result<RunReport>
where
    S: DeviceSession,
    C: FnOnce(&DeviceEndpoint) -> std::result::Result<S, SessionError>,
    F: FnMut(&StepRecord),
{
    let started_at = Utc::now();
    let mut state = RunState::Disconnected;

    let mut session = connect(endpoint).map_err(|e| Error::Connection(e.to_string()))?;
    transition(&mut state, RunState::Connected);
    tracing::info!("Connected to {}", endpoint.host);

    let applied = apply_locked(&mut session, steps, snippets, &mut state, &mut on_step);

    if let Err(e) = session.close() {
        tracing::warn!("Failed to close NETCONF session: {}", e);
    }

    let applied = applied?;
    Ok(RunReport {
        state: applied.state,
        steps: applied.records,
        unlock_error: applied.unlock_error,
        started_at,
        finished_at: Utc::now(),
    })
}

fn apply_locked<S: DeviceSession>(
    session: &mut S,
    steps: &[Step],
    snippets: &Snippets,
    state: &mut RunState,
    on_step: &mut impl FnMut(&StepRecord),
) -> Result<Applied> {
    tracing::info!("Attempting to lock running config");
    let mut lock = ConfigLock::acquire(session, RUNNING)
        .map_err(|e| Error::LockUnavailable(e.to_string()))?;
    transition(state, RunState::Locked);
    tracing::info!("Locked running config");

    transition(state, RunState::Applying);
    let mut records = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let result = step
            .render(snippets)
            .and_then(|fragment| submit(lock.session(), &fragment));

        let record = StepRecord {
            index: i + 1,
            label: step.label(),
            completed_at: Utc::now(),
            error: result.err(),
        };
        on_step(&record);
        let failed = !record.is_success();
        records.push(record);

        if failed {
            transition(state, RunState::Aborted);
            tracing::warn!(
                "Step {} failed, skipping {} remaining step(s)",
                i + 1,
                steps.len() - i - 1
            );
            break;
        }
    }
    let outcome = if *state == RunState::Aborted {
        RunState::Aborted
    } else {
        RunState::Done
    };

    let unlock_error = match lock.release() {
        Ok(()) => {
            tracing::info!("Unlocked running config");
            None
        }
        Err(e) => {
            tracing::error!("Failed to unlock running config: {}", e);
            Some(e.to_string())
        }
    };
    transition(state, RunState::Unlocked);
    transition(state, outcome);

    Ok(Applied {
        records,
        state: outcome,
        unlock_error,
    })
}
