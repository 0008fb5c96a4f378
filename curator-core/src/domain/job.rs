//! Job domain types
//!
//! Every status change goes through [`Job::apply`], so all store backends
//! share one implementation of the state machine:
//!
//! ```text
//! pending --> processing --> completed
//!                        \-> failed
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::workflow::WorkflowResult;

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;
pub const DEFAULT_PRIORITY: u8 = 5;

/// Unique job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for JobId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

/// The original request payload, immutable once stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInput {
    pub task_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<BTreeMap<String, serde_json::Value>>,
    /// Advisory only unless the queue is configured for priority ordering
    #[serde(default = "default_priority")]
    pub priority: u8,
}

impl JobInput {
    pub fn new(task_description: impl Into<String>) -> Self {
        Self {
            task_description: task_description.into(),
            project_context: None,
            requirements: None,
            priority: DEFAULT_PRIORITY,
        }
    }
}

/// Job record
///
/// Structure shared between the API (creates it) and workers (update it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub status: JobStatus,
    pub input: JobInput,
    pub result: Option<WorkflowResult>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Creates a new pending job with a fresh id
    pub fn new(input: JobInput) -> Self {
        let now = Utc::now();
        Self {
            job_id: JobId::new(),
            status: JobStatus::Pending,
            input,
            result: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `completed` carries only a result, `failed` only an error message,
    /// and non-terminal jobs carry neither.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            JobStatus::Pending | JobStatus::Processing => {
                self.result.is_none() && self.error_message.is_none()
            }
            JobStatus::Completed => self.result.is_some() && self.error_message.is_none(),
            JobStatus::Failed => self.result.is_none() && self.error_message.is_some(),
        }
    }

    /// Applies a status update in place.
    ///
    /// Terminal-to-terminal writes (two workers racing on a redelivered task)
    /// resolve last-write-wins on `updated_at`; an older write is reported as
    /// [`UpdateOutcome::Superseded`] and leaves the record untouched.
    pub fn apply(&mut self, update: JobUpdate) -> Result<UpdateOutcome, TransitionError> {
        let from = self.status;
        let to = update.status;

        if from.is_terminal() && to.is_terminal() {
            if update.updated_at <= self.updated_at {
                return Ok(UpdateOutcome::Superseded);
            }
        } else {
            let allowed = match (from, to) {
                (JobStatus::Pending, JobStatus::Processing) => true,
                (JobStatus::Processing, _) => to.rank() >= from.rank(),
                _ => false,
            };
            if !allowed {
                return Err(TransitionError {
                    job_id: self.job_id,
                    from,
                    to,
                });
            }
        }

        self.status = to;
        self.result = update.result;
        self.error_message = update.error_message;
        self.updated_at = self.updated_at.max(update.updated_at);

        Ok(UpdateOutcome::Applied)
    }
}

/// A partial update of a job's status, result, error and timestamp.
///
/// Constructors keep the outcome fields consistent with the status.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    status: JobStatus,
    result: Option<WorkflowResult>,
    error_message: Option<String>,
    updated_at: DateTime<Utc>,
}

impl JobUpdate {
    pub fn processing() -> Self {
        Self {
            status: JobStatus::Processing,
            result: None,
            error_message: None,
            updated_at: Utc::now(),
        }
    }

    pub fn completed(result: WorkflowResult) -> Self {
        Self {
            status: JobStatus::Completed,
            result: Some(result),
            error_message: None,
            updated_at: Utc::now(),
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            result: None,
            error_message: Some(error_message.into()),
            updated_at: Utc::now(),
        }
    }

    /// Overrides the write timestamp
    pub fn at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn result(&self) -> Option<&WorkflowResult> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Whether an update was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// A newer terminal write already holds the record
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("job {job_id} cannot move from {from} to {to}")]
pub struct TransitionError {
    pub job_id: JobId,
    pub from: JobStatus,
    pub to: JobStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::{StageKind, StageOutput};
    use chrono::Duration;

    fn sample_result(text: &str) -> WorkflowResult {
        WorkflowResult::from_stages(vec![StageOutput {
            stage: StageKind::Review,
            agent_role: "Quality Reviewer".to_string(),
            output: text.to_string(),
            tool_invocations: Vec::new(),
        }])
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = Job::new(JobInput::new("Write a tagline"));
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.created_at, job.updated_at);
        assert_eq!(job.input.priority, DEFAULT_PRIORITY);
        assert!(job.is_consistent());
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = Job::new(JobInput::new("Write a tagline"));

        assert_eq!(
            job.apply(JobUpdate::processing()).unwrap(),
            UpdateOutcome::Applied
        );
        assert_eq!(job.status, JobStatus::Processing);

        job.apply(JobUpdate::completed(sample_result("Fresh. Fast. Yours.")))
            .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.is_consistent());
        assert_eq!(job.result.as_ref().unwrap().output, "Fresh. Fast. Yours.");
    }

    #[test]
    fn test_pending_cannot_jump_to_terminal() {
        let mut job = Job::new(JobInput::new("x"));
        let err = job.apply(JobUpdate::failed("boom")).unwrap_err();
        assert_eq!(err.from, JobStatus::Pending);
        assert_eq!(err.to, JobStatus::Failed);
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn test_redelivery_reclaims_processing_job() {
        let mut job = Job::new(JobInput::new("x"));
        job.apply(JobUpdate::processing()).unwrap();
        assert_eq!(
            job.apply(JobUpdate::processing()).unwrap(),
            UpdateOutcome::Applied
        );
        assert_eq!(job.status, JobStatus::Processing);
    }

    #[test]
    fn test_terminal_never_regresses() {
        let mut job = Job::new(JobInput::new("x"));
        job.apply(JobUpdate::processing()).unwrap();
        job.apply(JobUpdate::failed("boom")).unwrap();

        assert!(job.apply(JobUpdate::processing()).is_err());
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_terminal_writes_are_last_write_wins() {
        let mut job = Job::new(JobInput::new("x"));
        job.apply(JobUpdate::processing()).unwrap();

        let t0 = job.updated_at + Duration::seconds(1);
        job.apply(JobUpdate::completed(sample_result("first")).at(t0))
            .unwrap();

        // An older write loses
        let stale = JobUpdate::failed("late failure").at(t0 - Duration::milliseconds(1));
        assert_eq!(job.apply(stale).unwrap(), UpdateOutcome::Superseded);
        assert_eq!(job.status, JobStatus::Completed);

        // A newer write replaces the outcome instead of appending to it
        let newer = JobUpdate::completed(sample_result("second")).at(t0 + Duration::seconds(1));
        assert_eq!(job.apply(newer).unwrap(), UpdateOutcome::Applied);
        assert_eq!(job.result.as_ref().unwrap().output, "second");
        assert_eq!(job.result.as_ref().unwrap().stages.len(), 1);
        assert!(job.is_consistent());
    }

    #[test]
    fn test_updated_at_never_moves_backwards() {
        let mut job = Job::new(JobInput::new("x"));
        let before = job.updated_at;
        job.apply(JobUpdate::processing().at(before - Duration::seconds(30)))
            .unwrap();
        assert_eq!(job.updated_at, before);
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("queued".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    #[test]
    fn test_absent_outcome_serializes_as_null() {
        let job = Job::new(JobInput::new("x"));
        let value = serde_json::to_value(&job).unwrap();
        assert!(value["result"].is_null());
        assert!(value["error_message"].is_null());
        assert_eq!(value["status"], "pending");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Step {
            Processing(i64),
            Completed(i64),
            Failed(i64),
        }

        fn step() -> impl Strategy<Value = Step> {
            prop_oneof![
                (-5i64..5).prop_map(Step::Processing),
                (-5i64..5).prop_map(Step::Completed),
                (-5i64..5).prop_map(Step::Failed),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: any sequence of updates, valid or not, leaves the
            /// record consistent and never leaves a terminal state.
            #[test]
            fn updates_preserve_invariants(steps in prop::collection::vec(step(), 0..12)) {
                let mut job = Job::new(JobInput::new("property"));
                let base = job.created_at;
                let mut seen_terminal = false;

                for step in steps {
                    let update = match step {
                        Step::Processing(offset) => JobUpdate::processing().at(base + Duration::seconds(offset)),
                        Step::Completed(offset) => JobUpdate::completed(sample_result("ok")).at(base + Duration::seconds(offset)),
                        Step::Failed(offset) => JobUpdate::failed("err").at(base + Duration::seconds(offset)),
                    };
                    let before = job.updated_at;
                    let _ = job.apply(update);

                    prop_assert!(job.is_consistent());
                    prop_assert!(job.updated_at >= before);
                    if seen_terminal {
                        prop_assert!(job.status.is_terminal());
                    }
                    seen_terminal |= job.status.is_terminal();
                }
            }
        }
    }
}
