//! In-memory job store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use curator_core::domain::{Job, JobId, JobStatus, JobUpdate, UpdateOutcome};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use super::{JobStore, expiry};
use crate::error::StoreError;

struct Entry {
    job: Job,
    seq: u64,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Default)]
struct State {
    entries: HashMap<JobId, Entry>,
    next_seq: u64,
}

/// Process-local job store
pub struct InMemoryJobStore {
    state: RwLock<State>,
    ttl: Duration,
}

impl InMemoryJobStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: RwLock::new(State::default()),
            ttl,
        }
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: &Job) -> Result<(), StoreError> {
        let mut state = self.state.write().await;

        if state.entries.contains_key(&job.job_id) {
            return Err(StoreError::DuplicateKey(job.job_id));
        }

        state.next_seq += 1;
        let seq = state.next_seq;
        state.entries.insert(
            job.job_id,
            Entry {
                job: job.clone(),
                seq,
                expires_at: expiry(job.updated_at, self.ttl),
            },
        );

        debug!("Stored job {} (seq {})", job.job_id, seq);
        Ok(())
    }

    async fn get(&self, job_id: JobId) -> Result<Job, StoreError> {
        let state = self.state.read().await;
        state
            .entries
            .get(&job_id)
            .filter(|entry| entry.is_live(Utc::now()))
            .map(|entry| entry.job.clone())
            .ok_or(StoreError::NotFound(job_id))
    }

    async fn update(&self, job_id: JobId, update: JobUpdate) -> Result<UpdateOutcome, StoreError> {
        let mut state = self.state.write().await;

        let entry = state
            .entries
            .get_mut(&job_id)
            .filter(|entry| entry.is_live(Utc::now()))
            .ok_or(StoreError::NotFound(job_id))?;

        let outcome = entry.job.apply(update)?;
        if outcome == UpdateOutcome::Applied {
            entry.expires_at = expiry(entry.job.updated_at, self.ttl);
        }

        Ok(outcome)
    }

    async fn list(&self, limit: usize, status: Option<JobStatus>) -> Result<Vec<Job>, StoreError> {
        let state = self.state.read().await;
        let now = Utc::now();

        let mut live: Vec<&Entry> = state
            .entries
            .values()
            .filter(|entry| entry.is_live(now))
            .filter(|entry| status.is_none_or(|s| entry.job.status == s))
            .collect();

        live.sort_by(|a, b| {
            b.job
                .created_at
                .cmp(&a.job.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        Ok(live
            .into_iter()
            .take(limit)
            .map(|entry| entry.job.clone())
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.is_live(now));
        Ok((before - state.entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use curator_core::domain::{JobInput, StageKind, StageOutput, WorkflowResult};
    use std::sync::Arc;

    const HOUR: Duration = Duration::from_secs(3600);

    fn job(description: &str) -> Job {
        Job::new(JobInput::new(description))
    }

    fn result(text: &str) -> WorkflowResult {
        WorkflowResult::from_stages(vec![StageOutput {
            stage: StageKind::Review,
            agent_role: "Quality Reviewer".to_string(),
            output: text.to_string(),
            tool_invocations: Vec::new(),
        }])
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryJobStore::new(HOUR);
        let job = job("Write a 2-line product tagline");

        store.create(&job).await.unwrap();

        let fetched = store.get(job.job_id).await.unwrap();
        assert_eq!(fetched, job);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_ids() {
        let store = InMemoryJobStore::new(HOUR);
        let job = job("x");

        store.create(&job).await.unwrap();
        let err = store.create(&job).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(id) if id == job.job_id));
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let store = InMemoryJobStore::new(HOUR);
        let id = JobId::new();

        assert!(matches!(store.get(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update(id, JobUpdate::processing()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_runs_state_machine() {
        let store = InMemoryJobStore::new(HOUR);
        let job = job("x");
        store.create(&job).await.unwrap();

        let err = store
            .update(job.job_id, JobUpdate::completed(result("early")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));

        store.update(job.job_id, JobUpdate::processing()).await.unwrap();
        store
            .update(job.job_id, JobUpdate::completed(result("done")))
            .await
            .unwrap();

        let stored = store.get(job.job_id).await.unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.result.unwrap().output, "done");
        assert!(stored.error_message.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_terminal_writes_keep_latest() {
        let store = Arc::new(InMemoryJobStore::new(HOUR));
        let job = job("x");
        store.create(&job).await.unwrap();
        store.update(job.job_id, JobUpdate::processing()).await.unwrap();

        let id = job.job_id;
        let base = Utc::now() + ChronoDuration::seconds(1);
        let mut handles = Vec::new();
        for i in 0..8i64 {
            let store = Arc::clone(&store);
            let update = if i % 2 == 0 {
                JobUpdate::completed(result(&format!("run {}", i)))
            } else {
                JobUpdate::failed(format!("run {}", i))
            };
            let update = update.at(base + ChronoDuration::milliseconds(i));
            handles.push(tokio::spawn(async move { store.update(id, update).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Run 7 carries the latest timestamp
        let stored = store.get(id).await.unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.error_message.as_deref(), Some("run 7"));
        assert!(stored.result.is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_filter_and_limit() {
        let store = InMemoryJobStore::new(HOUR);
        let now = Utc::now();

        let mut ids = Vec::new();
        for i in 0..5i64 {
            let mut j = job(&format!("job {}", i));
            j.created_at = now + ChronoDuration::seconds(i);
            j.updated_at = j.created_at;
            store.create(&j).await.unwrap();
            ids.push(j.job_id);
        }
        store.update(ids[1], JobUpdate::processing()).await.unwrap();

        let listed: Vec<JobId> = store
            .list(3, None)
            .await
            .unwrap()
            .into_iter()
            .map(|j| j.job_id)
            .collect();
        assert_eq!(listed, vec![ids[4], ids[3], ids[2]]);

        let processing = store.list(10, Some(JobStatus::Processing)).await.unwrap();
        assert_eq!(processing.len(), 1);
        assert_eq!(processing[0].job_id, ids[1]);
    }

    #[tokio::test]
    async fn test_list_ties_break_on_insertion_order() {
        let store = InMemoryJobStore::new(HOUR);
        let created_at = Utc::now();

        let mut ids = Vec::new();
        for _ in 0..4 {
            let mut j = job("same instant");
            j.created_at = created_at;
            j.updated_at = created_at;
            store.create(&j).await.unwrap();
            ids.push(j.job_id);
        }
        ids.reverse();

        for _ in 0..3 {
            let listed: Vec<JobId> = store
                .list(4, None)
                .await
                .unwrap()
                .into_iter()
                .map(|j| j.job_id)
                .collect();
            assert_eq!(listed, ids);
        }
    }

    #[tokio::test]
    async fn test_expired_jobs_are_invisible_and_purged() {
        let store = InMemoryJobStore::new(Duration::from_secs(60));

        let mut old = job("old");
        old.created_at = Utc::now() - ChronoDuration::minutes(5);
        old.updated_at = old.created_at;
        store.create(&old).await.unwrap();

        let fresh = job("fresh");
        store.create(&fresh).await.unwrap();

        assert!(matches!(store.get(old.job_id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update(old.job_id, JobUpdate::processing()).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.list(10, None).await.unwrap().len(), 1);

        // The id stays taken until the record is purged
        assert!(matches!(store.create(&old).await, Err(StoreError::DuplicateKey(_))));

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.purge_expired().await.unwrap(), 0);
        assert!(store.get(fresh.job_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_refreshes_expiry() {
        let store = InMemoryJobStore::new(Duration::from_secs(60));

        let mut j = job("x");
        j.created_at = Utc::now() - ChronoDuration::seconds(50);
        j.updated_at = j.created_at;
        store.create(&j).await.unwrap();

        store.update(j.job_id, JobUpdate::processing()).await.unwrap();
        assert_eq!(store.purge_expired().await.unwrap(), 0);
        assert_eq!(store.get(j.job_id).await.unwrap().status, JobStatus::Processing);
    }
}
