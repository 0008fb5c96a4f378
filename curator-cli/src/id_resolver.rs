//! ID resolver module
//!
//! Lets users name a job by an unambiguous prefix of its id. Prefixes are
//! matched against the most recent jobs the API lists.

use anyhow::{Context, Result, anyhow};
use curator_client::CuratorClient;
use curator_core::domain::JobId;
use curator_core::dto::job::{ListJobs, MAX_LIST_LIMIT};

/// Resolve a job ID or prefix to a full ID
///
/// If the input is already a full ID, returns it immediately.
pub async fn resolve_job_id(client: &CuratorClient, input: &str) -> Result<JobId> {
    if let Ok(id) = input.parse::<JobId>() {
        return Ok(id);
    }

    let recent = client
        .list_jobs(&ListJobs {
            limit: Some(MAX_LIST_LIMIT),
            status: None,
        })
        .await
        .context("Failed to fetch jobs for ID resolution")?;

    match_prefix(recent.jobs.iter().map(|j| j.job_id), input)
}

fn match_prefix(ids: impl Iterator<Item = JobId>, prefix: &str) -> Result<JobId> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return Err(anyhow!("Job ID cannot be empty"));
    }

    let matches: Vec<JobId> = ids
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No recent job found with ID starting with '{}'", prefix)),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(JobId::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple jobs: {}",
                prefix,
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> JobId {
        s.parse().unwrap()
    }

    #[test]
    fn test_unique_prefix_resolves() {
        let ids = [
            id("3f2a0c1e-0000-4000-8000-000000000001"),
            id("9b7d4e2f-0000-4000-8000-000000000002"),
        ];
        assert_eq!(match_prefix(ids.into_iter(), "3F2A").unwrap(), ids[0]);
    }

    #[test]
    fn test_ambiguous_and_missing_prefixes() {
        let ids = [
            id("3f2a0c1e-0000-4000-8000-000000000001"),
            id("3f2b4e2f-0000-4000-8000-000000000002"),
        ];

        let err = match_prefix(ids.into_iter(), "3f2").unwrap_err();
        assert!(err.to_string().starts_with("Ambiguous prefix"));

        let err = match_prefix(ids.into_iter(), "ffff").unwrap_err();
        assert!(err.to_string().starts_with("No recent job"));

        assert!(match_prefix(ids.into_iter(), " ").is_err());
    }
}
