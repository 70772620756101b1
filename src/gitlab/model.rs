//! GitLab pipeline hook payload
//!
//! Fields default when missing or `null`. Only `started_at`/`finished_at` of
//! a build and the sub-objects GitLab omits keep their absence as `None`.
//!
//! The one typed field is [`Commit::timestamp`], an RFC 3339 date-time: it may
//! be missing or `null`, but a present value that is not RFC 3339 fails the
//! whole decode.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Decoded `Pipeline Hook` notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineEvent {
    #[serde(deserialize_with = "null_default")]
    pub object_kind: String,
    #[serde(deserialize_with = "null_default")]
    pub object_attributes: PipelineAttributes,
    pub merge_request: Option<MergeRequest>,
    #[serde(deserialize_with = "null_default")]
    pub user: User,
    #[serde(deserialize_with = "null_default")]
    pub project: Project,
    #[serde(deserialize_with = "null_default")]
    pub commit: Commit,
    #[serde(deserialize_with = "null_default")]
    pub builds: Vec<JobRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineAttributes {
    #[serde(deserialize_with = "null_default")]
    pub id: i64,
    #[serde(rename = "ref", deserialize_with = "null_default")]
    pub git_ref: String,
    #[serde(deserialize_with = "null_default")]
    pub tag: bool,
    #[serde(deserialize_with = "null_default")]
    pub sha: String,
    #[serde(deserialize_with = "null_default")]
    pub before_sha: String,
    #[serde(deserialize_with = "null_default")]
    pub source: String,
    #[serde(deserialize_with = "null_default")]
    pub status: String,
    #[serde(deserialize_with = "null_default")]
    pub stages: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub created_at: String,
    #[serde(deserialize_with = "null_default")]
    pub finished_at: String,
    /// Seconds; `null` while the pipeline is running
    pub duration: Option<i64>,
    #[serde(deserialize_with = "null_default")]
    pub variables: Vec<Variable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variable {
    #[serde(deserialize_with = "null_default")]
    pub key: String,
    #[serde(deserialize_with = "null_default")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeRequest {
    #[serde(deserialize_with = "null_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_default")]
    pub iid: i64,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub source_branch: String,
    #[serde(deserialize_with = "null_default")]
    pub source_project_id: i64,
    #[serde(deserialize_with = "null_default")]
    pub target_branch: String,
    #[serde(deserialize_with = "null_default")]
    pub target_project_id: i64,
    #[serde(deserialize_with = "null_default")]
    pub state: String,
    #[serde(deserialize_with = "null_default")]
    pub merge_status: String,
    #[serde(deserialize_with = "null_default")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub username: String,
    #[serde(deserialize_with = "null_default")]
    pub avatar_url: String,
    #[serde(deserialize_with = "null_default")]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(deserialize_with = "null_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
    #[serde(deserialize_with = "null_default")]
    pub web_url: String,
    #[serde(deserialize_with = "null_default")]
    pub avatar_url: String,
    #[serde(deserialize_with = "null_default")]
    pub git_ssh_url: String,
    #[serde(deserialize_with = "null_default")]
    pub git_http_url: String,
    #[serde(deserialize_with = "null_default")]
    pub namespace: String,
    #[serde(deserialize_with = "null_default")]
    pub visibility_level: i64,
    #[serde(deserialize_with = "null_default")]
    pub path_with_namespace: String,
    #[serde(deserialize_with = "null_default")]
    pub default_branch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commit {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub message: String,
    pub timestamp: Option<DateTime<FixedOffset>>,
    #[serde(deserialize_with = "null_default")]
    pub url: String,
    #[serde(deserialize_with = "null_default")]
    pub author: CommitAuthor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitAuthor {
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub email: String,
}

/// One build of the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRecord {
    #[serde(deserialize_with = "null_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_default")]
    pub stage: String,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub status: String,
    #[serde(deserialize_with = "null_default")]
    pub created_at: String,
    /// Absent until the job starts
    pub started_at: Option<String>,
    /// Absent until the job reaches a terminal state
    pub finished_at: Option<String>,
    /// Trigger mode, e.g. `on_success` or `manual`
    #[serde(deserialize_with = "null_default")]
    pub when: String,
    #[serde(deserialize_with = "null_default")]
    pub manual: bool,
    #[serde(deserialize_with = "null_default")]
    pub allow_failure: bool,
    pub user: Option<User>,
    pub runner: Option<Runner>,
    pub artifacts_file: Option<ArtifactsFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Runner {
    #[serde(deserialize_with = "null_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
    #[serde(deserialize_with = "null_default")]
    pub active: bool,
    #[serde(deserialize_with = "null_default")]
    pub is_shared: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsFile {
    pub filename: Option<String>,
    pub size: Option<i64>,
}

/// Treat an explicit `null` like a missing field
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
