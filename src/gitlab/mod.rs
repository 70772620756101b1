//! GitLab webhook support
//!
//! Configure a project or group webhook with "Pipeline events" enabled:
//! ```text
//! URL:          http://ci-tracer:3000/gitlab/<instance>
//! Secret token: <token configured for the instance, if any>
//! ```
//!
//! GitLab sends the event kind in `X-Gitlab-Event`; only `Pipeline Hook` is
//! traced.

mod decode;
mod model;
mod time;

pub use decode::{decode_pipeline_hook, DecodeError};
pub use model::{
    ArtifactsFile, Commit, CommitAuthor, JobRecord, MergeRequest, PipelineAttributes,
    PipelineEvent, Project, Runner, User, Variable,
};
pub use time::{parse_timestamp, TimestampError};

/// Header carrying the event kind
pub const EVENT_HEADER: &str = "X-Gitlab-Event";

/// Header carrying the webhook secret token
pub const TOKEN_HEADER: &str = "X-Gitlab-Token";

/// The only event kind handled
pub const PIPELINE_HOOK: &str = "Pipeline Hook";
