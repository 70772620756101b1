//! Searchable tags for pipeline and job spans

use crate::gitlab::{JobRecord, PipelineEvent};
use crate::instances::Instance;
use crate::trace::{TagValue, Tags};

fn insert(tags: &mut Tags, key: &str, value: impl Into<TagValue>) {
    tags.insert(key.to_string(), value.into());
}

/// Tags for the pipeline span
pub fn pipeline_tags(event: &PipelineEvent, instance: &Instance) -> Tags {
    let attrs = &event.object_attributes;
    let project = &event.project;
    let mut tags = Tags::new();

    insert(&mut tags, "instance", instance.name.as_str());

    insert(&mut tags, "resource.name", project.name.as_str());
    insert(&mut tags, "status", attrs.status.as_str());
    insert(&mut tags, "id", attrs.id);
    insert(&mut tags, "user", event.user.email.as_str());

    insert(&mut tags, "project.name", project.name.as_str());
    insert(&mut tags, "project.path", project.path_with_namespace.as_str());
    insert(&mut tags, "project.namespace", project.namespace.as_str());
    // web URL wins over the namespaced path under the same key
    insert(&mut tags, "project.path", project.web_url.as_str());

    insert(&mut tags, "ref.name", attrs.git_ref.as_str());
    insert(&mut tags, "ref.sha", attrs.sha.as_str());

    // emitted with zero values when no merge request triggered the pipeline
    let mr = event.merge_request.clone().unwrap_or_default();
    insert(&mut tags, "mr.id", mr.id);
    insert(&mut tags, "mr.title", mr.title);
    insert(&mut tags, "mr.url", mr.url);

    tags
}

/// Tags for a job span
pub fn job_tags(job: &JobRecord, instance: &Instance) -> Tags {
    let runner = job.runner.clone().unwrap_or_default();
    let mut tags = Tags::new();

    insert(&mut tags, "instance", instance.name.as_str());
    insert(&mut tags, "resource.name", job.name.as_str());
    insert(&mut tags, "stage", job.stage.as_str());
    insert(&mut tags, "status", job.status.as_str());
    insert(&mut tags, "runner.id", runner.id);
    insert(&mut tags, "runner.name", runner.description);

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::{MergeRequest, Project, Runner};

    fn event() -> PipelineEvent {
        let mut event = PipelineEvent::default();
        event.object_attributes.id = 42;
        event.object_attributes.status = "failed".to_string();
        event.object_attributes.git_ref = "main".to_string();
        event.object_attributes.sha = "abc123".to_string();
        event.user.email = "dev@example.com".to_string();
        event.project = Project {
            name: "shop".to_string(),
            namespace: "team".to_string(),
            path_with_namespace: "team/shop".to_string(),
            web_url: "https://gitlab.example.com/team/shop".to_string(),
            ..Default::default()
        };
        event
    }

    #[test]
    fn test_pipeline_tags() {
        let tags = pipeline_tags(&event(), &Instance::new("test"));

        assert_eq!(tags.len(), 13);
        assert_eq!(tags["instance"], TagValue::from("test"));
        assert_eq!(tags["resource.name"], TagValue::from("shop"));
        assert_eq!(tags["status"], TagValue::from("failed"));
        assert_eq!(tags["id"], TagValue::Int(42));
        assert_eq!(tags["user"], TagValue::from("dev@example.com"));
        assert_eq!(tags["project.name"], TagValue::from("shop"));
        assert_eq!(tags["project.namespace"], TagValue::from("team"));
        assert_eq!(tags["ref.name"], TagValue::from("main"));
        assert_eq!(tags["ref.sha"], TagValue::from("abc123"));
    }

    #[test]
    fn test_project_path_is_web_url() {
        let tags = pipeline_tags(&event(), &Instance::new("test"));
        assert_eq!(
            tags["project.path"],
            TagValue::from("https://gitlab.example.com/team/shop")
        );
    }

    #[test]
    fn test_merge_request_tags_without_merge_request() {
        let tags = pipeline_tags(&event(), &Instance::new("test"));

        assert_eq!(tags["mr.id"], TagValue::Int(0));
        assert_eq!(tags["mr.title"], TagValue::from(""));
        assert_eq!(tags["mr.url"], TagValue::from(""));
    }

    #[test]
    fn test_merge_request_tags() {
        let mut event = event();
        event.merge_request = Some(MergeRequest {
            id: 7,
            title: "Add cart".to_string(),
            url: "https://gitlab.example.com/team/shop/-/merge_requests/7".to_string(),
            ..Default::default()
        });

        let tags = pipeline_tags(&event, &Instance::new("test"));
        assert_eq!(tags["mr.id"], TagValue::Int(7));
        assert_eq!(tags["mr.title"], TagValue::from("Add cart"));
    }

    #[test]
    fn test_job_tags() {
        let job = JobRecord {
            id: 1,
            stage: "build".to_string(),
            name: "compile".to_string(),
            status: "success".to_string(),
            runner: Some(Runner {
                id: 1,
                description: "runner.gitlab.com".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };

        let tags = job_tags(&job, &Instance::new("test"));
        assert_eq!(tags.len(), 6);
        assert_eq!(tags["resource.name"], TagValue::from("compile"));
        assert_eq!(tags["stage"], TagValue::from("build"));
        assert_eq!(tags["runner.id"], TagValue::Int(1));
        assert_eq!(tags["runner.name"], TagValue::from("runner.gitlab.com"));
    }

    #[test]
    fn test_job_tags_without_runner() {
        let tags = job_tags(&JobRecord::default(), &Instance::new("test"));

        assert_eq!(tags.len(), 6);
        assert_eq!(tags["runner.id"], TagValue::Int(0));
        assert_eq!(tags["runner.name"], TagValue::from(""));
    }
}
