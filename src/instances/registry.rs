use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One configured source of webhooks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Name used in the `/gitlab/{instance}` path and the `instance` tag
    pub name: String,
    /// Secret expected in `X-Gitlab-Token`; `None` accepts any sender
    #[serde(default)]
    pub token: Option<String>,
}

impl Instance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Check the token presented by a sender
    pub fn accepts_token(&self, presented: Option<&str>) -> bool {
        match &self.token {
            None => true,
            Some(expected) => presented == Some(expected.as_str()),
        }
    }
}

/// Known instances, read-only once the server is running
#[derive(Debug, Clone, Default)]
pub struct InstanceRegistry {
    instances: HashMap<String, Instance>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `name` or `name:token` entries separated by commas, e.g.
    /// `gitlab-com,internal:s3cret`
    pub fn parse(list: &str) -> Self {
        let mut registry = Self::new();

        for entry in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let instance = match entry.split_once(':') {
                Some((name, token)) if !token.is_empty() => {
                    Instance::new(name.trim()).with_token(token)
                }
                Some((name, _)) => Instance::new(name.trim()),
                None => Instance::new(entry),
            };

            if instance.name.is_empty() {
                tracing::warn!("Ignoring instance entry with empty name: '{}'", entry);
                continue;
            }
            registry.register(instance);
        }

        registry
    }

    /// Read instances from `CI_TRACER_INSTANCES`
    pub fn from_env() -> Self {
        std::env::var("CI_TRACER_INSTANCES")
            .map(|s| Self::parse(&s))
            .unwrap_or_default()
    }

    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.register(instance);
        self
    }

    /// Add an instance, replacing any previous one with the same name
    pub fn register(&mut self, instance: Instance) {
        if let Some(previous) = self.instances.insert(instance.name.clone(), instance) {
            tracing::warn!("Instance '{}' registered twice, keeping the last", previous.name);
        }
    }

    /// Resolve an instance name
    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.instances.get(name)
    }

    /// Instance names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.instances.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let registry = InstanceRegistry::parse("gitlab-com, internal:s3cret,,  legacy: ");

        assert_eq!(registry.names(), vec!["gitlab-com", "internal", "legacy"]);
        assert_eq!(registry.get("gitlab-com").unwrap().token, None);
        assert_eq!(
            registry.get("internal").unwrap().token.as_deref(),
            Some("s3cret")
        );
        assert_eq!(registry.get("legacy").unwrap().token, None);
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_parse_skips_empty_names() {
        let registry = InstanceRegistry::parse(":token,ok");
        assert_eq!(registry.names(), vec!["ok"]);
    }

    #[test]
    fn test_token_check() {
        let open = Instance::new("open");
        assert!(open.accepts_token(None));
        assert!(open.accepts_token(Some("anything")));

        let guarded = Instance::new("guarded").with_token("s3cret");
        assert!(guarded.accepts_token(Some("s3cret")));
        assert!(!guarded.accepts_token(Some("wrong")));
        assert!(!guarded.accepts_token(None));
    }

    #[test]
    fn test_register_replaces() {
        let registry = InstanceRegistry::new()
            .with_instance(Instance::new("a"))
            .with_instance(Instance::new("a").with_token("t"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().token.as_deref(), Some("t"));
    }
}
