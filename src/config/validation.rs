//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (tasks reference configured targets)
//! - Validate value ranges (intervals and ceilings > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RouterConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("target set is empty")]
    NoTargets,

    #[error("target names must not be blank")]
    BlankTarget,

    #[error("invalid bind address `{0}`")]
    InvalidBindAddress(String),

    #[error("invalid upstream base url `{0}`")]
    InvalidUpstreamUrl(String),

    #[error("health_check.{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("task ids must not be blank")]
    BlankTaskId,

    #[error("duplicate task `{0}`")]
    DuplicateTask(String),

    #[error("task `{task}` references unknown target `{target}`")]
    UnknownTarget { task: String, target: String },

    #[error("task `{task}` lists target `{target}` more than once")]
    RepeatedCandidate { task: String, target: String },
}

/// A configuration that loads but cannot serve every request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("no tasks configured; every start request will be rejected as unknown")]
    NoTasks,

    #[error("target `{0}` is swept but no task routes to it")]
    UnusedTarget(String),
}

/// Non-fatal findings on an already valid configuration.
pub fn config_warnings(config: &RouterConfig) -> Vec<ConfigWarning> {
    if config.tasks.is_empty() {
        return vec![ConfigWarning::NoTasks];
    }

    let routed: HashSet<&str> = config
        .tasks
        .iter()
        .flat_map(|t| std::iter::once(&t.route.primary).chain(&t.route.fallbacks))
        .map(String::as_str)
        .collect();

    config
        .targets
        .iter()
        .filter(|t| !routed.contains(t.as_str()))
        .map(|t| ConfigWarning::UnusedTarget(t.clone()))
        .collect()
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidUpstreamUrl(
            config.upstream.base_url.clone(),
        )),
    }

    let health = &config.health_check;
    for (name, value) in [
        ("interval_ms", health.interval_ms),
        ("max_ok_ms", health.max_ok_ms),
        ("probe_timeout_ms", health.probe_timeout_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration(name));
        }
    }

    if config.targets.is_empty() {
        errors.push(ValidationError::NoTargets);
    }
    if config.targets.iter().any(|t| t.trim().is_empty()) {
        errors.push(ValidationError::BlankTarget);
    }

    let known: HashSet<&str> = config.targets.iter().map(String::as_str).collect();
    let mut seen_tasks = HashSet::new();

    for task in &config.tasks {
        if task.id.trim().is_empty() {
            errors.push(ValidationError::BlankTaskId);
        } else if !seen_tasks.insert(task.id.as_str()) {
            errors.push(ValidationError::DuplicateTask(task.id.clone()));
        }

        let mut seen_candidates = HashSet::new();
        for target in task.route.candidates() {
            if !known.contains(target.as_str()) {
                errors.push(ValidationError::UnknownTarget {
                    task: task.id.clone(),
                    target: target.clone(),
                });
            }
            if !seen_candidates.insert(target.clone()) {
                errors.push(ValidationError::RepeatedCandidate {
                    task: task.id.clone(),
                    target,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TaskConfig;
    use crate::routing::RoutingSpec;

    fn task(id: &str, primary: &str, fallbacks: &[&str]) -> TaskConfig {
        TaskConfig {
            id: id.to_string(),
            prompt: String::new(),
            route: RoutingSpec::new(primary, fallbacks.iter().map(|f| f.to_string()).collect()),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&RouterConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = RouterConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.base_url = "ftp://example.com".into();
        config.health_check.max_ok_ms = 0;
        config.targets.clear();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidBindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::InvalidUpstreamUrl("ftp://example.com".into())));
        assert!(errors.contains(&ValidationError::ZeroDuration("max_ok_ms")));
        assert!(errors.contains(&ValidationError::NoTargets));
    }

    #[test]
    fn test_task_references() {
        let mut config = RouterConfig::default();
        config.tasks = vec![
            task("a", "gpt-4o", &["gpt-4o-mini"]),
            task("a", "gpt-4o", &[]),
            task("b", "llama", &["gpt-4o", "gpt-4o"]),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateTask("a".into()),
                ValidationError::UnknownTarget { task: "b".into(), target: "llama".into() },
                ValidationError::RepeatedCandidate { task: "b".into(), target: "gpt-4o".into() },
            ]
        );
    }

    #[test]
    fn test_zero_staleness_is_allowed() {
        // Every selection of the primary re-probes.
        let mut config = RouterConfig::default();
        config.health_check.stale_after_ms = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_warnings() {
        let mut config = RouterConfig::default();
        assert_eq!(config_warnings(&config), vec![ConfigWarning::NoTasks]);

        config.tasks.push(task("sim", "gpt-4o-mini", &["gpt-4o"]));
        assert_eq!(
            config_warnings(&config),
            vec![ConfigWarning::UnusedTarget("claude-3-5-sonnet".into())]
        );

        config.tasks.push(task("design", "claude-3-5-sonnet", &[]));
        assert!(config_warnings(&config).is_empty());
    }
}
