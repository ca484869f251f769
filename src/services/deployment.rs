//! Deployment service - the end-to-end pipeline
//!
//! Raw context → parameters → tags → stack graph → orchestrated run →
//! deployment plan. Configuration and graph problems surface before any
//! stack is constructed.

use tracing::info;

use crate::config::{resolve, EnvironmentContext, RawContext};
use crate::domain::plan::DeploymentPlan;
use crate::domain::tags::derive_tags;
use crate::domain::topology::build_graph;
use crate::error::ProvisionError;
use crate::infrastructure::StackConstructor;
use crate::services::orchestrator::{CancellationFlag, StackOrchestrator};

/// Options for a single synth/deploy run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub cancellation: CancellationFlag,
    pub emit_events: bool,
}

/// Run the full pipeline and return the synthesized plan.
pub async fn synthesize(
    raw: &RawContext,
    env: &EnvironmentContext,
    constructor: &dyn StackConstructor,
    options: RunOptions,
) -> Result<DeploymentPlan, ProvisionError> {
    let params = resolve(raw)?;
    let tags = derive_tags(&params);
    let graph = build_graph()?;

    info!(
        "Deployment {} (owner {}) in {}",
        params.deployment_id(),
        params.owner(),
        env.region
    );

    let outcome = StackOrchestrator::new(constructor)
        .with_cancellation(options.cancellation)
        .with_events(options.emit_events)
        .execute(&graph, &params, &tags, env)
        .await?;

    Ok(DeploymentPlan::assemble(
        &params,
        &tags,
        env,
        &graph,
        &outcome.order,
        &outcome.registry,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registry::StackOutputs;
    use crate::error::ConfigError;
    use crate::infrastructure::{ConstructRequest, SynthConstructor};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn raw(pairs: &[(&str, &str)]) -> RawContext {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Some(v.to_string())))
            .collect()
    }

    /// Wraps the synth constructor, recording calls and optionally failing one stack
    struct Probe {
        fail_on: Option<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl Probe {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                fail_on,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StackConstructor for Probe {
        async fn construct(&self, request: ConstructRequest<'_>) -> anyhow::Result<StackOutputs> {
            self.calls
                .lock()
                .unwrap()
                .push(request.stack.name().to_string());
            if self.fail_on == Some(request.stack.name()) {
                anyhow::bail!("database quota exceeded");
            }
            SynthConstructor::new().construct(request).await
        }
    }

    #[tokio::test]
    async fn test_scenario_full_run() {
        let probe = Probe::new(None);
        let env = EnvironmentContext::resolve(None, None);

        let plan = synthesize(
            &raw(&[("deployment_id", "lab01"), ("owner", "alice")]),
            &env,
            &probe,
            RunOptions::default(),
        )
        .await
        .unwrap();

        let expected = vec!["network", "security", "storage", "data", "secrets", "compute"];
        assert_eq!(plan.stack_names(), expected);
        assert_eq!(*probe.calls.lock().unwrap(), expected);

        assert_eq!(plan.tags.len(), 3);
        assert_eq!(plan.tags.get("Project"), Some("HRAppLab"));
        assert_eq!(plan.tags.get("DeploymentID"), Some("lab01"));
        assert_eq!(plan.tags.get("Owner"), Some("alice"));

        // Every resource carries the same tag set
        for stack in &plan.stacks {
            for handle in stack.outputs.values() {
                let value = handle.as_value();
                let resources = value.as_array().cloned().unwrap_or_else(|| vec![value.clone()]);
                for resource in resources {
                    assert_eq!(resource["tags"]["Owner"], "alice", "{}", stack.name);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_scenario_missing_owner() {
        let probe = Probe::new(None);
        let env = EnvironmentContext::resolve(None, None);

        let err = synthesize(
            &raw(&[("deployment_id", "lab01")]),
            &env,
            &probe,
            RunOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::Config(ConfigError::MissingField { ref field }) if field == "owner"
        ));
        assert!(probe.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scenario_data_failure() {
        let probe = Probe::new(Some("data"));
        let env = EnvironmentContext::resolve(None, None);

        let err = synthesize(
            &raw(&[("deployment_id", "lab01"), ("owner", "alice")]),
            &env,
            &probe,
            RunOptions::default(),
        )
        .await
        .unwrap_err();

        match err {
            ProvisionError::Construction(e) => {
                assert_eq!(e.stack, "data");
                assert_eq!(e.completed, vec!["network", "security", "storage"]);
                assert!(e.reason.contains("quota"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let calls = probe.calls.lock().unwrap().clone();
        assert!(!calls.contains(&"secrets".to_string()));
        assert!(!calls.contains(&"compute".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_cidr_rejected_before_construction() {
        let probe = Probe::new(None);
        let env = EnvironmentContext::resolve(None, None);

        let err = synthesize(
            &raw(&[
                ("deployment_id", "lab01"),
                ("owner", "alice"),
                ("allowed_ingress_cidr", "10.0.0.300/8"),
            ]),
            &env,
            &probe,
            RunOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "allowed_ingress_cidr"
        ));
        assert!(probe.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wiring_visible_in_plan() {
        let env = EnvironmentContext::resolve(None, Some("eu-west-1".into()));
        let plan = synthesize(
            &raw(&[
                ("deployment_id", "lab01"),
                ("owner", "alice"),
                ("db_multi_az", "true"),
            ]),
            &env,
            &SynthConstructor::new(),
            RunOptions::default(),
        )
        .await
        .unwrap();

        let data = plan.stacks.iter().find(|s| s.name == "data").unwrap();
        let rds = data.outputs["rds_instance"].as_value();
        assert_eq!(rds["properties"]["multi_az"], true);
        assert_eq!(rds["properties"]["vpc"], "hrapp-lab01-network/Vpc");
        assert_eq!(rds["region"], "eu-west-1");
    }
}
