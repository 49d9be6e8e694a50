use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use nodeprobe_core::prelude::{DeadlineError, ScenarioContext, ShutdownHandle};
use nodeprobe_session::prelude::ClusterSession;

use crate::registry::ScenarioRegistry;
use crate::report::{ExecutionRecord, RunReport};

/// Run every scenario matching the filter concurrently and collect a report.
///
/// Each scenario gets its own task, its own context with a fresh deadline,
/// and its own shutdown listener. A scenario that outlives its deadline is
/// cancelled by dropping its future, so a wait stuck inside a session call
/// cannot hold the run open. One record is produced per selected scenario,
/// with a record synthesised for any scenario whose task panicked.
pub async fn run(
    registry: &ScenarioRegistry,
    filter: &str,
    timeout: Duration,
    session: Arc<ClusterSession>,
    shutdown: &ShutdownHandle,
) -> anyhow::Result<RunReport> {
    let scenarios = registry
        .select(filter)
        .with_context(|| format!("invalid scenario filter '{filter}'"))?;

    log::info!(
        "Running {} scenario(s) against node {}",
        scenarios.len(),
        session.node_name()
    );

    let begin = Instant::now();
    let mut handles = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let name = scenario.name().to_string();
        let description = scenario.description().to_string();
        let session = session.clone();
        let listener = shutdown.new_listener();

        let handle = tokio::spawn(async move {
            log::info!("Starting scenario {}", scenario.name());
            let mut ctx = ScenarioContext::new(timeout, listener);
            let deadline = ctx.deadline();
            let begin = Instant::now();
            let outcome = match tokio::time::timeout_at(deadline, scenario.run(&mut ctx, session))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(anyhow::Error::new(DeadlineError::new(timeout))),
            };
            let duration = begin.elapsed();

            match &outcome {
                Ok(()) => log::info!("Scenario {} passed in {:.2?}", scenario.name(), duration),
                Err(error) => {
                    log::error!("Scenario {} failed: {:#}", scenario.name(), error);
                }
            }

            ExecutionRecord {
                name: scenario.name().to_string(),
                description: scenario.description().to_string(),
                duration,
                error: outcome.err(),
            }
        });
        handles.push((name, description, handle));
    }

    let mut records = Vec::with_capacity(handles.len());
    for (name, description, handle) in handles {
        match handle.await {
            Ok(record) => records.push(record),
            Err(error) => records.push(ExecutionRecord {
                name,
                description,
                duration: begin.elapsed(),
                error: Some(anyhow::Error::new(error).context("scenario task aborted")),
            }),
        }
    }

    Ok(RunReport::from_records(records))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use nodeprobe_core::prelude::CancellationError;
    use pretty_assertions::assert_eq;

    use crate::scenario::Scenario;

    use super::*;

    struct StaticScenario {
        name: &'static str,
        delay: Duration,
        outcome: Result<(), &'static str>,
    }

    impl StaticScenario {
        fn passing(name: &'static str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name,
                delay,
                outcome: Ok(()),
            })
        }

        fn failing(name: &'static str, message: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                delay: Duration::ZERO,
                outcome: Err(message),
            })
        }
    }

    #[async_trait]
    impl Scenario for StaticScenario {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "a scenario used in orchestrator tests"
        }

        async fn run(
            &self,
            _ctx: &mut ScenarioContext,
            _session: Arc<ClusterSession>,
        ) -> anyhow::Result<()> {
            tokio::time::sleep(self.delay).await;
            self.outcome.map_err(|message| anyhow::anyhow!(message))
        }
    }

    struct CancellationAwareScenario;

    #[async_trait]
    impl Scenario for CancellationAwareScenario {
        fn name(&self) -> &str {
            "cancellation-aware"
        }

        async fn run(
            &self,
            ctx: &mut ScenarioContext,
            _session: Arc<ClusterSession>,
        ) -> anyhow::Result<()> {
            Err(ctx.cancelled().await.into())
        }
    }

    struct PanickingScenario;

    #[async_trait]
    impl Scenario for PanickingScenario {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn run(
            &self,
            _ctx: &mut ScenarioContext,
            _session: Arc<ClusterSession>,
        ) -> anyhow::Result<()> {
            panic!("scenario crashed")
        }
    }

    fn session() -> Arc<ClusterSession> {
        let config = kube::Config::new("http://127.0.0.1:8001".parse().expect("static url"));
        let client = kube::Client::try_from(config).expect("client from local config");
        Arc::new(ClusterSession::new(client, "virtual-kubelet"))
    }

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn every_selected_scenario_yields_one_record() {
        let mut registry = ScenarioRegistry::new();
        registry.add(StaticScenario::passing("env100", Duration::from_millis(200)));
        registry.add(StaticScenario::passing("emptydir", Duration::from_millis(50)));
        registry.add(StaticScenario::failing("request-uri-too-large", "request entity too large"));
        let shutdown = ShutdownHandle::new();

        let report = run(&registry, "", MINUTE, session(), &shutdown)
            .await
            .expect("run should produce a report");

        assert_eq!(report.total(), 3);
        assert_eq!(report.failed().len(), 1);
        assert_eq!(report.failed()[0].name, "request-uri-too-large");
        assert!(!report.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn report_order_is_by_name_not_completion() {
        let mut registry = ScenarioRegistry::new();
        registry.add(StaticScenario::passing("slow-but-first", Duration::from_secs(5)));
        registry.add(StaticScenario::passing("zesty-and-quick", Duration::ZERO));
        let shutdown = ShutdownHandle::new();

        let report = run(&registry, "", MINUTE, session(), &shutdown)
            .await
            .expect("run should produce a report");

        let names: Vec<_> = report.passed().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["slow-but-first", "zesty-and-quick"]);
    }

    #[tokio::test(start_paused = true)]
    async fn filter_narrows_the_run() {
        let mut registry = ScenarioRegistry::new();
        registry.add(StaticScenario::passing("env100", Duration::ZERO));
        registry.add(StaticScenario::failing("emptydir", "should not run"));
        let shutdown = ShutdownHandle::new();

        let report = run(&registry, "^env100$", MINUTE, session(), &shutdown)
            .await
            .expect("run should produce a report");

        assert_eq!(report.total(), 1);
        assert!(report.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_filter_fails_the_whole_run() {
        let registry = ScenarioRegistry::new();
        let shutdown = ShutdownHandle::new();

        let err = run(&registry, "(unclosed", MINUTE, session(), &shutdown)
            .await
            .expect_err("an invalid filter must not run anything");
        assert!(err.to_string().contains("invalid scenario filter"));
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_outliving_its_deadline_is_recorded_as_failed() {
        let mut registry = ScenarioRegistry::new();
        registry.add(StaticScenario::passing("hung", Duration::from_secs(3600)));
        let shutdown = ShutdownHandle::new();

        let report = run(&registry, "", Duration::from_secs(5), session(), &shutdown)
            .await
            .expect("run should produce a report");

        assert_eq!(report.failed().len(), 1);
        let error = report.failed()[0].error.as_ref().expect("failure must carry an error");
        assert!(error.is::<DeadlineError>());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_a_waiting_scenario() {
        let mut registry = ScenarioRegistry::new();
        registry.add(Arc::new(CancellationAwareScenario));
        let shutdown = ShutdownHandle::new();

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.shutdown();
        });

        let report = run(&registry, "", MINUTE, session(), &shutdown)
            .await
            .expect("run should produce a report");

        assert_eq!(report.failed().len(), 1);
        let error = report.failed()[0].error.as_ref().expect("failure must carry an error");
        assert!(matches!(
            error.downcast_ref::<CancellationError>(),
            Some(CancellationError::Shutdown(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_scenario_still_yields_a_record() {
        let mut registry = ScenarioRegistry::new();
        registry.add(Arc::new(PanickingScenario));
        registry.add(StaticScenario::passing("env100", Duration::ZERO));
        let shutdown = ShutdownHandle::new();

        let report = run(&registry, "", MINUTE, session(), &shutdown)
            .await
            .expect("run should produce a report");

        assert_eq!(report.total(), 2);
        assert_eq!(report.failed().len(), 1);
        assert_eq!(report.failed()[0].name, "panicking");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_selection_is_a_vacuous_success() {
        let registry = ScenarioRegistry::new();
        let shutdown = ShutdownHandle::new();

        let report = run(&registry, "", MINUTE, session(), &shutdown)
            .await
            .expect("run should produce a report");

        assert_eq!(report.total(), 0);
        assert!(report.is_success());
    }
}
