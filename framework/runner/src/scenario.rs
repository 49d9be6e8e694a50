use std::sync::Arc;

use async_trait::async_trait;
use nodeprobe_core::prelude::ScenarioContext;
use nodeprobe_session::prelude::ClusterSession;

/// A single acceptance check executed against the node under test.
///
/// Implementations are shared across the runner and must not keep mutable
/// state between runs. Everything a scenario needs from the cluster goes
/// through the session it is handed.
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Unique name of the scenario, used for filtering and reporting.
    fn name(&self) -> &str;

    /// One line printed under the scenario in the report when it fails.
    fn description(&self) -> &str {
        ""
    }

    /// Execute the scenario to completion.
    ///
    /// A scenario should pass the context down to every session call it
    /// makes, so that the run deadline and runner shutdown interrupt it
    /// wherever it happens to be waiting.
    async fn run(
        &self,
        ctx: &mut ScenarioContext,
        session: Arc<ClusterSession>,
    ) -> anyhow::Result<()>;
}
