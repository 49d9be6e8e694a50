use std::collections::BTreeMap;
use std::sync::Arc;

use crate::scenario::Scenario;

/// The set of scenarios available to a run, keyed by name.
///
/// Registering two scenarios under the same name keeps the later one. The
/// iteration order of selections follows the name ordering of the map.
#[derive(Default)]
pub struct ScenarioRegistry {
    scenarios: BTreeMap<String, Arc<dyn Scenario>>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, scenario: Arc<dyn Scenario>) {
        let name = scenario.name().to_string();
        if self.scenarios.insert(name.clone(), scenario).is_some() {
            log::warn!("Scenario '{name}' registered more than once, keeping the latest");
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.scenarios.keys().map(String::as_str).collect()
    }

    /// Select the scenarios whose name matches the given filter expression.
    ///
    /// The filter is a regular expression matched anywhere in the name, so an
    /// empty filter selects every registered scenario. An invalid expression
    /// is an error rather than an empty selection.
    pub fn select(&self, filter: &str) -> Result<Vec<Arc<dyn Scenario>>, regex::Error> {
        let matcher = regex::Regex::new(filter)?;
        Ok(self
            .scenarios
            .values()
            .filter(|scenario| matcher.is_match(scenario.name()))
            .cloned()
            .collect())
    }
}
