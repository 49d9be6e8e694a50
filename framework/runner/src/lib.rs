mod registry;
mod report;
mod run;
mod scenario;

pub mod prelude {
    pub use crate::registry::ScenarioRegistry;
    pub use crate::report::{ExecutionRecord, RunReport};
    pub use crate::run::run;
    pub use crate::scenario::Scenario;
}
