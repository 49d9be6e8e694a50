use std::fmt;
use std::time::Duration;

/// The outcome of one scenario execution.
#[derive(Debug)]
pub struct ExecutionRecord {
    pub name: String,
    pub description: String,
    pub duration: Duration,
    /// `None` for a pass. The error carries the full failure chain.
    pub error: Option<anyhow::Error>,
}

impl ExecutionRecord {
    pub fn is_pass(&self) -> bool {
        self.error.is_none()
    }
}

/// The aggregated outcome of a run, split into passes and failures.
///
/// Both partitions are sorted by scenario name so the rendered report is
/// stable regardless of completion order.
#[derive(Debug)]
pub struct RunReport {
    passed: Vec<ExecutionRecord>,
    failed: Vec<ExecutionRecord>,
}

impl RunReport {
    pub fn from_records(records: Vec<ExecutionRecord>) -> Self {
        let (passed, failed): (Vec<_>, Vec<_>) =
            records.into_iter().partition(ExecutionRecord::is_pass);
        let mut report = Self { passed, failed };
        report.passed.sort_by(|a, b| a.name.cmp(&b.name));
        report.failed.sort_by(|a, b| a.name.cmp(&b.name));
        report
    }

    pub fn passed(&self) -> &[ExecutionRecord] {
        &self.passed
    }

    pub fn failed(&self) -> &[ExecutionRecord] {
        &self.failed
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    /// A run with no failures is a success, including a run that matched no
    /// scenarios at all.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "====== {} scenario(s) passed", self.passed.len())?;
        for record in &self.passed {
            writeln!(f, "-----\t{} ({:.2?})", record.name, record.duration)?;
        }
        if !self.failed.is_empty() {
            writeln!(f, "====== {} scenario(s) failed", self.failed.len())?;
            for record in &self.failed {
                writeln!(f, ">>>>>\t{} ({:.2?})", record.name, record.duration)?;
                if !record.description.is_empty() {
                    writeln!(f, "\t{}", record.description)?;
                }
                if let Some(error) = &record.error {
                    writeln!(f, "\t{error:#}")?;
                }
            }
        }
        Ok(())
    }
}
