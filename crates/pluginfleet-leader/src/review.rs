//! Advisory annotation printed for every inbound result.
//!
//! A success is never taken at face value: it is accepted provisionally
//! until there is independent evidence. A failure is flagged for
//! investigation. Nothing here gates or retries anything.

use std::fmt;

use serde_json::Value;

use pluginfleet_core::{ResultMessage, ResultStatus, TaskId};

use crate::Correlation;

const RULE: &str = "============================================================";

/// Reviewer stance on a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    ProvisionallyTrusted,
    InvestigationRequired,
}

impl Verdict {
    pub fn of(status: ResultStatus) -> Self {
        match status {
            ResultStatus::Success => Verdict::ProvisionallyTrusted,
            ResultStatus::Failed => Verdict::InvestigationRequired,
        }
    }

    pub fn note(&self) -> &'static str {
        match self {
            Verdict::ProvisionallyTrusted => "[TRUST BUT VERIFY] Result accepted pending evidence",
            Verdict::InvestigationRequired => "[ALERT] Task failed - investigation required",
        }
    }
}

/// Printable review of one result.
#[derive(Debug, Clone)]
pub struct Review {
    pub task_id: TaskId,
    pub worker: String,
    pub status: ResultStatus,
    pub execution_time_ms: u64,
    pub correlation: Correlation,
    pub verdict: Verdict,
    /// Top-level payload fields, rendered.
    pub fields: Vec<(String, String)>,
}

impl Review {
    pub fn of(result: &ResultMessage, correlation: Correlation) -> Self {
        let fields = match &result.result {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| (key.clone(), render(value)))
                .collect(),
            Value::Null => Vec::new(),
            other => vec![("result".to_string(), render(other))],
        };

        Self {
            task_id: result.task_id.clone(),
            worker: result.worker.clone(),
            status: result.status,
            execution_time_ms: result.execution_time_ms,
            correlation,
            verdict: Verdict::of(result.status),
            fields,
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(f, "  RESULT FROM: {}", self.worker)?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "  Task ID: {}", self.task_id)?;
        writeln!(f, "  Status: {}", self.status)?;
        writeln!(f, "  Execution time: {} ms", self.execution_time_ms)?;
        match self.correlation {
            Correlation::Matched => {}
            Correlation::Stray => writeln!(f, "  Note: no pending task with this id")?,
            Correlation::Late => writeln!(f, "  Note: arrived after the task timed out")?,
        }

        if !self.fields.is_empty() {
            writeln!(f)?;
            writeln!(f, "  Result:")?;
            for (key, value) in &self.fields {
                writeln!(f, "    {}: {}", key, value)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "  SKEPTICAL REVIEW:")?;
        writeln!(f, "    {}", self.verdict.note())?;
        write!(f, "{}", RULE)
    }
}
