use serde::Serialize;
use serde_json::Value;

/// Apology returned when the model's output cannot be used.
pub const FALLBACK_DESCRIPTION: &str =
    "Failed to parse the assistant response. Please try a different query.";

/// Raw text returned by the completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    raw_text: String,
}

impl CompletionResult {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }
}

/// A chart specification that passed validation, plus its description.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartAnswer {
    chart_spec: Value,
    description: String,
}

impl ChartAnswer {
    pub(crate) fn new(chart_spec: Value, description: String) -> Self {
        Self {
            chart_spec,
            description,
        }
    }

    pub fn chart_spec(&self) -> &Value {
        &self.chart_spec
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Body of a successful generate-chart response.
///
/// `chart_spec` is `None` when the model's answer was rejected and the
/// description carries an apology instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartReply {
    #[serde(rename = "chartSpec")]
    pub chart_spec: Option<Value>,
    pub description: String,
}

impl ChartReply {
    pub fn fallback() -> Self {
        Self {
            chart_spec: None,
            description: FALLBACK_DESCRIPTION.to_string(),
        }
    }

    pub fn has_chart(&self) -> bool {
        self.chart_spec.is_some()
    }
}

impl From<ChartAnswer> for ChartReply {
    fn from(answer: ChartAnswer) -> Self {
        Self {
            chart_spec: Some(answer.chart_spec),
            description: answer.description,
        }
    }
}
