//! JSON-lines output: one line per emission, then one per call result.
use crate::script::CallReport;
use cellbridge_context::Emission;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OutputLine<'a> {
    Emission {
        message_type: &'static str,
        #[serde(flatten)]
        emission: &'a Emission,
    },
    Result {
        #[serde(flatten)]
        report: &'a CallReport,
    },
}

impl<'a> OutputLine<'a> {
    pub fn emission(emission: &'a Emission) -> Self {
        OutputLine::Emission {
            message_type: emission.kind.message_type(),
            emission,
        }
    }

    pub fn result(report: &'a CallReport) -> Self {
        OutputLine::Result { report }
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
