use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    pub timestamp_ms: u64,
    #[serde(rename = "timestampIso")]
    pub timestamp_iso: String,
    pub level: String,
    pub event: String,
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    pub details: Value,
}

impl StructuredLogLine {
    pub fn new(level: &str, event: &str, run_id: &str, details: Value) -> Self {
        Self {
            timestamp_ms: now_ms(),
            timestamp_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: level.to_string(),
            event: event.to_string(),
            run_id: run_id.to_string(),
            scenario: None,
            seed: None,
            tick: None,
            details,
        }
    }

    pub fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|error| {
            format!(
                r#"{{"level":"error","event":"log_serialize_failed","error":{:?}}}"#,
                error.to_string()
            )
        })
    }
}

/// Writes one JSON log line to stderr. Stdout stays reserved for results.
pub fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u64>,
    tick: Option<u64>,
    details: Value,
) {
    let mut line = StructuredLogLine::new(level, event, run_id, details);
    line.scenario = scenario.map(|value| value.to_string());
    line.seed = seed;
    line.tick = tick;
    eprintln!("{}", line.render());
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
