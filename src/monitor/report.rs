use super::TimerState;
use crate::{config::ReportConfig, error::Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Serializable view of one registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub label: String,
    #[serde(flatten)]
    pub state: RecordState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RecordState {
    Pending,
    Closed { seconds: f64 },
}

impl TimingRecord {
    pub(crate) fn new(label: &str, state: &TimerState) -> Self {
        let state = match state {
            TimerState::Pending { .. } => RecordState::Pending,
            TimerState::Closed { elapsed } => RecordState::Closed {
                seconds: elapsed.as_secs_f64(),
            },
        };

        Self {
            label: label.to_string(),
            state,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, RecordState::Pending)
    }

    #[must_use]
    pub fn seconds(&self) -> Option<f64> {
        match self.state {
            RecordState::Pending => None,
            RecordState::Closed { seconds } => Some(seconds),
        }
    }
}

/// Outcome of writing a report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    /// Entry lines written, the header is not counted.
    pub lines: usize,
    /// Labels that were begun but not ended yet.
    pub pending: Vec<String>,
}

fn format_value(record: &TimingRecord, config: &ReportConfig) -> String {
    match record.state {
        RecordState::Pending => config.pending_marker.clone(),
        RecordState::Closed { seconds } if config.unit.is_empty() => {
            format!("{:.*}", config.precision, seconds)
        }
        RecordState::Closed { seconds } => {
            format!("{:.*} {}", config.precision, seconds, config.unit)
        }
    }
}

fn lines<'a>(
    records: &'a [TimingRecord],
    config: &'a ReportConfig,
) -> impl Iterator<Item = String> + 'a {
    config.header.iter().cloned().chain(records.iter().map(move |record| {
        format!(
            "{}{}: {}",
            config.prefix,
            record.label,
            format_value(record, config)
        )
    }))
}

pub(super) fn render(records: &[TimingRecord], config: &ReportConfig) -> String {
    lines(records, config).fold(String::new(), |mut out, line| {
        out.push_str(&line);
        out.push('\n');
        out
    })
}

pub(super) fn write<W: Write>(
    records: &[TimingRecord],
    config: &ReportConfig,
    writer: &mut W,
) -> Result<ReportSummary> {
    for line in lines(records, config) {
        writeln!(writer, "{line}")?;
    }

    writer.flush()?;

    Ok(ReportSummary {
        lines: records.len(),
        pending: records
            .iter()
            .filter(|record| record.is_pending())
            .map(|record| record.label.clone())
            .collect(),
    })
}
