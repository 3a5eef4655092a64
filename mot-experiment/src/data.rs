//! The single wide output row and its CSV file.

use crate::config::ExperimentConfig;
use crate::error::{ExperimentError, Result};
use chrono::Local;
use mot_core::TrialOutcome;
use std::io;
use std::path::{Path, PathBuf};

/// Session timestamp format, e.g. `2026_Oct_18_1432`.
pub const DATE_FORMAT: &str = "%Y_%b_%d_%H%M";

/// Local time now, in `DATE_FORMAT`.
pub fn session_date() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// `<subject>_<date>_ib_data.csv`
pub fn filename(subject_id: &str, date: &str) -> String {
    format!("{subject_id}_{date}_ib_data.csv")
}

pub fn output_path(config: &ExperimentConfig, subject_id: &str, date: &str) -> PathBuf {
    config.output_dir.join(filename(subject_id, date))
}

/// Ordered column/value pairs accumulated over a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataRow {
    columns: Vec<(String, String)>,
}

impl DataRow {
    /// Starts a row with the session-level parameters.
    pub fn for_session(config: &ExperimentConfig) -> Self {
        let mut row = Self::default();
        row.push("attended_color", config.attended_color);
        row.push("attended_shape", &config.attended_shape);
        row.push("ib_color", config.ib_color);
        row.push("ib_shape", config.ib_shape);
        row
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl ToString) {
        self.columns.push((column.into(), value.to_string()));
    }

    /// Appends `bounces_i, count_i` and, for the probe trial, the three
    /// questionnaire answers.
    pub fn push_outcome(&mut self, outcome: &TrialOutcome) {
        let i = outcome.trial_id;
        self.push(format!("bounces_{i}"), outcome.bounces);
        self.push(format!("count_{i}"), outcome.count);
        if let Some(report) = &outcome.probe {
            self.push("reported_noticing", &report.noticed);
            self.push("reported_color", &report.color);
            self.push("reported_shape", &report.shape);
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(_, v)| v.as_str())
    }

    fn write_records<W: io::Write>(&self, writer: &mut csv::Writer<W>) -> csv::Result<()> {
        writer.write_record(self.header())?;
        writer.write_record(self.values())?;
        writer.flush()?;
        Ok(())
    }

    /// Header line and value line.
    pub fn to_csv(&self) -> csv::Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        self.write_records(&mut writer)?;
        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        csv::Writer::from_path(path)
            .and_then(|mut writer| self.write_records(&mut writer))
            .map_err(|source| ExperimentError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}
