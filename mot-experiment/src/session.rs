use crate::config::ExperimentConfig;
use crate::data::{DataRow, output_path};
use crate::error::Result;
use crate::response::display_instructions;
use crate::trial::Trial;
use log::{debug, info};
use mot_core::{Canvas, InputSource, SessionPhase, TrialOutcome};
use mot_timing::Timer;
use rand::Rng;
use std::path::PathBuf;

pub const WAIT_MESSAGE: &str = "Please wait until the experimenter has cleared you to start.";
pub const DEBRIEF_MESSAGE: &str =
    "Thank you for your participation. Please see the experimenter for your debriefing.";

/// Runs the trial sequence for one subject and writes their data row.
pub struct Session {
    pub subject_id: String,
    pub date: String,
    pub config: ExperimentConfig,
    phase: SessionPhase,
    outcomes: Vec<TrialOutcome>,
}

impl Session {
    pub fn new(subject_id: impl Into<String>, date: impl Into<String>, config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            subject_id: subject_id.into(),
            date: date.into(),
            config,
            phase: SessionPhase::default(),
            outcomes: Vec::new(),
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn outcomes(&self) -> &[TrialOutcome] {
        &self.outcomes
    }

    pub fn output_path(&self) -> PathBuf {
        output_path(&self.config, &self.subject_id, &self.date)
    }

    pub fn instructions(&self) -> String {
        format!(
            "Keep your eyes on the cross while you count how many times the {} {} bounce.\n\nPress any key when you're ready to start.",
            self.config.attended_color, self.config.attended_shape
        )
    }

    fn advance(&mut self) {
        if let Some(next) = self.phase.next() {
            debug!("phase {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
    }

    /// The accumulated row; complete once every trial has run.
    pub fn data_row(&self) -> DataRow {
        let mut row = DataRow::for_session(&self.config);
        for outcome in &self.outcomes {
            row.push_outcome(outcome);
        }
        row
    }

    /// Runs every trial, the last one as the probe, then saves and debriefs.
    /// Returns the path of the written file.
    pub fn run<S, T, R>(&mut self, surface: &mut S, timer: &mut T, rng: &mut R) -> Result<PathBuf>
    where
        S: Canvas + InputSource + ?Sized,
        T: Timer + ?Sized,
        R: Rng + ?Sized,
    {
        info!(
            "session for subject {} ({} trials, attending {} {})",
            self.subject_id, self.config.num_trials, self.config.attended_color, self.config.attended_shape
        );
        display_instructions(surface, WAIT_MESSAGE)?;

        let config = self.config.clone();
        for id in 0..config.num_trials {
            self.advance();
            display_instructions(surface, &self.instructions())?;
            self.advance();
            let is_probe = id + 1 == config.num_trials;
            let outcome = Trial::new(id, is_probe, &config).execute(surface, timer, rng)?;
            if let Ok(json) = serde_json::to_string(&outcome) {
                debug!("outcome {json}");
            }
            self.outcomes.push(outcome);
        }

        self.phase = SessionPhase::Saving;
        let path = self.output_path();
        self.data_row().write_to(&path)?;
        info!("Data saved successfully.");
        info!("wrote {}", path.display());

        self.advance();
        display_instructions(surface, DEBRIEF_MESSAGE)?;
        self.advance();
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::error::ExperimentError;

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = ExperimentConfig {
            num_trials: 0,
            ..ExperimentConfig::default()
        };
        let err = Session::new("s01", "2026_Oct_18_1432", config).err();
        assert!(matches!(
            err,
            Some(ExperimentError::Config(ConfigError::NotPositive("num_trials")))
        ));
    }

    #[test]
    fn instructions_name_the_attended_set() {
        let session = Session::new("s01", "d", ExperimentConfig::default()).unwrap();
        assert!(session.instructions().starts_with(
            "Keep your eyes on the cross while you count how many times the white shapes bounce."
        ));
        assert_eq!(session.phase(), SessionPhase::Waiting);
    }

    #[test]
    fn output_lands_in_configured_directory() {
        let config = ExperimentConfig {
            output_dir: PathBuf::from("/data"),
            ..ExperimentConfig::default()
        };
        let session = Session::new("s01", "2026_Oct_18_1432", config).unwrap();
        assert_eq!(
            session.output_path(),
            PathBuf::from("/data/s01_2026_Oct_18_1432_ib_data.csv")
        );
    }
}
