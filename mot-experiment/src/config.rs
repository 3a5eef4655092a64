use crate::object::TrackedShape;
use mot_core::{NamedColor, ShapeKind};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} lists {got} entries but num_objects is {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("{0} must not be negative")]
    Negative(&'static str),
    #[error("{field} gives {value}s, which is not a usable duration")]
    BadDuration { field: &'static str, value: f64 },
    #[error("arena {width}x{height} is too small for objects of size {size}")]
    ArenaTooSmall { width: f32, height: f32, size: f32 },
}

/// Fixed parameters for one session. Built once at start and passed down.
///
/// Deserialising fills missing fields from `Default`, so a config file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Requested window size; ignored when `fullscreen` takes the monitor.
    pub window_size: [u32; 2],
    pub fullscreen: bool,
    /// Window fill, also used for the probe-trial blinders.
    pub window_color: NamedColor,
    pub background_color: NamedColor,
    pub fixation_color: NamedColor,
    pub arena_size: [f32; 2],
    pub num_objects: usize,
    pub object_colors: Vec<NamedColor>,
    pub object_shapes: Vec<TrackedShape>,
    pub object_size: f32,
    pub trial_duration_s: f64,
    pub num_trials: usize,
    pub attended_color: NamedColor,
    /// Label used in prompts for the attended set ("shapes").
    pub attended_shape: String,
    pub ib_color: NamedColor,
    pub ib_shape: ShapeKind,
    /// Pause between setup and animation.
    pub pre_trial_pause_s: f64,
    /// Added to a third of the trial duration to get the probe onset.
    pub ib_onset_offset_s: f64,
    pub output_dir: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            window_size: [1280, 800],
            fullscreen: true,
            window_color: NamedColor::White,
            background_color: NamedColor::Gray,
            fixation_color: NamedColor::DarkBlue,
            arena_size: [700.0, 700.0],
            num_objects: 8,
            object_colors: [NamedColor::White, NamedColor::Black].repeat(4),
            object_shapes: [[TrackedShape::Circle; 4], [TrackedShape::Square; 4]].concat(),
            object_size: 40.0,
            trial_duration_s: 12.0,
            num_trials: 3,
            attended_color: NamedColor::White,
            attended_shape: "shapes".to_string(),
            ib_color: NamedColor::Purple,
            ib_shape: ShapeKind::Cross,
            pre_trial_pause_s: 1.0,
            ib_onset_offset_s: 1.0,
            output_dir: PathBuf::from("."),
        }
    }
}

impl ExperimentConfig {
    /// Picks the attended colour uniformly from the object colour list.
    pub fn with_random_attended_color<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        if let Some(color) = self.object_colors.choose(rng) {
            self.attended_color = *color;
        }
        self
    }

    pub fn trial_duration(&self) -> Result<Duration, ConfigError> {
        seconds("trial_duration_s", self.trial_duration_s)
    }

    pub fn pre_trial_pause(&self) -> Result<Duration, ConfigError> {
        seconds("pre_trial_pause_s", self.pre_trial_pause_s)
    }

    /// Elapsed time at which the unexpected object starts moving.
    pub fn ib_onset(&self) -> Result<Duration, ConfigError> {
        seconds(
            "ib_onset_offset_s",
            self.trial_duration_s / 3.0 + self.ib_onset_offset_s,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_objects == 0 {
            return Err(ConfigError::NotPositive("num_objects"));
        }
        if self.num_trials == 0 {
            return Err(ConfigError::NotPositive("num_trials"));
        }
        if !(self.trial_duration_s > 0.0) {
            return Err(ConfigError::NotPositive("trial_duration_s"));
        }
        if !(self.object_size > 0.0) {
            return Err(ConfigError::NotPositive("object_size"));
        }
        if self.pre_trial_pause_s < 0.0 {
            return Err(ConfigError::Negative("pre_trial_pause_s"));
        }
        self.trial_duration()?;
        self.pre_trial_pause()?;
        self.ib_onset()?;
        if self.object_colors.len() != self.num_objects {
            return Err(ConfigError::LengthMismatch {
                field: "object_colors",
                expected: self.num_objects,
                got: self.object_colors.len(),
            });
        }
        if self.object_shapes.len() != self.num_objects {
            return Err(ConfigError::LengthMismatch {
                field: "object_shapes",
                expected: self.num_objects,
                got: self.object_shapes.len(),
            });
        }
        let [width, height] = self.arena_size;
        // Spawning keeps two object sizes clear of every edge.
        if width <= 4.0 * self.object_size || height <= 4.0 * self.object_size {
            return Err(ConfigError::ArenaTooSmall {
                width,
                height,
                size: self.object_size,
            });
        }
        Ok(())
    }
}

/// Rejects NaN, infinities, negatives and values past `Duration::MAX`.
fn seconds(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::BadDuration { field, value })
}
