use crate::config::ExperimentConfig;
use crate::error::{ExperimentError, Result};
use crate::object::{Bounds, DisplayObject, SceneObject, TrackedObject, UnexpectedObject, spawn_position};
use crate::response::{collect_choice, collect_count};
use log::{debug, info};
use mot_core::{
    Canvas, InputSource, Primitive, ProbeReport, StimulusId, TrialOutcome, TrialState, Vec2,
};
use mot_timing::Timer;
use rand::Rng;

const FIXATION_HALF_LENGTH: f32 = 18.0;
const FIXATION_WIDTH: f32 = 4.0;

pub const NOTICE_QUESTION: &str = "Did you notice any new objects on that trial that weren't there before?";
pub const SHAPE_QUESTION: &str = "What shape was it? Guess if you don't know.";
pub const COLOR_QUESTION: &str = "What color was it? Guess if you don't know.";

/// One tracking trial, optionally carrying the unexpected probe object.
pub struct Trial<'a> {
    pub id: usize,
    pub is_probe: bool,
    state: TrialState,
    config: &'a ExperimentConfig,
    objects: Vec<SceneObject>,
    decorations: Vec<StimulusId>,
    count: Option<u32>,
    probe_report: Option<ProbeReport>,
}

impl<'a> Trial<'a> {
    pub fn new(id: usize, is_probe: bool, config: &'a ExperimentConfig) -> Self {
        Self {
            id,
            is_probe,
            state: TrialState::Created,
            config,
            objects: Vec::new(),
            decorations: Vec::new(),
            count: None,
            probe_report: None,
        }
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn arena(&self) -> Bounds {
        Bounds::centered(Vec2::from(self.config.arena_size))
    }

    fn require(&self, expected: TrialState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ExperimentError::InvalidTransition {
                from: self.state,
                operation,
            })
        }
    }

    fn decorate<C: Canvas + ?Sized>(&mut self, canvas: &mut C, primitive: Primitive, pos: Vec2) {
        let id = canvas.add(primitive, pos);
        canvas.set_visible(id, true);
        self.decorations.push(id);
    }

    /// Builds the scene and presents it once.
    pub fn setup<C, R>(&mut self, canvas: &mut C, rng: &mut R) -> Result<()>
    where
        C: Canvas + ?Sized,
        R: Rng + ?Sized,
    {
        self.require(TrialState::Created, "setup")?;
        let config = self.config;
        let arena = self.arena();

        self.decorate(
            canvas,
            Primitive::Rectangle {
                width: arena.width(),
                height: arena.height(),
                color: config.background_color.rgba(),
            },
            Vec2::ZERO,
        );

        let size = config.object_size;
        self.objects = config
            .object_shapes
            .iter()
            .zip(&config.object_colors)
            .map(|(shape, color)| {
                let pos = spawn_position(rng, &arena, size);
                SceneObject::Tracked(TrackedObject::new(rng, *shape, *color, size, pos, &arena))
            })
            .collect();
        if self.is_probe {
            self.objects.push(SceneObject::Unexpected(UnexpectedObject::new(
                size,
                &arena,
                config.ib_color,
            )));
        }
        // Reverse creation puts the first object on top.
        for object in self.objects.iter_mut().rev() {
            object.create(canvas);
        }

        if self.is_probe {
            let window = canvas.size();
            let width = (window.x - arena.width()) / 2.0;
            if width > 0.0 {
                let x = arena.right + width / 2.0;
                for side in [-1.0, 1.0] {
                    self.decorate(
                        canvas,
                        Primitive::Rectangle {
                            width,
                            height: window.y,
                            color: config.window_color.rgba(),
                        },
                        Vec2::new(side * x, 0.0),
                    );
                }
            }
        }

        let color = config.fixation_color.rgba();
        for (start, end) in [
            (Vec2::new(0.0, -FIXATION_HALF_LENGTH), Vec2::new(0.0, FIXATION_HALF_LENGTH)),
            (Vec2::new(-FIXATION_HALF_LENGTH, 0.0), Vec2::new(FIXATION_HALF_LENGTH, 0.0)),
        ] {
            self.decorate(
                canvas,
                Primitive::Line {
                    start,
                    end,
                    width: FIXATION_WIDTH,
                    color,
                },
                Vec2::ZERO,
            );
        }

        debug!(
            "trial {} set up with {} objects (probe: {})",
            self.id,
            self.objects.len(),
            self.is_probe
        );
        canvas.flip()?;
        self.state = TrialState::Setup;
        Ok(())
    }

    /// Animates until the trial duration has elapsed on `timer`.
    ///
    /// The clock is read once per frame and the loop ends on the first read
    /// at or past the duration, so the frame count follows the display rate.
    pub fn run<C, T, R>(&mut self, canvas: &mut C, timer: &mut T, rng: &mut R) -> Result<()>
    where
        C: Canvas + ?Sized,
        T: Timer + ?Sized,
        R: Rng + ?Sized,
    {
        self.require(TrialState::Setup, "run")?;
        let duration = self.config.trial_duration()?;
        let onset = self.config.ib_onset()?;
        self.state = TrialState::Running;

        timer.reset_frames();
        let start = timer.now();
        let mut last = start;
        loop {
            let now = timer.now();
            let elapsed = now.saturating_sub(start);
            if elapsed >= duration {
                break;
            }
            for object in &mut self.objects {
                if object.is_unexpected() && elapsed < onset {
                    continue;
                }
                object.advance(rng, canvas);
            }
            canvas.flip()?;
            timer.record_frame(now.saturating_sub(last));
            last = now;
        }

        let stats = timer.frame_stats();
        debug!(
            "trial {}: {} frames, {:.3} ms/frame, jitter {:.3} ms, {:.1} Hz",
            self.id,
            stats.frames,
            stats.average_frame_time_ns / 1_000_000.0,
            stats.jitter_ns / 1_000_000.0,
            stats.effective_fps,
        );
        self.state = TrialState::AnimationComplete;
        Ok(())
    }

    /// Removes every visual this trial owns and presents the empty screen.
    /// Safe to call repeatedly.
    pub fn clear<C: Canvas + ?Sized>(&mut self, canvas: &mut C) -> Result<()> {
        for id in self.decorations.drain(..) {
            canvas.remove(id);
        }
        for object in &mut self.objects {
            object.clear(canvas);
        }
        canvas.flip()?;
        if self.state == TrialState::ResponseCollected {
            self.state = TrialState::Cleared;
        }
        Ok(())
    }

    fn count_question(&self) -> String {
        format!(
            "How many times did the {} {} bounce?",
            self.config.attended_color, self.config.attended_shape
        )
    }

    /// Count prompt, then the probe questionnaire on probe trials.
    pub fn collect_responses<S>(&mut self, surface: &mut S) -> Result<()>
    where
        S: Canvas + InputSource + ?Sized,
    {
        self.require(TrialState::AnimationComplete, "collect_responses")?;
        let count = collect_count(surface, &self.count_question())?;
        self.count = Some(count);

        if self.is_probe {
            let config = self.config;
            let noticed = collect_choice(surface, NOTICE_QUESTION, &["yes", "no"])?;
            let shape = collect_choice(
                surface,
                SHAPE_QUESTION,
                &["circle", "triangle", config.ib_shape.as_str(), "square"],
            )?;
            let color = collect_choice(
                surface,
                COLOR_QUESTION,
                &["tan", "white", "black", config.ib_color.as_str()],
            )?;
            self.probe_report = Some(ProbeReport {
                noticed,
                shape,
                color,
            });
        }
        self.state = TrialState::ResponseCollected;
        Ok(())
    }

    /// Bounces made by the tracked objects in the attended colour.
    pub fn attended_bounces(&self) -> u32 {
        self.objects
            .iter()
            .filter_map(SceneObject::as_tracked)
            .filter(|o| o.color == self.config.attended_color)
            .map(|o| o.bounces)
            .sum()
    }

    pub fn data(&self) -> Result<TrialOutcome> {
        let count = match (self.state, self.count) {
            (TrialState::ResponseCollected | TrialState::Cleared, Some(count)) => count,
            _ => {
                return Err(ExperimentError::InvalidTransition {
                    from: self.state,
                    operation: "data",
                });
            }
        };
        Ok(TrialOutcome {
            trial_id: self.id,
            bounces: self.attended_bounces(),
            count,
            probe: self.probe_report.clone(),
        })
    }

    /// The whole per-trial sequence: setup, pause, animate, clear, ask,
    /// clear, summarise.
    pub fn execute<S, T, R>(&mut self, surface: &mut S, timer: &mut T, rng: &mut R) -> Result<TrialOutcome>
    where
        S: Canvas + InputSource + ?Sized,
        T: Timer + ?Sized,
        R: Rng + ?Sized,
    {
        info!("trial {} starting (probe: {})", self.id, self.is_probe);
        self.setup(surface, rng)?;
        timer.sleep(self.config.pre_trial_pause()?);
        self.run(surface, timer, rng)?;
        self.clear(surface)?;
        self.collect_responses(surface)?;
        self.clear(surface)?;
        let outcome = self.data()?;
        info!(
            "trial {} done: {} bounces, {} reported",
            self.id, outcome.bounces, outcome.count
        );
        Ok(outcome)
    }
}
