pub mod color;
pub mod display;
pub mod input;
pub mod phase;
pub mod stimulus;
pub mod trial;

pub use color::{NamedColor, UnknownColor};
pub use display::{Canvas, InputSource, StimulusId, SurfaceError};
pub use glam::Vec2;
pub use input::{InputEvent, Key};
pub use phase::SessionPhase;
pub use stimulus::{Primitive, ShapeKind};
pub use trial::{ProbeReport, TrialOutcome, TrialState};
