pub mod config;
pub mod data;
pub mod error;
pub mod object;
pub mod response;
pub mod session;
pub mod testing;
pub mod trial;

pub use config::{ConfigError, ExperimentConfig};
pub use data::{DataRow, session_date};
pub use error::{ExperimentError, Result};
pub use object::{Bounds, DisplayObject, SceneObject, TrackedObject, TrackedShape, UnexpectedObject};
pub use session::Session;
pub use trial::Trial;
