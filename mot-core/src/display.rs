use crate::input::InputEvent;
use crate::stimulus::Primitive;
use glam::Vec2;
use thiserror::Error;

/// Handle to a primitive owned by a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StimulusId(pub usize);

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("session aborted by the operator")]
    Aborted,
    #[error("scripted input exhausted")]
    InputExhausted,
    #[error("render backend failure: {0}")]
    Backend(String),
}

/// A 2D drawing surface with retained primitives.
///
/// Coordinates are centred on the surface with y pointing up. Primitives
/// become visible in the order `set_visible(id, true)` is called and are
/// painted in that order, so the most recently shown primitive is on top.
pub trait Canvas {
    /// Adds a hidden primitive centred at `pos`.
    fn add(&mut self, primitive: Primitive, pos: Vec2) -> StimulusId;
    fn set_position(&mut self, id: StimulusId, pos: Vec2);
    /// Replaces the content of a text primitive. No-op for other primitives.
    fn set_text(&mut self, id: StimulusId, text: &str);
    fn set_visible(&mut self, id: StimulusId, visible: bool);
    /// Drops the primitive. Unknown or already removed ids are ignored.
    fn remove(&mut self, id: StimulusId);
    fn set_pointer_visible(&mut self, visible: bool);
    /// Surface size in pixels.
    fn size(&self) -> Vec2;
    /// Presents the current scene. Blocks until the next refresh where the
    /// backend synchronises to the display.
    fn flip(&mut self) -> Result<(), SurfaceError>;
}

/// Non-blocking source of discrete input events.
pub trait InputSource {
    /// Drains events received since the last call.
    fn poll_input(&mut self) -> Result<Vec<InputEvent>, SurfaceError>;

    /// Drops buffered events so a new prompt only sees fresh input.
    fn discard_pending(&mut self) {}
}
