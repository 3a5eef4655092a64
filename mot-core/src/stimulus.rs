use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Drawable primitives. Positions handed to a canvas are the primitive's
/// centre; `Line` endpoints are relative to that centre.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Circle {
        radius: f32,
        color: [u8; 4],
    },
    Rectangle {
        width: f32,
        height: f32,
        color: [u8; 4],
    },
    Line {
        start: Vec2,
        end: Vec2,
        width: f32,
        color: [u8; 4],
    },
    Text {
        content: String,
        size: f32,
        color: [u8; 4],
        wrap_width: f32,
    },
}

/// Shape labels, both for drawable objects and forced-choice answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Square,
    Triangle,
    Cross,
}

impl ShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Square => "square",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Cross => "cross",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
