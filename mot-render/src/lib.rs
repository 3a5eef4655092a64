pub mod font;
pub mod render;
pub mod text;

pub use ab_glyph::FontArc;
pub use font::{find_font, load_font};
pub use render::SkiaCanvas;
pub use text::{render_text_pixmap, wrap_lines};
