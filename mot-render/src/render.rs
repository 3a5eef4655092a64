use crate::text::render_text_pixmap;
use ab_glyph::FontArc;
use anyhow::{Context, Result};
use log::warn;
use mot_core::{Canvas, Primitive, StimulusId, SurfaceError, Vec2};
use mot_timing::{FrameStats, HighPrecisionTimer, Timer};
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

const TEXT_CACHE_LIMIT: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextKey {
    content: String,
    size_bits: u32,
    color: [u8; 4],
    wrap_bits: u32,
}

/// Rendered text keyed by content and style. Typed-entry echoes churn
/// through many strings, so the cache is dropped wholesale when full.
struct TextCache {
    font: Option<FontArc>,
    map: HashMap<TextKey, Option<Arc<Pixmap>>>,
}

impl TextCache {
    fn new(font: Option<FontArc>) -> Self {
        Self {
            font,
            map: HashMap::new(),
        }
    }

    fn get_or_render(&mut self, content: &str, size: f32, color: [u8; 4], wrap_width: f32) -> Option<Arc<Pixmap>> {
        let font = self.font.as_ref()?;
        let key = TextKey {
            content: content.to_string(),
            size_bits: size.to_bits(),
            color,
            wrap_bits: wrap_width.to_bits(),
        };
        if let Some(p) = self.map.get(&key) {
            return p.clone();
        }
        if self.map.len() >= TEXT_CACHE_LIMIT {
            self.map.clear();
        }
        let pm = render_text_pixmap(content, size, font, color, wrap_width).map(Arc::new);
        self.map.insert(key, pm.clone());
        pm
    }
}

struct Slot {
    primitive: Primitive,
    position: Vec2,
}

/// Retained-mode canvas rasterised with tiny-skia.
///
/// `flip` redraws every visible primitive into an offscreen pixmap in
/// painter's order; presenting the pixmap is up to the caller.
pub struct SkiaCanvas {
    width: u32,
    height: u32,
    clear_color: Color,
    slots: Vec<Option<Slot>>,
    draw_list: Vec<StimulusId>,
    text_cache: TextCache,
    canvas: Pixmap,
    pointer_visible: bool,
    raster_timer: HighPrecisionTimer,
}

fn color(c: [u8; 4]) -> Color {
    Color::from_rgba8(c[0], c[1], c[2], c[3])
}

impl SkiaCanvas {
    pub fn new(width: u32, height: u32, clear_color: [u8; 4], font: Option<FontArc>) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .with_context(|| format!("cannot allocate a {width}x{height} canvas"))?;
        if font.is_none() {
            warn!("no font loaded; text primitives will not be drawn");
        }
        Ok(Self {
            width,
            height,
            clear_color: color(clear_color),
            slots: Vec::new(),
            draw_list: Vec::new(),
            text_cache: TextCache::new(font),
            canvas,
            pointer_visible: false,
            raster_timer: HighPrecisionTimer::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas = Pixmap::new(width, height)
            .with_context(|| format!("cannot allocate a {width}x{height} canvas"))?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.canvas
    }

    /// RGBA bytes of the last rendered frame. The clear colour is opaque, so
    /// premultiplied and straight alpha coincide.
    pub fn frame(&self) -> &[u8] {
        self.canvas.data()
    }

    pub fn pointer_visible(&self) -> bool {
        self.pointer_visible
    }

    /// Time spent rasterising recent frames.
    pub fn raster_stats(&self) -> FrameStats {
        self.raster_timer.frame_stats()
    }

    /// Centred y-up coordinates to pixmap coordinates.
    pub fn to_screen(&self, p: Vec2) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0 + p.x, self.height as f32 / 2.0 - p.y)
    }

    /// Inverse of `to_screen`, for pointer input.
    pub fn from_screen(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x - self.width as f32 / 2.0, self.height as f32 / 2.0 - y)
    }

    pub fn render(&mut self) {
        let started = self.raster_timer.now();
        self.canvas.fill(self.clear_color);
        for id in &self.draw_list {
            let Some(Some(slot)) = self.slots.get(id.0) else {
                continue;
            };
            let center = Vec2::new(
                self.width as f32 / 2.0 + slot.position.x,
                self.height as f32 / 2.0 - slot.position.y,
            );
            draw_primitive(&mut self.canvas, &mut self.text_cache, &slot.primitive, center);
        }
        let spent = self.raster_timer.elapsed(started);
        self.raster_timer.record_frame(spent);
    }
}

fn draw_primitive(canvas: &mut Pixmap, text_cache: &mut TextCache, primitive: &Primitive, center: Vec2) {
    let mut paint = Paint::default();
    paint.anti_alias = false;
    match primitive {
        Primitive::Circle { radius, color: c } => {
            paint.set_color(color(*c));
            paint.anti_alias = true;
            if let Some(path) = PathBuilder::from_circle(center.x, center.y, *radius) {
                canvas.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }
        Primitive::Rectangle {
            width,
            height,
            color: c,
        } => {
            paint.set_color(color(*c));
            if let Some(rect) = Rect::from_xywh(center.x - width / 2.0, center.y - height / 2.0, *width, *height) {
                canvas.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }
        Primitive::Line {
            start,
            end,
            width,
            color: c,
        } => {
            paint.set_color(color(*c));
            let mut pb = PathBuilder::new();
            pb.move_to(center.x + start.x, center.y - start.y);
            pb.line_to(center.x + end.x, center.y - end.y);
            if let Some(path) = pb.finish() {
                let stroke = Stroke {
                    width: *width,
                    ..Stroke::default()
                };
                canvas.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
        Primitive::Text {
            content,
            size,
            color: c,
            wrap_width,
        } => {
            let Some(pm) = text_cache.get_or_render(content, *size, *c, *wrap_width) else {
                return;
            };
            let x = (center.x - pm.width() as f32 / 2.0).round() as i32;
            let y = (center.y - pm.height() as f32 / 2.0).round() as i32;
            let pixmap: &Pixmap = &pm;
            canvas.draw_pixmap(x, y, pixmap.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
        }
    }
}

impl Canvas for SkiaCanvas {
    fn add(&mut self, primitive: Primitive, pos: Vec2) -> StimulusId {
        self.slots.push(Some(Slot {
            primitive,
            position: pos,
        }));
        StimulusId(self.slots.len() - 1)
    }

    fn set_position(&mut self, id: StimulusId, pos: Vec2) {
        if let Some(Some(slot)) = self.slots.get_mut(id.0) {
            slot.position = pos;
        }
    }

    fn set_text(&mut self, id: StimulusId, text: &str) {
        if let Some(Some(Slot {
            primitive: Primitive::Text { content, .. },
            ..
        })) = self.slots.get_mut(id.0)
        {
            if content != text {
                *content = text.to_string();
            }
        }
    }

    fn set_visible(&mut self, id: StimulusId, visible: bool) {
        if !matches!(self.slots.get(id.0), Some(Some(_))) {
            return;
        }
        self.draw_list.retain(|d| *d != id);
        if visible {
            self.draw_list.push(id);
        }
    }

    fn remove(&mut self, id: StimulusId) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            *slot = None;
        }
        self.draw_list.retain(|d| *d != id);
    }

    fn set_pointer_visible(&mut self, visible: bool) {
        self.pointer_visible = visible;
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    fn flip(&mut self) -> Result<(), SurfaceError> {
        self.render();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];

    fn canvas() -> SkiaCanvas {
        SkiaCanvas::new(200, 100, WHITE, None).unwrap()
    }

    fn rgba(c: &SkiaCanvas, x: u32, y: u32) -> [u8; 4] {
        let p = c.pixmap().pixel(x, y).unwrap();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    fn square(color: [u8; 4]) -> Primitive {
        Primitive::Rectangle {
            width: 20.0,
            height: 20.0,
            color,
        }
    }

    #[test]
    fn y_points_up_from_the_centre() {
        let mut c = canvas();
        let id = c.add(square(RED), Vec2::new(50.0, 30.0));
        c.set_visible(id, true);
        c.flip().unwrap();
        assert_eq!(rgba(&c, 150, 20), RED);
        assert_eq!(rgba(&c, 150, 80), WHITE);
        assert_eq!(rgba(&c, 100, 50), WHITE);
    }

    #[test]
    fn later_visible_paints_on_top() {
        let mut c = canvas();
        let a = c.add(square(RED), Vec2::ZERO);
        let b = c.add(square(BLUE), Vec2::ZERO);
        c.set_visible(b, true);
        c.set_visible(a, true);
        c.flip().unwrap();
        assert_eq!(rgba(&c, 100, 50), RED);
        c.set_visible(b, true);
        c.flip().unwrap();
        assert_eq!(rgba(&c, 100, 50), BLUE);
    }

    #[test]
    fn hidden_and_removed_items_are_not_drawn() {
        let mut c = canvas();
        let a = c.add(square(RED), Vec2::ZERO);
        c.set_visible(a, true);
        c.set_visible(a, false);
        c.flip().unwrap();
        assert_eq!(rgba(&c, 100, 50), WHITE);

        c.set_visible(a, true);
        c.remove(a);
        c.set_visible(a, true);
        c.set_position(a, Vec2::new(10.0, 0.0));
        c.flip().unwrap();
        assert_eq!(rgba(&c, 100, 50), WHITE);
    }

    #[test]
    fn text_without_font_is_skipped() {
        let mut c = canvas();
        let id = c.add(
            Primitive::Text {
                content: "hello".into(),
                size: 24.0,
                color: RED,
                wrap_width: 100.0,
            },
            Vec2::ZERO,
        );
        c.set_visible(id, true);
        c.set_text(id, "bye");
        c.flip().unwrap();
        assert_eq!(rgba(&c, 100, 50), WHITE);
    }

    #[test]
    fn fixation_lines_cross_at_the_centre() {
        let mut c = canvas();
        for (start, end) in [
            (Vec2::new(0.0, -18.0), Vec2::new(0.0, 18.0)),
            (Vec2::new(-18.0, 0.0), Vec2::new(18.0, 0.0)),
        ] {
            let id = c.add(
                Primitive::Line {
                    start,
                    end,
                    width: 4.0,
                    color: BLUE,
                },
                Vec2::ZERO,
            );
            c.set_visible(id, true);
        }
        c.flip().unwrap();
        assert_eq!(rgba(&c, 100, 40), BLUE);
        assert_eq!(rgba(&c, 90, 50), BLUE);
        assert_eq!(rgba(&c, 90, 40), WHITE);
    }

    #[test]
    fn screen_mapping_round_trips_pointer_positions() {
        let c = canvas();
        let p = Vec2::new(-30.0, 12.0);
        let s = c.to_screen(p);
        assert_eq!(s, Vec2::new(70.0, 38.0));
        assert_eq!(c.from_screen(s.x, s.y), p);
    }

    #[test]
    fn each_flip_records_raster_time() {
        let mut c = canvas();
        c.flip().unwrap();
        c.flip().unwrap();
        assert_eq!(c.raster_stats().frames, 2);
    }
}
