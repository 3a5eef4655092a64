use ab_glyph::{point, Font, Glyph, GlyphId, PxScale, PxScaleFont, ScaleFont};
use tiny_skia::{Pixmap, PremultipliedColorU8};

fn line_width<F: Font>(sf: &PxScaleFont<&F>, line: &str) -> f32 {
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for ch in line.chars() {
        let id = sf.glyph_id(ch);
        if let Some(p) = prev {
            width += sf.kern(p, id);
        }
        width += sf.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Splits on newlines, then greedily wraps words so no line is wider than
/// `max_width`. A single word wider than the limit gets its own line.
pub fn wrap_lines<F: Font>(font: &F, size: f32, text: &str, max_width: f32) -> Vec<String> {
    let sf = font.as_scaled(PxScale::from(size));
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if max_width > 0.0 && line_width(&sf, &candidate) > max_width {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            } else {
                line = candidate;
            }
        }
        lines.push(line);
    }
    lines
}

/// Rasterises `text` into a tight transparent pixmap, lines centred
/// horizontally. Returns `None` when nothing has ink (empty or blank text).
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: [u8; 4],
    wrap_width: f32,
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);
    let lines = wrap_lines(font, font_size, text, wrap_width);
    let line_height = sf.ascent() - sf.descent() + sf.line_gap();
    let block_width = lines
        .iter()
        .map(|l| line_width(&sf, l))
        .fold(0.0f32, f32::max);

    // Layout with each baseline at ascent below its line top
    let mut glyphs = Vec::<Glyph>::new();
    for (row, line) in lines.iter().enumerate() {
        let mut pen_x = (block_width - line_width(&sf, line)) / 2.0;
        let baseline = sf.ascent() + row as f32 * line_height;
        let mut prev: Option<GlyphId> = None;
        for ch in line.chars() {
            let id = font.glyph_id(ch);
            if let Some(p) = prev {
                pen_x += sf.kern(p, id);
            }
            glyphs.push(Glyph {
                id,
                scale,
                position: point(pen_x, baseline),
            });
            pen_x += sf.h_advance(id);
            prev = Some(id);
        }
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    if outlines.is_empty() {
        return None;
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    // Pixmap::new starts transparent
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // Premultiply source by coverage * alpha
            let a = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            let src = [
                (color[0] as f32 * a) as u8,
                (color[1] as f32 * a) as u8,
                (color[2] as f32 * a) as u8,
            ];

            // Porter-Duff over in premultiplied space
            let bg = dst[i];
            let inv = 1.0 - sa as f32 / 255.0;
            let over = |s: u8, d: u8| s.saturating_add((d as f32 * inv) as u8);
            let alpha = over(sa, bg.alpha());
            let blended = PremultipliedColorU8::from_rgba(
                over(src[0], bg.red()).min(alpha),
                over(src[1], bg.green()).min(alpha),
                over(src[2], bg.blue()).min(alpha),
                alpha,
            );
            if let Some(px) = blended {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}
