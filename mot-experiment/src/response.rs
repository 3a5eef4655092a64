//! Blocking prompts: instruction screens, typed entry and click buttons.
//!
//! Every prompt polls input and flips once per iteration until its exit
//! condition holds. Escape aborts from any prompt.

use crate::error::{ExperimentError, Result};
use mot_core::{Canvas, InputEvent, InputSource, Key, NamedColor, Primitive, StimulusId, SurfaceError, Vec2};

/// Layout is expressed in degrees of visual angle at this scale.
pub const PX_PER_DEG: f32 = 32.0;
/// Longest count that can be typed; keeps the value inside `u32`.
pub const MAX_COUNT_DIGITS: usize = 9;
pub const MAX_TEXT_LEN: usize = 32;

const TWO_CHOICE_COLORS: [[u8; 4]; 2] = [[229, 103, 103, 255], [102, 151, 232, 255]];
const CHOICE_COLOR: [u8; 4] = [138, 125, 163, 255];
const ECHO_COLOR: [u8; 4] = [255, 0, 0, 255];

pub fn deg(d: f32) -> f32 {
    d * PX_PER_DEG
}

fn text(content: &str, height_deg: f32, color: [u8; 4], wrap_deg: f32) -> Primitive {
    Primitive::Text {
        content: content.to_string(),
        size: deg(height_deg),
        color,
        wrap_width: deg(wrap_deg),
    }
}

fn show<S: Canvas + ?Sized>(surface: &mut S, primitive: Primitive, pos: Vec2) -> StimulusId {
    let id = surface.add(primitive, pos);
    surface.set_visible(id, true);
    id
}

fn poll<S: InputSource + ?Sized>(surface: &mut S) -> Result<Vec<InputEvent>> {
    let events = surface.poll_input()?;
    if events.contains(&InputEvent::Key(Key::Escape)) {
        return Err(SurfaceError::Aborted.into());
    }
    Ok(events)
}

/// Shows `message` and waits for any key.
pub fn display_instructions<S>(surface: &mut S, message: &str) -> Result<()>
where
    S: Canvas + InputSource + ?Sized,
{
    surface.discard_pending();
    let black = NamedColor::Black.rgba();
    let id = show(surface, text(message, 1.0, black, 36.0), Vec2::ZERO);
    surface.flip()?;
    loop {
        let events = poll(surface)?;
        if events.iter().any(|e| matches!(e, InputEvent::Key(_))) {
            break;
        }
        surface.flip()?;
    }
    surface.remove(id);
    Ok(())
}

/// Editable single-line buffer fed with key presses.
pub trait LineEntry {
    fn push(&mut self, key: Key);
    fn text(&self) -> &str;
    /// Whether Return may commit the current buffer.
    fn is_complete(&self) -> bool {
        !self.text().is_empty()
    }
}

/// Digits-only entry. Anything but digits and backspace is ignored, so the
/// buffer always holds a valid count.
#[derive(Debug, Clone, Default)]
pub struct NumericEntry {
    buffer: String,
    value: u32,
}

impl NumericEntry {
    pub fn value(&self) -> u32 {
        self.value
    }
}

impl LineEntry for NumericEntry {
    fn push(&mut self, key: Key) {
        match key {
            Key::Digit(d) if self.buffer.len() < MAX_COUNT_DIGITS => {
                if let Some(c) = char::from_digit(d as u32, 10) {
                    self.buffer.push(c);
                    self.value = self.value * 10 + d as u32;
                }
            }
            Key::Backspace => {
                if self.buffer.pop().is_some() {
                    self.value /= 10;
                }
            }
            _ => {}
        }
    }

    fn text(&self) -> &str {
        &self.buffer
    }
}

/// Identifier entry: ASCII letters, digits, `-` and `_`.
#[derive(Debug, Clone, Default)]
pub struct TextEntry {
    buffer: String,
}

impl TextEntry {
    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl LineEntry for TextEntry {
    fn push(&mut self, key: Key) {
        let c = match key {
            Key::Backspace => {
                self.buffer.pop();
                return;
            }
            Key::Digit(d) => char::from_digit(d as u32, 10),
            Key::Char(c) if c.is_ascii_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        };
        if let Some(c) = c {
            if self.buffer.len() < MAX_TEXT_LEN {
                self.buffer.push(c);
            }
        }
    }

    fn text(&self) -> &str {
        &self.buffer
    }
}

/// Shows `question` with a live echo of the buffer until Return is pressed
/// on a complete entry.
pub fn collect_line<S, E>(surface: &mut S, question: &str, mut entry: E) -> Result<E>
where
    S: Canvas + InputSource + ?Sized,
    E: LineEntry,
{
    surface.discard_pending();
    let black = NamedColor::Black.rgba();
    let question_id = show(surface, text(question, 1.0, black, 50.0), Vec2::new(0.0, deg(5.0)));
    let echo_id = show(surface, text(entry.text(), 1.5, ECHO_COLOR, 12.0), Vec2::ZERO);
    surface.flip()?;

    'collect: loop {
        for event in poll(surface)? {
            match event {
                InputEvent::Key(Key::Return) if entry.is_complete() => break 'collect,
                InputEvent::Key(key) => entry.push(key),
                InputEvent::PointerPressed(_) => {}
            }
        }
        surface.set_text(echo_id, entry.text());
        surface.flip()?;
    }

    surface.remove(echo_id);
    surface.remove(question_id);
    surface.discard_pending();
    Ok(entry)
}

/// Numeric keyboard entry; returns the committed count.
pub fn collect_count<S>(surface: &mut S, question: &str) -> Result<u32>
where
    S: Canvas + InputSource + ?Sized,
{
    let entry = collect_line(surface, question, NumericEntry::default())?;
    log::debug!("count entered: {}", entry.value());
    Ok(entry.value())
}

/// Free identifier entry (subject id).
pub fn collect_text<S>(surface: &mut S, question: &str) -> Result<String>
where
    S: Canvas + InputSource + ?Sized,
{
    Ok(collect_line(surface, question, TextEntry::default())?.into_string())
}

/// Button centres for an n-alternative prompt, in a row below the question.
pub fn button_positions(n: usize) -> Vec<Vec2> {
    let offset = n as f32 / 2.0 - 0.5;
    (0..n)
        .map(|i| Vec2::new(deg((i as f32 - offset) * 10.0), deg(-5.0)))
        .collect()
}

pub fn button_size() -> Vec2 {
    Vec2::new(deg(8.0), deg(4.0))
}

fn button_colors(n: usize) -> Vec<[u8; 4]> {
    if n == 2 {
        TWO_CHOICE_COLORS.to_vec()
    } else {
        vec![CHOICE_COLOR; n]
    }
}

/// Index of the button whose rectangle contains `p`.
pub fn hit_button(p: Vec2, positions: &[Vec2]) -> Option<usize> {
    let half = button_size() / 2.0;
    positions.iter().position(|c| {
        let d = (p - *c).abs();
        d.x <= half.x && d.y <= half.y
    })
}

/// Forced choice by clicking one of `options`; returns the chosen label.
pub fn collect_choice<S>(surface: &mut S, question: &str, options: &[&str]) -> Result<String>
where
    S: Canvas + InputSource + ?Sized,
{
    if options.is_empty() {
        return Err(ExperimentError::NoOptions);
    }
    surface.discard_pending();
    let black = NamedColor::Black.rgba();
    let white = NamedColor::White.rgba();
    let positions = button_positions(options.len());
    let size = button_size();

    let mut ids = vec![show(surface, text(question, 1.0, black, 100.0), Vec2::new(0.0, deg(1.0)))];
    for ((label, pos), color) in options.iter().zip(&positions).zip(button_colors(options.len())) {
        let rect = Primitive::Rectangle {
            width: size.x,
            height: size.y,
            color,
        };
        ids.push(show(surface, rect, *pos));
        ids.push(show(surface, text(label, 0.75, white, 8.0), *pos));
    }
    surface.set_pointer_visible(true);
    surface.flip()?;

    let chosen = loop {
        let hit = poll(surface)?.into_iter().find_map(|event| match event {
            InputEvent::PointerPressed(p) => hit_button(p, &positions),
            InputEvent::Key(_) => None,
        });
        if let Some(i) = hit {
            break i;
        }
        surface.flip()?;
    };

    for id in ids {
        surface.remove(id);
    }
    surface.set_pointer_visible(false);
    surface.discard_pending();
    log::debug!("{question:?} -> {}", options[chosen]);
    Ok(options[chosen].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSurface;

    #[test]
    fn numeric_entry_ignores_letters_and_edits() {
        let mut entry = NumericEntry::default();
        for key in [
            Key::Backspace,
            Key::Digit(1),
            Key::Char('x'),
            Key::Digit(2),
            Key::Digit(7),
            Key::Backspace,
        ] {
            entry.push(key);
        }
        assert_eq!(entry.text(), "12");
        assert_eq!(entry.value(), 12);
    }

    #[test]
    fn numeric_entry_caps_length() {
        let mut entry = NumericEntry::default();
        for _ in 0..20 {
            entry.push(Key::Digit(9));
        }
        assert_eq!(entry.text().len(), MAX_COUNT_DIGITS);
        assert_eq!(entry.value(), 999_999_999);
    }

    #[test]
    fn empty_return_is_not_accepted() {
        let mut surface = ScriptedSurface::default()
            .events([InputEvent::Key(Key::Return)])
            .events([InputEvent::Key(Key::Char('a'))])
            .type_line("3");
        let count = collect_count(&mut surface, "How many?").unwrap();
        assert_eq!(count, 3);
        assert_eq!(surface.remaining_steps(), 0);
        assert_eq!(surface.visible_count(), 0);
    }

    #[test]
    fn return_in_same_batch_as_digits_commits() {
        let mut surface = ScriptedSurface::default().events([
            InputEvent::Key(Key::Digit(4)),
            InputEvent::Key(Key::Digit(2)),
            InputEvent::Key(Key::Return),
        ]);
        assert_eq!(collect_count(&mut surface, "How many?").unwrap(), 42);
    }

    #[test]
    fn echo_shows_typed_digits() {
        let mut surface = ScriptedSurface::default().type_line("15");
        collect_count(&mut surface, "How many?").unwrap();
        assert!(surface.shown_text().iter().any(|t| t == "15"));
    }

    #[test]
    fn escape_aborts() {
        let mut surface = ScriptedSurface::default().events([InputEvent::Key(Key::Escape)]);
        let err = collect_count(&mut surface, "How many?").unwrap_err();
        assert!(matches!(err, ExperimentError::Surface(SurfaceError::Aborted)));
    }

    #[test]
    fn text_entry_accepts_identifier_characters() {
        let mut surface = ScriptedSurface::default().type_line("s-01 x");
        let id = collect_text(&mut surface, "Subject ID").unwrap();
        assert_eq!(id, "s-01x");
    }

    #[test]
    fn buttons_are_centred_on_the_row() {
        let two = button_positions(2);
        assert_eq!(two, vec![Vec2::new(-160.0, -160.0), Vec2::new(160.0, -160.0)]);
        let four = button_positions(4);
        assert_eq!(four[0].x, -480.0);
        assert_eq!(four[3].x, 480.0);
    }

    #[test]
    fn clicks_outside_buttons_are_ignored() {
        let positions = button_positions(2);
        assert_eq!(hit_button(Vec2::ZERO, &positions), None);
        assert_eq!(hit_button(Vec2::new(-160.0 + 127.0, -160.0 - 63.0), &positions), Some(0));
    }

    #[test]
    fn choice_returns_clicked_label_and_hides_pointer() {
        let mut surface = ScriptedSurface::default()
            .events([InputEvent::PointerPressed(Vec2::new(0.0, 300.0))])
            .click("square");
        let answer =
            collect_choice(&mut surface, "What shape was it?", &["circle", "triangle", "cross", "square"])
                .unwrap();
        assert_eq!(answer, "square");
        assert!(!surface.pointer_visible());
        assert_eq!(surface.visible_count(), 0);
    }

    #[test]
    fn any_key_dismisses_instructions() {
        let mut surface = ScriptedSurface::default()
            .events([InputEvent::PointerPressed(Vec2::ZERO)])
            .any_key();
        display_instructions(&mut surface, "Please wait").unwrap();
        assert_eq!(surface.shown_text(), ["Please wait".to_string()]);
        assert_eq!(surface.remaining_steps(), 0);
    }

    #[test]
    fn choice_needs_options() {
        let mut surface = ScriptedSurface::default();
        assert!(matches!(
            collect_choice(&mut surface, "?", &[]),
            Err(ExperimentError::NoOptions)
        ));
    }
}
