//! Headless surface with scripted input, for driving trials and sessions
//! without a window.

use mot_core::{Canvas, InputEvent, InputSource, Key, Primitive, StimulusId, SurfaceError, Vec2};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Step {
    Events(Vec<InputEvent>),
    /// Press on the visible text primitive with this content.
    Click(String),
}

#[derive(Debug, Clone)]
struct Item {
    primitive: Primitive,
    position: Vec2,
}

/// Records canvas calls and replays one scripted step per `poll_input`.
///
/// Polling past the end of the script fails with
/// `SurfaceError::InputExhausted` instead of blocking.
#[derive(Debug, Clone)]
pub struct ScriptedSurface {
    size: Vec2,
    items: Vec<Option<Item>>,
    draw_list: Vec<StimulusId>,
    script: VecDeque<Step>,
    flips: usize,
    removals: usize,
    pointer_visible: bool,
    /// Text of every text primitive visible at each flip.
    shown_text: Vec<String>,
}

impl Default for ScriptedSurface {
    fn default() -> Self {
        Self::new(Vec2::new(1280.0, 800.0))
    }
}

impl ScriptedSurface {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            items: Vec::new(),
            draw_list: Vec::new(),
            script: VecDeque::new(),
            flips: 0,
            removals: 0,
            pointer_visible: false,
            shown_text: Vec::new(),
        }
    }

    pub fn events(mut self, events: impl IntoIterator<Item = InputEvent>) -> Self {
        self.script.push_back(Step::Events(events.into_iter().collect()));
        self
    }

    pub fn any_key(self) -> Self {
        self.events([InputEvent::Key(Key::Other)])
    }

    /// Types `text` one key per poll, then presses Return.
    pub fn type_line(mut self, text: &str) -> Self {
        for c in text.chars() {
            self = self.events([InputEvent::Key(Key::from_char(c))]);
        }
        self.events([InputEvent::Key(Key::Return)])
    }

    pub fn click(mut self, label: &str) -> Self {
        self.script.push_back(Step::Click(label.to_string()));
        self
    }

    pub fn remaining_steps(&self) -> usize {
        self.script.len()
    }

    pub fn flips(&self) -> usize {
        self.flips
    }

    pub fn removals(&self) -> usize {
        self.removals
    }

    pub fn pointer_visible(&self) -> bool {
        self.pointer_visible
    }

    /// Ids in painter's order.
    pub fn visible_ids(&self) -> Vec<StimulusId> {
        self.draw_list.clone()
    }

    pub fn visible_count(&self) -> usize {
        self.draw_list.len()
    }

    pub fn position_of(&self, id: StimulusId) -> Option<Vec2> {
        self.item(id).map(|item| item.position)
    }

    pub fn primitive_of(&self, id: StimulusId) -> Option<&Primitive> {
        self.item(id).map(|item| &item.primitive)
    }

    pub fn shown_text(&self) -> &[String] {
        &self.shown_text
    }

    fn item(&self, id: StimulusId) -> Option<&Item> {
        self.items.get(id.0).and_then(Option::as_ref)
    }

    fn visible_text_position(&self, label: &str) -> Option<Vec2> {
        self.draw_list.iter().find_map(|id| match self.item(*id) {
            Some(Item {
                primitive: Primitive::Text { content, .. },
                position,
            }) if content == label => Some(*position),
            _ => None,
        })
    }
}

impl Canvas for ScriptedSurface {
    fn add(&mut self, primitive: Primitive, pos: Vec2) -> StimulusId {
        self.items.push(Some(Item {
            primitive,
            position: pos,
        }));
        StimulusId(self.items.len() - 1)
    }

    fn set_position(&mut self, id: StimulusId, pos: Vec2) {
        if let Some(Some(item)) = self.items.get_mut(id.0) {
            item.position = pos;
        }
    }

    fn set_text(&mut self, id: StimulusId, text: &str) {
        if let Some(Some(Item {
            primitive: Primitive::Text { content, .. },
            ..
        })) = self.items.get_mut(id.0)
        {
            *content = text.to_string();
        }
    }

    fn set_visible(&mut self, id: StimulusId, visible: bool) {
        if self.item(id).is_none() {
            return;
        }
        self.draw_list.retain(|d| *d != id);
        if visible {
            self.draw_list.push(id);
        }
    }

    fn remove(&mut self, id: StimulusId) {
        if let Some(slot) = self.items.get_mut(id.0) {
            if slot.take().is_some() {
                self.removals += 1;
            }
        }
        self.draw_list.retain(|d| *d != id);
    }

    fn set_pointer_visible(&mut self, visible: bool) {
        self.pointer_visible = visible;
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn flip(&mut self) -> Result<(), SurfaceError> {
        self.flips += 1;
        let texts: Vec<String> = self
            .draw_list
            .iter()
            .filter_map(|id| match self.item(*id) {
                Some(Item {
                    primitive: Primitive::Text { content, .. },
                    ..
                }) => Some(content.clone()),
                _ => None,
            })
            .collect();
        for text in texts {
            if self.shown_text.last() != Some(&text) {
                self.shown_text.push(text);
            }
        }
        Ok(())
    }
}

impl InputSource for ScriptedSurface {
    fn poll_input(&mut self) -> Result<Vec<InputEvent>, SurfaceError> {
        match self.script.pop_front() {
            Some(Step::Events(events)) => Ok(events),
            Some(Step::Click(label)) => Ok(self
                .visible_text_position(&label)
                .map(InputEvent::PointerPressed)
                .into_iter()
                .collect()),
            None => Err(SurfaceError::InputExhausted),
        }
    }
}
