// Pattern store - the four pattern slots, the active slot and the pattern clipboard

use crate::clipboard::{Clipboard, ClipboardError};
use crate::sequencer::pattern::{LockParam, Pattern, PatternSlot};
use crate::sequencer::track::TrackId;

/// Owns every pattern of the session
///
/// Slots are created on first access, so a fresh store costs nothing until
/// the sequencer or an editor touches it.
#[derive(Debug, Default)]
pub struct PatternStore {
    slots: Option<Box<[Pattern; 4]>>,
    current: PatternSlot,
    clipboard: Clipboard<Pattern>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&mut self) -> &mut [Pattern; 4] {
        self.slots
            .get_or_insert_with(|| Box::new(std::array::from_fn(|_| Pattern::create_empty())))
    }

    /// Make sure all four slots exist
    pub fn init_patterns(&mut self) {
        self.slots();
    }

    pub fn current_slot(&self) -> PatternSlot {
        self.current
    }

    pub fn select_pattern(&mut self, slot: PatternSlot) {
        self.current = slot;
    }

    /// Pattern of the active slot
    pub fn current_pattern(&mut self) -> &Pattern {
        let index = self.current.index();
        &self.slots()[index]
    }

    pub fn current_pattern_mut(&mut self) -> &mut Pattern {
        let index = self.current.index();
        &mut self.slots()[index]
    }

    pub fn pattern(&mut self, slot: PatternSlot) -> &Pattern {
        &self.slots()[slot.index()]
    }

    pub fn pattern_mut(&mut self, slot: PatternSlot) -> &mut Pattern {
        &mut self.slots()[slot.index()]
    }

    /// Read-only view of a slot without forcing initialisation
    pub fn peek(&self, slot: PatternSlot) -> Option<&Pattern> {
        self.slots.as_ref().map(|slots| &slots[slot.index()])
    }

    /// Replace a whole slot
    pub fn replace(&mut self, slot: PatternSlot, pattern: Pattern) {
        self.slots()[slot.index()] = pattern;
    }

    /// Snapshot of all four slots in slot order
    pub fn snapshot(&mut self) -> [Pattern; 4] {
        self.slots().clone()
    }

    pub fn set_param_lock(
        &mut self,
        track: TrackId,
        step: usize,
        param: LockParam,
        value: Option<f32>,
    ) -> bool {
        self.current_pattern_mut().set_param_lock(track, step, param, value)
    }

    pub fn clear_pattern(&mut self) {
        self.current_pattern_mut().clear();
    }

    /// Copy the active pattern into the clipboard, overwriting it
    pub fn copy_pattern(&mut self) -> PatternSlot {
        let pattern = self.current_pattern().clone();
        self.clipboard.copy(pattern);
        self.current
    }

    /// Paste the clipboard into the active slot. The clipboard keeps its content.
    pub fn paste_pattern(&mut self) -> Result<PatternSlot, ClipboardError> {
        let pattern = self.clipboard.paste()?;
        *self.current_pattern_mut() = pattern;
        Ok(self.current)
    }

    pub fn has_clipboard(&self) -> bool {
        !self.clipboard.is_empty()
    }

    /// Morph A and B into slot C
    pub fn morph_pattern(&mut self) {
        let slots = self.slots();
        let morphed = Pattern::morph(&slots[PatternSlot::A.index()], &slots[PatternSlot::B.index()]);
        slots[PatternSlot::C.index()] = morphed;
    }
}
