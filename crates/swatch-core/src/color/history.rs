//! Undo/redo history for a single color slot
//!
//! A [`ColorState`] is an editing session object: it owns a stack of
//! [`VersionedColor`] entries, a cursor into it, and the last persisted color.
//! Index 0 always holds the immutable default.

use super::{alpha, hsv_to_rgb, rgb, rgb_to_hsv, Argb};
use crate::theme::ColorId;

/// One of the three HSV channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HsvChannel {
    Hue = 0,
    Saturation = 1,
    Value = 2,
}

/// A color value plus its HSV decomposition
///
/// Entries that are not modifiable are checkpoints: edits never touch them in place.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedColor {
    value: Argb,
    hsv: [f32; 3],
    can_modify: bool,
}

impl VersionedColor {
    pub fn new(value: Argb, can_modify: bool) -> Self {
        Self {
            value,
            hsv: rgb_to_hsv(value),
            can_modify,
        }
    }

    /// Modifiable copy of `other`, keeping its HSV exactly
    fn fork(other: &VersionedColor) -> Self {
        Self {
            value: other.value,
            hsv: other.hsv,
            can_modify: true,
        }
    }

    pub fn value(&self) -> Argb {
        self.value
    }

    pub fn hsv(&self) -> [f32; 3] {
        self.hsv
    }

    pub fn can_modify(&self) -> bool {
        self.can_modify
    }

    /// Turn this entry into a checkpoint
    pub fn checkpoint(&mut self) -> bool {
        let changed = self.can_modify;
        self.can_modify = false;
        changed
    }

    /// Same value and same HSV decomposition
    pub fn same_as(&self, other: &VersionedColor) -> bool {
        self.value == other.value && self.hsv == other.hsv
    }

    /// Replace the color, re-deriving HSV.
    ///
    /// Alpha-only changes keep HSV untouched. Otherwise the previous hue is kept when it
    /// still reproduces the new color exactly, which keeps greys and repeated round trips
    /// from drifting the hue.
    fn set_color(&mut self, color: Argb) -> bool {
        debug_assert!(self.can_modify);
        if self.value == color {
            return false;
        }
        if rgb(self.value) != rgb(color) {
            let mut hsv = rgb_to_hsv(color);
            let preserved = [self.hsv[0], hsv[1], hsv[2]];
            if preserved[0] != hsv[0] && rgb(hsv_to_rgb(preserved, 0xff)) == rgb(color) {
                hsv = preserved;
            }
            self.hsv = hsv;
        }
        self.value = color;
        true
    }

    /// Replace one HSV channel and recompute the color with the original alpha
    fn set_hsv(&mut self, channel: HsvChannel, value: f32) -> bool {
        debug_assert!(self.can_modify);
        let index = channel as usize;
        if self.hsv[index] == value {
            return false;
        }
        self.hsv[index] = value;
        self.value = hsv_to_rgb(self.hsv, alpha(self.value));
        true
    }
}

/// Versioned edit history for one color slot
#[derive(Debug, Clone)]
pub struct ColorState {
    color_id: ColorId,
    stack: Vec<VersionedColor>,
    cursor: usize,
    saved_color: Argb,
    saved_stack: Vec<Argb>,
}

impl ColorState {
    /// Build a session from the default color, the persisted color, and the persisted
    /// history array (oldest first).
    ///
    /// History entries become checkpoints. When the saved color differs from the last
    /// history entry it is pushed as the current entry.
    pub fn new(
        color_id: ColorId,
        default_color: Argb,
        saved_color: Argb,
        saved_stack: Option<Vec<Argb>>,
    ) -> Self {
        let saved_stack = saved_stack.unwrap_or_default();
        let mut stack = Vec::with_capacity(saved_stack.len() + 2);
        stack.push(VersionedColor::new(default_color, false));
        for &color in &saved_stack {
            stack.push(VersionedColor::new(color, false));
        }
        if stack.last().map(|top| top.value) != Some(saved_color) {
            stack.push(VersionedColor::new(saved_color, false));
        }
        let cursor = stack.len() - 1;
        Self {
            color_id,
            stack,
            cursor,
            saved_color,
            saved_stack,
        }
    }

    pub fn color_id(&self) -> ColorId {
        self.color_id
    }

    /// Color at the cursor
    pub fn color(&self) -> Argb {
        self.stack[self.cursor].value
    }

    pub fn hsv(&self) -> [f32; 3] {
        self.stack[self.cursor].hsv
    }

    pub fn default_color(&self) -> Argb {
        self.stack[0].value
    }

    pub fn saved_color(&self) -> Argb {
        self.saved_color
    }

    /// History array this session was loaded with
    pub fn saved_stack(&self) -> &[Argb] {
        &self.saved_stack
    }

    pub fn is_default(&self) -> bool {
        self.color() == self.default_color()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn entries(&self) -> &[VersionedColor] {
        &self.stack
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.stack.len()
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Mark the current entry as a checkpoint so the next edit forks
    pub fn save_checkpoint(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.stack[self.cursor].checkpoint()
    }

    /// Set the current color. Returns whether anything changed.
    pub fn set_color(&mut self, color: Argb, persist: bool) -> bool {
        let changed = if self.stack[self.cursor].can_modify {
            let changed = self.stack[self.cursor].set_color(color);
            if changed {
                self.collapse_into_checkpoint();
            }
            changed
        } else if self.color() == color {
            false
        } else if let Some(index) = self.find_modifiable(|entry| entry.value == color) {
            self.cursor = index;
            true
        } else {
            let mut entry = VersionedColor::fork(&self.stack[self.cursor]);
            entry.set_color(color);
            self.push_fork(entry);
            true
        };
        if persist {
            self.saved_color = self.color();
        }
        changed
    }

    /// Set one HSV channel of the current color. Returns whether anything changed.
    pub fn set_hsv(&mut self, channel: HsvChannel, value: f32, persist: bool) -> bool {
        let changed = if self.stack[self.cursor].can_modify {
            let changed = self.stack[self.cursor].set_hsv(channel, value);
            if changed {
                self.collapse_into_checkpoint();
            }
            changed
        } else {
            let mut entry = VersionedColor::fork(&self.stack[self.cursor]);
            if !entry.set_hsv(channel, value) {
                false
            } else if let Some(index) = self.find_modifiable(|existing| existing.same_as(&entry)) {
                self.cursor = index;
                true
            } else {
                self.push_fork(entry);
                true
            }
        };
        if persist {
            self.saved_color = self.color();
        }
        changed
    }

    /// Drop the entry at the cursor, used to discard an aborted edit
    pub fn remove_current(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.stack.remove(self.cursor);
        self.cursor -= 1;
        true
    }

    /// Truncate back to the default entry
    pub fn clear(&mut self) -> bool {
        if self.stack.len() == 1 {
            return false;
        }
        self.stack.truncate(1);
        self.cursor = 0;
        true
    }

    /// Deduplicated history to persist, or `None` when there is nothing to keep.
    ///
    /// A trailing entry equal to the saved color is left out: it is restored from the
    /// saved color itself.
    pub fn new_stack(&self) -> Option<Vec<Argb>> {
        let mut end = self.stack.len();
        if end > 1 && self.stack[end - 1].value == self.saved_color {
            end -= 1;
        }
        let mut result: Vec<Argb> = Vec::with_capacity(end.saturating_sub(1));
        for entry in &self.stack[1..end] {
            if !result.contains(&entry.value) {
                result.push(entry.value);
            }
        }
        if result.is_empty() {
            None
        } else {
            Some(result)
        }
    }

    /// Whether the persisted history differs from what this session would write
    pub fn is_history_changed(&self) -> bool {
        self.new_stack().unwrap_or_default() != self.saved_stack
    }

    fn find_modifiable(&self, predicate: impl Fn(&VersionedColor) -> bool) -> Option<usize> {
        (1..self.stack.len())
            .rev()
            .find(|&index| self.stack[index].can_modify && predicate(&self.stack[index]))
    }

    /// Append a forked entry, discarding redo history above the cursor
    fn push_fork(&mut self, entry: VersionedColor) {
        self.stack.truncate(self.cursor + 1);
        self.stack.push(entry);
        self.cursor = self.stack.len() - 1;
    }

    /// Pop the modifiable entry at the cursor when it now equals the checkpoint below it
    fn collapse_into_checkpoint(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let previous = &self.stack[self.cursor - 1];
        if !previous.can_modify && previous.same_as(&self.stack[self.cursor]) {
            self.stack.remove(self.cursor);
            self.cursor -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Argb = 0xffff_0000;
    const GREEN: Argb = 0xff00_ff00;
    const BLUE: Argb = 0xff00_00ff;

    fn fresh() -> ColorState {
        ColorState::new(ColorId::Filling, RED, RED, None)
    }

    fn assert_invariants(state: &ColorState, default: Argb) {
        assert!(state.cursor() < state.len());
        assert_eq!(state.entries()[0].value(), default);
        assert!(!state.entries()[0].can_modify());
        assert_eq!(state.can_undo(), state.cursor() > 0);
        assert_eq!(state.can_redo(), state.cursor() + 1 < state.len());
    }

    #[test]
    fn test_set_undo_redo_scenario() {
        let mut state = fresh();
        assert!(!state.can_undo());

        assert!(state.set_color(GREEN, true));
        assert_eq!(state.color(), GREEN);
        assert!(state.can_undo());
        assert!(!state.can_redo());
        assert_eq!(state.saved_color(), GREEN);

        assert!(state.undo());
        assert_eq!(state.color(), RED);
        assert!(state.redo());
        assert_eq!(state.color(), GREEN);
        assert!(!state.redo());
    }

    #[test]
    fn test_modifiable_entry_is_edited_in_place() {
        let mut state = fresh();
        state.set_color(GREEN, false);
        state.set_color(BLUE, false);
        assert_eq!(state.len(), 2);
        assert_eq!(state.color(), BLUE);
        assert_eq!(state.saved_color(), RED);
    }

    #[test]
    fn test_collapse_into_previous_checkpoint() {
        let mut state = fresh();
        state.set_color(GREEN, false);
        assert_eq!(state.cursor(), 1);

        assert!(state.set_color(RED, false));
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.len(), 1);
        assert_eq!(state.color(), RED);
    }

    #[test]
    fn test_checkpoint_forks_new_entry() {
        let mut state = fresh();
        state.set_color(GREEN, false);
        assert!(state.save_checkpoint());

        state.set_color(BLUE, false);
        assert_eq!(state.len(), 3);
        assert_eq!(state.cursor(), 2);

        // Returning to the checkpointed value collapses the fork, not the checkpoint
        state.set_color(GREEN, false);
        assert_eq!(state.len(), 2);
        assert_eq!(state.color(), GREEN);
        assert!(!state.entries()[1].can_modify());
    }

    #[test]
    fn test_jump_to_existing_modifiable_entry() {
        let mut state = fresh();
        state.set_color(GREEN, false);
        state.undo();
        // Cursor is on the immutable default; an existing modifiable entry holds GREEN
        assert!(state.set_color(GREEN, false));
        assert_eq!(state.cursor(), 1);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_fork_discards_redo_history() {
        let mut state = fresh();
        state.set_color(GREEN, false);
        state.save_checkpoint();
        state.undo();
        state.set_color(BLUE, false);
        assert_eq!(state.len(), 2);
        assert_eq!(state.color(), BLUE);
        assert!(!state.can_redo());
    }

    #[test]
    fn test_set_hsv_preserves_alpha() {
        let mut state = ColorState::new(ColorId::Filling, 0x80ff_0000, 0x80ff_0000, None);
        assert!(state.set_hsv(HsvChannel::Hue, 120.0, false));
        assert_eq!(state.color(), 0x8000_ff00);
        assert_eq!(state.hsv(), [120.0, 1.0, 1.0]);
        assert!(!state.set_hsv(HsvChannel::Hue, 120.0, false));

        assert!(state.set_hsv(HsvChannel::Value, 0.0, true));
        assert_eq!(state.color(), 0x8000_0000);
        assert_eq!(state.saved_color(), 0x8000_0000);
        // Hue survives a trip through black
        assert_eq!(state.hsv()[0], 120.0);
    }

    #[test]
    fn test_set_hsv_collapses_back() {
        let mut state = fresh();
        state.set_hsv(HsvChannel::Saturation, 0.5, false);
        assert_eq!(state.len(), 2);
        state.set_hsv(HsvChannel::Saturation, 1.0, false);
        assert_eq!(state.len(), 1);
        assert_eq!(state.color(), RED);
    }

    #[test]
    fn test_alpha_only_change_keeps_hsv() {
        let mut state = ColorState::new(ColorId::Filling, 0xff80_8080, 0xff80_8080, None);
        state.set_hsv(HsvChannel::Hue, 200.0, false);
        assert_eq!(state.color(), 0xff80_8080);
        assert_eq!(state.len(), 2);
        state.set_color(0x4080_8080, false);
        assert_eq!(state.hsv()[0], 200.0);
    }

    #[test]
    fn test_remove_current_and_clear() {
        let mut state = fresh();
        assert!(!state.remove_current());
        state.set_color(GREEN, false);
        state.save_checkpoint();
        state.set_color(BLUE, false);
        assert!(state.remove_current());
        assert_eq!(state.color(), GREEN);
        assert!(state.clear());
        assert_eq!(state.len(), 1);
        assert_eq!(state.cursor(), 0);
        assert!(!state.clear());
    }

    #[test]
    fn test_restore_from_persisted_history() {
        let state = ColorState::new(ColorId::Filling, RED, BLUE, Some(vec![GREEN]));
        assert_eq!(state.len(), 3);
        assert_eq!(state.color(), BLUE);
        assert!(state.can_undo());
        assert_eq!(state.new_stack(), Some(vec![GREEN]));
        assert!(!state.is_history_changed());
    }

    #[test]
    fn test_new_stack_deduplicates_and_skips_saved_tail() {
        let mut state = fresh();
        assert_eq!(state.new_stack(), None);

        state.set_color(GREEN, false);
        state.save_checkpoint();
        state.set_color(BLUE, false);
        state.save_checkpoint();
        state.set_color(GREEN, true);
        assert_eq!(state.len(), 4);
        assert_eq!(state.new_stack(), Some(vec![GREEN, BLUE]));

        state.set_color(0xff12_3456, false);
        assert_eq!(state.new_stack(), Some(vec![GREEN, BLUE, 0xff12_3456]));
    }

    #[test]
    fn test_invariants_over_edit_sequence() {
        let mut state = fresh();
        let colors = [GREEN, BLUE, RED, 0xff12_3456, GREEN, 0xff00_0000];
        for (step, &color) in colors.iter().cycle().take(60).enumerate() {
            match step % 7 {
                0 | 1 => {
                    state.set_color(color, step % 2 == 0);
                }
                2 => {
                    state.set_hsv(HsvChannel::Value, (step % 5) as f32 / 4.0, false);
                }
                3 => {
                    state.save_checkpoint();
                }
                4 => {
                    let before = state.color();
                    if state.undo() {
                        state.redo();
                        assert_eq!(state.color(), before);
                    }
                }
                5 => {
                    state.undo();
                }
                _ => {
                    if step % 3 == 0 {
                        state.clear();
                    } else {
                        state.redo();
                    }
                }
            }
            assert_invariants(&state, RED);
        }
    }
}
