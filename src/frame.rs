//! Per-tick frame buffer.
//!
//! A [`Frame`] holds one [`Slot`] per LED. Slots the renderer had nothing to say
//! about stay [`Slot::Unchanged`] and are skipped when the frame is applied, so the
//! strip keeps the value it already holds.

use crate::strip::LedStrip;
use crate::Rgb;
use tracing::warn;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Slot {
    /// Leave whatever the strip currently shows
    #[default]
    Unchanged,
    Color(Rgb),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    slots: Vec<Slot>,
}

impl Frame {
    /// A frame of `len` unchanged slots.
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![Slot::Unchanged; len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Slot> {
        self.slots.get(index).copied()
    }

    /// Set a slot's colour. Indices past the end of the strip are dropped.
    pub fn set(&mut self, index: usize, color: Rgb) {
        match self.slots.get_mut(index) {
            Some(slot) => *slot = Slot::Color(color),
            None => warn!(
                "LED index {} is beyond the strip ({} LEDs), dropping",
                index,
                self.slots.len()
            ),
        }
    }

    /// Number of slots carrying a colour
    pub fn changed(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Color(_)))
            .count()
    }

    /// Write every coloured slot into the strip's buffer. Does not flush.
    pub fn apply_to<S: LedStrip + ?Sized>(&self, strip: &mut S) {
        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Color(color) = slot {
                strip.set_pixel(index, *color);
            }
        }
    }
}
