use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Bitmask of dispatch-table slots whose signatures are unknown.
///
/// Slot `i` is bit `i % 32` of word `i / 32`, the layout integrators copy from
/// their class headers. The mask covers `32 * words` slots.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotMask(SmallVec<[u32; 4]>);

impl SlotMask {
	pub fn from_words(words: &[u32]) -> Self {
		Self(SmallVec::from_slice(words))
	}

	pub fn words(&self) -> &[u32] {
		&self.0
	}

	/// Number of slots the mask describes.
	pub fn slot_capacity(&self) -> usize {
		self.0.len() * 32
	}

	pub fn contains(&self, slot: usize) -> bool {
		self.0
			.get(slot / 32)
			.is_some_and(|word| (word >> (slot % 32)) & 1 == 1)
	}

	/// Iterates the unknown slot indices in ascending order.
	pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
		self.0.iter().enumerate().flat_map(|(w, &word)| {
			(0..32).filter(move |bit| (word >> bit) & 1 == 1).map(move |bit| w * 32 + bit)
		})
	}

	/// Number of unknown slots.
	pub fn count(&self) -> usize {
		self.0.iter().map(|w| w.count_ones() as usize).sum()
	}

	/// Highest unknown slot, if any.
	pub fn highest(&self) -> Option<usize> {
		self.0
			.iter()
			.enumerate()
			.rev()
			.find(|(_, w)| **w != 0)
			.map(|(i, w)| i * 32 + (31 - w.leading_zeros() as usize))
	}

	pub fn is_empty(&self) -> bool {
		self.0.iter().all(|w| *w == 0)
	}
}

/// One mask word, printed the way integrators write them.
struct Word(u32);

impl fmt::Debug for Word {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:#010X}", self.0)
	}
}

impl fmt::Debug for SlotMask {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.0.iter().map(|&w| Word(w))).finish()
	}
}
