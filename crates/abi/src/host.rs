use std::fmt;

use serde::{Deserialize, Serialize};

/// Which host executable the extension is loaded into.
///
/// The game and the editor ship different builds of the same class hierarchy,
/// so table addresses, slot counts and unknown masks differ between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostTarget {
	#[default]
	Game,
	Editor,
}

impl fmt::Display for HostTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Game => write!(f, "game"),
			Self::Editor => write!(f, "editor"),
		}
	}
}

/// A value that differs between the game and editor builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerHost<T> {
	pub game: T,
	pub editor: T,
}

impl<T: Copy> PerHost<T> {
	pub const fn new(game: T, editor: T) -> Self {
		Self { game, editor }
	}

	pub fn get(&self, target: HostTarget) -> T {
		match target {
			HostTarget::Game => self.game,
			HostTarget::Editor => self.editor,
		}
	}
}
