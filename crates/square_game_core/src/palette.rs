//! Card colors and the ordered palette cards are painted from.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::instrument;

use crate::error::PaletteError;
use crate::types::Card;

/// A card face color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[allow(missing_docs)]
pub enum Color {
    Blue,
    Red,
    Green,
    Orange,
    Purple,
    Pink,
    Yellow,
    Cyan,
    Mint,
    Indigo,
    Teal,
    Brown,
}

/// Ordered set of distinct colors.
///
/// Pair `i` is painted with color `i mod len`, so a palette shorter than the
/// pair count is reused cyclically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    colors: Vec<Color>,
}

impl ColorPalette {
    /// Creates a palette from an ordered list of colors.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::Empty`] for an empty list and
    /// [`PaletteError::Duplicate`] when a color repeats.
    #[instrument]
    pub fn new(colors: Vec<Color>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        for (i, color) in colors.iter().enumerate() {
            if colors[..i].contains(color) {
                return Err(PaletteError::Duplicate(*color));
            }
        }
        Ok(Self { colors })
    }

    /// Number of distinct colors.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; palettes are validated non-empty.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The colors in palette order.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Color for a pair index, or `None` for negative (bonus) indices.
    pub fn get(&self, color_index: i32) -> Option<Color> {
        let index = usize::try_from(color_index).ok()?;
        self.colors.get(index % self.colors.len()).copied()
    }

    /// Color a card is painted with; `None` for the bonus card.
    pub fn color_of(&self, card: &Card) -> Option<Color> {
        if card.is_bonus {
            return None;
        }
        self.get(card.color_index)
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            colors: Color::iter().collect(),
        }
    }
}
