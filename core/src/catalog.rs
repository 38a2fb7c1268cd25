//! Fixed set of puzzles shipped with the game.

use crate::{PuzzleDefinition, PuzzleEntry, PuzzleError};

/// Static description of a puzzle available in the catalog.
#[derive(Clone, Copy, Debug)]
pub struct PuzzleCatalogEntry {
    /// Human readable puzzle name.
    pub label: &'static str,
    /// Identifier used to select the puzzle.
    pub slug: &'static str,
    /// Pieces as `(name, asset, starter)` in target order.
    pub pieces: &'static [(&'static str, &'static str, bool)],
}

impl PuzzleCatalogEntry {
    /// Builds the validated puzzle definition described by the entry.
    pub fn definition(&self) -> Result<PuzzleDefinition, PuzzleError> {
        let entries = self
            .pieces
            .iter()
            .map(|(piece, asset, starter)| PuzzleEntry::new(*piece, *asset, *starter))
            .collect();
        PuzzleDefinition::new(self.slug, entries)
    }
}

/// Slug of the puzzle loaded when none is requested.
pub const DEFAULT_PUZZLE_SLUG: &str = "items-1";

/// Every puzzle bundled with the game.
pub const PUZZLE_CATALOG: &[PuzzleCatalogEntry] = &[PuzzleCatalogEntry {
    label: "Chain of Things",
    slug: DEFAULT_PUZZLE_SLUG,
    pieces: &[
        ("popcorn", "images/items-1/popcorn.webp", true),
        ("corn", "images/items-1/corn.webp", false),
        ("ear", "images/items-1/ear.webp", false),
        ("tunning-fork", "images/items-1/tunning-fork.webp", false),
        ("piano", "images/items-1/piano.webp", false),
        ("key", "images/items-1/key.webp", false),
        ("cage", "images/items-1/cage.webp", false),
        ("bird", "images/items-1/bird.webp", false),
        ("worm", "images/items-1/worm.webp", false),
        ("book", "images/items-1/book.webp", false),
        ("script", "images/items-1/script.webp", false),
        ("movie", "images/items-1/movie.webp", false),
    ],
}];

/// Looks up a catalog entry by slug, ignoring case and surrounding whitespace.
#[must_use]
pub fn puzzle_by_slug(slug: &str) -> Option<&'static PuzzleCatalogEntry> {
    let trimmed = slug.trim();
    PUZZLE_CATALOG
        .iter()
        .find(|entry| entry.slug.eq_ignore_ascii_case(trimmed))
}

/// Builds the default puzzle definition.
pub fn default_puzzle() -> Result<PuzzleDefinition, PuzzleError> {
    match puzzle_by_slug(DEFAULT_PUZZLE_SLUG) {
        Some(entry) => entry.definition(),
        None => Err(PuzzleError::WrongPieceCount { found: 0 }),
    }
}
