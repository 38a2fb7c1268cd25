#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sequence Ring engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

pub mod catalog;

use std::{collections::BTreeSet, fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Sequence Ring.";

/// Number of slots arranged around the board ring.
pub const BOARD_SLOT_COUNT: usize = 12;

/// Number of checks granted to the player at the start of a game.
pub const DEFAULT_TOTAL_TRIES: u32 = 5;

/// Logical time taken by a full check reveal sequence.
pub const DEFAULT_CHECK_DURATION: Duration = Duration::from_secs(2);

/// Opaque identifier naming one of the puzzle's game objects.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Piece(String);

impl Piece {
    /// Creates a piece identifier from the provided name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the piece.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Index of a slot on the board ring.
///
/// Slot `i` neighbours slots `i - 1` and `i + 1` modulo [`BOARD_SLOT_COUNT`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoardSlot(u8);

impl BoardSlot {
    /// Creates a board slot, returning `None` when the index lies outside the ring.
    #[must_use]
    pub fn new(index: usize) -> Option<Self> {
        if index < BOARD_SLOT_COUNT {
            u8::try_from(index).ok().map(Self)
        } else {
            None
        }
    }

    /// Zero-based position of the slot around the ring.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0 as usize
    }

    /// Clockwise neighbour of the slot.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(((self.0 as usize + 1) % BOARD_SLOT_COUNT) as u8)
    }

    /// Counter-clockwise neighbour of the slot.
    #[must_use]
    pub const fn previous(self) -> Self {
        Self(((self.0 as usize + BOARD_SLOT_COUNT - 1) % BOARD_SLOT_COUNT) as u8)
    }

    /// Iterates every board slot in ring order.
    pub fn all() -> impl Iterator<Item = BoardSlot> {
        (0..BOARD_SLOT_COUNT as u8).map(Self)
    }
}

impl fmt::Display for BoardSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a cell within the tray.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TraySlot(usize);

impl TraySlot {
    /// Creates a new tray slot wrapper.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Retrieves the underlying tray index.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// Place a piece can be taken from or moved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    /// A slot on the board ring.
    Board(BoardSlot),
    /// A cell within the tray.
    Tray(TraySlot),
}

impl Location {
    /// Board slot referenced by the location, if any.
    #[must_use]
    pub const fn board_slot(&self) -> Option<BoardSlot> {
        match self {
            Self::Board(slot) => Some(*slot),
            Self::Tray(_) => None,
        }
    }

    /// Tray slot referenced by the location, if any.
    #[must_use]
    pub const fn tray_slot(&self) -> Option<TraySlot> {
        match self {
            Self::Board(_) => None,
            Self::Tray(slot) => Some(*slot),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Board(slot) => write!(f, "board {slot}"),
            Self::Tray(slot) => write!(f, "tray {}", slot.get()),
        }
    }
}

/// Piece picked up by the player together with where it was picked from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// Piece currently held by the selection.
    pub piece: Piece,
    /// Location the piece was selected from.
    pub source: Location,
}

/// Lifecycle state of a single game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    /// The player may still move pieces and request checks.
    Playing,
    /// Every slot matched the target order.
    Won,
    /// The player ran out of tries.
    Failed,
}

impl GameStatus {
    /// Reports whether the game can no longer change without a reset.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

/// Result of comparing a single board slot against the target order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotOutcome {
    /// The slot holds its target piece.
    Correct,
    /// The slot is empty or holds another piece.
    Wrong,
}

impl SlotOutcome {
    /// Reports whether the outcome is [`SlotOutcome::Correct`].
    #[must_use]
    pub const fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// Identifies one check within one game.
///
/// The generation changes every time a game is (re)initialised, so reveal
/// commands scheduled for an earlier game never match the active check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckTicket {
    generation: u64,
    attempt: u32,
}

impl CheckTicket {
    /// Creates a ticket for the provided game generation and check attempt.
    #[must_use]
    pub const fn new(generation: u64, attempt: u32) -> Self {
        Self {
            generation,
            attempt,
        }
    }

    /// Game generation the check belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// One-based index of the check within its game.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Outcome committed for a single slot during a check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotReveal {
    /// Board slot that was revealed.
    pub slot: BoardSlot,
    /// Result of the comparison.
    pub outcome: SlotOutcome,
}

/// Shape of a committed piece movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementKind {
    /// The piece moved into an empty cell.
    Move,
    /// The piece traded places with the target's occupant.
    Swap,
    /// The piece changed position within the tray.
    Reorder,
}

/// Reasons a move request may be rejected by the world.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum MoveRejection {
    /// The game is over, so pieces can no longer move.
    #[error("the game is over")]
    GameOver,
    /// No piece is selected.
    #[error("no piece is selected")]
    NoSelection,
    /// Source and target name the same location.
    #[error("source and target are the same location")]
    SameLocation,
    /// The target slot holds a validated piece.
    #[error("board slot {slot} is locked")]
    TargetLocked {
        /// Locked slot named as the target.
        slot: BoardSlot,
    },
    /// The source slot holds a validated piece.
    #[error("board slot {slot} is locked")]
    SourceLocked {
        /// Locked slot named as the source.
        slot: BoardSlot,
    },
    /// The piece is no longer where the request claims it is.
    #[error("piece {piece} is no longer at its source")]
    StalePiece {
        /// Piece named by the stale request.
        piece: Piece,
    },
    /// The request named a tray cell that does not exist.
    #[error("{location} does not exist")]
    OutOfRange {
        /// Location that could not be resolved.
        location: Location,
    },
}

/// Reasons a selection request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SelectionRejection {
    /// The game is over, so nothing can be selected.
    #[error("the game is over")]
    GameOver,
    /// The requested location holds no piece.
    #[error("the location is empty")]
    EmptySource,
    /// The requested slot holds a validated piece.
    #[error("board slot {slot} is locked")]
    Locked {
        /// Locked slot that was requested.
        slot: BoardSlot,
    },
    /// The requested tray cell does not exist.
    #[error("the location does not exist")]
    OutOfRange,
}

/// Reasons a check request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum CheckRejection {
    /// The game is over, so no more checks are accepted.
    #[error("the game is over")]
    GameOver,
    /// A check is already revealing its results.
    #[error("a check is already in progress")]
    AlreadyChecking,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Discards the current game and starts a fresh one.
    NewGame {
        /// Seed used to shuffle the tray.
        seed: u64,
    },
    /// Selects the piece at `source`, or clears the selection when it is already selected.
    SelectOrToggle {
        /// Location holding the piece to select.
        source: Location,
    },
    /// Clears the active selection, if any.
    ClearSelection,
    /// Moves the selected piece to the target location.
    MoveSelection {
        /// Location receiving the selected piece.
        target: Location,
    },
    /// Moves a dragged piece from its source to the target location.
    MovePiece {
        /// Piece the drag surface reports as dragged.
        piece: Piece,
        /// Location the drag started from.
        source: Location,
        /// Location the piece was dropped on.
        target: Location,
    },
    /// Starts evaluating the board against the target order.
    RequestCheck,
    /// Advances the logical clock by the provided delta time.
    Tick {
        /// Duration of logical time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Commits the outcome of a single slot for the identified check.
    RevealSlot {
        /// Check the reveal belongs to.
        ticket: CheckTicket,
        /// Slot whose outcome should be committed.
        slot: BoardSlot,
    },
    /// Resolves the identified check once every slot has been revealed.
    FinalizeCheck {
        /// Check to resolve.
        ticket: CheckTicket,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// A fresh game was initialised.
    GameStarted {
        /// Generation assigned to the new game.
        generation: u64,
    },
    /// The active selection changed.
    SelectionChanged {
        /// Selection after the change.
        selection: Option<Selection>,
    },
    /// A selection request was rejected.
    SelectionRejected {
        /// Location named by the request.
        source: Location,
        /// Specific reason the selection failed.
        reason: SelectionRejection,
    },
    /// A piece moved between locations.
    PieceMoved {
        /// Piece that moved.
        piece: Piece,
        /// Location the piece left.
        from: Location,
        /// Location the piece now occupies.
        to: Location,
        /// Shape of the movement.
        kind: PlacementKind,
        /// Piece sent back to `from` by a swap, if any.
        displaced: Option<Piece>,
    },
    /// A move request was rejected.
    MoveRejected {
        /// Location named as the move target.
        target: Location,
        /// Specific reason the move failed.
        reason: MoveRejection,
    },
    /// A check began revealing results.
    CheckStarted {
        /// Identifier of the new check.
        ticket: CheckTicket,
    },
    /// A check request was rejected.
    CheckRejected {
        /// Specific reason the check was refused.
        reason: CheckRejection,
    },
    /// The outcome of a single slot was committed.
    SlotRevealed {
        /// Check the reveal belongs to.
        ticket: CheckTicket,
        /// Slot that was revealed.
        slot: BoardSlot,
        /// Committed outcome.
        outcome: SlotOutcome,
    },
    /// An emptied tray cell was dropped after its piece was locked on the board.
    TrayCellRemoved {
        /// Index the removed cell occupied.
        slot: TraySlot,
    },
    /// A check finished revealing results.
    CheckFinished {
        /// Identifier of the finished check.
        ticket: CheckTicket,
        /// Whether every slot matched the target order.
        all_correct: bool,
        /// Tries left after resolving the check.
        tries_remaining: u32,
    },
    /// The game entered a new status.
    StatusChanged {
        /// Status after the transition.
        status: GameStatus,
    },
    /// Indicates that the logical clock advanced.
    TimeAdvanced {
        /// Duration of logical time that elapsed in the tick.
        dt: Duration,
    },
}

/// Reveal state of the current or most recent check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckProgress {
    /// Whether the check is still revealing results.
    pub in_flight: bool,
    /// Reveals committed so far, in slot order.
    pub reveals: Vec<SlotReveal>,
}

impl CheckProgress {
    /// Number of slots revealed so far.
    #[must_use]
    pub fn revealed_count(&self) -> usize {
        self.reveals.len()
    }

    /// Outcome revealed for the slot, if it has been reached.
    #[must_use]
    pub fn outcome(&self, slot: BoardSlot) -> Option<SlotOutcome> {
        self.reveals
            .iter()
            .find(|reveal| reveal.slot == slot)
            .map(|reveal| reveal.outcome)
    }

    /// Reports whether any check has produced feedback since the game started.
    #[must_use]
    pub fn has_ever_checked(&self) -> bool {
        self.in_flight || !self.reveals.is_empty()
    }
}

/// Read-only snapshot of the game state handed to renderers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Contents of the board ring in slot order.
    pub board: Vec<Option<Piece>>,
    /// Contents of the tray in display order.
    pub tray: Vec<Option<Piece>>,
    /// Active selection, if any.
    pub selection: Option<Selection>,
    /// Slots validated as correct and locked.
    pub correct_positions: BTreeSet<BoardSlot>,
    /// Slots flagged as wrong by a check and not changed since.
    pub wrong_positions: BTreeSet<BoardSlot>,
    /// Checks the player may still fail.
    pub tries_remaining: u32,
    /// Checks granted at the start of the game.
    pub total_tries: u32,
    /// Lifecycle state of the game.
    pub status: GameStatus,
    /// Whether the board changed since the last check started.
    pub has_changes: bool,
    /// Reveal state of the current or most recent check.
    pub check_progress: CheckProgress,
}

impl GameSnapshot {
    /// Reports whether the board slot is locked.
    #[must_use]
    pub fn is_locked(&self, slot: BoardSlot) -> bool {
        self.correct_positions.contains(&slot)
    }

    /// Reports whether the board slot is flagged wrong.
    #[must_use]
    pub fn is_wrong(&self, slot: BoardSlot) -> bool {
        self.wrong_positions.contains(&slot)
    }

    /// Piece occupying the location, if any.
    #[must_use]
    pub fn occupant(&self, location: Location) -> Option<&Piece> {
        match location {
            Location::Board(slot) => self.board.get(slot.get()).and_then(Option::as_ref),
            Location::Tray(slot) => self.tray.get(slot.get()).and_then(Option::as_ref),
        }
    }

    /// Reports whether a check is revealing results.
    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.check_progress.in_flight
    }

    /// Reports whether the check action should be offered to the player.
    #[must_use]
    pub fn check_enabled(&self) -> bool {
        self.has_changes && self.status == GameStatus::Playing && !self.is_checking()
    }
}

/// Reasons a puzzle definition may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PuzzleError {
    /// The definition does not provide one entry per board slot.
    #[error("expected 12 pieces, found {found}")]
    WrongPieceCount {
        /// Number of entries provided.
        found: usize,
    },
    /// Two entries share a piece name.
    #[error("piece {piece} appears more than once")]
    DuplicatePiece {
        /// Name that appeared twice.
        piece: Piece,
    },
    /// No entry is marked as the starter.
    #[error("no starter piece is marked")]
    MissingStarter,
    /// More than one entry is marked as the starter.
    #[error("more than one starter piece is marked")]
    MultipleStarters,
}

/// Single entry of a puzzle: a piece, its artwork, and whether it starts on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleEntry {
    /// Piece placed at this entry's position in the target order.
    pub piece: Piece,
    /// Path of the artwork presenting the piece.
    pub asset: String,
    /// Whether the piece is pre-placed and locked at game start.
    pub starter: bool,
}

impl PuzzleEntry {
    /// Creates a new puzzle entry.
    #[must_use]
    pub fn new(piece: impl Into<String>, asset: impl Into<String>, starter: bool) -> Self {
        Self {
            piece: Piece::new(piece),
            asset: asset.into(),
            starter,
        }
    }
}

/// Immutable description of a puzzle: the target order and its starter piece.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleDefinition {
    slug: String,
    entries: Vec<PuzzleEntry>,
    starter_slot: BoardSlot,
}

impl PuzzleDefinition {
    /// Validates the entries and builds a puzzle definition.
    ///
    /// Entries are listed in target order, so entry `i` belongs in board slot `i`.
    pub fn new(slug: impl Into<String>, entries: Vec<PuzzleEntry>) -> Result<Self, PuzzleError> {
        if entries.len() != BOARD_SLOT_COUNT {
            return Err(PuzzleError::WrongPieceCount {
                found: entries.len(),
            });
        }

        let mut seen = BTreeSet::new();
        for entry in &entries {
            if !seen.insert(&entry.piece) {
                return Err(PuzzleError::DuplicatePiece {
                    piece: entry.piece.clone(),
                });
            }
        }

        let mut starters = entries.iter().enumerate().filter(|(_, entry)| entry.starter);
        let starter_index = match (starters.next(), starters.next()) {
            (Some((index, _)), None) => index,
            (None, _) => return Err(PuzzleError::MissingStarter),
            (Some(_), Some(_)) => return Err(PuzzleError::MultipleStarters),
        };
        let starter_slot = BoardSlot::new(starter_index).ok_or(PuzzleError::WrongPieceCount {
            found: entries.len(),
        })?;

        Ok(Self {
            slug: slug.into(),
            entries,
            starter_slot,
        })
    }

    /// Catalog identifier of the puzzle.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Piece that belongs in the provided slot.
    #[must_use]
    pub fn target_at(&self, slot: BoardSlot) -> &Piece {
        &self.entries[slot.get()].piece
    }

    /// Iterates the target order in slot order.
    pub fn target_order(&self) -> impl Iterator<Item = &Piece> {
        self.entries.iter().map(|entry| &entry.piece)
    }

    /// Slot the starter piece occupies from game start.
    #[must_use]
    pub const fn starter_slot(&self) -> BoardSlot {
        self.starter_slot
    }

    /// Piece pre-placed on the board at game start.
    #[must_use]
    pub fn starter_piece(&self) -> &Piece {
        self.target_at(self.starter_slot)
    }

    /// Artwork path associated with the piece, if it belongs to the puzzle.
    #[must_use]
    pub fn asset(&self, piece: &Piece) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| &entry.piece == piece)
            .map(|entry| entry.asset.as_str())
    }

    /// Iterates the pieces that start in the tray, in target order.
    pub fn tray_pieces(&self) -> impl Iterator<Item = &Piece> {
        self.entries
            .iter()
            .filter(|entry| !entry.starter)
            .map(|entry| &entry.piece)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        catalog, BoardSlot, CheckProgress, GameSnapshot, GameStatus, Location, Piece,
        PuzzleDefinition, PuzzleEntry, PuzzleError, SlotOutcome, SlotReveal, TraySlot,
        BOARD_SLOT_COUNT,
    };
    use std::collections::BTreeSet;

    fn entries() -> Vec<PuzzleEntry> {
        (0..BOARD_SLOT_COUNT)
            .map(|index| PuzzleEntry::new(format!("p{index}"), format!("p{index}.webp"), index == 3))
            .collect()
    }

    #[test]
    fn board_slots_wrap_around_the_ring() {
        let last = BoardSlot::new(11).expect("slot 11 exists");
        let first = BoardSlot::new(0).expect("slot 0 exists");
        assert_eq!(last.next(), first);
        assert_eq!(first.previous(), last);
        assert!(BoardSlot::new(BOARD_SLOT_COUNT).is_none());
        assert_eq!(BoardSlot::all().count(), BOARD_SLOT_COUNT);
    }

    #[test]
    fn puzzle_definition_locates_starter() {
        let puzzle = PuzzleDefinition::new("test", entries()).expect("valid puzzle");
        assert_eq!(puzzle.starter_slot().get(), 3);
        assert_eq!(puzzle.starter_piece(), &Piece::new("p3"));
        assert_eq!(puzzle.tray_pieces().count(), BOARD_SLOT_COUNT - 1);
        assert_eq!(puzzle.asset(&Piece::new("p5")), Some("p5.webp"));
        assert_eq!(puzzle.asset(&Piece::new("missing")), None);
    }

    #[test]
    fn puzzle_definition_rejects_malformed_entries() {
        let mut short = entries();
        let _ = short.pop();
        assert_eq!(
            PuzzleDefinition::new("short", short),
            Err(PuzzleError::WrongPieceCount { found: 11 })
        );

        let mut duplicate = entries();
        duplicate[7].piece = Piece::new("p1");
        assert_eq!(
            PuzzleDefinition::new("duplicate", duplicate),
            Err(PuzzleError::DuplicatePiece {
                piece: Piece::new("p1")
            })
        );

        let mut no_starter = entries();
        no_starter[3].starter = false;
        assert_eq!(
            PuzzleDefinition::new("none", no_starter),
            Err(PuzzleError::MissingStarter)
        );

        let mut two_starters = entries();
        two_starters[0].starter = true;
        assert_eq!(
            PuzzleDefinition::new("two", two_starters),
            Err(PuzzleError::MultipleStarters)
        );
    }

    #[test]
    fn catalog_puzzles_are_valid() {
        for entry in catalog::PUZZLE_CATALOG {
            let puzzle = entry.definition().expect("catalog puzzle is valid");
            assert_eq!(puzzle.slug(), entry.slug);
        }
    }

    #[test]
    fn snapshot_round_trips_through_bincode() {
        let slot = BoardSlot::new(4).expect("slot exists");
        let snapshot = GameSnapshot {
            board: vec![Some(Piece::new("corn")), None],
            tray: vec![None, Some(Piece::new("ear"))],
            selection: None,
            correct_positions: BTreeSet::from([slot]),
            wrong_positions: BTreeSet::new(),
            tries_remaining: 4,
            total_tries: 5,
            status: GameStatus::Playing,
            has_changes: true,
            check_progress: CheckProgress {
                in_flight: false,
                reveals: vec![SlotReveal {
                    slot,
                    outcome: SlotOutcome::Correct,
                }],
            },
        };

        let bytes = bincode::serialize(&snapshot).expect("serialize");
        let restored: GameSnapshot = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, snapshot);
        assert_eq!(
            restored.occupant(Location::Tray(TraySlot::new(1))),
            Some(&Piece::new("ear"))
        );
        assert!(restored.check_enabled());
    }
}
