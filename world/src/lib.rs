#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative game state for Sequence Ring.
//!
//! All mutation funnels through [`apply`]. Requests that cannot be honoured
//! leave the state untouched and are answered with a rejection event.

use std::collections::BTreeSet;

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sequence_ring_core::{
    BoardSlot, CheckRejection, CheckTicket, Command, Event, GameStatus, Location, MoveRejection,
    Piece, PuzzleDefinition, Selection, SelectionRejection, SlotReveal, TraySlot, BOARD_SLOT_COUNT,
    DEFAULT_TOTAL_TRIES, WELCOME_BANNER,
};
use sequence_ring_system_check::evaluate_slot;
use sequence_ring_system_placement::place;

const DEFAULT_SHUFFLE_SEED: u64 = 0x5eed_12c4_a1f0_9b37;

/// Configuration parameters required to construct the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    total_tries: u32,
    seed: u64,
}

impl Config {
    /// Creates a configuration granting `total_tries` checks and shuffling the tray with `seed`.
    #[must_use]
    pub const fn new(total_tries: u32, seed: u64) -> Self {
        Self { total_tries, seed }
    }

    /// Number of checks granted at the start of each game.
    #[must_use]
    pub const fn total_tries(&self) -> u32 {
        self.total_tries
    }

    /// Seed used to shuffle the tray of the first game.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL_TRIES, DEFAULT_SHUFFLE_SEED)
    }
}

#[derive(Clone, Copy, Debug)]
struct ActiveCheck {
    ticket: CheckTicket,
    next_slot: usize,
}

/// Represents the authoritative Sequence Ring game state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    puzzle: PuzzleDefinition,
    total_tries: u32,
    board: Vec<Option<Piece>>,
    tray: Vec<Option<Piece>>,
    selection: Option<Selection>,
    correct: BTreeSet<BoardSlot>,
    wrong: BTreeSet<BoardSlot>,
    tries_remaining: u32,
    status: GameStatus,
    last_checked_board: Vec<Option<Piece>>,
    has_changes: bool,
    generation: u64,
    attempts: u32,
    active_check: Option<ActiveCheck>,
    reveals: Vec<SlotReveal>,
}

impl World {
    /// Creates a world for the provided puzzle with its first game already dealt.
    #[must_use]
    pub fn new(puzzle: PuzzleDefinition, config: Config) -> Self {
        let mut world = Self {
            banner: WELCOME_BANNER,
            puzzle,
            total_tries: config.total_tries,
            board: Vec::new(),
            tray: Vec::new(),
            selection: None,
            correct: BTreeSet::new(),
            wrong: BTreeSet::new(),
            tries_remaining: config.total_tries,
            status: GameStatus::Playing,
            last_checked_board: Vec::new(),
            has_changes: false,
            generation: 0,
            attempts: 0,
            active_check: None,
            reveals: Vec::new(),
        };
        world.deal(config.seed);
        world
    }

    fn deal(&mut self, seed: u64) {
        let mut pieces: Vec<Piece> = self.puzzle.tray_pieces().cloned().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        pieces.shuffle(&mut rng);

        let starter = self.puzzle.starter_slot();
        self.board = vec![None; BOARD_SLOT_COUNT];
        self.board[starter.get()] = Some(self.puzzle.starter_piece().clone());
        self.tray = pieces.into_iter().map(Some).collect();
        self.selection = None;
        self.correct = BTreeSet::from([starter]);
        self.wrong.clear();
        self.tries_remaining = self.total_tries;
        self.status = GameStatus::Playing;
        self.last_checked_board = self.board.clone();
        self.has_changes = false;
        self.generation = self.generation.wrapping_add(1);
        self.attempts = 0;
        self.active_check = None;
        self.reveals.clear();
    }

    fn occupant(&self, location: Location) -> Option<&Piece> {
        match location {
            Location::Board(slot) => self.board.get(slot.get()).and_then(Option::as_ref),
            Location::Tray(slot) => self.tray.get(slot.get()).and_then(Option::as_ref),
        }
    }

    fn clear_selection(&mut self, out_events: &mut Vec<Event>) {
        if self.selection.take().is_some() {
            out_events.push(Event::SelectionChanged { selection: None });
        }
    }

    fn select(&mut self, source: Location, out_events: &mut Vec<Event>) {
        if self.status.is_terminal() {
            reject_selection(source, SelectionRejection::GameOver, out_events);
            return;
        }

        if self
            .selection
            .as_ref()
            .is_some_and(|selection| selection.source == source)
        {
            self.clear_selection(out_events);
            return;
        }

        if let Location::Board(slot) = source {
            if self.correct.contains(&slot) {
                reject_selection(source, SelectionRejection::Locked { slot }, out_events);
                return;
            }
        }
        if let Location::Tray(slot) = source {
            if slot.get() >= self.tray.len() {
                reject_selection(source, SelectionRejection::OutOfRange, out_events);
                return;
            }
        }

        let Some(piece) = self.occupant(source).cloned() else {
            reject_selection(source, SelectionRejection::EmptySource, out_events);
            return;
        };

        let selection = Selection { piece, source };
        self.selection = Some(selection.clone());
        out_events.push(Event::SelectionChanged {
            selection: Some(selection),
        });
    }

    fn move_selection(&mut self, target: Location, out_events: &mut Vec<Event>) {
        if self.status.is_terminal() {
            reject_move(target, MoveRejection::GameOver, out_events);
            return;
        }
        let Some(selection) = self.selection.clone() else {
            reject_move(target, MoveRejection::NoSelection, out_events);
            return;
        };

        if let Err(reason) = self.commit_move(&selection.piece, selection.source, target, out_events)
        {
            let stale = matches!(reason, MoveRejection::StalePiece { .. });
            reject_move(target, reason, out_events);
            if stale {
                self.clear_selection(out_events);
            }
        }
    }

    fn move_piece(
        &mut self,
        piece: &Piece,
        source: Location,
        target: Location,
        out_events: &mut Vec<Event>,
    ) {
        if self.status.is_terminal() {
            reject_move(target, MoveRejection::GameOver, out_events);
            return;
        }
        if let Err(reason) = self.commit_move(piece, source, target, out_events) {
            reject_move(target, reason, out_events);
        }
    }

    fn commit_move(
        &mut self,
        piece: &Piece,
        source: Location,
        target: Location,
        out_events: &mut Vec<Event>,
    ) -> Result<(), MoveRejection> {
        let placement = place(&self.board, &self.tray, &self.correct, piece, source, target)?;

        self.board = placement.board;
        self.tray = placement.tray;
        for slot in [source.board_slot(), target.board_slot()].into_iter().flatten() {
            let _ = self.wrong.remove(&slot);
        }
        self.refresh_changes();

        out_events.push(Event::PieceMoved {
            piece: piece.clone(),
            from: source,
            to: target,
            kind: placement.kind,
            displaced: placement.displaced,
        });
        self.clear_selection(out_events);
        Ok(())
    }

    fn refresh_changes(&mut self) {
        self.has_changes = self.board != self.last_checked_board;
    }

    fn request_check(&mut self, out_events: &mut Vec<Event>) {
        let reason = if self.status.is_terminal() {
            Some(CheckRejection::GameOver)
        } else if self.active_check.is_some() {
            Some(CheckRejection::AlreadyChecking)
        } else {
            None
        };
        if let Some(reason) = reason {
            tracing::debug!(%reason, "check rejected");
            out_events.push(Event::CheckRejected { reason });
            return;
        }

        self.attempts = self.attempts.saturating_add(1);
        let ticket = CheckTicket::new(self.generation, self.attempts);
        self.last_checked_board = self.board.clone();
        self.has_changes = false;
        self.reveals.clear();
        self.active_check = Some(ActiveCheck {
            ticket,
            next_slot: 0,
        });
        tracing::debug!(?ticket, "check started");
        out_events.push(Event::CheckStarted { ticket });
    }

    fn active_check_for(&self, ticket: CheckTicket) -> Option<ActiveCheck> {
        match self.active_check {
            Some(active) if active.ticket == ticket => Some(active),
            _ => {
                tracing::debug!(?ticket, "ignoring command for an inactive check");
                None
            }
        }
    }

    fn reveal_slot(&mut self, ticket: CheckTicket, slot: BoardSlot, out_events: &mut Vec<Event>) {
        let Some(active) = self.active_check_for(ticket) else {
            return;
        };
        if slot.get() != active.next_slot {
            tracing::warn!(
                ?ticket,
                %slot,
                expected = active.next_slot,
                "ignoring out of order reveal"
            );
            return;
        }

        let outcome = evaluate_slot(
            self.board[slot.get()].as_ref(),
            self.puzzle.target_at(slot),
        );
        self.active_check = Some(ActiveCheck {
            ticket,
            next_slot: active.next_slot + 1,
        });
        self.reveals.push(SlotReveal { slot, outcome });
        out_events.push(Event::SlotRevealed {
            ticket,
            slot,
            outcome,
        });

        if !outcome.is_correct() {
            let _ = self.wrong.insert(slot);
            return;
        }
        let _ = self.wrong.remove(&slot);
        if !self.correct.insert(slot) {
            return;
        }

        if self
            .selection
            .as_ref()
            .is_some_and(|selection| selection.source == Location::Board(slot))
        {
            self.clear_selection(out_events);
        }
        self.drop_empty_tray_cell(out_events);
    }

    fn drop_empty_tray_cell(&mut self, out_events: &mut Vec<Event>) {
        let Some(index) = self.tray.iter().rposition(Option::is_none) else {
            tracing::warn!("no empty tray cell left to drop after locking a slot");
            return;
        };
        let _ = self.tray.remove(index);

        if let Some(selection) = self.selection.as_mut() {
            if let Location::Tray(slot) = selection.source {
                if slot.get() > index {
                    selection.source = Location::Tray(TraySlot::new(slot.get() - 1));
                    out_events.push(Event::SelectionChanged {
                        selection: Some(selection.clone()),
                    });
                }
            }
        }
        out_events.push(Event::TrayCellRemoved {
            slot: TraySlot::new(index),
        });
    }

    fn finalize_check(&mut self, ticket: CheckTicket, out_events: &mut Vec<Event>) {
        let Some(active) = self.active_check_for(ticket) else {
            return;
        };
        if active.next_slot < BOARD_SLOT_COUNT {
            tracing::warn!(
                ?ticket,
                revealed = active.next_slot,
                "ignoring finalisation before every slot was revealed"
            );
            return;
        }

        self.active_check = None;
        let all_correct = self.correct.len() == BOARD_SLOT_COUNT;
        let status = if all_correct {
            GameStatus::Won
        } else {
            self.tries_remaining = self.tries_remaining.saturating_sub(1);
            if self.tries_remaining == 0 {
                GameStatus::Failed
            } else {
                GameStatus::Playing
            }
        };

        tracing::info!(
            ?ticket,
            all_correct,
            tries_remaining = self.tries_remaining,
            "check finished"
        );
        out_events.push(Event::CheckFinished {
            ticket,
            all_correct,
            tries_remaining: self.tries_remaining,
        });

        if status != self.status {
            self.status = status;
            if status.is_terminal() {
                self.clear_selection(out_events);
            }
            out_events.push(Event::StatusChanged { status });
        }
    }
}

fn reject_selection(source: Location, reason: SelectionRejection, out_events: &mut Vec<Event>) {
    tracing::debug!(%source, %reason, "selection rejected");
    out_events.push(Event::SelectionRejected { source, reason });
}

fn reject_move(target: Location, reason: MoveRejection, out_events: &mut Vec<Event>) {
    tracing::debug!(%target, %reason, "move rejected");
    out_events.push(Event::MoveRejected { target, reason });
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::NewGame { seed } => {
            world.deal(seed);
            tracing::info!(generation = world.generation, "new game dealt");
            out_events.push(Event::GameStarted {
                generation: world.generation,
            });
        }
        Command::SelectOrToggle { source } => world.select(source, out_events),
        Command::ClearSelection => world.clear_selection(out_events),
        Command::MoveSelection { target } => world.move_selection(target, out_events),
        Command::MovePiece {
            piece,
            source,
            target,
        } => world.move_piece(&piece, source, target, out_events),
        Command::RequestCheck => world.request_check(out_events),
        Command::Tick { dt } => out_events.push(Event::TimeAdvanced { dt }),
        Command::RevealSlot { ticket, slot } => world.reveal_slot(ticket, slot, out_events),
        Command::FinalizeCheck { ticket } => world.finalize_check(ticket, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeSet;

    use sequence_ring_core::{
        BoardSlot, CheckProgress, CheckTicket, GameSnapshot, GameStatus, Piece, PuzzleDefinition,
        Selection,
    };

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Puzzle the world is playing.
    #[must_use]
    pub fn puzzle(world: &World) -> &PuzzleDefinition {
        &world.puzzle
    }

    /// Captures everything a renderer needs in a single owned snapshot.
    #[must_use]
    pub fn snapshot(world: &World) -> GameSnapshot {
        GameSnapshot {
            board: world.board.clone(),
            tray: world.tray.clone(),
            selection: world.selection.clone(),
            correct_positions: world.correct.clone(),
            wrong_positions: world.wrong.clone(),
            tries_remaining: world.tries_remaining,
            total_tries: world.total_tries,
            status: world.status,
            has_changes: world.has_changes,
            check_progress: check_progress(world),
        }
    }

    /// Board contents in slot order.
    #[must_use]
    pub fn board(world: &World) -> &[Option<Piece>] {
        &world.board
    }

    /// Tray contents in display order.
    #[must_use]
    pub fn tray(world: &World) -> &[Option<Piece>] {
        &world.tray
    }

    /// Active selection, if any.
    #[must_use]
    pub fn selection(world: &World) -> Option<&Selection> {
        world.selection.as_ref()
    }

    /// Slots validated as correct and locked.
    #[must_use]
    pub fn correct_positions(world: &World) -> &BTreeSet<BoardSlot> {
        &world.correct
    }

    /// Slots flagged wrong since their last change.
    #[must_use]
    pub fn wrong_positions(world: &World) -> &BTreeSet<BoardSlot> {
        &world.wrong
    }

    /// Checks the player may still fail.
    #[must_use]
    pub fn tries_remaining(world: &World) -> u32 {
        world.tries_remaining
    }

    /// Checks granted at the start of each game.
    #[must_use]
    pub fn total_tries(world: &World) -> u32 {
        world.total_tries
    }

    /// Lifecycle state of the current game.
    #[must_use]
    pub fn status(world: &World) -> GameStatus {
        world.status
    }

    /// Whether the board differs from the board captured when the last check started.
    #[must_use]
    pub fn has_changes(world: &World) -> bool {
        world.has_changes
    }

    /// Whether a check is revealing results.
    #[must_use]
    pub fn is_checking(world: &World) -> bool {
        world.active_check.is_some()
    }

    /// Whether the check action should be offered to the player.
    #[must_use]
    pub fn check_enabled(world: &World) -> bool {
        world.has_changes && world.status == GameStatus::Playing && !is_checking(world)
    }

    /// Ticket of the check currently revealing results.
    #[must_use]
    pub fn active_ticket(world: &World) -> Option<CheckTicket> {
        world.active_check.map(|active| active.ticket)
    }

    /// Reveal state of the current or most recent check.
    #[must_use]
    pub fn check_progress(world: &World) -> CheckProgress {
        CheckProgress {
            in_flight: is_checking(world),
            reveals: world.reveals.clone(),
        }
    }

    /// Generation of the current game, incremented by every new game.
    #[must_use]
    pub fn generation(world: &World) -> u64 {
        world.generation
    }
}
