#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure placement rules that compute the result of moving a piece.
//!
//! [`place`] never mutates its inputs. It re-verifies that the piece is still
//! where the request claims before producing new board and tray contents, so
//! duplicate or overlapping requests (a drag end racing a click) are rejected
//! rather than applied twice.

use std::collections::BTreeSet;

use sequence_ring_core::{BoardSlot, Location, MoveRejection, Piece, PlacementKind};

/// New board and tray contents produced by an accepted move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Board contents after the move.
    pub board: Vec<Option<Piece>>,
    /// Tray contents after the move.
    pub tray: Vec<Option<Piece>>,
    /// Shape of the movement.
    pub kind: PlacementKind,
    /// Piece sent back to the source by a swap, if any.
    pub displaced: Option<Piece>,
}

/// Computes the board and tray that result from moving `piece` from `source` to `target`.
///
/// Rules are applied in order: locked targets, locked sources, identical
/// locations, unknown cells, and finally the stale-piece check for the
/// source. Tray sources are resolved by piece identity rather than index.
pub fn place(
    board: &[Option<Piece>],
    tray: &[Option<Piece>],
    locked: &BTreeSet<BoardSlot>,
    piece: &Piece,
    source: Location,
    target: Location,
) -> Result<Placement, MoveRejection> {
    if let Location::Board(slot) = target {
        if locked.contains(&slot) {
            return Err(MoveRejection::TargetLocked { slot });
        }
    }
    if let Location::Board(slot) = source {
        if locked.contains(&slot) {
            return Err(MoveRejection::SourceLocked { slot });
        }
    }
    if source == target {
        return Err(MoveRejection::SameLocation);
    }
    ensure_exists(board, tray, source)?;
    ensure_exists(board, tray, target)?;

    let mut board = board.to_vec();
    let mut tray = tray.to_vec();

    match (source, target) {
        (Location::Tray(_), Location::Board(to)) => {
            let from = locate_in_tray(&tray, piece)?;
            let displaced = board[to.get()].replace(piece.clone());
            tray[from] = displaced.clone();
            Ok(Placement {
                board,
                tray,
                kind: kind_for(&displaced),
                displaced,
            })
        }
        (Location::Board(from), Location::Board(to)) => {
            ensure_on_board(&board, from, piece)?;
            let displaced = board[to.get()].replace(piece.clone());
            board[from.get()] = displaced.clone();
            Ok(Placement {
                board,
                tray,
                kind: kind_for(&displaced),
                displaced,
            })
        }
        (Location::Board(from), Location::Tray(to)) => {
            ensure_on_board(&board, from, piece)?;
            let displaced = tray[to.get()].replace(piece.clone());
            board[from.get()] = displaced.clone();
            Ok(Placement {
                board,
                tray,
                kind: kind_for(&displaced),
                displaced,
            })
        }
        (Location::Tray(_), Location::Tray(to)) => {
            let from = locate_in_tray(&tray, piece)?;
            if from == to.get() {
                return Err(MoveRejection::SameLocation);
            }
            Ok(Placement {
                board,
                tray: reorder(&tray, from, to.get()),
                kind: PlacementKind::Reorder,
                displaced: None,
            })
        }
    }
}

/// Moves the tray cell at `from` to `to`, shifting the cells in between.
///
/// Indices outside the tray leave it unchanged.
#[must_use]
pub fn reorder(tray: &[Option<Piece>], from: usize, to: usize) -> Vec<Option<Piece>> {
    let mut reordered = tray.to_vec();
    if from >= reordered.len() || to >= reordered.len() {
        return reordered;
    }
    let cell = reordered.remove(from);
    reordered.insert(to, cell);
    reordered
}

fn kind_for(displaced: &Option<Piece>) -> PlacementKind {
    if displaced.is_some() {
        PlacementKind::Swap
    } else {
        PlacementKind::Move
    }
}

fn ensure_exists(
    board: &[Option<Piece>],
    tray: &[Option<Piece>],
    location: Location,
) -> Result<(), MoveRejection> {
    let exists = match location {
        Location::Board(slot) => slot.get() < board.len(),
        Location::Tray(slot) => slot.get() < tray.len(),
    };
    if exists {
        Ok(())
    } else {
        Err(MoveRejection::OutOfRange { location })
    }
}

fn locate_in_tray(tray: &[Option<Piece>], piece: &Piece) -> Result<usize, MoveRejection> {
    tray.iter()
        .position(|cell| cell.as_ref() == Some(piece))
        .ok_or_else(|| MoveRejection::StalePiece {
            piece: piece.clone(),
        })
}

fn ensure_on_board(
    board: &[Option<Piece>],
    slot: BoardSlot,
    piece: &Piece,
) -> Result<(), MoveRejection> {
    if board[slot.get()].as_ref() == Some(piece) {
        Ok(())
    } else {
        Err(MoveRejection::StalePiece {
            piece: piece.clone(),
        })
    }
}
