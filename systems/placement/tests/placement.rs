use std::collections::BTreeSet;

use proptest::prelude::*;
use sequence_ring_core::{BoardSlot, Location, MoveRejection, Piece, PlacementKind, TraySlot};
use sequence_ring_system_placement::place;

fn slot(index: usize) -> BoardSlot {
    BoardSlot::new(index).expect("slot on the ring")
}

fn board_at(index: usize) -> Location {
    Location::Board(slot(index))
}

fn tray_at(index: usize) -> Location {
    Location::Tray(TraySlot::new(index))
}

fn piece(name: &str) -> Piece {
    Piece::new(name)
}

/// Board with the starter at slot 0 and `extra` pieces placed at the given slots.
fn board_with(extra: &[(usize, &str)]) -> Vec<Option<Piece>> {
    let mut board = vec![None; 12];
    board[0] = Some(piece("popcorn"));
    for (index, name) in extra {
        board[*index] = Some(piece(name));
    }
    board
}

fn tray_with(names: &[Option<&str>]) -> Vec<Option<Piece>> {
    names.iter().map(|name| name.map(Piece::new)).collect()
}

fn starter_locked() -> BTreeSet<BoardSlot> {
    BTreeSet::from([slot(0)])
}

#[test]
fn tray_piece_moves_into_empty_board_slot() {
    let board = board_with(&[]);
    let tray = tray_with(&[Some("ear"), Some("corn"), Some("key")]);

    let placement = place(
        &board,
        &tray,
        &starter_locked(),
        &piece("corn"),
        tray_at(1),
        board_at(1),
    )
    .expect("move into an empty slot succeeds");

    assert_eq!(placement.board[1], Some(piece("corn")));
    assert_eq!(placement.tray, tray_with(&[Some("ear"), None, Some("key")]));
    assert_eq!(placement.kind, PlacementKind::Move);
    assert_eq!(placement.displaced, None);
}

#[test]
fn tray_piece_swaps_with_board_occupant() {
    let board = board_with(&[(4, "bird")]);
    let tray = tray_with(&[Some("ear"), Some("corn")]);

    let placement = place(
        &board,
        &tray,
        &starter_locked(),
        &piece("ear"),
        tray_at(0),
        board_at(4),
    )
    .expect("swap with occupied slot succeeds");

    assert_eq!(placement.board[4], Some(piece("ear")));
    assert_eq!(placement.tray, tray_with(&[Some("bird"), Some("corn")]));
    assert_eq!(placement.kind, PlacementKind::Swap);
    assert_eq!(placement.displaced, Some(piece("bird")));
}

#[test]
fn tray_source_is_resolved_by_identity_not_index() {
    let board = board_with(&[]);
    let tray = tray_with(&[None, None, Some("corn")]);

    let placement = place(
        &board,
        &tray,
        &starter_locked(),
        &piece("corn"),
        tray_at(0),
        board_at(2),
    )
    .expect("piece is found at its current tray index");

    assert_eq!(placement.tray, tray_with(&[None, None, None]));
    assert_eq!(placement.board[2], Some(piece("corn")));
}

#[test]
fn stale_tray_piece_is_rejected() {
    let board = board_with(&[(1, "corn")]);
    let tray = tray_with(&[None, Some("ear")]);

    let result = place(
        &board,
        &tray,
        &starter_locked(),
        &piece("corn"),
        tray_at(0),
        board_at(2),
    );

    assert_eq!(
        result,
        Err(MoveRejection::StalePiece {
            piece: piece("corn")
        })
    );
}

#[test]
fn board_pieces_move_and_swap() {
    let board = board_with(&[(1, "corn"), (2, "ear")]);
    let tray = tray_with(&[None]);

    let moved = place(
        &board,
        &tray,
        &starter_locked(),
        &piece("corn"),
        board_at(1),
        board_at(5),
    )
    .expect("move into an empty slot succeeds");
    assert_eq!(moved.board[1], None);
    assert_eq!(moved.board[5], Some(piece("corn")));
    assert_eq!(moved.kind, PlacementKind::Move);

    let swapped = place(
        &board,
        &tray,
        &starter_locked(),
        &piece("corn"),
        board_at(1),
        board_at(2),
    )
    .expect("swap between board slots succeeds");
    assert_eq!(swapped.board[1], Some(piece("ear")));
    assert_eq!(swapped.board[2], Some(piece("corn")));
    assert_eq!(swapped.displaced, Some(piece("ear")));
    assert_eq!(swapped.tray, tray);
}

#[test]
fn board_piece_returns_to_tray() {
    let board = board_with(&[(3, "key")]);
    let tray = tray_with(&[Some("ear"), None]);

    let returned = place(
        &board,
        &tray,
        &starter_locked(),
        &piece("key"),
        board_at(3),
        tray_at(1),
    )
    .expect("return to an empty tray cell succeeds");
    assert_eq!(returned.board[3], None);
    assert_eq!(returned.tray, tray_with(&[Some("ear"), Some("key")]));

    let exchanged = place(
        &board,
        &tray,
        &starter_locked(),
        &piece("key"),
        board_at(3),
        tray_at(0),
    )
    .expect("return to an occupied tray cell swaps");
    assert_eq!(exchanged.board[3], Some(piece("ear")));
    assert_eq!(exchanged.tray, tray_with(&[Some("key"), None]));
}

#[test]
fn locked_slots_reject_moves_in_and_out() {
    let board = board_with(&[(2, "ear")]);
    let tray = tray_with(&[Some("corn")]);
    let mut locked = starter_locked();
    let _ = locked.insert(slot(2));

    assert_eq!(
        place(&board, &tray, &locked, &piece("corn"), tray_at(0), board_at(2)),
        Err(MoveRejection::TargetLocked { slot: slot(2) })
    );
    assert_eq!(
        place(&board, &tray, &locked, &piece("ear"), board_at(2), board_at(5)),
        Err(MoveRejection::SourceLocked { slot: slot(2) })
    );
    assert_eq!(
        place(
            &board,
            &tray,
            &locked,
            &piece("popcorn"),
            board_at(0),
            tray_at(0)
        ),
        Err(MoveRejection::SourceLocked { slot: slot(0) })
    );
}

#[test]
fn unknown_tray_cells_are_rejected() {
    let board = board_with(&[(1, "corn")]);
    let tray = tray_with(&[None]);

    assert_eq!(
        place(
            &board,
            &tray,
            &starter_locked(),
            &piece("corn"),
            board_at(1),
            tray_at(4)
        ),
        Err(MoveRejection::OutOfRange {
            location: tray_at(4)
        })
    );
}

#[test]
fn tray_reorder_leaves_board_untouched() {
    let board = board_with(&[(1, "corn")]);
    let tray = tray_with(&[Some("ear"), None, Some("key")]);

    let placement = place(
        &board,
        &tray,
        &starter_locked(),
        &piece("key"),
        tray_at(2),
        tray_at(0),
    )
    .expect("reorder succeeds");

    assert_eq!(placement.kind, PlacementKind::Reorder);
    assert_eq!(placement.board, board);
    assert_eq!(placement.tray, tray_with(&[Some("key"), Some("ear"), None]));
}

const NAMES: [&str; 11] = [
    "corn",
    "ear",
    "tunning-fork",
    "piano",
    "key",
    "cage",
    "bird",
    "worm",
    "book",
    "script",
    "movie",
];

/// Deals the eleven non-starter pieces between board slots 1..=11 and the tray.
fn deal(mask: u16) -> (Vec<Option<Piece>>, Vec<Option<Piece>>) {
    let mut board = board_with(&[]);
    let mut tray = vec![None; NAMES.len()];
    for (index, name) in NAMES.iter().enumerate() {
        if mask & (1 << index) != 0 {
            board[index + 1] = Some(piece(name));
        } else {
            tray[index] = Some(piece(name));
        }
    }
    (board, tray)
}

fn location(raw: usize) -> Location {
    if raw < 11 {
        board_at(raw + 1)
    } else {
        tray_at(raw - 11)
    }
}

fn occupant(board: &[Option<Piece>], tray: &[Option<Piece>], at: Location) -> Option<Piece> {
    match at {
        Location::Board(slot) => board[slot.get()].clone(),
        Location::Tray(slot) => tray[slot.get()].clone(),
    }
}

proptest! {
    #[test]
    fn swapping_back_restores_board_and_tray(mask in 0u16..(1 << 11), a in 0usize..22, b in 0usize..22) {
        prop_assume!(a != b);
        let (board, tray) = deal(mask);
        let source = location(a);
        let target = location(b);
        let Some(moving) = occupant(&board, &tray, source) else {
            return Ok(());
        };
        prop_assume!(!(matches!(source, Location::Tray(_)) && matches!(target, Location::Tray(_))));

        let locked = starter_locked();
        let first = place(&board, &tray, &locked, &moving, source, target)
            .expect("unlocked move succeeds");
        let back = place(&first.board, &first.tray, &locked, &moving, target, source)
            .expect("moving back succeeds");

        prop_assert_eq!(back.board, board);
        prop_assert_eq!(back.tray, tray);
    }
}
