use std::{
    collections::{hash_map::DefaultHasher, BTreeSet},
    hash::{Hash, Hasher},
    time::Duration,
};

use sequence_ring_core::{
    catalog, BoardSlot, Command, Event, GameStatus, Location, Piece, Selection, TraySlot,
};
use sequence_ring_system_check::CheckSequencer;
use sequence_ring_world::{self as world, query, Config, World};

#[test]
fn deterministic_replay_produces_identical_outcomes() {
    let first = replay(7, scripted_commands());
    let second = replay(7, scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(first
        .events
        .iter()
        .any(|event| matches!(event, Event::CheckFinished { .. })));
}

#[test]
fn different_seeds_deal_different_trays() {
    let puzzle = catalog::default_puzzle().expect("default puzzle");
    let first = World::new(puzzle.clone(), Config::new(5, 1));
    let second = World::new(puzzle, Config::new(5, 2));

    assert_ne!(query::tray(&first), query::tray(&second));
}

fn replay(seed: u64, commands: Vec<Command>) -> ReplayOutcome {
    let puzzle = catalog::default_puzzle().expect("default puzzle");
    let mut world = World::new(puzzle, Config::new(3, seed));
    let mut sequencer = CheckSequencer::default();
    let mut log = Vec::new();

    for command in commands {
        let mut events = Vec::new();
        world::apply(&mut world, command, &mut events);
        process_sequencer(&mut world, &mut sequencer, events, &mut log);
    }

    ReplayOutcome {
        board: query::board(&world).to_vec(),
        tray: query::tray(&world).to_vec(),
        selection: query::selection(&world).cloned(),
        correct: query::correct_positions(&world).clone(),
        wrong: query::wrong_positions(&world).clone(),
        tries_remaining: query::tries_remaining(&world),
        status: query::status(&world),
        events: log,
    }
}

fn process_sequencer(
    world: &mut World,
    sequencer: &mut CheckSequencer,
    pending_events: Vec<Event>,
    log: &mut Vec<Event>,
) {
    let mut events = pending_events;

    loop {
        log.extend(events.iter().cloned());
        let mut commands = Vec::new();
        sequencer.handle(&events, &mut commands);
        if commands.is_empty() {
            break;
        }

        events.clear();
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
}

fn board(index: usize) -> Location {
    Location::Board(BoardSlot::new(index).expect("slot exists"))
}

fn tray(index: usize) -> Location {
    Location::Tray(TraySlot::new(index))
}

fn scripted_commands() -> Vec<Command> {
    let mut commands = vec![
        Command::SelectOrToggle { source: tray(0) },
        Command::MoveSelection { target: board(3) },
        Command::SelectOrToggle { source: tray(4) },
        Command::MoveSelection { target: board(7) },
        Command::SelectOrToggle { source: board(3) },
        Command::MoveSelection { target: board(7) },
        Command::MovePiece {
            piece: Piece::new("corn"),
            source: tray(2),
            target: board(1),
        },
        Command::RequestCheck,
    ];
    commands.extend((0..50).map(|_| Command::Tick {
        dt: Duration::from_millis(50),
    }));
    commands.push(Command::SelectOrToggle { source: tray(1) });
    commands.push(Command::MoveSelection { target: board(9) });
    commands.push(Command::NewGame { seed: 11 });
    commands
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    board: Vec<Option<Piece>>,
    tray: Vec<Option<Piece>>,
    selection: Option<Selection>,
    correct: BTreeSet<BoardSlot>,
    wrong: BTreeSet<BoardSlot>,
    tries_remaining: u32,
    status: GameStatus,
    events: Vec<Event>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
