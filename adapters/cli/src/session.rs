//! Wires the world to its systems and exposes the result as a scene.

use std::time::Duration;

use anyhow::{anyhow, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sequence_ring_core::{catalog::puzzle_by_slug, Command, Event};
use sequence_ring_rendering::{Control, FrameInput, Scene};
use sequence_ring_system_check::{self as check, CheckSequencer};
use sequence_ring_system_interaction::Interaction;
use sequence_ring_world::{self as world, query, World};

use crate::config::Settings;

/// One player's game together with the systems driving it.
pub(crate) struct Session {
    world: World,
    sequencer: CheckSequencer,
    interaction: Interaction,
    pending_events: Vec<Event>,
    reset_rng: ChaCha8Rng,
}

impl Session {
    pub(crate) fn new(settings: &Settings) -> Result<Self> {
        let entry = puzzle_by_slug(&settings.puzzle)
            .ok_or_else(|| anyhow!("unknown puzzle {:?}", settings.puzzle))?;
        let puzzle = entry.definition()?;
        let mut reset_rng = ChaCha8Rng::seed_from_u64(settings.seed);
        let world = World::new(
            puzzle,
            world::Config::new(settings.total_tries, reset_rng.gen()),
        );
        tracing::info!(puzzle = entry.slug, seed = settings.seed, "session started");

        Ok(Self {
            world,
            sequencer: CheckSequencer::new(check::Config::new(settings.check_duration)),
            interaction: Interaction::new(),
            pending_events: Vec::new(),
            reset_rng,
        })
    }

    pub(crate) fn banner(&self) -> &'static str {
        query::welcome_banner(&self.world)
    }

    /// Advances logical time and applies the frame's input.
    pub(crate) fn step(&mut self, dt: Duration, input: FrameInput) {
        if !dt.is_zero() {
            self.submit(Command::Tick { dt });
        }

        let snapshot = query::snapshot(&self.world);
        let events = std::mem::take(&mut self.pending_events);
        let mut commands = Vec::new();
        self.interaction
            .handle(&events, &input.gestures, &snapshot, &mut commands);
        for command in commands {
            self.submit(command);
        }

        match input.control {
            Some(Control::Check) => self.submit(Command::RequestCheck),
            Some(Control::Reset) => {
                let seed = self.reset_rng.gen();
                self.submit(Command::NewGame { seed });
            }
            None => {}
        }
    }

    pub(crate) fn scene(&self) -> Scene {
        let snapshot = query::snapshot(&self.world);
        let preview = self.interaction.swap_preview(&snapshot);
        Scene::from_snapshot(&snapshot, query::puzzle(&self.world), preview)
            .with_sequence_progress(self.sequencer.progress())
    }

    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        loop {
            for event in &events {
                tracing::debug!(?event, "world event");
            }
            self.pending_events.extend(events.iter().cloned());

            let mut commands = Vec::new();
            self.sequencer.handle(&events, &mut commands);
            if commands.is_empty() {
                break;
            }

            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }
}
