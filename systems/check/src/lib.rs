#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Check sequencing system that reveals slot outcomes over logical time.
//!
//! A check does not resolve at once. When the world reports
//! `Event::CheckStarted`, the sequencer lays out thirteen fire times from a
//! single duration: one reveal per board slot at `(i + 1) * segment` followed by
//! the finalisation at the full duration. Each `Event::TimeAdvanced` moves the
//! sequencer's clock forward and every fire time that has been reached is
//! emitted as a command carrying the check's ticket, so the world can discard
//! reveals that belong to a check it no longer runs.

use std::time::Duration;

use sequence_ring_core::{
    BoardSlot, CheckProgress, CheckTicket, Command, Event, Piece, SlotOutcome, BOARD_SLOT_COUNT,
    DEFAULT_CHECK_DURATION,
};

/// Compares a single board cell against the piece the target order expects there.
#[must_use]
pub fn evaluate_slot(occupant: Option<&Piece>, expected: &Piece) -> SlotOutcome {
    if occupant == Some(expected) {
        SlotOutcome::Correct
    } else {
        SlotOutcome::Wrong
    }
}

/// Display state of the arc joining two neighbouring board slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArcState {
    /// The starting slot has not been revealed yet.
    Hidden,
    /// The starting slot is revealed but its clockwise neighbour is not.
    Pending,
    /// Both endpoints were revealed as correct.
    Correct,
    /// At least one endpoint was revealed as wrong.
    Wrong,
}

/// Arc of the progress ring spanning from `start` to its clockwise neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArcSegment {
    /// Slot the arc starts at.
    pub start: BoardSlot,
    /// Clockwise neighbour the arc ends at.
    pub end: BoardSlot,
    /// Display state derived from the endpoints' outcomes.
    pub state: ArcState,
}

/// Derives the progress-ring arcs from the reveals committed so far.
///
/// This is presentation data only; it never feeds back into locking or tries.
#[must_use]
pub fn arc_segments(progress: &CheckProgress) -> Vec<ArcSegment> {
    BoardSlot::all()
        .map(|start| {
            let end = start.next();
            let state = match (progress.outcome(start), progress.outcome(end)) {
                (None, _) => ArcState::Hidden,
                (Some(_), None) => ArcState::Pending,
                (Some(SlotOutcome::Correct), Some(SlotOutcome::Correct)) => ArcState::Correct,
                (Some(_), Some(_)) => ArcState::Wrong,
            };
            ArcSegment { start, end, state }
        })
        .collect()
}

/// Fire times of a check's reveal sequence, computed from one duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealSchedule {
    total: Duration,
    segment: Duration,
}

impl RevealSchedule {
    /// Splits the total duration into one segment per board slot.
    #[must_use]
    pub fn new(total: Duration) -> Self {
        Self {
            total,
            segment: total / BOARD_SLOT_COUNT as u32,
        }
    }

    /// Duration of the complete sequence.
    #[must_use]
    pub const fn total(&self) -> Duration {
        self.total
    }

    /// Logical time between two consecutive reveals.
    #[must_use]
    pub const fn segment(&self) -> Duration {
        self.segment
    }

    /// Elapsed time at which the provided slot's outcome is committed.
    #[must_use]
    pub fn reveal_at(&self, slot: BoardSlot) -> Duration {
        self.segment * (slot.get() as u32 + 1)
    }

    /// Elapsed time at which the check is resolved.
    #[must_use]
    pub const fn finalize_at(&self) -> Duration {
        self.total
    }

    /// All thirteen fire times: the twelve reveals followed by the finalisation.
    #[must_use]
    pub fn fire_times(&self) -> Vec<Duration> {
        BoardSlot::all()
            .map(|slot| self.reveal_at(slot))
            .chain(std::iter::once(self.finalize_at()))
            .collect()
    }
}

impl Default for RevealSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_DURATION)
    }
}

/// Configuration parameters required to construct the check sequencer.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    check_duration: Duration,
}

impl Config {
    /// Creates a configuration using the provided reveal duration.
    #[must_use]
    pub const fn new(check_duration: Duration) -> Self {
        Self { check_duration }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_DURATION)
    }
}

/// Progress of the sequence currently being revealed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SequenceProgress {
    /// Check being revealed.
    pub ticket: CheckTicket,
    /// Number of reveal commands emitted so far.
    pub revealed: usize,
    /// Elapsed share of the total duration in the range 0.0..=1.0.
    pub fraction: f32,
}

#[derive(Clone, Copy, Debug)]
struct PendingCheck {
    ticket: CheckTicket,
    elapsed: Duration,
    next_slot: usize,
}

/// Pure system that converts elapsed logical time into reveal commands.
#[derive(Debug)]
pub struct CheckSequencer {
    schedule: RevealSchedule,
    fire_times: Vec<Duration>,
    pending: Option<PendingCheck>,
}

impl Default for CheckSequencer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl CheckSequencer {
    /// Creates a new sequencer using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let schedule = RevealSchedule::new(config.check_duration);
        Self {
            fire_times: schedule.fire_times(),
            schedule,
            pending: None,
        }
    }

    /// Fire times used for every check.
    #[must_use]
    pub const fn schedule(&self) -> &RevealSchedule {
        &self.schedule
    }

    /// Progress of the running sequence, if any.
    #[must_use]
    pub fn progress(&self) -> Option<SequenceProgress> {
        self.pending.map(|pending| {
            let total = self.schedule.total().as_secs_f32();
            let fraction = if total > 0.0 {
                (pending.elapsed.as_secs_f32() / total).clamp(0.0, 1.0)
            } else {
                1.0
            };
            SequenceProgress {
                ticket: pending.ticket,
                revealed: pending.next_slot,
                fraction,
            }
        })
    }

    /// Consumes world events and emits the reveal commands that became due.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::GameStarted { generation } => {
                    if let Some(pending) = self.pending.take() {
                        tracing::debug!(
                            ticket = ?pending.ticket,
                            generation,
                            "dropping reveal sequence for a replaced game"
                        );
                    }
                }
                Event::CheckStarted { ticket } => {
                    if let Some(pending) = self.pending {
                        tracing::warn!(
                            previous = ?pending.ticket,
                            next = ?ticket,
                            "check started while another sequence was running"
                        );
                    }
                    tracing::debug!(?ticket, "reveal sequence scheduled");
                    self.pending = Some(PendingCheck {
                        ticket: *ticket,
                        elapsed: Duration::ZERO,
                        next_slot: 0,
                    });
                    self.emit_due(out);
                }
                Event::TimeAdvanced { dt } => {
                    if let Some(pending) = self.pending.as_mut() {
                        pending.elapsed = pending.elapsed.saturating_add(*dt);
                        self.emit_due(out);
                    }
                }
                _ => {}
            }
        }
    }

    fn emit_due(&mut self, out: &mut Vec<Command>) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        while let Some(slot) = BoardSlot::new(pending.next_slot) {
            if self.fire_times[slot.get()] > pending.elapsed {
                return;
            }
            out.push(Command::RevealSlot {
                ticket: pending.ticket,
                slot,
            });
            pending.next_slot += 1;
        }

        if self
            .fire_times
            .last()
            .is_some_and(|finalize_at| pending.elapsed >= *finalize_at)
        {
            tracing::debug!(ticket = ?pending.ticket, "reveal sequence complete");
            out.push(Command::FinalizeCheck {
                ticket: pending.ticket,
            });
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_spaces_reveals_evenly() {
        let schedule = RevealSchedule::default();
        let times = schedule.fire_times();

        assert_eq!(times.len(), BOARD_SLOT_COUNT + 1);
        assert_eq!(times[0], schedule.segment());
        for pair in times[..BOARD_SLOT_COUNT].windows(2) {
            assert_eq!(pair[1] - pair[0], schedule.segment());
        }
        assert_eq!(times[BOARD_SLOT_COUNT], Duration::from_secs(2));
        assert!(times[BOARD_SLOT_COUNT - 1] <= times[BOARD_SLOT_COUNT]);
    }

    #[test]
    fn progress_reports_elapsed_fraction() {
        let mut sequencer = CheckSequencer::new(Config::new(Duration::from_millis(1200)));
        let ticket = CheckTicket::new(1, 1);
        let mut out = Vec::new();

        sequencer.handle(&[Event::CheckStarted { ticket }], &mut out);
        sequencer.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(300),
            }],
            &mut out,
        );

        let progress = sequencer.progress().expect("sequence running");
        assert_eq!(progress.ticket, ticket);
        assert_eq!(progress.revealed, 3);
        assert!((progress.fraction - 0.25).abs() < 1e-6);
    }
}
