//! Text commands accepted by the interactive session.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use sequence_ring_core::{BoardSlot, Location, Piece, TraySlot};
use sequence_ring_rendering::{Control, FrameInput, Scene};
use sequence_ring_system_interaction::SurfaceEvent;

/// Longest logical time a single `wait` may advance.
const MAX_WAIT_MS: u64 = 600_000;

pub(crate) const HELP: &str = "\
commands:
  select <board|tray> <n>   click a piece (alias: click)
  place <board|tray> <n>    click a destination (alias: put)
  drag <board|tray> <n> <board|tray> <n|none>
  clear                     click the background
  check                     reveal which slots are correct
  wait <ms>                 advance logical time
  reset                     deal a new game
  help | quit";

/// One parsed line of input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Instruction {
    Click(Location),
    Drag {
        source: Location,
        target: Option<Location>,
    },
    Background,
    Control(Control),
    Wait(Duration),
    Help,
    Quit,
}

impl Instruction {
    pub(crate) fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        let instruction = match verb.to_ascii_lowercase().as_str() {
            "select" | "click" | "place" | "put" => Self::Click(location(&mut words)?),
            "drag" => {
                let source = location(&mut words)?;
                let target = match words.clone().next() {
                    Some(word) if word.eq_ignore_ascii_case("none") => {
                        let _ = words.next();
                        None
                    }
                    _ => Some(location(&mut words)?),
                };
                Self::Drag { source, target }
            }
            "clear" | "background" => Self::Background,
            "check" => Self::Control(Control::Check),
            "reset" | "new" => Self::Control(Control::Reset),
            "wait" => {
                let millis: u64 = words
                    .next()
                    .ok_or_else(|| anyhow!("wait needs a duration in milliseconds"))?
                    .parse()
                    .context("wait duration must be a whole number of milliseconds")?;
                if millis > MAX_WAIT_MS {
                    bail!("wait is limited to {MAX_WAIT_MS} ms");
                }
                Self::Wait(Duration::from_millis(millis))
            }
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => bail!("unknown command {other:?}; type help"),
        };

        if let Some(extra) = words.next() {
            bail!("unexpected argument {extra:?}");
        }
        Ok(Some(instruction))
    }

    /// Translates the instruction into frame input, reading dragged pieces from the scene.
    pub(crate) fn frame_input(&self, scene: &Scene) -> Result<FrameInput> {
        let mut input = FrameInput::default();
        match self {
            Self::Click(location) => input.gestures.push(SurfaceEvent::Click {
                location: *location,
            }),
            Self::Drag { source, target } => {
                let piece = piece_at(scene, *source)
                    .ok_or_else(|| anyhow!("nothing to drag at {source}"))?;
                input.gestures.extend([
                    SurfaceEvent::DragStart {
                        piece: piece.clone(),
                        source: *source,
                    },
                    SurfaceEvent::DragMove {
                        piece: piece.clone(),
                        hovered: *target,
                    },
                    SurfaceEvent::DragEnd {
                        piece,
                        source: *source,
                        target: *target,
                    },
                ]);
            }
            Self::Background => input.gestures.push(SurfaceEvent::ClickBackground),
            Self::Control(control) => input.control = Some(*control),
            Self::Wait(_) | Self::Help | Self::Quit => {}
        }
        Ok(input)
    }
}

fn piece_at(scene: &Scene, location: Location) -> Option<Piece> {
    match location {
        Location::Board(slot) => scene.ring.get(slot.get())?.piece.clone(),
        Location::Tray(slot) => scene.tray.get(slot.get())?.piece.clone(),
    }
}

fn location<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<Location> {
    let area = words
        .next()
        .ok_or_else(|| anyhow!("expected board or tray"))?;
    let index: usize = words
        .next()
        .ok_or_else(|| anyhow!("expected a slot number after {area}"))?
        .parse()
        .with_context(|| format!("slot number after {area} must be a whole number"))?;

    match area.to_ascii_lowercase().as_str() {
        "board" | "b" => BoardSlot::new(index)
            .map(Location::Board)
            .ok_or_else(|| anyhow!("board slots run from 0 to 11")),
        "tray" | "t" => Ok(Location::Tray(TraySlot::new(index))),
        other => bail!("expected board or tray, found {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(index: usize) -> Location {
        Location::Board(BoardSlot::new(index).expect("slot exists"))
    }

    #[test]
    fn parses_clicks_and_drags() {
        assert_eq!(
            Instruction::parse("select tray 3").expect("parses"),
            Some(Instruction::Click(Location::Tray(TraySlot::new(3))))
        );
        assert_eq!(
            Instruction::parse("  place board 1 ").expect("parses"),
            Some(Instruction::Click(board(1)))
        );
        assert_eq!(
            Instruction::parse("drag board 2 tray 0").expect("parses"),
            Some(Instruction::Drag {
                source: board(2),
                target: Some(Location::Tray(TraySlot::new(0))),
            })
        );
        assert_eq!(
            Instruction::parse("drag b 2 none").expect("parses"),
            Some(Instruction::Drag {
                source: board(2),
                target: None,
            })
        );
    }

    #[test]
    fn parses_controls_and_blank_lines() {
        assert_eq!(Instruction::parse("").expect("parses"), None);
        assert_eq!(
            Instruction::parse("CHECK").expect("parses"),
            Some(Instruction::Control(Control::Check))
        );
        assert_eq!(
            Instruction::parse("wait 250").expect("parses"),
            Some(Instruction::Wait(Duration::from_millis(250)))
        );
        assert_eq!(
            Instruction::parse("quit").expect("parses"),
            Some(Instruction::Quit)
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(Instruction::parse("select board 12").is_err());
        assert!(Instruction::parse("select shelf 1").is_err());
        assert!(Instruction::parse("select tray").is_err());
        assert!(Instruction::parse("check now").is_err());
        assert!(Instruction::parse("dance").is_err());
        assert!(Instruction::parse("wait soon").is_err());
        assert!(Instruction::parse("wait 18446744073709551615").is_err());
        assert!(Instruction::parse("wait 600001").is_err());
        assert_eq!(
            Instruction::parse("wait 600000").expect("parses"),
            Some(Instruction::Wait(Duration::from_millis(600_000)))
        );
    }
}
