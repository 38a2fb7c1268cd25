#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Sequence Ring adapters.

use std::time::Duration;

use anyhow::Result as AnyResult;
use sequence_ring_core::{
    BoardSlot, GameSnapshot, GameStatus, Location, Piece, PuzzleDefinition, TraySlot,
};
use sequence_ring_system_check::{arc_segments, ArcSegment, ArcState, SequenceProgress};
use sequence_ring_system_interaction::{SurfaceEvent, SwapPreview};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Converts the color channels back into byte RGB values.
    #[must_use]
    pub fn to_rgb_u8(self) -> (u8, u8, u8) {
        (
            channel_to_u8(self.red),
            channel_to_u8(self.green),
            channel_to_u8(self.blue),
        )
    }
}

fn channel_to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Visual state of a single board slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotVisual {
    /// No piece occupies the slot.
    Empty,
    /// An unlocked piece without feedback occupies the slot.
    Neutral,
    /// The slot was validated and can no longer change.
    Locked,
    /// The last check flagged the slot as wrong.
    Wrong,
    /// The slot holds the selected piece.
    Selected,
    /// A drop at the hovered slot would swap its piece out.
    SwapTarget,
}

impl SlotVisual {
    /// Color used to highlight the slot.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Empty => Color::from_rgb_u8(0x9c, 0xa3, 0xaf),
            Self::Neutral => Color::from_rgb_u8(0xf5, 0xf0, 0xe6),
            Self::Locked => Color::from_rgb_u8(0x5e, 0xea, 0xd4),
            Self::Wrong => Color::from_rgb_u8(0xef, 0x44, 0x44),
            Self::Selected => Color::from_rgb_u8(0x06, 0xb6, 0xd4),
            Self::SwapTarget => Color::from_rgb_u8(0xfa, 0xcc, 0x15),
        }
    }
}

/// Board slot as presented on the ring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingCell {
    /// Position of the slot around the ring.
    pub slot: BoardSlot,
    /// Piece occupying the slot, if any.
    pub piece: Option<Piece>,
    /// Artwork path of the occupying piece.
    pub asset: Option<String>,
    /// Visual state of the slot.
    pub visual: SlotVisual,
}

/// Tray cell as presented below the ring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrayCell {
    /// Position of the cell within the tray.
    pub slot: TraySlot,
    /// Piece occupying the cell, if any.
    pub piece: Option<Piece>,
    /// Artwork path of the occupying piece.
    pub asset: Option<String>,
    /// Whether the cell holds the selected piece.
    pub selected: bool,
}

/// Remaining and total tries shown to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriesIndicator {
    /// Checks the player may still fail.
    pub remaining: u32,
    /// Checks granted at the start of the game.
    pub total: u32,
}

/// Interactive state of a control button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ButtonState {
    /// The button accepts presses.
    Enabled,
    /// The button is greyed out.
    Disabled,
    /// The button shows that its action is still running.
    Busy,
}

/// Progress ring drawn around the board while and after checking.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressRing {
    /// Whether any check has produced feedback during this game.
    pub visible: bool,
    /// Arcs between neighbouring slots.
    ///
    /// Once a check has finished only correct arcs stay visible.
    pub arcs: Vec<ArcSegment>,
    /// Elapsed share of the running check's duration, in the range 0.0..=1.0.
    pub sweep: Option<f32>,
}

/// End-of-game banner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Banner {
    /// Every slot matched the target order.
    Won,
    /// The player ran out of tries.
    Failed,
}

impl Banner {
    /// Text shown in the banner.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Won => "You completed the chain!",
            Self::Failed => "Out of tries. Better luck next time.",
        }
    }
}

/// Scene description derived from a game snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Board slots in ring order.
    pub ring: Vec<RingCell>,
    /// Tray cells in display order.
    pub tray: Vec<TrayCell>,
    /// Tries indicator.
    pub tries: TriesIndicator,
    /// State of the check button.
    pub check_button: ButtonState,
    /// State of the reset button.
    pub reset_button: ButtonState,
    /// Progress ring around the board.
    pub progress: ProgressRing,
    /// End-of-game banner, if the game ended.
    pub banner: Option<Banner>,
    /// Swap preview shown while dragging over an occupied slot.
    pub swap_preview: Option<SwapPreview>,
}

impl Scene {
    /// Builds the scene presenting the provided snapshot.
    #[must_use]
    pub fn from_snapshot(
        snapshot: &GameSnapshot,
        puzzle: &PuzzleDefinition,
        swap_preview: Option<SwapPreview>,
    ) -> Self {
        let asset_of = |piece: &Option<Piece>| {
            piece
                .as_ref()
                .and_then(|piece| puzzle.asset(piece))
                .map(str::to_owned)
        };
        let selected_source = snapshot.selection.as_ref().map(|selection| selection.source);

        let ring = BoardSlot::all()
            .map(|slot| {
                let piece = snapshot.board.get(slot.get()).cloned().flatten();
                let visual = slot_visual(snapshot, slot, piece.is_some(), swap_preview.as_ref());
                RingCell {
                    slot,
                    asset: asset_of(&piece),
                    piece,
                    visual,
                }
            })
            .collect();

        let tray = snapshot
            .tray
            .iter()
            .enumerate()
            .map(|(index, piece)| {
                let slot = TraySlot::new(index);
                TrayCell {
                    slot,
                    piece: piece.clone(),
                    asset: asset_of(piece),
                    selected: selected_source == Some(Location::Tray(slot)),
                }
            })
            .collect();

        let check_button = if snapshot.is_checking() {
            ButtonState::Busy
        } else if snapshot.check_enabled() {
            ButtonState::Enabled
        } else {
            ButtonState::Disabled
        };

        let banner = match snapshot.status {
            GameStatus::Playing => None,
            GameStatus::Won => Some(Banner::Won),
            GameStatus::Failed => Some(Banner::Failed),
        };

        Self {
            ring,
            tray,
            tries: TriesIndicator {
                remaining: snapshot.tries_remaining,
                total: snapshot.total_tries,
            },
            check_button,
            reset_button: ButtonState::Enabled,
            progress: progress_ring(snapshot),
            banner,
            swap_preview,
        }
    }

    /// Adds the timer of the reveal sequence driving the running check.
    ///
    /// Progress belonging to a check the snapshot no longer shows as running is ignored.
    #[must_use]
    pub fn with_sequence_progress(mut self, sequence: Option<SequenceProgress>) -> Self {
        let checking = self.is_checking();
        self.progress.sweep = sequence
            .filter(|_| checking)
            .map(|sequence| sequence.fraction);
        self
    }

    /// Reports whether the scene shows a check that is still revealing results.
    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.check_button == ButtonState::Busy
    }
}

fn slot_visual(
    snapshot: &GameSnapshot,
    slot: BoardSlot,
    occupied: bool,
    swap_preview: Option<&SwapPreview>,
) -> SlotVisual {
    let selected = snapshot
        .selection
        .as_ref()
        .is_some_and(|selection| selection.source == Location::Board(slot));

    if snapshot.is_locked(slot) {
        SlotVisual::Locked
    } else if swap_preview.is_some_and(|preview| preview.from == slot) {
        SlotVisual::SwapTarget
    } else if selected {
        SlotVisual::Selected
    } else if snapshot.is_wrong(slot) {
        SlotVisual::Wrong
    } else if occupied {
        SlotVisual::Neutral
    } else {
        SlotVisual::Empty
    }
}

fn progress_ring(snapshot: &GameSnapshot) -> ProgressRing {
    let progress = &snapshot.check_progress;
    let mut arcs = arc_segments(progress);
    if !progress.in_flight {
        for arc in &mut arcs {
            if arc.state != ArcState::Correct {
                arc.state = ArcState::Hidden;
            }
        }
    }
    ProgressRing {
        visible: progress.has_ever_checked(),
        arcs,
        sweep: None,
    }
}

/// Control actions available outside the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    /// Evaluate the board.
    Check,
    /// Deal a fresh game.
    Reset,
}

/// Input captured by a backend before updating the scene.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Gestures resolved by the backend's drag/drop surface, in the order they happened.
    pub gestures: Vec<SurfaceEvent>,
    /// Control button pressed on this frame.
    pub control: Option<Control>,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title shown above the board.
    pub title: String,
    /// Solid color used behind the board.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            title: title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Sequence Ring scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the logical time elapsed
    /// since the previous frame and the input captured for the frame, and
    /// refreshes the scene before it is presented.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene);
}
