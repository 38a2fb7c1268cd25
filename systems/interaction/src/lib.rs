#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure interaction system translating pointer gestures into world commands.
//!
//! Hit-testing belongs to the drag/drop surface: it resolves every gesture to
//! a [`Location`] (or to nothing) before handing it over as a
//! [`SurfaceEvent`]. The system keeps the transient drag state, decides what a
//! click means given the current selection, and only reaches the world through
//! commands. A drag crosses into the world once, when it ends over a target.

use sequence_ring_core::{BoardSlot, Command, Event, GameSnapshot, Location, Piece};

/// Gesture reported by the drag/drop surface with its drop target already resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The player started dragging a piece.
    DragStart {
        /// Piece picked up.
        piece: Piece,
        /// Location the piece was picked up from.
        source: Location,
    },
    /// The dragged piece moved over a new drop zone, or away from all of them.
    DragMove {
        /// Piece being dragged.
        piece: Piece,
        /// Drop zone currently under the piece, if any.
        hovered: Option<Location>,
    },
    /// The player released the dragged piece.
    DragEnd {
        /// Piece released.
        piece: Piece,
        /// Location the drag started from.
        source: Location,
        /// Drop zone the piece was released over, or `None` when it missed every zone.
        target: Option<Location>,
    },
    /// The player clicked a board slot or tray cell.
    Click {
        /// Location that was clicked.
        location: Location,
    },
    /// The player clicked outside every piece and drop zone.
    ClickBackground,
}

/// Transient state of an ongoing drag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragState {
    /// Piece being dragged.
    pub piece: Piece,
    /// Location the drag started from.
    pub source: Location,
    /// Drop zone currently under the piece, if any.
    pub hovered: Option<Location>,
}

/// Presentation hint naming the piece a drop at the hovered slot would displace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapPreview {
    /// Piece that would leave the hovered slot.
    pub displaced: Piece,
    /// Board slot currently hovered.
    pub from: BoardSlot,
    /// Location the displaced piece would be sent to.
    pub to: Location,
}

/// Interaction system that owns drag state and resolves clicks.
#[derive(Clone, Debug, Default)]
pub struct Interaction {
    drag: Option<DragState>,
}

impl Interaction {
    /// Creates a new interaction system with no drag in progress.
    #[must_use]
    pub const fn new() -> Self {
        Self { drag: None }
    }

    /// Drag currently in progress, if any.
    #[must_use]
    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Consumes world events and surface gestures to emit world commands.
    ///
    /// Gestures are resolved against `snapshot`, so adapters should call
    /// `handle` once per gesture and refresh the snapshot in between.
    pub fn handle(
        &mut self,
        events: &[Event],
        input: &[SurfaceEvent],
        snapshot: &GameSnapshot,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::GameStarted { .. } => self.drag = None,
                Event::StatusChanged { status } if status.is_terminal() => self.drag = None,
                _ => {}
            }
        }

        for gesture in input {
            match gesture {
                SurfaceEvent::DragStart { piece, source } => {
                    self.start_drag(piece, *source, snapshot);
                }
                SurfaceEvent::DragMove { piece, hovered } => {
                    if let Some(drag) = self.drag.as_mut() {
                        if &drag.piece == piece {
                            drag.hovered = *hovered;
                        }
                    }
                }
                SurfaceEvent::DragEnd {
                    piece,
                    source,
                    target,
                } => {
                    self.drag = None;
                    match target {
                        Some(target) => out.push(Command::MovePiece {
                            piece: piece.clone(),
                            source: *source,
                            target: *target,
                        }),
                        None => tracing::trace!(%piece, "drag ended outside every drop zone"),
                    }
                }
                SurfaceEvent::Click { location } => click(*location, snapshot, out),
                SurfaceEvent::ClickBackground => {
                    if snapshot.selection.is_some() {
                        out.push(Command::ClearSelection);
                    }
                }
            }
        }
    }

    fn start_drag(&mut self, piece: &Piece, source: Location, snapshot: &GameSnapshot) {
        if snapshot.status.is_terminal() {
            tracing::trace!(%piece, "ignoring drag after the game ended");
            return;
        }
        if let Location::Board(slot) = source {
            if snapshot.is_locked(slot) {
                tracing::trace!(%piece, %slot, "ignoring drag from a locked slot");
                return;
            }
        }
        self.drag = Some(DragState {
            piece: piece.clone(),
            source,
            hovered: None,
        });
    }

    /// Describes the swap a drop at the hovered location would perform.
    ///
    /// Only occupied, unlocked board slots other than the drag source produce a
    /// preview; the result never affects the game state.
    #[must_use]
    pub fn swap_preview(&self, snapshot: &GameSnapshot) -> Option<SwapPreview> {
        let drag = self.drag.as_ref()?;
        let hovered = drag.hovered?;
        let slot = hovered.board_slot()?;
        if hovered == drag.source || snapshot.is_locked(slot) {
            return None;
        }
        let displaced = snapshot.occupant(hovered)?;
        if displaced == &drag.piece {
            return None;
        }
        Some(SwapPreview {
            displaced: displaced.clone(),
            from: slot,
            to: drag.source,
        })
    }
}

fn click(location: Location, snapshot: &GameSnapshot, out: &mut Vec<Command>) {
    if snapshot.status.is_terminal() {
        return;
    }

    let occupant = snapshot.occupant(location);
    let selection = snapshot.selection.as_ref();
    match (location, selection) {
        (Location::Board(slot), None) => {
            if occupant.is_some() && !snapshot.is_locked(slot) {
                out.push(Command::SelectOrToggle { source: location });
            }
        }
        (Location::Board(_), Some(selection)) => {
            if selection.source == location {
                out.push(Command::SelectOrToggle { source: location });
            } else {
                out.push(Command::MoveSelection { target: location });
            }
        }
        (Location::Tray(_), Some(selection))
            if occupant.is_none() && matches!(selection.source, Location::Board(_)) =>
        {
            out.push(Command::MoveSelection { target: location });
        }
        (Location::Tray(_), _) => {
            if occupant.is_some() {
                out.push(Command::SelectOrToggle { source: location });
            }
        }
    }
}
