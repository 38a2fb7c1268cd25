//! Line-oriented rendering backend that prints scenes as plain text.

use std::{
    fmt::Write as _,
    io::{BufRead, Write},
    time::Duration,
};

use anyhow::{bail, Result};
use sequence_ring_rendering::{
    ButtonState, Color, FrameInput, Presentation, RenderingBackend, Scene, SlotVisual,
};
use sequence_ring_system_check::ArcState;

use crate::{
    commands::{Instruction, HELP},
    config::MAX_CHECK_TICKS,
};

/// Reads commands from `input` and writes rendered scenes to `output`.
pub(crate) struct TextBackend<R, W> {
    input: R,
    output: W,
    tick: Duration,
    color: bool,
    echo: bool,
}

impl<R: BufRead, W: Write> TextBackend<R, W> {
    pub(crate) fn new(input: R, output: W, tick: Duration) -> Self {
        Self {
            input,
            output,
            tick,
            color: false,
            echo: false,
        }
    }

    /// Enables ANSI colors in the rendered output.
    pub(crate) fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Repeats every command read before its output, for unattended runs.
    pub(crate) fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    fn advance<F>(&mut self, total: Duration, scene: &mut Scene, update_scene: &mut F)
    where
        F: FnMut(Duration, FrameInput, &mut Scene),
    {
        let mut remaining = total;
        while !remaining.is_zero() {
            let dt = remaining.min(self.tick);
            update_scene(dt, FrameInput::default(), scene);
            remaining -= dt;
        }
    }

    fn finish_check<F>(&mut self, scene: &mut Scene, update_scene: &mut F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene),
    {
        if !scene.is_checking() {
            return Ok(());
        }

        let mut revealed = revealed_arcs(scene);
        for _ in 0..MAX_CHECK_TICKS {
            update_scene(self.tick, FrameInput::default(), scene);
            let now = revealed_arcs(scene);
            if now != revealed && scene.is_checking() {
                writeln!(self.output, "checking... {now}/12")?;
                revealed = now;
            }
            if !scene.is_checking() {
                return Ok(());
            }
        }
        bail!("check did not finish after {MAX_CHECK_TICKS} ticks")
    }
}

impl<R: BufRead, W: Write> RenderingBackend for TextBackend<R, W> {
    fn run<F>(mut self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene),
    {
        let Presentation {
            title,
            clear_color,
            mut scene,
        } = presentation;

        let heading = if self.color {
            paint_background(&title, clear_color)
        } else {
            title
        };
        writeln!(self.output, "{heading}")?;
        self.output
            .write_all(render(&scene, self.color).as_bytes())?;

        let mut line = String::new();
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }
            if self.echo {
                writeln!(self.output, "{}", line.trim_end())?;
            }

            let instruction = match Instruction::parse(&line) {
                Ok(Some(instruction)) => instruction,
                Ok(None) => continue,
                Err(error) => {
                    writeln!(self.output, "error: {error:#}")?;
                    continue;
                }
            };

            match instruction {
                Instruction::Quit => break,
                Instruction::Help => {
                    writeln!(self.output, "{HELP}")?;
                    continue;
                }
                Instruction::Wait(total) => self.advance(total, &mut scene, &mut update_scene),
                other => match other.frame_input(&scene) {
                    Ok(input) => {
                        update_scene(Duration::ZERO, input, &mut scene);
                        self.finish_check(&mut scene, &mut update_scene)?;
                    }
                    Err(error) => {
                        writeln!(self.output, "error: {error:#}")?;
                        continue;
                    }
                },
            }

            self.output
                .write_all(render(&scene, self.color).as_bytes())?;
        }

        self.output.flush()?;
        Ok(())
    }
}

fn revealed_arcs(scene: &Scene) -> usize {
    scene
        .progress
        .arcs
        .iter()
        .filter(|arc| arc.state != ArcState::Hidden)
        .count()
}

fn paint(text: &str, color: Color) -> String {
    let (red, green, blue) = color.to_rgb_u8();
    format!("\x1b[38;2;{red};{green};{blue}m{text}\x1b[0m")
}

fn paint_background(text: &str, color: Color) -> String {
    let (red, green, blue) = color.to_rgb_u8();
    format!("\x1b[48;2;{red};{green};{blue}m{text}\x1b[0m")
}

fn marker(visual: SlotVisual) -> &'static str {
    match visual {
        SlotVisual::Empty | SlotVisual::Neutral => " ",
        SlotVisual::Locked => "#",
        SlotVisual::Wrong => "x",
        SlotVisual::Selected => "*",
        SlotVisual::SwapTarget => "~",
    }
}

fn button(state: ButtonState) -> &'static str {
    match state {
        ButtonState::Enabled => "ready",
        ButtonState::Disabled => "disabled",
        ButtonState::Busy => "checking",
    }
}

/// Renders the scene as a block of text.
pub(crate) fn render(scene: &Scene, color: bool) -> String {
    let mut text = String::new();

    let _ = writeln!(
        text,
        "tries {}/{}   check: {}",
        scene.tries.remaining,
        scene.tries.total,
        button(scene.check_button)
    );

    text.push_str("board:\n");
    for cell in &scene.ring {
        let name = cell.piece.as_ref().map_or("-", |piece| piece.as_str());
        let label = format!("{}{name}", marker(cell.visual));
        let label = if color && cell.piece.is_some() {
            paint(&label, cell.visual.color())
        } else {
            label
        };
        let _ = writeln!(text, "  {:>2} {label}", cell.slot.get());
    }

    text.push_str("tray:");
    if scene.tray.is_empty() {
        text.push_str(" (empty)");
    }
    for cell in &scene.tray {
        let name = cell.piece.as_ref().map_or("-", |piece| piece.as_str());
        let selected = if cell.selected { "*" } else { "" };
        let _ = write!(text, "  {}:{selected}{name}", cell.slot.get());
    }
    text.push('\n');

    if scene.progress.visible {
        let ring: String = scene
            .progress
            .arcs
            .iter()
            .map(|arc| match arc.state {
                ArcState::Correct => '=',
                ArcState::Wrong => 'x',
                ArcState::Pending => '~',
                ArcState::Hidden => '.',
            })
            .collect();
        match scene.progress.sweep {
            Some(sweep) => {
                let _ = writeln!(text, "progress: [{ring}] {:.0}%", sweep * 100.0);
            }
            None => {
                let _ = writeln!(text, "progress: [{ring}]");
            }
        }
    }

    if let Some(preview) = &scene.swap_preview {
        let _ = writeln!(
            text,
            "drop would send {} to {}",
            preview.displaced, preview.to
        );
    }

    if let Some(banner) = scene.banner {
        let _ = writeln!(text, "{}", banner.message());
    }

    text
}
