//! Success effects: the confetti overlay and the reward indicator
//!
//! Each confetti batch runs as its own tokio task that owns its particles and
//! its surface. Nothing is shared between batches, and callers only get a
//! handle that reports when the batch is done; there is no way to stop one
//! early. The surface is detached by a drop guard so it never outlives the
//! task, even if the runtime shuts down mid-animation.

use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use docquiz_core::confetti::{Batch, Bounds, ConfettiOptions, Particle};
use docquiz_core::reward::INDICATOR_DURATION;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::prelude::{println, *};

/// Time between animation frames (~60 Hz)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Virtual pixels per terminal cell, so particle speeds read the same as on a canvas
const CELL_WIDTH: f64 = 8.0;
const CELL_HEIGHT: f64 = 16.0;

/// Something particles can be drawn on for the lifetime of one batch
pub trait Surface: Send + 'static {
    /// Attach the overlay and report its size
    fn attach(&mut self) -> Bounds;

    fn draw(&mut self, particles: &[Particle]);

    /// Remove the overlay and release whatever it holds
    fn detach(&mut self);
}

/// Surface that draws nothing, used when output is not a terminal
#[derive(Debug, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn attach(&mut self) -> Bounds {
        Bounds {
            width: 800.0,
            height: 600.0,
        }
    }

    fn draw(&mut self, _particles: &[Particle]) {}

    fn detach(&mut self) {}
}

/// Text shown on top of the overlay for as long as its owner keeps it visible
#[derive(Debug, Clone)]
pub struct Caption {
    text: String,
    visible: Arc<AtomicBool>,
}

impl Caption {
    fn new(text: String) -> Self {
        Self {
            text,
            visible: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.visible
            .load(Ordering::SeqCst)
            .then_some(self.text.as_str())
    }

    fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }
}

/// Full-screen overlay on stderr using the terminal's alternate screen
#[derive(Debug)]
pub struct TerminalSurface {
    columns: u16,
    rows: u16,
    caption: Option<Caption>,
}

impl TerminalSurface {
    /// `None` when stderr is not a terminal or its size is unknown
    pub fn detect() -> Option<Self> {
        let stderr = std::io::stderr();
        if !stderr.is_terminal() {
            return None;
        }
        let (terminal_size::Width(columns), terminal_size::Height(rows)) =
            terminal_size::terminal_size_of(&stderr)?;
        Some(Self {
            columns,
            rows,
            caption: None,
        })
    }

    /// Draw `caption` on the first row of every frame while it is visible
    pub fn with_caption(mut self, caption: Caption) -> Self {
        self.caption = Some(caption);
        self
    }

    fn glyph(particle: &Particle) -> char {
        const GLYPHS: [char; 4] = ['▀', '■', '▄', '▪'];
        let turn = particle.rotation.rem_euclid(std::f64::consts::TAU);
        let slot = (turn / std::f64::consts::FRAC_PI_2) as usize;
        GLYPHS[slot.min(GLYPHS.len() - 1)]
    }

    fn render(&self, particles: &[Particle]) -> String {
        let mut frame = String::from("\x1b[2J");
        for particle in particles {
            if particle.x < 0.0 || particle.y < 0.0 {
                continue;
            }
            let column = (particle.x / CELL_WIDTH) as u32 + 1;
            let row = (particle.y / CELL_HEIGHT) as u32 + 1;
            if column > u32::from(self.columns) || row > u32::from(self.rows) {
                continue;
            }

            let color = particle.color;
            let glyph = Self::glyph(particle)
                .to_string()
                .truecolor(color.r, color.g, color.b);
            let glyph = if particle.opacity < 0.35 {
                glyph.dimmed()
            } else {
                glyph
            };
            frame.push_str(&format!("\x1b[{row};{column}H{glyph}"));
        }

        if let Some(text) = self.caption.as_ref().and_then(Caption::current) {
            let width = text.chars().count() as u32;
            let column = (u32::from(self.columns).saturating_sub(width) / 2) + 1;
            frame.push_str(&format!("\x1b[1;{column}H{}", text.green().bold()));
        }
        frame
    }

    fn write(&self, sequence: &str) {
        let mut stderr = std::io::stderr().lock();
        if let Err(e) = stderr.write_all(sequence.as_bytes()).and_then(|_| stderr.flush()) {
            log::debug!("Failed to write confetti frame: {e}");
        }
    }
}

impl Surface for TerminalSurface {
    fn attach(&mut self) -> Bounds {
        // Alternate screen, hidden cursor.
        self.write("\x1b[?1049h\x1b[?25l");
        Bounds {
            width: f64::from(self.columns) * CELL_WIDTH,
            height: f64::from(self.rows) * CELL_HEIGHT,
        }
    }

    fn draw(&mut self, particles: &[Particle]) {
        let frame = self.render(particles);
        self.write(&frame);
    }

    fn detach(&mut self) {
        self.write("\x1b[?25h\x1b[?1049l");
    }
}

/// Best surface for the current process
pub fn default_surface() -> Box<dyn Surface> {
    match TerminalSurface::detect() {
        Some(surface) => Box::new(surface),
        None => Box::new(NullSurface),
    }
}

impl Surface for Box<dyn Surface> {
    fn attach(&mut self) -> Bounds {
        (**self).attach()
    }

    fn draw(&mut self, particles: &[Particle]) {
        (**self).draw(particles)
    }

    fn detach(&mut self) {
        (**self).detach()
    }
}

/// Detaches the surface when the batch task ends, however it ends
struct Attached<S: Surface>(S);

impl<S: Surface> Drop for Attached<S> {
    fn drop(&mut self) {
        self.0.detach();
    }
}

/// Lifecycle of one running confetti batch
#[derive(Debug)]
pub struct ConfettiHandle {
    task: JoinHandle<u64>,
}

impl ConfettiHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the batch to run to completion and return how many ticks it lived
    pub async fn finished(self) -> Result<u64> {
        self.task
            .await
            .map_err(|e| eyre!("Confetti task failed: {}", e))
    }
}

/// Start a self-terminating confetti batch on `surface`.
///
/// Must be called from within a tokio runtime.
pub fn fire_confetti<S: Surface>(options: ConfettiOptions, surface: S) -> ConfettiHandle {
    let task = tokio::spawn(async move {
        let mut surface = Attached(surface);
        let bounds = surface.0.attach();
        let mut batch = Batch::seed(&mut rand::thread_rng(), &options, bounds);
        log::debug!("Confetti batch started with {} particles", batch.len());

        let mut frames = tokio::time::interval(FRAME_INTERVAL);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            frames.tick().await;
            surface.0.draw(batch.particles());
            if batch.tick() == 0 {
                break;
            }
        }

        log::debug!("Confetti batch finished after {} ticks", batch.ticks());
        batch.ticks()
    });

    ConfettiHandle { task }
}

/// "+N coins" indicator, dismissed after a fixed delay
#[derive(Debug)]
pub struct RewardIndicator {
    caption: Caption,
    task: JoinHandle<()>,
}

impl RewardIndicator {
    /// Show the indicator on its own: a spinner line on a terminal, a plain line otherwise
    pub fn show(text: String) -> Self {
        let bar = if std::io::stderr().is_terminal() {
            Some(new_spinner(text.green().bold().to_string()))
        } else {
            println!("{text}");
            None
        };
        Self::spawn(text, INDICATOR_DURATION, bar)
    }

    /// Keep the indicator visible without drawing it; a surface given
    /// [`RewardIndicator::caption`] draws it inside the overlay instead.
    pub fn on_overlay(text: String) -> Self {
        Self::spawn(text, INDICATOR_DURATION, None)
    }

    fn spawn(text: String, duration: Duration, bar: Option<indicatif::ProgressBar>) -> Self {
        let caption = Caption::new(text);

        let shown = caption.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            shown.hide();
        });

        Self { caption, task }
    }

    pub fn caption(&self) -> Caption {
        self.caption.clone()
    }

    pub fn is_visible(&self) -> bool {
        self.caption.current().is_some()
    }

    pub async fn dismissed(self) {
        if let Err(e) = self.task.await {
            log::debug!("Reward indicator task failed: {e}");
        }
    }
}
