//! Confetti particle physics
//!
//! A batch of particles is seeded above the visible area and stepped with
//! explicit Euler integration: position by velocity, vertical velocity by
//! gravity, rotation by angular velocity. Every tick also fades each particle
//! by a fixed amount, and particles that are fully transparent are pruned. The
//! fixed fade bounds the lifetime of every batch to [`MAX_TICKS`].
//!
//! Rendering and frame scheduling live in the shell; this module only owns
//! the numbers.

use rand::Rng;
use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_COUNT: usize = 40;

pub const DEFAULT_PALETTE: [&str; 5] = ["#ff4757", "#ff6b6b", "#ffd166", "#06d6a0", "#4d96ff"];

/// Opacity lost by every particle on each tick
pub const FADE_PER_TICK: f64 = 0.005;

/// Upper bound on the number of ticks any batch can live
pub const MAX_TICKS: u64 = (1.0 / FADE_PER_TICK) as u64 + 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfettiError {
    #[error("Particle count must be greater than zero")]
    EmptyCount,

    #[error("Palette must contain at least one color")]
    EmptyPalette,

    #[error("Invalid color '{0}', expected #rgb or #rrggbb")]
    InvalidColor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FromStr for Color {
    type Err = ConfettiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfettiError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>, repeat: bool| {
            let digits = &hex[range];
            let value = u8::from_str_radix(digits, 16).map_err(|_| invalid())?;
            Ok::<u8, ConfettiError>(if repeat { value * 17 } else { value })
        };

        match hex.len() {
            3 => Ok(Color {
                r: channel(0..1, true)?,
                g: channel(1..2, true)?,
                b: channel(2..3, true)?,
            }),
            6 => Ok(Color {
                r: channel(0..2, false)?,
                g: channel(2..4, false)?,
                b: channel(4..6, false)?,
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parse a list of hex colors
pub fn parse_palette<S: AsRef<str>>(colors: &[S]) -> Result<Vec<Color>, ConfettiError> {
    if colors.is_empty() {
        return Err(ConfettiError::EmptyPalette);
    }
    colors.iter().map(|c| c.as_ref().parse()).collect()
}

/// Validated batch settings: at least one particle and one color
#[derive(Debug, Clone, PartialEq)]
pub struct ConfettiOptions {
    count: usize,
    palette: Vec<Color>,
}

impl ConfettiOptions {
    pub fn new(count: usize, palette: Vec<Color>) -> Result<Self, ConfettiError> {
        if count == 0 {
            return Err(ConfettiError::EmptyCount);
        }
        if palette.is_empty() {
            return Err(ConfettiError::EmptyPalette);
        }
        Ok(Self { count, palette })
    }

    pub fn with_count(count: usize) -> Result<Self, ConfettiError> {
        Self::new(count, default_palette())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }
}

impl Default for ConfettiOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            palette: default_palette(),
        }
    }
}

fn default_palette() -> Vec<Color> {
    DEFAULT_PALETTE
        .iter()
        .filter_map(|c| c.parse().ok())
        .collect()
}

/// Size of the surface particles are seeded over
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: Color,
    pub rotation: f64,
    pub vx: f64,
    pub vy: f64,
    pub gravity: f64,
    pub angular_velocity: f64,
    pub opacity: f64,
}

impl Particle {
    fn seed<R: Rng + ?Sized>(rng: &mut R, palette: &[Color], bounds: Bounds) -> Self {
        Particle {
            x: rng.gen::<f64>() * bounds.width.max(0.0),
            y: -20.0 - rng.gen::<f64>() * 200.0,
            radius: 6.0 + rng.gen::<f64>() * 6.0,
            color: palette[rng.gen_range(0..palette.len())],
            rotation: rng.gen::<f64>() * 2.0 * PI,
            vx: (rng.gen::<f64>() - 0.5) * 6.0,
            vy: 2.0 + rng.gen::<f64>() * 6.0,
            gravity: 0.25 + rng.gen::<f64>() * 0.3,
            angular_velocity: (rng.gen::<f64>() - 0.5) * 0.1,
            opacity: 1.0,
        }
    }

    /// Advance one tick
    pub fn step(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        self.vy += self.gravity;
        self.rotation += self.angular_velocity;
        self.opacity -= FADE_PER_TICK;
    }

    pub fn is_faded(&self) -> bool {
        self.opacity <= 0.0
    }
}

/// One independently animated set of particles
#[derive(Debug, Clone)]
pub struct Batch {
    particles: Vec<Particle>,
    ticks: u64,
}

impl Batch {
    pub fn seed<R: Rng + ?Sized>(rng: &mut R, options: &ConfettiOptions, bounds: Bounds) -> Self {
        let particles = (0..options.count)
            .map(|_| Particle::seed(rng, &options.palette, bounds))
            .collect();

        Self {
            particles,
            ticks: 0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Step every particle, prune faded ones and return how many remain.
    pub fn tick(&mut self) -> usize {
        for particle in &mut self.particles {
            particle.step();
        }
        self.particles.retain(|p| !p.is_faded());
        self.ticks += 1;
        self.particles.len()
    }
}
