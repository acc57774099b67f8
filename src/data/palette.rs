//! Signal colors and the rotating default palette.
//!
//! Producers may name a color per signal. Accepted forms:
//! - single-letter codes `r g b c m y k w`
//! - a small set of names (`red`, `green`, `blue`, `cyan`, `magenta`, `yellow`, `black`,
//!   `white`, `orange`, `gray`/`grey`)
//! - hex `#rgb`, `#rrggbb` or `#rrggbbaa`
//!
//! Anything else is rejected with [`PlotError::InvalidColor`] and the registry falls back
//! to [`Palette::next`].

use crate::error::{PlotError, PlotResult};
use std::fmt;
use std::str::FromStr;

/// RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Opaque color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses a color token. Surrounding whitespace and case are ignored.
    pub fn parse(token: &str) -> PlotResult<Self> {
        let trimmed = token.trim();
        let invalid = || PlotError::InvalidColor(token.to_string());

        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        let color = match trimmed.to_ascii_lowercase().as_str() {
            "r" | "red" => Color::rgb(255, 0, 0),
            "g" | "green" => Color::rgb(0, 255, 0),
            "b" | "blue" => Color::rgb(0, 0, 255),
            "c" | "cyan" => Color::rgb(0, 255, 255),
            "m" | "magenta" => Color::rgb(255, 0, 255),
            "y" | "yellow" => Color::rgb(255, 255, 0),
            "k" | "black" => Color::rgb(0, 0, 0),
            "w" | "white" => Color::rgb(255, 255, 255),
            "orange" => Color::rgb(255, 165, 0),
            "gray" | "grey" => Color::rgb(128, 128, 128),
            _ => return Err(invalid()),
        };
        Ok(color)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some(Color::rgb(it.next()??, it.next()??, it.next()??))
        }
        6 => Some(Color::rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        8 => Some(Color {
            r: channel(&hex[0..2])?,
            g: channel(&hex[2..4])?,
            b: channel(&hex[4..6])?,
            a: channel(&hex[6..8])?,
        }),
        _ => None,
    }
}

impl FromStr for Color {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Default palette tokens, in rotation order.
pub const DEFAULT_PALETTE: &[&str] = &["r", "g", "b", "c", "m", "y"];

/// Rotating color assignment for signals that arrive without a usable color.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<Color>,
    cursor: usize,
}

impl Palette {
    /// Builds a palette from color tokens. Fails on an empty list or any bad token.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> PlotResult<Self> {
        if tokens.is_empty() {
            return Err(PlotError::Configuration(
                "palette must contain at least one color".to_string(),
            ));
        }
        let colors = tokens
            .iter()
            .map(|t| Color::parse(t.as_ref()))
            .collect::<PlotResult<Vec<_>>>()?;
        Ok(Self { colors, cursor: 0 })
    }

    /// Returns the color under the cursor and moves the cursor on, wrapping around.
    pub fn next(&mut self) -> Color {
        let color = self.colors[self.cursor];
        self.cursor = (self.cursor + 1) % self.colors.len();
        color
    }

    /// Moves the cursor back to the first color.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Number of colors in the rotation.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; a palette holds at least one color.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![
                Color::rgb(255, 0, 0),
                Color::rgb(0, 255, 0),
                Color::rgb(0, 0, 255),
                Color::rgb(0, 255, 255),
                Color::rgb(255, 0, 255),
                Color::rgb(255, 255, 0),
            ],
            cursor: 0,
        }
    }
}
