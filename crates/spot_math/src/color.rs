//! Integer RGB color used by the shading pipeline.

use std::ops::{Add, AddAssign, Div, Mul};

/// An RGB color with integer channels, nominally in `0..=255`.
///
/// Channels may leave that range while colors are blended (procedural
/// materials add signed offsets, averages may overshoot). Clamping happens
/// only when the color is converted to bytes for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Color {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    /// Create a new color.
    pub const fn new(r: i32, g: i32, b: i32) -> Self {
        Self { r, g, b }
    }

    /// Create a gray color with every channel set to `value`.
    pub const fn splat(value: i32) -> Self {
        Self::new(value, value, value)
    }

    /// Create a color from 8-bit channels.
    pub fn from_rgb8(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0] as i32, rgb[1] as i32, rgb[2] as i32)
    }

    /// Add the same offset to every channel.
    pub fn offset(self, delta: i32) -> Self {
        Self::new(self.r + delta, self.g + delta, self.b + delta)
    }

    /// Clamp every channel to `0..=255` and convert to bytes.
    pub fn to_rgb8(self) -> [u8; 3] {
        [
            self.r.clamp(0, 255) as u8,
            self.g.clamp(0, 255) as u8,
            self.b.clamp(0, 255) as u8,
        ]
    }

    /// Integer average of the colors that made a contribution.
    ///
    /// `None` entries are skipped. Returns `None` when no entry contributed.
    pub fn average<I>(colors: I) -> Option<Color>
    where
        I: IntoIterator<Item = Option<Color>>,
    {
        let (sum, count) = colors
            .into_iter()
            .flatten()
            .fold((Color::BLACK, 0i32), |(sum, count), c| (sum + c, count + 1));

        (count > 0).then(|| sum / count)
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Color {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, rhs: Color) {
        *self = *self + rhs;
    }
}

/// Scale every channel, truncating toward zero.
impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, s: f32) -> Color {
        Color::new(
            (self.r as f32 * s) as i32,
            (self.g as f32 * s) as i32,
            (self.b as f32 * s) as i32,
        )
    }
}

impl Div<i32> for Color {
    type Output = Color;

    fn div(self, d: i32) -> Color {
        Color::new(self.r / d, self.g / d, self.b / d)
    }
}
