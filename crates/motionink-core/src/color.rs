//! `#rrggbb` / `#rrggbbaa` colors as stored in shape properties.

use peniko::Color;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid hex color: {0:?}")]
pub struct ColorParseError(pub String);

/// An RGBA color parsed from a hex string.
///
/// Remembers whether the source spelled out an alpha channel so that
/// formatting gives back the same width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
    pub has_alpha: bool,
}

impl HexColor {
    pub const BLACK: HexColor = HexColor::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            a: 255,
            has_alpha: false,
        }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r,
            g,
            b,
            a,
            has_alpha: true,
        }
    }

    /// Parse, falling back to opaque black.
    pub fn parse_or_black(hex: &str) -> Self {
        hex.parse().unwrap_or(Self::BLACK)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Channel-wise interpolation, rounded to the nearest integer.
    pub fn lerp(&self, factor: f64, other: &HexColor) -> HexColor {
        let mix = |a: u8, b: u8| {
            let v = f64::from(a) * (1.0 - factor) + f64::from(b) * factor;
            v.round().clamp(0.0, 255.0) as u8
        };
        HexColor {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
            has_alpha: self.has_alpha || other.has_alpha,
        }
    }

    /// `[r, g, b]` scaled into `[0, 1]`.
    pub fn to_unit_rgb(&self) -> [f64; 3] {
        [
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        ]
    }

    pub fn opacity(&self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

impl FromStr for HexColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let digits = s.strip_prefix('#').ok_or_else(err)?;
        let well_formed = digits.bytes().all(|b| b.is_ascii_hexdigit())
            && (digits.len() == 6 || digits.len() == 8);
        if !well_formed {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| err());
        let mut color = HexColor::rgb(channel(0)?, channel(2)?, channel(4)?);
        if digits.len() == 8 {
            color.a = channel(6)?;
            color.has_alpha = true;
        }
        Ok(color)
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.has_alpha {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl From<HexColor> for Color {
    fn from(color: HexColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

impl From<Color> for HexColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        HexColor::rgba(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

/// Interpolate two hex strings; unparsable input keeps `a`.
pub fn lerp_hex(factor: f64, a: &str, b: &str) -> String {
    match (a.parse::<HexColor>(), b.parse::<HexColor>()) {
        (Ok(ca), Ok(cb)) => ca.lerp(factor, &cb).to_string(),
        _ => a.to_string(),
    }
}

/// Whether a stroke in this color would be visible.
pub fn is_visible(hex: &str) -> bool {
    hex.parse::<HexColor>()
        .map(|c| !c.is_transparent())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format() {
        let c: HexColor = "#cc88ff".parse().unwrap();
        assert_eq!((c.r, c.g, c.b, c.a), (0xcc, 0x88, 0xff, 255));
        assert_eq!(c.to_string(), "#cc88ff");

        let c: HexColor = "#AA66DD80".parse().unwrap();
        assert_eq!(c.a, 0x80);
        assert_eq!(c.to_string(), "#aa66dd80");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("cc88ff".parse::<HexColor>().is_err());
        assert!("#cc88f".parse::<HexColor>().is_err());
        assert!("#zz88ff".parse::<HexColor>().is_err());
        assert_eq!(HexColor::parse_or_black("red"), HexColor::BLACK);
    }

    #[test]
    fn test_lerp_hex() {
        assert_eq!(lerp_hex(0.5, "#000000", "#ffffff"), "#808080");
        assert_eq!(lerp_hex(0.0, "#102030", "#ffffff"), "#102030");
        assert_eq!(lerp_hex(1.0, "#102030", "#ffffff"), "#ffffff");
        assert_eq!(lerp_hex(0.5, "#000000", "#ffffff00"), "#80808080");
        assert_eq!(lerp_hex(0.5, "oops", "#ffffff"), "oops");
    }

    #[test]
    fn test_visibility_reads_alpha() {
        assert!(is_visible("#000000"));
        assert!(is_visible("#00000001"));
        assert!(!is_visible("#ff000000"));
        assert!(!is_visible("none"));
    }

    #[test]
    fn test_unit_rgb_and_peniko() {
        let c: HexColor = "#ff0000".parse().unwrap();
        assert_eq!(c.to_unit_rgb(), [1.0, 0.0, 0.0]);
        let round_trip = HexColor::from(Color::from(c));
        assert_eq!((round_trip.r, round_trip.g, round_trip.b), (255, 0, 0));
    }
}
