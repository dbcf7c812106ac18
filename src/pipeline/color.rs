//! Colour parsing, conversion and contrast math.
//!
//! Only what the typography helpers and the SVG writer need:
//!
//! * CSS-ish parsing: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`,
//!   `rgba()` and the names `white`, `black`, `transparent`.
//! * sRGB ↔ linear sRGB ↔ OKLab ↔ OKLCH (Björn Ottosson's matrices).
//! * WCAG 2.1 relative luminance and contrast ratio.
//! * `#rrggbb` formatting with chroma reduction for out-of-gamut OKLCH
//!   colours, so changing lightness never shifts the hue.

use crate::error::ColorParseError;
use std::fmt;
use std::str::FromStr;

/// A gamma-encoded sRGB colour with straight alpha, channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// Polar OKLab: lightness `0..=1`, chroma `0..~0.4`, hue in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oklch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

/// Parse any accepted colour syntax.
pub fn parse_color(input: &str) -> Result<Rgba, ColorParseError> {
    input.parse()
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ColorParseError::new(input, "empty string"));
        }
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "white" => return Ok(Rgba::opaque(1.0, 1.0, 1.0)),
            "black" => return Ok(Rgba::opaque(0.0, 0.0, 0.0)),
            "transparent" => {
                return Ok(Rgba {
                    r: 0.0,
                    g: 0.0,
                    b: 0.0,
                    a: 0.0,
                })
            }
            _ => {}
        }
        if let Some(hex) = lower.strip_prefix('#') {
            return parse_hex(input, hex);
        }
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
        {
            let args = args
                .strip_suffix(')')
                .ok_or_else(|| ColorParseError::new(input, "missing closing parenthesis"))?;
            return parse_rgb_args(input, args);
        }
        Err(ColorParseError::new(input, "unsupported color syntax"))
    }
}

fn parse_hex(input: &str, hex: &str) -> Result<Rgba, ColorParseError> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorParseError::new(input, "invalid hex digit"));
    }
    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex.to_string(),
        n => {
            return Err(ColorParseError::new(
                input,
                format!("hex colors have 3, 4, 6 or 8 digits, got {n}"),
            ))
        }
    };
    let byte = |i: usize| -> Result<f64, ColorParseError> {
        u8::from_str_radix(&expanded[i..i + 2], 16)
            .map(|v| f64::from(v) / 255.0)
            .map_err(|e| ColorParseError::new(input, e.to_string()))
    };
    Ok(Rgba {
        r: byte(0)?,
        g: byte(2)?,
        b: byte(4)?,
        a: if expanded.len() == 8 { byte(6)? } else { 1.0 },
    })
}

fn parse_rgb_args(input: &str, args: &str) -> Result<Rgba, ColorParseError> {
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(ColorParseError::new(
            input,
            format!("expected 3 or 4 components, got {}", parts.len()),
        ));
    }
    let channel = |p: &str| -> Result<f64, ColorParseError> {
        let v = match p.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().map(|v| v / 100.0),
            None => p.parse::<f64>().map(|v| v / 255.0),
        }
        .map_err(|_| ColorParseError::new(input, format!("invalid component '{p}'")))?;
        Ok(v.clamp(0.0, 1.0))
    };
    let alpha = match parts.get(3) {
        None => 1.0,
        Some(p) => match p.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().map(|v| v / 100.0),
            None => p.parse::<f64>(),
        }
        .map_err(|_| ColorParseError::new(input, format!("invalid alpha '{p}'")))?
        .clamp(0.0, 1.0),
    };
    Ok(Rgba {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: alpha,
    })
}

// ── Conversions ──────────────────────────────────────────────────────────

fn to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn to_gamma(c: f64) -> f64 {
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

const GAMUT_EPSILON: f64 = 1e-6;

impl Rgba {
    pub const fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// WCAG 2.1 relative luminance (alpha ignored).
    pub fn relative_luminance(&self) -> f64 {
        0.2126 * to_linear(self.r) + 0.7152 * to_linear(self.g) + 0.0722 * to_linear(self.b)
    }

    pub fn to_oklch(&self) -> Oklch {
        let (r, g, b) = (to_linear(self.r), to_linear(self.g), to_linear(self.b));

        let l = 0.412_221_470_8 * r + 0.536_332_536_3 * g + 0.051_445_992_9 * b;
        let m = 0.211_903_498_2 * r + 0.680_699_545_1 * g + 0.107_396_956_6 * b;
        let s = 0.088_302_461_9 * r + 0.281_718_837_6 * g + 0.629_978_700_5 * b;

        let (l_, m_, s_) = (l.cbrt(), m.cbrt(), s.cbrt());

        let lightness = 0.210_454_255_3 * l_ + 0.793_617_785_0 * m_ - 0.004_072_046_8 * s_;
        let a = 1.977_998_495_1 * l_ - 2.428_592_205_0 * m_ + 0.450_593_709_9 * s_;
        let bb = 0.025_904_037_1 * l_ + 0.782_771_766_2 * m_ - 0.808_675_766_0 * s_;

        let chroma = (a * a + bb * bb).sqrt();
        let hue = if chroma < 1e-9 {
            0.0
        } else {
            bb.atan2(a).to_degrees().rem_euclid(360.0)
        };
        Oklch {
            l: lightness,
            c: chroma,
            h: hue,
        }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not fully opaque. Channels are clipped.
    pub fn to_hex(&self) -> String {
        let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b) = (byte(self.r), byte(self.g), byte(self.b));
        if self.a >= 1.0 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{:02x}", byte(self.a))
        }
    }

    /// Colour with the same hue and chroma but a different OKLCH lightness.
    pub fn with_lightness(&self, lightness: f64) -> Self {
        let lch = Oklch {
            l: lightness.clamp(0.0, 1.0),
            ..self.to_oklch()
        };
        lch.to_rgba(self.a)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Oklch {
    /// Unclipped linear sRGB for this colour.
    fn to_linear_rgb(self) -> (f64, f64, f64) {
        let (a, b) = (
            self.c * self.h.to_radians().cos(),
            self.c * self.h.to_radians().sin(),
        );
        let l_ = self.l + 0.396_337_777_4 * a + 0.215_803_757_3 * b;
        let m_ = self.l - 0.105_561_345_8 * a - 0.063_854_172_8 * b;
        let s_ = self.l - 0.089_484_177_5 * a - 1.291_485_548_0 * b;

        let (l, m, s) = (l_.powi(3), m_.powi(3), s_.powi(3));

        (
            4.076_741_662_1 * l - 3.307_711_591_3 * m + 0.230_969_929_2 * s,
            -1.268_438_004_6 * l + 2.609_757_401_1 * m - 0.341_319_396_5 * s,
            -0.004_196_086_3 * l - 0.703_418_614_7 * m + 1.707_614_701_0 * s,
        )
    }

    fn in_gamut(self) -> bool {
        let (r, g, b) = self.to_linear_rgb();
        [r, g, b]
            .iter()
            .all(|v| (-GAMUT_EPSILON..=1.0 + GAMUT_EPSILON).contains(v))
    }

    /// Convert to sRGB, reducing chroma (never lightness or hue) until the
    /// colour fits the sRGB gamut.
    pub fn to_rgba(self, alpha: f64) -> Rgba {
        let mut target = self;
        if !target.in_gamut() {
            let (mut lo, mut hi) = (0.0, self.c);
            for _ in 0..24 {
                let mid = (lo + hi) / 2.0;
                if (Oklch { c: mid, ..self }).in_gamut() {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            target.c = lo;
        }
        let (r, g, b) = target.to_linear_rgb();
        Rgba {
            r: to_gamma(r.clamp(0.0, 1.0)),
            g: to_gamma(g.clamp(0.0, 1.0)),
            b: to_gamma(b.clamp(0.0, 1.0)),
            a: alpha,
        }
    }
}

/// WCAG 2.1 contrast ratio between two colours, `1.0..=21.0`, symmetric.
pub fn contrast_ratio(a: &Rgba, b: &Rgba) -> f64 {
    let (la, lb) = (a.relative_luminance(), b.relative_luminance());
    let (hi, lo) = if la >= lb { (la, lb) } else { (lb, la) };
    (hi + 0.05) / (lo + 0.05)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_color("#fff").unwrap(), Rgba::opaque(1.0, 1.0, 1.0));
        assert_eq!(parse_color("#000000").unwrap().to_hex(), "#000000");
        assert_eq!(parse_color("#2563EB").unwrap().to_hex(), "#2563eb");
        let half = parse_color("#ff000080").unwrap();
        assert!((half.a - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(half.to_hex(), "#ff000080");
    }

    #[test]
    fn parses_rgb_functions_and_names() {
        assert_eq!(parse_color("rgb(255, 0, 0)").unwrap().to_hex(), "#ff0000");
        assert_eq!(parse_color("rgba(0,0,255,0.5)").unwrap().a, 0.5);
        assert_eq!(parse_color("White").unwrap().to_hex(), "#ffffff");
        assert_eq!(parse_color("transparent").unwrap().a, 0.0);
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "#12", "#ggg", "rgb(1,2)", "rgb(1,2,3", "blue-ish"] {
            let err = parse_color(bad).unwrap_err();
            assert_eq!(err.input, bad);
        }
    }

    #[test]
    fn contrast_extremes() {
        let white = parse_color("#ffffff").unwrap();
        let black = parse_color("#000000").unwrap();
        assert!((contrast_ratio(&white, &black) - 21.0).abs() < 1e-9);
        assert!((contrast_ratio(&white, &white) - 1.0).abs() < 1e-9);
        assert_eq!(contrast_ratio(&white, &black), contrast_ratio(&black, &white));
    }

    #[test]
    fn contrast_known_pair() {
        // #767676 on white is the classic "just passes AA" grey.
        let grey = parse_color("#767676").unwrap();
        let white = parse_color("#ffffff").unwrap();
        assert!(contrast_ratio(&grey, &white) > 4.5);
        let lighter = parse_color("#777777").unwrap();
        assert!(contrast_ratio(&lighter, &white) < 4.5);
    }

    #[test]
    fn white_has_unit_lightness() {
        let lch = parse_color("#ffffff").unwrap().to_oklch();
        assert!((lch.l - 1.0).abs() < 1e-4, "l = {}", lch.l);
        assert!(lch.c < 1e-4);
    }

    #[test]
    fn oklch_round_trip_is_stable() {
        let c = parse_color("#2563eb").unwrap();
        assert_eq!(c.to_oklch().to_rgba(1.0).to_hex(), "#2563eb");
    }

    #[test]
    fn grey_lightness_maps_to_expected_hex() {
        let grey = parse_color("#808080").unwrap();
        assert_eq!(grey.with_lightness(0.1).to_hex(), "#030303");
        assert_eq!(grey.with_lightness(0.9).to_hex(), "#dedede");
    }

    #[test]
    fn out_of_gamut_keeps_lightness() {
        let blue = parse_color("#0000ff").unwrap();
        let dark = blue.with_lightness(0.2);
        let got = dark.to_oklch().l;
        assert!((got - 0.2).abs() < 0.01, "l = {got}");
    }
}
