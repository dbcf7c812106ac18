//! Typography: pure string and colour transforms applied before layout.
//!
//! ## Why string transforms and not layout features?
//!
//! The body of a card is HTML-ish markup produced by the Markdown renderer.
//! Hanging punctuation and widow control are expressed *in that markup*
//! (a styled `<span>`, a no-break space) so that the layout engine only has
//! to honour two generic rules: "a span with negative left margin hangs" and
//! "never break at U+00A0". Both rules are implemented in
//! [`crate::layout`] / [`crate::pipeline::vector`].
//!
//! The transforms are regex-based and deliberately markup-unaware: quotes and
//! semicolons inside tag attributes or entities are wrapped too. Callers that
//! feed rich HTML should disable the feature.
//!
//! Every function is pure and independently testable.

use crate::error::ColorParseError;
use crate::pipeline::color::{contrast_ratio, parse_color};
use once_cell::sync::Lazy;
use regex::Regex;

/// WCAG AA contrast for normal text.
pub const DEFAULT_MIN_CONTRAST: f64 = 4.5;

/// Number of shades returned by default from [`generate_color_variations`].
pub const DEFAULT_VARIATIONS: usize = 5;

/// Inline style marking a hanging run. The layout flattener recognises it by
/// its negative `margin-left`.
pub const HANGING_SPAN_OPEN: &str =
    r#"<span style="margin-left: -0.3em; text-indent: 0.3em; display: inline-block;">"#;

// ── Hanging punctuation ─────────────────────────────────────────────────────

static RE_HANGING: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([.,;:!?"'»›])"#).unwrap());

/// Wrap every hanging punctuation mark in a span pulled 0.3 em to the left.
///
/// Single pass over the input; the inserted markup is not re-scanned. Running
/// it twice wraps the punctuation inside the first pass's `style` attribute.
pub fn apply_hanging_punctuation(text: &str) -> String {
    RE_HANGING
        .replace_all(text, format!("{HANGING_SPAN_OPEN}${{1}}</span>").as_str())
        .into_owned()
}

// ── Widow / orphan control ──────────────────────────────────────────────────

static RE_WIDOW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+(\S+\s*)$").unwrap());

/// Glue the last word to the previous one with a no-break space so a line
/// never ends with a single dangling word.
pub fn control_widows_orphans(text: &str) -> String {
    RE_WIDOW.replace(text, "\u{00A0}${1}").into_owned()
}

// ── Colour helpers ──────────────────────────────────────────────────────────

/// Return `foreground` unchanged when it reaches `min_ratio` against
/// `background`; otherwise the foreground with its OKLCH lightness forced to
/// 0.1 (light background) or 0.9 (dark background), as `#rrggbb`.
pub fn ensure_contrast(
    foreground: &str,
    background: &str,
    min_ratio: f64,
) -> Result<String, ColorParseError> {
    let fg = parse_color(foreground)?;
    let bg = parse_color(background)?;

    if contrast_ratio(&fg, &bg) >= min_ratio {
        return Ok(foreground.to_string());
    }

    let lightness = if bg.to_oklch().l > 0.5 { 0.1 } else { 0.9 };
    Ok(fg.with_lightness(lightness).to_hex())
}

/// `count` shades of `base` with OKLCH lightness `0.2 + (i / count) * 0.6`,
/// hue and chroma preserved.
pub fn generate_color_variations(base: &str, count: usize) -> Result<Vec<String>, ColorParseError> {
    let color = parse_color(base)?;
    Ok((0..count)
        .map(|i| {
            let lightness = 0.2 + (i as f64 / count as f64) * 0.6;
            color.with_lightness(lightness).to_hex()
        })
        .collect())
}

// ── Measurement heuristics ──────────────────────────────────────────────────

/// Golden-ratio line height for a font size.
pub fn optimal_line_height(font_size: f32) -> f32 {
    font_size * 1.618
}

/// Approximate advance width of `text` in em: 0.6 em per character.
pub fn measure_text_width(text: &str) -> f32 {
    text.chars().count() as f32 * 0.6
}

/// Greedy word wrap against [`measure_text_width`] (`max_width` in em),
/// applying widow control to every emitted line. Lines are joined with `\n`.
pub fn optimize_line_breaks(text: &str, max_width: f32) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure_text_width(&candidate) > max_width && !current.is_empty() {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
        .iter()
        .map(|line| control_widows_orphans(line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::color::parse_color;

    fn hang(c: &str) -> String {
        format!("{HANGING_SPAN_OPEN}{c}</span>")
    }

    #[test]
    fn test_hanging_wraps_each_mark() {
        let out = apply_hanging_punctuation("Hi, you!");
        assert_eq!(out, format!("Hi{} you{}", hang(","), hang("!")));
    }

    #[test]
    fn test_hanging_covers_guillemets_and_quotes() {
        let out = apply_hanging_punctuation("»a› 'b\"");
        for c in ["»", "›", "'", "\""] {
            assert!(out.contains(&hang(c)), "missing {c} in {out}");
        }
    }

    #[test]
    fn test_hanging_plain_text_untouched() {
        assert_eq!(apply_hanging_punctuation("no marks here"), "no marks here");
    }

    #[test]
    fn test_hanging_is_not_idempotent() {
        let once = apply_hanging_punctuation("End.");
        let twice = apply_hanging_punctuation(&once);
        assert_ne!(once, twice);
        // The second pass wraps the "." of "-0.3em" inside the first span's style.
        assert!(twice.contains(&format!("-0{}3em", hang("."))), "got: {twice}");
    }

    #[test]
    fn test_hanging_is_markup_unaware() {
        let out = apply_hanging_punctuation(r#"<a href="x">go</a>"#);
        assert!(out.starts_with(&format!("<a href={}", hang("\""))), "got: {out}");
    }

    #[test]
    fn test_widow_glues_last_word() {
        assert_eq!(control_widows_orphans("one two three"), "one two\u{00A0}three");
    }

    #[test]
    fn test_widow_keeps_trailing_whitespace() {
        assert_eq!(control_widows_orphans("one two \n"), "one\u{00A0}two \n");
    }

    #[test]
    fn test_widow_single_word_unchanged() {
        assert_eq!(control_widows_orphans("alone"), "alone");
        assert_eq!(control_widows_orphans(""), "");
    }

    #[test]
    fn test_contrast_sufficient_returns_input_verbatim() {
        let out = ensure_contrast("#1F2937", "#ffffff", DEFAULT_MIN_CONTRAST).unwrap();
        assert_eq!(out, "#1F2937");
    }

    #[test]
    fn test_contrast_fix_on_light_background() {
        let out = ensure_contrast("#777777", "#ffffff", DEFAULT_MIN_CONTRAST).unwrap();
        assert_eq!(out, "#030303");
    }

    #[test]
    fn test_contrast_fix_on_dark_background() {
        let out = ensure_contrast("#111111", "#000000", DEFAULT_MIN_CONTRAST).unwrap();
        assert_eq!(out, "#dedede");
    }

    #[test]
    fn test_contrast_fix_preserves_hue() {
        // Blue on slate: ratio ≈ 2.8, slate is dark → lightness 0.9.
        let out = ensure_contrast("#2563eb", "#1f2937", DEFAULT_MIN_CONTRAST).unwrap();
        assert_eq!(out, "#cddfff");
        let before = parse_color("#2563eb").unwrap().to_oklch();
        let after = parse_color(&out).unwrap().to_oklch();
        assert!((after.l - 0.9).abs() < 0.01, "l = {}", after.l);
        assert!((before.h - after.h).abs() < 3.0, "{} vs {}", before.h, after.h);
    }

    #[test]
    fn test_contrast_rejects_bad_color() {
        let err = ensure_contrast("nope", "#fff", DEFAULT_MIN_CONTRAST).unwrap_err();
        assert_eq!(err.input, "nope");
    }

    #[test]
    fn test_variations_increase_in_lightness() {
        for base in ["#2563eb", "#808080", "#ff0000"] {
            let shades = generate_color_variations(base, DEFAULT_VARIATIONS).unwrap();
            assert_eq!(shades.len(), 5);
            let ls: Vec<f64> = shades
                .iter()
                .map(|s| parse_color(s).unwrap().to_oklch().l)
                .collect();
            assert!(ls.windows(2).all(|w| w[0] < w[1]), "{base}: {ls:?}");
            assert!(shades.iter().all(|s| s.len() == 7 && s.starts_with('#')));
        }
    }

    #[test]
    fn test_variations_zero_count() {
        assert!(generate_color_variations("#000", 0).unwrap().is_empty());
    }

    #[test]
    fn test_line_height_and_width() {
        assert!((optimal_line_height(10.0) - 16.18).abs() < 1e-4);
        assert!((measure_text_width("abcde") - 3.0).abs() < 1e-6);
        assert_eq!(measure_text_width("ёжик"), measure_text_width("abcd"));
    }

    #[test]
    fn test_optimize_line_breaks() {
        // 6 chars → 3.6 em per line at most.
        let out = optimize_line_breaks("aa bb cc dd", 3.6);
        assert_eq!(out, "aa\u{00A0}bb\ncc\u{00A0}dd");
    }

    #[test]
    fn test_optimize_line_breaks_overlong_word() {
        let out = optimize_line_breaks("supercalifragilistic ok", 2.0);
        assert_eq!(out, "supercalifragilistic\nok");
    }
}
