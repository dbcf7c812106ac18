//! Decorative background patterns.
//!
//! Tile patterns are 20×20 user-unit SVG `<pattern>` definitions drawn at very
//! low opacity. [`DecorativePattern::Curves`] has no tile; it is the large
//! corner curve returned by [`corner_curve`].

use crate::config::DecorativePattern;
use crate::layout::tree::{Frame, Graphic, Position};

/// Side of a pattern tile in px.
pub const TILE: u32 = 20;

/// `<pattern>` element with the given `id`, painting in `color`.
///
/// `Curves` has no tile of its own and yields the `Dots` tile, matching the
/// fallback for unknown pattern names.
pub fn pattern_def(pattern: DecorativePattern, id: &str, color: &str) -> String {
    let body = match pattern {
        DecorativePattern::Lines => {
            format!(r#"<path d="M0,10 L20,10" stroke="{color}" stroke-width="1" opacity="0.1"/>"#)
        }
        DecorativePattern::Grid => format!(
            r#"<path d="M20,0 L0,0 L0,20" fill="none" stroke="{color}" stroke-width="1" opacity="0.05"/>"#
        ),
        DecorativePattern::Diagonal => {
            format!(r#"<path d="M0,20 L20,0" stroke="{color}" stroke-width="1" opacity="0.1"/>"#)
        }
        DecorativePattern::Dots | DecorativePattern::Curves => {
            format!(r#"<circle cx="10" cy="10" r="2" fill="{color}" opacity="0.1"/>"#)
        }
    };
    format!(
        r#"<pattern id="{id}" patternUnits="userSpaceOnUse" width="{TILE}" height="{TILE}">{body}</pattern>"#
    )
}

/// The 300×400 accent curve hugging the top-right corner at 10 % opacity.
pub fn corner_curve(color: &str) -> Graphic {
    Graphic {
        frame: Frame {
            position: Position::Absolute {
                top: Some(0.0),
                right: Some(0.0),
                bottom: None,
                left: None,
            },
            opacity: 0.1,
            ..Frame::default()
        },
        width: 300.0,
        height: 400.0,
        view_box: (300.0, 400.0),
        color: color.to_string(),
        markup: r#"<path d="M300,0 C200,100 250,200 150,300 C100,350 200,400 300,400 Z" fill="currentColor"/>"#
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_def_uses_id_and_color() {
        let def = pattern_def(DecorativePattern::Grid, "p0", "#ff0000");
        assert!(def.starts_with(r#"<pattern id="p0""#));
        assert!(def.contains(r##"stroke="#ff0000""##));
        assert!(def.contains(r#"opacity="0.05""#));
    }

    #[test]
    fn test_curves_tile_falls_back_to_dots() {
        assert_eq!(
            pattern_def(DecorativePattern::Curves, "x", "#000"),
            pattern_def(DecorativePattern::Dots, "x", "#000")
        );
    }

    #[test]
    fn test_corner_curve_is_absolute_top_right() {
        let g = corner_curve("#f59e0b");
        assert_eq!((g.width, g.height), (300.0, 400.0));
        assert!(matches!(
            g.frame.position,
            Position::Absolute { top: Some(_), right: Some(_), .. }
        ));
        assert_eq!(g.frame.opacity, 0.1);
    }
}
