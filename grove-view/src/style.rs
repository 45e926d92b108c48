//! Connection colors and stroke widths.

use egui::{Color32, Stroke};
use grove_core::connections::Connection;
use grove_core::particle::Particle;

/// Mean density above which a connection is drawn near-white.
const WHITE_DENSITY: f32 = 0.85;
const MAX_ALPHA: f32 = 0.4;
const MAX_WIDTH: f32 = 2.2;

/// Converts HSL (hue in degrees, saturation and lightness in `[0, 1]`) plus
/// an alpha in `[0, 1]` into a [`Color32`].
pub fn hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Color32 {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = lightness - c / 2.0;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    Color32::from_rgba_unmultiplied(
        channel(r + m),
        channel(g + m),
        channel(b + m),
        channel(alpha),
    )
}

#[inline]
fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Stroke for a connection between `a` and `b`.
///
/// Fades and thins linearly with distance. Dense pairs are white, the rest
/// take the pair's mean hue.
///
/// ### Returns
/// `None` when the connection would be invisible.
pub fn connection_stroke(
    a: &Particle,
    b: &Particle,
    connection: &Connection,
    max_distance: f32,
) -> Option<Stroke> {
    let closeness = connection.closeness(max_distance);
    if closeness <= 0.0 {
        return None;
    }
    let alpha = closeness * MAX_ALPHA;
    let density = (a.density + b.density) * 0.5;

    let color = if density > WHITE_DENSITY {
        Color32::from_rgba_unmultiplied(255, 255, 255, channel(alpha * 0.6))
    } else {
        hsla((a.hue + b.hue) * 0.5, 0.8, 0.75, alpha * 0.8)
    };
    let width = (MAX_WIDTH * density).min(MAX_WIDTH) * closeness;
    Some(Stroke::new(width, color))
}
