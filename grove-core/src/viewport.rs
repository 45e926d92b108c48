//! Canvas bounds and the "ensure in view" heading correction.
//!
//! Positions are canvas coordinates: `x` grows to the right and `y` grows
//! downward, so a heading of `PI / 2` points up the screen.

use crate::config::Config;
use glam::Vec2;
use rand::Rng;

/// Unit step for a heading in canvas space.
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), -angle.sin())
}

/// The visible canvas area, anchored at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if `p` lies inside the canvas, edges included.
    ///
    /// Non-finite positions are never inside.
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Moves `p` to the nearest point inside the canvas.
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(0.0, self.width.max(0.0)),
            p.y.clamp(0.0, self.height.max(0.0)),
        )
    }

    /// Rotates `angle` by `±turn` (sign chosen at random) when the point
    /// `lookahead` units along it from `origin` would leave the canvas.
    ///
    /// ### Returns
    /// The corrected heading, or `angle` unchanged if that point stays inside.
    pub fn steer_into_view(
        &self,
        origin: Vec2,
        angle: f32,
        lookahead: f32,
        turn: f32,
        rng: &mut impl Rng,
    ) -> f32 {
        let ahead = origin + heading(angle) * lookahead;
        if self.contains(ahead) {
            return angle;
        }
        let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        angle + sign * turn
    }
}

/// A viewport paired with the correction parameters from [`Config`].
#[derive(Clone, Copy, Debug)]
pub struct Steering {
    pub viewport: Viewport,
    pub lookahead: f32,
    pub turn: f32,
    pub enabled: bool,
}

impl Steering {
    pub fn from_config(viewport: Viewport, cfg: &Config) -> Self {
        Self {
            viewport,
            lookahead: cfg.view_lookahead,
            turn: cfg.view_turn(),
            enabled: cfg.steer_into_view,
        }
    }

    /// A steering that never corrects headings.
    pub fn disabled(viewport: Viewport) -> Self {
        Self {
            viewport,
            lookahead: 0.0,
            turn: 0.0,
            enabled: false,
        }
    }

    pub fn correct(&self, origin: Vec2, angle: f32, rng: &mut impl Rng) -> f32 {
        if !self.enabled {
            return angle;
        }
        self.viewport
            .steer_into_view(origin, angle, self.lookahead, self.turn, rng)
    }
}
