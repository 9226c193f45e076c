//! Pure reactive-state helpers: synthetic mouse, aspect fit, easing.
//!
//! None of these allocate or depend on wall-clock time directly - callers
//! pass in whatever time/state values they already have.

use glam::Vec2;

/// An axis-aligned rectangle in buffer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge, in pixels.
    pub x: f32,
    /// Top edge, in pixels.
    pub y: f32,
    /// Width, in pixels.
    pub w: f32,
    /// Height, in pixels.
    pub h: f32,
}

impl Rect {
    /// The rect's center point.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Whether `other` fully contains `self`.
    pub fn is_contained_by(&self, other: &Rect) -> bool {
        self.x >= other.x - 1e-3
            && self.y >= other.y - 1e-3
            && self.x + self.w <= other.x + other.w + 1e-3
            && self.y + self.h <= other.y + other.h + 1e-3
    }
}

/// Computes a Lissajous-like synthetic pointer position for shaders that
/// expect a `mouse` uniform.
///
/// Radius grows with long-window energy so quiet passages keep the pointer
/// near center and loud passages let it roam; `beat_phase` nudges `x` on
/// each beat edge so the motion reads as music-driven rather than purely
/// periodic.
pub fn calc_synthetic_mouse(time: f32, energy_slow: f32, bass: f32, mid: f32, beat_phase: f32) -> Vec2 {
    let radius = 0.12 + energy_slow * 0.18;
    let x = 0.5 + (time).sin() * radius * (1.0 + bass * 0.3) + beat_phase * 0.1;
    let y = 0.5 + (2.0 * time).sin() * radius * (1.0 + mid * 0.2);
    Vec2::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0))
}

/// Computes aspect-correct placement of an `img_w` x `img_h` image within a
/// `buf_w` x `buf_h` buffer, centered.
///
/// `cover = false` letterboxes (the returned rect fits entirely inside the
/// buffer); `cover = true` fills and crops (the returned rect fully covers
/// the buffer).
pub fn calc_aspect_ratio_dimensions(img_w: f32, img_h: f32, buf_w: f32, buf_h: f32, cover: bool) -> Rect {
    if img_w <= 0.0 || img_h <= 0.0 || buf_w <= 0.0 || buf_h <= 0.0 {
        return Rect { x: 0.0, y: 0.0, w: buf_w.max(0.0), h: buf_h.max(0.0) };
    }

    let img_aspect = img_w / img_h;
    let buf_aspect = buf_w / buf_h;

    let (w, h) = if (img_aspect > buf_aspect) == cover {
        // Width-constrained: match buffer height, derive width from aspect.
        (buf_h * img_aspect, buf_h)
    } else {
        // Height-constrained: match buffer width, derive height from aspect.
        (buf_w, buf_w / img_aspect)
    };

    Rect {
        x: (buf_w - w) * 0.5,
        y: (buf_h - h) * 0.5,
        w,
        h,
    }
}

/// Symmetric quadratic ease, `t ∈ [0,1] -> [0,1]`.
///
/// Used by the image tile's crossfade so the blend accelerates into the
/// midpoint and decelerates out rather than moving linearly.
pub fn ease_in_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn synthetic_mouse_stays_in_unit_square() {
        for i in 0..1000 {
            let t = i as f32 * 0.137;
            let p = calc_synthetic_mouse(t, 1.0, 1.0, 1.0, 1.0);
            assert!((0.0..=1.0).contains(&p.x));
            assert!((0.0..=1.0).contains(&p.y));
        }
    }

    #[test]
    fn ease_in_out_quad_endpoints_and_midpoint() {
        assert_relative_eq!(ease_in_out_quad(0.0), 0.0);
        assert_relative_eq!(ease_in_out_quad(1.0), 1.0);
        assert_relative_eq!(ease_in_out_quad(0.5), 0.5);
    }

    #[test]
    fn ease_in_out_quad_clamps_out_of_range_input() {
        assert_relative_eq!(ease_in_out_quad(-5.0), 0.0);
        assert_relative_eq!(ease_in_out_quad(5.0), 1.0);
    }

    #[test]
    fn aspect_fit_cover_fully_contains_buffer() {
        let buf = Rect { x: 0.0, y: 0.0, w: 1280.0, h: 720.0 };
        let rect = calc_aspect_ratio_dimensions(1000.0, 1000.0, buf.w, buf.h, true);
        assert!(buf.is_contained_by(&rect));
        assert_relative_eq!(rect.center().x, buf.center().x, epsilon = 1e-3);
        assert_relative_eq!(rect.center().y, buf.center().y, epsilon = 1e-3);
    }

    #[test]
    fn aspect_fit_contain_is_fully_contained_by_buffer() {
        let buf = Rect { x: 0.0, y: 0.0, w: 1280.0, h: 720.0 };
        let rect = calc_aspect_ratio_dimensions(1000.0, 1000.0, buf.w, buf.h, false);
        assert!(rect.is_contained_by(&buf));
        assert_relative_eq!(rect.center().x, buf.center().x, epsilon = 1e-3);
        assert_relative_eq!(rect.center().y, buf.center().y, epsilon = 1e-3);
    }
}
