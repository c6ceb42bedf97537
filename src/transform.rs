//! World ↔ screen coordinate transform.
//!
//! Pure functions over [`Coordinates`] and [`Viewport`]; no state, no
//! error conditions for finite input. The zoom is a power of two: the
//! viewport's long side always spans `2^scale` world units.

use crate::types::{Coordinates, Point, Viewport};

/// Project a world-space point onto the screen.
pub fn to_screen(world: Point, coord: &Coordinates, viewport: &Viewport) -> Point {
    let size = viewport.long_side();
    let zoom = (-coord.scale).exp2();
    let center = viewport.center();

    Point::new(
        (world.x - coord.cx) * size * zoom + center.x,
        (world.y - coord.cy) * size * zoom + center.y,
    )
}

/// Inverse of [`to_screen`]: recover the world point under a screen point.
pub fn to_world(screen: Point, coord: &Coordinates, viewport: &Viewport) -> Point {
    let size = viewport.long_side();
    let zoom = coord.scale.exp2();
    let center = viewport.center();

    Point::new(
        (screen.x - center.x) / size * zoom + coord.cx,
        (screen.y - center.y) / size * zoom + coord.cy,
    )
}

/// True once a world point leaves the cache window: one zoom level wider
/// than the viewport, giving entities a one-level buffer before eviction.
pub fn is_outside_cache(world: Point, coord: &Coordinates) -> bool {
    let radius = coord.scale.exp2();
    (world.x - coord.cx).abs() > radius || (world.y - coord.cy).abs() > radius
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(cx: f64, cy: f64, scale: f64) -> Coordinates {
        Coordinates::new(cx, cy, scale)
    }

    const VP: Viewport = Viewport {
        width: 800.0,
        height: 600.0,
        resolution: 1.0,
    };

    // -----------------------------------------------------------------------
    // Projection
    // -----------------------------------------------------------------------

    #[test]
    fn view_center_maps_to_screen_center() {
        let c = coord(120.0, -40.0, 8.0);
        let s = to_screen(Point::new(120.0, -40.0), &c, &VP);
        assert_eq!(s, Point::new(400.0, 300.0));
    }

    #[test]
    fn raising_scale_by_one_halves_apparent_offset() {
        let near = to_screen(Point::new(10.0, 0.0), &coord(0.0, 0.0, 8.0), &VP);
        let far = to_screen(Point::new(10.0, 0.0), &coord(0.0, 0.0, 9.0), &VP);
        let center = VP.center();
        assert!(((far.x - center.x) * 2.0 - (near.x - center.x)).abs() < 1e-9);
    }

    #[test]
    fn resolution_scales_logical_size() {
        let hidpi = Viewport::new(1600.0, 1200.0, 2.0);
        let a = to_screen(Point::new(5.0, 5.0), &coord(0.0, 0.0, 6.0), &VP);
        let b = to_screen(Point::new(5.0, 5.0), &coord(0.0, 0.0, 6.0), &hidpi);
        assert!((a.x - b.x).abs() < 1e-9);
        assert!((a.y - b.y).abs() < 1e-9);
    }

    // -----------------------------------------------------------------------
    // Round trip
    // -----------------------------------------------------------------------

    #[test]
    fn screen_world_round_trip() {
        let c = coord(-321.5, 7000.25, 11.0);
        for &(x, y) in &[(0.0, 0.0), (-4096.0, 123.0), (65_000.0, -65_000.0)] {
            let w = Point::new(x, y);
            let back = to_world(to_screen(w, &c, &VP), &c, &VP);
            assert!((back.x - w.x).abs() < 1e-6, "x: {} vs {}", back.x, w.x);
            assert!((back.y - w.y).abs() < 1e-6, "y: {} vs {}", back.y, w.y);
        }
    }

    // -----------------------------------------------------------------------
    // Cache window
    // -----------------------------------------------------------------------

    #[test]
    fn cache_window_is_one_zoom_level_wide() {
        let c = coord(0.0, 0.0, 4.0); // radius 16
        assert!(!is_outside_cache(Point::new(16.0, 0.0), &c));
        assert!(is_outside_cache(Point::new(16.1, 0.0), &c));
        assert!(!is_outside_cache(Point::new(0.0, -16.0), &c));
        assert!(is_outside_cache(Point::new(0.0, -16.1), &c));
    }

    #[test]
    fn cache_window_follows_center() {
        let c = coord(100.0, 100.0, 4.0);
        assert!(!is_outside_cache(Point::new(110.0, 110.0), &c));
        assert!(is_outside_cache(Point::new(0.0, 0.0), &c));
    }
}
