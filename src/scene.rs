//! Base scene geometry: a perspective camera looking at the video plane.

/// Vertical field of view, degrees.
pub const FOV_Y: f64 = 55.0;
pub const CAMERA_Z: f64 = 1000.0;
pub const PLANE_WIDTH: f64 = 800.0;
pub const PLANE_HEIGHT: f64 = 600.0;
/// Negative x flips the plane so the feed reads like a mirror.
pub const PLANE_SCALE: (f64, f64) = (-1.45, 1.45);

/// Half-extents of the video plane in normalized device coordinates for a
/// viewport of the given aspect ratio. The x component carries the mirror
/// sign.
pub fn plane_extent(aspect: f64) -> (f32, f32) {
    let half_h = (FOV_Y.to_radians() / 2.0).tan() * CAMERA_Z;
    let half_w = half_h * aspect;
    let x = PLANE_WIDTH / 2.0 * PLANE_SCALE.0 / half_w;
    let y = PLANE_HEIGHT / 2.0 * PLANE_SCALE.1 / half_h;
    (x as f32, y as f32)
}

pub fn aspect(width: u32, height: u32) -> f64 {
    if height == 0 {
        1.0
    } else {
        width as f64 / height as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_is_mirrored() {
        let (x, y) = plane_extent(4.0 / 3.0);
        assert!(x < 0.0);
        assert!(y > 0.0);
    }

    #[test]
    fn height_ignores_aspect() {
        let (_, a) = plane_extent(16.0 / 9.0);
        let (_, b) = plane_extent(9.0 / 16.0);
        assert!((a - b).abs() < 1e-6);
        // 435 / (tan(27.5deg) * 1000)
        assert!((a - 0.8356).abs() < 1e-3);
    }

    #[test]
    fn narrower_viewport_widens_plane() {
        let (wide, _) = plane_extent(16.0 / 9.0);
        let (tall, _) = plane_extent(9.0 / 16.0);
        assert!(tall.abs() > wide.abs());
    }

    #[test]
    fn zero_height_aspect_falls_back() {
        assert_eq!(aspect(800, 0), 1.0);
        assert_eq!(aspect(800, 400), 2.0);
    }
}
