//! Interpolation and the map projection.

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Projects (lon, lat) degrees into a `width` x `height` box, keeping aspect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Equirectangular {
    pub scale: f64,
    pub offset: (f64, f64),
}

impl Equirectangular {
    pub fn fit(width: f64, height: f64) -> Self {
        let scale = (width / 360.0).min(height / 180.0);
        let offset = ((width - 360.0 * scale) / 2.0, (height - 180.0 * scale) / 2.0);
        Self { scale, offset }
    }

    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        (
            self.offset.0 + (lon + 180.0) * self.scale,
            self.offset.1 + (90.0 - lat) * self.scale,
        )
    }

    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.offset.0) / self.scale - 180.0, 90.0 - (y - self.offset.1) / self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_fits_and_inverts() {
        let p = Equirectangular::fit(720.0, 500.0);
        assert_eq!(p.scale, 2.0);
        assert_eq!(p.project(-180.0, 90.0), (0.0, 70.0));
        assert_eq!(p.project(180.0, -90.0), (720.0, 430.0));
        let (lon, lat) = p.invert(360.0, 250.0);
        assert!(lon.abs() < 1e-9 && lat.abs() < 1e-9);
    }

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
        assert_eq!(lerp(2.0, 6.0, 0.25), 3.0);
    }
}
