//! Static vertical partition of the play field
//!
//! Top band is the goal, bottom band is the start, enemies travel through
//! the middle band.

/// A horizontal strip spanning the full canvas width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub top: f32,
    pub bottom: f32,
}

impl Band {
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Strictly between the band edges
    pub fn contains_y(&self, y: f32) -> bool {
        y > self.top && y < self.bottom
    }
}

/// The three contiguous bands of the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zones {
    pub top: Band,
    pub middle: Band,
    pub bottom: Band,
}

impl Zones {
    /// Partition `height` with a safe zone of `safe_zone` at each end
    ///
    /// A safe zone taller than half the screen is clamped so the middle band
    /// never has negative height.
    pub fn new(height: f32, safe_zone: f32) -> Self {
        let safe = safe_zone.clamp(0.0, height / 2.0);
        Self {
            top: Band {
                top: 0.0,
                bottom: safe,
            },
            middle: Band {
                top: safe,
                bottom: height - safe,
            },
            bottom: Band {
                top: height - safe,
                bottom: height,
            },
        }
    }

    pub fn bands(&self) -> [Band; 3] {
        [self.top, self.middle, self.bottom]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zones_800x600() {
        let zones = Zones::new(600.0, 105.0);
        assert_eq!(zones.top, Band { top: 0.0, bottom: 105.0 });
        assert_eq!(zones.middle, Band { top: 105.0, bottom: 495.0 });
        assert_eq!(zones.bottom, Band { top: 495.0, bottom: 600.0 });
        assert_eq!(zones.middle.height(), 390.0);
    }

    #[test]
    fn test_oversized_safe_zone_is_clamped() {
        let zones = Zones::new(100.0, 80.0);
        assert_eq!(zones.middle.height(), 0.0);
        assert_eq!(zones.top.bottom, zones.middle.top);
    }

    #[test]
    fn test_contains_is_strict() {
        let band = Band { top: 10.0, bottom: 20.0 };
        assert!(band.contains_y(15.0));
        assert!(!band.contains_y(10.0));
        assert!(!band.contains_y(20.0));
    }

    proptest! {
        #[test]
        fn prop_bands_are_contiguous(height in 1.0f32..4000.0, safe in 0.0f32..500.0) {
            let zones = Zones::new(height, safe);
            prop_assert_eq!(zones.top.top, 0.0);
            prop_assert_eq!(zones.top.bottom, zones.middle.top);
            prop_assert_eq!(zones.middle.bottom, zones.bottom.top);
            prop_assert_eq!(zones.bottom.bottom, height);
            for band in zones.bands() {
                prop_assert!(band.height() >= 0.0);
            }
        }
    }
}
