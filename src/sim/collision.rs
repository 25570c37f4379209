//! Axis-aligned bounding box collision
//!
//! Every collision test in the game is box vs box. Boxes are stored as
//! center + half extents so the overlap test is symmetric by construction.

use glam::Vec2;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    /// Build a box from its top-left corner and size
    pub fn from_corner(pos: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            center: pos + half,
            half,
        }
    }

    /// Strict overlap test: touching edges do not collide
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half + other.half;
        d.x < reach.x && d.y < reach.y
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.half.y
    }

    pub fn bottom(&self) -> f32 {
        self.center.y + self.half.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_overlap_basic() {
        let a = Aabb::from_corner(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::from_corner(Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0));
        let c = Aabb::from_corner(Vec2::new(20.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Aabb::from_corner(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::from_corner(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_containment_overlaps() {
        let outer = Aabb::from_corner(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0));
        let inner = Aabb::from_corner(Vec2::new(40.0, 40.0), Vec2::new(5.0, 5.0));
        assert!(outer.overlaps(&inner));
        assert_eq!(outer.top(), 0.0);
        assert_eq!(outer.bottom(), 100.0);
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(
            ax in -500.0f32..500.0, ay in -500.0f32..500.0,
            aw in 1.0f32..200.0, ah in 1.0f32..200.0,
            bx in -500.0f32..500.0, by in -500.0f32..500.0,
            bw in 1.0f32..200.0, bh in 1.0f32..200.0,
        ) {
            let a = Aabb::from_corner(Vec2::new(ax, ay), Vec2::new(aw, ah));
            let b = Aabb::from_corner(Vec2::new(bx, by), Vec2::new(bw, bh));
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }
    }
}
