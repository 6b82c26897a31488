// aabb.rs - axis-aligned boxes for broad-phase collision

use glam::Vec3;

/// Axis-aligned bounding box, stored as min/max corners.
///
/// Entities carry a local-space box; the pool derives the world-space box
/// each tick by translating the local box to the entity's position. Rotation
/// and scale never touch the box: collision is always tested against the
/// translated local box, matching gameplay behavior.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box centered on the origin with the given half extents.
    pub fn from_half_extent(half: Vec3) -> Self {
        Self {
            min: -half,
            max: half,
        }
    }

    /// The box shifted by `offset`. Pure translation, no rotation/scale.
    #[inline]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// A box with no positive extent on some axis collides with nothing.
    /// The default (zeroed) box is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.cmpge(self.max).any()
    }

    /// Separating-axis overlap test, non-strict on every axis: boxes that
    /// merely touch count as overlapping.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_at(pos: Vec3) -> Aabb {
        Aabb::from_half_extent(Vec3::splat(0.5)).translated(pos)
    }

    #[test]
    fn overlapping_boxes_intersect() {
        let a = unit_at(Vec3::ZERO);
        let b = unit_at(Vec3::new(0.5, 0.0, 0.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn touching_boxes_count_as_overlapping() {
        let a = unit_at(Vec3::ZERO);
        let b = unit_at(Vec3::new(1.0, 0.0, 0.0));
        assert!(a.intersects(&b));
    }

    #[test]
    fn separation_on_any_axis_fails() {
        let a = unit_at(Vec3::ZERO);
        assert!(!a.intersects(&unit_at(Vec3::new(1.01, 0.0, 0.0))));
        assert!(!a.intersects(&unit_at(Vec3::new(0.0, -1.01, 0.0))));
        assert!(!a.intersects(&unit_at(Vec3::new(0.0, 0.0, 1.01))));
        assert!(!a.intersects(&unit_at(Vec3::new(100.0, 0.0, 0.0))));
    }

    #[test]
    fn translated_moves_both_corners() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE).translated(Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(a.min, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(a.max, Vec3::new(3.0, 1.0, 1.0));
    }

    #[test]
    fn default_box_is_empty() {
        assert!(Aabb::default().is_empty());
        assert!(!Aabb::from_half_extent(Vec3::splat(0.5)).is_empty());
    }
}
