//! Category/mask/group collision filtering.
//!
//! Rapier's interaction groups cannot express group indices, so every collider
//! carries its filter packed in `user_data` and [`FilterHooks`] decides each
//! pair.

use rapier2d::geometry::SolverFlags;
use rapier2d::pipeline::{PairFilterContext, PhysicsHooks};

/// Category bits used when the file omits them.
pub const DEFAULT_CATEGORY_BITS: u16 = 0x0001;
/// Mask bits used when the file omits them.
pub const DEFAULT_MASK_BITS: u16 = 0xFFFF;

/// Collision filter of one fixture.
///
/// Two fixtures collide iff they share a non-zero group index that is
/// positive, or (without such a group) `(a.category & b.mask) != 0 &&
/// (b.category & a.mask) != 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionFilter {
    /// Which categories this fixture belongs to.
    pub category_bits: u16,
    /// Which categories this fixture collides with.
    pub mask_bits: u16,
    /// Shared positive group: always collide. Shared negative group: never.
    pub group_index: i16,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            category_bits: DEFAULT_CATEGORY_BITS,
            mask_bits: DEFAULT_MASK_BITS,
            group_index: 0,
        }
    }
}

impl CollisionFilter {
    /// Check if two filters allow contact.
    pub fn can_collide(a: &Self, b: &Self) -> bool {
        if a.group_index == b.group_index && a.group_index != 0 {
            return a.group_index > 0;
        }
        (a.category_bits & b.mask_bits) != 0 && (b.category_bits & a.mask_bits) != 0
    }

    /// Pack into a collider's `user_data`.
    pub fn to_user_data(self) -> u128 {
        u128::from(self.category_bits)
            | (u128::from(self.mask_bits) << 16)
            | (u128::from(self.group_index as u16) << 32)
    }

    /// Unpack from a collider's `user_data`.
    pub fn from_user_data(data: u128) -> Self {
        Self {
            category_bits: (data & 0xFFFF) as u16,
            mask_bits: ((data >> 16) & 0xFFFF) as u16,
            group_index: ((data >> 32) & 0xFFFF) as u16 as i16,
        }
    }
}

/// Physics hooks applying [`CollisionFilter::can_collide`] to every pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterHooks;

impl FilterHooks {
    fn allows(context: &PairFilterContext) -> bool {
        match (
            context.colliders.get(context.collider1),
            context.colliders.get(context.collider2),
        ) {
            (Some(c1), Some(c2)) => CollisionFilter::can_collide(
                &CollisionFilter::from_user_data(c1.user_data),
                &CollisionFilter::from_user_data(c2.user_data),
            ),
            _ => true,
        }
    }
}

impl PhysicsHooks for FilterHooks {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        if Self::allows(context) {
            Some(SolverFlags::COMPUTE_IMPULSES)
        } else {
            None
        }
    }

    fn filter_intersection_pair(&self, context: &PairFilterContext) -> bool {
        Self::allows(context)
    }
}
