//! Ray–sphere intersection and canonical hit selection.

pub mod intersect;
pub mod math;
pub mod select;
pub mod tangent;

pub use intersect::{
    discriminant, first_forward_root, intersect, segment_hits_sphere, DeltaCase, RootSet, EPS_D,
};
pub use math::{add, dot, length, normalize, scale, sub, Ray, Sphere, Vec3};
pub use select::{
    select_hit, select_multi_hit, HitResult, MultiHit, Policy, ReasonCode, SelectOptions, EPS,
};
pub use tangent::{closest_approach, perturb_direction, tangent_direction, ClosestApproach};
