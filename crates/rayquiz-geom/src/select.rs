//! Canonical hit selection under the forward, window and tangent rules.
//!
//! A single tolerance `epsilon` does double duty: it is the forward threshold
//! (roots below it are behind the origin) and the slack for multi-sphere
//! window padding and tie detection.

use crate::intersect::{intersect, DeltaCase, RootSet};
use crate::math::{Ray, Sphere};
use log::trace;
use serde::{Deserialize, Serialize};

/// Default forward threshold and tie slack.
pub const EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    NoIntersection,
    NegativeT,
    OutOfRange,
    Tangent,
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectOptions {
    pub t_window: Option<[f64; 2]>,
    pub epsilon: f64,
    pub treat_tangent_as_hit: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            t_window: None,
            epsilon: EPS,
            treat_tangent_as_hit: true,
        }
    }
}

/// Canonical single-sphere outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_t: Option<f64>,
    pub reason: ReasonCode,
    pub delta_case: DeltaCase,
    pub roots: RootSet,
}

impl HitResult {
    fn miss(reason: ReasonCode, roots: RootSet) -> Self {
        Self {
            hit_t: None,
            reason,
            delta_case: roots.delta_case(),
            roots,
        }
    }

    fn hit(t: f64, reason: ReasonCode, roots: RootSet) -> Self {
        Self {
            hit_t: Some(t),
            reason,
            delta_case: roots.delta_case(),
            roots,
        }
    }
}

fn outside(window: Option<[f64; 2]>, t: f64) -> bool {
    matches!(window, Some([a, b]) if t < a || t > b)
}

/// Picks the nearest forward root, then applies the window and tangent policy.
///
/// Only the smallest root `>= epsilon` is ever a candidate; if it falls
/// outside the window the result is a miss, never the second root.
pub fn select_hit(roots: RootSet, opts: &SelectOptions) -> HitResult {
    match roots {
        RootSet::Empty => HitResult::miss(ReasonCode::NoIntersection, roots),
        RootSet::Tangent(t0) => {
            if t0 < opts.epsilon {
                HitResult::miss(ReasonCode::NegativeT, roots)
            } else if outside(opts.t_window, t0) {
                HitResult::miss(ReasonCode::OutOfRange, roots)
            } else if !opts.treat_tangent_as_hit {
                HitResult::miss(ReasonCode::Tangent, roots)
            } else {
                HitResult::hit(t0, ReasonCode::Tangent, roots)
            }
        }
        RootSet::Two(_, _) => match roots.first_forward(opts.epsilon) {
            None => HitResult::miss(ReasonCode::NegativeT, roots),
            Some(t) if outside(opts.t_window, t) => HitResult::miss(ReasonCode::OutOfRange, roots),
            Some(t) => HitResult::hit(t, ReasonCode::Ok, roots),
        },
    }
}

/// Hit policy for a multi-sphere question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_window: Option<[f64; 2]>,
    pub epsilon: f64,
    pub tangent_counts_as_hit: bool,
    /// Near-simultaneous hits resolve to the lowest sphere index. This is the
    /// only tie-break implemented; the flag is carried for display.
    #[serde(default = "default_first_hit_wins")]
    pub first_hit_wins: bool,
}

fn default_first_hit_wins() -> bool {
    true
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            t_window: None,
            epsilon: EPS,
            tangent_counts_as_hit: true,
            first_hit_wins: true,
        }
    }
}

/// Canonical outcome across a sphere collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiHit {
    pub sphere_index: usize,
    pub t: f64,
    pub reason: ReasonCode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tie_with: Vec<usize>,
}

impl MultiHit {
    pub fn has_tie(&self) -> bool {
        !self.tie_with.is_empty()
    }
}

/// First valid hit across `spheres`, with index-order tie-break.
///
/// A later sphere replaces the running best only when it is earlier by more
/// than `epsilon`; within `epsilon` it is recorded in `tie_with` and the
/// lower index keeps the win.
pub fn select_multi_hit(ray: &Ray, spheres: &[Sphere], policy: &Policy) -> Option<MultiHit> {
    let eps = policy.epsilon;
    let mut best: Option<MultiHit> = None;

    for (index, sphere) in spheres.iter().enumerate() {
        let roots = intersect(ray, sphere);
        let t = match roots.first_forward(eps) {
            Some(t) => t,
            None => {
                trace!("sphere {index}: no forward root");
                continue;
            }
        };

        if let Some([a, b]) = policy.t_window {
            if t < a - eps || t > b + eps {
                trace!("sphere {index}: t={t} outside [{a}, {b}]");
                continue;
            }
        }

        let reason = if roots.delta_case() == DeltaCase::Zero {
            ReasonCode::Tangent
        } else {
            ReasonCode::Ok
        };
        if reason == ReasonCode::Tangent && !policy.tangent_counts_as_hit {
            trace!("sphere {index}: tangent hit excluded by policy");
            continue;
        }

        match best.as_mut() {
            None => {
                best = Some(MultiHit {
                    sphere_index: index,
                    t,
                    reason,
                    tie_with: Vec::new(),
                });
            }
            Some(current) => {
                if t < current.t - eps {
                    *current = MultiHit {
                        sphere_index: index,
                        t,
                        reason,
                        tie_with: Vec::new(),
                    };
                } else if (t - current.t).abs() <= eps {
                    current.tie_with.push(index);
                }
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn nearest_positive_root_wins() {
        let result = select_hit(RootSet::Two(4.0, 6.0), &SelectOptions::default());
        assert_eq!(result.hit_t, Some(4.0));
        assert_eq!(result.reason, ReasonCode::Ok);
        assert_eq!(result.delta_case, DeltaCase::Pos);
    }

    #[test]
    fn origin_inside_sphere_uses_far_root() {
        let result = select_hit(RootSet::Two(-1.0, 1.0), &SelectOptions::default());
        assert_eq!(result.hit_t, Some(1.0));
    }

    #[test]
    fn roots_behind_origin_are_negative_t() {
        let result = select_hit(RootSet::Two(-6.0, -4.0), &SelectOptions::default());
        assert_eq!(result.hit_t, None);
        assert_eq!(result.reason, ReasonCode::NegativeT);
    }

    #[test]
    fn root_below_epsilon_is_not_forward() {
        let result = select_hit(RootSet::Two(1e-7, 2e-7), &SelectOptions::default());
        assert_eq!(result.reason, ReasonCode::NegativeT);
    }

    #[test]
    fn window_never_substitutes_second_root() {
        let opts = SelectOptions {
            t_window: Some([5.0, 7.0]),
            ..SelectOptions::default()
        };
        let result = select_hit(RootSet::Two(4.0, 6.0), &opts);
        assert_eq!(result.hit_t, None);
        assert_eq!(result.reason, ReasonCode::OutOfRange);
    }

    #[test]
    fn tangent_policy_controls_hit() {
        let hit = select_hit(RootSet::Tangent(5.0), &SelectOptions::default());
        assert_eq!(hit.hit_t, Some(5.0));
        assert_eq!(hit.reason, ReasonCode::Tangent);
        assert_eq!(hit.delta_case, DeltaCase::Zero);

        let opts = SelectOptions {
            treat_tangent_as_hit: false,
            ..SelectOptions::default()
        };
        let miss = select_hit(RootSet::Tangent(5.0), &opts);
        assert_eq!(miss.hit_t, None);
        assert_eq!(miss.reason, ReasonCode::Tangent);
    }

    #[test]
    fn tangent_checks_order() {
        let behind = select_hit(RootSet::Tangent(-2.0), &SelectOptions::default());
        assert_eq!(behind.reason, ReasonCode::NegativeT);

        let opts = SelectOptions {
            t_window: Some([0.0, 1.0]),
            treat_tangent_as_hit: false,
            ..SelectOptions::default()
        };
        let late = select_hit(RootSet::Tangent(5.0), &opts);
        assert_eq!(late.reason, ReasonCode::OutOfRange);
    }

    #[test]
    fn empty_roots_are_no_intersection() {
        let result = select_hit(RootSet::Empty, &SelectOptions::default());
        assert_eq!(result.reason, ReasonCode::NoIntersection);
        assert_eq!(result.delta_case, DeltaCase::Neg);
    }

    #[test]
    fn multi_hit_prefers_nearest_sphere() {
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        let spheres = [
            Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0),
            Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0),
        ];
        let best = select_multi_hit(&ray, &spheres, &Policy::default()).unwrap();
        assert_eq!(best.sphere_index, 1);
        assert!((best.t - 4.0).abs() < 1e-12);
        assert!(!best.has_tie());
    }

    #[test]
    fn multi_hit_none_when_nothing_qualifies() {
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, -1.0));
        let spheres = [Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0)];
        assert!(select_multi_hit(&ray, &spheres, &Policy::default()).is_none());
        assert!(select_multi_hit(&ray, &[], &Policy::default()).is_none());
    }
}
