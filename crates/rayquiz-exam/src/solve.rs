use log::debug;
use rayquiz_geom::{intersect, select_hit, select_multi_hit, HitResult, Ray, SelectOptions, Sphere};
use rayquiz_model::{BranchCode, QuestionData, QuestionKind, Solution};

/// Canonical single-sphere hit with no window and tangents counted as hits.
pub fn solve_single(ray: &Ray, sphere: &Sphere, tolerance: f64) -> HitResult {
    let opts = SelectOptions {
        epsilon: tolerance,
        ..SelectOptions::default()
    };
    select_hit(intersect(ray, sphere), &opts)
}

/// Canonical answer for any generated question.
pub fn solve(question: &QuestionData) -> Solution {
    let solution = match &question.kind {
        QuestionKind::Discriminant(scene) => Solution::Discriminant {
            hit: solve_single(&scene.ray, &scene.sphere, question.tolerance),
        },
        QuestionKind::Tangency { ray, sphere, .. } => {
            let hit = solve_single(ray, sphere, question.tolerance);
            Solution::Tangency {
                hit,
                branch: BranchCode::expected(hit.delta_case, hit.hit_t.is_some()),
            }
        }
        QuestionKind::FirstHit(scene) => Solution::FirstHit {
            best: select_multi_hit(&scene.ray, &scene.spheres, &scene.policy),
        },
    };
    debug!("level {} canonical solution: {:?}", question.level(), solution);
    solution
}
