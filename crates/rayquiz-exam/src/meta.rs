//! Display text attached to each generated question. Never graded.

use rayquiz_geom::{Ray, Sphere, Vec3};
use rayquiz_model::{Level, QuestionMeta};

fn format_vec(v: Vec3) -> String {
    format!("[{:.2}, {:.2}, {:.2}]", v.x, v.y, v.z)
}

pub fn level_meta(
    level: Level,
    ray: &Ray,
    sphere: &Sphere,
    t_window: Option<[f64; 2]>,
    tolerance: f64,
) -> QuestionMeta {
    let mut params = vec![
        format!("o = {}", format_vec(ray.origin)),
        format!("d = {} (unit)", format_vec(ray.direction)),
        format!("c = {}, r = {:.2}", format_vec(sphere.center), sphere.radius),
    ];
    if let (Level::C, Some([a, b])) = (level, t_window) {
        params.push(format!("t-window [a,b] = [{a:.3}, {b:.3}], ε = {tolerance}"));
    }
    let params = params.join("  |  ");

    let (name, prompt) = match level {
        Level::A => (
            "Ray–Sphere (Level A: Apply)",
            "Substitute the ray into the sphere equation and explain why the result is \
             quadratic in t. Choose the sign of Δ and say what it implies for the hit.",
        ),
        Level::B => (
            "Ray–Sphere (Level B: Tangency Hunter)",
            "Analyze tangency using p(t) = o + t d, the projection m = (c − o) · d and the \
             perpendicular distance ρ = ‖(c − o) − m d‖; the ray is tangent iff ρ = r.\n\
             Classify the branch, decide whether the ray reaches the given t, and give the \
             first forward hit t (leave empty if there is none). Explain which relationships \
             hold at tangency.",
        ),
        Level::C => (
            "Ray–Sphere (Level C: Evaluate)",
            "Four spheres and a t-window [a,b].\n\
             1) Discard spheres whose hits all fall outside [a,b].\n\
             2) Decide which of the rest are hit inside [a,b].\n\
             3) Give the first valid hit (sphere index and t); a tangent counts as a hit.\n\
             4) If two hits are within ε, justify the tie-break under the policy.",
        ),
    };

    QuestionMeta {
        name: name.to_string(),
        params,
        prompt: prompt.to_string(),
    }
}
