use crate::meta::level_meta;
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use rayquiz_geom::{
    first_forward_root, intersect, select_hit, Policy, Ray, SelectOptions, Sphere, Vec3,
};
use rayquiz_model::{
    Level, MultiSphere, Quality, QuestionData, QuestionKind, SingleSphere, TangencyVariant,
};

const WINDOW_STARTS: [f64; 5] = [0.0, 0.1, 0.2, 0.4, 0.6];
const WINDOW_WIDTHS: [f64; 3] = [2.0, 3.0, 4.0];

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Rejection-sampling budget for Level C.
    pub max_attempts: u32,
    pub sphere_count: usize,
    pub tolerance: f64,
    /// Chance that a Level A/B ray is aimed at its sphere.
    pub aim_probability: f64,
    pub tangency_variant: TangencyVariant,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            sphere_count: 4,
            tolerance: 1e-6,
            aim_probability: 0.75,
            tangency_variant: TangencyVariant::Explained,
        }
    }
}

/// Generates a question from the thread-local random source.
pub fn generate_question(level: Level) -> QuestionData {
    generate_question_with(level, &GeneratorSettings::default(), &mut rand::thread_rng())
}

pub fn generate_question_with<R: Rng + ?Sized>(
    level: Level,
    settings: &GeneratorSettings,
    rng: &mut R,
) -> QuestionData {
    match level {
        Level::A | Level::B => generate_single(level, settings, rng),
        Level::C => generate_multi(settings, rng),
    }
}

fn generate_single<R: Rng + ?Sized>(
    level: Level,
    settings: &GeneratorSettings,
    rng: &mut R,
) -> QuestionData {
    let center = random_vec(rng, -2.0, 2.0);
    let radius = rng.gen_range(0.6..1.6);

    let ray = if rng.gen_bool(settings.aim_probability.clamp(0.0, 1.0)) {
        let offset = random_vec(rng, -1.0, 1.0);
        let origin = center + offset * (radius * 1.6);
        let noise = random_vec(rng, -0.2, 0.2);
        Ray::new(origin, (center - origin + noise).normalized())
    } else {
        Ray::new(
            random_vec(rng, -2.0, 2.0),
            random_vec(rng, -1.0, 1.0).normalized(),
        )
    };
    let sphere = Sphere::new(center, radius);

    let meta = level_meta(level, &ray, &sphere, None, settings.tolerance);
    let kind = match level {
        Level::A => QuestionKind::Discriminant(SingleSphere { ray, sphere }),
        _ => QuestionKind::Tangency {
            ray,
            sphere,
            variant: settings.tangency_variant,
        },
    };

    QuestionData {
        kind,
        tolerance: settings.tolerance,
        quality: Quality::Guaranteed,
        meta,
    }
}

fn generate_multi<R: Rng + ?Sized>(settings: &GeneratorSettings, rng: &mut R) -> QuestionData {
    let ray = Ray::new(
        random_vec(rng, -2.0, 2.0),
        random_vec(rng, -2.0, 2.0).normalized(),
    );

    let start = *WINDOW_STARTS.choose(rng).unwrap_or(&0.0);
    let width = *WINDOW_WIDTHS.choose(rng).unwrap_or(&2.0);
    let policy = Policy {
        t_window: Some([start, start + width]),
        epsilon: settings.tolerance,
        tangent_counts_as_hit: true,
        first_hit_wins: true,
    };

    let mut spheres = random_spheres(rng, settings.sphere_count);
    let mut attempts = 0;
    while attempts < settings.max_attempts && !meets_quality(&ray, &spheres, &policy) {
        spheres = random_spheres(rng, settings.sphere_count);
        attempts += 1;
    }

    let quality = if meets_quality(&ray, &spheres, &policy) {
        debug!("level C configuration accepted after {attempts} resamples");
        Quality::Guaranteed
    } else {
        warn!(
            "level C quality constraints unmet after {} attempts; using last candidate",
            settings.max_attempts
        );
        Quality::Fallback
    };

    let first = spheres.first().copied().unwrap_or(Sphere::new(Vec3::zero(), 1.0));
    let meta = level_meta(Level::C, &ray, &first, policy.t_window, settings.tolerance);

    QuestionData {
        kind: QuestionKind::FirstHit(MultiSphere {
            ray,
            spheres,
            policy,
        }),
        tolerance: settings.tolerance,
        quality,
        meta,
    }
}

/// Level-C acceptance test: at least two spheres are forward-hittable
/// (window ignored) and at least one canonical hit lies inside the window.
pub fn meets_quality(ray: &Ray, spheres: &[Sphere], policy: &Policy) -> bool {
    let forward = spheres
        .iter()
        .filter(|sphere| first_forward_root(ray, sphere, policy.epsilon).is_some())
        .count();
    if forward < 2 {
        return false;
    }

    let opts = SelectOptions {
        t_window: policy.t_window,
        epsilon: policy.epsilon,
        treat_tangent_as_hit: policy.tangent_counts_as_hit,
    };
    spheres
        .iter()
        .any(|sphere| select_hit(intersect(ray, sphere), &opts).hit_t.is_some())
}

fn random_spheres<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Sphere> {
    (0..count)
        .map(|_| Sphere::new(random_vec(rng, -3.0, 3.0), rng.gen_range(0.4..1.8)))
        .collect()
}

fn random_vec<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> Vec3 {
    Vec3::new(
        rng.gen_range(min..max),
        rng.gen_range(min..max),
        rng.gen_range(min..max),
    )
}
