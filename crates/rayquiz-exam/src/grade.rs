//! Partial-credit grading of a learner answer against the canonical result.
//!
//! Real numbers are always compared with `|a - b| <= tol`.

use crate::solve::solve_single;
use log::debug;
use rayquiz_geom::{select_multi_hit, Ray, Sphere};
use rayquiz_model::{
    BranchCode, Checks, ExpectedAnswer, GradeReason, GradingResult, MultiChecks, MultiSphere,
    QuestionData, QuestionKind, SegmentChecks, StudentAnswer, TangencyVariant, Verdict,
};

const REACH_WEIGHT: f64 = 0.3;
const BRANCH_WEIGHT: f64 = 0.3;
const THRESHOLD_WEIGHT: f64 = 0.4;

const INDEX_WEIGHT: f64 = 0.5;
const T_WEIGHT: f64 = 0.3;
const TIE_WEIGHT: f64 = 0.2;
/// Ceiling for a multi-sphere answer when no tie exists to justify.
const NO_TIE_CAP: f64 = 0.8;

const EXPLANATION_BONUS: f64 = 0.2;

const TANGENCY_KEYWORDS: [&str; 8] = [
    "ray",
    "sphere",
    "intersection",
    "root",
    "positive",
    "negative",
    "tangent",
    "geometry",
];
const EVALUATION_KEYWORDS: [&str; 6] = ["first", "index", "policy", "tie", "tangent", "window"];
const TIE_BREAK_KEYWORDS: [&str; 2] = ["first", "index"];

fn nearly_equal(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn has_keyword(text: Option<&str>, keywords: &[&str]) -> bool {
    match text {
        Some(text) => {
            let lower = text.to_lowercase();
            keywords.iter().any(|keyword| lower.contains(keyword))
        }
        None => false,
    }
}

/// Clamps to `[0, 1]` and drops accumulated float noise from the weight sums.
fn finish_score(score: f64) -> f64 {
    (score.clamp(0.0, 1.0) * 1e9).round() / 1e9
}

fn reason_for(verdict: Verdict) -> GradeReason {
    if verdict == Verdict::Correct {
        GradeReason::Ok
    } else {
        GradeReason::MismatchSelection
    }
}

/// Grades one submission. Unimplemented level/answer pairings (including all
/// of Level A) yield an `UNSUPPORTED_LEVEL` result with score 0.
pub fn grade(question: &QuestionData, answer: &StudentAnswer) -> GradingResult {
    match (&question.kind, answer) {
        (
            QuestionKind::Tangency {
                ray,
                sphere,
                variant,
            },
            StudentAnswer::Branch {
                branch,
                x_to_check,
                reaches_x,
                x_threshold,
                explanation,
            },
        ) => grade_tangency(
            ray,
            sphere,
            *variant,
            question.tolerance,
            &BranchSubmission {
                branch: *branch,
                x_to_check: *x_to_check,
                reaches_x: *reaches_x,
                x_threshold: *x_threshold,
                explanation: explanation.as_deref(),
            },
        ),
        (
            QuestionKind::FirstHit(scene),
            StudentAnswer::FirstHit {
                first_sphere_index,
                t,
                tie_break_justification,
                evaluation_explanation,
                ..
            },
        ) => grade_first_hit(
            scene,
            &FirstHitSubmission {
                index: *first_sphere_index,
                t: *t,
                justification: tie_break_justification.as_deref(),
                evaluation: evaluation_explanation.as_deref(),
            },
        ),
        _ => {
            debug!("no grader for level {} with this answer", question.level());
            GradingResult::unsupported()
        }
    }
}

struct BranchSubmission<'a> {
    branch: Option<BranchCode>,
    x_to_check: Option<f64>,
    reaches_x: Option<bool>,
    x_threshold: Option<f64>,
    explanation: Option<&'a str>,
}

fn grade_tangency(
    ray: &Ray,
    sphere: &Sphere,
    variant: TangencyVariant,
    tolerance: f64,
    answer: &BranchSubmission<'_>,
) -> GradingResult {
    let hit = solve_single(ray, sphere, tolerance);
    let t_hit = hit.hit_t;

    let reach_expected = match (t_hit, answer.x_to_check) {
        (Some(t), Some(x)) => t <= x + tolerance,
        _ => false,
    };
    let reach_student = answer.reaches_x.unwrap_or(false);

    let branch_expected = BranchCode::expected(hit.delta_case, t_hit.is_some());
    let branch_pass = answer.branch == Some(branch_expected);

    let threshold_pass = match (t_hit, answer.x_threshold) {
        (None, None) => true,
        (Some(expected), Some(given)) => nearly_equal(given, expected, tolerance),
        _ => false,
    };

    let mut score = 0.0;
    if reach_expected == reach_student {
        score += REACH_WEIGHT;
    }
    if branch_pass {
        score += BRANCH_WEIGHT;
    }
    if threshold_pass {
        score += THRESHOLD_WEIGHT;
    }
    let base = finish_score(score);

    let explanation_ok = match variant {
        TangencyVariant::Segment => None,
        TangencyVariant::Explained => {
            let ok = has_keyword(answer.explanation, &TANGENCY_KEYWORDS);
            if ok {
                score += EXPLANATION_BONUS;
            }
            Some(ok)
        }
    };

    let score = finish_score(score);
    let result = Verdict::from_score(score);

    GradingResult {
        result,
        score,
        checks: Checks {
            segment: Some(SegmentChecks {
                x_to_check_hit_expected: reach_expected,
                x_to_check_hit_student: reach_student,
                branch_expected,
                branch_student: answer.branch,
                threshold_expected: t_hit,
                threshold_student: answer.x_threshold,
                pass: base >= 1.0,
            }),
            multi: None,
            explanation_ok,
        },
        reason_code: reason_for(result),
        expected: Some(ExpectedAnswer::Branch {
            branch: branch_expected,
            x_to_check: answer.x_to_check,
            x_threshold: t_hit,
        }),
    }
}

struct FirstHitSubmission<'a> {
    index: Option<usize>,
    t: Option<f64>,
    justification: Option<&'a str>,
    evaluation: Option<&'a str>,
}

fn grade_first_hit(scene: &MultiSphere, answer: &FirstHitSubmission<'_>) -> GradingResult {
    let best = select_multi_hit(&scene.ray, &scene.spheres, &scene.policy);
    let index_expected = best.as_ref().map(|hit| hit.sphere_index);
    let t_expected = best.as_ref().map(|hit| hit.t);
    let tie_exists = best.as_ref().is_some_and(|hit| hit.has_tie());

    let t_within_tol = match (t_expected, answer.t) {
        (Some(expected), Some(given)) => nearly_equal(given, expected, scene.policy.epsilon),
        _ => false,
    };
    let justification_ok = !tie_exists || has_keyword(answer.justification, &TIE_BREAK_KEYWORDS);

    let mut score = 0.0;
    if answer.index == index_expected {
        score += INDEX_WEIGHT;
    }
    if t_within_tol {
        score += T_WEIGHT;
    }
    if tie_exists && justification_ok {
        score += TIE_WEIGHT;
    }
    if !tie_exists {
        score = f64::min(score, NO_TIE_CAP);
    }

    let evaluation_ok = has_keyword(answer.evaluation, &EVALUATION_KEYWORDS);
    if evaluation_ok {
        score += EXPLANATION_BONUS;
    }

    let score = finish_score(score);
    let result = Verdict::from_score(score);

    GradingResult {
        result,
        score,
        checks: Checks {
            segment: None,
            multi: Some(MultiChecks {
                first_index_expected: index_expected,
                first_index_student: answer.index,
                t_expected,
                t_student_within_tol: t_within_tol,
                tie_exists,
                justification_ok,
            }),
            explanation_ok: Some(evaluation_ok),
        },
        reason_code: reason_for(result),
        expected: Some(ExpectedAnswer::FirstHit {
            first_sphere_index: index_expected,
            t: t_expected,
        }),
    }
}
