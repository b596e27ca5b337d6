use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayquiz_exam::{generate_question_with, grade, solve, GeneratorSettings};
use rayquiz_geom::{Policy, Ray, Sphere, Vec3};
use rayquiz_model::{
    BranchCode, ExpectedAnswer, GradeReason, Level, MultiSphere, Quality, QuestionData,
    QuestionKind, QuestionMeta, SingleSphere, Solution, StudentAnswer, TangencyVariant, Verdict,
};

fn meta() -> QuestionMeta {
    QuestionMeta {
        name: "test".to_string(),
        params: String::new(),
        prompt: String::new(),
    }
}

fn tangency(direction: Vec3, sphere: Sphere, variant: TangencyVariant) -> QuestionData {
    QuestionData {
        kind: QuestionKind::Tangency {
            ray: Ray::new(Vec3::new(0.0, 0.0, -5.0), direction),
            sphere,
            variant,
        },
        tolerance: 1e-6,
        quality: Quality::Guaranteed,
        meta: meta(),
    }
}

fn forward() -> Vec3 {
    Vec3::new(0.0, 0.0, 1.0)
}

fn unit_sphere() -> Sphere {
    Sphere::new(Vec3::zero(), 1.0)
}

fn branch_answer(
    branch: BranchCode,
    x_to_check: Option<f64>,
    reaches_x: Option<bool>,
    x_threshold: Option<f64>,
) -> StudentAnswer {
    StudentAnswer::Branch {
        branch: Some(branch),
        x_to_check,
        reaches_x,
        x_threshold,
        explanation: None,
    }
}

/// Spheres along +z from the origin whose near faces sit at the given times.
fn multi(hit_times: &[f64]) -> QuestionData {
    let mut spheres: Vec<Sphere> = hit_times
        .iter()
        .map(|t| Sphere::new(Vec3::new(0.0, 0.0, t + 1.0), 1.0))
        .collect();
    spheres.push(Sphere::new(Vec3::new(8.0, 8.0, 2.0), 1.0));
    QuestionData {
        kind: QuestionKind::FirstHit(MultiSphere {
            ray: Ray::new(Vec3::zero(), forward()),
            spheres,
            policy: Policy {
                t_window: Some([0.0, 6.0]),
                ..Policy::default()
            },
        }),
        tolerance: 1e-6,
        quality: Quality::Guaranteed,
        meta: meta(),
    }
}

fn first_hit_answer(
    index: Option<usize>,
    t: Option<f64>,
    justification: Option<&str>,
    evaluation: Option<&str>,
) -> StudentAnswer {
    StudentAnswer::FirstHit {
        first_sphere_index: index,
        t,
        reason_code: None,
        tie_break_justification: justification.map(str::to_string),
        evaluation_explanation: evaluation.map(str::to_string),
    }
}

#[test]
fn segment_answer_fully_correct() {
    let question = tangency(forward(), unit_sphere(), TangencyVariant::Segment);
    let answer = branch_answer(BranchCode::Ok, Some(5.0), Some(true), Some(4.0));
    let result = grade(&question, &answer);

    assert_eq!(result.score, 1.0);
    assert_eq!(result.result, Verdict::Correct);
    assert_eq!(result.reason_code, GradeReason::Ok);
    assert_eq!(result.checks.explanation_ok, None);
    let checks = result.checks.segment.unwrap();
    assert!(checks.pass);
    assert_eq!(checks.threshold_expected, Some(4.0));
    assert_eq!(
        result.expected,
        Some(ExpectedAnswer::Branch {
            branch: BranchCode::Ok,
            x_to_check: Some(5.0),
            x_threshold: Some(4.0),
        })
    );
}

#[test]
fn segment_wrong_branch_is_partial() {
    let question = tangency(forward(), unit_sphere(), TangencyVariant::Segment);
    let answer = branch_answer(BranchCode::TwoRoots, Some(5.0), Some(true), Some(4.0));
    let result = grade(&question, &answer);

    assert!((result.score - 0.7).abs() < 1e-12);
    assert_eq!(result.result, Verdict::Partial);
    assert_eq!(result.reason_code, GradeReason::MismatchSelection);
}

#[test]
fn segment_wrong_reach_judgement_loses_its_weight() {
    let question = tangency(forward(), unit_sphere(), TangencyVariant::Segment);
    let answer = branch_answer(BranchCode::Ok, Some(3.5), Some(true), Some(4.0));
    let result = grade(&question, &answer);

    assert!((result.score - 0.7).abs() < 1e-12);
    let checks = result.checks.segment.unwrap();
    assert!(!checks.x_to_check_hit_expected);
    assert!(checks.x_to_check_hit_student);
}

#[test]
fn threshold_tolerance_is_inclusive() {
    let question = tangency(forward(), unit_sphere(), TangencyVariant::Segment);
    let close = grade(
        &question,
        &branch_answer(BranchCode::Ok, Some(5.0), Some(true), Some(4.0000005)),
    );
    assert_eq!(close.score, 1.0);

    let far = grade(
        &question,
        &branch_answer(BranchCode::Ok, Some(5.0), Some(true), Some(4.01)),
    );
    assert!((far.score - 0.6).abs() < 1e-12);
}

#[test]
fn segment_behind_ray_expects_negative_t_and_no_threshold() {
    let question = tangency(Vec3::new(0.0, 0.0, -1.0), unit_sphere(), TangencyVariant::Segment);
    let answer = branch_answer(BranchCode::NegativeT, Some(2.0), Some(false), None);
    let result = grade(&question, &answer);
    assert_eq!(result.score, 1.0);

    let wrong = grade(
        &question,
        &branch_answer(BranchCode::NegativeT, Some(2.0), Some(false), Some(4.0)),
    );
    assert!((wrong.score - 0.6).abs() < 1e-12);
}

#[test]
fn segment_miss_expects_delta_lt_0() {
    let sphere = Sphere::new(Vec3::new(0.0, 4.0, 0.0), 1.0);
    let question = tangency(forward(), sphere, TangencyVariant::Segment);
    let result = grade(&question, &branch_answer(BranchCode::DeltaLt0, None, None, None));
    assert_eq!(result.score, 1.0);
}

#[test]
fn segment_tangent_expects_tangent_branch() {
    let sphere = Sphere::new(Vec3::new(1.0, 0.0, 0.0), 1.0);
    let question = tangency(forward(), sphere, TangencyVariant::Segment);
    let answer = branch_answer(BranchCode::Tangent, Some(5.0), Some(true), Some(5.0));
    assert_eq!(grade(&question, &answer).score, 1.0);
}

#[test]
fn explained_variant_adds_keyword_bonus() {
    let question = tangency(forward(), unit_sphere(), TangencyVariant::Explained);
    let answer = StudentAnswer::Branch {
        branch: Some(BranchCode::Ok),
        x_to_check: Some(5.0),
        reaches_x: Some(true),
        x_threshold: Some(3.0),
        explanation: Some("The smaller POSITIVE root is the first hit".to_string()),
    };
    let result = grade(&question, &answer);
    assert!((result.score - 0.8).abs() < 1e-12);
    assert_eq!(result.result, Verdict::Partial);
    assert_eq!(result.checks.explanation_ok, Some(true));

    let perfect = StudentAnswer::Branch {
        branch: Some(BranchCode::Ok),
        x_to_check: Some(5.0),
        reaches_x: Some(true),
        x_threshold: Some(4.0),
        explanation: Some("ray meets sphere".to_string()),
    };
    let result = grade(&question, &perfect);
    assert_eq!(result.score, 1.0);
    assert_eq!(result.result, Verdict::Correct);
}

#[test]
fn explained_variant_without_keywords_gets_no_bonus() {
    let question = tangency(forward(), unit_sphere(), TangencyVariant::Explained);
    let answer = StudentAnswer::Branch {
        branch: Some(BranchCode::Ok),
        x_to_check: None,
        reaches_x: None,
        x_threshold: None,
        explanation: Some("no idea".to_string()),
    };
    let result = grade(&question, &answer);
    assert!((result.score - 0.6).abs() < 1e-12);
    assert_eq!(result.checks.explanation_ok, Some(false));
}

#[test]
fn correct_index_and_t_without_tie_is_capped() {
    let question = multi(&[3.0, 5.0]);
    let result = grade(&question, &first_hit_answer(Some(0), Some(3.0), None, None));

    assert!((result.score - 0.8).abs() < 1e-12);
    assert_eq!(result.result, Verdict::Partial);
    let checks = result.checks.multi.unwrap();
    assert!(!checks.tie_exists);
    assert!(checks.t_student_within_tol);
}

#[test]
fn evaluation_explanation_lifts_cap() {
    let question = multi(&[3.0, 5.0]);
    let answer = first_hit_answer(
        Some(0),
        Some(3.0),
        None,
        Some("Sphere 0 is the first hit inside the window"),
    );
    let result = grade(&question, &answer);
    assert_eq!(result.score, 1.0);
    assert_eq!(result.result, Verdict::Correct);
    assert_eq!(result.reason_code, GradeReason::Ok);
}

#[test]
fn tie_requires_justification() {
    let question = multi(&[3.0000001, 3.0000003]);

    let justified = grade(
        &question,
        &first_hit_answer(Some(0), Some(3.0000001), Some("Lower INDEX wins the tie"), None),
    );
    assert_eq!(justified.score, 1.0);
    assert_eq!(justified.result, Verdict::Correct);
    assert!(justified.checks.multi.unwrap().tie_exists);

    let bare = grade(&question, &first_hit_answer(Some(0), Some(3.0000001), None, None));
    assert!((bare.score - 0.8).abs() < 1e-12);
    assert!(!bare.checks.multi.unwrap().justification_ok);
}

#[test]
fn wrong_sphere_and_missing_t_is_incorrect() {
    let question = multi(&[3.0, 5.0]);
    let result = grade(&question, &first_hit_answer(Some(1), None, None, None));
    assert_eq!(result.score, 0.0);
    assert_eq!(result.result, Verdict::Incorrect);
    assert_eq!(
        result.expected,
        Some(ExpectedAnswer::FirstHit {
            first_sphere_index: Some(0),
            t: Some(3.0),
        })
    );
}

#[test]
fn level_a_is_unsupported() {
    let question = QuestionData {
        kind: QuestionKind::Discriminant(SingleSphere {
            ray: Ray::new(Vec3::new(0.0, 0.0, -5.0), forward()),
            sphere: unit_sphere(),
        }),
        tolerance: 1e-6,
        quality: Quality::Guaranteed,
        meta: meta(),
    };
    let answer = StudentAnswer::Discriminant {
        delta_sign: None,
        hit: Some(true),
    };
    let result = grade(&question, &answer);
    assert_eq!(result.reason_code, GradeReason::UnsupportedLevel);
    assert_eq!(result.score, 0.0);
    assert_eq!(result.result, Verdict::Incorrect);
}

#[test]
fn mismatched_answer_kind_is_unsupported() {
    let question = multi(&[3.0]);
    let answer = branch_answer(BranchCode::Ok, None, None, None);
    assert_eq!(
        grade(&question, &answer).reason_code,
        GradeReason::UnsupportedLevel
    );
}

#[test]
fn solve_reports_canonical_answers() {
    let question = tangency(forward(), unit_sphere(), TangencyVariant::Segment);
    match solve(&question) {
        Solution::Tangency { hit, branch } => {
            assert_eq!(hit.hit_t, Some(4.0));
            assert_eq!(branch, BranchCode::Ok);
        }
        other => panic!("unexpected solution {other:?}"),
    }

    match solve(&multi(&[4.0, 2.0])) {
        Solution::FirstHit { best: Some(best) } => assert_eq!(best.sphere_index, 1),
        other => panic!("unexpected solution {other:?}"),
    }
}

#[test]
fn scores_stay_in_unit_interval() {
    let settings = GeneratorSettings {
        tangency_variant: TangencyVariant::Explained,
        ..GeneratorSettings::default()
    };
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..300 {
        let level = if rng.gen_bool(0.5) { Level::B } else { Level::C };
        let question = generate_question_with(level, &settings, &mut rng);
        let answer = match level {
            Level::B => StudentAnswer::Branch {
                branch: Some(BranchCode::Ok),
                x_to_check: Some(rng.gen_range(0.0..5.0)),
                reaches_x: Some(rng.gen_bool(0.5)),
                x_threshold: Some(rng.gen_range(0.0..5.0)),
                explanation: Some("positive root of the ray".to_string()),
            },
            _ => first_hit_answer(
                Some(rng.gen_range(0..4)),
                Some(rng.gen_range(0.0..5.0)),
                Some("first index"),
                Some("window policy"),
            ),
        };
        let result = grade(&question, &answer);
        assert!((0.0..=1.0).contains(&result.score));
        assert_eq!(result.result == Verdict::Correct, result.score == 1.0);
    }
}
