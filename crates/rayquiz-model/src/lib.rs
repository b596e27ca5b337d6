//! Shared data structures for RayQuiz: questions, learner answers and grading results.

use rayquiz_geom::{DeltaCase, HitResult, MultiHit, Policy, Ray, ReasonCode, Sphere};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("unknown level {0:?} (expected A, B or C)")]
    UnknownLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    A,
    B,
    C,
}

impl FromStr for Level {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Level::A),
            "B" => Ok(Level::B),
            "C" => Ok(Level::C),
            _ => Err(ModelError::UnknownLevel(s.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::A => "A",
            Level::B => "B",
            Level::C => "C",
        };
        f.write_str(name)
    }
}

/// Whether generation met its quality constraints or fell back to the last
/// candidate after exhausting its attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Guaranteed,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionMeta {
    pub name: String,
    pub params: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SingleSphere {
    pub ray: Ray,
    pub sphere: Sphere,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSphere {
    pub ray: Ray,
    pub spheres: Vec<Sphere>,
    pub policy: Policy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TangencyVariant {
    /// Segment reach check: branch, reach judgement and threshold only.
    Segment,
    /// Same checks plus a keyword bonus for the free-text explanation.
    Explained,
}

/// Level-specific ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level")]
pub enum QuestionKind {
    #[serde(rename = "A")]
    Discriminant(SingleSphere),
    #[serde(rename = "B")]
    Tangency {
        ray: Ray,
        sphere: Sphere,
        variant: TangencyVariant,
    },
    #[serde(rename = "C")]
    FirstHit(MultiSphere),
}

/// A generated question. Read-only ground truth for grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionData {
    pub kind: QuestionKind,
    pub tolerance: f64,
    pub quality: Quality,
    pub meta: QuestionMeta,
}

impl QuestionData {
    pub fn level(&self) -> Level {
        match self.kind {
            QuestionKind::Discriminant(_) => Level::A,
            QuestionKind::Tangency { .. } => Level::B,
            QuestionKind::FirstHit(_) => Level::C,
        }
    }

    pub fn ray(&self) -> &Ray {
        match &self.kind {
            QuestionKind::Discriminant(scene) => &scene.ray,
            QuestionKind::Tangency { ray, .. } => ray,
            QuestionKind::FirstHit(scene) => &scene.ray,
        }
    }

    pub fn t_window(&self) -> Option<[f64; 2]> {
        match &self.kind {
            QuestionKind::FirstHit(scene) => scene.policy.t_window,
            _ => None,
        }
    }
}

/// Level-B branch classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchCode {
    #[serde(rename = "DELTA_LT_0")]
    DeltaLt0,
    #[serde(rename = "TANGENT")]
    Tangent,
    #[serde(rename = "TWO_ROOTS")]
    TwoRoots,
    #[serde(rename = "NEGATIVE_T")]
    NegativeT,
    #[serde(rename = "OK")]
    Ok,
}

impl BranchCode {
    /// Deterministic branch for a discriminant class and forward-hit outcome.
    pub fn expected(delta_case: DeltaCase, has_hit: bool) -> Self {
        match delta_case {
            DeltaCase::Neg => BranchCode::DeltaLt0,
            DeltaCase::Zero => BranchCode::Tangent,
            DeltaCase::Pos if has_hit => BranchCode::Ok,
            DeltaCase::Pos => BranchCode::NegativeT,
        }
    }
}

/// A learner's submission. Every field is optional; absent fields score as wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level")]
pub enum StudentAnswer {
    #[serde(rename = "A")]
    Discriminant {
        #[serde(default)]
        delta_sign: Option<DeltaCase>,
        #[serde(default)]
        hit: Option<bool>,
    },
    #[serde(rename = "B")]
    Branch {
        #[serde(default)]
        branch: Option<BranchCode>,
        #[serde(default)]
        x_to_check: Option<f64>,
        #[serde(default)]
        reaches_x: Option<bool>,
        #[serde(default)]
        x_threshold: Option<f64>,
        #[serde(default)]
        explanation: Option<String>,
    },
    #[serde(rename = "C")]
    FirstHit {
        #[serde(default)]
        first_sphere_index: Option<usize>,
        #[serde(default)]
        t: Option<f64>,
        #[serde(default)]
        reason_code: Option<ReasonCode>,
        #[serde(default)]
        tie_break_justification: Option<String>,
        #[serde(default)]
        evaluation_explanation: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Partial,
    Incorrect,
}

impl Verdict {
    pub fn from_score(score: f64) -> Self {
        if score >= 1.0 {
            Verdict::Correct
        } else if score > 0.0 {
            Verdict::Partial
        } else {
            Verdict::Incorrect
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradeReason {
    Ok,
    MismatchSelection,
    UnsupportedLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentChecks {
    pub x_to_check_hit_expected: bool,
    pub x_to_check_hit_student: bool,
    pub branch_expected: BranchCode,
    pub branch_student: Option<BranchCode>,
    pub threshold_expected: Option<f64>,
    pub threshold_student: Option<f64>,
    pub pass: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiChecks {
    pub first_index_expected: Option<usize>,
    pub first_index_student: Option<usize>,
    pub t_expected: Option<f64>,
    pub t_student_within_tol: bool,
    pub tie_exists: bool,
    pub justification_ok: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<SegmentChecks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi: Option<MultiChecks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation_ok: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level")]
pub enum ExpectedAnswer {
    #[serde(rename = "B")]
    Branch {
        branch: BranchCode,
        x_to_check: Option<f64>,
        x_threshold: Option<f64>,
    },
    #[serde(rename = "C")]
    FirstHit {
        first_sphere_index: Option<usize>,
        t: Option<f64>,
    },
}

/// Outcome of one submission. Computed fresh per submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    pub result: Verdict,
    pub score: f64,
    pub checks: Checks,
    pub reason_code: GradeReason,
    pub expected: Option<ExpectedAnswer>,
}

impl GradingResult {
    pub fn unsupported() -> Self {
        Self {
            result: Verdict::Incorrect,
            score: 0.0,
            checks: Checks::default(),
            reason_code: GradeReason::UnsupportedLevel,
            expected: None,
        }
    }
}

/// Canonical answer to a question, as shown to staff or a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level")]
pub enum Solution {
    #[serde(rename = "A")]
    Discriminant { hit: HitResult },
    #[serde(rename = "B")]
    Tangency { hit: HitResult, branch: BranchCode },
    #[serde(rename = "C")]
    FirstHit { best: Option<MultiHit> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionFile {
    pub version: u32,
    pub generated_at_utc: String,
    #[serde(default)]
    pub seed: Option<u64>,
    pub question: QuestionData,
}
