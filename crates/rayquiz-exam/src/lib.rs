//! Question generation, canonical solving and grading.

pub mod generate;
pub mod grade;
pub mod meta;
pub mod solve;

pub use generate::{
    generate_question, generate_question_with, meets_quality, GeneratorSettings,
};
pub use grade::grade;
pub use solve::{solve, solve_single};
