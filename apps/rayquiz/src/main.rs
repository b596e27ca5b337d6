use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rayquiz_exam::{generate_question_with, grade, solve, GeneratorSettings};
use rayquiz_model::{Level, Quality, QuestionFile, StudentAnswer, TangencyVariant};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

mod logger;

use logger::{init_logger, LogLevel};

#[derive(Parser)]
#[command(name = "rayquiz", version, about = "Ray–sphere exam question generator and grader")]
struct Cli {
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Generate(GenerateArgs),
    Solve(SolveArgs),
    Grade(GradeArgs),
    Audit(AuditArgs),
}

#[derive(Args)]
#[command(about = "Generate a question (levels A, B or C) and write it as JSON")]
struct GenerateArgs {
    #[arg(long)]
    level: Level,

    #[arg(long)]
    out: PathBuf,

    /// Seed for a reproducible question; omitted means thread-local randomness.
    #[arg(long)]
    seed: Option<u64>,

    /// Level B only: grade without the explanation bonus.
    #[arg(long)]
    segment: bool,

    #[arg(long, default_value_t = 100)]
    max_attempts: u32,

    #[arg(long, default_value_t = 1e-6)]
    tolerance: f64,
}

#[derive(Args)]
#[command(about = "Print the canonical answer to a question file")]
struct SolveArgs {
    #[arg(long = "in")]
    in_path: PathBuf,

    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
#[command(about = "Grade a learner answer against a question file")]
struct GradeArgs {
    #[arg(long = "in")]
    in_path: PathBuf,

    #[arg(long)]
    answer: PathBuf,

    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
#[command(about = "Generate many level C questions and report how often sampling fell back")]
struct AuditArgs {
    #[arg(long, default_value_t = 1000)]
    count: u64,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    #[arg(long, default_value_t = 100)]
    max_attempts: u32,

    #[arg(long, default_value_t = 0)]
    threads: usize,
}

#[derive(Serialize)]
struct AuditReport {
    count: u64,
    first_seed: u64,
    max_attempts: u32,
    guaranteed: u64,
    fallback: u64,
    fallback_seeds: Vec<u64>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    match cli.command {
        Commands::Generate(args) => run_generate(args),
        Commands::Solve(args) => run_solve(args),
        Commands::Grade(args) => run_grade(args),
        Commands::Audit(args) => run_audit(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let settings = GeneratorSettings {
        max_attempts: args.max_attempts,
        tolerance: args.tolerance,
        tangency_variant: if args.segment {
            TangencyVariant::Segment
        } else {
            TangencyVariant::Explained
        },
        ..GeneratorSettings::default()
    };

    let question = match args.seed {
        Some(seed) => generate_question_with(args.level, &settings, &mut StdRng::seed_from_u64(seed)),
        None => generate_question_with(args.level, &settings, &mut rand::thread_rng()),
    };
    if question.quality == Quality::Fallback {
        eprintln!("warning: quality constraints were not met; question uses a fallback configuration");
    }
    info!("generated level {} question: {}", question.level(), question.meta.params);

    let file = QuestionFile {
        version: 1,
        generated_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        seed: args.seed,
        question,
    };
    write_json(&args.out, &file)
}

fn run_solve(args: SolveArgs) -> Result<()> {
    let file: QuestionFile = read_json(&args.in_path, "question")?;
    let solution = solve(&file.question);
    emit(args.out.as_deref(), &solution)
}

fn run_grade(args: GradeArgs) -> Result<()> {
    let file: QuestionFile = read_json(&args.in_path, "question")?;
    let answer: StudentAnswer = read_json(&args.answer, "answer")?;
    let result = grade(&file.question, &answer);
    info!("graded {:?} with score {:.2}", result.result, result.score);
    emit(args.out.as_deref(), &result)
}

fn run_audit(args: AuditArgs) -> Result<()> {
    if args.count == 0 {
        return Err(anyhow!("--count must be at least 1"));
    }

    let settings = GeneratorSettings {
        max_attempts: args.max_attempts,
        ..GeneratorSettings::default()
    };
    let first_seed = args.seed;
    let count = args.count;

    let fallback_seeds: Vec<u64> = with_thread_pool(args.threads, || {
        (0..count)
            .into_par_iter()
            .filter_map(|offset| {
                let seed = first_seed.wrapping_add(offset);
                let mut rng = StdRng::seed_from_u64(seed);
                let question = generate_question_with(Level::C, &settings, &mut rng);
                (question.quality == Quality::Fallback).then_some(seed)
            })
            .collect()
    })?;

    let fallback = fallback_seeds.len() as u64;
    eprintln!("audit: {fallback}/{count} level C questions fell back");

    emit(
        None,
        &AuditReport {
            count,
            first_seed,
            max_attempts: args.max_attempts,
            guaranteed: count - fallback,
            fallback,
            fallback_seeds,
        },
    )
}

fn with_thread_pool<T: Send>(threads: usize, f: impl FnOnce() -> T + Send) -> Result<T> {
    if threads == 0 {
        Ok(f())
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("failed to build rayon pool")?;
        Ok(pool.install(f))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents = fs::read_to_string(path)
        .map_err(|err| anyhow!("failed to read {what} {:?}: {}", path, err))?;
    serde_json::from_str(&contents).map_err(|err| anyhow!("failed to parse {what} {:?}: {}", path, err))
}

fn emit<T: Serialize>(out: Option<&Path>, value: &T) -> Result<()> {
    match out {
        Some(path) => write_json(path, value),
        None => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
            Ok(())
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    atomic_write(path, &json)
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .map_err(|err| anyhow!("failed to create output directory {:?}: {}", parent, err))?;
    }

    let tmp_path = temp_path(path);
    let mut file = fs::File::create(&tmp_path)
        .map_err(|err| anyhow!("failed to create temp file {:?}: {}", tmp_path, err))?;
    file.write_all(data)
        .map_err(|err| anyhow!("failed to write temp file {:?}: {}", tmp_path, err))?;
    file.sync_all()
        .map_err(|err| anyhow!("failed to sync temp file {:?}: {}", tmp_path, err))?;

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(anyhow!("failed to replace output {:?}: {}", path, err));
    }

    if let Ok(dir) = fs::File::open(parent) {
        let _ = dir.sync_all();
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("output");
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_name = format!(".{}.part-{}-{}", file_name, std::process::id(), stamp);
    parent.join(tmp_name)
}
