//! tabtext CLI Module
//!
//! Command-line interface for schema inspection and dataset preparation.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::RowSet;
use crate::preprocessing::{ClassWeightMode, FitScope, PrepareConfig, PreparedDataset, Schema, TaskMode};
use crate::session::PipelineSession;
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tabtext")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Prepare tabular and text datasets for neural network training")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer and print the column schema of a dataset
    Schema {
        /// Input data file (CSV, TSV or JSON)
        data: PathBuf,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Encode a dataset into train/test matrices
    Prepare {
        /// Input data file (CSV, TSV or JSON)
        data: PathBuf,

        #[command(flatten)]
        load: LoadArgs,

        /// JSON file with a preparation config; flags override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Target column name (guessed from the column names when omitted)
        #[arg(short, long)]
        target: Option<String>,

        /// Task type (auto, classification, regression)
        #[arg(long)]
        task: Option<String>,

        /// Share of rows used for training, 0.5 to 0.95
        #[arg(long)]
        split: Option<f64>,

        /// Class weights (off, auto)
        #[arg(long)]
        class_weight: Option<String>,

        /// Free-text column to encode as bag-of-words
        #[arg(long)]
        text_col: Option<String>,

        /// Vocabulary size for the text column, 100 to 5000
        #[arg(long)]
        vocab_size: Option<usize>,

        /// Comma-separated columns to leave out
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Seed for the row shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Rows the encoder is fitted on (all, train)
        #[arg(long)]
        fit_scope: Option<String>,

        /// Write the prepared dataset as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// How delimited files are read
#[derive(Args, Debug, Default, Clone)]
pub struct LoadArgs {
    /// Field delimiter for CSV input (single ASCII character)
    #[arg(long)]
    pub delimiter: Option<char>,

    /// The first line is data, not a header
    #[arg(long)]
    pub no_header: bool,
}

impl LoadArgs {
    pub fn loader(&self) -> anyhow::Result<DataLoader> {
        let mut loader = DataLoader::new().with_header(!self.no_header);
        if let Some(c) = self.delimiter {
            if !c.is_ascii() {
                anyhow::bail!("Delimiter must be a single ASCII character: {}", c);
            }
            loader = loader.with_delimiter(c as u8);
        }
        Ok(loader)
    }
}

/// Flag overrides for the `prepare` command
#[derive(Debug, Default)]
pub struct PrepareArgs {
    pub config: Option<PathBuf>,
    pub target: Option<String>,
    pub task: Option<String>,
    pub split: Option<f64>,
    pub class_weight: Option<String>,
    pub text_col: Option<String>,
    pub vocab_size: Option<usize>,
    pub exclude: Vec<String>,
    pub seed: Option<u64>,
    pub fit_scope: Option<String>,
}

// ─── Data loading ──────────────────────────────────────────────────────────────

pub fn load_data(path: &Path, load: &LoadArgs) -> anyhow::Result<RowSet> {
    let loader = load.loader()?;
    step_run("Loading data");
    let start = Instant::now();
    let rows = loader.load_auto(path)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        rows.len(),
        rows.columns().len(),
        start.elapsed()
    ));
    Ok(rows)
}

pub fn parse_task(task: &str) -> anyhow::Result<TaskMode> {
    Ok(match task {
        "auto" => TaskMode::Auto,
        "classification" | "clf" => TaskMode::Classification,
        "regression" | "reg" => TaskMode::Regression,
        _ => anyhow::bail!("Invalid task type: {}", task),
    })
}

pub fn parse_class_weight(mode: &str) -> anyhow::Result<ClassWeightMode> {
    Ok(match mode {
        "off" => ClassWeightMode::Off,
        "auto" => ClassWeightMode::Auto,
        _ => anyhow::bail!("Invalid class weight mode: {}", mode),
    })
}

pub fn parse_fit_scope(scope: &str) -> anyhow::Result<FitScope> {
    Ok(match scope {
        "all" | "all_rows" => FitScope::AllRows,
        "train" | "train_only" => FitScope::TrainOnly,
        _ => anyhow::bail!("Invalid fit scope: {}", scope),
    })
}

/// Merge the optional config file with command-line overrides
pub fn build_config(args: &PrepareArgs, schema: &Schema) -> anyhow::Result<PrepareConfig> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_str::<PrepareConfig>(&std::fs::read_to_string(path)?)?,
        None => PrepareConfig::default(),
    };

    if let Some(target) = &args.target {
        config.target_col = target.clone();
    }
    if config.target_col.is_empty() {
        config.target_col = schema
            .guess_target()
            .ok_or_else(|| anyhow::anyhow!("Dataset has no columns"))?
            .to_string();
    }
    if let Some(task) = &args.task {
        config.task = parse_task(task)?;
    }
    if let Some(split) = args.split {
        config.split_pct = split;
    }
    if let Some(mode) = &args.class_weight {
        config.class_weight_mode = parse_class_weight(mode)?;
    }
    if let Some(text_col) = &args.text_col {
        config.text_col = Some(text_col.clone());
    }
    if let Some(size) = args.vocab_size {
        config.vocab_size = size;
    }
    if !args.exclude.is_empty() {
        config.excluded_cols = args.exclude.clone();
    }
    if let Some(seed) = args.seed {
        config.random_state = Some(seed);
    }
    if let Some(scope) = &args.fit_scope {
        config.fit_scope = parse_fit_scope(scope)?;
    }

    Ok(config)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_schema(data_path: &Path, load: &LoadArgs) -> anyhow::Result<()> {
    section("Schema");

    let session = PipelineSession::new();
    let schema = session.load(load_data(data_path, load)?)?;

    println!();
    println!("  {:<24} {:<12} {}", muted("column"), muted("kind"), muted("unique"));
    for (name, column) in schema.iter() {
        println!("  {:<24} {:<12} {}", name.white(), column.kind.to_string().cyan(), column.unique_count);
    }

    let counts = schema.kind_counts();
    println!();
    kv("Columns", &schema.len().to_string());
    kv("Numeric", &counts.numeric.to_string());
    kv("Categorical", &counts.categorical.to_string());
    kv("Text", &counts.text.to_string());
    if let Some(target) = schema.guess_target() {
        kv("Target guess", target);
    }
    println!();

    Ok(())
}

pub fn cmd_prepare(
    data_path: &Path,
    load: &LoadArgs,
    args: &PrepareArgs,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Prepare");

    let session = PipelineSession::new();
    let schema = session.load(load_data(data_path, load)?)?;
    let config = build_config(args, &schema)?;

    step_run(&format!("Encoding for target {}", config.target_col.as_str().cyan()));
    let start = Instant::now();
    let prepared = session.prepare(config)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_summary(&prepared);

    if let Some(path) = output {
        step_run(&format!("Saving → {}", path.display()));
        let json = serde_json::to_string(prepared.as_ref())?;
        std::fs::write(path, json)?;
        step_done(&format!("{} + {} rows", prepared.train_rows(), prepared.test_rows()));
    }

    println!();
    Ok(())
}

fn print_summary(prepared: &PreparedDataset) {
    println!();
    let task = if prepared.is_classification { "classification" } else { "regression" };
    kv("Task", task);
    kv("Train rows", &prepared.train_rows().to_string());
    kv("Test rows", &prepared.test_rows().to_string());
    kv("Inputs", &prepared.input_dim.to_string());
    if let Some(vocab) = &prepared.vocabulary {
        kv("Vocabulary", &vocab.size().to_string());
    }
    if let Some(map) = &prepared.label_map {
        kv("Classes", &prepared.n_classes.to_string());
        let labels: Vec<String> = map.iter().map(|(label, i)| format!("{}={}", label, i)).collect();
        kv("Labels", &labels.join(", "));
    }
    if let Some(weights) = &prepared.class_weights {
        let formatted: Vec<String> = weights.iter().map(|w| format!("{:.3}", w)).collect();
        kv("Class weights", &formatted.join(", "));
    }
}
