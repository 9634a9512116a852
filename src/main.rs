//! leafcheck CLI
//!
//! Entry point for the leaf-health classification pipeline: dataset
//! splitting, model training, and one-off classification of image files.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use leafcheck::backend::{backend_name, default_device, TrainingBackend};
use leafcheck::dataset::{default_mapping, split_dataset, LeafDataset, SplitConfig};
use leafcheck::inference::ClassifierEngine;
use leafcheck::preprocess::Contract;
use leafcheck::training::{train, TrainConfig};
use leafcheck::utils::logging::{init_logging, LogConfig};

/// Plant-leaf health classification
#[derive(Parser, Debug)]
#[command(name = "leafcheck")]
#[command(version)]
#[command(about = "Leaf-health classification: split, train, classify", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a raw class-folder tree into train/validation sets
    Split {
        /// Source directory containing class folders (may be nested)
        #[arg(short, long, default_value = "data/raw")]
        source_dir: String,

        /// Output root for the train/val tree
        #[arg(short, long, default_value = "data")]
        output_dir: String,

        /// Random seed for the shuffle
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Train the classifier over a split dataset tree
    Train {
        /// Root of the split tree (as produced by `split`)
        #[arg(short, long, default_value = "data")]
        data_dir: String,

        /// Path for the checkpoint artifact
        #[arg(short, long, default_value = "output/model.ckpt")]
        artifact: String,

        /// Number of training epochs
        #[arg(short, long, default_value = "3")]
        epochs: usize,

        /// Batch size
        #[arg(short, long, default_value = "16")]
        batch_size: usize,

        /// Learning rate
        #[arg(short, long, default_value = "0.0001")]
        learning_rate: f64,

        /// Random seed for epoch shuffling
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Classify an image file
    Classify {
        /// Path to the image
        #[arg(short, long)]
        input: String,

        /// Path to the checkpoint artifact (fallback is used if absent)
        #[arg(short, long, default_value = "output/model.ckpt")]
        artifact: String,
    },

    /// Show statistics for a split dataset tree
    Stats {
        /// Root of the split tree
        #[arg(short, long, default_value = "data")]
        data_dir: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    match cli.command {
        Commands::Split {
            source_dir,
            output_dir,
            seed,
        } => cmd_split(&source_dir, &output_dir, seed),

        Commands::Train {
            data_dir,
            artifact,
            epochs,
            batch_size,
            learning_rate,
            seed,
        } => cmd_train(&data_dir, &artifact, epochs, batch_size, learning_rate, seed),

        Commands::Classify { input, artifact } => cmd_classify(&input, &artifact),

        Commands::Stats { data_dir } => cmd_stats(&data_dir),
    }
}

fn cmd_split(source_dir: &str, output_dir: &str, seed: u64) -> Result<()> {
    println!("{}", "Splitting dataset...".cyan().bold());

    let config = SplitConfig {
        seed,
        ..SplitConfig::default()
    };
    let report = split_dataset(
        Path::new(source_dir),
        &default_mapping(),
        Path::new(output_dir),
        &config,
    )?;

    report.save(&Path::new(output_dir).join("split_report.json"))?;

    println!("{}", report);
    println!(
        "{} {} files into {}/{{train,val}}",
        "Done:".green().bold(),
        report.total_files(),
        output_dir
    );

    Ok(())
}

fn cmd_train(
    data_dir: &str,
    artifact: &str,
    epochs: usize,
    batch_size: usize,
    learning_rate: f64,
    seed: u64,
) -> Result<()> {
    println!("{}", "Training configuration:".cyan().bold());
    println!("  Data:          {}", data_dir);
    println!("  Artifact:      {}", artifact);
    println!("  Epochs:        {}", epochs);
    println!("  Batch size:    {}", batch_size);
    println!("  Learning rate: {}", learning_rate);
    println!("  Backend:       {}", backend_name());
    println!();

    let config = TrainConfig {
        epochs,
        batch_size,
        learning_rate,
        seed,
        ..TrainConfig::new(PathBuf::from(data_dir), PathBuf::from(artifact))
    };

    let run = train::<TrainingBackend>(&config, &default_device())?;

    println!();
    if run.artifact.is_some() {
        println!(
            "{} best validation accuracy {:.3}, artifact at {}",
            "Training complete:".green().bold(),
            run.best_accuracy,
            artifact
        );
    } else {
        println!(
            "{} no epoch improved validation accuracy; no artifact written",
            "Training complete:".yellow().bold()
        );
    }

    Ok(())
}

fn cmd_classify(input: &str, artifact: &str) -> Result<()> {
    let bytes = std::fs::read(input)?;

    let engine = ClassifierEngine::global(Path::new(artifact))?;
    if engine.is_fallback() {
        println!(
            "{} no trained model found; using heuristic fallback",
            "Note:".yellow()
        );
    }

    let diagnosis = engine.diagnose(&bytes)?;

    println!("{} {}", "Input:".cyan(), input);
    println!("{} {}", "Label:".cyan().bold(), diagnosis.label);
    println!(
        "{} {:.1}%",
        "Confidence:".cyan().bold(),
        diagnosis.confidence * 100.0
    );
    println!("{}", "Recommendations:".cyan().bold());
    for tip in &diagnosis.recommendations {
        println!("  - {}", tip);
    }

    Ok(())
}

fn cmd_stats(data_dir: &str) -> Result<()> {
    let dataset = LeafDataset::open(data_dir)?;
    println!("{}", dataset.stats());
    println!(
        "Model input: {}px square (shared train/serve contract)",
        Contract::default().size
    );
    Ok(())
}
