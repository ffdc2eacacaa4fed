use clap::{Parser, Subcommand};
use leakguard::artifact::ArtifactStore;
use leakguard::config::Config;
use leakguard::inference::{alert_message, InferenceService};
use leakguard::ml::run_training;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "leakguard")]
#[command(about = "Leak-severity classification for pipeline sensor telemetry", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic dataset, train the model and persist the artifact
    Train {
        /// Override the configured number of training rows
        #[arg(short, long)]
        samples: Option<usize>,

        /// Override the configured master seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Classify sensor readings from a JSON file or an inline JSON string
    Predict {
        /// Path to a JSON file holding one reading object or an array of them
        #[arg(short, long, conflicts_with = "json")]
        file: Option<PathBuf>,

        /// Inline JSON reading object
        #[arg(short, long)]
        json: Option<String>,
    },

    /// Show artifact status, feature list and training metadata
    Info,
}

fn main() -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e}");
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config);
    tracing::info!("LeakGuard v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let store = ArtifactStore::new(&config.artifact.dir);

    match cli.command {
        Commands::Train { samples, seed } => {
            let mut config = config;
            if let Some(samples) = samples {
                config.training.target_samples = samples;
            }
            if let Some(seed) = seed {
                config.training.seed = seed;
            }

            let report = run_training(&config, &store)?;
            println!("Trained on {} samples", report.dataset_size);
            println!(
                "Accuracy {:.4}, macro F1 {:.4}",
                report.metrics.accuracy, report.metrics.f1_score
            );
            println!("Artifact: {}", report.artifact_path.display());
        }

        Commands::Predict { file, json } => {
            let raw = match (file, json) {
                (Some(path), None) => std::fs::read_to_string(path)?,
                (None, Some(inline)) => inline,
                _ => anyhow::bail!("provide exactly one of --file or --json"),
            };

            let value: serde_json::Value = serde_json::from_str(&raw)?;
            let service = InferenceService::new(store);

            let results = match value {
                serde_json::Value::Array(items) => service.classify_batch(&items)?,
                object => vec![service.classify_json(&object)],
            };

            for (i, result) in results.iter().enumerate() {
                match result {
                    Ok(classified) => {
                        println!("{}", serde_json::to_string_pretty(classified)?);
                        if let Some(message) = alert_message(classified) {
                            eprintln!("[{i}] {message}");
                        }
                    }
                    Err(e) => eprintln!("[{i}] error ({}): {e}", e.error_code()),
                }
            }
        }

        Commands::Info => {
            let service = InferenceService::new(store);
            // Surface the artifact contents when one is present
            let _ = service.reload();
            println!("{}", serde_json::to_string_pretty(&service.descriptor())?);
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("leakguard={}", config.observability.log_level).into());

    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
