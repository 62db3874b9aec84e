use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vg")]
#[command(about = "VisaGate model promotion + prediction CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env overrides)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Run one promotion cycle for a freshly trained challenger
    Promote {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Challenger model artifact produced by training
        #[arg(long)]
        challenger: String,

        /// Challenger's training-time F1 on the held-out set
        #[arg(long = "f1")]
        f1_score: f64,
    },

    /// Score a model artifact on the configured held-out dataset
    Evaluate {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Model artifact to score
        #[arg(long)]
        model: String,
    },

    /// Predict one applicant with the model in the active slot
    Predict {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Feature field as key=value (repeat for each of the ten fields)
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// Promotion history utilities
    Audit {
        #[command(subcommand)]
        cmd: AuditCmd,
    },
}

#[derive(Subcommand)]
enum AuditCmd {
    /// Verify the hash chain of a history log
    Verify {
        /// Path to the JSONL history log
        #[arg(long)]
        path: String,
    },
}

fn main() -> Result<()> {
    // Load .env.local if present (dev convenience).
    let _ = dotenvy::from_filename(".env.local");
    commands::init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = vg_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Promote {
            config_paths,
            challenger,
            f1_score,
        } => commands::promote::run_promote(&config_paths, &challenger, f1_score)?,

        Commands::Evaluate {
            config_paths,
            model,
        } => commands::promote::run_evaluate(&config_paths, &model)?,

        Commands::Predict {
            config_paths,
            fields,
        } => commands::predict::run_predict(&config_paths, &fields)?,

        Commands::Audit { cmd } => match cmd {
            AuditCmd::Verify { path } => commands::run_audit_verify(&path)?,
        },
    }

    Ok(())
}
