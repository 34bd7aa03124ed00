//! KycGuard CLI - Main entry point

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};
use kycguard_cli::commands::{self, ScreenRequest};
use kycguard_cli::AppContext;
use kycguard_store::IdKind;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kycguard")]
#[command(about = "KycGuard - KYC fraud and compliance screening", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data", global = true)]
    data: PathBuf,

    /// JSON configuration file (weights, cut-offs, file names)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a document: fraud score, AML checks, decision
    Screen {
        /// Document image
        image: PathBuf,
        /// Parsed fields (JSON)
        #[arg(long)]
        fields: PathBuf,
        /// Uploading user ID
        #[arg(long)]
        user: String,
        /// Uploading user email
        #[arg(long)]
        email: String,
        /// Name the user declared at sign-up
        #[arg(long)]
        name: Option<String>,
        /// Raw OCR text
        #[arg(long)]
        text: Option<PathBuf>,
        /// Device fingerprint (JSON)
        #[arg(long)]
        device: Option<PathBuf>,
        /// Manipulation probability from an external model
        #[arg(long)]
        manipulation_prob: Option<f64>,
        /// Network fraud probability from an external model
        #[arg(long)]
        network_prob: Option<f64>,
    },

    /// List compliance alerts
    Alerts {
        /// Include dismissed alerts
        #[arg(long)]
        all: bool,
    },

    /// Dismiss an alert
    Dismiss {
        /// Alert ID
        alert_id: String,
    },

    /// Show recent audit entries (newest first)
    Logs {
        /// Maximum number of entries to show
        #[arg(long, default_value = "100")]
        limit: usize,
    },

    /// Average fraud score for an Aadhaar number
    Risk {
        aadhaar: String,
    },

    /// Look up an Aadhaar number in the AML blacklist
    AmlCheck {
        aadhaar: String,
    },

    /// Check whether identifiers were already used
    #[command(group(ArgGroup::new("ids").required(true).multiple(true).args(["aadhaar", "pan", "dl"])))]
    Duplicates {
        #[arg(long)]
        aadhaar: Option<String>,
        #[arg(long)]
        pan: Option<String>,
        #[arg(long)]
        dl: Option<String>,
    },

    /// Manage the AML blacklist
    Blacklist {
        #[command(subcommand)]
        action: BlacklistAction,
    },
}

#[derive(Subcommand)]
enum BlacklistAction {
    /// Add an identifier
    #[command(group(ArgGroup::new("id").required(true).args(["aadhaar", "pan", "dl"])))]
    Add {
        #[arg(long)]
        aadhaar: Option<String>,
        #[arg(long)]
        pan: Option<String>,
        #[arg(long)]
        dl: Option<String>,
        /// Why the identifier is listed
        #[arg(long, default_value = "")]
        reason: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (RUST_LOG, default info) on stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Create application context
    let ctx = AppContext::new(&cli.data, cli.config.as_deref())?;

    match cli.command {
        Commands::Screen {
            image,
            fields,
            user,
            email,
            name,
            text,
            device,
            manipulation_prob,
            network_prob,
        } => {
            let req = ScreenRequest {
                image,
                fields,
                text,
                device,
                user_id: user,
                email,
                name,
                manipulation: manipulation_prob,
                network_fraud: network_prob,
            };
            commands::screen(&ctx, req).await?;
        }

        Commands::Alerts { all } => {
            commands::alerts(&ctx, all)?;
        }

        Commands::Dismiss { alert_id } => {
            commands::dismiss(&ctx, &alert_id)?;
        }

        Commands::Logs { limit } => {
            commands::logs(&ctx, limit)?;
        }

        Commands::Risk { aadhaar } => {
            commands::risk(&ctx, &aadhaar)?;
        }

        Commands::AmlCheck { aadhaar } => {
            commands::aml_check(&ctx, &aadhaar)?;
        }

        Commands::Duplicates { aadhaar, pan, dl } => {
            commands::duplicates(&ctx, aadhaar.as_deref(), pan.as_deref(), dl.as_deref())?;
        }

        Commands::Blacklist {
            action:
                BlacklistAction::Add {
                    aadhaar,
                    pan,
                    dl,
                    reason,
                },
        } => {
            let (kind, value) = match (aadhaar, pan, dl) {
                (Some(v), _, _) => (IdKind::Aadhaar, v),
                (_, Some(v), _) => (IdKind::Pan, v),
                (_, _, Some(v)) => (IdKind::Dl, v),
                (None, None, None) => anyhow::bail!("one of --aadhaar, --pan or --dl is required"),
            };
            commands::blacklist_add(&ctx, kind, &value, &reason)?;
        }
    }

    Ok(())
}
