//! devassess CLI — take a timed developer assessment from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::PayloadArgs;

#[derive(Parser)]
#[command(
    name = "devassess",
    version,
    about = "Take a timed developer assessment from the terminal"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter devassess.toml
    Init,

    /// Log in to an assessment and start (or resume) its timer
    Login {
        /// Candidate name
        #[arg(long)]
        name: String,

        /// Candidate email
        #[arg(long)]
        email: String,

        /// Assessment id (default from config)
        #[arg(long)]
        assessment: Option<String>,
    },

    /// List the challenges of the current assessment
    Challenges {
        /// Assessment id (default: the logged-in assessment)
        #[arg(long)]
        assessment: Option<String>,
    },

    /// Show one challenge with its working answer
    Show {
        /// Challenge id
        challenge: String,
    },

    /// Save a draft answer without submitting it
    Draft {
        /// Challenge id
        challenge: String,

        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Submit the answer to a challenge (defaults to the saved draft)
    Submit {
        /// Challenge id
        challenge: String,

        #[command(flatten)]
        payload: PayloadArgs,

        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show the session and the remaining time
    Status {
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count down the remaining time
    Watch {
        /// Submit pending drafts and finalize when the time is up
        #[arg(long)]
        auto_submit: bool,
    },

    /// Submit the whole assessment and end the session
    Finalize {
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Forget the stored session
    Logout,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("devassess=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Login {
            name,
            email,
            assessment,
        } => commands::login::execute(name, email, assessment, config).await,
        Commands::Challenges { assessment } => {
            commands::challenges::execute(assessment, config).await
        }
        Commands::Show { challenge } => commands::show::execute(challenge, config).await,
        Commands::Draft { challenge, payload } => {
            commands::draft::execute(challenge, payload, config).await
        }
        Commands::Submit {
            challenge,
            payload,
            yes,
        } => commands::submit::execute(challenge, payload, yes, config).await,
        Commands::Status { json } => commands::status::execute(json, config),
        Commands::Watch { auto_submit } => commands::watch::execute(auto_submit, config).await,
        Commands::Finalize { yes } => commands::finalize::execute(yes, config).await,
        Commands::Logout => commands::logout::execute(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
