//! gh-label-sync CLI
//!
//! Command line tool for bulk label management and synchronization

use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use gh_label_sync::{
    config::{load_labels_from_file, resolve_repository, write_labels, ExportFormat},
    github::DEFAULT_API_URL,
    render::{format_diff, format_outcome, format_progress, format_summary},
    sync::Progress,
    Confirmer, Error, GitHubClient, Label, LabelService, LabelSyncer, Repository, Result,
    SyncPolicy,
};

/// gh-label-sync CLI
///
/// Bulk label management and synchronization
#[derive(Parser)]
#[command(
    name = "gh-label-sync",
    version,
    about = "Bulk label management and synchronization",
    long_about = "Synchronize GitHub repository labels from YAML, JSON, or CSV files, \
    export them, or clone them from another repository."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Repository (owner/repo); defaults to GH_REPO or the current git checkout
    #[arg(short = 'R', long, global = true)]
    repo: Option<String>,

    /// GitHub access token
    #[arg(short = 't', long, global = true)]
    access_token: Option<String>,

    /// GitHub REST API endpoint
    #[arg(long, global = true, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export labels to YAML or JSON, or print them as a table
    Export {
        /// Output format
        #[arg(long, default_value = "yaml", value_parser = ["yaml", "yml", "json", "table"])]
        format: String,

        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Sync labels from a file
    Sync {
        /// Label definition file (YAML, JSON, or CSV; "-" for stdin)
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Show what would change without applying
        #[arg(long)]
        dry_run: bool,

        /// Update existing labels that differ
        #[arg(long)]
        force: bool,

        /// Delete labels not in file
        #[arg(long)]
        delete_unmanaged: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Clone labels from another repository
    Clone {
        /// Source repository (owner/repo)
        source: String,

        /// Update existing labels that differ
        #[arg(long)]
        force: bool,

        /// Show what would change without applying
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Interactive yes/no prompt on the terminal
struct TerminalPrompt;

impl Confirmer for TerminalPrompt {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| Error::Prompt(e.to_string()))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("gh_label_sync=debug")
        } else {
            EnvFilter::new("gh_label_sync=error")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export { ref format, ref output } => {
            let repository = resolve_repository(cli.repo.as_deref()).await?;
            let client = connect(&cli, repository)?;
            run_export(&client, format.parse()?, output.as_deref(), std::io::stdout()).await
        }

        Commands::Sync {
            ref file,
            dry_run,
            force,
            delete_unmanaged,
            yes,
        } => {
            let desired = load_labels_from_file(file)?;
            let repository = resolve_repository(cli.repo.as_deref()).await?;
            let client = connect(&cli, repository)?;
            let observed = client.list_labels().await?;

            let policy = SyncPolicy {
                force_update: force,
                delete_unmanaged,
                dry_run,
                assume_yes: yes,
            };
            reconcile(&client, &desired, &observed, policy, cli.verbose).await
        }

        Commands::Clone {
            ref source,
            force,
            dry_run,
            yes,
        } => {
            let target: Repository = require_repository(cli.repo.clone())?.parse()?;
            let source: Repository = source.parse()?;

            println!("Fetching labels from {}...", source.to_string().cyan());
            let source_client = connect(&cli, source)?;
            let desired = source_client.list_labels().await?;
            if desired.is_empty() {
                return Err(Error::config_validation(
                    "No labels found in source repository",
                ));
            }
            println!("Found {} label(s) in source repository\n", desired.len());

            println!("Fetching labels from {}...", target.to_string().cyan());
            let client = connect(&cli, target)?;
            let observed = client.list_labels().await?;

            let policy = SyncPolicy {
                force_update: force,
                delete_unmanaged: false,
                dry_run,
                assume_yes: yes,
            };
            reconcile(&client, &desired, &observed, policy, cli.verbose).await
        }
    }
}

/// Build a client for the repository from the global options
fn connect(cli: &Cli, repository: Repository) -> Result<GitHubClient> {
    let token = get_access_token(cli.access_token.clone())?;
    if cli.verbose {
        // stdout may be carrying an exported label file
        eprintln!(
            "{} Using repository: {}",
            "•".blue(),
            repository.to_string().cyan()
        );
    }
    GitHubClient::new(&token, &cli.api_url, repository)
}

/// Preview the diff, apply it, and report the outcome
async fn reconcile<S: LabelService>(
    service: &S,
    desired: &[Label],
    observed: &[Label],
    policy: SyncPolicy,
    verbose: bool,
) -> Result<()> {
    let diffs = gh_label_sync::compute_diff(desired, observed);

    print!("{}", format_diff(&diffs, verbose));
    print!(
        "{}",
        format_summary(&diffs, policy.force_update, policy.delete_unmanaged)
    );

    let outcome = LabelSyncer::new(service, policy)
        .apply_with_progress(&diffs, &TerminalPrompt, |progress| match progress {
            Progress::Applied(_) => print!("{}", format_progress(progress)),
            Progress::Failed(_) => eprint!("{}", format_progress(progress)),
        })
        .await?;

    print!("{}", format_outcome(&outcome));

    Ok(())
}

/// Execute export command
///
/// Without `output` the label file goes to `stdout` and nothing else does.
async fn run_export<S: LabelService, W: Write>(
    service: &S,
    format: ExportFormat,
    output: Option<&Path>,
    stdout: W,
) -> Result<()> {
    let labels = service.list_labels().await?;

    match output {
        Some(output_path) => {
            let file = std::fs::File::create(output_path)?;
            write_labels(std::io::BufWriter::new(file), &labels, format)?;
            println!(
                "{} Exported {} label(s) to: {}",
                "✓".green(),
                labels.len(),
                output_path.display().to_string().cyan()
            );
        }
        None => write_labels(stdout, &labels, format)?,
    }

    Ok(())
}

/// Require a repository argument
fn require_repository(repo: Option<String>) -> Result<String> {
    repo.ok_or_else(|| {
        Error::config_validation("Target repository required (use --repo flag)")
    })
}

/// Get access token
fn get_access_token(arg_token: Option<String>) -> Result<String> {
    arg_token
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .or_else(|| std::env::var("GH_TOKEN").ok())
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| {
            Error::config_validation(
                "GitHub access token is required. Set via --access-token, GITHUB_TOKEN or GH_TOKEN",
            )
        })
}
