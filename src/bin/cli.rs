//! Blast CLI - change-impact analysis from the command line.

use anyhow::{bail, Context, Result};
use blast::analyzer::DependencyAnalyzer;
use blast::config::BlastConfig;
use blast::event::{PushEvent, WebhookDecision, WebhookPolicy};
use blast::impact::{narrative, ChangeImpactAnalyzer};
use blast::remote::GitLabClient;
use blast::report::{ChatNotifier, ImpactReport};
use blast::resolver::RemoteSource;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Changed files listed by name in the narrator prompt.
const PROMPT_FILE_LIMIT: usize = 20;

#[derive(Parser)]
#[command(name = "blast")]
#[command(about = "Blast - change-impact analysis over a file import graph", long_about = None)]
struct Cli {
    /// Configuration file (missing file means defaults)
    #[arg(short, long, default_value = "blast.toml")]
    config: PathBuf,

    /// Project root; overrides `[project] root`
    #[arg(short, long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Affected files, impact score and critical paths for a change set
    Impact {
        files: Vec<PathBuf>,

        /// Reverse-edge rounds (default: `[analysis] default_depth`)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Reuse the graph snapshot if present, write it otherwise
        #[arg(long)]
        snapshot: bool,
    },

    /// Pages that reference each file
    Pages {
        files: Vec<PathBuf>,

        /// Reverse-edge rounds (default: `[analysis] pages_depth`)
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Narrative assessment and test suggestions per file
    Assess { files: Vec<PathBuf> },

    /// Persist or inspect the graph snapshot
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },

    /// Handle a push-hook payload and render the report
    Event {
        /// JSON payload file
        payload: PathBuf,

        /// Token presented with the hook
        #[arg(short, long)]
        token: Option<String>,

        /// Send the report to the configured chat webhook
        #[arg(long)]
        notify: bool,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// Scan the project and write the snapshot
    Save,
    /// Load the snapshot and print graph statistics
    Load,
}

fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = BlastConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.apply_env();
    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| config.resolve_root(&cli.config));

    match cli.command {
        Commands::Impact {
            files,
            depth,
            snapshot,
        } => {
            if let Some(depth) = depth {
                config.analysis.default_depth = depth;
            }
            let mut analyzer = analyzer(&config, &root)?;
            if snapshot {
                let path = config.resolve_snapshot_path(&root);
                if !analyzer.graph_mut().load_snapshot(&path) {
                    analyzer.analyze_project(None)?;
                    analyzer.graph().save_snapshot(&path)?;
                }
            } else {
                analyzer.analyze_project(None)?;
            }
            let result = analyzer.analyze_changes(&files);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Pages { files, depth } => {
            let impact = impact_analyzer(&config, &root)?;
            let depth = depth.unwrap_or(config.analysis.pages_depth);
            let pages = impact.find_pages_using_files(&files, depth);
            println!("{}", serde_json::to_string_pretty(&pages)?);
        }

        Commands::Assess { files } => {
            let impact = impact_analyzer(&config, &root)?;
            let results = impact.batch_analyze_and_generate_tests(&files);
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        Commands::Snapshot { action } => {
            let path = config.resolve_snapshot_path(&root);
            let mut analyzer = analyzer(&config, &root)?;
            match action {
                SnapshotAction::Save => {
                    analyzer.analyze_project(None)?;
                    analyzer.graph().save_snapshot(&path)?;
                    println!("✓ Saved snapshot to {}", path.display());
                }
                SnapshotAction::Load => {
                    if !analyzer.graph_mut().load_snapshot(&path) {
                        bail!("could not load snapshot {}", path.display());
                    }
                }
            }
            let stats = analyzer.graph().stats();
            println!("Files: {}", stats.file_count);
            println!("Edges: {}", stats.edge_count);
        }

        Commands::Event {
            payload,
            token,
            notify,
        } => {
            let raw = std::fs::read_to_string(&payload)
                .with_context(|| format!("reading {}", payload.display()))?;
            let event = PushEvent::from_json(&raw)?;
            match WebhookPolicy::new(&config.webhook).evaluate(&event, token.as_deref()) {
                WebhookDecision::Accept { branch } => {
                    info!(%branch, "analyzing push");
                    handle_push(&config, &root, &event, notify)?;
                }
                WebhookDecision::Ignore(reason) => println!("Ignored: {reason}"),
                WebhookDecision::Reject(reason) => bail!("rejected: {reason}"),
            }
        }
    }

    Ok(())
}

fn analyzer(config: &BlastConfig, root: &Path) -> Result<DependencyAnalyzer> {
    let mut analyzer = DependencyAnalyzer::new(config.analysis.clone())?;
    analyzer
        .set_project_root(root)
        .with_context(|| format!("project root {}", root.display()))?;

    if let Some(client) = GitLabClient::from_config(&config.remote)? {
        match &config.remote.project_id {
            Some(project) => analyzer.set_remote(
                RemoteSource::new(Arc::new(client), project.clone(), config.remote.branch.clone()),
                config.remote.verify_resolution,
            ),
            None => warn!("[remote] has credentials but no project_id, remote fallback disabled"),
        }
    }
    Ok(analyzer)
}

fn impact_analyzer(config: &BlastConfig, root: &Path) -> Result<ChangeImpactAnalyzer> {
    let narrator = narrative::from_config(&config.ai)?;
    let mut impact = ChangeImpactAnalyzer::new(analyzer(config, root)?, narrator);
    impact.build_dependency_graph(None)?;
    Ok(impact)
}

fn handle_push(config: &BlastConfig, root: &Path, event: &PushEvent, notify: bool) -> Result<()> {
    let commit = event.commit_info();
    let changed = event.changed_files();

    let impact = impact_analyzer(config, root)?;
    let result = impact.analyzer().analyze_changes(&changed);

    let mut description = format!(
        "Author: {}\nBranch: {}\nMessage: {}\nChanged files: {}\n",
        commit.author,
        commit.branch,
        commit.message,
        changed.len()
    );
    for file in changed.iter().take(PROMPT_FILE_LIMIT) {
        description.push_str(&format!("- {file}\n"));
    }
    if changed.len() > PROMPT_FILE_LIMIT {
        description.push_str(&format!("... {} more\n", changed.len() - PROMPT_FILE_LIMIT));
    }
    let context = format!(
        "Project: {} ({})\nAffected files within depth {}: {}\n",
        commit.project_name,
        commit.project_id,
        config.analysis.default_depth,
        result.affected_files.len()
    );

    let narrator = impact.narrator();
    let assessment = narrator
        .assess(&description)
        .unwrap_or_else(|e| format!("Assessment failed: {e}"));
    let analysis = narrator
        .analyze_impact(&description, &context)
        .unwrap_or_else(|e| format!("Impact analysis failed: {e}"));

    let report = ImpactReport::new(commit, changed, result).with_narrative(assessment, analysis);
    let markdown = report.render_markdown();
    println!("{markdown}");

    if notify {
        match ChatNotifier::from_config(&config.notification)? {
            Some(notifier) => {
                notifier.send_markdown(&markdown)?;
                println!("✓ Notification sent");
            }
            None => warn!("no chat webhook configured, skipping notification"),
        }
    }
    Ok(())
}
