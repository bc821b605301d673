use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::ai::{Completer, ScriptedCompleter, UnavailableCompleter};
use crate::api::{CoreApi, GenerateRequest, RequestContext, RiskQuery, WebhookRequest};
use crate::config::RiskmapConfig;
use crate::core::{TenantId, UserId};
use crate::events::NullSink;
use crate::repo::snapshot::Snapshot;
use crate::runner::JobState;

#[derive(Parser, Debug)]
#[command(name = "riskmap")]
#[command(about = "Multi-tenant risk and event orchestration core", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the periodic trigger scan for one tenant
    Scan {
        /// Repository snapshot (JSON)
        #[arg(long)]
        snapshot: PathBuf,

        /// Tenant to scan
        #[arg(long)]
        tenant: String,

        /// Optional TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Ingest a webhook payload from a file
    Webhook {
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        tenant: String,

        /// JSON payload file
        #[arg(long)]
        payload: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List events visible to a user
    Events {
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        tenant: String,

        /// User the listing is gated for
        #[arg(long)]
        user: String,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List generated risks
    Risks {
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        tenant: String,

        /// Filter by entity tag
        #[arg(long)]
        entity: Option<String>,

        /// Filter by source table tag
        #[arg(long)]
        data: Option<String>,

        /// Filter by source row id
        #[arg(long)]
        row: Option<String>,

        #[arg(long, default_value = "1")]
        page: usize,

        #[arg(long, default_value = "20")]
        page_size: usize,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate risks for a selection and wait for the result
    Generate {
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        tenant: String,

        #[arg(long)]
        entity: Option<String>,

        #[arg(long)]
        table: Option<String>,

        #[arg(long)]
        row: Option<String>,

        /// Submit by approval id instead of an explicit selection
        #[arg(long)]
        approval: Option<String>,

        /// File with canned completion output (otherwise the
        /// deterministic fallback generator runs)
        #[arg(long)]
        completion_file: Option<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> RiskmapConfig {
    path.map(RiskmapConfig::load).unwrap_or_default()
}

fn build_api(
    snapshot: &Path,
    config: Option<&Path>,
    completion_file: Option<&Path>,
) -> anyhow::Result<CoreApi> {
    let config = load_config(config);
    let repo = Arc::new(Snapshot::load(snapshot)?.into_repo());
    let completer: Arc<dyn Completer> = match completion_file {
        Some(path) => {
            let script = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read completion file {}", path.display()))?;
            Arc::new(ScriptedCompleter::new(script))
        }
        None => Arc::new(UnavailableCompleter),
    };
    Ok(CoreApi::new(repo, completer, Arc::new(NullSink), config))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Scan {
            snapshot,
            tenant,
            config,
        } => {
            let api = build_api(&snapshot, config.as_deref(), None)?;
            let ctx = RequestContext::for_tenant(TenantId::new(tenant));
            let response = api.scan_triggers(&ctx, chrono::Utc::now())?;
            print_json(&response)
        }

        Commands::Webhook {
            snapshot,
            tenant,
            payload,
            config,
        } => {
            let api = build_api(&snapshot, config.as_deref(), None)?;
            let raw = std::fs::read_to_string(&payload)
                .with_context(|| format!("failed to read payload {}", payload.display()))?;
            let request: WebhookRequest = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse payload {}", payload.display()))?;
            let ctx = RequestContext::for_tenant(TenantId::new(tenant));
            let response = api.webhook(&ctx, &request, chrono::Utc::now())?;
            print_json(&response)
        }

        Commands::Events {
            snapshot,
            tenant,
            user,
            config,
        } => {
            let api = build_api(&snapshot, config.as_deref(), None)?;
            let ctx =
                RequestContext::for_tenant(TenantId::new(tenant)).with_user(UserId::new(user));
            let response = api.list_events(&ctx)?;
            print_json(&response)
        }

        Commands::Risks {
            snapshot,
            tenant,
            entity,
            data,
            row,
            page,
            page_size,
            config,
        } => {
            let api = build_api(&snapshot, config.as_deref(), None)?;
            let ctx = RequestContext::for_tenant(TenantId::new(tenant));
            let query = RiskQuery {
                entity,
                data,
                row,
                page: Some(page),
                page_size: Some(page_size),
            };
            let response = api.list_risks(&ctx, &query)?;
            print_json(&response)
        }

        Commands::Generate {
            snapshot,
            tenant,
            entity,
            table,
            row,
            approval,
            completion_file,
            config,
        } => {
            let api = build_api(&snapshot, config.as_deref(), completion_file.as_deref())?;
            let ctx = RequestContext::for_tenant(TenantId::new(tenant));
            let request = GenerateRequest {
                approval_id: approval,
                entity,
                table,
                row_id: row,
            };
            let submitted = api.generate_risks(&ctx, &request)?;
            print_json(&submitted)?;

            wait_for_job(&api, &ctx, &submitted.key)
        }
    }
}

/// Poll the job until it leaves the running state.
fn wait_for_job(api: &CoreApi, ctx: &RequestContext, key: &str) -> anyhow::Result<()> {
    let deadline = Instant::now() + Duration::from_secs(120);
    loop {
        match api.job_status(ctx, key) {
            Ok(status) if status.status == JobState::Running => {
                if Instant::now() > deadline {
                    anyhow::bail!("job {} still running after 120s", key);
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Ok(status) => return print_json(&status),
            // the worker may not have registered history yet
            Err(_) if Instant::now() <= deadline => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(err) => return Err(err.into()),
        }
    }
}
