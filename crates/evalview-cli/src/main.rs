mod live;
mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use evalview_core::config::{self, EvalviewConfig};
use evalview_core::credentials::CredentialState;
use evalview_core::dashboard::{Command, ViewUpdate};
use evalview_core::detail::DetailModal;
use evalview_core::results::{JobId, ResultsPanel, SortColumn, SortDirection, SortOrder};
use evalview_core::session::Viewport;

use live::LiveDashboard;

#[derive(Parser)]
#[command(name = "evalview", version, about = "Evaluation results dashboard")]
struct Cli {
    /// Path to evalview.toml.
    #[arg(long, global = true, default_value = "evalview.toml")]
    config: PathBuf,
    /// Backend base URL, overriding the config file.
    #[arg(long, global = true)]
    server: Option<String>,
    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Sync and verify the cloud credentials of the remote shell.
    Credentials {
        #[arg(long)]
        json: bool,
    },
    /// Fetch the result set of a job.
    Results {
        #[arg(long)]
        job_id: String,
        /// Sort by `test-case`, `result`, or a metric name.
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending.
        #[arg(long)]
        desc: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show the full record of one result file.
    Detail {
        #[arg(long)]
        job_id: String,
        /// Result filename, e.g. `tc1.jsonl`.
        #[arg(long)]
        file: String,
        #[arg(long)]
        json: bool,
    },
    /// Relay stdin/stdout to the remote shell.
    Shell {
        #[arg(long)]
        rows: Option<u16>,
        #[arg(long)]
        cols: Option<u16>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    evalview_core::init_tracing();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("evalview v{}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    };
    let config = load(&cli.config, cli.server.as_deref())?;

    match command {
        Cmd::Credentials { json } => run_credentials(&config, json).await,
        Cmd::Results {
            job_id,
            sort,
            desc,
            json,
        } => run_results(&config, &job_id, sort.as_deref(), desc, json).await,
        Cmd::Detail { job_id, file, json } => run_detail(&config, &job_id, &file, json).await,
        Cmd::Shell { rows, cols } => run_shell(&config, rows, cols).await,
    }
}

fn load(path: &Path, server: Option<&str>) -> Result<EvalviewConfig> {
    let mut config = config::load_config(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    if let Some(server) = server {
        config.server.base_url = server.to_string();
    }
    config::validate(&config).context("invalid configuration")?;
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_credentials(config: &EvalviewConfig, json: bool) -> Result<ExitCode> {
    let mut live = LiveDashboard::connect(config).await?;
    let status = live.credentials().await?;
    live.shutdown().await;

    if json {
        print_json(&status)?;
    } else {
        println!("{}", render::credential_line(&status));
    }
    Ok(match status.state {
        CredentialState::Connected => ExitCode::SUCCESS,
        _ => ExitCode::from(1),
    })
}

/// Connect, let the credential check settle, then fetch `job_id`.
async fn load_results(
    config: &EvalviewConfig,
    job_id: &str,
) -> Result<(LiveDashboard, ResultsPanel)> {
    // Rejected locally, before any connection is made.
    JobId::parse(job_id)?;

    let mut live = LiveDashboard::connect(config).await?;
    let credentials = live.credentials().await?;
    eprintln!("{}", render::credential_line(&credentials));

    live.send(Command::RequestResults(job_id.to_string())).await?;
    let panel = next_panel(&mut live).await?;
    Ok((live, panel))
}

async fn next_panel(live: &mut LiveDashboard) -> Result<ResultsPanel> {
    loop {
        let update = live
            .wait_for(|u| matches!(u, ViewUpdate::Status(_) | ViewUpdate::Results(_)))
            .await?;
        match update {
            ViewUpdate::Results(panel) => return Ok(panel),
            ViewUpdate::Status(status) => eprintln!("{}", render::status_line(&status)),
            _ => unreachable!("filtered by wait_for"),
        }
    }
}

async fn run_results(
    config: &EvalviewConfig,
    job_id: &str,
    sort: Option<&str>,
    desc: bool,
    json: bool,
) -> Result<ExitCode> {
    let (mut live, mut panel) = load_results(config, job_id).await?;

    if let Some(order) = sort_order(&panel, sort, desc)? {
        live.send(Command::Sort(order)).await?;
        panel = next_panel(&mut live).await?;
    }
    live.shutdown().await;

    if json {
        print_json(&panel)?;
    } else {
        print!("{}", render::results_panel(&panel));
    }
    Ok(match panel {
        ResultsPanel::Loaded(_) | ResultsPanel::NoResults { .. } => ExitCode::SUCCESS,
        ResultsPanel::Failed { .. } | ResultsPanel::Idle => ExitCode::from(1),
    })
}

/// Sorting only applies to a loaded table; a metric column must exist in it.
fn sort_order(panel: &ResultsPanel, sort: Option<&str>, desc: bool) -> Result<Option<SortOrder>> {
    let (Some(column), ResultsPanel::Loaded(view)) = (sort, panel) else {
        return Ok(None);
    };
    let column: SortColumn = column.parse().unwrap_or_else(|never| match never {});
    if let SortColumn::Score(name) = &column {
        if !view.columns.iter().any(|c| &c.name == name) {
            bail!("unknown sort column '{name}'");
        }
    }
    let direction = if desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    Ok(Some(SortOrder { column, direction }))
}

async fn run_detail(
    config: &EvalviewConfig,
    job_id: &str,
    file: &str,
    json: bool,
) -> Result<ExitCode> {
    let (mut live, panel) = load_results(config, job_id).await?;
    if !matches!(panel, ResultsPanel::Loaded(_)) {
        live.shutdown().await;
        print!("{}", render::results_panel(&panel));
        return Ok(ExitCode::from(1));
    }

    live.send(Command::RequestDetail(file.to_string())).await?;
    let modal = loop {
        let update = live
            .wait_for(|u| matches!(u, ViewUpdate::Detail(_) | ViewUpdate::Status(_)))
            .await?;
        match update {
            ViewUpdate::Detail(DetailModal::Loading { .. }) => continue,
            ViewUpdate::Detail(modal) => break modal,
            ViewUpdate::Status(status) => bail!("{}", status.message),
            _ => unreachable!("filtered by wait_for"),
        }
    };
    live.shutdown().await;

    if json {
        print_json(&modal)?;
    } else {
        print!("{}", render::detail_modal(&modal));
    }
    Ok(match modal {
        DetailModal::Loaded(_) => ExitCode::SUCCESS,
        _ => ExitCode::from(1),
    })
}

async fn run_shell(
    config: &EvalviewConfig,
    rows: Option<u16>,
    cols: Option<u16>,
) -> Result<ExitCode> {
    let mut live = LiveDashboard::connect(config).await?;
    eprintln!("connected, session {}", live.session_id);

    let viewport = Viewport {
        rows: rows.unwrap_or(config.terminal.rows),
        cols: cols.unwrap_or(config.terminal.cols),
    };
    live.send(Command::Resize(viewport)).await?;

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut buf = [0u8; 1024];
    let mut stdin_open = true;

    let exit = loop {
        tokio::select! {
            read = stdin.read(&mut buf), if stdin_open => {
                match read.context("failed to read stdin")? {
                    0 => stdin_open = false,
                    n => live.send(Command::Keystroke(buf[..n].to_vec())).await?,
                }
            }
            update = live.next_update() => match update {
                Some(ViewUpdate::TerminalOutput(data)) => {
                    stdout.write_all(&data).await?;
                    stdout.flush().await?;
                }
                Some(ViewUpdate::Credential(status)) => {
                    eprintln!("{}", render::credential_line(&status));
                }
                Some(ViewUpdate::SessionDisconnected { reason }) => {
                    eprintln!(
                        "session closed: {}",
                        reason.as_deref().unwrap_or("server went away")
                    );
                    break ExitCode::SUCCESS;
                }
                Some(_) => {}
                None => break ExitCode::from(1),
            },
            _ = tokio::signal::ctrl_c() => break ExitCode::SUCCESS,
        }
    };
    live.shutdown().await;
    Ok(exit)
}
