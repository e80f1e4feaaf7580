use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashboard::client::{prepare_records, UsageQuery};
use dashboard::config::Config;
use dashboard::dashboard::{build_dashboard, DashboardCharts, Granularity, QueryWindow};
use dashboard::models::usage::RecordsPayload;
use dashboard::{api, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "dashboard=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = dashboard::config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Render {
            input,
            granularity,
            start,
            end,
            pretty,
        }) => render_file(&cfg, &input, granularity.as_deref(), start, end, pretty),
        Some(cli::Commands::Fetch {
            username,
            start,
            end,
            granularity,
            self_only,
            pretty,
        }) => {
            let query = FetchArgs {
                username,
                start,
                end,
                granularity,
                self_only,
            };
            fetch_and_render(cfg, query, pretty).await
        }
        None => {
            // Default: start server
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

struct FetchArgs {
    username: Option<String>,
    start: Option<i64>,
    end: Option<i64>,
    granularity: Option<String>,
    self_only: bool,
}

fn print_charts(charts: &DashboardCharts, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(charts)?
    } else {
        serde_json::to_string(charts)?
    };
    println!("{}", out);
    Ok(())
}

fn render_file(
    cfg: &Config,
    input: &Path,
    granularity: Option<&str>,
    start: Option<i64>,
    end: Option<i64>,
    pretty: bool,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let payload: RecordsPayload = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a usage response", input.display()))?;

    let window = match (start, end) {
        (Some(start), Some(end)) if start <= end => Some(QueryWindow { start, end }),
        (Some(start), Some(end)) => anyhow::bail!("--start ({}) is after --end ({})", start, end),
        _ => None,
    };

    let now = chrono::Utc::now().timestamp();
    let records = prepare_records(payload.into_records(), now);
    let ctx = cfg.context(granularity.map(Granularity::parse), window);

    tracing::info!(records = records.len(), granularity = %ctx.granularity, "rendering charts");
    print_charts(&build_dashboard(&records, &ctx), pretty)
}

async fn fetch_and_render(cfg: Config, args: FetchArgs, pretty: bool) -> anyhow::Result<()> {
    let granularity = args
        .granularity
        .as_deref()
        .map(Granularity::parse)
        .unwrap_or(cfg.default_time);
    let now = chrono::Utc::now().timestamp();
    let window = QueryWindow::resolve(args.start, args.end, granularity, now);
    if window.start > window.end {
        anyhow::bail!("--start ({}) is after --end ({})", window.start, window.end);
    }

    let state = AppState::new(cfg)?;
    let query = UsageQuery {
        username: args.username,
        start_timestamp: window.start,
        end_timestamp: window.end,
        granularity,
        self_only: args.self_only,
    };
    let records = state
        .backend
        .fetch_usage(&query, now)
        .await?;

    let ctx = state.config.context(Some(granularity), Some(window));
    print_charts(&build_dashboard(&records, &ctx), pretty)
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(cfg)?);
    let app = api::app(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(
        backend = %state.config.backend_url,
        default_time = %state.config.default_time,
        "dashboard listening on {}",
        addr
    );
    axum::serve(listener, app).await?;

    Ok(())
}
