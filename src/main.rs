//! gw-samples: serve and query gravitational-wave sample archives.
//!
//! # Commands
//!
//! - `serve`: index a samples directory and answer HTTP queries
//! - `query`: draw samples from one archive and print them
//! - `variables`: list the fields available in one archive

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gw_samples::archive::ParquetArchive;
use gw_samples::catalog::Catalog;
use gw_samples::injections::{find_injection_variables, load_injections, SignificanceFilter};
use gw_samples::posterior::{find_variables, load_posterior};
use gw_samples::server::{self, AppState, ServerConfig, DEFAULT_MODEL};
use gw_samples::SampleCount;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gw-samples", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve a samples directory over HTTP.
    Serve {
        /// Root containing `events/<set>/<archive>` and `injections/<set>/<archive>`.
        #[arg(long, env = "GW_SAMPLES_DIR")]
        samples_dir: PathBuf,

        /// Bind address.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on.
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Model used when an event query names none.
        #[arg(long, default_value = DEFAULT_MODEL)]
        default_model: String,
    },

    /// Draw samples from one archive.
    Query {
        #[command(flatten)]
        target: Target,

        /// Variables to extract (repeatable).
        #[arg(short, long = "variable", required = true)]
        variables: Vec<String>,

        /// Number of samples; -1 for all.
        #[arg(short, long, default_value = "-1", allow_hyphen_values = true)]
        n_samples: i64,

        /// Seed for reproducible draws.
        #[arg(long)]
        seed: Option<u64>,

        /// Significance threshold for found injections.
        #[arg(long, default_value = "1.0")]
        ifar_threshold: f64,

        #[arg(long, value_enum, default_value = "json")]
        format: Format,
    },

    /// List the variables of one archive.
    Variables {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Args, Debug)]
struct Target {
    /// Archive directory.
    archive: PathBuf,

    /// Model (top-level group) to read.
    #[arg(long, conflicts_with = "injections")]
    model: Option<String>,

    /// Read the injection set instead of a model.
    #[arg(long)]
    injections: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Serve {
            samples_dir,
            host,
            port,
            default_model,
        } => serve(samples_dir, host, port, default_model).await,
        Command::Query {
            target,
            variables,
            n_samples,
            seed,
            ifar_threshold,
            format,
        } => query(&target, &variables, n_samples, seed, ifar_threshold, format),
        Command::Variables { target } => list_variables(&target),
    }
}

async fn serve(
    samples_dir: PathBuf,
    host: String,
    port: u16,
    default_model: String,
) -> anyhow::Result<()> {
    let catalog = Catalog::scan(&samples_dir)?;
    let config = ServerConfig {
        default_model,
        ..Default::default()
    };
    let state = Arc::new(AppState::new(catalog, config));
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        samples_dir = %samples_dir.display(),
        version = env!("CARGO_PKG_VERSION"),
        "gw-samples server starting"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn resolve_model(target: &Target) -> String {
    target
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

fn query(
    target: &Target,
    variables: &[String],
    n_samples: i64,
    seed: Option<u64>,
    ifar_threshold: f64,
    format: Format,
) -> anyhow::Result<()> {
    let archive = ParquetArchive::open(&target.archive)?;
    let count = SampleCount::from_request(n_samples)?;
    let samples = if target.injections {
        let filter = SignificanceFilter::new(ifar_threshold);
        load_injections(&archive, variables, count, &filter, seed)?
    } else {
        load_posterior(&archive, &resolve_model(target), variables, count, seed)?
    };
    tracing::info!(
        model = %samples.model,
        selected = samples.len(),
        "retrieval complete"
    );

    let stdout = io::stdout().lock();
    match format {
        Format::Json => {
            let mut out = io::BufWriter::new(stdout);
            serde_json::to_writer_pretty(&mut out, &samples)?;
            writeln!(out)?;
            out.flush()?;
        }
        Format::Csv => gw_samples::io::write_csv(&samples, stdout)?,
    }
    Ok(())
}

fn list_variables(target: &Target) -> anyhow::Result<()> {
    let archive = ParquetArchive::open(&target.archive)?;
    let names = if target.injections {
        find_injection_variables(&archive)?
    } else {
        find_variables(&archive, &resolve_model(target))?
    };
    let mut out = io::stdout().lock();
    for name in names {
        writeln!(out, "{name}")?;
    }
    Ok(())
}
