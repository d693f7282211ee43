mod cmd;
mod modules;
mod types;


use crate::cmd::{
    capture::{self, CaptureArgs},
    config::{self, ConfigArgs},
    list::{self, ListArgs},
    ping::{self, PingArgs},
    server::{self, ServerArgs},
    show::{self, ShowArgs},
    stats::{self, StatsArgs},
};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::{env, process::exit, str::FromStr};
use tokio::runtime::Builder;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{self, time::OffsetTime},
};

#[derive(Debug, Parser)]
#[command(name = "problem_vault")]
#[command(about = "Capture programming problems and keep them in one searchable place")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the ingest API server.
    Server(ServerArgs),
    /// Capture a problem from the source site and submit it.
    Capture(CaptureArgs),
    /// Show or change the client configuration.
    Config(ConfigArgs),
    /// List, filter and search stored problems.
    List(ListArgs),
    /// Print one stored problem.
    Show(ShowArgs),
    /// Print aggregate statistics.
    Stats(StatsArgs),
    /// Check that the backend is reachable.
    Ping(PingArgs),
}

fn main() {
    dotenv().ok();

    let log_level = env::var("RUST_LOG").unwrap_or(String::from("info"));
    let filter = EnvFilter::builder()
        .with_default_directive(
            LevelFilter::from_str(&log_level)
                .unwrap_or(LevelFilter::INFO)
                .into(),
        )
        .from_env_lossy();
    let format = fmt::format()
        .with_level(true)
        .with_target(true)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_timer(OffsetTime::local_rfc_3339().expect("couldn't determine the local offset"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .event_format(format)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build the tokio runtime");

    let result = match Cli::parse().command {
        Commands::Server(args) => runtime.block_on(server::run(args)),
        Commands::Capture(args) => runtime.block_on(capture::run(args)),
        Commands::Config(args) => runtime.block_on(config::run(args)),
        Commands::List(args) => runtime.block_on(list::run(args)),
        Commands::Show(args) => runtime.block_on(show::run(args)),
        Commands::Stats(args) => runtime.block_on(stats::run(args)),
        Commands::Ping(args) => runtime.block_on(ping::run(args)),
    };

    if let Err(e) = result {
        tracing::error!("command failed: {:#}", e);
        exit(1);
    }
}
