use crate::cli::download;
use clap::Parser;
use std::path::MAIN_SEPARATOR;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() {
    let f_appender =
        tracing_appender::rolling::hourly(format!(".{}", MAIN_SEPARATOR), "cardfetch.log");
    let (non_blk, _guard) = tracing_appender::non_blocking(f_appender);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("libcardfetch=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .event_format(tracing_subscriber::fmt::format().pretty())
        .with_ansi(false)
        .with_writer(non_blk)
        .init();
    let cli = cli::Cli::parse();
    download(cli).await;
}
