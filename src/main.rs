use clap::{Parser, Subcommand};
use matchbook::matcher::Matcher;
use matchbook::{api, config, expiry};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "matchbook", about = "Matchbook order book matching engine")]
struct Cli {
    #[arg(short, long, default_value = "config.toml")]
    config_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Serve,
}

fn init_logging(cfg: &config::AppConfig) {
    match cfg.logger.format {
        config::LogFormat::JSON => {
            tracing_subscriber::fmt()
                .json()
                .with_max_level(cfg.logger.level)
                .with_current_span(true)
                .init();
        }
        config::LogFormat::COMPACT => {
            tracing_subscriber::fmt()
                .compact()
                .with_max_level(cfg.logger.level)
                .init();
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = config::AppConfig::load(cli.config_path.as_ref()).expect("could not load config");

    init_logging(&config);

    match cli.command {
        Commands::Serve => {
            let schedule =
                expiry::Schedule::from_config(&config.expiry).expect("invalid expiry config");
            let matcher = Arc::new(Matcher::new());
            let shutdown = CancellationToken::new();

            let expiry_worker = tokio::spawn(expiry::run(
                Arc::clone(&matcher),
                schedule,
                shutdown.clone(),
            ));

            let signal_token = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    signal_token.cancel();
                }
            });

            api::start(&config.api, matcher, shutdown.clone())
                .await
                .expect("could not start API server");

            shutdown.cancel();
            let _ = expiry_worker.await;
        }
    }
}
