use rousai_scraper::{pipeline, Config};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) configuration, read once ─────────────────────────────────
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };

    // ─── 3) run ──────────────────────────────────────────────────────
    match pipeline::run(&config).await {
        Ok(report) => {
            info!(
                file = %report.file.filename,
                period = %report.file.period,
                sheet = %report.sheet,
                "run finished"
            );
            match report.outcome {
                Some(outcome) if !outcome.is_success() => ExitCode::FAILURE,
                _ => ExitCode::SUCCESS,
            }
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
