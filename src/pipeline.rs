// src/pipeline.rs
use crate::{
    config::Config,
    error::PipelineError,
    fetch::{
        self,
        urls::{fetch_candidates, select_latest, CandidateFile},
    },
    process::{
        normalize::{clean_fixed_layout, NormalizedTable},
        sheet::locate_sheet,
    },
    transmit::{send_table, TransmitOutcome},
};
use tracing::{info, instrument};

/// What a completed run found and did.
#[derive(Debug)]
pub struct RunReport {
    pub file: CandidateFile,
    pub sheet: String,
    pub table: NormalizedTable,
    /// `None` on a dry run.
    pub outcome: Option<TransmitOutcome>,
}

/// Discover, download, parse, normalize and transmit the latest report.
#[instrument(level = "info", skip_all, fields(listing = %config.listing_url, dry_run = config.dry_run))]
pub async fn run(config: &Config) -> Result<RunReport, PipelineError> {
    // ─── 1) endpoint is checked before any network activity ──────────
    let client_error = |e: anyhow::Error| PipelineError::Config(format!("{:#}", e));
    let endpoint = if config.dry_run {
        None
    } else {
        let url = config.require_endpoint()?;
        Some((url, fetch::build_endpoint_client(config).map_err(client_error)?))
    };
    let client = fetch::build_client(config).map_err(client_error)?;

    // ─── 2) discover report files ────────────────────────────────────
    let candidates = fetch_candidates(&client, &config.listing_url)
        .await
        .map_err(PipelineError::Discovery)?;
    let latest = select_latest(&candidates)
        .cloned()
        .ok_or_else(|| PipelineError::NoCandidates {
            listing: config.listing_url.to_string(),
        })?;
    info!(file = %latest.filename, period = %latest.period, "latest report");

    // ─── 3) download + locate sheet ──────────────────────────────────
    let bytes = fetch::download_bytes(&client, &latest.url)
        .await
        .map_err(PipelineError::Download)?;
    let located = locate_sheet(bytes, latest.period)?;

    // ─── 4) normalize ────────────────────────────────────────────────
    let table = clean_fixed_layout(&located.grid);
    info!(
        rows = table.rows().len(),
        columns = table.columns().len(),
        "normalized table\n{}",
        table
    );

    // ─── 5) transmit ─────────────────────────────────────────────────
    let outcome = match endpoint {
        Some((url, endpoint_client)) => {
            Some(send_table(&endpoint_client, url, &table, latest.period).await)
        }
        None => {
            info!("dry run; not transmitting");
            None
        }
    };

    Ok(RunReport {
        file: latest,
        sheet: located.name,
        table,
        outcome,
    })
}
