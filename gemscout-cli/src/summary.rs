//! JSON run summary printed after a command completes.

use std::io::Write;

use camino::Utf8PathBuf;
use gemscout_core::{PipelineReport, ValueTier};
use gemscout_data::{ScoredRecord, tier_counts};
use gemscout_model::{ExpectationModel, ModelInfo, TrainingSummary};
use serde::Serialize;

use crate::CliError;

/// Restaurants per value tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct TierCount {
    pub(crate) tier: ValueTier,
    pub(crate) label: &'static str,
    pub(crate) count: usize,
}

/// What a `score` or `rescore` run read, produced and wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RunSummary {
    pub(crate) listings_read: usize,
    pub(crate) listings_dropped: usize,
    pub(crate) duplicates_collapsed: usize,
    pub(crate) restaurants_scored: usize,
    pub(crate) tiers: Vec<TierCount>,
    /// Cuisines the model keeps distinct; everything else scores as "Other".
    pub(crate) top_categories: Vec<String>,
    /// Present only when the model was trained during this run.
    pub(crate) training: Option<TrainingSummary>,
    pub(crate) model: ModelInfo,
    pub(crate) output: Utf8PathBuf,
    pub(crate) model_path: Utf8PathBuf,
}

impl RunSummary {
    pub(crate) fn new(
        report: &PipelineReport,
        records: &[ScoredRecord],
        training: Option<TrainingSummary>,
        model: &ExpectationModel,
        output: Utf8PathBuf,
        model_path: Utf8PathBuf,
    ) -> Self {
        let tiers = tier_counts(records)
            .into_iter()
            .map(|(tier, count)| TierCount {
                tier,
                label: tier.label(),
                count,
            })
            .collect();
        Self {
            listings_read: report.normalize.input,
            listings_dropped: report.normalize.dropped(),
            duplicates_collapsed: report.duplicates_collapsed,
            restaurants_scored: records.len(),
            tiers,
            top_categories: model.schema().top_categories.clone(),
            training,
            model: model.info().clone(),
            output,
            model_path,
        }
    }

    /// Number of restaurants in `tier`.
    pub(crate) fn count(&self, tier: ValueTier) -> usize {
        self.tiers
            .iter()
            .find(|entry| entry.tier == tier)
            .map_or(0, |entry| entry.count)
    }
}

pub(crate) fn write_summary(writer: &mut dyn Write, summary: &RunSummary) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(summary).map_err(CliError::SerialiseSummary)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteSummary)?;
    writer.write_all(b"\n").map_err(CliError::WriteSummary)?;
    Ok(())
}
