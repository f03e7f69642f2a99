//! One-shot run: fetch → filter → normalize + tally → report → render

use crate::aggregator::CountryTally;
use crate::fetcher::{fetch_laureates, fetch_prizes, DatasetSource};
use crate::filter::filter_laureates;
use crate::normalizer::CountryNormalizer;
use crate::render::{Figure, Renderer};
use crate::report::{build_report, ChoroplethReport, ReportConfig};
use crate::Result;
use tracing::info;

/// Result of a full run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Laureates referenced by at least one prize
    pub kept_laureates: usize,
    pub tally: CountryTally,
    pub report: ChoroplethReport,
    pub figure: Figure,
}

pub struct Pipeline<S: DatasetSource> {
    source: S,
    normalizer: CountryNormalizer,
    report_config: ReportConfig,
}

impl<S: DatasetSource> Pipeline<S> {
    pub fn new(source: S, normalizer: CountryNormalizer, report_config: ReportConfig) -> Self {
        Self {
            source,
            normalizer,
            report_config,
        }
    }

    /// Run every stage once. Both datasets are fetched before anything is
    /// counted, so a fetch failure leaves no partial result.
    pub fn run(&self, renderer: &dyn Renderer) -> Result<PipelineOutput> {
        let laureates = fetch_laureates(&self.source)?;
        let prizes = fetch_prizes(&self.source)?;

        let kept = filter_laureates(laureates.laureates, &prizes.prizes);
        let tally = CountryTally::from_laureates(&kept, &self.normalizer);
        let report = build_report(&tally, &self.report_config);

        info!("Rendering {} locations", report.rows.len());
        let figure = renderer.render(&report)?;

        Ok(PipelineOutput {
            kept_laureates: kept.len(),
            tally,
            report,
            figure,
        })
    }
}
