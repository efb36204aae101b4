//! End-to-end pipeline: facts → wide records → metrics → valuations →
//! distribution summaries.
//!
//! Each stage fans out over entities or instruments on a bounded rayon pool.
//! Units of work never share mutable state; results are merged in sorted
//! key order so a run is deterministic regardless of the worker count.

use crate::{config::PipelineConfig, error::Result};
use keel_data::{
    FactRecord, Instrument, MetricsRecord, PriceObservation, Reshaper, SqliteStore,
    ValuationObservation, WideRecord, facts_from_frame, instruments_from_frame, prices_from_frame,
};
use keel_engine::{
    Compositor, DistributionAnalyzer, DistributionSummary, EntityCalculator, RatioName,
};
use keel_output::TableWriter;
use keel_registry::{MetricRegistry, Taxonomy};
use polars::prelude::DataFrame;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Raw inputs of one run.
#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    /// Facts per reporting taxonomy, in ingestion order
    pub facts: BTreeMap<Taxonomy, Vec<FactRecord>>,
    /// Priced instruments and the entities behind them
    pub instruments: Vec<Instrument>,
    /// Daily prices of any of the instruments
    pub prices: Vec<PriceObservation>,
}

impl PipelineInput {
    /// Read inputs from polars frames.
    pub fn from_frames(
        facts: &[(Taxonomy, &DataFrame)],
        instruments: &DataFrame,
        prices: &DataFrame,
    ) -> Result<Self> {
        let mut by_taxonomy: BTreeMap<Taxonomy, Vec<FactRecord>> = BTreeMap::new();
        for (taxonomy, df) in facts {
            by_taxonomy
                .entry(taxonomy.clone())
                .or_default()
                .extend(facts_from_frame(df)?);
        }
        Ok(Self {
            facts: by_taxonomy,
            instruments: instruments_from_frame(instruments)?,
            prices: prices_from_frame(prices)?,
        })
    }

    /// Load everything the store holds for `taxonomies` and its instruments.
    pub fn from_store<'t>(
        store: &SqliteStore,
        taxonomies: impl IntoIterator<Item = &'t Taxonomy>,
    ) -> Result<Self> {
        let instruments = store.get_instruments()?;

        let wanted: BTreeSet<Taxonomy> = taxonomies
            .into_iter()
            .cloned()
            .chain(instruments.iter().map(|i| i.taxonomy.clone()))
            .collect();

        let mut facts = BTreeMap::new();
        for taxonomy in wanted {
            let stored = store.get_facts(&taxonomy)?;
            if !stored.is_empty() {
                facts.insert(taxonomy, stored);
            }
        }

        let mut prices = Vec::new();
        for instrument in &instruments {
            prices.extend(store.get_prices(&instrument.instrument_id)?);
        }

        Ok(Self {
            facts,
            instruments,
            prices,
        })
    }
}

/// Outputs of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineRun {
    /// Metrics of every entity, sorted by taxonomy, entity and period
    pub metrics: Vec<MetricsRecord>,
    /// Valuation series, sorted by instrument, ratio and trade date
    pub valuations: Vec<ValuationObservation>,
    /// One summary per (instrument, ratio) with at least one defined value
    pub summaries: Vec<DistributionSummary>,
}

impl PipelineRun {
    /// Metrics history of one entity.
    pub fn metrics_for(&self, entity_id: &str) -> Vec<&MetricsRecord> {
        self.metrics
            .iter()
            .filter(|m| m.entity_id == entity_id)
            .collect()
    }

    /// Valuation series of one ratio for one instrument.
    pub fn valuations_for(&self, instrument_id: &str, ratio: RatioName) -> Vec<&ValuationObservation> {
        self.valuations
            .iter()
            .filter(|v| v.instrument_id == instrument_id && v.ratio_name == ratio.as_str())
            .collect()
    }

    /// Write the metrics, valuations and distributions tables.
    pub fn write_tables(&self, writer: &TableWriter) -> Result<()> {
        writer.write_metrics(&self.metrics)?;
        writer.write_valuations(&self.valuations)?;
        writer.write_summaries(&self.summaries)?;
        Ok(())
    }

    /// Replace the stored metrics and valuations produced by this run.
    ///
    /// The whole run is committed in one transaction.
    pub fn persist(&self, store: &SqliteStore) -> Result<()> {
        store.replace_run(&self.metrics, &self.valuations)?;
        Ok(())
    }
}

fn group_valuations(
    observations: &[ValuationObservation],
) -> BTreeMap<(&str, &str), Vec<ValuationObservation>> {
    let mut groups: BTreeMap<(&str, &str), Vec<ValuationObservation>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry((obs.instrument_id.as_str(), obs.ratio_name.as_str()))
            .or_default()
            .push(obs.clone());
    }
    groups
}

/// Runs every stage against one registry snapshot.
///
/// Take a fresh [`RegistryHandle::snapshot`](keel_registry::RegistryHandle::snapshot)
/// per pipeline to pick up catalogue reloads; a running pipeline keeps the
/// snapshot it was built with.
#[derive(Debug)]
pub struct Pipeline {
    registry: Arc<MetricRegistry>,
    config: PipelineConfig,
    compositor: Compositor,
    analyzer: DistributionAnalyzer,
    pool: ThreadPool,
}

impl Pipeline {
    /// Build a pipeline, validating the configuration and sizing the pool.
    pub fn new(registry: Arc<MetricRegistry>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("keel-worker-{i}"))
            .build()?;

        Ok(Self {
            registry,
            compositor: Compositor::new(config.compositor),
            analyzer: DistributionAnalyzer::new(config.distribution)?,
            config,
            pool,
        })
    }

    /// Configuration in effect.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Registry snapshot in effect.
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Table writer for the configured output directory and format.
    pub fn table_writer(&self) -> Result<TableWriter> {
        Ok(TableWriter::new(
            &self.config.output_dir,
            self.config.export_format()?,
        )?)
    }

    /// Reshape the facts of one taxonomy, one entity per task.
    pub fn reshape(&self, taxonomy: &Taxonomy, facts: &[FactRecord]) -> Result<Vec<WideRecord>> {
        let mut by_entity: BTreeMap<&str, Vec<&FactRecord>> = BTreeMap::new();
        for fact in facts {
            by_entity.entry(fact.entity_id.as_str()).or_default().push(fact);
        }

        let reshaper = Reshaper::new(&self.registry, taxonomy.clone());
        let per_entity = self.pool.install(|| {
            by_entity
                .par_iter()
                .map(|(_, facts)| reshaper.reshape(facts.iter().copied()))
                .collect::<keel_data::Result<Vec<_>>>()
        })?;

        Ok(per_entity.into_iter().flatten().collect())
    }

    /// Compute the metrics history of every entity in `records`.
    pub fn compute(&self, taxonomy: &Taxonomy, records: &[WideRecord]) -> Result<Vec<MetricsRecord>> {
        let calculator = EntityCalculator::new(&self.registry, taxonomy.clone())?;

        let mut by_entity: BTreeMap<&str, Vec<WideRecord>> = BTreeMap::new();
        for record in records {
            by_entity
                .entry(record.entity_id.as_str())
                .or_default()
                .push(record.clone());
        }

        let per_entity: Vec<Vec<MetricsRecord>> = self.pool.install(|| {
            by_entity
                .par_iter()
                .map(|(entity_id, records)| calculator.compute(entity_id, records))
                .collect()
        });

        Ok(per_entity.into_iter().flatten().collect())
    }

    /// Compose the configured ratios for every instrument.
    ///
    /// An instrument is valued against the metrics of its own entity and
    /// taxonomy; instruments without any metrics produce nothing.
    pub fn compose(
        &self,
        instruments: &[Instrument],
        prices: &[PriceObservation],
        metrics: &[MetricsRecord],
    ) -> Vec<ValuationObservation> {
        let mut history: BTreeMap<(&Taxonomy, &str), Vec<MetricsRecord>> = BTreeMap::new();
        for record in metrics {
            history
                .entry((&record.taxonomy, record.entity_id.as_str()))
                .or_default()
                .push(record.clone());
        }

        let mut daily: BTreeMap<&str, Vec<PriceObservation>> = BTreeMap::new();
        for price in prices {
            daily
                .entry(price.instrument_id.as_str())
                .or_default()
                .push(price.clone());
        }

        let mut sorted: Vec<&Instrument> = instruments.iter().collect();
        sorted.sort_by(|a, b| a.instrument_id.cmp(&b.instrument_id));
        sorted.dedup_by(|a, b| {
            let duplicate = a.instrument_id == b.instrument_id;
            if duplicate {
                warn!(instrument = %a.instrument_id, "duplicate instrument, keeping first");
            }
            duplicate
        });

        let empty = Vec::new();
        let per_instrument: Vec<Vec<ValuationObservation>> = self.pool.install(|| {
            sorted
                .par_iter()
                .map(|instrument| {
                    let Some(records) =
                        history.get(&(&instrument.taxonomy, instrument.entity_id.as_str()))
                    else {
                        debug!(
                            instrument = %instrument.instrument_id,
                            entity = %instrument.entity_id,
                            "no metrics for instrument's entity"
                        );
                        return Vec::new();
                    };
                    let prices = daily
                        .get(instrument.instrument_id.as_str())
                        .unwrap_or(&empty);

                    self.config
                        .ratios
                        .iter()
                        .flat_map(|ratio| {
                            self.compositor.compose(
                                &instrument.instrument_id,
                                *ratio,
                                prices,
                                records,
                            )
                        })
                        .collect()
                })
                .collect()
        });

        per_instrument.into_iter().flatten().collect()
    }

    /// Summarize every (instrument, ratio) series in `valuations`.
    pub fn summarize(&self, valuations: &[ValuationObservation]) -> Vec<DistributionSummary> {
        let groups: Vec<_> = group_valuations(valuations)
            .into_iter()
            .filter_map(|((instrument_id, ratio_name), series)| {
                match RatioName::from_name(ratio_name) {
                    Ok(ratio) => Some((instrument_id, ratio, series)),
                    Err(e) => {
                        warn!(instrument = instrument_id, error = %e, "skipping series");
                        None
                    }
                }
            })
            .collect();

        self.pool.install(|| {
            groups
                .par_iter()
                .filter_map(|(instrument_id, ratio, series)| {
                    self.analyzer
                        .summarize(instrument_id, *ratio, series, self.config.lookback)
                })
                .collect()
        })
    }

    /// Run every stage over in-memory inputs.
    pub fn run(&self, input: &PipelineInput) -> Result<PipelineRun> {
        let mut metrics = Vec::new();
        for (taxonomy, facts) in &input.facts {
            let wide = self.reshape(taxonomy, facts)?;
            let computed = self.compute(taxonomy, &wide)?;
            info!(
                taxonomy = %taxonomy,
                facts = facts.len(),
                periods = wide.len(),
                metrics = computed.len(),
                "computed entity metrics"
            );
            metrics.extend(computed);
        }

        let valuations = self.compose(&input.instruments, &input.prices, &metrics);
        info!(
            instruments = input.instruments.len(),
            observations = valuations.len(),
            "composed valuation series"
        );

        let summaries = self.summarize(&valuations);
        info!(summaries = summaries.len(), "summarized distributions");

        Ok(PipelineRun {
            metrics,
            valuations,
            summaries,
        })
    }

    /// Run over everything in `store` and write the results back to it.
    pub fn run_store(&self, store: &SqliteStore) -> Result<PipelineRun> {
        let input = PipelineInput::from_store(store, self.registry.taxonomies())?;
        let run = self.run(&input)?;
        run.persist(store)?;
        Ok(run)
    }
}
