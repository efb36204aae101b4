//! CSV and JSON export of engine outputs.
//!
//! Metrics records are written long in CSV (one row per metric) and nested in
//! JSON. Valuation observations and distribution summaries map one-to-one to
//! rows. Undefined values are empty CSV fields and JSON `null`s.

use crate::{
    error::{ExportError, Result},
    table::write_atomic,
};
use chrono::NaiveDate;
use keel_data::{MetricsRecord, ValuationObservation};
use keel_engine::DistributionSummary;
use serde::Serialize;
use std::path::Path;

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format
    Csv,

    /// Compact JSON format
    Json,

    /// Pretty-printed JSON format
    PrettyJson,
}

impl ExportFormat {
    /// File extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Format for a file extension.
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ExportError::InvalidFormat(format!(
                "unsupported extension {other:?}"
            ))),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String>;

    /// Export data to a file in the specified format.
    ///
    /// The file is replaced atomically; a failed export leaves any previous
    /// content in place.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let content = self.export_to_string(format)?;
        write_atomic(path, content.as_bytes())
    }
}

/// One metric of one metrics record, the CSV row shape.
#[derive(Debug, Serialize)]
struct MetricRow<'a> {
    entity_id: &'a str,
    taxonomy: &'a str,
    fiscal_year: i32,
    fiscal_quarter: u8,
    period_end: NaiveDate,
    metric: &'a str,
    value: Option<f64>,
}

fn metric_rows(record: &MetricsRecord) -> impl Iterator<Item = MetricRow<'_>> {
    record.values.iter().map(move |(metric, value)| MetricRow {
        entity_id: &record.entity_id,
        taxonomy: record.taxonomy.as_str(),
        fiscal_year: record.fiscal_year,
        fiscal_quarter: record.fiscal_quarter,
        period_end: record.period_end,
        metric,
        value: *value,
    })
}

fn to_csv<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

fn to_json<T: Serialize + ?Sized>(value: &T, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
        _ => Ok(serde_json::to_string(value)?),
    }
}

impl Exporter for [MetricsRecord] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => to_csv(self.iter().flat_map(metric_rows)),
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

impl Exporter for [ValuationObservation] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => to_csv(self),
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

impl Exporter for [DistributionSummary] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => to_csv(self),
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

impl Exporter for DistributionSummary {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        std::slice::from_ref(self).export_to_string(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_registry::Taxonomy;
    use keel_engine::RatioName;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn metrics() -> Vec<MetricsRecord> {
        let mut values = BTreeMap::new();
        values.insert("roe".to_string(), Some(92.0));
        values.insert("revenue_growth".to_string(), None);
        vec![MetricsRecord {
            entity_id: "ACME".to_string(),
            taxonomy: Taxonomy::company(),
            fiscal_year: 2023,
            fiscal_quarter: 4,
            period_end: date(2023, 12, 31),
            values,
        }]
    }

    fn valuations() -> Vec<ValuationObservation> {
        vec![
            ValuationObservation {
                instrument_id: "ACME.X".to_string(),
                trade_date: date(2024, 1, 2),
                ratio_name: "pe_ttm".to_string(),
                ratio_value: Some(12.5),
            },
            ValuationObservation {
                instrument_id: "ACME.X".to_string(),
                trade_date: date(2024, 1, 3),
                ratio_name: "pe_ttm".to_string(),
                ratio_value: None,
            },
        ]
    }

    fn summary() -> DistributionSummary {
        DistributionSummary {
            instrument_id: "ACME.X".to_string(),
            ratio_name: RatioName::PeTtm,
            as_of_date: date(2024, 1, 3),
            p5: 8.0,
            p25: 10.0,
            p50: 12.0,
            p75: 14.0,
            p95: 18.0,
            current_value: 12.5,
            current_percentile: 55.0,
            sample_size: 250,
            used_capped: true,
        }
    }

    #[test]
    fn test_metrics_csv_is_long() {
        let csv = metrics().export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "entity_id,taxonomy,fiscal_year,fiscal_quarter,period_end,metric,value"
        );
        assert_eq!(lines[1], "ACME,company,2023,4,2023-12-31,revenue_growth,");
        assert_eq!(lines[2], "ACME,company,2023,4,2023-12-31,roe,92.0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_metrics_json_keeps_nulls() {
        let json = metrics().export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains("\"roe\":92.0"));
        assert!(json.contains("\"revenue_growth\":null"));
        assert!(json.contains("\"taxonomy\":\"company\""));
    }

    #[test]
    fn test_valuations_csv_has_empty_cell_for_undefined() {
        let csv = valuations().export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("instrument_id,trade_date,ratio_name,ratio_value\n"));
        assert!(csv.contains("ACME.X,2024-01-02,pe_ttm,12.5\n"));
        assert!(csv.contains("ACME.X,2024-01-03,pe_ttm,\n"));
    }

    #[test]
    fn test_summary_uses_ratio_name() {
        let csv = summary().export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.contains("pe_ttm"));
        assert!(csv.contains("250"));

        let json = summary().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(json.contains("\"ratio_name\": \"pe_ttm\""));
        assert!(json.contains("  "));
    }

    #[test]
    fn test_export_is_deterministic() {
        let a = valuations().export_to_string(ExportFormat::Json).unwrap();
        let b = valuations().export_to_string(ExportFormat::Json).unwrap();
        assert_eq!(a, b);
    }

    #[rstest]
    #[case(ExportFormat::Csv, "csv")]
    #[case(ExportFormat::Json, "json")]
    #[case(ExportFormat::PrettyJson, "json")]
    fn test_export_format_extension(#[case] format: ExportFormat, #[case] ext: &str) {
        assert_eq!(format.extension(), ext);
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(ExportFormat::from_extension("CSV").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_extension("json").unwrap(), ExportFormat::Json);
        assert!(matches!(
            ExportFormat::from_extension("parquet"),
            Err(ExportError::InvalidFormat(_))
        ));
    }
}
