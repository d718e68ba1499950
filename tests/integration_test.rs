//! End-to-end tests over the public pipeline, batch and merge entry points.
//!
//! Tests cover:
//! - The rising 60-day scenario through every indicator
//! - Lenient mode on a 40-day series (Ichimoku unavailable, instrument kept)
//! - The full-coverage gate on a 10-day series
//! - Batch ordering, determinism and skip isolation
//! - Fundamentals merge through the data and report ports
//! - The scan pipeline via SqliteAdapter with a seeded in-memory database

mod common;

use common::*;
use stocksignals::cli::{run_fundamentals_pipeline, run_scan_pipeline};
use stocksignals::domain::aggregate::Selection;
use stocksignals::domain::batch::run_batch;
use stocksignals::domain::config_validation::{DataSource, ScanSettings};
use stocksignals::domain::decision::Decision;
use stocksignals::domain::error::{IndicatorScope, ScanError, SkipReason};
use stocksignals::domain::indicator::IndicatorKind;
use stocksignals::domain::pipeline::{self, PipelineConfig, PipelineMode};
use std::path::PathBuf;

fn lenient() -> PipelineConfig {
    PipelineConfig {
        mode: PipelineMode::Lenient,
        ..PipelineConfig::default()
    }
}

fn settings(pipeline: PipelineConfig) -> ScanSettings {
    ScanSettings {
        source: DataSource::Csv {
            prices_path: PathBuf::from("unused.csv"),
            fundamentals_path: None,
        },
        pipeline,
        threads: 2,
        output_path: Some("results.json".to_string()),
        pretty: true,
    }
}

mod rising_series_scenario {
    use super::*;

    #[test]
    fn sixty_rising_days_score_as_buy() {
        let rows = linear_rows(1, 60, 100.0);
        let result = pipeline::evaluate(&rows, &PipelineConfig::default()).unwrap();
        let t = &result.technicals;

        assert_eq!(t.latest_price, 159.0);
        assert_eq!(t.latest_date, date(2024, 2, 29));

        // strictly rising closes: no losses at all
        assert_eq!(t.latest.rsi, Some(100.0));
        assert_eq!(
            t.indicator_decisions[&IndicatorKind::Rsi],
            Some(Decision::StrongSell)
        );

        for kind in [IndicatorKind::Ema, IndicatorKind::Sma] {
            let decision = t.indicator_decisions[&kind];
            assert!(
                matches!(decision, Some(Decision::Buy | Decision::StrongBuy)),
                "{kind}: {decision:?}"
            );
        }

        assert_eq!(t.latest.supertrend_direction, Some(1));
        assert_eq!(
            t.indicator_decisions[&IndicatorKind::Supertrend],
            Some(Decision::Buy)
        );
        assert_eq!(
            t.indicator_decisions[&IndicatorKind::Psar],
            Some(Decision::Buy)
        );
        assert!(matches!(t.decision, Decision::Buy | Decision::StrongBuy));
        assert_eq!(t.selected_indicators.len(), 12);
    }

    #[test]
    fn history_lines_match_series_length() {
        let rows = linear_rows(1, 60, 100.0);
        let result = pipeline::evaluate(&rows, &PipelineConfig::default()).unwrap();
        let t = &result.technicals;

        assert_eq!(t.dates.len(), 60);
        assert_eq!(t.closes.len(), 60);
        assert_eq!(t.ema9.len(), 60);
        assert_eq!(t.sma20.len(), 60);
        assert_eq!(t.ema9[7], None);
        assert_eq!(t.ema9[8], Some(104.0));
        assert_eq!(t.sma20[19], Some(109.5));
    }

    #[test]
    fn record_serializes_with_contract_names() {
        let rows = linear_rows(42, 60, 100.0);
        let result = pipeline::evaluate(&rows, &PipelineConfig::default()).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["scripcode"], 42);
        assert_eq!(json["symbol"], "SYM42");
        assert_eq!(json["s_name"], "Co42");
        assert_eq!(json["latestPrice"], 159.0);
        assert_eq!(json["latestRSI"], 100.0);
        assert_eq!(json["latestSupertrendDirection"], 1);
        assert_eq!(json["indicatorDecisions"]["RSI"], "Strong Sell");
        assert!(json["decision"].is_string());
        assert!(json.get("latestSenkouSpanA").is_some());
    }

    #[test]
    fn empty_selection_is_neutral_whatever_the_data() {
        let rows = linear_rows(1, 60, 100.0);
        let config = PipelineConfig {
            selection: Selection::none(),
            ..PipelineConfig::default()
        };
        let result = pipeline::evaluate(&rows, &config).unwrap();
        assert_eq!(result.technicals.decision, Decision::Neutral);
        assert_eq!(result.technicals.score, 0.0);
    }
}

mod short_series {
    use super::*;

    #[test]
    fn forty_days_lenient_keeps_instrument_without_ichimoku() {
        let rows = linear_rows(3, 40, 100.0);
        let result = pipeline::evaluate(&rows, &lenient()).unwrap();
        let t = &result.technicals;

        assert_eq!(t.indicator_decisions[&IndicatorKind::Ichimoku], None);
        assert!(t.unavailable.contains_key(&IndicatorKind::Ichimoku));
        assert_eq!(t.latest.tenkan_sen, None);
        // the critical indicators all had enough history
        for kind in [
            IndicatorKind::Rsi,
            IndicatorKind::Macd,
            IndicatorKind::Adx,
            IndicatorKind::Supertrend,
        ] {
            assert!(t.indicator_decisions[&kind].is_some(), "{kind}");
        }
    }

    #[test]
    fn forty_days_full_mode_is_gated() {
        let rows = linear_rows(3, 40, 100.0);
        let err = pipeline::evaluate(&rows, &PipelineConfig::default()).unwrap_err();
        assert_eq!(
            err,
            SkipReason::InsufficientData {
                indicator: IndicatorScope::FullCoverage,
                need: 52,
                have: 40,
            }
        );
    }

    #[test]
    fn ten_days_produce_no_record() {
        let report = run_batch(linear_rows(4, 10, 50.0), &PipelineConfig::default());
        assert!(report.results.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].instrument_id, 4);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::InsufficientData { need: 52, have: 10, .. }
        ));
    }

    #[test]
    fn ten_days_lenient_skip_names_critical_indicator() {
        let err = pipeline::evaluate(&linear_rows(4, 10, 50.0), &lenient()).unwrap_err();
        assert!(matches!(
            err,
            SkipReason::InsufficientData {
                indicator: IndicatorScope::Indicator(_),
                have: 10,
                ..
            }
        ));
    }
}

mod batch_driver {
    use super::*;

    #[test]
    fn output_ascends_by_instrument_id() {
        let mut rows = wave_rows(30, 80);
        rows.extend(wave_rows(7, 80));
        rows.extend(linear_rows(19, 60, 20.0));

        let report = run_batch(rows, &PipelineConfig::default());
        let ids: Vec<i64> = report.results.iter().map(|r| r.instrument_id).collect();
        assert_eq!(ids, vec![7, 19, 30]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let mut rows = wave_rows(1, 90);
        rows.extend(wave_rows(2, 70));
        let first = run_batch(rows.clone(), &PipelineConfig::default());
        let second = run_batch(rows, &PipelineConfig::default());
        assert_eq!(first, second);
    }

    #[test]
    fn bad_instruments_are_skipped_not_fatal() {
        let mut nameless = wave_rows(2, 60);
        for row in &mut nameless {
            row.company_name = None;
        }
        let mut duplicated = wave_rows(3, 60);
        duplicated[10].date = duplicated[9].date;

        let mut rows = wave_rows(1, 60);
        rows.extend(nameless);
        rows.extend(duplicated);

        let report = run_batch(rows, &PipelineConfig::default());
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].instrument_id, 1);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::IdentityMissing {
                field: "company_name"
            }
        );
        assert!(matches!(
            report.skipped[1].reason,
            SkipReason::MalformedSeries { .. }
        ));
    }

    #[test]
    fn scan_pipeline_writes_through_report_port() {
        let data = MockDataPort::new()
            .with_rows(wave_rows(5, 70))
            .with_rows(linear_rows(6, 12, 10.0));
        let report_port = MockReportPort::new();

        let report = run_scan_pipeline(&data, &report_port, &settings(PipelineConfig::default()))
            .unwrap();

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        let scans = report_port.scans.borrow();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].0, report);
        assert_eq!(scans[0].1.as_deref(), Some("results.json"));
    }

    #[test]
    fn data_errors_surface_from_scan_pipeline() {
        let data = MockDataPort::new().with_error("connection refused");
        let report_port = MockReportPort::new();
        let err = run_scan_pipeline(&data, &report_port, &settings(PipelineConfig::default()))
            .unwrap_err();
        assert!(matches!(err, ScanError::Database { .. }));
        assert!(report_port.scans.borrow().is_empty());
    }
}

mod fundamentals_merge {
    use super::*;

    #[test]
    fn merge_fetches_only_requested_groups() {
        let data = MockDataPort::new()
            .with_rows(in_group(wave_rows(11, 60), 1))
            .with_rows(in_group(wave_rows(22, 60), 2))
            .with_rows(in_group(wave_rows(33, 60), 3))
            .with_fundamentals(fundamentals_row(3, 33))
            .with_fundamentals(fundamentals_row(1, 11));
        let report_port = MockReportPort::new();

        let merged = run_fundamentals_pipeline(&data, &report_port, &settings(lenient())).unwrap();

        assert_eq!(data.group_requests.borrow().as_slice(), &[vec![1, 3]]);
        let groups: Vec<i64> = merged.iter().map(|r| r.fundamentals.group_id).collect();
        assert_eq!(groups, vec![3, 1]);
        assert!(merged.iter().all(|r| r.technicals.is_some()));
        assert_eq!(report_port.fundamentals.borrow().len(), 1);
    }

    #[test]
    fn rows_without_history_are_kept_with_reason() {
        let data = MockDataPort::new()
            .with_rows(in_group(wave_rows(11, 60), 1))
            .with_fundamentals(fundamentals_row(1, 11))
            .with_fundamentals(fundamentals_row(9, 99));
        let report_port = MockReportPort::new();

        let merged = run_fundamentals_pipeline(&data, &report_port, &settings(lenient())).unwrap();

        assert_eq!(merged.len(), 2);
        assert!(merged[1].technicals.is_none());
        assert!(merged[1].skip_reason.is_some());

        let json = serde_json::to_value(&merged[0]).unwrap();
        assert_eq!(json["fincode"], 1);
        assert_eq!(json["pe_ratio"], 14.2);
        assert!(json["technicals"]["latestRSI"].is_number());
        assert!(json["skipReason"].is_null());
    }

    #[test]
    fn lenient_merge_keeps_forty_day_history() {
        let data = MockDataPort::new()
            .with_rows(in_group(linear_rows(11, 40, 30.0), 1))
            .with_fundamentals(fundamentals_row(1, 11));
        let report_port = MockReportPort::new();

        let merged = run_fundamentals_pipeline(&data, &report_port, &settings(lenient())).unwrap();
        let technicals = merged[0].technicals.as_ref().unwrap();
        assert_eq!(
            technicals.indicator_decisions[&IndicatorKind::Ichimoku],
            None
        );
    }
}

#[cfg(feature = "sqlite")]
mod sqlite_adapter_tests {
    use super::*;
    use stocksignals::adapters::sqlite_adapter::SqliteAdapter;

    fn seed_sqlite_adapter(rows: &[PriceRow]) -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter.insert_price_rows(rows).unwrap();
        adapter
    }

    #[test]
    fn scan_via_sqlite_matches_in_memory_batch() {
        let mut rows = wave_rows(8, 75);
        rows.extend(linear_rows(2, 60, 100.0));
        let adapter = seed_sqlite_adapter(&rows);
        let report_port = MockReportPort::new();

        let via_db =
            run_scan_pipeline(&adapter, &report_port, &settings(PipelineConfig::default()))
                .unwrap();
        let direct = run_batch(rows, &PipelineConfig::default());

        assert_eq!(via_db, direct);
        assert_eq!(via_db.results.len(), 2);
    }

    #[test]
    fn fundamentals_via_sqlite() {
        let adapter = seed_sqlite_adapter(&in_group(wave_rows(11, 60), 1));
        adapter
            .insert_fundamentals(&[fundamentals_row(1, 11), fundamentals_row(2, 22)])
            .unwrap();
        let report_port = MockReportPort::new();

        let merged = run_fundamentals_pipeline(&adapter, &report_port, &settings(lenient())).unwrap();
        assert_eq!(merged.len(), 2);
        assert!(merged[0].technicals.is_some());
        assert!(merged[1].technicals.is_none());
    }
}
