//! Configuration validation and the typed settings built from it.
//!
//! Every key is optional and falls back to the documented default; a value
//! that is present but unusable is rejected with `ConfigInvalid`.

use std::path::PathBuf;

use crate::domain::aggregate::Selection;
use crate::domain::error::ScanError;
use crate::domain::indicator::params::IndicatorParams;
use crate::domain::indicator::vwap::VwapBandMode;
use crate::domain::indicator::MaKind;
use crate::domain::pipeline::{PipelineConfig, PipelineMode};
use crate::ports::config_port::ConfigPort;

/// Where price and fundamentals rows are read from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Csv {
        prices_path: PathBuf,
        fundamentals_path: Option<PathBuf>,
    },
    /// Connection details stay in the `[sqlite]` section.
    Sqlite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    pub source: DataSource,
    pub pipeline: PipelineConfig,
    /// Worker threads; `0` means the rayon default.
    pub threads: usize,
    pub output_path: Option<String>,
    pub pretty: bool,
}

pub fn validate_scan_config(config: &dyn ConfigPort) -> Result<(), ScanError> {
    data_source_from_config(config)?;
    indicator_params_from_config(config)?;
    mode_from_config(config, PipelineMode::Full)?;
    validate_threads(config)?;
    Ok(())
}

/// Settings for a run; `default_mode` applies when `[scan] mode` is unset.
pub fn scan_settings_from_config(
    config: &dyn ConfigPort,
    default_mode: PipelineMode,
) -> Result<ScanSettings, ScanError> {
    Ok(ScanSettings {
        source: data_source_from_config(config)?,
        pipeline: PipelineConfig {
            params: indicator_params_from_config(config)?,
            selection: selection_from_config(config),
            mode: mode_from_config(config, default_mode)?,
        },
        threads: validate_threads(config)?,
        output_path: config.get_string("output", "path"),
        pretty: config.get_bool("output", "pretty", true),
    })
}

pub fn data_source_from_config(config: &dyn ConfigPort) -> Result<DataSource, ScanError> {
    let source = config.get_string_or("data", "source", "csv");

    match source.to_lowercase().as_str() {
        "csv" => {
            let prices_path =
                config
                    .get_string("data", "prices_path")
                    .ok_or_else(|| ScanError::ConfigMissing {
                        section: "data".to_string(),
                        key: "prices_path".to_string(),
                    })?;
            Ok(DataSource::Csv {
                prices_path: PathBuf::from(prices_path),
                fundamentals_path: config.get_string("data", "fundamentals_path").map(PathBuf::from),
            })
        }
        "sqlite" => {
            if !cfg!(feature = "sqlite") {
                return Err(ScanError::invalid(
                    "data",
                    "source",
                    "built without sqlite support",
                ));
            }
            if config.get_string("sqlite", "path").is_none() {
                return Err(ScanError::ConfigMissing {
                    section: "sqlite".to_string(),
                    key: "path".to_string(),
                });
            }
            Ok(DataSource::Sqlite)
        }
        other => Err(ScanError::invalid(
            "data",
            "source",
            format!("unknown data source {other} (expected csv or sqlite)"),
        )),
    }
}

/// `[scan] indicators`, or every indicator when unset.
pub fn selection_from_config(config: &dyn ConfigPort) -> Selection {
    config
        .get_string("scan", "indicators")
        .map_or_else(Selection::all, |list| Selection::parse_list(&list))
}

pub fn mode_from_config(
    config: &dyn ConfigPort,
    default: PipelineMode,
) -> Result<PipelineMode, ScanError> {
    match config.get_string("scan", "mode") {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|reason: String| ScanError::invalid("scan", "mode", reason)),
    }
}

fn validate_threads(config: &dyn ConfigPort) -> Result<usize, ScanError> {
    let value = config.get_int("scan", "threads", 0);
    usize::try_from(value)
        .map_err(|_| ScanError::invalid("scan", "threads", "threads must be non-negative"))
}

pub fn indicator_params_from_config(
    config: &dyn ConfigPort,
) -> Result<IndicatorParams, ScanError> {
    let d = IndicatorParams::default();
    let params = IndicatorParams {
        rsi_period: period(config, "rsi_period", d.rsi_period)?,
        ema_period: period(config, "ema_period", d.ema_period)?,
        sma_period: period(config, "sma_period", d.sma_period)?,
        macd_fast: period(config, "macd_fast", d.macd_fast)?,
        macd_slow: period(config, "macd_slow", d.macd_slow)?,
        macd_signal: period(config, "macd_signal", d.macd_signal)?,
        macd_source_ma: ma_kind(config, "macd_source_ma", d.macd_source_ma)?,
        macd_signal_ma: ma_kind(config, "macd_signal_ma", d.macd_signal_ma)?,
        adx_di_length: period(config, "adx_di_length", d.adx_di_length)?,
        adx_length: period(config, "adx_length", d.adx_length)?,
        supertrend_atr_period: period(config, "supertrend_atr_period", d.supertrend_atr_period)?,
        supertrend_factor: multiplier(config, "supertrend_factor", d.supertrend_factor)?,
        bollinger_length: period(config, "bollinger_length", d.bollinger_length)?,
        bollinger_ma: ma_kind(config, "bollinger_ma", d.bollinger_ma)?,
        bollinger_mult: multiplier(config, "bollinger_mult", d.bollinger_mult)?,
        vwap_band_mode: band_mode(config, d.vwap_band_mode)?,
        vwap_band_mults: [
            multiplier(config, "vwap_band_mult_1", d.vwap_band_mults[0])?,
            multiplier(config, "vwap_band_mult_2", d.vwap_band_mults[1])?,
            multiplier(config, "vwap_band_mult_3", d.vwap_band_mults[2])?,
        ],
        williams_length: period(config, "williams_length", d.williams_length)?,
        psar_start: multiplier(config, "psar_start", d.psar_start)?,
        psar_increment: config.get_double("indicators", "psar_increment", d.psar_increment),
        psar_max: multiplier(config, "psar_max", d.psar_max)?,
        ichimoku_conversion: period(config, "ichimoku_conversion", d.ichimoku_conversion)?,
        ichimoku_base: period(config, "ichimoku_base", d.ichimoku_base)?,
        ichimoku_span_b: period(config, "ichimoku_span_b", d.ichimoku_span_b)?,
        ichimoku_displacement: period(config, "ichimoku_displacement", d.ichimoku_displacement)?,
        atr_period: period(config, "atr_period", d.atr_period)?,
    };
    validate_psar(&params)?;
    Ok(params)
}

fn period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, ScanError> {
    let value = config.get_int("indicators", key, default as i64);
    if value < 1 {
        return Err(ScanError::invalid(
            "indicators",
            key,
            format!("{key} must be at least 1"),
        ));
    }
    Ok(value as usize)
}

fn multiplier(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, ScanError> {
    let value = config.get_double("indicators", key, default);
    if !value.is_finite() || value <= 0.0 {
        return Err(ScanError::invalid(
            "indicators",
            key,
            format!("{key} must be positive"),
        ));
    }
    Ok(value)
}

fn ma_kind(config: &dyn ConfigPort, key: &str, default: MaKind) -> Result<MaKind, ScanError> {
    match config.get_string("indicators", key) {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|reason: String| ScanError::invalid("indicators", key, reason)),
    }
}

fn band_mode(config: &dyn ConfigPort, default: VwapBandMode) -> Result<VwapBandMode, ScanError> {
    match config.get_string("indicators", "vwap_band_mode") {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|reason: String| ScanError::invalid("indicators", "vwap_band_mode", reason)),
    }
}

fn validate_psar(params: &IndicatorParams) -> Result<(), ScanError> {
    if !params.psar_increment.is_finite() || params.psar_increment < 0.0 {
        return Err(ScanError::invalid(
            "indicators",
            "psar_increment",
            "psar_increment must be non-negative",
        ));
    }
    if params.psar_start > params.psar_max {
        return Err(ScanError::invalid(
            "indicators",
            "psar_start",
            "psar_start must not exceed psar_max",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::indicator::IndicatorKind;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const CSV_SOURCE: &str = "[data]\nsource = csv\nprices_path = prices.csv\n";

    fn invalid_key(err: ScanError) -> String {
        match err {
            ScanError::ConfigInvalid { key, .. } => key,
            other => panic!("expected ConfigInvalid, got: {other}"),
        }
    }

    #[test]
    fn valid_scan_config_passes() {
        let config = make_config(
            r#"
[data]
source = csv
prices_path = /data/prices.csv
fundamentals_path = /data/fundamentals.csv

[scan]
mode = lenient
indicators = RSI, MACD, Ichimoku
threads = 4

[indicators]
rsi_period = 21
bollinger_ma = EMA
vwap_band_mode = percent

[output]
path = out/results.json
pretty = false
"#,
        );
        assert!(validate_scan_config(&config).is_ok());

        let settings = scan_settings_from_config(&config, PipelineMode::Full).unwrap();
        assert_eq!(
            settings.source,
            DataSource::Csv {
                prices_path: PathBuf::from("/data/prices.csv"),
                fundamentals_path: Some(PathBuf::from("/data/fundamentals.csv")),
            }
        );
        assert_eq!(settings.pipeline.mode, PipelineMode::Lenient);
        assert_eq!(settings.pipeline.selection.len(), 3);
        assert!(settings.pipeline.selection.contains(IndicatorKind::Ichimoku));
        assert_eq!(settings.pipeline.params.rsi_period, 21);
        assert_eq!(settings.pipeline.params.bollinger_ma, MaKind::Ema);
        assert_eq!(settings.pipeline.params.vwap_band_mode, VwapBandMode::Percent);
        assert_eq!(settings.threads, 4);
        assert_eq!(settings.output_path.as_deref(), Some("out/results.json"));
        assert!(!settings.pretty);
    }

    #[test]
    fn defaults_apply_when_sections_are_absent() {
        let config = make_config(CSV_SOURCE);
        let settings = scan_settings_from_config(&config, PipelineMode::Lenient).unwrap();
        assert_eq!(settings.pipeline.params, IndicatorParams::default());
        assert_eq!(settings.pipeline.selection, Selection::all());
        assert_eq!(settings.pipeline.mode, PipelineMode::Lenient);
        assert_eq!(settings.threads, 0);
        assert_eq!(settings.output_path, None);
        assert!(settings.pretty);
    }

    #[test]
    fn missing_prices_path_fails() {
        let config = make_config("[data]\nsource = csv\n");
        let err = validate_scan_config(&config).unwrap_err();
        assert!(
            matches!(err, ScanError::ConfigMissing { section, key } if section == "data" && key == "prices_path")
        );
    }

    #[test]
    fn unknown_source_fails() {
        let config = make_config("[data]\nsource = parquet\n");
        assert_eq!(invalid_key(validate_scan_config(&config).unwrap_err()), "source");
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_source_requires_path() {
        let config = make_config("[data]\nsource = sqlite\n");
        let err = validate_scan_config(&config).unwrap_err();
        assert!(
            matches!(err, ScanError::ConfigMissing { section, key } if section == "sqlite" && key == "path")
        );

        let config = make_config("[data]\nsource = SQLite\n[sqlite]\npath = stocks.db\n");
        assert_eq!(data_source_from_config(&config).unwrap(), DataSource::Sqlite);
    }

    #[test]
    fn unknown_mode_fails() {
        let config = make_config(&format!("{CSV_SOURCE}[scan]\nmode = strict\n"));
        assert_eq!(invalid_key(validate_scan_config(&config).unwrap_err()), "mode");
    }

    #[test]
    fn negative_threads_fails() {
        let config = make_config(&format!("{CSV_SOURCE}[scan]\nthreads = -2\n"));
        assert_eq!(invalid_key(validate_scan_config(&config).unwrap_err()), "threads");
    }

    #[test]
    fn zero_period_fails() {
        let config = make_config(&format!("{CSV_SOURCE}[indicators]\nema_period = 0\n"));
        assert_eq!(invalid_key(validate_scan_config(&config).unwrap_err()), "ema_period");
    }

    #[test]
    fn non_positive_multiplier_fails() {
        let config = make_config(&format!("{CSV_SOURCE}[indicators]\nbollinger_mult = -1\n"));
        assert_eq!(
            invalid_key(validate_scan_config(&config).unwrap_err()),
            "bollinger_mult"
        );

        let config = make_config(&format!("{CSV_SOURCE}[indicators]\nvwap_band_mult_2 = 0\n"));
        assert_eq!(
            invalid_key(validate_scan_config(&config).unwrap_err()),
            "vwap_band_mult_2"
        );
    }

    #[test]
    fn unknown_moving_average_fails() {
        let config = make_config(&format!("{CSV_SOURCE}[indicators]\nmacd_signal_ma = HMA\n"));
        assert_eq!(
            invalid_key(validate_scan_config(&config).unwrap_err()),
            "macd_signal_ma"
        );
    }

    #[test]
    fn unknown_band_mode_fails() {
        let config = make_config(&format!("{CSV_SOURCE}[indicators]\nvwap_band_mode = atr\n"));
        assert_eq!(
            invalid_key(validate_scan_config(&config).unwrap_err()),
            "vwap_band_mode"
        );
    }

    #[test]
    fn psar_start_above_max_fails() {
        let config = make_config(&format!(
            "{CSV_SOURCE}[indicators]\npsar_start = 0.3\npsar_max = 0.2\n"
        ));
        assert_eq!(invalid_key(validate_scan_config(&config).unwrap_err()), "psar_start");
    }

    #[test]
    fn negative_psar_increment_fails() {
        let config = make_config(&format!("{CSV_SOURCE}[indicators]\npsar_increment = -0.01\n"));
        assert_eq!(
            invalid_key(validate_scan_config(&config).unwrap_err()),
            "psar_increment"
        );
    }

    #[test]
    fn unknown_indicator_names_are_dropped_from_selection() {
        let config = make_config("[scan]\nindicators = RSI, OBV, psar\n");
        let selection = selection_from_config(&config);
        assert_eq!(
            selection,
            Selection::from_kinds([IndicatorKind::Rsi, IndicatorKind::Psar])
        );
    }
}
