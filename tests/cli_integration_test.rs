//! CLI integration tests for the settings and check commands.
//!
//! Tests cover:
//! - Settings resolution from INI files on disk
//! - Check over real CSV files (shape, OHLCV summary, validation overrides)
//! - Exit codes for each failure category

mod common;

use clap::Parser;
use common::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tradeguard::adapters::memory_sink::MemorySink;
use tradeguard::cli::{self, Cli, Command};
use tradeguard::domain::cache::CacheStore;
use tradeguard::domain::error::{DataErrorKind, ErrorKind};
use tradeguard::domain::settings::ResilienceSettings;

fn fast_settings() -> ResilienceSettings {
    let ini = write_temp_ini(FAST_RETRY_INI);
    cli::resolve_settings(Some(&ini.path().to_path_buf())).unwrap()
}

mod settings {
    use super::*;

    #[test]
    fn defaults_without_config() {
        let settings = cli::resolve_settings(None).unwrap();
        assert_eq!(settings, ResilienceSettings::default());
    }

    #[test]
    fn reads_config_file() {
        let settings = fast_settings();
        assert_eq!(settings.cache_ttl, Duration::from_secs(60));
        assert_eq!(settings.cache_capacity, 16);
        assert_eq!(settings.retry.base_delay(), Duration::ZERO);
    }

    #[test]
    fn format_lists_every_key() {
        let text = cli::format_settings(&ResilienceSettings::default());
        assert!(text.contains("cache.ttl_seconds = 300"));
        assert!(text.contains("cache.max_entries = 1000"));
        assert!(text.contains("retry.max_attempts = 3"));
        assert!(text.contains("retry.backoff_factor = 2"));
        assert!(text.contains("validation.min_rows = 1"));
    }

    #[test]
    fn invalid_value_is_configuration_error() {
        let ini = write_temp_ini("[retry]\nmax_attempts = 0\n");
        let err = cli::resolve_settings(Some(&ini.path().to_path_buf())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.exit_status(), 2);
    }

    #[test]
    fn missing_config_file_exits_2() {
        let args = Cli::parse_from(["tradeguard", "settings", "--config", "/nonexistent/x.ini"]);
        assert_eq!(cli::execute(args).unwrap_err().exit_status(), 2);
    }
}

mod check {
    use super::*;

    fn ohlcv_csv(dir: &TempDir, count: usize) -> PathBuf {
        let csv = frame_to_csv(&generate_ohlcv_frame("2024-01-01", count, 100.0));
        write_csv(dir.path(), "BHP_ASX.csv", &csv)
    }

    #[test]
    fn reports_shape_and_ohlcv_summary() {
        let dir = TempDir::new().unwrap();
        let path = ohlcv_csv(&dir, 4);
        let sink = Arc::new(MemorySink::new());

        let summary = cli::check(
            &path,
            &fast_settings(),
            Arc::new(CacheStore::new(16)),
            sink.clone(),
        )
        .unwrap();

        assert_eq!(summary.rows, 4);
        assert_eq!(summary.columns.len(), 6);
        assert_eq!(summary.date_range, Some((date(2024, 1, 1), date(2024, 1, 4))));
        // typical price is (close + 1 + close - 2 + close) / 3 = close - 1/3
        approx::assert_relative_eq!(
            summary.mean_typical_price.unwrap(),
            101.5 - 1.0 / 3.0,
            epsilon = 1e-9
        );
        let operations: Vec<String> = sink.records().into_iter().map(|r| r.operation).collect();
        assert_eq!(operations, vec!["load_frame", "check_frame"]);
    }

    #[test]
    fn non_ohlcv_table_has_no_summary() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "signals.csv", "symbol,score\nBHP,0.4\nCBA,0.9\n");
        let summary = cli::check(
            &path,
            &fast_settings(),
            Arc::new(CacheStore::new(16)),
            Arc::new(MemorySink::new()),
        )
        .unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.date_range, None);
        assert_eq!(summary.mean_typical_price, None);
    }

    #[test]
    fn repeated_check_reads_from_cache() {
        let dir = TempDir::new().unwrap();
        let path = ohlcv_csv(&dir, 3);
        let store = Arc::new(CacheStore::new(16));
        let settings = fast_settings();

        cli::check(&path, &settings, store.clone(), Arc::new(MemorySink::new())).unwrap();
        std::fs::remove_file(&path).unwrap();
        let summary =
            cli::check(&path, &settings, store.clone(), Arc::new(MemorySink::new())).unwrap();

        assert_eq!(summary.rows, 3);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let dir = TempDir::new().unwrap();
        let path = ohlcv_csv(&dir, 3);
        let store = Arc::new(CacheStore::new(16));
        let mut settings = fast_settings();
        settings.cache_enabled = false;

        cli::check(&path, &settings, store.clone(), Arc::new(MemorySink::new())).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn largest_configured_ttl_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = ohlcv_csv(&dir, 3);
        let ini = write_temp_ini(&format!(
            "[cache]\nttl_seconds = {}\n\n[retry]\nbase_delay_seconds = 0\n",
            i64::MAX
        ));
        let settings = cli::resolve_settings(Some(&ini.path().to_path_buf())).unwrap();
        assert_eq!(settings.cache_ttl, Duration::from_secs(i64::MAX as u64));

        let store = Arc::new(CacheStore::new(16));
        cli::check(&path, &settings, store.clone(), Arc::new(MemorySink::new())).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_file_is_retried_then_source_error() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::new());
        let err = cli::check(
            &dir.path().join("missing.csv"),
            &fast_settings(),
            Arc::new(CacheStore::new(16)),
            sink.clone(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Data(DataErrorKind::Source));
        assert_eq!(err.exit_status(), 3);
        assert_eq!(sink.failures(), 3);
    }

    #[test]
    fn validation_rule_rejects_short_table() {
        let dir = TempDir::new().unwrap();
        let path = ohlcv_csv(&dir, 3);
        let mut settings = fast_settings();
        settings.validation.min_rows = 5;
        settings.validation.required_columns = vec!["close".into(), "vwap".into()];

        let err = cli::check(
            &path,
            &settings,
            Arc::new(CacheStore::new(16)),
            Arc::new(MemorySink::new()),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Data(DataErrorKind::Validation));
        assert!(err.message().contains("vwap"));
        assert!(err.message().contains("3 rows, need at least 5"));
        assert_eq!(err.exit_status(), 4);
    }

    #[test]
    fn rejected_table_is_loaded_once() {
        let dir = TempDir::new().unwrap();
        let path = ohlcv_csv(&dir, 2);
        let sink = Arc::new(MemorySink::new());
        let mut settings = fast_settings();
        settings.validation.min_rows = 3;

        let err = cli::check(&path, &settings, Arc::new(CacheStore::new(16)), sink.clone())
            .unwrap_err();

        assert_eq!(err.exit_status(), 4);
        let records = sink.records();
        let operations: Vec<&str> = records.iter().map(|r| r.operation.as_str()).collect();
        assert_eq!(operations, vec!["load_frame", "check_frame"]);
        assert!(records[0].is_success());
        assert_eq!(sink.failures(), 1);
    }

    #[test]
    fn command_line_overrides_validation() {
        let dir = TempDir::new().unwrap();
        let path = ohlcv_csv(&dir, 3);
        let ini = write_temp_ini(FAST_RETRY_INI);

        let ok = Cli::parse_from([
            "tradeguard",
            "check",
            "--file",
            path.to_str().unwrap(),
            "--require",
            "date,close",
            "--config",
            ini.path().to_str().unwrap(),
        ]);
        assert!(cli::execute(ok).is_ok());

        let short = Cli::parse_from([
            "tradeguard",
            "check",
            "--file",
            path.to_str().unwrap(),
            "--min-rows",
            "10",
            "--config",
            ini.path().to_str().unwrap(),
        ]);
        assert_eq!(cli::execute(short).unwrap_err().exit_status(), 4);
    }

    #[test]
    fn require_flag_splits_on_commas() {
        let args = Cli::parse_from(["tradeguard", "check", "-f", "x.csv", "--require", "a,b,c"]);
        match args.command {
            Command::Check { require, min_rows, .. } => {
                assert_eq!(require, vec!["a", "b", "c"]);
                assert_eq!(min_rows, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
