use std::time::Duration;

use finch_core::config::FinchConfig;

use super::{parse, try_parse};

#[test]
fn flags_default_to_unset() {
    let cli = parse(&["finch", "schedule"]);
    assert_eq!(cli.min_download_period, None);
    assert!(!cli.ignore_pending_download);
}

#[test]
fn min_download_period_flag_with_equals() {
    let cli = parse(&["finch", "--finch-seed-min-download-period=0", "schedule"]);
    assert_eq!(cli.min_download_period, Some(0));
    let settings = FinchConfig::default().fetcher_settings(&cli.flag_overrides());
    assert_eq!(settings.min_download_period, Duration::ZERO);
}

#[test]
fn flags_are_accepted_after_the_command() {
    let cli = parse(&[
        "finch",
        "run",
        "--once",
        "--finch-seed-ignore-pending-download",
        "--finch-seed-min-download-period",
        "5000",
    ]);
    assert!(cli.ignore_pending_download);
    assert_eq!(cli.min_download_period, Some(5000));
    let settings = FinchConfig::default().fetcher_settings(&cli.flag_overrides());
    assert!(settings.ignore_pending_download);
    assert_eq!(settings.min_download_period, Duration::from_millis(5000));
}

#[test]
fn bad_period_is_rejected() {
    assert!(try_parse(&["finch", "--finch-seed-min-download-period=soon", "schedule"]).is_err());
}
