// crates/alert-core/tests/alert_scenarios.rs
use std::time::Duration;

use alert_core::{
    evaluate, AlertEvent, AlertState, Command, ConfigStore, CyclePlan, Evaluation, Scheduler,
    Ticker, TradingWindow,
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn ticker(s: &str) -> Ticker {
    Ticker::parse(s).unwrap()
}

fn fresh_store(dir: &TempDir) -> ConfigStore {
    ConfigStore::open(dir.path().join("config.json"), None).unwrap()
}

/// One observation the way the monitor does it: evaluate, deliver, mark fired.
fn observe(store: &mut ConfigStore, symbol: &str, price: Decimal) -> Option<AlertEvent> {
    let t = ticker(symbol);
    let limit = store.get_threshold(t.as_str())?;
    match evaluate(&t, limit, store.get_alert_state(t.as_str()), price) {
        Evaluation::Crossed(event) => {
            store.mark_fired(t.as_str()).unwrap();
            Some(event)
        }
        Evaluation::Below | Evaluation::AlreadyFired => None,
    }
}

fn local(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, d)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

#[test]
fn price_sequence_fires_exactly_once_at_the_limit() {
    let dir = TempDir::new().unwrap();
    let mut store = fresh_store(&dir);
    store.set_threshold(ticker("XYZ"), dec!(65.00)).unwrap();

    let prices = [dec!(60.00), dec!(64.99), dec!(65.00), dec!(70.00)];
    let fired: Vec<(usize, AlertEvent)> = prices
        .iter()
        .enumerate()
        .filter_map(|(i, p)| observe(&mut store, "XYZ", *p).map(|e| (i, e)))
        .collect();

    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].0, 2);
    assert_eq!(fired[0].1.price, dec!(65.00));
    assert_eq!(store.get_alert_state("XYZ"), AlertState::Fired);
}

#[test]
fn adding_twice_keeps_latest_limit_and_rearms() {
    let dir = TempDir::new().unwrap();
    let mut store = fresh_store(&dir);

    store
        .apply(Command::SetThreshold {
            ticker: ticker("ABC"),
            limit: dec!(40.0),
        })
        .unwrap();
    observe(&mut store, "ABC", dec!(45)).unwrap();
    store
        .apply(Command::SetThreshold {
            ticker: ticker("ABC"),
            limit: dec!(50.0),
        })
        .unwrap();

    assert_eq!(store.get_threshold("ABC"), Some(dec!(50.0)));
    assert_eq!(store.get_alert_state("ABC"), AlertState::Armed);
}

#[test]
fn explicit_reset_rearms_and_fires_again() {
    let dir = TempDir::new().unwrap();
    let mut store = fresh_store(&dir);
    store.set_threshold(ticker("XYZ"), dec!(10)).unwrap();

    assert!(observe(&mut store, "XYZ", dec!(11)).is_some());
    assert!(observe(&mut store, "XYZ", dec!(12)).is_none());

    store.apply(Command::ResetAlerts).unwrap();
    assert!(observe(&mut store, "XYZ", dec!(12)).is_some());
}

#[test]
fn window_close_rearms_fired_ticker() {
    let dir = TempDir::new().unwrap();
    let mut store = fresh_store(&dir);
    store.set_threshold(ticker("XYZ"), dec!(65)).unwrap();

    let mut scheduler = Scheduler::new(
        Some(TradingWindow::default()),
        Duration::from_secs(600),
        Duration::from_secs(300),
    );

    // Monday session: fires once.
    assert!(matches!(scheduler.plan(local(3, 15, 0)), CyclePlan::Poll { .. }));
    assert!(observe(&mut store, "XYZ", dec!(66)).is_some());
    assert_eq!(store.get_alert_state("XYZ"), AlertState::Fired);

    // Market close.
    match scheduler.plan(local(3, 17, 0)) {
        CyclePlan::Idle { reset_alerts, .. } => {
            assert!(reset_alerts);
            store.reset_all_alerts().unwrap();
        }
        other => panic!("expected idle plan, got {other:?}"),
    }
    assert_eq!(store.get_alert_state("XYZ"), AlertState::Armed);

    // Tuesday session: fires again.
    assert!(matches!(scheduler.plan(local(4, 10, 0)), CyclePlan::Poll { .. }));
    assert!(observe(&mut store, "XYZ", dec!(65)).is_some());
}

#[test]
fn removed_ticker_is_gone_from_listing_and_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    {
        let mut store = ConfigStore::open(&path, Some((ticker("VALE3.SA"), dec!(65.0)))).unwrap();
        store.set_threshold(ticker("PETR4.SA"), dec!(40)).unwrap();
        store
            .apply(Command::Remove {
                ticker: ticker("VALE3.SA"),
            })
            .unwrap();
    }

    let store = ConfigStore::open(&path, None).unwrap();
    let rows = store.list();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ticker, ticker("PETR4.SA"));
    assert_eq!(store.get_alert_state("VALE3.SA"), AlertState::Armed);
}
