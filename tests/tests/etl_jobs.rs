//! Scheduler behavior: manual runs, retries, dependency gating, the
//! concurrency guard, and shutdown cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use agro_etl::{EtlJobConfig, EtlScheduler, JobTrigger, RunStatus, SchedulerConfig};
use agro_pipeline::IngestRequest;
use integration_tests::{fixtures, setup::TestContext};

fn weather_job(id: &str) -> EtlJobConfig {
    let mut config = EtlJobConfig::new(
        id,
        IngestRequest {
            source: "noaa".into(),
            operation: "current".into(),
            params: fixtures::station_params("KORD"),
        },
        JobTrigger::IntervalMinutes(10),
    );
    config.retry_delay_secs = 0;
    config
}

fn market_job(id: &str) -> EtlJobConfig {
    let mut config = EtlJobConfig::new(
        id,
        IngestRequest {
            source: "cme".into(),
            operation: "quote".into(),
            params: fixtures::commodity_params("ZC"),
        },
        JobTrigger::IntervalMinutes(10),
    );
    config.retry_delay_secs = 0;
    config
}

#[tokio::test]
async fn manual_run_records_success() {
    let ctx = TestContext::new();
    ctx.service.register_job(weather_job("wx-current")).unwrap();

    let run = ctx.service.run_job_now("wx-current").await.unwrap();
    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(run.attempt, 0);
    assert!(run.quality_score.is_some());
    assert_eq!(run.cache_hit, Some(false));

    let status = ctx.service.job_status("wx-current").unwrap();
    assert_eq!(status.total_runs, 1);
    assert!(!status.running);
    assert_eq!(ctx.service.job_history("wx-current").len(), 1);
}

#[tokio::test]
async fn exhausted_retries_mark_the_run_failed() {
    let ctx = TestContext::new();
    ctx.weather.always_fail();

    let mut job = weather_job("wx-current");
    job.retries = 2;
    ctx.service.register_job(job).unwrap();

    let run = ctx.service.run_job_now("wx-current").await.unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.attempt, 2, "last attempt index after two retries");
    assert!(run.error.is_some());
    assert_eq!(ctx.weather.call_count(), 3, "initial attempt plus two retries");
}

#[tokio::test]
async fn transient_failure_recovers_within_retries() {
    let ctx = TestContext::new();
    ctx.weather.fail_times(1);

    let mut job = weather_job("wx-current");
    job.retries = 2;
    ctx.service.register_job(job).unwrap();

    let run = ctx.service.run_job_now("wx-current").await.unwrap();
    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(run.attempt, 1);
    assert_eq!(ctx.weather.call_count(), 2);
}

#[tokio::test]
async fn validation_failures_are_not_retried() {
    let ctx = TestContext::new();
    ctx.weather.set_record(fixtures::implausible_weather_record());

    let mut job = weather_job("wx-current");
    job.retries = 2;
    ctx.service.register_job(job).unwrap();

    let run = ctx.service.run_job_now("wx-current").await.unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(
        ctx.weather.call_count(),
        1,
        "bad data does not improve on retry"
    );
}

#[tokio::test]
async fn disabled_job_does_not_run() {
    let ctx = TestContext::new();
    ctx.service.register_job(weather_job("wx-current")).unwrap();
    ctx.service.disable_job("wx-current").unwrap();

    let run = ctx.service.run_job_now("wx-current").await.unwrap();
    assert_eq!(run.status, RunStatus::Skipped);
    assert_eq!(ctx.weather.call_count(), 0);

    ctx.service.enable_job("wx-current").unwrap();
    let run = ctx.service.run_job_now("wx-current").await.unwrap();
    assert_eq!(run.status, RunStatus::Success);
}

#[tokio::test]
async fn dependency_gates_and_then_triggers() {
    let ctx = TestContext::new();
    ctx.service.register_job(weather_job("wx-current")).unwrap();
    let mut dependent = market_job("market-sync");
    dependent.depends_on = vec!["wx-current".into()];
    ctx.service.register_job(dependent).unwrap();

    // Prerequisite has never succeeded: skip, recorded in history.
    let run = ctx.service.run_job_now("market-sync").await.unwrap();
    assert_eq!(run.status, RunStatus::Skipped);
    assert_eq!(ctx.market.call_count(), 0);

    // Run the prerequisite; its success fires the dependent.
    let run = ctx.service.run_job_now("wx-current").await.unwrap();
    assert_eq!(run.status, RunStatus::Success);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let history = ctx.service.job_history("market-sync");
    assert!(
        history.iter().any(|r| r.status == RunStatus::Success),
        "dependent must run after its prerequisite succeeds"
    );
}

#[tokio::test]
async fn unknown_dependency_is_rejected_at_registration() {
    let ctx = TestContext::new();
    let mut job = weather_job("wx-current");
    job.depends_on = vec!["nope".into()];
    assert!(ctx.service.register_job(job).is_err());
}

#[tokio::test]
async fn duplicate_job_id_is_rejected() {
    let ctx = TestContext::new();
    ctx.service.register_job(weather_job("wx-current")).unwrap();
    assert!(ctx.service.register_job(weather_job("wx-current")).is_err());
}

#[tokio::test]
async fn concurrency_guard_collapses_overlapping_runs() {
    let ctx = TestContext::new();
    ctx.weather.set_delay(Duration::from_millis(300));
    ctx.service.register_job(weather_job("wx-current")).unwrap();

    let service = ctx.service.clone();
    let first = tokio::spawn(async move { service.run_job_now("wx-current").await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = ctx.service.run_job_now("wx-current").await.unwrap();
    assert_eq!(second.status, RunStatus::Skipped);

    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status, RunStatus::Success);
    assert_eq!(ctx.weather.call_count(), 1);
}

#[tokio::test]
async fn shutdown_cancels_an_inflight_run() {
    let ctx = TestContext::new();
    ctx.weather.set_delay(Duration::from_secs(30));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Arc::new(EtlScheduler::new(
        ctx.service.pipeline().clone(),
        SchedulerConfig::default(),
        shutdown_rx,
    ));
    scheduler.register_job(weather_job("wx-slow")).unwrap();

    let runner = scheduler.clone();
    let handle = tokio::spawn(async move { runner.run_job_now("wx-slow").await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    shutdown_tx.send(true).unwrap();
    let run = handle.await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Cancelled);

    let history = scheduler.history("wx-slow");
    assert_eq!(history.last().unwrap().status, RunStatus::Cancelled);
}

#[tokio::test]
async fn stop_waits_for_inflight_runs_to_record_their_outcome() {
    let ctx = TestContext::new();
    ctx.weather.set_delay(Duration::from_secs(30));
    ctx.service.register_job(weather_job("wx-slow")).unwrap();

    ctx.service.start();
    // First tick fires immediately; let the run reach its fetch.
    tokio::time::sleep(Duration::from_millis(200)).await;
    ctx.service.stop().await;

    let history = ctx.service.job_history("wx-slow");
    assert_eq!(
        history.last().map(|r| r.status),
        Some(RunStatus::Cancelled),
        "a run in flight at shutdown must leave a cancelled record"
    );
}

#[tokio::test]
async fn scheduler_tick_runs_due_jobs() {
    let ctx = TestContext::new();
    ctx.service.register_job(weather_job("wx-current")).unwrap();

    ctx.service.start();
    // The first tick fires immediately; give the spawned run a moment.
    tokio::time::sleep(Duration::from_millis(200)).await;
    ctx.service.stop().await;

    let history = ctx.service.job_history("wx-current");
    assert!(
        history.iter().any(|r| r.status == RunStatus::Success),
        "interval job with no prior run is due on the first tick"
    );
}
