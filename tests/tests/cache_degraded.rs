//! Fail-open behavior when the remote cache tier is unavailable, plus
//! health reporting for both degradation paths.

use agro_core::{DataCategory, SourceConfig};
use agro_service::{IngestionService, ServiceConfig};
use agro_telemetry::HealthStatus;
use integration_tests::{fixtures, mocks::MockAdapter, setup::TestContext};

#[tokio::test]
async fn remote_outage_is_fail_open() {
    let ctx = TestContext::new();
    ctx.remote.set_failing(true);

    let params = fixtures::station_params("KORD");
    let first = ctx.service.ingest("noaa", "current", &params).await;
    assert!(
        first.success,
        "remote outage must not fail ingestion: {:?}",
        first.error
    );

    // L1 still serves repeats while the remote tier is down.
    let second = ctx.service.ingest("noaa", "current", &params).await;
    assert!(second.cache_hit);
    assert_eq!(ctx.weather.call_count(), 1);
}

#[tokio::test]
async fn l2_hit_survives_process_restart() {
    let ctx = TestContext::new();
    let params = fixtures::station_params("KORD");
    ctx.service.ingest("noaa", "current", &params).await;
    assert!(!ctx.remote.is_empty(), "write-through must reach the remote tier");

    // A fresh service over the same remote store models a restarted
    // process with a cold L1.
    let restarted = IngestionService::with_remote(ServiceConfig::default(), ctx.remote.clone());
    let adapter = MockAdapter::new(fixtures::weather_record());
    restarted
        .register_source(
            SourceConfig::new("noaa", DataCategory::Weather),
            adapter.clone(),
        )
        .unwrap();

    let result = restarted.ingest("noaa", "current", &params).await;
    assert!(result.success);
    assert!(result.cache_hit, "expected an L2 hit after restart");
    assert_eq!(adapter.call_count(), 0);
}

// The health registry is process-global, so all health transitions are
// exercised in one sequential test.
#[tokio::test]
async fn health_reflects_remote_and_source_state() {
    let ctx = TestContext::new();

    let report = ctx.service.health_check().await;
    assert_eq!(report.status, HealthStatus::Healthy);

    // Remote outage: degraded, still serving.
    ctx.remote.set_failing(true);
    let report = ctx.service.health_check().await;
    assert_eq!(report.status, HealthStatus::Degraded);
    assert!(report.status.is_serving());

    ctx.remote.set_failing(false);
    let report = ctx.service.health_check().await;
    assert_eq!(report.status, HealthStatus::Healthy);

    // A source failing repeatedly: unhealthy.
    ctx.weather.always_fail();
    let threshold = ctx.service.config().degraded_failure_threshold;
    for _ in 0..threshold {
        let result = ctx
            .service
            .ingest("noaa", "current", &fixtures::station_params("KORD"))
            .await;
        assert!(!result.success);
    }
    let report = ctx.service.health_check().await;
    assert_eq!(report.status, HealthStatus::Unhealthy);

    // One success resets the consecutive count.
    ctx.weather.fail_times(0);
    let result = ctx
        .service
        .ingest("noaa", "current", &fixtures::station_params("KORD"))
        .await;
    assert!(result.success);
    let report = ctx.service.health_check().await;
    assert_eq!(report.status, HealthStatus::Healthy);
}

#[tokio::test]
async fn clear_pattern_reaches_both_tiers() {
    let ctx = TestContext::new();
    ctx.service
        .ingest("noaa", "current", &fixtures::station_params("KORD"))
        .await;
    ctx.service
        .ingest("noaa", "forecast", &fixtures::station_params("KORD"))
        .await;

    let removed = ctx.service.refresh_cache(Some("noaa")).await;
    // Two logical entries, each present in L1 and L2.
    assert_eq!(removed, 4);
    assert!(ctx.remote.is_empty());
}
