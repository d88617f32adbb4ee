//! End-to-end ingestion through the service facade: cache behavior,
//! cleaning outcomes, and batch isolation, all against mock adapters.

use agro_core::{ErrorClass, Record};
use agro_pipeline::IngestRequest;
use agro_service::ServiceConfig;
use integration_tests::{fixtures, setup::TestContext};

#[tokio::test]
async fn repeat_ingest_is_served_from_cache() {
    let ctx = TestContext::new();
    let params = fixtures::station_params("KORD");

    let first = ctx.service.ingest("noaa", "current", &params).await;
    assert!(first.success, "first ingest failed: {:?}", first.error);
    assert!(!first.cache_hit);

    let second = ctx.service.ingest("noaa", "current", &params).await;
    assert!(second.success);
    assert!(second.cache_hit, "second identical request must hit cache");
    assert_eq!(
        ctx.weather.call_count(),
        1,
        "adapter must not be called on a cache hit"
    );

    // The cached payload is byte-identical to the first response.
    assert_eq!(
        serde_json::to_value(first.payload.as_ref().unwrap().record.clone()).unwrap(),
        serde_json::to_value(second.payload.as_ref().unwrap().record.clone()).unwrap(),
    );
}

#[tokio::test]
async fn different_params_produce_distinct_cache_entries() {
    let ctx = TestContext::new();

    let a = ctx
        .service
        .ingest("noaa", "current", &fixtures::station_params("KORD"))
        .await;
    let b = ctx
        .service
        .ingest("noaa", "current", &fixtures::station_params("KMSP"))
        .await;

    assert!(a.success && b.success);
    assert!(!b.cache_hit, "different params must not share an entry");
    assert_eq!(ctx.weather.call_count(), 2);
}

#[tokio::test]
async fn implausible_temperature_is_rejected() {
    let ctx = TestContext::new();
    ctx.weather.set_record(fixtures::implausible_weather_record());

    let result = ctx
        .service
        .ingest("noaa", "current", &fixtures::station_params("KORD"))
        .await;

    assert!(!result.success);
    assert_eq!(result.error_class, Some(ErrorClass::Validation));
    assert!(result.payload.is_none());

    // Failures are never cached; the next request fetches again.
    ctx.weather.set_record(fixtures::weather_record());
    let retry = ctx
        .service
        .ingest("noaa", "current", &fixtures::station_params("KORD"))
        .await;
    assert!(retry.success);
    assert!(!retry.cache_hit);
    assert_eq!(ctx.weather.call_count(), 2);
}

#[tokio::test]
async fn out_of_range_humidity_is_clamped_not_dropped() {
    let ctx = TestContext::new();
    ctx.weather.set_record(fixtures::correctable_weather_record());

    let result = ctx
        .service
        .ingest("noaa", "current", &fixtures::station_params("KORD"))
        .await;

    assert!(result.success, "clampable value must not fail: {:?}", result.error);
    let doc = result.payload.unwrap();
    match &doc.record {
        Record::Weather(w) => assert_eq!(w.humidity_pct, Some(100.0)),
        other => panic!("expected weather record, got {:?}", other),
    }
    assert!(doc.quality_score < 1.0, "correction must dock quality");
    assert!(doc.cleaned);
}

#[tokio::test]
async fn unknown_source_is_a_configuration_error() {
    let ctx = TestContext::new();
    let result = ctx
        .service
        .ingest("nope", "current", &fixtures::station_params("KORD"))
        .await;
    assert!(!result.success);
    assert_eq!(result.error_class, Some(ErrorClass::Configuration));
}

#[tokio::test]
async fn batch_failures_are_isolated() {
    let ctx = TestContext::new();
    let requests = vec![
        IngestRequest {
            source: "noaa".into(),
            operation: "current".into(),
            params: fixtures::station_params("KORD"),
        },
        IngestRequest {
            source: "nope".into(),
            operation: "current".into(),
            params: Default::default(),
        },
        IngestRequest {
            source: "cme".into(),
            operation: "quote".into(),
            params: fixtures::commodity_params("ZC"),
        },
    ];

    let results = ctx.service.batch_ingest(requests).await;
    assert_eq!(results.len(), 3);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert_eq!(results[1].error_class, Some(ErrorClass::Configuration));
    assert!(results[2].success, "one bad request must not sink the batch");
}

#[tokio::test]
async fn refresh_cache_forces_refetch() {
    let ctx = TestContext::new();
    let params = fixtures::station_params("KORD");

    ctx.service.ingest("noaa", "current", &params).await;
    let removed = ctx.service.refresh_cache(Some("noaa")).await;
    assert!(removed >= 1, "refresh must remove the cached entry");

    let after = ctx.service.ingest("noaa", "current", &params).await;
    assert!(after.success);
    assert!(!after.cache_hit);
    assert_eq!(ctx.weather.call_count(), 2);
}

#[tokio::test]
async fn warm_list_prepopulates_the_cache() {
    let mut config = ServiceConfig::default();
    config.warm_requests.push(IngestRequest {
        source: "noaa".into(),
        operation: "current".into(),
        params: fixtures::station_params("KORD"),
    });

    let ctx = TestContext::with_config(config);
    ctx.service.start();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let result = ctx
        .service
        .ingest("noaa", "current", &fixtures::station_params("KORD"))
        .await;
    assert!(result.cache_hit, "warming must pre-populate the entry");
    assert_eq!(ctx.weather.call_count(), 1);

    ctx.service.stop().await;
}

#[tokio::test]
async fn refresh_is_scoped_to_one_source() {
    let ctx = TestContext::new();

    ctx.service
        .ingest("noaa", "current", &fixtures::station_params("KORD"))
        .await;
    ctx.service
        .ingest("cme", "quote", &fixtures::commodity_params("ZC"))
        .await;

    ctx.service.refresh_cache(Some("noaa")).await;

    let market = ctx
        .service
        .ingest("cme", "quote", &fixtures::commodity_params("ZC"))
        .await;
    assert!(market.cache_hit, "other sources' entries must survive");
}
