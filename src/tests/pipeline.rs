use std::{sync::Arc, time::Duration as StdDuration};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{
    prelude::{
        AccessToken, AssetResolver, AssetSource, Config, EarthRotationModel, Epoch, Error,
        Extrapolation, HoverEvent, Interpolation, Readiness, ResourceHandle, TelemetryFrame,
        TimeRange, TrajectoryPipeline, Unit,
    },
    tests::{at, init_logger, two_samples, two_samples_columns, FailingProvider, T0_MS},
};

fn pipeline(cfg: &Config) -> TrajectoryPipeline {
    TrajectoryPipeline::new(cfg, Arc::new(EarthRotationModel::new()))
}

async fn ready_pipeline(cfg: &Config) -> TrajectoryPipeline {
    let mut pipeline = pipeline(cfg);
    pipeline.set_time_range(TimeRange::new(at(0.0), at(60.0)));
    pipeline.wait_ready().await.unwrap();
    pipeline
}

#[tokio::test]
async fn two_samples_scenario() {
    init_logger();
    let mut pipeline = ready_pipeline(&Config::default()).await;

    assert_eq!(pipeline.ingest(two_samples()), Ok(true));

    let interval = pipeline.interval().unwrap();
    assert_eq!(interval.start, at(0.0));
    assert_eq!(interval.stop, at(60.0));

    // cursor follows the trailing edge
    assert_eq!(pipeline.cursor(), Some(at(60.0)));

    let q0 = pipeline.orientation_at(at(0.0)).unwrap();
    let q30 = pipeline.orientation_at(at(30.0)).unwrap();
    let q60 = pipeline.orientation_at(at(60.0)).unwrap();

    let full = q0.angle_to(&q60);
    let half = q0.angle_to(&q30);
    assert!(half > 0.0 && half < full, "half={} full={}", half, full);
    assert!(q30.angle_to(&q60) < full);

    let p0 = pipeline.position_at(at(0.0)).unwrap();
    let p30 = pipeline.position_at(at(30.0)).unwrap();
    let p60 = pipeline.position_at(at(60.0)).unwrap();
    for i in 0..3 {
        assert!(p30[i] >= p0[i].min(p60[i]) && p30[i] <= p0[i].max(p60[i]));
    }
    assert!(p30 != p0 && p30 != p60);

    let (t, p, _) = pipeline.sample_at_cursor().unwrap();
    assert_eq!(t, at(60.0));
    assert_eq!(p, p60);
}

#[tokio::test]
async fn columns_scenario() {
    init_logger();
    let mut pipeline = ready_pipeline(&Config::default()).await;

    assert_eq!(pipeline.ingest_columns(&two_samples_columns()), Ok(true));

    let interval = pipeline.interval().unwrap();
    assert!((interval.duration() - 60.0 * Unit::Second).abs() < 1.0 * Unit::Millisecond);

    let p = pipeline
        .position_at(Epoch::from_unix_milliseconds(T0_MS))
        .unwrap();
    assert!((p.x - 7000.0).abs() < 1.0E-6);
}

#[tokio::test]
async fn mismatched_columns_scenario() {
    init_logger();
    let mut pipeline = ready_pipeline(&Config::default()).await;

    let mut columns = two_samples_columns();
    for column in columns.iter_mut() {
        column.resize(7, 0.0);
    }
    // 7 time values, 6 position values
    columns[1].truncate(6);

    assert!(matches!(
        pipeline.ingest_columns(&columns),
        Err(Error::MalformedTelemetry(_))
    ));

    assert!(pipeline.trajectory().is_none());
    assert!(pipeline.interval().is_none());
    assert!(pipeline.position_at(at(0.0)).is_none());
    assert!(pipeline.orientation_at(at(0.0)).is_none());
}

#[tokio::test]
async fn ingest_is_deferred_until_ready() {
    init_logger();
    let mut pipeline = pipeline(&Config::default());

    assert_eq!(pipeline.readiness(), Readiness::NotPrimed);
    assert_eq!(pipeline.ingest(two_samples()), Ok(false));
    assert!(pipeline.trajectory().is_none());
    assert!(pipeline.cursor().is_none());

    pipeline.set_time_range(TimeRange::new(at(0.0), at(60.0)));
    let interval = pipeline.wait_ready().await.unwrap();
    assert_eq!(interval.stop, at(60.0) + 1.0 * Unit::Day);

    // rebuilt once ready
    assert!(pipeline.trajectory().is_some());
    assert_eq!(pipeline.cursor(), Some(at(60.0)));
}

#[tokio::test]
async fn cursor_samples_within_trailing_pad() {
    init_logger();
    let cfg = Config::default()
        .with_trailing_pad(1.0 * Unit::Hour)
        .with_extrapolation(Extrapolation::Reject);

    let mut pipeline = ready_pipeline(&cfg).await;
    assert_eq!(pipeline.ingest(two_samples()), Ok(true));

    assert_eq!(pipeline.cursor(), Some(at(60.0) + 1.0 * Unit::Hour));

    let (_, p, q) = pipeline.sample_at_cursor().unwrap();
    assert_eq!(Some(p), pipeline.position_at(at(60.0)));
    assert_eq!(Some(q), pipeline.orientation_at(at(60.0)));
}

#[tokio::test]
async fn stale_but_valid() {
    init_logger();
    let mut pipeline = ready_pipeline(&Config::default()).await;
    pipeline.ingest(two_samples()).unwrap();

    let valid = pipeline.trajectory().cloned();
    let generation = pipeline.generation();

    let mut samples = two_samples().samples().to_vec();
    samples[0].attitude.w = f64::NAN;

    assert_eq!(
        pipeline.ingest(TelemetryFrame::from_samples(samples)),
        Err(Error::MalformedSample(0, at(0.0)))
    );

    assert_eq!(pipeline.trajectory().cloned(), valid);
    assert_eq!(pipeline.generation(), generation);
}

#[tokio::test]
async fn failed_priming() {
    init_logger();
    let mut pipeline = TrajectoryPipeline::new(&Config::default(), Arc::new(FailingProvider));

    pipeline.set_time_range(TimeRange::new(at(0.0), at(60.0)));
    assert!(matches!(
        pipeline.wait_ready().await,
        Err(Error::PrimingFailed(..))
    ));

    assert_eq!(pipeline.ingest(two_samples()), Ok(false));
    assert!(pipeline.trajectory().is_none());
}

#[tokio::test]
async fn latest_time_range_wins() {
    init_logger();
    let mut pipeline = pipeline(&Config::default().with_priming_pad(1.0 * Unit::Hour));

    pipeline.set_time_range(TimeRange::new(at(-3600.0), at(-60.0)));
    pipeline.set_time_range(TimeRange::new(at(0.0), at(60.0)));

    let interval = pipeline.wait_ready().await.unwrap();
    assert_eq!(interval.start, at(0.0));
    assert_eq!(interval.stop, at(60.0) + 1.0 * Unit::Hour);

    // same range again: nothing to prime
    assert!(pipeline
        .set_time_range(TimeRange::new(at(0.0), at(60.0)))
        .is_none());
}

#[tokio::test]
async fn hover_notifications() {
    init_logger();
    let mut pipeline = ready_pipeline(&Config::default()).await;
    pipeline.ingest(two_samples()).unwrap();

    let (tx, rx) = broadcast::channel(8);
    assert!(pipeline.follow(rx));

    // out of the availability interval: still applied
    tx.send(HoverEvent::at(at(-500.0))).unwrap();
    tokio::time::sleep(StdDuration::from_millis(20)).await;
    assert_eq!(pipeline.cursor(), Some(at(-500.0)));

    pipeline.on_hover(&HoverEvent::at(at(15.0)));
    assert_eq!(pipeline.cursor(), Some(at(15.0)));

    // new telemetry moves the cursor to the trailing edge
    pipeline.ingest(two_samples()).unwrap();
    assert_eq!(pipeline.cursor(), Some(at(60.0)));

    pipeline.unfollow();
    tokio::time::sleep(StdDuration::from_millis(20)).await;
    assert_eq!(tx.receiver_count(), 0);
}

#[tokio::test]
async fn hover_disabled() {
    init_logger();
    let mut pipeline = ready_pipeline(&Config::default().with_follow_hover(false)).await;
    pipeline.ingest(two_samples()).unwrap();

    let (_tx, rx) = broadcast::channel::<HoverEvent>(8);
    assert!(!pipeline.follow(rx));

    pipeline.on_hover(&HoverEvent::at(at(15.0)));
    assert_eq!(pipeline.cursor(), Some(at(60.0)));
}

#[tokio::test]
async fn reconfiguration() {
    init_logger();
    let cfg = Config::default();
    let mut pipeline = ready_pipeline(&cfg).await;
    pipeline.ingest(two_samples()).unwrap();

    let generation = pipeline.generation();

    assert_eq!(pipeline.reconfigure(&cfg), Ok(false));
    assert_eq!(pipeline.generation(), generation);

    // rebuilt with new interpolation: generation bumped twice
    let linear = cfg.with_interpolation(Interpolation::Linear);
    assert_eq!(pipeline.reconfigure(&linear), Ok(true));
    assert_eq!(pipeline.generation(), generation + 2);
    assert_eq!(
        pipeline.trajectory().unwrap().position.method(),
        Interpolation::Linear
    );

    // no rebuild required
    let (_tx, rx) = broadcast::channel::<HoverEvent>(8);
    assert!(pipeline.follow(rx));
    assert_eq!(pipeline.reconfigure(&linear.with_follow_hover(false)), Ok(true));
    assert_eq!(pipeline.generation(), generation + 3);
}

#[tokio::test]
async fn cursor_survives_rebuilds() {
    init_logger();
    let cfg = Config::default();
    let mut pipeline = ready_pipeline(&cfg).await;
    pipeline.ingest(two_samples()).unwrap();

    pipeline.on_hover(&HoverEvent::at(at(15.0)));

    // configuration change: same telemetry rebuilt
    let linear = cfg.with_interpolation(Interpolation::Linear);
    assert_eq!(pipeline.reconfigure(&linear), Ok(true));
    assert_eq!(pipeline.cursor(), Some(at(15.0)));

    assert_eq!(pipeline.rebuild(), Ok(true));
    assert_eq!(pipeline.cursor(), Some(at(15.0)));

    // new range primed: rebuilt once ready
    pipeline.set_time_range(TimeRange::new(at(0.0), at(120.0)));
    pipeline.wait_ready().await.unwrap();
    assert_eq!(pipeline.cursor(), Some(at(15.0)));

    // telemetry refresh
    pipeline.ingest(two_samples()).unwrap();
    assert_eq!(pipeline.cursor(), Some(at(60.0)));
}

struct Resolver;

#[async_trait]
impl AssetResolver for Resolver {
    async fn resolve_by_id(&self, id: u64, token: &AccessToken) -> Result<ResourceHandle, Error> {
        if token.secret().is_empty() {
            return Err(Error::AssetResolutionFailed("empty token".to_string()));
        }
        Ok(ResourceHandle {
            uri: format!("asset://{}", id),
        })
    }
}

#[tokio::test]
async fn asset_resolution() {
    init_logger();

    let no_asset = pipeline(&Config::default());
    assert!(no_asset.resolve_asset(&Resolver).await.is_none());

    let cfg = Config::default()
        .with_asset(AssetSource::Id(7))
        .with_access_token(AccessToken::new("token"));

    assert_eq!(
        pipeline(&cfg).resolve_asset(&Resolver).await,
        Some(ResourceHandle {
            uri: "asset://7".to_string()
        })
    );

    // failure degrades to no asset
    let expired = cfg.with_access_token(AccessToken::new(""));
    assert!(pipeline(&expired).resolve_asset(&Resolver).await.is_none());
}
