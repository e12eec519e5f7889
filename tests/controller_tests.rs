mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fixtures::*;
use common::{TestResult, init_logging};
use vellum::{
    ExportConfig, ExportError, ExportOutcome, ExportStatus, ExporterBuilder, MemoryDelivery,
    Notice, RasterError, StageHost,
};

#[tokio::test]
async fn test_trigger_while_generating_is_ignored() -> TestResult {
    init_logging();

    let host = StageHost::new();
    let delivery = Arc::new(MemoryDelivery::new());
    let gate = GatedRasterizer::default();
    let exporter = Arc::new(
        ExporterBuilder::new()
            .with_stage_host(host.clone())
            .with_delivery(delivery.clone())
            .with_rasterizer(gate.clone())
            .build()?,
    );

    let model = sample_model();
    let first = {
        let exporter = Arc::clone(&exporter);
        let model = model.clone();
        tokio::spawn(async move { exporter.export(&model).await })
    };

    gate.entered.notified().await;
    assert_eq!(exporter.status(), ExportStatus::Generating);
    assert_eq!(host.attached_count(), 1);

    let second = exporter.export(&model).await?;
    assert_eq!(second, ExportOutcome::AlreadyRunning);
    assert_eq!(host.opened_count(), 1, "no second stage");
    assert!(delivery.is_empty(), "no second document");

    gate.release.notify_one();
    let outcome = first.await??;
    assert!(matches!(outcome, ExportOutcome::Delivered(_)));
    assert_eq!(delivery.len(), 1);
    assert_eq!(host.opened_count(), 1);
    assert_eq!(host.attached_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_rasterizer_fault_tears_down_before_error() -> TestResult {
    init_logging();

    let host = StageHost::new();
    let notifier = Arc::new(RecordingNotifier::new(host.clone()));
    let delivery = Arc::new(MemoryDelivery::new());
    let exporter = ExporterBuilder::new()
        .with_stage_host(host.clone())
        .with_delivery(delivery.clone())
        .with_notifier(notifier.clone())
        .with_rasterizer(FailingRasterizer)
        .build()?;

    let mut statuses = exporter.subscribe();
    let before = host.attached_count();
    let err = exporter.export(&sample_model()).await.unwrap_err();

    assert!(matches!(err, ExportError::Raster(RasterError::Unavailable(_))));
    assert_eq!(host.attached_count(), before);
    assert_eq!(host.opened_count(), 1);
    assert!(delivery.is_empty());

    let seen = notifier.seen();
    assert_eq!(seen.len(), 1);
    let (notice, attached_when_notified) = &seen[0];
    assert_eq!(*attached_when_notified, 0, "stage closed before the error surfaced");
    assert!(matches!(
        notice,
        Notice::Failed { message } if message.starts_with("document generation failed")
    ));

    // Error does not linger; the user can retry right away.
    assert_eq!(exporter.status(), ExportStatus::Idle);
    assert!(statuses.has_changed()?);
    assert_eq!(*statuses.borrow_and_update(), ExportStatus::Idle);
    Ok(())
}

#[tokio::test]
async fn test_dropped_export_releases_the_controller() -> TestResult {
    init_logging();

    let host = StageHost::new();
    let notifier = Arc::new(RecordingNotifier::new(host.clone()));
    let gate = GatedRasterizer::default();
    let exporter = ExporterBuilder::new()
        .with_stage_host(host.clone())
        .with_notifier(notifier.clone())
        .with_rasterizer(gate.clone())
        .build()?;

    let first =
        tokio::time::timeout(Duration::from_millis(200), exporter.export(&sample_model())).await;
    assert!(first.is_err(), "capture was never released");

    assert_eq!(exporter.status(), ExportStatus::Idle);
    assert_eq!(host.attached_count(), 0);
    let seen = notifier.seen();
    assert!(matches!(
        &seen[..],
        [(Notice::Failed { message }, 0)] if message.starts_with("document generation failed")
    ));

    // Stores a permit, so the next capture passes straight through.
    gate.release.notify_one();
    let retry = exporter.export(&sample_model()).await?;
    assert!(matches!(retry, ExportOutcome::Delivered(_)));
    assert_eq!(host.opened_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_retry_after_failure_is_accepted() -> TestResult {
    init_logging();

    let host = StageHost::new();
    let exporter = ExporterBuilder::new()
        .with_stage_host(host.clone())
        .with_rasterizer(FailingRasterizer)
        .build()?;

    assert!(exporter.export(&sample_model()).await.is_err());
    assert!(exporter.export(&sample_model()).await.is_err());
    assert_eq!(host.opened_count(), 2);
    assert_eq!(host.attached_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_success_path_leaves_no_stage_attached() -> TestResult {
    init_logging();

    let host = StageHost::new();
    let notifier = Arc::new(RecordingNotifier::new(host.clone()));
    let exporter = ExporterBuilder::new()
        .with_stage_host(host.clone())
        .with_notifier(notifier.clone())
        .with_rasterizer(FixedRasterizer::new(120, 160))
        .build()?;

    let outcome = exporter.export(&sample_model()).await?;
    assert!(matches!(outcome, ExportOutcome::Delivered(_)));
    assert_eq!(host.attached_count(), 0);
    assert_eq!(exporter.status(), ExportStatus::Success);

    let seen = notifier.seen();
    assert!(matches!(
        &seen[..],
        [(Notice::Saved { filename, pages: 1 }, 0)] if filename == "Amara_Okafor_Resume.pdf"
    ));
    Ok(())
}

#[tokio::test]
async fn test_success_returns_to_idle_after_display_window() -> TestResult {
    init_logging();

    let config = ExportConfig {
        success_display: Duration::from_millis(50),
        ..ExportConfig::default()
    };
    let exporter = ExporterBuilder::new()
        .with_config(config)
        .with_rasterizer(FixedRasterizer::new(120, 160))
        .build()?;
    let mut statuses = exporter.subscribe();

    exporter.export(&sample_model()).await?;
    assert_eq!(exporter.status(), ExportStatus::Success);

    tokio::time::timeout(
        Duration::from_secs(5),
        statuses.wait_for(|s| *s == ExportStatus::Idle),
    )
    .await??;
    Ok(())
}

#[tokio::test]
async fn test_trigger_during_success_window_is_accepted() -> TestResult {
    init_logging();

    let config = ExportConfig {
        success_display: Duration::from_millis(200),
        ..ExportConfig::default()
    };
    let exporter = ExporterBuilder::new()
        .with_config(config)
        .with_rasterizer(FixedRasterizer::new(120, 160))
        .build()?;

    exporter.export(&sample_model()).await?;
    tokio::time::sleep(Duration::from_millis(150)).await;
    let again = exporter.export(&sample_model()).await?;
    assert!(matches!(again, ExportOutcome::Delivered(_)));

    // The first window has expired by now; the second one is still open.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(exporter.status(), ExportStatus::Success);
    Ok(())
}
