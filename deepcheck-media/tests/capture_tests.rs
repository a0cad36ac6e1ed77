//! Capture lifecycle tests against the synthetic camera
//!
//! Timeout tests run on a paused clock, so a 10 second wait costs nothing.

use deepcheck_media::*;
use std::time::Duration;
use tokio_test::assert_ok;

// ============================================================================
// ACQUISITION TESTS
// ============================================================================

#[tokio::test]
async fn test_session_starts_at_constrained_resolution() {
    let camera = SyntheticCamera::new();
    let mut session = CaptureSession::start(
        &camera,
        &CaptureConstraints::default(),
        METADATA_TIMEOUT,
    )
    .await
    .unwrap();

    assert!(session.is_active());
    assert_eq!(session.resolution(), VideoResolution::QVGA);
    assert_eq!(camera.live_streams(), 1);

    let uri = session.capture_frame(DEFAULT_JPEG_QUALITY).unwrap();
    assert_eq!(uri.mime(), "image/jpeg");
    let decoded = image::load_from_memory(uri.data()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 240));
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn test_acquisition_failures_are_classified() {
    for kind in [
        AcquisitionErrorKind::PermissionDenied,
        AcquisitionErrorKind::DeviceNotFound,
        AcquisitionErrorKind::DeviceBusy,
        AcquisitionErrorKind::SecurityBlocked,
        AcquisitionErrorKind::Aborted,
    ] {
        let camera = SyntheticCamera::new().with_behavior(SyntheticBehavior::Fail(kind));
        let result =
            CaptureSession::start(&camera, &CaptureConstraints::default(), METADATA_TIMEOUT).await;
        match result {
            Err(error) => assert_eq!(error.acquisition_kind(), Some(kind)),
            Ok(_) => panic!("Expected {kind} failure"),
        }
        assert_eq!(camera.live_streams(), 0);
    }
}

#[tokio::test]
async fn test_oversized_camera_is_overconstrained() {
    let camera = SyntheticCamera::with_modes(vec![VideoResolution::HD]);
    let result =
        CaptureSession::start(&camera, &CaptureConstraints::default(), METADATA_TIMEOUT).await;

    match result {
        Err(error) => assert_eq!(
            error.acquisition_kind(),
            Some(AcquisitionErrorKind::ConstraintsUnsatisfiable)
        ),
        Ok(_) => panic!("Expected overconstrained failure"),
    }
    assert_eq!(camera.opened(), 0);
}

#[tokio::test]
async fn test_frame_rate_above_cap_is_overconstrained() {
    let camera = SyntheticCamera::new().with_frame_rate(60.0);
    let result =
        CaptureSession::start(&camera, &CaptureConstraints::default(), METADATA_TIMEOUT).await;

    match result {
        Err(error) => assert_eq!(
            error.acquisition_kind(),
            Some(AcquisitionErrorKind::ConstraintsUnsatisfiable)
        ),
        Ok(_) => panic!("Expected frame rate cap to reject the camera"),
    }
    assert_eq!(camera.opened(), 0);

    // At the cap the camera is accepted
    let camera = SyntheticCamera::new().with_frame_rate(30.0);
    assert_ok!(
        CaptureSession::start(&camera, &CaptureConstraints::default(), METADATA_TIMEOUT).await
    );
}

// ============================================================================
// METADATA WAIT TESTS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_metadata_wait_times_out() {
    let camera = SyntheticCamera::new().with_behavior(SyntheticBehavior::NeverReady);
    let result =
        CaptureSession::start(&camera, &CaptureConstraints::default(), METADATA_TIMEOUT).await;

    match result {
        Err(MediaError::VideoLoadTimeout { duration }) => {
            assert_eq!(duration, Duration::from_secs(10))
        }
        Err(other) => panic!("Expected timeout, got {other:?}"),
        Ok(_) => panic!("Expected timeout"),
    }
    // The stalled stream must not leak
    assert_eq!(camera.opened(), 1);
    assert_eq!(camera.live_streams(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_metadata_within_bound() {
    let camera = SyntheticCamera::new()
        .with_behavior(SyntheticBehavior::ReadyAfter(Duration::from_secs(9)));
    let session = assert_ok!(
        CaptureSession::start(&camera, &CaptureConstraints::default(), METADATA_TIMEOUT).await
    );
    assert_eq!(session.resolution(), VideoResolution::QVGA);
}

#[tokio::test]
async fn test_sink_error_fails_and_releases() {
    let camera = SyntheticCamera::new()
        .with_behavior(SyntheticBehavior::SinkError("decoder crashed".to_string()));
    let result =
        CaptureSession::start(&camera, &CaptureConstraints::default(), METADATA_TIMEOUT).await;

    assert!(matches!(result, Err(MediaError::VideoSink { .. })));
    assert_eq!(camera.live_streams(), 0);
}

// ============================================================================
// TEARDOWN TESTS
// ============================================================================

#[tokio::test]
async fn test_stop_is_idempotent_and_blocks_capture() {
    let camera = SyntheticCamera::new();
    let mut session =
        CaptureSession::start(&camera, &CaptureConstraints::default(), METADATA_TIMEOUT)
            .await
            .unwrap();

    session.stop();
    session.stop();
    assert!(!session.is_active());
    assert_eq!(camera.live_streams(), 0);

    assert!(matches!(
        session.capture_frame(DEFAULT_JPEG_QUALITY),
        Err(MediaError::CaptureNotActive)
    ));
    assert!(session.last_error().is_some());
}

#[tokio::test]
async fn test_drop_releases_tracks() {
    let camera = SyntheticCamera::new();
    {
        let _session =
            CaptureSession::start(&camera, &CaptureConstraints::default(), METADATA_TIMEOUT)
                .await
                .unwrap();
        assert_eq!(camera.live_streams(), 1);
    }
    assert_eq!(camera.live_streams(), 0);
}
