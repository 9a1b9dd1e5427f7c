use markline_core::{
    AudioSource, DETECTION_STRIDE, DetectionSettings, ManualClock, NullOutput, Session,
    SessionError, SessionSettings, detect, fixtures::click_track,
};
use proptest::prelude::*;

fn session_with(settings: SessionSettings) -> Session<ManualClock, NullOutput> {
    Session::new(settings, ManualClock::default(), NullOutput::default())
}

fn time_name_pairs(markers: &[markline_core::Marker]) -> Vec<(f64, String)> {
    markers
        .iter()
        .map(|marker| (marker.time, marker.name.clone()))
        .collect()
}

#[test]
fn close_hits_are_suppressed() {
    // 2 kHz puts stride points every 0.1 s.
    let source = click_track(2_000, 10.0, &[0.1, 0.2, 0.5], 0.8);
    let markers = detect(source.primary_channel(), 2_000, 0.5, 0.3, 0);

    let times: Vec<f64> = markers.iter().map(|marker| marker.time).collect();
    assert_eq!(times.len(), 2);
    assert!((times[0] - 0.1).abs() < 1e-9);
    assert!((times[1] - 0.5).abs() < 1e-9);
}

#[test]
fn sample_at_time_zero_can_emit() {
    let source = click_track(1_000, 1.0, &[0.0], 0.9);
    let markers = detect(source.primary_channel(), 1_000, 0.5, 0.3, 0);

    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].time, 0.0);
    assert_eq!(markers[0].name, "Auto-1");
}

#[test]
fn numbering_continues_after_existing_markers() {
    let source = click_track(1_000, 3.0, &[0.4, 1.4, 2.4], 0.9);
    let markers = detect(source.primary_channel(), 1_000, 0.5, 0.3, 4);
    let names: Vec<&str> = markers.iter().map(|marker| marker.name.as_str()).collect();

    assert_eq!(names, vec!["Auto-5", "Auto-6", "Auto-7"]);
}

#[test]
fn empty_and_extreme_thresholds_follow_the_inequality() {
    assert!(detect(&[], 44_100, 0.5, 0.3, 0).is_empty());

    let source = click_track(1_000, 2.0, &[0.6, 1.2], 1.0);
    assert!(detect(source.primary_channel(), 1_000, 1.0, 0.3, 0).is_empty());

    // With a negative threshold every stride point qualifies, spacing permitting.
    let quiet = vec![0.0_f32; 2_000];
    let markers = detect(&quiet, 1_000, -0.1, 0.3, 0);
    let times: Vec<f64> = markers.iter().map(|marker| marker.time).collect();
    assert_eq!(times, vec![0.0, 0.4, 0.8, 1.2, 1.6]);
}

#[test]
fn session_merges_detected_markers_in_time_order() {
    let mut session = session_with(SessionSettings::default());
    session.import_source(click_track(2_000, 4.0, &[0.5, 1.5, 3.0], 0.9));
    session.add_marker(1.0, "Manual").expect("in range");
    session.add_marker(2.0, "").expect("in range");

    let added = session.auto_place_markers().expect("buffer is loaded");
    assert_eq!(added, 3);

    let store = session.markers();
    assert!(store.is_sorted());
    let names: Vec<&str> = store
        .markers()
        .iter()
        .map(|marker| marker.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Auto-3", "Manual", "Auto-4", "Untitled", "Auto-5"]
    );
}

#[test]
fn auto_place_without_buffer_is_refused() {
    let mut session = session_with(SessionSettings::default());
    assert!(matches!(
        session.auto_place_markers(),
        Err(SessionError::NoBufferLoaded)
    ));
    assert!(session.markers().is_empty());
}

#[test]
fn session_uses_configured_detection_settings() {
    let mut session = session_with(SessionSettings::default());
    session.import_source(click_track(2_000, 2.0, &[0.2, 0.5, 0.8], 0.4));

    assert_eq!(session.auto_place_markers().expect("buffer loaded"), 0);

    session.set_detection(DetectionSettings::new(0.3, 0.25).expect("valid settings"));
    assert_eq!(session.auto_place_markers().expect("buffer loaded"), 3);
}

fn stride_samples() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0_f32..1.0, 0..(DETECTION_STRIDE * 80))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn detection_is_deterministic(
        samples in stride_samples(),
        threshold in 0.05_f32..0.95,
        min_distance in 0.01_f64..1.0,
        existing in 0_usize..20,
    ) {
        let first = detect(&samples, 8_000, threshold, min_distance, existing);
        let second = detect(&samples, 8_000, threshold, min_distance, existing);
        prop_assert_eq!(time_name_pairs(&first), time_name_pairs(&second));
    }

    #[test]
    fn emitted_markers_respect_minimum_distance(
        samples in stride_samples(),
        threshold in 0.05_f32..0.95,
        min_distance in 0.01_f64..1.0,
    ) {
        let markers = detect(&samples, 8_000, threshold, min_distance, 0);
        for pair in markers.windows(2) {
            prop_assert!(pair[1].time - pair[0].time > min_distance);
        }
        for marker in &markers {
            let index = (marker.time * 8_000.0).round() as usize;
            prop_assert_eq!(index % DETECTION_STRIDE, 0);
            prop_assert!(samples[index].abs() > threshold);
        }
    }
}

#[test]
fn detector_wrapper_reads_primary_channel() {
    let source = AudioSource::new(
        1_000,
        vec![vec![0.0; 1_000], {
            let mut loud = vec![0.0; 1_000];
            loud[400] = 1.0;
            loud
        }],
    );
    let detector = markline_core::AutoDetector::default();
    assert!(detector.detect_source(&source, 0).is_empty());
}
