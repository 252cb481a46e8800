//! Matching and centroid properties

use geofuse_core::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::Map;

fn track(points: &[(i64, f64, f64)]) -> PositionTrack {
    PositionTrack::from_samples(
        points
            .iter()
            .map(|&(t, lat, lon)| PositionSample::new(Timestamp::from_nanos(t), lat, lon))
            .collect(),
    )
}

fn entries(times: &[i64]) -> Vec<LogEntry> {
    times
        .iter()
        .enumerate()
        .map(|(i, &t)| LogEntry::new(i, Timestamp::from_nanos(t), Map::new()))
        .collect()
}

#[test]
fn test_reference_scenario() {
    let track = track(&[(9, 1.0, 1.0), (21, 2.0, 2.0), (40, 3.0, 3.0)]);
    let entries = entries(&[10, 20, 30]);

    let matches = match_entries(&entries, &track).unwrap();
    let matched: Vec<i64> = matches.iter().map(|m| m.sample.timestamp.as_nanos()).collect();
    assert_eq!(matched, vec![9, 21, 21]);

    let deltas: Vec<i64> = matches.iter().map(|m| m.time_delta).collect();
    assert_eq!(deltas, vec![1, -1, 9]);

    let centroid =
        Centroid::from_points(matches.iter().map(|m| (m.sample.latitude, m.sample.longitude)))
            .unwrap();
    assert!((centroid.latitude - 1.6667).abs() < 1e-3);
    assert!((centroid.longitude - 1.6667).abs() < 1e-3);
}

#[test]
fn test_matches_agree_with_linear_scan() {
    let mut rng = StdRng::seed_from_u64(0x6e0f);

    for _ in 0..200 {
        let n = rng.gen_range(1..40);
        // Coarse times so duplicates and exact ties are common
        let points: Vec<(i64, f64, f64)> = (0..n)
            .map(|i| (rng.gen_range(-50..50) * 2, i as f64, 0.0))
            .collect();
        let track = track(&points);
        let samples = track.samples();

        let times: Vec<i64> = (0..30).map(|_| rng.gen_range(-120..120)).collect();
        let entries = entries(&times);
        let matches = match_entries(&entries, &track).unwrap();
        assert_eq!(matches.len(), entries.len());

        for m in &matches {
            let t = m.entry.timestamp;
            let best = samples.iter().map(|s| t.abs_diff(s.timestamp)).min().unwrap();
            // Linear scan: first sample in sorted order achieving the best gap
            let expected = samples
                .iter()
                .position(|s| t.abs_diff(s.timestamp) == best)
                .unwrap();

            assert_eq!(m.gap_nanos(), best, "not nearest for t={:?}", t);
            assert!(
                std::ptr::eq(m.sample, &samples[expected]),
                "tie for t={:?} resolved to {:?}, expected {:?}",
                t,
                m.sample,
                samples[expected]
            );
        }
    }
}

#[test]
fn test_centroid_order_invariant() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut points: Vec<(f64, f64)> = (0..64)
        .map(|_| (rng.gen_range(-89.0..89.0), rng.gen_range(-179.0..179.0)))
        .collect();

    let before = Centroid::from_points(points.iter().copied()).unwrap();
    points.shuffle(&mut rng);
    let after = Centroid::from_points(points.iter().copied()).unwrap();

    assert!((before.latitude - after.latitude).abs() < 1e-9);
    assert!((before.longitude - after.longitude).abs() < 1e-9);
}

#[test]
fn test_every_entry_gets_a_match() {
    let track = track(&[(1_000, 10.0, 20.0)]);
    let entries = entries(&[-1_000_000, 0, 1_000, i64::MAX]);
    let matches = match_entries(&entries, &track).unwrap();
    assert_eq!(matches.len(), 4);
    assert!(matches.iter().all(|m| m.sample.latitude == 10.0));
    assert_eq!(matches[3].time_delta, i64::MAX - 1_000);
}

#[test]
fn test_feature_count_is_entries_plus_one() {
    let track = track(&[(0, 1.0, 2.0), (100, 3.0, 4.0)]);
    for n in 1..6 {
        let times: Vec<i64> = (0..n).map(|i| i * 25).collect();
        let entries = entries(&times);
        let matches = match_entries(&entries, &track).unwrap();
        let fc = geofuse_core::geojson::build_collection(
            &Map::new(),
            &matches,
            &OutputOptions::default(),
        )
        .unwrap();

        assert_eq!(fc.features.len(), n as usize + 1);
        assert_eq!(fc.point_count(), n as usize);
        assert!(fc.features.last().unwrap().is_centroid());
    }

    let err = geofuse_core::geojson::build_collection(&Map::new(), &[], &OutputOptions::default())
        .unwrap_err();
    assert!(matches!(err, GeoFuseError::EmptyInput));
}
