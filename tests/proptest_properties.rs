use std::collections::HashSet;

use linecount_rs::integration::frames;
use linecount_rs::{
    Category, CounterConfig, CountingPipeline, CountsSummary, CrossingEvent, Detection, Direction,
    Frame, Rect,
};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

const FRAMES: u64 = 40;
const LANE_SPACING: f64 = 0.25;

fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config
}

/// An object moving at constant speed along its own vertical lane.
#[derive(Debug, Clone)]
struct LaneObject {
    start_frame: u64,
    len: u64,
    start_y: f64,
    velocity: f64,
    category: Category,
    dropped: Vec<bool>,
}

fn arb_object() -> impl Strategy<Value = LaneObject> {
    (
        1..=10u64,
        1..=30u64,
        0.05..0.95f64,
        -0.05..0.05f64,
        prop::sample::select(Category::ALL.to_vec()),
        prop::collection::vec(prop::bool::weighted(0.15), FRAMES as usize),
    )
        .prop_map(|(start_frame, len, start_y, velocity, category, dropped)| LaneObject {
            start_frame,
            len,
            start_y,
            velocity,
            category,
            dropped,
        })
}

fn arb_scene() -> impl Strategy<Value = Vec<LaneObject>> {
    prop::collection::vec(arb_object(), 1..=4)
}

fn lane_x(lane: usize) -> f64 {
    LANE_SPACING * (lane as f64 + 0.5)
}

fn render(scene: &[LaneObject]) -> Vec<Frame> {
    (1..=FRAMES)
        .map(|f| {
            let detections = scene
                .iter()
                .enumerate()
                .filter_map(|(lane, obj)| {
                    let visible = f >= obj.start_frame
                        && f < obj.start_frame + obj.len
                        && !obj.dropped[(f - 1) as usize];
                    if !visible {
                        return None;
                    }
                    let y = obj.start_y + obj.velocity * (f - obj.start_frame) as f64;
                    if !(0.02..=0.98).contains(&y) {
                        return None;
                    }
                    Some(Detection::from_rect(
                        Rect::from_xywh(lane_x(lane), y, 0.04, 0.04),
                        obj.category,
                        0.9,
                        f,
                    ))
                })
                .collect();
            Frame::new(f, detections)
        })
        .collect()
}

fn config(invert_directions: bool) -> CounterConfig {
    let mut config = CounterConfig::default();
    config.tracker.max_age = 3;
    config.tracker.match_gate_distance = 0.1;
    config.line.invert_directions = invert_directions;
    config
}

fn count(input: Vec<Frame>, invert_directions: bool) -> (Vec<CrossingEvent>, CountsSummary) {
    let mut pipeline = CountingPipeline::new(config(invert_directions)).expect("valid config");
    let events = pipeline
        .crossings(frames(input))
        .collect::<Result<Vec<_>, _>>()
        .expect("in-order frames");
    (events, pipeline.summary())
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn every_track_is_counted_at_most_once(scene in arb_scene()) {
        let (events, summary) = count(render(&scene), false);

        let ids: HashSet<_> = events.iter().map(|e| e.track_id).collect();
        prop_assert_eq!(ids.len(), events.len());
        prop_assert_eq!(summary.counted_track_ids.len(), events.len());
        prop_assert!(ids.iter().all(|id| summary.counted_track_ids.contains(id)));
    }

    #[test]
    fn lane_objects_are_counted_at_most_once(scene in arb_scene()) {
        let (_, summary) = count(render(&scene), false);
        prop_assert!(summary.total <= scene.len() as u64);
    }

    #[test]
    fn totals_are_conserved(scene in arb_scene()) {
        let (events, summary) = count(render(&scene), false);

        prop_assert!(summary.is_consistent());
        prop_assert_eq!(summary.total, events.len() as u64);
        prop_assert_eq!(summary.total_in() + summary.total_out(), summary.total);
        prop_assert_eq!(summary.by_category.sum(), summary.total);
        for category in Category::ALL {
            let both = summary.count(category, Direction::In)
                + summary.count(category, Direction::Out);
            prop_assert_eq!(both, summary.by_category.get(category));
        }
    }

    #[test]
    fn inversion_only_swaps_directions(scene in arb_scene()) {
        let (_, plain) = count(render(&scene), false);
        let (_, inverted) = count(render(&scene), true);

        prop_assert_eq!(plain.total, inverted.total);
        prop_assert_eq!(plain.by_category, inverted.by_category);
        prop_assert_eq!(plain.inbound, inverted.out);
        prop_assert_eq!(plain.out, inverted.inbound);
        prop_assert_eq!(plain.counted_track_ids, inverted.counted_track_ids);
    }

    #[test]
    fn replay_is_deterministic(scene in arb_scene()) {
        let first = count(render(&scene), false);
        let second = count(render(&scene), false);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn motion_inside_band_is_never_counted(
        rows in prop::collection::vec(prop::collection::vec(0.485..0.515f64, 4), 1..30)
    ) {
        let input: Vec<Frame> = rows
            .iter()
            .enumerate()
            .map(|(i, ys)| {
                let f = i as u64 + 1;
                let detections = ys
                    .iter()
                    .enumerate()
                    .map(|(lane, &y)| {
                        Detection::from_rect(
                            Rect::from_xywh(lane_x(lane), y, 0.04, 0.04),
                            Category::Car,
                            0.9,
                            f,
                        )
                    })
                    .collect();
                Frame::new(f, detections)
            })
            .collect();

        let (events, summary) = count(input, false);
        prop_assert!(events.is_empty());
        prop_assert_eq!(summary.total, 0);
    }
}
