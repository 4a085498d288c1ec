use linecount_rs::counting::Direction;
use linecount_rs::integration::frames;
use linecount_rs::{
    Category, CounterConfig, CountingPipeline, CrossingEvent, Detection, DetectionBuilder, Frame,
    Rect, TrackId,
};

/// One object's position and class per frame; `None` means not detected.
type Path = Vec<Option<(f64, f64, Category)>>;

fn config(invert_directions: bool) -> CounterConfig {
    let mut config = CounterConfig::default();
    config.line.line_position = 0.5;
    config.line.hysteresis_margin = 0.02;
    config.line.invert_directions = invert_directions;
    config.tracker.match_gate_distance = 0.2;
    config.tracker.max_age = 3;
    config
}

fn build_frames(paths: &[Path]) -> Vec<Frame> {
    let len = paths.iter().map(Vec::len).max().unwrap_or(0);
    (0..len)
        .map(|i| {
            let frame_index = i as u64 + 1;
            let detections: Vec<Detection> = paths
                .iter()
                .filter_map(|p| p.get(i).copied().flatten())
                .map(|(x, y, category)| {
                    Detection::from_rect(
                        Rect::from_xywh(x, y, 0.05, 0.05),
                        category,
                        0.9,
                        frame_index,
                    )
                })
                .collect();
            Frame::new(frame_index, detections)
        })
        .collect()
}

fn vertical(x: f64, ys: &[f64], category: Category) -> Path {
    ys.iter().map(|&y| Some((x, y, category))).collect()
}

fn run(config: CounterConfig, paths: &[Path]) -> (Vec<CrossingEvent>, CountingPipeline) {
    let mut pipeline = CountingPipeline::new(config).unwrap();
    let events = pipeline
        .crossings(frames(build_frames(paths)))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    (events, pipeline)
}

#[test]
fn single_track_crossing_downwards_counts_in() {
    let path = vertical(0.5, &[0.30, 0.40, 0.52, 0.60], Category::Car);
    let (events, pipeline) = run(config(false), &[path]);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].direction, Direction::In);
    assert_eq!(events[0].frame_index, 4);
    assert_eq!(events[0].category, Category::Car);

    let summary = pipeline.summary();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.total_in(), 1);
    assert_eq!(summary.total_out(), 0);
    assert_eq!(summary.by_category.car, 1);
}

#[test]
fn inverted_directions_count_out() {
    let path = vertical(0.5, &[0.30, 0.40, 0.52, 0.60], Category::Car);
    let (events, _) = run(config(true), &[path]);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].direction, Direction::Out);
    assert_eq!(events[0].frame_index, 4);
}

#[test]
fn hovering_inside_band_is_never_counted() {
    let path = vertical(0.5, &[0.49, 0.505, 0.495, 0.51], Category::Car);
    let (events, pipeline) = run(config(false), &[path]);

    assert!(events.is_empty());
    assert_eq!(pipeline.summary().total, 0);
}

#[test]
fn opposite_crossings_split_by_direction() {
    let down = vertical(0.2, &[0.2, 0.3, 0.4, 0.5, 0.6, 0.7], Category::Car);
    let up = vertical(0.8, &[0.8, 0.7, 0.6, 0.5, 0.4, 0.3], Category::Truck);
    let (events, pipeline) = run(config(false), &[down, up]);

    assert_eq!(events.len(), 2);
    let summary = pipeline.summary();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.inbound.total, 1);
    assert_eq!(summary.out.total, 1);
    assert_eq!(summary.count(Category::Car, Direction::In), 1);
    assert_eq!(summary.count(Category::Truck, Direction::Out), 1);
    assert!(summary.is_consistent());
}

#[test]
fn track_aged_out_before_crossing_is_not_counted() {
    // Last seen just past the line but still inside the band, then gone.
    let mut path = vertical(0.5, &[0.30, 0.40, 0.51], Category::Bus);
    path.extend([None, None, None, None]);
    // Reappears well below the line after deletion: a new, baseline-only track.
    path.push(Some((0.5, 0.70, Category::Bus)));
    path.push(Some((0.5, 0.72, Category::Bus)));
    let (events, pipeline) = run(config(false), &[path]);

    assert!(events.is_empty());
    assert_eq!(pipeline.summary().total, 0);
    assert_eq!(pipeline.tracker().stats().tracks_removed, 1);
    assert_eq!(pipeline.tracker().live_tracks()[0].id(), TrackId(2));
    assert_eq!(pipeline.counter().tracked(), 1);
}

#[test]
fn category_flicker_resolves_to_majority() {
    let path = vec![
        Some((0.5, 0.30, Category::Car)),
        Some((0.5, 0.40, Category::Car)),
        Some((0.5, 0.50, Category::Bike)),
        Some((0.5, 0.60, Category::Car)),
    ];
    let (events, pipeline) = run(config(false), &[path]);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].category, Category::Car);
    assert_eq!(pipeline.summary().by_category.bike, 0);
}

#[test]
fn spawned_past_line_then_moving_away_is_not_counted() {
    let path = vertical(0.5, &[0.6, 0.7, 0.8, 0.9], Category::Car);
    let (events, _) = run(config(false), &[path]);
    assert!(events.is_empty());
}

#[test]
fn crossing_back_does_not_count_twice() {
    let ys = [
        0.40, 0.45, 0.50, 0.55, 0.60, 0.55, 0.50, 0.45, 0.40, 0.45, 0.50, 0.55, 0.60,
    ];
    let path = vertical(0.5, &ys, Category::Car);
    let (events, pipeline) = run(config(false), &[path]);

    assert_eq!(events.len(), 1);
    assert_eq!(pipeline.summary().counted_track_ids.len(), 1);
}

#[test]
fn occluded_track_keeps_identity_and_counts_once() {
    let path = vec![
        Some((0.5, 0.30, Category::Car)),
        Some((0.5, 0.38, Category::Car)),
        None,
        Some((0.5, 0.54, Category::Car)),
        Some((0.5, 0.62, Category::Car)),
    ];
    let (events, pipeline) = run(config(false), &[path]);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].track_id, TrackId(1));
    assert_eq!(events[0].frame_index, 4);
    assert_eq!(pipeline.tracker().stats().tracks_spawned, 1);
}

#[test]
fn bicycles_and_motorcycles_count_as_bikes() {
    let mut pipeline = CountingPipeline::new(config(false)).unwrap();
    for (i, y) in [0.30, 0.45, 0.60].into_iter().enumerate() {
        let frame_index = i as u64 + 1;
        let detections = [("bicycle", 0.2), ("motorcycle", 0.8)]
            .into_iter()
            .map(|(class, x)| {
                DetectionBuilder::new()
                    .xywh(x, y, 0.05, 0.05)
                    .class_name(class)
                    .confidence(0.9)
                    .frame(frame_index)
                    .build()
                    .unwrap()
            })
            .collect();
        pipeline
            .process_frame(&Frame::new(frame_index, detections))
            .unwrap();
    }

    let json = serde_json::to_value(pipeline.summary()).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["by_category"]["bike"], 2);
    assert_eq!(json["in"]["by_category"]["bike"], 2);
    assert_eq!(json["counted_track_ids"], serde_json::json!([1, 2]));
}

#[test]
fn summary_is_queryable_mid_stream() {
    let down = vertical(0.2, &[0.40, 0.45, 0.55, 0.55, 0.55, 0.55], Category::Car);
    let up = vertical(0.8, &[0.60, 0.60, 0.60, 0.60, 0.55, 0.45], Category::Bus);
    let input = build_frames(&[down, up]);

    let mut pipeline = CountingPipeline::new(config(false)).unwrap();
    let mut totals = Vec::new();
    for frame in &input {
        pipeline.process_frame(frame).unwrap();
        totals.push(pipeline.summary().total);
    }
    assert_eq!(totals, vec![0, 0, 1, 1, 1, 2]);
}
