use super::*;
use crate::engine::source::{ScrollMetrics, SharedScroll};
use crate::foundation::core::{Point, Size};
use crate::geometry::path::FnPath;
use crate::parallax::layer::LayoutBox;
use std::cell::RefCell;
use std::rc::Rc;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn at(offset: f64) -> ScrollMetrics {
    ScrollMetrics {
        scroll_offset: offset,
        cross_extent: 800.0,
        content_extent: 2000.0,
        viewport_extent: 1000.0,
    }
}

fn unsmoothed() -> EngineConfig {
    EngineConfig {
        smooth: false,
        ..EngineConfig::default()
    }
}

fn line() -> FnPath<impl Fn(f64) -> Point> {
    FnPath::new(|t| Point::new(600.0 * t, 0.0))
}

fn engine(config: &EngineConfig) -> (ProgressEngine, SharedScroll) {
    let scroll = SharedScroll::new();
    let engine = ProgressEngine::new(config, scroll.clone())
        .unwrap()
        .with_geometry(line());
    (engine, scroll)
}

#[test]
fn straight_line_halfway() {
    let (mut e, scroll) = engine(&unsmoothed());
    scroll.set(at(500.0));
    let s = e.tick(ms(16)).unwrap();
    assert_eq!(s.scroll_progress, 0.5);
    assert_eq!(s.eased_progress, 0.5);
    assert!((s.position.x - 300.0).abs() < 1e-9);
    assert!(s.position.y.abs() < 1e-9);
    assert!(s.tangent_angle_degrees.abs() < 1e-9);
    assert!(s.screen_resolved);
    assert_eq!(s.screen_position, s.position);
    assert_eq!(s.viewport, Size::new(800.0, 1000.0));
    assert_eq!(e.current_state(), s);
}

#[test]
fn default_state_before_first_tick() {
    let (e, _scroll) = engine(&EngineConfig::default());
    let s = e.current_state();
    assert_eq!(s, FollowerState::default());
    assert_eq!(s.direction, Direction::Forward);
    assert_eq!(s.velocity, 0.0);
    assert!(!e.has_published());
}

#[test]
fn missing_scroll_target_skips_the_tick() {
    let (mut e, scroll) = engine(&unsmoothed());
    assert!(e.advance(ms(16)).is_none());
    assert!(!e.has_published());

    scroll.set(at(250.0));
    assert!(e.tick(ms(32)).is_some());
    scroll.clear();
    assert!(e.advance(ms(48)).is_none());
    assert_eq!(e.current_state().scroll_progress, 0.25);
}

#[test]
fn nothing_is_published_until_mapping_resolves() {
    let transform = Rc::new(RefCell::new(None::<Affine>));
    let scroll = SharedScroll::new();
    let mut e = ProgressEngine::new(&unsmoothed(), scroll.clone())
        .unwrap()
        .with_geometry(line())
        .with_transform_source({
            let transform = Rc::clone(&transform);
            move || *transform.borrow()
        });
    scroll.set(at(500.0));

    let d = e.advance(ms(16)).unwrap();
    assert!(d.state().is_none());
    assert!(d.deliver());
    assert_eq!(e.current_state(), FollowerState::default());

    *transform.borrow_mut() = Some(Affine::translate((10.0, 20.0)));
    let s = e.tick(ms(32)).unwrap();
    assert_eq!(s.screen_position, Point::new(310.0, 20.0));

    // A later collapse keeps publishing, flagged as unresolved.
    *transform.borrow_mut() = Some(Affine::scale(0.0));
    let s = e.tick(ms(48)).unwrap();
    assert!(!s.screen_resolved);
    assert_eq!(s.screen_position, Point::ORIGIN);
    assert!((s.position.x - 300.0).abs() < 1e-9);
}

#[test]
fn without_geometry_segments_still_track() {
    let scroll = SharedScroll::new();
    let mut e = ProgressEngine::new(&unsmoothed(), scroll.clone()).unwrap();
    e.add_segment(Segment::new("s", 0.0, 1.0)).unwrap();
    scroll.set(at(500.0));
    let d = e.advance(ms(16)).unwrap();
    assert!(d.state().is_none());
    assert_eq!(d.segment_events().count(), 1);
    assert!(e.is_active("s"));
}

#[test]
fn smoothing_applies_before_easing_and_tracking() {
    let config = EngineConfig {
        smoothing: 0.5,
        initial_segments: vec![Segment::new("late", 0.4, 1.0)],
        ..EngineConfig::default()
    };
    let (mut e, scroll) = engine(&config);
    scroll.set(at(1000.0));

    let s = e.tick(ms(16)).unwrap();
    assert_eq!(s.scroll_progress, 1.0);
    assert_eq!(s.path_progress, 0.5);
    assert!(e.is_active("late"));

    let s = e.tick(ms(32)).unwrap();
    assert_eq!(s.path_progress, 0.75);
}

#[test]
fn velocity_and_direction_follow_smoothed_progress() {
    let (mut e, scroll) = engine(&unsmoothed());
    scroll.set(at(500.0));
    let first = e.tick(ms(0)).unwrap();
    assert_eq!(first.velocity, 0.0);
    assert_eq!(first.direction, Direction::Forward);

    scroll.set(at(400.0));
    let s = e.tick(ms(500)).unwrap();
    assert_eq!(s.direction, Direction::Backward);
    assert!((s.velocity - 0.2).abs() < 1e-9);

    // Same timestamp: no division by zero.
    scroll.set(at(450.0));
    let s = e.tick(ms(500)).unwrap();
    assert_eq!(s.velocity, 0.0);
    assert_eq!(s.direction, Direction::Forward);
}

#[test]
fn easing_is_applied_to_the_sample() {
    let (mut e, scroll) = engine(&unsmoothed());
    e.set_easing(Easing::custom(|t| t * t));
    scroll.set(at(500.0));
    let s = e.tick(ms(16)).unwrap();
    assert_eq!(s.eased_progress, 0.25);
    assert!((s.position.x - 150.0).abs() < 1e-9);
}

#[test]
fn segment_events_are_delivered_before_the_snapshot() {
    let (mut e, scroll) = engine(&unsmoothed());
    e.add_segment(Segment::new("s", 0.0, 1.0)).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    let _a = {
        let log = Rc::clone(&log);
        e.subscribe_segment("s", move |_| log.borrow_mut().push("segment"))
    };
    let _b = {
        let log = Rc::clone(&log);
        e.subscribe(move |_| log.borrow_mut().push("state"))
    };
    scroll.set(at(500.0));
    e.tick(ms(16));
    assert_eq!(*log.borrow(), vec!["segment", "state"]);
}

#[test]
fn stop_abandons_pending_delivery() {
    let (mut e, scroll) = engine(&unsmoothed());
    e.add_segment(Segment::new("s", 0.0, 1.0)).unwrap();
    let hits = Rc::new(RefCell::new(0));
    let run = e.run_flag();
    let _stopper = e.subscribe_segment("s", move |_| run.stop());
    let _state = {
        let hits = Rc::clone(&hits);
        e.subscribe(move |_| *hits.borrow_mut() += 1)
    };
    scroll.set(at(500.0));
    let d = e.advance(ms(16)).unwrap();
    assert!(!d.deliver());
    assert_eq!(*hits.borrow(), 0);
    assert!(!e.is_running());
    assert!(e.advance(ms(32)).is_none());

    e.resume();
    assert!(e.advance(ms(48)).is_some());
}

#[test]
fn callbacks_may_reach_back_into_a_shared_engine() {
    let scroll = SharedScroll::new();
    let e = Rc::new(RefCell::new(
        ProgressEngine::new(&unsmoothed(), scroll.clone())
            .unwrap()
            .with_geometry(line()),
    ));
    let seen = Rc::new(RefCell::new(None));
    let _sub = {
        let weak = Rc::downgrade(&e);
        let seen = Rc::clone(&seen);
        e.borrow().subscribe(move |_| {
            if let Some(engine) = weak.upgrade() {
                *seen.borrow_mut() = Some(engine.borrow().current_state().path_progress);
            }
        })
    };
    scroll.set(at(500.0));
    let d = e.borrow_mut().advance(ms(16));
    d.unwrap().deliver();
    assert_eq!(*seen.borrow(), Some(0.5));
}

#[test]
fn reset_returns_to_initial_state() {
    let config = EngineConfig {
        initial_segments: vec![Segment::new("s", 0.0, 1.0)],
        ..EngineConfig::default()
    };
    let (mut e, scroll) = engine(&config);
    scroll.set(at(1000.0));
    e.tick(ms(16));
    assert!(e.has_published());
    assert!(e.is_active("s"));

    let exits = e.reset();
    assert_eq!(exits.len(), 1);
    assert!(!e.has_published());
    assert!(!e.is_active("s"));
    assert_eq!(e.current_state(), FollowerState::default());
    assert_eq!(e.tracker().segments().len(), 1);

    let s = e.tick(ms(32)).unwrap();
    assert_eq!(s.path_progress, 0.15);
    assert_eq!(s.velocity, 0.0);
}

#[test]
fn reset_pairs_every_enter_with_an_exit() {
    use crate::tracking::segment::SegmentEventKind;

    let config = EngineConfig {
        initial_segments: vec![Segment::new("s", 0.0, 1.0)],
        ..unsmoothed()
    };
    let (mut e, scroll) = engine(&config);
    let log = Rc::new(RefCell::new(Vec::new()));
    let _sub = {
        let log = Rc::clone(&log);
        e.subscribe_segment("s", move |ev| log.borrow_mut().push(ev.kind))
    };

    scroll.set(at(500.0));
    e.tick(ms(16));
    e.reset().deliver();
    assert!(!e.is_active("s"));
    e.tick(ms(32));

    assert_eq!(
        *log.borrow(),
        vec![
            SegmentEventKind::Enter,
            SegmentEventKind::Exit,
            SegmentEventKind::Enter,
        ]
    );
    assert!(e.is_active("s"));
}

#[test]
fn state_handle_tracks_publishes() {
    let (mut e, scroll) = engine(&unsmoothed());
    let handle = e.state_handle();
    scroll.set(at(750.0));
    e.tick(ms(16));
    assert_eq!(handle.get().scroll_progress, 0.75);
}

#[test]
fn parallax_layers_update_with_ticks() {
    let (mut e, scroll) = engine(&unsmoothed());
    e.register_layer(
        ParallaxLayer::new("bg", 0.5),
        LayoutBox {
            offset: 1000.0,
            height: 200.0,
        },
    )
    .unwrap();
    assert_eq!(e.layer_transform("bg"), None);

    scroll.set(at(600.0));
    e.tick(ms(16));
    let t = e.layer_transform("bg").unwrap();
    assert!((t.progress - 0.5).abs() < 1e-9);

    e.notify_scroll();
    e.notify_resize();
    e.tick(ms(32));
    assert!(e.layer_transform("bg").is_some());
    assert!(e.unregister_layer("bg"));
    assert_eq!(e.parallax().len(), 0);
}

#[test]
fn invalid_config_is_rejected() {
    let config = EngineConfig {
        easing: crate::animation::ease::EasingDef::Name("nope".into()),
        ..EngineConfig::default()
    };
    assert!(ProgressEngine::new(&config, SharedScroll::new()).is_err());
}
