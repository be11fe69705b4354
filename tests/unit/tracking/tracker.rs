use super::*;
use std::cell::RefCell;
use std::rc::Rc;

fn kinds(d: &SegmentDispatch) -> Vec<(String, SegmentEventKind)> {
    d.events().map(|e| (e.segment.id.clone(), e.kind)).collect()
}

#[test]
fn enter_then_exit_without_trailing_progress() {
    let mut t = SegmentTracker::with_segments([Segment::new("s", 0.0, 0.3)]).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    let _sub = {
        let log = Rc::clone(&log);
        t.subscribe("s", move |e| log.borrow_mut().push(e.kind))
    };

    t.update(0.1).deliver();
    t.update(0.4).deliver();
    t.update(0.5).deliver();

    assert_eq!(
        *log.borrow(),
        vec![SegmentEventKind::Enter, SegmentEventKind::Exit]
    );
}

#[test]
fn enter_reports_local_progress_and_exit_reports_boundary() {
    let mut t = SegmentTracker::with_segments([Segment::new("s", 0.2, 0.6)]).unwrap();
    let enter = t.update(0.3);
    let e = enter.events().next().unwrap();
    assert_eq!(e.kind, SegmentEventKind::Enter);
    assert!((e.segment_progress - 0.25).abs() < 1e-12);

    let progress = t.update(0.5);
    let p = progress.events().next().unwrap();
    assert_eq!(p.kind, SegmentEventKind::Progress);
    assert!((p.segment_progress - 0.75).abs() < 1e-12);

    let exit_forward = t.update(0.9);
    let x = exit_forward.events().next().unwrap();
    assert_eq!(x.kind, SegmentEventKind::Exit);
    assert_eq!(x.segment_progress, 1.0);

    let _ = t.update(0.4);
    let exit_backward = t.update(0.1);
    let x = exit_backward.events().next().unwrap();
    assert_eq!(x.kind, SegmentEventKind::Exit);
    assert_eq!(x.segment_progress, 0.0);
    assert_eq!(x.direction, Direction::Backward);
}

#[test]
fn direction_is_attached_to_every_event_of_a_tick() {
    let mut t = SegmentTracker::with_segments([
        Segment::new("a", 0.0, 1.0),
        Segment::new("b", 0.35, 0.45),
        Segment::new("c", 0.45, 0.55),
    ])
    .unwrap();

    let _ = t.update(0.5);
    let back = t.update(0.4);
    assert!(!back.is_empty());
    assert!(back.events().all(|e| e.direction == Direction::Backward));

    let _ = t.update(0.3);
    let fwd = t.update(0.5);
    assert!(!fwd.is_empty());
    assert!(fwd.events().all(|e| e.direction == Direction::Forward));
}

#[test]
fn overlapping_segments_are_independent() {
    let mut t = SegmentTracker::with_segments([
        Segment::new("a", 0.0, 0.6),
        Segment::new("b", 0.4, 1.0),
    ])
    .unwrap();
    let d = t.update(0.5);
    assert_eq!(
        kinds(&d),
        vec![
            ("a".to_owned(), SegmentEventKind::Enter),
            ("b".to_owned(), SegmentEventKind::Enter),
        ]
    );
    assert!(t.is_active("a"));
    assert!(t.is_active("b"));

    assert!(t.remove_segment("a").is_some());
    assert!(!t.is_active("a"));
    assert!(t.is_active("b"));

    let d = t.update(0.55);
    assert_eq!(kinds(&d), vec![("b".to_owned(), SegmentEventKind::Progress)]);
}

#[test]
fn adding_does_not_emit_retroactively() {
    let mut t = SegmentTracker::new();
    let _ = t.update(0.5);
    t.add_segment(Segment::new("late", 0.0, 1.0)).unwrap();
    assert!(!t.is_active("late"));

    let d = t.update(0.5);
    assert_eq!(kinds(&d), vec![("late".to_owned(), SegmentEventKind::Enter)]);
}

#[test]
fn last_progress_updates_even_without_segments() {
    let mut t = SegmentTracker::new();
    let d = t.update(0.7);
    assert!(d.is_empty());
    assert_eq!(t.last_progress(), 0.7);
}

#[test]
fn progress_is_clamped() {
    let mut t = SegmentTracker::with_segments([Segment::new("end", 0.9, 1.5)]).unwrap();
    let d = t.update(3.0);
    let e = d.events().next().unwrap();
    assert_eq!(e.path_progress, 1.0);
    assert!((e.segment_progress - (0.1 / 0.6)).abs() < 1e-12);
}

#[test]
fn degenerate_segment_reports_zero_progress() {
    let mut t = SegmentTracker::with_segments([Segment::new("pin", 0.5, 0.5)]).unwrap();
    let d = t.update(0.5);
    let e = d.events().next().unwrap();
    assert_eq!(e.kind, SegmentEventKind::Enter);
    assert_eq!(e.segment_progress, 0.0);
}

#[test]
fn active_segments_follow_insertion_order() {
    let mut t = SegmentTracker::with_segments([
        Segment::new("late", 0.5, 1.0),
        Segment::new("early", 0.0, 0.8),
    ])
    .unwrap();
    let _ = t.update(0.1);
    let _ = t.update(0.6);
    let ids: Vec<_> = t.active_segments().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["late", "early"]);
}

#[test]
fn unknown_ids_are_harmless() {
    let mut t = SegmentTracker::new();
    assert!(!t.is_active("ghost"));
    assert!(t.active_segments().is_empty());
    assert!(t.remove_segment("ghost").is_none());
    let mut sub = t.subscribe("ghost", |_| {});
    assert!(!sub.is_attached());
    sub.unsubscribe();
}

#[test]
fn duplicate_and_invalid_segments_are_rejected() {
    let mut t = SegmentTracker::with_segments([Segment::new("a", 0.0, 0.5)]).unwrap();
    assert!(t.add_segment(Segment::new("a", 0.2, 0.3)).is_err());
    assert!(t.add_segment(Segment::new("b", 0.6, 0.3)).is_err());
    assert_eq!(t.segments().len(), 1);
}

#[test]
fn multiple_callbacks_run_in_registration_order() {
    let mut t = SegmentTracker::with_segments([Segment::new("s", 0.0, 1.0)]).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    let subs: Vec<_> = (0..3)
        .map(|i| {
            let log = Rc::clone(&log);
            t.subscribe("s", move |_| log.borrow_mut().push(i))
        })
        .collect();
    assert!(subs.iter().all(|s| s.is_attached()));
    t.update(0.5).deliver();
    assert_eq!(*log.borrow(), vec![0, 1, 2]);
}

#[test]
fn subscribe_all_covers_only_current_segments() {
    let mut t = SegmentTracker::with_segments(equal_split_pair()).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut all = {
        let seen = Rc::clone(&seen);
        t.subscribe_all(move |e| seen.borrow_mut().push(e.segment.id.clone()))
    };
    assert_eq!(all.len(), 2);

    t.add_segment(Segment::new("added-later", 0.0, 1.0)).unwrap();
    t.update(0.25).deliver();
    assert_eq!(*seen.borrow(), vec!["first".to_owned()]);

    all.unsubscribe();
    all.unsubscribe();
    t.update(0.75).deliver();
    assert_eq!(seen.borrow().len(), 1);
}

fn equal_split_pair() -> Vec<Segment> {
    vec![
        Segment::new("first", 0.0, 0.5),
        Segment::new("second", 0.5 + f64::EPSILON, 1.0),
    ]
}

#[test]
fn removing_segment_discards_its_subscriptions() {
    let mut t = SegmentTracker::with_segments([Segment::new("s", 0.0, 1.0)]).unwrap();
    let hits = Rc::new(RefCell::new(0));
    let mut sub = {
        let hits = Rc::clone(&hits);
        t.subscribe("s", move |_| *hits.borrow_mut() += 1)
    };
    let pending = t.update(0.5);
    t.remove_segment("s");
    pending.deliver();
    assert_eq!(*hits.borrow(), 0);

    // Re-adding starts with a fresh subscriber list.
    t.add_segment(Segment::new("s", 0.0, 1.0)).unwrap();
    t.update(0.6).deliver();
    assert_eq!(*hits.borrow(), 0);
    sub.unsubscribe();
}

#[test]
fn callback_may_unsubscribe_itself_mid_delivery() {
    let mut t = SegmentTracker::with_segments([Segment::new("s", 0.0, 1.0)]).unwrap();
    let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let hits = Rc::new(RefCell::new(0));
    let sub = {
        let slot = Rc::clone(&slot);
        let hits = Rc::clone(&hits);
        t.subscribe("s", move |_| {
            *hits.borrow_mut() += 1;
            if let Some(s) = slot.borrow_mut().as_mut() {
                s.unsubscribe();
            }
        })
    };
    *slot.borrow_mut() = Some(sub);

    t.update(0.2).deliver();
    t.update(0.3).deliver();
    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn reset_exits_active_segments_before_clearing() {
    let mut t = SegmentTracker::with_segments([
        Segment::new("a", 0.0, 0.6),
        Segment::new("b", 0.4, 1.0),
        Segment::new("c", 0.8, 1.0),
    ])
    .unwrap();
    let _ = t.update(0.5);

    let d = t.reset(0.0);
    assert_eq!(
        kinds(&d),
        vec![
            ("a".to_owned(), SegmentEventKind::Exit),
            ("b".to_owned(), SegmentEventKind::Exit),
        ]
    );
    for e in d.events() {
        assert_eq!(e.segment_progress, 0.0);
        assert_eq!(e.path_progress, 0.0);
        assert_eq!(e.direction, Direction::Backward);
    }
    assert!(t.active_segments().is_empty());
    assert_eq!(t.last_progress(), 0.0);

    assert!(t.reset(0.0).is_empty());
}

#[test]
fn enter_and_exit_stay_paired_across_reset() {
    let mut t = SegmentTracker::with_segments([Segment::new("s", 0.0, 1.0)]).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    let _sub = {
        let log = Rc::clone(&log);
        t.subscribe("s", move |e| log.borrow_mut().push(e.kind))
    };

    t.update(0.5).deliver();
    t.reset(0.0).deliver();
    assert!(!t.is_active("s"));
    t.update(0.5).deliver();

    assert_eq!(
        *log.borrow(),
        vec![
            SegmentEventKind::Enter,
            SegmentEventKind::Exit,
            SegmentEventKind::Enter,
        ]
    );
}

#[test]
fn clear_drops_everything() {
    let mut t = SegmentTracker::with_segments([Segment::new("s", 0.0, 1.0)]).unwrap();
    let _ = t.update(0.5);
    t.clear();
    assert!(t.segments().is_empty());
    assert!(!t.is_active("s"));
    assert!(t.segment("s").is_none());
}
