use super::*;
use crate::geometry::{perimeter, regular_polygon};

fn square(side: f64) -> Vec<Vec2> {
    vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(side, 0.0),
        Vec2::new(side, side),
        Vec2::new(0.0, side),
    ]
}

#[test]
fn from_points_links_a_closed_cycle() {
    let ring = PolygonRing::from_points(&square(2.0)).expect("valid ring");
    assert_eq!(ring.len(), 4);
    assert!(ring.is_consistent());
    let tracks: Vec<u64> = ring.ids(Direction::Forward).map(|id| ring.node(id).track()).collect();
    assert_eq!(tracks, vec![0, 1, 2, 3]);
    let back: Vec<u64> = ring.ids(Direction::Backward).map(|id| ring.node(id).track()).collect();
    assert_eq!(back, vec![0, 3, 2, 1]);
}

#[test]
fn fewer_than_three_points_are_rejected() {
    let err = PolygonRing::from_points(&[Vec2::zeros(), Vec2::new(1.0, 0.0)]).unwrap_err();
    assert_eq!(err, RingError::TooFewNodes(2));
}

#[test]
fn insert_after_respects_direction() {
    let mut ring = PolygonRing::from_points(&square(2.0)).expect("valid ring");
    let head = ring.head();
    let fwd = ring.insert_after(head, Direction::Forward, Vec2::new(1.0, 0.0));
    assert_eq!(ring.next(head, Direction::Forward), fwd);
    let bwd = ring.insert_after(head, Direction::Backward, Vec2::new(0.0, 1.0));
    assert_eq!(ring.next(head, Direction::Backward), bwd);
    assert_eq!(ring.len(), 6);
    assert!(ring.is_consistent());
    assert!(ring.node(bwd).track() > ring.node(fwd).track());
}

#[test]
fn remove_below_three_nodes_leaves_ring_untouched() {
    let mut ring = PolygonRing::from_points(&square(2.0)).expect("valid ring");
    let head = ring.head();
    ring.remove(head).expect("4 -> 3 is allowed");
    assert_eq!(ring.len(), 3);
    let before = ring.clone();
    let victim = ring.head();
    assert_eq!(ring.remove(victim), Err(RingError::TooFewNodes(2)));
    assert_eq!(ring, before);
}

#[test]
fn removing_the_head_moves_it_forward() {
    let mut ring = PolygonRing::from_points(&square(2.0)).expect("valid ring");
    let head = ring.head();
    let successor = ring.next(head, Direction::Forward);
    ring.remove(head).expect("removal allowed");
    assert_eq!(ring.head(), successor);
    assert!(!ring.contains(head));
    assert!(ring.is_consistent());
}

#[test]
fn freed_slots_are_reused_with_new_tracks() {
    let mut ring = PolygonRing::from_points(&square(2.0)).expect("valid ring");
    let victim = ring.next(ring.head(), Direction::Forward);
    let old_track = ring.node(victim).track();
    ring.remove(victim).expect("removal allowed");
    let fresh = ring.insert_after(ring.head(), Direction::Forward, Vec2::new(1.0, -1.0));
    assert_eq!(fresh, victim);
    assert!(!ring.holds(fresh, old_track));
    assert!(ring.node(fresh).track() > old_track);
}

#[test]
fn excise_replaces_span_and_reassigns_head() {
    let pts = regular_polygon(Vec2::zeros(), 10.0, 8);
    let mut ring = PolygonRing::from_points(&pts).expect("valid ring");
    let ids: Vec<NodeId> = ring.ids(Direction::Forward).collect();
    // Remove nodes 7, 0, 1 (the head among them) between 6 and 2.
    let (new_id, removed) = ring
        .excise(ids[6], ids[2], Direction::Forward, Vec2::new(9.0, 0.0))
        .expect("excision allowed");
    assert_eq!(removed.len(), 3);
    assert_eq!(ring.len(), 6);
    assert_eq!(ring.head(), new_id);
    assert_eq!(ring.next(ids[6], Direction::Forward), new_id);
    assert_eq!(ring.next(new_id, Direction::Forward), ids[2]);
    assert!(ring.is_consistent());
}

#[test]
fn excise_refuses_to_leave_fewer_than_three_nodes() {
    let mut ring = PolygonRing::from_points(&square(2.0)).expect("valid ring");
    let ids: Vec<NodeId> = ring.ids(Direction::Forward).collect();
    let before = ring.clone();
    let err = ring.excise(ids[0], ids[0], Direction::Forward, Vec2::zeros());
    assert!(err.is_err());
    assert_eq!(ring, before);
}

#[test]
fn resample_to_count_keeps_perimeter_of_square() {
    let mut ring = PolygonRing::from_points(&square(10.0)).expect("valid ring");
    let original = ring.perimeter();
    ring.resample_to_count(40, Direction::Forward).expect("resample");
    assert_eq!(ring.len(), 40);
    assert!(ring.is_consistent());
    let resampled = perimeter(&ring.positions(Direction::Forward));
    assert!(
        ((resampled - original) / original).abs() < 1e-6,
        "perimeter changed: {original} -> {resampled}"
    );
}

#[test]
fn resample_to_count_is_exact_on_irregular_polygon() {
    let pts = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(7.3, 0.0),
        Vec2::new(7.3, 0.0),
        Vec2::new(11.0, 5.5),
        Vec2::new(2.0, 9.0),
    ];
    for count in [3usize, 7, 25, 64] {
        let mut ring = PolygonRing::from_points(&pts).expect("valid ring");
        ring.resample_to_count(count, Direction::Forward).expect("resample");
        assert_eq!(ring.len(), count);
        assert!(ring.is_consistent());
    }
}

#[test]
fn resample_by_spacing_backward_keeps_orientation_reversed() {
    let mut ring = PolygonRing::from_points(&square(10.0)).expect("valid ring");
    let first_track = ring.next_track();
    ring.resample(2.0, Direction::Backward).expect("resample");
    assert_eq!(ring.len(), 20);
    // Walking backward now reproduces the order the samples were taken in.
    let pts = ring.positions(Direction::Backward);
    assert_eq!(pts[0], Vec2::new(0.0, 0.0));
    assert_eq!(pts[1], Vec2::new(0.0, 2.0));
    assert!(ring.node(ring.head()).track() >= first_track);
}

#[test]
fn normals_face_inward_for_counter_clockwise_ring() {
    let mut ring = PolygonRing::from_points(&square(2.0)).expect("valid ring");
    ring.compute_normals(Direction::Forward, true);
    let center = Vec2::new(1.0, 1.0);
    for id in ring.ids(Direction::Forward).collect::<Vec<_>>() {
        let node = ring.node(id);
        assert!((node.normal.norm() - 1.0).abs() < 1e-12);
        assert!(node.normal.dot(&(center - node.pos)) > 0.0);
    }
    ring.compute_normals(Direction::Forward, false);
    for id in ring.ids(Direction::Forward).collect::<Vec<_>>() {
        let node = ring.node(id);
        assert!(node.normal.dot(&(center - node.pos)) < 0.0);
    }
}
