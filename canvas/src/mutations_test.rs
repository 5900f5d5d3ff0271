#![allow(clippy::float_cmp)]

use std::collections::HashSet;

use super::*;
use crate::doc::{LayerKind, Shape, Storage};
use crate::room::LocalRoom;

const MAX: usize = 100;
const SIZE: f64 = 100.0;

fn room() -> LocalRoom {
    LocalRoom::new(1, 100)
}

fn add(room: &mut LocalRoom, bounds: Bounds) -> LayerId {
    let id = Uuid::new_v4();
    room.apply_remote(|storage| storage.insert(id, Layer::new(Shape::Rectangle, bounds, Color::BLACK)));
    id
}

fn select(room: &mut LocalRoom, ids: &[LayerId]) {
    room.update_presence(PresencePatch::selection(ids.to_vec()), Tracking::Skip);
}

fn bounds_of(room: &LocalRoom, id: &LayerId) -> Bounds {
    room.storage().get(id).map(Layer::bounds).unwrap()
}

fn assert_z_order_invariant(storage: &Storage) {
    let listed: HashSet<LayerId> = storage.layer_ids().iter().copied().collect();
    assert_eq!(listed.len(), storage.layer_ids().len(), "z-order lists an id twice");
    assert_eq!(listed.len(), storage.len());
    assert!(listed.iter().all(|id| storage.contains(id)));
    assert!(storage.check_integrity().is_ok());
}

// =============================================================
// Insert
// =============================================================

#[test]
fn insert_creates_default_layer_and_selects_it() {
    let mut room = room();
    let fill = Color::new(200, 10, 10);
    let id = insert_layer(&mut room, InsertableKind::Note, Point::new(30.0, 40.0), fill, SIZE, MAX).unwrap();

    let layer = room.storage().get(&id).unwrap();
    assert_eq!(layer.kind(), LayerKind::Note);
    assert_eq!(layer.bounds(), Bounds::new(30.0, 40.0, 100.0, 100.0));
    assert_eq!(layer.fill, fill);
    assert_eq!(room.storage().layer_ids(), &[id]);
    assert_eq!(room.presence().selection, vec![id]);
    assert_eq!(room.history().undo_len(), 1);
}

#[test]
fn insert_appends_on_top() {
    let mut room = room();
    let a = add(&mut room, Bounds::default());
    let b = insert_layer(&mut room, InsertableKind::Text, Point::default(), Color::BLACK, SIZE, MAX).unwrap();
    assert_eq!(room.storage().layer_ids(), &[a, b]);
}

#[test]
fn insert_beyond_capacity_is_silent_noop() {
    let mut room = room();
    for _ in 0..MAX {
        add(&mut room, Bounds::new(0.0, 0.0, 1.0, 1.0));
    }
    let before = room.storage().clone();
    let result = insert_layer(&mut room, InsertableKind::Rectangle, Point::default(), Color::BLACK, SIZE, MAX);
    assert_eq!(result, None);
    assert_eq!(room.storage().len(), MAX);
    assert_eq!(room.storage(), &before);
    assert!(!room.can_undo());
}

#[test]
fn undo_removes_inserted_layer_and_selection() {
    let mut room = room();
    insert_layer(&mut room, InsertableKind::Ellipse, Point::default(), Color::BLACK, SIZE, MAX).unwrap();
    assert!(room.undo());
    assert!(room.storage().is_empty());
    assert!(room.presence().selection.is_empty());
}

// =============================================================
// Translate / resize
// =============================================================

#[test]
fn translate_moves_every_selected_layer() {
    let mut room = room();
    let a = add(&mut room, Bounds::new(0.0, 0.0, 10.0, 10.0));
    let b = add(&mut room, Bounds::new(50.0, 50.0, 10.0, 10.0));
    let c = add(&mut room, Bounds::new(90.0, 90.0, 10.0, 10.0));
    select(&mut room, &[a, b]);
    translate_selection(&mut room, Point::new(5.0, -5.0));
    assert_eq!(bounds_of(&room, &a), Bounds::new(5.0, -5.0, 10.0, 10.0));
    assert_eq!(bounds_of(&room, &b), Bounds::new(55.0, 45.0, 10.0, 10.0));
    assert_eq!(bounds_of(&room, &c), Bounds::new(90.0, 90.0, 10.0, 10.0));
}

#[test]
fn translate_tolerates_concurrently_deleted_layer() {
    let mut room = room();
    let a = add(&mut room, Bounds::new(0.0, 0.0, 10.0, 10.0));
    let b = add(&mut room, Bounds::new(50.0, 50.0, 10.0, 10.0));
    select(&mut room, &[a, b]);
    room.apply_remote(|storage| {
        storage.remove(&a);
    });
    translate_selection(&mut room, Point::new(1.0, 1.0));
    assert!(!room.storage().contains(&a));
    assert_eq!(bounds_of(&room, &b), Bounds::new(51.0, 51.0, 10.0, 10.0));
}

#[test]
fn resize_applies_to_selection_head_from_initial_bounds() {
    let mut room = room();
    let a = add(&mut room, Bounds::new(0.0, 0.0, 50.0, 50.0));
    let b = add(&mut room, Bounds::new(100.0, 100.0, 50.0, 50.0));
    select(&mut room, &[a, b]);
    let initial = Bounds::new(0.0, 0.0, 50.0, 50.0);
    resize_selection(&mut room, initial, Side::RIGHT, Point::new(80.0, 999.0));
    resize_selection(&mut room, initial, Side::RIGHT, Point::new(60.0, 999.0));
    assert_eq!(bounds_of(&room, &a), Bounds::new(0.0, 0.0, 60.0, 50.0));
    assert_eq!(bounds_of(&room, &b), Bounds::new(100.0, 100.0, 50.0, 50.0));
}

#[test]
fn resize_past_fixed_edge_flips() {
    let mut room = room();
    let a = add(&mut room, Bounds::new(0.0, 0.0, 50.0, 50.0));
    select(&mut room, &[a]);
    resize_selection(&mut room, Bounds::new(0.0, 0.0, 50.0, 50.0), Side::RIGHT, Point::new(-20.0, 0.0));
    assert_eq!(bounds_of(&room, &a), Bounds::new(-20.0, 0.0, 20.0, 50.0));
}

#[test]
fn resize_without_selection_is_noop() {
    let mut room = room();
    let a = add(&mut room, Bounds::new(0.0, 0.0, 50.0, 50.0));
    resize_selection(&mut room, Bounds::new(0.0, 0.0, 50.0, 50.0), Side::LEFT, Point::new(10.0, 0.0));
    assert_eq!(bounds_of(&room, &a), Bounds::new(0.0, 0.0, 50.0, 50.0));
    assert!(!room.can_undo());
}

// =============================================================
// Delete
// =============================================================

#[test]
fn delete_removes_selected_layers_and_clears_selection() {
    let mut room = room();
    let a = add(&mut room, Bounds::default());
    let b = add(&mut room, Bounds::default());
    let c = add(&mut room, Bounds::default());
    select(&mut room, &[a, c]);
    let removed = delete_selection(&mut room);
    assert_eq!(removed, vec![a, c]);
    assert_eq!(room.storage().layer_ids(), &[b]);
    assert!(room.presence().selection.is_empty());
    assert_z_order_invariant(room.storage());
    assert_eq!(room.history().undo_len(), 1);
}

#[test]
fn delete_tolerates_missing_ids() {
    let mut room = room();
    let a = add(&mut room, Bounds::default());
    let ghost = Uuid::new_v4();
    select(&mut room, &[ghost, a]);
    assert_eq!(delete_selection(&mut room), vec![a]);
    assert!(room.storage().is_empty());
}

#[test]
fn undo_restores_deleted_layers_in_place() {
    let mut room = room();
    let a = add(&mut room, Bounds::default());
    let b = add(&mut room, Bounds::default());
    select(&mut room, &[a]);
    delete_selection(&mut room);
    assert!(room.undo());
    assert_eq!(room.storage().layer_ids(), &[a, b]);
    assert_eq!(room.presence().selection, vec![a]);
}

// =============================================================
// Reorder
// =============================================================

fn abcd(room: &mut LocalRoom) -> [LayerId; 4] {
    [add(room, Bounds::default()), add(room, Bounds::default()), add(room, Bounds::default()), add(room, Bounds::default())]
}

#[test]
fn bring_to_front_preserves_relative_order() {
    let mut room = room();
    let [a, b, c, d] = abcd(&mut room);
    select(&mut room, &[d, b]);
    bring_to_front(&mut room);
    assert_eq!(room.storage().layer_ids(), &[a, c, b, d]);
    assert_eq!(room.history().undo_len(), 1);
}

#[test]
fn send_to_back_preserves_relative_order() {
    let mut room = room();
    let [a, b, c, d] = abcd(&mut room);
    select(&mut room, &[b, d]);
    send_to_back(&mut room);
    assert_eq!(room.storage().layer_ids(), &[b, d, a, c]);
}

#[test]
fn reorder_of_already_ordered_selection_records_nothing() {
    let mut room = room();
    let [a, b, c, d] = abcd(&mut room);
    select(&mut room, &[c, d]);
    bring_to_front(&mut room);
    assert_eq!(room.storage().layer_ids(), &[a, b, c, d]);
    assert!(!room.can_undo());
}

#[test]
fn reorder_ignores_unlisted_ids() {
    let mut room = room();
    let [a, b, c, d] = abcd(&mut room);
    select(&mut room, &[Uuid::new_v4(), a]);
    bring_to_front(&mut room);
    assert_eq!(room.storage().layer_ids(), &[b, c, d, a]);
    send_to_back(&mut room);
    assert_eq!(room.storage().layer_ids(), &[a, b, c, d]);
}

#[test]
fn z_order_invariant_survives_mixed_operations() {
    let mut room = room();
    let [a, _, c, _] = abcd(&mut room);
    for i in 0..5 {
        insert_layer(&mut room, InsertableKind::Rectangle, Point::new(f64::from(i), 0.0), Color::BLACK, SIZE, MAX);
        assert_z_order_invariant(room.storage());
    }
    select(&mut room, &[a, c]);
    bring_to_front(&mut room);
    assert_z_order_invariant(room.storage());
    send_to_back(&mut room);
    assert_z_order_invariant(room.storage());
    delete_selection(&mut room);
    assert_z_order_invariant(room.storage());
    assert_eq!(room.storage().len(), 7);
    while room.undo() {
        assert_z_order_invariant(room.storage());
    }
}

// =============================================================
// Fill / text
// =============================================================

#[test]
fn set_fill_colors_selection_only() {
    let mut room = room();
    let a = add(&mut room, Bounds::default());
    let b = add(&mut room, Bounds::default());
    select(&mut room, &[a]);
    set_fill(&mut room, Color::new(1, 2, 3));
    assert_eq!(room.storage().get(&a).unwrap().fill, Color::new(1, 2, 3));
    assert_eq!(room.storage().get(&b).unwrap().fill, Color::BLACK);
    assert!(room.can_undo());
}

#[test]
fn update_text_is_not_undoable() {
    let mut room = room();
    let a = add(&mut room, Bounds::default());
    update_text(&mut room, a, "hello");
    assert_eq!(room.storage().get(&a).unwrap().value.as_deref(), Some("hello"));
    assert!(!room.can_undo());
}

#[test]
fn update_text_on_missing_layer_is_noop() {
    let mut room = room();
    update_text(&mut room, Uuid::new_v4(), "hello");
    assert!(room.storage().is_empty());
}

// =============================================================
// Selection
// =============================================================

#[test]
fn clear_selection_records_only_when_something_was_selected() {
    let mut room = room();
    clear_selection(&mut room);
    assert!(!room.can_undo());

    let a = add(&mut room, Bounds::default());
    select_layer(&mut room, a);
    assert_eq!(room.history().undo_len(), 1);
    clear_selection(&mut room);
    assert!(room.presence().selection.is_empty());
    assert_eq!(room.history().undo_len(), 2);
}

// =============================================================
// Pencil
// =============================================================

#[test]
fn draft_lifecycle_commits_normalized_path() {
    let mut room = room();
    let pen = Color::new(0, 128, 0);
    start_draft(&mut room, Point::new(10.0, 10.0), 0.5, pen);
    assert_eq!(room.presence().pen_color, Some(pen));
    extend_draft(&mut room, Point::new(20.0, 30.0), 0.5);
    assert_eq!(room.presence().cursor, Some(Point::new(20.0, 30.0)));

    let id = commit_path(&mut room, pen, MAX).unwrap();
    let layer = room.storage().get(&id).unwrap();
    assert_eq!(layer.bounds(), Bounds::new(10.0, 10.0, 10.0, 20.0));
    assert_eq!(layer.points(), &[PathPoint::new(0.0, 0.0, 0.5), PathPoint::new(10.0, 20.0, 0.5)]);
    assert_eq!(layer.fill, pen);
    assert_eq!(room.presence().pencil_draft, None);
    assert!(room.presence().selection.is_empty());
}

#[test]
fn duplicate_first_sample_is_dropped() {
    let mut room = room();
    start_draft(&mut room, Point::new(5.0, 5.0), 0.5, Color::BLACK);
    extend_draft(&mut room, Point::new(5.0, 5.0), 0.7);
    assert_eq!(room.presence().pencil_draft.as_ref().map(Vec::len), Some(1));
    extend_draft(&mut room, Point::new(6.0, 5.0), 0.7);
    extend_draft(&mut room, Point::new(6.0, 5.0), 0.7);
    assert_eq!(room.presence().pencil_draft.as_ref().map(Vec::len), Some(3));
}

#[test]
fn extend_without_draft_is_noop() {
    let mut room = room();
    extend_draft(&mut room, Point::new(1.0, 1.0), 0.5);
    assert_eq!(room.presence().pencil_draft, None);
    assert_eq!(room.presence().cursor, None);
}

#[test]
fn single_point_stroke_is_discarded() {
    let mut room = room();
    start_draft(&mut room, Point::new(5.0, 5.0), 1.0, Color::BLACK);
    assert_eq!(commit_path(&mut room, Color::BLACK, MAX), None);
    assert!(room.storage().is_empty());
    assert_eq!(room.presence().pencil_draft, None);
    assert!(!room.can_undo());
}

#[test]
fn stroke_on_full_board_is_discarded() {
    let mut room = room();
    add(&mut room, Bounds::default());
    start_draft(&mut room, Point::new(0.0, 0.0), 0.5, Color::BLACK);
    extend_draft(&mut room, Point::new(9.0, 9.0), 0.5);
    assert_eq!(commit_path(&mut room, Color::BLACK, 1), None);
    assert_eq!(room.storage().len(), 1);
    assert_eq!(room.presence().pencil_draft, None);
}

#[test]
fn commit_without_draft_is_noop() {
    let mut room = room();
    assert_eq!(commit_path(&mut room, Color::BLACK, MAX), None);
    assert!(!room.can_undo());
}
