use markline_core::{DEFAULT_MARKER_NAME, MarkerError, MarkerStore};

fn times(store: &MarkerStore) -> Vec<f64> {
    store.markers().iter().map(|marker| marker.time).collect()
}

fn names(store: &MarkerStore) -> Vec<&str> {
    store
        .markers()
        .iter()
        .map(|marker| marker.name.as_str())
        .collect()
}

#[test]
fn add_keeps_markers_ascending_with_stable_ties() {
    let mut store = MarkerStore::new(10.0);
    store.add(7.5, "late").expect("in range");
    store.add(1.0, "early").expect("in range");
    store.add(4.0, "first at four").expect("in range");
    store.add(4.0, "second at four").expect("in range");

    assert_eq!(times(&store), vec![1.0, 4.0, 4.0, 7.5]);
    assert_eq!(
        names(&store),
        vec!["early", "first at four", "second at four", "late"]
    );
}

#[test]
fn empty_name_is_stored_as_default() {
    let mut store = MarkerStore::new(10.0);
    let marker = store.add(5.0, "").expect("in range");

    assert_eq!(marker.name, DEFAULT_MARKER_NAME);
    assert_eq!(store.markers()[0].name, DEFAULT_MARKER_NAME);
}

#[test]
fn out_of_range_add_leaves_store_unchanged() {
    let mut store = MarkerStore::new(3.0);
    store.add(1.0, "kept").expect("in range");
    let revision = store.revision();

    assert_eq!(
        store.add(3.5, "past end"),
        Err(MarkerError::OutOfRange {
            time: 3.5,
            duration: 3.0
        })
    );
    assert!(store.add(-0.1, "before start").is_err());
    assert!(store.add(f64::NAN, "nan").is_err());
    assert_eq!(store.len(), 1);
    assert_eq!(store.revision(), revision);

    store.add(3.0, "at end").expect("boundary is inclusive");
    store.add(0.0, "at start").expect("boundary is inclusive");
    assert_eq!(store.len(), 3);
}

#[test]
fn rename_applies_fallback_for_empty_input() {
    let mut store = MarkerStore::new(10.0);
    let marker = store.add(2.0, "Verse").expect("in range");

    store
        .rename(marker.id, "Chorus", "Untitled")
        .expect("rename should succeed");
    assert_eq!(store.get(marker.id).map(|m| m.name.as_str()), Some("Chorus"));

    store
        .rename(marker.id, "", "Take 1")
        .expect("rename should succeed");
    assert_eq!(store.get(marker.id).map(|m| m.name.as_str()), Some("Take 1"));

    store.rename(marker.id, "", "").expect("rename should succeed");
    assert_eq!(
        store.get(marker.id).map(|m| m.name.as_str()),
        Some(DEFAULT_MARKER_NAME)
    );
}

#[test]
fn unknown_marker_ids_are_reported() {
    let mut store = MarkerStore::new(10.0);
    let stray = uuid::Uuid::new_v4();

    assert_eq!(
        store.rename(stray, "x", "y"),
        Err(MarkerError::NotFound(stray))
    );
    assert_eq!(store.move_marker(stray, 1.0), Err(MarkerError::NotFound(stray)));
}

#[test]
fn drag_moves_defer_reordering_until_resort() {
    let mut store = MarkerStore::new(10.0);
    let dragged = store.add(2.0, "dragged").expect("in range");
    store.add(5.0, "middle").expect("in range");
    store.add(9.0, "last").expect("in range");

    for time in [4.0, 6.0, 8.0] {
        store
            .move_marker(dragged.id, time)
            .expect("move should succeed");
        assert_eq!(store.markers()[0].id, dragged.id);
    }
    assert_eq!(times(&store), vec![8.0, 5.0, 9.0]);
    assert!(!store.is_sorted());

    store.resort();
    assert_eq!(names(&store), vec!["middle", "dragged", "last"]);
    assert!(store.is_sorted());
}

#[test]
fn move_clamps_into_timeline() {
    let mut store = MarkerStore::new(4.0);
    let marker = store.add(1.0, "m").expect("in range");

    assert_eq!(store.move_marker(marker.id, 12.0), Ok(4.0));
    assert_eq!(store.move_marker(marker.id, -3.0), Ok(0.0));
    assert_eq!(store.move_marker(marker.id, f64::NAN), Ok(0.0));
}

#[test]
fn export_text_is_aligned_and_fixed_precision() {
    let mut store = MarkerStore::new(10.0);
    store.add(0.1, "Intro").expect("in range");
    store.add(2.0, "Verse").expect("in range");
    store.add(1.23456, "Pickup").expect("in range");

    let export = store.export_text();
    assert_eq!(export.timestamps, vec!["0.100", "1.235", "2.000"]);
    assert_eq!(export.names, vec!["Intro", "Pickup", "Verse"]);
    assert_eq!(export.timestamps_block(), "0.100\n1.235\n2.000");
    assert_eq!(export.names_block(), "Intro\nPickup\nVerse");
}

#[test]
fn clear_empties_and_export_stays_aligned() {
    let mut store = MarkerStore::new(10.0);
    store.add(1.0, "a").expect("in range");
    store.add(2.0, "b").expect("in range");
    store.clear();

    let export = store.export_text();
    assert!(store.is_empty());
    assert!(export.is_empty());
    assert_eq!(export.timestamps_block(), "");
    assert_eq!(export.names_block(), "");
}

#[test]
fn shorter_duration_pulls_markers_back_onto_timeline() {
    let mut store = MarkerStore::new(10.0);
    store.add(9.0, "tail").expect("in range");
    store.add(3.0, "body").expect("in range");

    store.set_duration(5.0);
    assert_eq!(times(&store), vec![3.0, 5.0]);
    assert_eq!(store.duration(), 5.0);
}

#[test]
fn markers_between_uses_half_open_window() {
    let mut store = MarkerStore::new(10.0);
    store.add(1.0, "one").expect("in range");
    store.add(2.0, "two").expect("in range");
    store.add(3.0, "three").expect("in range");

    let crossed: Vec<&str> = store
        .markers_between(1.0, 3.0)
        .map(|marker| marker.name.as_str())
        .collect();
    assert_eq!(crossed, vec!["two", "three"]);
}

#[test]
fn every_mutation_bumps_revision() {
    let mut store = MarkerStore::new(10.0);
    let mut last = store.revision();
    let marker = store.add(1.0, "a").expect("in range");
    assert!(store.revision() > last);

    last = store.revision();
    store.rename(marker.id, "b", "c").expect("rename should succeed");
    assert!(store.revision() > last);

    last = store.revision();
    store.move_marker(marker.id, 2.0).expect("move should succeed");
    assert!(store.revision() > last);

    last = store.revision();
    store.clear();
    assert!(store.revision() > last);
}

#[test]
fn next_manual_name_counts_from_one() {
    let mut store = MarkerStore::new(10.0);
    assert_eq!(store.next_manual_name(), "Marker 1");
    store.add(1.0, "x").expect("in range");
    assert_eq!(store.next_manual_name(), "Marker 2");
}
