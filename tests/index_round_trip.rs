use std::sync::Arc;
use std::thread;

use restable::construct::{package_identifier, ResName, FRAMEWORK_PACKAGE_IDENTIFIER};
use restable::error::ResourceError;
use restable::index::ResourceIndex;

fn setup() -> ResourceIndex {
    let index = ResourceIndex::new("com.example");
    index.add(0x7f010000, "string", "app_name").expect("first add");
    index.add(0x7f010001, "string", "title").expect("second add");
    index.add(0x7f020000, "color", "primary").expect("third add");
    index
}

#[test]
fn ids_and_names_round_trip() {
    let index = setup();
    let name = ResName::new("com.example", "string", "title");
    assert_eq!(index.get_id(&name), Some(0x7f010001));
    assert_eq!(index.get_name(0x7f010001), Some(name));
    assert_eq!(index.package_identifier(), Some(0x7f));
    assert_eq!(index.len(), 3);
}

#[test]
fn same_pair_twice_is_a_no_op() {
    let index = setup();
    index.add(0x7f010000, "string", "app_name").expect("repeat add");
    assert_eq!(index.len(), 3);
}

#[test]
fn reusing_an_id_for_another_name_is_fatal() {
    let index = setup();
    let err = index.add(0x7f010000, "string", "other").unwrap_err();
    assert!(matches!(err, ResourceError::IdCollision { id: 0x7f010000, .. }), "got {err}");
    assert_eq!(index.get_name(0x7f010000).unwrap().name(), "app_name");
}

#[test]
fn reusing_a_name_for_another_id_is_fatal() {
    let index = setup();
    let err = index.add(0x7f010005, "string", "title").unwrap_err();
    assert!(matches!(err, ResourceError::NameCollision { existing: 0x7f010001, requested: 0x7f010005, .. }));
}

#[test]
fn package_identifier_is_fixed_by_first_id() {
    let index = setup();
    let err = index.add(0x01010000, "string", "foreign").unwrap_err();
    assert!(matches!(
        err,
        ResourceError::PackageIdentifierMismatch { expected: 0x7f, actual: 0x01, .. }
    ));
    assert_eq!(index.package_identifier(), Some(0x7f));
}

#[test]
fn unknown_application_names_have_no_id() {
    let index = setup();
    let missing = ResName::new("com.example", "string", "missing");
    assert_eq!(index.get_id(&missing), None);
    assert_eq!(index.get_name(0x7f0f0f0f), None);
    assert_eq!(index.len(), 3, "lookups must not allocate for application names");
}

#[test]
fn framework_names_get_synthetic_ids_above_the_largest() {
    let index = ResourceIndex::new("android");
    index.add(0x01010000, "attr", "textColor").unwrap();
    index.add(0x01010010, "attr", "background").unwrap();
    let first = index.get_id(&ResName::new("android", "attr", "layout_width")).unwrap();
    let second = index.get_id(&ResName::new("android", "attr", "layout_height")).unwrap();
    assert_eq!(first, 0x01010011);
    assert_eq!(second, 0x01010012);
    // stable once assigned
    assert_eq!(index.get_id(&ResName::new("android", "attr", "layout_width")), Some(first));
    assert_eq!(index.get_name(second).unwrap().name(), "layout_height");
}

#[test]
fn empty_framework_index_allocates_under_framework_identifier() {
    let index = ResourceIndex::new("android");
    let id = index.get_id(&ResName::new("", "attr", "orphan")).unwrap();
    assert_eq!(package_identifier(id), FRAMEWORK_PACKAGE_IDENTIFIER);
}

#[test]
fn synthetic_allocation_skips_ids_added_later() {
    let index = ResourceIndex::new("android");
    index.add(0x01000001, "attr", "a").unwrap();
    let first = index.get_id(&ResName::new("android", "attr", "b")).unwrap();
    assert_eq!(first, 0x01000002);
    index.add(0x01000003, "attr", "c").unwrap();
    let next = index.get_id(&ResName::new("android", "attr", "d")).unwrap();
    assert_eq!(next, 0x01000004);
}

#[test]
fn concurrent_allocation_hands_out_distinct_ids() {
    let index = Arc::new(ResourceIndex::new("android"));
    index.add(0x01010000, "attr", "seed").unwrap();
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                (0..50)
                    .map(|i| index.get_id(&ResName::new("android", "attr", format!("a{t}_{i}"))).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let mut ids: Vec<u32> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 400);
    assert_eq!(index.len(), 401);
}
