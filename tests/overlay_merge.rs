use std::sync::Arc;
use std::thread;
use std::time::Duration;

use restable::config::OverlaySettings;
use restable::construct::ResName;
use restable::datatype::{ResourceKind, SourceLocation, TypedResource};
use restable::error::{ResourceError, Result};
use restable::fs::MemoryFileTree;
use restable::loader::{DirectoryLoader, ResourceLoader};
use restable::overlay::OverlayResourceTable;
use restable::table::{PackageResourceTable, ResourceTable};

const APP: &str = "com.example.app";
const LIB: &str = "com.example.lib";

fn library_table(package: &str, ids: &[(u32, &str)], strings: &[(&str, &str)]) -> PackageResourceTable {
    let mut table = PackageResourceTable::new(package);
    for (id, name) in ids {
        table.add_resource(*id, "string", name).unwrap();
    }
    for (name, value) in strings {
        let source = SourceLocation::new(package, "values/strings.json");
        table
            .add_value("string", name, TypedResource::text(ResourceKind::CharSequence, *value, "", source))
            .unwrap();
    }
    table.seal();
    table
}

fn setup() -> OverlayResourceTable {
    let app = library_table(APP, &[(0x7f010000, "app_name")], &[("app_name", "My App"), ("shared", "from app")]);
    let lib = library_table(LIB, &[(0x7f010001, "lib_title")], &[("lib_title", "Library"), ("shared", "from lib")]);
    OverlayResourceTable::from_tables(APP, vec![app, lib]).expect("overlay")
}

#[test]
fn merged_index_holds_every_library_id() {
    let overlay = setup();
    assert_eq!(overlay.table().index().len(), 2);
    assert_eq!(overlay.get_resource_id(&ResName::new(APP, "string", "lib_title")), Some(0x7f010001));
    assert_eq!(overlay.get_res_name(0x7f010000), Some(ResName::new(APP, "string", "app_name")));
    assert_eq!(overlay.sub_packages(), &[String::from(APP), String::from(LIB)]);
}

#[test]
fn library_names_are_answered_under_the_overlay_package() {
    let overlay = setup();
    let through_lib = ResName::new(LIB, "string", "lib_title");
    assert_eq!(overlay.get_value(&through_lib, "").unwrap().as_text(), Some("Library"));
    assert_eq!(overlay.get_resource_id(&through_lib), Some(0x7f010001));
    assert!(overlay.provides_for(LIB));
    assert!(overlay.provides_for(APP));
    assert!(!overlay.provides_for("com.other"));
    assert!(overlay.get_value(&ResName::new("com.other", "string", "lib_title"), "").is_none());
}

#[test]
fn first_registered_library_wins_a_tie() {
    let overlay = setup();
    let shared = ResName::new(APP, "string", "shared");
    assert_eq!(overlay.get_value(&shared, "").unwrap().as_text(), Some("from app"));
}

#[test]
fn conflicting_ids_abort_the_merge() {
    let app = library_table(APP, &[(0x7f010000, "app_name")], &[]);
    let lib = library_table(LIB, &[(0x7f010000, "lib_title")], &[]);
    let err = OverlayResourceTable::from_tables(APP, vec![app, lib]).unwrap_err();
    assert!(
        matches!(err, ResourceError::MergeCollision { merged: 1, expected: 2, .. }),
        "got {err}"
    );
}

#[test]
fn merged_table_is_sealed() {
    let overlay = setup();
    assert!(overlay.table().is_sealed());
}

fn values_tree(package_value: &str) -> Arc<MemoryFileTree> {
    let document = format!(r#"{{ "string": {{ "title": "{package_value}" }} }}"#);
    Arc::new(MemoryFileTree::new().with_file("res/values/strings.json", document))
}

#[test]
fn build_runs_loaders_on_the_worker_pool() {
    let loaders: Vec<Box<dyn ResourceLoader>> = vec![
        Box::new(DirectoryLoader::new(APP, values_tree("app title"), "res").with_generated_ids(0x7f)),
        Box::new(DirectoryLoader::new(LIB, values_tree("lib title"), "res")),
    ];
    let settings = OverlaySettings {
        pool_size: Some(2),
        merge_timeout_secs: 30,
    };
    let overlay = OverlayResourceTable::build(APP, loaders, &settings).expect("overlay build");
    let title = ResName::new(LIB, "string", "title");
    assert_eq!(overlay.get_value(&title, "").unwrap().as_text(), Some("app title"));
    assert_eq!(overlay.get_resource_id(&title), Some(0x7f000001));
}

struct SlowLoader;

impl ResourceLoader for SlowLoader {
    fn package_name(&self) -> &str {
        LIB
    }
    fn load(&self, _table: &mut PackageResourceTable) -> Result<()> {
        thread::sleep(Duration::from_secs(3));
        Ok(())
    }
}

#[test]
fn build_gives_up_after_the_deadline() {
    let loaders: Vec<Box<dyn ResourceLoader>> = vec![Box::new(SlowLoader)];
    let settings = OverlaySettings {
        pool_size: Some(1),
        merge_timeout_secs: 1,
    };
    let err = OverlayResourceTable::build(APP, loaders, &settings).unwrap_err();
    assert!(matches!(err, ResourceError::MergeTimeout { seconds: 1, .. }), "got {err}");
}

struct FailingLoader;

impl ResourceLoader for FailingLoader {
    fn package_name(&self) -> &str {
        LIB
    }
    fn load(&self, _table: &mut PackageResourceTable) -> Result<()> {
        Err(ResourceError::Load(String::from("broken library")))
    }
}

#[test]
fn a_failing_loader_fails_the_build() {
    let loaders: Vec<Box<dyn ResourceLoader>> = vec![
        Box::new(DirectoryLoader::new(APP, values_tree("app title"), "res")),
        Box::new(FailingLoader),
    ];
    let err = OverlayResourceTable::build(APP, loaders, &OverlaySettings::default()).unwrap_err();
    assert!(matches!(err, ResourceError::Load(_)), "got {err}");
}
