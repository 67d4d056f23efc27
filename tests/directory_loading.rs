use std::io::Read;
use std::sync::Arc;

use restable::construct::ResName;
use restable::datatype::{ResourceKind, TypedValue};
use restable::error::ResourceError;
use restable::fs::MemoryFileTree;
use restable::loader::{DirectoryLoader, IdSource, RTxtIdSource, ResourceLoader};
use restable::table::{PackageResourceTable, ResourceCategory, ResourceTable};

const APP: &str = "com.example";

const VALUES: &str = r##"{
  "string": { "app_name": "Example", "greeting": "@string/app_name" },
  "color": { "accent": "#3f51b5" },
  "dimen": { "margin": "16dp" },
  "bool": { "enabled": true },
  "integer": { "retries": 3 },
  "string-array": { "planets": ["Mercury", "Venus"] },
  "integer-array": { "primes": [2, 3, 5] },
  "array": { "mixed": ["#fff", "12dp", "hello"] },
  "plurals": { "songs": [["one", "1 song"], ["other", "%d songs"]] },
  "style": {
    "Theme.Example": { "parent": "@android:style/Theme", "items": { "android:textColor": "#fff", "cornerRadius": "4dp" } }
  },
  "attr": {
    "orientation": { "format": "enum", "values": [["horizontal", "0"], ["vertical", "1"]] },
    "broken": { "format": "bogus" }
  },
  "declare-styleable": { "Example": {} }
}"##;

const VALUES_DE: &str = r#"{ "string": { "app_name": "Beispiel" } }"#;

const R_TXT: &str = "int string app_name 0x7f0a0000\n\
int color accent 0x7f050000\n\
int[] styleable Example { 0x7f010000 }\n\
int styleable Example_orientation 0\n";

fn tree() -> Arc<MemoryFileTree> {
    Arc::new(
        MemoryFileTree::new()
            .with_file("res/values/values.json", VALUES)
            .with_file("res/values-de/strings.json", VALUES_DE)
            .with_file("res/values/README", "not a document")
            .with_file("res/layout/main.xml", "<LinearLayout/>")
            .with_file("res/layout-land/main.xml", "<FrameLayout/>")
            .with_file("res/drawable-hdpi/icon.9.png", [0x89u8, 0x50])
            .with_file("res/drawable/shape.xml", "<shape/>")
            .with_file("res/color/tint.xml", "<selector/>")
            .with_file("res/xml/preferences.xml", "<PreferenceScreen/>")
            .with_file("res/raw/notes.txt", "raw notes")
            .with_file("res/not a dir!/x.txt", "skipped"),
    )
}

fn setup() -> PackageResourceTable {
    let mut table = PackageResourceTable::new(APP);
    let loader = DirectoryLoader::new(APP, tree(), "res")
        .with_id_source(Box::new(RTxtIdSource::new(R_TXT)))
        .with_generated_ids(0x7f);
    loader.load(&mut table).expect("load pass");
    table.seal();
    table
}

fn name(res_type: &str, name: &str) -> ResName {
    ResName::new(APP, res_type, name)
}

#[test]
fn scalar_values_are_loaded_with_their_kinds() {
    let table = setup();
    assert_eq!(table.get_value(&name("string", "app_name"), "").unwrap().as_text(), Some("Example"));
    assert_eq!(table.get_value(&name("string", "app_name"), "de-rDE").unwrap().as_text(), Some("Beispiel"));
    let accent = table.get_value(&name("color", "accent"), "").unwrap();
    assert_eq!(accent.kind(), ResourceKind::Color);
    assert_eq!(accent.typed_value(), Some(TypedValue::Color(0xff3f51b5)));
    assert_eq!(
        table.get_value(&name("bool", "enabled"), "").unwrap().typed_value(),
        Some(TypedValue::Boolean(true))
    );
    assert_eq!(
        table.get_value(&name("integer", "retries"), "").unwrap().typed_value(),
        Some(TypedValue::Integer(3))
    );
    assert!(table.get_value(&name("string", "greeting"), "").unwrap().is_reference());
}

#[test]
fn arrays_keep_their_item_kinds() {
    let table = setup();
    let planets = table.get_value(&name("string-array", "planets"), "").unwrap();
    assert_eq!(planets.as_items().unwrap().len(), 2);
    let primes = table.get_value(&name("integer-array", "primes"), "").unwrap();
    assert_eq!(
        primes.typed_value(),
        Some(TypedValue::Array(vec![TypedValue::Integer(2), TypedValue::Integer(3), TypedValue::Integer(5)]))
    );
    let mixed = table.get_value(&name("array", "mixed"), "").unwrap();
    let kinds: Vec<ResourceKind> = mixed.as_items().unwrap().iter().map(|item| item.kind()).collect();
    assert_eq!(kinds, vec![ResourceKind::Color, ResourceKind::Dimen, ResourceKind::CharSequence]);
}

#[test]
fn styles_are_keyed_by_their_generated_name() {
    let table = setup();
    let theme = table.get_value(&name("style", "Theme_Example"), "").unwrap();
    let style = theme.as_style().unwrap();
    assert_eq!(style.name(), "Theme.Example");
    assert_eq!(style.explicit_parent(), Some("@android:style/Theme"));
    let text_color = ResName::new("android", "attr", "textColor");
    assert_eq!(style.get_attr_value(&text_color).unwrap().value(), "#fff");
    assert_eq!(style.get_attr_value(&name("attr", "cornerRadius")).unwrap().value(), "4dp");
}

#[test]
fn malformed_attribute_declarations_are_skipped() {
    let table = setup();
    let orientation = table.get_value(&name("attr", "orientation"), "").unwrap();
    assert_eq!(orientation.as_attr().unwrap().enum_value("vertical"), Some("1"));
    assert!(table.get_value(&name("attr", "broken"), "").is_none());
}

#[test]
fn plurals_are_loaded_as_rule_sets() {
    let table = setup();
    let songs = table.get_value(&name("plurals", "songs"), "").unwrap();
    assert_eq!(songs.as_plurals().unwrap().find(1).unwrap().string(), "1 song");
    assert_eq!(table.store(ResourceCategory::Plurals).len(), 1);
}

#[test]
fn files_land_in_their_stores() {
    let table = setup();
    let portrait = table.get_xml(&name("layout", "main"), "port").unwrap();
    assert_eq!(portrait.read_to_string().unwrap(), "<LinearLayout/>");
    let landscape = table.get_xml(&name("layout", "main"), "land").unwrap();
    assert_eq!(landscape.read_to_string().unwrap(), "<FrameLayout/>");

    let icon = table.get_value(&name("drawable", "icon"), "xhdpi").unwrap();
    assert!(icon.is_file());
    assert_eq!(icon.qualifiers(), "hdpi");
    assert!(table.get_xml(&name("drawable", "shape"), "").is_some());
    assert_eq!(
        table.get_value(&name("color", "tint"), "").unwrap().kind(),
        ResourceKind::ColorStateList
    );
    assert_eq!(table.store(ResourceCategory::Preferences).len(), 1);
    assert!(table.get_xml(&name("xml", "preferences"), "").is_some());

    let mut notes = String::new();
    table
        .get_raw_value(&name("raw", "notes"), "")
        .unwrap()
        .read_to_string(&mut notes)
        .unwrap();
    assert_eq!(notes, "raw notes");
}

#[test]
fn ids_come_from_r_txt_and_the_rest_are_generated() {
    let table = setup();
    assert_eq!(table.get_resource_id(&name("string", "app_name")), Some(0x7f0a0000));
    assert_eq!(table.get_resource_id(&name("color", "accent")), Some(0x7f050000));
    let generated = table.get_resource_id(&name("dimen", "margin")).unwrap();
    assert!(generated > 0x7f0a0000, "generated {generated:#010x}");
    assert!(table.get_resource_id(&name("styleable", "Example")).is_none());
}

#[test]
fn r_txt_skips_styleables_and_rejects_garbage() {
    let ids = RTxtIdSource::new(R_TXT).resource_ids().unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], (0x7f0a0000, String::from("string"), String::from("app_name")));
    let err = RTxtIdSource::new("int string broken").resource_ids().unwrap_err();
    assert!(matches!(err, ResourceError::Load(_)));
}

#[test]
fn missing_root_fails_the_load() {
    let mut table = PackageResourceTable::new(APP);
    let loader = DirectoryLoader::new(APP, tree(), "elsewhere");
    assert!(loader.load(&mut table).is_err());
}

#[test]
fn malformed_values_document_fails_the_load() {
    let tree = Arc::new(MemoryFileTree::new().with_file("res/values/bad.json", "{ not json"));
    let mut table = PackageResourceTable::new(APP);
    let err = DirectoryLoader::new(APP, tree, "res").load(&mut table).unwrap_err();
    assert!(matches!(err, ResourceError::Load(_)), "got {err}");
}
