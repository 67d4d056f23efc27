use std::sync::Arc;

use restable::construct::ResName;
use restable::datatype::{ResourceData, ResourceKind, SourceLocation, TypedResource, TypedValue};
use restable::resolver::ResourceResolver;
use restable::style::{AttributeResource, StyleData, ThemeStyleSet};
use restable::table::PackageResourceTable;

const APP: &str = "com.example";

fn attr(package: &str, name: &str, value: &str) -> AttributeResource {
    AttributeResource::new(ResName::new(package, "attr", name), value, APP)
}

fn style(name: &str, parent: Option<&str>, attributes: Vec<AttributeResource>) -> StyleData {
    StyleData::new(APP, name, parent.map(str::to_string), attributes)
}

fn add_style(table: &mut PackageResourceTable, style: StyleData) {
    let key = style.name().replace('.', "_");
    let source = SourceLocation::new(APP, "values/styles.json");
    table
        .add_value("style", &key, TypedResource::new(ResourceData::Style(style), ResourceKind::Style, "", source))
        .unwrap();
}

fn setup() -> ResourceResolver {
    let mut table = PackageResourceTable::new(APP);
    add_style(&mut table, style("Theme", Some(""), vec![attr("android", "textSize", "14sp")]));
    add_style(
        &mut table,
        style("Theme.MyApp", Some("@style/Theme"), vec![attr("android", "textColor", "#ff0000")]),
    );
    add_style(&mut table, style("Theme.MyApp.Dialog", None, vec![attr(APP, "dialogWidth", "320dp")]));
    let source = SourceLocation::new(APP, "values/colors.json");
    table
        .add_value("color", "accent", TypedResource::text(ResourceKind::Color, "#00ff00", "", source))
        .unwrap();
    table.seal();
    ResourceResolver::new(Arc::new(table))
}

#[test]
fn implicit_parent_comes_from_the_dotted_name() {
    let dialog = style("Theme.MyApp.Dialog", None, vec![]);
    assert_eq!(dialog.parent(), Some(String::from("Theme_MyApp")));
    assert_eq!(style("Theme", None, vec![]).parent(), None);
    assert_eq!(style("Theme.MyApp", Some(""), vec![]).parent(), None);
    assert_eq!(
        style("Theme.MyApp", Some("@android:style/Theme"), vec![]).parent(),
        Some(String::from("@android:style/Theme"))
    );
}

#[test]
fn attribute_is_retried_in_the_style_package() {
    let mine = style("Mine", None, vec![attr(APP, "cornerRadius", "4dp")]);
    let asked = ResName::new("com.example.lib", "attr", "cornerRadius");
    let found = mine.get_attr_value(&asked).expect("retried in own package");
    assert_eq!(found.value(), "4dp");
    assert_eq!(found.res_name(), &asked);
    // framework attributes are never retried
    assert!(mine.get_attr_value(&ResName::new("android", "attr", "cornerRadius")).is_none());
}

#[test]
fn first_style_wins_unless_forced() {
    let base = Arc::new(style("Base", None, vec![attr("android", "textColor", "#111111")]));
    let overlay = Arc::new(style("Overlay", None, vec![attr("android", "textColor", "#222222")]));
    let text_color = ResName::new("android", "attr", "textColor");

    let mut theme = ThemeStyleSet::new();
    theme.apply(Arc::clone(&base), false);
    theme.apply(Arc::clone(&overlay), false);
    assert_eq!(theme.get_attr_value(&text_color).unwrap().value(), "#111111");

    let mut forced = ThemeStyleSet::new();
    forced.apply(Arc::clone(&base), false);
    forced.apply(Arc::clone(&overlay), true);
    assert_eq!(forced.get_attr_value(&text_color).unwrap().value(), "#222222");
}

#[test]
fn reapplying_a_style_moves_it_to_the_end() {
    let first = Arc::new(style("First", None, vec![]));
    let second = Arc::new(style("Second", None, vec![]));
    let mut theme = ThemeStyleSet::new();
    theme.apply(Arc::clone(&first), false);
    theme.apply(Arc::clone(&second), false);
    theme.apply(Arc::clone(&first), true);
    let order: Vec<(&str, bool)> = theme.styles().map(|(s, force)| (s.name(), force)).collect();
    assert_eq!(order, vec![("Second", false), ("First", true)]);
    assert_eq!(theme.len(), 2);
}

#[test]
fn style_attributes_are_inherited_through_parents() {
    let resolver = setup();
    let dialog = resolver
        .resolve_style(&ResName::new(APP, "style", "Theme.MyApp.Dialog"), "")
        .expect("dialog style");
    assert_eq!(dialog.name(), "Theme.MyApp.Dialog");
    let text_size = ResName::new("android", "attr", "textSize");
    let text_color = ResName::new("android", "attr", "textColor");
    assert_eq!(resolver.style_attribute(&dialog, &text_size, "").unwrap().value(), "14sp");
    assert_eq!(resolver.style_attribute(&dialog, &text_color, "").unwrap().value(), "#ff0000");
    assert!(resolver
        .style_attribute(&dialog, &ResName::new("android", "attr", "missing"), "")
        .is_none());
}

#[test]
fn theme_lookups_walk_the_applied_styles() {
    let resolver = setup();
    let mut theme = ThemeStyleSet::new();
    assert!(resolver.apply_style(&mut theme, &ResName::new(APP, "style", "Theme.MyApp.Dialog"), false, ""));
    assert!(!resolver.apply_style(&mut theme, &ResName::new(APP, "style", "Nope"), false, ""));
    let text_size = ResName::new("android", "attr", "textSize");
    let found = resolver.theme_attribute(&theme, &text_size, "").expect("inherited attribute");
    assert_eq!(found.value(), "14sp");
}

#[test]
fn attribute_values_follow_theme_and_resource_references() {
    let resolver = setup();
    let mut theme = ThemeStyleSet::new();
    theme.apply(
        Arc::new(style("Colors", None, vec![attr(APP, "colorAccent", "@color/accent")])),
        false,
    );
    let via_theme = attr("android", "background", "?attr/colorAccent");
    assert_eq!(
        resolver.attribute_value(&via_theme, &theme, ""),
        Some(TypedValue::Color(0xff00ff00))
    );
    assert_eq!(resolver.attribute_value(&attr(APP, "x", "@null"), &theme, ""), Some(TypedValue::Null));
    assert_eq!(
        resolver.attribute_value(&attr(APP, "label", "plain"), &theme, ""),
        Some(TypedValue::String(String::from("plain")))
    );
}

#[test]
fn reapplying_through_the_resolver_moves_the_style() {
    let resolver = setup();
    let mut theme = ThemeStyleSet::new();
    let my_app = ResName::new(APP, "style", "Theme.MyApp");
    assert!(resolver.apply_style(&mut theme, &my_app, false, ""));
    assert!(resolver.apply_style(&mut theme, &ResName::new(APP, "style", "Theme"), false, ""));
    assert!(resolver.apply_style(&mut theme, &my_app, false, ""));
    let order: Vec<&str> = theme.styles().map(|(s, _)| s.name()).collect();
    assert_eq!(order, vec!["Theme", "Theme.MyApp"]);
}

#[test]
fn forced_style_wins_with_an_inherited_attribute() {
    let mut table = PackageResourceTable::new(APP);
    add_style(&mut table, style("P", Some(""), vec![attr(APP, "y", "from P")]));
    add_style(&mut table, style("Q", Some(""), vec![attr(APP, "y", "from Q")]));
    add_style(&mut table, style("C", Some("@style/P"), vec![]));
    add_style(&mut table, style("D", Some("@style/Q"), vec![]));
    table.seal();
    let resolver = ResourceResolver::new(Arc::new(table));
    let y = ResName::new(APP, "attr", "y");

    let mut theme = ThemeStyleSet::new();
    assert!(resolver.apply_style(&mut theme, &ResName::new(APP, "style", "C"), false, ""));
    assert!(resolver.apply_style(&mut theme, &ResName::new(APP, "style", "D"), true, ""));
    assert_eq!(resolver.theme_attribute(&theme, &y, "").unwrap().value(), "from Q");

    let mut unforced = ThemeStyleSet::new();
    assert!(resolver.apply_style(&mut unforced, &ResName::new(APP, "style", "C"), false, ""));
    assert!(resolver.apply_style(&mut unforced, &ResName::new(APP, "style", "D"), false, ""));
    assert_eq!(resolver.theme_attribute(&unforced, &y, "").unwrap().value(), "from P");
}
