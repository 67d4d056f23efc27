//! Query surface on top of a table: reference chasing, plurals, styles and
//! themes.

use std::collections::HashSet;
use std::io::Read;
use std::sync::Arc;

use tracing::debug;

use crate::construct::{NameHasher, ResName, ResourceId};
use crate::datatype::{TypedResource, TypedValue};
use crate::style::{AttributeResource, StyleData, ThemeStyleSet};
use crate::table::{ResourceTable, XmlBlock};

/// How many references or parents are followed before giving up.
pub const MAX_REFERENCE_DEPTH: usize = 32;

pub struct ResourceResolver {
    table: Arc<dyn ResourceTable>,
}

impl ResourceResolver {
    pub fn new(table: Arc<dyn ResourceTable>) -> Self {
        Self { table }
    }
    pub fn table(&self) -> &dyn ResourceTable {
        self.table.as_ref()
    }

    /// The value of `res_name`, following `@type/name` references to the
    /// value they end at. Dangling or cyclic references resolve to nothing.
    pub fn resolve_value(&self, res_name: &ResName, qualifiers: &str) -> Option<&TypedResource> {
        let mut seen: HashSet<ResName, NameHasher> = HashSet::default();
        let mut current = res_name.clone();
        loop {
            if !seen.insert(current.clone()) || seen.len() > MAX_REFERENCE_DEPTH {
                debug!(name = %res_name, "reference chain does not end");
                return None;
            }
            let value = self.table.get_value(&current, qualifiers)?;
            match value.typed_value() {
                Some(TypedValue::Reference(target)) if target.res_type() != "attr" => current = target,
                _ => return Some(value),
            }
        }
    }

    pub fn resolve_value_by_id(&self, id: ResourceId, qualifiers: &str) -> Option<&TypedResource> {
        let res_name = self.table.get_res_name(id)?;
        self.resolve_value(&res_name, qualifiers)
    }

    /// The document for `res_name`, following an alias such as a layout
    /// declared in values as `@layout/other`.
    pub fn resolve_xml(&self, res_name: &ResName, qualifiers: &str) -> Option<XmlBlock> {
        let mut current = res_name.clone();
        for _ in 0..MAX_REFERENCE_DEPTH {
            if let Some(block) = self.table.get_xml(&current, qualifiers) {
                return Some(block);
            }
            match self.table.get_value(&current, qualifiers)?.typed_value() {
                Some(TypedValue::Reference(target)) => current = target,
                _ => return None,
            }
        }
        None
    }

    pub fn resolve_raw(&self, res_name: &ResName, qualifiers: &str) -> Option<Box<dyn Read + Send>> {
        self.table.get_raw_value(res_name, qualifiers)
    }

    pub fn resolve_raw_by_id(&self, id: ResourceId, qualifiers: &str) -> Option<Box<dyn Read + Send>> {
        self.table.get_raw_value_by_id(id, qualifiers)
    }

    /// The plural string for `quantity`. A rule pointing at a string resource
    /// yields that string.
    pub fn resolve_plural(&self, res_name: &ResName, quantity: i32, qualifiers: &str) -> Option<String> {
        let variant = self.table.get_value(res_name, qualifiers)?;
        let plural = variant.as_plurals()?.find(quantity)?;
        let text = plural.string();
        if !text.trim_start().starts_with('@') {
            return Some(text.to_string());
        }
        let target = ResName::qualify(text, variant.source().package(), "string")?;
        self.resolve_value(&target, qualifiers)?.as_text().map(str::to_string)
    }

    pub fn resolve_style(&self, res_name: &ResName, qualifiers: &str) -> Option<Arc<StyleData>> {
        let style = self.table.get_value(&style_key(res_name), qualifiers)?.as_style()?;
        Some(Arc::new(style.clone()))
    }

    /// An attribute of `style`, walking up its parents.
    pub fn style_attribute(&self, style: &StyleData, attr: &ResName, qualifiers: &str) -> Option<AttributeResource> {
        let mut current = style.clone();
        for _ in 0..MAX_REFERENCE_DEPTH {
            if let Some(attribute) = current.get_attr_value(attr) {
                return Some(attribute);
            }
            let parent = ResName::qualify(&current.parent()?, current.package(), "style")?;
            current = self.table.get_value(&style_key(&parent), qualifiers)?.as_style()?.clone();
        }
        debug!(style = style.name(), "style parent chain does not end");
        None
    }

    /// An attribute as seen through a theme. Each applied style is resolved
    /// through its parent chain; the first hit wins unless a later style was
    /// applied with `force`.
    pub fn theme_attribute(&self, theme: &ThemeStyleSet, attr: &ResName, qualifiers: &str) -> Option<AttributeResource> {
        let mut found = None;
        for (style, force) in theme.styles() {
            if found.is_some() && !force {
                continue;
            }
            if let Some(attribute) = self.style_attribute(style, attr, qualifiers) {
                found = Some(attribute);
            }
        }
        found
    }

    /// Applies the named style to `theme`. Returns false if there is no such
    /// style.
    pub fn apply_style(&self, theme: &mut ThemeStyleSet, res_name: &ResName, force: bool, qualifiers: &str) -> bool {
        match self.resolve_style(res_name, qualifiers) {
            Some(style) => {
                theme.apply(style, force);
                true
            }
            None => false,
        }
    }

    /// The value an attribute stands for: a reference is resolved in the
    /// attribute's context package, `?attr` references through the theme.
    pub fn attribute_value(&self, attribute: &AttributeResource, theme: &ThemeStyleSet, qualifiers: &str) -> Option<TypedValue> {
        let mut current = attribute.clone();
        for _ in 0..MAX_REFERENCE_DEPTH {
            if current.is_null() || current.is_empty() {
                return Some(TypedValue::Null);
            }
            if current.is_style_reference() {
                current = self.theme_attribute(theme, &current.reference()?, qualifiers)?;
                continue;
            }
            if current.is_resource_reference() {
                return self.resolve_value(&current.reference()?, qualifiers)?.typed_value();
            }
            let declared = self.table.get_value(&current.res_name().with_type("attr"), qualifiers);
            return match declared.and_then(TypedResource::as_attr) {
                Some(attr) => attr.convert(current.value(), current.context_package()),
                None => Some(TypedValue::String(current.value().to_string())),
            };
        }
        None
    }
}

// styles are keyed by their generated name
fn style_key(res_name: &ResName) -> ResName {
    ResName::new(res_name.package(), "style", res_name.name().replace('.', "_"))
}
