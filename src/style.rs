//! Styles as attribute bags, and themes as ordered stacks of styles.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::construct::{is_framework_package, ResName};

// ------------- AttributeResource -------------
/// One `<item name="...">value</item>` of a style. The context package is
/// the package whose resources the raw value refers to when unqualified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeResource {
    res_name: ResName,
    value: String,
    context_package: String,
}

impl AttributeResource {
    pub fn new(res_name: ResName, value: impl Into<String>, context_package: impl Into<String>) -> Self {
        Self {
            res_name,
            value: value.into(),
            context_package: context_package.into(),
        }
    }
    pub fn res_name(&self) -> &ResName {
        &self.res_name
    }
    pub fn value(&self) -> &str {
        &self.value
    }
    pub fn context_package(&self) -> &str {
        &self.context_package
    }
    pub fn is_null(&self) -> bool {
        self.value == "@null"
    }
    pub fn is_empty(&self) -> bool {
        self.value == "@empty"
    }
    pub fn is_resource_reference(&self) -> bool {
        self.value.starts_with('@') && !self.is_null() && !self.is_empty()
    }
    pub fn is_style_reference(&self) -> bool {
        self.value.starts_with('?')
    }
    /// The name this value points at, if it is a `@` or `?` reference.
    pub fn reference(&self) -> Option<ResName> {
        if self.is_resource_reference() {
            ResName::qualify(&self.value, &self.context_package, "")
        } else if self.is_style_reference() {
            ResName::qualify(&self.value, &self.context_package, "attr")
        } else {
            None
        }
    }
    fn renamed(&self, res_name: ResName) -> Self {
        Self {
            res_name,
            value: self.value.clone(),
            context_package: self.context_package.clone(),
        }
    }
}

impl fmt::Display for AttributeResource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.res_name, self.value)
    }
}

// ------------- StyleData -------------
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleData {
    package: String,
    name: String,
    parent: Option<String>,
    #[serde(with = "attribute_list")]
    items: BTreeMap<ResName, AttributeResource>,
}

// names are not strings, so the attribute map travels as a plain list
mod attribute_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::AttributeResource;
    use crate::construct::ResName;

    pub fn serialize<S: Serializer>(
        items: &BTreeMap<ResName, AttributeResource>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(items.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<ResName, AttributeResource>, D::Error> {
        let list = Vec::<AttributeResource>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|a| (a.res_name.clone(), a)).collect())
    }
}

impl StyleData {
    pub fn new(
        package: impl Into<String>,
        name: impl Into<String>,
        parent: Option<String>,
        attributes: impl IntoIterator<Item = AttributeResource>,
    ) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            parent,
            items: attributes.into_iter().map(|a| (a.res_name.clone(), a)).collect(),
        }
    }
    pub fn package(&self) -> &str {
        &self.package
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn res_name(&self) -> ResName {
        ResName::new(self.package.as_str(), "style", self.name.as_str())
    }
    pub fn same_style(&self, other: &StyleData) -> bool {
        self.package == other.package && self.name == other.name
    }
    pub fn explicit_parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
    /// The parent style name. An explicit empty parent disables inheritance;
    /// without one, `A.B.C` inherits from `A_B`.
    pub fn parent(&self) -> Option<String> {
        match &self.parent {
            Some(parent) if parent.trim().is_empty() => None,
            Some(parent) => Some(parent.clone()),
            None => self
                .name
                .rsplit_once('.')
                .map(|(head, _)| head.replace('.', "_")),
        }
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeResource> {
        self.items.values()
    }

    /// Looks up an attribute of this style (not of its parents).
    ///
    /// When the attribute is missing and neither it nor this style belongs to
    /// the framework, the same attribute name is retried in the style's own
    /// package. A hit there is reported under the package that was asked for.
    pub fn get_attr_value(&self, res_name: &ResName) -> Option<AttributeResource> {
        if let Some(attribute) = self.items.get(res_name) {
            return Some(attribute.clone());
        }
        if res_name.is_framework() || is_framework_package(&self.package) {
            return None;
        }
        self.items
            .get(&res_name.with_package(&self.package))
            .map(|attribute| attribute.renamed(res_name.clone()))
    }
}

// ------------- ThemeStyleSet -------------
#[derive(Clone, Debug, Default)]
pub struct ThemeStyleSet {
    styles: Vec<(Arc<StyleData>, bool)>,
}

impl ThemeStyleSet {
    pub fn new() -> Self {
        Self::default()
    }
    /// Applying a style that is already part of the theme moves it to the end.
    /// Styles are the same when they share package and name.
    pub fn apply(&mut self, style: Arc<StyleData>, force: bool) {
        self.styles
            .retain(|(applied, _)| !(Arc::ptr_eq(applied, &style) || applied.same_style(&style)));
        self.styles.push((style, force));
    }
    /// The first style defining the attribute wins, unless a later style was
    /// applied with `force`.
    pub fn get_attr_value(&self, res_name: &ResName) -> Option<AttributeResource> {
        let mut found = None;
        for (style, force) in &self.styles {
            if found.is_some() && !*force {
                continue;
            }
            if let Some(attribute) = style.get_attr_value(res_name) {
                found = Some(attribute);
            }
        }
        found
    }
    pub fn styles(&self) -> impl Iterator<Item = (&Arc<StyleData>, bool)> {
        self.styles.iter().map(|(style, force)| (style, *force))
    }
    pub fn len(&self) -> usize {
        self.styles.len()
    }
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
