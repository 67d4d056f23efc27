//! Load passes that populate a package table from a resource directory.
//!
//! A resource directory holds one subdirectory per `type(-qualifier)*`
//! combination. Values directories carry JSON documents keyed by resource
//! type:
//!
//! ```json
//! {
//!   "string": { "app_name": "Hello" },
//!   "string-array": { "planets": ["Mercury", "Venus"] },
//!   "plurals": { "items": [["one", "1 item"], ["other", "%d items"]] },
//!   "style": { "Theme.MyApp": { "parent": "@style/Theme", "items": { "android:textColor": "#fff" } } },
//!   "attr": { "orientation": { "format": "enum", "values": [["horizontal", "0"], ["vertical", "1"]] } }
//! }
//! ```
//!
//! Every other directory holds one file per resource, named after the file
//! without its extensions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::construct::{ResName, ResourceId};
use crate::datatype::{AttrData, ResourceData, ResourceKind, SourceLocation, TypedResource};
use crate::error::{ResourceError, Result};
use crate::fs::{DiskFileTree, FileTree, FsFile};
use crate::plural::PluralRuleSet;
use crate::qualifier::ResDirectory;
use crate::style::{AttributeResource, StyleData};
use crate::table::PackageResourceTable;

// ------------- Traits -------------
/// One load pass over one package table.
pub trait ResourceLoader: Send + Sync {
    fn package_name(&self) -> &str;
    fn load(&self, table: &mut PackageResourceTable) -> Result<()>;
}

/// Supplies ids known ahead of the load pass as `(id, type, name)`.
pub trait IdSource: Send + Sync {
    fn resource_ids(&self) -> Result<Vec<(ResourceId, String, String)>>;
}

// ------------- R.txt -------------
/// Ids from an `R.txt` symbol file (`int <type> <name> <hex id>` lines).
/// Styleable entries carry attribute indexes rather than ids and are skipped.
#[derive(Debug, Clone)]
pub struct RTxtIdSource {
    text: String,
}

impl RTxtIdSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
    pub fn from_tree(tree: &dyn FileTree, path: &Path) -> Result<Self> {
        Ok(Self::new(tree.read_to_string(path)?))
    }
}

impl IdSource for RTxtIdSource {
    fn resource_ids(&self) -> Result<Vec<(ResourceId, String, String)>> {
        let mut ids = Vec::new();
        for (number, line) in self.text.lines().enumerate() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                [] => continue,
                ["int[]", ..] | ["int", "styleable", ..] => continue,
                ["int", res_type, name, value] => {
                    let hex = value.trim_start_matches("0x").trim_start_matches("0X");
                    let id = ResourceId::from_str_radix(hex, 16).map_err(|e| {
                        ResourceError::Load(format!("R.txt line {}: bad id '{}': {}", number + 1, value, e))
                    })?;
                    ids.push((id, res_type.to_string(), name.to_string()));
                }
                _ => {
                    return Err(ResourceError::Load(format!(
                        "R.txt line {}: cannot read '{}'",
                        number + 1,
                        line
                    )));
                }
            }
        }
        Ok(ids)
    }
}

// ------------- DirectoryLoader -------------
pub struct DirectoryLoader {
    package_name: String,
    tree: Arc<dyn FileTree>,
    root: PathBuf,
    id_source: Option<Box<dyn IdSource>>,
    generated_ids: Option<u8>,
}

impl DirectoryLoader {
    pub fn new(package_name: impl Into<String>, tree: Arc<dyn FileTree>, root: impl Into<PathBuf>) -> Self {
        Self {
            package_name: package_name.into(),
            tree,
            root: root.into(),
            id_source: None,
            generated_ids: None,
        }
    }
    pub fn on_disk(package_name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self::new(package_name, Arc::new(DiskFileTree), root)
    }
    /// Seeds the index before anything is loaded.
    pub fn with_id_source(mut self, id_source: Box<dyn IdSource>) -> Self {
        self.id_source = Some(id_source);
        self
    }
    /// Names left without an id after the pass get one under this package
    /// identifier.
    pub fn with_generated_ids(mut self, package_identifier: u8) -> Self {
        self.generated_ids = Some(package_identifier);
        self
    }
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_directory(&self, table: &mut PackageResourceTable, dir: &Path, directory: &ResDirectory) -> Result<usize> {
        let mut loaded = 0;
        for path in self.tree.list(dir)? {
            if self.tree.is_dir(&path) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let source = SourceLocation::new(self.package_name.as_str(), path.to_string_lossy());
            let qualifiers = directory.qualifiers();
            let res_type = directory.base_type();
            let name = resource_name(file_name);
            let is_xml = file_name.ends_with(".xml");
            let file = || FsFile::new(Arc::clone(&self.tree), path.clone());
            match res_type {
                "values" if file_name.ends_with(".json") => {
                    let document: Value = serde_json::from_str(&self.tree.read_to_string(&path)?)?;
                    loaded += self.load_values(table, &document, qualifiers, &source)?;
                }
                "values" => debug!(file = %path.display(), "ignoring non-document file in values directory"),
                "raw" => {
                    table.add_raw(res_type, name, TypedResource::file(ResourceKind::File, file(), qualifiers, source))?;
                    loaded += 1;
                }
                "drawable" | "mipmap" => {
                    let kind = ResourceKind::File;
                    table.add_value(res_type, name, TypedResource::file(kind, file(), qualifiers, source.clone()))?;
                    if is_xml {
                        table.add_xml(res_type, name, TypedResource::file(kind, file(), qualifiers, source))?;
                    }
                    loaded += 1;
                }
                "color" if is_xml => {
                    let kind = ResourceKind::ColorStateList;
                    table.add_value(res_type, name, TypedResource::file(kind, file(), qualifiers, source.clone()))?;
                    table.add_xml(res_type, name, TypedResource::file(kind, file(), qualifiers, source))?;
                    loaded += 1;
                }
                _ if is_xml => {
                    let kind = if res_type == "layout" { ResourceKind::Layout } else { ResourceKind::File };
                    table.add_xml(res_type, name, TypedResource::file(kind, file(), qualifiers, source))?;
                    loaded += 1;
                }
                _ => debug!(file = %path.display(), "ignoring file"),
            }
        }
        Ok(loaded)
    }

    fn load_values(&self, table: &mut PackageResourceTable, document: &Value, qualifiers: &str, source: &SourceLocation) -> Result<usize> {
        let Value::Object(types) = document else {
            return Err(ResourceError::Load(format!("{}: expected an object of resource types", source.path())));
        };
        let mut loaded = 0;
        for (res_type, entries) in types {
            let Value::Object(entries) = entries else {
                return Err(ResourceError::Load(format!("{}: '{}' must map names to values", source.path(), res_type)));
            };
            if res_type == "declare-styleable" {
                continue;
            }
            for (declared_name, raw) in entries {
                // style names keep their dots, keys use the generated form
                let name = declared_name.replace('.', "_");
                let Some(value) = self.values_entry(res_type, declared_name, raw, qualifiers, source)? else {
                    continue;
                };
                table.add_value(res_type, &name, value)?;
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    fn values_entry(
        &self,
        res_type: &str,
        name: &str,
        raw: &Value,
        qualifiers: &str,
        source: &SourceLocation,
    ) -> Result<Option<TypedResource>> {
        let malformed = || ResourceError::Load(format!("{}: malformed {} '{}'", source.path(), res_type, name));
        let data = match res_type {
            "style" => ResourceData::Style(self.style(name, raw).ok_or_else(malformed)?),
            "attr" => match attr(name, raw) {
                Ok(attr) => ResourceData::Attr(attr),
                Err(e) => {
                    warn!(package = %self.package_name, attr = name, error = %e, "skipping attribute declaration");
                    return Ok(None);
                }
            },
            "plurals" => ResourceData::Plurals(plurals(raw).ok_or_else(malformed)?),
            "string-array" | "integer-array" | "array" => {
                let Value::Array(items) = raw else {
                    return Err(malformed());
                };
                let mut typed = Vec::with_capacity(items.len());
                for item in items {
                    let text = scalar(item).ok_or_else(malformed)?;
                    let kind = match res_type {
                        "string-array" => ResourceKind::CharSequence,
                        "integer-array" => ResourceKind::Integer,
                        _ => ResourceKind::infer(&text),
                    };
                    typed.push(TypedResource::text(kind, text, qualifiers, source.clone()));
                }
                ResourceData::Items(typed)
            }
            _ => ResourceData::Text(scalar(raw).ok_or_else(malformed)?),
        };
        let kind = ResourceKind::from_type_name(res_type).unwrap_or(ResourceKind::CharSequence);
        Ok(Some(TypedResource::new(data, kind, qualifiers, source.clone())))
    }

    fn style(&self, name: &str, raw: &Value) -> Option<StyleData> {
        let Value::Object(fields) = raw else {
            return None;
        };
        let parent = match fields.get("parent") {
            Some(parent) => Some(parent.as_str()?.to_string()),
            None => None,
        };
        let mut attributes = Vec::new();
        if let Some(items) = fields.get("items") {
            for (attr_name, value) in items.as_object()? {
                let res_name = ResName::qualify(attr_name, &self.package_name, "attr")?;
                attributes.push(AttributeResource::new(res_name, scalar(value)?, self.package_name.as_str()));
            }
        }
        Some(StyleData::new(self.package_name.as_str(), name, parent, attributes))
    }
}

impl ResourceLoader for DirectoryLoader {
    fn package_name(&self) -> &str {
        &self.package_name
    }

    fn load(&self, table: &mut PackageResourceTable) -> Result<()> {
        if let Some(id_source) = &self.id_source {
            for (id, res_type, name) in id_source.resource_ids()? {
                table.add_resource(id, &res_type, &name)?;
            }
        }
        let mut loaded = 0;
        for dir in self.tree.list(&self.root)? {
            if !self.tree.is_dir(&dir) {
                continue;
            }
            let Some(dir_name) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let directory = match ResDirectory::parse(dir_name) {
                Ok(directory) => directory,
                Err(e) => {
                    warn!(directory = %dir.display(), error = %e, "skipping resource directory");
                    continue;
                }
            };
            loaded += self.load_directory(table, &dir, &directory)?;
        }
        if let Some(package_identifier) = self.generated_ids {
            table.generate_missing_ids(package_identifier)?;
        }
        info!(package = %self.package_name, root = %self.root.display(), resources = loaded, "load pass complete");
        Ok(())
    }
}

// ------------- helpers -------------
/// `icon.9.png` → `icon`
fn resource_name(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::from("@null")),
        _ => None,
    }
}

fn pair(value: &Value) -> Option<(String, String)> {
    match value.as_array()?.as_slice() {
        [first, second] => Some((scalar(first)?, scalar(second)?)),
        _ => None,
    }
}

fn plurals(raw: &Value) -> Option<PluralRuleSet> {
    let rules = raw.as_array()?.iter().map(pair).collect::<Option<Vec<_>>>()?;
    Some(PluralRuleSet::from_rules(rules))
}

fn attr(name: &str, raw: &Value) -> Result<AttrData> {
    let (format, pairs) = match raw {
        Value::String(format) => (format.clone(), Vec::new()),
        Value::Object(fields) => {
            let format = fields.get("format").and_then(Value::as_str).unwrap_or_default().to_string();
            let pairs = match fields.get("values") {
                Some(values) => values
                    .as_array()
                    .and_then(|values| values.iter().map(pair).collect::<Option<Vec<_>>>())
                    .ok_or_else(|| ResourceError::Load(format!("attribute '{}' has malformed values", name)))?,
                None => Vec::new(),
            };
            (format, pairs)
        }
        _ => return Err(ResourceError::Load(format!("attribute '{}' is malformed", name))),
    };
    AttrData::new(name, format, pairs)
}
