//! Resource tables: the query surface over one or more packages.

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::construct::{ResName, ResourceId};
use crate::datatype::TypedResource;
use crate::error::{ResourceError, Result};
use crate::fs::FsFile;
use crate::index::ResourceIndex;
use crate::store::ResBundle;

// ------------- XmlBlock -------------
/// An XML document resource. Parsing the document is left to the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct XmlBlock {
    file: FsFile,
    package_name: String,
    qualifiers: String,
}

impl XmlBlock {
    pub fn new(file: FsFile, package_name: impl Into<String>, qualifiers: impl Into<String>) -> Self {
        Self {
            file,
            package_name: package_name.into(),
            qualifiers: qualifiers.into(),
        }
    }
    pub fn file(&self) -> &FsFile {
        &self.file
    }
    pub fn package_name(&self) -> &str {
        &self.package_name
    }
    pub fn qualifiers(&self) -> &str {
        &self.qualifiers
    }
    pub fn read_to_string(&self) -> Result<String> {
        self.file.read_to_string()
    }
}

// ------------- ResourceTable -------------
/// Read access shared by package, overlay, routing and empty tables.
/// Unresolvable lookups answer `None`.
pub trait ResourceTable: Send + Sync {
    fn package_name(&self) -> &str;
    fn package_identifier(&self) -> Option<u8>;
    fn get_resource_id(&self, res_name: &ResName) -> Option<ResourceId>;
    fn get_res_name(&self, id: ResourceId) -> Option<ResName>;
    fn get_value(&self, res_name: &ResName, qualifiers: &str) -> Option<&TypedResource>;
    fn get_xml(&self, res_name: &ResName, qualifiers: &str) -> Option<XmlBlock>;
    fn get_raw_value(&self, res_name: &ResName, qualifiers: &str) -> Option<Box<dyn Read + Send>>;
    /// Whether names in `namespace` are answered by this table.
    fn provides_for(&self, namespace: &str) -> bool;
    fn visit(&self, visitor: &mut dyn FnMut(&ResName, &[TypedResource]));

    fn get_value_by_id(&self, id: ResourceId, qualifiers: &str) -> Option<&TypedResource> {
        let res_name = self.get_res_name(id)?;
        self.get_value(&res_name, qualifiers)
    }
    fn get_xml_by_id(&self, id: ResourceId, qualifiers: &str) -> Option<XmlBlock> {
        let res_name = self.get_res_name(id)?;
        self.get_xml(&res_name, qualifiers)
    }
    fn get_raw_value_by_id(&self, id: ResourceId, qualifiers: &str) -> Option<Box<dyn Read + Send>> {
        let res_name = self.get_res_name(id)?;
        self.get_raw_value(&res_name, qualifiers)
    }
    /// A value, then an XML document, then a raw file.
    fn has_value(&self, res_name: &ResName, qualifiers: &str) -> bool {
        self.get_value(res_name, qualifiers).is_some()
            || self.get_xml(res_name, qualifiers).is_some()
            || self.get_raw_value(res_name, qualifiers).is_some()
    }
}

// ------------- ResourceCategory -------------
/// The stores a package table keeps apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceCategory {
    Plurals,
    Strings,
    Drawables,
    Preferences,
    XmlDocuments,
    RawResources,
    Values,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 7] = [
        ResourceCategory::Plurals,
        ResourceCategory::Strings,
        ResourceCategory::Drawables,
        ResourceCategory::Preferences,
        ResourceCategory::XmlDocuments,
        ResourceCategory::RawResources,
        ResourceCategory::Values,
    ];
    pub fn index(&self) -> usize {
        *self as usize
    }
    pub fn uid(&self) -> u8 {
        *self as u8
    }
    pub fn from_uid(uid: u8) -> Option<ResourceCategory> {
        ResourceCategory::ALL.get(uid as usize).copied()
    }
    /// Store for values declared in `values*` directories or as files.
    pub fn for_value(res_type: &str) -> ResourceCategory {
        match res_type {
            "plurals" => ResourceCategory::Plurals,
            "string" => ResourceCategory::Strings,
            "drawable" | "mipmap" => ResourceCategory::Drawables,
            _ => ResourceCategory::Values,
        }
    }
    /// Store for XML documents; `xml/` documents are preference screens.
    pub fn for_xml(res_type: &str) -> ResourceCategory {
        match res_type {
            "xml" => ResourceCategory::Preferences,
            _ => ResourceCategory::XmlDocuments,
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ResourceCategory::Plurals => "plurals",
            ResourceCategory::Strings => "strings",
            ResourceCategory::Drawables => "drawables",
            ResourceCategory::Preferences => "preferences",
            ResourceCategory::XmlDocuments => "xml-documents",
            ResourceCategory::RawResources => "raw-resources",
            ResourceCategory::Values => "values",
        };
        write!(f, "{}", name)
    }
}

// ------------- PackageResourceTable -------------
#[derive(Debug)]
pub struct PackageResourceTable {
    package_name: String,
    index: Arc<ResourceIndex>,
    stores: [ResBundle; 7],
    sealed: bool,
}

impl PackageResourceTable {
    pub fn new(package_name: impl Into<String>) -> Self {
        let package_name = package_name.into();
        let index = Arc::new(ResourceIndex::new(package_name.as_str()));
        Self::with_index(package_name, index)
    }
    pub fn with_index(package_name: impl Into<String>, index: Arc<ResourceIndex>) -> Self {
        let package_name = package_name.into();
        Self {
            stores: ResourceCategory::ALL.map(|_| ResBundle::new(package_name.as_str())),
            package_name,
            index,
            sealed: false,
        }
    }
    pub fn index(&self) -> &Arc<ResourceIndex> {
        &self.index
    }
    pub fn store(&self, category: ResourceCategory) -> &ResBundle {
        &self.stores[category.index()]
    }

    fn check_open(&self) -> Result<()> {
        if self.sealed {
            return Err(ResourceError::Sealed(self.package_name.clone()));
        }
        Ok(())
    }

    pub fn add_resource(&mut self, id: ResourceId, res_type: &str, name: &str) -> Result<()> {
        self.check_open()?;
        self.index.add(id, res_type, name)
    }
    pub fn add_value(&mut self, res_type: &str, name: &str, value: TypedResource) -> Result<()> {
        self.check_open()?;
        self.stores[ResourceCategory::for_value(res_type).index()].put(res_type, name, value)
    }
    pub fn add_xml(&mut self, res_type: &str, name: &str, value: TypedResource) -> Result<()> {
        self.check_open()?;
        self.stores[ResourceCategory::for_xml(res_type).index()].put(res_type, name, value)
    }
    pub fn add_raw(&mut self, res_type: &str, name: &str, value: TypedResource) -> Result<()> {
        self.check_open()?;
        self.stores[ResourceCategory::RawResources.index()].put(res_type, name, value)
    }
    /// Places a variant directly into the given store.
    pub fn add_to_category(&mut self, category: ResourceCategory, res_type: &str, name: &str, value: TypedResource) -> Result<()> {
        self.check_open()?;
        self.stores[category.index()].put(res_type, name, value)
    }
    pub(crate) fn replace_store(&mut self, category: ResourceCategory, store: ResBundle) -> Result<()> {
        self.check_open()?;
        self.stores[category.index()] = store;
        Ok(())
    }

    /// Gives every name held by the stores but unknown to the index an id
    /// above the largest one in use, starting at `package_identifier << 24`
    /// for an empty index.
    pub fn generate_missing_ids(&mut self, package_identifier: u8) -> Result<usize> {
        self.check_open()?;
        let base = (package_identifier as ResourceId) << 24;
        let mut next = self.index.max_id().unwrap_or(base);
        let mut missing: Vec<ResName> = self
            .stores
            .iter()
            .flat_map(|store| store.names())
            .filter(|name| self.index.lookup_id(name).is_none())
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        for name in &missing {
            next += 1;
            self.index.add_name(next, name.clone())?;
        }
        debug!(package = %self.package_name, generated = missing.len(), "generated resource ids");
        Ok(missing.len())
    }

    /// One-way; further writes fail.
    pub fn seal(&mut self) {
        for store in self.stores.iter_mut() {
            store.seal();
        }
        self.sealed = true;
    }
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn visit_categories(&self, mut visitor: impl FnMut(ResourceCategory, &ResName, &[TypedResource])) {
        for category in ResourceCategory::ALL {
            self.stores[category.index()].visit(|name, variants| visitor(category, name, variants));
        }
    }
    pub fn value_count(&self) -> usize {
        self.stores.iter().map(ResBundle::len).sum()
    }

    fn get_from(&self, categories: &[ResourceCategory], res_name: &ResName, qualifiers: &str) -> Option<&TypedResource> {
        categories
            .iter()
            .find_map(|category| self.stores[category.index()].get(res_name, qualifiers))
    }
}

impl ResourceTable for PackageResourceTable {
    fn package_name(&self) -> &str {
        &self.package_name
    }
    fn package_identifier(&self) -> Option<u8> {
        self.index.package_identifier()
    }
    fn get_resource_id(&self, res_name: &ResName) -> Option<ResourceId> {
        self.index.get_id(res_name)
    }
    fn get_res_name(&self, id: ResourceId) -> Option<ResName> {
        self.index.get_name(id)
    }
    fn get_value(&self, res_name: &ResName, qualifiers: &str) -> Option<&TypedResource> {
        self.get_from(&[ResourceCategory::for_value(res_name.res_type())], res_name, qualifiers)
    }
    fn get_xml(&self, res_name: &ResName, qualifiers: &str) -> Option<XmlBlock> {
        let variant = self.get_from(&[ResourceCategory::for_xml(res_name.res_type())], res_name, qualifiers)?;
        let file = variant.as_file()?;
        Some(XmlBlock::new(file.clone(), variant.source().package(), variant.qualifiers()))
    }
    fn get_raw_value(&self, res_name: &ResName, qualifiers: &str) -> Option<Box<dyn Read + Send>> {
        let variant = self.get_from(&[ResourceCategory::RawResources], res_name, qualifiers)?;
        let file = variant.as_file()?;
        match file.open() {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(name = %res_name, file = %file, error = %e, "raw resource cannot be opened");
                None
            }
        }
    }
    fn provides_for(&self, namespace: &str) -> bool {
        self.package_name == namespace
    }
    fn visit(&self, visitor: &mut dyn FnMut(&ResName, &[TypedResource])) {
        for store in &self.stores {
            store.visit(|name, variants| visitor(name, variants));
        }
    }
}

// ------------- EmptyResourceTable -------------
/// Answers nothing. Queries that route nowhere end up here.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyResourceTable;

impl ResourceTable for EmptyResourceTable {
    fn package_name(&self) -> &str {
        ""
    }
    fn package_identifier(&self) -> Option<u8> {
        None
    }
    fn get_resource_id(&self, _res_name: &ResName) -> Option<ResourceId> {
        None
    }
    fn get_res_name(&self, _id: ResourceId) -> Option<ResName> {
        None
    }
    fn get_value(&self, _res_name: &ResName, _qualifiers: &str) -> Option<&TypedResource> {
        None
    }
    fn get_xml(&self, _res_name: &ResName, _qualifiers: &str) -> Option<XmlBlock> {
        None
    }
    fn get_raw_value(&self, _res_name: &ResName, _qualifiers: &str) -> Option<Box<dyn Read + Send>> {
        None
    }
    fn provides_for(&self, _namespace: &str) -> bool {
        false
    }
    fn visit(&self, _visitor: &mut dyn FnMut(&ResName, &[TypedResource])) {}
}
