use std::io::Read;
use std::sync::Arc;

use tracing::trace;

use crate::construct::{is_framework_package, package_identifier, ResName, ResourceId};
use crate::datatype::TypedResource;
use crate::table::{EmptyResourceTable, ResourceTable, XmlBlock};

/// Declared by some framework XML as a namespace but never backed by a table.
pub const INTERNAL_NAMESPACE: &str = "android.internal";

// ------------- RoutingResourceTable -------------
/// Dispatches queries to one table per top-level namespace.
///
/// By id, framework tables are asked first and then the rest in registration
/// order, matching on the id's package identifier. By name, the exact
/// namespace wins, then the first table that provides for it.
#[derive(Default)]
pub struct RoutingResourceTable {
    tables: Vec<(String, Arc<dyn ResourceTable>)>,
    empty: EmptyResourceTable,
}

impl RoutingResourceTable {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_table(mut self, table: Arc<dyn ResourceTable>) -> Self {
        self.register(table);
        self
    }
    /// Registers under the table's own package name. A later table for the
    /// same namespace replaces the earlier one in place.
    pub fn register(&mut self, table: Arc<dyn ResourceTable>) {
        let namespace = table.package_name().to_string();
        match self.tables.iter_mut().find(|(ns, _)| *ns == namespace) {
            Some(entry) => entry.1 = table,
            None => self.tables.push((namespace, table)),
        }
    }
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(ns, _)| ns.as_str())
    }

    pub fn pick_by_id(&self, id: ResourceId) -> &dyn ResourceTable {
        let wanted = package_identifier(id);
        let framework = self.tables.iter().filter(|(ns, _)| is_framework_package(ns));
        let others = self.tables.iter().filter(|(ns, _)| !is_framework_package(ns));
        match framework
            .chain(others)
            .find(|(_, table)| table.package_identifier() == Some(wanted))
        {
            Some((_, table)) => table.as_ref(),
            None => {
                trace!(id = format_args!("{:#010x}", id), "no table for package identifier");
                &self.empty
            }
        }
    }

    pub fn pick_by_name(&self, namespace: &str) -> &dyn ResourceTable {
        if namespace == INTERNAL_NAMESPACE {
            return &self.empty;
        }
        if let Some((_, table)) = self.tables.iter().find(|(ns, _)| ns == namespace) {
            return table.as_ref();
        }
        match self.tables.iter().find(|(_, table)| table.provides_for(namespace)) {
            Some((_, table)) => table.as_ref(),
            None => {
                trace!(namespace, "no table for namespace");
                &self.empty
            }
        }
    }
}

impl ResourceTable for RoutingResourceTable {
    fn package_name(&self) -> &str {
        ""
    }
    fn package_identifier(&self) -> Option<u8> {
        None
    }
    fn get_resource_id(&self, res_name: &ResName) -> Option<ResourceId> {
        self.pick_by_name(res_name.package()).get_resource_id(res_name)
    }
    fn get_res_name(&self, id: ResourceId) -> Option<ResName> {
        self.pick_by_id(id).get_res_name(id)
    }
    fn get_value(&self, res_name: &ResName, qualifiers: &str) -> Option<&TypedResource> {
        self.pick_by_name(res_name.package()).get_value(res_name, qualifiers)
    }
    fn get_value_by_id(&self, id: ResourceId, qualifiers: &str) -> Option<&TypedResource> {
        self.pick_by_id(id).get_value_by_id(id, qualifiers)
    }
    fn get_xml(&self, res_name: &ResName, qualifiers: &str) -> Option<XmlBlock> {
        self.pick_by_name(res_name.package()).get_xml(res_name, qualifiers)
    }
    fn get_xml_by_id(&self, id: ResourceId, qualifiers: &str) -> Option<XmlBlock> {
        self.pick_by_id(id).get_xml_by_id(id, qualifiers)
    }
    fn get_raw_value(&self, res_name: &ResName, qualifiers: &str) -> Option<Box<dyn Read + Send>> {
        self.pick_by_name(res_name.package()).get_raw_value(res_name, qualifiers)
    }
    fn get_raw_value_by_id(&self, id: ResourceId, qualifiers: &str) -> Option<Box<dyn Read + Send>> {
        self.pick_by_id(id).get_raw_value_by_id(id, qualifiers)
    }
    fn provides_for(&self, namespace: &str) -> bool {
        namespace != INTERNAL_NAMESPACE && self.tables.iter().any(|(_, table)| table.provides_for(namespace))
    }
    fn visit(&self, visitor: &mut dyn FnMut(&ResName, &[TypedResource])) {
        for (_, table) in &self.tables {
            table.visit(visitor);
        }
    }
}
