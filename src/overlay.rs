//! Builds one table out of several independently loaded package tables,
//! re-keyed into the overlay's own package.

use std::io::Read;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::OverlaySettings;
use crate::construct::{ResName, ResourceId};
use crate::datatype::TypedResource;
use crate::error::{ResourceError, Result};
use crate::index::ResourceIndex;
use crate::loader::ResourceLoader;
use crate::store::ResBundle;
use crate::table::{PackageResourceTable, ResourceCategory, ResourceTable, XmlBlock};

// ------------- OverlayResourceTable -------------
#[derive(Debug)]
pub struct OverlayResourceTable {
    merged: PackageResourceTable,
    sub_packages: Vec<String>,
    sub_indexes: Vec<Arc<ResourceIndex>>,
}

impl OverlayResourceTable {
    /// Runs every loader on a bounded worker pool, then merges the loaded
    /// tables one category per task. Must not be called from inside an async
    /// runtime.
    ///
    /// Loading and merging share one deadline; missing it aborts the build.
    pub fn build(package_name: &str, loaders: Vec<Box<dyn ResourceLoader>>, settings: &OverlaySettings) -> Result<Self> {
        let pool_size = settings.pool_size();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(pool_size)
            .max_blocking_threads(pool_size)
            .thread_name("overlay-worker")
            .enable_time()
            .build()?;
        info!(package = package_name, libraries = loaders.len(), pool_size, "building overlay");
        let deadline = settings.merge_timeout();
        let package = package_name.to_string();
        let outcome = runtime.block_on(async move { tokio::time::timeout(deadline, load_and_merge(package, loaders)).await });
        match outcome {
            Ok(result) => {
                drop(runtime);
                result
            }
            Err(_) => {
                // blocking workers may still be running
                runtime.shutdown_background();
                Err(ResourceError::MergeTimeout {
                    package: package_name.to_string(),
                    seconds: deadline.as_secs(),
                })
            }
        }
    }

    /// Merges tables that are already loaded, on the calling thread.
    pub fn from_tables(package_name: &str, tables: Vec<PackageResourceTable>) -> Result<Self> {
        let subs: Vec<Arc<PackageResourceTable>> = tables.into_iter().map(Arc::new).collect();
        let mut bundles = Vec::with_capacity(ResourceCategory::ALL.len());
        for category in ResourceCategory::ALL {
            bundles.push((category, merge_category(package_name, category, &subs)?));
        }
        assemble(package_name, &subs, bundles)
    }

    pub fn table(&self) -> &PackageResourceTable {
        &self.merged
    }
    pub fn sub_packages(&self) -> &[String] {
        &self.sub_packages
    }

    // names of the overlay or of any library are answered under the
    // overlay's own package
    fn rekey(&self, res_name: &ResName) -> Option<ResName> {
        if self.provides_for(res_name.package()) {
            Some(res_name.with_package(self.merged.package_name()))
        } else {
            None
        }
    }
}

async fn load_and_merge(package: String, loaders: Vec<Box<dyn ResourceLoader>>) -> Result<OverlayResourceTable> {
    let mut loads = JoinSet::new();
    for (position, loader) in loaders.into_iter().enumerate() {
        loads.spawn_blocking(move || -> Result<(usize, PackageResourceTable)> {
            let mut table = PackageResourceTable::new(loader.package_name());
            loader.load(&mut table)?;
            table.seal();
            debug!(package = loader.package_name(), values = table.value_count(), "library loaded");
            Ok((position, table))
        });
    }
    let mut loaded = join_all(&mut loads).await?;
    // registration order decides ties, not completion order
    loaded.sort_by_key(|(position, _)| *position);
    let subs: Vec<Arc<PackageResourceTable>> = loaded.into_iter().map(|(_, table)| Arc::new(table)).collect();

    let mut merges = JoinSet::new();
    for category in ResourceCategory::ALL {
        let subs = subs.clone();
        let package = package.clone();
        merges.spawn_blocking(move || -> Result<(ResourceCategory, ResBundle)> {
            Ok((category, merge_category(&package, category, &subs)?))
        });
    }
    let bundles = join_all(&mut merges).await?;
    assemble(&package, &subs, bundles)
}

async fn join_all<T: Send + 'static>(tasks: &mut JoinSet<Result<T>>) -> Result<Vec<T>> {
    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let result = joined.map_err(|e| ResourceError::Invariant(format!("overlay worker failed: {}", e)))?;
        results.push(result?);
    }
    Ok(results)
}

fn merge_category(package: &str, category: ResourceCategory, subs: &[Arc<PackageResourceTable>]) -> Result<ResBundle> {
    let mut bundle = ResBundle::new(package);
    for sub in subs {
        bundle.absorb(sub.store(category))?;
    }
    debug!(package, %category, names = bundle.len(), "category merged");
    Ok(bundle)
}

fn assemble(
    package: &str,
    subs: &[Arc<PackageResourceTable>],
    bundles: Vec<(ResourceCategory, ResBundle)>,
) -> Result<OverlayResourceTable> {
    let index = Arc::new(ResourceIndex::new(package));
    let mut expected = 0;
    let mut merged = 0;
    for sub in subs {
        expected += sub.index().len();
        merged = index.absorb(sub.index())?;
    }
    if merged != expected {
        return Err(ResourceError::MergeCollision {
            package: package.to_string(),
            merged,
            expected,
        });
    }
    let mut table = PackageResourceTable::with_index(package, index);
    for (category, bundle) in bundles {
        table.replace_store(category, bundle)?;
    }
    table.seal();
    info!(package, ids = merged, values = table.value_count(), "overlay assembled");
    Ok(OverlayResourceTable {
        merged: table,
        sub_packages: subs.iter().map(|sub| sub.package_name().to_string()).collect(),
        sub_indexes: subs.iter().map(|sub| Arc::clone(sub.index())).collect(),
    })
}

impl ResourceTable for OverlayResourceTable {
    fn package_name(&self) -> &str {
        self.merged.package_name()
    }
    fn package_identifier(&self) -> Option<u8> {
        self.merged.package_identifier()
    }
    fn get_resource_id(&self, res_name: &ResName) -> Option<ResourceId> {
        let rekeyed = self.rekey(res_name)?;
        self.merged.get_resource_id(&rekeyed).or_else(|| {
            self.sub_indexes
                .iter()
                .find_map(|index| index.lookup_id(&rekeyed.with_package(index.package_name())))
        })
    }
    fn get_res_name(&self, id: ResourceId) -> Option<ResName> {
        self.merged.get_res_name(id).or_else(|| {
            self.sub_indexes
                .iter()
                .find_map(|index| index.get_name(id))
                .map(|name| name.with_package(self.merged.package_name()))
        })
    }
    fn get_value(&self, res_name: &ResName, qualifiers: &str) -> Option<&TypedResource> {
        self.merged.get_value(&self.rekey(res_name)?, qualifiers)
    }
    fn get_xml(&self, res_name: &ResName, qualifiers: &str) -> Option<XmlBlock> {
        self.merged.get_xml(&self.rekey(res_name)?, qualifiers)
    }
    fn get_raw_value(&self, res_name: &ResName, qualifiers: &str) -> Option<Box<dyn Read + Send>> {
        self.merged.get_raw_value(&self.rekey(res_name)?, qualifiers)
    }
    fn provides_for(&self, namespace: &str) -> bool {
        self.merged.package_name() == namespace || self.sub_packages.iter().any(|p| p == namespace)
    }
    fn visit(&self, visitor: &mut dyn FnMut(&ResName, &[TypedResource])) {
        self.merged.visit(visitor)
    }
}
