use std::sync::{Mutex, OnceLock, PoisonError, RwLock};

use bimap::BiMap;
use tracing::warn;

use crate::construct::{
    is_framework_package, package_identifier, IdGenerator, ResName, ResourceId, FRAMEWORK_PACKAGE_IDENTIFIER,
};
use crate::error::{ResourceError, Result};

// ------------- ResourceIndex -------------
/// Bidirectional map between numeric ids and names, for one package
/// identifier. The identifier is fixed by the first id that is added.
#[derive(Debug)]
pub struct ResourceIndex {
    package_name: String,
    package_identifier: OnceLock<u8>,
    kept: RwLock<BiMap<ResName, ResourceId>>,
    // only the synthetic allocation needs serializing across loaders
    generator: Mutex<Option<IdGenerator>>,
}

impl ResourceIndex {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            package_identifier: OnceLock::new(),
            kept: RwLock::new(BiMap::new()),
            generator: Mutex::new(None),
        }
    }
    pub fn package_name(&self) -> &str {
        &self.package_name
    }
    pub fn package_identifier(&self) -> Option<u8> {
        self.package_identifier.get().copied()
    }

    fn claim_identifier(&self, id: ResourceId) -> Result<()> {
        let actual = package_identifier(id);
        let expected = *self.package_identifier.get_or_init(|| actual);
        if expected != actual {
            return Err(ResourceError::PackageIdentifierMismatch { id, expected, actual });
        }
        Ok(())
    }

    /// Registers `id` for `package:res_type/name` of this index's package.
    pub fn add(&self, id: ResourceId, res_type: &str, name: &str) -> Result<()> {
        self.add_name(id, ResName::new(self.package_name.as_str(), res_type, name))
    }

    /// Registers `id` for an already qualified name. Adding the same pair
    /// twice is a no-op; any other reuse of the id or the name fails.
    pub fn add_name(&self, id: ResourceId, res_name: ResName) -> Result<()> {
        self.claim_identifier(id)?;
        let mut kept = self.kept.write().unwrap_or_else(PoisonError::into_inner);
        match (kept.get_by_right(&id), kept.get_by_left(&res_name)) {
            (Some(existing), _) if *existing == res_name => return Ok(()),
            (Some(existing), _) => {
                return Err(ResourceError::IdCollision {
                    id,
                    existing: existing.clone(),
                    requested: res_name,
                });
            }
            (None, Some(existing)) => {
                return Err(ResourceError::NameCollision {
                    name: res_name,
                    existing: *existing,
                    requested: id,
                });
            }
            (None, None) => {}
        }
        kept.insert(res_name, id);
        drop(kept);
        if let Some(generator) = self.generator.lock().unwrap_or_else(PoisonError::into_inner).as_mut() {
            generator.retain(id);
        }
        Ok(())
    }

    /// The id of `res_name`. Framework names and names without a package get
    /// a synthetic id on first request; other unknown names have none.
    pub fn get_id(&self, res_name: &ResName) -> Option<ResourceId> {
        if let Some(id) = self.lookup_id(res_name) {
            return Some(id);
        }
        let package = res_name.package();
        if !(package.is_empty() || is_framework_package(package)) {
            return None;
        }
        let mut generator = self.generator.lock().unwrap_or_else(PoisonError::into_inner);
        let mut kept = self.kept.write().unwrap_or_else(PoisonError::into_inner);
        // another loader may have allocated it while we waited
        if let Some(id) = kept.get_by_left(res_name) {
            return Some(*id);
        }
        let generator = generator.get_or_insert_with(|| {
            let base = (*self.package_identifier.get_or_init(|| FRAMEWORK_PACKAGE_IDENTIFIER) as ResourceId) << 24;
            let floor = kept.right_values().copied().max().unwrap_or(base);
            IdGenerator::new(floor)
        });
        let id = generator.generate();
        kept.insert(res_name.clone(), id);
        warn!(name = %res_name, id = format_args!("{:#010x}", id), "no id mapping found, assigned a synthetic one");
        Some(id)
    }

    /// The id of `res_name` without allocating.
    pub fn lookup_id(&self, res_name: &ResName) -> Option<ResourceId> {
        let kept = self.kept.read().unwrap_or_else(PoisonError::into_inner);
        kept.get_by_left(res_name).copied()
    }

    pub fn get_name(&self, id: ResourceId) -> Option<ResName> {
        let kept = self.kept.read().unwrap_or_else(PoisonError::into_inner);
        kept.get_by_right(&id).cloned()
    }

    /// Copies every entry of `other`, re-keyed into this index's package,
    /// overwriting on collision. Returns the number of entries afterwards so
    /// that callers can detect entries lost to a collision.
    pub fn absorb(&self, other: &ResourceIndex) -> Result<usize> {
        let entries = other.entries();
        let mut kept = self.kept.write().unwrap_or_else(PoisonError::into_inner);
        for (name, id) in entries {
            self.claim_identifier(id)?;
            kept.insert(name.with_package(&self.package_name), id);
        }
        Ok(kept.len())
    }

    /// All entries, ordered by id.
    pub fn entries(&self) -> Vec<(ResName, ResourceId)> {
        let kept = self.kept.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<(ResName, ResourceId)> = kept.iter().map(|(n, i)| (n.clone(), *i)).collect();
        entries.sort_by_key(|(_, id)| *id);
        entries
    }
    pub fn max_id(&self) -> Option<ResourceId> {
        let kept = self.kept.read().unwrap_or_else(PoisonError::into_inner);
        kept.right_values().copied().max()
    }
    pub fn len(&self) -> usize {
        self.kept.read().unwrap_or_else(PoisonError::into_inner).len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
