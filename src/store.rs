use std::collections::HashMap;

use tracing::trace;

use crate::construct::{NameHasher, ResName};
use crate::datatype::TypedResource;
use crate::error::{ResourceError, Result};
use crate::matcher::pick_best;

// ------------- ResBundle -------------
/// Qualifier-tagged variants per resource name, for one package.
///
/// Variant lists stay sorted by qualifier string, which keeps matching
/// independent of the order a load pass happened to put them in.
#[derive(Debug, Clone)]
pub struct ResBundle {
    package: String,
    entries: HashMap<ResName, Vec<TypedResource>, NameHasher>,
    sealed: bool,
}

impl ResBundle {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            entries: HashMap::default(),
            sealed: false,
        }
    }
    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn put(&mut self, res_type: &str, name: &str, value: TypedResource) -> Result<()> {
        if self.sealed {
            return Err(ResourceError::Sealed(self.package.clone()));
        }
        let key = ResName::new(self.package.as_str(), res_type, name);
        let variants = self.entries.entry(key).or_default();
        let duplicate = variants
            .iter()
            .any(|v| v.qualifiers() == value.qualifiers() && v.source() == value.source());
        if duplicate {
            trace!(package = %self.package, res_type, name, qualifiers = value.qualifiers(), "duplicate variant ignored");
            return Ok(());
        }
        variants.push(value);
        // stable, so earlier variants stay first among equal qualifiers
        variants.sort_by(|a, b| a.qualifiers().cmp(b.qualifiers()));
        Ok(())
    }

    pub fn get(&self, res_name: &ResName, qualifiers: &str) -> Option<&TypedResource> {
        pick_best(qualifiers, self.entries.get(res_name)?)
    }
    pub fn variants(&self, res_name: &ResName) -> Option<&[TypedResource]> {
        self.entries.get(res_name).map(Vec::as_slice)
    }
    pub fn contains(&self, res_name: &ResName) -> bool {
        self.entries.contains_key(res_name)
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Every name with all of its variants, in name order.
    pub fn visit(&self, mut visitor: impl FnMut(&ResName, &[TypedResource])) {
        let mut names: Vec<&ResName> = self.entries.keys().collect();
        names.sort();
        for name in names {
            visitor(name, &self.entries[name]);
        }
    }

    /// Appends the variants of another bundle, re-keyed into this bundle's
    /// package. Variants already present keep their place ahead of the
    /// appended ones when qualifiers are equal.
    pub fn absorb(&mut self, other: &ResBundle) -> Result<()> {
        if self.sealed {
            return Err(ResourceError::Sealed(self.package.clone()));
        }
        for (name, variants) in &other.entries {
            let key = name.with_package(&self.package);
            self.entries.entry(key).or_default().extend(variants.iter().cloned());
        }
        for variants in self.entries.values_mut() {
            variants.sort_by(|a, b| a.qualifiers().cmp(b.qualifiers()));
        }
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &ResName> {
        self.entries.keys()
    }
    /// Number of names held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn variant_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
