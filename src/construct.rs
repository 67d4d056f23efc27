use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

// allocated ids are tracked as a bitmap so that generation can skip them
use roaring::RoaringBitmap;

use serde::{Deserialize, Serialize};

// used to print out readable forms of a construct
use std::fmt;

// ------------- Resource id -------------
/// A numeric resource id. The top byte is the package identifier, the
/// remaining bits encode type and entry within that package.
pub type ResourceId = u32;

pub type NameHasher = BuildHasherDefault<SeaHasher>;

pub const FRAMEWORK_PACKAGE: &str = "android";
pub const FRAMEWORK_PACKAGE_IDENTIFIER: u8 = 0x01;
pub const APPLICATION_PACKAGE_IDENTIFIER: u8 = 0x7f;

pub fn package_identifier(id: ResourceId) -> u8 {
    (id >> 24) as u8
}

pub fn is_framework_package(package: &str) -> bool {
    package == FRAMEWORK_PACKAGE
}

#[derive(Debug)]
pub struct IdGenerator {
    lower_bound: ResourceId,
    retained: RoaringBitmap,
}

impl IdGenerator {
    /// Starts generating right above `floor`, which is normally the largest
    /// id already known to the index.
    pub fn new(floor: ResourceId) -> Self {
        Self {
            lower_bound: floor,
            retained: RoaringBitmap::new(),
        }
    }
    // Ids handed out by a generated identifier table are retained so that
    // generation never hands them out a second time.
    pub fn retain(&mut self, id: ResourceId) {
        self.retained.insert(id);
        if id > self.lower_bound {
            self.lower_bound = id;
        }
    }
    pub fn generate(&mut self) -> ResourceId {
        self.lower_bound += 1;
        while self.retained.contains(self.lower_bound) {
            self.lower_bound += 1;
        }
        self.retained.insert(self.lower_bound);
        self.lower_bound
    }
}

// ------------- ResName -------------
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ResName {
    package: String,
    res_type: String,
    name: String,
}

impl ResName {
    pub fn new(package: impl Into<String>, res_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            res_type: res_type.into(),
            name: name.into(),
        }
    }
    // It's intentional to encapsulate the triple in the struct
    // and only expose it using "getters", because this yields
    // true immutability for names used as map keys.
    pub fn package(&self) -> &str {
        &self.package
    }
    pub fn res_type(&self) -> &str {
        &self.res_type
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn is_framework(&self) -> bool {
        is_framework_package(&self.package)
    }
    pub fn with_package(&self, package: &str) -> ResName {
        ResName::new(package, self.res_type.as_str(), self.name.as_str())
    }
    pub fn with_type(&self, res_type: &str) -> ResName {
        ResName::new(self.package.as_str(), res_type, self.name.as_str())
    }

    /// Qualifies a possibly partial reference such as `@string/app_name`,
    /// `?android:attr/textColor`, `android:color/white` or plain `title`.
    /// Missing parts are taken from the defaults. Returns `None` for empty
    /// input.
    pub fn qualify(reference: &str, default_package: &str, default_type: &str) -> Option<ResName> {
        let mut reference = reference.trim();
        reference = reference
            .strip_prefix('@')
            .or_else(|| reference.strip_prefix('?'))
            .unwrap_or(reference);
        reference = reference.strip_prefix('+').unwrap_or(reference);
        reference = reference.strip_prefix('*').unwrap_or(reference);
        if reference.is_empty() {
            return None;
        }
        let (head, name) = match reference.split_once('/') {
            Some((head, name)) => (Some(head), name),
            None => (None, reference),
        };
        let (package, res_type, name) = match head {
            Some(head) => match head.split_once(':') {
                Some((package, res_type)) => (package, res_type, name),
                None => (default_package, head, name),
            },
            None => match name.split_once(':') {
                Some((package, name)) => (package, default_type, name),
                None => (default_package, default_type, name),
            },
        };
        if name.is_empty() || res_type.is_empty() {
            return None;
        }
        let package = if package.is_empty() { default_package } else { package };
        Some(ResName::new(package, res_type, name))
    }
}

impl fmt::Display for ResName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}/{}", self.package, self.res_type, self.name)
    }
}
