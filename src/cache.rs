//! Advisory binary snapshot of a sealed package table.
//!
//! Layout, all integers big-endian, `varint` being unsigned LEB128:
//!
//! ```text
//! header      magic:i32 version:i32 resource_count:i32 index_offset:i64 string_table_offset:i64
//! records     per resource:
//!               variant_count:varint
//!               (qualifier_sid:varint category:u8 payload_length:varint) * variant_count
//!               (kind:u8 payload) * variant_count
//! index       package_sid:varint count:i32
//!               (package_sid type_sid name_sid:varint id:u32 record_offset:i64) * count
//! strings     count:i32 (length:varint utf8) * count, most frequent first
//! ```
//!
//! A payload is `source_package_sid source_path_sid` followed by a data tag:
//! `0 text_sid`, `1 path_sid` for files, or `2 length json` for structured
//! data. An id of 0 means the name had none.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::construct::{NameHasher, ResName, ResourceId};
use crate::datatype::{ResourceData, ResourceKind, SourceLocation, TypedResource};
use crate::error::{ResourceError, Result};
use crate::fs::FsFile;
use crate::table::{PackageResourceTable, ResourceCategory, ResourceTable};

pub const MAGIC: i32 = 0x5245_5354;
pub const FORMAT_VERSION: i32 = 1;
const HEADER_LENGTH: usize = 4 + 4 + 4 + 8 + 8;

const DATA_TEXT: u8 = 0;
const DATA_FILE: u8 = 1;
const DATA_JSON: u8 = 2;

// ------------- String pool -------------
struct StringPool<'a> {
    counts: HashMap<&'a str, usize, NameHasher>,
    ids: HashMap<&'a str, u64, NameHasher>,
    ordered: Vec<&'a str>,
}

impl<'a> StringPool<'a> {
    fn new() -> Self {
        Self {
            counts: HashMap::default(),
            ids: HashMap::default(),
            ordered: Vec::new(),
        }
    }
    fn count(&mut self, s: &'a str) {
        *self.counts.entry(s).or_insert(0) += 1;
    }
    // most frequent strings get the shortest ids
    fn freeze(&mut self) {
        let mut ordered: Vec<(&'a str, usize)> = self.counts.iter().map(|(s, c)| (*s, *c)).collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        self.ordered = ordered.into_iter().map(|(s, _)| s).collect();
        self.ids = self.ordered.iter().enumerate().map(|(i, s)| (*s, i as u64)).collect();
    }
    fn id(&self, s: &str) -> Result<u64> {
        self.ids
            .get(s)
            .copied()
            .ok_or_else(|| ResourceError::Invariant(format!("string '{}' missing from pool", s)))
    }
}

// ------------- Encoding -------------
fn put_varint(buffer: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buffer.push(byte);
            return;
        }
        buffer.push(byte | 0x80);
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    fn at(bytes: &'a [u8], position: usize) -> Self {
        Self { bytes, position }
    }
    fn take(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(length)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| ResourceError::Cache(format!("truncated at byte {}", self.position)))?;
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }
    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }
    fn u32(&mut self) -> Result<u32> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(raw))
    }
    fn i32(&mut self) -> Result<i32> {
        Ok(self.u32()? as i32)
    }
    fn i64(&mut self) -> Result<i64> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(i64::from_be_bytes(raw))
    }
    fn varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = self.u8()?;
            value |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ResourceError::Cache(format!("varint too long at byte {}", self.position)))
    }
    fn length(&mut self) -> Result<usize> {
        usize::try_from(self.varint()?).map_err(|e| ResourceError::Cache(e.to_string()))
    }
}

fn pooled(strings: &[String], sid: u64) -> Result<&str> {
    strings
        .get(sid as usize)
        .map(String::as_str)
        .ok_or_else(|| ResourceError::Cache(format!("string id {} out of range", sid)))
}

fn offset(value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| ResourceError::Cache(format!("negative offset {}", value)))
}

// ------------- ResourceCache -------------
pub struct ResourceCache;

impl ResourceCache {
    pub fn to_bytes(table: &PackageResourceTable) -> Result<Vec<u8>> {
        // one record per name, variants of every category together
        let mut resources: BTreeMap<ResName, Vec<(ResourceCategory, TypedResource)>> = BTreeMap::new();
        table.visit_categories(|category, name, variants| {
            resources
                .entry(name.clone())
                .or_default()
                .extend(variants.iter().map(|v| (category, v.clone())));
        });
        // names known only to the index keep their id
        for (name, _) in table.index().entries() {
            resources.entry(name).or_default();
        }
        let structured: Vec<Vec<Vec<u8>>> = resources
            .values()
            .map(|variants| variants.iter().map(|(_, v)| structured_data(v)).collect::<Result<Vec<_>>>())
            .collect::<Result<_>>()?;

        let mut pool = StringPool::new();
        pool.count(table.package_name());
        for (name, variants) in &resources {
            pool.count(name.package());
            pool.count(name.res_type());
            pool.count(name.name());
            for (_, variant) in variants {
                pool.count(variant.qualifiers());
                pool.count(variant.source().package());
                pool.count(variant.source().path());
                match variant.data() {
                    ResourceData::Text(text) => pool.count(text),
                    ResourceData::File(file) => pool.count(file_path(file)?),
                    _ => (),
                }
            }
        }
        pool.freeze();

        let mut buffer = vec![0u8; HEADER_LENGTH];
        let mut record_offsets = Vec::with_capacity(resources.len());
        for ((_, variants), structured) in resources.iter().zip(&structured) {
            record_offsets.push(buffer.len() as i64);
            let mut payloads = Vec::with_capacity(variants.len());
            for ((_, variant), json) in variants.iter().zip(structured) {
                payloads.push(payload(&pool, variant, json)?);
            }
            put_varint(&mut buffer, variants.len() as u64);
            for ((category, variant), payload) in variants.iter().zip(&payloads) {
                put_varint(&mut buffer, pool.id(variant.qualifiers())?);
                buffer.push(category.uid());
                put_varint(&mut buffer, payload.len() as u64);
            }
            for ((_, variant), payload) in variants.iter().zip(&payloads) {
                buffer.push(variant.kind().uid());
                buffer.extend_from_slice(payload);
            }
        }

        let index_offset = buffer.len() as i64;
        put_varint(&mut buffer, pool.id(table.package_name())?);
        buffer.extend_from_slice(&(resources.len() as i32).to_be_bytes());
        for (name, record_offset) in resources.keys().zip(&record_offsets) {
            put_varint(&mut buffer, pool.id(name.package())?);
            put_varint(&mut buffer, pool.id(name.res_type())?);
            put_varint(&mut buffer, pool.id(name.name())?);
            let id = table.index().lookup_id(name).unwrap_or(0);
            buffer.extend_from_slice(&id.to_be_bytes());
            buffer.extend_from_slice(&record_offset.to_be_bytes());
        }

        let string_table_offset = buffer.len() as i64;
        buffer.extend_from_slice(&(pool.ordered.len() as i32).to_be_bytes());
        for s in &pool.ordered {
            put_varint(&mut buffer, s.len() as u64);
            buffer.extend_from_slice(s.as_bytes());
        }

        // offsets are only known now
        let mut header = Vec::with_capacity(HEADER_LENGTH);
        header.extend_from_slice(&MAGIC.to_be_bytes());
        header.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        header.extend_from_slice(&(resources.len() as i32).to_be_bytes());
        header.extend_from_slice(&index_offset.to_be_bytes());
        header.extend_from_slice(&string_table_offset.to_be_bytes());
        buffer[..HEADER_LENGTH].copy_from_slice(&header);

        debug!(package = table.package_name(), resources = resources.len(), strings = pool.ordered.len(), bytes = buffer.len(), "cache encoded");
        Ok(buffer)
    }

    pub fn save(table: &PackageResourceTable, writer: &mut impl Write) -> Result<usize> {
        let bytes = Self::to_bytes(table)?;
        writer.write_all(&bytes)?;
        Ok(bytes.len())
    }

    pub fn save_to_path(table: &PackageResourceTable, path: &Path) -> Result<usize> {
        let mut writer = BufWriter::new(File::create(path)?);
        let written = Self::save(table, &mut writer)?;
        writer.flush()?;
        info!(package = table.package_name(), path = %path.display(), bytes = written, "cache written");
        Ok(written)
    }

    /// Rebuilds a sealed table. File-backed variants point at the disk.
    pub fn from_bytes(bytes: &[u8]) -> Result<PackageResourceTable> {
        let mut header = ByteReader::at(bytes, 0);
        let magic = header.i32()?;
        if magic != MAGIC {
            return Err(ResourceError::Cache(format!("bad magic {:#010x}", magic)));
        }
        let version = header.i32()?;
        if version != FORMAT_VERSION {
            return Err(ResourceError::Cache(format!("unsupported version {}", version)));
        }
        let resource_count = header.i32()?;
        let index_offset = offset(header.i64()?)?;
        let string_table_offset = offset(header.i64()?)?;

        let mut reader = ByteReader::at(bytes, string_table_offset);
        let string_count = reader.i32()?;
        let mut strings = Vec::new();
        for _ in 0..string_count {
            let length = reader.length()?;
            let raw = reader.take(length)?;
            strings.push(String::from_utf8(raw.to_vec()).map_err(|e| ResourceError::Cache(e.to_string()))?);
        }
        let string = |sid: u64| pooled(&strings, sid);

        let mut index = ByteReader::at(bytes, index_offset);
        let package_name = string(index.varint()?)?;
        let count = index.i32()?;
        if count != resource_count {
            return Err(ResourceError::Cache(format!("index holds {} entries, header says {}", count, resource_count)));
        }
        let mut table = PackageResourceTable::new(package_name);
        for _ in 0..count {
            let name = ResName::new(string(index.varint()?)?, string(index.varint()?)?, string(index.varint()?)?);
            let id: ResourceId = index.u32()?;
            let record_offset = offset(index.i64()?)?;
            if id != 0 {
                table.index().add_name(id, name.clone())?;
            }
            let mut record = ByteReader::at(bytes, record_offset);
            let variant_count = record.length()?;
            let mut slots = Vec::new();
            for _ in 0..variant_count {
                let qualifiers = string(record.varint()?)?;
                let category = ResourceCategory::from_uid(record.u8()?)
                    .ok_or_else(|| ResourceError::Cache(format!("bad category for {}", name)))?;
                slots.push((qualifiers, category, record.length()?));
            }
            for (qualifiers, category, length) in slots {
                let kind = ResourceKind::from_uid(record.u8()?)
                    .ok_or_else(|| ResourceError::Cache(format!("bad kind for {}", name)))?;
                let mut payload = ByteReader::at(record.take(length)?, 0);
                let source = SourceLocation::new(string(payload.varint()?)?, string(payload.varint()?)?);
                let data = match payload.u8()? {
                    DATA_TEXT => ResourceData::Text(string(payload.varint()?)?.to_string()),
                    DATA_FILE => ResourceData::File(FsFile::on_disk(string(payload.varint()?)?)),
                    DATA_JSON => {
                        let length = payload.length()?;
                        serde_json::from_slice(payload.take(length)?)?
                    }
                    tag => return Err(ResourceError::Cache(format!("bad data tag {} for {}", tag, name))),
                };
                let variant = TypedResource::new(data, kind, qualifiers, source);
                table.add_to_category(category, name.res_type(), name.name(), variant)?;
            }
        }
        table.seal();
        debug!(package = package_name, resources = count, "cache decoded");
        Ok(table)
    }

    pub fn load(reader: &mut impl Read) -> Result<PackageResourceTable> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn load_from_path(path: &Path) -> Result<PackageResourceTable> {
        Self::load(&mut BufReader::new(File::open(path)?))
    }
}

fn file_path(file: &FsFile) -> Result<&str> {
    file.path()
        .to_str()
        .ok_or_else(|| ResourceError::Cache(format!("file path {} is not UTF-8", file.path().display())))
}

fn structured_data(variant: &TypedResource) -> Result<Vec<u8>> {
    match variant.data() {
        ResourceData::Text(_) | ResourceData::File(_) => Ok(Vec::new()),
        data => serde_json::to_vec(data).map_err(|e| ResourceError::Cache(e.to_string())),
    }
}

fn payload(pool: &StringPool, variant: &TypedResource, json: &[u8]) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    put_varint(&mut payload, pool.id(variant.source().package())?);
    put_varint(&mut payload, pool.id(variant.source().path())?);
    match variant.data() {
        ResourceData::Text(text) => {
            payload.push(DATA_TEXT);
            put_varint(&mut payload, pool.id(text)?);
        }
        ResourceData::File(file) => {
            payload.push(DATA_FILE);
            put_varint(&mut payload, pool.id(file_path(file)?)?);
        }
        _ => {
            payload.push(DATA_JSON);
            put_varint(&mut payload, json.len() as u64);
            payload.extend_from_slice(json);
        }
    }
    Ok(payload)
}
