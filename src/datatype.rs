// used to recognise dimension and fraction literals
use lazy_static::lazy_static;
use regex::Regex;

use serde::{Deserialize, Serialize};

// used to print out readable forms of a value
use std::fmt;
use std::path::PathBuf;

use crate::construct::ResName;
use crate::error::{ResourceError, Result};
use crate::fs::FsFile;
use crate::matcher::Qualified;
use crate::plural::PluralRuleSet;
use crate::style::StyleData;

lazy_static! {
    static ref DIMENSION: Regex =
        Regex::new(r"^\s*(-?(?:\d+(?:\.\d*)?|\.\d+))\s*(dp|dip|sp|pt|px|mm|in)\s*$").unwrap();
    static ref FRACTION: Regex = Regex::new(r"^\s*(-?(?:\d+(?:\.\d*)?|\.\d+))\s*(%p?)\s*$").unwrap();
}

// ------------- Resource kinds --------------
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Boolean,
    Color,
    ColorStateList,
    Dimen,
    Float,
    Fraction,
    Integer,
    Layout,
    CharSequence,
    CharSequenceArray,
    IntegerArray,
    TypedArray,
    Style,
    AttrData,
    Plurals,
    Null,
    File,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 17] = [
        ResourceKind::Boolean,
        ResourceKind::Color,
        ResourceKind::ColorStateList,
        ResourceKind::Dimen,
        ResourceKind::Float,
        ResourceKind::Fraction,
        ResourceKind::Integer,
        ResourceKind::Layout,
        ResourceKind::CharSequence,
        ResourceKind::CharSequenceArray,
        ResourceKind::IntegerArray,
        ResourceKind::TypedArray,
        ResourceKind::Style,
        ResourceKind::AttrData,
        ResourceKind::Plurals,
        ResourceKind::Null,
        ResourceKind::File,
    ];

    pub fn uid(&self) -> u8 {
        match self {
            ResourceKind::Boolean => 1,
            ResourceKind::Color => 2,
            ResourceKind::ColorStateList => 3,
            ResourceKind::Dimen => 4,
            ResourceKind::Float => 5,
            ResourceKind::Fraction => 6,
            ResourceKind::Integer => 7,
            ResourceKind::Layout => 8,
            ResourceKind::CharSequence => 9,
            ResourceKind::CharSequenceArray => 10,
            ResourceKind::IntegerArray => 11,
            ResourceKind::TypedArray => 12,
            ResourceKind::Style => 13,
            ResourceKind::AttrData => 14,
            ResourceKind::Plurals => 15,
            ResourceKind::Null => 16,
            ResourceKind::File => 17,
        }
    }
    pub fn from_uid(uid: u8) -> Option<ResourceKind> {
        ResourceKind::ALL.iter().copied().find(|kind| kind.uid() == uid)
    }
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Boolean => "Boolean",
            ResourceKind::Color => "Color",
            ResourceKind::ColorStateList => "ColorStateList",
            ResourceKind::Dimen => "Dimen",
            ResourceKind::Float => "Float",
            ResourceKind::Fraction => "Fraction",
            ResourceKind::Integer => "Integer",
            ResourceKind::Layout => "Layout",
            ResourceKind::CharSequence => "CharSequence",
            ResourceKind::CharSequenceArray => "CharSequenceArray",
            ResourceKind::IntegerArray => "IntegerArray",
            ResourceKind::TypedArray => "TypedArray",
            ResourceKind::Style => "Style",
            ResourceKind::AttrData => "AttrData",
            ResourceKind::Plurals => "Plurals",
            ResourceKind::Null => "Null",
            ResourceKind::File => "File",
        }
    }
    /// The kind held by a values-file element of the given resource type.
    pub fn from_type_name(res_type: &str) -> Option<ResourceKind> {
        let kind = match res_type {
            "bool" => ResourceKind::Boolean,
            "color" | "drawable" => ResourceKind::Color,
            "dimen" => ResourceKind::Dimen,
            "float" => ResourceKind::Float,
            "fraction" => ResourceKind::Fraction,
            "integer" => ResourceKind::Integer,
            "layout" => ResourceKind::Layout,
            "string" | "id" => ResourceKind::CharSequence,
            "string-array" => ResourceKind::CharSequenceArray,
            "integer-array" => ResourceKind::IntegerArray,
            "array" => ResourceKind::TypedArray,
            "style" => ResourceKind::Style,
            "attr" => ResourceKind::AttrData,
            "plurals" => ResourceKind::Plurals,
            _ => return None,
        };
        Some(kind)
    }
    /// Guesses the kind of an untyped array item from its text.
    pub fn infer(raw: &str) -> ResourceKind {
        let raw = raw.trim();
        if raw.starts_with('#') {
            ResourceKind::Color
        } else if raw == "true" || raw == "false" {
            ResourceKind::Boolean
        } else if DIMENSION.is_match(raw) {
            ResourceKind::Dimen
        } else if raw.parse::<i64>().is_ok() {
            ResourceKind::Integer
        } else if raw.parse::<f32>().is_ok() {
            ResourceKind::Fraction
        } else {
            ResourceKind::CharSequence
        }
    }

    /// Extracts the value of raw text held by a resource of this kind. Text
    /// that does not parse as the kind is returned as a plain string.
    pub fn extract(&self, raw: &str, package: &str) -> TypedValue {
        let trimmed = raw.trim();
        if trimmed == "@null" || trimmed == "@empty" || *self == ResourceKind::Null {
            return TypedValue::Null;
        }
        if trimmed.starts_with('@') || trimmed.starts_with('?') {
            if let Some(name) = ResName::qualify(trimmed, package, "attr") {
                return TypedValue::Reference(name);
            }
        }
        let parsed = match self {
            ResourceKind::Boolean => parse_boolean(trimmed).map(TypedValue::Boolean),
            ResourceKind::Color => parse_color(trimmed).map(TypedValue::Color),
            ResourceKind::Dimen => parse_dimension(trimmed).map(|(v, u)| TypedValue::Dimension(v, u)),
            ResourceKind::Float => trimmed.parse::<f32>().ok().map(TypedValue::Float),
            ResourceKind::Fraction => parse_fraction(trimmed)
                .or_else(|| trimmed.parse::<f32>().ok().map(|v| (v, false)))
                .map(|(v, p)| TypedValue::Fraction(v, p)),
            ResourceKind::Integer => parse_integer(trimmed).map(TypedValue::Integer),
            ResourceKind::Layout | ResourceKind::File | ResourceKind::ColorStateList => {
                Some(TypedValue::File(PathBuf::from(trimmed)))
            }
            _ => None,
        };
        parsed.unwrap_or_else(|| TypedValue::String(raw.to_string()))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ------------- Literal parsing --------------
pub fn parse_boolean(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        parse_integer(raw).map(|i| i != 0)
    }
}

/// `#RGB`, `#ARGB`, `#RRGGBB` and `#AARRGGBB` into one ARGB word.
pub fn parse_color(raw: &str) -> Option<u32> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    let expand = |nibbles: u32, count: u32| -> u32 {
        (0..count).rev().fold(0, |acc, i| {
            let nibble = (nibbles >> (i * 4)) & 0xf;
            (acc << 8) | (nibble << 4) | nibble
        })
    };
    match hex.len() {
        3 => Some(0xff00_0000 | expand(value, 3)),
        4 => Some(expand(value, 4)),
        6 => Some(0xff00_0000 | value),
        8 => Some(value),
        _ => None,
    }
}

/// Decimal or `0x` hexadecimal. Hex literals wider than 31 bits wrap;
/// decimals outside the `i32` range are rejected.
pub fn parse_integer(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        let value = u32::from_str_radix(hex, 16).ok()? as i32;
        return Some(if negative { value.wrapping_neg() } else { value });
    }
    let magnitude = digits.parse::<i64>().ok()?;
    i32::try_from(if negative { -magnitude } else { magnitude }).ok()
}

pub fn parse_dimension(raw: &str) -> Option<(f32, DimensionUnit)> {
    let captures = DIMENSION.captures(raw)?;
    let value = captures.get(1)?.as_str().parse::<f32>().ok()?;
    let unit = DimensionUnit::from_suffix(captures.get(2)?.as_str())?;
    Some((value, unit))
}

/// `50%` or `50%p`, as a fraction of one.
pub fn parse_fraction(raw: &str) -> Option<(f32, bool)> {
    let captures = FRACTION.captures(raw)?;
    let value = captures.get(1)?.as_str().parse::<f32>().ok()?;
    Some((value / 100.0, captures.get(2)?.as_str() == "%p"))
}

// ------------- Typed values --------------
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DimensionUnit {
    Px,
    Dp,
    Sp,
    Pt,
    In,
    Mm,
}

impl DimensionUnit {
    pub fn from_suffix(suffix: &str) -> Option<DimensionUnit> {
        let unit = match suffix {
            "px" => DimensionUnit::Px,
            "dp" | "dip" => DimensionUnit::Dp,
            "sp" => DimensionUnit::Sp,
            "pt" => DimensionUnit::Pt,
            "in" => DimensionUnit::In,
            "mm" => DimensionUnit::Mm,
            _ => return None,
        };
        Some(unit)
    }
    pub fn suffix(&self) -> &'static str {
        match self {
            DimensionUnit::Px => "px",
            DimensionUnit::Dp => "dp",
            DimensionUnit::Sp => "sp",
            DimensionUnit::Pt => "pt",
            DimensionUnit::In => "in",
            DimensionUnit::Mm => "mm",
        }
    }
}

/// A resource value after kind-specific extraction.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Null,
    Boolean(bool),
    Color(u32),
    Dimension(f32, DimensionUnit),
    Float(f32),
    /// Fraction of one, and whether it is relative to the parent (`%p`).
    Fraction(f32, bool),
    Integer(i32),
    String(String),
    Reference(ResName),
    File(PathBuf),
    Array(Vec<TypedValue>),
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypedValue::Null => write!(f, "@null"),
            TypedValue::Boolean(b) => write!(f, "{}", b),
            TypedValue::Color(c) => write!(f, "#{:08x}", c),
            TypedValue::Dimension(v, unit) => write!(f, "{}{}", v, unit.suffix()),
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::Fraction(v, parent) => write!(f, "{}%{}", v * 100.0, if *parent { "p" } else { "" }),
            TypedValue::Integer(i) => write!(f, "{}", i),
            TypedValue::String(s) => write!(f, "{}", s),
            TypedValue::Reference(name) => write!(f, "@{}", name),
            TypedValue::File(path) => write!(f, "{}", path.display()),
            TypedValue::Array(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

// ------------- Attribute definitions --------------
const ATTRIBUTE_FORMATS: [&str; 10] = [
    "reference", "string", "color", "dimension", "boolean", "integer", "float", "fraction", "enum", "flags",
];

/// An `<attr>` declaration: its accepted formats and enum/flag symbols.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttrData {
    name: String,
    format: String,
    pairs: Vec<(String, String)>,
}

impl AttrData {
    /// Fails on a format token that is not a known attribute format.
    pub fn new(name: impl Into<String>, format: impl Into<String>, pairs: Vec<(String, String)>) -> Result<Self> {
        let name = name.into();
        let mut format = format.into();
        for token in format.split('|').map(str::trim).filter(|t| !t.is_empty()) {
            if !ATTRIBUTE_FORMATS.contains(&token) {
                return Err(ResourceError::Load(format!(
                    "attribute '{}' declares unsupported format '{}'",
                    name, token
                )));
            }
        }
        if format.trim().is_empty() && !pairs.is_empty() {
            format = String::from("enum");
        }
        Ok(Self { name, format, pairs })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn format(&self) -> &str {
        &self.format
    }
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.format.split('|').map(str::trim).filter(|t| !t.is_empty())
    }
    pub fn enum_value(&self, symbol: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| name == symbol)
            .map(|(_, value)| value.as_str())
    }

    /// Converts a raw attribute value using the declared formats in order.
    pub fn convert(&self, raw: &str, package: &str) -> Option<TypedValue> {
        let trimmed = raw.trim();
        for format in self.formats() {
            let converted = match format {
                "reference" if trimmed.starts_with('@') || trimmed.starts_with('?') => {
                    Some(ResourceKind::CharSequence.extract(trimmed, package))
                }
                "string" => Some(TypedValue::String(raw.to_string())),
                "color" => parse_color(trimmed).map(TypedValue::Color),
                "dimension" => parse_dimension(trimmed).map(|(v, u)| TypedValue::Dimension(v, u)),
                "boolean" => parse_boolean(trimmed).map(TypedValue::Boolean),
                "integer" => parse_integer(trimmed).map(TypedValue::Integer),
                "float" => trimmed.parse::<f32>().ok().map(TypedValue::Float),
                "fraction" => parse_fraction(trimmed).map(|(v, p)| TypedValue::Fraction(v, p)),
                "enum" => self.enum_value(trimmed).and_then(parse_integer).map(TypedValue::Integer),
                "flags" => self.flags_value(trimmed).map(TypedValue::Integer),
                _ => None,
            };
            if converted.is_some() {
                return converted;
            }
        }
        None
    }

    fn flags_value(&self, raw: &str) -> Option<i32> {
        raw.split('|')
            .map(str::trim)
            .try_fold(0i32, |acc, flag| Some(acc | parse_integer(self.enum_value(flag)?)?))
    }
}

// ------------- Resource data --------------
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ResourceData {
    Text(String),
    Items(Vec<TypedResource>),
    Style(StyleData),
    Attr(AttrData),
    Plurals(PluralRuleSet),
    File(FsFile),
}

/// Where a variant was declared: the package whose references it uses when
/// unqualified, and the file it came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    package: String,
    path: String,
}

impl SourceLocation {
    pub fn new(package: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            path: path.into(),
        }
    }
    pub fn package(&self) -> &str {
        &self.package
    }
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.package, self.path)
    }
}

// ------------- TypedResource --------------
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypedResource {
    data: ResourceData,
    kind: ResourceKind,
    qualifiers: String,
    source: SourceLocation,
}

impl TypedResource {
    pub fn new(data: ResourceData, kind: ResourceKind, qualifiers: impl Into<String>, source: SourceLocation) -> Self {
        Self {
            data,
            kind,
            qualifiers: qualifiers.into(),
            source,
        }
    }
    pub fn text(kind: ResourceKind, text: impl Into<String>, qualifiers: impl Into<String>, source: SourceLocation) -> Self {
        Self::new(ResourceData::Text(text.into()), kind, qualifiers, source)
    }
    pub fn file(kind: ResourceKind, file: FsFile, qualifiers: impl Into<String>, source: SourceLocation) -> Self {
        Self::new(ResourceData::File(file), kind, qualifiers, source)
    }
    // It's intentional to encapsulate the parts in the struct
    // and only expose them using "getters", because variants
    // are shared between tables once a load pass has sealed them.
    pub fn data(&self) -> &ResourceData {
        &self.data
    }
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
    pub fn qualifiers(&self) -> &str {
        &self.qualifiers
    }
    pub fn source(&self) -> &SourceLocation {
        &self.source
    }
    pub fn is_file(&self) -> bool {
        matches!(self.data, ResourceData::File(_))
    }
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            ResourceData::Text(text) => Some(text),
            _ => None,
        }
    }
    pub fn as_items(&self) -> Option<&[TypedResource]> {
        match &self.data {
            ResourceData::Items(items) => Some(items),
            _ => None,
        }
    }
    pub fn as_style(&self) -> Option<&StyleData> {
        match &self.data {
            ResourceData::Style(style) => Some(style),
            _ => None,
        }
    }
    pub fn as_attr(&self) -> Option<&AttrData> {
        match &self.data {
            ResourceData::Attr(attr) => Some(attr),
            _ => None,
        }
    }
    pub fn as_plurals(&self) -> Option<&PluralRuleSet> {
        match &self.data {
            ResourceData::Plurals(plurals) => Some(plurals),
            _ => None,
        }
    }
    pub fn as_file(&self) -> Option<&FsFile> {
        match &self.data {
            ResourceData::File(file) => Some(file),
            _ => None,
        }
    }
    /// True for text values that point at another resource.
    pub fn is_reference(&self) -> bool {
        matches!(self.typed_value(), Some(TypedValue::Reference(_)))
    }

    /// The value with kind-specific extraction applied. Styles, attribute
    /// declarations and plural rule sets have no scalar form.
    pub fn typed_value(&self) -> Option<TypedValue> {
        match &self.data {
            ResourceData::Text(raw) => Some(self.kind.extract(raw, self.source.package())),
            ResourceData::Items(items) => Some(TypedValue::Array(
                items.iter().filter_map(TypedResource::typed_value).collect(),
            )),
            ResourceData::File(file) => Some(TypedValue::File(file.path().to_path_buf())),
            ResourceData::Style(_) | ResourceData::Attr(_) | ResourceData::Plurals(_) => None,
        }
    }
}

impl Qualified for TypedResource {
    fn qualifiers(&self) -> &str {
        &self.qualifiers
    }
}

impl fmt::Display for TypedResource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.typed_value() {
            Some(value) => write!(f, "{} [{}] {}", self.kind, self.qualifiers, value),
            None => write!(f, "{} [{}]", self.kind, self.qualifiers),
        }
    }
}
