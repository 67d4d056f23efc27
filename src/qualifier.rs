//! Parsed configuration qualifiers.
//!
//! A qualifier string such as `en-rUS-land-hdpi-v21` is split into segments
//! by the pest grammar in `qualifier.pest`, and each segment is classified
//! into a [`Dimension`]. Dimensions are ordered by precedence, which is what
//! the matcher relies on when deciding whether one variant is better than
//! another.

use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use pest::Parser;
use pest_derive::Parser;
use regex::Regex;

use crate::error::{ResourceError, Result};

#[derive(Parser)]
#[grammar = "qualifier.pest"]
struct QualifierGrammar;

lazy_static! {
    static ref MCC: Regex = Regex::new(r"^mcc(\d+)$").unwrap();
    static ref MNC: Regex = Regex::new(r"^mnc(\d+)$").unwrap();
    static ref LANGUAGE: Regex = Regex::new(r"^[a-z]{2,3}$").unwrap();
    static ref REGION: Regex = Regex::new(r"^r([a-z]{2}|[0-9]{3})$").unwrap();
    static ref SMALLEST_WIDTH: Regex = Regex::new(r"^sw(\d+)dp$").unwrap();
    static ref WIDTH: Regex = Regex::new(r"^w(\d+)dp$").unwrap();
    static ref HEIGHT: Regex = Regex::new(r"^h(\d+)dp$").unwrap();
    static ref DENSITY: Regex = Regex::new(r"^(\d+)dpi$").unwrap();
    static ref SCREEN_DIMENSIONS: Regex = Regex::new(r"^(\d+)x(\d+)$").unwrap();
    static ref VERSION: Regex = Regex::new(r"^v(\d+)$").unwrap();
}

pub const DENSITY_DEFAULT: u32 = 160;
pub const DENSITY_NONE: u32 = 0;
pub const DENSITY_ANY: u32 = 0xfffe;

/// Qualifier dimensions in precedence order: earlier variants outrank later
/// ones when two candidates are compared.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Dimension {
    Mcc,
    Mnc,
    Language,
    Region,
    LayoutDirection,
    SmallestWidth,
    Width,
    Height,
    ScreenSize,
    ScreenLong,
    Round,
    WideColorGamut,
    Hdr,
    Orientation,
    UiModeType,
    Night,
    Density,
    Touchscreen,
    KeysHidden,
    Keyboard,
    NavHidden,
    Navigation,
    ScreenDimensions,
    Version,
}

impl Dimension {
    // A candidate may ask for less than the target offers on these.
    fn is_at_most(self) -> bool {
        matches!(
            self,
            Dimension::SmallestWidth
                | Dimension::Width
                | Dimension::Height
                | Dimension::ScreenSize
                | Dimension::ScreenDimensions
                | Dimension::Version
        )
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum QualifierValue {
    Token(String),
    Number(u32),
    Pair(u32, u32),
}

impl QualifierValue {
    fn at_most(&self, target: &QualifierValue) -> bool {
        match (self, target) {
            (QualifierValue::Number(c), QualifierValue::Number(t)) => c <= t,
            (QualifierValue::Pair(cw, ch), QualifierValue::Pair(tw, th)) => cw <= tw && ch <= th,
            (c, t) => c == t,
        }
    }
    fn magnitude(&self) -> u64 {
        match self {
            QualifierValue::Number(n) => *n as u64,
            QualifierValue::Pair(w, h) => *w as u64 * *h as u64,
            QualifierValue::Token(_) => 0,
        }
    }
}

impl fmt::Display for QualifierValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QualifierValue::Token(t) => write!(f, "{}", t),
            QualifierValue::Number(n) => write!(f, "{}", n),
            QualifierValue::Pair(w, h) => write!(f, "{}x{}", w, h),
        }
    }
}

// ------------- Qualifiers -------------
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Qualifiers {
    values: BTreeMap<Dimension, QualifierValue>,
}

impl Qualifiers {
    pub fn parse(qualifier_string: &str) -> Result<Qualifiers> {
        let segments = split_segments(qualifier_string)?;
        let mut qualifiers = Qualifiers::default();
        let mut after_language = false;
        for segment in segments {
            let segment = segment.to_lowercase();
            let (dimension, value) = if after_language && REGION.is_match(&segment) {
                (Dimension::Region, QualifierValue::Token(segment[1..].to_string()))
            } else {
                classify(&segment).ok_or_else(|| ResourceError::Qualifier {
                    message: format!("unrecognized segment '{}' in '{}'", segment, qualifier_string),
                })?
            };
            if let Some(b_region) = bcp47_region(&segment) {
                qualifiers.insert(qualifier_string, Dimension::Region, QualifierValue::Token(b_region))?;
            }
            after_language = dimension == Dimension::Language;
            qualifiers.insert(qualifier_string, dimension, value)?;
        }
        Ok(qualifiers)
    }

    fn insert(&mut self, source: &str, dimension: Dimension, value: QualifierValue) -> Result<()> {
        if self.values.insert(dimension, value).is_some() {
            return Err(ResourceError::Qualifier {
                message: format!("dimension {:?} given twice in '{}'", dimension, source),
            });
        }
        Ok(())
    }

    pub fn get(&self, dimension: Dimension) -> Option<&QualifierValue> {
        self.values.get(&dimension)
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True unless this (candidate) set positively contradicts the target,
    /// e.g. asks for `land` when the target is `port`.
    pub fn passes_requirements(&self, target: &Qualifiers) -> bool {
        self.values.iter().all(|(dimension, value)| match target.get(*dimension) {
            None => true,
            Some(_) if *dimension == Dimension::Density => true,
            Some(wanted) if dimension.is_at_most() => value.at_most(wanted),
            Some(wanted) => value == wanted,
        })
    }

    /// True when every qualifier of this (candidate) set is satisfied by the
    /// target. Density is satisfied by any target.
    pub fn matches(&self, target: &Qualifiers) -> bool {
        self.values.iter().all(|(dimension, value)| {
            if *dimension == Dimension::Density {
                return true;
            }
            match target.get(*dimension) {
                None => false,
                Some(wanted) if dimension.is_at_most() => value.at_most(wanted),
                Some(wanted) => value == wanted,
            }
        })
    }

    /// Decides between two candidates that both match `target`: the first
    /// dimension (in precedence order) where they differ settles it.
    pub fn is_better_than(&self, other: &Qualifiers, target: &Qualifiers) -> bool {
        let mut dimensions: Vec<Dimension> = self.values.keys().chain(other.values.keys()).copied().collect();
        dimensions.sort_unstable();
        dimensions.dedup();
        for dimension in dimensions {
            if dimension == Dimension::Density {
                let mine = self.density().unwrap_or(DENSITY_DEFAULT);
                let theirs = other.density().unwrap_or(DENSITY_DEFAULT);
                if mine == theirs {
                    continue;
                }
                return density_is_better(mine, theirs, target.density().unwrap_or(DENSITY_DEFAULT));
            }
            match (self.get(dimension), other.get(dimension)) {
                (Some(mine), Some(theirs)) if mine == theirs => continue,
                (None, None) => continue,
                (Some(_), None) => return true,
                (None, Some(_)) => return false,
                (Some(mine), Some(theirs)) => return mine.magnitude() > theirs.magnitude(),
            }
        }
        false
    }

    pub fn density(&self) -> Option<u32> {
        match self.get(Dimension::Density) {
            Some(QualifierValue::Number(n)) => Some(*n),
            _ => None,
        }
    }
    pub fn version(&self) -> Option<u32> {
        match self.get(Dimension::Version) {
            Some(QualifierValue::Number(n)) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Qualifiers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for (dimension, value) in &self.values {
            let segment = match (dimension, value) {
                (Dimension::Mcc, v) => format!("mcc{}", v),
                (Dimension::Mnc, v) => format!("mnc{}", v),
                (Dimension::Region, v) => format!("r{}", v.to_string().to_uppercase()),
                (Dimension::SmallestWidth, v) => format!("sw{}dp", v),
                (Dimension::Width, v) => format!("w{}dp", v),
                (Dimension::Height, v) => format!("h{}dp", v),
                (Dimension::ScreenSize, QualifierValue::Number(n)) => SCREEN_SIZES
                    .iter()
                    .find(|(_, size)| size == n)
                    .map(|(name, _)| name.to_string())
                    .unwrap_or_default(),
                (Dimension::Density, QualifierValue::Number(n)) => density_name(*n),
                (Dimension::Version, v) => format!("v{}", v),
                (_, v) => v.to_string(),
            };
            s += &(segment + "-");
        }
        s.pop();
        write!(f, "{}", s)
    }
}

// ------------- Directory names -------------
/// A resource directory name split into its base type and the hyphen-joined
/// qualifier remainder, e.g. `values-en-v21` → (`values`, `en-v21`).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ResDirectory {
    base_type: String,
    qualifiers: String,
}

impl ResDirectory {
    pub fn parse(directory_name: &str) -> Result<ResDirectory> {
        let pairs = QualifierGrammar::parse(Rule::directory, directory_name).map_err(|e| ResourceError::Qualifier {
            message: format!("bad directory name '{}': {}", directory_name, e),
        })?;
        let mut base_type = String::new();
        let mut segments = Vec::new();
        for pair in pairs.flatten() {
            match pair.as_rule() {
                Rule::base_type => base_type = pair.as_str().to_string(),
                Rule::segment => segments.push(pair.as_str()),
                _ => (),
            }
        }
        Ok(ResDirectory {
            base_type,
            qualifiers: segments.join("-"),
        })
    }
    pub fn base_type(&self) -> &str {
        &self.base_type
    }
    pub fn qualifiers(&self) -> &str {
        &self.qualifiers
    }
}

// ------------- helpers -------------
const SCREEN_SIZES: [(&str, u32); 4] = [("small", 1), ("normal", 2), ("large", 3), ("xlarge", 4)];

const DENSITIES: [(&str, u32); 9] = [
    ("nodpi", DENSITY_NONE),
    ("ldpi", 120),
    ("mdpi", 160),
    ("tvdpi", 213),
    ("hdpi", 240),
    ("xhdpi", 320),
    ("xxhdpi", 480),
    ("xxxhdpi", 640),
    ("anydpi", DENSITY_ANY),
];

const TOKENS: [(Dimension, &[&str]); 13] = [
    (Dimension::LayoutDirection, &["ldltr", "ldrtl"]),
    (Dimension::ScreenLong, &["long", "notlong"]),
    (Dimension::Round, &["round", "notround"]),
    (Dimension::WideColorGamut, &["widecg", "nowidecg"]),
    (Dimension::Hdr, &["highdr", "lowdr"]),
    (Dimension::Orientation, &["port", "land", "square"]),
    (Dimension::UiModeType, &["desk", "car", "television", "appliance", "watch", "vrheadset"]),
    (Dimension::Night, &["night", "notnight"]),
    (Dimension::Touchscreen, &["notouch", "stylus", "finger"]),
    (Dimension::KeysHidden, &["keysexposed", "keyshidden", "keyssoft"]),
    (Dimension::Keyboard, &["nokeys", "qwerty", "12key"]),
    (Dimension::NavHidden, &["navexposed", "navhidden"]),
    (Dimension::Navigation, &["nonav", "dpad", "trackball", "wheel"]),
];

fn split_segments(qualifier_string: &str) -> Result<Vec<&str>> {
    let pairs = QualifierGrammar::parse(Rule::qualifiers, qualifier_string).map_err(|e| ResourceError::Qualifier {
        message: format!("bad qualifier string '{}': {}", qualifier_string, e),
    })?;
    Ok(pairs
        .flatten()
        .filter(|pair| pair.as_rule() == Rule::segment)
        .map(|pair| pair.as_str())
        .collect())
}

fn number(caps: &regex::Captures, group: usize) -> Option<u32> {
    caps.get(group).and_then(|m| m.as_str().parse::<u32>().ok())
}

fn classify(segment: &str) -> Option<(Dimension, QualifierValue)> {
    if let Some(caps) = MCC.captures(segment) {
        return number(&caps, 1).map(|n| (Dimension::Mcc, QualifierValue::Number(n)));
    }
    if let Some(caps) = MNC.captures(segment) {
        return number(&caps, 1).map(|n| (Dimension::Mnc, QualifierValue::Number(n)));
    }
    if LANGUAGE.is_match(segment) && segment != "car" {
        return Some((Dimension::Language, QualifierValue::Token(segment.to_string())));
    }
    if let Some(tag) = segment.strip_prefix("b+") {
        let language = tag.split('+').next().filter(|l| !l.is_empty())?;
        return Some((Dimension::Language, QualifierValue::Token(language.to_string())));
    }
    if let Some(caps) = SMALLEST_WIDTH.captures(segment) {
        return number(&caps, 1).map(|n| (Dimension::SmallestWidth, QualifierValue::Number(n)));
    }
    if let Some(caps) = WIDTH.captures(segment) {
        return number(&caps, 1).map(|n| (Dimension::Width, QualifierValue::Number(n)));
    }
    if let Some(caps) = HEIGHT.captures(segment) {
        return number(&caps, 1).map(|n| (Dimension::Height, QualifierValue::Number(n)));
    }
    if let Some((_, size)) = SCREEN_SIZES.iter().find(|(name, _)| *name == segment) {
        return Some((Dimension::ScreenSize, QualifierValue::Number(*size)));
    }
    if let Some((_, dpi)) = DENSITIES.iter().find(|(name, _)| *name == segment) {
        return Some((Dimension::Density, QualifierValue::Number(*dpi)));
    }
    if let Some(caps) = DENSITY.captures(segment) {
        return number(&caps, 1).map(|n| (Dimension::Density, QualifierValue::Number(n)));
    }
    if let Some(caps) = SCREEN_DIMENSIONS.captures(segment) {
        let (w, h) = (number(&caps, 1)?, number(&caps, 2)?);
        // stored larger-first, the way the screen reports it
        return Some((Dimension::ScreenDimensions, QualifierValue::Pair(w.max(h), w.min(h))));
    }
    if let Some(caps) = VERSION.captures(segment) {
        return number(&caps, 1).map(|n| (Dimension::Version, QualifierValue::Number(n)));
    }
    TOKENS
        .iter()
        .find(|(_, tokens)| tokens.contains(&segment))
        .map(|(dimension, _)| (*dimension, QualifierValue::Token(segment.to_string())))
}

// b+sr+Latn+RS style tags carry the region as a 2 or 3 character subtag
fn bcp47_region(segment: &str) -> Option<String> {
    let tag = segment.strip_prefix("b+")?;
    tag.split('+')
        .skip(1)
        .find(|subtag| subtag.len() == 2 || (subtag.len() == 3 && subtag.chars().all(|c| c.is_ascii_digit())))
        .map(|subtag| subtag.to_string())
}

fn density_name(dpi: u32) -> String {
    DENSITIES
        .iter()
        .find(|(_, d)| *d == dpi)
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| format!("{}dpi", dpi))
}

fn density_is_better(mine: u32, theirs: u32, requested: u32) -> bool {
    if mine == DENSITY_ANY || theirs == DENSITY_ANY {
        return mine == DENSITY_ANY;
    }
    if mine == requested {
        return true;
    }
    if theirs == requested {
        return false;
    }
    let (high, low, mine_is_bigger) = if mine > theirs {
        (mine as i64, theirs as i64, true)
    } else {
        (theirs as i64, mine as i64, false)
    };
    let requested = requested as i64;
    if requested >= high {
        // both at or below the request: the bigger one scales down less
        return mine_is_bigger;
    }
    if low >= requested {
        // both above the request: the smaller one is closer
        return !mine_is_bigger;
    }
    // saddle: low < requested < high, scaling up low must not be too costly
    if (2 * low - requested) * high > requested * requested {
        !mine_is_bigger
    } else {
        mine_is_bigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_higher_density_wins_over_lower() {
        assert!(density_is_better(320, 160, 240));
        assert!(!density_is_better(120, 320, 240));
        assert!(density_is_better(240, 320, 240));
    }

    #[test]
    fn region_needs_a_preceding_language() {
        let q = Qualifiers::parse("en-rUS").unwrap();
        assert_eq!(q.get(Dimension::Region), Some(&QualifierValue::Token("us".to_string())));
        let q = Qualifiers::parse("rUS").unwrap();
        assert_eq!(q.get(Dimension::Language), Some(&QualifierValue::Token("rus".to_string())));
        assert_eq!(q.get(Dimension::Region), None);
    }
}
