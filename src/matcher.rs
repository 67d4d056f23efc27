//! Best-match selection over qualifier-tagged variants.

use tracing::debug;

use crate::qualifier::Qualifiers;

/// Anything carrying the qualifier string of the directory it came from.
pub trait Qualified {
    fn qualifiers(&self) -> &str;
}

impl Qualified for String {
    fn qualifiers(&self) -> &str {
        self
    }
}

impl Qualified for &str {
    fn qualifiers(&self) -> &str {
        self
    }
}

/// Picks the variant that best fits `target`.
///
/// Candidates that contradict the target are dropped first. Among the rest,
/// the best matching one wins; if nothing matches outright the first
/// surviving candidate is returned as the default resource. Callers keep
/// candidates sorted by qualifier string so the outcome does not depend on
/// insertion order.
pub fn pick_best<'a, T: Qualified>(target: &str, candidates: &'a [T]) -> Option<&'a T> {
    let target_qualifiers = match Qualifiers::parse(target) {
        Ok(q) => q,
        Err(e) => {
            debug!(target, error = %e, "unparseable target qualifiers");
            return None;
        }
    };
    let passing: Vec<(&'a T, Qualifiers)> = candidates
        .iter()
        .filter_map(|candidate| match Qualifiers::parse(candidate.qualifiers()) {
            Ok(q) if q.passes_requirements(&target_qualifiers) => Some((candidate, q)),
            Ok(_) => None,
            Err(e) => {
                debug!(qualifiers = candidate.qualifiers(), error = %e, "skipping unparseable variant");
                None
            }
        })
        .collect();

    let mut best: Option<&(&'a T, Qualifiers)> = None;
    for entry in &passing {
        if !entry.1.matches(&target_qualifiers) {
            continue;
        }
        best = match best {
            Some(current) if !entry.1.is_better_than(&current.1, &target_qualifiers) => Some(current),
            _ => Some(entry),
        };
    }
    best.or_else(|| passing.first()).map(|(candidate, _)| *candidate)
}

/// Same as [`pick_best`] for bare qualifier strings.
pub fn pick_best_qualifier<'a>(target: &str, qualifier_strings: &'a [String]) -> Option<&'a str> {
    pick_best(target, qualifier_strings).map(|s| s.as_str())
}
