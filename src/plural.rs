use serde::{Deserialize, Serialize};

// ------------- Quantity -------------
/// What a plural rule answers for: one exact count, or anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantity {
    Exact(i32),
    Any,
}

impl Quantity {
    /// Maps a plural category to its matcher. Only `zero`, `one` and `two`
    /// are bound to a count, every other category matches any quantity.
    pub fn from_category(category: &str) -> Quantity {
        match category.trim() {
            "zero" => Quantity::Exact(0),
            "one" => Quantity::Exact(1),
            "two" => Quantity::Exact(2),
            _ => Quantity::Any,
        }
    }
}

// ------------- Plural -------------
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plural {
    category: String,
    quantity: Quantity,
    string: String,
}

impl Plural {
    pub fn new(category: impl Into<String>, string: impl Into<String>) -> Self {
        let category = category.into();
        Self {
            quantity: Quantity::from_category(&category),
            category,
            string: string.into(),
        }
    }
    pub fn category(&self) -> &str {
        &self.category
    }
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }
    pub fn string(&self) -> &str {
        &self.string
    }
}

// ------------- PluralRuleSet -------------
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PluralRuleSet {
    plurals: Vec<Plural>,
}

impl PluralRuleSet {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_rules<C, S>(rules: impl IntoIterator<Item = (C, S)>) -> Self
    where
        C: Into<String>,
        S: Into<String>,
    {
        Self {
            plurals: rules.into_iter().map(|(c, s)| Plural::new(c, s)).collect(),
        }
    }
    pub fn push(&mut self, category: impl Into<String>, string: impl Into<String>) {
        self.plurals.push(Plural::new(category, string));
    }
    /// An exact rule for `quantity` wins, then the first catch-all rule.
    pub fn find(&self, quantity: i32) -> Option<&Plural> {
        self.plurals
            .iter()
            .find(|p| p.quantity == Quantity::Exact(quantity))
            .or_else(|| self.plurals.iter().find(|p| p.quantity == Quantity::Any))
    }
    pub fn iter(&self) -> impl Iterator<Item = &Plural> {
        self.plurals.iter()
    }
    pub fn len(&self) -> usize {
        self.plurals.len()
    }
    pub fn is_empty(&self) -> bool {
        self.plurals.is_empty()
    }
}
