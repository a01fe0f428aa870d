//! Houses the `normalize` and `compare` functions, the kernel of the
//! application. Everything else either feeds them or presents their result.
use std::collections::BTreeSet;

use fxhash::FxBuildHasher;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::set::TallySet;

/// A member's cleaned items: trimmed, non-empty, without duplicates, in the
/// order the member first listed them.
pub type ItemSet = IndexSet<String, FxBuildHasher>;

/// Member name to that member's `ItemSet`, in the order members were submitted.
pub type MemberSets = IndexMap<String, ItemSet>;

/// `normalize` accepts items of any type that can say whether it holds text.
/// Anything that isn't text (a JSON number, `null`, a nested list) is dropped.
pub trait RawItem {
    /// The item's text, or `None` if the item isn't a string
    fn as_text(&self) -> Option<&str>;
}

impl RawItem for serde_json::Value {
    fn as_text(&self) -> Option<&str> {
        self.as_str()
    }
}
impl RawItem for &serde_json::Value {
    fn as_text(&self) -> Option<&str> {
        self.as_str()
    }
}
impl RawItem for String {
    fn as_text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}
impl RawItem for &String {
    fn as_text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}
impl RawItem for &str {
    fn as_text(&self) -> Option<&str> {
        Some(*self)
    }
}

/// Cleans each member's raw list into an `ItemSet`:
///
/// * every item is trimmed, and empty or non-string items are dropped,
/// * duplicates collapse, keeping first-seen order,
/// * a member left with no items is dropped entirely, as is a member whose
///   name is blank, and
/// * a member named twice gets the items of both lists.
///
/// Normalizing an already normalized mapping returns it unchanged.
pub fn normalize<N, L>(raw: impl IntoIterator<Item = (N, L)>) -> MemberSets
where
    N: Into<String>,
    L: IntoIterator,
    L::Item: RawItem,
{
    let mut sets = MemberSets::default();
    for (name, items) in raw {
        let name = name.into();
        if name.trim().is_empty() {
            continue;
        }
        let items = clean_items(items);
        if items.is_empty() {
            continue;
        }
        sets.entry(name).or_default().extend(items);
    }
    sets
}

fn clean_items<L>(items: L) -> ItemSet
where
    L: IntoIterator,
    L::Item: RawItem,
{
    let mut set = ItemSet::default();
    for item in items {
        if let Some(text) = item.as_text().map(str::trim) {
            if !text.is_empty() {
                set.insert(text.to_owned());
            }
        }
    }
    set
}

/// The relationships among a group of members' item sets. Set-valued fields
/// are `BTreeSet`s, so they serialize as sorted arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    /// Items any member listed
    #[serde(default)]
    pub union: BTreeSet<String>,
    /// Items every member listed. With a single member, that member's items.
    #[serde(default, alias = "everyone_needs")]
    pub intersection: BTreeSet<String>,
    /// For each member, the items no other member listed
    #[serde(default)]
    pub unique_per_member: IndexMap<String, BTreeSet<String>>,
    /// Items listed by exactly one member: the union of `unique_per_member`
    #[serde(default, alias = "suggested_by_one")]
    pub exactly_one: BTreeSet<String>,
    /// For each member, the number of distinct items listed
    #[serde(default)]
    pub cardinalities: IndexMap<String, usize>,
}

/// Calculates every relationship among the member sets in `sets`. Never
/// fails: no members gives an all-empty `Comparison`.
///
/// A single pass over all items records, for each item, how many members
/// listed it and which member listed it first. `intersection` is then the
/// items listed by every member, and an item listed by one member only lands
/// in both `exactly_one` and that member's `unique_per_member` entry, so the
/// two can't disagree.
#[must_use]
pub fn compare(sets: &MemberSets) -> Comparison {
    let mut tally = TallySet::default();
    for items in sets.values() {
        tally.add_member(items.iter().map(String::as_str));
    }

    let mut unique_per_member: IndexMap<String, BTreeSet<String>> =
        sets.keys().map(|name| (name.clone(), BTreeSet::new())).collect();
    let mut exactly_one = BTreeSet::new();
    for (item, member) in tally.seen_once() {
        exactly_one.insert(item.to_owned());
        if let Some((_, unique)) = unique_per_member.get_index_mut(member) {
            unique.insert(item.to_owned());
        }
    }

    Comparison {
        union: tally.items().map(str::to_owned).collect(),
        intersection: tally.in_every_member().map(str::to_owned).collect(),
        unique_per_member,
        exactly_one,
        cardinalities: sets.iter().map(|(name, items)| (name.clone(), items.len())).collect(),
    }
}

/// Headline numbers for a `Comparison`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// Size of the union
    pub union_size: usize,
    /// Size of the intersection
    pub intersection_size: usize,
    /// Number of items listed by exactly one member
    pub exactly_one_count: usize,
    /// Mean of the members' cardinalities, or zero with no members
    pub average_items: f64,
}

impl Comparison {
    /// Summarizes the comparison
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> Summary {
        let members = self.cardinalities.len();
        let total: usize = self.cardinalities.values().sum();
        let average_items = if members == 0 { 0.0 } else { total as f64 / members as f64 };
        Summary {
            union_size: self.union.len(),
            intersection_size: self.intersection.len(),
            exactly_one_count: self.exactly_one.len(),
            average_items,
        }
    }
}
