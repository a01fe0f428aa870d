//! Provides the `TallySet` structure, which the engine fills one member at a
//! time and then reads back in several ways.
use fxhash::FxBuildHasher;
use indexmap::IndexMap;

/// A `TallySet` is a set of items, each item represented as a key of an `IndexMap`.
/// * Keys are `&'data str`, borrowed from the members' item sets
/// * Keys keep the order in which they were first seen
/// * Each key is associated with a `SeenIn` bookkeeping value, recording the
///   first member to contribute the item and how many distinct members
///   contributed it
/// * A `TallySet` also counts the members added to it, so that "seen in every
///   member" can be answered without a second pass
#[derive(Default)]
pub(crate) struct TallySet<'data> {
    set: IndexMap<&'data str, SeenIn, FxBuildHasher>,
    members: usize,
}

/// The `SeenIn` struct is the bookkeeping value for each item. `first` is the
/// index of the first member whose list held the item, and `last` the index of
/// the most recent one. A member that names an item twice is still counted
/// once, because `members_seen` only grows when `last` changes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct SeenIn {
    first: usize,
    last: usize,
    members_seen: usize,
}

impl SeenIn {
    fn new(member: usize) -> Self {
        SeenIn { first: member, last: member, members_seen: 1 }
    }
    fn update_with(&mut self, member: usize) {
        if member != self.last {
            self.members_seen += 1;
            self.last = member;
        }
    }
}

impl<'data> TallySet<'data> {
    /// Adds the next member's items and returns that member's index. Indexes
    /// start at zero and follow the order of `add_member` calls.
    pub(crate) fn add_member(&mut self, items: impl IntoIterator<Item = &'data str>) -> usize {
        let member = self.members;
        self.members += 1;
        for item in items {
            self.set
                .entry(item)
                .and_modify(|seen_in| seen_in.update_with(member))
                .or_insert_with(|| SeenIn::new(member));
        }
        member
    }

    /// Every item any member contributed
    pub(crate) fn items(&self) -> impl Iterator<Item = &'data str> + '_ {
        self.set.keys().copied()
    }

    /// Items contributed by every member added so far. Empty when no member
    /// has been added.
    pub(crate) fn in_every_member(&self) -> impl Iterator<Item = &'data str> + '_ {
        let members = self.members;
        self.set
            .iter()
            .filter(move |(_, seen_in)| seen_in.members_seen == members)
            .map(|(item, _)| *item)
    }

    /// Items contributed by exactly one member, each paired with that
    /// member's index.
    pub(crate) fn seen_once(&self) -> impl Iterator<Item = (&'data str, usize)> + '_ {
        self.set
            .iter()
            .filter(|(_, seen_in)| seen_in.members_seen == 1)
            .map(|(item, seen_in)| (*item, seen_in.first))
    }
}

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;

    fn tally<'a>(members: &[&[&'a str]]) -> TallySet<'a> {
        let mut set = TallySet::default();
        for items in members {
            set.add_member(items.iter().copied());
        }
        set
    }

    #[test]
    fn member_indexes_follow_insertion_order() {
        let mut set = TallySet::default();
        assert_eq!(set.add_member(["a"]), 0);
        assert_eq!(set.add_member(["b"]), 1);
        assert_eq!(set.add_member(["c"]), 2);
    }

    #[test]
    fn items_keep_first_seen_order() {
        let set = tally(&[&["xyz", "abc"], &["y", "abc"], &["z"]]);
        assert_eq!(set.items().collect::<Vec<_>>(), ["xyz", "abc", "y", "z"]);
    }

    #[test]
    fn an_item_repeated_by_one_member_is_still_seen_once() {
        let set = tally(&[&["x", "x", "x"], &["y"]]);
        assert_eq!(set.seen_once().collect::<Vec<_>>(), [("x", 0), ("y", 1)]);
        assert_eq!(set.in_every_member().count(), 0);
    }

    #[test]
    fn results_for_each_reading() {
        let set = tally(&[
            &["xyz", "abc", "xy", "xz", "x"], // Strings containing "x" (and "abc")
            &["xyz", "abc", "xy", "yz", "y"], // Strings containing "y" (and "abc")
            &["xyz", "abc", "xz", "yz", "z"], // Strings containing "z" (and "abc")
        ]);
        assert_eq!(set.in_every_member().collect::<Vec<_>>(), ["xyz", "abc"]);
        assert_eq!(set.seen_once().collect::<Vec<_>>(), [("x", 0), ("y", 1), ("z", 2)]);
    }

    #[test]
    fn an_empty_tally_has_nothing_in_every_member() {
        let set = TallySet::default();
        assert_eq!(set.in_every_member().count(), 0);
        assert_eq!(set.items().count(), 0);
    }
}
