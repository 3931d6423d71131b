// used to indicate that identities need to be hashable
use std::hash::Hash;
// used to print out identities in errors and logs
use std::fmt;

/// Anything the engine can categorize.
///
/// A record carries three capabilities:
/// * an identity ([`Record::key`]): two records with equal keys are the same
///   logical record, no matter what their other fields hold,
/// * a natural total order (`Ord`), used when the view is sorted without an
///   explicit [`crate::SortPredicate`],
/// * an in-place merge ([`Record::merge`]) that copies the fields of a newer
///   version into the kept record.
///
/// `Ord` and the identity are independent: two different identities may
/// compare equal, and a merge may move a record anywhere in the order.
pub trait Record: Clone + Ord + Send + Sync + 'static {
    type Key: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static;
    fn key(&self) -> Self::Key;
    /// Must leave `self.key()` unchanged.
    fn merge(&mut self, other: Self);
}
