use serde::{Deserialize, Serialize};
use std::fmt;

/// One row-level change of the working view.
///
/// Deltas are applied in sequence: every index refers to the view as it
/// stands after the deltas before it. A move takes the row out at `from`
/// and puts it back so that it ends up at `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Delta {
    Inserted { index: usize },
    Removed { index: usize },
    Moved { from: usize, to: usize },
    Replaced { index: usize },
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Delta::Inserted { index } => write!(f, "+{}", index),
            Delta::Removed { index } => write!(f, "-{}", index),
            Delta::Moved { from, to } => write!(f, "{}->{}", from, to),
            Delta::Replaced { index } => write!(f, "~{}", index),
        }
    }
}

/// What a mutation did to the working view: either it was rebuilt as a
/// whole, or it changed by an ordered list of deltas (possibly none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewChange {
    Reset,
    Deltas(Vec<Delta>),
}

impl ViewChange {
    pub fn none() -> Self {
        ViewChange::Deltas(Vec::new())
    }
    pub fn is_reset(&self) -> bool {
        matches!(self, ViewChange::Reset)
    }
    /// `true` when nothing in the view changed.
    pub fn is_empty(&self) -> bool {
        matches!(self, ViewChange::Deltas(deltas) if deltas.is_empty())
    }
    pub fn deltas(&self) -> &[Delta] {
        match self {
            ViewChange::Reset => &[],
            ViewChange::Deltas(deltas) => deltas,
        }
    }
    /// Replays the deltas over a copy of the rows the presentation layer
    /// shows. Inserted rows are created by `fresh` from their index at the
    /// time of insertion.
    ///
    /// Returns `false` when `rows` has to be reloaded by the caller: on a
    /// reset, or when a delta does not fit the rows, in which case `rows`
    /// keeps the deltas applied before it.
    pub fn replay<T>(&self, rows: &mut Vec<T>, mut fresh: impl FnMut(usize) -> T) -> bool {
        let deltas = match self {
            ViewChange::Reset => return false,
            ViewChange::Deltas(deltas) => deltas,
        };
        for delta in deltas {
            match *delta {
                Delta::Inserted { index } if index <= rows.len() => rows.insert(index, fresh(index)),
                Delta::Removed { index } if index < rows.len() => {
                    rows.remove(index);
                }
                Delta::Moved { from, to } if from < rows.len() && to < rows.len() => {
                    let row = rows.remove(from);
                    rows.insert(to, row);
                }
                Delta::Replaced { index } if index < rows.len() => (),
                _ => return false,
            }
        }
        true
    }
}

impl fmt::Display for ViewChange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ViewChange::Reset => write!(f, "reset"),
            ViewChange::Deltas(deltas) => {
                let shown: Vec<String> = deltas.iter().map(|d| d.to_string()).collect();
                write!(f, "[{}]", shown.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_applies_deltas_in_sequence() {
        let change = ViewChange::Deltas(vec![
            Delta::Inserted { index: 0 },
            Delta::Moved { from: 0, to: 2 },
            Delta::Removed { index: 0 },
            Delta::Replaced { index: 1 },
        ]);
        let mut rows = vec!['a', 'b', 'c'];
        assert!(change.replay(&mut rows, |_| 'n'));
        assert_eq!(rows, vec!['b', 'n', 'c']);
    }

    #[test]
    fn deltas_that_do_not_fit_ask_for_a_reload() {
        let mut rows = vec![1, 2];
        assert!(!ViewChange::Deltas(vec![Delta::Inserted { index: 3 }]).replay(&mut rows, |_| 0));
        assert!(!ViewChange::Deltas(vec![Delta::Removed { index: 2 }]).replay(&mut rows, |_| 0));
        assert!(!ViewChange::Deltas(vec![Delta::Moved { from: 0, to: 2 }]).replay(&mut rows, |_| 0));
        assert!(!ViewChange::Deltas(vec![Delta::Replaced { index: 2 }]).replay(&mut rows, |_| 0));
        assert_eq!(rows, vec![1, 2]);

        let mut empty: Vec<i32> = Vec::new();
        let partial = ViewChange::Deltas(vec![Delta::Inserted { index: 0 }, Delta::Removed { index: 1 }]);
        assert!(!partial.replay(&mut empty, |_| 7));
        assert_eq!(empty, vec![7]);
        assert!(!ViewChange::Reset.replay(&mut empty, |_| 0));
    }
}
