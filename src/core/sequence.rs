//! Ordered timestep labels shared by a controller and its visualizations.
//!
//! A sequence is validated once at construction (non-empty, strictly
//! ascending) and never mutated afterwards. Controllers and bindings hold it
//! behind an `Arc`; replacing the data means building a new sequence.
//!
//! # Position mapping
//!
//! A continuous position `p` in `[0, N-1]` maps to the label at `floor(p)`.
//! The fractional part is interpolation progress toward the next step and
//! never selects a label on its own.

use std::fmt;

/// Anything usable as a timestep label.
///
/// Labels come from decoded numeric columns (integers or floats), so the
/// bound is `PartialOrd` rather than `Ord`. NaN never passes validation
/// because it is not strictly greater than its predecessor.
pub trait TimeLabel: PartialOrd + Clone + fmt::Display + fmt::Debug + Send + Sync + 'static {}

impl<T> TimeLabel for T where T: PartialOrd + Clone + fmt::Display + fmt::Debug + Send + Sync + 'static {}

/// Sequence validation errors (reported to callers as an invalid sequence)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    Empty,
    /// Label at `index` is not greater than its predecessor
    Unordered { index: usize },
    /// Label at `index` equals its predecessor
    Duplicate { index: usize },
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::Empty => write!(f, "Invalid sequence: no timesteps"),
            SequenceError::Unordered { index } => {
                write!(f, "Invalid sequence: timestep {} is out of order", index)
            }
            SequenceError::Duplicate { index } => {
                write!(f, "Invalid sequence: timestep {} is a duplicate", index)
            }
        }
    }
}

impl std::error::Error for SequenceError {}

/// Immutable, strictly ascending list of timestep labels (N >= 1)
#[derive(Debug, Clone, PartialEq)]
pub struct TimestepSequence<L> {
    labels: Vec<L>,
}

impl<L: TimeLabel> TimestepSequence<L> {
    /// Validate and wrap `labels`.
    pub fn new(labels: Vec<L>) -> Result<Self, SequenceError> {
        if labels.is_empty() {
            return Err(SequenceError::Empty);
        }
        for (index, pair) in labels.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if next == prev {
                return Err(SequenceError::Duplicate { index: index + 1 });
            }
            if !(next > prev) {
                return Err(SequenceError::Unordered { index: index + 1 });
            }
        }
        Ok(Self { labels })
    }

    /// Number of timesteps (never zero)
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false; kept for API symmetry with slices
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Largest valid position, `N-1`
    pub fn max_position(&self) -> f64 {
        (self.labels.len() - 1) as f64
    }

    /// Clamp a raw position into `[0, N-1]`. NaN maps to 0.
    pub fn clamp_position(&self, position: f64) -> f64 {
        if position.is_nan() {
            return 0.0;
        }
        position.clamp(0.0, self.max_position())
    }

    /// Discrete index for a continuous position (floor, clamped)
    pub fn index_at(&self, position: f64) -> usize {
        let clamped = self.clamp_position(position);
        (clamped.floor() as usize).min(self.labels.len() - 1)
    }

    /// Label selected by a continuous position
    pub fn label_at(&self, position: f64) -> &L {
        &self.labels[self.index_at(position)]
    }

    /// Final (most recent) label
    pub fn last(&self) -> &L {
        &self.labels[self.labels.len() - 1]
    }

    /// Index of `label`, if present
    pub fn index_of(&self, label: &L) -> Option<usize> {
        // Sorted and unique, so a partial_cmp binary search is exact.
        self.labels
            .binary_search_by(|probe| {
                probe
                    .partial_cmp(label)
                    .unwrap_or(std::cmp::Ordering::Less)
            })
            .ok()
    }

    pub fn labels(&self) -> &[L] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty() {
        let err = TimestepSequence::<i32>::new(vec![]).unwrap_err();
        assert_eq!(err, SequenceError::Empty);
    }

    #[test]
    fn test_rejects_unsorted_and_duplicates() {
        assert_eq!(
            TimestepSequence::new(vec![0, 2, 1]).unwrap_err(),
            SequenceError::Unordered { index: 2 }
        );
        assert_eq!(
            TimestepSequence::new(vec![0, 1, 1, 2]).unwrap_err(),
            SequenceError::Duplicate { index: 2 }
        );
        assert!(TimestepSequence::new(vec![0.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_position_mapping() {
        let seq = TimestepSequence::new(vec![10, 20, 30, 40, 50]).unwrap();
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.max_position(), 4.0);
        assert_eq!(*seq.label_at(0.0), 10);
        assert_eq!(*seq.label_at(2.7), 30);
        assert_eq!(*seq.label_at(4.0), 50);
        assert_eq!(*seq.label_at(9.5), 50);
        assert_eq!(*seq.label_at(-3.0), 10);
        assert_eq!(seq.clamp_position(f64::NAN), 0.0);
    }

    #[test]
    fn test_index_of() {
        let seq = TimestepSequence::new(vec![1.5, 3.0, 7.25]).unwrap();
        assert_eq!(seq.index_of(&3.0), Some(1));
        assert_eq!(seq.index_of(&7.25), Some(2));
        assert_eq!(seq.index_of(&4.0), None);
    }

    #[test]
    fn test_single_step() {
        let seq = TimestepSequence::new(vec!["only"]).unwrap();
        assert_eq!(seq.max_position(), 0.0);
        assert_eq!(seq.clamp_position(3.0), 0.0);
        assert_eq!(*seq.label_at(0.5), "only");
    }
}
