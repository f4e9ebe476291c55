//! Rolling sample history
//!
//! A fixed-capacity ring buffer of the most recent CO2 readings. Once full,
//! every push overwrites the oldest sample. The logical oldest-to-newest
//! order is recovered from the write cursor and the occupancy count, so no
//! samples are ever shifted in memory.

/// Number of CO2 samples kept for the graph (≈7.5 minutes at one sample
/// every 5 s)
pub const CO2_HISTORY_LEN: usize = 90;

/// Fixed-capacity circular buffer of samples.
#[derive(Debug, Clone)]
pub struct History<const N: usize> {
    samples: [u16; N],
    /// Slot the next sample is written to
    cursor: usize,
    /// Number of valid samples, saturating at `N`
    len: usize,
}

impl<const N: usize> Default for History<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> History<N> {
    pub const fn new() -> Self {
        Self {
            samples: [0; N],
            cursor: 0,
            len: 0,
        }
    }

    /// Append `value`, overwriting the oldest sample when full.
    pub fn push(&mut self, value: u16) {
        if N == 0 {
            return;
        }

        self.samples[self.cursor] = value;
        self.cursor = (self.cursor + 1) % N;
        if self.len < N {
            self.len += 1;
        }
    }

    /// Number of stored samples
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Most recently pushed sample
    pub fn latest(&self) -> Option<u16> {
        if self.is_empty() {
            return None;
        }
        Some(self.samples[(self.cursor + N - 1) % N])
    }

    /// Iterate stored samples from oldest to newest.
    ///
    /// The iterator borrows the history and can be created any number of
    /// times without changing it.
    pub fn iter(&self) -> Iter<'_, N> {
        let start = if N == 0 {
            0
        } else {
            (self.cursor + N - self.len) % N
        };

        Iter {
            history: self,
            start,
            index: 0,
        }
    }

    /// Smallest and largest stored sample
    pub fn min_max(&self) -> Option<(u16, u16)> {
        self.iter().fold(None, |acc, value| match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
    }
}

impl<'a, const N: usize> IntoIterator for &'a History<N> {
    type Item = u16;
    type IntoIter = Iter<'a, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Oldest-to-newest iterator over a [`History`]
#[derive(Debug, Clone)]
pub struct Iter<'a, const N: usize> {
    history: &'a History<N>,
    start: usize,
    index: usize,
}

impl<const N: usize> Iterator for Iter<'_, N> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        if self.index >= self.history.len {
            return None;
        }

        let value = self.history.samples[(self.start + self.index) % N];
        self.index += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.history.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<const N: usize> ExactSizeIterator for Iter<'_, N> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history() {
        let history = History::<4>::new();
        assert!(history.is_empty());
        assert_eq!(history.iter().count(), 0);
        assert_eq!(history.latest(), None);
        assert_eq!(history.min_max(), None);
    }

    #[test]
    fn test_partial_history_in_order() {
        let mut history = History::<4>::new();
        history.push(400);
        history.push(410);
        history.push(405);

        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![400, 410, 405]);
        assert_eq!(history.latest(), Some(405));
        assert_eq!(history.min_max(), Some((400, 410)));
    }

    #[test]
    fn test_overflow_keeps_most_recent_in_order() {
        let mut history = History::<CO2_HISTORY_LEN>::new();
        let k = 17;
        for value in 0..(CO2_HISTORY_LEN + k) as u16 {
            history.push(value);
        }

        assert_eq!(history.len(), CO2_HISTORY_LEN);
        let expected: Vec<u16> = (k as u16..(CO2_HISTORY_LEN + k) as u16).collect();
        assert_eq!(history.iter().collect::<Vec<_>>(), expected);
        assert_eq!(history.latest(), Some((CO2_HISTORY_LEN + k - 1) as u16));
    }

    #[test]
    fn test_exactly_full_wraps_cursor() {
        let mut history = History::<3>::new();
        for value in [1, 2, 3] {
            history.push(value);
        }
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![1, 2, 3]);

        history.push(4);
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let mut history = History::<3>::new();
        for value in [7, 8, 9, 10] {
            history.push(value);
        }

        let first: Vec<_> = history.iter().collect();
        let second: Vec<_> = (&history).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(history.iter().len(), 3);
    }
}
