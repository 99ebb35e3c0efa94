//! Streaming substring search
//!
//! This module implements the
//! [Knuth–Morris–Pratt](https://en.wikipedia.org/wiki/Knuth%E2%80%93Morris%E2%80%93Pratt_algorithm)
//! algorithm for finding a pattern inside a stream of elements.
//! Here "pattern" and "stream" mean sequences of elements of any type
//! implementing [PartialEq], not just characters.
//!
//! The API is shaped by two requirements of the delimited-argument matcher
//! that uses it:
//!
//! - The same pattern is searched for in many streams, so the per-pattern
//!   preprocessing is done once, in [`Pattern::new`].
//! - Stream elements become available one at a time, so elements are fed
//!   individually to [`Scan::next`].
//!
//! ```
//! # use texel_stdext::pattern::Pattern;
//! let pattern = Pattern::new(vec![2, 3, 2]).unwrap();
//! let mut scan = pattern.scan();
//! assert_eq![scan.next(&1), false];
//! assert_eq![scan.next(&2), false];
//! assert_eq![scan.next(&3), false];
//! assert_eq![scan.next(&2), true];
//! assert_eq![scan.next(&3), false];
//! assert_eq![scan.next(&2), true];
//! ```

/// A preprocessed pattern that can be searched for in many streams.
///
/// The pattern is guaranteed to be non-empty.
pub struct Pattern<T: PartialEq> {
    elements: Vec<T>,
    // prefix_fn[i] is the length of the longest proper prefix of
    // elements[..=i] that is also a suffix of it.
    prefix_fn: Vec<usize>,
}

impl<T: PartialEq> Pattern<T> {
    /// Preprocess a pattern. Returns `None` if the pattern is empty.
    pub fn new(elements: Vec<T>) -> Option<Pattern<T>> {
        if elements.is_empty() {
            return None;
        }
        let mut prefix_fn = Vec::with_capacity(elements.len());
        prefix_fn.push(0);
        let mut k = 0;
        for i in 1..elements.len() {
            while k > 0 && elements[k] != elements[i] {
                k = prefix_fn[k - 1];
            }
            if elements[k] == elements[i] {
                k += 1;
            }
            prefix_fn.push(k);
        }
        Some(Pattern {
            elements,
            prefix_fn,
        })
    }

    /// Start scanning a new stream for this pattern.
    pub fn scan(&self) -> Scan<T> {
        Scan { pattern: self, q: 0 }
    }

    /// The elements of the pattern.
    //
    // No mutable access: the prefix function is only valid for the
    // elements it was computed from.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Consume the pattern, returning its elements.
    pub fn into_elements(self) -> Vec<T> {
        self.elements
    }
}

/// An in-progress search for a [Pattern] in one particular stream.
pub struct Scan<'a, T: PartialEq> {
    pattern: &'a Pattern<T>,
    q: usize,
}

impl<T: PartialEq> Scan<'_, T> {
    /// Feed the next stream element to the search.
    ///
    /// Returns true if the last `m` elements fed in equal the pattern,
    /// where `m` is the pattern's length. The scan can keep going after a
    /// match to find further (possibly overlapping) occurrences.
    pub fn next(&mut self, element: &T) -> bool {
        while self.q > 0 && &self.pattern.elements[self.q] != element {
            self.q = self.pattern.prefix_fn[self.q - 1];
        }
        if &self.pattern.elements[self.q] == element {
            self.q += 1;
        }
        if self.q == self.pattern.elements.len() {
            self.q = self.pattern.prefix_fn[self.q - 1];
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_positions(pattern: Vec<char>, stream: &str) -> Vec<usize> {
        let pattern = Pattern::new(pattern).unwrap();
        let mut scan = pattern.scan();
        stream
            .chars()
            .enumerate()
            .filter_map(|(i, c)| scan.next(&c).then_some(i))
            .collect()
    }

    #[test]
    fn single_element() {
        assert_eq!(match_positions(vec!['a'], "banana"), vec![1, 3, 5]);
    }

    #[test]
    fn no_match() {
        assert_eq!(match_positions(vec!['a', 'b'], "aaa"), Vec::<usize>::new());
    }

    #[test]
    fn match_at_start() {
        assert_eq!(match_positions(vec!['a', 'b'], "abab"), vec![1, 3]);
    }

    #[test]
    fn overlapping_matches() {
        assert_eq!(match_positions(vec!['a', 'a'], "aaaa"), vec![1, 2, 3]);
    }

    #[test]
    fn repeated_prefix() {
        assert_eq!(
            match_positions(vec!['a', 'a', 'b'], "aaab aab"),
            vec![3, 7]
        );
    }

    #[test]
    fn empty_pattern_rejected() {
        assert!(Pattern::<char>::new(vec![]).is_none());
    }

    #[test]
    fn elements_round_trip() {
        let pattern = Pattern::new(vec![1, 2, 3]).unwrap();
        assert_eq!(pattern.elements(), &[1, 2, 3]);
        assert_eq!(pattern.into_elements(), vec![1, 2, 3]);
    }
}
