//! Spell checking using Levenshtein distance
//!
//! This module backs "did you mean" suggestions for misspelled control
//! sequences. [suggestions] ranks every word in a dictionary by its
//! [Levenshtein distance](https://en.wikipedia.org/wiki/Levenshtein_distance)
//! to a search word.
//!
//! The distance is computed with the textbook dynamic program over two
//! rows of the edit matrix, so each comparison uses O(min(n, m)) space.

/// A dictionary word together with its edit distance to the search word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub word: String,
    pub distance: usize,
}

/// Rank every word in the dictionary by edit distance to `word`, closest first.
///
/// Ties are broken by dictionary order, so the ranking is deterministic.
pub fn suggestions(dictionary: &[&str], word: &str) -> Vec<Suggestion> {
    let word: Vec<char> = word.chars().collect();
    let mut result: Vec<Suggestion> = dictionary
        .iter()
        .map(|candidate| Suggestion {
            word: (*candidate).into(),
            distance: distance(&word, candidate),
        })
        .collect();
    result.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.word.cmp(&b.word)));
    result
}

fn distance(a: &[char], b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    // prev[j] is the distance between a[..i] and b[..j].
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut next = vec![0; b.len() + 1];
    for (i, a_i) in a.iter().enumerate() {
        next[0] = i + 1;
        for (j, b_j) in b.iter().enumerate() {
            next[j + 1] = if a_i == b_j {
                prev[j]
            } else {
                1 + prev[j].min(prev[j + 1]).min(next[j])
            };
        }
        std::mem::swap(&mut prev, &mut next);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(a: &str, b: &str) -> usize {
        let a: Vec<char> = a.chars().collect();
        distance(&a, b)
    }

    #[test]
    fn distances() {
        assert_eq!(d("", ""), 0);
        assert_eq!(d("a", ""), 1);
        assert_eq!(d("", "a"), 1);
        assert_eq!(d("a", "a"), 0);
        assert_eq!(d("a", "b"), 1);
        assert_eq!(d("kitten", "sitting"), 3);
        assert_eq!(d("flaw", "lawn"), 2);
        assert_eq!(d("relax", "relax"), 0);
    }

    #[test]
    fn ranking() {
        let dictionary = vec!["def", "fi", "eef"];
        let result = suggestions(&dictionary, "def");
        assert_eq!(result[0].word, "def");
        assert_eq!(result[0].distance, 0);
        assert_eq!(result[1].word, "eef");
        assert_eq!(result[2].word, "fi");
    }

    #[test]
    fn deterministic_tie_break() {
        let dictionary = vec!["bat", "cat"];
        let result = suggestions(&dictionary, "hat");
        assert_eq!(result[0].word, "bat");
        assert_eq!(result[1].word, "cat");
    }
}
