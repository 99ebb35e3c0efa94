//! Tracing system for determining the origin of a token.
//!
//! Error messages need to say where a token came from: which file or
//! terminal input, which line, which column. Storing that information on
//! every token would make the token type large and slow down the inner
//! loops, so instead each token carries a 32-bit [Key] and this module's
//! [Tracer] maps keys back to source positions on demand.
//!
//! When source code is added to the input the tracer is informed via
//! [Tracer::register_source_code]. The tracer allocates a contiguous range
//! of keys, one per UTF-8 character of the source code, and records the
//! association from the first key to the source code itself. The lexer
//! assigns keys in order as it scans characters. To trace a token later,
//! the tracer finds the registered range the token's key falls in; the
//! offset of the key within the range is the character offset within the
//! source code, which is enough to recover the line and column.

use crate::token::{CommandRef, CsNameInterner, Token, Value};
use std::collections::BTreeMap;
use std::ops::Bound::Included;
use std::path::PathBuf;

/// Key attached to tokens to enable tracing them.
///
/// This type is 32 bits.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Key(u32);

impl Key {
    /// Returns a key that is not associated to any source code.
    ///
    /// Tokens built programmatically (in tests, or by primitives that
    /// synthesize tokens) use this key.
    pub fn dummy() -> Key {
        Key(u32::MAX)
    }
}

/// Range of free keys that may be assigned to tokens.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyRange {
    next: u32,
    limit: u32,
}

impl KeyRange {
    /// Get the next trace [Key].
    ///
    /// Panics if all of the keys in this range have been used.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Key {
        if self.next >= self.limit {
            panic!["requested more trace keys than are in the range"]
        }
        let n = self.next;
        self.next += 1;
        Key(n)
    }

    /// Peek at the next trace [Key].
    ///
    /// Panics if all of the keys in this range have been used.
    pub fn peek(&mut self) -> Key {
        if self.next >= self.limit {
            panic!["requested more trace keys than are in the range"]
        }
        Key(self.next)
    }

    /// Advances the range forward by the provided offset.
    ///
    /// Panics if the provided offset cannot be cast to u32.
    pub fn advance_by(&mut self, u: usize) {
        self.next = self.next.checked_add(u.try_into().unwrap()).unwrap();
    }

    pub fn empty() -> KeyRange {
        KeyRange { next: 0, limit: 0 }
    }

    #[cfg(test)]
    pub fn for_testing() -> KeyRange {
        KeyRange {
            next: 0,
            limit: u32::MAX,
        }
    }
}

/// Enum describing the possible origins of source code.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Origin {
    File(PathBuf),
    Terminal,
}

/// The source position a token was read from.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Locator {
    /// Origin of the source code this token came from.
    pub origin: Origin,
    /// Content of the line this token came from.
    pub line_content: String,
    /// Number of the line within the file, starting at 1.
    pub line_number: usize,
    /// Index within the line that the token starts.
    pub index: usize,
    /// String rendering of the token.
    pub value: String,
    /// The traced token, or [None] for an end of input locator.
    pub token: Option<Token>,
}

/// Data structure that records information for token tracing.
#[derive(Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tracer {
    checkpoints: BTreeMap<u32, Checkpoint>,
    next_key: u32,

    // Key of the last source code that was added externally; i.e., not via
    // an \input or other command in a TeX file. Used to locate the end of
    // the input as a whole.
    last_external_input: Option<u32>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Checkpoint {
    SourceCode { origin: Origin, content: String },
}

impl Tracer {
    /// Registers source code with the tracer.
    ///
    /// The returned [KeyRange] must be used to assign [Keys](Key) to the
    /// tokens lexed from this source code, in order: the first key goes to
    /// the token starting at the first UTF-8 character, and so on.
    ///
    /// The `token` argument is the token that caused this source code to be
    /// added (e.g. an `\input` control sequence), or [None] if the source
    /// code was provided externally.
    pub fn register_source_code(
        &mut self,
        token: Option<Token>,
        origin: Origin,
        source_code: &str,
    ) -> KeyRange {
        let len = match u32::try_from(source_code.len()) {
            Err(_) => {
                panic!(
                    "source code too big ({} bytes); max is 2^32={} bytes",
                    source_code.len(),
                    u32::MAX
                )
            }
            // Empty files still get one key so that end of input errors can
            // be traced to them.
            Ok(0) => 1_u32,
            // One extra key for the character that the end line char
            // mechanism appends when the file does not end in a newline.
            Ok(limit) => limit + 1,
        };
        let range = KeyRange {
            next: self.next_key,
            limit: self.next_key + len,
        };
        self.checkpoints.insert(
            range.next,
            Checkpoint::SourceCode {
                origin,
                content: source_code.to_string(),
            },
        );
        if token.is_none() {
            self.last_external_input = Some(self.next_key);
        }
        self.next_key = range.limit;
        range
    }

    /// Return a locator for the provided token.
    pub fn locate(&self, token: Token, cs_name_interner: &CsNameInterner) -> Locator {
        let value = match token.value() {
            Value::CommandRef(command_ref @ CommandRef::ControlSequence(_)) => {
                command_ref.to_string(cs_name_interner)
            }
            _ => token.char().unwrap().to_string(),
        };

        let (&first_key, checkpoint) = self
            .checkpoints
            .range((Included(&0), Included(&token.trace_key().0)))
            .next_back()
            .unwrap();

        let Checkpoint::SourceCode { origin, content } = checkpoint;
        let char_offset = (token.trace_key().0 - first_key) as usize;
        let (line_number, line_content, index) = locate_char(content, char_offset);
        Locator {
            origin: origin.clone(),
            line_content,
            line_number,
            index,
            value,
            token: Some(token),
        }
    }

    /// Return a locator pointing just after the last content of the last
    /// externally provided source code.
    pub fn locate_end_of_input(&self) -> Locator {
        let checkpoint = self
            .checkpoints
            .get(&self.last_external_input.unwrap())
            .unwrap();
        let Checkpoint::SourceCode { origin, content } = checkpoint;
        // (line index, byte index of the line's first character)
        let mut last_line: (usize, usize) = (0, 0);
        let mut last_non_empty_line: (usize, usize) = (0, 0);
        for (i, c) in content.char_indices() {
            if !c.is_whitespace() {
                last_non_empty_line = last_line;
            } else if c == '\n' {
                last_line.0 += 1;
                last_line.1 = i + 1;
            }
        }
        let line_content = content[last_non_empty_line.1..].trim_end();
        Locator {
            origin: origin.clone(),
            line_content: line_content.to_string(),
            line_number: last_non_empty_line.0 + 1,
            index: line_content.len(),
            value: " ".to_string(),
            token: None,
        }
    }
}

/// Find the 1-based line number, line content and column of the character
/// at the provided character offset.
fn locate_char(content: &str, char_offset: usize) -> (usize, String, usize) {
    let mut line_number = 1;
    let mut byte_line_start = 0;
    let mut char_line_start = 0;
    for (char_index, (byte_index, c)) in content.char_indices().enumerate() {
        if char_index == char_offset {
            break;
        }
        if c == '\n' {
            byte_line_start = byte_index + 1;
            char_line_start = char_index + 1;
            line_number += 1;
        }
    }
    let tail = &content[byte_line_start..];
    let line_content = match tail.split_once('\n') {
        None => tail.to_string(),
        Some((line, _)) => line.to_string(),
    };
    (line_number, line_content, char_offset - char_line_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate_all(tracer: &Tracer, interner: &CsNameInterner, tokens: &[Token]) -> Vec<Locator> {
        tokens
            .iter()
            .map(|token| tracer.locate(*token, interner))
            .collect()
    }

    #[test]
    fn single_source_code() {
        let origin = Origin::File("input.tex".into());
        let line_1 = "aü";
        let line_2 = "b\\mäcro";
        let source_code = format!("{line_1}\n{line_2}\nc");

        let mut tracer: Tracer = Default::default();
        let mut interner: CsNameInterner = Default::default();
        let macro_name = interner.get_or_intern("mäcro");
        let mut range = tracer.register_source_code(None, origin.clone(), &source_code);
        let mut tokens = vec![
            Token::new_letter('a', range.next()),
            Token::new_letter('ü', range.next()),
            Token::new_space('\n', range.next()),
            Token::new_letter('b', range.next()),
            Token::new_control_sequence(macro_name, range.next()),
        ];
        for _ in 0.."mäcro".chars().count() {
            range.next();
        }
        tokens.push(Token::new_space('\n', range.next()));
        tokens.push(Token::new_letter('c', range.next()));

        let got = locate_all(&tracer, &interner, &tokens);
        let want = vec![
            Locator {
                origin: origin.clone(),
                line_content: line_1.to_string(),
                line_number: 1,
                index: 0,
                value: "a".to_string(),
                token: Some(tokens[0]),
            },
            Locator {
                origin: origin.clone(),
                line_content: line_1.to_string(),
                line_number: 1,
                index: 1,
                value: "ü".to_string(),
                token: Some(tokens[1]),
            },
            Locator {
                origin: origin.clone(),
                line_content: line_1.to_string(),
                line_number: 1,
                index: 2,
                value: "\n".to_string(),
                token: Some(tokens[2]),
            },
            Locator {
                origin: origin.clone(),
                line_content: line_2.to_string(),
                line_number: 2,
                index: 0,
                value: "b".to_string(),
                token: Some(tokens[3]),
            },
            Locator {
                origin: origin.clone(),
                line_content: line_2.to_string(),
                line_number: 2,
                index: 1,
                value: "\\mäcro".to_string(),
                token: Some(tokens[4]),
            },
            Locator {
                origin: origin.clone(),
                line_content: line_2.to_string(),
                line_number: 2,
                index: 7,
                value: "\n".to_string(),
                token: Some(tokens[5]),
            },
            Locator {
                origin: origin.clone(),
                line_content: "c".to_string(),
                line_number: 3,
                index: 0,
                value: "c".to_string(),
                token: Some(tokens[6]),
            },
        ];
        assert_eq!(want, got);
    }

    #[test]
    fn multiple_source_codes() {
        let mut tracer: Tracer = Default::default();
        let interner: CsNameInterner = Default::default();
        let mut tokens = Vec::new();

        let file_1 = Origin::File("a.tex".into());
        let mut range = tracer.register_source_code(None, file_1.clone(), "a");
        tokens.push(Token::new_letter('a', range.next()));

        let file_2 = Origin::File("b.tex".into());
        let mut range = tracer.register_source_code(None, file_2.clone(), "b");
        tokens.push(Token::new_letter('b', range.next()));

        let terminal = Origin::Terminal;
        let mut range = tracer.register_source_code(None, terminal.clone(), "c");
        tokens.push(Token::new_letter('c', range.next()));

        let got = locate_all(&tracer, &interner, &tokens);
        let want = vec![
            Locator {
                origin: file_1,
                line_content: "a".to_string(),
                line_number: 1,
                index: 0,
                value: "a".to_string(),
                token: Some(tokens[0]),
            },
            Locator {
                origin: file_2,
                line_content: "b".to_string(),
                line_number: 1,
                index: 0,
                value: "b".to_string(),
                token: Some(tokens[1]),
            },
            Locator {
                origin: terminal,
                line_content: "c".to_string(),
                line_number: 1,
                index: 0,
                value: "c".to_string(),
                token: Some(tokens[2]),
            },
        ];
        assert_eq!(want, got);
    }

    #[test]
    fn end_of_input() {
        let mut tracer: Tracer = Default::default();
        let origin = Origin::File("input.tex".into());
        tracer.register_source_code(None, origin.clone(), "first\nsecond\n\n");
        let locator = tracer.locate_end_of_input();
        assert_eq!(
            locator,
            Locator {
                origin,
                line_content: "second".to_string(),
                line_number: 2,
                index: 6,
                value: " ".to_string(),
                token: None,
            }
        );
    }
}
