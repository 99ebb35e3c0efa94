//! Conversion of source code characters into tokens.
//!
//! The lexer is strictly on demand: a token is cut from the character
//! stream only when the interpreter asks for it. Batching is impossible
//! in TeX because the category code table is mutable at run time and the
//! command that mutates it comes out of this very lexer. In the snippet
//!
//! ```tex
//! \makeAwhitespace AB
//! ```
//!
//! the control sequence changes the category of `A` to space. Since the
//! lexer discards whitespace after a control sequence name, the correct
//! token stream is the control sequence followed by the letter `B`; a
//! lexer that had already cut `A` into a letter token would be wrong.

use crate::token;
use crate::token::trace;
use crate::token::CsNameInterner;
use crate::token::Token;
use crate::types::CatCode;

#[derive(Debug)]
pub(crate) enum Error {
    InvalidCharacter(char, trace::Key),
    EmptyControlSequence(trace::Key),
}

/// Source of category codes.
///
/// The category code table is scoped data owned by the interpreter, so
/// the lexer looks codes up through this trait.
pub trait CatCodeFn {
    fn cat_code(&self, c: char) -> CatCode;
}

impl CatCodeFn for std::collections::HashMap<char, CatCode> {
    fn cat_code(&self, c: char) -> CatCode {
        self.get(&c).copied().unwrap_or_default()
    }
}

/// The lexer for one piece of source code.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lexer {
    scanner: CharScanner,
    trim_next_whitespace: bool,
    // Scratch space for control sequence names, reused across calls.
    #[cfg_attr(feature = "serde", serde(skip))]
    cs_name_buffer: String,
}

impl Lexer {
    pub fn new(source_code: String, trace_key_range: trace::KeyRange) -> Lexer {
        Lexer {
            scanner: CharScanner::new(source_code, trace_key_range),
            trim_next_whitespace: false,
            cs_name_buffer: Default::default(),
        }
    }

    /// Abandon the rest of this source code, as `\endinput` requires.
    pub(crate) fn end(&mut self) {
        self.scanner.end();
    }

    pub(crate) fn next<F: CatCodeFn>(
        &mut self,
        cat_code_fn: &F,
        cs_name_interner: &mut CsNameInterner,
    ) -> Result<Option<token::Token>, Error> {
        while let Some(scanned) = self.scanner.next(cat_code_fn) {
            let c = scanned.value;
            let key = scanned.trace_key;
            let token = match scanned.code {
                CatCode::Escape => Token::new_control_sequence(
                    self.control_sequence_name(&scanned, cat_code_fn, cs_name_interner)?,
                    key,
                ),
                CatCode::EndOfLine | CatCode::Space => {
                    let mut new_lines = self.skim_whitespace(cat_code_fn);
                    if scanned.code == CatCode::EndOfLine {
                        new_lines += 1;
                    }
                    if new_lines >= 2 {
                        // A blank line is an implicit \par.
                        Token::new_control_sequence(cs_name_interner.get_or_intern("par"), key)
                    } else if self.trim_next_whitespace {
                        continue;
                    } else {
                        // Every run of whitespace, line endings included,
                        // yields the same space token. TeX.2021.349.
                        Token::new_space(' ', key)
                    }
                }
                CatCode::BeginGroup => Token::new_begin_group(c, key),
                CatCode::EndGroup => Token::new_end_group(c, key),
                CatCode::MathShift => Token::new_math_shift(c, key),
                CatCode::AlignmentTab => Token::new_alignment_tab(c, key),
                CatCode::Parameter => Token::new_parameter(c, key),
                CatCode::Superscript => {
                    if self.scanner.fold_caret_notation(c, true) {
                        continue;
                    }
                    Token::new_superscript(c, key)
                }
                CatCode::Subscript => Token::new_subscript(c, key),
                CatCode::Letter => Token::new_letter(c, key),
                CatCode::Other => Token::new_other(c, key),
                CatCode::Active => Token::new_active_character(c, key),
                CatCode::Comment => {
                    while let Some(peeked) = self.scanner.peek(cat_code_fn) {
                        if peeked.code == CatCode::EndOfLine {
                            break;
                        }
                        self.scanner.advance();
                    }
                    self.trim_next_whitespace = true;
                    continue;
                }
                CatCode::Ignored => continue,
                CatCode::Invalid => return Err(Error::InvalidCharacter(c, key)),
            };
            self.trim_next_whitespace = matches!(
                token.value(),
                token::Value::CommandRef(token::CommandRef::ControlSequence(..))
            );
            return Ok(Some(token));
        }
        Ok(None)
    }

    // Consumes the run of whitespace at the head of the stream and
    // returns the number of line endings in it.
    fn skim_whitespace<F: CatCodeFn>(&mut self, cat_code_fn: &F) -> usize {
        let mut new_lines: usize = 0;
        while let Some(scanned) = self.scanner.peek(cat_code_fn) {
            match scanned.code {
                CatCode::EndOfLine => new_lines += 1,
                CatCode::Space => (),
                _ => break,
            }
            self.scanner.advance();
        }
        new_lines
    }

    // Reads the name after an escape character: either a maximal run of
    // letters, or a single non-letter character.
    fn control_sequence_name<F: CatCodeFn>(
        &mut self,
        escape: &ScannedChar,
        cat_code_fn: &F,
        cs_name_interner: &mut CsNameInterner,
    ) -> Result<token::CsName, Error> {
        self.cs_name_buffer.clear();
        let first = match self.scanner.next(cat_code_fn) {
            None => return Err(Error::EmptyControlSequence(escape.trace_key)),
            Some(first) => first,
        };
        match first.code {
            CatCode::Letter => {
                self.cs_name_buffer.push(first.value);
                while let Some(scanned) = self.scanner.peek(cat_code_fn) {
                    match scanned.code {
                        CatCode::Letter => {
                            self.scanner.advance();
                            self.cs_name_buffer.push(scanned.value);
                        }
                        CatCode::Superscript => {
                            if self.scanner.fold_caret_notation(scanned.value, false) {
                                continue;
                            }
                            break;
                        }
                        _ => break,
                    }
                }
            }
            CatCode::Superscript => {
                if self.scanner.fold_caret_notation(first.value, true) {
                    return self.control_sequence_name(escape, cat_code_fn, cs_name_interner);
                }
                self.cs_name_buffer.push(first.value);
            }
            _ => {
                self.cs_name_buffer.push(first.value);
            }
        }
        Ok(cs_name_interner.get_or_intern(&self.cs_name_buffer))
    }
}

struct ScannedChar {
    value: char,
    code: CatCode,
    trace_key: trace::Key,
}

// Iterator over the characters of one source code string, assigning a
// trace key to each character.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct CharScanner {
    source_code: String,
    pos: usize,
    trace_key_range: trace::KeyRange,
}

impl CharScanner {
    fn new(source_code: String, trace_key_range: trace::KeyRange) -> CharScanner {
        CharScanner {
            source_code,
            pos: 0,
            trace_key_range,
        }
    }

    fn end(&mut self) {
        self.pos = self.source_code.len();
    }

    fn next<F: CatCodeFn>(&mut self, cat_code_fn: &F) -> Option<ScannedChar> {
        let c = self.source_code[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        Some(ScannedChar {
            value: c,
            code: cat_code_fn.cat_code(c),
            trace_key: self.trace_key_range.next(),
        })
    }

    fn peek<F: CatCodeFn>(&mut self, cat_code_fn: &F) -> Option<ScannedChar> {
        let c = self.source_code[self.pos..].chars().next()?;
        Some(ScannedChar {
            value: c,
            code: cat_code_fn.cat_code(c),
            trace_key: self.trace_key_range.peek(),
        })
    }

    fn advance(&mut self) {
        if let Some(c) = self.source_code[self.pos..].chars().next() {
            self.pos += c.len_utf8();
        }
        self.trace_key_range.next();
    }

    /// Applies TeX's `^^X` notation if the stream starts with it.
    ///
    /// Two identical superscript characters followed by an ASCII
    /// character denote the character whose code differs by 64.
    /// `first` is the superscript character that triggered the check;
    /// `first_consumed` records whether the caller already consumed it.
    /// On success the pair of superscripts is consumed, the replacement
    /// becomes the next character in the stream, and true is returned.
    fn fold_caret_notation(&mut self, first: char, first_consumed: bool) -> bool {
        let second_start = match first_consumed {
            true => self.pos,
            false => self.pos + first.len_utf8(),
        };
        let second = match self.source_code[second_start..].chars().next() {
            None => return false,
            Some(second) => second,
        };
        if second != first {
            return false;
        }
        let third_start = second_start + second.len_utf8();
        let third = match self.source_code[third_start..].chars().next() {
            // At the end of the input the superscripts are left alone,
            // as in TeX. TeXBook section 355.
            None => return false,
            Some(third) => third,
        };
        if !first_consumed {
            self.advance();
        }
        self.advance();
        let code = third as u32;
        let replacement = match code {
            0x00..=0x3F => code + 0x40,
            0x40..=0x7F => code - 0x40,
            // Non-ASCII characters are not transformed, but the
            // superscript pair is still consumed.
            _ => return true,
        };
        // SAFETY: both the original and the replacement character are
        // ASCII, so the single-byte overwrite keeps the string valid
        // UTF-8.
        unsafe {
            self.source_code.as_bytes_mut()[self.pos] = replacement as u8;
        }
        true
    }
}
