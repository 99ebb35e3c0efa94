//! File name parsing.
//!
//! A file name is a run of character tokens. A space token ends the name
//! and is consumed; any token without a character value ends the name and
//! is left in the input. TeX.2021.511.

use crate::prelude as tx;
use crate::token;
use crate::traits::*;
use crate::vm;
use std::path;

/// A file location scanned from the input, like `path/to/file.tex`.
///
/// The extension, if any, is everything after the last dot.
#[derive(PartialEq, Eq, Debug)]
pub struct FileLocation {
    pub path: String,
    pub extension: Option<String>,
}

impl<S: TexelState> Parsable<S> for FileLocation {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> tx::Result<Self> {
        let mut name = String::new();
        let mut last_dot = None;
        while let Some(t) = input.peek()? {
            if let token::Value::Space(_) = t.value() {
                input.consume()?;
                break;
            }
            let c = match t.char() {
                None => break,
                Some(c) => c,
            };
            input.consume()?;
            if c == '.' {
                last_dot = Some(name.len());
            }
            name.push(c);
        }

        Ok(match last_dot {
            None => FileLocation {
                path: name,
                extension: None,
            },
            Some(dot) => FileLocation {
                extension: Some(name[dot + 1..].into()),
                path: {
                    name.truncate(dot);
                    name
                },
            },
        })
    }
}

impl FileLocation {
    /// Resolves the location to a full path, relative to the working
    /// directory if the location itself is relative.
    pub fn determine_full_path(
        &self,
        working_directory: Option<&path::Path>,
        default_extension: &str,
    ) -> path::PathBuf {
        let mut full_path: path::PathBuf = match working_directory {
            None => Default::default(),
            Some(working_directory) => working_directory.into(),
        };
        full_path.push(std::ffi::OsString::from(&self.path));
        full_path.set_extension(std::ffi::OsString::from(
            self.extension.as_deref().unwrap_or(default_extension),
        ));
        full_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::*;

    fn location(path: &str, extension: Option<&str>) -> FileLocation {
        FileLocation {
            path: path.into(),
            extension: extension.map(Into::into),
        }
    }

    parse_success_tests![
        (bare_path, "path/to/file", location("path/to/file", None)),
        (
            path_ending_in_newline,
            "path/to/file\n",
            location("path/to/file", None),
        ),
        (
            path_ending_in_control_sequence,
            r"path/to/file\relax more",
            location("path/to/file", None),
        ),
        (
            path_ending_in_space,
            "path/to/file something",
            location("path/to/file", None),
        ),
        (bare_extension, ".tex", location("", Some("tex"))),
        (
            path_with_extension,
            "path/to/file.tex",
            location("path/to/file", Some("tex")),
        ),
    ];
}
