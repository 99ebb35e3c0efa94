//! Logic for displaying errors in the terminal.

use crate::error::{Error, Kind};
use crate::token;
use crate::token::trace;
use std::fmt;
use texel_stdext::color::Colorize;

/// An additional note attached to an error.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Note {
    /// A textual note.
    Text(String),
    /// A note that points at a token in the source code.
    /// The string is printed before the source code snippet.
    SourceCodeTrace(String, token::Token),
}

impl From<String> for Note {
    fn from(value: String) -> Self {
        Note::Text(value)
    }
}

impl From<&str> for Note {
    fn from(value: &str) -> Self {
        Note::Text(value.into())
    }
}

impl From<&String> for Note {
    fn from(value: &String) -> Self {
        Note::Text(value.clone())
    }
}

pub(crate) fn format_error(f: &mut fmt::Formatter<'_>, err: &Error) -> fmt::Result {
    writeln!(
        f,
        "{} {}",
        "Error:".bright_red().bold(),
        err.error.title().as_str().bold()
    )?;
    let annotation = err.error.source_annotation();
    match err.error.kind() {
        Kind::Token(token) => {
            if let Some(locator) = err.token_traces.get(&token) {
                format_locator(f, locator, &annotation)?;
            }
        }
        Kind::EndOfInput => {
            if let Some(locator) = &err.end_of_input_trace {
                format_locator(f, locator, &annotation)?;
            }
        }
        Kind::FailedPrecondition => (),
    }
    for note in err.error.notes() {
        match note {
            Note::Text(text) => {
                writeln!(f, "{} {}", "note:".bright_yellow().bold(), text)?;
            }
            Note::SourceCodeTrace(preamble, token) => {
                writeln!(f, "{} {}", "note:".bright_yellow().bold(), preamble)?;
                if let Some(locator) = err.token_traces.get(&token) {
                    format_locator(f, locator, "")?;
                }
            }
        }
    }
    for element in &err.stack_trace {
        writeln!(f)?;
        writeln!(
            f,
            "{} {}",
            "while".italic(),
            element.context.action().italic()
        )?;
        format_locator(f, &element.trace, "")?;
    }
    Ok(())
}

fn format_locator(
    f: &mut fmt::Formatter<'_>,
    locator: &trace::Locator,
    annotation: &str,
) -> fmt::Result {
    let origin = match &locator.origin {
        trace::Origin::File(path) => path.display().to_string(),
        trace::Origin::Terminal => "<terminal input>".to_string(),
    };
    let line_number = locator.line_number.to_string();
    let margin = " ".repeat(line_number.len());
    let bar = "|".bright_cyan().bold();
    writeln!(
        f,
        "{}{} {}:{}:{}",
        margin,
        ">>".bright_cyan().bold(),
        origin,
        locator.line_number,
        locator.index + 1,
    )?;
    writeln!(f, "{margin} {bar}")?;
    writeln!(
        f,
        "{} {} {}",
        line_number.as_str().bright_cyan().bold(),
        bar,
        locator.line_content,
    )?;
    let carets = "^".repeat(locator.value.chars().count().max(1));
    write!(
        f,
        "{} {} {}{}",
        margin,
        bar,
        " ".repeat(locator.index),
        carets.as_str().bright_red().bold(),
    )?;
    if annotation.is_empty() {
        writeln!(f)
    } else {
        writeln!(f, " {annotation}")
    }
}
