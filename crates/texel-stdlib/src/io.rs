//! Read stream commands (`\openin`, `\closein`, `\read` and `\ifeof`)
//!
//! TeX provides 16 numbered read streams.
//! A stream is attached to a file with `\openin`,
//!   consumed one line at a time with `\read`,
//!   and detached with `\closein`.
//! Reading from a stream that is not attached to a file falls back to the
//!   terminal.

use crate::conditional;
use std::rc::Rc;
use texel::parse;
use texel::parse::OptionalEquals;
use texel::prelude as tx;
use texel::texmacro;
use texel::token;
use texel::token::Token;
use texel::traits::*;
use texel::*;

/// The number of read streams, numbered 0 through 15.
pub const NUM_READ_STREAMS: usize = 16;

/// Component holding the state of the read streams.
#[derive(Default)]
pub struct Component {
    streams: [Option<ReadStream>; NUM_READ_STREAMS],
}

struct ReadStream {
    lines: Vec<String>,
    next: usize,
}

impl ReadStream {
    fn exhausted(&self) -> bool {
        self.next >= self.lines.len()
    }
}

/// Get the `\openin` command.
pub fn get_openin<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(openin_fn)
}

fn openin_fn<S: HasComponent<Component>>(
    _: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    let (index, _, file_location) =
        <(parse::Uint<NUM_READ_STREAMS>, OptionalEquals, parse::FileLocation)>::parse(input)?;
    // A file that cannot be read does not raise an error. The stream is
    // left unattached and \ifeof on it returns true.
    let stream = match texel_common::read_file_to_string(input.vm(), file_location, "tex") {
        Ok((_, content)) => Some(ReadStream {
            lines: content.lines().map(String::from).collect(),
            next: 0,
        }),
        Err(_) => None,
    };
    input.state_mut().component_mut().streams[index.0] = stream;
    Ok(())
}

/// Get the `\closein` command.
pub fn get_closein<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(closein_fn)
}

fn closein_fn<S: HasComponent<Component>>(
    _: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    let index = parse::Uint::<NUM_READ_STREAMS>::parse(input)?;
    input.state_mut().component_mut().streams[index.0] = None;
    Ok(())
}

/// Get the `\read` command.
pub fn get_read<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(read_fn)
        .with_tag(crate::prefix::get_globally_prefixable_tag())
}

fn read_fn<S: HasComponent<Component>>(
    read_token: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    let scope = S::variable_assignment_scope_hook(input.state_mut());
    let (index, _, target) =
        <(parse::Uint<NUM_READ_STREAMS>, parse::To, token::CommandRef)>::parse(input)?;
    enum StreamLine {
        Line(String),
        Exhausted,
        Unattached,
    }
    let stream_line = match &mut input.state_mut().component_mut().streams[index.0] {
        Some(stream) => match stream.lines.get(stream.next) {
            Some(line) => {
                let line = line.clone();
                stream.next += 1;
                StreamLine::Line(line)
            }
            None => StreamLine::Exhausted,
        },
        None => StreamLine::Unattached,
    };
    let mut line = match stream_line {
        StreamLine::Line(line) => line,
        StreamLine::Exhausted => {
            return Err(input.error(ReadPastEndError {
                token: read_token,
                stream_index: index.0,
            }))
        }
        StreamLine::Unattached => {
            let mut line = String::new();
            let terminal_in = input.vm().terminal_in.clone();
            if let Err(err) = terminal_in.borrow_mut().read_line(None, &mut line) {
                return Err(input.error(error::SimpleTokenError::new(
                    read_token,
                    format!["could not read from the terminal: {err}"],
                )));
            }
            line
        }
    };
    if let Some(c) = input.vm().context.end_line_char() {
        line.push(c);
    }
    let mut replacement = input.tokenize(read_token, line)?;
    replacement.reverse();
    let user_defined_macro = texmacro::Macro::new(
        vec![],
        vec![],
        vec![texmacro::Replacement::Tokens(replacement)],
        false,
    );
    input
        .context_mut()
        .set_command(target, Rc::new(user_defined_macro), scope);
    Ok(())
}

#[derive(Debug)]
struct ReadPastEndError {
    token: Token,
    stream_index: usize,
}

impl error::TexError for ReadPastEndError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        format!["cannot \\read from stream {}: the file has ended", self.stream_index]
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![r"use \ifeof to test for the end of the file before reading".into()]
    }
}

/// Get the `\ifeof` primitive.
pub fn get_ifeof<S: HasComponent<Component> + HasComponent<conditional::Component>>(
) -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(ifeof_fn).with_tag(conditional::if_tag())
}

fn ifeof_fn<S: HasComponent<Component> + HasComponent<conditional::Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    let index = parse::Uint::<NUM_READ_STREAMS>::parse(input)?;
    let eof = match &HasComponent::<Component>::component(input.state()).streams[index.0] {
        None => true,
        Some(stream) => stream.exhausted(),
    };
    match eof {
        true => conditional::true_case(token, input, conditional::IF_EOF_CODE),
        false => conditional::false_case(token, input, conditional::IF_EOF_CODE),
    }
}
