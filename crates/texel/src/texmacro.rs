//! Implementation of TeX user defined macros.

use crate::error;
use crate::prelude as tx;
use crate::token;
use crate::token::Token;
use crate::token::Value;
use crate::traits::*;
use crate::vm;
use texel_stdext::pattern::Pattern;

/// A TeX macro created with `\def` or one of its variants.
#[derive(Debug)]
pub struct Macro {
    prefix: Vec<Token>,
    parameters: Vec<Parameter>,
    replacements: Vec<Replacement>,
    long: bool,
}

/// A token list or parameter in a replacement text.
#[derive(Debug, Clone)]
pub enum Replacement {
    /// A list of tokens.
    ///
    /// The tokens are stored in reverse order, so that they can be copied
    /// directly onto the expansions stack which pops from the back.
    Tokens(Vec<Token>),

    /// A parameter.
    ///
    /// In order to be valid, the parameter's index must be less than the number
    /// of parameters in the macro.
    Parameter(usize),
}

/// A parameter in the parameter text of a macro.
pub enum Parameter {
    /// A parameter with no delimiter, like `#1` in `\def\a#1{...}`.
    ///
    /// The argument is a single token, or a balanced group.
    Undelimited,

    /// A parameter delimited by the tokens that follow it in the parameter
    /// text, like `#1` in `\def\a#1,{...}`.
    ///
    /// The argument is all tokens up to the first appearance of the
    /// delimiter at group depth zero.
    Delimited(Pattern<Value>),
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Parameter::Undelimited => write!(f, "Undelimited"),
            Parameter::Delimited(pattern) => f
                .debug_tuple("Delimited")
                .field(&pattern.elements())
                .finish(),
        }
    }
}

impl Macro {
    /// Create a new macro.
    ///
    /// If `long` is true, arguments of the macro may contain `\par` tokens.
    pub fn new(
        prefix: Vec<Token>,
        parameters: Vec<Parameter>,
        replacements: Vec<Replacement>,
        long: bool,
    ) -> Macro {
        Macro {
            prefix,
            parameters,
            replacements,
            long,
        }
    }

    pub fn prefix(&self) -> &[Token] {
        &self.prefix
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    pub fn is_long(&self) -> bool {
        self.long
    }

    /// Expand the macro: scan its arguments from the stream and push the
    /// replacement text, with arguments substituted, to the front of the
    /// stream.
    pub fn call<S: TexelState>(
        &self,
        token: Token,
        input: &mut vm::ExpansionInput<S>,
    ) -> tx::Result<()> {
        remove_prefix_from_stream(token, &self.prefix, input)?;
        let mut argument_indices: Vec<(usize, usize)> = Default::default();
        let mut argument_tokens = input.checkout_token_buffer();
        for (i, parameter) in self.parameters.iter().enumerate() {
            let start_index = argument_tokens.len();
            let trim_outer_braces =
                parameter.parse_argument(token, input, i, self.long, &mut argument_tokens)?;
            let element = match trim_outer_braces {
                true => (start_index + 1, argument_tokens.len() - 1),
                false => (start_index, argument_tokens.len()),
            };
            argument_indices.push(element);
        }

        let mut arguments: Vec<&[Token]> = Default::default();
        for (i, j) in &argument_indices {
            let slice = argument_tokens.get(*i..*j).unwrap();
            arguments.push(slice);
        }

        let result = input.expansions_mut();
        let num_tokens = Macro::perform_replacement(&self.replacements, &arguments, result);

        // To keep the borrow checker happy we need to downgrade result to a shared reference.
        let result = input.expansions();
        S::post_macro_expansion_hook(
            token,
            input,
            self,
            &arguments,
            &result[result.len() - num_tokens..result.len()],
        );

        input.return_token_buffer(argument_tokens);
        Ok(())
    }

    fn perform_replacement(
        replacements: &[Replacement],
        arguments: &[&[Token]],
        result: &mut Vec<Token>,
    ) -> usize {
        let mut output_size = 0;
        for replacement in replacements.iter() {
            output_size += match replacement {
                Replacement::Tokens(tokens) => tokens.len(),
                Replacement::Parameter(i) => arguments.get(*i).unwrap().len(),
            };
        }
        result.reserve(output_size);
        // The expansions stack pops from the back, so the replacement text
        // is pushed in reverse.
        for replacement in replacements.iter().rev() {
            match replacement {
                Replacement::Tokens(tokens) => {
                    result.extend(tokens);
                }
                Replacement::Parameter(i) => {
                    result.extend(arguments.get(*i).unwrap().iter().rev().copied());
                }
            }
        }
        output_size
    }
}

impl Parameter {
    fn parse_argument<S: TexelState>(
        &self,
        macro_token: Token,
        input: &mut vm::ExpansionInput<S>,
        index: usize,
        long: bool,
        result: &mut Vec<Token>,
    ) -> tx::Result<bool> {
        match self {
            Parameter::Undelimited => {
                Parameter::parse_undelimited_argument(macro_token, input, index + 1, long, result)?;
                Ok(false)
            }
            Parameter::Delimited(pattern) => Parameter::parse_delimited_argument(
                macro_token,
                input,
                pattern,
                index + 1,
                long,
                result,
            ),
        }
    }

    fn parse_delimited_argument<S: TexelState>(
        macro_token: Token,
        input: &mut vm::ExpansionInput<S>,
        pattern: &Pattern<Value>,
        param_num: usize,
        long: bool,
        result: &mut Vec<Token>,
    ) -> tx::Result<bool> {
        let mut scan = pattern.scan();
        let mut scope_depth = 0;

        // This handles the case of a macro whose argument ends with the special #{ tokens.
        // In this special case the parsing will end with a scope depth of 1, because the
        // last token parsed will be the { and all braces before that will be balanced.
        let closing_scope_depth = match pattern.elements().last() {
            Some(Value::BeginGroup(_)) => 1,
            _ => 0,
        };
        let start_index = result.len();
        loop {
            let token = next_argument_token(macro_token, input, param_num, long)?;
            match token.value() {
                Value::BeginGroup(_) => {
                    scope_depth += 1;
                }
                Value::EndGroup(_) => {
                    if scope_depth == 0 {
                        return Err(input.error(ExtraEndGroupError {
                            macro_token,
                            end_group_token: token,
                            param_num,
                        }));
                    }
                    scope_depth -= 1;
                }
                _ => (),
            };
            let value = token.value();
            let matches_delimiter = scan.next(&value);
            result.push(token);
            if scope_depth == closing_scope_depth && matches_delimiter {
                // Remove the delimiter from the argument.
                for _ in 0..pattern.elements().len() {
                    result.pop();
                }
                return Ok(Parameter::should_trim_outer_braces_if_present(
                    &result[start_index..],
                ));
            }
        }
    }

    fn should_trim_outer_braces_if_present(list: &[Token]) -> bool {
        if list.len() <= 1 {
            return false;
        }
        match list[0].value() {
            Value::BeginGroup(_) => (),
            _ => {
                return false;
            }
        }
        match list[list.len() - 1].value() {
            Value::EndGroup(_) => (),
            _ => {
                return false;
            }
        }
        true
    }

    fn parse_undelimited_argument<S: TexelState>(
        macro_token: Token,
        input: &mut vm::ExpansionInput<S>,
        param_num: usize,
        long: bool,
        result: &mut Vec<Token>,
    ) -> tx::Result<()> {
        let token = loop {
            let token = next_argument_token(macro_token, input, param_num, long)?;
            match token.value() {
                Value::Space(_) => continue,
                _ => break token,
            }
        };
        match token.value() {
            Value::BeginGroup(_) => (),
            Value::EndGroup(_) => {
                return Err(input.error(error::SimpleTokenError::new(
                    token,
                    "unexpected end of group while reading a macro argument",
                )))
            }
            _ => {
                result.push(token);
                return Ok(());
            }
        };
        // The argument is a balanced group. The outer braces are not part
        // of the argument.
        let mut scope_depth = 1;
        loop {
            let token = next_argument_token(macro_token, input, param_num, long)?;
            match token.value() {
                Value::BeginGroup(_) => {
                    scope_depth += 1;
                }
                Value::EndGroup(_) => {
                    scope_depth -= 1;
                    if scope_depth == 0 {
                        return Ok(());
                    }
                }
                _ => (),
            }
            result.push(token);
        }
    }
}

/// Removes the provided vector of tokens from the front of the stream.
fn remove_prefix_from_stream<S: TexelState>(
    macro_token: Token,
    prefix: &[Token],
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    for prefix_token in prefix.iter() {
        let stream_token = match input.unexpanded().next()? {
            None => return Err(input.eof_error(PrefixEndOfInputError {})),
            Some(token) => token,
        };
        if stream_token.value() != prefix_token.value() {
            return Err(input.error(PrefixMismatchError {
                macro_token,
                got: stream_token,
            }));
        }
    }
    Ok(())
}

fn next_argument_token<S: TexelState>(
    macro_token: Token,
    input: &mut vm::ExpansionInput<S>,
    param_num: usize,
    long: bool,
) -> tx::Result<Token> {
    let token = match input.unexpanded().next()? {
        None => {
            return Err(input.eof_error(ArgumentEndOfInputError { param_num }));
        }
        Some(token) => token,
    };
    if !long && is_par_token(input.vm(), token) {
        return Err(input.error(RunawayArgumentError {
            macro_token,
            par_token: token,
            param_num,
        }));
    }
    Ok(token)
}

fn is_par_token<S>(vm: &vm::VM<S>, token: Token) -> bool {
    match token.value() {
        Value::CommandRef(token::CommandRef::ControlSequence(name)) => {
            vm.cs_name_interner().resolve(name) == Some("par")
        }
        _ => false,
    }
}

#[derive(Debug)]
struct PrefixEndOfInputError;

impl error::EndOfInputError for PrefixEndOfInputError {
    fn doing(&self) -> String {
        "matching the parameter text of a user-defined macro".into()
    }
}

#[derive(Debug)]
struct PrefixMismatchError {
    macro_token: Token,
    got: Token,
}

impl error::TexError for PrefixMismatchError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.got)
    }

    fn title(&self) -> String {
        "use of a macro does not match its definition".into()
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![
            "the macro's parameter text requires a specific token at this position".into(),
            error::display::Note::SourceCodeTrace(
                "the macro was invoked here:".into(),
                self.macro_token,
            ),
        ]
    }
}

#[derive(Debug)]
struct ArgumentEndOfInputError {
    param_num: usize,
}

impl error::EndOfInputError for ArgumentEndOfInputError {
    fn doing(&self) -> String {
        "reading an argument for a user-defined macro".into()
    }
    fn notes(&self) -> Vec<error::display::Note> {
        vec![format!("this is argument number {} for the macro", self.param_num).into()]
    }
}

#[derive(Debug)]
struct ExtraEndGroupError {
    macro_token: Token,
    end_group_token: Token,
    param_num: usize,
}

impl error::TexError for ExtraEndGroupError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.end_group_token)
    }

    fn title(&self) -> String {
        "there is an extra } in a macro argument".into()
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![
            format!(
                "braces must be balanced in a macro argument; this is argument number {}",
                self.param_num
            )
            .into(),
            error::display::Note::SourceCodeTrace(
                "the macro was invoked here:".into(),
                self.macro_token,
            ),
        ]
    }
}

#[derive(Debug)]
struct RunawayArgumentError {
    macro_token: Token,
    par_token: Token,
    param_num: usize,
}

impl error::TexError for RunawayArgumentError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.par_token)
    }

    fn title(&self) -> String {
        "runaway argument: the paragraph ended before the argument was complete".into()
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![
            format!(
                "arguments cannot contain \\par tokens unless the macro is defined with \\long; this is argument number {}",
                self.param_num
            )
            .into(),
            error::display::Note::SourceCodeTrace(
                "the macro was invoked here:".into(),
                self.macro_token,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::trace;

    #[test]
    fn replacement_text_is_pushed_in_reverse() {
        let key = trace::Key::dummy();
        let a = Token::new_letter('a', key);
        let b = Token::new_letter('b', key);
        let x = Token::new_letter('x', key);
        let y = Token::new_letter('y', key);
        // The replacement text is #2#1ab, with the token list stored reversed.
        let replacements = vec![
            Replacement::Parameter(1),
            Replacement::Parameter(0),
            Replacement::Tokens(vec![b, a]),
        ];
        let arg_x = [x];
        let arg_y = [y];
        let arguments: Vec<&[Token]> = vec![&arg_x, &arg_y];
        let mut result = Vec::new();
        let num_tokens = Macro::perform_replacement(&replacements, &arguments, &mut result);
        assert_eq!(num_tokens, 4);
        // Popping from the back must yield y, x, a, b.
        assert_eq!(result, vec![b, a, x, y]);
    }
}
