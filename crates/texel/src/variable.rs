//! Texel variables API
//!
//! A TeX variable is a cell that TeX code can read with `\the` and write
//! with an assignment like `\count 0 = 4`. In Texel all variable cells
//! live in the scoped context store ([crate::context]), so that
//! assignments are automatically rolled back when the current group ends.
//! A variable command ([Command]) describes how to find the cell: which
//! value family it belongs to and how to determine its register key.
//! Resolving a command (which may consume an index from the input stream)
//! yields a [Variable], which is just a family and a key.
//!
//! Some integer quantities, like `\currentgrouplevel`, are not cells at
//! all but are computed from the interpreter's state when read. These are
//! modeled by the [Command::IntGetter] variant and are read-only.

use crate::command;
use crate::context;
use crate::error;
use crate::parse;
use crate::parse::OptionalEquals;
use crate::prelude as tx;
use crate::token;
use crate::traits::*;
use crate::types;
use crate::vm;
use std::rc::Rc;

/// Key of a register or parameter in the scoped context store.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegisterKey {
    /// A numbered register, like the target of `\count 12`.
    Index(i32),
    /// A named parameter, like the target of `\endlinechar`.
    Named(&'static str),
}

/// The value family a variable belongs to.
///
/// The family determines the Rust type of the variable's value and which
/// table of the context store the value lives in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Family {
    /// 32-bit integers (`\count`).
    Count,
    /// Dimensions (`\dimen`).
    Dimen,
    /// Glue (`\skip`).
    Glue,
    /// Math glue (`\muskip`).
    MuGlue,
    /// Token lists (`\toks`).
    Toks,
    /// Category codes (`\catcode`). The register key is a character code.
    CatCode,
}

/// Specification for how the register key of a variable is determined.
pub enum IndexResolver<S> {
    /// A static key, provided in the enum variant.
    ///
    /// This resolver is used for commands that point at a specific cell.
    /// For example, after executing `\countdef\A 30`, the `\A` control
    /// sequence points at the count register with index 30.
    /// Named parameters like `\endlinechar` also use a static resolver.
    Static(RegisterKey),
    /// A dynamic key that is determined by reading the input token stream.
    ///
    /// For example, in `\count 4` the index 4 is determined by parsing a
    /// number from the input token stream.
    Dynamic(fn(token::Token, &mut vm::ExpandedStream<S>) -> tx::Result<RegisterKey>),
}

impl<S> IndexResolver<S> {
    fn resolve(
        &self,
        token: token::Token,
        input: &mut vm::ExpandedStream<S>,
    ) -> tx::Result<RegisterKey> {
        match self {
            IndexResolver::Static(key) => Ok(*key),
            IndexResolver::Dynamic(f) => f(token, input),
        }
    }
}

/// A TeX variable command.
///
/// Variable commands are _resolved_ to obtain a [Variable].
pub enum Command<S> {
    /// A variable backed by a cell in the scoped context store.
    Register(Family, IndexResolver<S>),
    /// A read-only integer that is computed from the interpreter's state
    /// when read. Example: `\currentgrouplevel`.
    IntGetter(fn(&vm::VM<S>) -> i32),
    /// A read-only dimension that is computed from the interpreter's state
    /// when read. Example: `\lastkern`.
    DimenGetter(fn(&vm::VM<S>) -> types::Scaled),
}

impl<S> Command<S> {
    /// Create a new command for an indexed register family, with the index
    /// parsed from the input stream.
    pub fn new_registers(
        family: Family,
        index: fn(token::Token, &mut vm::ExpandedStream<S>) -> tx::Result<RegisterKey>,
    ) -> Command<S> {
        Command::Register(family, IndexResolver::Dynamic(index))
    }

    /// Create a new command pointing at a single statically known cell.
    pub fn new_static(family: Family, key: RegisterKey) -> Command<S> {
        Command::Register(family, IndexResolver::Static(key))
    }

    /// Create a new command for a named parameter.
    pub fn new_parameter(family: Family, name: &'static str) -> Command<S> {
        Command::Register(family, IndexResolver::Static(RegisterKey::Named(name)))
    }

    /// Create a new read-only integer command.
    pub fn new_getter(f: fn(&vm::VM<S>) -> i32) -> Command<S> {
        Command::IntGetter(f)
    }

    /// Create a new read-only dimension command.
    pub fn new_dimen_getter(f: fn(&vm::VM<S>) -> types::Scaled) -> Command<S> {
        Command::DimenGetter(f)
    }

    pub fn family(&self) -> Option<Family> {
        match self {
            Command::Register(family, _) => Some(*family),
            Command::IntGetter(_) | Command::DimenGetter(_) => None,
        }
    }
}

// Equality is used to implement `\ifx` for variable commands.
impl<S> PartialEq for Command<S> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Command::Register(f1, r1), Command::Register(f2, r2)) => {
                f1 == f2
                    && match (r1, r2) {
                        (IndexResolver::Static(k1), IndexResolver::Static(k2)) => k1 == k2,
                        (IndexResolver::Dynamic(f1), IndexResolver::Dynamic(f2)) => {
                            *f1 as usize == *f2 as usize
                        }
                        _ => false,
                    }
            }
            (Command::IntGetter(f1), Command::IntGetter(f2)) => *f1 as usize == *f2 as usize,
            (Command::DimenGetter(f1), Command::DimenGetter(f2)) => *f1 as usize == *f2 as usize,
            _ => false,
        }
    }
}

impl<S: TexelState> Command<S> {
    /// Resolve the command to obtain a [Variable].
    pub fn resolve(
        &self,
        token: token::Token,
        input: &mut vm::ExpandedStream<S>,
    ) -> tx::Result<Variable<S>> {
        match self {
            Command::Register(family, index_resolver) => {
                let key = match index_resolver.resolve(token, input) {
                    Ok(key) => key,
                    Err(err) => {
                        return Err(error::Error::propagate(
                            input.vm(),
                            error::OperationKind::VariableIndex,
                            token,
                            err,
                        ))
                    }
                };
                Ok(Variable::Register(*family, key))
            }
            Command::IntGetter(f) => Ok(Variable::IntGetter(*f)),
            Command::DimenGetter(f) => Ok(Variable::DimenGetter(*f)),
        }
    }

    /// Resolve the command to a variable and set the value of the variable
    /// using the following tokens in the input stream.
    ///
    /// This function is used in TeX code like `\variable = 3`.
    /// In this case `\variable` is a command which resolves to a variable
    /// without consuming any more input.
    /// The variable is populated using the input `= 3` that follows.
    pub(crate) fn set_value_using_input(
        &self,
        token: token::Token,
        input: &mut vm::ExecutionInput<S>,
        scope: context::Scope,
    ) -> tx::Result<()> {
        let variable = self.resolve(token, input.as_mut())?;
        match variable.set_value_using_input(token, input, scope) {
            Ok(()) => Ok(()),
            Err(err) => Err(error::Error::propagate(
                input.vm(),
                error::OperationKind::VariableAssignment,
                token,
                err,
            )),
        }
    }
}

/// The value of a variable.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    CatCode(types::CatCode),
    Dimen(types::Scaled),
    Glue(types::Glue),
    MuGlue(types::Glue),
    Toks(Rc<Vec<token::Token>>),
}

/// TeX variable of any type.
///
/// A variable is a resolved [Command]: the register key, if any, has been
/// determined. Reading and writing goes through the context store.
pub enum Variable<S> {
    Register(Family, RegisterKey),
    IntGetter(fn(&vm::VM<S>) -> i32),
    DimenGetter(fn(&vm::VM<S>) -> types::Scaled),
}

impl<S: TexelState> Variable<S> {
    /// Return the value of the variable.
    pub fn value(&self, vm: &vm::VM<S>) -> Value {
        match self {
            Variable::Register(family, key) => match family {
                Family::Count => Value::Int(vm.context.count(*key)),
                Family::Dimen => Value::Dimen(vm.context.dimen(*key)),
                Family::Glue => Value::Glue(vm.context.glue(*key)),
                Family::MuGlue => Value::MuGlue(vm.context.mu_glue(*key)),
                Family::Toks => Value::Toks(vm.context.toks(*key)),
                Family::CatCode => Value::CatCode(vm.context.cat_code_register(*key)),
            },
            Variable::IntGetter(f) => Value::Int(f(vm)),
            Variable::DimenGetter(f) => Value::Dimen(f(vm)),
        }
    }

    /// Set the value of the variable using the following tokens in the
    /// input stream.
    fn set_value_using_input(
        &self,
        token: token::Token,
        input: &mut vm::ExecutionInput<S>,
        scope: context::Scope,
    ) -> tx::Result<()> {
        let (family, key) = match self {
            Variable::Register(family, key) => (*family, *key),
            Variable::IntGetter(_) | Variable::DimenGetter(_) => {
                return Err(input.vm().error(error::SimpleTokenError::new(
                    token,
                    "this quantity is read-only and cannot be assigned to",
                )))
            }
        };
        OptionalEquals::parse(input)?;
        match family {
            Family::Count => {
                let value = i32::parse(input)?;
                input.context_mut().set_count(key, value, scope);
            }
            Family::Dimen => {
                let value = types::Scaled::parse(input)?;
                input.context_mut().set_dimen(key, value, scope);
            }
            Family::Glue => {
                let value = types::Glue::parse(input)?;
                input.context_mut().set_glue(key, value, scope);
            }
            Family::MuGlue => {
                let value = types::Glue::parse(input)?;
                input.context_mut().set_mu_glue(key, value, scope);
            }
            Family::Toks => {
                let value = parse_toks_value(input)?;
                input.context_mut().set_toks(key, value, scope);
            }
            Family::CatCode => {
                let c = match key {
                    RegisterKey::Index(index) => match u32::try_from(index)
                        .ok()
                        .and_then(char::from_u32)
                    {
                        Some(c) => c,
                        None => {
                            return Err(input.vm().error(error::SimpleTokenError::new(
                                token,
                                format!["bad character code {index}"],
                            )))
                        }
                    },
                    RegisterKey::Named(_) => {
                        return Err(input.vm().error(error::SimpleTokenError::new(
                            token,
                            "category codes are indexed by character code",
                        )))
                    }
                };
                let value = types::CatCode::parse(input)?;
                input.context_mut().set_cat_code(c, value, scope);
            }
        }
        Ok(())
    }
}

/// Parses the right hand side of a token list assignment.
///
/// This is either a brace-delimited token list, or another token list
/// variable whose value is copied, as in `\toks 2 = \toks 1`.
fn parse_toks_value<S: TexelState>(
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<Rc<Vec<token::Token>>> {
    let first = match input.next()? {
        None => {
            return Err(input.eof_error(error::SimpleEndOfInputError::new(
                "reading a token list",
            )))
        }
        Some(token) => token,
    };
    if let token::Value::CommandRef(command_ref) = first.value() {
        let cmd = input.vm().context.command(&command_ref).cloned();
        if let Some(command::Command::Variable(cmd)) = cmd {
            if cmd.family() == Some(Family::Toks) {
                let variable = cmd.resolve(first, input.as_mut())?;
                if let Value::Toks(tokens) = variable.value(input.vm()) {
                    return Ok(tokens);
                }
            }
        }
    }
    input.back(first);
    let value = parse::parse_token_list(input.as_mut())?;
    Ok(Rc::new(value))
}

impl<S> Clone for Variable<S> {
    fn clone(&self) -> Self {
        match self {
            Variable::Register(family, key) => Variable::Register(*family, *key),
            Variable::IntGetter(f) => Variable::IntGetter(*f),
            Variable::DimenGetter(f) => Variable::DimenGetter(*f),
        }
    }
}

impl<S> Copy for Variable<S> {}
