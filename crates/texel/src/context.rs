//! The scoped context store.
//!
//! TeX's grouping semantics say that assignments made inside a group
//! (delimited by `{`/`}` or `\begingroup`/`\endgroup`) are rolled back
//! when the group ends, unless the assignment was made `\global`.
//! In Texel all scoped data lives in the [Context]: the command table,
//! the register families (counts, dimens, glues, mu glues and token
//! lists) and the category codes.
//!
//! The context is a stack of [groups](GroupType). The bottom group is
//! created when the VM starts and is never popped. Reads walk the stack
//! from the top down and return the first value found, falling back to
//! the family's default value. Local writes go to the top group only, so
//! popping the group is all that is needed to restore the previous
//! values. Global writes store the value into every group on the stack,
//! which both makes the value visible immediately and destroys any
//! shadowed values that a group end would otherwise restore.

use crate::command;
use crate::token;
use crate::token::lexer;
use crate::types;
use crate::variable::RegisterKey;
use std::collections::HashMap;
use std::collections::HashSet;
use std::rc::Rc;

/// Scope of an assignment.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Scope {
    /// The assignment is rolled back when the current group ends.
    #[default]
    Local,
    /// The assignment survives the end of every currently open group.
    Global,
}

/// The kind of group, following the numbering that `\currentgrouptype`
/// reports in e-TeX.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GroupType {
    /// The outermost scope, which is not started by any token.
    Bottom,
    /// A group started by a begin group token, usually `{`.
    Simple,
    /// A group started by `\begingroup`.
    SemiSimple,
}

impl GroupType {
    /// The stable integer code for this group type.
    pub fn to_i32(self) -> i32 {
        match self {
            GroupType::Bottom => 0,
            GroupType::Simple => 1,
            GroupType::SemiSimple => 14,
        }
    }
}

impl std::fmt::Display for GroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupType::Bottom => write!(f, "the outermost scope"),
            GroupType::Simple => write!(f, "a simple group"),
            GroupType::SemiSimple => write!(f, "a semi simple group"),
        }
    }
}

struct Group<S> {
    group_type: GroupType,
    /// The token that opened the group, for error messages.
    start_token: Option<token::Token>,
    commands: HashMap<token::CommandRef, command::Command<S>>,
    counts: HashMap<RegisterKey, i32>,
    dimens: HashMap<RegisterKey, types::Scaled>,
    glues: HashMap<RegisterKey, types::Glue>,
    mu_glues: HashMap<RegisterKey, types::Glue>,
    toks: HashMap<RegisterKey, Rc<Vec<token::Token>>>,
    cat_codes: HashMap<char, types::CatCode>,
    /// Tokens registered with `\aftergroup`, to be pushed to the input
    /// when this group ends.
    after_group: Vec<token::Token>,
}

impl<S> Group<S> {
    fn new(group_type: GroupType, start_token: Option<token::Token>) -> Self {
        Self {
            group_type,
            start_token,
            commands: Default::default(),
            counts: Default::default(),
            dimens: Default::default(),
            glues: Default::default(),
            mu_glues: Default::default(),
            toks: Default::default(),
            cat_codes: Default::default(),
            after_group: Default::default(),
        }
    }
}

/// The scoped context store.
///
/// See the module documentation for how scoping works.
pub struct Context<S> {
    groups: Vec<Group<S>>,
}

impl<S> Default for Context<S> {
    fn default() -> Self {
        Self {
            groups: vec![Group::new(GroupType::Bottom, None)],
        }
    }
}

/// Data returned when a group ends.
pub struct EndedGroup {
    pub group_type: GroupType,
    /// Tokens registered with `\aftergroup`, in registration order.
    pub after_group: Vec<token::Token>,
}

impl<S> Context<S> {
    /// Open a new group.
    pub fn begin_group(&mut self, group_type: GroupType, start_token: Option<token::Token>) {
        self.groups.push(Group::new(group_type, start_token));
    }

    /// Close the current group, rolling back all local assignments made
    /// inside it. Returns [None] if only the bottom group remains.
    pub fn end_group(&mut self) -> Option<EndedGroup> {
        if self.groups.len() <= 1 {
            return None;
        }
        let group = self.groups.pop().unwrap();
        Some(EndedGroup {
            group_type: group.group_type,
            after_group: group.after_group,
        })
    }

    /// Number of groups that are open, excluding the bottom group.
    /// This is the value reported by `\currentgrouplevel`.
    pub fn group_level(&self) -> usize {
        self.groups.len() - 1
    }

    /// The type of the current group.
    pub fn group_type(&self) -> GroupType {
        self.current().group_type
    }

    /// The token that opened the current group, if any.
    pub fn group_start_token(&self) -> Option<token::Token> {
        self.current().start_token
    }

    /// Register a token to be pushed to the input when the current group
    /// ends. Tokens registered in the bottom group are never replayed.
    pub fn add_after_group_token(&mut self, token: token::Token) {
        self.groups.last_mut().unwrap().after_group.push(token);
    }

    /// Get the command the provided reference currently resolves to.
    pub fn command(&self, command_ref: &token::CommandRef) -> Option<&command::Command<S>> {
        self.groups
            .iter()
            .rev()
            .find_map(|group| group.commands.get(command_ref))
    }

    /// Assign a command to the provided reference.
    pub fn set_command<C: Into<command::Command<S>>>(
        &mut self,
        command_ref: token::CommandRef,
        command: C,
        scope: Scope,
    ) {
        let command = command.into();
        match scope {
            Scope::Local => {
                self.current_mut().commands.insert(command_ref, command);
            }
            Scope::Global => {
                for group in &mut self.groups {
                    group.commands.insert(command_ref, command.clone());
                }
            }
        }
    }

    /// Iterate over all command references that are currently visible or
    /// shadowed in some group.
    pub fn command_refs(&self) -> impl Iterator<Item = token::CommandRef> + '_ {
        let set: HashSet<token::CommandRef> = self
            .groups
            .iter()
            .flat_map(|group| group.commands.keys())
            .copied()
            .collect();
        set.into_iter()
    }

    pub fn count(&self, key: RegisterKey) -> i32 {
        self.read(key, |group| &group.counts).copied().unwrap_or(0)
    }

    pub fn set_count(&mut self, key: RegisterKey, value: i32, scope: Scope) {
        self.write(key, value, scope, |group| &mut group.counts)
    }

    pub fn dimen(&self, key: RegisterKey) -> types::Scaled {
        self.read(key, |group| &group.dimens)
            .copied()
            .unwrap_or(types::Scaled::ZERO)
    }

    pub fn set_dimen(&mut self, key: RegisterKey, value: types::Scaled, scope: Scope) {
        self.write(key, value, scope, |group| &mut group.dimens)
    }

    pub fn glue(&self, key: RegisterKey) -> types::Glue {
        self.read(key, |group| &group.glues)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_glue(&mut self, key: RegisterKey, value: types::Glue, scope: Scope) {
        self.write(key, value, scope, |group| &mut group.glues)
    }

    pub fn mu_glue(&self, key: RegisterKey) -> types::Glue {
        self.read(key, |group| &group.mu_glues)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_mu_glue(&mut self, key: RegisterKey, value: types::Glue, scope: Scope) {
        self.write(key, value, scope, |group| &mut group.mu_glues)
    }

    pub fn toks(&self, key: RegisterKey) -> Rc<Vec<token::Token>> {
        self.read(key, |group| &group.toks)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_toks(&mut self, key: RegisterKey, value: Rc<Vec<token::Token>>, scope: Scope) {
        self.write(key, value, scope, |group| &mut group.toks)
    }

    /// The category code of the provided character.
    ///
    /// Characters whose category code has never been assigned fall back to
    /// plain TeX's defaults.
    pub fn cat_code(&self, c: char) -> types::CatCode {
        self.groups
            .iter()
            .rev()
            .find_map(|group| group.cat_codes.get(&c))
            .copied()
            .unwrap_or_else(|| types::CatCode::plain_tex_default(c))
    }

    /// The category code register with the provided key. Keys that do not
    /// denote a valid character code read as [types::CatCode::Other].
    pub fn cat_code_register(&self, key: RegisterKey) -> types::CatCode {
        match key {
            RegisterKey::Index(index) => match u32::try_from(index).ok().and_then(char::from_u32) {
                Some(c) => self.cat_code(c),
                None => types::CatCode::Other,
            },
            RegisterKey::Named(_) => types::CatCode::Other,
        }
    }

    pub fn set_cat_code(&mut self, c: char, value: types::CatCode, scope: Scope) {
        self.write(c, value, scope, |group| &mut group.cat_codes)
    }

    /// The character appended to each piece of source code that does not
    /// end in a newline, per the `\endlinechar` parameter.
    ///
    /// Returns [None] if the parameter holds an invalid character code, in
    /// which case no character is appended.
    pub fn end_line_char(&self) -> Option<char> {
        match self.read(RegisterKey::Named("endlinechar"), |group| &group.counts) {
            None => Some('\r'),
            Some(&value) => u32::try_from(value).ok().and_then(char::from_u32),
        }
    }

    fn current(&self) -> &Group<S> {
        self.groups.last().unwrap()
    }

    fn current_mut(&mut self) -> &mut Group<S> {
        self.groups.last_mut().unwrap()
    }

    fn read<'a, K, V, F>(&'a self, key: K, table: F) -> Option<&'a V>
    where
        K: Eq + std::hash::Hash + 'a,
        F: Fn(&'a Group<S>) -> &'a HashMap<K, V>,
    {
        self.groups.iter().rev().find_map(|group| table(group).get(&key))
    }

    fn write<K, V, F>(&mut self, key: K, value: V, scope: Scope, table: F)
    where
        K: Eq + std::hash::Hash + Copy,
        V: Clone,
        F: Fn(&mut Group<S>) -> &mut HashMap<K, V>,
    {
        match scope {
            Scope::Local => {
                table(self.current_mut()).insert(key, value);
            }
            Scope::Global => {
                for group in &mut self.groups {
                    table(group).insert(key, value.clone());
                }
            }
        }
    }
}

// The lexer reads category codes from the context.
impl<S> lexer::CatCodeFn for Context<S> {
    fn cat_code(&self, c: char) -> types::CatCode {
        Context::cat_code(self, c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestContext = Context<()>;

    const KEY: RegisterKey = RegisterKey::Index(0);

    #[test]
    fn local_assignment_rolled_back() {
        let mut context = TestContext::default();
        context.set_count(KEY, 1, Scope::Local);
        context.begin_group(GroupType::Simple, None);
        context.set_count(KEY, 2, Scope::Local);
        assert_eq!(context.count(KEY), 2);
        context.end_group().unwrap();
        assert_eq!(context.count(KEY), 1);
    }

    #[test]
    fn global_assignment_survives_group_end() {
        let mut context = TestContext::default();
        context.set_count(KEY, 1, Scope::Local);
        context.begin_group(GroupType::Simple, None);
        context.begin_group(GroupType::SemiSimple, None);
        context.set_count(KEY, 2, Scope::Global);
        assert_eq!(context.count(KEY), 2);
        context.end_group().unwrap();
        context.end_group().unwrap();
        assert_eq!(context.count(KEY), 2);
    }

    #[test]
    fn unset_registers_have_default_values() {
        let context = TestContext::default();
        assert_eq!(context.count(KEY), 0);
        assert_eq!(context.dimen(KEY), types::Scaled::ZERO);
        assert_eq!(context.glue(KEY), types::Glue::default());
        assert!(context.toks(KEY).is_empty());
    }

    #[test]
    fn named_and_indexed_keys_are_distinct() {
        let mut context = TestContext::default();
        context.set_count(RegisterKey::Named("tracingmacros"), 1, Scope::Local);
        assert_eq!(context.count(RegisterKey::Named("tracingmacros")), 1);
        assert_eq!(context.count(KEY), 0);
    }

    #[test]
    fn bottom_group_cannot_be_ended() {
        let mut context = TestContext::default();
        assert!(context.end_group().is_none());
        context.begin_group(GroupType::Simple, None);
        assert!(context.end_group().is_some());
        assert!(context.end_group().is_none());
    }

    #[test]
    fn group_introspection() {
        let mut context = TestContext::default();
        assert_eq!(context.group_level(), 0);
        assert_eq!(context.group_type(), GroupType::Bottom);
        context.begin_group(GroupType::SemiSimple, None);
        assert_eq!(context.group_level(), 1);
        assert_eq!(context.group_type(), GroupType::SemiSimple);
    }

    #[test]
    fn after_group_tokens_returned_in_order() {
        let mut context = TestContext::default();
        context.begin_group(GroupType::Simple, None);
        let a = token::Token::new_letter('a', crate::token::trace::Key::dummy());
        let b = token::Token::new_letter('b', crate::token::trace::Key::dummy());
        context.add_after_group_token(a);
        context.add_after_group_token(b);
        let ended = context.end_group().unwrap();
        assert_eq!(ended.after_group, vec![a, b]);
    }

    #[test]
    fn cat_code_defaults_and_overrides() {
        let mut context = TestContext::default();
        assert_eq!(context.cat_code('a'), types::CatCode::Letter);
        context.begin_group(GroupType::Simple, None);
        context.set_cat_code('a', types::CatCode::Other, Scope::Local);
        assert_eq!(context.cat_code('a'), types::CatCode::Other);
        context.end_group().unwrap();
        assert_eq!(context.cat_code('a'), types::CatCode::Letter);
    }

    #[test]
    fn end_line_char_defaults_to_carriage_return() {
        let mut context = TestContext::default();
        assert_eq!(context.end_line_char(), Some('\r'));
        context.set_count(RegisterKey::Named("endlinechar"), '\n' as i32, Scope::Local);
        assert_eq!(context.end_line_char(), Some('\n'));
        context.set_count(RegisterKey::Named("endlinechar"), -1, Scope::Local);
        assert_eq!(context.end_line_char(), None);
    }
}
