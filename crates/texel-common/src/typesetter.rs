//! The typesetter interface.
//!
//! The language interpreter does not lay out boxes itself.
//! Primitives like `\kern` and `\char` instead emit [nodes](Node) to an
//! implementation of the [Typesetter] trait, which owns the current
//! horizontal or vertical list and all layout decisions.

use texel::types::{Glue, Scaled};

/// A visual node emitted by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A single character to be typeset in the current font.
    Char(char),

    /// A fixed amount of blank space.
    Kern(Scaled),

    /// Stretchable and shrinkable space.
    Glue(Glue),

    /// A filled rectangle.
    Rule {
        width: Scaled,
        height: Scaled,
        depth: Scaled,
    },

    /// A penalty for breaking the current list at this point.
    Penalty(i32),

    /// A nested list of nodes.
    List(Vec<Node>),
}

/// The mode the typesetter is currently in.
///
/// TeX.2021.211.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// The main vertical list of the document.
    #[default]
    Vertical,
    /// A vertical list inside a box.
    InternalVertical,
    /// A horizontal list that will be broken into lines.
    Horizontal,
    /// A horizontal list inside a box, which is never broken.
    RestrictedHorizontal,
    /// A math formula inside a horizontal list.
    Math,
    /// A math formula on a line of its own.
    DisplayMath,
}

impl Mode {
    pub fn is_vertical(self) -> bool {
        matches!(self, Mode::Vertical | Mode::InternalVertical)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Mode::Horizontal | Mode::RestrictedHorizontal)
    }

    pub fn is_math(self) -> bool {
        matches!(self, Mode::Math | Mode::DisplayMath)
    }

    /// True in the internal variant of each mode, per `\ifinner`.
    pub fn is_inner(self) -> bool {
        matches!(
            self,
            Mode::InternalVertical | Mode::RestrictedHorizontal | Mode::Math
        )
    }
}

/// Implementations of this trait consume the nodes built by the interpreter.
pub trait Typesetter {
    /// Append a node to the current list.
    fn add(&mut self, node: Node);

    /// The current mode.
    fn mode(&self) -> Mode;

    /// A reference to the last node of the current list, if the list is
    /// non-empty.
    fn last_node(&self) -> Option<&Node>;

    /// Remove and return the last node of the current list.
    ///
    /// This powers primitives like `\unkern` that retract material that
    /// has already been contributed.
    fn remove_last_node(&mut self) -> Option<Node>;
}

/// A typesetter that discards all nodes.
///
/// This is the default typesetter in contexts that only use the
/// macro-language part of the interpreter.
#[derive(Debug, Default)]
pub struct NullTypesetter;

impl Typesetter for NullTypesetter {
    fn add(&mut self, _: Node) {}
    fn mode(&self) -> Mode {
        Mode::Vertical
    }
    fn last_node(&self) -> Option<&Node> {
        None
    }
    fn remove_last_node(&mut self) -> Option<Node> {
        None
    }
}

/// A typesetter that records all nodes in a flat list.
///
/// This is designed for unit testing primitives that emit nodes.
#[derive(Debug, Default)]
pub struct ListTypesetter {
    mode: Mode,
    nodes: Vec<Node>,
}

impl ListTypesetter {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            nodes: Default::default(),
        }
    }

    /// All nodes added so far.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

impl Typesetter for ListTypesetter {
    fn add(&mut self, node: Node) {
        self.nodes.push(node);
    }
    fn mode(&self) -> Mode {
        self.mode
    }
    fn last_node(&self) -> Option<&Node> {
        self.nodes.last()
    }
    fn remove_last_node(&mut self) -> Option<Node> {
        self.nodes.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_typesetter_records_nodes() {
        let mut typesetter = ListTypesetter::new(Mode::Horizontal);
        typesetter.add(Node::Char('a'));
        typesetter.add(Node::Kern(Scaled::ONE));
        assert_eq!(typesetter.mode(), Mode::Horizontal);
        assert_eq!(typesetter.last_node(), Some(&Node::Kern(Scaled::ONE)));
        assert_eq!(typesetter.remove_last_node(), Some(Node::Kern(Scaled::ONE)));
        assert_eq!(typesetter.nodes(), &[Node::Char('a')]);
    }
}
