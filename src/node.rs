//! Derivation trees.
//!
//! A [`Tree`] records every rule application made while generating one output.
//! Nodes live in a contiguous arena and refer to each other by [`NodeId`]:
//! children are owned by position in the arena, and the parent link is an id
//! used only for lookups. A tree is built once by the generator and never
//! changes afterwards.

use std::fmt::{self, Write};

use crate::utils::{GrammarError, Result};

/// Index of a node in its [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The id of the node at arena position `index`. Fails once a tree
    /// outgrows the id space.
    pub(crate) fn from_index(index: usize) -> Result<Self> {
        u32::try_from(index)
            .map(NodeId)
            .map_err(|_| GrammarError::GenerationTooLarge {
                limit: u32::MAX as usize,
            })
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node records about its rule application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Emitted text with no children
    Literal(String),
    /// Children in declared order
    Sequence,
    /// Only the chosen branch is present, as the single child
    Alternative { chosen: usize, branches: usize },
    /// At most one child, present when `present` is true
    Optional { present: bool },
    /// `count` children, one per expansion
    Repetition { site: usize, count: usize },
    /// The expansion of a production.
    ///
    /// A default expansion has exactly one child, the production body. A
    /// replaced production holds whatever its replacement produced.
    NonTerminal { name: String, replaced: bool },
    /// One code point picked from a character class
    Character { class: String, codepoint: char },
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A derivation tree stored in an arena. The first node is the root.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<NodeData>,
}

impl Tree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a node, linking it as the last child of `parent`
    pub(crate) fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> Result<NodeId> {
        let id = NodeId::from_index(self.nodes.len())?;
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        Ok(id)
    }

    /// The root node. Panics on an empty tree, which the generator never returns.
    pub fn root(&self) -> NodeRef<'_> {
        self.node(NodeId(0))
    }

    /// The node with `id`. Panics if `id` belongs to another tree; use
    /// [`get`](Tree::get) for ids of unknown origin.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id.index() < self.nodes.len(), "node {:?} out of range", id);
        NodeRef { tree: self, id }
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.index() < self.nodes.len()).then_some(NodeRef { tree: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in creation order, which is depth-first pre-order
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.nodes.len())
            .map_while(|i| NodeId::from_index(i).ok())
            .map(move |id| NodeRef { tree: self, id })
    }

    /// The generated text: all leaf text, depth first and left to right
    pub fn text(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        self.root().text()
    }

    /// Write the generated text to `out`
    pub fn write_text<W: Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        self.root().write_text(out)
    }

    /// The structure of the tree as a single-line s-expression.
    ///
    /// Use `{:#}` on the tree for the indented form.
    pub fn s_expression(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let pretty = f.alternate();
        self.root().write_structure(f, pretty, 0)
    }
}

/// A borrowed view of one node
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id.index()]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &'t NodeKind {
        &self.data().kind
    }

    /// The production name, for non-terminal nodes
    pub fn name(&self) -> Option<&'t str> {
        match self.kind() {
            NodeKind::NonTerminal { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The nearest enclosing non-terminal node.
    ///
    /// Structural nodes in between (sequences, alternatives and so on) are
    /// skipped, so inside `alpha ::= symbol` the parent of `symbol` is `alpha`.
    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.ancestors().find(|node| node.name().is_some())
    }

    /// The direct parent in the tree, structural nodes included
    pub fn parent_node(&self) -> Option<NodeRef<'t>> {
        self.data().parent.map(|id| NodeRef {
            tree: self.tree,
            id,
        })
    }

    /// All nodes above this one, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        std::iter::successors(self.parent_node(), |node| node.parent_node())
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    /// Number of non-terminal ancestors
    pub fn depth(&self) -> usize {
        self.ancestors().filter(|node| node.name().is_some()).count()
    }

    /// The text generated beneath this node
    pub fn text(&self) -> String {
        let mut text = String::new();
        // Writing into a String cannot fail
        let _ = self.write_text(&mut text);
        text
    }

    pub fn write_text<W: Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        match self.kind() {
            NodeKind::Literal(text) => out.write_str(text),
            NodeKind::Character { codepoint, .. } => out.write_char(*codepoint),
            _ => self.children().try_for_each(|child| child.write_text(out)),
        }
    }

    fn write_structure(&self, f: &mut fmt::Formatter<'_>, pretty: bool, indent: usize) -> fmt::Result {
        match self.kind() {
            NodeKind::Literal(text) => return write!(f, "{:?}", text),
            NodeKind::Sequence => write!(f, "(seq")?,
            NodeKind::Alternative { chosen, branches } => {
                write!(f, "(alt {}/{}", chosen, branches)?
            }
            NodeKind::Optional { present } => {
                write!(f, "(opt")?;
                if !present {
                    return write!(f, ")");
                }
            }
            NodeKind::Repetition { site, count } => write!(f, "(rep #{} x{}", site, count)?,
            NodeKind::NonTerminal { name, replaced } => {
                write!(f, "({}", name)?;
                if *replaced {
                    write!(f, "!")?;
                }
            }
            NodeKind::Character { class, codepoint } => {
                return write!(f, "(${} {:?})", class, codepoint);
            }
        }

        for child in self.children() {
            if pretty {
                writeln!(f)?;
                write!(f, "{:width$}", "", width = (indent + 1) * 2)?;
            } else {
                write!(f, " ")?;
            }
            child.write_structure(f, pretty, indent + 1)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", self.kind())
            .field("children", &self.child_count())
            .finish()
    }
}
