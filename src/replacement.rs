//! Production replacements.
//!
//! A replacement is a callback that runs instead of the default expansion of
//! a production. It receives a [`ReplacementContext`] through which it can look
//! at the node being built and its ancestors, write text, or fall back to the
//! default expansion. A replacement that does neither produces no output for
//! that production.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::node::{NodeId, NodeRef, Tree};
use crate::utils::{GrammarError, Result};

/// A replacement callback
pub type Replacement = Arc<dyn Fn(&mut ReplacementContext<'_>) -> Result<()> + Send + Sync>;

/// Name reported for the fallback binding in `DuplicateReplacement`
pub const FALLBACK: &str = "*";

/// What a replacement applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// One production, by name
    Production(String),
    /// Every production without its own binding
    Fallback,
}

/// A replacement bound to its target
#[derive(Clone)]
pub struct ProductionReplacement {
    target: Target,
    callback: Replacement,
}

impl ProductionReplacement {
    /// Replace the production called `production`
    pub fn new<F>(production: &str, callback: F) -> Self
    where
        F: Fn(&mut ReplacementContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        ProductionReplacement {
            target: Target::Production(production.to_string()),
            callback: Arc::new(callback),
        }
    }

    /// Replace every production that has no binding of its own
    pub fn fallback<F>(callback: F) -> Self
    where
        F: Fn(&mut ReplacementContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        ProductionReplacement {
            target: Target::Fallback,
            callback: Arc::new(callback),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }
}

impl fmt::Debug for ProductionReplacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductionReplacement")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Registry of replacements keyed by production name
#[derive(Clone, Default)]
pub struct Replacements {
    bound: HashMap<String, Replacement>,
    fallback: Option<Replacement>,
}

impl Replacements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from bindings, rejecting duplicates
    pub fn from_bindings(bindings: impl IntoIterator<Item = ProductionReplacement>) -> Result<Self> {
        let mut replacements = Replacements::new();
        for replacement in bindings {
            replacements.register(replacement)?;
        }
        Ok(replacements)
    }

    /// Register a replacement. A second binding for the same target is an error.
    pub fn register(&mut self, replacement: ProductionReplacement) -> Result<&mut Self> {
        match replacement.target {
            Target::Production(name) => {
                if self.bound.contains_key(&name) {
                    return Err(GrammarError::DuplicateReplacement(name));
                }
                self.bound.insert(name, replacement.callback);
            }
            Target::Fallback => {
                if self.fallback.is_some() {
                    return Err(GrammarError::DuplicateReplacement(FALLBACK.to_string()));
                }
                self.fallback = Some(replacement.callback);
            }
        }
        Ok(self)
    }

    /// The replacement that applies to `production`, if any
    pub fn lookup(&self, production: &str) -> Option<&Replacement> {
        self.bound.get(production).or(self.fallback.as_ref())
    }

    /// Names with their own binding, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bound.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn len(&self) -> usize {
        self.bound.len() + usize::from(self.fallback.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Replacements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replacements")
            .field("bound", &self.names())
            .field("fallback", &self.has_fallback())
            .finish()
    }
}

/// The operations a replacement can ask of the running generator
pub(crate) trait Expand {
    fn tree(&self) -> &Tree;

    /// Emit `text` as a literal child of `parent`
    fn emit(&mut self, parent: NodeId, text: &str) -> Result<()>;

    /// Expand the body of the production at `node` into it
    fn expand_default(&mut self, node: NodeId) -> Result<()>;
}

/// Handed to a replacement while its production's node is being built
pub struct ReplacementContext<'a> {
    engine: &'a mut dyn Expand,
    node: NodeId,
}

impl<'a> ReplacementContext<'a> {
    pub(crate) fn new(engine: &'a mut dyn Expand, node: NodeId) -> Self {
        ReplacementContext { engine, node }
    }

    /// The node of the production being replaced.
    ///
    /// Its ancestors are complete enough to inspect; its own children are
    /// whatever has been written so far.
    pub fn node(&self) -> NodeRef<'_> {
        self.engine.tree().node(self.node)
    }

    /// Name of the production being replaced
    pub fn name(&self) -> &str {
        self.node().name().unwrap_or_default()
    }

    /// Write literal text as output of this production
    pub fn write(&mut self, text: &str) -> Result<()> {
        self.engine.emit(self.node, text)
    }

    /// Expand this production as if it had no replacement
    pub fn generate_default(&mut self) -> Result<()> {
        self.engine.expand_default(self.node)
    }
}

impl fmt::Debug for ReplacementContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplacementContext")
            .field("node", &self.node())
            .finish()
    }
}
