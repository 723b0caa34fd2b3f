//! The generation engine.
//!
//! [`Generator`] expands a [`Grammar`] into a derivation [`Tree`] and its text.
//! Every choice comes from the [`Choices`] passed to the call, replacements are
//! consulted before any production is expanded, and the optional [`Limits`]
//! stop runaway grammars with an error instead of letting them run forever.
//!
//! A generator holds no per-call state, so one instance can serve many calls,
//! including concurrent calls from different threads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::choices::{Choices, Decision, RandomConfig, RepetitionSite};
use crate::grammar::{Grammar, Rule};
use crate::node::{NodeId, NodeKind, Tree};
use crate::replacement::{Expand, ProductionReplacement, ReplacementContext, Replacements};
use crate::trace::{NoopTracer, Tracer};
use crate::utils::{GrammarError, OptionExt, Result};

/// Safety cutoffs for a single generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum nesting of non-terminals
    pub max_depth: Option<usize>,
    /// Maximum number of code points emitted
    pub max_output: Option<usize>,
}

/// Configuration for generation runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub limits: Limits,
    pub random: RandomConfig,
}

impl GeneratorConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GeneratorConfig = serde_json::from_str(json)?;
        config.random.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Generates text and derivation trees from a grammar
#[derive(Debug, Clone)]
pub struct Generator {
    grammar: Arc<Grammar>,
    replacements: Replacements,
    limits: Limits,
}

impl Generator {
    /// A generator without replacements or limits
    pub fn new(grammar: impl Into<Arc<Grammar>>) -> Self {
        Generator {
            grammar: grammar.into(),
            replacements: Replacements::new(),
            limits: Limits::default(),
        }
    }

    /// A generator with replacements.
    ///
    /// Fails with `DuplicateReplacement` if two bindings share a target, and
    /// with `UndefinedProduction` if a binding names a production the grammar
    /// does not have.
    pub fn with_replacements(
        grammar: impl Into<Arc<Grammar>>,
        replacements: impl IntoIterator<Item = ProductionReplacement>,
    ) -> Result<Self> {
        let grammar = grammar.into();
        let replacements = Replacements::from_bindings(replacements)?;
        if let Some(name) = replacements
            .names()
            .into_iter()
            .find(|name| !grammar.has_production(name))
        {
            return Err(GrammarError::UndefinedProduction(name.to_string()));
        }
        Ok(Generator {
            grammar,
            replacements,
            limits: Limits::default(),
        })
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn replacements(&self) -> &Replacements {
        &self.replacements
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Generate from the start production and write the text to `out`.
    ///
    /// Nothing is written unless generation succeeds. Returns the number of
    /// code points written.
    pub fn generate<W: fmt::Write + ?Sized>(
        &self,
        choices: &mut dyn Choices,
        out: &mut W,
    ) -> Result<usize> {
        let (_, text, written) = self.run(self.grammar.start(), choices, &mut NoopTracer)?;
        out.write_str(&text)?;
        Ok(written)
    }

    /// Generate from the start production into a new string
    pub fn generate_string(&self, choices: &mut dyn Choices) -> Result<String> {
        let (_, text, _) = self.run(self.grammar.start(), choices, &mut NoopTracer)?;
        Ok(text)
    }

    /// Write generated text to an I/O stream, for example a file or stdout
    pub fn generate_to_writer<W: io::Write>(
        &self,
        choices: &mut dyn Choices,
        out: &mut W,
    ) -> Result<usize> {
        let (_, text, written) = self.run(self.grammar.start(), choices, &mut NoopTracer)?;
        out.write_all(text.as_bytes())?;
        Ok(written)
    }

    /// Build the derivation tree for the production called `start`
    pub fn generate_tree(&self, start: &str, choices: &mut dyn Choices) -> Result<Tree> {
        self.generate_tree_traced(start, choices, &mut NoopTracer)
    }

    /// Build the derivation tree for `start`, reporting progress to `tracer`
    pub fn generate_tree_traced(
        &self,
        start: &str,
        choices: &mut dyn Choices,
        tracer: &mut dyn Tracer,
    ) -> Result<Tree> {
        let (tree, _, _) = self.run(start, choices, tracer)?;
        Ok(tree)
    }

    fn run(
        &self,
        start: &str,
        choices: &mut dyn Choices,
        tracer: &mut dyn Tracer,
    ) -> Result<(Tree, String, usize)> {
        let mut expansion = Expansion {
            grammar: &self.grammar,
            replacements: &self.replacements,
            limits: self.limits,
            choices,
            tracer,
            tree: Tree::new(),
            text: String::new(),
            written: 0,
            depth: 0,
            sites: 0,
        };
        expansion.non_terminal(start, None)?;
        Ok((expansion.tree, expansion.text, expansion.written))
    }
}

/// State of one generation run
struct Expansion<'g, 'c, 't> {
    grammar: &'g Grammar,
    replacements: &'g Replacements,
    limits: Limits,
    choices: &'c mut dyn Choices,
    tracer: &'t mut dyn Tracer,
    tree: Tree,
    text: String,
    /// Code points emitted so far
    written: usize,
    /// Non-terminals currently open
    depth: usize,
    /// Repetition sites reached so far
    sites: usize,
}

impl<'g> Expansion<'g, '_, '_> {
    fn non_terminal(&mut self, name: &str, parent: Option<NodeId>) -> Result<()> {
        let grammar = self.grammar;
        let replacements = self.replacements;
        let production = grammar.production(name).ok_or_undefined(name)?;

        if let Some(limit) = self.limits.max_depth {
            if self.depth >= limit {
                return Err(GrammarError::GenerationTooDeep { limit });
            }
        }

        let replacement = replacements.lookup(name);
        let node = self.tree.push(
            NodeKind::NonTerminal {
                name: production.name.clone(),
                replaced: replacement.is_some(),
            },
            parent,
        )?;

        self.depth += 1;
        self.tracer.enter(name, self.depth);
        let result = match replacement {
            Some(replacement) => {
                self.tracer.replaced(name, self.depth);
                replacement(&mut ReplacementContext::new(self, node))
            }
            None => self.expand(&production.rule, node),
        };
        self.tracer.exit(name, self.depth);
        self.depth -= 1;
        result
    }

    fn expand(&mut self, rule: &'g Rule, parent: NodeId) -> Result<()> {
        match rule {
            Rule::Literal(text) => self.literal(parent, text),
            Rule::Sequence(rules) => {
                let node = self.tree.push(NodeKind::Sequence, Some(parent))?;
                rules.iter().try_for_each(|rule| self.expand(rule, node))
            }
            Rule::Alternative(branches) => {
                let chosen = self.choices.alternative(branches.len())?;
                self.tracer.decision(Decision::Alternative(chosen), self.depth);
                let branch = branches.get(chosen).ok_or_invalid_decision(|| {
                    format!(
                        "alternative {} picked from {} branches",
                        chosen,
                        branches.len()
                    )
                })?;
                let node = self.tree.push(
                    NodeKind::Alternative {
                        chosen,
                        branches: branches.len(),
                    },
                    Some(parent),
                )?;
                self.expand(branch, node)
            }
            Rule::Optional(inner) => {
                let present = self.choices.include_optional()?;
                self.tracer.decision(Decision::Optional(present), self.depth);
                let node = self.tree.push(NodeKind::Optional { present }, Some(parent))?;
                if present {
                    self.expand(inner, node)?;
                }
                Ok(())
            }
            Rule::Repetition { rule, min, max } => {
                let site = self.sites;
                self.sites += 1;
                let count = self.choices.repetition(*min, *max, RepetitionSite(site))?;
                self.tracer.decision(Decision::Repetition(count), self.depth);
                if count < *min || max.is_some_and(|max| count > max) {
                    return Err(GrammarError::InvalidDecision(format!(
                        "repetition count {} outside {}..={}",
                        count,
                        min,
                        max.map_or_else(|| "unbounded".to_string(), |max| max.to_string())
                    )));
                }
                let node = self
                    .tree
                    .push(NodeKind::Repetition { site, count }, Some(parent))?;
                (0..count).try_for_each(|_| self.expand(rule, node))
            }
            Rule::NonTerminal(name) => self.non_terminal(name, Some(parent)),
            Rule::CharacterSet(name) => {
                let grammar = self.grammar;
                let class = grammar
                    .character_class(name)
                    .ok_or_else(|| GrammarError::UnknownCharacterClass(name.clone()))?;
                let codepoint = self.choices.codepoint(class)?;
                self.tracer.decision(Decision::Codepoint(codepoint), self.depth);
                if !class.contains(codepoint) {
                    return Err(GrammarError::InvalidDecision(format!(
                        "code point U+{:04X} is not in character class {}",
                        codepoint as u32, name
                    )));
                }
                self.reserve(1)?;
                self.tree.push(
                    NodeKind::Character {
                        class: name.clone(),
                        codepoint,
                    },
                    Some(parent),
                )?;
                self.text.push(codepoint);
                self.tracer.emit(codepoint.encode_utf8(&mut [0; 4]), self.depth);
                Ok(())
            }
        }
    }

    fn literal(&mut self, parent: NodeId, text: &str) -> Result<()> {
        self.reserve(text.chars().count())?;
        self.tree
            .push(NodeKind::Literal(text.to_string()), Some(parent))?;
        self.text.push_str(text);
        self.tracer.emit(text, self.depth);
        Ok(())
    }

    /// Account for `codepoints` more output, failing past the output limit
    fn reserve(&mut self, codepoints: usize) -> Result<()> {
        let written = self.written + codepoints;
        if let Some(limit) = self.limits.max_output {
            if written > limit {
                return Err(GrammarError::GenerationTooLarge { limit });
            }
        }
        self.written = written;
        Ok(())
    }
}

impl Expand for Expansion<'_, '_, '_> {
    fn tree(&self) -> &Tree {
        &self.tree
    }

    fn emit(&mut self, parent: NodeId, text: &str) -> Result<()> {
        self.literal(parent, text)
    }

    fn expand_default(&mut self, node: NodeId) -> Result<()> {
        let grammar = self.grammar;
        let name = self.tree.node(node).name().unwrap_or_default();
        let production = grammar.production(name).ok_or_undefined(name)?;
        self.expand(&production.rule, node)
    }
}
