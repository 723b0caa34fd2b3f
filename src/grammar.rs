use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::charset::{CharacterClass, CharacterClasses};
use crate::utils::{GrammarError, Result};

/// A rule expression in the grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Literal text, emitted verbatim
    Literal(String),
    /// Rules expanded in order
    Sequence(Vec<Rule>),
    /// Exactly one of the branches is expanded
    Alternative(Vec<Rule>),
    /// The inner rule is expanded zero or one times
    Optional(Box<Rule>),
    /// The inner rule is expanded between `min` and `max` times (`None` is unbounded)
    Repetition {
        rule: Box<Rule>,
        min: usize,
        max: Option<usize>,
    },
    /// Reference to another production
    NonTerminal(String),
    /// One code point picked from a named character class
    CharacterSet(String),
}

/// Literal text
pub fn literal(text: &str) -> Rule {
    Rule::Literal(text.to_string())
}

/// Rules expanded one after another
pub fn sequence(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Sequence(rules.into_iter().collect())
}

/// A choice between rules
pub fn alternatives(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Alternative(rules.into_iter().collect())
}

/// Reference to the production called `name`
pub fn non_terminal(name: &str) -> Rule {
    Rule::NonTerminal(name.to_string())
}

pub fn optional(rule: Rule) -> Rule {
    Rule::Optional(Box::new(rule))
}

pub fn zero_or_more(rule: Rule) -> Rule {
    repeat_at_least(0, rule)
}

pub fn one_or_more(rule: Rule) -> Rule {
    repeat_at_least(1, rule)
}

/// Between `min` and `max` repetitions, inclusive
pub fn repeat(min: usize, max: usize, rule: Rule) -> Rule {
    Rule::Repetition {
        rule: Box::new(rule),
        min,
        max: Some(max),
    }
}

/// At least `min` repetitions with no upper bound
pub fn repeat_at_least(min: usize, rule: Rule) -> Rule {
    Rule::Repetition {
        rule: Box::new(rule),
        min,
        max: None,
    }
}

/// One code point from the character class called `name`
pub fn characters_of_set(name: &str) -> Rule {
    Rule::CharacterSet(name.to_string())
}

impl Rule {
    /// Visit this rule and every rule nested inside it, depth first
    pub fn walk<'r>(&'r self, visit: &mut impl FnMut(&'r Rule)) {
        visit(self);
        match self {
            Rule::Sequence(rules) | Rule::Alternative(rules) => {
                for rule in rules {
                    rule.walk(visit);
                }
            }
            Rule::Optional(rule) | Rule::Repetition { rule, .. } => rule.walk(visit),
            Rule::Literal(_) | Rule::NonTerminal(_) | Rule::CharacterSet(_) => {}
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
        match self {
            Rule::Literal(text) => write!(f, "{:?}", text),
            Rule::Sequence(rules) if rules.is_empty() => write!(f, "\"\""),
            Rule::Sequence(rules) => {
                if nested && rules.len() > 1 {
                    write!(f, "(")?;
                }
                for (i, rule) in rules.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    rule.fmt_nested(f, true)?;
                }
                if nested && rules.len() > 1 {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Rule::Alternative(rules) => {
                if nested {
                    write!(f, "(")?;
                }
                for (i, rule) in rules.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    rule.fmt_nested(f, true)?;
                }
                if nested {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Rule::Optional(rule) => {
                write!(f, "(")?;
                rule.fmt_nested(f, false)?;
                write!(f, ")?")
            }
            Rule::Repetition { rule, min, max } => {
                write!(f, "(")?;
                rule.fmt_nested(f, false)?;
                match (min, max) {
                    (0, None) => write!(f, ")*"),
                    (1, None) => write!(f, ")+"),
                    (min, None) => write!(f, "){{{},}}", min),
                    (min, Some(max)) => write!(f, "){{{},{}}}", min, max),
                }
            }
            Rule::NonTerminal(name) => write!(f, "{}", name),
            Rule::CharacterSet(name) => write!(f, "${}", name),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, false)
    }
}

/// A named production rule in the grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    /// The name non-terminals use to refer to this production
    pub name: String,
    /// The body expanded for this production
    pub rule: Rule,
}

/// An immutable, validated grammar.
///
/// Every non-terminal reference resolves to a production and every character
/// class reference resolves to a class; [`GrammarBuilder::build`] refuses to
/// produce a grammar otherwise.
#[derive(Debug, Clone)]
pub struct Grammar {
    name: String,
    start: String,
    productions: Vec<Production>,
    index: HashMap<String, usize>,
    classes: HashMap<String, Arc<CharacterClass>>,
}

impl Grammar {
    /// Start building a grammar whose start production is `name`
    pub fn builder(name: &str) -> GrammarBuilder {
        GrammarBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The designated start production
    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn production(&self, name: &str) -> Option<&Production> {
        self.index.get(name).map(|&i| &self.productions[i])
    }

    pub fn has_production(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Productions in the order they were first declared
    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.productions.iter()
    }

    /// A character class referenced by this grammar
    pub fn character_class(&self, name: &str) -> Option<&Arc<CharacterClass>> {
        self.classes.get(name)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for production in &self.productions {
            writeln!(f, "{} ::= {} ;", production.name, production.rule)?;
        }
        Ok(())
    }
}

/// Builder for constructing Grammar instances
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    name: String,
    start: String,
    productions: Vec<(String, Vec<Rule>)>,
    classes: CharacterClasses,
}

impl GrammarBuilder {
    /// Create a builder for a grammar whose start production is `name`
    pub fn new(name: &str) -> Self {
        GrammarBuilder {
            name: name.to_string(),
            start: name.to_string(),
            productions: Vec::new(),
            classes: CharacterClasses::default(),
        }
    }

    /// Use a different start production
    pub fn start(mut self, production: &str) -> Self {
        self.start = production.to_string();
        self
    }

    /// Add a production.
    ///
    /// More than one rule makes the production an alternative over them.
    /// Adding the same name again appends further alternatives.
    pub fn production(mut self, name: &str, rules: impl IntoIterator<Item = Rule>) -> Self {
        let rules = rules.into_iter();
        match self.productions.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => existing.extend(rules),
            None => self.productions.push((name.to_string(), rules.collect())),
        }
        self
    }

    /// Register a character class visible only to this grammar.
    ///
    /// A local class shadows a standard class of the same name.
    pub fn character_class(mut self, name: &str, codepoints: impl IntoIterator<Item = char>) -> Self {
        self.classes.insert(CharacterClass::new(name, codepoints));
        self
    }

    /// Validate and freeze the grammar
    pub fn build(self) -> Result<Grammar> {
        let mut productions = Vec::with_capacity(self.productions.len());
        let mut index = HashMap::with_capacity(self.productions.len());

        for (name, mut rules) in self.productions {
            let rule = match rules.len() {
                0 => return Err(GrammarError::EmptyProduction(name)),
                1 => rules.remove(0),
                _ => Rule::Alternative(rules),
            };
            index.insert(name.clone(), productions.len());
            productions.push(Production { name, rule });
        }

        if !index.contains_key(&self.start) {
            return Err(GrammarError::UndefinedProduction(self.start));
        }

        let mut classes = HashMap::new();
        for production in &productions {
            let mut failure = None;
            production.rule.walk(&mut |rule| {
                if failure.is_some() {
                    return;
                }
                failure = match rule {
                    Rule::NonTerminal(name) if !index.contains_key(name) => {
                        Some(GrammarError::UndefinedProduction(name.clone()))
                    }
                    Rule::Alternative(branches) if branches.is_empty() => Some(
                        GrammarError::InvalidGrammar(format!(
                            "empty alternative in production {}",
                            production.name
                        )),
                    ),
                    Rule::Repetition {
                        min, max: Some(max), ..
                    } if min > max => Some(GrammarError::InvalidGrammar(format!(
                        "repetition in production {} has min {} greater than max {}",
                        production.name, min, max
                    ))),
                    Rule::CharacterSet(name) => {
                        Self::resolve_class(&self.classes, name, &mut classes).err()
                    }
                    _ => None,
                };
            });
            if let Some(err) = failure {
                return Err(err);
            }
        }

        Ok(Grammar {
            name: self.name,
            start: self.start,
            productions,
            index,
            classes,
        })
    }

    fn resolve_class(
        local: &CharacterClasses,
        name: &str,
        resolved: &mut HashMap<String, Arc<CharacterClass>>,
    ) -> Result<()> {
        if resolved.contains_key(name) {
            return Ok(());
        }
        let class = match local.get(name) {
            Some(class) => class,
            None => CharacterClasses::standard().lookup(name)?,
        };
        if class.is_empty() {
            return Err(GrammarError::InvalidGrammar(format!(
                "character class {} is empty",
                name
            )));
        }
        resolved.insert(name.to_string(), Arc::clone(class));
        Ok(())
    }
}
