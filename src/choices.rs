//! Decision sources.
//!
//! Every choice the generator makes goes through a [`Choices`] implementation:
//! which alternative to expand, how often to repeat, whether to include an
//! optional element and which code point to take from a character class.
//! [`RandomChoices`] answers with a seeded or entropy-backed RNG;
//! [`ScriptedChoices`] answers from a fixed script and never falls back to
//! randomness.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::charset::CharacterClass;
use crate::utils::{GrammarError, Result};

/// Identifies one repetition site within a single generation.
///
/// Sites are numbered from zero in the order the generator reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepetitionSite(pub usize);

impl fmt::Display for RepetitionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One answer given by a decision source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Alternative(usize),
    Optional(bool),
    Repetition(usize),
    Codepoint(char),
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Alternative(index) => write!(f, "alternative {}", index),
            Decision::Optional(true) => write!(f, "include optional"),
            Decision::Optional(false) => write!(f, "skip optional"),
            Decision::Repetition(count) => write!(f, "repeat {}", count),
            Decision::Codepoint(c) => write!(f, "codepoint U+{:04X}", *c as u32),
        }
    }
}

/// Supplies every nondeterministic choice made during generation.
///
/// The generator checks each answer: an alternative index must be below
/// `branches`, a repetition count must lie within `[min, max]` and a code point
/// must be a member of the class. Anything else fails the generation with
/// `InvalidDecision`.
pub trait Choices {
    /// Pick one of `branches` alternatives by index
    fn alternative(&mut self, branches: usize) -> Result<usize>;

    /// Pick how many times the repetition at `site` is expanded
    fn repetition(&mut self, min: usize, max: Option<usize>, site: RepetitionSite) -> Result<usize>;

    /// Decide whether an optional element is expanded
    fn include_optional(&mut self) -> Result<bool>;

    /// Pick one member of `class`
    fn codepoint(&mut self, class: &CharacterClass) -> Result<char>;
}

/// Tuning for [`RandomChoices`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomConfig {
    /// Probability that an optional element is included
    pub optional_probability: f64,
    /// Probability of the first repetition beyond the minimum
    pub repetition_continue: f64,
    /// Factor applied to the continuation probability after every extra repetition
    pub repetition_decay: f64,
    /// Seed for reproducible output; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for RandomConfig {
    fn default() -> Self {
        RandomConfig {
            optional_probability: 0.5,
            repetition_continue: 0.75,
            repetition_decay: 0.75,
            seed: None,
        }
    }
}

impl RandomConfig {
    /// Probabilities must lie in `[0, 1]`. The decay must stay below 1, or an
    /// unbounded repetition started with certainty would never stop.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("optional_probability", self.optional_probability),
            ("repetition_continue", self.repetition_continue),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GrammarError::InvalidConfig(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        if !(0.0..1.0).contains(&self.repetition_decay) {
            return Err(GrammarError::InvalidConfig(format!(
                "repetition_decay must be at least 0 and below 1, got {}",
                self.repetition_decay
            )));
        }
        Ok(())
    }
}

/// Pseudo-random decisions.
///
/// Alternatives and code points are picked uniformly. Repetitions first take
/// the minimum, then keep going with a probability that shrinks after every
/// extra repetition, so output stays finite without a depth limit.
#[derive(Debug, Clone)]
pub struct RandomChoices<R: Rng = StdRng> {
    rng: R,
    config: RandomConfig,
}

impl RandomChoices<StdRng> {
    /// Reproducible choices with the default tuning
    pub fn seeded(seed: u64) -> Self {
        RandomChoices {
            rng: StdRng::seed_from_u64(seed),
            config: RandomConfig::default(),
        }
    }

    /// Choices seeded from OS entropy with the default tuning
    pub fn from_entropy() -> Self {
        RandomChoices {
            rng: StdRng::from_entropy(),
            config: RandomConfig::default(),
        }
    }

    /// Choices tuned by `config`, seeded from `config.seed` when present
    pub fn from_config(config: &RandomConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        RandomChoices::with_rng(rng, config.clone())
    }
}

impl<R: Rng> RandomChoices<R> {
    pub fn with_rng(rng: R, config: RandomConfig) -> Result<Self> {
        config.validate()?;
        Ok(RandomChoices { rng, config })
    }

    pub fn config(&self) -> &RandomConfig {
        &self.config
    }
}

impl<R: Rng> Choices for RandomChoices<R> {
    fn alternative(&mut self, branches: usize) -> Result<usize> {
        if branches == 0 {
            return Err(GrammarError::InvalidDecision(
                "cannot pick from zero alternatives".to_string(),
            ));
        }
        Ok(self.rng.gen_range(0..branches))
    }

    fn repetition(&mut self, min: usize, max: Option<usize>, _site: RepetitionSite) -> Result<usize> {
        let mut count = min;
        let mut probability = self.config.repetition_continue;
        while max.is_none_or(|max| count < max) && self.rng.gen_bool(probability) {
            count += 1;
            probability *= self.config.repetition_decay;
        }
        Ok(count)
    }

    fn include_optional(&mut self) -> Result<bool> {
        Ok(self.rng.gen_bool(self.config.optional_probability))
    }

    fn codepoint(&mut self, class: &CharacterClass) -> Result<char> {
        class
            .codepoints()
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| {
                GrammarError::InvalidDecision(format!("character class {} is empty", class.name()))
            })
    }
}

/// Decisions read from a fixed script.
///
/// Queries consume the script front to back and must find an answer of the
/// matching kind. Repetition answers registered with
/// [`repeat_on`](ScriptedChoices::repeat_on) apply to one site only and take
/// precedence over the script. Running out of answers fails with
/// `ScriptExhausted`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedChoices {
    script: VecDeque<Decision>,
    repetitions: HashMap<RepetitionSite, usize>,
}

impl ScriptedChoices {
    pub fn new() -> Self {
        Self::default()
    }

    /// A script answering with `decisions` in order
    pub fn from_decisions(decisions: impl IntoIterator<Item = Decision>) -> Self {
        ScriptedChoices {
            script: decisions.into_iter().collect(),
            repetitions: HashMap::new(),
        }
    }

    pub fn then(mut self, decision: Decision) -> Self {
        self.script.push_back(decision);
        self
    }

    pub fn picking(self, index: usize) -> Self {
        self.then(Decision::Alternative(index))
    }

    pub fn including_optional(self) -> Self {
        self.then(Decision::Optional(true))
    }

    pub fn skipping_optional(self) -> Self {
        self.then(Decision::Optional(false))
    }

    pub fn repeating(self, count: usize) -> Self {
        self.then(Decision::Repetition(count))
    }

    pub fn picking_codepoint(self, codepoint: char) -> Self {
        self.then(Decision::Codepoint(codepoint))
    }

    /// Answer `count` for the repetition at `site` only
    pub fn repeat_on(mut self, site: RepetitionSite, count: usize) -> Self {
        self.repetitions.insert(site, count);
        self
    }

    /// Scripted answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn next(&mut self, expected: &'static str) -> Result<Decision> {
        self.script
            .pop_front()
            .ok_or(GrammarError::ScriptExhausted(expected))
    }
}

impl Choices for ScriptedChoices {
    fn alternative(&mut self, _branches: usize) -> Result<usize> {
        match self.next("an alternative")? {
            Decision::Alternative(index) => Ok(index),
            found => Err(GrammarError::ScriptMismatch {
                expected: "an alternative",
                found,
            }),
        }
    }

    fn repetition(&mut self, _min: usize, _max: Option<usize>, site: RepetitionSite) -> Result<usize> {
        if let Some(&count) = self.repetitions.get(&site) {
            return Ok(count);
        }
        match self.next("a repetition count")? {
            Decision::Repetition(count) => Ok(count),
            found => Err(GrammarError::ScriptMismatch {
                expected: "a repetition count",
                found,
            }),
        }
    }

    fn include_optional(&mut self) -> Result<bool> {
        match self.next("an optional")? {
            Decision::Optional(include) => Ok(include),
            found => Err(GrammarError::ScriptMismatch {
                expected: "an optional",
                found,
            }),
        }
    }

    fn codepoint(&mut self, _class: &CharacterClass) -> Result<char> {
        match self.next("a code point")? {
            Decision::Codepoint(c) => Ok(c),
            found => Err(GrammarError::ScriptMismatch {
                expected: "a code point",
                found,
            }),
        }
    }
}
