//! Grammar-Gen generates syntactically valid sample text from a grammar.
//!
//! A [`Grammar`] is a set of named productions built from literals,
//! sequences, alternatives, optional elements, repetitions, character classes
//! and references to other productions. A [`Generator`] expands it into a
//! derivation [`Tree`] and its text. Every choice along the way comes from a
//! [`Choices`] implementation, either random ([`RandomChoices`]) or scripted
//! ([`ScriptedChoices`]). Individual productions can be overridden with a
//! [`ProductionReplacement`], which may look at where in the tree it was
//! reached before deciding what to write.
//!
//! # Example
//!
//! ```rust
//! use grammar_gen::grammar::{literal, non_terminal, optional, sequence};
//! use grammar_gen::{Generator, Grammar, ProductionReplacement, ScriptedChoices};
//!
//! let grammar = Grammar::builder("greeting")
//!     .production("greeting", [sequence([literal("Hello"), optional(non_terminal("subject"))])])
//!     .production("subject", [literal(" world"), literal(" Rust")])
//!     .build()?;
//!
//! let generator = Generator::new(grammar.clone());
//! let text = generator.generate_string(&mut ScriptedChoices::new().including_optional().picking(1))?;
//! assert_eq!(text, "Hello Rust");
//!
//! let shouting = Generator::with_replacements(
//!     grammar,
//!     [ProductionReplacement::new("subject", |ctx| ctx.write(" WORLD"))],
//! )?;
//! let text = shouting.generate_string(&mut ScriptedChoices::new().including_optional())?;
//! assert_eq!(text, "Hello WORLD");
//! # Ok::<(), grammar_gen::GrammarError>(())
//! ```

pub mod charset;
pub mod choices;
pub mod generator;
pub mod grammar;
pub mod node;
pub mod replacement;
pub mod trace;
pub mod utils;

pub use charset::{CharacterClass, CharacterClasses};
pub use choices::{Choices, Decision, RandomChoices, RandomConfig, RepetitionSite, ScriptedChoices};
pub use generator::{Generator, GeneratorConfig, Limits};
pub use grammar::{Grammar, GrammarBuilder, Production, Rule};
pub use node::{NodeId, NodeKind, NodeRef, Tree};
pub use replacement::{ProductionReplacement, ReplacementContext, Replacements};
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
pub use utils::{GrammarError, Result};
