//! Named character classes.
//!
//! A class is an ordered set of Unicode scalar values. Every operation works on
//! whole code points (`char`), so classes containing characters outside the
//! basic multilingual plane are never split into surrogate halves.
//!
//! The standard registry is built once per process and never changes. Grammars
//! can layer their own classes on top of it (see
//! [`GrammarBuilder::character_class`](crate::GrammarBuilder::character_class)).

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::utils::{GrammarError, Result};

/// An ordered set of code points with a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterClass {
    name: String,
    codepoints: Vec<char>,
}

impl CharacterClass {
    /// Create a class from any collection of code points.
    ///
    /// Duplicates are dropped and members are kept in code point order.
    pub fn new(name: &str, codepoints: impl IntoIterator<Item = char>) -> Self {
        let mut codepoints: Vec<char> = codepoints.into_iter().collect();
        codepoints.sort_unstable();
        codepoints.dedup();
        CharacterClass {
            name: name.to_string(),
            codepoints,
        }
    }

    /// Create a class from inclusive code point ranges
    pub fn from_ranges(name: &str, ranges: &[RangeInclusive<char>]) -> Self {
        Self::new(name, ranges.iter().flat_map(|range| range.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in ascending code point order
    pub fn codepoints(&self) -> &[char] {
        &self.codepoints
    }

    pub fn len(&self) -> usize {
        self.codepoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codepoints.is_empty()
    }

    pub fn contains(&self, codepoint: char) -> bool {
        self.codepoints.binary_search(&codepoint).is_ok()
    }

    /// The member at `index` in code point order
    pub fn get(&self, index: usize) -> Option<char> {
        self.codepoints.get(index).copied()
    }
}

/// Registry mapping class names to classes
#[derive(Debug, Clone, Default)]
pub struct CharacterClasses {
    classes: HashMap<String, Arc<CharacterClass>>,
}

static STANDARD: Lazy<CharacterClasses> = Lazy::new(|| {
    let mut classes = CharacterClasses::default();

    for (name, codepoint) in [
        ("NUL", '\u{0000}'),
        ("TAB", '\u{0009}'),
        ("LF", '\u{000A}'),
        ("VT", '\u{000B}'),
        ("FF", '\u{000C}'),
        ("CR", '\u{000D}'),
        ("FS", '\u{001C}'),
        ("GS", '\u{001D}'),
        ("RS", '\u{001E}'),
        ("US", '\u{001F}'),
        ("SPACE", '\u{0020}'),
        ("NEL", '\u{0085}'),
        ("NBSP", '\u{00A0}'),
    ] {
        classes.insert(CharacterClass::new(name, [codepoint]));
    }

    classes.insert(CharacterClass::from_ranges("DIGIT", &['0'..='9']));
    classes.insert(CharacterClass::from_ranges(
        "HEX_DIGIT",
        &['0'..='9', 'A'..='F', 'a'..='f'],
    ));
    classes.insert(CharacterClass::from_ranges("ASCII_LOWER", &['a'..='z']));
    classes.insert(CharacterClass::from_ranges("ASCII_UPPER", &['A'..='Z']));
    classes.insert(CharacterClass::from_ranges(
        "ASCII_LETTER",
        &['A'..='Z', 'a'..='z'],
    ));
    classes.insert(CharacterClass::new(
        "NEWLINE",
        ['\n', '\u{000B}', '\u{000C}', '\r', '\u{0085}', '\u{2028}', '\u{2029}'],
    ));
    // Unicode White_Space property
    classes.insert(CharacterClass::from_ranges(
        "WHITESPACE",
        &[
            '\u{0009}'..='\u{000D}',
            ' '..=' ',
            '\u{0085}'..='\u{0085}',
            '\u{00A0}'..='\u{00A0}',
            '\u{1680}'..='\u{1680}',
            '\u{2000}'..='\u{200A}',
            '\u{2028}'..='\u{2029}',
            '\u{202F}'..='\u{202F}',
            '\u{205F}'..='\u{205F}',
            '\u{3000}'..='\u{3000}',
        ],
    ));

    classes
});

impl CharacterClasses {
    /// The process-wide registry of well-known classes
    pub fn standard() -> &'static CharacterClasses {
        &STANDARD
    }

    pub(crate) fn insert(&mut self, class: CharacterClass) -> Option<Arc<CharacterClass>> {
        self.classes
            .insert(class.name().to_string(), Arc::new(class))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CharacterClass>> {
        self.classes.get(name)
    }

    /// Look up a class, failing with `UnknownCharacterClass`
    pub fn lookup(&self, name: &str) -> Result<&Arc<CharacterClass>> {
        self.get(name)
            .ok_or_else(|| GrammarError::UnknownCharacterClass(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Registered class names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Look up a class in the standard registry
pub fn standard_class(name: &str) -> Result<Arc<CharacterClass>> {
    CharacterClasses::standard().lookup(name).cloned()
}
