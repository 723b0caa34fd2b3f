use grammar_gen::grammar::{
    characters_of_set, literal, non_terminal, optional, sequence, zero_or_more,
};
use grammar_gen::{
    Generator, GeneratorConfig, Grammar, GrammarError, Limits, PrintTracer, ProductionReplacement,
    RandomChoices, RepetitionSite, ScriptedChoices, Verbosity,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::io::Write;

fn generate(grammar: Grammar, mut choices: ScriptedChoices) -> String {
    let mut out = String::new();
    Generator::new(grammar)
        .generate(&mut choices, &mut out)
        .unwrap();
    out
}

fn generate_replaced(grammar: Grammar, replacements: Vec<ProductionReplacement>) -> String {
    Generator::with_replacements(grammar, replacements)
        .unwrap()
        .generate_string(&mut ScriptedChoices::new())
        .unwrap()
}

fn hello_world(foo: grammar_gen::Rule) -> Grammar {
    Grammar::builder("foo")
        .production("foo", [foo])
        .production("hello", [literal("Hello")])
        .production("world", [literal("World")])
        .build()
        .unwrap()
}

#[test]
fn test_literal() {
    let grammar = Grammar::builder("foo")
        .production("foo", [literal("Hello")])
        .build()
        .unwrap();

    assert_eq!(generate(grammar, ScriptedChoices::new()), "Hello");
}

#[test]
fn test_sequence() {
    let grammar = Grammar::builder("foo")
        .production("foo", [sequence([literal("Hello"), literal("World")])])
        .build()
        .unwrap();

    assert_eq!(generate(grammar, ScriptedChoices::new()), "HelloWorld");
}

#[test]
fn test_follows_non_terminals() {
    let grammar = hello_world(sequence([non_terminal("hello"), non_terminal("world")]));

    assert_eq!(generate(grammar, ScriptedChoices::new()), "HelloWorld");
}

#[test]
fn test_optional() {
    let grammar = hello_world(sequence([
        non_terminal("hello"),
        optional(non_terminal("world")),
    ]));

    assert_eq!(
        generate(grammar.clone(), ScriptedChoices::new().skipping_optional()),
        "Hello"
    );
    assert_eq!(
        generate(grammar, ScriptedChoices::new().including_optional()),
        "HelloWorld"
    );
}

#[test]
fn test_alternative() {
    let grammar = Grammar::builder("foo")
        .production("foo", [literal("Hello"), literal("World")])
        .build()
        .unwrap();

    assert_eq!(generate(grammar.clone(), ScriptedChoices::new().picking(0)), "Hello");
    assert_eq!(generate(grammar.clone(), ScriptedChoices::new().picking(1)), "World");

    let generator = Generator::new(grammar);
    let mut choices = RandomChoices::seeded(11);
    let mut seen = HashSet::new();
    for _ in 0..100 {
        let text = generator.generate_string(&mut choices).unwrap();
        assert!(text == "Hello" || text == "World", "unexpected {:?}", text);
        seen.insert(text);
    }
    assert_eq!(seen.len(), 2);
}

#[test]
fn test_repetition() {
    let grammar = Grammar::builder("foo")
        .production("foo", [zero_or_more(literal("w"))])
        .build()
        .unwrap();

    assert_eq!(
        generate(
            grammar.clone(),
            ScriptedChoices::new().repeat_on(RepetitionSite(0), 0)
        ),
        ""
    );
    assert_eq!(
        generate(
            grammar.clone(),
            ScriptedChoices::new().repeat_on(RepetitionSite(0), 3)
        ),
        "www"
    );

    for count in 0..20 {
        let text = generate(grammar.clone(), ScriptedChoices::new().repeating(count));
        assert_eq!(text.chars().count(), count);
    }
}

fn assert_character_set(name: &str, characters: &str) {
    let grammar = Grammar::builder("foo")
        .production("foo", [characters_of_set(name)])
        .build()
        .unwrap();

    let expected: HashSet<char> = characters.chars().collect();
    for codepoint in characters.chars() {
        assert_eq!(
            generate(grammar.clone(), ScriptedChoices::new().picking_codepoint(codepoint)),
            codepoint.to_string()
        );
    }

    let generator = Generator::new(grammar);
    let mut choices = RandomChoices::seeded(5);
    let mut seen = HashSet::new();
    for _ in 0..expected.len() * 10 {
        let text = generator.generate_string(&mut choices).unwrap();
        let mut chars = text.chars();
        let codepoint = chars.next().unwrap();
        assert!(chars.next().is_none(), "more than one code point in {:?}", text);
        assert!(expected.contains(&codepoint), "unexpected {:?}", codepoint);
        seen.insert(codepoint);
    }
    assert_eq!(seen, expected);
}

#[test]
fn test_characters_from_well_known_sets() {
    assert_character_set("NUL", "\0");
    assert_character_set("TAB", "\t");
    assert_character_set("LF", "\n");
    assert_character_set("CR", "\r");
    assert_character_set("FF", "\u{000C}");
}

#[test]
fn test_character_class_outside_basic_plane() {
    let grammar = Grammar::builder("foo")
        .production("foo", [characters_of_set("FACES")])
        .character_class("FACES", ['\u{1F600}', '\u{1F601}', '\u{1F602}'])
        .build()
        .unwrap();

    let generator = Generator::new(grammar);
    let mut choices = RandomChoices::seeded(99);
    let mut seen = HashSet::new();
    for _ in 0..60 {
        let text = generator.generate_string(&mut choices).unwrap();
        assert_eq!(text.chars().count(), 1);
        seen.insert(text);
    }
    assert_eq!(seen.len(), 3);
}

#[test]
fn test_codepoint_outside_class_is_rejected() {
    let grammar = Grammar::builder("foo")
        .production("foo", [characters_of_set("TAB")])
        .build()
        .unwrap();

    let err = Generator::new(grammar)
        .generate_string(&mut ScriptedChoices::new().picking_codepoint('x'))
        .unwrap_err();
    assert!(matches!(err, GrammarError::InvalidDecision(_)));
}

#[test]
fn test_replace_productions() {
    let grammar = Grammar::builder("foo")
        .production("foo", [non_terminal("bar")])
        .production("bar", [literal("WRONG!")])
        .build()
        .unwrap();

    let text = generate_replaced(
        grammar,
        vec![ProductionReplacement::new("bar", |bar| bar.write("OK"))],
    );
    assert_eq!(text, "OK");
}

fn lang() -> Grammar {
    Grammar::builder("lang")
        .production(
            "lang",
            [sequence([
                non_terminal("alpha"),
                literal(" - "),
                non_terminal("beta"),
            ])],
        )
        .production("alpha", [non_terminal("symbol")])
        .production("beta", [non_terminal("symbol")])
        .production("symbol", [literal("<NOT REPLACED>")])
        .build()
        .unwrap()
}

#[test]
fn test_context_sensitive_replacements() {
    let text = generate_replaced(
        lang(),
        vec![ProductionReplacement::new("symbol", |symbol| {
            let caller = symbol
                .node()
                .parent()
                .and_then(|parent| parent.name().map(String::from));
            match caller.as_deref() {
                Some("alpha") => symbol.write("one"),
                Some("beta") => symbol.write("two"),
                _ => symbol.generate_default(),
            }
        })],
    );
    assert_eq!(text, "one - two");
}

#[test]
fn test_replacement_falls_back_to_default() {
    let text = generate_replaced(
        lang(),
        vec![ProductionReplacement::new("symbol", |symbol| {
            let caller = symbol
                .node()
                .parent()
                .and_then(|parent| parent.name().map(String::from));
            if caller.as_deref() == Some("alpha") {
                symbol.write("one")
            } else {
                symbol.generate_default()
            }
        })],
    );
    assert_eq!(text, "one - <NOT REPLACED>");
}

#[test]
fn test_replacement_without_output_is_empty() {
    let text = generate_replaced(
        lang(),
        vec![ProductionReplacement::new("alpha", |_| Ok(()))],
    );
    assert_eq!(text, " - <NOT REPLACED>");
}

#[test]
fn test_fallback_replacement() {
    let text = generate_replaced(
        lang(),
        vec![
            ProductionReplacement::new("beta", |beta| beta.write("B")),
            ProductionReplacement::fallback(|ctx| {
                if ctx.name() == "symbol" {
                    ctx.write("S")
                } else {
                    ctx.generate_default()
                }
            }),
        ],
    );
    assert_eq!(text, "S - B");
}

#[test]
fn test_replacement_tree() {
    let generator = Generator::with_replacements(
        lang(),
        [ProductionReplacement::new("symbol", |symbol| {
            symbol.write("<")?;
            symbol.generate_default()?;
            symbol.write(">")
        })],
    )
    .unwrap();

    let tree = generator
        .generate_tree("alpha", &mut ScriptedChoices::new())
        .unwrap();
    assert_eq!(tree.text(), "<<NOT REPLACED>>");
    assert_eq!(
        tree.s_expression(),
        r#"(alpha (symbol! "<" "<NOT REPLACED>" ">"))"#
    );
}

#[test]
fn test_duplicate_replacement() {
    let err = Generator::with_replacements(
        lang(),
        [
            ProductionReplacement::new("symbol", |s| s.write("a")),
            ProductionReplacement::new("symbol", |s| s.write("b")),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, GrammarError::DuplicateReplacement(name) if name == "symbol"));
}

#[test]
fn test_replacement_for_undefined_production() {
    let err = Generator::with_replacements(
        lang(),
        [ProductionReplacement::new("gamma", |g| g.write("x"))],
    )
    .unwrap_err();
    assert!(matches!(err, GrammarError::UndefinedProduction(name) if name == "gamma"));
}

fn nested() -> Grammar {
    Grammar::builder("list")
        .production(
            "list",
            [sequence([
                literal("["),
                zero_or_more(sequence([non_terminal("item"), optional(literal(","))])),
                literal("]"),
            ])],
        )
        .production("item", [characters_of_set("DIGIT"), non_terminal("list")])
        .build()
        .unwrap()
}

#[test]
fn test_scripted_generation_is_deterministic() {
    let script = ScriptedChoices::new()
        .repeating(2)
        .picking(0)
        .picking_codepoint('4')
        .including_optional()
        .picking(1)
        .repeating(0)
        .skipping_optional();
    let generator = Generator::new(nested());

    let first = generator.generate_string(&mut script.clone()).unwrap();
    let second = generator.generate_string(&mut script.clone()).unwrap();
    assert_eq!(first, "[4,[]]");
    assert_eq!(first, second);

    let tree = generator.generate_tree("list", &mut script.clone()).unwrap();
    assert_eq!(tree.text(), first);
}

#[test]
fn test_seeded_generation_is_deterministic() {
    let generator = Generator::new(nested()).with_limits(Limits {
        max_depth: Some(200),
        max_output: Some(100_000),
    });

    for seed in 0..20 {
        let first = generator.generate_string(&mut RandomChoices::seeded(seed));
        let second = generator.generate_string(&mut RandomChoices::seeded(seed));
        match (first, second) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            (a, b) => panic!("diverged: {:?} vs {:?}", a, b),
        }
    }
}

#[test]
fn test_script_exhausted() {
    let err = Generator::new(nested())
        .generate_string(&mut ScriptedChoices::new().repeating(1))
        .unwrap_err();
    assert!(matches!(err, GrammarError::ScriptExhausted(_)));
}

#[test]
fn test_concurrent_generation() {
    let generator = Generator::with_replacements(
        lang(),
        [ProductionReplacement::new("symbol", |symbol| {
            let caller = symbol
                .node()
                .parent()
                .and_then(|parent| parent.name().map(String::from));
            symbol.write(&caller.unwrap_or_default().to_uppercase())
        })],
    )
    .unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..25)
                        .map(|_| generator.generate_string(&mut ScriptedChoices::new()).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            for text in handle.join().unwrap() {
                assert_eq!(text, "ALPHA - BETA");
            }
        }
    });
}

#[test]
fn test_traced_generation() {
    let generator = Generator::new(hello_world(sequence([
        non_terminal("hello"),
        optional(non_terminal("world")),
    ])));
    let mut tracer = PrintTracer::new(Verbosity::Default);

    let tree = generator
        .generate_tree_traced(
            "foo",
            &mut ScriptedChoices::new().including_optional(),
            &mut tracer,
        )
        .unwrap();

    assert_eq!(tree.text(), "HelloWorld");
    assert_eq!(tracer.lines(), &["> foo", "  > hello", "  > world"]);
}

#[test]
fn test_generate_to_writer() {
    let generator = Generator::new(hello_world(sequence([
        non_terminal("hello"),
        non_terminal("world"),
    ])));
    let mut out = Vec::new();
    let written = generator
        .generate_to_writer(&mut ScriptedChoices::new(), &mut out)
        .unwrap();

    assert_eq!(written, 10);
    assert_eq!(String::from_utf8(out).unwrap(), "HelloWorld");
}

#[test]
fn test_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "limits": {{ "max_output": 3 }}, "random": {{ "seed": 1 }} }}"#
    )
    .unwrap();

    let config = GeneratorConfig::from_file(file.path()).unwrap();
    assert_eq!(config.limits.max_output, Some(3));

    let generator = Generator::new(hello_world(literal("Hello"))).with_limits(config.limits);
    let err = generator
        .generate_string(&mut RandomChoices::from_config(&config.random).unwrap())
        .unwrap_err();
    assert!(matches!(err, GrammarError::GenerationTooLarge { limit: 3 }));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = GeneratorConfig::from_file(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, GrammarError::Io(_)));
}
