use grammar_gen::grammar::{
    characters_of_set, literal, non_terminal, one_or_more, optional, repeat, sequence,
    zero_or_more,
};
use grammar_gen::{Generator, Grammar, Limits, RandomChoices};
use std::error::Error;

/// Example of building grammars programmatically and sampling from them
fn main() -> Result<(), Box<dyn Error>> {
    // Example 1: a sentence grammar where repeated productions add alternatives
    let sentences = Grammar::builder("sentence")
        .production(
            "sentence",
            [sequence([
                non_terminal("subject"),
                literal(" "),
                non_terminal("verb"),
                literal(" "),
                non_terminal("object"),
            ])],
        )
        .production("subject", [sequence([literal("The "), non_terminal("noun")])])
        .production("subject", [sequence([literal("A "), non_terminal("adjective"), literal(" "), non_terminal("noun")])])
        .production("adjective", [literal("quick"), literal("lazy"), literal("clever")])
        .production("noun", [literal("fox"), literal("dog"), literal("programmer")])
        .production("verb", [literal("jumps over"), literal("runs around"), literal("observes")])
        .production("object", [sequence([literal("the "), non_terminal("noun")])])
        .build()?;

    println!("Generated sentences:");
    let generator = Generator::new(sentences);
    let mut choices = RandomChoices::seeded(2024);
    for i in 1..=5 {
        println!("{}. {}", i, generator.generate_string(&mut choices)?);
    }

    // Example 2: a small programming language, guarded by safety limits
    let code = Grammar::builder("program")
        .production("program", [one_or_more(non_terminal("statement"))])
        .production(
            "statement",
            [
                sequence([non_terminal("variable"), literal(" = "), non_terminal("expression"), literal(";\n")]),
                sequence([
                    literal("if ("),
                    non_terminal("condition"),
                    literal(") { "),
                    non_terminal("statement"),
                    literal("}\n"),
                ]),
                sequence([literal("print("), non_terminal("expression"), literal(");\n")]),
            ],
        )
        .production(
            "expression",
            [sequence([
                non_terminal("factor"),
                zero_or_more(sequence([non_terminal("operator"), non_terminal("factor")])),
            ])],
        )
        .production("operator", [literal(" + "), literal(" - "), literal(" * ")])
        .production("factor", [non_terminal("number"), non_terminal("variable")])
        .production(
            "condition",
            [sequence([non_terminal("expression"), non_terminal("comparator"), non_terminal("expression")])],
        )
        .production("comparator", [literal(" == "), literal(" < "), literal(" >= ")])
        .production(
            "variable",
            [sequence([
                characters_of_set("ASCII_LOWER"),
                repeat(0, 5, characters_of_set("ASCII_LETTER")),
            ])],
        )
        .production(
            "number",
            [sequence([optional(literal("-")), one_or_more(characters_of_set("DIGIT"))])],
        )
        .build()?;

    println!("\nGrammar:\n{}", code);

    let generator = Generator::new(code).with_limits(Limits {
        max_depth: Some(32),
        max_output: Some(4096),
    });
    println!("Generated code snippets:");
    for i in 1..=3 {
        match generator.generate_string(&mut choices) {
            Ok(text) => println!("{}.\n{}", i, text),
            Err(err) => println!("{}. skipped: {}", i, err),
        }
    }

    Ok(())
}
