use grammar_gen::grammar::{literal, non_terminal, sequence};
use grammar_gen::{Generator, Grammar, ProductionReplacement, ScriptedChoices};
use std::error::Error;

/// Example of a replacement that renders one shared production differently
/// depending on which production referenced it
fn main() -> Result<(), Box<dyn Error>> {
    let grammar = Grammar::builder("assignment")
        .production(
            "assignment",
            [sequence([
                non_terminal("target"),
                literal(" = "),
                non_terminal("source"),
                literal(";"),
            ])],
        )
        .production("target", [non_terminal("identifier")])
        .production("source", [non_terminal("identifier")])
        .production("identifier", [literal("x")])
        .build()?;

    let generator = Generator::with_replacements(
        grammar,
        [ProductionReplacement::new("identifier", |identifier| {
            let caller = identifier
                .node()
                .parent()
                .and_then(|parent| parent.name().map(String::from));
            match caller.as_deref() {
                Some("target") => identifier.write("result"),
                Some("source") => identifier.write("input"),
                _ => identifier.generate_default(),
            }
        })],
    )?;

    let tree = generator.generate_tree("assignment", &mut ScriptedChoices::new())?;
    println!("{}", tree.text());
    println!("{:#}", tree);

    Ok(())
}
