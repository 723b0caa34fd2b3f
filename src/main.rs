use clap::{Parser, ValueEnum};
use grammar_gen::grammar::{
    alternatives, characters_of_set, literal, non_terminal, one_or_more, optional, repeat,
    sequence,
};
use grammar_gen::{
    Generator, GeneratorConfig, Grammar, PrintTracer, RandomChoices, RandomConfig, Verbosity,
};
use std::io::{self, Write};
use std::path::PathBuf;

/// Grammar-based sample text generator
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Built-in grammar to generate from
    #[arg(short, long, value_enum, default_value_t = SampleGrammar::Greeting)]
    grammar: SampleGrammar,

    /// Number of samples to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Seed for reproducible output (overrides the config file)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the derivation tree instead of the text
    #[arg(long)]
    tree: bool,

    /// Indent the derivation tree
    #[arg(long, requires = "tree")]
    pretty: bool,

    /// Print the grammar before generating
    #[arg(long)]
    show_grammar: bool,

    /// Trace generation to stderr
    #[arg(long)]
    trace: bool,

    /// Include decisions and emitted text in the trace
    #[arg(short, long, requires = "trace")]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SampleGrammar {
    /// Greetings with optional punctuation
    Greeting,
    /// Arithmetic expressions
    Arith,
    /// Lines made of control and whitespace characters
    Controls,
}

impl SampleGrammar {
    fn build(self) -> grammar_gen::Result<Grammar> {
        match self {
            SampleGrammar::Greeting => Grammar::builder("greeting")
                .production(
                    "greeting",
                    [sequence([
                        non_terminal("salutation"),
                        literal(" "),
                        non_terminal("subject"),
                        optional(literal("!")),
                    ])],
                )
                .production(
                    "salutation",
                    [literal("Hello"), literal("Hi"), literal("Bonjour"), literal("Hola")],
                )
                .production(
                    "subject",
                    [literal("world"), literal("friend"), literal("programmer")],
                )
                .build(),
            SampleGrammar::Arith => Grammar::builder("expression")
                .production(
                    "expression",
                    [sequence([
                        non_terminal("term"),
                        optional(sequence([non_terminal("operator"), non_terminal("term")])),
                    ])],
                )
                .production(
                    "operator",
                    [literal(" + "), literal(" - "), literal(" * "), literal(" / ")],
                )
                .production(
                    "term",
                    [
                        non_terminal("number"),
                        sequence([literal("-"), non_terminal("number")]),
                        sequence([literal("("), non_terminal("expression"), literal(")")]),
                    ],
                )
                .production("number", [one_or_more(characters_of_set("DIGIT"))])
                .build(),
            SampleGrammar::Controls => Grammar::builder("line")
                .production(
                    "line",
                    [repeat(
                        1,
                        8,
                        alternatives([
                            characters_of_set("TAB"),
                            characters_of_set("SPACE"),
                            characters_of_set("FF"),
                            characters_of_set("ASCII_LETTER"),
                        ]),
                    )],
                )
                .build(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };
    let random = RandomConfig {
        seed: cli.seed.or(config.random.seed),
        ..config.random.clone()
    };

    let grammar = cli.grammar.build()?;
    if cli.show_grammar {
        println!("{}", grammar);
    }

    let generator = Generator::new(grammar).with_limits(config.limits);
    let mut choices = RandomChoices::from_config(&random)?;
    let start = generator.grammar().start().to_string();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for _ in 0..cli.count {
        let tree = if cli.trace {
            let verbosity = if cli.verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Default
            };
            let mut tracer = PrintTracer::new(verbosity);
            let result = generator.generate_tree_traced(&start, &mut choices, &mut tracer);
            tracer.print(&mut io::stderr())?;
            result?
        } else {
            generator.generate_tree(&start, &mut choices)?
        };

        if cli.tree && cli.pretty {
            writeln!(out, "{:#}", tree)?;
        } else if cli.tree {
            writeln!(out, "{}", tree)?;
        } else {
            writeln!(out, "{}", tree.text())?;
        }
    }

    Ok(())
}
