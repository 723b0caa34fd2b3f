//! Tracing for generation runs.
//!
//! The generator reports what it does to a [`Tracer`]. [`NoopTracer`] is the
//! default and compiles down to nothing; [`PrintTracer`] collects an indented
//! log of productions, decisions and emitted text for debugging a grammar.
//! Tracer state lives in the tracer, never in the generator.

use std::io;

use crate::choices::Decision;

/// Verbosity level for trace output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Entered and replaced productions only
    #[default]
    Default,
    /// Productions, decisions and emitted text
    Verbose,
}

/// Hooks called by the generator while it expands a grammar.
///
/// `depth` is the number of enclosing non-terminals, the current one included.
pub trait Tracer {
    /// Called before a production is expanded
    fn enter(&mut self, production: &str, depth: usize);

    /// Called after a production is finished, whether or not it succeeded
    fn exit(&mut self, production: &str, depth: usize);

    /// Called when a replacement runs instead of the default expansion
    fn replaced(&mut self, production: &str, depth: usize);

    /// Called after the decision source answers
    fn decision(&mut self, decision: Decision, depth: usize);

    /// Called for every piece of emitted text
    fn emit(&mut self, text: &str, depth: usize);
}

/// No-op tracer that gets optimized away completely
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn enter(&mut self, _production: &str, _depth: usize) {}

    #[inline(always)]
    fn exit(&mut self, _production: &str, _depth: usize) {}

    #[inline(always)]
    fn replaced(&mut self, _production: &str, _depth: usize) {}

    #[inline(always)]
    fn decision(&mut self, _decision: Decision, _depth: usize) {}

    #[inline(always)]
    fn emit(&mut self, _text: &str, _depth: usize) {}
}

/// Tracer that collects an indented log of a generation run
#[derive(Debug, Default, Clone)]
pub struct PrintTracer {
    verbosity: Verbosity,
    lines: Vec<String>,
}

impl PrintTracer {
    pub fn new(verbosity: Verbosity) -> Self {
        PrintTracer {
            verbosity,
            lines: Vec::new(),
        }
    }

    /// Collected trace lines
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Print the collected lines to `w`
    pub fn print(&self, w: &mut impl io::Write) -> io::Result<()> {
        for line in &self.lines {
            writeln!(w, "{}", line)?;
        }
        Ok(())
    }

    fn push(&mut self, depth: usize, line: String) {
        let indent = depth.saturating_sub(1) * 2;
        self.lines.push(format!("{:indent$}{}", "", line, indent = indent));
    }

    fn verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }
}

impl Tracer for PrintTracer {
    fn enter(&mut self, production: &str, depth: usize) {
        self.push(depth, format!("> {}", production));
    }

    fn exit(&mut self, production: &str, depth: usize) {
        if self.verbose() {
            self.push(depth, format!("< {}", production));
        }
    }

    fn replaced(&mut self, production: &str, depth: usize) {
        self.push(depth, format!("  {} replaced", production));
    }

    fn decision(&mut self, decision: Decision, depth: usize) {
        if self.verbose() {
            self.push(depth, format!("  ? {}", decision));
        }
    }

    fn emit(&mut self, text: &str, depth: usize) {
        if self.verbose() {
            self.push(depth, format!("  = {:?}", text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_verbosity_skips_details() {
        let mut tracer = PrintTracer::new(Verbosity::Default);
        tracer.enter("foo", 1);
        tracer.decision(Decision::Optional(true), 1);
        tracer.enter("bar", 2);
        tracer.emit("x", 2);
        tracer.exit("bar", 2);
        tracer.exit("foo", 1);

        assert_eq!(tracer.lines(), &["> foo", "  > bar"]);
    }

    #[test]
    fn test_verbose_and_print() {
        let mut tracer = PrintTracer::new(Verbosity::Verbose);
        tracer.enter("foo", 1);
        tracer.decision(Decision::Alternative(1), 1);
        tracer.emit("World", 1);
        tracer.exit("foo", 1);

        let mut out = Vec::new();
        tracer.print(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "> foo\n  ? alternative 1\n  = \"World\"\n< foo\n"
        );
    }
}
