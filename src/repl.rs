//! Repl - line-oriented front end to the completion engine.
//!
//! Supports:
//! - `lhs = rhs` (or `eq lhs = rhs`) to add an axiom
//! - `load <file>` to add axioms from a file
//! - `complete`, `step [n]`, `show`, `stats`
//! - `nf <term>`, `reduce <term>`, `equal <s> = <t>`
//! - `order kbo|lpo`, `prec f > g > h`, `unfailing on|off`, `steps <n>|none`
//! - `reset`, `help`, `quit`/`exit`
//!
//! The engine is built lazily from the axioms and current settings; adding
//! an axiom or changing a setting discards it.

use crate::completion::{Completion, Status};
use crate::config::CompletionConfig;
use crate::equation::Equation;
use crate::error::KbError;
use crate::order::{Kbo, Lpo, Precedence, ReductionOrder};
use crate::parser::Parser;
use crate::term::{format_term_with, TermId, TermStore};
use std::io::{self, BufRead, Write};

/// Which built-in order orients equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Kbo,
    Lpo,
}

/// A built-in order over the REPL's precedence.
#[derive(Clone)]
pub enum OrderChoice {
    Kbo(Kbo),
    Lpo(Lpo),
}

impl OrderChoice {
    pub fn new(kind: OrderKind, precedence: Precedence) -> Self {
        match kind {
            OrderKind::Kbo => OrderChoice::Kbo(Kbo::new(precedence)),
            OrderKind::Lpo => OrderChoice::Lpo(Lpo::new(precedence)),
        }
    }
}

impl ReductionOrder for OrderChoice {
    fn greater(&self, lhs: TermId, rhs: TermId, terms: &TermStore) -> bool {
        match self {
            OrderChoice::Kbo(kbo) => kbo.greater(lhs, rhs, terms),
            OrderChoice::Lpo(lpo) => lpo.greater(lhs, rhs, terms),
        }
    }
}

/// REPL state.
pub struct Repl {
    parser: Parser,
    axioms: Vec<Equation>,
    order: OrderKind,
    precedence: Vec<String>,
    config: CompletionConfig,
    engine: Option<Completion<OrderChoice>>,
}

impl Repl {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            axioms: Vec::new(),
            order: OrderKind::Kbo,
            precedence: Vec::new(),
            config: CompletionConfig::default(),
            engine: None,
        }
    }

    /// Read commands until EOF or `quit`, writing results and errors to
    /// `output`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> io::Result<()> {
        writeln!(output, "okb - ordered Knuth-Bendix completion. Type 'help' for commands.")?;
        loop {
            write!(output, "okb> ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                break;
            }

            match self.process_input(&line) {
                Ok(Some(msg)) => writeln!(output, "{}", msg)?,
                Ok(None) => {}
                Err(e) if e == "quit" => break,
                Err(e) => writeln!(output, "Error: {}", e)?,
            }
        }
        Ok(())
    }

    /// Process a single command line. `Err("quit")` asks the caller to stop.
    pub fn process_input(&mut self, input: &str) -> Result<Option<String>, String> {
        let line = input.trim();

        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "help" => Ok(Some(help_text())),
            "quit" | "exit" => Err("quit".to_string()),
            "eq" => self.add_axiom(rest),
            "load" => self.load_file(rest),
            "complete" => self.complete(),
            "step" => self.step(rest),
            "show" => Ok(Some(self.show())),
            "stats" => Ok(Some(self.stats())),
            "nf" => self.normal_form(rest),
            "reduce" => self.reduce(rest),
            "equal" => self.equal(rest),
            "order" => self.set_order(rest),
            "prec" => self.set_precedence(rest),
            "unfailing" => self.set_unfailing(rest),
            "steps" => self.set_step_budget(rest),
            "reset" => {
                self.axioms.clear();
                self.engine = None;
                Ok(Some("Axioms cleared.".to_string()))
            }
            _ if line.contains('=') => self.add_axiom(line),
            _ => Err(format!("Unknown command '{}'. Type 'help' for commands.", command)),
        }
    }

    /// Process a notebook-style cell: each non-empty line in turn.
    pub fn process_cell(&mut self, input: &str) -> Result<Option<String>, String> {
        let mut outputs = Vec::new();
        for line in input.lines() {
            if let Some(output) = self.process_input(line)? {
                outputs.push(output);
            }
        }
        if outputs.is_empty() {
            Ok(None)
        } else {
            Ok(Some(outputs.join("\n")))
        }
    }

    fn add_axiom(&mut self, text: &str) -> Result<Option<String>, String> {
        let parsed = self
            .parser
            .parse_equation(text)
            .map_err(|e| e.to_string())?;
        self.axioms.push(parsed.equation);
        self.engine = None;
        Ok(Some(format!("Added axiom {}.", self.axioms.len())))
    }

    fn load_file(&mut self, path: &str) -> Result<Option<String>, String> {
        if path.is_empty() {
            return Err("Usage: load <file>".to_string());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read file '{}': {}", path, e))?;
        let equations = self
            .parser
            .parse_equations(&content)
            .map_err(|e| format!("Parse error in '{}': {}", path, e))?;
        let count = equations.len();
        self.axioms.extend(equations);
        self.engine = None;
        Ok(Some(format!("Loaded {} equation(s) from '{}'", count, path)))
    }

    fn engine(&mut self) -> &mut Completion<OrderChoice> {
        let parser = &self.parser;
        let axioms = &self.axioms;
        let order = self.order;
        let precedence = &self.precedence;
        let config = &self.config;
        self.engine.get_or_insert_with(|| {
            let names: Vec<&str> = precedence.iter().map(String::as_str).collect();
            let precedence = Precedence::new(parser.symbols().clone()).with_order(&names);
            Completion::new(
                parser.symbols().clone(),
                parser.terms().clone(),
                axioms.clone(),
                OrderChoice::new(order, precedence),
                config.clone(),
            )
        })
    }

    fn complete(&mut self) -> Result<Option<String>, String> {
        let result = self.engine().complete();
        match result {
            Ok(()) => Ok(Some(self.show())),
            Err(err) => Err(describe(err)),
        }
    }

    fn step(&mut self, arg: &str) -> Result<Option<String>, String> {
        let count = if arg.is_empty() {
            1
        } else {
            parse_count(arg, "step")?
        };
        let mut taken = 0;
        while taken < count {
            match self.engine().step() {
                Ok(true) => break,
                Ok(false) => taken += 1,
                Err(err) => return Err(describe(err)),
            }
        }
        let status = self.engine().status();
        Ok(Some(format!("Took {} step(s). Status: {}", taken, status_name(status))))
    }

    fn show(&mut self) -> String {
        let engine = self.engine();
        let body = engine.render();
        let status = status_name(engine.status());
        if body.is_empty() {
            format!("(empty)\nStatus: {}", status)
        } else {
            format!("{}\nStatus: {}", body, status)
        }
    }

    fn stats(&mut self) -> String {
        let engine = self.engine();
        format!(
            "Equations: {}, rules: {}, steps: {}\n{}",
            engine.equations().len(),
            engine.rules().len(),
            engine.steps(),
            engine.metrics()
        )
    }

    fn normal_form(&mut self, text: &str) -> Result<Option<String>, String> {
        let parsed = self.parser.parse_term(text).map_err(|e| e.to_string())?;
        let result = self.engine().normal_form(parsed.term_id);
        match result {
            Ok(nf) => Ok(Some(self.render_named(nf, &parsed.var_names))),
            Err(err) => Err(describe(err)),
        }
    }

    fn reduce(&mut self, text: &str) -> Result<Option<String>, String> {
        let parsed = self.parser.parse_term(text).map_err(|e| e.to_string())?;
        let result = self.engine().reduce(parsed.term_id);
        match result {
            Ok(term) => Ok(Some(self.render_named(term, &parsed.var_names))),
            Err(err) => Err(describe(err)),
        }
    }

    fn equal(&mut self, text: &str) -> Result<Option<String>, String> {
        let parsed = self
            .parser
            .parse_equation(text)
            .map_err(|e| e.to_string())?;
        let Equation { lhs, rhs } = parsed.equation;
        let result = self.engine().equal(lhs, rhs);
        match result {
            Ok(answer) => Ok(Some(answer.to_string())),
            Err(err) => Err(describe(err)),
        }
    }

    fn set_order(&mut self, arg: &str) -> Result<Option<String>, String> {
        self.order = match arg {
            "kbo" => OrderKind::Kbo,
            "lpo" => OrderKind::Lpo,
            _ => return Err("Usage: order kbo|lpo".to_string()),
        };
        self.engine = None;
        Ok(Some(format!("Order set to {}.", arg)))
    }

    fn set_precedence(&mut self, arg: &str) -> Result<Option<String>, String> {
        let names: Vec<String> = arg
            .split('>')
            .map(|name| name.trim().to_string())
            .collect();
        if names.iter().any(String::is_empty) {
            return Err("Usage: prec f > g > h".to_string());
        }
        self.precedence = names;
        self.engine = None;
        Ok(Some(format!("Precedence: {}", self.precedence.join(" > "))))
    }

    fn set_unfailing(&mut self, arg: &str) -> Result<Option<String>, String> {
        let unfailing = match arg {
            "on" => true,
            "off" => false,
            _ => return Err("Usage: unfailing on|off".to_string()),
        };
        self.config = self.config.clone().with_unfailing(unfailing);
        self.engine = None;
        Ok(Some(format!("Unfailing completion {}.", arg)))
    }

    fn set_step_budget(&mut self, arg: &str) -> Result<Option<String>, String> {
        let budget = if arg == "none" {
            None
        } else {
            Some(parse_count(arg, "steps")?)
        };
        self.config = self.config.clone().with_max_steps(budget);
        if let Some(engine) = self.engine.as_mut() {
            engine.set_budget(budget, self.config.time_limit);
        }
        match budget {
            Some(n) => Ok(Some(format!("Step budget set to {}.", n))),
            None => Ok(Some("Step budget removed.".to_string())),
        }
    }

    /// Render a query result with the query's own variable names.
    fn render_named(&self, term: TermId, var_names: &[String]) -> String {
        let name = |v: u32| match var_names.get(v as usize) {
            Some(name) => format!("${}", name),
            None => format!("$_{}", v),
        };
        format_term_with(term, self.parser.terms(), self.parser.symbols(), &name)
            .unwrap_or_else(|err| format!("<{}>", err))
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

/// Error text with the rendered system, without trailing blank lines.
fn describe(err: KbError) -> String {
    err.to_string().trim_end().to_string()
}

fn parse_count(arg: &str, command: &str) -> Result<usize, String> {
    arg.parse()
        .map_err(|_| format!("Invalid count for '{}'. Usage: {} <n>", command, command))
}

fn status_name(status: Status) -> &'static str {
    match status {
        Status::Running => "running",
        Status::Complete => "complete",
        Status::GroundComplete => "ground-complete",
        Status::Failed => "failed",
    }
}

fn help_text() -> String {
    r#"okb - Ordered Knuth-Bendix Completion

Commands:
  lhs = rhs          Add an axiom (also: eq lhs = rhs)
  load <file>        Add axioms from a file, one per line
  complete           Run completion and show the result
  step [n]           Run n completion steps (default 1)
  show               Show current equations and rules
  stats              Show engine counters
  nf <term>          Normal form (needs a complete system)
  reduce <term>      Rewrite with the current system
  equal <s> = <t>    Decide s = t, completing as needed
  order kbo|lpo      Choose the reduction order
  prec f > g > h     Set the symbol precedence
  unfailing on|off   Allow unorientable equations
  steps <n>|none     Step budget per command
  reset              Forget all axioms
  help               Show this help
  quit/exit          Exit the REPL

Syntax:
  $x                 Variable
  a                  Constant
  (f x y)            Application
  # ...              Comment
"#
    .to_string()
}

#[cfg(test)]
#[path = "tests/repl.rs"]
mod tests;
