//! `lrgen`: command-line front end for the parser-table generator core.
//!
//! Grounded on `main.cpp`/`help.cpp`: the same flag surface (`-t`, `-g`,
//! `-o`, `--sep=`, `--strict`, `--no-test`, `--no-label`, `--step`,
//! `--debug`, `-h|--help`), reimplemented with `clap`'s derive API instead
//! of the original's hand-rolled `strncmp` loop, and the same three output
//! artifacts (`NFA.gv`, `DFA.gv`, `steps.py`) under `-o`'s directory.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use log::info;

use lr_parser_gen::config::{Config, Variant};
use lr_parser_gen::error::CliError;
use lr_parser_gen::recognizer::{Recognizer, StepOutcome, TokenSource};
use lr_parser_gen::trace::{FileTracer, NullTracer, StepTracer};
use lr_parser_gen::{build, graphviz, Automaton};

/// Reads whitespace-separated symbol names, one token at a time, from a
/// buffered reader. Mirrors `util::TokenReader`: each call pulls the next
/// token, skipping runs of whitespace, and yields `None` at end of stream.
struct StdinTokens<R: BufRead> {
    reader: R,
    buffer: Vec<char>,
    pos: usize,
}

impl<R: BufRead> StdinTokens<R> {
    fn new(reader: R) -> Self {
        StdinTokens {
            reader,
            buffer: Vec::new(),
            pos: 0,
        }
    }

    fn refill(&mut self) -> bool {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => false,
            Ok(_) => {
                self.buffer = line.chars().collect();
                self.pos = 0;
                true
            }
        }
    }
}

impl<R: BufRead> TokenSource for StdinTokens<R> {
    fn next_token(&mut self) -> Option<String> {
        loop {
            while self.pos < self.buffer.len() && self.buffer[self.pos].is_whitespace() {
                self.pos += 1;
            }
            if self.pos >= self.buffer.len() {
                if !self.refill() {
                    return None;
                }
                continue;
            }
            let start = self.pos;
            while self.pos < self.buffer.len() && !self.buffer[self.pos].is_whitespace() {
                self.pos += 1;
            }
            let tok: String = self.buffer[start..self.pos].iter().collect();
            if !tok.is_empty() {
                return Some(tok);
            }
        }
    }
}

#[derive(ClapParser, Debug)]
#[command(
    name = "lrgen",
    about = "Builds an LR(0)/SLR(1)/LR(1)/LALR(1) parse table from a grammar file and optionally drives a recognizer over stdin."
)]
struct Cli {
    /// Parser variant to build.
    #[arg(short = 't', long = "type", value_enum, default_value = "slr")]
    variant: CliVariant,

    /// Grammar file to read.
    #[arg(short = 'g', long = "grammar", default_value = "grammar.txt")]
    grammar: PathBuf,

    /// Output directory for NFA.gv, DFA.gv and steps.py.
    #[arg(short = 'o', long = "out", default_value = ".")]
    out: PathBuf,

    /// Production separator token (no whitespace).
    #[arg(long = "sep", default_value = "->")]
    sep: String,

    /// Enforce C-style identifiers in grammar and input, with quoted literals.
    #[arg(long)]
    strict: bool,

    /// Stop after building the parse table; skip the recognizer.
    #[arg(long = "no-test")]
    no_test: bool,

    /// Emit compact automaton labels (ids only) in the graphviz output.
    #[arg(long = "no-label")]
    no_label: bool,

    /// Read test input incrementally rather than to end-of-stream.
    #[arg(long)]
    step: bool,

    /// Raise log verbosity.
    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliVariant {
    #[value(name = "lr0")]
    Lr0,
    #[value(name = "slr")]
    Slr,
    #[value(name = "lr1")]
    Lr1,
    #[value(name = "lalr")]
    Lalr,
}

impl From<CliVariant> for Variant {
    fn from(v: CliVariant) -> Self {
        match v {
            CliVariant::Lr0 => Variant::Lr0,
            CliVariant::Slr => Variant::Slr,
            CliVariant::Lr1 => Variant::Lr1,
            CliVariant::Lalr => Variant::Lalr,
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = Config {
        variant: cli.variant.into(),
        grammar_path: cli.grammar.clone(),
        output_dir: cli.out.clone(),
        separator: cli.sep,
        strict: cli.strict,
        run_test: !cli.no_test,
        emit_labels: !cli.no_label,
        exhaust_input: !cli.step,
    };

    fs::create_dir_all(&config.output_dir)?;
    let steps_path = config.output_dir.join("steps.py");
    let mut file_tracer = FileTracer::create(&steps_path)?;

    let source = fs::read_to_string(&config.grammar_path)?;
    info!("read grammar from {}", config.grammar_path.display());

    let built = build(&source, &config, &mut file_tracer as &mut dyn StepTracer)?;
    file_tracer.into_result()?;
    info!(
        "{} symbols, {} productions",
        built.grammar.symbols().len(),
        built.grammar.productions().len()
    );

    let nfa_dot = graphviz::dump_nfa(&built.grammar, &built.nfa, config.emit_labels);
    fs::write(config.output_dir.join("NFA.gv"), nfa_dot)?;

    let dfa_dot = match &built.automaton {
        Automaton::Subset(dfa) => graphviz::dump_dfa(&built.grammar, &built.nfa, dfa, config.emit_labels),
        Automaton::Lalr(lalr) => graphviz::dump_lalr(&built.grammar, &built.nfa, lalr, config.emit_labels),
    };
    fs::write(config.output_dir.join("DFA.gv"), dfa_dot)?;

    if built.table.is_clean() {
        println!("Parse table built with no conflicts.");
    } else {
        println!("{} cell conflicts:", built.table.conflicts.len());
        for conflict in &built.table.conflicts {
            let actions = conflict
                .actions
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "  state {}, symbol '{}': {}",
                conflict.state.0,
                built.grammar.symbol(conflict.symbol).name,
                actions
            );
        }
    }

    if config.run_test {
        println!("Please input symbols for test (use '$' to end the input)");
        let stdin = io::stdin();
        let mut source = StdinTokens::new(stdin.lock());
        let mut recognizer = Recognizer::new(&built.grammar, &built.table);
        if config.exhaust_input {
            recognizer.exhaust(&mut source)?;
        }
        let mut tracer = NullTracer;
        loop {
            match recognizer.step(&mut source, &mut tracer) {
                Ok(StepOutcome::Accepted) => {
                    println!("Accepted.");
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    println!("Rejected: {e}");
                    return Err(CliError::Recognizer(e));
                }
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = writeln!(io::stderr(), "{e}");
            ExitCode::FAILURE
        }
    }
}
