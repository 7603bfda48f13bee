//! Immutable configuration threaded through the pipeline.
//!
//! Replaces the original's process-wide `LaunchArguments` singleton
//! (`src/common.h`) with a plain value built once, at the CLI boundary or by
//! a test harness, and passed by shared reference from there on. No field is
//! ever mutated after construction.

use std::path::PathBuf;

/// Which of the four canonical table-construction strategies to run.
///
/// Forms a precision lattice `Lr0 <= Slr <= Lalr <= Lr1`: each variant
/// differs only in how much lookahead context is tracked per item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    Lr0,
    Slr,
    Lr1,
    Lalr,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Lr0 => "lr0",
            Variant::Slr => "slr",
            Variant::Lr1 => "lr1",
            Variant::Lalr => "lalr",
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lr0" => Ok(Variant::Lr0),
            "slr" => Ok(Variant::Slr),
            "lr1" => Ok(Variant::Lr1),
            "lalr" => Ok(Variant::Lalr),
            other => Err(format!("unknown parser variant: {other}")),
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain-data run configuration. `Clone`, built once, never mutated.
#[derive(Clone, Debug)]
pub struct Config {
    pub variant: Variant,
    pub grammar_path: PathBuf,
    pub output_dir: PathBuf,
    pub separator: String,
    pub strict: bool,
    pub run_test: bool,
    pub emit_labels: bool,
    pub exhaust_input: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            variant: Variant::Slr,
            grammar_path: PathBuf::from("grammar.txt"),
            output_dir: PathBuf::from("."),
            separator: "->".to_string(),
            strict: false,
            run_test: true,
            emit_labels: true,
            exhaust_input: true,
        }
    }
}
