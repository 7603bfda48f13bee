//! Visualizer trace emission: `steps.py`, a sequence of calls a companion
//! viewer script can replay to animate the solver/automaton construction.
//!
//! Grounded on `display/steps.h`/`steps.cpp`: every step of attribute
//! solving and automaton construction calls one of a fixed set of named
//! functions (`addState`, `addEdge`, `addFirst`, ...), each of which writes
//! one escaped, Python-call-shaped line to the step file. This crate turns
//! that free-function API into a trait so the builders can be handed a
//! `&mut dyn StepTracer` and remain agnostic to whether a trace is being
//! recorded at all.

use std::fmt;
use std::io::{self, Write};

/// One method per original `step::` function. Builders call these at the
/// same points `Grammar`/`LRParser`/`PushDownAutomaton` called their `step::`
/// counterparts; a caller not interested in tracing passes `&mut NullTracer`.
pub trait StepTracer {
    fn nullable(&mut self, symbol: &str, value: bool);
    fn symbol(&mut self, id: usize, name: &str);
    fn production(&mut self, id: usize, label: &str);
    fn add_first(&mut self, symbol: &str, terminal: &str);
    fn merge_first(&mut self, into: &str, from: &str);
    fn add_follow(&mut self, symbol: &str, terminal: &str);
    fn merge_follow(&mut self, into: &str, from: &str);
    fn merge_follow_from_first(&mut self, into: &str, from: &str);
    fn add_state(&mut self, id: usize, label: &str);
    fn update_state(&mut self, id: usize, label: &str);
    fn add_edge(&mut self, from: usize, to: usize, label: &str);
    fn set_start(&mut self, id: usize);
    fn set_final(&mut self, id: usize);
    fn add_table_entry(&mut self, state: usize, symbol: &str, action: &str);
    fn ast_add_node(&mut self, id: usize, label: &str);
    fn ast_set_parent(&mut self, child: usize, parent: usize);
    fn show(&mut self, message: &str);
    fn section(&mut self, title: &str);
}

/// No-op tracer, used by every builder's unit tests and by `lrgen` runs that
/// did not ask for `--step`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTracer;

impl StepTracer for NullTracer {
    fn nullable(&mut self, _symbol: &str, _value: bool) {}
    fn symbol(&mut self, _id: usize, _name: &str) {}
    fn production(&mut self, _id: usize, _label: &str) {}
    fn add_first(&mut self, _symbol: &str, _terminal: &str) {}
    fn merge_first(&mut self, _into: &str, _from: &str) {}
    fn add_follow(&mut self, _symbol: &str, _terminal: &str) {}
    fn merge_follow(&mut self, _into: &str, _from: &str) {}
    fn merge_follow_from_first(&mut self, _into: &str, _from: &str) {}
    fn add_state(&mut self, _id: usize, _label: &str) {}
    fn update_state(&mut self, _id: usize, _label: &str) {}
    fn add_edge(&mut self, _from: usize, _to: usize, _label: &str) {}
    fn set_start(&mut self, _id: usize) {}
    fn set_final(&mut self, _id: usize) {}
    fn add_table_entry(&mut self, _state: usize, _symbol: &str, _action: &str) {}
    fn ast_add_node(&mut self, _id: usize, _label: &str) {}
    fn ast_set_parent(&mut self, _child: usize, _parent: usize) {}
    fn show(&mut self, _message: &str) {}
    fn section(&mut self, _title: &str) {}
}

/// Escapes `"` and `\` so a string can sit inside a Python double-quoted
/// literal, matching `steps.cpp`'s own ad hoc escaping of labels.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Writes one `steps.py`-shaped line per event to an arbitrary `Write`.
/// `FileTracer::create` is the usual constructor (opens `steps.py` under a
/// run's output directory); the generic `new` is what tests use to capture
/// output in a `Vec<u8>` instead.
pub struct FileTracer<W: Write> {
    out: W,
    io_error: Option<io::Error>,
}

impl<W: Write> FileTracer<W> {
    pub fn new(writer: W) -> Self {
        FileTracer {
            out: writer,
            io_error: None,
        }
    }

    /// The first write failure is latched and can be retrieved once tracing
    /// is done; a tracer has no `Result`-returning methods since the trait
    /// methods themselves cannot fail from a builder's point of view.
    pub fn into_result(self) -> io::Result<()> {
        match self.io_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn write_line(&mut self, line: fmt::Arguments<'_>) {
        if self.io_error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.out, "{line}") {
            self.io_error = Some(e);
        }
    }
}

impl FileTracer<std::fs::File> {
    pub fn create(path: &std::path::Path) -> io::Result<Self> {
        Ok(FileTracer::new(std::fs::File::create(path)?))
    }
}

impl<W: Write> StepTracer for FileTracer<W> {
    fn nullable(&mut self, symbol: &str, value: bool) {
        self.write_line(format_args!("nullable(\"{}\", {})", escape(symbol), value));
    }

    fn symbol(&mut self, id: usize, name: &str) {
        self.write_line(format_args!("symbol[{}].name = \"{}\"", id, escape(name)));
    }

    fn production(&mut self, id: usize, label: &str) {
        self.write_line(format_args!("production[{}] = \"{}\"", id, escape(label)));
    }

    fn add_first(&mut self, symbol: &str, terminal: &str) {
        self.write_line(format_args!("addFirst(\"{}\", \"{}\")", escape(symbol), escape(terminal)));
    }

    fn merge_first(&mut self, into: &str, from: &str) {
        self.write_line(format_args!("mergeFirst(\"{}\", \"{}\")", escape(into), escape(from)));
    }

    fn add_follow(&mut self, symbol: &str, terminal: &str) {
        self.write_line(format_args!("addFollow(\"{}\", \"{}\")", escape(symbol), escape(terminal)));
    }

    fn merge_follow(&mut self, into: &str, from: &str) {
        self.write_line(format_args!("mergeFollow(\"{}\", \"{}\")", escape(into), escape(from)));
    }

    fn merge_follow_from_first(&mut self, into: &str, from: &str) {
        self.write_line(format_args!(
            "mergeFollowFromFirst(\"{}\", \"{}\")",
            escape(into),
            escape(from)
        ));
    }

    fn add_state(&mut self, id: usize, label: &str) {
        self.write_line(format_args!("addState({}, \"{}\")", id, escape(label)));
    }

    fn update_state(&mut self, id: usize, label: &str) {
        self.write_line(format_args!("updateState({}, \"{}\")", id, escape(label)));
    }

    fn add_edge(&mut self, from: usize, to: usize, label: &str) {
        self.write_line(format_args!("addEdge({}, {}, \"{}\")", from, to, escape(label)));
    }

    fn set_start(&mut self, id: usize) {
        self.write_line(format_args!("setStart({id})"));
    }

    fn set_final(&mut self, id: usize) {
        self.write_line(format_args!("setFinal({id})"));
    }

    fn add_table_entry(&mut self, state: usize, symbol: &str, action: &str) {
        self.write_line(format_args!(
            "addTableEntry({}, \"{}\", \"{}\")",
            state,
            escape(symbol),
            escape(action)
        ));
    }

    fn ast_add_node(&mut self, id: usize, label: &str) {
        self.write_line(format_args!("astAddNode({}, \"{}\")", id, escape(label)));
    }

    fn ast_set_parent(&mut self, child: usize, parent: usize) {
        self.write_line(format_args!("astSetParent({child}, {parent})"));
    }

    fn show(&mut self, message: &str) {
        self.write_line(format_args!("show(\"{}\")", escape(message)));
    }

    fn section(&mut self, title: &str) {
        self.write_line(format_args!("section(\"{}\")", escape(title)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_tracer_emits_call_shaped_lines() {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut tracer = FileTracer::new(&mut buf);
            tracer.add_state(0, "S' -> \u{2022} S");
            tracer.add_edge(0, 1, "S");
            tracer.set_start(0);
            tracer.show("done");
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("addState(0, \"S' -> \u{2022} S\")"));
        assert!(text.contains("addEdge(0, 1, \"S\")"));
        assert!(text.contains("setStart(0)"));
        assert!(text.contains("show(\"done\")"));
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut tracer = FileTracer::new(&mut buf);
            tracer.symbol(0, "\"weird\"\\name");
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\\\"weird\\\"\\\\name"));
    }

    #[test]
    fn null_tracer_accepts_every_event_without_panicking() {
        let mut tracer = NullTracer;
        tracer.nullable("S", true);
        tracer.add_state(0, "x");
        tracer.add_edge(0, 1, "a");
        tracer.set_start(0);
        tracer.set_final(1);
        tracer.add_table_entry(0, "a", "s1");
        tracer.ast_add_node(0, "E");
        tracer.ast_set_parent(1, 0);
        tracer.show("ok");
        tracer.section("Grammar");
    }
}
