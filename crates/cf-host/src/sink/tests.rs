//! Unit tests for the output capture sink.

use std::io::Write;
use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};

use super::*;

#[derive(Clone, Default)]
struct Terminal(Arc<Mutex<Vec<u8>>>);

impl Terminal {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().expect("terminal lock").clone()).expect("utf-8")
    }
}

impl Write for Terminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("terminal lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[fixture]
fn tee() -> (OutputSink, Terminal) {
    let terminal = Terminal::default();
    (OutputSink::new(terminal.clone()), terminal)
}

#[rstest]
fn writes_reach_both_terminal_and_buffer(tee: (OutputSink, Terminal)) {
    let (sink, terminal) = tee;
    sink.say("Getting apps").expect("say");
    sink.say("OK").expect("say");

    assert_eq!(terminal.text(), "Getting apps\nOK\n");
    assert_eq!(sink.drain_lines(), vec!["Getting apps", "OK"]);
}

#[rstest]
fn disabling_terminal_output_keeps_capturing(tee: (OutputSink, Terminal)) {
    let (sink, terminal) = tee;
    sink.disable_terminal_output(true);
    sink.say("hidden").expect("say");
    sink.disable_terminal_output(false);
    sink.say("shown").expect("say");

    assert_eq!(terminal.text(), "shown\n");
    assert_eq!(sink.drain_lines(), vec!["hidden", "shown"]);
}

#[rstest]
fn drain_clears_the_buffer(tee: (OutputSink, Terminal)) {
    let (sink, _terminal) = tee;
    sink.say("once").expect("say");
    assert_eq!(sink.drain_lines(), vec!["once"]);
    assert!(sink.drain_lines().is_empty());
}

#[rstest]
#[case::empty(b"".as_slice(), Vec::<&str>::new())]
#[case::blank_line(b"\n".as_slice(), vec![""])]
#[case::no_trailing_newline(b"a\nb".as_slice(), vec!["a", "b"])]
#[case::interior_blank(b"a\n\nb\n".as_slice(), vec!["a", "", "b"])]
fn drain_splits_on_newlines(#[case] written: &[u8], #[case] expected: Vec<&str>) {
    let mut sink = OutputSink::capture_only();
    sink.write_all(written).expect("write");
    assert_eq!(sink.drain_lines(), expected);
}

#[rstest]
fn reset_discards_earlier_output(tee: (OutputSink, Terminal)) {
    let (sink, _terminal) = tee;
    sink.say("stale").expect("say");
    sink.reset();
    sink.say("fresh").expect("say");
    assert_eq!(sink.drain_lines(), vec!["fresh"]);
}

#[test]
fn clones_share_one_buffer() {
    let sink = OutputSink::capture_only();
    let writer = sink.clone();
    writer.say("from clone").expect("say");
    assert_eq!(sink.drain_lines(), vec!["from clone"]);
}
