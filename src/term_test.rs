use super::*;
use crate::net::types::ChatMessage;

type BufferView = TerminalView<Vec<u8>, Vec<u8>>;

fn buffers() -> BufferView {
    TerminalView::new(Vec::new(), Vec::new())
}

fn output(view: BufferView) -> String {
    String::from_utf8(view.into_parts().0).unwrap()
}

#[test]
fn staged_input_is_read_and_cleared() {
    let mut view = buffers();
    assert_eq!(view.input_text(), "");

    view.stage_input("hello".into());
    assert_eq!(view.input_text(), "hello");

    view.clear_input();
    assert_eq!(view.input_text(), "");
}

#[test]
fn append_prints_one_sanitized_line() {
    let mut view = buffers();
    view.append_line(&ChatLine::from(&ChatMessage::new("alice", "hi\u{1b}[2J")));
    view.scroll_to_latest();

    assert_eq!(view.lines(), 1);
    assert_eq!(output(view), "alice: hi[2J\n");
}

#[test]
fn replace_reprints_under_marker() {
    let mut view = buffers();
    view.append_line(&ChatLine::from(&ChatMessage::new("a", "old")));
    view.replace_lines(&[
        ChatLine::from(&ChatMessage::new("b", "x")),
        ChatLine::from(&ChatMessage::new("b", "y")),
    ]);

    assert_eq!(view.lines(), 2);
    assert_eq!(output(view), format!("a: old\n{HISTORY_MARKER}\nb: x\nb: y\n"));
}

#[test]
fn remove_oldest_only_adjusts_count() {
    let mut view = buffers();
    view.append_line(&ChatLine::from(&ChatMessage::new("a", "1")));
    view.remove_oldest(5);
    assert_eq!(view.lines(), 0);
    assert_eq!(output(view), "a: 1\n");
}

#[test]
fn notice_goes_to_notice_stream_only() {
    let mut view = buffers();
    view.append_line(&ChatLine::from(&ChatMessage::new("a", "1")));
    view.notice("reconnecting in 1s");

    assert_eq!(view.lines(), 1);
    let (out, notices) = view.into_parts();
    assert_eq!(String::from_utf8(out).unwrap(), "a: 1\n");
    assert_eq!(String::from_utf8(notices).unwrap(), "* reconnecting in 1s\n");
}

// =============================================================
// Repeated broadcasts
// =============================================================

#[test]
fn growing_broadcasts_under_small_limit_print_each_line_once() {
    use crate::client::ChatClient;
    use crate::config::{ClientConfig, DEFAULT_ENDPOINT};

    let config = ClientConfig::new(DEFAULT_ENDPOINT, "abc").unwrap().with_history_limit(Some(2));
    let mut client = ChatClient::new(config);
    let mut view = buffers();
    let mut window = Vec::new();
    for n in 1..=5 {
        window.push(format!(r#"{{"username":"u","content":"m{n}"}}"#));
        client.receive(&format!("[{}]", window.join(",")), &mut view).unwrap();
    }

    assert_eq!(view.lines(), 2);
    let printed = output(view);
    assert_eq!(printed.matches(HISTORY_MARKER).count(), 0);
    assert_eq!(printed, "u: m1\nu: m2\nu: m3\nu: m4\nu: m5\n");
}
