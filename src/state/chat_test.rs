use super::*;

fn msg(user: &str, content: &str) -> ChatMessage {
    ChatMessage::new(user, content)
}

fn contents(state: &ChatState) -> Vec<&str> {
    state.messages().iter().map(|m| m.content.as_str()).collect()
}

// =============================================================
// ChatState defaults
// =============================================================

#[test]
fn chat_state_default_empty_messages() {
    let state = ChatState::default();
    assert!(state.is_empty());
    assert_eq!(state.len(), 0);
}

// =============================================================
// push
// =============================================================

#[test]
fn push_appends_in_arrival_order() {
    let mut state = ChatState::default();
    assert_eq!(state.push(msg("alice", "1")), 0);
    assert_eq!(state.push(msg("bob", "2")), 0);
    assert_eq!(contents(&state), vec!["1", "2"]);
}

#[test]
fn push_keeps_duplicates() {
    let mut state = ChatState::default();
    state.push(msg("alice", "hi"));
    state.push(msg("alice", "hi"));
    assert_eq!(state.len(), 2);
}

#[test]
fn push_evicts_oldest_past_limit() {
    let mut state = ChatState::new(Some(2));
    state.push(msg("a", "1"));
    state.push(msg("a", "2"));
    assert_eq!(state.push(msg("a", "3")), 1);
    assert_eq!(contents(&state), vec!["2", "3"]);
}

// =============================================================
// merge_snapshot
// =============================================================

#[test]
fn merge_into_empty_takes_snapshot() {
    let mut state = ChatState::default();
    let merge = state.merge_snapshot(vec![msg("a", "1"), msg("b", "2")]);
    assert_eq!(merge, SnapshotMerge::Appended { added: 2, evicted: 0 });
    assert_eq!(contents(&state), vec!["1", "2"]);
}

#[test]
fn merge_appends_only_unseen_tail() {
    let mut state = ChatState::default();
    state.merge_snapshot(vec![msg("a", "1"), msg("b", "2")]);
    let merge = state.merge_snapshot(vec![msg("a", "1"), msg("b", "2"), msg("c", "3")]);
    assert_eq!(merge, SnapshotMerge::Appended { added: 1, evicted: 0 });
    assert_eq!(contents(&state), vec!["1", "2", "3"]);
}

#[test]
fn merge_follows_sliding_server_window() {
    let mut state = ChatState::default();
    state.merge_snapshot(vec![msg("a", "1"), msg("a", "2"), msg("a", "3")]);
    // Server window dropped "1" and added "4".
    let merge = state.merge_snapshot(vec![msg("a", "2"), msg("a", "3"), msg("a", "4")]);
    assert_eq!(merge, SnapshotMerge::Appended { added: 1, evicted: 0 });
    assert_eq!(contents(&state), vec!["1", "2", "3", "4"]);
}

#[test]
fn merge_identical_snapshot_is_noop() {
    let mut state = ChatState::default();
    state.merge_snapshot(vec![msg("a", "1"), msg("a", "2")]);
    let merge = state.merge_snapshot(vec![msg("a", "1"), msg("a", "2")]);
    assert_eq!(merge, SnapshotMerge::Appended { added: 0, evicted: 0 });
    assert_eq!(state.len(), 2);
}

#[test]
fn merge_handles_repeated_messages() {
    let mut state = ChatState::default();
    state.push(msg("a", "hi"));
    let merge = state.merge_snapshot(vec![msg("a", "hi"), msg("a", "hi")]);
    assert_eq!(merge, SnapshotMerge::Appended { added: 1, evicted: 0 });
    assert_eq!(state.len(), 2);
}

#[test]
fn merge_unrelated_snapshot_replaces() {
    let mut state = ChatState::default();
    state.push(msg("a", "old"));
    let merge = state.merge_snapshot(vec![msg("b", "new")]);
    assert_eq!(merge, SnapshotMerge::Replaced);
    assert_eq!(contents(&state), vec!["new"]);
}

#[test]
fn merge_timestamp_difference_breaks_overlap() {
    let mut state = ChatState::default();
    state.push(msg("a", "1").with_timestamp("t1"));
    let merge = state.merge_snapshot(vec![msg("a", "1").with_timestamp("t2")]);
    assert_eq!(merge, SnapshotMerge::Replaced);
}

#[test]
fn merge_respects_history_limit() {
    let mut state = ChatState::new(Some(2));
    state.push(msg("a", "1"));
    let merge = state.merge_snapshot(vec![msg("a", "1"), msg("a", "2"), msg("a", "3")]);
    assert_eq!(merge, SnapshotMerge::Appended { added: 2, evicted: 1 });
    assert_eq!(contents(&state), vec!["2", "3"]);
}

// =============================================================
// Limit below the server window
// =============================================================

fn window(contents: &[&str]) -> Vec<ChatMessage> {
    contents.iter().map(|c| msg("a", c)).collect()
}

#[test]
fn merge_growing_window_past_limit_keeps_appending() {
    let mut state = ChatState::new(Some(2));
    let all = ["m1", "m2", "m3", "m4", "m5"];

    let merges: Vec<SnapshotMerge> = (1..=all.len()).map(|n| state.merge_snapshot(window(&all[..n]))).collect();

    assert_eq!(
        merges,
        vec![
            SnapshotMerge::Appended { added: 1, evicted: 0 },
            SnapshotMerge::Appended { added: 1, evicted: 0 },
            SnapshotMerge::Appended { added: 1, evicted: 1 },
            SnapshotMerge::Appended { added: 1, evicted: 1 },
            SnapshotMerge::Appended { added: 1, evicted: 1 },
        ]
    );
    assert_eq!(contents(&state), vec!["m4", "m5"]);
}

#[test]
fn merge_full_window_sliding_past_limit_keeps_appending() {
    let mut state = ChatState::new(Some(2));
    state.merge_snapshot(window(&["m1", "m2", "m3"]));

    let merge = state.merge_snapshot(window(&["m2", "m3", "m4"]));

    assert_eq!(merge, SnapshotMerge::Appended { added: 1, evicted: 1 });
    assert_eq!(contents(&state), vec!["m3", "m4"]);
}

#[test]
fn merge_trimmed_transcript_aligns_mid_window() {
    let mut state = ChatState::new(Some(2));
    state.merge_snapshot(window(&["m1", "m2", "m3", "m4"]));

    let merge = state.merge_snapshot(window(&["m1", "m2", "m3", "m4", "m5", "m6"]));

    assert_eq!(merge, SnapshotMerge::Appended { added: 2, evicted: 2 });
    assert_eq!(contents(&state), vec!["m5", "m6"]);
}

#[test]
fn merge_window_of_repeats_appends_its_newest_entry() {
    let mut state = ChatState::new(Some(2));
    state.merge_snapshot(window(&["ok", "ok", "ok"]));

    let merge = state.merge_snapshot(window(&["ok", "ok", "ok"]));

    assert_eq!(merge, SnapshotMerge::Appended { added: 1, evicted: 1 });
    assert_eq!(state.len(), 2);
}

#[test]
fn merge_repeat_run_prefers_latest_position_with_new_entry() {
    let mut state = ChatState::default();
    state.merge_snapshot(window(&["x", "y", "y"]));

    let merge = state.merge_snapshot(window(&["x", "y", "y", "z"]));

    assert_eq!(merge, SnapshotMerge::Appended { added: 1, evicted: 0 });
    assert_eq!(contents(&state), vec!["x", "y", "y", "z"]);
}
