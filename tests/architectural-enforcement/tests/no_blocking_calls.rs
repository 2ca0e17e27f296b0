//! The conversation engine and the shell run on one tokio runtime; a
//! blocking call anywhere stalls timers and typing animation.

use architectural_enforcement::{scan_tree, workspace_root, Violation, BLOCKING_RULES};

fn assert_clean(violations: &[Violation]) {
    let report: Vec<String> = violations.iter().map(ToString::to_string).collect();
    assert!(
        violations.is_empty(),
        "blocking calls in async code:\n{}",
        report.join("\n")
    );
}

#[test]
fn test_core_has_no_blocking_calls() {
    let root = workspace_root().join("conductor").join("core").join("src");
    // Config is read once, synchronously, before the runtime does any work
    let violations = scan_tree(&root, BLOCKING_RULES, &["config/mod.rs"]).unwrap();
    assert_clean(&violations);
}

#[test]
fn test_tui_has_no_blocking_calls() {
    let root = workspace_root().join("tui").join("src");
    // main.rs opens the log file before the UI starts
    let violations = scan_tree(&root, BLOCKING_RULES, &["main.rs"]).unwrap();
    assert_clean(&violations);
}
