// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    running   = { TaskState::Running, false },
    completed = { TaskState::Completed, true },
    failed    = { TaskState::Failed, true },
    cancelled = { TaskState::Cancelled, true },
)]
fn terminal(state: TaskState, expected: bool) {
    assert_eq!(state.is_terminal(), expected);
}

#[test]
fn new_task_is_running() {
    let info = TaskInfo::new(TaskId(7), ActionKind::Push, Some("tab-1".into()), 1000);
    assert_eq!(info.state, TaskState::Running);
    assert!(!info.is_terminal());
    assert!(info.last_error.is_none());
}

#[test]
fn state_serializes_snake_case() {
    assert_eq!(
        serde_json::to_string(&TaskState::Cancelled).unwrap(),
        "\"cancelled\""
    );
}
