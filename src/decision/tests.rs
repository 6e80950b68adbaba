use super::*;

#[test]
fn inactive_hook_with_transcript_acts() {
    let decision =
        decide_stop(r#"{"transcript_path": "/tmp/t.jsonl", "stop_hook_active": false}"#);
    assert_eq!(
        decision,
        StopDecision::Act {
            transcript_path: Some(PathBuf::from("/tmp/t.jsonl"))
        }
    );
}

#[test]
fn inactive_hook_without_transcript_still_acts() {
    assert_eq!(
        decide_stop(r#"{"stop_hook_active": false}"#),
        StopDecision::Act {
            transcript_path: None
        }
    );
    assert_eq!(
        decide_stop(r#"{"stop_hook_active": false, "transcript_path": ""}"#),
        StopDecision::Act {
            transcript_path: None
        }
    );
}

#[test]
fn active_hook_is_suppressed() {
    assert_eq!(
        decide_stop(r#"{"transcript_path": "/tmp/t.jsonl", "stop_hook_active": true}"#),
        StopDecision::Suppressed
    );
}

#[test]
fn missing_flag_is_suppressed() {
    assert_eq!(
        decide_stop(r#"{"transcript_path": "/tmp/t.jsonl"}"#),
        StopDecision::Suppressed
    );
}

#[test]
fn extra_fields_are_ignored() {
    let input = r#"{
        "session_id": "s",
        "cwd": "/tmp",
        "hook_event_name": "Stop",
        "permission_mode": "default",
        "stop_hook_active": false
    }"#;
    assert!(matches!(decide_stop(input), StopDecision::Act { .. }));
}

#[test]
fn garbage_is_malformed() {
    assert!(matches!(decide_stop("not json"), StopDecision::Malformed(_)));
    assert!(matches!(decide_stop(""), StopDecision::Malformed(_)));
    assert!(matches!(decide_stop("[false]"), StopDecision::Malformed(_)));
}

#[test]
fn display_describes_decision() {
    assert_eq!(StopDecision::Suppressed.to_string(), "stop hook already active");
    assert_eq!(
        StopDecision::Act {
            transcript_path: None
        }
        .to_string(),
        "act without transcript"
    );
}
