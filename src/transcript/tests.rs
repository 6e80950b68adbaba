use super::*;
use crate::preferences::SanitizePolicy;
use serde_json::json;
use std::fs;

// ===================================================================
// Test helpers
// ===================================================================

fn default_sanitizer() -> Sanitizer {
    Sanitizer::new(&SanitizePolicy::default()).unwrap()
}

/// Minimal assistant record whose first content block is `text`.
fn asst_line(text: &str) -> String {
    json!({
        "type": "assistant",
        "uuid": "a",
        "message": {
            "role": "assistant",
            "type": "message",
            "content": [{ "type": "text", "text": text }]
        }
    })
    .to_string()
}

fn user_line(text: &str) -> String {
    json!({
        "type": "user",
        "uuid": "u",
        "message": { "role": "user", "content": text }
    })
    .to_string()
}

// ===================================================================
// Record shape
// ===================================================================

#[test]
fn assistant_record_yields_first_block_text() {
    let record: Record = serde_json::from_str(&asst_line("hello")).unwrap();
    assert_eq!(record.assistant_text(), Some("hello"));
}

#[test]
fn user_record_is_ignored() {
    let record: Record = serde_json::from_str(&user_line("hello")).unwrap();
    assert_eq!(record.assistant_text(), None);
}

#[test]
fn assistant_record_without_message_type_is_ignored() {
    let record: Record = serde_json::from_value(json!({
        "type": "assistant",
        "message": { "role": "assistant", "content": [{ "type": "text", "text": "hi" }] }
    }))
    .unwrap();
    assert_eq!(record.assistant_text(), None);
}

#[test]
fn only_first_content_block_is_considered() {
    let record: Record = serde_json::from_value(json!({
        "type": "assistant",
        "message": {
            "type": "message",
            "content": [
                { "type": "tool_use", "id": "toolu_01", "name": "Bash", "input": {} },
                { "type": "text", "text": "second block" }
            ]
        }
    }))
    .unwrap();
    assert_eq!(record.assistant_text(), None);
}

#[test]
fn empty_text_does_not_contribute() {
    let record: Record = serde_json::from_str(&asst_line("")).unwrap();
    assert_eq!(record.assistant_text(), None);
}

// ===================================================================
// Transcript parsing
// ===================================================================

#[test]
fn last_assistant_record_wins() {
    // Assistant records on lines 2, 5 and 9; everything else is noise.
    let lines = [
        user_line("start"),
        asst_line("first"),
        "not json at all".to_string(),
        json!({ "type": "system", "subtype": "turn_duration" }).to_string(),
        asst_line("second"),
        user_line("more"),
        "{ truncated".to_string(),
        json!({ "type": "progress" }).to_string(),
        asst_line("third"),
        user_line("trailing user"),
    ];
    let (transcript, errors) = Transcript::parse(&lines.join("\n"));
    assert_eq!(transcript.last_assistant_text(), Some("third"));
    let error_lines: Vec<usize> = errors.iter().map(|(line, _)| *line).collect();
    assert_eq!(error_lines, vec![3, 7]);
}

#[test]
fn blank_lines_are_skipped_silently() {
    let contents = format!("\n\n{}\n   \n", asst_line("only"));
    let (transcript, errors) = Transcript::parse(&contents);
    assert!(errors.is_empty());
    assert_eq!(transcript.last_assistant_text(), Some("only"));
}

#[test]
fn transcript_without_assistant_records_has_no_text() {
    let contents = [user_line("a"), user_line("b")].join("\n");
    let (transcript, _) = Transcript::parse(&contents);
    assert_eq!(transcript.last_assistant_text(), None);
}

// ===================================================================
// Sanitizer
// ===================================================================

#[test]
fn sanitize_strips_noise_and_delimiters() {
    assert_eq!(
        default_sanitizer().sanitize("Optimized.,**done**").as_deref(),
        Some("done")
    );
}

#[test]
fn sanitize_keeps_optimized_used_as_a_verb() {
    assert_eq!(
        default_sanitizer()
            .sanitize("Optimized database queries for the report page")
            .as_deref(),
        Some("Optimized database queries for the report page")
    );
}

#[test]
fn sanitize_strips_chinese_noise_phrase() {
    assert_eq!(
        default_sanitizer().sanitize("优化完成。 重构了解析器").as_deref(),
        Some("重构了解析器")
    );
}

#[test]
fn sanitize_removes_only_first_noise_occurrence() {
    assert_eq!(
        default_sanitizer().sanitize("优化完成 then 优化完成").as_deref(),
        Some("then 优化完成")
    );
}

#[test]
fn sanitize_collapses_whitespace_and_newlines() {
    assert_eq!(
        default_sanitizer()
            .sanitize("  Fixed the bug,,  in\n\nthe **parser**  ")
            .as_deref(),
        Some("Fixed the bug in the parser")
    );
}

#[test]
fn sanitize_empty_result_is_none() {
    let s = default_sanitizer();
    assert_eq!(s.sanitize("Optimized."), None);
    assert_eq!(s.sanitize(" ,,** \n"), None);
}

#[test]
fn custom_policy_is_honored() {
    let policy = SanitizePolicy {
        noise_patterns: vec![r"^Done[.!]".into()],
        delimiters: "-".into(),
    };
    let s = Sanitizer::new(&policy).unwrap();
    assert_eq!(s.sanitize("Done! a--b, c").as_deref(), Some("a b, c"));
}

#[test]
fn invalid_noise_pattern_is_rejected() {
    let policy = SanitizePolicy {
        noise_patterns: vec!["(unclosed".into()],
        delimiters: ",".into(),
    };
    assert!(Sanitizer::new(&policy).is_err());
}

// ===================================================================
// Extraction
// ===================================================================

#[test]
fn extract_reads_file_and_sanitizes() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let contents = [user_line("please fix"), asst_line("fix bug**"), "garbage".into()].join("\n");
    fs::write(file.path(), contents).unwrap();
    assert_eq!(
        extract(file.path(), &default_sanitizer()).as_deref(),
        Some("fix bug")
    );
}

#[test]
fn extract_missing_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.jsonl");
    assert_eq!(extract(&missing, &default_sanitizer()), None);
}

#[test]
fn extract_without_assistant_records_is_none() {
    let file = tempfile::NamedTempFile::new().unwrap();
    fs::write(file.path(), user_line("hello")).unwrap();
    assert_eq!(extract(file.path(), &default_sanitizer()), None);
}

// ===================================================================
// Display truncation
// ===================================================================

#[test]
fn short_text_is_not_truncated() {
    assert_eq!(truncate_for_display("short", 100), "short");
    let exact = "x".repeat(100);
    assert_eq!(truncate_for_display(&exact, 100), exact);
}

#[test]
fn long_text_is_capped_with_ellipsis() {
    let long = "y".repeat(150);
    let out = truncate_for_display(&long, 100);
    assert_eq!(out.chars().count(), 100);
    assert!(out.ends_with("..."));
    assert_eq!(&out[..97], &long[..97]);
}

#[test]
fn truncation_counts_characters_not_bytes() {
    let text = "优".repeat(60);
    let out = truncate_for_display(&text, 50);
    assert_eq!(out, format!("{}...", "优".repeat(47)));
}
