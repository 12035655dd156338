// ABOUTME: Builds the webhook payload from a document summary and transcript
// ABOUTME: Flattens ProseMirror notes to plain text, normalizes segment offsets

use crate::util::normalize_timestamp;
use crate::{DeliveryPayload, DocumentSummary, PayloadSegment, Segment};
use chrono::{DateTime, Utc};

pub fn build_payload(
    summary: &DocumentSummary,
    segments: &[Segment],
    synced_at: DateTime<Utc>,
) -> DeliveryPayload {
    let transcript = segments
        .iter()
        .filter(|seg| !seg.text.is_empty())
        .map(|seg| PayloadSegment {
            offset: seg.start.as_ref().and_then(normalize_timestamp),
            speaker: seg.speaker.clone().unwrap_or_else(|| "Unknown".into()),
            text: seg.text.clone(),
        })
        .collect();

    let notes = summary
        .last_viewed_panel
        .as_ref()
        .map(|panel| prosemirror_text(&panel.content))
        .unwrap_or_default();

    DeliveryPayload {
        source: "granola".into(),
        document_id: summary.id.clone(),
        title: summary
            .title
            .clone()
            .unwrap_or_else(|| "Untitled Meeting".into()),
        created_at: summary.created_at,
        transcript,
        notes,
        attendees: summary.attendees.clone(),
        synced_at,
    }
}

/// Flatten a ProseMirror document to plain text: collect `text` leaves in
/// order, one line per top-level block.
fn prosemirror_text(node: &serde_json::Value) -> String {
    let mut lines = Vec::new();

    if let Some(blocks) = node.get("content").and_then(|c| c.as_array()) {
        for block in blocks {
            let mut line = String::new();
            collect_text(block, &mut line);
            if !line.is_empty() {
                lines.push(line);
            }
        }
    } else {
        let mut line = String::new();
        collect_text(node, &mut line);
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines.join("\n")
}

fn collect_text(node: &serde_json::Value, out: &mut String) {
    if let Some(text) = node.get("text").and_then(|t| t.as_str()) {
        out.push_str(text);
    }
    if let Some(children) = node.get("content").and_then(|c| c.as_array()) {
        for child in children {
            collect_text(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimestampValue;

    fn summary_with_panel(panel: Option<serde_json::Value>) -> DocumentSummary {
        serde_json::from_value(serde_json::json!({
            "id": "doc1",
            "title": "Weekly Sync",
            "created_at": "2025-10-28T15:04:05Z",
            "attendees": ["alice@example.com"],
            "last_viewed_panel": panel.map(|content| serde_json::json!({"content": content})),
        }))
        .unwrap()
    }

    #[test]
    fn test_build_payload_basic() {
        let summary = summary_with_panel(None);
        let segments = vec![Segment {
            speaker: Some("Alice".into()),
            start: Some(TimestampValue::Seconds(65.0)),
            end: None,
            text: "Let's get started".into(),
        }];

        let payload = build_payload(&summary, &segments, "2025-10-29T00:00:00Z".parse().unwrap());
        assert_eq!(payload.source, "granola");
        assert_eq!(payload.document_id, "doc1");
        assert_eq!(payload.title, "Weekly Sync");
        assert_eq!(payload.transcript.len(), 1);
        assert_eq!(payload.transcript[0].speaker, "Alice");
        assert_eq!(payload.transcript[0].offset.as_deref(), Some("00:01:05"));
        assert_eq!(payload.attendees, vec!["alice@example.com"]);
    }

    #[test]
    fn test_build_payload_untitled_and_empty_transcript() {
        let mut summary = summary_with_panel(None);
        summary.title = None;

        let payload = build_payload(&summary, &[], "2025-10-29T00:00:00Z".parse().unwrap());
        assert_eq!(payload.title, "Untitled Meeting");
        assert!(payload.transcript.is_empty());
        assert!(payload.notes.is_empty());
    }

    #[test]
    fn test_build_payload_skips_empty_segments() {
        let summary = summary_with_panel(None);
        let segments = vec![
            Segment {
                speaker: None,
                start: None,
                end: None,
                text: String::new(),
            },
            Segment {
                speaker: None,
                start: None,
                end: None,
                text: "Hello".into(),
            },
        ];

        let payload = build_payload(&summary, &segments, Utc::now());
        assert_eq!(payload.transcript.len(), 1);
        assert_eq!(payload.transcript[0].speaker, "Unknown");
    }

    #[test]
    fn test_prosemirror_notes_flattened() {
        let summary = summary_with_panel(Some(serde_json::json!({
            "type": "doc",
            "content": [
                {"type": "heading", "content": [{"type": "text", "text": "Action Items"}]},
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "Ship the "},
                    {"type": "text", "marks": [{"type": "bold"}], "text": "release"}
                ]}
            ]
        })));

        let payload = build_payload(&summary, &[], Utc::now());
        assert_eq!(payload.notes, "Action Items\nShip the release");
    }

    #[test]
    fn test_payload_serializes_expected_shape() {
        let summary = summary_with_panel(None);
        let payload = build_payload(&summary, &[], "2025-10-29T00:00:00Z".parse().unwrap());

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["source"], "granola");
        assert_eq!(value["document_id"], "doc1");
        assert!(value["synced_at"].is_string());
        assert!(value["transcript"].is_array());
    }
}
