//! Rewrites file citations in assistant replies as numbered footnotes.

use tracing::warn;

use super::prompts::UNREADABLE_REPLY;
use super::session::FileInfo;
use crate::openai::Message;

/// Format a message, replacing each annotation with ` [n]` and listing file
/// citations under a references block.
pub fn format_with_citations(message: &Message, files: &[FileInfo]) -> String {
    let Some(content) = message.first_text() else {
        warn!("Message {} has no text content", message.id);
        return UNREADABLE_REPLY.to_string();
    };

    let mut text = content.value.clone();
    let mut references = Vec::new();

    for (index, annotation) in content.annotations.iter().enumerate() {
        let marker = format!(" [{}]", index + 1);
        if !annotation.text.is_empty() {
            text = text.replace(&annotation.text, &marker);
        }

        if let Some(citation) = &annotation.file_citation {
            let source = files
                .iter()
                .find(|f| f.file_id == citation.file_id)
                .map(|f| f.filename.clone())
                .unwrap_or_else(|| format!("ID: {}", citation.file_id));
            references.push(format!(
                "[{}] \"{}\" (de {})",
                index + 1,
                citation.quote.as_deref().unwrap_or_default(),
                source
            ));
        }
    }

    if references.is_empty() {
        text
    } else {
        format!("{}\n\n**Referencias:**\n{}", text, references.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(value: serde_json::Value) -> Message {
        serde_json::from_value(value).unwrap()
    }

    fn files() -> Vec<FileInfo> {
        vec![FileInfo::new("file-ley", "Ley 100 de 1993.pdf")]
    }

    #[test]
    fn test_citations_become_footnotes() {
        let msg = message(serde_json::json!({
            "id": "msg_1",
            "role": "assistant",
            "content": [{"type": "text", "text": {
                "value": "El artículo aplica【4:0†ley.txt】 y también【4:1†otro.txt】.",
                "annotations": [
                    {"type": "file_citation", "text": "【4:0†ley.txt】",
                     "file_citation": {"file_id": "file-ley", "quote": "Artículo 48"}},
                    {"type": "file_citation", "text": "【4:1†otro.txt】",
                     "file_citation": {"file_id": "file-zzz", "quote": "Parágrafo"}}
                ]
            }}]
        }));

        let out = format_with_citations(&msg, &files());
        assert_eq!(
            out,
            "El artículo aplica [1] y también [2].\n\n**Referencias:**\n\
             [1] \"Artículo 48\" (de Ley 100 de 1993.pdf)\n\
             [2] \"Parágrafo\" (de ID: file-zzz)"
        );
    }

    #[test]
    fn test_plain_text_unchanged() {
        let msg = message(serde_json::json!({
            "id": "msg_2",
            "role": "assistant",
            "content": [{"type": "text", "text": {"value": "Sin citas.", "annotations": []}}]
        }));
        assert_eq!(format_with_citations(&msg, &[]), "Sin citas.");
    }

    #[test]
    fn test_non_file_annotation_numbered_without_reference() {
        let msg = message(serde_json::json!({
            "id": "msg_3",
            "role": "assistant",
            "content": [{"type": "text", "text": {
                "value": "Descarga【0†archivo】",
                "annotations": [{"type": "file_path", "text": "【0†archivo】",
                                 "file_path": {"file_id": "file-out"}}]
            }}]
        }));
        assert_eq!(format_with_citations(&msg, &files()), "Descarga [1]");
    }

    #[test]
    fn test_message_without_text_falls_back() {
        let msg = message(serde_json::json!({
            "id": "msg_4",
            "role": "assistant",
            "content": [{"type": "image_file", "image_file": {"file_id": "f"}}]
        }));
        assert_eq!(format_with_citations(&msg, &[]), UNREADABLE_REPLY);
    }
}
