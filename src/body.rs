//! MIME part-tree reconstruction: text/html bodies and the attachment manifest

use base64::{engine::general_purpose, Engine as _};
use google_gmail1::api::MessagePart;

use crate::models::Attachment;

/// Walk the part tree depth-first and rebuild the plain-text and HTML bodies.
///
/// Multiple parts of the same type at different nesting depths concatenate in
/// traversal order. An unreadable part contributes an empty string; it never
/// fails the message.
pub fn reconstruct(payload: &MessagePart) -> (String, String) {
    let mut text = String::new();
    let mut html = String::new();
    walk_bodies(payload, &mut text, &mut html);
    (text, html)
}

fn walk_bodies(part: &MessagePart, text: &mut String, html: &mut String) {
    match &part.parts {
        Some(children) => {
            for child in children {
                let mime = child.mime_type.as_deref().unwrap_or("");
                if mime == "text/plain" {
                    text.push_str(&decode_part(child));
                } else if mime == "text/html" {
                    html.push_str(&decode_part(child));
                } else if mime.starts_with("multipart/") {
                    walk_bodies(child, text, html);
                }
            }
        }
        // A payload with no parts list is a single part at the root
        None => {
            let mime = part.mime_type.as_deref().unwrap_or("");
            if mime == "text/plain" {
                text.push_str(&decode_part(part));
            } else if mime == "text/html" {
                html.push_str(&decode_part(part));
            }
        }
    }
}

/// Collect the attachment manifest from the same tree, preserving traversal
/// order. A part qualifies when it carries a non-empty filename and a body
/// reference with an attachment identifier.
pub fn collect_attachments(payload: &MessagePart) -> Vec<Attachment> {
    let mut manifest = Vec::new();
    walk_attachments(payload, &mut manifest);
    manifest
}

fn walk_attachments(part: &MessagePart, manifest: &mut Vec<Attachment>) {
    let filename = part.filename.as_deref().unwrap_or("");
    if !filename.is_empty() {
        if let Some(attachment_id) = part.body.as_ref().and_then(|b| b.attachment_id.clone()) {
            manifest.push(Attachment {
                filename: filename.to_string(),
                mime_type: part.mime_type.clone().unwrap_or_default(),
                attachment_id,
                size: part
                    .body
                    .as_ref()
                    .and_then(|b| b.size)
                    .map(|s| s.max(0) as u64)
                    .unwrap_or(0),
            });
        }
    }

    if let Some(children) = &part.parts {
        for child in children {
            walk_attachments(child, manifest);
        }
    }
}

fn decode_part(part: &MessagePart) -> String {
    match part.body.as_ref().and_then(|b| b.data.as_ref()) {
        Some(data) => decode_body_text(data),
        None => String::new(),
    }
}

/// Decode one part's body data to text.
///
/// Provider payloads carry base64url text; pre-decoded UTF-8 bytes pass
/// through unchanged. Anything else contributes an empty string.
pub fn decode_body_text(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }
    let encoded = String::from_utf8_lossy(data);
    let trimmed = encoded.trim();

    let decoded = general_purpose::URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| general_purpose::URL_SAFE.decode(trimmed));

    match decoded {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_default(),
        Err(_) => std::str::from_utf8(data).map(str::to_owned).unwrap_or_default(),
    }
}

/// Decode a fetched attachment payload to raw bytes, tolerating providers
/// that return the data already decoded.
pub fn decode_attachment_bytes(data: &[u8]) -> Vec<u8> {
    let encoded = String::from_utf8_lossy(data);
    let trimmed = encoded.trim();

    general_purpose::URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| general_purpose::URL_SAFE.decode(trimmed))
        .unwrap_or_else(|_| data.to_vec())
}
