use anyhow::{Result, anyhow};
use base64::{Engine as _, engine::general_purpose};

use crate::mail::api::MessagePart;

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";

/// Walk the payload tree depth-first, left-to-right, and return the decoded
/// text of the best-matching part (empty string when nothing matches).
///
/// With a filter, the first part of that exact content type carrying inline
/// data wins. Without one, HTML is preferred: a plain-text part is remembered
/// as a fallback, but an HTML part returns immediately.
///
/// Decode failures are hard errors for the record; the downloader isolates
/// them per message.
pub fn extract_content(payload: &MessagePart, filter: Option<&str>) -> Result<String> {
    if payload.parts.is_empty() {
        return extract_leaf(payload, filter);
    }

    let mut content = String::new();

    for part in &payload.parts {
        match filter {
            Some(mime) => {
                if part.mime_type == mime
                    && let Some(data) = &part.body.data
                {
                    return decode_part(data, &part.mime_type);
                }
            }
            None => {
                if part.mime_type == TEXT_HTML {
                    if let Some(data) = &part.body.data {
                        return decode_part(data, &part.mime_type);
                    }
                } else if part.mime_type == TEXT_PLAIN
                    && content.is_empty()
                    && let Some(data) = &part.body.data
                {
                    // Remember plain text; an HTML sibling may still show up.
                    content = decode_part(data, &part.mime_type)?;
                }
            }
        }

        if !part.parts.is_empty() {
            let nested = extract_content(part, filter)?;
            if !nested.is_empty() {
                return Ok(nested);
            }
        }
    }

    Ok(content)
}

fn extract_leaf(payload: &MessagePart, filter: Option<&str>) -> Result<String> {
    let is_text = payload.mime_type == TEXT_HTML || payload.mime_type == TEXT_PLAIN;
    let matches = match filter {
        Some(mime) => payload.mime_type == mime,
        None => is_text,
    };

    if is_text && matches
        && let Some(data) = &payload.body.data
    {
        return decode_part(data, &payload.mime_type);
    }
    Ok(String::new())
}

fn decode_part(data: &str, mime_type: &str) -> Result<String> {
    let bytes = general_purpose::URL_SAFE
        .decode(data)
        .map_err(|e| anyhow!("invalid base64 in {mime_type} part: {e}"))?;
    String::from_utf8(bytes).map_err(|e| anyhow!("{mime_type} part is not UTF-8: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::api::PartBody;

    fn encode(text: &str) -> String {
        general_purpose::URL_SAFE.encode(text)
    }

    fn leaf(mime: &str, text: &str) -> MessagePart {
        MessagePart {
            mime_type: mime.to_string(),
            body: PartBody {
                data: Some(encode(text)),
                size: Some(text.len() as u64),
            },
            ..Default::default()
        }
    }

    fn container(mime: &str, parts: Vec<MessagePart>) -> MessagePart {
        MessagePart {
            mime_type: mime.to_string(),
            parts,
            ..Default::default()
        }
    }

    #[test]
    fn html_preferred_over_plain_when_unfiltered() {
        let payload = container(
            "multipart/alternative",
            vec![leaf(TEXT_PLAIN, "plain body"), leaf(TEXT_HTML, "<p>html</p>")],
        );
        assert_eq!(extract_content(&payload, None).unwrap(), "<p>html</p>");
    }

    #[test]
    fn plain_returned_when_no_html_exists() {
        let payload = container("multipart/alternative", vec![leaf(TEXT_PLAIN, "plain body")]);
        assert_eq!(extract_content(&payload, None).unwrap(), "plain body");
    }

    #[test]
    fn filter_wins_over_preference_order() {
        let payload = container(
            "multipart/alternative",
            vec![leaf(TEXT_PLAIN, "plain body"), leaf(TEXT_HTML, "<p>html</p>")],
        );
        assert_eq!(
            extract_content(&payload, Some(TEXT_PLAIN)).unwrap(),
            "plain body"
        );
    }

    #[test]
    fn nested_containers_yield_first_matching_leaf() {
        let payload = container(
            "multipart/mixed",
            vec![
                container("multipart/related", vec![leaf("image/png", "ignored")]),
                container(
                    "multipart/alternative",
                    vec![leaf(TEXT_PLAIN, "inner plain"), leaf(TEXT_HTML, "inner html")],
                ),
            ],
        );
        assert_eq!(extract_content(&payload, None).unwrap(), "inner html");
        assert_eq!(
            extract_content(&payload, Some(TEXT_PLAIN)).unwrap(),
            "inner plain"
        );
    }

    #[test]
    fn remembered_plain_survives_empty_sibling_container() {
        let payload = container(
            "multipart/mixed",
            vec![
                leaf(TEXT_PLAIN, "plain body"),
                container("multipart/related", vec![leaf("image/png", "ignored")]),
            ],
        );
        assert_eq!(extract_content(&payload, None).unwrap(), "plain body");
    }

    #[test]
    fn bare_leaf_decodes_directly() {
        let payload = leaf(TEXT_PLAIN, "just text");
        assert_eq!(extract_content(&payload, None).unwrap(), "just text");
        assert_eq!(extract_content(&payload, Some(TEXT_HTML)).unwrap(), "");
    }

    #[test]
    fn no_match_yields_empty_string() {
        let payload = container("multipart/mixed", vec![leaf("application/pdf", "x")]);
        assert_eq!(extract_content(&payload, None).unwrap(), "");
    }

    #[test]
    fn malformed_base64_is_a_hard_error() {
        let mut part = leaf(TEXT_PLAIN, "x");
        part.body.data = Some("!!! not base64 !!!".to_string());
        let payload = container("multipart/alternative", vec![part]);
        assert!(extract_content(&payload, Some(TEXT_PLAIN)).is_err());
    }

    #[test]
    fn non_utf8_payload_is_a_hard_error() {
        let mut part = leaf(TEXT_PLAIN, "x");
        part.body.data = Some(general_purpose::URL_SAFE.encode([0xff, 0xfe, 0xfd]));
        let payload = container("multipart/alternative", vec![part]);
        assert!(extract_content(&payload, Some(TEXT_PLAIN)).is_err());
    }
}
