//! Turns a Gmail payload tree into the bytes written to disk.
//!
//! Only the HTML-ish leaves are kept: plain-text alternatives are dropped when
//! a richer sibling exists, and payloads that are neither text nor one of the
//! known multipart containers decode to nothing.
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::errors::{AppError, AppResult};
use crate::types::MessagePart;

/// Gmail emits URL-safe base64, usually padded. Accept both forms.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeKind {
    TextPlain,
    TextHtml,
    MultipartAlternative,
    MultipartMixed,
    MultipartRelated,
    Other(String),
}

impl MimeKind {
    pub fn parse(mime_type: &str) -> Self {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "text/plain" => Self::TextPlain,
            "text/html" => Self::TextHtml,
            "multipart/alternative" => Self::MultipartAlternative,
            "multipart/mixed" => Self::MultipartMixed,
            "multipart/related" => Self::MultipartRelated,
            _ => Self::Other(essence),
        }
    }
}

impl From<&MessagePart> for MimeKind {
    fn from(part: &MessagePart) -> Self {
        Self::parse(&part.mime_type)
    }
}

/// Decode the body selected for export. Pure: the same payload always yields
/// the same bytes.
pub fn decode(payload: &MessagePart) -> AppResult<Vec<u8>> {
    match MimeKind::from(payload) {
        MimeKind::TextPlain | MimeKind::TextHtml => decode_inline(payload),
        MimeKind::MultipartAlternative => decode_alternative(&payload.parts),
        MimeKind::MultipartMixed | MimeKind::MultipartRelated => decode_mixed(&payload.parts),
        MimeKind::Other(_) => Ok(Vec::new()),
    }
}

/// Base64-decode a part's inline body. A part without data yields no bytes.
pub fn decode_inline(part: &MessagePart) -> AppResult<Vec<u8>> {
    URL_SAFE_LENIENT
        .decode(part.data())
        .map_err(|source| AppError::Decode {
            part: part_label(part),
            source,
        })
}

fn decode_alternative(parts: &[MessagePart]) -> AppResult<Vec<u8>> {
    let mut data = Vec::new();
    for part in rich_parts(parts) {
        data.extend(decode_inline(part)?);
    }
    Ok(data)
}

fn decode_mixed(parts: &[MessagePart]) -> AppResult<Vec<u8>> {
    let mut data = Vec::new();
    for part in parts {
        let decoded = match MimeKind::from(part) {
            MimeKind::MultipartAlternative => last_rich_child(&part.parts)?,
            _ => decode_inline(part)?,
        };
        data.extend(decoded);
    }
    Ok(data)
}

/// A nested alternative keeps only its last non-plain child. Every child is
/// still decoded so malformed data is reported.
fn last_rich_child(parts: &[MessagePart]) -> AppResult<Vec<u8>> {
    let mut kept = Vec::new();
    for part in rich_parts(parts) {
        kept = decode_inline(part)?;
    }
    Ok(kept)
}

fn rich_parts(parts: &[MessagePart]) -> impl Iterator<Item = &MessagePart> {
    parts
        .iter()
        .filter(|p| MimeKind::from(*p) != MimeKind::TextPlain)
}

fn part_label(part: &MessagePart) -> String {
    if part.part_id.is_empty() {
        "message body".to_string()
    } else {
        format!("part {}", part.part_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessagePartBody;

    fn leaf(part_id: &str, mime: &str, data: &str) -> MessagePart {
        MessagePart {
            part_id: part_id.into(),
            mime_type: mime.into(),
            body: MessagePartBody {
                data: Some(data.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn container(part_id: &str, mime: &str, parts: Vec<MessagePart>) -> MessagePart {
        MessagePart {
            part_id: part_id.into(),
            mime_type: mime.into(),
            parts,
            ..Default::default()
        }
    }

    #[test]
    fn mime_kind_ignores_case_and_parameters() {
        assert_eq!(MimeKind::parse("TEXT/HTML; charset=utf-8"), MimeKind::TextHtml);
        assert_eq!(
            MimeKind::parse("multipart/Related"),
            MimeKind::MultipartRelated
        );
        assert_eq!(
            MimeKind::parse("application/pdf"),
            MimeKind::Other("application/pdf".into())
        );
    }

    #[test]
    fn text_bodies_decode_verbatim() {
        let html = leaf("", "text/html", "PGI-aGk8L2I-");
        assert_eq!(decode(&html).unwrap(), b"<b>hi</b>");

        let plain = leaf("", "text/plain", "aGk=");
        assert_eq!(decode(&plain).unwrap(), b"hi");
    }

    #[test]
    fn unpadded_and_url_safe_characters_are_accepted() {
        let part = leaf("", "text/plain", "YT8_Pg");
        assert_eq!(decode(&part).unwrap(), b"a??>");
    }

    #[test]
    fn missing_data_decodes_to_empty() {
        let part = MessagePart {
            mime_type: "text/html".into(),
            ..Default::default()
        };
        assert!(decode(&part).unwrap().is_empty());
    }

    #[test]
    fn alternative_drops_plain_and_concatenates_the_rest() {
        let payload = container(
            "",
            "multipart/alternative",
            vec![
                leaf("0", "text/plain", "cGxhaW4="),
                leaf("1", "text/html", "PHA-cmljaDwvcD4="),
                leaf("2", "text/html", "PGk-eDwvaT4="),
            ],
        );
        assert_eq!(decode(&payload).unwrap(), b"<p>rich</p><i>x</i>");
    }

    #[test]
    fn alternative_of_only_plain_is_empty() {
        let payload = container(
            "",
            "multipart/alternative",
            vec![
                leaf("0", "text/plain", "cGxhaW4="),
                leaf("1", "text/plain", "aGk="),
            ],
        );
        assert!(decode(&payload).unwrap().is_empty());
    }

    #[test]
    fn mixed_concatenates_simple_parts_in_order() {
        let payload = container(
            "",
            "multipart/mixed",
            vec![
                leaf("0", "text/plain", "SGVsbG8="),
                leaf("1", "text/html", "PGI-aGk8L2I-"),
            ],
        );
        assert_eq!(decode(&payload).unwrap(), b"Hello<b>hi</b>");
    }

    #[test]
    fn nested_alternative_keeps_only_last_rich_child() {
        let payload = container(
            "",
            "multipart/related",
            vec![
                container(
                    "0",
                    "multipart/alternative",
                    vec![
                        leaf("0.0", "text/plain", "cGxhaW4="),
                        leaf("0.1", "text/html", "PHA-cmljaDwvcD4="),
                        leaf("0.2", "text/html", "PGk-eDwvaT4="),
                    ],
                ),
                leaf("1", "text/html", "PGI-aGk8L2I-"),
            ],
        );
        assert_eq!(decode(&payload).unwrap(), b"<i>x</i><b>hi</b>");
    }

    #[test]
    fn attachment_without_inline_data_contributes_nothing() {
        let attachment = MessagePart {
            part_id: "1".into(),
            mime_type: "application/pdf".into(),
            filename: "file.pdf".into(),
            body: MessagePartBody {
                attachment_id: Some("ANGjdJ8".into()),
                size: 1024,
                data: None,
            },
            ..Default::default()
        };
        let payload = container(
            "",
            "multipart/mixed",
            vec![leaf("0", "text/html", "PGI-aGk8L2I-"), attachment],
        );
        assert_eq!(decode(&payload).unwrap(), b"<b>hi</b>");
    }

    #[test]
    fn unknown_top_level_type_is_empty() {
        let payload = leaf("", "application/octet-stream", "SGVsbG8=");
        assert!(decode(&payload).unwrap().is_empty());
    }

    #[test]
    fn malformed_base64_names_the_part() {
        let payload = container(
            "",
            "multipart/alternative",
            vec![leaf("1", "text/html", "not*base64!")],
        );
        let err = decode(&payload).unwrap_err();
        match err {
            AppError::Decode { part, .. } => assert_eq!(part, "part 1"),
            other => panic!("unexpected error: {other:?}"),
        }

        let top = leaf("", "text/plain", "%%%");
        assert!(matches!(
            decode(&top),
            Err(AppError::Decode { ref part, .. }) if part == "message body"
        ));
    }

    #[test]
    fn decode_is_pure() {
        let payload = container(
            "",
            "multipart/mixed",
            vec![leaf("0", "text/html", "PGI-aGk8L2I-")],
        );
        let before = payload.clone();
        assert_eq!(decode(&payload).unwrap(), decode(&payload).unwrap());
        assert_eq!(payload, before);
    }
}
