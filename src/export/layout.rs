use std::path::PathBuf;

use crate::types::Message;

const SEPARATOR: char = '/';

/// `"{subject} - {date}"` from the first `Subject` and `Date` headers. A
/// missing header leaves its segment empty.
pub fn file_name(message: &Message) -> String {
    let mut subject = None;
    let mut date = None;
    for header in &message.payload.headers {
        match header.name.as_str() {
            "Subject" if subject.is_none() => subject = Some(header.value.as_str()),
            "Date" if date.is_none() => date = Some(header.value.as_str()),
            _ => {}
        }
    }

    let name = format!(
        "{} - {}",
        subject.unwrap_or_default(),
        date.unwrap_or_default()
    );
    // Only what would escape the target directory or fail every open.
    name.replace([SEPARATOR, '\0'], "_")
}

/// Appends a trailing separator when missing.
pub fn normalize_dir(dir: &str) -> String {
    if dir.ends_with(SEPARATOR) {
        dir.to_string()
    } else {
        format!("{dir}{SEPARATOR}")
    }
}

pub fn file_path(dir: &str, name: &str) -> PathBuf {
    PathBuf::from(format!("{}{name}.html", normalize_dir(dir)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Header, MessagePart};
    use std::path::Path;

    fn message(headers: &[(&str, &str)]) -> Message {
        Message {
            id: "m1".into(),
            payload: MessagePart {
                headers: headers
                    .iter()
                    .map(|(n, v)| Header {
                        name: n.to_string(),
                        value: v.to_string(),
                    })
                    .collect(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn joins_subject_and_date() {
        let msg = message(&[
            ("From", "a@example.com"),
            ("Date", "Mon, 1 Jan 2024 10:00:00 +0000"),
            ("Subject", "Hello"),
        ]);
        assert_eq!(file_name(&msg), "Hello - Mon, 1 Jan 2024 10:00:00 +0000");
    }

    #[test]
    fn first_occurrence_wins() {
        let msg = message(&[
            ("Subject", "one"),
            ("Date", "d1"),
            ("Subject", "two"),
            ("Date", "d2"),
        ]);
        assert_eq!(file_name(&msg), "one - d1");
    }

    #[test]
    fn missing_headers_leave_empty_segments() {
        assert_eq!(file_name(&message(&[("Subject", "Hi")])), "Hi - ");
        assert_eq!(file_name(&message(&[])), " - ");
    }

    #[test]
    fn header_names_are_case_sensitive() {
        assert_eq!(file_name(&message(&[("subject", "lower")])), " - ");
    }

    #[test]
    fn separators_are_replaced() {
        let msg = message(&[("Subject", "Q1/Q2 report"), ("Date", "1/2/2024")]);
        assert_eq!(file_name(&msg), "Q1_Q2 report - 1_2_2024");
    }

    #[test]
    fn builds_html_path() {
        assert_eq!(
            file_path("/out/", "Hello - Mon"),
            Path::new("/out/Hello - Mon.html")
        );
        assert_eq!(file_path("/out", "X"), Path::new("/out/X.html"));
        assert_eq!(normalize_dir("/out"), "/out/");
        assert_eq!(normalize_dir("/out/"), "/out/");
    }
}
