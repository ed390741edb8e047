//! `git for-each-ref refs/tags` with a custom separator format.
//!
//! Records end with [`TAG_RECORD_SEPARATOR`] and hold eight fields joined by
//! [`TAG_FIELD_SEPARATOR`]: name, object type, object hash, peeled hash,
//! tagger name, tagger email, tagger date (Unix seconds) and subject.

use super::Parsed;
use crate::core::records::{Tag, TagKind};
use chrono::DateTime;

pub const TAG_FIELD_SEPARATOR: char = '\u{1f}';
pub const TAG_RECORD_SEPARATOR: char = '\u{1e}';

const FIELD_COUNT: usize = 8;

/// `git for-each-ref` arguments producing output understood by [`parse_tags`].
pub fn tag_format_args() -> Vec<String> {
    let fields = [
        "%(refname:short)",
        "%(objecttype)",
        "%(objectname)",
        "%(*objectname)",
        "%(taggername)",
        "%(taggeremail)",
        "%(taggerdate:unix)",
        "%(contents:subject)",
    ];
    vec![
        "for-each-ref".to_string(),
        format!("--format={}%1e", fields.join("%1f")),
        "refs/tags".to_string(),
    ]
}

pub fn parse_tags(output: &str) -> Vec<Tag> {
    parse_tags_with_report(output).into_items("tag")
}

pub fn parse_tags_with_report(output: &str) -> Parsed<Tag> {
    let mut parsed = Parsed::default();
    for record in output.split(TAG_RECORD_SEPARATOR) {
        let record = record.trim_matches(['\n', '\r']);
        if record.is_empty() {
            continue;
        }
        parsed.push(parse_tag_record(record));
    }
    parsed
}

fn parse_tag_record(record: &str) -> Option<Tag> {
    let fields: Vec<&str> = record.split(TAG_FIELD_SEPARATOR).collect();
    if fields.len() != FIELD_COUNT || fields[0].is_empty() || fields[2].is_empty() {
        return None;
    }

    let kind = if fields[1] == "tag" {
        TagKind::Annotated
    } else {
        TagKind::Lightweight
    };
    let target_hash = if fields[3].is_empty() {
        fields[2]
    } else {
        fields[3]
    };

    Some(Tag {
        name: fields[0].to_string(),
        kind,
        object_hash: fields[2].to_string(),
        target_hash: target_hash.to_string(),
        tagger_name: non_empty(fields[4]),
        tagger_email: non_empty(fields[5].trim_start_matches('<').trim_end_matches('>')),
        date: fields[6]
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        message: non_empty(fields[7]),
    })
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
