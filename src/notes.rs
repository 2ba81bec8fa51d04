use crate::models::{Annotation, Bookmark};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

pub const ANNOTATION_MARKER: &str = "> ";
pub const NEW_ANNOTATIONS_HEADING: &str = "## New Annotations";
pub const MAX_FILE_NAME_LEN: usize = 255;

const ILLEGAL_FILE_NAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Maps a bookmark title to a file name that is safe on every common filesystem.
///
/// Never fails. A title made only of control characters, spaces or dots comes
/// back empty, see [`note_file_stem`] for the fallback.
pub fn sanitize_file_name(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| {
            if ILLEGAL_FILE_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .filter(|c| !is_control_char(*c))
        .collect();

    let without_dots = if !replaced.is_empty() && replaced.chars().all(|c| c == '.') {
        String::new()
    } else {
        replaced
    };

    let trimmed = without_dots
        .trim_matches(is_space)
        .trim_end_matches(is_space_or_dot);

    truncate_utf16(trimmed, MAX_FILE_NAME_LEN)
        .trim_end_matches(is_space_or_dot)
        .to_string()
}

/// File stem for a bookmark's note. Falls back to the bookmark id when the
/// title sanitizes to nothing.
pub fn note_file_stem(bookmark_id: &str, title: &str) -> String {
    let stem = sanitize_file_name(title);
    if !stem.is_empty() {
        return stem;
    }
    let stem = sanitize_file_name(bookmark_id);
    if !stem.is_empty() {
        return stem;
    }
    "untitled".to_string()
}

pub fn note_path(folder: &str, bookmark_id: &str, title: &str) -> String {
    let stem = note_file_stem(bookmark_id, title);
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{stem}.md")
    } else {
        format!("{folder}/{stem}.md")
    }
}

/// Returns the annotation texts already recorded in a note, top to bottom.
pub fn extract_annotations(content: &str) -> Vec<String> {
    static MARKER_LINE: OnceLock<Regex> = OnceLock::new();
    let re = MARKER_LINE
        .get_or_init(|| Regex::new(r"(?m)^> [^\r\n]+").expect("valid marker line pattern"));

    re.find_iter(content)
        .map(|m| {
            m.as_str()[ANNOTATION_MARKER.len()..]
                .trim_matches(is_space)
                .to_string()
        })
        .collect()
}

/// Remote annotations not yet present in `existing`, in remote order.
///
/// Matching is exact string equality. A text repeated in `remote` is only
/// returned once.
pub fn diff_new(remote: &[Annotation], existing: &[String]) -> Vec<Annotation> {
    let mut seen: HashSet<&str> = existing.iter().map(String::as_str).collect();
    remote
        .iter()
        .filter(|annotation| seen.insert(annotation.text.as_str()))
        .cloned()
        .collect()
}

pub fn render_annotation_block(annotations: &[Annotation]) -> String {
    annotations
        .iter()
        .map(|annotation| format!("{ANNOTATION_MARKER}{}", annotation.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Appends a "New Annotations" section to `existing`. Prior content is kept verbatim.
pub fn append_new_annotations(existing: &str, annotations: &[Annotation]) -> String {
    format!(
        "{existing}\n\n{NEW_ANNOTATIONS_HEADING}\n{}",
        render_annotation_block(annotations)
    )
}

pub fn bookmark_note_path(folder: &str, bookmark: &Bookmark) -> String {
    note_path(folder, &bookmark.id, &bookmark.title)
}

fn is_control_char(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1f}' | '\u{80}'..='\u{9f}')
}

// The ECMAScript `\s` set. Unlike `char::is_whitespace` it excludes U+0085.
fn is_space(c: char) -> bool {
    matches!(
        c,
        '\t'
            | '\n'
            | '\u{b}'
            | '\u{c}'
            | '\r'
            | ' '
            | '\u{a0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200a}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202f}'
            | '\u{205f}'
            | '\u{3000}'
            | '\u{feff}'
    )
}

fn is_space_or_dot(c: char) -> bool {
    c == '.' || is_space(c)
}

fn truncate_utf16(text: &str, max_units: usize) -> &str {
    let mut units = 0;
    for (idx, c) in text.char_indices() {
        units += c.len_utf16();
        if units > max_units {
            return &text[..idx];
        }
    }
    text
}
