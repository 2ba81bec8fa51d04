use crate::error::SyncError;
use crate::models::{Annotation, Bookmark, Outcome, WriteKind};
use crate::notes;
use crate::storage::NoteStorage;

#[derive(Clone, Debug, PartialEq)]
pub enum Plan {
    NoNewAnnotations,
    Write {
        kind: WriteKind,
        content: String,
        added: Vec<Annotation>,
    },
}

/// Decides what a bookmark's note should become.
///
/// `existing` is the current note text, `None` when the note has not been
/// created yet.
pub fn plan(bookmark: &Bookmark, existing: Option<&str>) -> Plan {
    let content = existing.unwrap_or_default();
    let recorded = notes::extract_annotations(content);
    let added = notes::diff_new(&bookmark.annotations, &recorded);
    if added.is_empty() {
        return Plan::NoNewAnnotations;
    }

    let kind = if existing.is_some() {
        WriteKind::Updated
    } else {
        WriteKind::Created
    };
    Plan::Write {
        kind,
        content: notes::append_new_annotations(content, &added),
        added,
    }
}

/// Reads, merges and writes one bookmark's note.
///
/// At most one read and one write. A failed read never falls through to a write.
pub fn reconcile_note(
    storage: &dyn NoteStorage,
    folder: &str,
    bookmark: &Bookmark,
) -> Result<Outcome, SyncError> {
    let path = notes::bookmark_note_path(folder, bookmark);
    let existing = if storage.exists(&path) {
        Some(storage.read(&path)?)
    } else {
        None
    };

    match plan(bookmark, existing.as_deref()) {
        Plan::NoNewAnnotations => {
            tracing::debug!(bookmark = %bookmark.id, path = %path, "no new annotations");
            Ok(Outcome::NoNewAnnotations)
        }
        Plan::Write {
            kind,
            content,
            added,
        } => {
            storage.write(&path, &content)?;
            tracing::info!(
                bookmark = %bookmark.id,
                path = %path,
                added = added.len(),
                "note {}",
                match kind {
                    WriteKind::Created => "created",
                    WriteKind::Updated => "updated",
                }
            );
            let added = added.len();
            Ok(match kind {
                WriteKind::Created => Outcome::Created { path, added },
                WriteKind::Updated => Outcome::Updated { path, added },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn bookmark(title: &str, texts: &[&str]) -> Bookmark {
        Bookmark {
            id: "1".to_string(),
            title: title.to_string(),
            annotations: texts
                .iter()
                .map(|text| Annotation {
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn plan_creates_note_with_new_section() {
        let plan = plan(&bookmark("Test", &["a"]), None);
        let Plan::Write { kind, content, added } = plan else {
            panic!("expected a write plan");
        };
        assert_eq!(kind, WriteKind::Created);
        assert_eq!(content, "\n\n## New Annotations\n> a");
        assert_eq!(added.len(), 1);
    }

    #[test]
    fn plan_appends_only_unrecorded_annotations() {
        let existing = "# Test\n\n## New Annotations\n> a";
        let plan = plan(&bookmark("Test", &["a", "b", "c"]), Some(existing));
        let Plan::Write { kind, content, .. } = plan else {
            panic!("expected a write plan");
        };
        assert_eq!(kind, WriteKind::Updated);
        assert!(content.starts_with(existing));
        assert_eq!(
            content,
            "# Test\n\n## New Annotations\n> a\n\n## New Annotations\n> b\n\n> c"
        );
    }

    #[test]
    fn plan_is_noop_when_everything_is_recorded() {
        let existing = "intro\n> a\nmore prose\n> b";
        assert_eq!(
            plan(&bookmark("Test", &["b", "a"]), Some(existing)),
            Plan::NoNewAnnotations
        );
        assert_eq!(plan(&bookmark("Test", &[]), None), Plan::NoNewAnnotations);
    }

    #[test]
    fn existing_empty_note_is_updated_not_created() {
        let plan = plan(&bookmark("Test", &["a"]), Some(""));
        assert!(matches!(
            plan,
            Plan::Write {
                kind: WriteKind::Updated,
                ..
            }
        ));
    }

    #[test]
    fn reconcile_writes_once_and_then_skips() {
        let storage = MemoryStorage::default();
        let first = reconcile_note(&storage, "Readeck", &bookmark("Test", &["a"]))
            .expect("first sync");
        assert_eq!(
            first,
            Outcome::Created {
                path: "Readeck/Test.md".to_string(),
                added: 1
            }
        );

        let second = reconcile_note(&storage, "Readeck", &bookmark("Test", &["a", "b"]))
            .expect("second sync");
        assert!(matches!(second, Outcome::Updated { added: 1, .. }));

        let third = reconcile_note(&storage, "Readeck", &bookmark("Test", &["a", "b"]))
            .expect("third sync");
        assert_eq!(third, Outcome::NoNewAnnotations);
        assert_eq!(storage.write_count(), 2);

        let note = storage.note("Readeck/Test.md").expect("note exists");
        assert_eq!(note.matches("> a").count(), 1);
        assert_eq!(note.matches("> b").count(), 1);
    }

    #[test]
    fn failed_read_stops_before_writing() {
        let storage = MemoryStorage::default()
            .with_note("Readeck/Test.md", "> a")
            .failing_on("Readeck/Test.md");
        let err = reconcile_note(&storage, "Readeck", &bookmark("Test", &["a", "b"]))
            .expect_err("read fails");
        assert!(matches!(err, SyncError::Io { ref path, .. } if path == "Readeck/Test.md"));
        assert_eq!(storage.write_count(), 0);
        assert_eq!(storage.note("Readeck/Test.md").as_deref(), Some("> a"));
    }

    #[test]
    fn trailing_nel_is_part_of_the_recorded_text() {
        let first = plan(&bookmark("Test", &["a\u{85}"]), None);
        let Plan::Write { content, .. } = first else {
            panic!("expected a write plan");
        };
        assert_eq!(
            plan(&bookmark("Test", &["a\u{85}"]), Some(&content)),
            Plan::NoNewAnnotations
        );
    }

    #[test]
    fn storage_failure_is_reported() {
        let storage = MemoryStorage::default().failing_on("Readeck/Test.md");
        let err = reconcile_note(&storage, "Readeck", &bookmark("Test", &["a"]))
            .expect_err("write fails");
        assert!(matches!(err, SyncError::Io { .. }));
    }
}
