use crate::config::Config;
use crate::error::SyncError;
use crate::integrations::readeck::BookmarkSource;
use crate::models::{Bookmark, BookmarkOutcome, BookmarkRef, Outcome};
use crate::notes;
use crate::notify::Notifier;
use crate::reconcile;
use crate::storage::{self, NoteStorage, StagedStorage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

#[derive(Clone, Debug)]
pub struct SyncOptions {
    pub folder: String,
    pub workers: usize,
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        Self {
            folder: config.vault.folder.clone(),
            workers: config.sync.workers.max(1),
            dry_run,
        }
    }
}

#[derive(Default, Debug)]
pub struct SyncReport {
    /// Outcomes in the order the bookmarks were listed.
    pub outcomes: Vec<BookmarkOutcome>,
    pub without_annotations: usize,
}

impl SyncReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created { .. }))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Updated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::NoNewAnnotations))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "Created {} | Updated {} | Unchanged {} | Failed {} | Without annotations {}",
            self.created(),
            self.updated(),
            self.skipped(),
            self.failed(),
            self.without_annotations
        )
    }
}

enum Slot {
    NoAnnotations,
    Done(Outcome),
}

pub struct SyncDriver<'a> {
    source: &'a dyn BookmarkSource,
    storage: &'a dyn NoteStorage,
    notifier: &'a dyn Notifier,
    options: SyncOptions,
}

impl<'a> SyncDriver<'a> {
    pub fn new(
        source: &'a dyn BookmarkSource,
        storage: &'a dyn NoteStorage,
        notifier: &'a dyn Notifier,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            storage,
            notifier,
            options,
        }
    }

    /// Runs one full sync.
    ///
    /// Failing to list bookmarks or to create the notes folder aborts the run.
    /// Anything that goes wrong for a single bookmark is recorded as
    /// [`Outcome::Failed`] and the remaining bookmarks are still processed.
    pub fn run(&self) -> Result<SyncReport, SyncError> {
        let bookmarks = self.source.fetch_bookmarks()?;
        tracing::info!(count = bookmarks.len(), "fetched bookmark list");

        // Dry runs stage every write so later bookmarks see earlier ones.
        let staged = StagedStorage::new(self.storage);
        let storage: &dyn NoteStorage = if self.options.dry_run {
            &staged
        } else {
            self.storage
        };
        storage::ensure_folder(storage, &self.options.folder)?;

        let groups = group_by_note_path(&self.options.folder, &bookmarks);
        let mut slots: Vec<Option<Slot>> = bookmarks.iter().map(|_| None).collect();
        let workers = self.options.workers.max(1).min(groups.len());
        let next_group = AtomicUsize::new(0);
        let (sender, receiver) = mpsc::channel();

        thread::scope(|scope| {
            for _ in 0..workers {
                let sender = sender.clone();
                let groups = &groups;
                let next_group = &next_group;
                let bookmarks = &bookmarks;
                scope.spawn(move || {
                    loop {
                        let group = next_group.fetch_add(1, Ordering::SeqCst);
                        let Some(indices) = groups.get(group) else {
                            break;
                        };
                        // Same-path bookmarks stay on this thread, in input order.
                        for &index in indices {
                            let slot = self.sync_bookmark(storage, &bookmarks[index]);
                            if sender.send((index, slot)).is_err() {
                                return;
                            }
                        }
                    }
                });
            }
            drop(sender);

            for (index, slot) in receiver.iter() {
                slots[index] = Some(slot);
            }
        });

        let mut report = SyncReport::default();
        for (reference, slot) in bookmarks.into_iter().zip(slots) {
            match slot {
                Some(Slot::NoAnnotations) => report.without_annotations += 1,
                Some(Slot::Done(outcome)) => report.outcomes.push(BookmarkOutcome {
                    id: reference.id,
                    title: reference.title,
                    outcome,
                }),
                None => report.outcomes.push(BookmarkOutcome {
                    id: reference.id,
                    title: reference.title,
                    outcome: Outcome::Failed("worker stopped before processing".to_string()),
                }),
            }
        }

        tracing::info!(
            created = report.created(),
            updated = report.updated(),
            unchanged = report.skipped(),
            failed = report.failed(),
            "sync finished"
        );
        Ok(report)
    }

    fn sync_bookmark(&self, storage: &dyn NoteStorage, reference: &BookmarkRef) -> Slot {
        let outcome = match self.source.fetch_annotations(&reference.id) {
            Ok(annotations) if annotations.is_empty() => {
                tracing::debug!(bookmark = %reference.id, "bookmark has no annotations");
                return Slot::NoAnnotations;
            }
            Ok(annotations) => {
                let bookmark = Bookmark::new(reference.clone(), annotations);
                reconcile::reconcile_note(storage, &self.options.folder, &bookmark)
            }
            Err(err) => Err(err),
        };

        let outcome = outcome.unwrap_or_else(|err| {
            tracing::warn!(bookmark = %reference.id, error = %err, "bookmark sync failed");
            Outcome::Failed(err.message())
        });
        self.notifier.notify(&outcome.status_line(&reference.title));
        Slot::Done(outcome)
    }
}

/// Groups bookmark indices by the note they write to, ordered by first appearance.
/// Paths are compared case-insensitively.
fn group_by_note_path(folder: &str, bookmarks: &[BookmarkRef]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut by_path: HashMap<String, usize> = HashMap::new();
    for (index, bookmark) in bookmarks.iter().enumerate() {
        let path = notes::note_path(folder, &bookmark.id, &bookmark.title).to_lowercase();
        match by_path.get(&path) {
            Some(&group) => groups[group].push(index),
            None => {
                by_path.insert(path, groups.len());
                groups.push(vec![index]);
            }
        }
    }
    groups
}
