use serde::Deserialize;

/// A bookmark as listed by the remote service, before its annotations are fetched.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BookmarkRef {
    pub id: String,
    pub title: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Annotation {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub annotations: Vec<Annotation>,
}

impl Bookmark {
    pub fn new(reference: BookmarkRef, annotations: Vec<Annotation>) -> Self {
        Self {
            id: reference.id,
            title: reference.title,
            annotations,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteKind {
    Created,
    Updated,
}

/// Terminal state of one bookmark in a sync run.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Created { path: String, added: usize },
    Updated { path: String, added: usize },
    NoNewAnnotations,
    Failed(String),
}

impl Outcome {
    pub fn status_line(&self, title: &str) -> String {
        match self {
            Outcome::Created { .. } => format!("Created note: {title}"),
            Outcome::Updated { .. } => format!("Updated note: {title}"),
            Outcome::NoNewAnnotations => format!("No new annotations for: {title}"),
            Outcome::Failed(reason) => format!("Failed to sync {title}: {reason}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BookmarkOutcome {
    pub id: String,
    pub title: String,
    pub outcome: Outcome,
}
