//! Cached render result for one path.

use std::io;

use thiserror::Error;

use crate::render::RenderError;
use crate::watch::WatchError;

/// Why a path ended up `Failed`.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error("cannot read `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    Unrendered,
    Rendered,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Artifact {
    path: String,
    /// Last successfully rendered page, or empty
    content: String,
    status: ArtifactStatus,
    /// Ticket of the render that produced this state (0 = placeholder)
    pub(super) version: u64,
}

impl Artifact {
    pub(super) fn placeholder(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            content: String::new(),
            status: ArtifactStatus::Unrendered,
            version: 0,
        }
    }

    pub(super) fn from_outcome(path: &str, version: u64, outcome: Result<String, String>) -> Self {
        let mut artifact = Self::placeholder(path);
        artifact.apply(version, outcome);
        artifact
    }

    /// Replace state with a render outcome. A failure keeps the last good content.
    pub(super) fn apply(&mut self, version: u64, outcome: Result<String, String>) {
        self.version = version;
        match outcome {
            Ok(content) => {
                self.content = content;
                self.status = ArtifactStatus::Rendered;
            }
            Err(reason) => self.status = ArtifactStatus::Failed(reason),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status(&self) -> &ArtifactStatus {
        &self.status
    }

    /// What a reader is shown: the failure reason while failed, else the content.
    pub fn body(&self) -> &str {
        match &self.status {
            ArtifactStatus::Failed(reason) => reason,
            _ => &self.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_keeps_last_content() {
        let mut artifact = Artifact::from_outcome("a.md", 1, Ok("<p>a</p>".into()));
        assert_eq!(artifact.body(), "<p>a</p>");

        artifact.apply(2, Err("boom".into()));
        assert_eq!(artifact.status(), &ArtifactStatus::Failed("boom".into()));
        assert_eq!(artifact.content(), "<p>a</p>");
        assert_eq!(artifact.body(), "boom");
        assert_eq!(artifact.version, 2);
    }

    #[test]
    fn test_placeholder() {
        let artifact = Artifact::placeholder("a.md");
        assert_eq!(artifact.path(), "a.md");
        assert_eq!(artifact.body(), "");
        assert_eq!(artifact.status(), &ArtifactStatus::Unrendered);
    }

    #[test]
    fn test_read_error_display() {
        let err = ArtifactError::Read {
            path: "a.md".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "cannot read `a.md`: gone");
    }
}
