use std::io::{self, ErrorKind};
use std::path::Path;

use crate::actor::messages::{IdeMessage, MessageKind};
use crate::history::TutorialLayout;

/// Maps settled paths to typed messages carrying the current file content.
///
/// Only the narrative and program files of a tutorial directory are of
/// interest; the tutorial name is the name of the directory holding them.
#[derive(Debug, Clone)]
pub(crate) struct ArtifactClassifier {
    narrative: String,
    program: String,
}

impl ArtifactClassifier {
    pub(crate) fn new(layout: &TutorialLayout) -> Self {
        Self {
            narrative: layout.narrative.clone(),
            program: layout.code.clone(),
        }
    }

    pub(crate) fn kind_of(&self, path: &Path) -> Option<MessageKind> {
        let name = path.file_name()?.to_str()?;
        if name == self.narrative {
            Some(MessageKind::Narrative)
        } else if name == self.program {
            Some(MessageKind::Program)
        } else {
            None
        }
    }

    /// Read `path` into a message.
    ///
    /// `Ok(None)` when the path is not of interest or the file vanished
    /// between settling and reading.
    pub(crate) fn load(&self, path: &Path) -> io::Result<Option<IdeMessage>> {
        let Some(kind) = self.kind_of(path) else {
            return Ok(None);
        };

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                crate::log!("load"; "{} vanished before it could be read, skipping", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let tutorial_name = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Some(IdeMessage::new(tutorial_name, kind, text)))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn classifier() -> ArtifactClassifier {
        ArtifactClassifier::new(&TutorialLayout::default())
    }

    #[test]
    fn test_kind_of() {
        let c = classifier();
        assert_eq!(
            c.kind_of(Path::new("/t/boing/tutorial.md")),
            Some(MessageKind::Narrative)
        );
        assert_eq!(c.kind_of(Path::new("/t/boing/code.py")), Some(MessageKind::Program));
        assert_eq!(c.kind_of(Path::new("/t/boing/summary.md")), None);
        assert_eq!(c.kind_of(Path::new("/t/boing/code.py.swp")), None);
    }

    #[test]
    fn test_load_program() {
        let dir = tempfile::tempdir().unwrap();
        let boing = dir.path().join("boing");
        fs::create_dir(&boing).unwrap();
        fs::write(boing.join("code.py"), "import pytch\n").unwrap();

        let msg = classifier().load(&boing.join("code.py")).unwrap().unwrap();
        assert_eq!(msg, IdeMessage::new("boing", MessageKind::Program, "import pytch\n"));
    }

    #[test]
    fn test_load_vanished_file_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("boing").join("tutorial.md");
        assert!(classifier().load(&gone).unwrap().is_none());
    }

    #[test]
    fn test_load_uninteresting_file_is_not_read() {
        let dir = tempfile::tempdir().unwrap();
        // a directory would fail to read, proving nothing was attempted
        let path = dir.path().join("notes.txt");
        fs::create_dir(&path).unwrap();
        assert!(classifier().load(&path).unwrap().is_none());
    }

    #[test]
    fn test_custom_layout_names() {
        let layout = TutorialLayout {
            code: "main.py".into(),
            ..TutorialLayout::default()
        };
        let c = ArtifactClassifier::new(&layout);
        assert_eq!(c.kind_of(Path::new("zap/main.py")), Some(MessageKind::Program));
        assert_eq!(c.kind_of(Path::new("zap/code.py")), None);
    }
}
