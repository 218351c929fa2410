//! File system event classification.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};

/// Paths that appeared in the watched directory according to a raw
/// `notify` event.
///
/// Creations and renames into the directory both count. A paired rename
/// reports `[from, to]` and only the destination is kept. Every other
/// event kind yields nothing: a quiet period after an item appears is what
/// marks it as complete.
#[must_use]
pub fn created_paths(event: Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.into_iter().nth(1).into_iter().collect()
        }
        _ => Vec::new(),
    }
}

/// Whether `path` is a direct child of `root`.
#[must_use]
pub fn is_top_level(root: &Path, path: &Path) -> bool {
    path.parent() == Some(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};

    #[test]
    fn test_create_event_paths() {
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/downloads/complete/a.iso"));
        assert_eq!(
            created_paths(event),
            vec![PathBuf::from("/downloads/complete/a.iso")]
        );

        let event = Event::new(EventKind::Create(CreateKind::Folder))
            .add_path(PathBuf::from("/downloads/complete/show"));
        assert_eq!(created_paths(event).len(), 1);
    }

    #[test]
    fn test_moved_in_paths() {
        let moved_to = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To)))
            .add_path(PathBuf::from("/downloads/complete/done.mkv"));
        assert_eq!(
            created_paths(moved_to),
            vec![PathBuf::from("/downloads/complete/done.mkv")]
        );

        let renamed = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/downloads/complete/done.mkv.part"))
            .add_path(PathBuf::from("/downloads/complete/done.mkv"));
        assert_eq!(
            created_paths(renamed),
            vec![PathBuf::from("/downloads/complete/done.mkv")]
        );
    }

    #[test]
    fn test_other_events_ignored() {
        let modify = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/downloads/complete/a.iso"));
        assert!(created_paths(modify).is_empty());

        let written = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/downloads/complete/a.iso"));
        assert!(created_paths(written).is_empty());

        let moved_out = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path(PathBuf::from("/downloads/complete/a.iso"));
        assert!(created_paths(moved_out).is_empty());

        let remove = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/downloads/complete/a.iso"));
        assert!(created_paths(remove).is_empty());
    }

    #[test]
    fn test_is_top_level() {
        let root = Path::new("/downloads/complete");
        assert!(is_top_level(root, Path::new("/downloads/complete/a.iso")));
        assert!(is_top_level(root, Path::new("/downloads/complete/show")));
        assert!(!is_top_level(
            root,
            Path::new("/downloads/complete/show/ep01.mkv")
        ));
        assert!(!is_top_level(root, Path::new("/downloads/other.iso")));
        assert!(!is_top_level(root, root));
    }
}
