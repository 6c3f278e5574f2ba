//! Source tree scanning.

use batch_transform_core::{MediaKind, WorkItem};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Collect supported files under `root` in discovery order.
///
/// Entries are visited sorted by file name, depth first, so the order is
/// stable between runs. Hidden entries, anything in `excluded` and
/// symlinked directories are skipped. A failure to read `root` itself is an
/// error; unreadable subdirectories and files are logged and skipped.
pub fn discover(root: &Path, excluded: &[PathBuf]) -> io::Result<Vec<WorkItem>> {
    let mut items = Vec::new();
    let entries = sorted_entries(root)?;
    walk(root, entries, excluded, &mut items);
    debug!("Discovered {} items under {}", items.len(), root.display());
    Ok(items)
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<fs::DirEntry>> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

fn walk(root: &Path, entries: Vec<fs::DirEntry>, excluded: &[PathBuf], items: &mut Vec<WorkItem>) {
    for entry in entries {
        let path = entry.path();
        if is_hidden(&path) || excluded.iter().any(|e| e == &path) {
            continue;
        }

        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        if file_type.is_dir() {
            match sorted_entries(&path) {
                Ok(children) => walk(root, children, excluded, items),
                Err(e) => warn!("Skipping unreadable directory {}: {}", path.display(), e),
            }
            continue;
        }

        let is_file = file_type.is_file()
            || (file_type.is_symlink() && fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false));
        if !is_file || MediaKind::from_path(&path).is_none() {
            continue;
        }

        match WorkItem::from_path(root, &path) {
            Ok(item) => items.push(item),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn test_discover_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.png"));
        touch(&root.join("a.JPG"));
        touch(&root.join("notes.txt"));
        touch(&root.join("sub/c.webp"));
        touch(&root.join(".cache/d.png"));
        touch(&root.join(".hidden.png"));
        touch(&root.join("out/e.png"));
        touch(&root.join("out/_failed/f.png"));

        let items = discover(root, &[root.join("out")]).unwrap();
        let keys: Vec<&str> = items.iter().map(|i| i.key.as_str()).collect();

        assert_eq!(keys, vec!["a.JPG", "b.png", "sub/c.webp"]);
        assert_eq!(items[0].kind, MediaKind::Jpeg);
        assert_eq!(items[0].size, 4);
    }

    #[test]
    fn test_discover_missing_root_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("nope"), &[]).is_err());
    }

    #[test]
    fn test_discover_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path(), &[]).unwrap().is_empty());
    }
}
