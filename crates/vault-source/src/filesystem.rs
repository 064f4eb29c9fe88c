//! Filesystem-backed vault of markdown notes.

use crate::error::VaultError;
use crate::frontmatter::parse_note;
use crate::links;
use crate::{DocumentStore, Fields, TagsAndPath};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};
use walkdir::{DirEntry, WalkDir};

/// File extension of records.
pub const NOTE_EXTENSION: &str = "md";

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

fn is_note(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(NOTE_EXTENSION))
        .unwrap_or(false)
}

/// List every note under `root` as sorted, `/`-separated relative paths.
/// Hidden files and directories (such as `.obsidian` or `.trash`) are skipped.
pub fn scan_vault(root: &Path) -> Result<Vec<String>, VaultError> {
    if !root.is_dir() {
        return Err(VaultError::MissingRoot(root.to_path_buf()));
    }

    let mut records = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_note(entry.path()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let id = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        records.push(id);
    }
    records.sort();
    Ok(records)
}

/// A vault rooted at a directory on disk.
///
/// The record list is cached on every [`DocumentStore::list_records`] call and
/// used for link resolution.
#[derive(Debug)]
pub struct FilesystemVault {
    root: PathBuf,
    known: RwLock<Vec<String>>,
}

impl FilesystemVault {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, VaultError> {
        let root = root.into();
        let known = scan_vault(&root)?;
        tracing::debug!("Opened vault at {} with {} notes", root.display(), known.len());
        Ok(Self {
            root,
            known: RwLock::new(known),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, record_id: &str) -> Option<String> {
        let path = self.root.join(record_id);
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::debug!("Cannot read {}: {e}", path.display());
                None
            }
        }
    }

    fn known(&self) -> RwLockReadGuard<'_, Vec<String>> {
        self.known.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl DocumentStore for FilesystemVault {
    fn list_records(&self) -> Result<Vec<String>, VaultError> {
        let records = scan_vault(&self.root)?;
        match self.known.write() {
            Ok(mut known) => *known = records.clone(),
            Err(poisoned) => *poisoned.into_inner() = records.clone(),
        }
        Ok(records)
    }

    fn fields(&self, record_id: &str) -> Option<Fields> {
        self.read(record_id).and_then(|content| parse_note(&content).fields)
    }

    fn resolve_reference(&self, value: &serde_json::Value, _from: &str) -> Vec<String> {
        links::resolve_reference(value, self.known().as_slice())
    }

    fn tags_and_path(&self, record_id: &str) -> TagsAndPath {
        let tags = self
            .read(record_id)
            .map(|content| parse_note(&content).tags)
            .unwrap_or_default();
        TagsAndPath {
            tags,
            path: record_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn sample_vault() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.md",
            "---\nrelated: \"[[b]]\"\ntags: [person]\n---\nHello #friend\n",
        );
        write(dir.path(), "b.md", "no front matter\n");
        write(dir.path(), "projects/alpha.md", "---\nstatus: active\n---\n");
        write(dir.path(), "projects/diagram.png", "binary");
        write(dir.path(), ".obsidian/workspace.md", "hidden");
        dir
    }

    #[test]
    fn test_scan_vault_sorted_and_filtered() {
        let dir = sample_vault();
        let records = scan_vault(dir.path()).unwrap();
        assert_eq!(records, vec!["a.md", "b.md", "projects/alpha.md"]);
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            scan_vault(&missing),
            Err(VaultError::MissingRoot(_))
        ));
    }

    #[test]
    fn test_fields_and_tags() {
        let dir = sample_vault();
        let vault = FilesystemVault::open(dir.path()).unwrap();

        let fields = vault.fields("a.md").unwrap();
        assert_eq!(fields["related"], json!("[[b]]"));
        assert!(vault.fields("b.md").is_none());
        assert!(vault.fields("missing.md").is_none());

        let facts = vault.tags_and_path("a.md");
        assert_eq!(facts.path, "a.md");
        assert!(facts.tags.contains("person"));
        assert!(facts.tags.contains("friend"));
    }

    #[test]
    fn test_resolve_reference_uses_known_records() {
        let dir = sample_vault();
        let vault = FilesystemVault::open(dir.path()).unwrap();
        assert_eq!(
            vault.resolve_reference(&json!("[[alpha]]"), "a.md"),
            vec!["projects/alpha.md"]
        );
        assert_eq!(
            vault.resolve_reference(&json!("[[ghost]]"), "a.md"),
            vec!["ghost.md"]
        );
    }

    #[test]
    fn test_resolve_reference_list_under_shared_read() {
        let dir = sample_vault();
        let vault = FilesystemVault::open(dir.path()).unwrap();
        let held = vault.known();
        let links = json!(["[[a]]", "[[alpha|Alpha]]", "[[a#Intro]]", "[[ghost]]"]);
        assert_eq!(
            vault.resolve_reference(&links, "b.md"),
            vec!["a.md", "projects/alpha.md", "ghost.md"]
        );
        assert_eq!(held.len(), 3);
    }

    #[test]
    fn test_list_records_refreshes_cache() {
        let dir = sample_vault();
        let vault = FilesystemVault::open(dir.path()).unwrap();
        write(dir.path(), "late/ghost.md", "");
        assert_eq!(
            vault.resolve_reference(&json!("[[ghost]]"), "a.md"),
            vec!["ghost.md"]
        );

        vault.list_records().unwrap();
        assert_eq!(
            vault.resolve_reference(&json!("[[ghost]]"), "a.md"),
            vec!["late/ghost.md"]
        );
    }
}
