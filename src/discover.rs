//! Filesystem discovery: walk a project tree and produce file nodes.
//!
//! The walk prunes well-known noise directories (build artifacts, dependency
//! caches, VCS internals, IDE metadata) and anything dot-prefixed, skips
//! lockfiles and OS metadata files, and keeps only files whose extension maps
//! to a known language. File contents are read up front — tolerating invalid
//! UTF-8 via replacement characters — and held in memory for the extraction
//! stage; they are not part of the output snapshot.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

use crate::languages;
use crate::models::{Complexity, FileNode};

/// Directory names pruned from traversal, in addition to any dot-prefixed
/// directory.
const IGNORE_DIRS: &[&str] = &[
    "node_modules",
    "__pycache__",
    "dist",
    "build",
    "DerivedData",
    "Pods",
    "venv",
    "env",
    "vendor",
    "target",
    "bin",
    "obj",
    "coverage",
    "out",
    "xcuserdata",
];

/// File names skipped outright, in addition to any dot-prefixed file.
const IGNORE_FILES: &[&str] = &[
    "Thumbs.db",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Podfile.lock",
    "poetry.lock",
];

/// Truncated SHA-256 hex digest used for project and file identities.
pub fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())[..12].to_string()
}

/// Walk `root` and produce one [`FileNode`] per recognized source file,
/// plus the raw file contents keyed by node id.
///
/// Files that cannot be stat'ed or read are silently skipped; a file with
/// undecodable bytes is kept with replacement characters substituted.
/// Traversal is sorted by file name so repeated scans of an unchanged tree
/// visit files in the same order.
pub fn discover(root: &Path, project_id: &str) -> (Vec<FileNode>, HashMap<String, String>) {
    let mut nodes = Vec::new();
    let mut contents = HashMap::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            // Never prune the root itself, even if its own name is dotted.
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !name.starts_with('.') && !IGNORE_DIRS.contains(&name.as_ref())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || IGNORE_FILES.contains(&name.as_str()) {
            continue;
        }

        let path = entry.path();
        let extension = match path.extension() {
            Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
            None => continue,
        };
        let language = match languages::language_for_extension(&extension) {
            Some(language) => language,
            None => continue,
        };

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(_) => continue,
        };
        let content = match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => continue,
        };

        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();
        let id = short_hash(&format!("{}:{}", project_id, rel_str));

        let last_modified: DateTime<Utc> = metadata
            .modified()
            .map(DateTime::from)
            .unwrap_or_else(|_| Utc::now());

        // A trailing line without a final newline still counts as one line.
        let line_count = content.matches('\n').count() + 1;

        contents.insert(id.clone(), content);
        nodes.push(FileNode {
            id,
            path: rel_str,
            absolute_path: path.to_string_lossy().to_string(),
            name,
            extension,
            language: language.to_string(),
            size_bytes: metadata.len(),
            line_count,
            last_modified,
            git_changes: 0,
            imports: Vec::new(),
            binding_points: Vec::new(),
            tags: Default::default(),
            concerns: Vec::new(),
            risk_score: 0.0,
            fan_in: 0,
            fan_out: 0,
            complexity: Complexity::Low,
            has_tests: false,
            summary: String::new(),
        });
    }

    (nodes, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discovers_recognized_files_only() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("main.py"), "print('hi')\n").unwrap();
        fs::write(tmp.path().join("notes.txt"), "no language\n").unwrap();
        fs::write(tmp.path().join("Makefile"), "all:\n").unwrap();

        let (nodes, contents) = discover(tmp.path(), "proj");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "main.py");
        assert_eq!(nodes[0].language, "python");
        assert_eq!(contents[&nodes[0].id], "print('hi')\n");
    }

    #[test]
    fn test_ignored_and_hidden_directories_are_pruned() {
        let tmp = TempDir::new().unwrap();
        for dir in ["node_modules", "target", ".git", ".idea"] {
            fs::create_dir_all(tmp.path().join(dir)).unwrap();
            fs::write(tmp.path().join(dir).join("hidden.js"), "x").unwrap();
        }
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/app.js"), "x").unwrap();

        let (nodes, _) = discover(tmp.path(), "proj");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].path, "src/app.js");
    }

    #[test]
    fn test_ignored_and_hidden_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package-lock.json"), "{}").unwrap();
        fs::write(tmp.path().join(".hidden.py"), "x = 1").unwrap();
        fs::write(tmp.path().join("kept.py"), "x = 1").unwrap();

        let (nodes, _) = discover(tmp.path(), "proj");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "kept.py");
    }

    #[test]
    fn test_line_count_includes_trailing_segment() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.py"), "one\ntwo\nthree").unwrap();
        fs::write(tmp.path().join("b.py"), "one\ntwo\n").unwrap();
        fs::write(tmp.path().join("c.py"), "").unwrap();

        let (nodes, _) = discover(tmp.path(), "proj");
        let by_name: HashMap<_, _> = nodes.iter().map(|n| (n.name.as_str(), n)).collect();
        assert_eq!(by_name["a.py"].line_count, 3);
        assert_eq!(by_name["b.py"].line_count, 3);
        assert_eq!(by_name["c.py"].line_count, 1);
    }

    #[test]
    fn test_undecodable_bytes_are_replaced_not_fatal() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bin.py"), [0x66, 0x6f, 0xff, 0xfe, 0x6f]).unwrap();

        let (nodes, contents) = discover(tmp.path(), "proj");
        assert_eq!(nodes.len(), 1);
        assert!(contents[&nodes[0].id].contains('\u{FFFD}'));
    }

    #[test]
    fn test_ids_are_deterministic_and_project_scoped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.py"), "x = 1").unwrap();

        let (first, _) = discover(tmp.path(), "proj");
        let (second, _) = discover(tmp.path(), "proj");
        let (other, _) = discover(tmp.path(), "other");
        assert_eq!(first[0].id, second[0].id);
        assert_ne!(first[0].id, other[0].id);
    }

    #[test]
    fn test_empty_directory_yields_no_nodes() {
        let tmp = TempDir::new().unwrap();
        let (nodes, contents) = discover(tmp.path(), "proj");
        assert!(nodes.is_empty());
        assert!(contents.is_empty());
    }
}
