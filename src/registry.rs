//! Multi-project service state.
//!
//! The request-handling layer owns one [`ProjectRegistry`]: a bounded set of
//! loaded projects, each holding its latest scan snapshot and chat history,
//! plus a currently-active project pointer. The scan pipeline itself is a
//! pure function and keeps no state here.
//!
//! Also persists the recent-projects history: a plain-text file with one
//! absolute path per line, most recent first.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::discover;
use crate::models::ScanResult;
use crate::scan;

/// How many projects may be loaded at once.
pub const MAX_PROJECTS: usize = 2;
/// How many entries the recent-projects file keeps.
const MAX_RECENT: usize = 10;

/// One chat exchange message, OpenAI wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// A loaded project: its identity, latest snapshot, and chat transcript.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: String,
    pub root: PathBuf,
    pub name: String,
    pub scan: ScanResult,
    pub chat_history: Vec<ChatMessage>,
}

/// Bounded project map with a current-project pointer.
///
/// Kept as a `Vec` in load order — the bound is tiny and listing order
/// should match the order projects were opened.
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    projects: Vec<Project>,
    current: Option<String>,
}

/// Stable project id derived from the resolved root path.
pub fn project_id_for_path(path: &Path) -> String {
    discover::short_hash(&path.to_string_lossy())
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) a project and scan it.
    ///
    /// Loading a path that is already registered rescans it in place and
    /// keeps its chat history. Loading a new path beyond [`MAX_PROJECTS`]
    /// fails without scanning. The loaded project becomes current.
    pub fn load_project(&mut self, path: &Path) -> Result<&Project> {
        if !path.is_dir() {
            bail!("not a directory: {}", path.display());
        }
        let root = path.canonicalize()?;
        let id = project_id_for_path(&root);

        let existing = self.projects.iter().position(|p| p.id == id);
        if existing.is_none() && self.projects.len() >= MAX_PROJECTS {
            bail!(
                "maximum {} projects loaded; unload one first",
                MAX_PROJECTS
            );
        }

        let scan = scan::scan_project(&root, Some(id.as_str()))?;
        let index = match existing {
            Some(index) => {
                self.projects[index].scan = scan;
                index
            }
            None => {
                let name = scan.metadata.project_name.clone();
                self.projects.push(Project {
                    id: id.clone(),
                    root,
                    name,
                    scan,
                    chat_history: Vec::new(),
                });
                self.projects.len() - 1
            }
        };
        self.current = Some(id);
        Ok(&self.projects[index])
    }

    /// Look up a project by id, falling back to the current one.
    pub fn get(&self, id: Option<&str>) -> Option<&Project> {
        let id = id.or(self.current.as_deref())?;
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: Option<&str>) -> Option<&mut Project> {
        let id = id.or(self.current.as_deref())?.to_string();
        self.projects.iter_mut().find(|p| p.id == id)
    }

    /// Root path of a project, by id or current.
    pub fn root_of(&self, id: Option<&str>) -> Option<(String, PathBuf)> {
        self.get(id).map(|p| (p.id.clone(), p.root.clone()))
    }

    /// Store a freshly produced snapshot for an already-loaded project.
    /// Last writer wins; the chat history is untouched.
    pub fn replace_scan(&mut self, id: &str, scan: ScanResult) -> bool {
        match self.projects.iter_mut().find(|p| p.id == id) {
            Some(project) => {
                project.scan = scan;
                true
            }
            None => false,
        }
    }

    /// Make a loaded project the current one.
    pub fn activate(&mut self, id: &str) -> bool {
        if self.projects.iter().any(|p| p.id == id) {
            self.current = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Drop a project. If it was current, the first remaining project (if
    /// any) becomes current.
    pub fn unload(&mut self, id: &str) {
        self.projects.retain(|p| p.id != id);
        if self.current.as_deref() == Some(id) {
            self.current = self.projects.first().map(|p| p.id.clone());
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

/// Read the recent-projects file, newest first, keeping only entries that
/// still point at directories. A missing file is an empty history.
pub fn recent_projects(history_path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(history_path) else {
        return Vec::new();
    };
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && Path::new(line).is_dir())
        .map(str::to_string)
        .collect()
}

/// Move (or insert) a project path at the top of the recent-projects file.
pub fn add_recent_project(history_path: &Path, project_root: &Path) -> Result<()> {
    let entry = project_root.to_string_lossy().to_string();
    let mut recent = recent_projects(history_path);
    recent.retain(|existing| *existing != entry);
    recent.insert(0, entry);
    recent.truncate(MAX_RECENT);
    std::fs::write(history_path, recent.join("\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project_dir(name: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(format!("{}.py", name)), "x = 1\n").unwrap();
        tmp
    }

    #[test]
    fn test_load_scan_and_current() {
        let dir = project_dir("alpha");
        let mut registry = ProjectRegistry::new();
        let id = {
            let project = registry.load_project(dir.path()).unwrap();
            assert_eq!(project.scan.metadata.total_files, 1);
            project.id.clone()
        };
        assert_eq!(registry.current_id(), Some(id.as_str()));
        assert!(registry.get(None).is_some());
        assert!(registry.get(Some(id.as_str())).is_some());
        assert!(registry.get(Some("missing")).is_none());
    }

    #[test]
    fn test_project_limit_enforced() {
        let a = project_dir("a");
        let b = project_dir("b");
        let c = project_dir("c");
        let mut registry = ProjectRegistry::new();
        registry.load_project(a.path()).unwrap();
        registry.load_project(b.path()).unwrap();

        let err = registry.load_project(c.path()).unwrap_err();
        assert!(err.to_string().contains("maximum"));

        // Reloading an already-registered path is always allowed.
        registry.load_project(a.path()).unwrap();
        assert_eq!(registry.projects().len(), 2);
    }

    #[test]
    fn test_reload_keeps_chat_history() {
        let dir = project_dir("alpha");
        let mut registry = ProjectRegistry::new();
        registry.load_project(dir.path()).unwrap();
        registry
            .get_mut(None)
            .unwrap()
            .chat_history
            .push(ChatMessage {
                role: "user".to_string(),
                content: "hello".to_string(),
            });

        registry.load_project(dir.path()).unwrap();
        assert_eq!(registry.get(None).unwrap().chat_history.len(), 1);
    }

    #[test]
    fn test_unload_moves_current_pointer() {
        let a = project_dir("a");
        let b = project_dir("b");
        let mut registry = ProjectRegistry::new();
        let id_a = registry.load_project(a.path()).unwrap().id.clone();
        let id_b = registry.load_project(b.path()).unwrap().id.clone();
        assert_eq!(registry.current_id(), Some(id_b.as_str()));

        registry.unload(&id_b);
        assert_eq!(registry.current_id(), Some(id_a.as_str()));

        registry.unload(&id_a);
        assert_eq!(registry.current_id(), None);
        assert!(registry.projects().is_empty());
    }

    #[test]
    fn test_load_rejects_non_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("f.py");
        fs::write(&file, "x").unwrap();
        let mut registry = ProjectRegistry::new();
        assert!(registry.load_project(&file).is_err());
    }

    #[test]
    fn test_recent_projects_dedup_order_and_cap() {
        let tmp = TempDir::new().unwrap();
        let history = tmp.path().join("history");

        let mut dirs = Vec::new();
        for i in 0..12 {
            let d = tmp.path().join(format!("p{}", i));
            fs::create_dir(&d).unwrap();
            dirs.push(d);
        }
        for d in &dirs {
            add_recent_project(&history, d).unwrap();
        }
        let recent = recent_projects(&history);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0], dirs[11].to_string_lossy());

        // Re-adding moves to the front without duplicating.
        add_recent_project(&history, &dirs[5]).unwrap();
        let recent = recent_projects(&history);
        assert_eq!(recent[0], dirs[5].to_string_lossy());
        assert_eq!(
            recent.iter().filter(|p| **p == dirs[5].to_string_lossy()).count(),
            1
        );
    }

    #[test]
    fn test_recent_projects_skips_vanished_directories() {
        let tmp = TempDir::new().unwrap();
        let history = tmp.path().join("history");
        let gone = tmp.path().join("gone");
        fs::create_dir(&gone).unwrap();
        add_recent_project(&history, &gone).unwrap();
        fs::remove_dir(&gone).unwrap();
        assert!(recent_projects(&history).is_empty());
    }
}
