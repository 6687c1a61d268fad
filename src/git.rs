//! Recent-change counts from git history.
//!
//! Shells out to `git log --name-only` over a fixed window. This is a
//! degradable sub-step: any failure — git missing, not a repository,
//! nonzero exit, timeout — yields `None` and the scan proceeds with zero
//! adjustment.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// History window passed to `git log --since`.
const HISTORY_WINDOW: &str = "6 months ago";
/// Hard ceiling on how long the history query may run.
const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Count how many commits touched each path within the history window.
///
/// Keys are repository-relative paths exactly as git prints them. Returns
/// `None` on any failure; the caller treats that as "no data".
pub fn recent_change_counts(root: &Path) -> Option<HashMap<String, usize>> {
    let mut child = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["log", "--format=", "--name-only", "--since", HISTORY_WINDOW])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .stdin(Stdio::null())
        .spawn()
        .ok()?;

    // Drain stdout on a separate thread; a large log would otherwise fill
    // the pipe and stall the child past the deadline.
    let mut stdout = child.stdout.take()?;
    let reader = std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = stdout.read_to_string(&mut buf);
        buf
    });

    let deadline = Instant::now() + GIT_TIMEOUT;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
        }
    };

    if !status.success() {
        return None;
    }

    let output = reader.join().ok()?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for line in output.lines() {
        let line = line.trim();
        if !line.is_empty() {
            *counts.entry(line.to_string()).or_insert(0) += 1;
        }
    }
    Some(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_non_repository_degrades_to_none() {
        let tmp = TempDir::new().unwrap();
        // Either git is absent (spawn fails) or it exits nonzero on a
        // directory that is not a repository; both must degrade cleanly.
        assert!(recent_change_counts(tmp.path()).is_none());
    }
}
