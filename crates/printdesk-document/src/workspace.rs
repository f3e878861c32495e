// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-submission workspaces.
//
// Each submission gets its own directory under the configured root, named
// `submission-<random>` by `tempfile` (created with O_EXCL semantics, so two
// submissions staged at the same instant can never share one).  The directory
// and everything in it is removed when the owning `Workspace` is closed or
// dropped, including when the future driving the submission is cancelled.

use std::future::Future;
use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, error};

use printdesk_core::error::{PrintdeskError, Result};

/// Prefix of every workspace directory name.
const WORKSPACE_PREFIX: &str = "submission-";

/// Exclusive owner of one workspace directory.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh, uniquely named workspace under `root`.
    ///
    /// `root` is created if it does not exist yet.
    pub fn create(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)?;
        debug!(path = %dir.path().display(), "workspace created");
        Ok(Self { dir })
    }

    /// [`Workspace::create`] on the blocking thread pool.
    pub async fn create_async(root: &Path) -> Result<Self> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || Self::create(&root))
            .await
            .map_err(std::io::Error::other)?
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A cloneable handle for code running inside the workspace.
    pub fn handle(&self) -> WorkspaceDir {
        WorkspaceDir {
            path: self.dir.path().to_path_buf(),
        }
    }

    /// Remove the directory and its contents, reporting any failure.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(path = %path.display(), "workspace removed");
        Ok(())
    }
}

/// Borrow-free view of a live workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceDir {
    path: PathBuf,
}

impl WorkspaceDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the uploaded bytes to `filename` inside the workspace.
    ///
    /// `filename` must be a single plain path component; anything that could
    /// resolve outside the workspace is rejected.
    pub async fn stage(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let mut components = Path::new(filename).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal {
            return Err(PrintdeskError::InvalidFile(format!(
                "'{filename}' is not a plain file name"
            )));
        }

        let target = self.path.join(filename);
        tokio::fs::write(&target, bytes).await?;
        debug!(path = %target.display(), size = bytes.len(), "source staged");
        Ok(target)
    }
}

/// Run `f` inside a fresh workspace under `root`, removing it afterwards.
///
/// Removal happens on every exit path: normal return, an error from `f`, or
/// the returned future being dropped early.  A failure to remove the
/// directory is logged and does not replace the result of `f`.
pub async fn with_workspace<F, Fut, T>(root: &Path, f: F) -> Result<T>
where
    F: FnOnce(WorkspaceDir) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let workspace = Workspace::create_async(root).await?;
    let result = f(workspace.handle()).await;

    let path = workspace.path().to_path_buf();
    let closed = tokio::task::spawn_blocking(move || workspace.close())
        .await
        .map_err(std::io::Error::other)
        .map_err(PrintdeskError::from)
        .and_then(|closed| closed);
    if let Err(e) = closed {
        error!(path = %path.display(), error = %e, "failed to remove workspace");
    }
    result
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn entries(root: &Path) -> usize {
        std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn stages_file_and_removes_on_success() {
        let root = tempfile::tempdir().unwrap();
        let seen = with_workspace(root.path(), |ws| async move {
            let staged = ws.stage("main.py", b"print(1)\n").await?;
            assert!(staged.starts_with(ws.path()));
            assert_eq!(tokio::fs::read(&staged).await?, b"print(1)\n");
            Ok::<_, PrintdeskError>(ws.path().to_path_buf())
        })
        .await
        .unwrap();

        assert!(!seen.exists());
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn removes_on_error() {
        let root = tempfile::tempdir().unwrap();
        let result: Result<()> = with_workspace(root.path(), |ws| async move {
            ws.stage("partial.txt", b"half").await?;
            Err::<(), _>(PrintdeskError::PrintBackend("rejected".into()))
        })
        .await;

        assert!(matches!(result, Err(PrintdeskError::PrintBackend(_))));
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn removes_when_cancelled() {
        let root = tempfile::tempdir().unwrap();
        let fut = with_workspace(root.path(), |ws| async move {
            ws.stage("slow.txt", b"x").await?;
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            Ok::<_, PrintdeskError>(())
        });

        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(100), fut).await;
        assert!(timed_out.is_err());
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn creates_missing_root_off_the_runtime() {
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("spool").join("printdesk");
        let workspace = Workspace::create_async(&root).await.unwrap();
        assert!(workspace.path().starts_with(&root));
        assert!(workspace.path().is_dir());
        workspace.close().unwrap();
        assert_eq!(entries(&root), 0);
    }

    #[tokio::test]
    async fn rejects_escaping_names() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(root.path()).unwrap();
        let ws = workspace.handle();
        for name in ["../escape.txt", "/etc/passwd", "a/b.txt", "..", ""] {
            let err = ws.stage(name, b"x").await.unwrap_err();
            assert!(matches!(err, PrintdeskError::InvalidFile(_)), "name {name:?}");
        }
        assert!(!root.path().join("escape.txt").exists());
        workspace.close().unwrap();
    }

    #[test]
    fn concurrent_workspaces_never_collide() {
        let root = tempfile::tempdir().unwrap();
        let root_path = root.path().to_path_buf();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let root_path = root_path.clone();
                std::thread::spawn(move || {
                    (0..8)
                        .map(|_| Workspace::create(&root_path).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let workspaces: Vec<Workspace> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let unique: HashSet<PathBuf> = workspaces.iter().map(|w| w.path().to_path_buf()).collect();
        assert_eq!(unique.len(), workspaces.len());

        for workspace in workspaces {
            workspace.close().unwrap();
        }
        assert_eq!(entries(&root_path), 0);
    }
}
