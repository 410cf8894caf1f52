//! In-memory project file store backed by the project root directory.
//!
//! The store is loaded once at run start, mutated in memory by applied stages,
//! and flushed file-by-file. Every filesystem failure is logged and skipped so a
//! single bad file never ends a session.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

use crate::core::parser::{ParsedFile, normalize_path};

/// Path segments owned by version control; never loaded.
pub const RESERVED_SEGMENTS: [&str; 3] = [".git", ".hg", ".svn"];

/// Extensions treated as binary and never loaded (compared case-insensitively).
pub const BINARY_EXTENSIONS: [&str; 12] = [
    "png", "jpg", "jpeg", "gif", "ico", "pdf", "zip", "exe", "dll", "so", "dylib", "bin",
];

const PROBE_FILE: &str = ".write_probe";

/// A text file relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub path: String,
    pub content: String,
}

/// Outcome of flushing the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub written: usize,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectFileStore {
    root: PathBuf,
    files: BTreeMap<String, ProjectFile>,
}

impl ProjectFileStore {
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: BTreeMap::new(),
        }
    }

    /// Scan `root` for text files.
    ///
    /// A missing root yields an empty store. Unreadable or non-UTF-8 files are
    /// logged and omitted.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn load(root: &Path) -> Self {
        let mut store = Self::empty(root);
        if !root.is_dir() {
            warn!("project root is not a directory, starting with an empty store");
            return store;
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !is_reserved(entry));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(err = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || is_binary(entry.path()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let key = relative.to_string_lossy().into_owned();
            match read_text(entry.path()) {
                Ok(content) => {
                    store.files.insert(
                        key.clone(),
                        ProjectFile {
                            path: key,
                            content,
                        },
                    );
                }
                Err(err) => warn!(path = %key, err = %format!("{err:#}"), "skipping file"),
            }
        }

        info!(files = store.files.len(), "loaded project files");
        store
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, path: &str) -> Option<&ProjectFile> {
        self.files.get(&normalize_path(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProjectFile> {
        self.files.values()
    }

    /// Insert or fully replace the content stored under `path`.
    pub fn upsert(&mut self, path: &str, content: impl Into<String>) {
        let key = normalize_path(path);
        self.files.insert(
            key.clone(),
            ProjectFile {
                path: key,
                content: content.into(),
            },
        );
    }

    /// Apply parsed sections in order; later sections replace earlier ones.
    pub fn apply_parsed(&mut self, files: Vec<ParsedFile>) -> usize {
        let count = files.len();
        for file in files {
            debug!(path = %file.path, "processed file section");
            self.upsert(&file.path, file.content);
        }
        count
    }

    /// Write one file under the root and return its on-disk size.
    pub fn save(&self, file: &ProjectFile) -> Result<u64> {
        let target = self.root.join(&file.path);
        debug!(target = %target.display(), "writing project file");
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&target, &file.content)
            .with_context(|| format!("write {}", target.display()))?;
        let metadata = fs::metadata(&target)
            .with_context(|| format!("verify {} after write", target.display()))?;
        if !metadata.is_file() {
            return Err(anyhow!("{} is not a regular file after write", target.display()));
        }
        debug!(
            target = %target.display(),
            chars = file.content.chars().count(),
            bytes = metadata.len(),
            "verified project file"
        );
        Ok(metadata.len())
    }

    /// Flush every file. Failures are logged and reported, never raised.
    #[instrument(skip_all, fields(root = %self.root.display(), files = self.files.len()))]
    pub fn save_all(&self) -> SaveReport {
        let mut report = SaveReport::default();
        for file in self.files.values() {
            match self.save(file) {
                Ok(_) => report.written += 1,
                Err(err) => {
                    error!(path = %file.path, err = %format!("{err:#}"), "failed to save project file");
                    report.failed.push(file.path.clone());
                }
            }
        }
        if !report.failed.is_empty() {
            warn!(failed = report.failed.len(), "some project files were not saved");
        }
        report
    }
}

/// Check that the project root and `doc/` can be created, written and read back.
///
/// Problems are logged; the run continues either way.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn preflight(root: &Path) {
    match probe_writable(root) {
        Ok(()) => debug!("project root is writable"),
        Err(err) => warn!(
            err = %format!("{err:#}"),
            "project root failed the write check; files may not be saved"
        ),
    }
}

fn probe_writable(root: &Path) -> Result<()> {
    let doc_dir = root.join("doc");
    fs::create_dir_all(&doc_dir)
        .with_context(|| format!("create directory {}", doc_dir.display()))?;
    let probe = doc_dir.join(PROBE_FILE);
    fs::write(&probe, "probe").with_context(|| format!("write {}", probe.display()))?;
    let read_back =
        fs::read_to_string(&probe).with_context(|| format!("read {}", probe.display()))?;
    fs::remove_file(&probe).with_context(|| format!("remove {}", probe.display()))?;
    if read_back != "probe" {
        return Err(anyhow!("probe content mismatch in {}", probe.display()));
    }
    Ok(())
}

fn is_reserved(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| RESERVED_SEGMENTS.contains(&name))
}

fn is_binary(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            BINARY_EXTENSIONS.contains(&ext.as_str())
        })
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    String::from_utf8(bytes).with_context(|| format!("decode {} as UTF-8", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    #[test]
    fn load_skips_vcs_binary_and_undecodable_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        write(root, "README.md", b"hello");
        write(root, "doc/notes.txt", b"notes");
        write(root, ".git/config", b"[core]");
        write(root, "nested/.git/HEAD", b"ref");
        write(root, ".hg/store", b"x");
        write(root, "logo.PNG", b"fake");
        write(root, "tool.exe", b"fake");
        write(root, "latin1.txt", &[0xff, 0xfe, 0x41]);

        let store = ProjectFileStore::load(root);

        let notes = normalize_path("doc/notes.txt");
        let paths: Vec<&str> = store.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", notes.as_str()]);
        assert_eq!(store.get("README.md").map(|f| f.content.as_str()), Some("hello"));
    }

    #[test]
    fn load_keeps_dotfiles_that_only_resemble_vcs_names() {
        let temp = tempfile::tempdir().expect("tempdir");
        write(temp.path(), ".github/workflow.yml", b"on: push");
        write(temp.path(), ".gitignore", b"target/");

        let store = ProjectFileStore::load(temp.path());
        assert!(store.contains(".github/workflow.yml"));
        assert!(store.contains(".gitignore"));
    }

    #[test]
    fn load_missing_root_is_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ProjectFileStore::load(&temp.path().join("missing"));
        assert!(store.is_empty());
    }

    #[test]
    fn save_all_creates_parents_and_reports() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut store = ProjectFileStore::empty(temp.path());
        store.upsert("doc/deep/FILE.md", "content");
        store.upsert("top.txt", "top");

        let report = store.save_all();

        assert_eq!(report.written, 2);
        assert!(report.failed.is_empty());
        let saved = fs::read_to_string(temp.path().join("doc/deep/FILE.md")).expect("read");
        assert_eq!(saved, "content");
    }

    #[test]
    fn save_failure_is_reported_and_other_files_still_written() {
        let temp = tempfile::tempdir().expect("tempdir");
        // A regular file where a directory is needed makes the nested write fail.
        fs::write(temp.path().join("blocker"), "file").expect("write blocker");
        let mut store = ProjectFileStore::empty(temp.path());
        store.upsert("blocker/inner.md", "nope");
        store.upsert("fine.md", "ok");

        let report = store.save_all();

        assert_eq!(report.written, 1);
        assert_eq!(report.failed, vec![normalize_path("blocker/inner.md")]);
        assert!(temp.path().join("fine.md").is_file());
    }

    #[test]
    fn apply_parsed_replaces_existing_content() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut store = ProjectFileStore::empty(temp.path());
        store.upsert("x.md", "original");

        let applied = store.apply_parsed(vec![
            ParsedFile {
                path: "x.md".to_string(),
                content: "first".to_string(),
            },
            ParsedFile {
                path: "x.md".to_string(),
                content: "second".to_string(),
            },
        ]);

        assert_eq!(applied, 2);
        assert_eq!(store.get("x.md").map(|f| f.content.as_str()), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn current_dir_spellings_share_one_entry() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut store = ProjectFileStore::empty(temp.path());
        store.apply_parsed(crate::core::parser::parse_response(
            "=== File: doc/./x.md ===\nNEW",
        ));
        store.upsert("doc/x.md", "OLD");
        store.upsert("./doc/x.md", "LATEST");

        let report = store.save_all();

        assert_eq!(store.len(), 1);
        assert_eq!(report.written, 1);
        let saved = fs::read_to_string(temp.path().join("doc/x.md")).expect("read");
        assert_eq!(saved, "LATEST");
    }

    #[test]
    fn preflight_creates_doc_dir_and_leaves_no_probe() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().join("project");

        preflight(&root);

        assert!(root.join("doc").is_dir());
        assert!(!root.join("doc").join(PROBE_FILE).exists());
    }
}
