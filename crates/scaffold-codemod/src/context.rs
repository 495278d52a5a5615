//! In-memory overlay of pending file changes on top of a project directory.
//!
//! Codemods read and write exclusively through [`Context`]. Nothing touches
//! the project directory until [`Context::flush`] is called by the runner.
//!
//! Paths are normalised relative to the base path: `./src/a.ts`, `src/a.ts`,
//! `src//a.ts`, `/src/a.ts` and `<base>/src/a.ts` all name the same record.
//! `..` never climbs above the base path.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::changes::{Change, ChangeSet, ChangeType, FileRecord};
use crate::error::{FlushError, PathStateError};
use crate::file_provider::{DefaultFileProvider, FileProvider};

#[derive(Clone)]
pub struct Context {
    base_path: PathBuf,
    files: IndexMap<String, FileRecord>,
    provider: Arc<dyn FileProvider>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("base_path", &self.base_path)
            .field("files", &self.files)
            .finish()
    }
}

impl Context {
    /// Overlay on top of the real filesystem rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self::with_provider(base_path, Arc::new(DefaultFileProvider::new()))
    }

    pub fn with_provider(base_path: impl Into<PathBuf>, provider: Arc<dyn FileProvider>) -> Self {
        Self {
            base_path: base_path.into(),
            files: IndexMap::new(),
            provider,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn provider(&self) -> &Arc<dyn FileProvider> {
        &self.provider
    }

    pub fn add_file(&mut self, file_path: &str, content: impl Into<String>) -> Result<(), PathStateError> {
        let path = self.normalise_path(file_path);
        if self.exists_normalised(&path) {
            return Err(PathStateError::AlreadyExists(path));
        }
        self.files.insert(path, FileRecord::add(content.into()));
        Ok(())
    }

    /// Replace the content of an existing file. Writing the content the file
    /// already has records nothing.
    pub fn update_file(&mut self, file_path: &str, content: impl Into<String>) -> Result<(), PathStateError> {
        let path = self.normalise_path(file_path);
        let content = content.into();

        let Some(current) = self.get_normalised(&path) else {
            return Err(PathStateError::NotFound(path));
        };
        if current == content {
            debug!("Context::update_file() - no updates for {path}");
            return Ok(());
        }

        match self.files.get_mut(&path) {
            Some(record) if record.change_type == ChangeType::Add => {
                record.content = Some(content);
            }
            _ => {
                self.files.insert(path, FileRecord::update(content));
            }
        }
        Ok(())
    }

    pub fn delete_file(&mut self, file_path: &str) -> Result<(), PathStateError> {
        let path = self.normalise_path(file_path);

        match self.files.get(&path).map(|r| r.change_type) {
            Some(ChangeType::Add) => {
                self.files.shift_remove(&path);
                Ok(())
            }
            Some(ChangeType::Delete) => Err(PathStateError::AlreadyDeleted(path)),
            Some(ChangeType::Update) => {
                self.files.insert(path, FileRecord::delete());
                Ok(())
            }
            None if self.exists_on_disk_normalised(&path) => {
                self.files.insert(path, FileRecord::delete());
                Ok(())
            }
            None => Err(PathStateError::NotFound(path)),
        }
    }

    pub fn rename_file(&mut self, from: &str, to: &str) -> Result<(), PathStateError> {
        let from_path = self.normalise_path(from);
        let to_path = self.normalise_path(to);

        let Some(content) = self.get_normalised(&from_path) else {
            return Err(PathStateError::NotFound(from_path));
        };
        if self.exists_normalised(&to_path) {
            return Err(PathStateError::AlreadyExists(to_path));
        }

        self.delete_file(&from_path)?;
        self.add_file(&to_path, content)
    }

    pub fn get_file(&self, file_path: &str) -> Option<String> {
        self.get_normalised(&self.normalise_path(file_path))
    }

    pub fn does_file_exist(&self, file_path: &str) -> bool {
        self.exists_normalised(&self.normalise_path(file_path))
    }

    /// Whether the file exists in the project directory, ignoring the overlay.
    pub fn does_file_exist_on_disk(&self, file_path: &str) -> bool {
        self.exists_on_disk_normalised(&self.normalise_path(file_path))
    }

    /// Children of `folder_path` as normalised paths.
    ///
    /// Entries on disk come first, sorted by name, without the ones deleted
    /// in this overlay. Files added in this overlay follow in the order they
    /// were added.
    pub fn read_dir(&self, folder_path: &str) -> Vec<String> {
        let folder = self.normalise_path(folder_path);

        let mut on_disk = self
            .provider
            .list_directory(&self.disk_path(&folder))
            .unwrap_or_default();
        on_disk.sort();

        let mut children: Vec<String> = on_disk
            .into_iter()
            .map(|name| join_relative(&folder, &name))
            .filter(|child| {
                self.files
                    .get(child)
                    .is_none_or(|r| r.change_type != ChangeType::Delete)
            })
            .collect();

        let added: Vec<String> = self
            .files
            .iter()
            .filter(|(path, record)| {
                record.change_type == ChangeType::Add && parent_of(path) == folder
            })
            .map(|(path, _)| path.clone())
            .filter(|path| !children.contains(path))
            .collect();
        children.extend(added);
        children
    }

    pub fn list_changes(&self) -> ChangeSet {
        ChangeSet::new(
            self.files
                .iter()
                .map(|(path, record)| Change {
                    path: path.clone(),
                    record: record.clone(),
                })
                .collect(),
        )
    }

    /// Pending records in first-touched order.
    pub fn changes(&self) -> impl Iterator<Item = (&str, &FileRecord)> {
        self.files.iter().map(|(path, record)| (path.as_str(), record))
    }

    pub fn has_changes(&self) -> bool {
        !self.files.is_empty()
    }

    /// Replace the pending content of an added or updated path without
    /// re-checking overlay rules. Used by post-processing such as formatting.
    pub(crate) fn replace_pending_content(&mut self, path: &str, content: String) {
        if let Some(record) = self.files.get_mut(path) {
            if record.change_type != ChangeType::Delete {
                record.content = Some(content);
            }
        }
    }

    /// Apply every pending record to the project directory.
    pub fn flush(&self) -> Result<(), FlushError> {
        for (path, record) in &self.files {
            let disk_path = self.disk_path(path);
            let result = match (&record.change_type, &record.content) {
                (ChangeType::Add | ChangeType::Update, Some(content)) => {
                    self.provider.write_file(&disk_path, content)
                }
                (ChangeType::Delete, _) => self.provider.remove_file(&disk_path),
                (_, None) => Ok(()),
            };
            result.map_err(|source| FlushError {
                path: path.clone(),
                source,
            })?;
            debug!("flushed {} {path}", record.change_type);
        }
        Ok(())
    }

    pub fn normalise_path(&self, file_path: &str) -> String {
        let unified = file_path.replace('\\', "/");
        let candidate = Path::new(&unified);
        let relative = if candidate.is_absolute() {
            candidate
                .strip_prefix(&self.base_path)
                .unwrap_or(candidate)
                .to_path_buf()
        } else {
            candidate.to_path_buf()
        };

        let mut parts: Vec<String> = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                // Clamped at the base path.
                Component::ParentDir => {
                    parts.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        parts.join("/")
    }

    fn disk_path(&self, normalised: &str) -> PathBuf {
        if normalised.is_empty() {
            self.base_path.clone()
        } else {
            self.base_path.join(normalised)
        }
    }

    fn get_normalised(&self, path: &str) -> Option<String> {
        match self.files.get(path) {
            Some(record) => record.content.clone(),
            None => self.provider.read_file(&self.disk_path(path)).ok(),
        }
    }

    fn exists_normalised(&self, path: &str) -> bool {
        match self.files.get(path) {
            Some(record) => record.change_type != ChangeType::Delete,
            None => self.exists_on_disk_normalised(path),
        }
    }

    fn exists_on_disk_normalised(&self, path: &str) -> bool {
        !path.is_empty() && self.provider.is_file(&self.disk_path(path))
    }
}

fn join_relative(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_provider::InMemoryFileProvider;
    use std::fs;

    fn virtual_project(files: &[(&str, &str)]) -> (Context, Arc<InMemoryFileProvider>) {
        let provider = Arc::new(InMemoryFileProvider::with_files(
            files
                .iter()
                .map(|(p, c)| (PathBuf::from("/virtual").join(p), c.to_string())),
        ));
        (Context::with_provider("/virtual", provider.clone()), provider)
    }

    #[test]
    fn normalises_equivalent_spellings() {
        let (ctx, _) = virtual_project(&[]);
        for spelling in [
            "src/a.ts",
            "./src/a.ts",
            "src//a.ts",
            "/src/a.ts",
            "/virtual/src/a.ts",
            "src/nested/../a.ts",
            "src\\a.ts",
        ] {
            assert_eq!(ctx.normalise_path(spelling), "src/a.ts", "{spelling}");
        }
        assert_eq!(ctx.normalise_path("."), "");
    }

    #[test]
    fn parent_components_never_leave_the_base_path() {
        let (ctx, _) = virtual_project(&[]);
        assert_eq!(ctx.normalise_path("../x"), "x");
        assert_eq!(ctx.normalise_path("src/../../../etc/passwd"), "etc/passwd");
        assert_eq!(ctx.normalise_path("/virtual/../outside.ts"), "outside.ts");
    }

    #[test]
    fn read_after_write() {
        let (mut ctx, _) = virtual_project(&[]);
        ctx.add_file("./src/foo.json", "{\"foo\":\"bar\"}").unwrap();

        assert_eq!(ctx.get_file("src/foo.json").as_deref(), Some("{\"foo\":\"bar\"}"));
        assert!(ctx.does_file_exist("src/foo.json"));
        assert!(!ctx.does_file_exist_on_disk("src/foo.json"));
    }

    #[test]
    fn reads_fall_through_to_disk() {
        let (ctx, _) = virtual_project(&[("package.json", "{}")]);
        assert_eq!(ctx.get_file("./package.json").as_deref(), Some("{}"));
        assert_eq!(ctx.get_file("missing.json"), None);
        assert!(!ctx.has_changes());
    }

    #[test]
    fn delete_hides_disk_and_overlay_files() {
        let (mut ctx, _) = virtual_project(&[("src/README.md", "# readme")]);
        ctx.add_file("src/new.ts", "export {};").unwrap();

        ctx.delete_file("src/README.md").unwrap();
        ctx.delete_file("src/new.ts").unwrap();

        assert_eq!(ctx.get_file("src/README.md"), None);
        assert_eq!(ctx.get_file("src/new.ts"), None);
        assert!(!ctx.does_file_exist("src/README.md"));

        let changes = ctx.list_changes();
        assert_eq!(changes.paths(), vec!["src/README.md"]);
        assert_eq!(
            changes.get("src/README.md").map(|r| r.change_type),
            Some(ChangeType::Delete)
        );
    }

    #[test]
    fn add_on_existing_fails_and_keeps_first_record() {
        let (mut ctx, _) = virtual_project(&[("package.json", "{}")]);
        ctx.add_file("a.txt", "one").unwrap();

        assert_eq!(
            ctx.add_file("./a.txt", "two"),
            Err(PathStateError::AlreadyExists("a.txt".into()))
        );
        assert_eq!(ctx.get_file("a.txt").as_deref(), Some("one"));
        assert_eq!(
            ctx.add_file("package.json", "{}"),
            Err(PathStateError::AlreadyExists("package.json".into()))
        );
    }

    #[test]
    fn update_and_delete_on_missing_fail() {
        let (mut ctx, _) = virtual_project(&[]);
        assert_eq!(
            ctx.update_file("nope.ts", ""),
            Err(PathStateError::NotFound("nope.ts".into()))
        );
        assert_eq!(
            ctx.delete_file("nope.ts"),
            Err(PathStateError::NotFound("nope.ts".into()))
        );
        assert!(!ctx.has_changes());
    }

    #[test]
    fn deleting_twice_fails() {
        let (mut ctx, _) = virtual_project(&[("a.ts", "a")]);
        ctx.delete_file("a.ts").unwrap();
        assert_eq!(
            ctx.delete_file("a.ts"),
            Err(PathStateError::AlreadyDeleted("a.ts".into()))
        );
    }

    #[test]
    fn no_op_update_records_nothing() {
        let (mut ctx, _) = virtual_project(&[("package.json", "{}")]);
        ctx.update_file("package.json", "{}").unwrap();
        assert!(!ctx.has_changes());

        ctx.update_file("package.json", "{\"a\":1}").unwrap();
        let before = ctx.list_changes();
        ctx.update_file("./package.json", "{\"a\":1}").unwrap();
        assert_eq!(ctx.list_changes(), before);
    }

    #[test]
    fn updating_a_pending_add_keeps_it_an_add() {
        let (mut ctx, _) = virtual_project(&[]);
        ctx.add_file("a.ts", "1").unwrap();
        ctx.update_file("a.ts", "2").unwrap();

        let changes = ctx.list_changes();
        let record = changes.get("a.ts").unwrap();
        assert_eq!(record.change_type, ChangeType::Add);
        assert_eq!(record.content.as_deref(), Some("2"));
    }

    #[test]
    fn re_adding_a_deleted_file_is_recorded_as_add() {
        let (mut ctx, _) = virtual_project(&[("a.ts", "same")]);
        ctx.delete_file("a.ts").unwrap();
        ctx.add_file("a.ts", "same").unwrap();

        assert_eq!(
            ctx.list_changes().get("a.ts").map(|r| r.change_type),
            Some(ChangeType::Add)
        );
    }

    #[test]
    fn rename_is_delete_then_add() {
        let (mut ctx, _) = virtual_project(&[(".eslintrc", "X")]);
        ctx.rename_file(".eslintrc", ".eslint.config.json").unwrap();

        let changes = ctx.list_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes.get(".eslint.config.json"),
            Some(&FileRecord::add("X".into()))
        );
        assert_eq!(changes.get(".eslintrc"), Some(&FileRecord::delete()));
    }

    #[test]
    fn rename_rejects_missing_source_and_existing_target() {
        let (mut ctx, _) = virtual_project(&[("a.ts", "a"), ("b.ts", "b")]);
        assert_eq!(
            ctx.rename_file("missing.ts", "c.ts"),
            Err(PathStateError::NotFound("missing.ts".into()))
        );
        assert_eq!(
            ctx.rename_file("a.ts", "b.ts"),
            Err(PathStateError::AlreadyExists("b.ts".into()))
        );
        assert!(!ctx.has_changes());
    }

    #[test]
    fn read_dir_merges_and_filters() {
        let (mut ctx, _) = virtual_project(&[("F/b.ts", ""), ("F/a.ts", ""), ("G/x.ts", "")]);
        ctx.delete_file("F/a.ts").unwrap();
        ctx.add_file("F/c.ts", "").unwrap();
        ctx.add_file("G/y.ts", "").unwrap();

        assert_eq!(ctx.read_dir("F"), vec!["F/b.ts", "F/c.ts"]);
        assert_eq!(ctx.read_dir("./F/"), vec!["F/b.ts", "F/c.ts"]);
        assert_eq!(ctx.read_dir("empty"), Vec::<String>::new());
    }

    #[test]
    fn read_dir_does_not_duplicate_re_added_files() {
        let (mut ctx, _) = virtual_project(&[("F/a.ts", "")]);
        ctx.delete_file("F/a.ts").unwrap();
        ctx.add_file("F/a.ts", "again").unwrap();
        assert_eq!(ctx.read_dir("F"), vec!["F/a.ts"]);
    }

    #[test]
    fn flush_applies_records_to_disk() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("src"))?;
        fs::write(root.join("package.json"), "{}")?;
        fs::write(root.join("src/README.md"), "# readme")?;

        let mut ctx = Context::new(root);
        ctx.update_file("package.json", "{\"name\":\"plugin\"}")?;
        ctx.delete_file("src/README.md")?;
        ctx.add_file(".config/types/setupTests.d.ts", "import '@testing-library/jest-dom';\n")?;
        ctx.flush()?;

        assert_eq!(fs::read_to_string(root.join("package.json"))?, "{\"name\":\"plugin\"}");
        assert!(!root.join("src/README.md").exists());
        assert_eq!(
            fs::read_to_string(root.join(".config/types/setupTests.d.ts"))?,
            "import '@testing-library/jest-dom';\n"
        );
        Ok(())
    }

    #[test]
    fn flush_stays_inside_the_project() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("project");
        fs::create_dir_all(&root)?;

        let mut ctx = Context::new(&root);
        ctx.add_file("../escaped.txt", "nope")?;
        ctx.flush()?;

        assert!(!temp.path().join("escaped.txt").exists());
        assert_eq!(fs::read_to_string(root.join("escaped.txt"))?, "nope");
        Ok(())
    }
}
