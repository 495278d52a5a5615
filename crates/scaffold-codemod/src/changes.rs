use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Add,
    Update,
    Delete,
}

impl ChangeType {
    pub fn label(self) -> &'static str {
        match self {
            ChangeType::Add => "ADD",
            ChangeType::Update => "UPDATE",
            ChangeType::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pending state of one path. `content` is `None` only for deletions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub content: Option<String>,
    pub change_type: ChangeType,
}

impl FileRecord {
    pub(crate) fn add(content: String) -> Self {
        Self {
            content: Some(content),
            change_type: ChangeType::Add,
        }
    }

    pub(crate) fn update(content: String) -> Self {
        Self {
            content: Some(content),
            change_type: ChangeType::Update,
        }
    }

    pub(crate) fn delete() -> Self {
        Self {
            content: None,
            change_type: ChangeType::Delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub path: String,
    pub record: FileRecord,
}

/// Read-only projection of an overlay's pending changes, in the order the
/// paths were first touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub(crate) fn new(changes: Vec<Change>) -> Self {
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.changes
            .iter()
            .find(|c| c.path == path)
            .map(|c| &c.record)
    }

    pub fn paths(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.path.as_str()).collect()
    }

    /// Paths with the given change type, in touch order.
    pub fn of_type(&self, change_type: ChangeType) -> Vec<&str> {
        self.changes
            .iter()
            .filter(|c| c.record.change_type == change_type)
            .map(|c| c.path.as_str())
            .collect()
    }

    /// True when `path` is added or updated by this change set.
    pub fn writes(&self, path: &str) -> bool {
        self.get(path)
            .is_some_and(|r| r.change_type != ChangeType::Delete)
    }
}

/// One line per change, grouped ADD, UPDATE, DELETE.
impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.changes.is_empty() {
            return writeln!(f, "No changes were made");
        }
        for change_type in [ChangeType::Add, ChangeType::Update, ChangeType::Delete] {
            for path in self.of_type(change_type) {
                writeln!(f, "{change_type} {path}")?;
            }
        }
        Ok(())
    }
}
