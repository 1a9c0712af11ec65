//! Persistence collaborator
//!
//! The core reads and writes documents through [`ProjectStore`] and never
//! commits on its own; whoever owns the transaction calls `save`.

use crate::document::Version;
use crate::error::StoreError;
use crate::style::Stylesheet;
use uuid::Uuid;

/// A writing project: its name and its own stylesheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Project {
    pub name: String,
    pub stylesheet: Stylesheet,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stylesheet: Stylesheet::default(),
        }
    }
}

/// A document and its current version
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub title: String,
    pub version: Version,
}

impl DocumentRecord {
    pub fn new(title: impl Into<String>, version: Version) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            version,
        }
    }

    pub fn uses_style(&self, name: &str) -> bool {
        self.version
            .content
            .runs()
            .iter()
            .any(|run| run.attributes.style_name.as_deref() == Some(name))
    }
}

/// Object store holding one project's documents
pub trait ProjectStore {
    fn project(&self) -> &Project;

    fn project_mut(&mut self) -> &mut Project;

    /// Every document matching `predicate`
    fn fetch(&self, predicate: &dyn Fn(&DocumentRecord) -> bool) -> Vec<DocumentRecord>;

    fn insert(&mut self, record: DocumentRecord) -> Result<(), StoreError>;

    /// Replace a stored document with the same id
    fn update(&mut self, record: DocumentRecord) -> Result<(), StoreError>;

    fn delete(&mut self, id: Uuid) -> Result<DocumentRecord, StoreError>;

    /// Commit pending changes
    fn save(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Snapshot {
    project: Project,
    documents: Vec<DocumentRecord>,
}

/// In-memory store with a working copy and a committed copy
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    committed: Snapshot,
    working: Snapshot,
}

impl MemoryStore {
    pub fn new(project: Project) -> Self {
        let snapshot = Snapshot {
            project,
            documents: Vec::new(),
        };
        Self {
            committed: snapshot.clone(),
            working: snapshot,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.committed != self.working
    }

    /// Drop uncommitted changes
    pub fn discard(&mut self) {
        self.working = self.committed.clone();
    }

    pub fn get(&self, id: Uuid) -> Option<&DocumentRecord> {
        self.working.documents.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.working.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.documents.is_empty()
    }
}

impl ProjectStore for MemoryStore {
    fn project(&self) -> &Project {
        &self.working.project
    }

    fn project_mut(&mut self) -> &mut Project {
        &mut self.working.project
    }

    fn fetch(&self, predicate: &dyn Fn(&DocumentRecord) -> bool) -> Vec<DocumentRecord> {
        self.working
            .documents
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    fn insert(&mut self, record: DocumentRecord) -> Result<(), StoreError> {
        if self.get(record.id).is_some() {
            return Err(StoreError::Duplicate(record.id));
        }
        self.working.documents.push(record);
        Ok(())
    }

    fn update(&mut self, record: DocumentRecord) -> Result<(), StoreError> {
        let slot = self
            .working
            .documents
            .iter_mut()
            .find(|existing| existing.id == record.id)
            .ok_or(StoreError::NotFound(record.id))?;
        *slot = record;
        Ok(())
    }

    fn delete(&mut self, id: Uuid) -> Result<DocumentRecord, StoreError> {
        let idx = self
            .working
            .documents
            .iter()
            .position(|record| record.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(self.working.documents.remove(idx))
    }

    fn save(&mut self) -> Result<(), StoreError> {
        log::debug!(
            "Committing {} document(s) in project {:?}",
            self.working.documents.len(),
            self.working.project.name
        );
        self.committed = self.working.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AttributeSet, StyledText};

    fn record(title: &str, style: &str) -> DocumentRecord {
        let content = StyledText::new(title, AttributeSet::body().with_style(style));
        DocumentRecord::new(title, Version::new(content))
    }

    #[test]
    fn test_insert_fetch_delete() {
        let mut store = MemoryStore::new(Project::new("Novel"));
        let chapter = record("Chapter", "Heading 1");
        let id = chapter.id;
        store.insert(chapter.clone()).unwrap();
        store.insert(record("Notes", "Body")).unwrap();

        assert_eq!(store.insert(chapter), Err(StoreError::Duplicate(id)));
        let headings = store.fetch(&|record| record.uses_style("Heading 1"));
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].id, id);

        assert_eq!(store.delete(id).map(|r| r.title), Ok("Chapter".to_string()));
        assert_eq!(store.delete(id), Err(StoreError::NotFound(id)));
    }

    #[test]
    fn test_save_and_discard() {
        let mut store = MemoryStore::new(Project::new("Novel"));
        store.insert(record("Draft", "Body")).unwrap();
        assert!(store.has_changes());
        store.save().unwrap();
        assert!(!store.has_changes());

        store.insert(record("Scrap", "Body")).unwrap();
        store.discard();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_requires_existing() {
        let mut store = MemoryStore::new(Project::new("Novel"));
        let missing = record("Ghost", "Body");
        assert_eq!(store.update(missing.clone()), Err(StoreError::NotFound(missing.id)));
    }
}
