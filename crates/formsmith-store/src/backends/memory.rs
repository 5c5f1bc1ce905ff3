use formsmith_schema::SavedForm;
use parking_lot::RwLock;

use crate::traits::{FormStore, remove, upsert};
use crate::StoreError;

/// Volatile store; handy for previews and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    forms: RwLock<Vec<SavedForm>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forms(forms: Vec<SavedForm>) -> Self {
        Self {
            forms: RwLock::new(forms),
        }
    }
}

impl FormStore for MemoryStore {
    fn list(&self) -> Result<Vec<SavedForm>, StoreError> {
        Ok(self.forms.read().clone())
    }

    fn get(&self, id: &str) -> Result<Option<SavedForm>, StoreError> {
        Ok(self.forms.read().iter().find(|f| f.id == id).cloned())
    }

    fn save(&self, form: SavedForm) -> Result<(), StoreError> {
        upsert(&mut self.forms.write(), form);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        remove(&mut self.forms.write(), id).map(|_| ())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.forms.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formsmith_schema::Timestamp;

    fn form(id: &str, name: &str) -> SavedForm {
        SavedForm::new(id, name, vec![], Timestamp::from_millis(0).unwrap())
    }

    #[test]
    fn save_replaces_by_id_and_keeps_order() {
        let store = MemoryStore::new();
        store.save(form("1", "first")).unwrap();
        store.save(form("2", "second")).unwrap();
        store.save(form("1", "renamed")).unwrap();

        let names: Vec<_> = store.list().unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["renamed", "second"]);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let store = MemoryStore::with_forms(vec![form("1", "a")]);
        assert!(matches!(store.delete("9"), Err(StoreError::NotFound(id)) if id == "9"));
        store.delete("1").unwrap();
        assert!(store.is_empty().unwrap());
        assert!(store.get("1").unwrap().is_none());
    }
}
