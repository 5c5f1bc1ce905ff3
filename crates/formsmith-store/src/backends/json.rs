use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use formsmith_schema::SavedForm;
use parking_lot::RwLock;

use crate::traits::{FormStore, remove, upsert};
use crate::StoreError;

/// Saved forms kept as one JSON array in a file.
///
/// The file is read once on open and rewritten whole on every change. A
/// missing file is an empty store. A file that is not a JSON array is treated
/// as empty too, and array entries that are not saved forms are skipped; either
/// way the file is replaced on the next save.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    forms: RwLock<Vec<SavedForm>>,
    recovered: bool,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let (forms, recovered) = match std::fs::read_to_string(&path) {
            Ok(text) => match parse_forms(&text) {
                Some((forms, skipped)) => {
                    #[cfg(feature = "tracing")]
                    for (index, err) in &skipped {
                        tracing::warn!(path = %path.display(), index, error = %err, "skipping unreadable saved form");
                    }
                    (forms, !skipped.is_empty())
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(path = %path.display(), "saved forms file is unreadable; starting empty");
                    (Vec::new(), true)
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => (Vec::new(), false),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        Ok(Self {
            path,
            forms: RwLock::new(forms),
            recovered,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file existed but some or all of it was discarded on open.
    pub fn was_recovered(&self) -> bool {
        self.recovered
    }

    fn write_all(&self, forms: &[SavedForm]) -> Result<(), StoreError> {
        let s = serde_json::to_string_pretty(forms)?;
        let mut file = File::create(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        file.write_all(s.as_bytes())
            .map_err(|e| StoreError::io(&self.path, e))
    }
}

/// Forms that deserialize, plus the index and error of each entry that did
/// not. `None` when the text is not a JSON array.
fn parse_forms(text: &str) -> Option<(Vec<SavedForm>, Vec<(usize, serde_json::Error)>)> {
    if text.trim().is_empty() {
        return Some((Vec::new(), Vec::new()));
    }
    let entries = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Array(entries)) => entries,
        _ => return None,
    };

    let mut forms = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<SavedForm>(entry) {
            Ok(form) => forms.push(form),
            Err(err) => skipped.push((index, err)),
        }
    }
    Some((forms, skipped))
}

impl FormStore for JsonFileStore {
    fn list(&self) -> Result<Vec<SavedForm>, StoreError> {
        Ok(self.forms.read().clone())
    }

    fn get(&self, id: &str) -> Result<Option<SavedForm>, StoreError> {
        Ok(self.forms.read().iter().find(|f| f.id == id).cloned())
    }

    fn save(&self, form: SavedForm) -> Result<(), StoreError> {
        let mut forms = self.forms.write();
        let mut next = forms.clone();
        upsert(&mut next, form);
        self.write_all(&next)?;
        *forms = next;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut forms = self.forms.write();
        let mut next = forms.clone();
        remove(&mut next, id)?;
        self.write_all(&next)?;
        *forms = next;
        Ok(())
    }
}
