use formsmith_schema::SavedForm;

use crate::StoreError;

/// A collection of saved forms, shared behind `&self`.
///
/// Forms are kept in save order. Saving a form whose id already exists
/// replaces it in place.
pub trait FormStore: Send + Sync {
    fn list(&self) -> Result<Vec<SavedForm>, StoreError>;

    fn get(&self, id: &str) -> Result<Option<SavedForm>, StoreError> {
        Ok(self.list()?.into_iter().find(|f| f.id == id))
    }

    fn save(&self, form: SavedForm) -> Result<(), StoreError>;

    /// Remove the form with `id`; [`StoreError::NotFound`] if there is none.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.list()?.len())
    }

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// Insert-or-replace by id, shared by the backends.
pub(crate) fn upsert(forms: &mut Vec<SavedForm>, form: SavedForm) {
    match forms.iter_mut().find(|f| f.id == form.id) {
        Some(existing) => *existing = form,
        None => forms.push(form),
    }
}

pub(crate) fn remove(forms: &mut Vec<SavedForm>, id: &str) -> Result<SavedForm, StoreError> {
    let pos = forms
        .iter()
        .position(|f| f.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    Ok(forms.remove(pos))
}
