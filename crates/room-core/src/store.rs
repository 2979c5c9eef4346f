use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::SceneObject;

/// Prompt that produced an object, kept in lockstep with the object list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub prompt: String,
    pub object_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
}

/// Ordered, in-memory room contents plus the matching prompt history.
///
/// `objects[i]` was produced by `history[i]` at all times; every mutation
/// touches both lists or neither. The store serializes for read-only views
/// but is only ever built through [`SceneStore::append`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneStore {
    objects: Vec<SceneObject>,
    history: Vec<HistoryEntry>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, object: SceneObject, prompt: impl Into<String>) {
        let entry = HistoryEntry {
            prompt: prompt.into(),
            object_id: object.id.clone(),
            kind: object.kind.clone(),
            color: object.color.clone(),
        };
        info!(id = %object.id, kind = %object.kind, "placed object");
        self.objects.push(object);
        self.history.push(entry);
    }

    /// Undoes the most recent placement.
    pub fn remove_last(&mut self) -> Option<(SceneObject, HistoryEntry)> {
        let (Some(object), Some(entry)) = (self.objects.pop(), self.history.pop()) else {
            return None;
        };
        info!(id = %object.id, "removed last object");
        Some((object, entry))
    }

    /// Removes one object by id. Unknown ids are a no-op.
    pub fn remove_by_id(&mut self, id: &str) -> Option<(SceneObject, HistoryEntry)> {
        let index = self.objects.iter().position(|object| object.id == id)?;
        let object = self.objects.remove(index);
        let entry = self.history.remove(index);
        info!(id = %object.id, "removed object");
        Some((object, entry))
    }

    pub fn clear(&mut self) {
        info!(count = self.objects.len(), "cleared room");
        self.objects.clear();
        self.history.clear();
    }

    pub fn get(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
