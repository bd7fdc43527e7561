use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use printmaps_core::{JobId, MapMetadata, MapState};

use super::{RecordStore, StoreError};

/// In-memory record store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    metadata: RwLock<HashMap<JobId, MapMetadata>>,
    states: RwLock<HashMap<JobId, MapState>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of jobs with a metadata record.
    pub fn len(&self) -> usize {
        self.metadata.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Storage("record store lock poisoned".to_string())
}

impl RecordStore for InMemoryRecordStore {
    fn put_metadata(&self, metadata: &MapMetadata) -> Result<(), StoreError> {
        let mut map = self.metadata.write().map_err(|_| poisoned())?;
        map.insert(metadata.id, metadata.clone());
        Ok(())
    }

    fn get_metadata(&self, id: JobId) -> Result<Option<MapMetadata>, StoreError> {
        let map = self.metadata.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    fn put_state(&self, state: &MapState) -> Result<(), StoreError> {
        let mut map = self.states.write().map_err(|_| poisoned())?;
        map.insert(state.id, state.clone());
        Ok(())
    }

    fn get_state(&self, id: JobId) -> Result<Option<MapState>, StoreError> {
        let map = self.states.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    fn exists(&self, id: JobId) -> Result<bool, StoreError> {
        let map = self.metadata.read().map_err(|_| poisoned())?;
        Ok(map.contains_key(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use printmaps_core::MapAttributes;

    fn id() -> JobId {
        "9a1f6c3e-2b7d-4e8a-b5c1-0d2e3f4a5b6c".parse().unwrap()
    }

    #[test]
    fn put_then_get_replaces_whole_record() {
        let store = InMemoryRecordStore::new();
        let first = MapMetadata::new(
            id(),
            MapAttributes {
                scale: Some(10_000),
                style: Some("osm-carto".into()),
                ..Default::default()
            },
        );
        store.put_metadata(&first).unwrap();

        let second = MapMetadata::new(
            id(),
            MapAttributes {
                scale: Some(20_000),
                ..Default::default()
            },
        );
        store.put_metadata(&second).unwrap();

        let got = store.get_metadata(id()).unwrap().unwrap();
        assert_eq!(got, second);
        assert!(got.attributes.style.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn exists_tracks_metadata_only() {
        let store = InMemoryRecordStore::new();
        assert!(!store.exists(id()).unwrap());

        store.put_state(&MapState::created(id(), Utc::now())).unwrap();
        assert!(!store.exists(id()).unwrap());

        store
            .put_metadata(&MapMetadata::new(id(), MapAttributes::default()))
            .unwrap();
        assert!(store.exists(id()).unwrap());
    }

    #[test]
    fn missing_records_are_none() {
        let store = InMemoryRecordStore::new();
        assert!(store.get_metadata(id()).unwrap().is_none());
        assert!(store.get_state(id()).unwrap().is_none());
    }
}
