use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use crate::{
    dao::{TestRecordStore, following_rpb, get_pagination_output},
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{PaginationInput, TestDetails, TestRecord, TestRecordFilterInputType, TestRecordListOutputType},
    },
};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    records: BTreeMap<i64, TestRecord>,
}

/**
 * Test record store kept in process memory. All operations run under one lock, so the
 * rpb uniqueness check and the write are atomic.
 */
#[derive(Default)]
pub struct MemoryTestRecordStore {
    state: Mutex<MemoryState>,
}

impl MemoryTestRecordStore {
    pub fn new() -> Self {
        MemoryTestRecordStore::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, ApplicationError> {
        self.state.lock().map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("In-memory store lock poisoned: {err}")))
    }
}

fn rpb_conflict() -> ApplicationError {
    ApplicationError::new(ErrorType::Conflict, "RPB already exists".to_string())
}

fn not_found() -> ApplicationError {
    ApplicationError::new(ErrorType::NotFound, "Test not found".to_string())
}

#[async_trait]
impl TestRecordStore for MemoryTestRecordStore {
    async fn next_rpb(&self) -> Result<i64, ApplicationError> {
        let state = self.lock()?;
        following_rpb(state.records.values().map(|record| record.rpb).max())
    }

    #[instrument(skip(self, details), fields(result))]
    async fn insert(&self, rpb: i64, details: &TestDetails) -> Result<TestRecord, ApplicationError> {
        let mut state = self.lock()?;
        if state.records.values().any(|record| record.rpb == rpb) {
            tracing::debug!("Rpb {} already in use", rpb);
            return Err(rpb_conflict());
        }
        state.next_id += 1;
        let now = Utc::now();
        let record = TestRecord { id: state.next_id, rpb, details: details.clone(), created_at: now, updated_at: now };
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    #[instrument(skip(self, details), fields(result))]
    async fn update(&self, id: i64, rpb: i64, details: &TestDetails) -> Result<TestRecord, ApplicationError> {
        let mut state = self.lock()?;
        if state.records.values().any(|record| record.rpb == rpb && record.id != id) {
            return Err(rpb_conflict());
        }
        let Some(record) = state.records.get_mut(&id) else {
            tracing::debug!("Test with id {} not found for update", id);
            return Err(not_found());
        };
        record.rpb = rpb;
        record.details = details.clone();
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), ApplicationError> {
        let mut state = self.lock()?;
        match state.records.remove(&id) {
            Some(_) => Ok(()),
            None => Err(not_found()),
        }
    }

    async fn delete_all(&self) -> Result<u64, ApplicationError> {
        let mut state = self.lock()?;
        let deleted = u64::try_from(state.records.len()).map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to count deleted tests: {err}")))?;
        state.records.clear();
        Ok(deleted)
    }

    async fn get(&self, id: i64) -> Result<TestRecord, ApplicationError> {
        let state = self.lock()?;
        state.records.get(&id).cloned().ok_or_else(not_found)
    }

    async fn list(&self, pagination_input: PaginationInput, filter: TestRecordFilterInputType) -> Result<TestRecordListOutputType, ApplicationError> {
        let state = self.lock()?;
        let mut matching: Vec<&TestRecord> = state.records.values().filter(|record| filter.matches(record)).collect();
        matching.sort_by(|a, b| b.details.date.cmp(&a.details.date).then(b.rpb.cmp(&a.rpb)));
        let start = usize::try_from(pagination_input.start_index).map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Invalid start index: {err}")))?;
        let page_size = usize::try_from(pagination_input.page_size).map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Invalid page size: {err}")))?;
        let mut elements: Vec<TestRecord> = matching.into_iter().skip(start).take(page_size + 1).cloned().collect();
        let pagination_output = get_pagination_output(
            &pagination_input,
            i64::try_from(elements.len()).map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Failed to get pagination output: {err}")))?,
        );
        elements.truncate(page_size);
        Ok(TestRecordListOutputType::new(elements, pagination_output))
    }

    async fn export_all(&self) -> Result<Vec<TestRecord>, ApplicationError> {
        let state = self.lock()?;
        Ok(state.records.values().cloned().collect())
    }
}
