pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{PaginationInput, PaginationOutput, TestDetails, TestRecord, TestRecordFilterInputType, TestRecordListOutputType},
};

/**
 * Persistence contract for test records.
 *
 * Implementations enforce rpb uniqueness at insert and update time and report violations as
 * `ErrorType::Conflict`.
 */
#[async_trait]
pub trait TestRecordStore: Send + Sync {
    /**
     * Returns `max(rpb) + 1`, or 1 when the store is empty. Nothing is reserved.
     */
    async fn next_rpb(&self) -> Result<i64, ApplicationError>;

    /**
     * Inserts a new record and returns it with id and timestamps.
     */
    async fn insert(&self, rpb: i64, details: &TestDetails) -> Result<TestRecord, ApplicationError>;

    /**
     * Replaces every field of an existing record.
     */
    async fn update(&self, id: i64, rpb: i64, details: &TestDetails) -> Result<TestRecord, ApplicationError>;

    /**
     * Deletes a record permanently.
     */
    async fn delete(&self, id: i64) -> Result<(), ApplicationError>;

    /**
     * Deletes every record and returns how many were removed.
     */
    async fn delete_all(&self) -> Result<u64, ApplicationError>;

    async fn get(&self, id: i64) -> Result<TestRecord, ApplicationError>;

    /**
     * Lists records ordered by date and rpb, newest first.
     */
    async fn list(&self, pagination_input: PaginationInput, filter: TestRecordFilterInputType) -> Result<TestRecordListOutputType, ApplicationError>;

    /**
     * Every record ordered by id, for backups.
     */
    async fn export_all(&self) -> Result<Vec<TestRecord>, ApplicationError>;
}

/**
 * The rpb following the current maximum, or 1 when there is none.
 *
 * # Returns
 * The next rpb, or a Conflict error when the maximum is already `i64::MAX`.
 */
pub(crate) fn following_rpb(max_rpb: Option<i64>) -> Result<i64, ApplicationError> {
    max_rpb
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| ApplicationError::new(ErrorType::Conflict, "rpb space exhausted".to_string()))
}

/**
 * Constructs a `PaginationOutput` based on the pagination input and the number of elements
 * fetched, where one extra element is fetched to detect further pages.
 */
pub(crate) fn get_pagination_output(pagination_input: &PaginationInput, elements_size: i64) -> PaginationOutput {
    let has_more_elements = elements_size > pagination_input.page_size;
    PaginationOutput::new(pagination_input.start_index, pagination_input.page_size, has_more_elements)
}
