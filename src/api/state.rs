use crate::{api::security::AccessSecretService, service::pump_tests::TestRecordService};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * The shared-secret gate for authentication.
     */
    pub access_service: AccessSecretService,
    /**
     * The service for handling pump test records.
     */
    pub test_record_service: TestRecordService,
}

/**
 * Creates a new instance of `AppState`.
 *
 * # Arguments
 * `access_service`: The shared-secret gate for authentication.
 * `test_record_service`: The service for handling pump test records.
 */
impl AppState {
    pub fn new(access_service: AccessSecretService, test_record_service: TestRecordService) -> Self {
        AppState { access_service, test_record_service }
    }
}
