use std::str::FromStr;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{
        Instruments, MEASUREMENT_POINTS, MeasurementPoint, PaginationInput, PaginationOutput, ReportPointType, SuctionTest, TestDetails, TestRecord, TestRecordFilterInputType,
        TestRecordInputType, TestRecordListOutputType, TestReportType, TestResult,
    },
    power::PowerOutput,
};

/***************** Test record models *********************/

/**
 * One measurement point as sent and returned by the API. The position in the array is the slot.
 */
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementPointElement {
    pub flow: Option<f64>,
    pub pressure: Option<f64>,
    pub current: Option<f64>,
    pub consumed_power_cv: Option<f64>,
}

impl From<MeasurementPointElement> for MeasurementPoint {
    fn from(element: MeasurementPointElement) -> Self {
        MeasurementPoint { flow: element.flow, pressure: element.pressure, current: element.current, consumed_power_cv: element.consumed_power_cv }
    }
}

impl From<&MeasurementPoint> for MeasurementPointElement {
    fn from(point: &MeasurementPoint) -> Self {
        MeasurementPointElement { flow: point.flow, pressure: point.pressure, current: point.current, consumed_power_cv: point.consumed_power_cv }
    }
}

/**
 * Suction test readings.
 */
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuctionTestElement {
    pub rotation: Option<f64>,
    pub discharge_pressure: Option<f64>,
    pub suction_pressure: Option<f64>,
    pub flow: Option<f64>,
    pub current: Option<f64>,
    pub voltage: Option<f64>,
}

impl From<SuctionTestElement> for SuctionTest {
    fn from(element: SuctionTestElement) -> Self {
        SuctionTest {
            rotation: element.rotation,
            discharge_pressure: element.discharge_pressure,
            suction_pressure: element.suction_pressure,
            flow: element.flow,
            current: element.current,
            voltage: element.voltage,
        }
    }
}

impl From<SuctionTest> for SuctionTestElement {
    fn from(suction: SuctionTest) -> Self {
        SuctionTestElement {
            rotation: suction.rotation,
            discharge_pressure: suction.discharge_pressure,
            suction_pressure: suction.suction_pressure,
            flow: suction.flow,
            current: suction.current,
            voltage: suction.voltage,
        }
    }
}

/**
 * Instruments used in the test.
 */
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentsElement {
    pub tachometer: Option<String>,
    pub wattmeter: Option<String>,
    pub manometer: Option<String>,
    pub flow_meter: Option<String>,
    pub rotameter: Option<String>,
}

impl From<InstrumentsElement> for Instruments {
    fn from(element: InstrumentsElement) -> Self {
        Instruments { tachometer: element.tachometer, wattmeter: element.wattmeter, manometer: element.manometer, flow_meter: element.flow_meter, rotameter: element.rotameter }
    }
}

impl From<Instruments> for InstrumentsElement {
    fn from(instruments: Instruments) -> Self {
        InstrumentsElement {
            tachometer: instruments.tachometer,
            wattmeter: instruments.wattmeter,
            manometer: instruments.manometer,
            flow_meter: instruments.flow_meter,
            rotameter: instruments.rotameter,
        }
    }
}

/**
 * Request body for creating and replacing a test record.
 *
 * Every field is optional at the wire level; required fields are checked when converting into
 * `TestRecordInputType`.
 */
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecordRequest {
    pub rpb: Option<i64>,
    pub date: Option<NaiveDate>,
    pub order_number: Option<String>,
    pub client: Option<String>,
    pub model: Option<String>,
    pub rotor_code: Option<String>,
    pub rotor_type: Option<String>,
    pub stator_code: Option<String>,
    pub stator_type: Option<String>,
    pub elastomer: Option<String>,
    pub proposal_number: Option<String>,
    pub nominal_current: Option<f64>,
    pub supply_voltage: Option<f64>,
    pub rotation: Option<f64>,
    pub measurement_points: Option<Vec<MeasurementPointElement>>,
    pub voltage: Option<f64>,
    pub suction_test: Option<SuctionTestElement>,
    pub serial_number: Option<String>,
    pub nominal_flow: Option<f64>,
    pub nominal_pressure: Option<f64>,
    pub nominal_rpm: Option<f64>,
    pub installed_power: Option<f64>,
    pub gear_motor: Option<String>,
    pub motor: Option<String>,
    pub reducer: Option<String>,
    pub instruments: Option<InstrumentsElement>,
    /**
     * `Approved`, `Rejected`, or empty for unset.
     */
    pub result: Option<String>,
    pub notes: Option<String>,
    pub filled_by: Option<String>,
}

impl TryFrom<TestRecordRequest> for TestRecordInputType {
    type Error = ApplicationError;

    fn try_from(request: TestRecordRequest) -> Result<Self, Self::Error> {
        let Some(date) = request.date else {
            return Err(ApplicationError::new(ErrorType::Validation, "date is required".to_string()));
        };
        if let Some(rpb) = request.rpb {
            if rpb < 1 {
                return Err(ApplicationError::new(ErrorType::Validation, "rpb must be a positive number".to_string()));
            }
        }
        let points = request.measurement_points.unwrap_or_default();
        if points.len() > MEASUREMENT_POINTS {
            return Err(ApplicationError::new(ErrorType::Validation, format!("At most {MEASUREMENT_POINTS} measurement points are allowed")));
        }
        let mut measurement_points = [MeasurementPoint::default(); MEASUREMENT_POINTS];
        for (slot, point) in measurement_points.iter_mut().zip(points) {
            *slot = MeasurementPoint::from(point);
        }
        let result = match request.result.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(TestResult::from_str(value)?),
        };
        let details = TestDetails {
            date,
            order_number: request.order_number,
            client: request.client,
            model: request.model,
            rotor_code: request.rotor_code,
            rotor_type: request.rotor_type,
            stator_code: request.stator_code,
            stator_type: request.stator_type,
            elastomer: request.elastomer,
            proposal_number: request.proposal_number,
            nominal_current: request.nominal_current,
            supply_voltage: request.supply_voltage,
            rotation: request.rotation,
            measurement_points,
            voltage: request.voltage,
            suction_test: request.suction_test.map(SuctionTest::from).unwrap_or_default(),
            serial_number: request.serial_number,
            nominal_flow: request.nominal_flow,
            nominal_pressure: request.nominal_pressure,
            nominal_rpm: request.nominal_rpm,
            installed_power: request.installed_power,
            gear_motor: request.gear_motor,
            motor: request.motor,
            reducer: request.reducer,
            instruments: request.instruments.map(Instruments::from).unwrap_or_default(),
            result,
            notes: request.notes,
            filled_by: request.filled_by,
        };
        Ok(TestRecordInputType::new(request.rpb, details))
    }
}

/**
 * A stored test record as returned by the API.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecordResponse {
    pub id: i64,
    pub rpb: i64,
    pub date: NaiveDate,
    pub order_number: Option<String>,
    pub client: Option<String>,
    pub model: Option<String>,
    pub rotor_code: Option<String>,
    pub rotor_type: Option<String>,
    pub stator_code: Option<String>,
    pub stator_type: Option<String>,
    pub elastomer: Option<String>,
    pub proposal_number: Option<String>,
    pub nominal_current: Option<f64>,
    pub supply_voltage: Option<f64>,
    pub rotation: Option<f64>,
    /**
     * Always all slots, empty ones included.
     */
    pub measurement_points: Vec<MeasurementPointElement>,
    pub voltage: Option<f64>,
    pub suction_test: SuctionTestElement,
    pub serial_number: Option<String>,
    pub nominal_flow: Option<f64>,
    pub nominal_pressure: Option<f64>,
    pub nominal_rpm: Option<f64>,
    pub installed_power: Option<f64>,
    pub gear_motor: Option<String>,
    pub motor: Option<String>,
    pub reducer: Option<String>,
    pub instruments: InstrumentsElement,
    pub result: Option<TestResult>,
    pub notes: Option<String>,
    pub filled_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TestRecord> for TestRecordResponse {
    fn from(record: TestRecord) -> Self {
        let details = record.details;
        TestRecordResponse {
            id: record.id,
            rpb: record.rpb,
            date: details.date,
            order_number: details.order_number,
            client: details.client,
            model: details.model,
            rotor_code: details.rotor_code,
            rotor_type: details.rotor_type,
            stator_code: details.stator_code,
            stator_type: details.stator_type,
            elastomer: details.elastomer,
            proposal_number: details.proposal_number,
            nominal_current: details.nominal_current,
            supply_voltage: details.supply_voltage,
            rotation: details.rotation,
            measurement_points: details.measurement_points.iter().map(MeasurementPointElement::from).collect(),
            voltage: details.voltage,
            suction_test: SuctionTestElement::from(details.suction_test),
            serial_number: details.serial_number,
            nominal_flow: details.nominal_flow,
            nominal_pressure: details.nominal_pressure,
            nominal_rpm: details.nominal_rpm,
            installed_power: details.installed_power,
            gear_motor: details.gear_motor,
            motor: details.motor,
            reducer: details.reducer,
            instruments: InstrumentsElement::from(details.instruments),
            result: details.result,
            notes: details.notes,
            filled_by: details.filled_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/***************** Test list models *********************/

/**
 * Query parameters for listing tests.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestListQuery {
    pub client: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /**
     * The index of the first item to return.
     */
    pub start_index: Option<i64>,
    /**
     * The size of the page to return.
     */
    pub page_size: Option<i64>,
}

impl From<&TestListQuery> for PaginationInput {
    fn from(query: &TestListQuery) -> Self {
        PaginationInput::new(query.start_index, query.page_size)
    }
}

impl From<TestListQuery> for TestRecordFilterInputType {
    fn from(query: TestListQuery) -> Self {
        TestRecordFilterInputType { client: query.client, model: query.model, serial_number: query.serial_number, date_from: query.date_from, date_to: query.date_to }
    }
}

/**
 * Response structure for listing tests.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestListResponse {
    tests: Vec<TestRecordResponse>,
    pagination: PaginationResponse,
}

impl From<TestRecordListOutputType> for TestListResponse {
    fn from(output: TestRecordListOutputType) -> Self {
        TestListResponse { tests: output.tests.into_iter().map(TestRecordResponse::from).collect(), pagination: PaginationResponse::from(output.pagination) }
    }
}

/***************** Report models *********************/

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPointElement {
    slot: usize,
    flow: Option<f64>,
    pressure: Option<f64>,
    current: Option<f64>,
    head: Option<f64>,
    power_cv: Option<f64>,
    power_kw: Option<f64>,
}

impl From<ReportPointType> for ReportPointElement {
    fn from(point: ReportPointType) -> Self {
        ReportPointElement { slot: point.slot, flow: point.flow, pressure: point.pressure, current: point.current, head: point.head, power_cv: point.power_cv, power_kw: point.power_kw }
    }
}

/**
 * Printable report of a test.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReportResponse {
    test: TestRecordResponse,
    points: Vec<ReportPointElement>,
}

impl From<TestReportType> for TestReportResponse {
    fn from(report: TestReportType) -> Self {
        TestReportResponse { test: TestRecordResponse::from(report.record), points: report.points.into_iter().map(ReportPointElement::from).collect() }
    }
}

/***************** Allocator and calculator models *********************/

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRpbResponse {
    pub next_id: i64,
}

/**
 * Request for the standalone power calculation.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerCalculationRequest {
    pub flow: Option<f64>,
    pub pressure: Option<f64>,
    pub rotational_speed: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerCalculationResponse {
    pub power_cv: Option<f64>,
    pub power_kw: Option<f64>,
}

impl From<PowerOutput> for PowerCalculationResponse {
    fn from(output: PowerOutput) -> Self {
        PowerCalculationResponse { power_cv: output.power_cv, power_kw: output.power_kw }
    }
}

/***************** Authentication models *********************/

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "senha")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
}

/***************** Misc models *********************/

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
}

impl ResponseError for ApplicationError {
    fn status_code(&self) -> StatusCode {
        get_statuscode(&self.error_type)
    }

    /**
     * Generates an error response for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone() };
        HttpResponse::build(get_statuscode(&self.error_type)).json(&error_response)
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::Authorization => StatusCode::UNAUTHORIZED,
        ErrorType::Initialization | ErrorType::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorType::Validation => StatusCode::BAD_REQUEST,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::Conflict => StatusCode::CONFLICT,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::Authorization => 1000,
        ErrorType::Initialization => 1001,
        ErrorType::Validation => 1002,
        ErrorType::DatabaseError => 1003,
        ErrorType::NotFound => 1004,
        ErrorType::Conflict => 1005,
    }
}

/***************** Common models *********************/

/**
 * Pagination response structure.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    /**
     * The starting index of the returned items.
     */
    pub start_index: Option<i64>,
    /**
     * The size of the page.
     */
    pub page_size: Option<i64>,
    /**
     * Indicates if there are more items available.
     */
    pub has_more_elements: bool,
}

impl From<PaginationOutput> for PaginationResponse {
    fn from(pagination_output: PaginationOutput) -> Self {
        PaginationResponse { start_index: Some(pagination_output.start_index), page_size: Some(pagination_output.page_size), has_more_elements: pagination_output.has_more }
    }
}
