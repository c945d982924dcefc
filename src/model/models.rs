use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    power,
};

/**
 * Number of measurement point slots on a test record.
 */
pub const MEASUREMENT_POINTS: usize = 5;

/**
 * Default page size when the request does not give one.
 */
const DEFAULT_PAGE_SIZE: i64 = 100;

/**
 * Largest page size accepted.
 */
const MAX_PAGE_SIZE: i64 = 1000;

/**
 * Outcome of a pump test. Absence means the test has not been judged yet.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestResult {
    #[serde(alias = "Aprovado")]
    Approved,
    #[serde(alias = "Reprovado")]
    Rejected,
}

impl TestResult {
    /**
     * Value stored in the result column.
     */
    pub fn as_db_str(self) -> &'static str {
        match self {
            TestResult::Approved => "Aprovado",
            TestResult::Rejected => "Reprovado",
        }
    }
}

impl FromStr for TestResult {
    type Err = ApplicationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Aprovado" | "Approved" => Ok(TestResult::Approved),
            "Reprovado" | "Rejected" => Ok(TestResult::Rejected),
            _ => Err(ApplicationError::new(ErrorType::Validation, format!("Unknown test result: {value}"))),
        }
    }
}

/**
 * One measured operating point.
 */
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeasurementPoint {
    pub flow: Option<f64>,
    pub pressure: Option<f64>,
    pub current: Option<f64>,
    pub consumed_power_cv: Option<f64>,
}

impl MeasurementPoint {
    /**
     * Fills the consumed power from flow and pressure if the slot has no power value.
     * A caller-supplied power is kept.
     *
     * # Arguments
     * `rotation`: Rotational speed of the pump, used as presence gate.
     */
    pub fn fill_missing_power(&mut self, rotation: Option<f64>) {
        if power::is_present(self.consumed_power_cv) {
            return;
        }
        if let Some(power_cv) = power::power_cv(self.flow, self.pressure, rotation) {
            self.consumed_power_cv = Some(power_cv);
        }
    }

    /**
     * Whether the point has anything worth reporting.
     */
    pub fn is_measured(&self) -> bool {
        power::is_present(self.flow) || power::is_present(self.pressure)
    }
}

/**
 * Readings from the suction test.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuctionTest {
    pub rotation: Option<f64>,
    pub discharge_pressure: Option<f64>,
    pub suction_pressure: Option<f64>,
    pub flow: Option<f64>,
    pub current: Option<f64>,
    pub voltage: Option<f64>,
}

/**
 * Instruments used during the test.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instruments {
    pub tachometer: Option<String>,
    pub wattmeter: Option<String>,
    pub manometer: Option<String>,
    pub flow_meter: Option<String>,
    pub rotameter: Option<String>,
}

/**
 * Everything on a test record except identifiers and timestamps.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct TestDetails {
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
    pub measurement_points: [MeasurementPoint; MEASUREMENT_POINTS],
    pub voltage: Option<f64>,
    pub suction_test: SuctionTest,
    pub serial_number: Option<String>,
    pub nominal_flow: Option<f64>,
    pub nominal_pressure: Option<f64>,
    pub nominal_rpm: Option<f64>,
    pub installed_power: Option<f64>,
    pub gear_motor: Option<String>,
    pub motor: Option<String>,
    pub reducer: Option<String>,
    pub instruments: Instruments,
    pub result: Option<TestResult>,
    pub notes: Option<String>,
    pub filled_by: Option<String>,
}

impl TestDetails {
    /**
     * Creates details with only the test date set.
     */
    pub fn new(date: NaiveDate) -> Self {
        TestDetails {
            date,
            order_number: None,
            client: None,
            model: None,
            rotor_code: None,
            rotor_type: None,
            stator_code: None,
            stator_type: None,
            elastomer: None,
            proposal_number: None,
            nominal_current: None,
            supply_voltage: None,
            rotation: None,
            measurement_points: [MeasurementPoint::default(); MEASUREMENT_POINTS],
            voltage: None,
            suction_test: SuctionTest::default(),
            serial_number: None,
            nominal_flow: None,
            nominal_pressure: None,
            nominal_rpm: None,
            installed_power: None,
            gear_motor: None,
            motor: None,
            reducer: None,
            instruments: Instruments::default(),
            result: None,
            notes: None,
            filled_by: None,
        }
    }

    /**
     * Fills consumed power on every measurement point lacking one.
     */
    pub fn fill_missing_power(&mut self) {
        let rotation = self.rotation;
        for point in &mut self.measurement_points {
            point.fill_missing_power(rotation);
        }
    }
}

/**
 * Input for creating or replacing a test record.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecordInputType {
    /**
     * Business identifier. Allocated on create when absent, required on update.
     */
    pub rpb: Option<i64>,
    pub details: TestDetails,
}

impl TestRecordInputType {
    pub fn new(rpb: Option<i64>, details: TestDetails) -> Self {
        TestRecordInputType { rpb, details }
    }
}

/**
 * A stored test record.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecord {
    pub id: i64,
    pub rpb: i64,
    pub details: TestDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/**
 * Filter parameters for listing test records.
 */
#[derive(Debug, Clone, Default)]
pub struct TestRecordFilterInputType {
    pub client: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl TestRecordFilterInputType {
    /**
     * Validates the filter.
     *
     * # Returns
     * The filter with blank texts removed, or an `ApplicationError` if the date range is reversed.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        if let (Some(date_from), Some(date_to)) = (self.date_from, self.date_to) {
            if date_from > date_to {
                return Err(ApplicationError::new(ErrorType::Validation, "dateFrom must not be after dateTo".to_string()));
            }
        }
        Ok(TestRecordFilterInputType {
            client: non_blank(self.client),
            model: non_blank(self.model),
            serial_number: non_blank(self.serial_number),
            date_from: self.date_from,
            date_to: self.date_to,
        })
    }

    /**
     * Whether a record passes the filter. Text filters are case-insensitive substring matches.
     */
    pub fn matches(&self, record: &TestRecord) -> bool {
        let details = &record.details;
        contains_ignore_case(details.client.as_deref(), self.client.as_deref())
            && contains_ignore_case(details.model.as_deref(), self.model.as_deref())
            && contains_ignore_case(details.serial_number.as_deref(), self.serial_number.as_deref())
            && self.date_from.is_none_or(|date_from| details.date >= date_from)
            && self.date_to.is_none_or(|date_to| details.date <= date_to)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn contains_ignore_case(value: Option<&str>, pattern: Option<&str>) -> bool {
    match (value, pattern) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(value), Some(pattern)) => value.to_lowercase().contains(&pattern.to_lowercase()),
    }
}

/**
 * Pagination input.
 */
#[derive(Debug, Clone)]
pub struct PaginationInput {
    pub start_index: i64,
    pub page_size: i64,
}

impl PaginationInput {
    pub fn new(start_index: Option<i64>, page_size: Option<i64>) -> Self {
        PaginationInput { start_index: start_index.unwrap_or(0), page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE) }
    }

    /**
     * Validates the pagination input.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        if self.start_index < 0 {
            return Err(ApplicationError::new(ErrorType::Validation, "startIndex must be zero or positive".to_string()));
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(ApplicationError::new(ErrorType::Validation, format!("pageSize must be between 1 and {MAX_PAGE_SIZE}")));
        }
        Ok(self)
    }
}

/**
 * Pagination output.
 */
#[derive(Debug, Clone)]
pub struct PaginationOutput {
    pub start_index: i64,
    pub page_size: i64,
    pub has_more: bool,
}

impl PaginationOutput {
    pub fn new(start_index: i64, page_size: i64, has_more: bool) -> Self {
        PaginationOutput { start_index, page_size, has_more }
    }
}

pub struct TestRecordListOutputType {
    pub tests: Vec<TestRecord>,
    pub pagination: PaginationOutput,
}

impl TestRecordListOutputType {
    pub fn new(tests: Vec<TestRecord>, pagination: PaginationOutput) -> Self {
        TestRecordListOutputType { tests, pagination }
    }
}

/**
 * One row of the printed report.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPointType {
    pub slot: usize,
    pub flow: Option<f64>,
    pub pressure: Option<f64>,
    pub current: Option<f64>,
    pub head: Option<f64>,
    pub power_cv: Option<f64>,
    pub power_kw: Option<f64>,
}

/**
 * Printable view of a test record, with kW values derived from the stored CV values.
 */
pub struct TestReportType {
    pub record: TestRecord,
    pub points: Vec<ReportPointType>,
}

impl From<TestRecord> for TestReportType {
    fn from(record: TestRecord) -> Self {
        let points = record
            .details
            .measurement_points
            .iter()
            .enumerate()
            .filter(|(_, point)| point.is_measured())
            .map(|(index, point)| ReportPointType {
                slot: index + 1,
                flow: point.flow,
                pressure: point.pressure,
                current: point.current,
                head: power::head(point.pressure),
                power_cv: point.consumed_power_cv,
                power_kw: power::power_kw(point.consumed_power_cv),
            })
            .collect();
        TestReportType { record, points }
    }
}
