use std::{borrow::Cow, str::FromStr};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, Pool, Postgres, Transaction, postgres::PgArguments, query::QueryAs};
use tracing::{Instrument, instrument};

use crate::{
    dao::{TestRecordStore, following_rpb, get_pagination_output},
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{Instruments, MeasurementPoint, PaginationInput, SuctionTest, TestDetails, TestRecord, TestRecordFilterInputType, TestRecordListOutputType, TestResult},
    },
};

/**
 * Table bootstrap. Executed on start-up, no migrations.
 */
const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS testes_bomba (
    id BIGSERIAL PRIMARY KEY,
    rpb BIGINT NOT NULL UNIQUE,
    data DATE NOT NULL,
    op_of TEXT, cliente TEXT, modelo TEXT,
    rcd_rotor TEXT, tipo_rotor TEXT, rcd_estator TEXT, tipo_estator TEXT, elastomero TEXT,
    n_proposta TEXT, corrente_nominal DOUBLE PRECISION, tensao_rede DOUBLE PRECISION, rotacao DOUBLE PRECISION,
    vazao_01 DOUBLE PRECISION, vazao_02 DOUBLE PRECISION, vazao_03 DOUBLE PRECISION, vazao_04 DOUBLE PRECISION, vazao_05 DOUBLE PRECISION,
    pressao_01 DOUBLE PRECISION, pressao_02 DOUBLE PRECISION, pressao_03 DOUBLE PRECISION, pressao_04 DOUBLE PRECISION, pressao_05 DOUBLE PRECISION,
    potencia_consumida_01 DOUBLE PRECISION, potencia_consumida_02 DOUBLE PRECISION, potencia_consumida_03 DOUBLE PRECISION, potencia_consumida_04 DOUBLE PRECISION, potencia_consumida_05 DOUBLE PRECISION,
    corrente_01 DOUBLE PRECISION, corrente_02 DOUBLE PRECISION, corrente_03 DOUBLE PRECISION, corrente_04 DOUBLE PRECISION, corrente_05 DOUBLE PRECISION,
    tensao DOUBLE PRECISION, rotacao_suc DOUBLE PRECISION, pressao_descarga_suc DOUBLE PRECISION, pressao_succao_suc DOUBLE PRECISION,
    vazao_suc DOUBLE PRECISION, corrente_suc DOUBLE PRECISION, tensao_suc DOUBLE PRECISION,
    numero_serie TEXT, vazao_nominal DOUBLE PRECISION, pressao_nominal DOUBLE PRECISION, rpm_nominal DOUBLE PRECISION, potencia_instalada DOUBLE PRECISION,
    motoredutor TEXT, motor TEXT, redutor TEXT,
    tacometro TEXT, wattimetro TEXT, manometro TEXT, medidor_vazao TEXT, rotametro TEXT,
    resultado TEXT, observacoes TEXT, preenchido_por TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const CREATE_INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_testes_cliente ON testes_bomba(cliente)",
    "CREATE INDEX IF NOT EXISTS idx_testes_data ON testes_bomba(data)",
    "CREATE INDEX IF NOT EXISTS idx_testes_modelo ON testes_bomba(modelo)",
];

/**
 * Columns written on insert and update, in bind order.
 */
const DATA_COLUMNS: &str = "rpb, data, op_of, cliente, modelo, \
    rcd_rotor, tipo_rotor, rcd_estator, tipo_estator, elastomero, \
    n_proposta, corrente_nominal, tensao_rede, rotacao, \
    vazao_01, vazao_02, vazao_03, vazao_04, vazao_05, \
    pressao_01, pressao_02, pressao_03, pressao_04, pressao_05, \
    potencia_consumida_01, potencia_consumida_02, potencia_consumida_03, potencia_consumida_04, potencia_consumida_05, \
    corrente_01, corrente_02, corrente_03, corrente_04, corrente_05, \
    tensao, rotacao_suc, pressao_descarga_suc, pressao_succao_suc, vazao_suc, corrente_suc, tensao_suc, \
    numero_serie, vazao_nominal, pressao_nominal, rpm_nominal, potencia_instalada, \
    motoredutor, motor, redutor, \
    tacometro, wattimetro, manometro, medidor_vazao, rotametro, \
    resultado, observacoes, preenchido_por";

/**
 * Number of columns in `DATA_COLUMNS`.
 */
const DATA_COLUMN_COUNT: usize = 57;

/**
 * Text columns of `DATA_COLUMNS`. Every other data column except `rpb` and `data` is numeric.
 */
const TEXT_COLUMNS: [&str; 21] = [
    "op_of",
    "cliente",
    "modelo",
    "rcd_rotor",
    "tipo_rotor",
    "rcd_estator",
    "tipo_estator",
    "elastomero",
    "n_proposta",
    "numero_serie",
    "motoredutor",
    "motor",
    "redutor",
    "tacometro",
    "wattimetro",
    "manometro",
    "medidor_vazao",
    "rotametro",
    "resultado",
    "observacoes",
    "preenchido_por",
];

/**
 * SQL query for the current maximum rpb.
 */
const MAX_RPB: &str = "SELECT MAX(rpb)::bigint FROM testes_bomba";

/**
 * Filter, order and page of the test list query. Text filters are case-insensitive substring
 * matches.
 */
const TESTS_LIST_FILTER: &str = "WHERE ($1::text IS NULL OR cliente ILIKE '%' || $1 || '%') AND
                                 ($2::text IS NULL OR modelo ILIKE '%' || $2 || '%') AND
                                 ($3::text IS NULL OR numero_serie ILIKE '%' || $3 || '%') AND
                                 ($4::date IS NULL OR data >= $4) AND
                                 ($5::date IS NULL OR data <= $5)
                                 ORDER BY data DESC, rpb DESC
                                 LIMIT $6 OFFSET $7";

const DELETE_TEST: &str = "DELETE FROM testes_bomba WHERE id = $1";

const DELETE_ALL_TESTS: &str = "DELETE FROM testes_bomba";

/**
 * Row of the `testes_bomba` table.
 */
#[derive(Debug, sqlx::FromRow)]
pub struct TestRecordRow {
    id: i64,
    rpb: i64,
    data: NaiveDate,
    op_of: Option<String>,
    cliente: Option<String>,
    modelo: Option<String>,
    rcd_rotor: Option<String>,
    tipo_rotor: Option<String>,
    rcd_estator: Option<String>,
    tipo_estator: Option<String>,
    elastomero: Option<String>,
    n_proposta: Option<String>,
    corrente_nominal: Option<f64>,
    tensao_rede: Option<f64>,
    rotacao: Option<f64>,
    vazao_01: Option<f64>,
    vazao_02: Option<f64>,
    vazao_03: Option<f64>,
    vazao_04: Option<f64>,
    vazao_05: Option<f64>,
    pressao_01: Option<f64>,
    pressao_02: Option<f64>,
    pressao_03: Option<f64>,
    pressao_04: Option<f64>,
    pressao_05: Option<f64>,
    potencia_consumida_01: Option<f64>,
    potencia_consumida_02: Option<f64>,
    potencia_consumida_03: Option<f64>,
    potencia_consumida_04: Option<f64>,
    potencia_consumida_05: Option<f64>,
    corrente_01: Option<f64>,
    corrente_02: Option<f64>,
    corrente_03: Option<f64>,
    corrente_04: Option<f64>,
    corrente_05: Option<f64>,
    tensao: Option<f64>,
    rotacao_suc: Option<f64>,
    pressao_descarga_suc: Option<f64>,
    pressao_succao_suc: Option<f64>,
    vazao_suc: Option<f64>,
    corrente_suc: Option<f64>,
    tensao_suc: Option<f64>,
    numero_serie: Option<String>,
    vazao_nominal: Option<f64>,
    pressao_nominal: Option<f64>,
    rpm_nominal: Option<f64>,
    potencia_instalada: Option<f64>,
    motoredutor: Option<String>,
    motor: Option<String>,
    redutor: Option<String>,
    tacometro: Option<String>,
    wattimetro: Option<String>,
    manometro: Option<String>,
    medidor_vazao: Option<String>,
    rotametro: Option<String>,
    resultado: Option<String>,
    observacoes: Option<String>,
    preenchido_por: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TestRecordRow> for TestRecord {
    fn from(row: TestRecordRow) -> Self {
        let point = |flow, pressure, current, consumed_power_cv| MeasurementPoint { flow, pressure, current, consumed_power_cv };
        // Unknown stored results are treated as unset.
        let result = row.resultado.as_deref().and_then(|value| TestResult::from_str(value).ok());
        let details = TestDetails {
            date: row.data,
            order_number: row.op_of,
            client: row.cliente,
            model: row.modelo,
            rotor_code: row.rcd_rotor,
            rotor_type: row.tipo_rotor,
            stator_code: row.rcd_estator,
            stator_type: row.tipo_estator,
            elastomer: row.elastomero,
            proposal_number: row.n_proposta,
            nominal_current: row.corrente_nominal,
            supply_voltage: row.tensao_rede,
            rotation: row.rotacao,
            measurement_points: [
                point(row.vazao_01, row.pressao_01, row.corrente_01, row.potencia_consumida_01),
                point(row.vazao_02, row.pressao_02, row.corrente_02, row.potencia_consumida_02),
                point(row.vazao_03, row.pressao_03, row.corrente_03, row.potencia_consumida_03),
                point(row.vazao_04, row.pressao_04, row.corrente_04, row.potencia_consumida_04),
                point(row.vazao_05, row.pressao_05, row.corrente_05, row.potencia_consumida_05),
            ],
            voltage: row.tensao,
            suction_test: SuctionTest {
                rotation: row.rotacao_suc,
                discharge_pressure: row.pressao_descarga_suc,
                suction_pressure: row.pressao_succao_suc,
                flow: row.vazao_suc,
                current: row.corrente_suc,
                voltage: row.tensao_suc,
            },
            serial_number: row.numero_serie,
            nominal_flow: row.vazao_nominal,
            nominal_pressure: row.pressao_nominal,
            nominal_rpm: row.rpm_nominal,
            installed_power: row.potencia_instalada,
            gear_motor: row.motoredutor,
            motor: row.motor,
            reducer: row.redutor,
            instruments: Instruments { tachometer: row.tacometro, wattmeter: row.wattimetro, manometer: row.manometro, flow_meter: row.medidor_vazao, rotameter: row.rotametro },
            result,
            notes: row.observacoes,
            filled_by: row.preenchido_por,
        };
        TestRecord { id: row.id, rpb: row.rpb, details, created_at: row.created_at, updated_at: row.updated_at }
    }
}

/**
 * Column list for reading rows. Tables created by earlier versions of the tool store `INTEGER`,
 * `REAL` and `TIMESTAMP` columns, so every column is cast to the type `TestRecordRow` decodes.
 */
fn row_columns() -> String {
    let data_columns = DATA_COLUMNS
        .split(',')
        .map(str::trim)
        .map(|column| match column {
            "rpb" => "rpb::bigint AS rpb".to_string(),
            "data" => "data".to_string(),
            column if TEXT_COLUMNS.contains(&column) => column.to_string(),
            column => format!("{column}::float8 AS {column}"),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "id::bigint AS id, {data_columns}, COALESCE(created_at::timestamptz, now()) AS created_at, COALESCE(updated_at::timestamptz, now()) AS updated_at"
    )
}

fn query_test_statement() -> String {
    format!("SELECT {} FROM testes_bomba WHERE id = $1", row_columns())
}

fn query_tests_list_statement() -> String {
    format!("SELECT {} FROM testes_bomba {TESTS_LIST_FILTER}", row_columns())
}

fn query_all_tests_statement() -> String {
    format!("SELECT {} FROM testes_bomba ORDER BY id", row_columns())
}

/**
 * Builds the insert statement. Parameters `$1..$57` follow `DATA_COLUMNS`.
 */
fn insert_statement() -> String {
    let placeholders = (1..=DATA_COLUMN_COUNT).map(|index| format!("${index}")).collect::<Vec<_>>().join(", ");
    format!("INSERT INTO testes_bomba ({DATA_COLUMNS}) VALUES ({placeholders}) RETURNING {}", row_columns())
}

/**
 * Builds the full-replace update statement. The record id is parameter `$58`.
 */
fn update_statement() -> String {
    let assignments = DATA_COLUMNS
        .split(',')
        .map(str::trim)
        .enumerate()
        .map(|(index, column)| format!("{column} = ${}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!("UPDATE testes_bomba SET {assignments}, updated_at = now() WHERE id = ${} RETURNING {}", DATA_COLUMN_COUNT + 1, row_columns())
}

/**
 * Binds every data column in `DATA_COLUMNS` order.
 */
fn bind_details<'q>(query: QueryAs<'q, Postgres, TestRecordRow, PgArguments>, rpb: i64, details: &'q TestDetails) -> QueryAs<'q, Postgres, TestRecordRow, PgArguments> {
    let mut query = query
        .bind(rpb)
        .bind(details.date)
        .bind(details.order_number.as_deref())
        .bind(details.client.as_deref())
        .bind(details.model.as_deref())
        .bind(details.rotor_code.as_deref())
        .bind(details.rotor_type.as_deref())
        .bind(details.stator_code.as_deref())
        .bind(details.stator_type.as_deref())
        .bind(details.elastomer.as_deref())
        .bind(details.proposal_number.as_deref())
        .bind(details.nominal_current)
        .bind(details.supply_voltage)
        .bind(details.rotation);
    for point in &details.measurement_points {
        query = query.bind(point.flow);
    }
    for point in &details.measurement_points {
        query = query.bind(point.pressure);
    }
    for point in &details.measurement_points {
        query = query.bind(point.consumed_power_cv);
    }
    for point in &details.measurement_points {
        query = query.bind(point.current);
    }
    let suction = &details.suction_test;
    let instruments = &details.instruments;
    query
        .bind(details.voltage)
        .bind(suction.rotation)
        .bind(suction.discharge_pressure)
        .bind(suction.suction_pressure)
        .bind(suction.flow)
        .bind(suction.current)
        .bind(suction.voltage)
        .bind(details.serial_number.as_deref())
        .bind(details.nominal_flow)
        .bind(details.nominal_pressure)
        .bind(details.nominal_rpm)
        .bind(details.installed_power)
        .bind(details.gear_motor.as_deref())
        .bind(details.motor.as_deref())
        .bind(details.reducer.as_deref())
        .bind(instruments.tachometer.as_deref())
        .bind(instruments.wattmeter.as_deref())
        .bind(instruments.manometer.as_deref())
        .bind(instruments.flow_meter.as_deref())
        .bind(instruments.rotameter.as_deref())
        .bind(details.result.map(TestResult::as_db_str))
        .bind(details.notes.as_deref())
        .bind(details.filled_by.as_deref())
}

/**
 * Test record store on `PostgreSQL`.
 */
pub struct PgTestRecordStore {
    connection_pool: Pool<Postgres>,
}

impl PgTestRecordStore {
    /**
     * Creates a new instance of `PgTestRecordStore`.
     *
     * # Arguments
     * `connection_pool`: The database connection pool.
     */
    pub fn new(connection_pool: Pool<Postgres>) -> Self {
        PgTestRecordStore { connection_pool }
    }

    /**
     * Creates the table and its indexes if they do not exist.
     */
    pub async fn initialize_schema(&self) -> Result<(), ApplicationError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.connection_pool)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create table: {err}")))?;
        for statement in CREATE_INDEXES {
            sqlx::query(statement)
                .execute(&self.connection_pool)
                .await
                .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create index: {err}")))?;
        }
        tracing::info!("Database schema initialized");
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, ApplicationError> {
        self.connection_pool.begin().await.map_err(|err| Self::handle_database_error(&err, "begin transaction"))
    }

    /**
     * Commits the transaction when `result` is a success and rolls it back otherwise.
     */
    async fn finish<T>(transaction: Transaction<'static, Postgres>, result: Result<T, ApplicationError>) -> Result<T, ApplicationError> {
        match result {
            Ok(value) => {
                transaction.commit().await.map_err(|err| Self::handle_database_error(&err, "commit transaction"))?;
                Ok(value)
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| Self::handle_database_error(&err, "rollback transaction"))?;
                Err(err)
            }
        }
    }

    async fn insert_row(transaction: &mut PgConnection, rpb: i64, details: &TestDetails) -> Result<TestRecord, ApplicationError> {
        let statement = insert_statement();
        let row: TestRecordRow = bind_details(sqlx::query_as(&statement), rpb, details)
            .fetch_one(transaction)
            .await
            .map_err(|err| Self::handle_database_error(&err, "write test"))?;
        Ok(TestRecord::from(row))
    }

    async fn update_row(transaction: &mut PgConnection, id: i64, rpb: i64, details: &TestDetails) -> Result<TestRecord, ApplicationError> {
        let statement = update_statement();
        let row: Option<TestRecordRow> = bind_details(sqlx::query_as(&statement), rpb, details)
            .bind(id)
            .fetch_optional(transaction)
            .await
            .map_err(|err| Self::handle_database_error(&err, "write test"))?;
        let Some(row) = row else {
            tracing::debug!("Test with id {} not found for update", id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Test not found".to_string()));
        };
        Ok(TestRecord::from(row))
    }

    async fn delete_row(transaction: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        let result = sqlx::query(DELETE_TEST)
            .bind(id)
            .execute(transaction)
            .await
            .map_err(|err| Self::handle_database_error(&err, "delete test"))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Test with ID {} not found for deletion", id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Test not found".to_string()));
        }
        if result.rows_affected() > 1 {
            tracing::warn!("Multiple tests attempted deleted. Rolled back");
            return Err(ApplicationError::new(ErrorType::DatabaseError, "Multiple tests attempted deleted. Rolled back".to_string()));
        }
        Ok(())
    }

    /**
     * Handles database errors and maps them to application errors. Anything that is not a
     * constraint violation is logged and returned as a generic failure.
     *
     * # Arguments
     * `error`: The sqlx error to handle.
     * `operation`: What was being done, for the log line.
     *
     * # Returns
     * An `ApplicationError` corresponding to the database error.
     */
    fn handle_database_error(error: &sqlx::Error, operation: &str) -> ApplicationError {
        if let Some(db_error) = error.as_database_error() {
            tracing::debug!("Database error on {}: {:?}", operation, db_error.code());
            if db_error.code() == Some(Cow::Borrowed("23505")) {
                // Unique violation
                return ApplicationError::new(ErrorType::Conflict, "RPB already exists".to_string());
            } else if db_error.code() == Some(Cow::Borrowed("23502")) {
                // Not null violation
                return ApplicationError::new(ErrorType::Validation, "Missing required value".to_string());
            } else if db_error.code() == Some(Cow::Borrowed("22003")) {
                // Numeric value out of range, possible on tables with INTEGER columns
                return ApplicationError::new(ErrorType::Validation, "Value out of range".to_string());
            }
        }
        tracing::error!("Failed to {}: {}", operation, error);
        ApplicationError::new(ErrorType::DatabaseError, "Database operation failed".to_string())
    }

    /**
     * Exposes the pool for metrics.
     */
    pub fn connection_pool(&self) -> &Pool<Postgres> {
        &self.connection_pool
    }
}

#[async_trait]
impl TestRecordStore for PgTestRecordStore {
    #[instrument(skip(self), fields(result))]
    async fn next_rpb(&self) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let max_rpb: (Option<i64>,) = sqlx::query_as(MAX_RPB)
            .fetch_one(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, "get next rpb"))?;
        following_rpb(max_rpb.0)
    }

    #[instrument(skip(self, details), fields(result))]
    async fn insert(&self, rpb: i64, details: &TestDetails) -> Result<TestRecord, ApplicationError> {
        let span = tracing::Span::current();
        let mut transaction = self.begin().await?;
        let result = Self::insert_row(&mut transaction, rpb, details).instrument(span).await;
        Self::finish(transaction, result).await
    }

    #[instrument(skip(self, details), fields(result))]
    async fn update(&self, id: i64, rpb: i64, details: &TestDetails) -> Result<TestRecord, ApplicationError> {
        let span = tracing::Span::current();
        let mut transaction = self.begin().await?;
        let result = Self::update_row(&mut transaction, id, rpb, details).instrument(span).await;
        Self::finish(transaction, result).await
    }

    #[instrument(skip(self), fields(result))]
    async fn delete(&self, id: i64) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let mut transaction = self.begin().await?;
        let result = Self::delete_row(&mut transaction, id).instrument(span).await;
        Self::finish(transaction, result).await
    }

    #[instrument(skip(self), fields(result))]
    async fn delete_all(&self) -> Result<u64, ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(DELETE_ALL_TESTS)
            .execute(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, "delete all tests"))?;
        tracing::warn!("Deleted all {} tests", result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(result))]
    async fn get(&self, id: i64) -> Result<TestRecord, ApplicationError> {
        let span = tracing::Span::current();
        let statement = query_test_statement();
        let row: Option<TestRecordRow> = sqlx::query_as(&statement)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, "get test"))?;
        row.map(TestRecord::from).ok_or_else(|| ApplicationError::new(ErrorType::NotFound, "Test not found".to_string()))
    }

    #[instrument(skip(self), fields(result))]
    async fn list(&self, pagination_input: PaginationInput, filter: TestRecordFilterInputType) -> Result<TestRecordListOutputType, ApplicationError> {
        let span = tracing::Span::current();
        let statement = query_tests_list_statement();
        let rows: Vec<TestRecordRow> = sqlx::query_as(&statement)
            .bind(filter.client.as_deref())
            .bind(filter.model.as_deref())
            .bind(filter.serial_number.as_deref())
            .bind(filter.date_from)
            .bind(filter.date_to)
            .bind(pagination_input.page_size + 1)
            .bind(pagination_input.start_index)
            .fetch_all(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, "list tests"))?;
        let mut elements: Vec<TestRecord> = rows.into_iter().map(TestRecord::from).collect();
        let pagination_output = get_pagination_output(
            &pagination_input,
            i64::try_from(elements.len()).map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Failed to get pagination output: {err}")))?,
        );
        elements.truncate(usize::try_from(pagination_input.page_size).map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Failed to truncate elements: {err}")))?);
        Ok(TestRecordListOutputType::new(elements, pagination_output))
    }

    #[instrument(skip(self), fields(result))]
    async fn export_all(&self) -> Result<Vec<TestRecord>, ApplicationError> {
        let span = tracing::Span::current();
        let statement = query_all_tests_statement();
        let rows: Vec<TestRecordRow> = sqlx::query_as(&statement)
            .fetch_all(&self.connection_pool)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, "export tests"))?;
        Ok(rows.into_iter().map(TestRecord::from).collect())
    }
}


#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use sqlx::PgPool;

    fn details() -> TestDetails {
        let mut details = TestDetails::new(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        details.client = Some("Integration Client".to_string());
        details.rotation = Some(1750.0);
        details.measurement_points[0] = MeasurementPoint { flow: Some(10.0), pressure: Some(2.0), current: Some(9.5), consumed_power_cv: Some(1.14) };
        details.result = Some(TestResult::Approved);
        details
    }

    #[sqlx::test]
    async fn test_insert_update_then_delete() {
        let store = init_db().await;
        let rpb = store.next_rpb().await.unwrap();
        let inserted = store.insert(rpb, &details()).await.unwrap();
        assert_eq!(inserted.rpb, rpb);
        assert_eq!(inserted.details, details());

        let mut replaced = TestDetails::new(NaiveDate::from_ymd_opt(2025, 6, 3).unwrap());
        replaced.notes = Some("replaced".to_string());
        let updated = store.update(inserted.id, rpb, &replaced).await.unwrap();
        assert_eq!(updated.details, replaced);
        assert!(updated.details.client.is_none());

        assert!(store.delete(inserted.id).await.is_ok());
        assert_eq!(store.get(inserted.id).await.unwrap_err().error_type, ErrorType::NotFound);
    }

    #[sqlx::test]
    async fn test_duplicate_rpb_is_conflict() {
        let store = init_db().await;
        let rpb = store.next_rpb().await.unwrap();
        let inserted = store.insert(rpb, &details()).await.unwrap();
        let err = store.insert(rpb, &details()).await.unwrap_err();
        assert_eq!(err.error_type, ErrorType::Conflict);
        store.delete(inserted.id).await.unwrap();
    }

    #[sqlx::test]
    async fn test_list_with_filter() {
        let store = init_db().await;
        let rpb = store.next_rpb().await.unwrap();
        let inserted = store.insert(rpb, &details()).await.unwrap();
        let filter = TestRecordFilterInputType { client: Some("integration".to_string()), ..Default::default() };
        let list = store.list(PaginationInput { start_index: 0, page_size: 10 }, filter).await.unwrap();
        assert!(list.tests.iter().any(|record| record.id == inserted.id));
        store.delete(inserted.id).await.unwrap();
    }

    /**
     * Initialize the database connection pool.
     */
    async fn init_db() -> PgTestRecordStore {
        dotenv::from_filename("./sqlx-postgresql/.env-test").ok();
        let pool = PgPool::connect(dotenv::var("DATABASE_URL").unwrap().as_str()).await.unwrap();
        let store = PgTestRecordStore::new(pool);
        store.initialize_schema().await.unwrap();
        store
    }
}
