use actix_web::{
    HttpRequest, HttpResponse, delete,
    error::{JsonPayloadError, PathError, QueryPayloadError},
    get,
    http::header,
    post, put,
    web::{self, Path},
};
use chrono::Utc;
use tracing::{Instrument, instrument};

use crate::{
    api::{
        rest::{
            HealthResponse, LoginRequest, LoginResponse, MessageResponse, NextRpbResponse, PowerCalculationRequest, PowerCalculationResponse, ResetResponse, TestListQuery,
            TestListResponse, TestRecordRequest, TestRecordResponse, TestReportResponse,
        },
        state::AppState,
    },
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{PaginationInput, TestRecordFilterInputType, TestRecordInputType},
        power,
    },
};

/**
 * Registers every route and the extractor configuration on the application.
 *
 * `proximo-rpb` is registered before `/{testId}` so it is not taken for an id.
 */
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(health)
        .service(login)
        .service(power_calculate)
        .service(tests_next_rpb)
        .service(tests_list)
        .service(tests_add)
        .service(tests_get)
        .service(tests_report)
        .service(tests_update)
        .service(tests_delete)
        .service(database_download)
        .service(database_reset);
}

/**
 * Liveness check.
 */
#[instrument(level = "debug", skip(http_request), fields(service = "health", trace_id = get_trace_id(&http_request)))]
#[get("/api/health")]
pub async fn health(http_request: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { status: "ok".to_string(), message: "API running".to_string() })
}

/**
 * Exchanges the shared password for a bearer token.
 */
#[instrument(skip(http_request, request_body, app_state), fields(service = "login", trace_id = get_trace_id(&http_request), result))]
#[post("/api/login")]
pub async fn login(http_request: HttpRequest, request_body: web::Json<LoginRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let token = app_state.access_service.login(request_body.password.as_deref())?;
    Ok(HttpResponse::Ok().json(LoginResponse { token, message: "Login succeeded".to_string() }))
}

/**
 * Standalone power calculation. Every input must be present and non-zero.
 */
#[instrument(skip(http_request), fields(service = "calculatePower", trace_id = get_trace_id(&http_request), result))]
#[post("/api/calcular-potencia")]
pub async fn power_calculate(http_request: HttpRequest, request_body: web::Json<PowerCalculationRequest>) -> Result<HttpResponse, ApplicationError> {
    let PowerCalculationRequest { flow, pressure, rotational_speed } = request_body.into_inner();
    if ![flow, pressure, rotational_speed].into_iter().all(power::is_present) {
        return Err(ApplicationError::new(ErrorType::Validation, "flow, pressure and rotationalSpeed are required".to_string()));
    }
    Ok(HttpResponse::Ok().json(PowerCalculationResponse::from(power::calculate(flow, pressure, rotational_speed))))
}

/**
 * Peeks at the rpb the next create would be assigned.
 */
#[instrument(skip(http_request, app_state), fields(service = "nextRpb", trace_id = get_trace_id(&http_request), result))]
#[get("/api/testes/proximo-rpb")]
pub async fn tests_next_rpb(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.access_service.validate(&http_request)?;
    let next_id = app_state.test_record_service.peek_next_rpb().instrument(span).await?;
    Ok(HttpResponse::Ok().json(NextRpbResponse { next_id }))
}

/**
 * Endpoint to retrieve a filtered list of test records.
 */
#[instrument(skip(http_request, query, app_state), fields(service = "listTests", trace_id = get_trace_id(&http_request), result))]
#[get("/api/testes")]
pub async fn tests_list(http_request: HttpRequest, query: web::Query<TestListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.access_service.validate(&http_request)?;
    let query = query.into_inner();
    let pagination_input = PaginationInput::from(&query).validate()?;
    let filter = TestRecordFilterInputType::from(query).validate()?;
    let output = app_state.test_record_service.get_test_list(pagination_input, filter).instrument(span).await?;
    Ok(HttpResponse::Ok().json(TestListResponse::from(output)))
}

/**
 * Add a new test record.
 */
#[instrument(skip(http_request, request_body, app_state), fields(service = "addTest", trace_id = get_trace_id(&http_request), result))]
#[post("/api/testes")]
pub async fn tests_add(http_request: HttpRequest, request_body: web::Json<TestRecordRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.access_service.validate(&http_request)?;
    let test_input = TestRecordInputType::try_from(request_body.into_inner())?;
    let record = app_state.test_record_service.add_test(test_input).instrument(span).await?;
    Ok(HttpResponse::Created().json(TestRecordResponse::from(record)))
}

#[instrument(skip(http_request, app_state), fields(service = "getTest", trace_id = get_trace_id(&http_request), result))]
#[get("/api/testes/{testId}")]
pub async fn tests_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.access_service.validate(&http_request)?;
    let record = app_state.test_record_service.get_test(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(TestRecordResponse::from(record)))
}

/**
 * Printable report of a test record.
 */
#[instrument(skip(http_request, app_state), fields(service = "testReport", trace_id = get_trace_id(&http_request), result))]
#[get("/api/testes/{testId}/relatorio")]
pub async fn tests_report(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.access_service.validate(&http_request)?;
    let report = app_state.test_record_service.get_test_report(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(TestReportResponse::from(report)))
}

/**
 * Replaces a test record. Fields left out of the body are cleared.
 */
#[instrument(skip(http_request, request_body, app_state), fields(service = "updateTest", trace_id = get_trace_id(&http_request), result))]
#[put("/api/testes/{testId}")]
pub async fn tests_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<TestRecordRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.access_service.validate(&http_request)?;
    let test_id = path.into_inner();
    let test_input = TestRecordInputType::try_from(request_body.into_inner())?;
    let record = app_state.test_record_service.update_test(test_id, test_input).instrument(span).await?;
    Ok(HttpResponse::Ok().json(TestRecordResponse::from(record)))
}

#[instrument(skip(http_request, app_state), fields(service = "deleteTest", trace_id = get_trace_id(&http_request), result))]
#[delete("/api/testes/{testId}")]
pub async fn tests_delete(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.access_service.validate(&http_request)?;
    app_state.test_record_service.delete_test(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(MessageResponse { message: "Test deleted".to_string() }))
}

/**
 * Every record as a JSON attachment, ordered by id.
 */
#[instrument(skip(http_request, app_state), fields(service = "downloadDatabase", trace_id = get_trace_id(&http_request), result))]
#[get("/api/download-database")]
pub async fn database_download(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.access_service.validate(&http_request)?;
    let records = app_state.test_record_service.export_tests().instrument(span).await?;
    let backup: Vec<TestRecordResponse> = records.into_iter().map(TestRecordResponse::from).collect();
    let filename = format!("backup_{}.json", Utc::now().format("%Y-%m-%d"));
    Ok(HttpResponse::Ok().insert_header((header::CONTENT_DISPOSITION, format!("attachment; filename={filename}"))).json(backup))
}

#[instrument(skip(http_request, app_state), fields(service = "resetDatabase", trace_id = get_trace_id(&http_request), result))]
#[delete("/api/reset-database")]
pub async fn database_reset(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.access_service.validate(&http_request)?;
    let deleted = app_state.test_record_service.reset_tests().instrument(span).await?;
    tracing::warn!("Database reset, {} tests deleted", deleted);
    Ok(HttpResponse::Ok().json(ResetResponse { success: true, message: "Database reset".to_string(), deleted }))
}

fn json_error_handler(err: JsonPayloadError, _http_request: &HttpRequest) -> actix_web::Error {
    ApplicationError::new(ErrorType::Validation, format!("Invalid request body: {err}")).into()
}

fn path_error_handler(err: PathError, _http_request: &HttpRequest) -> actix_web::Error {
    ApplicationError::new(ErrorType::Validation, format!("Invalid path: {err}")).into()
}

fn query_error_handler(err: QueryPayloadError, _http_request: &HttpRequest) -> actix_web::Error {
    ApplicationError::new(ErrorType::Validation, format!("Invalid query: {err}")).into()
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request
        .headers()
        .get("X-Trace-ID")
        .and_then(|v| v.to_str().ok().map(std::string::ToString::to_string))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use actix_web::{
        App,
        http::StatusCode,
        test::{self, TestRequest},
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::{api::security::AccessSecretService, dao::memory::MemoryTestRecordStore, service::pump_tests::TestRecordService};

    const SECRET: &str = "bomba2025";

    fn app_state() -> web::Data<AppState> {
        let access_service = AccessSecretService::new(SECRET).unwrap();
        let test_record_service = TestRecordService::new(Arc::new(MemoryTestRecordStore::new()), 1);
        web::Data::new(AppState::new(access_service, test_record_service))
    }

    fn auth() -> (&'static str, String) {
        ("Authorization", format!("Bearer {SECRET}"))
    }

    fn test_body() -> Value {
        json!({
            "date": "2025-04-10",
            "client": "Hidro Sul",
            "model": "NM 045",
            "rotation": 1750,
            "measurementPoints": [{"flow": 10, "pressure": 2, "current": 7.5}, {"flow": 8, "pressure": 3, "consumedPowerCv": 2.5}]
        })
    }

    #[actix_web::test]
    async fn test_get_trace_id_exists() {
        let request = TestRequest::default().insert_header(("X-Trace-ID", "test")).to_http_request();
        let trace_id = get_trace_id(&request);
        assert_eq!(trace_id, "test");
    }

    #[actix_web::test]
    async fn test_get_trace_id_not_exists() {
        let request = TestRequest::default().to_http_request();
        let trace_id = get_trace_id(&request);
        assert!(!trace_id.is_empty());
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let body: Value = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/health").to_request()).await;
        assert_eq!(body["status"], "ok");
    }

    #[actix_web::test]
    async fn test_login() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let body: Value = test::call_and_read_body_json(&app, TestRequest::post().uri("/api/login").set_json(json!({"password": SECRET})).to_request()).await;
        assert_eq!(body["token"], SECRET);

        let response = test::call_service(&app, TestRequest::post().uri("/api/login").set_json(json!({"password": "wrong"})).to_request()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = test::call_service(&app, TestRequest::post().uri("/api/login").set_json(json!({})).to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_tests_require_authentication() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let response = test::call_service(&app, TestRequest::post().uri("/api/testes").set_json(test_body()).to_request()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = test::call_service(&app, TestRequest::get().uri("/api/testes").insert_header(("Authorization", "Bearer wrong")).to_request()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["code"], 1000);
    }

    #[actix_web::test]
    async fn test_create_allocates_rpb_and_fills_power() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let next: Value = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/testes/proximo-rpb").insert_header(auth()).to_request()).await;
        assert_eq!(next["nextId"], 1);

        let response = test::call_service(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(test_body()).to_request()).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(response).await;
        assert_eq!(created["rpb"], 1);
        assert_eq!(created["measurementPoints"][0]["consumedPowerCv"], 1.14);
        assert_eq!(created["measurementPoints"][1]["consumedPowerCv"], 2.5);
        assert!(created["measurementPoints"][2]["consumedPowerCv"].is_null());

        let next: Value = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/testes/proximo-rpb").insert_header(auth()).to_request()).await;
        assert_eq!(next["nextId"], 2);
    }

    #[actix_web::test]
    async fn test_create_duplicate_rpb_conflicts() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let mut body = test_body();
        body["rpb"] = json!(120);
        let response = test::call_service(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(&body).to_request()).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = test::call_service(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(&body).to_request()).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let error: Value = test::read_body_json(response).await;
        assert_eq!(error["code"], 1005);
    }

    #[actix_web::test]
    async fn test_update_to_taken_rpb_conflicts() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let first: Value = test::call_and_read_body_json(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(test_body()).to_request()).await;
        let second: Value = test::call_and_read_body_json(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(test_body()).to_request()).await;
        let second_id = second["id"].as_i64().unwrap();

        let mut body = test_body();
        body["rpb"] = first["rpb"].clone();
        let response = test::call_service(&app, TestRequest::put().uri(&format!("/api/testes/{second_id}")).insert_header(auth()).set_json(&body).to_request()).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let error: Value = test::read_body_json(response).await;
        assert_eq!(error["code"], 1005);

        let unchanged: Value = test::call_and_read_body_json(&app, TestRequest::get().uri(&format!("/api/testes/{second_id}")).insert_header(auth()).to_request()).await;
        assert_eq!(unchanged["rpb"], second["rpb"]);
    }

    #[actix_web::test]
    async fn test_next_rpb_at_upper_bound_conflicts() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let mut body = test_body();
        body["rpb"] = json!(i64::MAX);
        let response = test::call_service(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(&body).to_request()).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = test::call_service(&app, TestRequest::get().uri("/api/testes/proximo-rpb").insert_header(auth()).to_request()).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let response = test::call_service(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(test_body()).to_request()).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        body["rpb"] = json!(10);
        let response = test::call_service(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(&body).to_request()).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn test_create_invalid_bodies() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let response = test::call_service(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(json!({"client": "Hidro Sul"})).to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = test::call_service(
            &app,
            TestRequest::post().uri("/api/testes").insert_header(auth()).insert_header(("Content-Type", "application/json")).set_payload("{not json").to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: Value = test::read_body_json(response).await;
        assert_eq!(error["code"], 1002);
    }

    #[actix_web::test]
    async fn test_get_update_delete() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let created: Value = test::call_and_read_body_json(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(test_body()).to_request()).await;
        let id = created["id"].as_i64().unwrap();

        let fetched: Value = test::call_and_read_body_json(&app, TestRequest::get().uri(&format!("/api/testes/{id}")).insert_header(auth()).to_request()).await;
        assert_eq!(fetched["client"], "Hidro Sul");

        let response = test::call_service(&app, TestRequest::put().uri(&format!("/api/testes/{id}")).insert_header(auth()).set_json(json!({"date": "2025-04-11"})).to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let updated: Value = test::call_and_read_body_json(
            &app,
            TestRequest::put().uri(&format!("/api/testes/{id}")).insert_header(auth()).set_json(json!({"rpb": 1, "date": "2025-04-11", "result": "Approved"})).to_request(),
        )
        .await;
        assert_eq!(updated["result"], "Approved");
        assert!(updated["client"].is_null());

        let response = test::call_service(&app, TestRequest::delete().uri(&format!("/api/testes/{id}")).insert_header(auth()).to_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = test::call_service(&app, TestRequest::get().uri(&format!("/api/testes/{id}")).insert_header(auth()).to_request()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = test::call_service(&app, TestRequest::delete().uri(&format!("/api/testes/{id}")).insert_header(auth()).to_request()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_invalid_path_is_bad_request() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let response = test::call_service(&app, TestRequest::get().uri("/api/testes/abc").insert_header(auth()).to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_list_with_filter() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        test::call_service(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(test_body()).to_request()).await;
        let mut other = test_body();
        other["client"] = json!("Agro Norte");
        test::call_service(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(&other).to_request()).await;

        let all: Value = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/testes").insert_header(auth()).to_request()).await;
        assert_eq!(all["tests"].as_array().unwrap().len(), 2);
        assert_eq!(all["tests"][0]["rpb"], 2);
        assert_eq!(all["pagination"]["hasMoreElements"], false);

        let filtered: Value = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/testes?client=norte").insert_header(auth()).to_request()).await;
        assert_eq!(filtered["tests"].as_array().unwrap().len(), 1);
        assert_eq!(filtered["tests"][0]["client"], "Agro Norte");

        let paged: Value = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/testes?startIndex=0&pageSize=1").insert_header(auth()).to_request()).await;
        assert_eq!(paged["tests"].as_array().unwrap().len(), 1);
        assert_eq!(paged["pagination"]["hasMoreElements"], true);

        let response = test::call_service(&app, TestRequest::get().uri("/api/testes?pageSize=0").insert_header(auth()).to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_report() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let created: Value = test::call_and_read_body_json(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(test_body()).to_request()).await;
        let id = created["id"].as_i64().unwrap();
        let report: Value = test::call_and_read_body_json(&app, TestRequest::get().uri(&format!("/api/testes/{id}/relatorio")).insert_header(auth()).to_request()).await;
        let points = report["points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["slot"], 1);
        assert_eq!(points[0]["head"], 20.0);
        assert_eq!(points[0]["powerKw"], 0.85);
        assert_eq!(report["test"]["id"], id);
    }

    #[actix_web::test]
    async fn test_power_calculation() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let body: Value = test::call_and_read_body_json(
            &app,
            TestRequest::post().uri("/api/calcular-potencia").set_json(json!({"flow": 10, "pressure": 2, "rotationalSpeed": 1750})).to_request(),
        )
        .await;
        assert_eq!(body["powerCv"], 1.14);
        assert_eq!(body["powerKw"], 0.85);

        let response =
            test::call_service(&app, TestRequest::post().uri("/api/calcular-potencia").set_json(json!({"flow": 0, "pressure": 2, "rotationalSpeed": 1750})).to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_download_and_reset() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        test::call_service(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(test_body()).to_request()).await;
        test::call_service(&app, TestRequest::post().uri("/api/testes").insert_header(auth()).set_json(test_body()).to_request()).await;

        let response = test::call_service(&app, TestRequest::get().uri("/api/download-database").insert_header(auth()).to_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=backup_"));
        let backup: Value = test::read_body_json(response).await;
        assert_eq!(backup.as_array().unwrap().len(), 2);
        assert_eq!(backup[0]["rpb"], 1);

        let reset: Value = test::call_and_read_body_json(&app, TestRequest::delete().uri("/api/reset-database").insert_header(auth()).to_request()).await;
        assert_eq!(reset["success"], true);
        assert_eq!(reset["deleted"], 2);

        let all: Value = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/testes").insert_header(auth()).to_request()).await;
        assert!(all["tests"].as_array().unwrap().is_empty());
    }
}
