mod api;
mod dao;
mod model;

use std::fs::OpenOptions;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::api::endpoints::configure;
use crate::api::middleware::timing_middleware;
use crate::api::security::AccessSecretService;
use crate::api::state::AppState;
use crate::dao::TestRecordStore;
use crate::dao::memory::MemoryTestRecordStore;
use crate::dao::postgres::PgTestRecordStore;
use crate::model::apperror::{ApplicationError, ErrorType};
use crate::model::config::{ApplicationArguments, Config, DatabaseType, HttpsConfig, LoggingConfig};
use crate::service::pump_tests::TestRecordService;

use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use clap::Parser;
use prometheus::IntGauge;
use rustls::pki_types::PrivateKeyDer;
use rustls::{ServerConfig, SupportedProtocolVersion};
use rustls_pemfile::{certs, pkcs8_private_keys};
use sqlx::{Pool, Postgres, pool};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/**
 * Entry point: reads the configuration, sets up logging and storage, and runs the HTTP server.
 */
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = ApplicationArguments::parse();

    let config = get_config(&args.config_file)?;

    init_tracing(&config.logging)?;

    let prometheus = PrometheusMetricsBuilder::new("")
        .endpoint("/metrics")
        .mask_unmatched_patterns("UNKNOWN")
        .build()
        .map_err(|err| std::io::Error::other(format!("Failed to create Prometheus metrics: {err}")))?;

    let store = get_store(&config, &prometheus).await?;

    let access_service = AccessSecretService::new(&config.security.access_secret).map_err(|err| std::io::Error::other(format!("Failed to initialize security: {err}")))?;
    let test_record_service = TestRecordService::new(store, config.records.allocation_retries);

    let state = web::Data::new(AppState::new(access_service, test_record_service));

    let server_init = HttpServer::new(move || App::new().wrap(prometheus.clone()).wrap(from_fn(timing_middleware)).app_data(state.clone()).configure(configure));

    let bind_address = config.server.bind_address.clone().unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
    let server_init = if let Some(http_port) = &config.server.http_port {
        tracing::info!("Listening for http on {}:{}", bind_address, http_port);
        server_init.bind((bind_address.as_str(), *http_port))?
    } else {
        server_init
    };
    let server_init = if let Some(https_config) = &config.server.https_config {
        let ssl_builder = ssl_builder(https_config).map_err(|err| std::io::Error::other(format!("Failed to create SSL/TLS configuration: {err}")))?;
        tracing::info!("Listening for https on {}:{}", bind_address, https_config.port);
        server_init
            .bind_rustls_0_23((bind_address.as_str(), https_config.port), ssl_builder)
            .map_err(|err| std::io::Error::other(format!("Failed to bind HTTPS server: {err}")))?
    } else {
        server_init
    };

    server_init.workers(config.server.workers).run().await
}

/**
 * Initializes the tracing subscriber.
 *
 * #Arguments
 * `logging`: Formatting switches, extra filter directives and the optional log file.
 *
 * #Returns
 * A `Result` indicating success or failure.
 */
fn init_tracing(logging: &LoggingConfig) -> Result<(), std::io::Error> {
    let mut env_filter = EnvFilter::from_default_env();
    for directive in &logging.directives {
        let directive = directive.parse::<Directive>().map_err(|err| std::io::Error::other(format!("Invalid logging directive {directive}: {err}")))?;
        env_filter = env_filter.add_directive(directive);
    }
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(logging.target)
        .with_thread_ids(logging.thread_ids)
        .with_thread_names(logging.thread_names)
        .with_line_number(logging.line_number)
        .with_level(logging.level)
        .with_file(logging.file);
    let result = match &logging.logfile {
        Some(logfile) => {
            let file = OpenOptions::new().create(true).append(true).open(logfile).map_err(|err| std::io::Error::other(format!("Failed to open log file {logfile}: {err}")))?;
            builder.with_ansi(false).with_writer(Arc::new(file)).try_init()
        }
        None => builder.with_ansi(logging.ansi).try_init(),
    };
    result.map_err(|err| std::io::Error::other(format!("Failed to initialize logging: {err}")))
}

/**
 * Creates the configured record store. For `PostgreSQL` the table is created if missing and the
 * pool gauges are registered.
 *
 * #Arguments
 * `config`: The application configuration.
 * `prometheus`: Metrics to register the pool gauges with.
 *
 * #Returns
 * The record store or an `std::io::Error`.
 */
async fn get_store(config: &Config, prometheus: &PrometheusMetrics) -> Result<Arc<dyn TestRecordStore>, std::io::Error> {
    match config.database.db_type.clone() {
        DatabaseType::Postgresql { connection_string, max_connections, min_connections, acquire_timeout, acquire_slow_threshold, idle_timeout, max_lifetime } => {
            let connection_pool: Pool<Postgres> = pool::PoolOptions::new()
                .max_connections(max_connections)
                .min_connections(min_connections)
                .acquire_timeout(Duration::from_millis(acquire_timeout))
                .acquire_slow_threshold(Duration::from_millis(acquire_slow_threshold))
                .idle_timeout(Duration::from_millis(idle_timeout))
                .max_lifetime(Duration::from_millis(max_lifetime))
                .connect(connection_string.as_str())
                .await
                .map_err(|err| std::io::Error::other(format!("Failed to create database pool: {err}")))?;
            let store = PgTestRecordStore::new(connection_pool);
            store.initialize_schema().await.map_err(|err| std::io::Error::other(format!("Failed to initialize database schema: {err}")))?;
            register_pool_metrics(prometheus, store.connection_pool().clone())?;
            Ok(Arc::new(store))
        }
        DatabaseType::InMemory => {
            tracing::warn!("Using in-memory storage, test records are lost on restart");
            Ok(Arc::new(MemoryTestRecordStore::new()))
        }
    }
}

/**
 * Creates and registers the connection pool gauges, then starts sampling them.
 */
fn register_pool_metrics(prometheus: &PrometheusMetrics, connection_pool: Pool<Postgres>) -> Result<(), std::io::Error> {
    let max_connections_gauge = create_gauge("max_connections", "Connection pool maximum")?;
    let min_connections_gauge = create_gauge("min_connections", "Connection pool minimum")?;
    let active_connections_gauge = create_gauge("active_connections", "Connection pool active")?;
    let idle_connections_gauge = create_gauge("idle_connections", "Connection pool idle")?;
    for gauge in [&max_connections_gauge, &min_connections_gauge, &active_connections_gauge, &idle_connections_gauge] {
        register_prometheus_metrics(prometheus, gauge)?;
    }
    gather_db_metrics(max_connections_gauge, min_connections_gauge, active_connections_gauge, idle_connections_gauge, connection_pool);
    Ok(())
}

fn create_gauge(name: &str, help: &str) -> Result<IntGauge, std::io::Error> {
    IntGauge::new(name, help).map_err(|err| std::io::Error::other(format!("Failed to create {name} gauge: {err}")))
}

/**
 * Registers custom Prometheus metrics.
 *
 * #Arguments
 * `prometheus_metrics`: The Prometheus metrics instance to register the gauge with.
 * `gauge`: The gauge to register.
 */
fn register_prometheus_metrics(prometheus_metrics: &PrometheusMetrics, gauge: &IntGauge) -> Result<(), std::io::Error> {
    prometheus_metrics.registry.register(Box::new(gauge.clone())).map_err(|err| std::io::Error::other(format!("Failed to register Prometheus gauge: {err}")))?;
    Ok(())
}

/**
 * Gathers database metrics in a separate thread.
 *
 * #Arguments
 * `max_connections_gauge`: Gauge for maximum connections.
 * `min_connections_gauge`: Gauge for minimum connections.
 * `active_connections_gauge`: Gauge for active connections.
 * `idle_connections_gauge`: Gauge for idle connections.
 * `connection_pool`: The connection pool to gather metrics from.
 */
fn gather_db_metrics(max_connections_gauge: IntGauge, min_connections_gauge: IntGauge, active_connections_gauge: IntGauge, idle_connections_gauge: IntGauge, connection_pool: Pool<Postgres>) {
    thread::spawn(move || {
        loop {
            max_connections_gauge.set(i64::from(connection_pool.options().get_max_connections()));
            min_connections_gauge.set(i64::from(connection_pool.options().get_min_connections()));
            active_connections_gauge.set(i64::from(connection_pool.size()));
            #[allow(clippy::cast_possible_wrap)]
            idle_connections_gauge.set(connection_pool.num_idle() as i64);
            thread::sleep(Duration::from_secs(1));
        }
    });
}

/**
 * Initializes the SSL/TLS configuration for the server.
 *
 * #Arguments
 * `https_config`: The HTTPS configuration containing the certificate and private key files.
 *
 * #Returns
 * A `Result` containing the initialized `ServerConfig` or an `ApplicationError` if initialization fails.
 */
fn ssl_builder(https_config: &HttpsConfig) -> Result<ServerConfig, ApplicationError> {
    let config_builder = ServerConfig::builder_with_protocol_versions(&get_protocol_versions());
    let cert_file = &mut std::io::BufReader::new(
        std::fs::File::open(&https_config.certificate_file).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read certificate file: {err}")))?,
    );
    let key_file = &mut std::io::BufReader::new(
        std::fs::File::open(&https_config.private_key_file).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read private key file: {err}")))?,
    );
    let cert_chain = certs(cert_file).collect::<Result<Vec<_>, _>>().map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to convert certificate to der: {err}")))?;
    let private_key = pkcs8_private_keys(key_file)
        .next()
        .ok_or_else(|| ApplicationError::new(ErrorType::Initialization, "No PKCS#8 private key found".to_string()))?
        .map(PrivateKeyDer::Pkcs8)
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to convert private key to der: {err}")))?;
    let config = config_builder
        .with_no_client_auth()
        .with_single_cert(cert_chain, private_key)
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create server config: {err}")))?;
    Ok(config)
}

/**
 * Returns the supported TLS protocol versions.
 */
fn get_protocol_versions() -> Vec<&'static SupportedProtocolVersion> {
    vec![&rustls::version::TLS13]
}

/**
 * Reads the configuration from the specified file.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 *
 * #Returns
 * A `Result` containing the parsed `Config` or an `std::io::Error` if reading or parsing fails.
*/
fn get_config(config_file: &str) -> Result<Config, std::io::Error> {
    let config_str: String = std::fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_config_missing_file() {
        assert!(get_config("./config/does_not_exist.toml").is_err());
    }

    #[test]
    fn test_get_config_sample() {
        let config = get_config("./config/pump_tests_api.toml").unwrap();
        assert!(!config.security.access_secret.is_empty());
        assert!(config.server.http_port.is_some());
    }

    #[test]
    fn test_ssl_builder_missing_files() {
        let https_config = HttpsConfig { port: 8443, certificate_file: "./missing.crt".to_string(), private_key_file: "./missing.key".to_string() };
        let err = ssl_builder(&https_config).unwrap_err();
        assert_eq!(err.error_type, ErrorType::Initialization);
    }
}
