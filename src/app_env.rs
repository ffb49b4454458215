/// URL for accessing the PostgreSQL database (should contain a schema name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. Accepts tracing-subscriber
/// env-filter directives, e.g. `info` or `taskboard=debug`
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Address the HTTP server binds to, defaults to 0.0.0.0:8080
pub const LISTEN_ADDR: &str = "LISTEN_ADDR";
