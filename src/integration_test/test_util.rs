use crate::{app_env, persistence};
use dotenv::dotenv;
use lazy_static::lazy_static;
use rand::{Rng, thread_rng};
use sqlx::{Connection, PgConnection, PgPool, Row};
use std::{env, future::Future};
use tokio::runtime::Runtime;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

struct TestDatabase {
    db_name: String,
}

impl TestDatabase {
    /// Best-effort removal of databases left behind by earlier runs. Databases
    /// still in use by concurrently running tests refuse to drop and are left
    /// for the next run.
    async fn clear_old_dbs(conn: &mut PgConnection) {
        let test_dbs = sqlx::query(
            "SELECT datname FROM pg_catalog.pg_database WHERE datname LIKE 'test_db%'",
        )
        .fetch_all(&mut *conn)
        .await;
        let test_dbs = match test_dbs {
            Ok(results) => results
                .into_iter()
                .map(|row| row.get::<String, _>(0))
                .collect::<Vec<_>>(),
            Err(error) => {
                println!(
                    "Warning: failed to list old test databases. You may need to delete them manually. Error: {error}"
                );
                return;
            }
        };

        for db in test_dbs {
            let result = sqlx::query(format!("DROP DATABASE {}", db).as_str())
                .execute(&mut *conn)
                .await;
            if result.is_err() {
                println!(
                    "Warning: failed to drop old test database {}, you may need to do it manually.",
                    db
                );
            }
        }
    }

    async fn create(base_url: &str) -> Result<Self, sqlx::Error> {
        let mut rng = thread_rng();
        let schema_id: u32 = rng.gen_range(10_000..99_999);
        let db_name = format!("test_db_{}", schema_id);

        let mut conn = PgConnection::connect(base_url).await?;
        Self::clear_old_dbs(&mut conn).await;

        let create_result = sqlx::query(format!("CREATE DATABASE {}", db_name).as_str())
            .execute(&mut conn)
            .await;
        conn.close().await?;
        create_result?;

        Ok(Self { db_name })
    }

    fn db_name(&self) -> &str {
        self.db_name.as_str()
    }
}

/// Provisions a scratch database for a test, applies the schema, and hands the
/// test a connection pool.
///
/// Expects that the TEST_DB_URL environment variable is populated with the base
/// postgres connection string (no database name in the path).
pub fn prepare_db_and_test<F, R>(test_fn: F)
where
    R: Future<Output = ()>,
    F: FnOnce(PgPool) -> R,
{
    if dotenv().is_err() {
        println!("Test is running without .env file.");
    }

    TOKIO_RT.block_on(async move {
        let pg_connection_base_url = env::var(app_env::test::TEST_DB_URL)
            .expect("You must provide the TEST_DB_URL environment variable as the base postgres connection string");
        let test_db = match TestDatabase::create(&pg_connection_base_url).await {
            Ok(tdb) => tdb,
            Err(db_err) => panic!("Failed to start test database: {}", db_err),
        };

        let sqlx_pool = persistence::connect_sqlx(
            format!("{}/{}", pg_connection_base_url, test_db.db_name()).as_str(),
        )
        .await
        .expect("Could not connect to the test database");
        sqlx::raw_sql(include_str!("../../schema.sql"))
            .execute(&sqlx_pool)
            .await
            .expect("Could not apply the schema to the test database");

        test_fn(sqlx_pool).await;
    });
}
