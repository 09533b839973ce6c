use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use recette::Config;

const CONNECT_ATTEMPTS: u32 = 30;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = Config::load();

    let pool = connect_with_retry(&config.database_url).await;
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let bind = config.bind;
    log::info!("listening on {bind}");

    warp::serve(recette::routes(pool, Arc::new(config)))
        .run(bind)
        .await;
}

/// The database container may come up after the API does; poll until it
/// accepts connections instead of crash-looping.
async fn connect_with_retry(database_url: &str) -> Pool<Postgres> {
    for attempt in 1..=CONNECT_ATTEMPTS {
        match PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
        {
            Ok(pool) => return pool,
            Err(e) => {
                log::warn!("database unavailable (attempt {attempt}/{CONNECT_ATTEMPTS}): {e}");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    panic!("Gave up connecting to the database after {CONNECT_ATTEMPTS} attempts");
}
