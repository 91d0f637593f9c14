// Copyright 2023 Remi Bernotavicius

use diesel::connection::SimpleConnection as _;
use diesel::prelude::Connection as _;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::error::Error;
use std::path::Path;

pub mod models;
pub mod resolve;
pub mod schema;

pub type Connection = diesel::sqlite::SqliteConnection;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Opens the database at `path`, turning on foreign-key enforcement and creating / seeding the
/// tables if this is a fresh file. Any failure here is fatal to startup.
pub fn establish_connection(
    path: impl AsRef<Path>,
) -> Result<Connection, Box<dyn Error + Send + Sync + 'static>> {
    let path = path.as_ref();
    let url = path
        .to_str()
        .ok_or_else(|| format!("database path {path:?} is not valid UTF-8"))?;
    let mut connection = Connection::establish(url)?;
    connection.batch_execute("PRAGMA foreign_keys = ON")?;
    for version in connection.run_pending_migrations(MIGRATIONS)? {
        log::info!("applied migration {version}");
    }
    Ok(connection)
}

#[cfg(test)]
pub fn test_connection() -> Connection {
    establish_connection(":memory:").unwrap()
}

#[test]
fn migrations() {
    use diesel::QueryDsl as _;
    use diesel::RunQueryDsl as _;

    let mut conn = test_connection();
    conn.revert_all_migrations(MIGRATIONS).unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();

    let meal_times: Vec<String> = schema::meal_times::table
        .select(schema::meal_times::name)
        .order(schema::meal_times::id)
        .load(&mut conn)
        .unwrap();
    assert_eq!(meal_times, ["Desayuno", "Comida", "Cena"]);

    let num_recipes: i64 = schema::recipes::table
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(num_recipes, 5);
}
