//! The six demo flows, in the order they are meant to run.
//!
//! Each flow is a fixed script over [`GameStoreDb`]: schema definition,
//! dummy data, grouping/ordering, aggregation, transaction rollback, and an
//! additive migration. Failures the flows never expect propagate up as
//! errors; the one deliberate constraint violation is caught and logged
//! where it happens.

use crate::dummy;
use crate::sqlite::{GameStoreDb, Value};
use anyhow::{ensure, Result};
use rand::Rng;
use rusqlite::params;
use tracing::{info, warn};

/// Games inserted by the dummy-data flow.
pub const GAME_COUNT: i64 = 50;

/// Purchases inserted by the migration flow.
pub const PURCHASE_COUNT: i64 = 200;

/// Runs every flow once, in order. Schema first, then data, then the
/// read-only and transactional flows, migration last.
pub fn run_all(db: &GameStoreDb) -> Result<()> {
    create_and_alter_tables(db)?;
    insert_dummy_games(db)?;
    backfill_release_dates(db)?;
    grouping_ordering(db)?;
    aggregation(db)?;
    transaction_rollback(db)?;
    migrate_purchases(db)?;
    Ok(())
}

/// Create the Game table (v1.0) and add a column to it (v1.1).
///
/// Foreign-key checks are suspended only while dropping tables, so the drop
/// order doesn't matter, and re-enabled immediately after.
pub fn create_and_alter_tables(db: &GameStoreDb) -> Result<()> {
    db.set_foreign_keys(false)?;
    db.execute("DROP TABLE IF EXISTS Purchase;")?;
    db.execute("DROP TABLE IF EXISTS Game;")?;
    db.set_foreign_keys(true)?;

    db.execute(
        "CREATE TABLE Game(
           id      INTEGER PRIMARY KEY,
           title   TEXT    NOT NULL,
           genre   TEXT    NOT NULL,
           price   REAL    NOT NULL
         );",
    )?;
    // releaseDate arrives in schema v1.1
    db.execute("ALTER TABLE Game ADD COLUMN releaseDate DATE;")?;

    ensure!(
        db.column_exists("Game", "releaseDate")?,
        "releaseDate column should be visible after ALTER TABLE"
    );
    info!("schema created and altered, releaseDate column present");
    Ok(())
}

/// Insert [`GAME_COUNT`] random games via one prepared statement.
pub fn insert_dummy_games(db: &GameStoreDb) -> Result<()> {
    // One transaction is much faster than 50 autocommits.
    db.begin()?;
    db.prepare(
        "INSERT INTO Game(id, title, genre, price) VALUES (?1, ?2, ?3, ?4)",
        |stmt| {
            for id in 1..=GAME_COUNT {
                let game = dummy::game(id);
                stmt.execute(params![game.id, game.title, game.genre, game.price])?;
            }
            Ok(())
        },
    )?;
    db.commit()?;

    let count = db.scalar_int("SELECT COUNT(*) FROM Game")?;
    ensure!(count == GAME_COUNT, "expected {GAME_COUNT} games, found {count}");
    info!(count, "inserted dummy games");
    Ok(())
}

/// Backfill the releaseDate column with random past dates, one transaction
/// for all rows.
pub fn backfill_release_dates(db: &GameStoreDb) -> Result<()> {
    let mut rng = rand::thread_rng();
    db.begin()?;
    db.prepare(
        "UPDATE Game SET releaseDate = date('now', ?1) WHERE id = ?2",
        |stmt| {
            for id in 1..=GAME_COUNT {
                let days_ago: i64 = rng.gen_range(100..=2000);
                stmt.execute(params![format!("-{days_ago} days"), id])?;
            }
            Ok(())
        },
    )?;
    db.commit()?;

    // Quick sanity check on the resulting date span.
    if let Some(span) = db
        .query("SELECT MIN(releaseDate) AS oldest, MAX(releaseDate) AS newest FROM Game;")?
        .first()
    {
        let oldest = span.get("oldest").and_then(Value::as_str).unwrap_or("?");
        let newest = span.get("newest").and_then(Value::as_str).unwrap_or("?");
        info!(oldest, newest, "release dates backfilled");
    }
    Ok(())
}

/// Count titles per genre with GROUP BY, ordered by the count.
pub fn grouping_ordering(db: &GameStoreDb) -> Result<()> {
    let rows = db.query(
        "SELECT genre, COUNT(*) AS titles
         FROM Game
         GROUP BY genre
         ORDER BY titles DESC;",
    )?;

    let mut grouped_total = 0;
    for row in &rows {
        let genre = row.get("genre").and_then(Value::as_str).unwrap_or("?");
        let titles = row.get("titles").and_then(Value::as_i64).unwrap_or(0);
        grouped_total += titles;
        info!(genre, titles, "genre count");
    }

    let total = db.scalar_int("SELECT COUNT(*) FROM Game")?;
    ensure!(
        grouped_total == total,
        "per-genre counts sum to {grouped_total}, total is {total}"
    );
    Ok(())
}

/// COUNT, MIN, MAX and AVG price per genre in a single query.
pub fn aggregation(db: &GameStoreDb) -> Result<()> {
    let rows = db.query(
        "SELECT genre,
                COUNT(*)             AS titles,
                MIN(price)           AS cheap,
                MAX(price)           AS pricey,
                ROUND(AVG(price), 1) AS avg
         FROM Game
         GROUP BY genre
         ORDER BY avg DESC;",
    )?;
    ensure!(!rows.is_empty(), "aggregation over a populated table returned no rows");

    for row in &rows {
        info!(
            genre = row.get("genre").and_then(crate::sqlite::Value::as_str).unwrap_or("?"),
            titles = row.get("titles").and_then(crate::sqlite::Value::as_i64).unwrap_or(0),
            cheap = row.get("cheap").and_then(crate::sqlite::Value::as_f64).unwrap_or(0.0),
            pricey = row.get("pricey").and_then(crate::sqlite::Value::as_f64).unwrap_or(0.0),
            avg = row.get("avg").and_then(crate::sqlite::Value::as_f64).unwrap_or(0.0),
            "genre price aggregate"
        );
    }
    Ok(())
}

/// Show that rolling back a transaction leaves committed state untouched,
/// even though statements inside it succeeded before the violation.
pub fn transaction_rollback(db: &GameStoreDb) -> Result<()> {
    // Snapshot of the total before the risky work.
    let before = db.scalar_int("SELECT ROUND(SUM(price)) FROM Game")?;

    db.begin()?;
    db.execute("UPDATE Game SET price = price * 1.10;")?;
    // Deliberately violate NOT NULL; this one failure is expected.
    let violation = db.execute("UPDATE Game SET title = NULL WHERE id = 1;");
    if let Err(err) = &violation {
        warn!(code = ?err.sqlite_code(), "expected constraint violation: {err}");
    }
    ensure!(violation.is_err(), "NULL title should violate the NOT NULL constraint");
    db.rollback()?;

    let after = db.scalar_int("SELECT ROUND(SUM(price)) FROM Game")?;
    ensure!(
        before == after,
        "rollback should preserve totals ({before} before, {after} after)"
    );
    info!(total = after, "rollback preserved totals");
    Ok(())
}

/// Additive migration: the Purchase table (v2.0) plus a lookup index.
/// Safe to run any number of times.
pub fn ensure_purchase_schema(db: &GameStoreDb) -> Result<()> {
    db.execute(
        "CREATE TABLE IF NOT EXISTS Purchase(
           id       INTEGER PRIMARY KEY,
           gameID   INTEGER NOT NULL,
           platform TEXT    NOT NULL,
           boughtAt DATE    NOT NULL,
           FOREIGN KEY(gameID) REFERENCES Game(id)
         );",
    )?;
    // Index speeds up JOINs and lookups by gameID.
    db.execute("CREATE INDEX IF NOT EXISTS idx_purchase_game ON Purchase(gameID);")?;
    Ok(())
}

/// Bulk-insert [`PURCHASE_COUNT`] purchases, each referencing an existing
/// game, in one transaction.
pub fn insert_dummy_purchases(db: &GameStoreDb) -> Result<()> {
    let mut rng = rand::thread_rng();
    db.begin()?;
    db.prepare(
        "INSERT INTO Purchase(id, gameID, platform, boughtAt) VALUES (?1, ?2, ?3, ?4)",
        |stmt| {
            for id in 1..=PURCHASE_COUNT {
                let game_id = rng.gen_range(1..=GAME_COUNT);
                let purchase = dummy::purchase(id, game_id);
                stmt.execute(params![
                    purchase.id,
                    purchase.game_id,
                    purchase.platform,
                    purchase.bought_at
                ])?;
            }
            Ok(())
        },
    )?;
    db.commit()?;

    let count = db.scalar_int("SELECT COUNT(*) FROM Purchase")?;
    ensure!(
        count == PURCHASE_COUNT,
        "expected {PURCHASE_COUNT} purchases, found {count}"
    );
    info!(count, "migration applied and purchases inserted");
    Ok(())
}

/// The full migration flow: new structure first, then the related rows.
pub fn migrate_purchases(db: &GameStoreDb) -> Result<()> {
    ensure_purchase_schema(db)?;
    insert_dummy_purchases(db)?;
    Ok(())
}
