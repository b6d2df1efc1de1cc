//! # Inventory Store
//!
//! The persistence boundary of the engine. The core only ever needs three
//! things from the store: read lots (all, or matching a name), and apply a
//! batch of decrement/delete mutations transactionally, each guarded by an
//! optimistic-concurrency version token.
//!
//! [`SqliteInventoryStore`] is the bundled SQLite implementation. Every lot
//! row carries a `version` column bumped on each mutation; a mutation whose
//! expected version no longer matches makes the whole batch roll back with
//! [`StoreError::VersionConflict`], which is what lets two concurrent recipe
//! completions race on the same lot without ever deducting past zero.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::{params, Connection};

use crate::ingredient_model::InventoryLot;

/// Store-level failures surfaced to the transaction executor
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A mutation's expected version no longer matched; the batch was rolled
    /// back in full
    VersionConflict { lot_id: i64 },
    /// The persistence layer failed; no partial writes persist
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::VersionConflict { lot_id } => {
                write!(f, "version conflict on lot {lot_id}")
            }
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// One guarded mutation against a single lot
#[derive(Debug, Clone, PartialEq)]
pub struct LotMutation {
    /// Target lot
    pub lot_id: i64,
    /// Version the lot must still have for the mutation to apply
    pub expected_version: i64,
    /// What to do to the lot
    pub op: MutationOp,
}

/// The two mutations the engine performs
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOp {
    /// Subtract an amount (in the lot's native unit) from the quantity
    Decrement(f64),
    /// Remove the lot entirely (consumed to nothing)
    Delete,
}

/// Counts of applied mutations, reported back to the executor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MutationReport {
    /// Lots decremented and kept
    pub updated: usize,
    /// Lots deleted
    pub deleted: usize,
}

/// The read/apply surface the engine requires from any inventory store
pub trait InventoryStore {
    /// Snapshot of every lot
    fn all_lots(&self) -> Result<Vec<InventoryLot>, StoreError>;

    /// Lots whose product name contains the given name, case-insensitively
    fn lots_matching(&self, name: &str) -> Result<Vec<InventoryLot>, StoreError>;

    /// Apply a batch of mutations as one transaction: either every mutation
    /// applies, or none do
    fn apply_mutations(&mut self, mutations: &[LotMutation]) -> Result<MutationReport, StoreError>;
}

/// Initialize the inventory schema
pub fn init_inventory_schema(conn: &Connection) -> Result<()> {
    info!("Initializing inventory schema...");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS lots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_name TEXT NOT NULL,
            quantity REAL NOT NULL CHECK (quantity >= 0),
            unit TEXT NOT NULL,
            expiration_date TEXT,
            category TEXT,
            version INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )
    .context("Failed to create lots table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS lots_product_name_idx ON lots(product_name)",
        [],
    )
    .context("Failed to create product name index")?;

    info!("Inventory schema initialized successfully");
    Ok(())
}

/// SQLite-backed inventory store
pub struct SqliteInventoryStore {
    conn: Connection,
}

impl SqliteInventoryStore {
    /// Open (and initialize) a store at the given path
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open inventory database at {}", path.display()))?;
        init_inventory_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory store, mainly for tests and demos
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory inventory database")?;
        init_inventory_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Insert a lot and return its id.
    ///
    /// Lot creation belongs to the inventory-add flow outside the engine;
    /// this exists for seeding and tests.
    pub fn add_lot(
        &self,
        product_name: &str,
        quantity: f64,
        unit: &str,
        expiration_date: Option<NaiveDate>,
        category: Option<&str>,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO lots (product_name, quantity, unit, expiration_date, category)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    product_name,
                    quantity,
                    unit,
                    expiration_date.map(|d| d.to_string()),
                    category
                ],
            )
            .context("Failed to insert lot")?;

        let lot_id = self.conn.last_insert_rowid();
        debug!("Lot created with ID: {}", lot_id);
        Ok(lot_id)
    }

    /// Read a single lot by id
    pub fn get_lot(&self, lot_id: i64) -> Result<Option<InventoryLot>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, product_name, quantity, unit, expiration_date, category, version
                 FROM lots WHERE id = ?1",
            )
            .context("Failed to prepare lot read statement")?;

        let lot = stmt.query_row(params![lot_id], row_to_lot);

        match lot {
            Ok(lot) => Ok(Some(lot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e).context("Failed to read lot"),
        }
    }

    fn query_lots(&self, sql: &str, query_params: &[&dyn rusqlite::ToSql]) -> Result<Vec<InventoryLot>, StoreError> {
        let mut stmt = self.conn.prepare(sql).map_err(unavailable)?;
        let rows = stmt
            .query_map(query_params, row_to_lot)
            .map_err(unavailable)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(unavailable)
    }
}

impl InventoryStore for SqliteInventoryStore {
    fn all_lots(&self) -> Result<Vec<InventoryLot>, StoreError> {
        self.query_lots(
            "SELECT id, product_name, quantity, unit, expiration_date, category, version
             FROM lots ORDER BY id",
            &[],
        )
    }

    fn lots_matching(&self, name: &str) -> Result<Vec<InventoryLot>, StoreError> {
        self.query_lots(
            "SELECT id, product_name, quantity, unit, expiration_date, category, version
             FROM lots WHERE instr(lower(product_name), lower(?1)) > 0 ORDER BY id",
            &[&name],
        )
    }

    fn apply_mutations(&mut self, mutations: &[LotMutation]) -> Result<MutationReport, StoreError> {
        let tx = self.conn.transaction().map_err(unavailable)?;
        let mut report = MutationReport::default();

        for mutation in mutations {
            let rows_affected = match mutation.op {
                MutationOp::Decrement(amount) => tx
                    .execute(
                        // The quantity guard keeps the row invariant even if
                        // a plan was computed against a stale snapshot that
                        // somehow kept its version
                        "UPDATE lots SET quantity = quantity - ?1, version = version + 1
                         WHERE id = ?2 AND version = ?3 AND quantity - ?1 >= -1e-9",
                        params![amount, mutation.lot_id, mutation.expected_version],
                    )
                    .map_err(unavailable)?,
                MutationOp::Delete => tx
                    .execute(
                        "DELETE FROM lots WHERE id = ?1 AND version = ?2",
                        params![mutation.lot_id, mutation.expected_version],
                    )
                    .map_err(unavailable)?,
            };

            if rows_affected != 1 {
                debug!(
                    "Mutation on lot {} missed (expected version {}); rolling back batch",
                    mutation.lot_id, mutation.expected_version
                );
                // Dropping the transaction rolls the whole batch back
                return Err(StoreError::VersionConflict {
                    lot_id: mutation.lot_id,
                });
            }

            match mutation.op {
                MutationOp::Decrement(_) => report.updated += 1,
                MutationOp::Delete => report.deleted += 1,
            }
        }

        tx.commit().map_err(unavailable)?;
        info!(
            "Applied {} mutation(s): {} updated, {} deleted",
            mutations.len(),
            report.updated,
            report.deleted
        );
        Ok(report)
    }
}

fn unavailable(err: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn row_to_lot(row: &rusqlite::Row<'_>) -> rusqlite::Result<InventoryLot> {
    let expiration: Option<String> = row.get(4)?;
    Ok(InventoryLot {
        id: row.get(0)?,
        product_name: row.get(1)?,
        quantity: row.get(2)?,
        unit: row.get(3)?,
        expiration_date: expiration
            .and_then(|text| NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok()),
        category: row.get(5)?,
        version: row.get(6)?,
    })
}
