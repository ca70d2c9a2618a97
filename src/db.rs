use anyhow::Result;
use rusqlite::Connection;

use crate::products::ProductRecord;

pub const DEFAULT_DB_PATH: &str = "data/products.sqlite";

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = std::path::Path::new(path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS goods (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            category_name TEXT NOT NULL,
            product_name  TEXT NOT NULL,
            price_minor   INTEGER,
            parsed_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_goods_category ON goods(category_name);
        ",
    )?;
    Ok(())
}

/// Stage one category's records. The caller owns the transaction: pass the
/// open `Transaction` (derefs to `Connection`) and commit after this returns.
pub fn save_products(
    conn: &Connection,
    category_name: &str,
    products: &[ProductRecord],
) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO goods (category_name, product_name, price_minor) VALUES (?1, ?2, ?3)",
    )?;
    let mut count = 0;
    for product in products {
        count += stmt.execute(rusqlite::params![
            category_name,
            product.name,
            product.price_minor
        ])?;
    }
    Ok(count)
}

pub struct GoodsRow {
    pub category_name: String,
    pub product_name: String,
    pub price_minor: Option<i64>,
}

pub fn fetch_goods(conn: &Connection) -> Result<Vec<GoodsRow>> {
    let mut stmt =
        conn.prepare("SELECT category_name, product_name, price_minor FROM goods ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(GoodsRow {
                category_name: row.get(0)?,
                product_name: row.get(1)?,
                price_minor: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub categories: Vec<(String, usize)>,
    pub last_parsed_at: Option<String>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM goods", [], |r| r.get(0))?;
    let last_parsed_at: Option<String> =
        conn.query_row("SELECT MAX(parsed_at) FROM goods", [], |r| r.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT category_name, COUNT(*) FROM goods GROUP BY category_name ORDER BY category_name",
    )?;
    let categories = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Stats {
        total,
        categories,
        last_parsed_at,
    })
}
