use crate::error::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DB_FILE: &str = "schoold.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS stakeholders(
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT,
            class_name TEXT,
            stage INTEGER,
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_stakeholders_kind ON stakeholders(kind)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS products(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            price_cents INTEGER NOT NULL,
            available INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS orders(
            id TEXT PRIMARY KEY,
            buyer_id TEXT NOT NULL,
            total_cents INTEGER NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_orders_buyer ON orders(buyer_id)",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS order_items(
            order_id TEXT NOT NULL,
            product_id TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            unit_price_cents INTEGER NOT NULL,
            PRIMARY KEY(order_id, product_id),
            FOREIGN KEY(order_id) REFERENCES orders(id),
            FOREIGN KEY(product_id) REFERENCES products(id)
        )",
        [],
    )?;

    Ok(conn)
}

/// Any person record: staff, student, parent or applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stakeholder {
    pub id: String,
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(alias = "first_name")]
    pub first_name: String,
    #[serde(alias = "last_name")]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "class_name")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub stage: Option<i64>,
    #[serde(default, alias = "updated_at")]
    pub updated_at: Option<String>,
}

impl Stakeholder {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub fn upsert_stakeholder(conn: &Connection, s: &Stakeholder) -> AppResult<()> {
    conn.execute(
        "INSERT INTO stakeholders(id, kind, first_name, last_name, email, class_name, stage, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
           kind = excluded.kind,
           first_name = excluded.first_name,
           last_name = excluded.last_name,
           email = excluded.email,
           class_name = excluded.class_name,
           stage = excluded.stage,
           updated_at = excluded.updated_at",
        (
            &s.id,
            &s.kind,
            &s.first_name,
            &s.last_name,
            &s.email,
            &s.class_name,
            &s.stage,
            &s.updated_at,
        ),
    )?;
    Ok(())
}

fn stakeholder_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Stakeholder> {
    Ok(Stakeholder {
        id: r.get(0)?,
        kind: r.get(1)?,
        first_name: r.get(2)?,
        last_name: r.get(3)?,
        email: r.get(4)?,
        class_name: r.get(5)?,
        stage: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

pub fn list_stakeholders(conn: &Connection, kind: Option<&str>) -> AppResult<Vec<Stakeholder>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, first_name, last_name, email, class_name, stage, updated_at
         FROM stakeholders
         WHERE (?1 IS NULL OR kind = ?1)
         ORDER BY last_name, first_name, id",
    )?;
    let rows = stmt
        .query_map([kind], stakeholder_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_stakeholder(conn: &Connection, id: &str) -> AppResult<Option<Stakeholder>> {
    conn.query_row(
        "SELECT id, kind, first_name, last_name, email, class_name, stage, updated_at
         FROM stakeholders WHERE id = ?",
        [id],
        stakeholder_from_row,
    )
    .optional()
    .map_err(AppError::from)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(alias = "price_cents")]
    pub price_cents: i64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

pub fn upsert_product(conn: &Connection, p: &Product) -> AppResult<()> {
    conn.execute(
        "INSERT INTO products(id, name, price_cents, available) VALUES(?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           price_cents = excluded.price_cents,
           available = excluded.available",
        (&p.id, &p.name, p.price_cents, p.available as i64),
    )?;
    Ok(())
}

fn product_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: r.get(0)?,
        name: r.get(1)?,
        price_cents: r.get(2)?,
        available: r.get::<_, i64>(3)? != 0,
    })
}

pub fn list_products(conn: &Connection) -> AppResult<Vec<Product>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, price_cents, available FROM products ORDER BY name, id",
    )?;
    let rows = stmt
        .query_map([], product_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_product(conn: &Connection, id: &str) -> AppResult<Option<Product>> {
    conn.query_row(
        "SELECT id, name, price_cents, available FROM products WHERE id = ?",
        [id],
        product_from_row,
    )
    .optional()
    .map_err(AppError::from)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub buyer_id: String,
    pub total_cents: i64,
    pub status: String,
    pub created_at: String,
    pub items: Vec<OrderItem>,
}

pub fn list_orders(conn: &Connection, buyer_id: Option<&str>) -> AppResult<Vec<Order>> {
    let mut stmt = conn.prepare(
        "SELECT id, buyer_id, total_cents, status, created_at
         FROM orders
         WHERE (?1 IS NULL OR buyer_id = ?1)
         ORDER BY created_at, id",
    )?;
    let mut orders = stmt
        .query_map([buyer_id], |r| {
            Ok(Order {
                id: r.get(0)?,
                buyer_id: r.get(1)?,
                total_cents: r.get(2)?,
                status: r.get(3)?,
                created_at: r.get(4)?,
                items: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut items_stmt = conn.prepare(
        "SELECT product_id, quantity, unit_price_cents
         FROM order_items WHERE order_id = ?
         ORDER BY product_id",
    )?;
    for order in orders.iter_mut() {
        order.items = items_stmt
            .query_map([&order.id], |r| {
                Ok(OrderItem {
                    product_id: r.get(0)?,
                    quantity: r.get(1)?,
                    unit_price_cents: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
    }
    Ok(orders)
}
