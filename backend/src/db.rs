use anyhow::Result;
use shared::Installment;
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};
use std::sync::Arc;

use crate::aggregate::{InstallmentRow, JoinedRow, QuotationRow};

// The database URL for the production database; overridable via env.
const DATABASE_URL: &str = "sqlite:quotations.db";

/// A row of the employees table, password included. Stays inside the
/// backend; the REST layer only ever serializes [`shared::EmployeeProfile`].
#[derive(Debug, Clone)]
pub struct EmployeeRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub gender: Option<String>,
    pub role: Option<String>,
}

/// DbConnection manages database operations
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        // Connect to the database
        let pool = SqlitePool::connect(url).await?;

        // Setup database schema
        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize the standard database, honouring a DATABASE_URL override
    pub async fn init() -> Result<Self> {
        let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DATABASE_URL.to_string());
        Self::new(&url).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Generate a unique database name for tests
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quotation (
                quotation_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                email TEXT,
                gender TEXT,
                date TEXT,
                designation TEXT,
                domain TEXT,
                entitle TEXT,
                description TEXT,
                price REAL,
                quantity REAL,
                total REAL,
                discount REAL,
                grandTotal REAL,
                inputCount INTEGER
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS payments (
                quotation_id INTEGER NOT NULL,
                label TEXT NOT NULL,
                dueWhen TEXT,
                installmentAmount REAL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS employees (
                employee_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                gender TEXT,
                role TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// All quotations joined to their payments, one row per payment (or one
    /// NULL-payment row for a quotation with none). Ordered so the fold sees
    /// each quotation's payments contiguously and in insertion order.
    pub async fn list_quotation_rows(&self) -> Result<Vec<JoinedRow>> {
        let rows = sqlx::query(
            r#"
            SELECT q.quotation_id, q.name, q.email, q.gender, q.date, q.designation,
                   q.domain, q.entitle, q.description, q.price, q.quantity, q.total,
                   q.discount, q.grandTotal, q.inputCount,
                   p.label, p.dueWhen, p.installmentAmount
            FROM quotation q
            LEFT JOIN payments p ON q.quotation_id = p.quotation_id
            ORDER BY q.quotation_id, p.rowid
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.iter().map(joined_row).collect())
    }

    /// Joined rows for a single quotation id; empty when the id is unknown.
    pub async fn quotation_rows(&self, quotation_id: i64) -> Result<Vec<JoinedRow>> {
        let rows = sqlx::query(
            r#"
            SELECT q.quotation_id, q.name, q.email, q.gender, q.date, q.designation,
                   q.domain, q.entitle, q.description, q.price, q.quantity, q.total,
                   q.discount, q.grandTotal, q.inputCount,
                   p.label, p.dueWhen, p.installmentAmount
            FROM quotation q
            LEFT JOIN payments p ON q.quotation_id = p.quotation_id
            WHERE q.quotation_id = ?
            ORDER BY p.rowid
            "#,
        )
        .bind(quotation_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.iter().map(joined_row).collect())
    }

    /// Insert a quotation and its installments atomically. The installments
    /// arrive untagged; each is bound to the id generated by the quotation
    /// insert. Returns that id.
    pub async fn create_quotation(
        &self,
        row: &QuotationRow,
        installments: &[Installment],
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO quotation (name, email, gender, date, designation, domain,
                                   entitle, description, price, quantity, total,
                                   discount, grandTotal, inputCount)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.gender)
        .bind(&row.date)
        .bind(&row.designation)
        .bind(&row.domain)
        .bind(&row.entitle)
        .bind(&row.description)
        .bind(row.price)
        .bind(row.quantity)
        .bind(row.total)
        .bind(row.discount)
        .bind(row.grand_total)
        .bind(row.input_count)
        .execute(&mut *tx)
        .await?;

        let quotation_id = result.last_insert_rowid();

        for installment in installments {
            sqlx::query(
                "INSERT INTO payments (quotation_id, label, dueWhen, installmentAmount) VALUES (?, ?, ?, ?)",
            )
            .bind(quotation_id)
            .bind(&installment.label)
            .bind(&installment.due_when)
            .bind(installment.installment_amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(quotation_id)
    }

    /// Update a quotation's scalar row and replace its installment rows
    /// wholesale. The delete-then-insert runs inside the same transaction as
    /// the update, so a failed insert never leaves the schedule half-gone.
    /// Returns false (with nothing committed) when the id does not exist.
    pub async fn update_quotation(
        &self,
        quotation_id: i64,
        row: &QuotationRow,
        installments: &[InstallmentRow],
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE quotation
            SET name = ?, email = ?, gender = ?, date = ?, designation = ?, domain = ?,
                entitle = ?, description = ?, price = ?, quantity = ?, total = ?,
                discount = ?, grandTotal = ?, inputCount = ?
            WHERE quotation_id = ?
            "#,
        )
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.gender)
        .bind(&row.date)
        .bind(&row.designation)
        .bind(&row.domain)
        .bind(&row.entitle)
        .bind(&row.description)
        .bind(row.price)
        .bind(row.quantity)
        .bind(row.total)
        .bind(row.discount)
        .bind(row.grand_total)
        .bind(row.input_count)
        .bind(quotation_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM payments WHERE quotation_id = ?")
            .bind(quotation_id)
            .execute(&mut *tx)
            .await?;

        for installment in installments {
            sqlx::query(
                "INSERT INTO payments (quotation_id, label, dueWhen, installmentAmount) VALUES (?, ?, ?, ?)",
            )
            .bind(installment.quotation_id)
            .bind(&installment.label)
            .bind(&installment.due_when)
            .bind(installment.installment_amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Delete a quotation and its installments atomically.
    /// Returns false when the id does not exist.
    pub async fn delete_quotation(&self, quotation_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM quotation WHERE quotation_id = ?")
            .bind(quotation_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM payments WHERE quotation_id = ?")
            .bind(quotation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Insert an employee row. The UNIQUE constraint on email surfaces as an
    /// error here; the service checks for duplicates first to report it as a
    /// domain condition rather than a storage failure.
    pub async fn insert_employee(
        &self,
        name: &str,
        email: &str,
        password: &str,
        gender: Option<&str>,
        role: Option<&str>,
        created_at: &str,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees (name, email, password, gender, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password)
        .bind(gender)
        .bind(role)
        .bind(created_at)
        .execute(&*self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Look up an employee by email
    pub async fn find_employee_by_email(&self, email: &str) -> Result<Option<EmployeeRecord>> {
        let row = sqlx::query(
            "SELECT employee_id, name, email, password, gender, role FROM employees WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.map(|r| EmployeeRecord {
            id: r.get("employee_id"),
            name: r.get("name"),
            email: r.get("email"),
            password: r.get("password"),
            gender: r.get("gender"),
            role: r.get("role"),
        }))
    }
}

fn joined_row(row: &sqlx::sqlite::SqliteRow) -> JoinedRow {
    JoinedRow {
        quotation_id: row.get("quotation_id"),
        name: row.get("name"),
        email: row.get("email"),
        gender: row.get("gender"),
        date: row.get("date"),
        designation: row.get("designation"),
        domain: row.get("domain"),
        entitle: row.get("entitle"),
        description: row.get("description"),
        price: row.get("price"),
        quantity: row.get("quantity"),
        total: row.get("total"),
        discount: row.get("discount"),
        grand_total: row.get("grandTotal"),
        input_count: row.get("inputCount"),
        label: row.get("label"),
        due_when: row.get("dueWhen"),
        installment_amount: row.get("installmentAmount"),
    }
}
