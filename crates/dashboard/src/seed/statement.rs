//! Parameterized statements issued by the seeder, and the fixed schema.

use std::fmt;

use time::Date;
use uuid::Uuid;

pub const CREATE_UUID_EXTENSION: &str = r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp""#;

/// How the insert statements for one table are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPolicy {
    /// All inserts in flight at once, awaited together. Order is unspecified.
    Concurrent,
    /// One insert at a time in input order. The first failure stops the rest.
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Customers,
    Invoices,
    Revenue,
}

impl Table {
    /// Seeding order: invoices reference customers.
    pub const ALL: [Table; 4] = [Table::Users, Table::Customers, Table::Invoices, Table::Revenue];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Customers => "customers",
            Table::Invoices => "invoices",
            Table::Revenue => "revenue",
        }
    }

    pub fn insert_policy(&self) -> InsertPolicy {
        match self {
            Table::Users | Table::Customers | Table::Invoices => InsertPolicy::Concurrent,
            Table::Revenue => InsertPolicy::Sequential,
        }
    }

    pub fn create_sql(&self) -> &'static str {
        match self {
            Table::Users => {
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    password TEXT NOT NULL
                )
                "#
            }
            Table::Customers => {
                r#"
                CREATE TABLE IF NOT EXISTS customers (
                    id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    email VARCHAR(255) NOT NULL,
                    image_url VARCHAR(255) NOT NULL
                )
                "#
            }
            Table::Invoices => {
                r#"
                CREATE TABLE IF NOT EXISTS invoices (
                    id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
                    customer_id UUID NOT NULL,
                    amount INT NOT NULL,
                    status VARCHAR(255) NOT NULL,
                    date DATE NOT NULL
                )
                "#
            }
            Table::Revenue => {
                r#"
                CREATE TABLE IF NOT EXISTS revenue (
                    month VARCHAR(4) NOT NULL UNIQUE,
                    revenue INT NOT NULL
                )
                "#
            }
        }
    }

    /// Insert-if-absent statement. The first parameter is always the conflict key.
    pub fn insert_sql(&self) -> &'static str {
        match self {
            Table::Users => {
                r#"
                INSERT INTO users (id, name, email, password)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO NOTHING
                "#
            }
            Table::Customers => {
                r#"
                INSERT INTO customers (id, name, email, image_url)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO NOTHING
                "#
            }
            Table::Invoices => {
                r#"
                INSERT INTO invoices (id, customer_id, amount, status, date)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO NOTHING
                "#
            }
            Table::Revenue => {
                r#"
                INSERT INTO revenue (month, revenue)
                VALUES ($1, $2)
                ON CONFLICT (month) DO NOTHING
                "#
            }
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Uuid(Uuid),
    Text(String),
    Int(i32),
    Date(Date),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Uuid(v) => write!(f, "{v}"),
            SqlValue::Text(v) => f.write_str(v),
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::Date(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    CreateExtension,
    CreateTable(Table),
    Insert(Table),
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: &'static str,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn create_extension() -> Self {
        Self {
            kind: StatementKind::CreateExtension,
            sql: CREATE_UUID_EXTENSION,
            params: Vec::new(),
        }
    }

    pub fn create_table(table: Table) -> Self {
        Self {
            kind: StatementKind::CreateTable(table),
            sql: table.create_sql(),
            params: Vec::new(),
        }
    }

    pub fn insert(table: Table, params: Vec<SqlValue>) -> Self {
        Self {
            kind: StatementKind::Insert(table),
            sql: table.insert_sql(),
            params,
        }
    }

    /// The conflict key of an insert, rendered as text.
    pub fn key(&self) -> Option<String> {
        match self.kind {
            StatementKind::Insert(_) => self.params.first().map(ToString::to_string),
            _ => None,
        }
    }
}
