// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod load;
pub mod predicate;

use anyhow::{Context, Result, anyhow, bail};
use parcours_app::{
    DataStore, Field, FieldKind, FieldValue, FilterNode, RawRecord, Record, RecordId, Sort,
    ViewInfo,
};
use predicate::{Predicate, is_field_name, quote_identifier};
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const LOGS_TABLE: &str = "logs";
pub const RAW_TABLE: &str = "logs_raw";

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// SQLite-backed log store. Each input line becomes a row of `logs` holding
/// the core columns plus any promoted fields, and a row of `logs_raw`
/// holding the line itself.
pub struct Store {
    conn: Connection,
    name: String,
    predicate: Option<Predicate>,
    order_by: String,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self::with_connection(conn))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self::with_connection(conn))
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            name: String::new(),
            predicate: None,
            order_by: "\"id\" ASC".to_owned(),
        }
    }

    /// Loads a newline-delimited JSON file, replacing whatever was loaded
    /// before. Returns the number of records.
    pub fn load_ndjson(&mut self, path: &Path) -> Result<usize> {
        let file =
            fs::File::open(path).with_context(|| format!("open log file {}", path.display()))?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        self.load_reader(&name, BufReader::new(file))
    }

    pub fn load_reader<R: BufRead>(&mut self, name: &str, reader: R) -> Result<usize> {
        let tx = self.conn.transaction().context("begin load transaction")?;
        tx.execute_batch(
            "
            DROP TABLE IF EXISTS logs;
            DROP TABLE IF EXISTS logs_raw;
            CREATE TABLE logs (
              id INTEGER PRIMARY KEY,
              timestamp TIMESTAMP,
              level TEXT,
              message TEXT
            );
            CREATE TABLE logs_raw (
              id INTEGER PRIMARY KEY,
              raw TEXT NOT NULL
            );
            ",
        )
        .context("create log tables")?;

        let mut count = 0usize;
        {
            let mut insert_log = tx
                .prepare("INSERT INTO logs (id, timestamp, level, message) VALUES (?, ?, ?, ?)")
                .context("prepare log insert")?;
            let mut insert_raw = tx
                .prepare("INSERT INTO logs_raw (id, raw) VALUES (?, ?)")
                .context("prepare raw insert")?;
            for (line_number, line) in reader.lines().enumerate() {
                let line = line.with_context(|| format!("read line {}", line_number + 1))?;
                let line = line.trim_end_matches('\r');
                if line.trim().is_empty() {
                    continue;
                }
                count += 1;
                let id = count as i64;
                let core = load::core_fields(line);
                insert_log
                    .execute(params![id, core.timestamp, core.level, core.message])
                    .with_context(|| format!("insert line {}", line_number + 1))?;
                insert_raw
                    .execute(params![id, line])
                    .with_context(|| format!("insert raw line {}", line_number + 1))?;
            }
        }

        tx.execute_batch("CREATE INDEX logs_timestamp_idx ON logs (timestamp);")
            .context("index timestamp")?;
        tx.commit().context("commit load")?;

        self.name = name.to_owned();
        self.predicate = None;
        self.order_by = "\"id\" ASC".to_owned();
        tracing::info!(source = name, records = count, "loaded logs");
        Ok(count)
    }

    pub fn fields(&self) -> Result<Vec<Field>> {
        let mut stmt = self
            .conn
            .prepare("PRAGMA table_info(logs)")
            .context("inspect log columns")?;
        let rows = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let declared: String = row.get(2)?;
                Ok(Field::new(name, FieldKind::from_declared_type(&declared)))
            })
            .context("query log columns")?;
        let fields = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect log columns")?;
        if fields.is_empty() {
            bail!("no logs loaded");
        }
        Ok(fields)
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        match &self.predicate {
            Some(predicate) => (
                format!(" WHERE {}", predicate.clause),
                predicate.params.clone(),
            ),
            None => (String::new(), Vec::new()),
        }
    }
}

impl DataStore for Store {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_view(&mut self) -> Result<ViewInfo> {
        let fields = self.fields()?;
        let (clause, params) = self.where_clause();
        let total: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM logs{clause}"),
                params_from_iter(params.iter()),
                |row| row.get(0),
            )
            .context("count matching records")?;
        Ok(ViewInfo {
            fields,
            total: usize::try_from(total).unwrap_or(0),
        })
    }

    fn get_page(&mut self, offset: usize, size: usize) -> Result<Vec<Record>> {
        let fields = self.fields()?;
        let id_index = fields
            .iter()
            .position(|field| field.name == "id")
            .ok_or_else(|| anyhow!("logs table has no id column"))?;
        let (clause, mut params) = self.where_clause();
        params.push(Value::Integer(i64::try_from(size).unwrap_or(i64::MAX)));
        params.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

        let sql = format!(
            "SELECT * FROM logs{clause} ORDER BY {} LIMIT ? OFFSET ?",
            self.order_by
        );
        let mut stmt = self.conn.prepare(&sql).context("prepare page query")?;
        let mut rows = stmt
            .query(params_from_iter(params.iter()))
            .context("query page")?;

        let mut records = Vec::with_capacity(size);
        while let Some(row) = rows.next().context("scan page rows")? {
            let id: i64 = row.get(id_index).context("read record id")?;
            let mut values = Vec::with_capacity(fields.len());
            for (index, field) in fields.iter().enumerate() {
                let value = row
                    .get_ref(index)
                    .with_context(|| format!("read column {}", field.name))?;
                values.push(field_value(field.kind, value));
            }
            records.push(Record {
                id: RecordId::new(id),
                values,
            });
        }
        Ok(records)
    }

    fn get_record(&mut self, id: RecordId) -> Result<RawRecord> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT raw FROM logs_raw WHERE id = ?",
                params![id.get()],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("load record {}", id.get()))?;
        let Some(raw) = raw else {
            bail!("record {} not found", id.get());
        };
        Ok(match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Object(object)) => object,
            _ => {
                let mut object = RawRecord::new();
                object.insert("message".to_owned(), serde_json::Value::String(raw));
                object
            }
        })
    }

    fn set_view(&mut self, filter: Option<&FilterNode>, sorts: &[Sort]) -> Result<()> {
        let fields = self.fields()?;
        let predicate = match filter {
            Some(filter) => predicate::compile(filter, &fields)?,
            None => None,
        };
        let order_by = predicate::order_by(sorts, &fields)?;
        tracing::debug!(
            clause = predicate.as_ref().map_or("", |predicate| predicate.clause.as_str()),
            order_by = %order_by,
            "view changed"
        );
        self.predicate = predicate;
        self.order_by = order_by;
        Ok(())
    }

    fn promote_field(&mut self, name: &str) -> Result<()> {
        if !is_field_name(name) {
            bail!("cannot promote {name:?}: field names must be letters, digits and underscores");
        }
        if self.fields()?.iter().any(|field| field.name == name) {
            return Ok(());
        }
        let column = quote_identifier(name);
        let index = quote_identifier(&format!("logs_{name}_idx"));
        let path = format!("$.\"{name}\"");

        let tx = self.conn.transaction().context("begin promote transaction")?;
        tx.execute(&format!("ALTER TABLE logs ADD COLUMN {column} TEXT"), [])
            .with_context(|| format!("add column {name}"))?;
        let filled = tx
            .execute(
                &format!(
                    "
                    UPDATE logs
                    SET {column} = (
                      SELECT CASE WHEN json_valid(raw) THEN json_extract(raw, ?) END
                      FROM logs_raw
                      WHERE logs_raw.id = logs.id
                    )
                    "
                ),
                params![path],
            )
            .with_context(|| format!("backfill column {name}"))?;
        tx.execute(&format!("CREATE INDEX IF NOT EXISTS {index} ON logs ({column})"), [])
            .with_context(|| format!("index column {name}"))?;
        tx.commit().context("commit promote")?;
        tracing::info!(field = name, rows = filled, "promoted field");
        Ok(())
    }
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn field_value(kind: FieldKind, value: ValueRef<'_>) -> FieldValue {
    match value {
        ValueRef::Null => FieldValue::Null,
        ValueRef::Integer(value) => FieldValue::Integer(value),
        ValueRef::Real(value) => FieldValue::Real(value),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            if kind == FieldKind::Timestamp
                && let Ok(parsed) = OffsetDateTime::parse(&text, &Rfc3339)
            {
                return FieldValue::Timestamp(parsed);
            }
            FieldValue::Text(text)
        }
        ValueRef::Blob(bytes) => FieldValue::Text(format!("<{} bytes>", bytes.len())),
    }
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")?;
    register_regexp(conn)
}

/// `regexp(pattern, text)`, backed by the `regex` crate. Compiled patterns
/// are cached per statement.
fn register_regexp(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let pattern = ctx.get_or_create_aux(0, |value| -> Result<Regex, BoxError> {
                Ok(Regex::new(value.as_str()?)?)
            })?;
            let matched = match ctx.get_raw(1) {
                ValueRef::Null | ValueRef::Blob(_) => false,
                ValueRef::Text(bytes) => pattern.is_match(&String::from_utf8_lossy(bytes)),
                ValueRef::Integer(value) => pattern.is_match(&value.to_string()),
                ValueRef::Real(value) => pattern.is_match(&value.to_string()),
            };
            Ok(matched)
        },
    )
    .context("register regexp function")
}
