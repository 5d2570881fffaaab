//! SQLite-backed curation snapshot.
//!
//! Snapshot layout (three tables plus metadata):
//!
//! - `instance(db_id, class, display_name)` — one row per instance.
//! - `attribute_value(db_id, attribute, rank, value_type, value, ref_id)` —
//!   slot values in rank order; `value_type` is one of `S`/`I`/`F`/`B`/`R`.
//! - `schema_attribute(class, attribute, category)` — declared attributes
//!   per concrete class; `category` is the numeric curation category and
//!   may be NULL for uncategorized attributes.
//! - `metadata(key, value)` — snapshot-level facts (`release_number`).
//!
//! Attribute rows are inflated per instance on first access and held in an
//! interior cache until the walk releases them with `deflate`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::SourceError;
use crate::model::ModelRegistry;

use super::{AttributeCategory, AttributeValue, DbId, SourceObject, SourceStore};

/// Read adapter over a snapshot database.
#[derive(Debug)]
pub struct SqliteSource {
    conn: Connection,
    model: Arc<ModelRegistry>,
    cache: RefCell<HashMap<DbId, HashMap<String, Vec<AttributeValue>>>>,
}

impl SqliteSource {
    /// Open an existing snapshot file.
    pub fn open(path: &Path, model: Arc<ModelRegistry>) -> Result<Self, SourceError> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            model,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// Fresh in-memory snapshot with the schema applied. Used by tests and
    /// snapshot builders.
    pub fn in_memory(model: Arc<ModelRegistry>) -> Result<Self, SourceError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE instance (
                 db_id        INTEGER PRIMARY KEY,
                 class        TEXT NOT NULL,
                 display_name TEXT
             );
             CREATE TABLE attribute_value (
                 db_id      INTEGER NOT NULL,
                 attribute  TEXT NOT NULL,
                 rank       INTEGER NOT NULL,
                 value_type TEXT NOT NULL,
                 value      TEXT,
                 ref_id     INTEGER
             );
             CREATE INDEX idx_attribute_value_owner ON attribute_value (db_id, attribute, rank);
             CREATE INDEX idx_attribute_value_ref ON attribute_value (ref_id, attribute);
             CREATE TABLE schema_attribute (
                 class     TEXT NOT NULL,
                 attribute TEXT NOT NULL,
                 category  INTEGER,
                 PRIMARY KEY (class, attribute)
             );
             CREATE TABLE metadata (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );",
        )?;
        Ok(Self {
            conn,
            model,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// Insert an instance row. Snapshot-builder API.
    pub fn insert_instance(
        &self,
        id: DbId,
        class: &str,
        display_name: Option<&str>,
    ) -> Result<(), SourceError> {
        self.conn.execute(
            "INSERT INTO instance (db_id, class, display_name) VALUES (?1, ?2, ?3)",
            params![id.0, class, display_name],
        )?;
        Ok(())
    }

    /// Append a slot value for `(id, attribute)`; rank is the insertion index.
    pub fn insert_value(
        &self,
        id: DbId,
        attribute: &str,
        value: &AttributeValue,
    ) -> Result<(), SourceError> {
        let rank: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM attribute_value WHERE db_id = ?1 AND attribute = ?2",
            params![id.0, attribute],
            |row| row.get(0),
        )?;
        let (value_type, text, ref_id) = encode(value);
        self.conn.execute(
            "INSERT INTO attribute_value (db_id, attribute, rank, value_type, value, ref_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id.0, attribute, rank, value_type, text, ref_id],
        )?;
        Ok(())
    }

    /// Declare a schema attribute with an optional category code.
    pub fn declare_attribute(
        &self,
        class: &str,
        attribute: &str,
        category: Option<AttributeCategory>,
    ) -> Result<(), SourceError> {
        let code = category.map(|c| match c {
            AttributeCategory::Mandatory => 1,
            AttributeCategory::Required => 2,
            AttributeCategory::Optional => 3,
            AttributeCategory::NoManualEdit => 4,
        });
        self.conn.execute(
            "INSERT OR REPLACE INTO schema_attribute (class, attribute, category) VALUES (?1, ?2, ?3)",
            params![class, attribute, code],
        )?;
        Ok(())
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<(), SourceError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn inflate(&self, id: DbId) -> Result<(), SourceError> {
        if self.cache.borrow().contains_key(&id) {
            return Ok(());
        }
        let mut stmt = self.conn.prepare_cached(
            "SELECT attribute, value_type, value, ref_id FROM attribute_value
             WHERE db_id = ?1 ORDER BY attribute, rank",
        )?;
        let mut slots: HashMap<String, Vec<AttributeValue>> = HashMap::new();
        let mut rows = stmt.query(params![id.0])?;
        while let Some(row) = rows.next()? {
            let attribute: String = row.get(0)?;
            let value_type: String = row.get(1)?;
            let text: Option<String> = row.get(2)?;
            let ref_id: Option<i64> = row.get(3)?;
            slots
                .entry(attribute)
                .or_default()
                .push(decode(id, &value_type, text, ref_id)?);
        }
        self.cache.borrow_mut().insert(id, slots);
        Ok(())
    }

    /// Walk `class` and its ancestors, returning the first schema row hit.
    fn schema_row(&self, class: &str, attribute: &str) -> Result<Option<Option<i64>>, SourceError> {
        let mut current = Some(ModelRegistry::normalize(class).to_string());
        while let Some(name) = current {
            let row: Option<Option<i64>> = self
                .conn
                .query_row(
                    "SELECT category FROM schema_attribute WHERE class = ?1 AND attribute = ?2",
                    params![name, attribute],
                    |row| row.get(0),
                )
                .optional()?;
            if row.is_some() {
                return Ok(row);
            }
            current = self.model.get(&name).and_then(|t| t.parent.clone());
        }
        Ok(None)
    }
}

impl SourceStore for SqliteSource {
    fn fetch_by_class(&self, class: &str) -> Result<Vec<SourceObject>, SourceError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT db_id, class, display_name FROM instance ORDER BY db_id")?;
        let rows = stmt.query_map([], |row| {
            Ok(SourceObject {
                db_id: DbId(row.get(0)?),
                class: row.get(1)?,
                display_name: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            let object = row?;
            if self.model.is_a(&object.class, class) {
                out.push(object);
            }
        }
        Ok(out)
    }

    fn fetch_instance(&self, id: DbId) -> Result<Option<SourceObject>, SourceError> {
        let row = self
            .conn
            .query_row(
                "SELECT db_id, class, display_name FROM instance WHERE db_id = ?1",
                params![id.0],
                |row| {
                    Ok(SourceObject {
                        db_id: DbId(row.get(0)?),
                        class: row.get(1)?,
                        display_name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn values(&self, id: DbId, attribute: &str) -> Result<Vec<AttributeValue>, SourceError> {
        self.inflate(id)?;
        Ok(self
            .cache
            .borrow()
            .get(&id)
            .and_then(|slots| slots.get(attribute))
            .cloned()
            .unwrap_or_default())
    }

    fn referrers(&self, id: DbId, attribute: &str) -> Result<Vec<SourceObject>, SourceError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT DISTINCT i.db_id, i.class, i.display_name
             FROM attribute_value av JOIN instance i ON i.db_id = av.db_id
             WHERE av.ref_id = ?1 AND av.attribute = ?2
             ORDER BY i.db_id",
        )?;
        let rows = stmt.query_map(params![id.0, attribute], |row| {
            Ok(SourceObject {
                db_id: DbId(row.get(0)?),
                class: row.get(1)?,
                display_name: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn attribute_category(
        &self,
        class: &str,
        attribute: &str,
    ) -> Result<Option<AttributeCategory>, SourceError> {
        match self.schema_row(class, attribute)? {
            Some(Some(code)) => Ok(AttributeCategory::from_code(code)),
            _ => Ok(None),
        }
    }

    fn is_valid_attribute(&self, class: &str, attribute: &str) -> bool {
        matches!(self.schema_row(class, attribute), Ok(Some(_)))
    }

    fn instance_count(&self, class: &str) -> Result<u64, SourceError> {
        Ok(self.fetch_by_class(class)?.len() as u64)
    }

    fn max_db_id(&self) -> Result<DbId, SourceError> {
        let max: i64 = self
            .conn
            .query_row("SELECT COALESCE(MAX(db_id), 0) FROM instance", [], |row| row.get(0))?;
        Ok(DbId(max))
    }

    fn deflate(&self, id: DbId) {
        self.cache.borrow_mut().remove(&id);
    }

    fn checksum(&self) -> Result<i64, SourceError> {
        let mut stmt = self
            .conn
            .prepare("SELECT db_id, class, display_name FROM instance ORDER BY db_id")?;
        let mut rows = stmt.query([])?;
        let mut sum: i64 = 0;
        while let Some(row) = rows.next()? {
            let db_id: i64 = row.get(0)?;
            let class: String = row.get(1)?;
            let display_name: Option<String> = row.get(2)?;
            let mut h = fnv(&class) ^ fnv(display_name.as_deref().unwrap_or(""));
            h = h.wrapping_mul(31).wrapping_add(db_id);
            sum = sum.wrapping_add(h);
        }
        Ok(sum)
    }

    fn release_number(&self) -> Result<Option<i64>, SourceError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'release_number'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        match value {
            Some(text) => text
                .parse()
                .map(Some)
                .map_err(|_| SourceError::Malformed(format!("release_number: {text}"))),
            None => Ok(None),
        }
    }
}

fn encode(value: &AttributeValue) -> (&'static str, Option<String>, Option<i64>) {
    match value {
        AttributeValue::Str(s) => ("S", Some(s.clone()), None),
        AttributeValue::Int(i) => ("I", Some(i.to_string()), None),
        AttributeValue::Float(x) => ("F", Some(x.to_string()), None),
        AttributeValue::Bool(b) => ("B", Some(b.to_string()), None),
        AttributeValue::Ref(id) => ("R", None, Some(id.0)),
    }
}

fn decode(
    owner: DbId,
    value_type: &str,
    text: Option<String>,
    ref_id: Option<i64>,
) -> Result<AttributeValue, SourceError> {
    let malformed = |detail: &str| SourceError::Malformed(format!("instance {owner}: {detail}"));
    match value_type {
        "S" => Ok(AttributeValue::Str(text.unwrap_or_default())),
        "I" => {
            let text = text.ok_or_else(|| malformed("integer slot without value"))?;
            text.parse()
                .map(AttributeValue::Int)
                .map_err(|_| malformed(&format!("bad integer {text:?}")))
        }
        "F" => {
            let text = text.ok_or_else(|| malformed("float slot without value"))?;
            text.parse()
                .map(AttributeValue::Float)
                .map_err(|_| malformed(&format!("bad float {text:?}")))
        }
        "B" => {
            let text = text.ok_or_else(|| malformed("boolean slot without value"))?;
            match text.as_str() {
                "true" | "1" => Ok(AttributeValue::Bool(true)),
                "false" | "0" => Ok(AttributeValue::Bool(false)),
                other => Err(malformed(&format!("bad boolean {other:?}"))),
            }
        }
        "R" => ref_id
            .map(|id| AttributeValue::Ref(DbId(id)))
            .ok_or_else(|| malformed("reference slot without target")),
        other => Err(malformed(&format!("unknown value type {other:?}"))),
    }
}

fn fnv(text: &str) -> i64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    // Fold into i64 without losing bits we care about.
    i64::from_ne_bytes(hash.to_ne_bytes())
}
