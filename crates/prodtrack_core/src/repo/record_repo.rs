//! Record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over canonical record storage.
//! - Implement optimistic concurrency so the pure engine can stay outside
//!   the read-modify-write race.
//!
//! # Invariants
//! - Write paths must call `ProjectRecord::validate()` before SQL mutations.
//! - `update_record` commits only when the stored version matches the one
//!   the caller read; a mismatch is a `Conflict`, never a silent overwrite.
//! - Read paths reject invalid persisted state instead of masking it;
//!   `scan_records` is the one lossy entry point and it counts what it
//!   skips.

use crate::db::DbError;
use crate::model::record::{
    CategoryState, ProjectRecord, RecordId, RecordStatus, RecordValidationError,
};
use log::warn;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const RECORD_SELECT_SQL: &str = "SELECT
    uuid,
    project_number,
    plaza,
    owner,
    phase,
    status,
    finalized_at,
    finalized_automatically,
    version
FROM records";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecordValidationError),
    Db(DbError),
    NotFound(RecordId),
    /// Compare-and-set failed: someone else committed between our read and
    /// this write. The caller re-reads and retries.
    Conflict {
        id: RecordId,
        expected_version: i64,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Conflict {
                id,
                expected_version,
            } => write!(
                f,
                "concurrent update on record {id}: stored version moved past {expected_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Record plus the storage version it was read at.
///
/// The version travels with the record through the engine and back into
/// `update_record`, closing the lost-update window.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedRecord {
    pub record: ProjectRecord,
    pub version: i64,
}

/// Query options for listing records.
#[derive(Debug, Clone, Default)]
pub struct RecordListQuery {
    pub status: Option<RecordStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Lossy full-fleet read used by reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordScan {
    pub records: Vec<ProjectRecord>,
    /// Rows that failed to decode and were skipped (and logged).
    pub skipped: usize,
}

/// Repository interface for record operations.
pub trait RecordRepository {
    fn create_record(&self, record: &ProjectRecord) -> RepoResult<RecordId>;
    fn get_record(&self, id: RecordId) -> RepoResult<Option<VersionedRecord>>;
    fn update_record(&self, record: &ProjectRecord, expected_version: i64) -> RepoResult<i64>;
    fn list_records(&self, query: &RecordListQuery) -> RepoResult<Vec<ProjectRecord>>;
    fn scan_records(&self) -> RepoResult<RecordScan>;
}

/// SQLite-backed record repository.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_categories(&self, id: RecordId) -> RepoResult<BTreeMap<String, CategoryState>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, completed, notes, updated_by, updated_at
             FROM record_categories
             WHERE record_uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut categories = BTreeMap::new();

        while let Some(row) = rows.next()? {
            let category: String = row.get("category")?;
            let state = CategoryState {
                completed: int_to_bool(row.get("completed")?, "record_categories.completed")?,
                notes: row.get("notes")?,
                updated_by: row.get("updated_by")?,
                updated_at: row.get("updated_at")?,
            };
            categories.insert(category, state);
        }

        Ok(categories)
    }

    fn load_points(&self, id: RecordId) -> RepoResult<BTreeMap<String, u32>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, quantity FROM record_points WHERE record_uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut points = BTreeMap::new();

        while let Some(row) = rows.next()? {
            points.insert(row.get::<_, String>("kind")?, row.get::<_, u32>("quantity")?);
        }

        Ok(points)
    }

    fn assemble(&self, row: &Row<'_>) -> RepoResult<VersionedRecord> {
        let (mut record, version) = parse_record_row(row)?;
        record.categories = self.load_categories(record.uuid)?;
        record.points = self.load_points(record.uuid)?;
        record.validate()?;
        Ok(VersionedRecord { record, version })
    }

    fn write_children(&self, tx: &Transaction<'_>, record: &ProjectRecord) -> RepoResult<()> {
        let uuid = record.uuid.to_string();
        tx.execute(
            "DELETE FROM record_categories WHERE record_uuid = ?1;",
            [uuid.as_str()],
        )?;
        tx.execute(
            "DELETE FROM record_points WHERE record_uuid = ?1;",
            [uuid.as_str()],
        )?;

        for (category, state) in &record.categories {
            tx.execute(
                "INSERT INTO record_categories (
                    record_uuid, category, completed, notes, updated_by, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    uuid.as_str(),
                    category.as_str(),
                    bool_to_int(state.completed),
                    state.notes.as_str(),
                    state.updated_by.as_str(),
                    state.updated_at,
                ],
            )?;
        }

        for (kind, quantity) in &record.points {
            tx.execute(
                "INSERT INTO record_points (record_uuid, kind, quantity)
                 VALUES (?1, ?2, ?3);",
                params![uuid.as_str(), kind.as_str(), quantity],
            )?;
        }

        Ok(())
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn create_record(&self, record: &ProjectRecord) -> RepoResult<RecordId> {
        record.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO records (
                uuid,
                project_number,
                plaza,
                owner,
                phase,
                status,
                finalized_at,
                finalized_automatically,
                version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0);",
            params![
                record.uuid.to_string(),
                record.project_number.as_str(),
                record.plaza.as_str(),
                record.owner.as_str(),
                record.phase.as_deref(),
                status_to_db(record.status),
                record.finalized_at,
                bool_to_int(record.finalized_automatically),
            ],
        )?;
        self.write_children(&tx, record)?;
        tx.commit()?;

        Ok(record.uuid)
    }

    fn get_record(&self, id: RecordId) -> RepoResult<Option<VersionedRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            return Ok(Some(self.assemble(row)?));
        }

        Ok(None)
    }

    fn update_record(&self, record: &ProjectRecord, expected_version: i64) -> RepoResult<i64> {
        record.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE records
             SET
                project_number = ?1,
                plaza = ?2,
                owner = ?3,
                phase = ?4,
                status = ?5,
                finalized_at = ?6,
                finalized_automatically = ?7,
                version = version + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?8 AND version = ?9;",
            params![
                record.project_number.as_str(),
                record.plaza.as_str(),
                record.owner.as_str(),
                record.phase.as_deref(),
                status_to_db(record.status),
                record.finalized_at,
                bool_to_int(record.finalized_automatically),
                record.uuid.to_string(),
                expected_version,
            ],
        )?;

        if changed == 0 {
            let exists: i64 = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM records WHERE uuid = ?1);",
                [record.uuid.to_string()],
                |row| row.get(0),
            )?;
            return Err(if exists == 1 {
                RepoError::Conflict {
                    id: record.uuid,
                    expected_version,
                }
            } else {
                RepoError::NotFound(record.uuid)
            });
        }

        self.write_children(&tx, record)?;
        tx.commit()?;

        Ok(expected_version + 1)
    }

    fn list_records(&self, query: &RecordListQuery) -> RepoResult<Vec<ProjectRecord>> {
        let mut sql = format!("{RECORD_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status_to_db(status).to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(self.assemble(row)?.record);
        }

        Ok(records)
    }

    fn scan_records(&self) -> RepoResult<RecordScan> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} ORDER BY uuid ASC;"))?;
        let mut rows = stmt.query([])?;

        let mut records = Vec::new();
        let mut skipped = 0usize;

        while let Some(row) = rows.next()? {
            match self.assemble(row) {
                Ok(versioned) => records.push(versioned.record),
                Err(RepoError::InvalidData(message)) => {
                    skipped += 1;
                    warn!(
                        "event=record_skipped module=repo status=warn reason=invalid_data detail={message}"
                    );
                }
                Err(RepoError::Validation(err)) => {
                    skipped += 1;
                    warn!(
                        "event=record_skipped module=repo status=warn reason=validation detail={err}"
                    );
                }
                Err(other) => return Err(other),
            }
        }

        Ok(RecordScan { records, skipped })
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<(ProjectRecord, i64)> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in records.uuid"))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status value `{status_text}` in records.status"
        ))
    })?;

    let record = ProjectRecord {
        uuid,
        project_number: row.get("project_number")?,
        plaza: row.get("plaza")?,
        owner: row.get("owner")?,
        phase: row.get("phase")?,
        categories: BTreeMap::new(),
        points: BTreeMap::new(),
        status,
        finalized_at: row.get("finalized_at")?,
        finalized_automatically: int_to_bool(
            row.get("finalized_automatically")?,
            "records.finalized_automatically",
        )?,
    };
    let version: i64 = row.get("version")?;

    Ok((record, version))
}

fn status_to_db(status: RecordStatus) -> &'static str {
    match status {
        RecordStatus::InProgress => "in_progress",
        RecordStatus::Finalized => "finalized",
    }
}

fn parse_status(value: &str) -> Option<RecordStatus> {
    match value {
        "in_progress" => Some(RecordStatus::InProgress),
        "finalized" => Some(RecordStatus::Finalized),
        _ => None,
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
