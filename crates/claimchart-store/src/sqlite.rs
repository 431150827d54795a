//! SQLite-backed chart repository

use crate::StoreError;
use claimchart_domain::traits::ChartRepository;
use claimchart_domain::{
    Chart, ChartId, ChartSummary, ChatMessage, ClaimElement, Confidence, ElementVersion, FlagSet,
    ReferenceDocument,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

/// SQLite-based implementation of ChartRepository
///
/// Scalar element fields live in columns; flags, versions and chat history
/// are stored as JSON text.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store behind a mutex.
pub struct SqliteStore {
    conn: Option<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn: Some(conn) };
        store.init()?;
        Ok(store)
    }

    fn conn(&self) -> Result<&Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::Closed)
    }

    fn conn_mut(&mut self) -> Result<&mut Connection, StoreError> {
        self.conn.as_mut().ok_or(StoreError::Closed)
    }

    /// Convert ChartId to bytes for storage
    fn chart_id_to_bytes(id: ChartId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    /// Convert bytes to ChartId
    fn bytes_to_chart_id(bytes: &[u8]) -> Result<ChartId, StoreError> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| {
            StoreError::InvalidData(format!(
                "Expected 16 bytes for ChartId, got {}",
                bytes.len()
            ))
        })?;
        Ok(ChartId::from_value(u128::from_be_bytes(arr)))
    }

    fn conversion_error(
        column: usize,
        kind: rusqlite::types::Type,
        e: impl std::error::Error + Send + Sync + 'static,
    ) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(column, kind, Box::new(e))
    }

    fn element_from_row(row: &Row<'_>) -> rusqlite::Result<ClaimElement> {
        use rusqlite::types::Type;

        let confidence: i64 = row.get(4)?;
        let confidence = Confidence::try_from(confidence)
            .map_err(|e| Self::conversion_error(4, Type::Integer, StoreError::InvalidData(e)))?;

        let flags: String = row.get(5)?;
        let flags: FlagSet = serde_json::from_str(&flags)
            .map_err(|e| Self::conversion_error(5, Type::Text, e))?;

        let versions: String = row.get(6)?;
        let versions: Vec<ElementVersion> = serde_json::from_str(&versions)
            .map_err(|e| Self::conversion_error(6, Type::Text, e))?;

        let chat_history: String = row.get(7)?;
        let chat_history: Vec<ChatMessage> = serde_json::from_str(&chat_history)
            .map_err(|e| Self::conversion_error(7, Type::Text, e))?;

        Ok(ClaimElement {
            id: row.get(0)?,
            element_text: row.get(1)?,
            evidence_text: row.get(2)?,
            reasoning_text: row.get(3)?,
            confidence,
            flags,
            versions,
            chat_history,
        })
    }

    fn load_elements(conn: &Connection, id_bytes: &[u8]) -> Result<Vec<ClaimElement>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT element_id, element_text, evidence_text, reasoning_text, confidence,
                    flags, versions, chat_history
             FROM elements WHERE chart_id = ?1 ORDER BY position",
        )?;
        let elements = stmt
            .query_map(params![id_bytes], Self::element_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(elements)
    }

    fn write_element(
        tx: &rusqlite::Transaction<'_>,
        id_bytes: &[u8],
        position: usize,
        element: &ClaimElement,
    ) -> Result<(), StoreError> {
        tx.execute(
            "INSERT INTO elements (chart_id, element_id, position, element_text, evidence_text,
                                   reasoning_text, confidence, flags, versions, chat_history)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id_bytes,
                &element.id,
                position as i64,
                &element.element_text,
                &element.evidence_text,
                &element.reasoning_text,
                element.confidence.value() as i64,
                serde_json::to_string(&element.flags)?,
                serde_json::to_string(&element.versions)?,
                serde_json::to_string(&element.chat_history)?,
            ],
        )?;
        Ok(())
    }
}

impl ChartRepository for SqliteStore {
    type Error = StoreError;

    fn init(&mut self) -> Result<(), Self::Error> {
        let schema = include_str!("schema.sql");
        let conn = self.conn()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(schema)?;
        Ok(())
    }

    fn save_chart(&mut self, chart: &Chart) -> Result<(), Self::Error> {
        let id_bytes = Self::chart_id_to_bytes(chart.id);
        let documents = serde_json::to_string(&chart.reference_documents)?;

        let tx = self.conn_mut()?.transaction()?;
        tx.execute(
            "INSERT INTO charts (id, title, reference_documents, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             reference_documents = excluded.reference_documents,
             updated_at = excluded.updated_at",
            params![
                &id_bytes,
                &chart.title,
                &documents,
                chart.created_at as i64,
                chart.updated_at as i64,
            ],
        )?;
        tx.execute("DELETE FROM elements WHERE chart_id = ?1", params![&id_bytes])?;
        for (position, element) in chart.elements.iter().enumerate() {
            Self::write_element(&tx, &id_bytes, position, element)?;
        }
        tx.commit()?;

        debug!("Saved chart {} ({} elements)", chart.id, chart.elements.len());
        Ok(())
    }

    fn get_chart(&self, id: ChartId) -> Result<Option<Chart>, Self::Error> {
        let id_bytes = Self::chart_id_to_bytes(id);
        let conn = self.conn()?;

        let header = conn
            .query_row(
                "SELECT title, reference_documents, created_at, updated_at
                 FROM charts WHERE id = ?1",
                params![&id_bytes],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((title, documents, created_at, updated_at)) = header else {
            return Ok(None);
        };

        let reference_documents: Vec<ReferenceDocument> = serde_json::from_str(&documents)?;
        let elements = Self::load_elements(conn, &id_bytes)?;

        Ok(Some(Chart {
            id,
            title,
            elements,
            reference_documents,
            created_at: created_at as u64,
            updated_at: updated_at as u64,
        }))
    }

    fn list_charts(&self) -> Result<Vec<ChartSummary>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.title, c.updated_at,
                    (SELECT COUNT(*) FROM elements e WHERE e.chart_id = c.id)
             FROM charts c ORDER BY c.created_at, c.id",
        )?;

        let summaries = stmt
            .query_map([], |row| {
                let id_bytes: Vec<u8> = row.get(0)?;
                let id = Self::bytes_to_chart_id(&id_bytes).map_err(|e| {
                    Self::conversion_error(0, rusqlite::types::Type::Blob, e)
                })?;
                Ok(ChartSummary {
                    id,
                    title: row.get(1)?,
                    updated_at: row.get::<_, i64>(2)? as u64,
                    element_count: row.get::<_, i64>(3)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(summaries)
    }

    fn delete_chart(&mut self, id: ChartId) -> Result<bool, Self::Error> {
        let id_bytes = Self::chart_id_to_bytes(id);
        let tx = self.conn_mut()?.transaction()?;
        tx.execute("DELETE FROM elements WHERE chart_id = ?1", params![&id_bytes])?;
        let removed = tx.execute("DELETE FROM charts WHERE id = ?1", params![&id_bytes])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn replace_element(
        &mut self,
        chart_id: ChartId,
        element: ClaimElement,
        now: u64,
    ) -> Result<Option<Chart>, Self::Error> {
        let id_bytes = Self::chart_id_to_bytes(chart_id);

        let tx = self.conn_mut()?.transaction()?;
        let updated = tx.execute(
            "UPDATE elements SET element_text = ?3, evidence_text = ?4, reasoning_text = ?5,
                                 confidence = ?6, flags = ?7, versions = ?8, chat_history = ?9
             WHERE chart_id = ?1 AND element_id = ?2",
            params![
                &id_bytes,
                &element.id,
                &element.element_text,
                &element.evidence_text,
                &element.reasoning_text,
                element.confidence.value() as i64,
                serde_json::to_string(&element.flags)?,
                serde_json::to_string(&element.versions)?,
                serde_json::to_string(&element.chat_history)?,
            ],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        tx.execute(
            "UPDATE charts SET updated_at = ?2 WHERE id = ?1",
            params![&id_bytes, now as i64],
        )?;
        tx.commit()?;

        self.get_chart(chart_id)
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| StoreError::Database(e))?;
        }
        Ok(())
    }
}
