//! SQLite registry for bots, documents, and embedding records
//!
//! One database holds all three tables. Vectors and id lists are stored as
//! JSON columns; the document status column doubles as the durable job
//! record for the startup recovery scan.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Bot, Document, DocumentStatus, EmbeddingRecord, FileType, RecordMetadata};

/// SQLite-backed registry
pub struct RegistryDb {
    conn: Arc<Mutex<Connection>>,
}

impl RegistryDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Storage(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
        "#,
        )
        .map_err(|e| Error::Storage(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS bots (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                prompt_template TEXT NOT NULL,
                temperature REAL NOT NULL,
                max_tokens INTEGER NOT NULL,
                model TEXT NOT NULL,
                embedding_ids TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                bot_id TEXT NOT NULL,
                file_name TEXT NOT NULL,
                file_type TEXT NOT NULL,
                content TEXT NOT NULL,
                status TEXT NOT NULL,
                embedding_ids TEXT NOT NULL DEFAULT '[]',
                error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_bot_id ON documents(bot_id);
            CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);

            CREATE TABLE IF NOT EXISTS embeddings (
                id TEXT PRIMARY KEY,
                bot_id TEXT NOT NULL,
                document_id TEXT NOT NULL,
                text TEXT NOT NULL,
                embedding TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                source TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_embeddings_bot_id ON embeddings(bot_id);
            CREATE INDEX IF NOT EXISTS idx_embeddings_document_id ON embeddings(document_id);
        "#,
        )
        .map_err(|e| Error::Storage(format!("Failed to run migrations: {}", e)))?;

        tracing::debug!("Registry migrations complete");
        Ok(())
    }

    // ==================== Bot Operations ====================

    /// Insert a bot
    pub fn create_bot(&self, bot: &Bot) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO bots (id, name, prompt_template, temperature, max_tokens, model, embedding_ids, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                bot.id.to_string(),
                bot.name,
                bot.prompt_template,
                bot.temperature as f64,
                bot.max_tokens as i64,
                bot.model,
                serde_json::to_string(&bot.embedding_ids)?,
                bot.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Storage(format!("Failed to insert bot: {}", e)))?;

        Ok(())
    }

    /// Get a bot by id
    pub fn get_bot(&self, id: &Uuid) -> Result<Option<Bot>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT * FROM bots WHERE id = ?1")
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let bot = stmt
            .query_row(params![id.to_string()], row_to_bot)
            .optional()
            .map_err(|e| Error::Storage(format!("Failed to get bot: {}", e)))?;

        Ok(bot)
    }

    /// Append embedding ids to a bot's aggregate collection
    pub fn add_bot_embeddings(&self, bot_id: &Uuid, ids: &[Uuid]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut bot = self
            .get_bot(bot_id)?
            .ok_or_else(|| Error::NotFound(format!("Bot {}", bot_id)))?;
        bot.embedding_ids.extend_from_slice(ids);

        let conn = self.conn.lock();
        conn.execute(
            "UPDATE bots SET embedding_ids = ?1 WHERE id = ?2",
            params![serde_json::to_string(&bot.embedding_ids)?, bot_id.to_string()],
        )
        .map_err(|e| Error::Storage(format!("Failed to update bot embeddings: {}", e)))?;

        Ok(())
    }

    /// Detach embedding ids from a bot's aggregate collection
    pub fn remove_bot_embeddings(&self, bot_id: &Uuid, ids: &[Uuid]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let Some(mut bot) = self.get_bot(bot_id)? else {
            // Bot already gone; nothing to detach from
            return Ok(());
        };
        bot.embedding_ids.retain(|id| !ids.contains(id));

        let conn = self.conn.lock();
        conn.execute(
            "UPDATE bots SET embedding_ids = ?1 WHERE id = ?2",
            params![serde_json::to_string(&bot.embedding_ids)?, bot_id.to_string()],
        )
        .map_err(|e| Error::Storage(format!("Failed to update bot embeddings: {}", e)))?;

        Ok(())
    }

    // ==================== Document Operations ====================

    /// Insert a document
    pub fn create_document(&self, doc: &Document) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO documents (id, bot_id, file_name, file_type, content, status, embedding_ids, error, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                doc.id.to_string(),
                doc.bot_id.to_string(),
                doc.file_name,
                doc.file_type.as_str(),
                doc.content,
                doc.status.as_str(),
                serde_json::to_string(&doc.embedding_ids)?,
                doc.error,
                doc.created_at.to_rfc3339(),
                doc.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Storage(format!("Failed to insert document: {}", e)))?;

        Ok(())
    }

    /// Get a document by id
    pub fn get_document(&self, id: &Uuid) -> Result<Option<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT * FROM documents WHERE id = ?1")
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let doc = stmt
            .query_row(params![id.to_string()], row_to_document)
            .optional()
            .map_err(|e| Error::Storage(format!("Failed to get document: {}", e)))?;

        Ok(doc)
    }

    /// List a bot's documents, newest first
    pub fn list_documents_by_bot(&self, bot_id: &Uuid) -> Result<Vec<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT * FROM documents WHERE bot_id = ?1 ORDER BY created_at DESC")
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let docs = stmt
            .query_map(params![bot_id.to_string()], row_to_document)
            .map_err(|e| Error::Storage(format!("Failed to list documents: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(docs)
    }

    /// List documents in states the recovery scan re-enqueues
    pub fn list_documents_needing_processing(&self) -> Result<Vec<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT * FROM documents WHERE status IN ('pending', 'processing') ORDER BY created_at ASC",
            )
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let docs = stmt
            .query_map([], row_to_document)
            .map_err(|e| Error::Storage(format!("Failed to list documents: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(docs)
    }

    /// Transition a document's status, replacing its error message
    pub fn update_document_status(
        &self,
        id: &Uuid,
        status: DocumentStatus,
        error: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock();

        let updated = conn
            .execute(
                "UPDATE documents SET status = ?1, error = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    status.as_str(),
                    error,
                    Utc::now().to_rfc3339(),
                    id.to_string()
                ],
            )
            .map_err(|e| Error::Storage(format!("Failed to update document status: {}", e)))?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Document {}", id)));
        }

        Ok(())
    }

    /// Mark a document completed and attach its full ordered id list in one
    /// update
    pub fn complete_document(&self, id: &Uuid, embedding_ids: &[Uuid]) -> Result<()> {
        let conn = self.conn.lock();

        let updated = conn
            .execute(
                r#"
                UPDATE documents
                SET status = 'completed', embedding_ids = ?1, error = NULL, updated_at = ?2
                WHERE id = ?3
                "#,
                params![
                    serde_json::to_string(&embedding_ids)?,
                    Utc::now().to_rfc3339(),
                    id.to_string()
                ],
            )
            .map_err(|e| Error::Storage(format!("Failed to complete document: {}", e)))?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Document {}", id)));
        }

        Ok(())
    }

    /// Delete a document row. Returns the removed document, or None when it
    /// was already gone.
    pub fn delete_document(&self, id: &Uuid) -> Result<Option<Document>> {
        let existing = self.get_document(id)?;

        if existing.is_some() {
            let conn = self.conn.lock();
            conn.execute(
                "DELETE FROM documents WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(|e| Error::Storage(format!("Failed to delete document: {}", e)))?;
        }

        Ok(existing)
    }

    // ==================== Embedding Operations ====================

    /// Insert embedding records, returning their ids in input order.
    ///
    /// Inserts row by row with no enclosing transaction; the document status
    /// field, not record presence, is the source of truth for whether an
    /// ingestion completed.
    pub fn insert_embeddings(&self, records: &[EmbeddingRecord]) -> Result<Vec<Uuid>> {
        let conn = self.conn.lock();
        let mut ids = Vec::with_capacity(records.len());

        for record in records {
            conn.execute(
                r#"
                INSERT INTO embeddings (id, bot_id, document_id, text, embedding, chunk_index, source, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    record.id.to_string(),
                    record.bot_id.to_string(),
                    record.document_id.to_string(),
                    record.text,
                    serde_json::to_string(&record.embedding)?,
                    record.metadata.chunk_index as i64,
                    record.metadata.source,
                    record.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::Storage(format!("Failed to insert embedding: {}", e)))?;

            ids.push(record.id);
        }

        Ok(ids)
    }

    /// Fetch up to `limit` of a bot's records in insertion order
    pub fn find_embeddings_by_bot(&self, bot_id: &Uuid, limit: usize) -> Result<Vec<EmbeddingRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT * FROM embeddings WHERE bot_id = ?1 ORDER BY rowid ASC LIMIT ?2")
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let records = stmt
            .query_map(params![bot_id.to_string(), limit as i64], row_to_record)
            .map_err(|e| Error::Storage(format!("Failed to query embeddings: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(records)
    }

    /// Delete records by id; already-missing ids are ignored
    pub fn delete_embeddings_by_ids(&self, ids: &[Uuid]) -> Result<usize> {
        let conn = self.conn.lock();
        let mut deleted = 0;

        for id in ids {
            deleted += conn
                .execute(
                    "DELETE FROM embeddings WHERE id = ?1",
                    params![id.to_string()],
                )
                .map_err(|e| Error::Storage(format!("Failed to delete embedding: {}", e)))?;
        }

        Ok(deleted)
    }

    /// Delete all records owned by a document
    pub fn delete_embeddings_by_document(&self, document_id: &Uuid) -> Result<usize> {
        let conn = self.conn.lock();

        let deleted = conn
            .execute(
                "DELETE FROM embeddings WHERE document_id = ?1",
                params![document_id.to_string()],
            )
            .map_err(|e| Error::Storage(format!("Failed to delete embeddings: {}", e)))?;

        Ok(deleted)
    }

    /// Count records owned by a document
    pub fn count_embeddings_by_document(&self, document_id: &Uuid) -> Result<usize> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM embeddings WHERE document_id = ?1",
                params![document_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| Error::Storage(format!("Failed to count embeddings: {}", e)))?;

        Ok(count as usize)
    }

    /// Total records stored
    pub fn count_embeddings(&self) -> Result<usize> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))
            .map_err(|e| Error::Storage(format!("Failed to count embeddings: {}", e)))?;

        Ok(count as usize)
    }
}

// ==================== Row Mapping ====================

fn parse_uuid(s: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_timestamp(s: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_json<T: serde::de::DeserializeOwned>(s: String) -> rusqlite::Result<T> {
    serde_json::from_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_bot(row: &Row<'_>) -> rusqlite::Result<Bot> {
    Ok(Bot {
        id: parse_uuid(row.get::<_, String>("id")?)?,
        name: row.get("name")?,
        prompt_template: row.get("prompt_template")?,
        temperature: row.get::<_, f64>("temperature")? as f32,
        max_tokens: row.get::<_, i64>("max_tokens")? as u32,
        model: row.get("model")?,
        embedding_ids: parse_json(row.get::<_, String>("embedding_ids")?)?,
        created_at: parse_timestamp(row.get::<_, String>("created_at")?)?,
    })
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    let file_type = FileType::parse(&row.get::<_, String>("file_type")?).unwrap_or(FileType::Txt);
    let status =
        DocumentStatus::parse(&row.get::<_, String>("status")?).unwrap_or(DocumentStatus::Failed);

    Ok(Document {
        id: parse_uuid(row.get::<_, String>("id")?)?,
        bot_id: parse_uuid(row.get::<_, String>("bot_id")?)?,
        file_name: row.get("file_name")?,
        file_type,
        content: row.get("content")?,
        status,
        embedding_ids: parse_json(row.get::<_, String>("embedding_ids")?)?,
        error: row.get("error")?,
        created_at: parse_timestamp(row.get::<_, String>("created_at")?)?,
        updated_at: parse_timestamp(row.get::<_, String>("updated_at")?)?,
    })
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<EmbeddingRecord> {
    Ok(EmbeddingRecord {
        id: parse_uuid(row.get::<_, String>("id")?)?,
        bot_id: parse_uuid(row.get::<_, String>("bot_id")?)?,
        document_id: parse_uuid(row.get::<_, String>("document_id")?)?,
        text: row.get("text")?,
        embedding: parse_json(row.get::<_, String>("embedding")?)?,
        metadata: RecordMetadata {
            chunk_index: row.get::<_, i64>("chunk_index")? as u32,
            source: row.get("source")?,
        },
        created_at: parse_timestamp(row.get::<_, String>("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_bot(db: &RegistryDb) -> Bot {
        let bot = Bot::new("support-bot".to_string());
        db.create_bot(&bot).unwrap();
        bot
    }

    fn seeded_document(db: &RegistryDb, bot_id: Uuid) -> Document {
        let doc = Document::new(
            bot_id,
            "faq.txt".to_string(),
            FileType::Txt,
            "refunds are processed within 5 business days".to_string(),
        );
        db.create_document(&doc).unwrap();
        doc
    }

    fn records_for(doc: &Document, count: usize) -> Vec<EmbeddingRecord> {
        (0..count)
            .map(|i| {
                EmbeddingRecord::new(
                    doc.bot_id,
                    doc.id,
                    format!("chunk {}", i),
                    vec![i as f32, 1.0, 0.0],
                    i as u32,
                    doc.file_name.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn bot_round_trip() {
        let db = RegistryDb::in_memory().unwrap();
        let bot = seeded_bot(&db);

        let fetched = db.get_bot(&bot.id).unwrap().unwrap();
        assert_eq!(fetched.name, "support-bot");
        assert_eq!(fetched.temperature, 0.7);
        assert_eq!(fetched.model, "gpt-3.5-turbo");
        assert!(fetched.embedding_ids.is_empty());
    }

    #[test]
    fn document_status_transitions() {
        let db = RegistryDb::in_memory().unwrap();
        let bot = seeded_bot(&db);
        let doc = seeded_document(&db, bot.id);

        assert_eq!(doc.status, DocumentStatus::Pending);

        db.update_document_status(&doc.id, DocumentStatus::Processing, None)
            .unwrap();
        let fetched = db.get_document(&doc.id).unwrap().unwrap();
        assert_eq!(fetched.status, DocumentStatus::Processing);

        db.update_document_status(&doc.id, DocumentStatus::Failed, Some("embedding timeout"))
            .unwrap();
        let fetched = db.get_document(&doc.id).unwrap().unwrap();
        assert_eq!(fetched.status, DocumentStatus::Failed);
        assert_eq!(fetched.error.as_deref(), Some("embedding timeout"));
    }

    #[test]
    fn insert_returns_ids_in_input_order() {
        let db = RegistryDb::in_memory().unwrap();
        let bot = seeded_bot(&db);
        let doc = seeded_document(&db, bot.id);

        let records = records_for(&doc, 4);
        let expected: Vec<Uuid> = records.iter().map(|r| r.id).collect();

        let ids = db.insert_embeddings(&records).unwrap();
        assert_eq!(ids, expected);
    }

    #[test]
    fn find_by_bot_respects_limit_and_insertion_order() {
        let db = RegistryDb::in_memory().unwrap();
        let bot = seeded_bot(&db);
        let doc = seeded_document(&db, bot.id);

        db.insert_embeddings(&records_for(&doc, 5)).unwrap();

        let fetched = db.find_embeddings_by_bot(&bot.id, 3).unwrap();
        assert_eq!(fetched.len(), 3);
        let indices: Vec<u32> = fetched.iter().map(|r| r.metadata.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn delete_by_ids_is_idempotent() {
        let db = RegistryDb::in_memory().unwrap();
        let bot = seeded_bot(&db);
        let doc = seeded_document(&db, bot.id);

        let ids = db.insert_embeddings(&records_for(&doc, 2)).unwrap();

        assert_eq!(db.delete_embeddings_by_ids(&ids).unwrap(), 2);
        // Deleting again removes nothing and does not error
        assert_eq!(db.delete_embeddings_by_ids(&ids).unwrap(), 0);
    }

    #[test]
    fn delete_by_document_removes_only_its_records() {
        let db = RegistryDb::in_memory().unwrap();
        let bot = seeded_bot(&db);
        let doc_a = seeded_document(&db, bot.id);
        let doc_b = seeded_document(&db, bot.id);

        db.insert_embeddings(&records_for(&doc_a, 3)).unwrap();
        db.insert_embeddings(&records_for(&doc_b, 2)).unwrap();

        assert_eq!(db.delete_embeddings_by_document(&doc_a.id).unwrap(), 3);
        assert_eq!(db.count_embeddings_by_document(&doc_a.id).unwrap(), 0);
        assert_eq!(db.count_embeddings_by_document(&doc_b.id).unwrap(), 2);
    }

    #[test]
    fn bot_aggregate_attach_and_detach() {
        let db = RegistryDb::in_memory().unwrap();
        let bot = seeded_bot(&db);
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

        db.add_bot_embeddings(&bot.id, &ids).unwrap();
        assert_eq!(db.get_bot(&bot.id).unwrap().unwrap().embedding_ids, ids);

        db.remove_bot_embeddings(&bot.id, &ids[..2]).unwrap();
        let remaining = db.get_bot(&bot.id).unwrap().unwrap().embedding_ids;
        assert_eq!(remaining, ids[2..].to_vec());
    }

    #[test]
    fn complete_document_attaches_ordered_ids() {
        let db = RegistryDb::in_memory().unwrap();
        let bot = seeded_bot(&db);
        let doc = seeded_document(&db, bot.id);

        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        db.complete_document(&doc.id, &ids).unwrap();

        let fetched = db.get_document(&doc.id).unwrap().unwrap();
        assert_eq!(fetched.status, DocumentStatus::Completed);
        assert_eq!(fetched.embedding_ids, ids);
        assert!(fetched.error.is_none());
    }

    #[test]
    fn delete_missing_document_returns_none() {
        let db = RegistryDb::in_memory().unwrap();
        assert!(db.delete_document(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn recovery_scan_lists_pending_and_stuck_processing() {
        let db = RegistryDb::in_memory().unwrap();
        let bot = seeded_bot(&db);

        let pending = seeded_document(&db, bot.id);
        let stuck = seeded_document(&db, bot.id);
        db.update_document_status(&stuck.id, DocumentStatus::Processing, None)
            .unwrap();
        let done = seeded_document(&db, bot.id);
        db.complete_document(&done.id, &[]).unwrap();

        let needing: Vec<Uuid> = db
            .list_documents_needing_processing()
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();

        assert!(needing.contains(&pending.id));
        assert!(needing.contains(&stuck.id));
        assert!(!needing.contains(&done.id));
    }
}
