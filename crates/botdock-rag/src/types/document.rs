//! Document records and their ingestion lifecycle

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported upload types
///
/// Content arrives as already extracted text regardless of type; the type is
/// kept for display and for the dashboard's file listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document (text extracted upstream)
    Pdf,
    /// Plain text file
    Txt,
    /// Microsoft Word document (.docx)
    Docx,
    /// Crawled URL
    Url,
}

impl FileType {
    /// Parse from the wire representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" => Some(Self::Txt),
            "docx" => Some(Self::Docx),
            "url" => Some(Self::Url),
            _ => None,
        }
    }

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Docx => "docx",
            Self::Url => "url",
        }
    }
}

/// Ingestion lifecycle of a document
///
/// `Pending -> Processing -> {Completed | Failed}`. Only the ingestion
/// pipeline moves a document between states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// States the startup recovery scan re-enqueues
    pub fn needs_processing(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

/// An uploaded document owned by a bot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Owning bot
    pub bot_id: Uuid,
    /// Original file name as uploaded (or the crawled URL)
    pub file_name: String,
    /// Upload type
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
    /// Ingestion status
    pub status: DocumentStatus,
    /// Ids of the embedding records produced from this document, attached
    /// in one update when ingestion completes
    pub embedding_ids: Vec<Uuid>,
    /// Error message when status is `Failed`
    pub error: Option<String>,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last status transition timestamp
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document in `Pending` state
    pub fn new(bot_id: Uuid, file_name: String, file_type: FileType, content: String) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            bot_id,
            file_name,
            file_type,
            content,
            status: DocumentStatus::Pending,
            embedding_ids: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of embedding records attached to this document
    pub fn embedding_count(&self) -> usize {
        self.embedding_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_round_trip() {
        for raw in ["pdf", "txt", "docx", "url"] {
            let parsed = FileType::parse(raw).unwrap();
            assert_eq!(parsed.as_str(), raw);
        }
        assert!(FileType::parse("xlsx").is_none());
    }

    #[test]
    fn recovery_scan_covers_pending_and_processing() {
        assert!(DocumentStatus::Pending.needs_processing());
        assert!(DocumentStatus::Processing.needs_processing());
        assert!(!DocumentStatus::Completed.needs_processing());
        assert!(!DocumentStatus::Failed.needs_processing());
    }
}
