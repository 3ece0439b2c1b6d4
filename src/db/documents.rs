//! Database queries for application documents.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::application_document::{self, ActiveModel, Entity as Document};
use crate::error::{AppError, AppResult};
use crate::models::{ApplicationDocument, DocumentType};

use super::{DbPool, conflict_or_db, parse_column};

/// Metadata of a stored upload.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: Uuid,
    pub application_id: Uuid,
    pub document_type: DocumentType,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub storage_key: String,
    pub sha256: String,
}

fn model_to_document(m: application_document::Model) -> AppResult<ApplicationDocument> {
    Ok(ApplicationDocument {
        id: m.id,
        application_id: m.application_id,
        document_type: parse_column(
            &m.document_type,
            DocumentType::parse,
            "application_documents.document_type",
        )?,
        file_name: m.file_name,
        file_size: m.file_size,
        content_type: m.content_type,
        storage_key: m.storage_key,
        sha256: m.sha256,
        created_at: m.created_at,
    })
}

impl DbPool {
    /// Record an uploaded document, replacing any document of the same type
    /// on the application.
    ///
    /// Returns the new record and the storage key of the replaced document.
    pub async fn replace_document(
        &self,
        doc: NewDocument,
    ) -> AppResult<(ApplicationDocument, Option<String>)> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let previous = Document::find()
            .filter(application_document::Column::ApplicationId.eq(doc.application_id))
            .filter(application_document::Column::DocumentType.eq(doc.document_type.as_str()))
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to find document: {}", e)))?;

        let replaced_key = match previous {
            Some(prev) => {
                Document::delete_by_id(prev.id)
                    .exec(&txn)
                    .await
                    .map_err(|e| {
                        AppError::Database(format!("Failed to delete previous document: {}", e))
                    })?;
                Some(prev.storage_key)
            }
            None => None,
        };

        let model = ActiveModel {
            id: Set(doc.id),
            application_id: Set(doc.application_id),
            document_type: Set(doc.document_type.as_str().to_string()),
            file_name: Set(doc.file_name),
            file_size: Set(doc.file_size),
            content_type: Set(doc.content_type),
            storage_key: Set(doc.storage_key),
            sha256: Set(doc.sha256),
            created_at: Set(Utc::now()),
        };

        let inserted = model.insert(&txn).await.map_err(|e| {
            conflict_or_db(
                e,
                "Failed to insert document",
                "A document of this type was uploaded concurrently",
            )
        })?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit document: {}", e)))?;

        Ok((model_to_document(inserted)?, replaced_key))
    }

    /// Get a document by ID.
    pub async fn get_document(&self, id: Uuid) -> AppResult<Option<ApplicationDocument>> {
        Document::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get document: {}", e)))?
            .map(model_to_document)
            .transpose()
    }

    /// Documents of one application, oldest first.
    pub async fn list_documents(&self, application_id: Uuid) -> AppResult<Vec<ApplicationDocument>> {
        Document::find()
            .filter(application_document::Column::ApplicationId.eq(application_id))
            .order_by_asc(application_document::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list documents: {}", e)))?
            .into_iter()
            .map(model_to_document)
            .collect()
    }

    /// Documents of several applications, grouped by application id.
    pub async fn list_documents_for_applications(
        &self,
        application_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<ApplicationDocument>>> {
        let mut grouped: HashMap<Uuid, Vec<ApplicationDocument>> = HashMap::new();
        if application_ids.is_empty() {
            return Ok(grouped);
        }

        let models = Document::find()
            .filter(
                application_document::Column::ApplicationId.is_in(application_ids.iter().copied()),
            )
            .order_by_asc(application_document::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list documents: {}", e)))?;

        for m in models {
            let doc = model_to_document(m)?;
            grouped.entry(doc.application_id).or_default().push(doc);
        }
        Ok(grouped)
    }

    /// Delete a document row. Returns false if it did not exist.
    pub async fn delete_document(&self, id: Uuid) -> AppResult<bool> {
        let result = Document::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete document: {}", e)))?;

        Ok(result.rows_affected > 0)
    }
}
