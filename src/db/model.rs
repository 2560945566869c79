//! Row models returned by repository queries.
//!
//! Rows store enumerations as their wire strings; conversion into domain
//! structs is fallible so an unknown stored value is rejected instead of
//! silently accepted.

use crate::error::{CoreError, Result};
use crate::model::{Batch, BatchItem, BatchStatus, BatchType, ItemStatus, Priority};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct BatchRow {
    pub id: i64,
    pub brand_id: i64,
    pub batch_type: String,
    pub status: String,
    pub priority: Option<String>,
    pub angle_id: i64,
    pub format_id: i64,
    pub reference_ad_id: Option<i64>,
    pub editor_id: Option<i64>,
    pub strategist_id: Option<i64>,
    pub brief: Option<String>,
    pub idea: Option<String>,
    pub main_messaging: Option<String>,
    pub learnings: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BatchRow {
    pub fn into_domain(self) -> Result<Batch> {
        let batch_type = BatchType::parse(&self.batch_type).ok_or_else(|| {
            CoreError::validation(format!(
                "batch {} has unknown type {}",
                self.id, self.batch_type
            ))
        })?;
        let status = BatchStatus::parse(&self.status).ok_or_else(|| {
            CoreError::validation(format!(
                "batch {} has unknown status {}",
                self.id, self.status
            ))
        })?;
        let priority = match self.priority {
            Some(p) => Some(Priority::parse(&p).ok_or_else(|| {
                CoreError::validation(format!("batch {} has unknown priority {}", self.id, p))
            })?),
            None => None,
        };
        Ok(Batch {
            id: self.id,
            brand_id: self.brand_id,
            batch_type,
            status,
            priority,
            angle_id: self.angle_id,
            format_id: self.format_id,
            reference_ad_id: self.reference_ad_id,
            editor_id: self.editor_id,
            strategist_id: self.strategist_id,
            brief: self.brief,
            idea: self.idea,
            main_messaging: self.main_messaging,
            learnings: self.learnings,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BatchItemRow {
    pub id: i64,
    pub batch_id: i64,
    pub status: String,
    pub hook_id: Option<i64>,
    pub notes: Option<String>,
    pub script: Option<String>,
    pub delivered_video_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BatchItemRow {
    pub fn into_domain(self) -> Result<BatchItem> {
        let status = ItemStatus::parse(&self.status).ok_or_else(|| {
            CoreError::validation(format!(
                "item {} has unknown status {}",
                self.id, self.status
            ))
        })?;
        Ok(BatchItem {
            id: self.id,
            batch_id: self.batch_id,
            status,
            hook_id: self.hook_id,
            notes: self.notes,
            script: self.script,
            delivered_video_url: self.delivered_video_url,
            created_at: self.created_at,
        })
    }
}
