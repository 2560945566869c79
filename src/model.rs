use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical production status of a batch. The first nine form the ordered
/// forward flow (terminal `Archived` last); `Trashed` is out-of-band and
/// reachable from anywhere.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BatchStatus {
    Ideation,
    CreatorBriefing,
    Filming,
    EditorBriefing,
    Editing,
    Review,
    AiBoost,
    Learning,
    Archived,
    Trashed,
}

/// Ordered forward flow consumed by UI ordering and the loopback rule.
/// `Trashed` is deliberately not part of this constant.
pub const STATUS_FLOW: [BatchStatus; 9] = [
    BatchStatus::Ideation,
    BatchStatus::CreatorBriefing,
    BatchStatus::Filming,
    BatchStatus::EditorBriefing,
    BatchStatus::Editing,
    BatchStatus::Review,
    BatchStatus::AiBoost,
    BatchStatus::Learning,
    BatchStatus::Archived,
];

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Ideation => "IDEATION",
            BatchStatus::CreatorBriefing => "CREATOR_BRIEFING",
            BatchStatus::Filming => "FILMING",
            BatchStatus::EditorBriefing => "EDITOR_BRIEFING",
            BatchStatus::Editing => "EDITING",
            BatchStatus::Review => "REVIEW",
            BatchStatus::AiBoost => "AI_BOOST",
            BatchStatus::Learning => "LEARNING",
            BatchStatus::Archived => "ARCHIVED",
            BatchStatus::Trashed => "TRASHED",
        }
    }

    /// The status enumeration is a closed contract: anything outside it is
    /// rejected rather than stored.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IDEATION" => Some(BatchStatus::Ideation),
            "CREATOR_BRIEFING" => Some(BatchStatus::CreatorBriefing),
            "FILMING" => Some(BatchStatus::Filming),
            "EDITOR_BRIEFING" => Some(BatchStatus::EditorBriefing),
            "EDITING" => Some(BatchStatus::Editing),
            "REVIEW" => Some(BatchStatus::Review),
            "AI_BOOST" => Some(BatchStatus::AiBoost),
            "LEARNING" => Some(BatchStatus::Learning),
            "ARCHIVED" => Some(BatchStatus::Archived),
            "TRASHED" => Some(BatchStatus::Trashed),
            _ => None,
        }
    }
}

/// Immutable after batch creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BatchType {
    Copycat,
    NetNew,
    Iteration,
}

impl BatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchType::Copycat => "COPYCAT",
            BatchType::NetNew => "NET_NEW",
            BatchType::Iteration => "ITERATION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COPYCAT" => Some(BatchType::Copycat),
            "NET_NEW" => Some(BatchType::NetNew),
            "ITERATION" => Some(BatchType::Iteration),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "HIGH" => Some(Priority::High),
            "MEDIUM" => Some(Priority::Medium),
            "LOW" => Some(Priority::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Done,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "PENDING",
            ItemStatus::Done => "DONE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ItemStatus::Pending),
            "DONE" => Some(ItemStatus::Done),
            _ => None,
        }
    }
}

/// Direction of a bulk tag pass over a bunch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BulkAction {
    Add,
    Remove,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Add => "add",
            BulkAction::Remove => "remove",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(BulkAction::Add),
            "remove" => Some(BulkAction::Remove),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: i64,
    pub brand_id: i64,
    pub batch_type: BatchType,
    pub status: BatchStatus,
    pub priority: Option<Priority>,
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: i64,
    pub batch_id: i64,
    pub status: ItemStatus,
    pub hook_id: Option<i64>,
    pub notes: Option<String>,
    pub script: Option<String>,
    pub delivered_video_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Creator {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub platform: String,
    pub status: String,
    pub active_batch_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Creative {
    pub id: i64,
    pub file_url: String,
    pub creator_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}
