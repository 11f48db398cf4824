use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Result of a list query.
///
/// Cockpit only answers with `{ "data": [...], "meta": { "total": n } }` when
/// both `skip` and `limit` are set. Bare-array answers are wrapped into the
/// same shape with `meta.total == 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub total: u64,
}

impl<T> Default for PaginatedResponse<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            meta: PageMeta::default(),
        }
    }
}

impl<T> From<Vec<T>> for PaginatedResponse<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            data,
            meta: PageMeta::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Upsert envelope
// ---------------------------------------------------------------------------

/// Body shape required by `POST /content/item/{model}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertData<T> {
    pub data: T,
}

// ---------------------------------------------------------------------------
// Base model
// ---------------------------------------------------------------------------

/// Publication state of a content item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum State {
    Archived,
    #[default]
    Draft,
    Published,
}

impl TryFrom<i64> for State {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(State::Archived),
            0 => Ok(State::Draft),
            1 => Ok(State::Published),
            other => Err(format!("unknown item state {other}")),
        }
    }
}

impl From<State> for i64 {
    fn from(state: State) -> Self {
        match state {
            State::Archived => -1,
            State::Draft => 0,
            State::Published => 1,
        }
    }
}

/// Fields Cockpit attaches to every stored record. Embed it with
/// `#[serde(flatten)]` in your own item types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseModel {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_state")]
    pub state: State,
    #[serde(rename = "_modified")]
    pub modified: i64,
    #[serde(rename = "_mby")]
    pub modified_by: String,
    #[serde(rename = "_created")]
    pub created: i64,
    #[serde(rename = "_cby")]
    pub created_by: String,
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Asset {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(rename = "_hash")]
    pub hash: String,
    pub thumbhash: String,
    pub path: String,
    pub title: String,
    pub mime: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub description: String,
    pub tags: Vec<serde_json::Value>,
    pub size: u64,
    pub colors: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub folder: String,
}
