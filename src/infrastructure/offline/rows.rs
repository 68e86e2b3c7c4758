use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct QueuedMutationRow {
    pub id: String,
    pub target_url: String,
    pub method: String,
    pub payload: String,
    pub headers: String,
    pub record_type: Option<String>,
    pub priority: i64,
    pub created_at: i64,
    pub synced: bool,
    pub synced_at: Option<i64>,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CachedResponseRow {
    pub namespace: String,
    pub url: String,
    pub status: i64,
    pub headers: String,
    pub body: Vec<u8>,
    pub stored_at: i64,
}
