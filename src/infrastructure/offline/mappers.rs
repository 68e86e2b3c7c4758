use super::rows::{CachedResponseRow, QueuedMutationRow};
use crate::domain::entities::{CacheEntry, QueuedMutation};
use crate::domain::value_objects::{CacheNamespace, MutationId, MutationMethod, MutationPayload};
use crate::shared::error::AppError;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};

pub fn queued_mutation_from_row(row: QueuedMutationRow) -> Result<QueuedMutation, AppError> {
    let id = MutationId::new(row.id).map_err(AppError::DeserializationError)?;
    let method =
        MutationMethod::try_from(row.method.as_str()).map_err(AppError::DeserializationError)?;
    let payload =
        MutationPayload::from_json_str(&row.payload).map_err(AppError::DeserializationError)?;
    let headers = decode_headers(&row.headers)?;

    Ok(QueuedMutation {
        id,
        target_url: row.target_url,
        method,
        payload,
        headers,
        record_type: row.record_type,
        priority: u8::try_from(row.priority).unwrap_or(u8::MAX),
        created_at: millis_to_datetime(row.created_at)?,
        synced: row.synced,
        synced_at: row.synced_at.map(millis_to_datetime).transpose()?,
        attempts: u32::try_from(row.attempts).unwrap_or(0),
        last_error: row.last_error,
        last_attempt_at: row.last_attempt_at.map(millis_to_datetime).transpose()?,
    })
}

pub fn cache_entry_from_row(row: CachedResponseRow) -> Result<CacheEntry, AppError> {
    let headers = decode_headers(&row.headers)?;
    let status = u16::try_from(row.status)
        .map_err(|_| AppError::DeserializationError(format!("Invalid status {}", row.status)))?;

    Ok(CacheEntry {
        namespace: CacheNamespace::from_raw(row.namespace),
        url: row.url,
        status,
        headers,
        body: Bytes::from(row.body),
        stored_at: millis_to_datetime(row.stored_at)?,
    })
}

pub fn encode_headers(headers: &[(String, String)]) -> Result<String, AppError> {
    Ok(serde_json::to_string(headers)?)
}

fn decode_headers(value: &str) -> Result<Vec<(String, String)>, AppError> {
    serde_json::from_str(value)
        .map_err(|e| AppError::DeserializationError(format!("Invalid stored headers: {e}")))
}

pub fn millis_to_datetime(value: i64) -> Result<DateTime<Utc>, AppError> {
    Utc.timestamp_millis_opt(value)
        .single()
        .ok_or_else(|| AppError::DeserializationError(format!("Invalid timestamp: {value}")))
}
