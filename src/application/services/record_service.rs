use crate::application::ports::MutationQueue;
use crate::application::services::interceptor::{
    InterceptedRequest, InterceptedResponse, RequestInterceptor, ResponseSource,
};
use crate::domain::entities::FieldRecord;
use crate::domain::value_objects::RecordType;
use crate::shared::error::AppError;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub success: bool,
    pub offline: bool,
    /// Server-assigned id, known only once the record reached the API.
    pub id: Option<String>,
    pub message: Option<String>,
    pub queued_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutcome {
    pub offline: bool,
    pub records: Vec<Value>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiBody {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    queued_id: Option<String>,
    #[serde(default)]
    records: Option<Vec<Value>>,
}

/// The save/fetch pair the forms and dashboards talk to.
pub struct RecordService {
    interceptor: Arc<RequestInterceptor>,
    queue: Arc<dyn MutationQueue>,
}

impl RecordService {
    pub fn new(interceptor: Arc<RequestInterceptor>, queue: Arc<dyn MutationQueue>) -> Self {
        Self { interceptor, queue }
    }

    pub async fn save(&self, record: &FieldRecord) -> Result<SaveOutcome, AppError> {
        self.submit(record, None).await
    }

    pub async fn save_cancellable(
        &self,
        record: &FieldRecord,
        cancel: CancellationToken,
    ) -> Result<SaveOutcome, AppError> {
        self.submit(record, Some(cancel)).await
    }

    pub async fn fetch_all(
        &self,
        record_type: Option<RecordType>,
    ) -> Result<FetchOutcome, AppError> {
        let url = match record_type {
            Some(kind) => format!("{}?type={}", self.interceptor.records_url(), kind.as_str()),
            None => self.interceptor.records_url().to_string(),
        };
        let response = self.interceptor.handle(InterceptedRequest::get(url)).await?;

        match response.source {
            ResponseSource::Offline => {
                let body: ApiBody = response.json()?;
                Ok(FetchOutcome {
                    offline: true,
                    records: Vec::new(),
                    message: body.message,
                })
            }
            _ if !response.is_success() => Err(remote_error(&response)),
            source => {
                let body: ApiBody = response.json()?;
                Ok(FetchOutcome {
                    offline: source == ResponseSource::Cache,
                    records: body.records.unwrap_or_default(),
                    message: None,
                })
            }
        }
    }

    pub async fn pending_count(&self) -> Result<u64, AppError> {
        self.queue.pending_count().await
    }

    async fn submit(
        &self,
        record: &FieldRecord,
        cancel: Option<CancellationToken>,
    ) -> Result<SaveOutcome, AppError> {
        record.validate().map_err(AppError::ValidationError)?;
        let mut request =
            InterceptedRequest::json(Method::POST, self.interceptor.records_url(), record)?;
        if let Some(token) = cancel {
            request = request.with_cancellation(token);
        }

        let response = self.interceptor.handle(request).await?;
        if !response.is_success() {
            return Err(remote_error(&response));
        }

        let body: ApiBody = response.json()?;
        let offline = response.source == ResponseSource::Queued;
        tracing::debug!(
            target: "field_sync::interceptor",
            record_type = record.record_type().as_str(),
            offline,
            "record saved"
        );

        Ok(SaveOutcome {
            success: body.success.unwrap_or(true),
            offline,
            id: body.id.map(|id| match id {
                Value::String(s) => s,
                other => other.to_string(),
            }),
            message: body.message,
            queued_id: body.queued_id,
        })
    }
}

fn remote_error(response: &InterceptedResponse) -> AppError {
    let message = response
        .json::<ApiBody>()
        .ok()
        .and_then(|body| body.error.or(body.message))
        .unwrap_or_else(|| String::from_utf8_lossy(&response.body).into_owned());
    AppError::Remote {
        status: response.status,
        message,
    }
}
