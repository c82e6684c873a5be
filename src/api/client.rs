//! Interpretation service client
//!
//! Every response goes through [`normalize`](super::envelope::normalize);
//! every failure is classified into [`ApiError`] and logged here.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::abort::AbortSignal;
use super::envelope::{normalize, normalize_with_meta};
use super::transport::{
    ApiRequest, FilePart, RawResponse, ReqwestTransport, RequestBody, Transport, Workload,
};
use super::types::{
    ChatAnswer, InterpretationPage, InterpretationRecord, ProfileResponse, UserProfile, WireRecord,
};
use crate::config::ClientConfig;
use crate::context::{AppContext, Language};
use crate::error::{ApiError, ApiResult};
use crate::validation::{validate_file, FileHandle, Validation};

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Client for the interpretation backend
pub struct ApiClient {
    config: ClientConfig,
    context: Arc<AppContext>,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    /// Create a client that talks to the network through reqwest
    pub fn new(config: ClientConfig, context: Arc<AppContext>) -> Self {
        Self::with_transport(config, context, Arc::new(ReqwestTransport))
    }

    pub fn with_transport(
        config: ClientConfig,
        context: Arc<AppContext>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            context,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    /// Upload a document and wait for its interpretation
    ///
    /// The file must pass [`validate_file`]; otherwise this fails with
    /// `Validation` before touching the network.
    pub async fn interpret_document(
        &self,
        file: &FileHandle,
        locale: Option<Language>,
        abort: Option<&AbortSignal>,
    ) -> ApiResult<InterpretationRecord> {
        let result = self.interpret_inner(file, locale, abort).await;
        match &result {
            Ok(record) => tracing::info!(
                interpretation_id = %record.id,
                document_type = %record.document_type,
                "Document interpreted"
            ),
            Err(e) => e.log("interpret"),
        }
        result
    }

    async fn interpret_inner(
        &self,
        file: &FileHandle,
        locale: Option<Language>,
        abort: Option<&AbortSignal>,
    ) -> ApiResult<InterpretationRecord> {
        if let Validation::Invalid { reason } = validate_file(Some(file)) {
            return Err(ApiError::Validation(reason));
        }

        let mut fields = Vec::new();
        if let Some(lang) = locale {
            fields.push(("language".to_string(), lang.as_str().to_string()));
        }

        let request = ApiRequest::post(
            self.config.endpoint("interpret/"),
            Workload::Upload,
            RequestBody::Multipart {
                file: FilePart {
                    field: "file".to_string(),
                    file_name: file.name.clone(),
                    content_type: file.content_type.clone(),
                    bytes: file.bytes.clone(),
                },
                fields,
            },
        )
        .bearer(self.context.auth.bearer())
        .timeout(self.config.upload_timeout);

        tracing::info!(file = %file.name, size = file.size, "Uploading document");
        let response = self.dispatch(request, abort).await?;

        let wire: WireRecord = normalize(response.status, &response.body)?;
        InterpretationRecord::try_from(wire)
    }

    /// Ask a follow-up question about an interpretation; returns the answer text
    pub async fn ask_question(
        &self,
        interpretation_id: &str,
        question: &str,
        locale: Language,
        abort: Option<&AbortSignal>,
    ) -> ApiResult<String> {
        let request = ApiRequest::post(
            self.config.endpoint("chat/"),
            Workload::Chat,
            RequestBody::Json(json!({
                "session_id": interpretation_id,
                "question": question,
                "language": locale.as_str(),
            })),
        )
        .bearer(self.context.auth.bearer())
        .timeout(self.config.chat_timeout);

        let result = async {
            let response = self.dispatch(request, abort).await?;
            normalize::<ChatAnswer>(response.status, &response.body).map(|a| a.answer)
        }
        .await;

        if let Err(e) = &result {
            e.log("ask_question");
        }
        result
    }

    /// Fetch one past interpretation by id
    pub async fn get_interpretation(&self, id: &str) -> ApiResult<InterpretationRecord> {
        let result = async {
            let url = self.resource_url("interpretations", id)?;
            let response = self.lookup(&url).await?;
            let wire: WireRecord = normalize(response.status, &response.body)?;
            InterpretationRecord::try_from(wire)
        }
        .await;

        if let Err(e) = &result {
            e.log("get_interpretation");
        }
        result
    }

    /// One page of the signed-in user's interpretations, newest first
    pub async fn list_interpretations(&self, page: u32, limit: u32) -> ApiResult<InterpretationPage> {
        let url = self
            .config
            .endpoint(&format!("interpretations/?page={}&limit={}", page, limit));

        let result = async {
            let response = self.lookup(&url).await?;
            let page = normalize_with_meta::<Vec<WireRecord>>(response.status, &response.body)?;
            let items = page
                .data
                .into_iter()
                .map(InterpretationRecord::try_from)
                .collect::<ApiResult<Vec<_>>>()?;

            Ok::<_, ApiError>(InterpretationPage {
                items,
                total: page.total,
                next: page.next,
            })
        }
        .await;

        if let Err(e) = &result {
            e.log("list_interpretations");
        }
        result
    }

    /// The most recent interpretation, if any
    pub async fn most_recent(&self) -> ApiResult<Option<InterpretationRecord>> {
        let page = self.list_interpretations(1, 1).await?;
        Ok(page.items.into_iter().next())
    }

    /// Resolve the profile behind a freshly issued access token
    pub async fn fetch_profile(&self, token: &str) -> ApiResult<UserProfile> {
        let request = ApiRequest::get(self.config.endpoint("auth/profile"), Workload::Lookup)
            .bearer(Some(token.to_string()));

        let result = async {
            let response = self.dispatch_with_retry(request).await?;
            normalize::<ProfileResponse>(response.status, &response.body).map(|p| p.user)
        }
        .await;

        if let Err(e) = &result {
            e.log("fetch_profile");
        }
        result
    }

    /// `{base}/{collection}/{id}/` with `id` percent-encoded as one path segment
    fn resource_url(&self, collection: &str, id: &str) -> ApiResult<String> {
        let invalid = |detail: String| {
            ApiError::Network(format!("invalid API URL {}: {}", self.config.base_url, detail))
        };

        let mut url = reqwest::Url::parse(&self.config.endpoint(collection))
            .map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot hold a path".to_string()))?
            .pop_if_empty()
            .push(id)
            .push("");
        Ok(url.into())
    }

    async fn lookup(&self, url: &str) -> ApiResult<RawResponse> {
        let request = ApiRequest::get(url.to_string(), Workload::Lookup)
            .bearer(self.context.auth.bearer());
        self.dispatch_with_retry(request).await
    }

    /// Send one request, racing it against the abort signal
    async fn dispatch(
        &self,
        request: ApiRequest,
        abort: Option<&AbortSignal>,
    ) -> ApiResult<RawResponse> {
        let Some(abort) = abort else {
            return Ok(self.transport.execute(request).await?);
        };

        if abort.is_aborted() {
            return Err(ApiError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = abort.cancelled() => Err(ApiError::Cancelled),
            result = self.transport.execute(request) => Ok(result?),
        }
    }

    /// Send an idempotent request, retrying on 429 and transport failures
    async fn dispatch_with_retry(&self, request: ApiRequest) -> ApiResult<RawResponse> {
        let mut retry_delay = INITIAL_RETRY_DELAY;
        let max_retries = self.config.max_retries;

        for retry in 0..=max_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2;
            }

            match self.transport.execute(request.clone()).await {
                Ok(r) if r.status == 429 && retry < max_retries => {
                    tracing::warn!("Rate limited, retry {}/{}", retry + 1, max_retries);
                    continue;
                }
                Ok(r) => return Ok(r),
                Err(e) if retry < max_retries => {
                    tracing::warn!(error = %e, "Lookup failed, retry {}/{}", retry + 1, max_retries);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::Network("Max retries exceeded".to_string()))
    }
}
