//! # Base Consumer
//!
//! This module defines the [`BaseConsumer`], the accessor that turns resource-level
//! calls (get by id, create from a payload, ...) into resolved requests for an
//! [`ApiClient`], and decodes the responses into the type requested by the caller.

use crate::client::{ApiClient, Method};
use crate::error::{ConsumerError, OperationResult};
use crate::options::{CallOptions, RequestDataOptions, RequestOptions, RequestUploadOptions};
use crate::response::{ApiResponse, PagedResult};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument, Span};

/// Resource accessor bound to one collection prefix.
///
/// The response type is chosen per call (`get::<Widget>(..)`). Use
/// [`Consumer`](crate::Consumer) to pin it once per resource.
///
/// * **Immutable** – the client, the prefix and the tracing span are fixed at construction.
/// * **Cheap to clone** – holds an `Arc` to the client.
/// * **Pass-through** – errors and cancellation tokens reach the caller and the client unchanged.
///
/// ## URI resolution
///
/// A positional call resolves its path as follows:
///
/// 1. `CallOptions::override_uri` when set, used verbatim.
/// 2. Otherwise the prefix, followed by `/{id}` when an id is given. The id is
///    appended as passed; only `None` addresses the collection itself.
pub struct BaseConsumer<C: ?Sized> {
    client: Arc<C>,
    prefix: String,
    span: Span,
}

impl<C: ?Sized> Clone for BaseConsumer<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            prefix: self.prefix.clone(),
            span: self.span.clone(),
        }
    }
}

impl<C: ApiClient + ?Sized> BaseConsumer<C> {
    /// Creates a consumer for the collection at `prefix` (e.g. `"widgets"`).
    ///
    /// Leading and trailing slashes are trimmed. Fails when nothing remains.
    pub fn new(client: Arc<C>, prefix: impl Into<String>) -> Result<Self, ConsumerError> {
        let prefix = prefix.into().trim_matches('/').to_string();
        if prefix.is_empty() {
            return Err(ConsumerError::InvalidArgument(
                "resource prefix must not be empty".to_string(),
            ));
        }

        let span = tracing::info_span!("consumer", prefix = %prefix);
        Ok(Self {
            client,
            prefix,
            span,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Resolves the request path for an optional id and override.
    pub fn resolve_uri(&self, id: Option<&str>, override_uri: Option<&str>) -> String {
        if let Some(uri) = override_uri {
            return uri.to_string();
        }
        match id {
            Some(id) => format!("{}/{}", self.prefix, id),
            None => self.prefix.clone(),
        }
    }

    fn request(&self, id: Option<&str>, call: &CallOptions) -> RequestOptions {
        RequestOptions::new(self.resolve_uri(id, call.override_uri.as_deref()))
            .allow_anonymous(call.allow_anonymous)
    }

    // --- Get ---

    pub async fn get<T: DeserializeOwned>(
        &self,
        id: Option<&str>,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        self.get_with(self.request(id, call), cancel).await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        let uri = options.uri.clone();
        self.dispatch(Method::Get, uri, self.client.get(options, cancel))
            .await
    }

    // --- GetAll ---

    pub async fn get_all<T: DeserializeOwned>(
        &self,
        data: Option<&RequestDataOptions>,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<PagedResult<T>> {
        let mut options = self.request(None, call);
        if let Some(data) = data {
            options.query.extend(data.to_query());
        }
        self.get_all_with(options, cancel).await
    }

    pub async fn get_all_with<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> OperationResult<PagedResult<T>> {
        let uri = options.uri.clone();
        self.dispatch(Method::Get, uri, self.client.get(options, cancel))
            .await
    }

    // --- Create / Post ---

    pub async fn create<T, B>(
        &self,
        request: &B,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let options = self.request(None, call).with_json_body(request)?;
        self.create_with(options, cancel).await
    }

    pub async fn create_with<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        let uri = options.uri.clone();
        self.dispatch(Method::Post, uri, self.client.post(options, cancel))
            .await
    }

    /// Alias of [`BaseConsumer::create`].
    pub async fn post<T, B>(
        &self,
        request: &B,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.create(request, call, cancel).await
    }

    pub async fn post_with<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        self.create_with(options, cancel).await
    }

    // --- Update / Put ---

    pub async fn update<T, B>(
        &self,
        id: Option<&str>,
        request: &B,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let options = self.request(id, call).with_json_body(request)?;
        self.update_with(options, cancel).await
    }

    pub async fn update_with<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        let uri = options.uri.clone();
        self.dispatch(Method::Put, uri, self.client.put(options, cancel))
            .await
    }

    /// Alias of [`BaseConsumer::update`].
    pub async fn put<T, B>(
        &self,
        id: Option<&str>,
        request: &B,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.update(id, request, call, cancel).await
    }

    pub async fn put_with<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        self.update_with(options, cancel).await
    }

    // --- Delete ---

    pub async fn delete<T: DeserializeOwned>(
        &self,
        id: Option<&str>,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        self.delete_with(self.request(id, call), cancel).await
    }

    pub async fn delete_with<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        let uri = options.uri.clone();
        self.dispatch(Method::Delete, uri, self.client.delete(options, cancel))
            .await
    }

    // --- Upload ---

    pub async fn upload<T: DeserializeOwned>(
        &self,
        id: Option<&str>,
        content: Bytes,
        file_name: &str,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        let uri = self.resolve_uri(id, call.override_uri.as_deref());
        let options = RequestUploadOptions::new(uri, file_name, content)
            .allow_anonymous(call.allow_anonymous);
        self.upload_with(options, cancel).await
    }

    pub async fn upload_with<T: DeserializeOwned>(
        &self,
        options: RequestUploadOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        debug!(
            parent: &self.span,
            file_name = %options.file_name,
            size = options.content.len(),
            "Preparing upload"
        );
        let uri = options.uri.clone();
        self.dispatch(Method::Upload, uri, self.client.upload(options, cancel))
            .await
    }

    async fn dispatch<T, F>(&self, method: Method, uri: String, call: F) -> OperationResult<T>
    where
        T: DeserializeOwned,
        F: Future<Output = Result<ApiResponse, ConsumerError>>,
    {
        async move {
            debug!(%method, %uri, "Sending request");
            let response = call.await?;
            debug!(%method, %uri, status = response.status, "Received response");
            response.into_result()
        }
        .instrument(self.span.clone())
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockApiClient;
    use crate::response::FileUploadResponse;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Widget {
        id: String,
        name: String,
    }

    fn consumer(mock: &MockApiClient) -> BaseConsumer<MockApiClient> {
        BaseConsumer::new(Arc::new(mock.clone()), "widgets").unwrap()
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        let mock = MockApiClient::new();
        let result = BaseConsumer::new(Arc::new(mock), "//");
        assert!(matches!(result, Err(ConsumerError::InvalidArgument(_))));
    }

    #[test]
    fn test_uri_resolution() {
        let mock = MockApiClient::new();
        let base = BaseConsumer::new(Arc::new(mock), "/widgets/").unwrap();

        assert_eq!(base.prefix(), "widgets");
        assert_eq!(base.resolve_uri(None, None), "widgets");
        assert_eq!(base.resolve_uri(Some("42"), None), "widgets/42");
        assert_eq!(base.resolve_uri(Some(""), None), "widgets/");
        assert_eq!(base.resolve_uri(Some("42"), Some("v2/gadgets/7")), "v2/gadgets/7");
    }

    #[tokio::test]
    async fn test_empty_id_is_not_widened_to_collection() {
        let mut mock = MockApiClient::new();
        mock.expect_delete("widgets/").return_status(204, None);
        mock.expect_put("widgets/").return_status(204, None);

        let base = consumer(&mock);
        base.delete::<()>(Some(""), &CallOptions::new(), CancellationToken::new())
            .await
            .unwrap();
        base.update::<(), _>(Some(""), &json!({}), &CallOptions::new(), CancellationToken::new())
            .await
            .unwrap();

        assert!(mock.requests().iter().all(|request| request.uri != "widgets"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_get_decodes_into_requested_type() {
        let mut mock = MockApiClient::new();
        mock.expect_get("widgets/42")
            .return_ok(json!({ "id": "42", "name": "Foo" }));

        let widget: Widget = consumer(&mock)
            .get(Some("42"), &CallOptions::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(widget.name, "Foo");
        mock.verify();
    }

    #[tokio::test]
    async fn test_get_all_sends_query_parameters() {
        let mut mock = MockApiClient::new();
        mock.expect_get("widgets").return_ok(json!({
            "items": [{ "id": "1", "name": "A" }],
            "pageNumber": 3,
            "pageSize": 1,
            "totalCount": 7
        }));

        let data = RequestDataOptions::new().page(3, 1).search("A");
        let page: PagedResult<Widget> = consumer(&mock)
            .get_all(Some(&data), &CallOptions::anonymous(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(page.len(), 1);
        assert!(page.has_more());

        let request = &mock.requests()[0];
        assert!(request.allow_anonymous);
        assert_eq!(request.query.get("pageNumber").map(String::as_str), Some("3"));
        assert_eq!(request.query.get("search").map(String::as_str), Some("A"));
    }

    #[tokio::test]
    async fn test_create_serializes_payload() {
        let mut mock = MockApiClient::new();
        mock.expect_post("widgets")
            .return_status(201, Some(json!({ "id": "1", "name": "New" })));

        let created: Widget = consumer(&mock)
            .create(&json!({ "name": "New" }), &CallOptions::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(created.id, "1");
        assert_eq!(mock.requests()[0].body, Some(json!({ "name": "New" })));
    }

    #[tokio::test]
    async fn test_problem_response_becomes_error() {
        let mut mock = MockApiClient::new();
        mock.expect_delete("widgets/9").return_status(
            404,
            Some(json!({ "title": "Not Found", "status": 404, "detail": "no widget 9" })),
        );

        let err = consumer(&mock)
            .delete::<Widget>(Some("9"), &CallOptions::new(), CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.problem().and_then(|p| p.detail.as_deref()),
            Some("no widget 9")
        );
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let mut mock = MockApiClient::new();
        mock.expect_put("widgets/1")
            .return_err(ConsumerError::Transport("connection reset".into()));

        let err = consumer(&mock)
            .update::<Widget, _>(
                Some("1"),
                &json!({ "name": "x" }),
                &CallOptions::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ConsumerError::Transport(msg) if msg == "connection reset"));
    }

    #[tokio::test]
    async fn test_upload_uses_override_uri() {
        let mut mock = MockApiClient::new();
        mock.expect_upload("files/incoming").return_ok(json!({
            "uri": "files/incoming/a.txt",
            "fileName": "a.txt",
            "size": 3
        }));

        let uploaded: OperationResult<FileUploadResponse> = consumer(&mock)
            .upload(
                Some("1"),
                Bytes::from_static(b"abc"),
                "a.txt",
                &CallOptions::new().with_uri("files/incoming"),
                CancellationToken::new(),
            )
            .await;

        assert_eq!(uploaded.unwrap().size, 3);
        let request = &mock.requests()[0];
        assert_eq!(request.file_name.as_deref(), Some("a.txt"));
        assert_eq!(request.content.as_deref(), Some(&b"abc"[..]));
    }
}
