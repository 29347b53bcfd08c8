//! # Typed Consumer
//!
//! Provides [`Consumer<T>`], a view of a [`BaseConsumer`] with the response type
//! fixed once, so callers of a resource never repeat the type argument.
use crate::base::BaseConsumer;
use crate::client::ApiClient;
use crate::error::{ConsumerError, OperationResult};
use crate::options::{CallOptions, RequestDataOptions, RequestOptions, RequestUploadOptions};
use crate::response::{FileUploadResponse, PagedResult};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Typed façade over a [`BaseConsumer`] for one resource type `T`.
///
/// Every method forwards to the same-named `BaseConsumer` method with `T`
/// substituted. Results, errors and cancellation behave exactly as the base
/// accessor's do.
///
/// Resource-specific consumers wrap a `Consumer<T>` and add domain methods on top.
///
/// # Example
///
/// ```rust
/// use resource_consumer::mock::MockApiClient;
/// use resource_consumer::{ApiClient, CallOptions, Consumer};
/// use serde::Deserialize;
/// use serde_json::json;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// #[derive(Debug, Deserialize)]
/// struct Widget { id: String, name: String }
///
/// #[tokio::main]
/// async fn main() {
///     let mut mock = MockApiClient::new();
///     mock.expect_get("widgets/42").return_ok(json!({ "id": "42", "name": "Foo" }));
///
///     let client: Arc<dyn ApiClient> = Arc::new(mock.clone());
///     let widgets: Consumer<Widget> = Consumer::new(client, "widgets").unwrap();
///     let widget = widgets
///         .get(Some("42"), &CallOptions::new(), CancellationToken::new())
///         .await
///         .unwrap();
///     assert_eq!(widget.name, "Foo");
///     mock.verify();
/// }
/// ```
pub struct Consumer<T, C: ?Sized = dyn ApiClient> {
    base: BaseConsumer<C>,
    _response: PhantomData<fn() -> T>,
}

impl<T, C: ?Sized> Clone for Consumer<T, C> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            _response: PhantomData,
        }
    }
}

impl<T, C> Consumer<T, C>
where
    T: DeserializeOwned,
    C: ApiClient + ?Sized,
{
    /// Creates a consumer for the collection at `prefix`.
    pub fn new(client: Arc<C>, prefix: impl Into<String>) -> Result<Self, ConsumerError> {
        Ok(Self::from_base(BaseConsumer::new(client, prefix)?))
    }

    pub fn from_base(base: BaseConsumer<C>) -> Self {
        Self {
            base,
            _response: PhantomData,
        }
    }

    pub fn base(&self) -> &BaseConsumer<C> {
        &self.base
    }

    pub fn prefix(&self) -> &str {
        self.base.prefix()
    }

    pub async fn get(
        &self,
        id: Option<&str>,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        self.base.get::<T>(id, call, cancel).await
    }

    pub async fn get_with(&self, options: RequestOptions, cancel: CancellationToken) -> OperationResult<T> {
        self.base.get_with::<T>(options, cancel).await
    }

    pub async fn get_all(
        &self,
        data: Option<&RequestDataOptions>,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<PagedResult<T>> {
        self.base.get_all::<T>(data, call, cancel).await
    }

    pub async fn get_all_with(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> OperationResult<PagedResult<T>> {
        self.base.get_all_with::<T>(options, cancel).await
    }

    pub async fn create<B: Serialize + ?Sized + Sync>(
        &self,
        request: &B,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        self.base.create::<T, B>(request, call, cancel).await
    }

    pub async fn create_with(&self, options: RequestOptions, cancel: CancellationToken) -> OperationResult<T> {
        self.base.create_with::<T>(options, cancel).await
    }

    pub async fn post<B: Serialize + ?Sized + Sync>(
        &self,
        request: &B,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        self.base.post::<T, B>(request, call, cancel).await
    }

    pub async fn post_with(&self, options: RequestOptions, cancel: CancellationToken) -> OperationResult<T> {
        self.base.post_with::<T>(options, cancel).await
    }

    pub async fn update<B: Serialize + ?Sized + Sync>(
        &self,
        id: Option<&str>,
        request: &B,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        self.base.update::<T, B>(id, request, call, cancel).await
    }

    pub async fn update_with(&self, options: RequestOptions, cancel: CancellationToken) -> OperationResult<T> {
        self.base.update_with::<T>(options, cancel).await
    }

    pub async fn put<B: Serialize + ?Sized + Sync>(
        &self,
        id: Option<&str>,
        request: &B,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        self.base.put::<T, B>(id, request, call, cancel).await
    }

    pub async fn put_with(&self, options: RequestOptions, cancel: CancellationToken) -> OperationResult<T> {
        self.base.put_with::<T>(options, cancel).await
    }

    pub async fn delete(
        &self,
        id: Option<&str>,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<T> {
        self.base.delete::<T>(id, call, cancel).await
    }

    pub async fn delete_with(&self, options: RequestOptions, cancel: CancellationToken) -> OperationResult<T> {
        self.base.delete_with::<T>(options, cancel).await
    }

    /// Uploads `content` as `file_name`. The result is the server's upload
    /// acknowledgement, not a `T`.
    pub async fn upload(
        &self,
        id: Option<&str>,
        content: Bytes,
        file_name: &str,
        call: &CallOptions,
        cancel: CancellationToken,
    ) -> OperationResult<FileUploadResponse> {
        self.base
            .upload::<FileUploadResponse>(id, content, file_name, call, cancel)
            .await
    }

    pub async fn upload_with(
        &self,
        options: RequestUploadOptions,
        cancel: CancellationToken,
    ) -> OperationResult<FileUploadResponse> {
        self.base.upload_with::<FileUploadResponse>(options, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockApiClient;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Widget {
        id: String,
        name: String,
    }

    #[tokio::test]
    async fn test_consumer_accepts_dyn_client() {
        let mut mock = MockApiClient::new();
        mock.expect_get("widgets/42")
            .return_ok(json!({ "id": "42", "name": "Foo" }));

        let client: Arc<dyn ApiClient> = Arc::new(mock.clone());
        let widgets: Consumer<Widget> = Consumer::new(client, "widgets").unwrap();

        let widget = widgets
            .get(Some("42"), &CallOptions::new(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(widget.id, "42");
        assert_eq!(widgets.prefix(), "widgets");
        mock.verify();
    }

    #[tokio::test]
    async fn test_create_and_post_are_aliases() {
        let mut mock = MockApiClient::new();
        mock.expect_post("widgets").return_ok(json!({ "id": "1", "name": "A" }));
        mock.expect_post("widgets").return_ok(json!({ "id": "1", "name": "A" }));

        let widgets: Consumer<Widget, MockApiClient> =
            Consumer::new(Arc::new(mock.clone()), "widgets").unwrap();
        let payload = json!({ "name": "A" });

        let created = widgets
            .create(&payload, &CallOptions::new(), CancellationToken::new())
            .await
            .unwrap();
        let posted = widgets
            .post(&payload, &CallOptions::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(created, posted);
        let requests = mock.requests();
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn test_update_and_put_are_aliases() {
        let mut mock = MockApiClient::new();
        mock.expect_put("widgets/1").return_ok(json!({ "id": "1", "name": "B" }));
        mock.expect_put("widgets/1").return_ok(json!({ "id": "1", "name": "B" }));

        let widgets: Consumer<Widget, MockApiClient> =
            Consumer::new(Arc::new(mock.clone()), "widgets").unwrap();
        let payload = json!({ "name": "B" });

        let updated = widgets
            .update(Some("1"), &payload, &CallOptions::new(), CancellationToken::new())
            .await
            .unwrap();
        let put = widgets
            .put(Some("1"), &payload, &CallOptions::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(updated, put);
        let requests = mock.requests();
        assert_eq!(requests[0], requests[1]);
    }

    #[test]
    fn test_empty_prefix_fails_fast() {
        let mock = MockApiClient::new();
        let result = Consumer::<Widget, _>::new(Arc::new(mock), "");
        assert!(matches!(result, Err(ConsumerError::InvalidArgument(_))));
    }
}
