//! # Widget Consumer
//!
//! Provides a high-level API for the widgets resource.
//! It wraps a `Consumer<Widget>` and adds domain-specific methods on top of the
//! generic operations, which stay reachable through [`WidgetConsumer::inner`].
use crate::model::{Widget, WidgetCreate, WidgetUpdate};
use bytes::Bytes;
use resource_consumer::{
    ApiClient, CallOptions, Consumer, ConsumerError, FileUploadResponse, OperationResult,
    PagedResult, RequestDataOptions,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Consumer for the `widgets` collection.
#[derive(Clone)]
pub struct WidgetConsumer {
    inner: Consumer<Widget>,
}

impl WidgetConsumer {
    pub const PREFIX: &'static str = "widgets";

    pub fn new(client: Arc<dyn ApiClient>) -> Result<Self, ConsumerError> {
        Ok(Self {
            inner: Consumer::new(client, Self::PREFIX)?,
        })
    }

    /// The generic consumer, for calls the helpers below don't cover.
    pub fn inner(&self) -> &Consumer<Widget> {
        &self.inner
    }

    #[instrument(skip(self, cancel))]
    pub async fn create_widget(
        &self,
        params: WidgetCreate,
        cancel: CancellationToken,
    ) -> OperationResult<Widget> {
        debug!("Sending request");
        self.inner.create(&params, &CallOptions::new(), cancel).await
    }

    /// Looks a widget up by id. A 404 from the server is `Ok(None)`.
    #[instrument(skip(self, cancel))]
    pub async fn find(&self, id: &str, cancel: CancellationToken) -> OperationResult<Option<Widget>> {
        debug!("Sending request");
        match self.inner.get(Some(id), &CallOptions::new(), cancel).await {
            Ok(widget) => Ok(Some(widget)),
            Err(e) if e.status() == Some(404) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, cancel))]
    pub async fn rename(&self, id: &str, name: &str, cancel: CancellationToken) -> OperationResult<Widget> {
        debug!("Sending request");
        self.inner
            .update(Some(id), &WidgetUpdate::rename(name), &CallOptions::new(), cancel)
            .await
    }

    /// Searches widget names, ordered by name. Pages are 1-based.
    #[instrument(skip(self, cancel))]
    pub async fn search(
        &self,
        term: &str,
        page: u32,
        page_size: u32,
        cancel: CancellationToken,
    ) -> OperationResult<PagedResult<Widget>> {
        debug!("Sending request");
        let data = RequestDataOptions::new()
            .page(page, page_size)
            .search(term)
            .order_by("name", false);
        self.inner.get_all(Some(&data), &CallOptions::new(), cancel).await
    }

    #[instrument(skip(self, content, cancel), fields(size = content.len()))]
    pub async fn attach_file(
        &self,
        id: &str,
        file_name: &str,
        content: Bytes,
        cancel: CancellationToken,
    ) -> OperationResult<FileUploadResponse> {
        debug!("Sending request");
        self.inner
            .upload(Some(id), content, file_name, &CallOptions::new(), cancel)
            .await
    }

    /// Deletes a widget and returns it as it was before removal.
    #[instrument(skip(self, cancel))]
    pub async fn remove(&self, id: &str, cancel: CancellationToken) -> OperationResult<Widget> {
        debug!("Sending request");
        self.inner.delete(Some(id), &CallOptions::new(), cancel).await
    }
}
