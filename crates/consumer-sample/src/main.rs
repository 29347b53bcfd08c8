//! # Resource Consumer Sample
//!
//! Demonstrates a typed consumer against an in-memory backend.
//!
//! - **[backend]**: [`InMemoryApiClient`], an `ApiClient` that serves one collection from memory.
//! - **[model]**: The [`Widget`](consumer_sample::model::Widget) resource and its payloads.
//! - **[consumers]**: [`WidgetConsumer`], the domain wrapper around `Consumer<Widget>`.
//!
//! Run with `RUST_LOG=debug` to see every request the consumer sends.

use bytes::Bytes;
use consumer_sample::backend::InMemoryApiClient;
use consumer_sample::consumers::WidgetConsumer;
use consumer_sample::model::WidgetCreate;
use resource_consumer::observability::setup_tracing;
use resource_consumer::{ApiClient, ConsumerError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), ConsumerError> {
    setup_tracing();

    info!("Starting widget consumer sample");

    let client: Arc<dyn ApiClient> =
        Arc::new(InMemoryApiClient::new(WidgetConsumer::PREFIX).with_session("demo-session"));
    let widgets = WidgetConsumer::new(client)?;
    let cancel = CancellationToken::new();

    let span = tracing::info_span!("seeding");
    let sprocket = async {
        for (name, color, quantity) in [("Gear", "red", 4), ("Cog", "blue", 12), ("Gizmo", "red", 1)] {
            let params = WidgetCreate::new(name).color(color).quantity(quantity);
            widgets.create_widget(params, cancel.clone()).await?;
        }
        widgets
            .create_widget(WidgetCreate::new("Sprocket").quantity(7), cancel.clone())
            .await
    }
    .instrument(span)
    .await?;

    info!(id = %sprocket.id, "Widget created successfully");

    match widgets.find(&sprocket.id, cancel.clone()).await? {
        Some(widget) => info!(id = %widget.id, name = %widget.name, "Widget found"),
        None => warn!(id = %sprocket.id, "Widget disappeared"),
    }

    let page = widgets.search("g", 1, 2, cancel.clone()).await?;
    info!(
        returned = page.len(),
        total = page.total_count.unwrap_or_default(),
        more = page.has_more(),
        "Search finished"
    );

    let renamed = widgets.rename(&sprocket.id, "Sprocket Mk II", cancel.clone()).await?;
    info!(id = %renamed.id, name = %renamed.name, "Widget renamed");

    let uploaded = widgets
        .attach_file(&renamed.id, "manual.txt", Bytes::from_static(b"turn clockwise"), cancel.clone())
        .await?;
    info!(uri = %uploaded.uri, size = uploaded.size, "File attached");

    let removed = widgets.remove(&renamed.id, cancel.clone()).await?;
    info!(id = %removed.id, "Widget deleted");

    if widgets.find(&removed.id, cancel).await?.is_none() {
        info!(id = %removed.id, "Widget no longer exists");
    }

    info!("Sample completed successfully");
    Ok(())
}
