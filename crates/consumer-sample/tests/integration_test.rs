use bytes::Bytes;
use consumer_sample::backend::InMemoryApiClient;
use consumer_sample::consumers::WidgetConsumer;
use consumer_sample::model::{Widget, WidgetCreate, WidgetUpdate};
use resource_consumer::{
    ApiClient, CallOptions, ConsumerError, RequestDataOptions, RequestOptions,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// End-to-end: WidgetConsumer -> Consumer<Widget> -> BaseConsumer -> InMemoryApiClient.
fn signed_in() -> (Arc<InMemoryApiClient>, WidgetConsumer) {
    let backend = Arc::new(InMemoryApiClient::new("widgets").with_session("test-session"));
    let client: Arc<dyn ApiClient> = backend.clone();
    (backend, WidgetConsumer::new(client).unwrap())
}

async fn seed(widgets: &WidgetConsumer, names: &[&str]) -> Vec<Widget> {
    let mut created = Vec::new();
    for name in names {
        let widget = widgets
            .create_widget(WidgetCreate::new(*name), CancellationToken::new())
            .await
            .unwrap();
        created.push(widget);
    }
    created
}

#[tokio::test]
async fn test_widget_lifecycle() {
    let (backend, widgets) = signed_in();

    let created = widgets
        .create_widget(
            WidgetCreate::new("Gear").color("red").quantity(3),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(created.id, "widget_1");
    assert_eq!(created.color.as_deref(), Some("red"));

    let found = widgets.find(&created.id, CancellationToken::new()).await.unwrap();
    assert_eq!(found, Some(created.clone()));

    let renamed = widgets
        .rename(&created.id, "Big Gear", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(renamed.name, "Big Gear");
    // Fields absent from the update are left alone.
    assert_eq!(renamed.quantity, 3);

    let uploaded = widgets
        .attach_file(&created.id, "spec.pdf", Bytes::from_static(b"%PDF"), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(uploaded.uri, "widgets/widget_1/spec.pdf");
    assert_eq!(uploaded.size, 4);
    assert_eq!(backend.files(&created.id), vec![uploaded]);

    let removed = widgets.remove(&created.id, CancellationToken::new()).await.unwrap();
    assert_eq!(removed.name, "Big Gear");
    assert!(backend.is_empty());
    assert_eq!(widgets.find(&created.id, CancellationToken::new()).await.unwrap(), None);
}

#[tokio::test]
async fn test_not_found_passes_through_as_problem() {
    let (_, widgets) = signed_in();

    let err = widgets
        .inner()
        .get(Some("widget_404"), &CallOptions::new(), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    let problem = err.problem().unwrap();
    assert_eq!(problem.title.as_deref(), Some("Not Found"));
    assert_eq!(problem.instance.as_deref(), Some("widgets/widget_404"));
}

#[tokio::test]
async fn test_anonymous_access_requires_flag() {
    let client: Arc<dyn ApiClient> = Arc::new(InMemoryApiClient::new("widgets"));
    let widgets = WidgetConsumer::new(client).unwrap();

    let denied = widgets
        .inner()
        .get_all(None, &CallOptions::new(), CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(denied.status(), Some(401));

    let page = widgets
        .inner()
        .get_all(None, &CallOptions::anonymous(), CancellationToken::new())
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total_count, Some(0));
}

#[tokio::test]
async fn test_search_pages_through_matches() {
    let (_, widgets) = signed_in();
    seed(&widgets, &["Gizmo", "Cog", "Gear", "Gadget", "Sprocket"]).await;

    let first = widgets.search("g", 1, 2, CancellationToken::new()).await.unwrap();
    let names: Vec<&str> = first.items.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, ["Cog", "Gadget"]);
    assert_eq!(first.total_count, Some(4));
    assert!(first.has_more());

    let last = widgets.search("g", 2, 2, CancellationToken::new()).await.unwrap();
    let names: Vec<&str> = last.items.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, ["Gear", "Gizmo"]);
    assert!(!last.has_more());
}

#[tokio::test]
async fn test_filters_and_descending_order() {
    let (_, widgets) = signed_in();
    for (name, color) in [("A", "red"), ("B", "blue"), ("C", "red")] {
        widgets
            .create_widget(WidgetCreate::new(name).color(color), CancellationToken::new())
            .await
            .unwrap();
    }

    let data = RequestDataOptions::new()
        .filter("color", "red")
        .order_by("name", true);
    let page = widgets
        .inner()
        .get_all(Some(&data), &CallOptions::new(), CancellationToken::new())
        .await
        .unwrap();

    let names: Vec<&str> = page.items.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, ["C", "A"]);
}

#[tokio::test]
async fn test_order_by_quantity_is_numeric() {
    let (_, widgets) = signed_in();
    for (name, quantity) in [("A", 4), ("B", 12), ("C", 1)] {
        widgets
            .create_widget(WidgetCreate::new(name).quantity(quantity), CancellationToken::new())
            .await
            .unwrap();
    }

    let ascending = RequestDataOptions::new().order_by("quantity", false);
    let page = widgets
        .inner()
        .get_all(Some(&ascending), &CallOptions::new(), CancellationToken::new())
        .await
        .unwrap();
    let quantities: Vec<u32> = page.items.iter().map(|w| w.quantity).collect();
    assert_eq!(quantities, [1, 4, 12]);

    let descending = RequestDataOptions::new().order_by("quantity", true);
    let page = widgets
        .inner()
        .get_all(Some(&descending), &CallOptions::new(), CancellationToken::new())
        .await
        .unwrap();
    let quantities: Vec<u32> = page.items.iter().map(|w| w.quantity).collect();
    assert_eq!(quantities, [12, 4, 1]);
}

#[tokio::test]
async fn test_validation_error_on_bad_payload() {
    let (_, widgets) = signed_in();

    let err = widgets
        .inner()
        .create_with(
            RequestOptions::new("widgets").with_body(serde_json::json!(["not", "an", "object"])),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));

    // An update with no fields set is still a valid (empty) merge.
    seed(&widgets, &["Gear"]).await;
    let unchanged = widgets
        .inner()
        .update(Some("widget_1"), &WidgetUpdate::default(), &CallOptions::new(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(unchanged.name, "Gear");
}

#[tokio::test]
async fn test_override_uri_reaches_other_route() {
    let (_, widgets) = signed_in();

    let err = widgets
        .inner()
        .get(
            Some("1"),
            &CallOptions::new().with_uri("gadgets/1"),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.problem().and_then(|p| p.instance.as_deref()), Some("gadgets/1"));
}

#[tokio::test]
async fn test_cancellation_during_latency() {
    let client: Arc<dyn ApiClient> = Arc::new(
        InMemoryApiClient::new("widgets")
            .with_session("test-session")
            .with_latency(Duration::from_secs(10)),
    );
    let widgets = WidgetConsumer::new(client).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = widgets.find("widget_1", cancel).await;
    assert!(matches!(result, Err(ConsumerError::Cancelled)));
}

#[tokio::test]
async fn test_concurrent_creates_get_unique_ids() {
    let (backend, widgets) = signed_in();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let widgets = widgets.clone();
            tokio::spawn(async move {
                widgets
                    .create_widget(WidgetCreate::new(format!("W{}", i)), CancellationToken::new())
                    .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(backend.len(), 8);
}
