use std::net::SocketAddr;
use std::sync::Arc;

use listing_review::config::ApiConfig;
use listing_review::workflows::review::{
    ConfirmOutcome, HttpListingStore, IssueKind, ListingId, ListingStatus, NotificationLevel,
    ReviewWorkflow, SummaryCounts, TokenStore,
};
use listing_review::workflows::sandbox::{demo_listings, sandbox_router, InMemoryListingStore};
use tokio::task::JoinHandle;

const TOKEN: &str = "admin-jwt";

struct Sandbox {
    store: Arc<InMemoryListingStore>,
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn start_sandbox() -> Sandbox {
    let store = Arc::new(
        InMemoryListingStore::new(demo_listings())
            .expect("demo ids are numeric")
            .with_required_token(TOKEN),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let app = sandbox_router(store.clone());
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("sandbox serves");
    });
    Sandbox {
        store,
        addr,
        server,
    }
}

fn workflow_for(
    sandbox: &Sandbox,
    token: &str,
) -> ReviewWorkflow<HttpListingStore, TokenStore> {
    let config = ApiConfig::new(&format!("http://{}", sandbox.addr)).expect("valid url");
    let store = Arc::new(HttpListingStore::new(&config).expect("client builds"));
    let session = Arc::new(TokenStore::logged_out());
    session.set_token(token);
    ReviewWorkflow::new(store, session)
}

#[tokio::test]
async fn approving_a_listing_moves_it_to_the_approved_tab() {
    let sandbox = start_sandbox().await;
    let workflow = workflow_for(&sandbox, TOKEN);

    workflow.select_tab(ListingStatus::Pending).await;
    assert_eq!(
        workflow.summary().counts,
        Some(SummaryCounts {
            pending: 2,
            approved: 0,
            rejected: 0,
            total: 2,
        })
    );
    assert_eq!(workflow.active_view().listings().len(), 2);

    workflow
        .propose_transition(ListingId::parse("42"), ListingStatus::Approved)
        .expect("42 is pending");
    let outcome = workflow.confirm_transition().await;
    assert!(matches!(outcome, ConfirmOutcome::Applied { .. }));

    assert_eq!(
        workflow.summary().counts,
        Some(SummaryCounts {
            pending: 1,
            approved: 1,
            rejected: 0,
            total: 2,
        })
    );
    workflow.select_tab(ListingStatus::Approved).await;
    let approved = workflow.active_view();
    assert_eq!(approved.listings().len(), 1);
    assert_eq!(approved.listings()[0].id, ListingId::Numeric(42));
    assert_eq!(sandbox.store.status_of(42), Some(ListingStatus::Approved));
}

#[tokio::test]
async fn failed_update_leaves_listing_pending() {
    let sandbox = start_sandbox().await;
    let workflow = workflow_for(&sandbox, "stale-token");

    workflow.select_tab(ListingStatus::Pending).await;
    workflow
        .propose_transition(ListingId::Numeric(42), ListingStatus::Approved)
        .expect("42 is pending");
    let outcome = workflow.confirm_transition().await;

    assert!(matches!(outcome, ConfirmOutcome::Failed { .. }));
    let notifications = workflow.take_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Blocking);
    assert_eq!(notifications[0].kind, Some(IssueKind::SessionRejected));

    workflow.load_partition(ListingStatus::Pending).await;
    let pending = workflow.partition(ListingStatus::Pending);
    assert!(pending
        .listings()
        .iter()
        .any(|listing| listing.id == ListingId::Numeric(42)
            && listing.status == ListingStatus::Pending));
    assert_eq!(sandbox.store.status_of(42), Some(ListingStatus::Pending));
}

#[tokio::test]
async fn cancelled_proposal_sends_nothing() {
    let sandbox = start_sandbox().await;
    let workflow = workflow_for(&sandbox, TOKEN);

    workflow.select_tab(ListingStatus::Pending).await;
    let before = workflow.active_view();
    workflow
        .propose_transition(ListingId::Numeric(41), ListingStatus::Rejected)
        .expect("41 is pending");
    workflow.cancel_transition();

    assert_eq!(workflow.active_view(), before);
    assert_eq!(sandbox.store.status_of(41), Some(ListingStatus::Pending));
    assert_eq!(workflow.confirm_transition().await, ConfirmOutcome::NothingPending);
}

#[tokio::test]
async fn string_keyed_listing_can_be_targeted_by_number() {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/properties/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pending": 1, "total": 1 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/properties"))
        .and(query_param("status", "PENDING"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "id": "42", "title": "Victorian terrace", "status": "PENDING" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/properties"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/admin/properties/42/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "42", "status": "APPROVED" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ApiConfig::new(&server.uri()).expect("valid url");
    let store = Arc::new(HttpListingStore::new(&config).expect("client builds"));
    let session = Arc::new(TokenStore::logged_out());
    session.set_token(TOKEN);
    let workflow = ReviewWorkflow::new(store, session);

    workflow.select_tab(ListingStatus::Pending).await;
    let request = workflow
        .propose_transition(ListingId::parse("42"), ListingStatus::Approved)
        .expect("string id resolved");

    assert_eq!(request.listing_id, ListingId::Text("42".to_string()));
    assert!(matches!(
        workflow.confirm_transition().await,
        ConfirmOutcome::Applied { .. }
    ));
}
