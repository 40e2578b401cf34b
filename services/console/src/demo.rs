use crate::cli::DemoArgs;
use crate::commands::{render_notifications, render_partition, render_summary};
use crate::infra::spawn_sandbox;
use listing_review::config::ApiConfig;
use listing_review::error::AppError;
use listing_review::workflows::review::{
    ConfirmOutcome, HttpListingStore, ListingId, ListingStatus, ReviewWorkflow, TokenStore,
};
use listing_review::workflows::sandbox::{demo_listings, InMemoryListingStore};
use std::sync::Arc;

const DEMO_TOKEN: &str = "demo-admin-token";

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { listing, status } = args;

    let sandbox =
        Arc::new(InMemoryListingStore::new(demo_listings())?.with_required_token(DEMO_TOKEN));
    let (addr, server) = spawn_sandbox(sandbox).await?;
    let base_url = format!("http://{addr}");

    let api = ApiConfig::new(&base_url)?;
    let store = Arc::new(HttpListingStore::new(&api)?);
    let session = Arc::new(TokenStore::logged_out());
    session.set_token(DEMO_TOKEN);
    let workflow = ReviewWorkflow::with_page_size(store, session, api.page_size);

    println!("Listing review demo (sandbox at {base_url})");
    workflow.select_tab(ListingStatus::Pending).await;
    render_summary(&workflow.summary());
    render_partition(ListingStatus::Pending, &workflow.active_view());

    workflow.refresh_all().await;
    let request = workflow.propose_transition(ListingId::parse(&listing), status)?;
    println!("\n{}", request.prompt());
    println!("Confirming on behalf of the reviewer.");

    let outcome = workflow.confirm_transition().await;
    render_notifications(&workflow.take_notifications());

    println!("\nAfter the change:");
    render_summary(&workflow.summary());
    workflow.select_tab(status).await;
    render_partition(status, &workflow.active_view());

    server.abort();
    match outcome {
        ConfirmOutcome::Failed { issue, .. } => Err(issue.into()),
        _ => Ok(()),
    }
}
