use crate::cli::{ConnectArgs, ListArgs, SetStatusArgs};
use listing_review::config::{ApiConfig, AppConfig};
use listing_review::error::AppError;
use listing_review::workflows::review::{
    AccessToken, ConfirmOutcome, HttpListingStore, Listing, ListingId, ListingStatus,
    LoadOutcome, Notification, NotificationLevel, PartitionView, ReviewIssue, ReviewWorkflow,
    SummaryView, TokenStore,
};
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub(crate) type ConsoleWorkflow = ReviewWorkflow<HttpListingStore, TokenStore>;

pub(crate) fn connect(
    config: &AppConfig,
    args: &ConnectArgs,
    token: Option<&str>,
) -> Result<ConsoleWorkflow, AppError> {
    let mut api = config.api.clone();
    if let Some(url) = args.api_url.as_deref() {
        api.base_url = ApiConfig::normalize_base_url(url)?;
    }

    let store = Arc::new(HttpListingStore::new(&api)?);
    let token = token
        .or(config.session.access_token.as_deref())
        .and_then(|raw| AccessToken::new(raw));
    let session = Arc::new(TokenStore::new(token));
    Ok(ReviewWorkflow::with_page_size(store, session, api.page_size))
}

pub(crate) async fn run_summary(config: &AppConfig, args: ConnectArgs) -> Result<(), AppError> {
    let workflow = connect(config, &args, None)?;
    if let LoadOutcome::Failed { issue } = workflow.load_summary().await {
        return Err(issue.into());
    }

    let summary = workflow.summary();
    if args.json {
        print_json(&summary.counts_or_zero());
    } else {
        render_summary(&summary);
    }
    Ok(())
}

pub(crate) async fn run_list(config: &AppConfig, args: ListArgs) -> Result<(), AppError> {
    let ListArgs { connect: connect_args, status } = args;
    let workflow = connect(config, &connect_args, None)?;
    if let LoadOutcome::Failed { issue } = workflow.select_tab(status).await {
        return Err(issue.into());
    }

    if connect_args.json {
        print_json(&workflow.snapshot());
    } else {
        render_summary(&workflow.summary());
        render_partition(status, &workflow.active_view());
    }
    Ok(())
}

pub(crate) async fn run_set_status(config: &AppConfig, args: SetStatusArgs) -> Result<(), AppError> {
    let SetStatusArgs {
        connect: connect_args,
        id,
        status,
        token,
        yes,
    } = args;
    let workflow = connect(config, &connect_args, token.as_deref())?;

    workflow.refresh_all().await;
    let request = workflow.propose_transition(ListingId::parse(&id), status)?;
    println!("{}", request.prompt());

    if !yes && !confirm_on_stdin().await? {
        workflow.cancel_transition();
        println!("Cancelled; no changes were sent.");
        return Ok(());
    }

    let outcome = workflow.confirm_transition().await;
    render_notifications(&workflow.take_notifications());

    match outcome {
        ConfirmOutcome::Applied { .. } => {
            render_summary(&workflow.summary());
            Ok(())
        }
        ConfirmOutcome::Failed { issue, .. } => Err(issue.into()),
        ConfirmOutcome::LoginRequired { .. } => Err(ReviewIssue::login_required().into()),
        ConfirmOutcome::NothingPending => Ok(()),
    }
}

async fn confirm_on_stdin() -> Result<bool, AppError> {
    println!("Type 'yes' to confirm, anything else to cancel:");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

pub(crate) fn render_summary(summary: &SummaryView) {
    if let Some(issue) = &summary.issue {
        println!("Summary unavailable: {}", issue.message);
        return;
    }
    let counts = summary.counts_or_zero();
    println!(
        "Pending {} | Approved {} | Rejected {} | Total {}",
        counts.pending, counts.approved, counts.rejected, counts.total
    );
}

pub(crate) fn render_partition(status: ListingStatus, view: &PartitionView) {
    println!("\n{} listings", status.label());
    match view {
        PartitionView::Failed { issue } => println!("  {}", issue.message),
        PartitionView::Loaded { listings } if listings.is_empty() => {
            println!("  No {} listings.", status.key())
        }
        PartitionView::Loaded { listings } => {
            for listing in listings {
                println!("{}", listing_line(listing));
            }
        }
        PartitionView::NotLoaded | PartitionView::Loading => println!("  Loading..."),
    }
}

pub(crate) fn render_notifications(notifications: &[Notification]) {
    for notification in notifications {
        match notification.level {
            NotificationLevel::Info => println!("{}", notification.message),
            NotificationLevel::Blocking => println!("!! {}", notification.message),
        }
    }
}

fn listing_line(listing: &Listing) -> String {
    let actions = listing
        .status
        .actions()
        .iter()
        .map(|action| action.label)
        .collect::<Vec<_>>()
        .join(" / ");
    let location = listing.location();
    let location = if location.is_empty() {
        "location unknown".to_string()
    } else {
        location
    };

    format!(
        "  #{id} {title} ({location}) {price}\n     seller [{initials}] {owner} | {path} | actions: {actions}",
        id = listing.id,
        title = listing.title(),
        price = listing.formatted_price(),
        initials = listing.owner_initials(),
        owner = listing.display_owner(),
        path = listing.details_path(),
    )
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("{}", json!({ "error": err.to_string() })),
    }
}
