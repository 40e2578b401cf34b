mod cli;
mod commands;
mod demo;
mod infra;
mod server;

use listing_review::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
