//! Users Service - Entry Point

#[tokio::main]
async fn main() -> eyre::Result<()> {
    zerg_users_service::run().await
}
