use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    marketlens_cli::main_entry().await
}
