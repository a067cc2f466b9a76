#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    siphon_cli::run_command(None).await?;

    Ok(())
}
