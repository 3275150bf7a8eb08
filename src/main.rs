use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    whisk::run().await
}
