#[tokio::main]
async fn main() -> anyhow::Result<()> {
    circle_server::run().await
}
