#[tokio::main]
async fn main() -> anyhow::Result<()> {
  phase_coach_lib::run().await
}
