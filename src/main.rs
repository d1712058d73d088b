#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    church_rides::run().await
}
