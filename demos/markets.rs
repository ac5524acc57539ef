use ftx_rest::{to_decimal, ExchangeConfig, FtxBuilder, NumericPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Without FTX_API_KEY / FTX_SECRET_KEY only public endpoints are queried
    let config = ExchangeConfig::from_env("FTX")
        .unwrap_or_else(|_| ExchangeConfig::read_only())
        .numeric_policy(NumericPolicy::Decimal);
    let ftx = FtxBuilder::new().with_config(config.clone()).build()?;

    println!("Fetching markets...");
    let markets = ftx.fetch("markets", &[]).await?;
    for market in markets.as_array().into_iter().flatten().take(5) {
        println!(
            "Market: {} last={:?}",
            market["name"],
            to_decimal(&market["last"])
        );
    }

    if config.has_credentials() {
        let orders = ftx
            .fetch_authenticated("orders", &[("market", "BTC-PERP")])
            .await?;
        println!("Open BTC-PERP orders: {}", orders);
    }

    Ok(())
}
