use anyhow::Context;

use orderflow_infra::config::OrderflowConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    orderflow_observability::init();

    let config = OrderflowConfig::from_env();
    let app = orderflow_api::app::build_app(&config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        tax_rate = %config.pricing.tax_rate,
        invoice_due_days = config.billing.due_days,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
