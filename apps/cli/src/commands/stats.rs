//! # Stats Commands

use anyhow::Result;
use tracing::warn;

use posflow_client::PosClient;

pub async fn show(client: &PosClient) -> Result<()> {
    match client.monitor_stats().await {
        Ok(stats) => {
            println!("Business");
            println!("  total sales:    {}", stats.total_sales);
            println!("  total expenses: {}", stats.total_expenses);
            println!("  net profit:     {}", stats.net_profit);
            println!("  transactions:   {}", stats.transaction_count);
        }
        Err(e) if e.is_auth_error() => {
            warn!(error = %e, "Monitor stats need an admin session");
            println!("Business: not available for this account");
        }
        Err(e) => return Err(e.into()),
    }

    let today = client.session().daily_stats();
    println!("Today{}", today.date.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default());
    println!("  total sales:    {}", today.total_sales);
    println!("  transactions:   {}", today.transaction_count);
    Ok(())
}

/// Prints the latency recorder and logs the same figures.
pub fn print_metrics(client: &PosClient) {
    let metrics = client.metrics();
    println!(
        "{:<10} {:>6} {:>9} {:>9} {:>9} {:>9}",
        "CATEGORY", "COUNT", "AVG", "MIN", "MAX", "P95"
    );
    for (category, s) in metrics.snapshot() {
        println!(
            "{:<10} {:>6} {:>9.1} {:>9.1} {:>9.1} {:>9.1}",
            category.as_str(),
            s.count,
            s.avg,
            s.min,
            s.max,
            s.p95
        );
    }
    metrics.log_summary();
}
