//! # Shift Commands

use anyhow::Result;

use posflow_client::{MetricCategory, PosClient};

pub async fn current(client: &PosClient) -> Result<()> {
    match client.current_shift().await? {
        Some(shift) => {
            println!("Shift {}", shift.id);
            let clocked_in = shift
                .clock_in_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            println!("  clocked in: {}", clocked_in);
            println!("  sales:      {}", shift.total_sales);
            println!("  expenses:   {}", shift.total_expenses);
        }
        None => println!("No open shift"),
    }
    Ok(())
}

pub async fn clock_in(client: &PosClient) -> Result<()> {
    let result = client.clock_in().await?;
    client.metrics().record(MetricCategory::ClockIns, result.elapsed_ms);

    println!("Clocked in, shift {}", result.shift_id);
    println!("  at {}", result.clock_in_time.to_rfc3339());
    println!("  {:.1} ms ({})", result.elapsed_ms, result.performance_grade);
    Ok(())
}

pub async fn clock_out(client: &PosClient, shift_id: Option<&str>) -> Result<()> {
    let result = client.clock_out(shift_id).await?;
    client.metrics().record(MetricCategory::ClockOuts, result.elapsed_ms);

    println!("Clocked out");
    println!("  total sales:    {}", result.total_sales);
    println!("  total expenses: {}", result.total_expenses);
    println!("  {:.1} ms ({})", result.elapsed_ms, result.performance_grade);
    Ok(())
}
