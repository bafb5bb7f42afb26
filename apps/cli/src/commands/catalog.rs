//! # Catalog Commands

use std::time::Instant;

use anyhow::Result;

use posflow_client::PosClient;

pub async fn list(client: &PosClient, refresh: bool) -> Result<()> {
    let started = Instant::now();
    let products = client.products(refresh).await?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    println!("{:<12} {:<32} {:>10} {:>6}", "ID", "NAME", "PRICE", "QTY");
    for p in &products {
        println!("{:<12} {:<32} {:>10} {:>6}", p.id, p.name, p.price.to_string(), p.quantity);
    }
    println!("{} products in {:.1} ms", products.len(), elapsed_ms);
    Ok(())
}
