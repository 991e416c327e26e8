//! Running a capped search on a worker thread

use reconcile_core::{
    search_with_cancellation, AmountEntry, CancellationToken, Milliunits, SearchOptions,
};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(true).init();

    // Sixty small transactions: far too many combinations to enumerate
    let amounts: Vec<AmountEntry> = (1..=60)
        .map(|i| AmountEntry::new(format!("txn-{:02}", i), (i * 37 % 101) * 10))
        .collect();

    let token = CancellationToken::new();
    let worker_token = token.clone();
    let worker = std::thread::spawn(move || {
        let options = SearchOptions::new(1_000).with_work_budget(5_000_000);
        search_with_cancellation(&amounts, Milliunits(12_340), &options, &worker_token)
    });

    // The user closed the dialog
    std::thread::sleep(Duration::from_millis(20));
    token.cancel();

    let result = worker
        .join()
        .map_err(|_| "search thread panicked")??;

    println!(
        "Found {} matches after visiting {} nodes (stopped: {:?}, partial: {})",
        result.len(),
        result.nodes_visited,
        result.stop_reason,
        result.partial
    );
    if let Some(first) = result.first() {
        println!("First match: {}", first.transaction_ids.join(", "));
    }

    Ok(())
}
