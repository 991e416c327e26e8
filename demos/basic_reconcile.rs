//! Basic reconciliation assistant example

use chrono::NaiveDate;
use reconcile_core::utils::MemoryLedger;
use reconcile_core::{
    ClearedStatus, LedgerSource, Milliunits, ReconcileRequest, ReconciliationEngine,
    SearchConfig, Transaction,
};

fn units(amount: Milliunits) -> String {
    format!("{:.3}", amount.value() as f64 / 1000.0)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(true)
        .init();

    println!("Reconcile Core - Basic Reconciliation Example\n");

    // 1. A checking account with a few uncleared transactions
    let mut ledger = MemoryLedger::new();
    ledger.open_account("checking", Milliunits(500_000))?;

    let date = |d| NaiveDate::from_ymd_opt(2024, 8, d).unwrap();
    let transactions = vec![
        Transaction::with_generated_id(date(1), "-42.17", ClearedStatus::Uncleared)
            .with_payee("Power Company"),
        Transaction::with_generated_id(date(2), "-15.00", ClearedStatus::Uncleared)
            .with_payee("Streaming"),
        Transaction::with_generated_id(date(3), "-27.17", ClearedStatus::Uncleared)
            .with_payee("Pharmacy"),
        Transaction::with_generated_id(date(5), "2100.00", ClearedStatus::Uncleared)
            .with_payee("Employer"),
        Transaction::with_generated_id(date(6), "-9.99", ClearedStatus::Uncleared)
            .with_payee("App Store"),
    ];
    for txn in transactions {
        ledger.add_transaction("checking", txn)?;
    }

    let cleared = ledger.cleared_balance("checking").await?;
    println!("Cleared balance: {}", units(cleared));

    // 2. The statement says the balance should be 457.83
    let engine = ReconciliationEngine::from_config(&SearchConfig::from_env())?;
    let request = ReconcileRequest::new("checking", "457.83");
    let assistance = engine.assist(&ledger, &request).await?;

    println!(
        "Target: {} across {} eligible transactions",
        units(assistance.target),
        assistance.eligible_count
    );
    if assistance.result.partial {
        println!("(search was capped, these are the best matches found so far)");
    }

    let payees: Vec<(String, String)> = ledger
        .get_transactions("checking")
        .await?
        .into_iter()
        .map(|t| (t.id, t.payee.unwrap_or_default()))
        .collect();
    let payee = |id: &str| {
        payees
            .iter()
            .find(|(txn_id, _)| txn_id == id)
            .map(|(_, payee)| payee.clone())
            .unwrap_or_default()
    };

    for (n, candidate) in assistance.result.smallest_first().iter().enumerate() {
        let names: Vec<String> = candidate
            .transaction_ids
            .iter()
            .map(|id| payee(id.as_str()))
            .collect();
        println!("  Match {}: {}", n + 1, names.join(" + "));
    }

    // 3. Clear the first suggestion
    if let Some(chosen) = assistance.result.smallest_first().first() {
        engine
            .apply_candidate(&mut ledger, "checking", chosen)
            .await?;
        let cleared = ledger.cleared_balance("checking").await?;
        println!("\nCleared balance after applying: {}", units(cleared));
    } else {
        println!("\nNo combination of uncleared transactions matches the statement.");
    }

    Ok(())
}
