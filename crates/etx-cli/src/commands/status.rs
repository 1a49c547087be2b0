use std::path::Path;

use etx_core::controller::TransactionController;

/// Render the persisted transaction state.
pub fn run(project: &Path) -> anyhow::Result<()> {
    let ctrl = TransactionController::open(project)?;

    let Some(tx) = ctrl.status()? else {
        println!("No transaction.");
        return Ok(());
    };

    println!("Transaction {}", tx.transaction_id);
    println!("  status:      {}", tx.status);
    println!("  started:     {}", tx.started_at.to_rfc3339());
    println!("  description: {}", tx.description);

    println!("  files:       {}", tx.modified_files.len());
    for (index, file) in tx.modified_files.iter().enumerate() {
        let marker = if file.is_new { " (new)" } else { "" };
        println!("    [{index}] {} via {}{marker}", file.path, file.tool);
    }

    println!("  savepoints:  {}", tx.savepoints.len());
    for sp in &tx.savepoints {
        println!("    {} @ file index {}", sp.name, sp.file_index);
    }

    let (passed, failed) = tx.verification_summary();
    println!("  verified:    {passed} passed, {failed} failed");
    Ok(())
}
