use std::path::Path;

use etx_core::controller::TransactionController;

/// Start a transaction explicitly.
pub fn run(project: &Path, message: &str) -> anyhow::Result<()> {
    let ctrl = TransactionController::open(project)?;
    let options = ctrl.config().transaction_options();
    let tx = ctrl.begin(message, options)?;

    println!("Started transaction {}", tx.transaction_id);
    println!("  description: {}", tx.description);
    Ok(())
}
