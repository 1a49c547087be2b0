use std::path::Path;

use etx_core::controller::TransactionController;

/// Accept all tracked modifications and end the transaction.
pub fn run(project: &Path) -> anyhow::Result<()> {
    let ctrl = TransactionController::open(project)?;
    let tx = ctrl.commit()?;

    println!(
        "Committed transaction {} ({} file(s))",
        tx.transaction_id,
        tx.modified_files.len()
    );
    Ok(())
}
