use std::path::Path;

use etx_core::controller::TransactionController;

/// Create a savepoint in the active transaction.
pub fn run(project: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let ctrl = TransactionController::open(project)?;
    let sp = ctrl.create_savepoint(name)?;

    println!("Created savepoint {} (file index {})", sp.name, sp.file_index);
    Ok(())
}
