use std::path::Path;

use etx_core::controller::TransactionController;

/// Undo tracked modifications — the whole transaction, or back to a
/// savepoint when `to` is given (the transaction then stays active).
pub fn run(project: &Path, to: Option<&str>) -> anyhow::Result<()> {
    let ctrl = TransactionController::open(project)?;

    match to {
        Some(key) => {
            let restored = ctrl.rollback_to_savepoint(key)?;
            println!("Rolled back to savepoint {key} ({restored} file(s) restored)");
        }
        None => {
            let restored = ctrl.rollback()?;
            println!("Rolled back transaction ({restored} file(s) restored)");
        }
    }
    Ok(())
}
