//! Transaction handle threaded through operator execution.
//!
//! The handle is opaque to the execution core: operators only forward it to
//! child operators and to the table. Tables use it to reject writes after
//! commit and to log every mutation, which is what an external transaction
//! manager would need to undo partial effects.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use kestrel_common::error::TransactionError;
use kestrel_common::prelude::*;

/// A mutation applied under a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TrxOperation {
    Insert {
        table: String,
        rid: RowId,
    },
    Update {
        table: String,
        rid: RowId,
        old: Vec<Value>,
        new: Vec<Value>,
    },
}

#[derive(Debug)]
struct TrxState {
    id: TxnId,
    committed: AtomicBool,
    log: Mutex<Vec<TrxOperation>>,
}

/// Transaction handle.
///
/// Clones share the same transaction, so an operator may keep the handle it
/// was opened with until it is closed.
#[derive(Debug, Clone)]
pub struct Trx {
    state: Arc<TrxState>,
}

impl Trx {
    pub fn new(id: TxnId) -> Self {
        Self {
            state: Arc::new(TrxState {
                id,
                committed: AtomicBool::new(false),
                log: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> TxnId {
        self.state.id
    }

    pub fn is_committed(&self) -> bool {
        self.state.committed.load(Ordering::Acquire)
    }

    /// Fail if the transaction can no longer accept writes.
    pub fn check_active(&self) -> Result<()> {
        if self.is_committed() {
            return Err(TransactionError::AlreadyCommitted(self.state.id.0).into());
        }
        Ok(())
    }

    /// Append an applied mutation to the transaction log.
    pub fn record(&self, op: TrxOperation) {
        self.state.log.lock().push(op);
    }

    /// Snapshot of the mutations applied so far, in order.
    pub fn operations(&self) -> Vec<TrxOperation> {
        self.state.log.lock().clone()
    }

    pub fn update_count(&self) -> usize {
        self.state
            .log
            .lock()
            .iter()
            .filter(|op| matches!(op, TrxOperation::Update { .. }))
            .count()
    }

    pub fn commit(&self) -> Result<()> {
        if self.state.committed.swap(true, Ordering::AcqRel) {
            return Err(TransactionError::AlreadyCommitted(self.state.id.0).into());
        }
        debug!(txn = %self.state.id, ops = self.state.log.lock().len(), "transaction committed");
        Ok(())
    }
}

/// Hands out monotonically increasing transaction ids.
#[derive(Debug)]
pub struct TrxFactory {
    next_id: AtomicU64,
}

impl Default for TrxFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TrxFactory {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    pub fn begin(&self) -> Trx {
        Trx::new(TxnId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }
}
