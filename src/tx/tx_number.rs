use std::sync::atomic::{AtomicI32, Ordering};

use crate::common::TxNum;

/// Hands out unique transaction numbers.
#[derive(Debug, Default)]
pub struct TxNumberGenerator {
    last: AtomicI32,
}

impl TxNumberGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_tx_num(&self) -> TxNum {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }
}
