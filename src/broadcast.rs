//! Committed-year notifications.
//!
//! Every view that follows the cursor without driving it subscribes here
//! and drains its receiver once per frame.

use std::sync::mpsc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearCommitted {
    pub year: i32,
    pub index: usize,
}

#[derive(Default)]
pub struct YearBroadcast {
    subscribers: Vec<mpsc::Sender<YearCommitted>>,
}

impl YearBroadcast {
    pub fn subscribe(&mut self) -> mpsc::Receiver<YearCommitted> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Sends to every live subscriber; receivers that were dropped are forgotten.
    pub fn publish(&mut self, event: YearCommitted) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}
