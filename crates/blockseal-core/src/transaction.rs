use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A value transfer recorded in a block. Field order is the canonical
/// encoding order and must not change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
    pub payload: String,
}

impl Transaction {
    /// Payload defaults to "<sender> pays <receiver>".
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: u64) -> Self {
        let sender = sender.into();
        let receiver = receiver.into();
        let payload = format!("{sender} pays {receiver}");
        Self {
            sender,
            receiver,
            amount,
            payload,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Canonical bytes fed to the merkle leaf hash.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
