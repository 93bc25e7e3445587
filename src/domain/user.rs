use super::UserId;
use super::codec::EncodedBalance;
use serde::{Deserialize, Serialize};

/// A user row as far as the ledger is concerned.
///
/// The balance is only ever held in its encoded form; decoding requires the key the
/// caller presents with each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub user_name: String,
    pub balance: EncodedBalance,
}

impl UserAccount {
    pub fn new(id: UserId, user_name: impl Into<String>, balance: EncodedBalance) -> Self {
        Self {
            id,
            user_name: user_name.into(),
            balance,
        }
    }
}
