use crate::domain::codec::BalanceCodec;
use crate::domain::money::Money;
use crate::domain::ports::{StoreBox, UserRepository};
use crate::domain::user::UserAccount;
use crate::domain::UserId;
use crate::error::{PaymentError, Result};
use tracing::info;

/// Opening accounts and reading balances back.
pub struct AccountService {
    store: StoreBox,
    initial_grant: Money,
}

impl AccountService {
    pub fn new(store: StoreBox, initial_grant: Money) -> Self {
        Self {
            store,
            initial_grant,
        }
    }

    /// Opens an account holding the initial grant, encoded under `key`.
    pub async fn open(&self, user_id: UserId, user_name: &str, key: &str) -> Result<UserAccount> {
        let codec = BalanceCodec::new(key)?;
        let account = UserAccount::new(user_id, user_name, codec.encode(self.initial_grant));

        let mut tx = self.store.begin().await?;
        let exists = match tx.get_user(user_id).await {
            Ok(found) => match tx.user_name_taken(user_name).await {
                Ok(taken) => Ok(found.is_some() || taken),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        let inserted = match exists {
            Ok(true) => Err(PaymentError::ValidationError(format!(
                "user {user_id} ({user_name}) already exists"
            ))),
            Ok(false) => tx.insert_user(account.clone()).await,
            Err(e) => Err(e),
        };

        match inserted {
            Ok(()) => {
                tx.commit().await?;
                info!(user = user_id, "account opened");
                Ok(account)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// Decodes the balance of `user_id` with `key`.
    pub async fn balance(&self, user_id: UserId, key: &str) -> Result<Money> {
        let codec = BalanceCodec::new(key)?;
        let mut tx = self.store.begin().await?;
        let user = tx.get_user(user_id).await;
        tx.rollback().await?;

        let user = user?.ok_or(PaymentError::UserNotFound(user_id))?;
        codec
            .decode(&user.balance)
            .map_err(|source| PaymentError::LedgerDecode {
                user: user_id,
                source,
            })
    }
}
