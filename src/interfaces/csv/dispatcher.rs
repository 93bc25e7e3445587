use super::command_reader::{Command, CommandType};
use super::outcome_writer::Outcome;
use crate::application::accounts::AccountService;
use crate::application::catalog::{CatalogService, NewProduct};
use crate::application::orders::{NewOrder, OrderService};
use crate::application::response::Response;
use crate::application::settlement::SettlementService;
use crate::config::SettlementConfig;
use crate::domain::OrderId;
use crate::domain::money::Money;
use crate::domain::ports::Store;
use crate::error::{PaymentError, Result};
use tracing::debug;

/// Routes CSV commands to the application services, all sharing one store.
pub struct CommandDispatcher {
    accounts: AccountService,
    catalog: CatalogService,
    orders: OrderService,
    settlement: SettlementService,
}

fn required<T>(value: Option<T>, column: &str) -> Result<T> {
    value.ok_or_else(|| PaymentError::ValidationError(format!("missing {column}")))
}

impl CommandDispatcher {
    pub fn new<S: Store + Clone + 'static>(store: S, config: SettlementConfig) -> Self {
        Self {
            accounts: AccountService::new(Box::new(store.clone()), config.initial_grant),
            catalog: CatalogService::new(Box::new(store.clone())),
            orders: OrderService::new(Box::new(store.clone())),
            settlement: SettlementService::new(Box::new(store), config),
        }
    }

    pub async fn dispatch(&self, command: Command) -> Outcome {
        let kind = command.r#type;
        let user = command.user;
        let order = command.order;
        let result = self.execute(command).await;

        let response = Response::from_result(&result, success_message(kind));
        if !response.is_success() {
            debug!(?kind, user, status = response.status, "command failed");
        }
        let mut outcome = Outcome::new(kind, user, response);
        if let Some(order) = result.as_ref().ok().and_then(|done| done.order).or(order) {
            outcome = outcome.with_order(order);
        }
        if let Ok(Executed {
            balance: Some(balance),
            ..
        }) = result
        {
            outcome = outcome.with_balance(balance);
        }
        outcome
    }

    async fn execute(&self, command: Command) -> Result<Executed> {
        let Command {
            r#type,
            user,
            order,
            product,
            address,
            quantity,
            amount,
            key,
        } = command;

        match r#type {
            CommandType::Account => {
                let key = required(key, "key")?;
                self.accounts.open(user, &format!("user-{user}"), &key).await?;
                let balance = self.accounts.balance(user, &key).await?;
                Ok(Executed::default().with_balance(balance))
            }
            CommandType::Product => {
                let id = required(product, "product")?;
                self.catalog
                    .register(NewProduct {
                        id,
                        seller_id: user,
                        name: format!("product-{id}"),
                        price: required(amount, "amount")?,
                        stock: required(quantity, "quantity")?,
                    })
                    .await?;
                Ok(Executed::default())
            }
            CommandType::Order => {
                let quantity = u32::try_from(required(quantity, "quantity")?).map_err(|_| {
                    PaymentError::ValidationError("quantity out of range".to_string())
                })?;
                let placed = self
                    .orders
                    .place(
                        user,
                        NewOrder {
                            product_id: required(product, "product")?,
                            address_id: address.unwrap_or_default(),
                            quantity,
                        },
                    )
                    .await?;
                Ok(Executed::default().with_order(placed.id))
            }
            CommandType::Cancel => {
                let order = required(order, "order")?;
                self.orders.cancel(order, user).await?;
                Ok(Executed::default().with_order(order))
            }
            CommandType::Pay => {
                let order = required(order, "order")?;
                let key = required(key, "key")?;
                let receipt = self.settlement.pay(order, user, &key).await?;
                Ok(Executed::default()
                    .with_order(order)
                    .with_balance(receipt.buyer_balance))
            }
            CommandType::Balance => {
                let key = required(key, "key")?;
                let balance = self.accounts.balance(user, &key).await?;
                Ok(Executed::default().with_balance(balance))
            }
        }
    }
}

/// What a successful command reports beyond its status.
#[derive(Debug, Default)]
struct Executed {
    order: Option<OrderId>,
    balance: Option<Money>,
}

impl Executed {
    fn with_order(mut self, order: OrderId) -> Self {
        self.order = Some(order);
        self
    }

    fn with_balance(mut self, balance: Money) -> Self {
        self.balance = Some(balance);
        self
    }
}

fn success_message(kind: CommandType) -> &'static str {
    match kind {
        CommandType::Account => "account opened",
        CommandType::Product => "product registered",
        CommandType::Order => "order placed",
        CommandType::Cancel => "order cancelled",
        CommandType::Pay => "paid successfully",
        CommandType::Balance => "ok",
    }
}
