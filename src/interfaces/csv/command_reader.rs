use crate::domain::{AddressId, OrderId, ProductId, UserId};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Account,
    Product,
    Order,
    Cancel,
    Pay,
    Balance,
}

/// One row of the command file.
///
/// Columns: `type, user, order, product, address, quantity, amount, key`. Which
/// optional columns a row needs depends on its type.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Command {
    pub r#type: CommandType,
    pub user: UserId,
    #[serde(default)]
    pub order: Option<OrderId>,
    #[serde(default)]
    pub product: Option<ProductId>,
    #[serde(default)]
    pub address: Option<AddressId>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub key: Option<String>,
}

/// Reads commands from a CSV source.
///
/// Wraps `csv::Reader` and yields `Result<Command>` lazily, trimming whitespace and
/// accepting rows that leave trailing optional columns out.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
