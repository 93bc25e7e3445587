use super::command_reader::CommandType;
use crate::application::response::Response;
use crate::domain::money::Money;
use crate::domain::{OrderId, UserId};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Result of one command, as written to the output CSV.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct Outcome {
    pub r#type: CommandType,
    pub user: UserId,
    pub order: Option<OrderId>,
    pub status: u32,
    pub msg: String,
    /// Balance after the command, when the command reveals one.
    pub balance: Option<String>,
    pub error: Option<String>,
}

impl Outcome {
    pub fn new(r#type: CommandType, user: UserId, response: Response) -> Self {
        Self {
            r#type,
            user,
            order: None,
            status: response.status,
            msg: response.msg,
            balance: None,
            error: response.error,
        }
    }

    pub fn with_order(mut self, order: OrderId) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_balance(mut self, balance: Money) -> Self {
        self.balance = Some(balance.to_canonical_string());
        self
    }
}

/// Writes outcomes as CSV rows, header first.
pub struct OutcomeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write(&mut self, outcome: &Outcome) -> Result<()> {
        self.writer.serialize(outcome)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
