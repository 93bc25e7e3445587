//! CSV front end of the `orderpay` binary: commands in, outcomes out.

pub mod command_reader;
pub mod dispatcher;
pub mod outcome_writer;
