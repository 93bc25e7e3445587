//! Domain types of the settlement core and the ports the stores implement.

pub mod codec;
pub mod money;
pub mod order;
pub mod ports;
pub mod product;
pub mod user;

pub type UserId = u32;
pub type OrderId = u32;
pub type ProductId = u32;
pub type AddressId = u32;
