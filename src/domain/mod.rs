pub mod balance;
pub mod entities;
pub mod ports;
pub mod request;
pub mod transaction;
