pub mod read;
pub mod write;

pub use read::Bank;
pub use write::{BankUpdate, NewBank};
