//! Payment ledger aggregate

pub mod model;
pub mod repository;

pub use model::{
    payment_method_label, Transaction, TransactionStatus, TransactionSummary, TransactionType,
};
pub use repository::TransactionRepository;
