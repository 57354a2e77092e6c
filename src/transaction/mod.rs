/// Direction and amount classification
pub mod classifier;
/// Classified views over stored history
pub mod history;
/// Store notification relay
pub mod notifications;
/// Unlock, sign and broadcast
pub mod publisher;
/// Classified record types
pub mod types;

pub use classifier::{ClassifyError, UNMINED_HEIGHT, classify, classify_amounts};
pub use notifications::TransactionNotifier;
pub use publisher::TransactionPublisher;
pub use types::{ClassifiedTransaction, Direction, TransactionCredit, TransactionDebit};
