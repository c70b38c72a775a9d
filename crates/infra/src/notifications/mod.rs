//! Low-stock alerts: rendering, delivery, and the notification cycle.

mod low_stock;
mod message;
mod sender;

pub use low_stock::{CycleOutcome, DeliveryFailure, DeliveryReport, LowStockNotifier, NotifierError};
pub use message::{OutgoingMessage, low_stock_message};
pub use sender::{LogOnlySender, NotificationSender, SendError, SmtpSender, SmtpSettings};
