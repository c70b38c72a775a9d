//! Infrastructure layer: storage adapters, notification delivery, scheduling.

pub mod notifications;
pub mod repository;
pub mod scheduler;

pub use notifications::{
    CycleOutcome, DeliveryReport, LogOnlySender, LowStockNotifier, NotificationSender,
    NotifierError, SmtpSender, SmtpSettings,
};
pub use repository::{
    AdminRepository, InMemoryAdminRepository, InMemoryStockRepository, PgStore, RepositoryError,
    StockRepository,
};
pub use scheduler::{
    CronSchedule, ManualTrigger, NotificationScheduler, SchedulerHandle, SchedulerState,
};
