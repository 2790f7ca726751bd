pub mod artifacts;
pub mod events;
pub mod filters;
pub mod ports;
pub mod services;

// Re-export key types for convenience
pub use events::{create_event_bus, Event, EventBus, EventSubscriber, SharedEventBus};
pub use ports::{EmailMessage, EmailSender, SendReceipt};
pub use services::{
    BookingService, CatalogService, CheckoutService, NotificationService, NotificationWorker,
    PaymentService,
};
