pub mod payment_record;
pub mod webhook_event;

pub use payment_record::{PaymentRecord, PaymentStatus};
pub use webhook_event::WebhookEvent;
