//! Message bus, payloads and task records.

mod bus;
mod payload;
mod task;

pub use bus::{DeliveryStatus, Intercom, MessageRecord, Receiver, SYSTEM_SENDER, USER_SENDER};
pub use payload::{MeetingRecord, Payload};
pub use task::{ParsePriorityError, Priority, Task, TaskId};
