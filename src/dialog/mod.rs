//! Multi-turn dialog state machines.
//!
//! A node keeps at most one dialog of each kind active. Dialogs hold no
//! handles to the bus, calendar or reasoning service; they only track what
//! has been asked and answered.

mod email;
mod meeting;

pub use email::{
    is_confirmation_positive, split_subject_and_body, EmailDialog, EmailDraft, EmailStep,
};
pub use meeting::{MeetingDialog, MeetingMode, MeetingOutcome, MeetingStep};
