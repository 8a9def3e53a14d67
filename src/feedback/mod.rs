//! Patient lookup and feedback form.

pub mod desk;
pub mod form;

pub use desk::FeedbackDesk;
