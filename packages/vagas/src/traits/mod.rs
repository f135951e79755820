//! Core trait abstractions.
//!
//! Each external collaborator of the pipeline sits behind a trait so runs
//! can be exercised against mocks: the HTML source, the record store and
//! the messaging sink.

pub mod sink;
pub mod source;
pub mod store;

pub use sink::{MessageAttachment, MessagePayload, MessageSink, NotifyFormat, ThreadHandle};
pub use source::ListingSource;
pub use store::RecordStore;
