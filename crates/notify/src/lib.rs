//! Vendor notification - the external dispatch collaborator
//!
//! This crate composes and delivers the vendor-coordination message for an
//! approved request:
//! - **Composition** (`compose`) - renders the dispatch email, optionally
//!   drafted by an external `DraftClient` with a deterministic template
//!   fallback
//! - **Channels** (`channel`) - in-memory virtual mailbox (demo and tests)
//!   and an HTTP webhook channel
//!
//! The workflow service treats this crate as opaque: it hands over a request
//! snapshot and either gets a `DeliveryReceipt` back or an error, in which
//! case the dispatch transition must not commit.

pub mod channel;
pub mod compose;

pub use channel::{
    DeliveryReceipt, DispatchChannel, FailingNotifier, MailboxNotifier, NotifyError,
    VendorNotifier, VirtualEmail, WebhookNotifier,
};
pub use compose::{ComposeError, ComposedMessage, DraftClient, MessageComposer};
