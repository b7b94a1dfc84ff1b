//! Identity translation tables and handler registries.
//!
//! Both sides of a connection keep this layer's state, but the two
//! directions are deliberately asymmetric:
//!
//! - Outbound calls to a peer go through a [`TranslationTable`], which
//!   maps stable [`RpcId`](wirecall_protocol::RpcId) identities to the
//!   compact wire codes the current session uses. The table is session
//!   state: installed wholesale from a definitions batch, replaced
//!   wholesale, cleared on disconnect.
//! - Inbound calls resolve against a [`HandlerRegistry`], which maps
//!   identities to the thunks that decode and run them. The registry is
//!   process state: built once at bring-up, read-only afterwards.
//!
//! The server additionally owns a [`WireAssigner`], the single
//! authority that numbers identities for a session and produces the
//! definitions batches peers install.

mod assign;
mod error;
mod handlers;
mod table;

pub use assign::WireAssigner;
pub use error::RegistryError;
pub use handlers::{CallContext, Handler, HandlerError, HandlerRegistry};
pub use table::TranslationTable;
