//! Domain model (message, ids, errors).

pub mod errors;
pub mod ids;
pub mod message;

pub use errors::HandlerError;
pub use ids::{MESSAGE_ID_PREFIX, MessageId};
pub use message::{ActionName, WorkerMessage};
