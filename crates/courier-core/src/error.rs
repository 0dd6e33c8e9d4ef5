use thiserror::Error;

use crate::domain::{ActionName, HandlerError};
use crate::ports::ChannelError;
use crate::typed::CodecError;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("no handler registered for action={0}")]
    UnknownAction(ActionName),

    #[error("handler for action={action} failed: {source}")]
    Handler {
        action: ActionName,
        #[source]
        source: HandlerError,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}
