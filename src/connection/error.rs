use {
    crate::object::{DispatchError, Interface, ObjectId},
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Received a message for unknown object {0}")]
    UnknownObject(ObjectId),
    #[error("Could not handle a message sent to {interface}@{id}")]
    Dispatch {
        interface: Interface,
        id: ObjectId,
        #[source]
        source: DispatchError,
    },
    #[error("The connection is already being dispatched")]
    AlreadyDispatching,
    #[error("The connection has been killed")]
    Killed,
    #[error("Ran out of object ids")]
    TooManyIds,
}
