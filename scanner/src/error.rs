use {std::io, thiserror::Error};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Interface {0} is declared more than once")]
    DuplicateInterface(String),
    #[error("Could not compile interface {0}")]
    Interface(String, #[source] InterfaceError),
}

#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("Could not compile request {0}")]
    Request(String, #[source] MessageError),
    #[error("Could not compile event {0}")]
    Event(String, #[source] MessageError),
    #[error("Could not format the output")]
    Format(#[from] std::fmt::Error),
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Argument {arg} has unknown type {ty}")]
    UnknownArgType { arg: String, ty: String },
    #[error("Argument {arg} references interface {interface} which is not declared")]
    UnresolvedInterfaceReference { arg: String, interface: String },
    #[error("Argument {arg} creates an object but does not name its interface")]
    MissingInterface { arg: String },
    #[error("Argument {arg} is the second new_id argument of the message")]
    MultipleNewIds { arg: String },
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Could not create directory {0}")]
    CreateDir(String, #[source] io::Error),
    #[error("Could not write {0}")]
    WriteFile(String, #[source] io::Error),
}
