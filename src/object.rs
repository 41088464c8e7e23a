use {
    crate::{
        LocalBoxFuture,
        utils::buffd::{MsgParser, MsgParserError},
    },
    std::{
        any::Any,
        fmt::{Display, Formatter},
        rc::Rc,
    },
    thiserror::Error,
};

pub const WL_DISPLAY_ID: ObjectId = ObjectId(1);

/// The first id allocated by the server.
pub const MIN_SERVER_ID: u32 = 0xff000000;

#[derive(Debug, Copy, Clone, Hash, Ord, PartialOrd, Eq, PartialEq)]
pub struct ObjectId(u32);

impl ObjectId {
    pub const NONE: Self = ObjectId(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct MessageDesc {
    pub name: &'static str,
    pub since: u32,
    pub signature: &'static str,
}

/// The static description of a protocol interface.
///
/// `name` is the name used in the protocol description and on the wire.
#[derive(Copy, Clone, Debug)]
pub struct Interface {
    pub name: &'static str,
    pub version: u32,
    pub requests: &'static [MessageDesc],
    pub events: &'static [MessageDesc],
}

impl Interface {
    pub fn request(&self, opcode: u32) -> Option<&'static MessageDesc> {
        self.requests.get(opcode as usize)
    }

    pub fn event(&self, opcode: u32) -> Option<&'static MessageDesc> {
        self.events.get(opcode as usize)
    }
}

impl Display for Interface {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

pub trait Object: 'static {
    fn id(&self) -> ObjectId;

    fn interface(&self) -> Interface;

    /// Decodes and handles one incoming message.
    ///
    /// The connection awaits the returned future before it handles the next
    /// message.
    fn handle_message<'a>(
        self: Rc<Self>,
        opcode: u32,
        parser: MsgParser<'a>,
    ) -> LocalBoxFuture<'a, Result<(), DispatchError>>;

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;

    /// Drops references that might form cycles through this object.
    fn break_loops(&self) {}
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Could not parse the message")]
    Parser(#[from] MsgParserError),
    #[error("Interface {interface} has no message with opcode {opcode}")]
    UnknownOpcode { interface: Interface, opcode: u32 },
    #[error("{interface}.{message} was received but no listener is bound")]
    ListenerNotBound {
        interface: Interface,
        message: &'static str,
    },
    #[error(
        "Request {interface}.{message} requires version {since} but the object has version {version}"
    )]
    VersionTooLow {
        interface: Interface,
        message: &'static str,
        since: u32,
        version: u32,
    },
    #[error("There is no object with id {0}")]
    UnknownObject(ObjectId),
    #[error("Object {0} has already been destroyed")]
    ObjectDestroyed(ObjectId),
    #[error("A non-nullable object argument is null")]
    NullObject,
    #[error("Id {0} is already in use")]
    IdInUse(ObjectId),
    #[error("Id {0} is not in the range of ids the peer may allocate")]
    IdOutOfBounds(ObjectId),
    #[error("No request handler is bound to {interface}@{id}")]
    NoRequestHandler { interface: Interface, id: ObjectId },
}
