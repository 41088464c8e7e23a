#[cfg(test)]
mod tests;

mod formatter;
mod parser;

pub use {
    formatter::MsgFormatter,
    parser::{MsgParser, MsgParserError},
};
use {
    crate::{fixed::Fixed, object::ObjectId},
    std::{
        fmt::{Debug, Formatter},
        rc::Rc,
    },
    uapi::OwnedFd,
};

/// One argument of an outgoing message.
#[derive(Clone)]
pub enum WireArg<'a> {
    Int(i32),
    Uint(u32),
    Fixed(Fixed),
    /// `None` is the null string.
    String(Option<&'a str>),
    /// `ObjectId::NONE` is the null object.
    Object(ObjectId),
    /// The id of the object created by the message.
    NewObject,
    Array(&'a [u8]),
    Fd(Rc<OwnedFd>),
}

/// A message without its header.
///
/// The transport is responsible for framing. `header` returns the two header
/// words of the wire format.
#[derive(Clone)]
pub struct Message {
    pub object: ObjectId,
    pub opcode: u32,
    pub body: Vec<u8>,
    pub fds: Vec<Rc<OwnedFd>>,
}

impl Message {
    /// Formats a message. `new_id` replaces `WireArg::NewObject`.
    pub fn format(
        object: ObjectId,
        opcode: u32,
        args: &[WireArg<'_>],
        new_id: Option<ObjectId>,
    ) -> Self {
        let mut body = vec![];
        let mut fds = vec![];
        let mut fmt = MsgFormatter::new(&mut body, &mut fds);
        for arg in args {
            fmt.arg(arg, new_id);
        }
        Self {
            object,
            opcode,
            body,
            fds,
        }
    }

    pub fn header(&self) -> [u32; 2] {
        let size = (self.body.len() + 8) as u32;
        [self.object.raw(), (size << 16) | (self.opcode & 0xffff)]
    }

    pub fn parser(&self) -> MsgParser<'_> {
        MsgParser::new(&self.body, self.fds.clone())
    }
}

impl Debug for WireArg<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WireArg::Int(i) => Debug::fmt(i, f),
            WireArg::Uint(u) => Debug::fmt(u, f),
            WireArg::Fixed(fixed) => Debug::fmt(fixed, f),
            WireArg::String(s) => Debug::fmt(s, f),
            WireArg::Object(o) => write!(f, "@{}", o),
            WireArg::NewObject => f.write_str("new_id"),
            WireArg::Array(a) => write!(f, "[{} bytes]", a.len()),
            WireArg::Fd(fd) => write!(f, "fd {}", fd.raw()),
        }
    }
}

impl Debug for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("object", &self.object)
            .field("opcode", &self.opcode)
            .field("body", &self.body)
            .field("fds", &self.fds.len())
            .finish()
    }
}
