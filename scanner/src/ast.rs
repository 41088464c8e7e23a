#[derive(Debug)]
pub struct ProtocolDocument {
    pub name: String,
    pub copyright: Vec<String>,
    pub description: Option<Description>,
    pub interfaces: Vec<InterfaceDeclaration>,
}

#[derive(Debug)]
pub struct Description {
    pub summary: Option<String>,
    pub body: String,
}

#[derive(Debug)]
pub struct InterfaceDeclaration {
    pub name: String,
    pub version: u32,
    pub description: Option<Description>,
    pub requests: Vec<RequestDeclaration>,
    pub events: Vec<EventDeclaration>,
    pub enums: Vec<EnumDeclaration>,
}

#[derive(Debug)]
pub struct MessageDeclaration {
    pub name: String,
    pub ty: Option<MessageType>,
    pub since: u32,
    pub deprecated_since: Option<u32>,
    pub description: Option<Description>,
    pub args: Vec<ArgDeclaration>,
}

pub type RequestDeclaration = MessageDeclaration;
pub type EventDeclaration = MessageDeclaration;

#[derive(Debug)]
pub struct ArgDeclaration {
    pub name: String,
    /// The type tag as written. It is resolved by the wire type catalog.
    pub ty: String,
    pub summary: Option<String>,
    pub description: Option<Description>,
    pub interface: Option<String>,
    pub allow_null: bool,
    pub enum_: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MessageType {
    Destructor,
}

#[derive(Debug)]
pub struct EnumDeclaration {
    pub name: String,
    pub since: Option<u32>,
    pub bitfield: bool,
    pub description: Option<Description>,
    pub entries: Vec<EntryDeclaration>,
}

#[derive(Debug)]
pub struct EntryDeclaration {
    pub name: String,
    pub value: u32,
    pub summary: Option<String>,
    pub since: Option<u32>,
    pub deprecated_since: Option<u32>,
    pub description: Option<Description>,
}

impl InterfaceDeclaration {
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

impl MessageDeclaration {
    pub fn is_destructor(&self) -> bool {
        self.ty == Some(MessageType::Destructor)
    }
}
