
/// The argument types of the wire protocol.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ArgType {
    Int,
    Uint,
    Fixed,
    String,
    Object,
    NewId,
    Array,
    Fd,
}

impl ArgType {
    pub const ALL: [ArgType; 8] = [
        ArgType::Int,
        ArgType::Uint,
        ArgType::Fixed,
        ArgType::String,
        ArgType::Object,
        ArgType::NewId,
        ArgType::Array,
        ArgType::Fd,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        let ty = match tag {
            "int" => Self::Int,
            "uint" => Self::Uint,
            "fixed" => Self::Fixed,
            "string" => Self::String,
            "object" => Self::Object,
            "new_id" => Self::NewId,
            "array" => Self::Array,
            "fd" | "file-descriptor" => Self::Fd,
            _ => return None,
        };
        Some(ty)
    }

    pub fn tag(self) -> &'static str {
        match self {
            ArgType::Int => "int",
            ArgType::Uint => "uint",
            ArgType::Fixed => "fixed",
            ArgType::String => "string",
            ArgType::Object => "object",
            ArgType::NewId => "new_id",
            ArgType::Array => "array",
            ArgType::Fd => "fd",
        }
    }
}

/// How one argument type is marshalled by generated code.
///
/// `encode` and `decode` are call-site templates. `{}` in `encode` is
/// replaced by the parameter name. `decode` reads from a `MsgParser` named
/// `parser`. Paths in `imports` are relative to the runtime crate unless they
/// start with `std::`.
#[derive(Debug, Eq, PartialEq)]
pub struct WireType {
    pub encode: &'static str,
    pub signature: &'static str,
    pub decode: &'static str,
    pub doc_type: &'static str,
    pub param_type: &'static str,
    pub imports: &'static [&'static str],
}

impl WireType {
    pub fn encode_call(&self, arg: &str) -> String {
        self.encode.replace("{}", arg)
    }
}

static INT: WireType = WireType {
    encode: "WireArg::Int({})",
    signature: "i",
    decode: "parser.int()?",
    doc_type: "i32",
    param_type: "i32",
    imports: &[],
};

static UINT: WireType = WireType {
    encode: "WireArg::Uint({})",
    signature: "u",
    decode: "parser.uint()?",
    doc_type: "u32",
    param_type: "u32",
    imports: &[],
};

static FIXED: WireType = WireType {
    encode: "WireArg::Fixed({})",
    signature: "f",
    decode: "parser.fixed()?",
    doc_type: "Fixed",
    param_type: "Fixed",
    imports: &["fixed::Fixed"],
};

static STRING: WireType = WireType {
    encode: "WireArg::String(Some({}))",
    signature: "s",
    decode: "parser.string()?",
    doc_type: "String",
    param_type: "&str",
    imports: &[],
};

static OPT_STRING: WireType = WireType {
    encode: "WireArg::String({})",
    signature: "?s",
    decode: "parser.optional_string()?",
    doc_type: "Option<String>",
    param_type: "Option<&str>",
    imports: &[],
};

static OBJECT: WireType = WireType {
    encode: "WireArg::Object({}.id())",
    signature: "o",
    decode: "self.core.connection().lookup(parser.object()?)?",
    doc_type: "Rc<dyn Object>",
    param_type: "&dyn Object",
    imports: &["std::rc::Rc", "object::Object"],
};

static OPT_OBJECT: WireType = WireType {
    encode: "WireArg::Object({}.map_or(ObjectId::NONE, |o| o.id()))",
    signature: "?o",
    decode: "self.core.connection().lookup_optional(parser.object()?)?",
    doc_type: "Option<Rc<dyn Object>>",
    param_type: "Option<&dyn Object>",
    imports: &["std::rc::Rc", "object::Object"],
};

static NEW_ID: WireType = WireType {
    encode: "WireArg::NewObject",
    signature: "n",
    decode: "parser.new_id()?",
    doc_type: "ObjectId",
    param_type: "ProxyConstructor<P>",
    imports: &[],
};

static ARRAY: WireType = WireType {
    encode: "WireArg::Array({})",
    signature: "a",
    decode: "parser.array()?",
    doc_type: "Vec<u8>",
    param_type: "&[u8]",
    imports: &[],
};

static FD: WireType = WireType {
    encode: "WireArg::Fd({})",
    signature: "h",
    decode: "parser.fd()?",
    doc_type: "Rc<OwnedFd>",
    param_type: "Rc<OwnedFd>",
    imports: &["std::rc::Rc", "OwnedFd"],
};

/// Returns the marshalling of `ty`.
///
/// Null is only representable on the wire for strings and objects. For all
/// other types both entries are the same. A null array would be
/// indistinguishable from an empty one.
pub fn wire_type(ty: ArgType, nullable: bool) -> &'static WireType {
    match (ty, nullable) {
        (ArgType::Int, false) => &INT,
        (ArgType::Int, true) => &INT,
        (ArgType::Uint, false) => &UINT,
        (ArgType::Uint, true) => &UINT,
        (ArgType::Fixed, false) => &FIXED,
        (ArgType::Fixed, true) => &FIXED,
        (ArgType::String, false) => &STRING,
        (ArgType::String, true) => &OPT_STRING,
        (ArgType::Object, false) => &OBJECT,
        (ArgType::Object, true) => &OPT_OBJECT,
        (ArgType::NewId, false) => &NEW_ID,
        (ArgType::NewId, true) => &NEW_ID,
        (ArgType::Array, false) => &ARRAY,
        (ArgType::Array, true) => &ARRAY,
        (ArgType::Fd, false) => &FD,
        (ArgType::Fd, true) => &FD,
    }
}

/// Resolves a type tag as written in a protocol document.
pub fn lookup(tag: &str, nullable: bool) -> Option<(ArgType, &'static WireType)> {
    let ty = ArgType::from_tag(tag)?;
    Some((ty, wire_type(ty, nullable)))
}
