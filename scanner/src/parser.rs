
use {
    crate::ast::{
        ArgDeclaration, Description, EntryDeclaration, EnumDeclaration, InterfaceDeclaration,
        MessageDeclaration, MessageType, ProtocolDocument,
    },
    quick_xml::{
        Reader,
        events::{
            Event,
            attributes::{AttrError, Attribute, Attributes},
        },
    },
    std::{
        borrow::Cow,
        num::ParseIntError,
        str::{FromStr, ParseBoolError},
        string::FromUtf8Error,
    },
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Could not parse a protocol element")]
    Protocol(#[from] ProtocolError),
    #[error("Could not read the next event")]
    ReadEvent(#[source] quick_xml::Error),
    #[error("The document does not contain a protocol element")]
    MissingProtocol,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Could not parse an attribute")]
    Attribute(#[from] AttributeError),
    #[error("Protocol does not have a name")]
    MissingName,
    #[error("Could not read the next event")]
    ReadEvent(#[source] quick_xml::Error),
    #[error("Could not parse the copyright element")]
    Copyright(#[from] TextError),
    #[error("Could not parse the description element")]
    Description(#[from] DescriptionError),
    #[error("Could not parse interface {}", .0.as_deref().unwrap_or("<unnamed>"))]
    Interface(Option<String>, #[source] InterfaceElementError),
}

#[derive(Debug, Error)]
pub enum TextError {
    #[error("Could not read the next event")]
    ReadEvent(#[from] quick_xml::Error),
    #[error("Could not decode the body as UTF-8")]
    DecodeUtf8(#[from] FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("Could not parse an attribute")]
    Attribute(#[from] AttributeError),
    #[error("Could not read the body")]
    Text(#[from] TextError),
}

#[derive(Debug, Error)]
pub enum InterfaceElementError {
    #[error("Interface has no name")]
    MissingName,
    #[error("Interface version must be at least 1")]
    ZeroVersion,
    #[error("Could not parse an attribute")]
    Attribute(#[from] AttributeError),
    #[error("Could not read the next event")]
    ReadEvent(#[source] quick_xml::Error),
    #[error("Could not parse the version")]
    Version(#[source] ParseIntError),
    #[error("Could not parse request {}", .0.as_deref().unwrap_or("<unnamed>"))]
    Request(Option<String>, #[source] MessageElementError),
    #[error("Could not parse event {}", .0.as_deref().unwrap_or("<unnamed>"))]
    Event(Option<String>, #[source] MessageElementError),
    #[error("Could not parse the description element")]
    Description(#[from] DescriptionError),
    #[error("Could not parse an enum element")]
    Enum(#[from] EnumElementError),
}

#[derive(Debug, Error)]
pub enum MessageElementError {
    #[error("Message has no name")]
    MissingName,
    #[error("Could not parse an attribute")]
    Attribute(#[from] AttributeError),
    #[error("Could not read the next event")]
    ReadEvent(#[source] quick_xml::Error),
    #[error("Could not parse the since attribute")]
    Since(#[source] ParseIntError),
    #[error("Could not parse the deprecated-since attribute")]
    DeprecatedSince(#[source] ParseIntError),
    #[error("Unknown message type {}", .0)]
    UnknownMessageType(String),
    #[error("Could not parse an argument element")]
    Arg(#[from] ArgElementError),
    #[error("Could not parse the description element")]
    Description(#[from] DescriptionError),
}

#[derive(Debug, Error)]
pub enum ArgElementError {
    #[error("Argument has no name")]
    MissingName,
    #[error("Argument {} has no type", .0)]
    MissingType(String),
    #[error("Could not parse an attribute")]
    Attribute(#[from] AttributeError),
    #[error("Could not read the next event")]
    ReadEvent(#[source] quick_xml::Error),
    #[error("Could not parse the allow-null attribute")]
    AllowNull(#[source] ParseBoolError),
    #[error("Could not parse the description element")]
    Description(#[from] DescriptionError),
}

#[derive(Debug, Error)]
pub enum EnumElementError {
    #[error("Enum has no name")]
    MissingName,
    #[error("Could not parse an attribute")]
    Attribute(#[from] AttributeError),
    #[error("Could not read the next event")]
    ReadEvent(#[source] quick_xml::Error),
    #[error("Could not parse the bitfield attribute")]
    Bitfield(#[source] ParseBoolError),
    #[error("Could not parse the description element")]
    Description(#[from] DescriptionError),
    #[error("Could not parse the since attribute")]
    Since(#[source] ParseIntError),
    #[error("Could not parse an entry element")]
    Entry(#[from] EntryElementError),
}

#[derive(Debug, Error)]
pub enum EntryElementError {
    #[error("Entry has no name")]
    MissingName,
    #[error("Entry has no value")]
    MissingValue,
    #[error("Value could not be parsed")]
    InvalidValue(#[source] ParseIntError),
    #[error("Could not parse an attribute")]
    Attribute(#[from] AttributeError),
    #[error("Could not read the next event")]
    ReadEvent(#[source] quick_xml::Error),
    #[error("Could not parse the description element")]
    Description(#[from] DescriptionError),
    #[error("Could not parse the since attribute")]
    Since(#[source] ParseIntError),
    #[error("Could not parse the deprecated-since attribute")]
    DeprecatedSince(#[source] ParseIntError),
}

#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("quick_xml returned an error")]
    QuickXml(#[from] AttrError),
    #[error("Could not decode the value as UTF-8")]
    DecodeUtf8(#[from] quick_xml::Error),
}

/// Parses the first `protocol` element of `input`.
pub fn parse(input: &[u8]) -> Result<ProtocolDocument, DocumentError> {
    let mut reader = Reader::from_reader(input);
    loop {
        let event = reader.read_event().map_err(DocumentError::ReadEvent)?;
        let (start, empty) = match event {
            Event::Start(s) => (s, false),
            Event::Empty(s) => (s, true),
            Event::Eof => return Err(DocumentError::MissingProtocol),
            _ => continue,
        };
        if start.local_name().as_ref() == b"protocol" {
            return Ok(parse_protocol(&mut reader, start.attributes(), empty)?);
        }
    }
}

macro_rules! parse_attr {
    ($attr:expr) => {
        match $attr {
            Ok(ref attr) => parse_attr(attr),
            Err(e) => return Err(AttributeError::QuickXml(e).into()),
        }
    };
}

fn parse_attr<'a>(attr: &'a Attribute) -> Result<(&'a [u8], Cow<'a, str>), AttributeError> {
    let name = attr.key.local_name().into_inner();
    let value = attr.unescape_value().map_err(AttributeError::DecodeUtf8)?;
    Ok((name, value))
}

fn read_text(reader: &mut Reader<&[u8]>, empty: bool) -> Result<String, TextError> {
    let mut body = Vec::new();
    if !empty {
        let mut depth = 0usize;
        loop {
            match reader.read_event()? {
                Event::Text(s) => body.extend_from_slice(s.as_ref()),
                Event::CData(s) => body.extend_from_slice(s.as_ref()),
                Event::GeneralRef(r) => push_reference(&mut body, r.as_ref()),
                Event::Start(_) => depth += 1,
                Event::End(_) if depth > 0 => depth -= 1,
                Event::End(_) | Event::Eof => break,
                _ => continue,
            }
        }
    }
    Ok(String::from_utf8(body)?)
}

fn push_reference(body: &mut Vec<u8>, name: &[u8]) {
    let predefined: &[u8] = match name {
        b"lt" => b"<",
        b"gt" => b">",
        b"amp" => b"&",
        b"quot" => b"\"",
        b"apos" => b"'",
        _ => match resolve_char_ref(name) {
            Some(c) => {
                let mut buf = [0; 4];
                body.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                return;
            }
            None => {
                body.push(b'&');
                body.extend_from_slice(name);
                body.push(b';');
                return;
            }
        },
    };
    body.extend_from_slice(predefined);
}

fn resolve_char_ref(name: &[u8]) -> Option<char> {
    let name = std::str::from_utf8(name.strip_prefix(b"#")?).ok()?;
    let code = match name.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => name.parse().ok()?,
    };
    char::from_u32(code)
}

fn parse_protocol(
    reader: &mut Reader<&[u8]>,
    attributes: Attributes,
    empty: bool,
) -> Result<ProtocolDocument, ProtocolError> {
    let mut name = None;
    for attr in attributes {
        let (n, value) = parse_attr!(attr)?;
        match n {
            b"name" => name = Some(value.into_owned()),
            _ => continue,
        }
    }
    let mut copyright = vec![];
    let mut description = None;
    let mut interfaces = vec![];
    if !empty {
        loop {
            let event = reader.read_event().map_err(ProtocolError::ReadEvent)?;
            let (start, empty) = match event {
                Event::Start(s) => (s, false),
                Event::End(_) | Event::Eof => break,
                Event::Empty(s) => (s, true),
                _ => continue,
            };
            match start.local_name().as_ref() {
                b"copyright" => copyright.push(read_text(reader, empty)?),
                b"description" => {
                    description = Some(parse_description(reader, start.attributes(), empty)?)
                }
                b"interface" => {
                    let name = element_name(start.attributes());
                    let interface = parse_interface(reader, start.attributes(), empty)
                        .map_err(|e| ProtocolError::Interface(name, e))?;
                    interfaces.push(interface);
                }
                _ => skip_element(reader, empty).map_err(ProtocolError::ReadEvent)?,
            }
        }
    }
    Ok(ProtocolDocument {
        name: name.ok_or(ProtocolError::MissingName)?,
        copyright,
        description,
        interfaces,
    })
}

fn element_name(attributes: Attributes) -> Option<String> {
    for attr in attributes.flatten() {
        if attr.key.local_name().as_ref() == b"name" {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

fn skip_element(reader: &mut Reader<&[u8]>, empty: bool) -> Result<(), quick_xml::Error> {
    if empty {
        return Ok(());
    }
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth > 0 => depth -= 1,
            Event::End(_) | Event::Eof => return Ok(()),
            _ => continue,
        }
    }
}

fn parse_description(
    reader: &mut Reader<&[u8]>,
    attributes: Attributes,
    empty: bool,
) -> Result<Description, DescriptionError> {
    let mut summary = None;
    for attr in attributes {
        let (n, value) = parse_attr!(attr)?;
        match n {
            b"summary" => summary = Some(value.into_owned()),
            _ => continue,
        }
    }
    Ok(Description {
        summary,
        body: read_text(reader, empty)?,
    })
}

fn parse_interface(
    reader: &mut Reader<&[u8]>,
    attributes: Attributes,
    empty: bool,
) -> Result<InterfaceDeclaration, InterfaceElementError> {
    let mut name = None;
    let mut version = 1;
    for attr in attributes {
        let (n, value) = parse_attr!(attr)?;
        match n {
            b"name" => name = Some(value.into_owned()),
            b"version" => version = value.parse().map_err(InterfaceElementError::Version)?,
            _ => continue,
        }
    }
    if version == 0 {
        return Err(InterfaceElementError::ZeroVersion);
    }
    let mut description = None;
    let mut requests = Vec::new();
    let mut events = Vec::new();
    let mut enums = Vec::new();
    if !empty {
        loop {
            let event = reader
                .read_event()
                .map_err(InterfaceElementError::ReadEvent)?;
            let (start, empty) = match event {
                Event::Start(s) => (s, false),
                Event::End(_) | Event::Eof => break,
                Event::Empty(s) => (s, true),
                _ => continue,
            };
            match start.local_name().as_ref() {
                b"description" => {
                    description = Some(parse_description(reader, start.attributes(), empty)?)
                }
                b"request" => {
                    let name = element_name(start.attributes());
                    let request = parse_message(reader, start.attributes(), empty)
                        .map_err(|e| InterfaceElementError::Request(name, e))?;
                    requests.push(request);
                }
                b"event" => {
                    let name = element_name(start.attributes());
                    let event = parse_message(reader, start.attributes(), empty)
                        .map_err(|e| InterfaceElementError::Event(name, e))?;
                    events.push(event);
                }
                b"enum" => enums.push(parse_enum(reader, start.attributes(), empty)?),
                _ => skip_element(reader, empty).map_err(InterfaceElementError::ReadEvent)?,
            }
        }
    }
    Ok(InterfaceDeclaration {
        name: name.ok_or(InterfaceElementError::MissingName)?,
        version,
        description,
        requests,
        events,
        enums,
    })
}

fn parse_message(
    reader: &mut Reader<&[u8]>,
    attributes: Attributes,
    empty: bool,
) -> Result<MessageDeclaration, MessageElementError> {
    let mut name = None;
    let mut ty = None;
    let mut since = 1;
    let mut deprecated_since = None;
    for attr in attributes {
        let (n, value) = parse_attr!(attr)?;
        match n {
            b"name" => name = Some(value.into_owned()),
            b"type" => match value.as_ref() {
                "destructor" => ty = Some(MessageType::Destructor),
                _ => return Err(MessageElementError::UnknownMessageType(value.into_owned())),
            },
            b"since" => since = value.parse().map_err(MessageElementError::Since)?,
            b"deprecated-since" => {
                deprecated_since = Some(
                    value
                        .parse()
                        .map_err(MessageElementError::DeprecatedSince)?,
                )
            }
            _ => continue,
        }
    }
    let mut description = None;
    let mut args = Vec::new();
    if !empty {
        loop {
            let event = reader.read_event().map_err(MessageElementError::ReadEvent)?;
            let (start, empty) = match event {
                Event::Start(s) => (s, false),
                Event::End(_) | Event::Eof => break,
                Event::Empty(s) => (s, true),
                _ => continue,
            };
            match start.local_name().as_ref() {
                b"description" => {
                    description = Some(parse_description(reader, start.attributes(), empty)?)
                }
                b"arg" => args.push(parse_arg(reader, start.attributes(), empty)?),
                _ => skip_element(reader, empty).map_err(MessageElementError::ReadEvent)?,
            }
        }
    }
    Ok(MessageDeclaration {
        name: name.ok_or(MessageElementError::MissingName)?,
        ty,
        since,
        deprecated_since,
        description,
        args,
    })
}

fn parse_arg(
    reader: &mut Reader<&[u8]>,
    attributes: Attributes,
    empty: bool,
) -> Result<ArgDeclaration, ArgElementError> {
    let mut name = None;
    let mut ty = None;
    let mut summary = None;
    let mut interface = None;
    let mut allow_null = None;
    let mut enum_ = None;
    for attr in attributes {
        let (n, value) = parse_attr!(attr)?;
        match n {
            b"name" => name = Some(value.into_owned()),
            b"type" => ty = Some(value.into_owned()),
            b"summary" => summary = Some(value.into_owned()),
            b"interface" => interface = Some(value.into_owned()),
            b"allow-null" => {
                allow_null = Some(value.parse().map_err(ArgElementError::AllowNull)?)
            }
            b"enum" => enum_ = Some(value.into_owned()),
            _ => continue,
        }
    }
    let mut description = None;
    if !empty {
        loop {
            let event = reader.read_event().map_err(ArgElementError::ReadEvent)?;
            let (start, empty) = match event {
                Event::Start(s) => (s, false),
                Event::End(_) | Event::Eof => break,
                Event::Empty(s) => (s, true),
                _ => continue,
            };
            match start.local_name().as_ref() {
                b"description" => {
                    description = Some(parse_description(reader, start.attributes(), empty)?)
                }
                _ => skip_element(reader, empty).map_err(ArgElementError::ReadEvent)?,
            }
        }
    }
    let name = name.ok_or(ArgElementError::MissingName)?;
    let ty = match ty {
        Some(ty) => ty,
        None => return Err(ArgElementError::MissingType(name)),
    };
    Ok(ArgDeclaration {
        name,
        ty,
        summary,
        description,
        interface,
        allow_null: allow_null.unwrap_or_default(),
        enum_,
    })
}

fn parse_enum(
    reader: &mut Reader<&[u8]>,
    attributes: Attributes,
    empty: bool,
) -> Result<EnumDeclaration, EnumElementError> {
    let mut name = None;
    let mut since = None;
    let mut bitfield = None;
    for attr in attributes {
        let (n, v) = parse_attr!(attr)?;
        match n {
            b"name" => name = Some(v.into_owned()),
            b"since" => since = Some(v.parse().map_err(EnumElementError::Since)?),
            b"bitfield" => bitfield = Some(v.parse().map_err(EnumElementError::Bitfield)?),
            _ => continue,
        }
    }
    let mut description = None;
    let mut entries = Vec::new();
    if !empty {
        loop {
            let event = reader.read_event().map_err(EnumElementError::ReadEvent)?;
            let (start, empty) = match event {
                Event::Start(s) => (s, false),
                Event::End(_) | Event::Eof => break,
                Event::Empty(s) => (s, true),
                _ => continue,
            };
            match start.local_name().as_ref() {
                b"description" => {
                    description = Some(parse_description(reader, start.attributes(), empty)?)
                }
                b"entry" => entries.push(parse_entry(reader, start.attributes(), empty)?),
                _ => skip_element(reader, empty).map_err(EnumElementError::ReadEvent)?,
            }
        }
    }
    Ok(EnumDeclaration {
        name: name.ok_or(EnumElementError::MissingName)?,
        since,
        bitfield: bitfield.unwrap_or_default(),
        description,
        entries,
    })
}

fn parse_entry(
    reader: &mut Reader<&[u8]>,
    attributes: Attributes,
    empty: bool,
) -> Result<EntryDeclaration, EntryElementError> {
    let mut name = None;
    let mut value = None;
    let mut summary = None;
    let mut since = None;
    let mut deprecated_since = None;
    for attr in attributes {
        let (n, v) = parse_attr!(attr)?;
        match n {
            b"name" => name = Some(v.into_owned()),
            b"value" => value = Some(v.into_owned()),
            b"summary" => summary = Some(v.into_owned()),
            b"since" => since = Some(v.parse().map_err(EntryElementError::Since)?),
            b"deprecated-since" => {
                deprecated_since = Some(v.parse().map_err(EntryElementError::DeprecatedSince)?)
            }
            _ => continue,
        }
    }
    let mut description = None;
    if !empty {
        loop {
            let event = reader.read_event().map_err(EntryElementError::ReadEvent)?;
            let (start, empty) = match event {
                Event::Start(s) => (s, false),
                Event::End(_) | Event::Eof => break,
                Event::Empty(s) => (s, true),
                _ => continue,
            };
            match start.local_name().as_ref() {
                b"description" => {
                    description = Some(parse_description(reader, start.attributes(), empty)?)
                }
                _ => skip_element(reader, empty).map_err(EntryElementError::ReadEvent)?,
            }
        }
    }
    let value = value.ok_or(EntryElementError::MissingValue)?;
    let value = match value.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).map_err(EntryElementError::InvalidValue)?,
        None => u32::from_str(&value).map_err(EntryElementError::InvalidValue)?,
    };
    Ok(EntryDeclaration {
        name: name.ok_or(EntryElementError::MissingName)?,
        value,
        summary,
        since,
        deprecated_since,
        description,
    })
}
