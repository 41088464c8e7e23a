
use {
    crate::{
        ast::{ArgDeclaration, Description, InterfaceDeclaration, MessageDeclaration},
        enums::{write_enum_const, write_enum_type},
        error::{InterfaceError, MessageError},
        ident::{safe_ident, upper_camel_case},
        wire_types::{self, ArgType, WireType},
    },
    std::{
        borrow::Cow,
        collections::BTreeSet,
        fmt::{self, Write},
    },
};

/// What the code of one interface may refer to.
pub struct CompileContext<'a> {
    /// Path of the runtime crate as seen from the generated code.
    pub runtime_path: &'a str,
    /// Interface whose `bind` request receives the dynamic signature.
    pub registry_interface: &'a str,
    /// Interfaces that have generated proxies in the same module tree.
    pub interfaces: &'a BTreeSet<String>,
}

pub fn proxy_name(interface: &str) -> String {
    format!("{}Proxy", upper_camel_case(interface))
}

pub fn events_name(interface: &str) -> String {
    format!("{}Events", upper_camel_case(interface))
}

pub fn proxy_module(interface: &str) -> String {
    format!("{}_proxy", interface)
}

pub fn events_module(interface: &str) -> String {
    format!("{}_events", interface)
}

struct Arg<'a> {
    decl: &'a ArgDeclaration,
    ty: ArgType,
    wire: &'static WireType,
    name: Cow<'a, str>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum RequestKind<'a> {
    Send,
    Construct(&'a str),
    ConstructAny,
    Bind,
}

struct Message<'a> {
    decl: &'a MessageDeclaration,
    opcode: usize,
    args: Vec<Arg<'a>>,
    kind: RequestKind<'a>,
}

impl Message<'_> {
    fn signature(&self) -> String {
        match self.kind {
            RequestKind::Bind => "usun".to_string(),
            _ => self.args.iter().map(|a| a.wire.signature).collect(),
        }
    }
}

struct Imports<'a> {
    runtime_path: &'a str,
    paths: BTreeSet<String>,
}

impl<'a> Imports<'a> {
    fn new(runtime_path: &'a str) -> Self {
        Self {
            runtime_path,
            paths: Default::default(),
        }
    }

    fn add(&mut self, path: &str) {
        if path.starts_with("std::") {
            self.paths.insert(path.to_string());
        } else {
            self.paths
                .insert(format!("{}::{}", self.runtime_path, path));
        }
    }

    fn add_all(&mut self, paths: &[&str]) {
        for path in paths {
            self.add(path);
        }
    }

    fn add_proxy(&mut self, interface: &str) {
        self.paths.insert(format!(
            "super::{}::{}",
            proxy_module(interface),
            proxy_name(interface)
        ));
    }

    fn write<W: Write>(&self, f: &mut W) -> fmt::Result {
        for path in &self.paths {
            writeln!(f, "use {};", path)?;
        }
        Ok(())
    }
}

fn resolve_message<'a>(
    ctx: &CompileContext<'_>,
    msg: &'a MessageDeclaration,
    opcode: usize,
    request: bool,
) -> Result<Message<'a>, MessageError> {
    let mut args = vec![];
    let mut kind = RequestKind::Send;
    for arg in &msg.args {
        let Some((ty, wire)) = wire_types::lookup(&arg.ty, arg.allow_null) else {
            return Err(MessageError::UnknownArgType {
                arg: arg.name.clone(),
                ty: arg.ty.clone(),
            });
        };
        if matches!(ty, ArgType::Object | ArgType::NewId) {
            if let Some(interface) = &arg.interface {
                if !ctx.interfaces.contains(interface) {
                    return Err(MessageError::UnresolvedInterfaceReference {
                        arg: arg.name.clone(),
                        interface: interface.clone(),
                    });
                }
            }
        }
        if ty == ArgType::NewId {
            if request {
                if kind != RequestKind::Send {
                    return Err(MessageError::MultipleNewIds {
                        arg: arg.name.clone(),
                    });
                }
                kind = match &arg.interface {
                    Some(interface) => RequestKind::Construct(interface),
                    None => RequestKind::ConstructAny,
                };
            } else if arg.interface.is_none() {
                return Err(MessageError::MissingInterface {
                    arg: arg.name.clone(),
                });
            }
        }
        args.push(Arg {
            decl: arg,
            ty,
            wire,
            name: safe_ident(&arg.name),
        });
    }
    Ok(Message {
        decl: msg,
        opcode,
        args,
        kind,
    })
}

fn resolve_requests<'a>(
    ctx: &CompileContext<'_>,
    itf: &'a InterfaceDeclaration,
) -> Result<Vec<Message<'a>>, InterfaceError> {
    let mut res = vec![];
    for (opcode, msg) in itf.requests.iter().enumerate() {
        if itf.name == ctx.registry_interface && msg.name == "bind" {
            res.push(Message {
                decl: msg,
                opcode,
                args: vec![],
                kind: RequestKind::Bind,
            });
            continue;
        }
        let msg = resolve_message(ctx, msg, opcode, true)
            .map_err(|e| InterfaceError::Request(msg.name.clone(), e))?;
        res.push(msg);
    }
    Ok(res)
}

fn resolve_events<'a>(
    ctx: &CompileContext<'_>,
    itf: &'a InterfaceDeclaration,
) -> Result<Vec<Message<'a>>, InterfaceError> {
    let mut res = vec![];
    for (opcode, msg) in itf.events.iter().enumerate() {
        let msg = resolve_message(ctx, msg, opcode, false)
            .map_err(|e| InterfaceError::Event(msg.name.clone(), e))?;
        res.push(msg);
    }
    Ok(res)
}

fn description_paragraphs(desc: Option<&Description>) -> Vec<Vec<String>> {
    let mut paragraphs = vec![];
    let Some(desc) = desc else {
        return paragraphs;
    };
    if let Some(summary) = &desc.summary {
        paragraphs.push(vec![summary.trim().to_string()]);
    }
    let mut current = vec![];
    for line in desc.body.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.to_string());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

fn write_doc<W: Write>(f: &mut W, indent: &str, paragraphs: &[Vec<String>]) -> fmt::Result {
    for (idx, paragraph) in paragraphs.iter().enumerate() {
        if idx > 0 {
            writeln!(f, "{}///", indent)?;
        }
        for line in paragraph {
            writeln!(f, "{}/// {}", indent, line)?;
        }
    }
    Ok(())
}

pub(crate) fn write_description<W: Write>(
    f: &mut W,
    indent: &str,
    desc: Option<&Description>,
) -> fmt::Result {
    write_doc(f, indent, &description_paragraphs(desc))
}

fn message_doc(msg: &Message<'_>, params: Vec<String>, returns: Option<String>) -> Vec<Vec<String>> {
    let mut paragraphs = description_paragraphs(msg.decl.description.as_ref());
    if !params.is_empty() {
        paragraphs.push(vec!["# Arguments".to_string()]);
        paragraphs.push(params);
    }
    if let Some(returns) = returns {
        paragraphs.push(vec![returns]);
    }
    let mut versions = vec![format!("Since version {}.", msg.decl.since)];
    if let Some(deprecated) = msg.decl.deprecated_since {
        versions.push(format!("Deprecated since version {}.", deprecated));
    }
    paragraphs.push(versions);
    paragraphs
}

fn param_doc(name: &str, summary: Option<&str>) -> String {
    match summary {
        Some(summary) => format!("- `{}`: {}", name, summary.trim()),
        None => format!("- `{}`", name),
    }
}

/// Compiles the proxy unit of `itf`.
pub fn compile_interface(
    ctx: &CompileContext<'_>,
    itf: &InterfaceDeclaration,
) -> Result<String, InterfaceError> {
    let requests = resolve_requests(ctx, itf)?;
    let events = resolve_events(ctx, itf)?;
    let proxy = proxy_name(&itf.name);
    let mut imports = Imports::new(ctx.runtime_path);
    imports.add_all(&[
        "std::any::Any",
        "std::rc::Rc",
        "LocalBoxFuture",
        "connection::Connection",
        "object::DispatchError",
        "object::Interface",
        "object::Object",
        "object::ObjectId",
        "proxy::Proxy",
        "proxy::ProxyCore",
        "utils::buffd::MsgParser",
    ]);
    if !requests.is_empty() || !events.is_empty() {
        imports.add("object::MessageDesc");
    }
    if requests
        .iter()
        .any(|r| r.kind == RequestKind::Bind || !r.args.is_empty())
    {
        imports.add("utils::buffd::WireArg");
    }
    if itf.has_events() {
        imports.add("utils::clonecell::CloneCell");
        imports.paths.insert(format!(
            "super::{}::{}",
            events_module(&itf.name),
            events_name(&itf.name)
        ));
    }
    for request in &requests {
        for arg in &request.args {
            imports.add_all(arg.wire.imports);
        }
        match request.kind {
            RequestKind::Construct(target) if target != itf.name => imports.add_proxy(target),
            RequestKind::ConstructAny | RequestKind::Bind => imports.add("proxy::ProxyConstructor"),
            _ => {}
        }
    }
    for event in &events {
        for arg in &event.args {
            if let Some(target) = &arg.decl.interface {
                if arg.ty == ArgType::NewId && *target != itf.name {
                    imports.add_proxy(target);
                }
            }
        }
    }

    let mut body = String::new();
    let f = &mut body;
    writeln!(f)?;
    write_description(f, "", itf.description.as_ref())?;
    if itf.description.is_some() {
        writeln!(f, "///")?;
    }
    writeln!(f, "/// Proxy of a `{}` object.", itf.name)?;
    writeln!(f, "pub struct {} {{", proxy)?;
    writeln!(f, "    core: ProxyCore,")?;
    if itf.has_events() {
        writeln!(
            f,
            "    listener: CloneCell<Option<Rc<dyn {}>>>,",
            events_name(&itf.name)
        )?;
    }
    writeln!(f, "}}")?;
    for e in &itf.enums {
        write_enum_type(f, &itf.name, e)?;
    }
    writeln!(f)?;
    writeln!(f, "impl {} {{", proxy)?;
    write_interface_const(f, itf, &requests, &events)?;
    for e in &itf.enums {
        write_enum_const(f, &itf.name, e)?;
    }
    writeln!(f)?;
    writeln!(
        f,
        "    pub fn new(connection: &Rc<Connection>, id: ObjectId) -> Self {{"
    )?;
    writeln!(f, "        Self {{")?;
    writeln!(f, "            core: ProxyCore::new(connection, id),")?;
    if itf.has_events() {
        writeln!(f, "            listener: Default::default(),")?;
    }
    writeln!(f, "        }}")?;
    writeln!(f, "    }}")?;
    if itf.has_events() {
        writeln!(f)?;
        writeln!(f, "    /// Sets the object that receives the events of this proxy.")?;
        writeln!(
            f,
            "    pub fn set_listener(&self, listener: Rc<dyn {}>) {{",
            events_name(&itf.name)
        )?;
        writeln!(f, "        self.listener.set(Some(listener));")?;
        writeln!(f, "    }}")?;
        writeln!(f)?;
        writeln!(f, "    pub fn unset_listener(&self) {{")?;
        writeln!(f, "        self.listener.set(None);")?;
        writeln!(f, "    }}")?;
    }
    for request in &requests {
        write_request(f, request)?;
    }
    for event in &events {
        write_event_handler(f, event)?;
    }
    writeln!(f, "}}")?;
    write_object_impl(f, itf, &proxy, &events)?;
    writeln!(f)?;
    writeln!(f, "impl Proxy for {} {{", proxy)?;
    writeln!(f, "    fn core(&self) -> &ProxyCore {{")?;
    writeln!(f, "        &self.core")?;
    writeln!(f, "    }}")?;
    writeln!(f, "}}")?;

    let mut out = String::new();
    imports.write(&mut out)?;
    out.push_str(&body);
    Ok(out)
}

fn write_interface_const<W: Write>(
    f: &mut W,
    itf: &InterfaceDeclaration,
    requests: &[Message<'_>],
    events: &[Message<'_>],
) -> fmt::Result {
    let write_messages = |f: &mut W, name: &str, messages: &[Message<'_>]| -> fmt::Result {
        if messages.is_empty() {
            return writeln!(f, "        {}: &[],", name);
        }
        writeln!(f, "        {}: &[", name)?;
        for msg in messages {
            writeln!(f, "            MessageDesc {{")?;
            writeln!(f, "                name: {:?},", msg.decl.name)?;
            writeln!(f, "                since: {},", msg.decl.since)?;
            writeln!(f, "                signature: {:?},", msg.signature())?;
            writeln!(f, "            }},")?;
        }
        writeln!(f, "        ],")
    };
    writeln!(f, "    pub const INTERFACE: Interface = Interface {{")?;
    writeln!(f, "        name: {:?},", itf.name)?;
    writeln!(f, "        version: {},", itf.version)?;
    write_messages(f, "requests", requests)?;
    write_messages(f, "events", events)?;
    writeln!(f, "    }};")?;
    Ok(())
}

fn write_request<W: Write>(f: &mut W, request: &Message<'_>) -> Result<(), InterfaceError> {
    let name = safe_ident(&request.decl.name);
    let mut params = vec![];
    let mut param_docs = vec![];
    let mut wire_args = vec![];
    let mut generic = "";
    let mut ret = None;
    let mut constructor = None;
    match request.kind {
        RequestKind::Bind => {
            generic = "<P: Proxy>";
            params.extend([
                "name: u32".to_string(),
                "interface_name: &str".to_string(),
                "proxy_constructor: ProxyConstructor<P>".to_string(),
                "version: u32".to_string(),
            ]);
            param_docs.extend([
                param_doc("name", Some("the numeric name of the global")),
                param_doc("interface_name", Some("the interface implemented by the global")),
                param_doc("proxy_constructor", Some("creates the proxy of the new object")),
                param_doc("version", Some("the version to bind")),
            ]);
            wire_args.extend([
                "WireArg::Uint(name)".to_string(),
                "WireArg::String(Some(interface_name))".to_string(),
                "WireArg::Uint(version)".to_string(),
                "WireArg::NewObject".to_string(),
            ]);
            ret = Some("Rc<P>".to_string());
            constructor = Some("proxy_constructor".to_string());
        }
        _ => {
            for arg in &request.args {
                match (arg.ty, request.kind) {
                    (ArgType::NewId, RequestKind::Construct(target)) => {
                        ret = Some(format!("Rc<{}>", proxy_name(target)));
                        constructor = Some(format!("{}::new", proxy_name(target)));
                    }
                    (ArgType::NewId, _) => {
                        generic = "<P: Proxy>";
                        params.push("any_proxy: ProxyConstructor<P>".to_string());
                        param_docs.push(param_doc(
                            "any_proxy",
                            Some("creates the proxy of the new object"),
                        ));
                        ret = Some("Rc<P>".to_string());
                        constructor = Some("any_proxy".to_string());
                    }
                    _ => {
                        params.push(format!("{}: {}", arg.name, arg.wire.param_type));
                        param_docs.push(param_doc(&arg.name, arg.decl.summary.as_deref()));
                    }
                }
                wire_args.push(arg.wire.encode_call(&arg.name));
            }
        }
    }
    let returns = match request.kind {
        RequestKind::Construct(target) => Some(format!("Returns the new `{}` object.", target)),
        RequestKind::ConstructAny | RequestKind::Bind => {
            Some("Returns the new object.".to_string())
        }
        RequestKind::Send => None,
    };
    writeln!(f)?;
    write_doc(f, "    ", &message_doc(request, param_docs, returns))?;
    write!(f, "    pub fn {}{}(&self", name, generic)?;
    for param in &params {
        write!(f, ", {}", param)?;
    }
    write!(f, ")")?;
    if let Some(ret) = &ret {
        write!(f, " -> {}", ret)?;
    }
    writeln!(f, " {{")?;
    let args = wire_args.join(", ");
    let destructor = request.decl.is_destructor();
    match &constructor {
        Some(constructor) => {
            let call = format!(
                "self.core.connection().send_constructing(self.core.id(), {}, {}, &[{}])",
                request.opcode, constructor, args
            );
            if destructor {
                writeln!(f, "        let new_proxy = {};", call)?;
                writeln!(f, "        self.core.destroy();")?;
                writeln!(f, "        new_proxy")?;
            } else {
                writeln!(f, "        {}", call)?;
            }
        }
        None => {
            writeln!(
                f,
                "        self.core.connection().send(self.core.id(), {}, &[{}]);",
                request.opcode, args
            )?;
            if destructor {
                writeln!(f, "        self.core.destroy();")?;
            }
        }
    }
    writeln!(f, "    }}")?;
    Ok(())
}

fn write_event_handler<W: Write>(f: &mut W, event: &Message<'_>) -> fmt::Result {
    let parser = match event.args.is_empty() {
        true => "parser",
        false => "mut parser",
    };
    writeln!(f)?;
    writeln!(
        f,
        "    async fn handle_{}(self: Rc<Self>, {}: MsgParser<'_>) -> Result<(), DispatchError> {{",
        event.decl.name, parser
    )?;
    for arg in &event.args {
        match (&arg.decl.interface, arg.ty) {
            (Some(target), ArgType::NewId) => writeln!(
                f,
                "        let {} = self.core.connection().construct({}, {}::new)?;",
                arg.name,
                arg.wire.decode,
                proxy_name(target)
            )?,
            _ => writeln!(f, "        let {} = {};", arg.name, arg.wire.decode)?,
        }
    }
    writeln!(f, "        parser.eof()?;")?;
    writeln!(f, "        let Some(listener) = self.listener.get() else {{")?;
    writeln!(f, "            return Err(DispatchError::ListenerNotBound {{")?;
    writeln!(f, "                interface: Self::INTERFACE,")?;
    writeln!(f, "                message: {:?},", event.decl.name)?;
    writeln!(f, "            }});")?;
    writeln!(f, "        }};")?;
    let args: Vec<_> = event.args.iter().map(|a| a.name.as_ref()).collect();
    writeln!(
        f,
        "        listener.{}({}).await;",
        safe_ident(&event.decl.name),
        args.join(", ")
    )?;
    writeln!(f, "        Ok(())")?;
    writeln!(f, "    }}")?;
    Ok(())
}

fn write_object_impl<W: Write>(
    f: &mut W,
    itf: &InterfaceDeclaration,
    proxy: &str,
    events: &[Message<'_>],
) -> fmt::Result {
    let parser = match events.is_empty() {
        true => "_parser",
        false => "parser",
    };
    writeln!(f)?;
    writeln!(f, "impl Object for {} {{", proxy)?;
    writeln!(f, "    fn id(&self) -> ObjectId {{")?;
    writeln!(f, "        self.core.id()")?;
    writeln!(f, "    }}")?;
    writeln!(f)?;
    writeln!(f, "    fn interface(&self) -> Interface {{")?;
    writeln!(f, "        Self::INTERFACE")?;
    writeln!(f, "    }}")?;
    writeln!(f)?;
    writeln!(f, "    fn handle_message<'a>(")?;
    writeln!(f, "        self: Rc<Self>,")?;
    writeln!(f, "        opcode: u32,")?;
    writeln!(f, "        {}: MsgParser<'a>,", parser)?;
    writeln!(f, "    ) -> LocalBoxFuture<'a, Result<(), DispatchError>> {{")?;
    writeln!(f, "        Box::pin(async move {{")?;
    writeln!(f, "            match opcode {{")?;
    for event in events {
        writeln!(
            f,
            "                {} => self.handle_{}(parser).await,",
            event.opcode, event.decl.name
        )?;
    }
    writeln!(
        f,
        "                _ => Err(DispatchError::UnknownOpcode {{ interface: Self::INTERFACE, opcode }}),"
    )?;
    writeln!(f, "            }}")?;
    writeln!(f, "        }})")?;
    writeln!(f, "    }}")?;
    writeln!(f)?;
    writeln!(f, "    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {{")?;
    writeln!(f, "        self")?;
    writeln!(f, "    }}")?;
    if itf.has_events() {
        writeln!(f)?;
        writeln!(f, "    fn break_loops(&self) {{")?;
        writeln!(f, "        self.listener.set(None);")?;
        writeln!(f, "    }}")?;
    }
    writeln!(f, "}}")?;
    Ok(())
}

/// Compiles the events unit of `itf`.
///
/// Returns `None` if the interface has no events.
pub fn compile_events(
    ctx: &CompileContext<'_>,
    itf: &InterfaceDeclaration,
) -> Result<Option<String>, InterfaceError> {
    if !itf.has_events() {
        return Ok(None);
    }
    let events = resolve_events(ctx, itf)?;
    let mut imports = Imports::new(ctx.runtime_path);
    imports.add("async_trait");
    let mut body = String::new();
    let f = &mut body;
    writeln!(f)?;
    writeln!(f, "/// Events emitted by a `{}` object.", itf.name)?;
    writeln!(f, "///")?;
    writeln!(
        f,
        "/// Every method does nothing by default. Implementations override the events they need."
    )?;
    writeln!(f, "#[async_trait(?Send)]")?;
    writeln!(f, "#[allow(unused_variables)]")?;
    writeln!(f, "pub trait {} {{", events_name(&itf.name))?;
    for (idx, event) in events.iter().enumerate() {
        if idx > 0 {
            writeln!(f)?;
        }
        let mut params = vec![];
        let mut param_docs = vec![];
        for arg in &event.args {
            let ty = match (&arg.decl.interface, arg.ty) {
                (Some(target), ArgType::NewId) => {
                    imports.add("std::rc::Rc");
                    imports.add_proxy(target);
                    format!("Rc<{}>", proxy_name(target))
                }
                _ => {
                    imports.add_all(arg.wire.imports);
                    arg.wire.doc_type.to_string()
                }
            };
            params.push(format!("{}: {}", arg.name, ty));
            param_docs.push(param_doc(&arg.name, arg.decl.summary.as_deref()));
        }
        write_doc(f, "    ", &message_doc(event, param_docs, None))?;
        write!(f, "    async fn {}(&self", safe_ident(&event.decl.name))?;
        for param in &params {
            write!(f, ", {}", param)?;
        }
        writeln!(f, ") {{}}")?;
    }
    writeln!(f, "}}")?;
    let mut out = String::new();
    imports.write(&mut out)?;
    out.push_str(&body);
    Ok(Some(out))
}
