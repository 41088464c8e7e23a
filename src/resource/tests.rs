use {
    crate::{
        connection::{Connection, ConnectionConfig, ConnectionError, Side, Transport},
        object::{DispatchError, MIN_SERVER_ID, Object, ObjectId, WL_DISPLAY_ID},
        protocol::{WlCallbackProxy, WlDisplayProxy, WlRegionProxy, WlSurfaceProxy},
        resource::{RequestHandler, Resource},
        utils::buffd::{Message, MsgParser, WireArg},
    },
    async_trait::async_trait,
    futures::executor::block_on,
    std::{
        cell::{Cell, RefCell},
        rc::Rc,
    },
};

#[derive(Default)]
struct Recorder {
    messages: RefCell<Vec<Message>>,
}

impl Transport for Recorder {
    fn send(&self, message: Message) {
        self.messages.borrow_mut().push(message);
    }
}

fn server() -> (Rc<Connection>, Rc<Recorder>, Rc<Resource>) {
    let transport = Rc::new(Recorder::default());
    let connection = Connection::new(
        ConnectionConfig {
            name: "server".to_string(),
            side: Side::Server,
            ..Default::default()
        },
        transport.clone(),
    );
    let display =
        Resource::new(&connection, WL_DISPLAY_ID, WlDisplayProxy::INTERFACE, 1).unwrap();
    (connection, transport, display)
}

fn surface(connection: &Rc<Connection>, version: u32) -> Rc<Resource> {
    let surface = Resource::new(
        connection,
        ObjectId::from_raw(3),
        WlSurfaceProxy::INTERFACE,
        version,
    )
    .unwrap();
    surface.set_handler(Rc::new(Requests::default()));
    surface
}

#[derive(Default)]
struct Requests {
    log: RefCell<Vec<(u32, Vec<i32>)>>,
}

#[async_trait(?Send)]
impl RequestHandler for Requests {
    async fn handle_request(
        &self,
        resource: &Rc<Resource>,
        opcode: u32,
        mut parser: MsgParser<'_>,
    ) -> Result<(), DispatchError> {
        let mut args = vec![];
        while parser.eof().is_err() {
            args.push(parser.int()?);
        }
        self.log.borrow_mut().push((opcode, args));
        if opcode == 0 {
            resource.destroy();
        }
        Ok(())
    }
}

fn request(id: ObjectId, opcode: u32, args: &[WireArg<'_>]) -> Message {
    Message::format(id, opcode, args, None)
}

#[test]
fn requests_reach_the_handler() {
    let (connection, _transport, _display) = server();
    let surface = Resource::new(
        &connection,
        ObjectId::from_raw(3),
        WlSurfaceProxy::INTERFACE,
        6,
    )
    .unwrap();
    let requests = Rc::new(Requests::default());
    surface.set_handler(requests.clone());
    connection.receive(request(
        surface.id(),
        2,
        &[
            WireArg::Int(1),
            WireArg::Int(2),
            WireArg::Int(3),
            WireArg::Int(4),
        ],
    ));
    connection.receive(request(surface.id(), 6, &[]));
    block_on(connection.dispatch_pending()).unwrap();
    assert_eq!(*requests.log.borrow(), [(2, vec![1, 2, 3, 4]), (6, vec![])]);
}

#[test]
fn post_error() {
    let (connection, transport, _display) = server();
    let surface = surface(&connection, 6);
    surface.post_error(WlSurfaceProxy::ERROR.invalid_scale, "scale must be positive");
    let messages = transport.messages.take();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].object, WL_DISPLAY_ID);
    assert_eq!(messages[0].opcode, 0);
    let mut parser = messages[0].parser();
    assert_eq!(parser.object().unwrap(), surface.id());
    assert_eq!(parser.uint().unwrap(), 0);
    assert_eq!(parser.string().unwrap(), "scale must be positive");
    parser.eof().unwrap();
}

#[test]
fn requests_newer_than_the_resource_are_rejected() {
    let (connection, transport, _display) = server();
    let surface = surface(&connection, 3);
    connection.receive(request(
        surface.id(),
        9,
        &[
            WireArg::Int(0),
            WireArg::Int(0),
            WireArg::Int(1),
            WireArg::Int(1),
        ],
    ));
    let res = block_on(connection.dispatch_pending());
    assert!(matches!(
        res,
        Err(ConnectionError::Dispatch {
            source: DispatchError::VersionTooLow {
                message: "damage_buffer",
                since: 4,
                version: 3,
                ..
            },
            ..
        })
    ));
    assert!(connection.is_killed());
    let messages = transport.messages.take();
    assert_eq!(messages.len(), 1);
    let mut parser = messages[0].parser();
    assert_eq!(parser.object().unwrap(), surface.id());
    assert_eq!(parser.uint().unwrap(), WlDisplayProxy::ERROR.invalid_method);
}

#[test]
fn unknown_requests_are_rejected() {
    let (connection, _transport, _display) = server();
    let surface = surface(&connection, 6);
    connection.receive(request(surface.id(), 20, &[]));
    let res = block_on(connection.dispatch_pending());
    assert!(matches!(
        res,
        Err(ConnectionError::Dispatch {
            source: DispatchError::UnknownOpcode { opcode: 20, .. },
            ..
        })
    ));
}

#[test]
fn missing_handler() {
    let (connection, _transport, _display) = server();
    let region = Resource::new(
        &connection,
        ObjectId::from_raw(4),
        WlRegionProxy::INTERFACE,
        1,
    )
    .unwrap();
    connection.receive(request(region.id(), 0, &[]));
    let res = block_on(connection.dispatch_pending());
    assert!(matches!(
        res,
        Err(ConnectionError::Dispatch {
            source: DispatchError::NoRequestHandler { .. },
            ..
        })
    ));
}

#[test]
fn destroy_deletes_the_id() {
    let (connection, transport, _display) = server();
    let surface = surface(&connection, 6);
    let fired = Rc::new(Cell::new(0));
    let fired2 = fired.clone();
    surface
        .add_destroy_listener(move |id| {
            assert_eq!(id, ObjectId::from_raw(3));
            fired2.set(fired2.get() + 1);
        })
        .unwrap();
    connection.receive(request(surface.id(), 0, &[]));
    block_on(connection.dispatch_pending()).unwrap();
    assert!(surface.is_destroyed());
    assert!(!surface.destroy());
    assert_eq!(fired.get(), 1);
    let messages = transport.messages.take();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].object, WL_DISPLAY_ID);
    assert_eq!(messages[0].opcode, 1);
    assert_eq!(messages[0].parser().uint().unwrap(), 3);
    connection.receive(request(ObjectId::from_raw(3), 6, &[]));
    block_on(connection.dispatch_pending()).unwrap();
    assert!(!connection.is_killed());
    let again = Resource::new(
        &connection,
        ObjectId::from_raw(3),
        WlSurfaceProxy::INTERFACE,
        6,
    );
    assert!(again.is_ok());
}

#[test]
fn server_ids() {
    let (connection, transport, _display) = server();
    let a = Resource::create(&connection, WlCallbackProxy::INTERFACE, 1).unwrap();
    let b = Resource::create(&connection, WlCallbackProxy::INTERFACE, 1).unwrap();
    assert_eq!(a.id().raw(), MIN_SERVER_ID);
    assert_eq!(b.id().raw(), MIN_SERVER_ID + 1);
    a.event(0, &[WireArg::Uint(5)]);
    a.destroy();
    let messages = transport.messages.take();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].object, a.id());
    let c = Resource::create(&connection, WlCallbackProxy::INTERFACE, 1).unwrap();
    assert_eq!(c.id(), a.id());
}

#[test]
fn peer_ids_are_checked() {
    let (connection, _transport, _display) = server();
    let res = Resource::new(
        &connection,
        ObjectId::from_raw(MIN_SERVER_ID + 1),
        WlCallbackProxy::INTERFACE,
        1,
    );
    assert!(matches!(res, Err(DispatchError::IdOutOfBounds(_))));
    let _surface = surface(&connection, 6);
    let res = Resource::new(
        &connection,
        ObjectId::from_raw(3),
        WlSurfaceProxy::INTERFACE,
        6,
    );
    assert!(matches!(res, Err(DispatchError::IdInUse(_))));
}

#[test]
fn user_data() {
    let (connection, _transport, _display) = server();
    let surface = surface(&connection, 6);
    assert!(surface.user_data::<u32>().is_none());
    surface.set_user_data(Rc::new(5u32));
    assert_eq!(surface.user_data::<u32>().as_deref(), Some(&5));
    assert!(surface.user_data::<String>().is_none());
}
