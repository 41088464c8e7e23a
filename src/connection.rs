
mod error;

pub use error::ConnectionError;
use {
    crate::{
        destroy::DestroySignal,
        object::{DispatchError, MIN_SERVER_ID, Object, ObjectId, WL_DISPLAY_ID},
        proxy::{Proxy, ProxyConstructor},
        utils::{
            bitfield::Bitfield,
            buffd::{Message, WireArg},
            copyhashmap::CopyHashMap,
            errorfmt::ErrorFmt,
            queue::AsyncQueue,
        },
    },
    std::{
        cell::{Cell, RefCell},
        rc::Rc,
    },
};

pub const DISPLAY_ERROR_OPCODE: u32 = 0;
pub const DISPLAY_DELETE_ID_OPCODE: u32 = 1;

pub const DISPLAY_ERROR_INVALID_OBJECT: u32 = 0;
pub const DISPLAY_ERROR_INVALID_METHOD: u32 = 1;
pub const DISPLAY_ERROR_IMPLEMENTATION: u32 = 3;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Side {
    #[default]
    Client,
    Server,
}

/// What happens when an event arrives for a proxy without a listener.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ListenerPolicy {
    /// The event is logged and dropped.
    #[default]
    Drop,
    /// The connection is killed.
    Fail,
}

#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Used in log messages.
    pub name: String,
    pub side: Side,
    pub listener_policy: ListenerPolicy,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            name: "connection".to_string(),
            side: Side::default(),
            listener_policy: ListenerPolicy::default(),
        }
    }
}

/// Receives the messages sent over a connection.
pub trait Transport {
    fn send(&self, message: Message);
}

enum Work {
    Message(Message),
    NotifyDestroyed(ObjectId, Rc<DestroySignal>),
    Shutdown,
}

/// One end of a protocol connection.
///
/// The connection owns the object table and the queue of incoming messages.
/// Incoming messages are handled by a single task running [`Connection::dispatch`]
/// or [`Connection::dispatch_pending`]. Each message is handled completely
/// before the next one.
pub struct Connection {
    config: ConnectionConfig,
    transport: Rc<dyn Transport>,
    ids: RefCell<Bitfield>,
    /// `None` marks an id that is no longer used locally but has not been
    /// released or reused by the peer.
    objects: CopyHashMap<ObjectId, Option<Rc<dyn Object>>>,
    /// Live objects whose ids the peer has already deleted.
    peer_deleted: CopyHashMap<ObjectId, ()>,
    work: AsyncQueue<Work>,
    dispatching: Cell<bool>,
    killed: Cell<bool>,
}

struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Connection {
    pub fn new(config: ConnectionConfig, transport: Rc<dyn Transport>) -> Rc<Self> {
        let mut ids = Bitfield::default();
        if config.side == Side::Client {
            ids.take(0);
            ids.take(WL_DISPLAY_ID.raw());
        }
        Rc::new(Self {
            config,
            transport,
            ids: RefCell::new(ids),
            objects: Default::default(),
            peer_deleted: Default::default(),
            work: Default::default(),
            dispatching: Cell::new(false),
            killed: Cell::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn side(&self) -> Side {
        self.config.side
    }

    pub fn is_killed(&self) -> bool {
        self.killed.get()
    }

    /// Creates the proxy of the display object.
    pub fn display<P: Proxy>(self: &Rc<Self>, ctor: ProxyConstructor<P>) -> Rc<P> {
        let display = Rc::new(ctor(self, WL_DISPLAY_ID));
        self.objects.set(WL_DISPLAY_ID, Some(display.clone()));
        display
    }

    fn is_local(&self, id: ObjectId) -> bool {
        match self.config.side {
            Side::Client => id.raw() < MIN_SERVER_ID,
            Side::Server => id.raw() >= MIN_SERVER_ID,
        }
    }

    fn id_offset(&self, id: ObjectId) -> u32 {
        match self.config.side {
            Side::Client => id.raw(),
            Side::Server => id.raw() - MIN_SERVER_ID,
        }
    }

    pub fn allocate_id(&self) -> Result<ObjectId, ConnectionError> {
        let mut ids = self.ids.borrow_mut();
        let offset = ids.acquire();
        let id = match self.config.side {
            Side::Client if offset < MIN_SERVER_ID => offset,
            Side::Server if offset <= u32::MAX - MIN_SERVER_ID => MIN_SERVER_ID + offset,
            _ => {
                ids.release(offset);
                return Err(ConnectionError::TooManyIds);
            }
        };
        Ok(ObjectId::from_raw(id))
    }

    /// Checks that `id` is an id the peer may choose for a new object.
    pub fn check_peer_id(&self, id: ObjectId) -> Result<(), DispatchError> {
        if id.is_none() || self.is_local(id) {
            return Err(DispatchError::IdOutOfBounds(id));
        }
        Ok(())
    }

    pub fn register(&self, object: Rc<dyn Object>) -> Result<(), DispatchError> {
        let id = object.id();
        if id.is_none() {
            return Err(DispatchError::NullObject);
        }
        if matches!(self.objects.get(&id), Some(Some(_))) {
            return Err(DispatchError::IdInUse(id));
        }
        self.objects.set(id, Some(object));
        Ok(())
    }

    /// Registers an object whose id was returned by `allocate_id`.
    pub(crate) fn insert_local(&self, object: Rc<dyn Object>) {
        self.objects.set(object.id(), Some(object));
    }

    /// Removes the object with this id from the object table.
    ///
    /// Ids allocated by the peer stay reserved until the peer reuses them.
    /// On the client, ids allocated locally stay reserved until the server
    /// deletes them. On the server, the client is told that ids it allocated
    /// can be reused.
    pub fn deregister(&self, id: ObjectId) {
        let Some(Some(object)) = self.objects.get(&id) else {
            return;
        };
        object.break_loops();
        let local = self.is_local(id);
        let deleted = self.peer_deleted.remove(&id).is_some();
        if local && (self.config.side == Side::Server || deleted) {
            self.objects.remove(&id);
            self.ids.borrow_mut().release(self.id_offset(id));
        } else {
            self.objects.set(id, None);
        }
        if self.config.side == Side::Server && !local {
            self.send(
                WL_DISPLAY_ID,
                DISPLAY_DELETE_ID_OPCODE,
                &[WireArg::Uint(id.raw())],
            );
        }
    }

    /// Makes a locally allocated id available again.
    ///
    /// If the object is still alive, the id becomes available once it is
    /// destroyed.
    pub fn release_id(&self, id: ObjectId) {
        match self.objects.get(&id) {
            Some(Some(object)) => {
                log::debug!(
                    "{}: Id {} of the live {} was deleted by the peer",
                    self.config.name,
                    id,
                    object.interface().name,
                );
                if self.is_local(id) {
                    self.peer_deleted.set(id, ());
                }
                return;
            }
            Some(None) => {
                self.objects.remove(&id);
            }
            None => {}
        }
        if self.is_local(id) {
            self.ids.borrow_mut().release(self.id_offset(id));
        }
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        matches!(self.objects.get(&id), Some(Some(_)))
    }

    pub fn lookup(&self, id: ObjectId) -> Result<Rc<dyn Object>, DispatchError> {
        if id.is_none() {
            return Err(DispatchError::NullObject);
        }
        match self.objects.get(&id) {
            Some(Some(object)) => Ok(object),
            Some(None) => Err(DispatchError::ObjectDestroyed(id)),
            None => Err(DispatchError::UnknownObject(id)),
        }
    }

    pub fn lookup_optional(
        &self,
        id: ObjectId,
    ) -> Result<Option<Rc<dyn Object>>, DispatchError> {
        if id.is_none() {
            return Ok(None);
        }
        self.lookup(id).map(Some)
    }

    /// Sends a message that does not create an object.
    pub fn send(&self, id: ObjectId, opcode: u32, args: &[WireArg<'_>]) {
        self.send_message(Message::format(id, opcode, args, None), args);
    }

    /// Sends a message that creates an object with a newly allocated id.
    ///
    /// If the sender is dead or no id is available, the returned proxy is
    /// not registered and everything sent through it is dropped.
    pub fn send_constructing<P: Proxy>(
        self: &Rc<Self>,
        id: ObjectId,
        opcode: u32,
        ctor: ProxyConstructor<P>,
        args: &[WireArg<'_>],
    ) -> Rc<P> {
        if !self.contains(id) {
            log::warn!(
                "{}: Cannot create an object through dead object {}",
                self.config.name,
                id
            );
            return Rc::new(ctor(self, ObjectId::NONE));
        }
        let new_id = match self.allocate_id() {
            Ok(new_id) => new_id,
            Err(e) => {
                log::error!("{}: {}", self.config.name, ErrorFmt(e));
                self.kill();
                return Rc::new(ctor(self, ObjectId::NONE));
            }
        };
        let proxy = Rc::new(ctor(self, new_id));
        self.insert_local(proxy.clone());
        self.send_message(Message::format(id, opcode, args, Some(new_id)), args);
        proxy
    }

    /// Creates the proxy of an object the peer created.
    pub fn construct<P: Proxy>(
        self: &Rc<Self>,
        id: ObjectId,
        ctor: ProxyConstructor<P>,
    ) -> Result<Rc<P>, DispatchError> {
        self.check_peer_id(id)?;
        let proxy = Rc::new(ctor(self, id));
        self.register(proxy.clone())?;
        Ok(proxy)
    }

    fn send_message(&self, message: Message, args: &[WireArg<'_>]) {
        if self.killed.get() {
            log::debug!(
                "{}: Dropping message to {}: the connection is dead",
                self.config.name,
                message.object
            );
            return;
        }
        let Some(Some(object)) = self.objects.get(&message.object) else {
            log::warn!(
                "{}: Dropping message {} to dead object {}",
                self.config.name,
                message.opcode,
                message.object,
            );
            return;
        };
        if log::log_enabled!(log::Level::Trace) {
            let interface = object.interface();
            let desc = match self.config.side {
                Side::Client => interface.request(message.opcode),
                Side::Server => interface.event(message.opcode),
            };
            log::trace!(
                "{} <= {}@{}.{}({:?})",
                self.config.name,
                interface.name,
                message.object,
                desc.map_or("?", |d| d.name),
                args,
            );
        }
        self.transport.send(message);
    }

    /// Sends a display error even if the target object is gone.
    pub fn post_display_error(&self, object: ObjectId, code: u32, message: &str) {
        if self.killed.get() {
            return;
        }
        let args = [
            WireArg::Object(object),
            WireArg::Uint(code),
            WireArg::String(Some(message)),
        ];
        self.transport.send(Message::format(
            WL_DISPLAY_ID,
            DISPLAY_ERROR_OPCODE,
            &args,
            None,
        ));
    }

    /// Queues a message received from the peer.
    pub fn receive(&self, message: Message) {
        if self.killed.get() {
            return;
        }
        self.work.push(Work::Message(message));
    }

    pub(crate) fn schedule_destroy_notification(
        &self,
        id: ObjectId,
        signal: Rc<DestroySignal>,
    ) {
        if self.killed.get() {
            signal.notify(id);
        } else {
            self.work.push(Work::NotifyDestroyed(id, signal));
        }
    }

    /// Handles queued work until the connection is killed.
    pub async fn dispatch(self: Rc<Self>) -> Result<(), ConnectionError> {
        let _guard = self.start_dispatch()?;
        loop {
            if !self.process(self.work.pop().await).await? {
                return Ok(());
            }
        }
    }

    /// Handles the work that is currently queued.
    ///
    /// Work queued by the handlers is handled as well.
    pub async fn dispatch_pending(self: &Rc<Self>) -> Result<(), ConnectionError> {
        let _guard = self.start_dispatch()?;
        while let Some(work) = self.work.try_pop() {
            if !self.process(work).await? {
                break;
            }
        }
        Ok(())
    }

    fn start_dispatch(&self) -> Result<DispatchGuard<'_>, ConnectionError> {
        if self.killed.get() {
            return Err(ConnectionError::Killed);
        }
        if self.dispatching.replace(true) {
            return Err(ConnectionError::AlreadyDispatching);
        }
        Ok(DispatchGuard(&self.dispatching))
    }

    async fn process(self: &Rc<Self>, work: Work) -> Result<bool, ConnectionError> {
        match work {
            Work::Message(message) => {
                if let Err(e) = self.handle_message(&message).await {
                    log::error!(
                        "{}: A fatal error occurred: {}",
                        self.config.name,
                        ErrorFmt(&e)
                    );
                    if self.config.side == Side::Server {
                        self.post_fatal_error(message.object, &e);
                    }
                    self.kill();
                    return Err(e);
                }
                Ok(true)
            }
            Work::NotifyDestroyed(id, signal) => {
                signal.notify(id);
                Ok(true)
            }
            Work::Shutdown => Ok(false),
        }
    }

    fn post_fatal_error(&self, object: ObjectId, e: &ConnectionError) {
        let code = match e {
            ConnectionError::UnknownObject(_) => DISPLAY_ERROR_INVALID_OBJECT,
            ConnectionError::Dispatch { source, .. } => match source {
                DispatchError::Parser(_)
                | DispatchError::UnknownOpcode { .. }
                | DispatchError::VersionTooLow { .. } => DISPLAY_ERROR_INVALID_METHOD,
                DispatchError::UnknownObject(_)
                | DispatchError::NullObject
                | DispatchError::IdInUse(_)
                | DispatchError::IdOutOfBounds(_) => DISPLAY_ERROR_INVALID_OBJECT,
                _ => DISPLAY_ERROR_IMPLEMENTATION,
            },
            _ => DISPLAY_ERROR_IMPLEMENTATION,
        };
        self.post_display_error(object, code, &ErrorFmt(e).to_string());
    }

    async fn handle_message(self: &Rc<Self>, message: &Message) -> Result<(), ConnectionError> {
        let object = match self.objects.get(&message.object) {
            Some(Some(object)) => object,
            Some(None) => {
                log::debug!(
                    "{}: Ignoring message {} to destroyed object {}",
                    self.config.name,
                    message.opcode,
                    message.object
                );
                return Ok(());
            }
            None => return Err(ConnectionError::UnknownObject(message.object)),
        };
        let interface = object.interface();
        if log::log_enabled!(log::Level::Trace) {
            let desc = match self.config.side {
                Side::Client => interface.event(message.opcode),
                Side::Server => interface.request(message.opcode),
            };
            log::trace!(
                "{} => {}@{}.{} ({} bytes, {} fds)",
                self.config.name,
                interface.name,
                message.object,
                desc.map_or("?", |d| d.name),
                message.body.len(),
                message.fds.len(),
            );
        }
        if self.config.side == Side::Client
            && message.object == WL_DISPLAY_ID
            && message.opcode == DISPLAY_DELETE_ID_OPCODE
        {
            if let Ok(id) = message.parser().uint() {
                self.release_id(ObjectId::from_raw(id));
            }
        }
        let res = object
            .handle_message(message.opcode, message.parser())
            .await;
        match res {
            Ok(()) => Ok(()),
            Err(DispatchError::ListenerNotBound { interface, message: name })
                if self.config.listener_policy == ListenerPolicy::Drop =>
            {
                log::debug!(
                    "{}: Dropping {}.{} for {}: no listener is bound",
                    self.config.name,
                    interface.name,
                    name,
                    message.object,
                );
                Ok(())
            }
            Err(DispatchError::ObjectDestroyed(id)) => {
                log::debug!(
                    "{}: Dropping message {} to {}: it refers to destroyed object {}",
                    self.config.name,
                    message.opcode,
                    message.object,
                    id,
                );
                Ok(())
            }
            Err(source) => Err(ConnectionError::Dispatch {
                interface,
                id: message.object,
                source,
            }),
        }
    }

    /// Kills the connection.
    ///
    /// All objects are dropped without destroy notifications. Pending
    /// notifications of objects destroyed earlier are delivered. A running
    /// `dispatch` returns.
    pub fn kill(&self) {
        if self.killed.replace(true) {
            return;
        }
        log::info!("{}: Killing the connection", self.config.name);
        let objects: Vec<_> = self
            .objects
            .lock()
            .drain()
            .filter_map(|(_, object)| object)
            .collect();
        for object in objects {
            object.break_loops();
        }
        self.peer_deleted.lock().clear();
        for work in self.work.take_all() {
            if let Work::NotifyDestroyed(id, signal) = work {
                signal.notify(id);
            }
        }
        self.work.push(Work::Shutdown);
    }
}
