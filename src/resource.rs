#[cfg(test)]
mod tests;

use {
    crate::{
        LocalBoxFuture,
        connection::{Connection, ConnectionError},
        destroy::{DestroyListenerId, DestroySignal, Destroyed},
        object::{DispatchError, Interface, Object, ObjectId},
        utils::{
            buffd::{MsgParser, WireArg},
            clonecell::CloneCell,
        },
    },
    async_trait::async_trait,
    std::{any::Any, rc::Rc},
};

/// Handles the requests sent to a resource.
#[async_trait(?Send)]
pub trait RequestHandler {
    async fn handle_request(
        &self,
        resource: &Rc<Resource>,
        opcode: u32,
        parser: MsgParser<'_>,
    ) -> Result<(), DispatchError>;
}

/// A server-side object.
///
/// Requests whose version is newer than the version of the resource are
/// rejected before they reach the handler.
pub struct Resource {
    connection: Rc<Connection>,
    id: ObjectId,
    interface: Interface,
    version: u32,
    destroy: Rc<DestroySignal>,
    handler: CloneCell<Option<Rc<dyn RequestHandler>>>,
    user_data: CloneCell<Option<Rc<dyn Any>>>,
}

impl Resource {
    fn alloc(
        connection: &Rc<Connection>,
        id: ObjectId,
        interface: Interface,
        version: u32,
    ) -> Rc<Self> {
        Rc::new(Self {
            connection: connection.clone(),
            id,
            interface,
            version,
            destroy: Default::default(),
            handler: Default::default(),
            user_data: Default::default(),
        })
    }

    /// Creates a resource for an id chosen by the peer.
    pub fn new(
        connection: &Rc<Connection>,
        id: ObjectId,
        interface: Interface,
        version: u32,
    ) -> Result<Rc<Self>, DispatchError> {
        connection.check_peer_id(id)?;
        let resource = Self::alloc(connection, id, interface, version);
        connection.register(resource.clone())?;
        Ok(resource)
    }

    /// Creates a resource with a newly allocated id.
    pub fn create(
        connection: &Rc<Connection>,
        interface: Interface,
        version: u32,
    ) -> Result<Rc<Self>, ConnectionError> {
        let id = connection.allocate_id()?;
        let resource = Self::alloc(connection, id, interface, version);
        connection.insert_local(resource.clone());
        Ok(resource)
    }

    pub fn connection(&self) -> &Rc<Connection> {
        &self.connection
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn set_handler(&self, handler: Rc<dyn RequestHandler>) {
        self.handler.set(Some(handler));
    }

    pub fn set_user_data<T: 'static>(&self, data: Rc<T>) {
        self.user_data.set(Some(data));
    }

    pub fn user_data<T: 'static>(&self) -> Option<Rc<T>> {
        self.user_data.get()?.downcast().ok()
    }

    pub fn event(&self, opcode: u32, args: &[WireArg<'_>]) {
        self.connection.send(self.id, opcode, args);
    }

    /// Sends a protocol error for this object to the peer.
    pub fn post_error(&self, code: u32, message: &str) {
        log::warn!(
            "{}: Posting error {} on {}@{}: {}",
            self.connection.name(),
            code,
            self.interface.name,
            self.id,
            message,
        );
        self.connection.post_display_error(self.id, code, message);
    }

    /// Returns `false` if the resource had already been destroyed.
    pub fn destroy(&self) -> bool {
        if !self.destroy.destroy() {
            return false;
        }
        self.connection.deregister(self.id);
        self.connection
            .schedule_destroy_notification(self.id, self.destroy.clone());
        true
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroy.is_destroyed()
    }

    pub fn add_destroy_listener(
        &self,
        listener: impl FnOnce(ObjectId) + 'static,
    ) -> Option<DestroyListenerId> {
        self.destroy.add_listener(listener)
    }

    pub fn remove_destroy_listener(&self, id: DestroyListenerId) -> bool {
        self.destroy.remove_listener(id)
    }

    pub fn destroyed(&self) -> Destroyed<'_> {
        self.destroy.destroyed()
    }
}

impl Object for Resource {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn interface(&self) -> Interface {
        self.interface
    }

    fn handle_message<'a>(
        self: Rc<Self>,
        opcode: u32,
        parser: MsgParser<'a>,
    ) -> LocalBoxFuture<'a, Result<(), DispatchError>> {
        Box::pin(async move {
            let Some(desc) = self.interface.request(opcode) else {
                return Err(DispatchError::UnknownOpcode {
                    interface: self.interface,
                    opcode,
                });
            };
            if desc.since > self.version {
                return Err(DispatchError::VersionTooLow {
                    interface: self.interface,
                    message: desc.name,
                    since: desc.since,
                    version: self.version,
                });
            }
            let Some(handler) = self.handler.get() else {
                return Err(DispatchError::NoRequestHandler {
                    interface: self.interface,
                    id: self.id,
                });
            };
            handler.handle_request(&self, opcode, parser).await
        })
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn break_loops(&self) {
        self.handler.set(None);
        self.user_data.set(None);
    }
}
