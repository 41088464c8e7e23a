use {
    crate::{
        connection::Connection,
        destroy::{DestroyListenerId, DestroySignal, Destroyed},
        object::{Object, ObjectId},
    },
    std::rc::Rc,
};

/// Creates the proxy of a new object.
pub type ProxyConstructor<P> = fn(&Rc<Connection>, ObjectId) -> P;

/// A client-side object.
pub trait Proxy: Object {
    fn core(&self) -> &ProxyCore;
}

/// State shared by all proxies.
pub struct ProxyCore {
    connection: Rc<Connection>,
    id: ObjectId,
    destroy: Rc<DestroySignal>,
}

impl ProxyCore {
    pub fn new(connection: &Rc<Connection>, id: ObjectId) -> Self {
        Self {
            connection: connection.clone(),
            id,
            destroy: Default::default(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn connection(&self) -> &Rc<Connection> {
        &self.connection
    }

    /// Deregisters the object and schedules the destroy notification.
    ///
    /// Returns `false` if the object had already been destroyed.
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
