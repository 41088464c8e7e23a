#[cfg(test)]
mod tests;

use {
    crate::{object::ObjectId, utils::numcell::NumCell},
    std::{
        cell::{Cell, RefCell},
        future::Future,
        mem,
        pin::Pin,
        task::{Context, Poll, Waker},
    },
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum State {
    Alive,
    Destroyed,
    Notified,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DestroyListenerId(u64);

type Listener = Box<dyn FnOnce(ObjectId)>;

/// The one-shot destruction state of a protocol object.
///
/// `destroy` marks the object as destroyed. The listeners run later when the
/// connection delivers the notification. Listeners added in between still
/// run.
pub struct DestroySignal {
    state: Cell<State>,
    next_id: NumCell<u64>,
    listeners: RefCell<Vec<(DestroyListenerId, Listener)>>,
    waiters: RefCell<Vec<Waker>>,
}

impl Default for DestroySignal {
    fn default() -> Self {
        Self {
            state: Cell::new(State::Alive),
            next_id: NumCell::new(1),
            listeners: Default::default(),
            waiters: Default::default(),
        }
    }
}

impl DestroySignal {
    /// Returns `false` if the signal had already been destroyed.
    pub fn destroy(&self) -> bool {
        if self.state.get() != State::Alive {
            return false;
        }
        self.state.set(State::Destroyed);
        true
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.get() != State::Alive
    }

    pub fn is_notified(&self) -> bool {
        self.state.get() == State::Notified
    }

    /// Returns `None` if the listeners have already been notified.
    pub fn add_listener(
        &self,
        listener: impl FnOnce(ObjectId) + 'static,
    ) -> Option<DestroyListenerId> {
        if self.state.get() == State::Notified {
            return None;
        }
        let id = DestroyListenerId(self.next_id.fetch_add(1));
        self.listeners.borrow_mut().push((id, Box::new(listener)));
        Some(id)
    }

    pub fn remove_listener(&self, id: DestroyListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let len = listeners.len();
        listeners.retain(|(l, _)| *l != id);
        listeners.len() != len
    }

    pub(crate) fn notify(&self, id: ObjectId) {
        if self.state.get() == State::Notified {
            return;
        }
        self.state.set(State::Notified);
        let listeners = mem::take(&mut *self.listeners.borrow_mut());
        for (_, listener) in listeners {
            listener(id);
        }
        for waiter in mem::take(&mut *self.waiters.borrow_mut()) {
            waiter.wake();
        }
    }

    /// Resolves once the listeners have been notified.
    pub fn destroyed(&self) -> Destroyed<'_> {
        Destroyed { signal: self }
    }
}

pub struct Destroyed<'a> {
    signal: &'a DestroySignal,
}

impl Future for Destroyed<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.signal.is_notified() {
            Poll::Ready(())
        } else {
            self.signal.waiters.borrow_mut().push(cx.waker().clone());
            Poll::Pending
        }
    }
}
