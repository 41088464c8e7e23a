use std::{
    cell::RefCell,
    collections::VecDeque,
    future::Future,
    mem,
    pin::Pin,
    task::{Context, Poll, Waker},
};

/// A single-threaded FIFO whose consumer can wait for the next element.
pub struct AsyncQueue<T> {
    data: RefCell<VecDeque<T>>,
    waiters: RefCell<Vec<Waker>>,
}

impl<T> Default for AsyncQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AsyncQueue<T> {
    pub fn new() -> Self {
        Self {
            data: RefCell::new(Default::default()),
            waiters: RefCell::new(vec![]),
        }
    }

    pub fn push(&self, t: T) {
        self.data.borrow_mut().push_back(t);
        let waiters = mem::take(&mut *self.waiters.borrow_mut());
        for waiter in waiters {
            waiter.wake();
        }
    }

    pub fn try_pop(&self) -> Option<T> {
        self.data.borrow_mut().pop_front()
    }

    pub fn pop(&self) -> AsyncQueuePop<'_, T> {
        AsyncQueuePop { queue: self }
    }

    pub fn take_all(&self) -> VecDeque<T> {
        mem::take(&mut *self.data.borrow_mut())
    }
}

pub struct AsyncQueuePop<'a, T> {
    queue: &'a AsyncQueue<T>,
}

impl<T> Future for AsyncQueuePop<'_, T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(t) = self.queue.try_pop() {
            Poll::Ready(t)
        } else {
            self.queue.waiters.borrow_mut().push(cx.waker().clone());
            Poll::Pending
        }
    }
}
