use {
    crate::{destroy::DestroySignal, object::ObjectId},
    std::{cell::RefCell, future::Future, pin::pin, rc::Rc, task::Context},
};

type Log = Rc<RefCell<Vec<&'static str>>>;

fn recorder() -> (Log, impl Fn(&'static str) -> Box<dyn FnOnce(ObjectId)>) {
    let log = Rc::new(RefCell::new(vec![]));
    let log2 = log.clone();
    let make = move |name: &'static str| -> Box<dyn FnOnce(ObjectId)> {
        let log = log2.clone();
        Box::new(move |_| log.borrow_mut().push(name))
    };
    (log, make)
}

#[test]
fn destroy_is_idempotent() {
    let signal = DestroySignal::default();
    assert!(!signal.is_destroyed());
    assert!(signal.destroy());
    assert!(!signal.destroy());
    assert!(signal.is_destroyed());
}

#[test]
fn listeners_fire_once() {
    let (log, make) = recorder();
    let signal = DestroySignal::default();
    signal.add_listener(make("before")).unwrap();
    signal.destroy();
    signal.add_listener(make("between")).unwrap();
    signal.destroy();
    signal.notify(ObjectId::from_raw(5));
    signal.notify(ObjectId::from_raw(5));
    assert_eq!(*log.borrow(), ["before", "between"]);
    assert!(signal.add_listener(make("after")).is_none());
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn removed_listeners_do_not_fire() {
    let (log, make) = recorder();
    let signal = DestroySignal::default();
    let a = signal.add_listener(make("a")).unwrap();
    signal.add_listener(make("b")).unwrap();
    assert!(signal.remove_listener(a));
    assert!(!signal.remove_listener(a));
    signal.destroy();
    signal.notify(ObjectId::from_raw(5));
    assert_eq!(*log.borrow(), ["b"]);
}

#[test]
fn listener_receives_id() {
    let seen = Rc::new(RefCell::new(None));
    let seen2 = seen.clone();
    let signal = DestroySignal::default();
    signal.add_listener(move |id| *seen2.borrow_mut() = Some(id));
    signal.destroy();
    signal.notify(ObjectId::from_raw(42));
    assert_eq!(*seen.borrow(), Some(ObjectId::from_raw(42)));
}

#[test]
fn destroyed_future() {
    let signal = DestroySignal::default();
    let waker = futures::task::noop_waker();
    let mut cx = Context::from_waker(&waker);
    let mut fut = pin!(signal.destroyed());
    assert!(fut.as_mut().poll(&mut cx).is_pending());
    signal.destroy();
    assert!(fut.as_mut().poll(&mut cx).is_pending());
    signal.notify(ObjectId::from_raw(1));
    assert!(fut.as_mut().poll(&mut cx).is_ready());
}
