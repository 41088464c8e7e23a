use std::{cell::UnsafeCell, mem, rc::Rc};

/// A cell for values whose `clone` cannot observe the cell.
pub struct CloneCell<T: UnsafeCellCloneSafe> {
    data: UnsafeCell<T>,
}

impl<T: UnsafeCellCloneSafe> CloneCell<T> {
    pub fn new(t: T) -> Self {
        Self {
            data: UnsafeCell::new(t),
        }
    }

    #[inline(always)]
    pub fn get(&self) -> T {
        unsafe { (*self.data.get()).clone() }
    }

    #[inline(always)]
    pub fn set(&self, t: T) -> T {
        unsafe { mem::replace(&mut *self.data.get(), t) }
    }
}

impl<T: Default + UnsafeCellCloneSafe> Default for CloneCell<T> {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

/// # Safety
///
/// `clone` must not access the `CloneCell` that contains the value.
pub unsafe trait UnsafeCellCloneSafe: Clone {}

unsafe impl<T: UnsafeCellCloneSafe> UnsafeCellCloneSafe for Option<T> {}

unsafe impl<T: ?Sized> UnsafeCellCloneSafe for Rc<T> {}
