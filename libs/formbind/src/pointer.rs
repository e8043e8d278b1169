use crate::dispatch::{self, Context};
use crate::error::Error;
use crate::shape::{Bind, Shape, Slot};

/// Indirection in front of a destination.
///
/// - `Box<T>`: always allocated.
/// - `Option<Box<T>>`: allocated on first write.
/// - `Option<&mut T>`: borrowed; a `None` has no storage to allocate into.
pub trait PointerSlot {
    /// The current pointee, if any.
    fn pointee(&mut self) -> Option<&mut dyn Bind>;

    /// Install a zero-valued pointee. `false` when the slot cannot own one.
    fn allocate(&mut self) -> bool;

    /// Drop a pointee installed by `allocate` that received no input.
    fn release(&mut self);
}

impl<T: Bind + Default> PointerSlot for Box<T> {
    fn pointee(&mut self) -> Option<&mut dyn Bind> {
        Some(&mut **self as &mut dyn Bind)
    }

    fn allocate(&mut self) -> bool {
        true
    }

    fn release(&mut self) {}
}

impl<T: Bind + Default> PointerSlot for Option<Box<T>> {
    fn pointee(&mut self) -> Option<&mut dyn Bind> {
        self.as_deref_mut().map(|t| t as &mut dyn Bind)
    }

    fn allocate(&mut self) -> bool {
        *self = Some(Box::default());
        true
    }

    fn release(&mut self) {
        *self = None;
    }
}

impl<T: Bind> PointerSlot for Option<&mut T> {
    fn pointee(&mut self) -> Option<&mut dyn Bind> {
        self.as_deref_mut().map(|t| t as &mut dyn Bind)
    }

    fn allocate(&mut self) -> bool {
        false
    }

    fn release(&mut self) {}
}

impl<T: Bind + Default> Bind for Box<T> {
    fn shape() -> Shape {
        Shape::Pointer
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Pointer(self)
    }
}

impl<T: Bind + Default> Bind for Option<Box<T>> {
    fn shape() -> Shape {
        Shape::Pointer
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Pointer(self)
    }
}

impl<T: Bind> Bind for Option<&mut T> {
    fn shape() -> Shape {
        Shape::Pointer
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Pointer(self)
    }
}

/// Recurse into the pointee at the same prefix, allocating a nil pointer
/// first. A fresh pointee that no key reached is released again.
pub(crate) fn bind(cx: &mut Context<'_>, prefix: &str, ptr: &mut dyn PointerSlot) -> Result<(), Error> {
    if let Some(inner) = ptr.pointee() {
        return dispatch::bind(cx, prefix, inner);
    }
    if !ptr.allocate() {
        return Err(Error::NonAddressableDestination { field: prefix.to_string() });
    }

    let before = cx.touched();
    if let Some(inner) = ptr.pointee() {
        dispatch::bind(cx, prefix, inner)?;
    }
    if cx.touched() == before {
        ptr.release();
    }
    Ok(())
}
