use crate::dispatch::{self, Context, child_key};
use crate::error::Error;
use crate::shape::{Bind, Shape};

/// Static description of one record field, emitted by `#[derive(Bind)]`.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Key segment (the field name, or its `#[form(rename)]`).
    pub name: &'static str,
    /// `pub` and not `#[form(skip)]`. Unexported fields are never bound.
    pub exported: bool,
    shape: Option<fn() -> Shape>,
}

impl FieldDescriptor {
    pub const fn exported(name: &'static str, shape: fn() -> Shape) -> Self {
        Self { name, exported: true, shape: Some(shape) }
    }

    pub const fn unexported(name: &'static str) -> Self {
        Self { name, exported: false, shape: None }
    }

    /// Shape of the field type; `None` for unexported fields.
    pub fn shape(&self) -> Option<Shape> {
        self.shape.map(|f| f())
    }
}

/// A struct with named fields. Implemented by `#[derive(Bind)]`.
pub trait Record {
    /// Every declared field, in declaration order.
    fn fields(&self) -> &'static [FieldDescriptor];

    /// The field at `index` in `fields()`; `None` for unexported fields.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Bind>;
}

/// Bind each exported field at `prefix.name` (or `name` at the top level).
pub(crate) fn bind(cx: &mut Context<'_>, prefix: &str, rec: &mut dyn Record) -> Result<(), Error> {
    for (index, field) in rec.fields().iter().enumerate() {
        if !field.exported {
            continue;
        }
        let key = child_key(prefix, field.name);
        if let Some(dest) = rec.field_mut(index) {
            dispatch::bind(cx, &key, dest)?;
        }
    }
    Ok(())
}
