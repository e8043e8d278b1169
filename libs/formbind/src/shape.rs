use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::attachment::AttachmentTarget;
use crate::custom::CustomSlot;
use crate::pointer::PointerSlot;
use crate::record::Record;
use crate::sequence::Sequence;

// ═══════════════════════════════════════════════════════════════
//  Destination classification
// ═══════════════════════════════════════════════════════════════

/// Closed classification of a destination type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Primitive(PrimitiveKind),
    Time,
    /// Upload consumer; `many` for a sequence of consumers.
    Attachment { many: bool },
    Pointer,
    Record,
    Sequence,
    /// Bound by a conversion registered on the `Binder`.
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Bool,
    Int { bits: u32 },
    Uint { bits: u32 },
    Float { bits: u32 },
    Str,
}

/// Mutable view of a destination, one variant per `Shape`.
pub enum Slot<'a> {
    Primitive(PrimitiveSlot<'a>),
    Time(TimeSlot<'a>),
    Attachment(AttachmentSlot<'a>),
    Pointer(&'a mut dyn PointerSlot),
    Record(&'a mut dyn Record),
    Sequence(&'a mut dyn Sequence),
    Custom(CustomSlot<'a>),
}

pub enum PrimitiveSlot<'a> {
    Bool(&'a mut bool),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    Isize(&'a mut isize),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    Usize(&'a mut usize),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Str(&'a mut String),
}

pub enum TimeSlot<'a> {
    DateTime(&'a mut NaiveDateTime),
    Date(&'a mut NaiveDate),
    Utc(&'a mut DateTime<Utc>),
}

pub enum AttachmentSlot<'a> {
    /// Receives the first uploaded entry.
    One(&'a mut dyn AttachmentTarget),
    /// Sequence whose elements each receive one entry, in submission order.
    Many(&'a mut dyn Sequence),
}

/// A type that parameters can be bound into.
///
/// `shape` is fixed per type; `slot` hands the dispatcher the matching view.
/// Records get this from `#[derive(Bind)]`.
pub trait Bind {
    fn shape() -> Shape
    where
        Self: Sized;

    fn slot(&mut self) -> Slot<'_>;
}

// ═══════════════════════════════════════════════════════════════
//  Leaf impls
// ═══════════════════════════════════════════════════════════════

macro_rules! bind_primitive {
    ($($ty:ty => $variant:ident, $kind:expr;)+) => {
        $(
            impl Bind for $ty {
                fn shape() -> Shape {
                    Shape::Primitive($kind)
                }

                fn slot(&mut self) -> Slot<'_> {
                    Slot::Primitive(PrimitiveSlot::$variant(self))
                }
            }
        )+
    };
}

bind_primitive! {
    bool => Bool, PrimitiveKind::Bool;
    i8 => I8, PrimitiveKind::Int { bits: 8 };
    i16 => I16, PrimitiveKind::Int { bits: 16 };
    i32 => I32, PrimitiveKind::Int { bits: 32 };
    i64 => I64, PrimitiveKind::Int { bits: 64 };
    isize => Isize, PrimitiveKind::Int { bits: isize::BITS };
    u8 => U8, PrimitiveKind::Uint { bits: 8 };
    u16 => U16, PrimitiveKind::Uint { bits: 16 };
    u32 => U32, PrimitiveKind::Uint { bits: 32 };
    u64 => U64, PrimitiveKind::Uint { bits: 64 };
    usize => Usize, PrimitiveKind::Uint { bits: usize::BITS };
    f32 => F32, PrimitiveKind::Float { bits: 32 };
    f64 => F64, PrimitiveKind::Float { bits: 64 };
    String => Str, PrimitiveKind::Str;
}

macro_rules! bind_time {
    ($($ty:ty => $variant:ident;)+) => {
        $(
            impl Bind for $ty {
                fn shape() -> Shape {
                    Shape::Time
                }

                fn slot(&mut self) -> Slot<'_> {
                    Slot::Time(TimeSlot::$variant(self))
                }
            }
        )+
    };
}

bind_time! {
    NaiveDateTime => DateTime;
    NaiveDate => Date;
    DateTime<Utc> => Utc;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_shapes() {
        assert_eq!(<u8 as Bind>::shape(), Shape::Primitive(PrimitiveKind::Uint { bits: 8 }));
        assert_eq!(<String as Bind>::shape(), Shape::Primitive(PrimitiveKind::Str));
        assert_eq!(<NaiveDate as Bind>::shape(), Shape::Time);
    }
}
