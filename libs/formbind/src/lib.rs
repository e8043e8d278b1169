//! Bind flat, multi-valued form parameters into typed Rust values.
//!
//! Keys use dot and bracket notation (`user.Phones[0].Label`, `ids[]`).
//! Destinations are primitives, `chrono` times, pointers (`Box`,
//! `Option<Box<_>>`), `#[derive(Bind)]` records, `Vec`s, and upload views.
//!
//! ```ignore
//! #[derive(Bind, Default)]
//! pub struct Phone {
//!     pub label: String,
//!     pub number: String,
//! }
//!
//! #[derive(Bind, Default)]
//! pub struct User {
//!     pub id: u32,
//!     pub phones: Vec<Phone>,
//!     pub labels: Vec<String>,
//! }
//!
//! let mut user = User::default();
//! binder.field("user", &mut user)?;
//! ```

extern crate self as formbind;

pub mod attachment;
pub mod binder;
pub mod config;
mod convert;
pub mod custom;
mod dispatch;
pub mod error;
pub mod params;
pub mod path;
pub mod pointer;
pub mod record;
pub mod sequence;
pub mod shape;
pub mod upload;

pub use attachment::AttachmentTarget;
pub use binder::{Binder, bind_from_map};
pub use config::{BindConfig, ConfigError, TimeFormats};
pub use custom::CustomSlot;
pub use error::{AggregateError, BindError, Error, ErrorKind};
pub use formbind_derive::Bind;
pub use params::{AttachmentSet, MultiMap, ParameterSet};
pub use path::{ParsedPath, PathError, PathSegment};
pub use pointer::PointerSlot;
pub use record::{FieldDescriptor, Record};
pub use sequence::{Layout, Sequence};
pub use shape::{AttachmentSlot, Bind, PrimitiveKind, PrimitiveSlot, Shape, Slot, TimeSlot};
pub use upload::{FileHeader, ReadSeek, UploadBytes, UploadFile, UploadReader, UploadSeeker, UploadedEntry};
