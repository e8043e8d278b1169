use std::collections::BTreeMap;
use std::io;

use crate::dispatch::{Context, KeyValues};
use crate::error::{BindError, Error};
use crate::path::{Subscript, split_subscript};
use crate::shape::{AttachmentSlot, Bind, Shape, Slot};
use crate::upload::{FileHeader, UploadBytes, UploadFile, UploadReader, UploadSeeker, UploadedEntry};

/// A consumption shape for one uploaded entry.
pub trait AttachmentTarget {
    /// Take a view of `entry`. Each call starts from the beginning of the
    /// content, whatever other views were taken before.
    fn assign(&mut self, entry: &UploadedEntry) -> io::Result<()>;
}

impl AttachmentTarget for UploadBytes {
    fn assign(&mut self, entry: &UploadedEntry) -> io::Result<()> {
        self.0 = entry.to_bytes()?;
        Ok(())
    }
}

impl AttachmentTarget for UploadReader {
    fn assign(&mut self, entry: &UploadedEntry) -> io::Result<()> {
        self.0 = Box::new(entry.open()?);
        Ok(())
    }
}

impl AttachmentTarget for UploadSeeker {
    fn assign(&mut self, entry: &UploadedEntry) -> io::Result<()> {
        self.0 = entry.open()?;
        Ok(())
    }
}

impl AttachmentTarget for UploadFile {
    fn assign(&mut self, entry: &UploadedEntry) -> io::Result<()> {
        let (file, path) = entry.open_file()?;
        self.file = Some(file);
        self.path = Some(path);
        Ok(())
    }
}

impl AttachmentTarget for FileHeader {
    fn assign(&mut self, entry: &UploadedEntry) -> io::Result<()> {
        *self = entry.header();
        Ok(())
    }
}

macro_rules! bind_attachment {
    ($($ty:ty),+) => {
        $(
            impl Bind for $ty {
                fn shape() -> Shape {
                    Shape::Attachment { many: false }
                }

                fn slot(&mut self) -> Slot<'_> {
                    Slot::Attachment(AttachmentSlot::One(self))
                }
            }
        )+
    };
}

bind_attachment!(UploadBytes, UploadReader, UploadSeeker, UploadFile, FileHeader);

/// Entries submitted for `prefix`: the bare key, then `prefix[]`, then
/// `prefix[n]` in index order.
fn collect(cx: &Context<'_>, prefix: &str) -> Vec<UploadedEntry> {
    let mut entries = Vec::new();
    for key in [prefix.to_string(), format!("{prefix}[]")] {
        if let Some(found) = cx.uploads(&key) {
            entries.extend_from_slice(found);
        }
    }

    let mut indexed: BTreeMap<usize, Vec<UploadedEntry>> = BTreeMap::new();
    cx.scan(|key, values| {
        let KeyValues::Files(found) = values else {
            return;
        };
        let Some(rest) = key.strip_prefix(prefix).filter(|r| r.starts_with('[')) else {
            return;
        };
        if let Ok((Subscript::Index { value, .. }, "")) = split_subscript(rest) {
            indexed.entry(value).or_default().extend_from_slice(found);
        }
    });
    entries.extend(indexed.into_values().flatten());
    entries
}

/// Scalar destinations take the first entry; sequences take every entry,
/// one per element, in submission order.
pub(crate) fn bind(cx: &mut Context<'_>, prefix: &str, slot: AttachmentSlot<'_>) -> Result<(), Error> {
    let entries = collect(cx, prefix);
    if entries.is_empty() {
        return Ok(());
    }
    cx.touch();

    match slot {
        AttachmentSlot::One(target) => {
            if let Err(e) = target.assign(&entries[0]) {
                cx.record(BindError::attachment(prefix, e));
            }
        }
        AttachmentSlot::Many(seq) => {
            seq.reset(entries.len());
            for (i, entry) in entries.iter().enumerate() {
                let Some(elem) = seq.element_mut(i) else {
                    continue;
                };
                let result = match elem.slot() {
                    Slot::Attachment(AttachmentSlot::One(target)) => target.assign(entry),
                    _ => Ok(()),
                };
                if let Err(e) = result {
                    cx.record(BindError::attachment(&format!("{prefix}[{i}]"), e));
                }
            }
        }
    }
    Ok(())
}
