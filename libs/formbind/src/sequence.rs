use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::dispatch::{self, Context, KeyValues, Overlay};
use crate::error::{BindError, Error};
use crate::path::{Subscript, split_subscript};
use crate::shape::{AttachmentSlot, Bind, Shape, Slot};
use crate::upload::UploadedEntry;

/// Growable run of destinations.
pub trait Sequence {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the contents with `len` zero values.
    fn reset(&mut self, len: usize);

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Bind>;
}

impl<T: Bind + Default> Sequence for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn reset(&mut self, len: usize) {
        self.clear();
        self.resize_with(len, T::default);
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Bind> {
        self.get_mut(index).map(|t| t as &mut dyn Bind)
    }
}

/// A `Vec` of upload consumers is itself an upload consumer.
impl<T: Bind + Default> Bind for Vec<T> {
    fn shape() -> Shape {
        match T::shape() {
            Shape::Attachment { many: false } => Shape::Attachment { many: true },
            _ => Shape::Sequence,
        }
    }

    fn slot(&mut self) -> Slot<'_> {
        match Self::shape() {
            Shape::Attachment { .. } => Slot::Attachment(AttachmentSlot::Many(self)),
            _ => Slot::Sequence(self),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Discovery
// ═══════════════════════════════════════════════════════════════

/// Keys found under one sequence prefix, and the element positions they map to.
///
/// Indexed keys (`p[3]…`) occupy their index. Unindexed keys (`p`, `p[]`,
/// `p[]…`) are grouped by the suffix after the brackets; appended element `i`
/// takes the `i`-th value of every group and sits after the highest index.
#[derive(Debug, Default)]
pub struct Layout {
    /// Index → the spelling used for it (`[01]` and `[1]` collide).
    indexed: BTreeMap<usize, String>,
    text: Vec<(String, Vec<String>)>,
    files: Vec<(String, Vec<UploadedEntry>)>,
    rejected: Vec<BindError>,
}

impl Layout {
    pub fn max_index(&self) -> Option<usize> {
        self.indexed.keys().next_back().copied()
    }

    /// Indexed positions in ascending order.
    pub fn indexed(&self) -> impl Iterator<Item = usize> + '_ {
        self.indexed.keys().copied()
    }

    /// First position taken by appended elements.
    pub fn append_start(&self) -> usize {
        self.max_index().map_or(0, |max| max + 1)
    }

    pub fn append_count(&self) -> usize {
        let text = self.text.iter().map(|(_, v)| v.len());
        let files = self.files.iter().map(|(_, v)| v.len());
        text.chain(files).max().unwrap_or(0)
    }

    /// Length of the bound sequence; zero when no key matched.
    pub fn len(&self) -> usize {
        self.append_start() + self.append_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Malformed or out-of-limit keys skipped during discovery.
    pub fn rejected(&self) -> &[BindError] {
        &self.rejected
    }

    fn add_index(&mut self, key: &str, index: usize, raw: &str, limit: usize) {
        if index >= limit {
            tracing::warn!(key, index, limit, "sequence index over limit, skipping");
            self.rejected.push(BindError::invalid_index(key, index, limit));
            return;
        }
        match self.indexed.entry(index) {
            Entry::Vacant(slot) => {
                slot.insert(raw.to_string());
            }
            Entry::Occupied(mut slot) => {
                // Lexicographically greatest spelling wins.
                if raw > slot.get().as_str() {
                    let dropped = slot.insert(raw.to_string());
                    tracing::debug!(index, kept = raw, %dropped, "duplicate sequence index");
                } else if raw != slot.get() {
                    tracing::debug!(index, kept = %slot.get(), dropped = raw, "duplicate sequence index");
                }
            }
        }
    }

    /// Synthetic keys for appended element `i`, placed at `elem_prefix`.
    fn column(&self, i: usize, elem_prefix: &str) -> Overlay {
        Overlay {
            params: take_column(&self.text, i, elem_prefix),
            files: take_column(&self.files, i, elem_prefix),
        }
    }
}

fn push_group<V: Clone>(groups: &mut Vec<(String, Vec<V>)>, suffix: &str, values: &[V]) {
    match groups.iter_mut().find(|(s, _)| s == suffix) {
        Some((_, existing)) => existing.extend_from_slice(values),
        None => groups.push((suffix.to_string(), values.to_vec())),
    }
}

fn take_column<V: Clone>(
    groups: &[(String, Vec<V>)],
    i: usize,
    elem_prefix: &str,
) -> Vec<(String, Vec<V>)> {
    groups
        .iter()
        .filter_map(|(suffix, values)| {
            values
                .get(i)
                .map(|v| (format!("{elem_prefix}{suffix}"), vec![v.clone()]))
        })
        .collect()
}

/// Scan both inputs for keys under `prefix`.
pub(crate) fn discover(cx: &Context<'_>, prefix: &str) -> Layout {
    let limit = cx.config.max_sequence_len;
    let mut layout = Layout::default();

    cx.scan(|key, values| {
        let Some(rest) = key.strip_prefix(prefix) else {
            return;
        };
        let suffix = if rest.is_empty() {
            ""
        } else if rest.starts_with('[') {
            match split_subscript(rest) {
                Ok((Subscript::Index { value, raw }, _)) => {
                    layout.add_index(key, value, raw, limit);
                    return;
                }
                Ok((Subscript::Append, tail)) => tail,
                Err(e) => {
                    layout.rejected.push(BindError::invalid_path(key, e));
                    return;
                }
            }
        } else {
            return;
        };
        match values {
            KeyValues::Text(v) => push_group(&mut layout.text, suffix, v),
            KeyValues::Files(v) => push_group(&mut layout.files, suffix, v),
        }
    });

    layout
}

// ═══════════════════════════════════════════════════════════════
//  Binding
// ═══════════════════════════════════════════════════════════════

/// Size `seq` from the discovered keys, then bind every position.
/// Positions no key reached keep their zero value.
pub(crate) fn bind(cx: &mut Context<'_>, prefix: &str, seq: &mut dyn Sequence) -> Result<(), Error> {
    let mut layout = discover(cx, prefix);
    for err in layout.rejected.drain(..) {
        cx.record(err);
    }

    let len = layout.len();
    if len == 0 {
        return Ok(());
    }
    tracing::trace!(
        prefix,
        max_index = ?layout.max_index(),
        appended = layout.append_count(),
        len,
        "sequence layout"
    );
    cx.touch();
    seq.reset(len);

    for (index, raw) in &layout.indexed {
        if let Some(elem) = seq.element_mut(*index) {
            dispatch::bind(cx, &format!("{prefix}[{raw}]"), elem)?;
        }
    }

    let start = layout.append_start();
    for i in 0..layout.append_count() {
        let position = start + i;
        let elem_prefix = format!("{prefix}[{position}]");
        let overlay = layout.column(i, &elem_prefix);
        if overlay.is_empty() {
            continue;
        }

        cx.push_overlay(overlay);
        let result = match seq.element_mut(position) {
            Some(elem) => dispatch::bind(cx, &elem_prefix, elem),
            None => Ok(()),
        };
        cx.pop_overlay();
        result?;
    }

    Ok(())
}
