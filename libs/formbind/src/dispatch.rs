use crate::config::BindConfig;
use crate::custom::CustomBinders;
use crate::error::{BindError, Error};
use crate::params::{AttachmentSet, ParameterSet};
use crate::shape::{Bind, Slot};
use crate::upload::UploadedEntry;
use crate::{attachment, convert, pointer, record, sequence};

// ═══════════════════════════════════════════════════════════════
//  Per-call context
// ═══════════════════════════════════════════════════════════════

/// Synthetic keys scoped to one appended sequence element.
#[derive(Debug, Default)]
pub(crate) struct Overlay {
    pub params: Vec<(String, Vec<String>)>,
    pub files: Vec<(String, Vec<UploadedEntry>)>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.files.is_empty()
    }
}

/// Values found under one key during a key scan.
pub(crate) enum KeyValues<'v> {
    Text(&'v [String]),
    Files(&'v [UploadedEntry]),
}

/// State of one bind call: the inputs, the collected errors, and a count of
/// keys that were present at a leaf.
pub(crate) struct Context<'a> {
    params: &'a ParameterSet,
    files: &'a AttachmentSet,
    pub config: &'a BindConfig,
    pub custom: &'a CustomBinders,
    overlays: Vec<Overlay>,
    errors: Vec<BindError>,
    touched: usize,
}

impl<'a> Context<'a> {
    pub fn new(
        params: &'a ParameterSet,
        files: &'a AttachmentSet,
        config: &'a BindConfig,
        custom: &'a CustomBinders,
    ) -> Self {
        Self {
            params,
            files,
            config,
            custom,
            overlays: Vec::new(),
            errors: Vec::new(),
            touched: 0,
        }
    }

    /// Values under `key`; the innermost overlay wins.
    pub fn values(&self, key: &str) -> Option<&[String]> {
        for overlay in self.overlays.iter().rev() {
            if let Some((_, v)) = overlay.params.iter().find(|(k, _)| k == key) {
                return Some(v);
            }
        }
        self.params.get(key)
    }

    pub fn first(&self, key: &str) -> Option<String> {
        self.values(key).and_then(|v| v.first()).cloned()
    }

    pub fn uploads(&self, key: &str) -> Option<&[UploadedEntry]> {
        for overlay in self.overlays.iter().rev() {
            if let Some((_, v)) = overlay.files.iter().find(|(k, _)| k == key) {
                return Some(v);
            }
        }
        self.files.get(key)
    }

    /// Visit every key of both inputs, overlays included, text keys first.
    pub fn scan(&self, mut visit: impl FnMut(&str, KeyValues<'_>)) {
        for (key, values) in self.params.iter() {
            visit(key, KeyValues::Text(values));
        }
        for overlay in &self.overlays {
            for (key, values) in &overlay.params {
                visit(key, KeyValues::Text(values));
            }
        }
        for (key, entries) in self.files.iter() {
            visit(key, KeyValues::Files(entries));
        }
        for overlay in &self.overlays {
            for (key, entries) in &overlay.files {
                visit(key, KeyValues::Files(entries));
            }
        }
    }

    pub fn push_overlay(&mut self, overlay: Overlay) {
        self.overlays.push(overlay);
    }

    pub fn pop_overlay(&mut self) {
        self.overlays.pop();
    }

    pub fn record(&mut self, err: BindError) {
        tracing::trace!(field = %err.field, kind = ?err.kind, message = %err.message, "field rejected");
        self.errors.push(err);
    }

    /// Note that a key was present for a leaf, whether or not it converted.
    pub fn touch(&mut self) {
        self.touched += 1;
    }

    pub fn touched(&self) -> usize {
        self.touched
    }

    pub fn finish(self) -> Vec<BindError> {
        self.errors
    }
}

// ═══════════════════════════════════════════════════════════════
//  Dispatcher
// ═══════════════════════════════════════════════════════════════

/// Route `dest` to the handler for its shape.
///
/// Leaf failures are recorded on `cx`; only programmer errors return `Err`.
pub(crate) fn bind(cx: &mut Context<'_>, prefix: &str, dest: &mut dyn Bind) -> Result<(), Error> {
    match dest.slot() {
        Slot::Pointer(ptr) => pointer::bind(cx, prefix, ptr),
        Slot::Time(slot) => {
            if let Some(value) = cx.first(prefix) {
                cx.touch();
                if let Err(e) = convert::time(slot, &cx.config.time_formats, prefix, &value) {
                    cx.record(e);
                }
            }
            Ok(())
        }
        Slot::Attachment(slot) => attachment::bind(cx, prefix, slot),
        Slot::Primitive(slot) => {
            if let Some(value) = cx.first(prefix) {
                cx.touch();
                if let Err(e) = convert::primitive(slot, prefix, &value) {
                    cx.record(e);
                }
            }
            Ok(())
        }
        Slot::Record(rec) => record::bind(cx, prefix, rec),
        Slot::Sequence(seq) => sequence::bind(cx, prefix, seq),
        Slot::Custom(slot) => {
            let Some(values) = cx.values(prefix).map(<[String]>::to_vec) else {
                return Ok(());
            };
            let custom = cx.custom;
            let Some(convert) = custom.get(&slot) else {
                return Err(Error::UnsupportedDestinationShape {
                    field: prefix.to_string(),
                    type_name: slot.type_name,
                });
            };
            cx.touch();
            if let Err(message) = convert(&values, slot.value) {
                cx.record(BindError::custom(prefix, message));
            }
            Ok(())
        }
    }
}

/// Key of a record field under `prefix`.
pub(crate) fn child_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_shadows_base_values() {
        let params: ParameterSet = [("a[0]", "base")].into_iter().collect();
        let files = AttachmentSet::new();
        let config = BindConfig::default();
        let custom = CustomBinders::default();
        let mut cx = Context::new(&params, &files, &config, &custom);

        cx.push_overlay(Overlay {
            params: vec![("a[0]".into(), vec!["overlay".into()])],
            files: Vec::new(),
        });
        assert_eq!(cx.first("a[0]").as_deref(), Some("overlay"));

        let mut seen = Vec::new();
        cx.scan(|key, _| seen.push(key.to_string()));
        assert_eq!(seen, vec!["a[0]", "a[0]"]);

        cx.pop_overlay();
        assert_eq!(cx.first("a[0]").as_deref(), Some("base"));
    }

    #[test]
    fn child_key_joins_with_dot() {
        assert_eq!(child_key("", "Id"), "Id");
        assert_eq!(child_key("user.Phones[0]", "Label"), "user.Phones[0].Label");
    }
}
