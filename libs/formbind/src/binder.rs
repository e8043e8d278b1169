use std::any::Any;
use std::sync::Arc;

use crate::config::BindConfig;
use crate::custom::CustomBinders;
use crate::dispatch::{self, Context};
use crate::error::{AggregateError, BindError, Error};
use crate::params::{AttachmentSet, ParameterSet};
use crate::path;
use crate::sequence::{self, Layout};
use crate::shape::Bind;

/// Binds one request's parameters and uploads into typed destinations.
///
/// Each `field` / `all` call is independent: it reads the inputs, writes the
/// destination, and reports every field failure at once.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    params: ParameterSet,
    files: AttachmentSet,
    config: Arc<BindConfig>,
    custom: CustomBinders,
}

/// Binder over a flat string map (URL route variables and the like).
pub fn bind_from_map<K, V>(map: impl IntoIterator<Item = (K, V)>) -> Binder
where
    K: Into<String>,
    V: Into<String>,
{
    Binder::new(map.into_iter().collect())
}

impl Binder {
    pub fn new(params: ParameterSet) -> Self {
        Self::with_files(params, AttachmentSet::new())
    }

    pub fn with_files(params: ParameterSet, files: AttachmentSet) -> Self {
        Self {
            params,
            files,
            config: Arc::new(BindConfig::default()),
            custom: CustomBinders::default(),
        }
    }

    pub fn with_config(mut self, config: impl Into<Arc<BindConfig>>) -> Self {
        self.config = config.into();
        self
    }

    /// Register the conversion for a type declared with `custom_destination!`.
    /// It receives every value under the destination's key.
    pub fn with_custom<T, F>(mut self, convert: F) -> Self
    where
        T: Any,
        F: Fn(&[String]) -> Result<T, String> + Send + Sync + 'static,
    {
        self.custom.register(convert);
        self
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn files(&self) -> &AttachmentSet {
        &self.files
    }

    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    /// Bind the parameters under `path` into `dest`.
    ///
    /// Missing keys leave `dest` untouched. Conversion failures are collected
    /// into `Error::Fields`; a non-addressable or unsupported destination
    /// aborts immediately.
    pub fn field(&self, path: &str, dest: &mut dyn Bind) -> Result<(), Error> {
        if let Err(e) = path::parse(path) {
            return Err(Error::Fields(AggregateError(vec![BindError::invalid_path(path, e)])));
        }

        let mut cx = Context::new(&self.params, &self.files, &self.config, &self.custom);
        dispatch::bind(&mut cx, path, dest)?;
        let errors = cx.finish();

        tracing::debug!(field = %path, errors = errors.len(), "bind finished");
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Fields(AggregateError(errors)))
        }
    }

    /// Bind every top-level key into the fields of `dest`.
    pub fn all(&self, dest: &mut dyn Bind) -> Result<(), Error> {
        self.field("", dest)
    }

    /// How a sequence bound at `prefix` would be laid out.
    pub fn layout(&self, prefix: &str) -> Layout {
        let cx = Context::new(&self.params, &self.files, &self.config, &self.custom);
        sequence::discover(&cx, prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn malformed_field_path_is_reported() {
        let mut n = 0i32;
        let err = bind_from_map([("a", "1")]).field("a[x]", &mut n).unwrap_err();
        let fields = err.fields().unwrap();
        assert_eq!(fields.errors()[0].kind, ErrorKind::InvalidPath);
    }

    #[test]
    fn absent_key_is_not_an_error() {
        let mut n = 5u16;
        bind_from_map([("other", "1")]).field("n", &mut n).unwrap();
        assert_eq!(n, 5);
    }

    #[test]
    fn layout_reports_sequence_plan() {
        let binder = bind_from_map([("ids[2]", "x")]);
        assert_eq!(binder.layout("ids").len(), 3);
    }
}
