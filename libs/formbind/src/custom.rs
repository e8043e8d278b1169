use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Conversion registered for a custom destination type.
pub(crate) type ConvertFn = dyn Fn(&[String], &mut dyn Any) -> Result<(), String> + Send + Sync;

/// Destination bound by a registered conversion rather than a built-in
/// handler.
pub struct CustomSlot<'a> {
    pub(crate) value: &'a mut dyn Any,
    pub(crate) type_name: &'static str,
}

impl<'a> CustomSlot<'a> {
    pub fn new<T: Any>(value: &'a mut T) -> Self {
        Self { value, type_name: type_name::<T>() }
    }
}

/// Registry of custom conversions, keyed by destination type.
#[derive(Clone, Default)]
pub(crate) struct CustomBinders {
    by_type: HashMap<TypeId, Arc<ConvertFn>>,
}

impl CustomBinders {
    pub fn register<T, F>(&mut self, convert: F)
    where
        T: Any,
        F: Fn(&[String]) -> Result<T, String> + Send + Sync + 'static,
    {
        let erased = move |values: &[String], dest: &mut dyn Any| -> Result<(), String> {
            let value = convert(values)?;
            if let Some(dest) = dest.downcast_mut::<T>() {
                *dest = value;
            }
            Ok(())
        };
        self.by_type.insert(TypeId::of::<T>(), Arc::new(erased));
    }

    pub fn get(&self, slot: &CustomSlot<'_>) -> Option<&ConvertFn> {
        let id = (*slot.value).type_id();
        self.by_type.get(&id).map(|f| f.as_ref())
    }
}

impl fmt::Debug for CustomBinders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomBinders").field("types", &self.by_type.len()).finish()
    }
}

/// Declare types that bind through a conversion registered with
/// [`Binder::with_custom`](crate::Binder::with_custom).
///
/// ```ignore
/// struct Cents(i64);
/// formbind::custom_destination!(Cents);
///
/// let binder = formbind::bind_from_map([("price", "12.50")])
///     .with_custom(|values: &[String]| parse_cents(&values[0]));
/// ```
#[macro_export]
macro_rules! custom_destination {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Bind for $ty {
                fn shape() -> $crate::Shape {
                    $crate::Shape::Custom
                }

                fn slot(&mut self) -> $crate::Slot<'_> {
                    $crate::Slot::Custom($crate::CustomSlot::new(self))
                }
            }
        )+
    };
}
