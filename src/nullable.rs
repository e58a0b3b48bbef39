//! Nullable scan destinations.
//!
//! A plain destination (`i32`, `String`, ...) refuses NULL. When the caller
//! needs to tell "absent" from a zero value, scan into a `Nullable<T>`
//! instead: `present` is false and `value` is `T::default()` for NULL cells.
//! `Option<T>` works the same way.

use chrono::{DateTime, FixedOffset};

/// A value with a presence flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nullable<T> {
    /// The value, or `T::default()` when absent.
    pub value: T,
    /// False when the source cell was NULL.
    pub present: bool,
}

impl<T: Default> Nullable<T> {
    /// An absent value.
    pub fn null() -> Self {
        Self {
            value: T::default(),
            present: false,
        }
    }
}

impl<T> Nullable<T> {
    /// A present value.
    pub fn new(value: T) -> Self {
        Self {
            value,
            present: true,
        }
    }

    /// Check if the value is absent.
    pub fn is_null(&self) -> bool {
        !self.present
    }

    /// The value, if present.
    pub fn get(&self) -> Option<&T> {
        self.present.then_some(&self.value)
    }

    pub fn into_option(self) -> Option<T> {
        self.present.then_some(self.value)
    }
}

impl<T: Default> From<Option<T>> for Nullable<T> {
    fn from(v: Option<T>) -> Self {
        v.map_or_else(Self::null, Self::new)
    }
}

pub type NullableBool = Nullable<bool>;
pub type NullableInt16 = Nullable<i16>;
pub type NullableInt32 = Nullable<i32>;
pub type NullableInt64 = Nullable<i64>;
pub type NullableFloat32 = Nullable<f32>;
pub type NullableFloat64 = Nullable<f64>;
pub type NullableBytes = Nullable<Vec<u8>>;
pub type NullableString = Nullable<String>;
pub type NullableTime = Nullable<DateTime<FixedOffset>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_default() {
        let n = NullableInt32::null();
        assert!(n.is_null());
        assert_eq!(n.value, 0);
        assert_eq!(n.get(), None);
        assert_eq!(NullableInt32::default(), n);
    }

    #[test]
    fn test_present() {
        let n = NullableString::new("A".to_string());
        assert!(!n.is_null());
        assert_eq!(n.get().map(String::as_str), Some("A"));
        assert_eq!(n.into_option(), Some("A".to_string()));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(NullableInt64::from(Some(5)), NullableInt64::new(5));
        assert!(NullableBool::from(None).is_null());
    }
}
