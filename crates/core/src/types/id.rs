//! Newtype IDs for the persisted records.
//!
//! Both tables use `SERIAL` primary keys, so every ID wraps an `i32`. The
//! wrappers keep a diagnostic's own ID from being passed where its owner's
//! ID is expected.

/// Define a type-safe `i32` ID wrapper.
///
/// The generated type is `Copy`, serializes as a bare integer, and (with the
/// `postgres` feature) binds and decodes as a Postgres `INT4`.
///
/// # Example
///
/// ```rust
/// # use diagnostico_core::define_id;
/// define_id!(
///     /// Identifier of a note.
///     NoteId
/// );
///
/// let id = NoteId::new(7);
/// assert_eq!(id.as_i32(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database key.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the raw database key.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(
    /// Primary key of a row in `users`.
    UserId
);
define_id!(
    /// Primary key of a row in `diagnostics`.
    DiagnosticId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_i32() {
        let id = UserId::from(42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(id, UserId::new(42));
    }

    #[test]
    fn test_display_is_bare_number() {
        assert_eq!(DiagnosticId::new(3).to_string(), "3");
    }

    #[test]
    fn test_serializes_transparently() {
        let json = serde_json::to_string(&UserId::new(9)).unwrap();
        assert_eq!(json, "9");

        let parsed: DiagnosticId = serde_json::from_str("11").unwrap();
        assert_eq!(parsed.as_i32(), 11);
    }

    #[test]
    fn test_orders_by_key() {
        let mut ids = vec![DiagnosticId::new(5), DiagnosticId::new(1), DiagnosticId::new(3)];
        ids.sort();
        assert_eq!(
            ids,
            vec![DiagnosticId::new(1), DiagnosticId::new(3), DiagnosticId::new(5)]
        );
    }
}
