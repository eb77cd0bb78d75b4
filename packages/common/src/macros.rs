/// Implements `as_str`, `ALL`, `Display` and `FromStr` for a fieldless enum
/// from a table of `Variant => "WIRE_VALUE"` pairs.
macro_rules! wire_values {
    ($name:ident, $kind:literal, { $($variant:ident => $value:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            const VALUES: &'static [&'static str] = &[$($value),+];

            /// The value stored in the database and sent over the wire.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => Err($crate::ParseEnumError::new($kind, s, $name::VALUES)),
                }
            }
        }
    };
}
