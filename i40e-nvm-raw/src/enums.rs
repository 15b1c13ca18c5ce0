// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tooling for C-style enums.
//!
//! The driver hands back plain integers, and an unknown value must not be
//! undefined behavior on our side. Such enums are modeled as integer newtypes
//! with a set of associated constants instead of as Rust enums.

/// Interface a C-style enum as an integer newtype.
///
/// The generated type is `#[repr(transparent)]`, so it can be placed directly
/// in a `#[repr(C)]` structure. Its `Debug` output names known values and
/// falls back to the raw integer otherwise.
///
/// ```
/// # use i40e_nvm_raw::newtype_enum;
/// newtype_enum! {
///     pub enum Parity: u8 => {
///         EVEN = 0,
///         ODD  = 1,
///     }
/// }
///
/// assert_eq!(format!("{:?}", Parity::ODD), "Parity::ODD");
/// assert_eq!(format!("{:?}", Parity(7)), "Parity(7)");
/// ```
#[macro_export]
macro_rules! newtype_enum {
    (
        $(#[$type_attrs:meta])*
        $visibility:vis enum $type:ident : $base_integer:ty => {
            $(
                $(#[$variant_attrs:meta])*
                $variant:ident = $value:expr,
            )*
        }
    ) => {
        $(#[$type_attrs])*
        #[repr(transparent)]
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $visibility struct $type(pub $base_integer);

        #[allow(unused)]
        impl $type {
            $(
                $(#[$variant_attrs])*
                pub const $variant: $type = $type($value);
            )*
        }

        impl core::fmt::Debug for $type {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                match *self {
                    $(
                        $type::$variant => f.write_str(concat!(stringify!($type), "::", stringify!($variant))),
                    )*
                    $type(unknown) => write!(f, "{}({})", stringify!($type), unknown),
                }
            }
        }
    }
}
