// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros for reducing boilerplate.
//!
//! - [`string_enum!`] - `Display`, `FromStr` and an `ALL` table for unit enums
//! - [`builder!`] - test builder struct with Default, setters, and `build()`
//! - [`setters!`] - setter methods for config structs

/// Map unit enum variants to string literals in both directions.
///
/// Generates `Display`, `FromStr` (failing with [`crate::ParseVariantError`]),
/// `as_str()` and an `ALL` constant listing the variants in declaration order.
///
/// ```ignore
/// crate::string_enum! {
///     JobState {
///         Pending => "pending",
///         Failed => "failed",
///     }
/// }
/// ```
#[macro_export]
macro_rules! string_enum {
    ($enum:ident { $( $variant:ident => $str:literal ),+ $(,)? }) => {
        impl $enum {
            pub const ALL: &'static [$enum] = &[ $( $enum::$variant, )+ ];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $str, )+
                }
            }
        }

        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum {
            type Err = $crate::ParseVariantError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $str => Ok(Self::$variant), )+
                    other => Err($crate::ParseVariantError {
                        kind: stringify!($enum),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// Generate a test builder (struct + Default + setters + build).
///
/// All generated items are gated behind `#[cfg(any(test, feature = "test-support"))]`.
///
/// - `into { field: Type = default }` - setter uses `impl Into<Type>`
/// - `set { field: Type = default }` - setter takes `Type` directly
/// - `option { field: Type = default }` - field is `Option<Type>`, setter wraps in `Some`
///
/// ```ignore
/// crate::builder! {
///     pub struct JobRecordBuilder => JobRecord {
///         into { queue: String = "default" }
///         set { priority: i32 = 0 }
///         option { started_on_ms: u64 = None }
///     }
/// }
/// ```
#[macro_export]
macro_rules! builder {
    (
        pub struct $builder:ident => $target:ident {
            $(into {
                $( $into_field:ident : $into_ty:ty = $into_default:expr ),* $(,)?
            })?
            $(set {
                $( $set_field:ident : $set_ty:ty = $set_default:expr ),* $(,)?
            })?
            $(option {
                $( $opt_field:ident : $opt_ty:ty = $opt_default:expr ),* $(,)?
            })?
        }
    ) => {
        #[cfg(any(test, feature = "test-support"))]
        pub struct $builder {
            $($( $into_field: $into_ty, )*)?
            $($( $set_field: $set_ty, )*)?
            $($( $opt_field: Option<$opt_ty>, )*)?
        }

        #[cfg(any(test, feature = "test-support"))]
        impl Default for $builder {
            fn default() -> Self {
                Self {
                    $($( $into_field: $into_default.into(), )*)?
                    $($( $set_field: $set_default, )*)?
                    $($( $opt_field: $opt_default, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $builder {
            $crate::setters! {
                $(into { $( $into_field : $into_ty ),* })?
                $(set { $( $set_field : $set_ty ),* })?
            }

            $($(
                pub fn $opt_field(mut self, v: impl Into<$opt_ty>) -> Self {
                    self.$opt_field = Some(v.into());
                    self
                }
            )*)?

            pub fn build(self) -> $target {
                $target {
                    $($( $into_field: self.$into_field, )*)?
                    $($( $set_field: self.$set_field, )*)?
                    $($( $opt_field: self.$opt_field, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $target {
            /// Create a builder with test defaults.
            pub fn builder() -> $builder {
                $builder::default()
            }
        }
    };
}

/// Generate setter methods inside an existing `impl` block.
///
/// - `into { field: Type }` - setter takes `impl Into<Type>`
/// - `set { field: Type }` - setter takes `Type` directly
///
/// ```ignore
/// impl HousekeepingConfig {
///     qc_core::setters! {
///         set { dry_run: bool, max_files: usize }
///     }
/// }
/// ```
#[macro_export]
macro_rules! setters {
    (
        $(into {
            $( $into_field:ident : $into_ty:ty ),* $(,)?
        })?
        $(set {
            $( $set_field:ident : $set_ty:ty ),* $(,)?
        })?
    ) => {
        $($(
            pub fn $into_field(mut self, v: impl Into<$into_ty>) -> Self {
                self.$into_field = v.into();
                self
            }
        )*)?

        $($(
            pub fn $set_field(mut self, v: $set_ty) -> Self {
                self.$set_field = v;
                self
            }
        )*)?
    };
}
