// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros for reducing boilerplate.
//!
//! - [`simple_display!`] — `Display` for the phase/kind enums, mapping each
//!   variant to its wire string

/// Generate a `Display` impl mapping enum variants to their wire strings.
///
/// The API enums ([`crate::TaskPhase`], [`crate::SpawnerPhase`],
/// [`crate::AgentKind`], [`crate::CredentialsKind`]) render exactly as they
/// appear in status fields and manifests, including `TaskPhase::Unset`
/// rendering as the empty string. Data-carrying variants use `(..)` to
/// ignore their fields.
///
/// ```ignore
/// crate::simple_display! {
///     TaskPhase {
///         Unset => "",
///         Pending => "Pending",
///         Waiting => "Waiting",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($ty:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $wire:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$variant $(( $($ignore)* ))? => $wire, )+
                })
            }
        }
    };
}
