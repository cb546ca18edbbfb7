//! Derive macros for the booking state synchronization engine
//!
//! This crate provides a procedural macro to reduce boilerplate when defining
//! action enums for reducers.
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Generates classification helpers for action enums
//!
//! Booking actions fall into three classes:
//!
//! - `#[command]` - operations issued by the local session (e.g. a status
//!   update request), validated before any network effect is dispatched
//! - `#[event]` - server-confirmed responses that mutate the entity store
//!   (the `fulfilled`/`rejected` half of the request lifecycle)
//! - `#[push]` - out-of-band realtime deliveries merged into the store
//!
//! # Example
//!
//! ```ignore
//! use booking_sync_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum BookingAction {
//!     #[command]
//!     CancelBooking { id: BookingId },
//!
//!     #[event]
//!     BookingUpdated { booking: Box<Booking> },
//!
//!     #[push]
//!     RemoteStatusChanged { booking: Box<Booking> },
//! }
//!
//! // Generated methods:
//! assert!(BookingAction::CancelBooking { id }.is_command());
//! assert!(BookingAction::BookingUpdated { booking }.is_event());
//! assert!(BookingAction::RemoteStatusChanged { booking }.is_push());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, parse_macro_input};

/// Derive macro for Action enums
///
/// Generates helper methods for action enums:
/// - `is_command()` - Returns true if this variant is a locally issued command
/// - `is_event()` - Returns true if this variant is a server-confirmed event
/// - `is_push()` - Returns true if this variant is a realtime push delivery
/// - `event_type()` - Returns the type name used when logging events
///
/// # Attributes
///
/// - `#[command]` - Mark a variant as a command
/// - `#[event]` - Mark a variant as an event
/// - `#[push]` - Mark a variant as a push delivery
///
/// A variant may carry at most one of the three markers; violating this
/// produces a compile error, as does applying the derive to a non-enum.
#[proc_macro_derive(Action, attributes(command, event, push))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    // Collect variants by class
    let mut command_variants = Vec::new();
    let mut event_variants = Vec::new();
    let mut push_variants = Vec::new();

    for variant in &data_enum.variants {
        let variant_name = &variant.ident;
        let markers = [
            has_attribute(&variant.attrs, "command"),
            has_attribute(&variant.attrs, "event"),
            has_attribute(&variant.attrs, "push"),
        ];

        if markers.iter().filter(|m| **m).count() > 1 {
            return syn::Error::new_spanned(
                variant,
                "Variant may carry only one of #[command], #[event], #[push]",
            )
            .to_compile_error()
            .into();
        }

        if markers[0] {
            command_variants.push((variant_name, &variant.fields));
        }
        if markers[1] {
            event_variants.push((variant_name, &variant.fields));
        }
        if markers[2] {
            push_variants.push((variant_name, &variant.fields));
        }
    }

    let is_command_arms = command_variants.iter().map(|(v, f)| match_arm(v, f));
    let is_event_arms = event_variants.iter().map(|(v, f)| match_arm(v, f));
    let is_push_arms = push_variants.iter().map(|(v, f)| match_arm(v, f));

    // event_type() covers events and pushes - both represent facts about
    // entities, and both get logged with a stable type name
    let event_type_arms = event_variants.iter().chain(push_variants.iter()).map(
        |(variant, fields)| {
            let type_name = format!("{variant}.v1");
            let pattern = variant_pattern(variant, fields);
            quote! { #pattern => #type_name, }
        },
    );

    let expanded = quote! {
        impl #name {
            /// Returns true if this action is a locally issued command
            #[must_use]
            pub const fn is_command(&self) -> bool {
                match self {
                    #(#is_command_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action is a server-confirmed event
            #[must_use]
            pub const fn is_event(&self) -> bool {
                match self {
                    #(#is_event_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action is a realtime push delivery
            #[must_use]
            pub const fn is_push(&self) -> bool {
                match self {
                    #(#is_push_arms)*
                    _ => false,
                }
            }

            /// Returns the type name used when logging this action
            ///
            /// Only events and pushes have type names. Commands return "unknown".
            #[must_use]
            pub const fn event_type(&self) -> &'static str {
                match self {
                    #(#event_type_arms)*
                    _ => "unknown",
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Build a `pattern => true,` match arm for a classification method
fn match_arm(variant: &syn::Ident, fields: &Fields) -> proc_macro2::TokenStream {
    let pattern = variant_pattern(variant, fields);
    quote! { #pattern => true, }
}

/// Build the wildcard pattern for a variant regardless of its field shape
fn variant_pattern(variant: &syn::Ident, fields: &Fields) -> proc_macro2::TokenStream {
    match fields {
        Fields::Named(_) => quote! { Self::#variant { .. } },
        Fields::Unnamed(_) => quote! { Self::#variant(..) },
        Fields::Unit => quote! { Self::#variant },
    }
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
