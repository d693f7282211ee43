mod field_list;
mod helper;

use field_list::impl_field_list;
use proc_macro::TokenStream;

/// Derives `FieldList` for a struct with named fields.
#[proc_macro_derive(FieldList)]
pub fn derive_field_list(input: TokenStream) -> TokenStream {
    impl_field_list(input.into()).into()
}
