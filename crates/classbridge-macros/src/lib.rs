// classbridge-macros: module entry points for classbridge extensions
//
// Provides:
// - #[extension] - exports the symbols a host uses to load an Extension
//
// Example:
// ```
// use classbridge::{extension, Extension};
//
// #[extension]
// fn get_module() -> Extension {
//     Extension::new("counter", "1.0.0")
// }
// ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemFn};

mod extension;

/// Exports a function returning `Extension` as the module entry point.
///
/// The function must take no parameters. The macro keeps it as written and
/// generates:
/// - `classbridge_get_module()`, returning a boxed `Extension` (null if the
///   function panicked)
/// - `classbridge_module_cleanup()`, freeing what the first one returned
///
/// # Example
///
/// ```ignore
/// #[extension]
/// fn get_module() -> Extension {
///     let mut ext = Extension::new("files", "1.0.0");
///     ext.add_class(file_class()).unwrap();
///     ext
/// }
/// ```
#[proc_macro_attribute]
pub fn extension(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    extension::expand_extension(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
