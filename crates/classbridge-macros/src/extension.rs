// #[extension] proc-macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{ItemFn, Result};

/// Expands the #[extension] attribute macro.
///
/// Example expansion:
/// ```ignore
/// // Input:
/// #[extension]
/// fn get_module() -> Extension { ... }
///
/// // Output:
/// fn get_module() -> Extension { ... }
///
/// #[no_mangle]
/// pub extern "C" fn classbridge_get_module() -> *mut ::classbridge::Extension {
///     match std::panic::catch_unwind(get_module) {
///         Ok(ext) => Box::into_raw(Box::new(ext)),
///         Err(_) => std::ptr::null_mut(),
///     }
/// }
///
/// #[no_mangle]
/// pub unsafe extern "C" fn classbridge_module_cleanup(ext: *mut ::classbridge::Extension) { ... }
/// ```
pub fn expand_extension(func: ItemFn) -> Result<TokenStream> {
    if !func.sig.inputs.is_empty() {
        return Err(syn::Error::new_spanned(
            &func.sig.inputs,
            "#[extension] function must not have parameters",
        ));
    }

    if func.sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            func.sig.asyncness,
            "#[extension] function cannot be async",
        ));
    }

    if !func.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &func.sig.generics,
            "#[extension] function cannot be generic",
        ));
    }

    let returns_extension = match &func.sig.output {
        syn::ReturnType::Type(_, ty) => {
            if let syn::Type::Path(type_path) = &**ty {
                type_path
                    .path
                    .segments
                    .last()
                    .map(|s| s.ident == "Extension")
                    .unwrap_or(false)
            } else {
                false
            }
        }
        _ => false,
    };

    if !returns_extension {
        return Err(syn::Error::new_spanned(
            &func.sig.output,
            "#[extension] function must return Extension",
        ));
    }

    let func_name = &func.sig.ident;

    let expanded = quote! {
        #func

        /// Module entry point: builds the extension and hands it to the host.
        ///
        /// Returns null if building the extension panicked.
        #[no_mangle]
        pub extern "C" fn classbridge_get_module() -> *mut ::classbridge::Extension {
            match ::std::panic::catch_unwind(#func_name) {
                Ok(ext) => ::std::boxed::Box::into_raw(::std::boxed::Box::new(ext)),
                Err(_) => ::std::ptr::null_mut(),
            }
        }

        /// Frees an extension returned by `classbridge_get_module`.
        ///
        /// # Safety
        /// `ext` must be null or come from `classbridge_get_module`, and must
        /// have been shut down if it was started.
        #[no_mangle]
        pub unsafe extern "C" fn classbridge_module_cleanup(ext: *mut ::classbridge::Extension) {
            if !ext.is_null() {
                drop(::std::boxed::Box::from_raw(ext));
            }
        }
    };

    Ok(expanded)
}
