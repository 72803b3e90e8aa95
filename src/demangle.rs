use std::borrow::Cow;


/// Demangle a Rust or C++ symbol name.
///
/// Names that cannot be demangled (or all names, if the `demangle`
/// feature is disabled) are returned unchanged. The result is only ever
/// empty if `name` is.
#[cfg(feature = "demangle")]
pub fn demangle(name: &str) -> Cow<'_, str> {
    use cpp_demangle::DemangleOptions;
    use cpp_demangle::Symbol;

    if let Ok(demangled) = rustc_demangle::try_demangle(name) {
        // Use the alternate form to omit the trailing hash.
        return Cow::Owned(format!("{demangled:#}"))
    }

    Symbol::new(name)
        .ok()
        .and_then(|symbol| symbol.demangle(&DemangleOptions::default()).ok())
        .filter(|demangled| !demangled.is_empty())
        .map(Cow::Owned)
        .unwrap_or(Cow::Borrowed(name))
}

/// Demangle a Rust or C++ symbol name.
///
/// Names that cannot be demangled (or all names, if the `demangle`
/// feature is disabled) are returned unchanged. The result is only ever
/// empty if `name` is.
#[cfg(not(feature = "demangle"))]
pub fn demangle(name: &str) -> Cow<'_, str> {
    Cow::Borrowed(name)
}


#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;
    use test_tag::tag;


    /// Check that names which are not mangled are passed through.
    #[tag(miri)]
    #[test]
    fn demangle_fallback() {
        assert_eq!(demangle("not_a_mangled_name"), "not_a_mangled_name");
        assert_eq!(demangle("main"), "main");
        assert_eq!(demangle(""), "");
        assert_eq!(demangle("_Z"), "_Z");
    }

    /// Check that we can demangle C++ symbols.
    #[cfg(feature = "demangle")]
    #[test]
    fn demangle_cpp() {
        assert_eq!(demangle("_Z2f1RKf"), "f1(float const&)");
    }

    /// Check that we can demangle Rust symbols.
    #[cfg(feature = "demangle")]
    #[test]
    fn demangle_rust() {
        assert_eq!(
            demangle("_ZN4core3fmt5write17h2e2f7ac7f8c4e5d8E"),
            "core::fmt::write"
        );
    }
}
