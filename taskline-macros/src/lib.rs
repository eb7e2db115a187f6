mod utils;

use proc_macro::{TokenStream, TokenTree};

/// Wraps `main` with process initialization and teardown.
///
/// The body runs between `taskline::initialize` and
/// `taskline::deinitialize`. Options are forwarded to
/// `taskline::InitOptions`:
///
/// ```rust,ignore
/// #[taskline::main(log_filter = "debug", install_subscriber = true)]
/// fn main() {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let options = match utils::parse_options(attr) {
        Ok(options) => options,
        Err(msg) => return utils::compile_error(&msg),
    };

    let mut init = String::from("::taskline::InitOptions::new()");
    for (key, value) in options {
        match key.as_str() {
            "log_filter" | "install_subscriber" => init.push_str(&format!(".{key}({value})")),
            _ => return utils::compile_error(&format!("unknown option `{key}`")),
        }
    }

    let Some(pos) = utils::body_position(&tokens) else {
        return utils::compile_error("#[taskline::main] expects a function");
    };

    let prologue = format!(
        "if let ::core::result::Result::Err(err) = ::taskline::initialize({init}) {{
            ::core::panic!(\"taskline initialization failed: {{}}\", err);
        }}"
    );
    let epilogue = "if let ::core::result::Result::Err(err) = ::taskline::deinitialize() {
            ::core::panic!(\"taskline teardown failed: {}\", err);
        }";

    if let Err(msg) = utils::wrap_body(&mut tokens, pos, &prologue, epilogue) {
        return utils::compile_error(&format!("#[taskline::main] expansion failed: {msg}"));
    }

    tokens.into_iter().collect()
}

/// Marks a function as a test whose body runs inside a fresh sequence.
///
/// Code in the body sees a current sequence, as if it were running as a
/// task, so weak pointers created there bind to it.
///
/// ```rust,ignore
/// #[taskline::test]
/// fn runs_in_a_sequence() {
///     assert!(taskline::sequence::current().is_some());
/// }
/// ```
#[proc_macro_attribute]
pub fn test(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens = item.into_iter().collect::<Vec<_>>();

    let Some(pos) = utils::body_position(&tokens) else {
        return utils::compile_error("#[taskline::test] expects a function");
    };

    let prologue = "let __taskline_sequence = ::taskline::sequence::ScopedSequence::fresh();";

    if let Err(msg) = utils::wrap_body(&mut tokens, pos, prologue, "") {
        return utils::compile_error(&format!("#[taskline::test] expansion failed: {msg}"));
    }

    let test_attr: TokenStream = "#[test]".parse().unwrap_or_default();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(tokens);

    result.into_iter().collect()
}
