use proc_macro::{Delimiter, TokenStream, TokenTree};

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Each argument is returned as a `Vec<TokenTree>`.
/// Commas at the top level are used as separators; commas inside groups
/// belong to the group token and are left alone.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(current);
                    current = Vec::new();
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Parses `key = value` pairs from an attribute argument list.
///
/// Values are returned as source text, so string literals keep their
/// quotes.
pub(crate) fn parse_options(attr: TokenStream) -> Result<Vec<(String, String)>, String> {
    split_args(attr)
        .into_iter()
        .map(|arg| match arg.as_slice() {
            [TokenTree::Ident(key), TokenTree::Punct(eq), value] if eq.as_char() == '=' => {
                Ok((key.to_string(), value.to_string()))
            }
            _ => Err(format!(
                "expected `key = value`, found `{}`",
                arg.iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            )),
        })
        .collect()
}

/// Returns the position of the function body: the last brace-delimited
/// group of the item.
pub(crate) fn body_position(tokens: &[TokenTree]) -> Option<usize> {
    let is_fn = tokens
        .iter()
        .any(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "fn"));

    if !is_fn {
        return None;
    }

    tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
}

/// Wraps the body at `pos` between `prologue` and `epilogue`.
///
/// The original body becomes a `move` closure called once, so `return`
/// and `?` keep their meaning, and its tokens keep their spans.
pub(crate) fn wrap_body(
    tokens: &mut [TokenTree],
    pos: usize,
    prologue: &str,
    epilogue: &str,
) -> Result<(), String> {
    let body = tokens[pos].clone();

    let mut stream: TokenStream = prologue.parse().map_err(|e| format!("{e}"))?;
    stream.extend("let __taskline_body = move ||".parse::<TokenStream>().map_err(|e| format!("{e}"))?);
    stream.extend([body]);
    stream.extend(
        "; let __taskline_output = __taskline_body();"
            .parse::<TokenStream>()
            .map_err(|e| format!("{e}"))?,
    );
    stream.extend(epilogue.parse::<TokenStream>().map_err(|e| format!("{e}"))?);
    stream.extend("__taskline_output".parse::<TokenStream>().map_err(|e| format!("{e}"))?);

    tokens[pos] = TokenTree::Group(proc_macro::Group::new(Delimiter::Brace, stream));
    Ok(())
}

/// Builds a `compile_error!` invocation carrying `msg`.
pub(crate) fn compile_error(msg: &str) -> TokenStream {
    format!("compile_error!({msg:?});")
        .parse()
        .unwrap_or_default()
}
