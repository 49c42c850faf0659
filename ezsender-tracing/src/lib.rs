//! Attribute macros for tracing function entry and exit.
//!
//! `#[traced]` emits a `trace` event when the function is entered and
//! another when it returns (including early returns and `?`), optionally
//! reporting the elapsed time and optionally forwarding arguments to
//! `tracing::instrument`.
//!
//! ```ignore
//! #[traced(instrument(level = tracing::Level::DEBUG, skip_all), timing(precision = "ms"))]
//! async fn dispatch(&self, recipients: Vec<Recipient>) -> DispatchReport { .. }
//! ```

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::{ItemFn, Stmt, parse::Parse, parse_macro_input, parse_quote};

#[derive(PartialEq, Eq, Clone, Copy, Default)]
enum Precision {
    #[default]
    Nanos,
    Micros,
    Millis,
    Seconds,
}

impl Precision {
    /// Expression formatting a `Duration` at this precision.
    fn formatter(self) -> syn::Expr {
        match self {
            Self::Nanos => {
                parse_quote!(|d: ::std::time::Duration| format!("{} ns elapsed", d.as_nanos()))
            }
            Self::Micros => {
                parse_quote!(|d: ::std::time::Duration| format!("{} us elapsed", d.as_micros()))
            }
            Self::Millis => {
                parse_quote!(|d: ::std::time::Duration| format!("{} ms elapsed", d.as_millis()))
            }
            Self::Seconds => {
                parse_quote!(|d: ::std::time::Duration| format!("{} s elapsed", d.as_secs()))
            }
        }
    }
}

impl TryFrom<&str> for Precision {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ns" | "nano" | "nanos" | "nanoseconds" => Ok(Self::Nanos),
            "us" | "micro" | "micros" | "microseconds" => Ok(Self::Micros),
            "ms" | "milli" | "millis" | "milliseconds" => Ok(Self::Millis),
            "s" | "sec" | "secs" | "seconds" => Ok(Self::Seconds),
            other => Err(format!("unknown timing precision `{other}`")),
        }
    }
}

impl Parse for Precision {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        if !input.peek(syn::token::Paren) {
            return Ok(Self::default());
        }

        let content;
        let _ = syn::parenthesized!(content in input);
        let _ = content.parse::<keywords::precision>()?;
        let _ = content.parse::<syn::Token![=]>()?;
        let literal = content.parse::<syn::LitStr>()?;

        Self::try_from(literal.value().as_str())
            .map_err(|message| syn::Error::new(literal.span(), message))
    }
}

mod keywords {
    syn::custom_keyword!(timing);
    syn::custom_keyword!(precision);
    syn::custom_keyword!(instrument);
}

#[derive(Default)]
struct Attributes {
    timing: Option<Precision>,
    instrument: Option<TokenStream>,
    warnings: Vec<syn::Error>,
}

impl Attributes {
    fn warnings(&self) -> TokenStream {
        let warnings = self.warnings.iter().map(|err| {
            let msg = syn::LitStr::new(&format!("found unrecognized input, {err}"), err.span());

            quote_spanned! {err.span()=>
                #[warn(deprecated)]
                {
                    #[deprecated(since = "not actually deprecated", note = #msg)]
                    const TRACED_ATTRIBUTE_WARNING: () = ();
                    let _ = TRACED_ATTRIBUTE_WARNING;
                }
            }
        });

        quote! {
            { #(#warnings)* }
        }
    }
}

impl Parse for Attributes {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut attributes = Self::default();

        while !input.is_empty() {
            let lookahead = input.lookahead1();
            if lookahead.peek(keywords::timing) {
                if attributes.timing.is_some() {
                    return Err(input.error("expected only a single `timing` argument"));
                }

                let _ = input.parse::<keywords::timing>()?;
                attributes.timing = Some(input.parse()?);
            } else if lookahead.peek(keywords::instrument) {
                if attributes.instrument.is_some() {
                    return Err(input.error("expected only a single `instrument` argument"));
                }

                let _ = input.parse::<keywords::instrument>()?;
                attributes.instrument = Some(if input.peek(syn::token::Paren) {
                    let content;
                    let _ = syn::parenthesized!(content in input);
                    content.parse()?
                } else {
                    TokenStream::new()
                });
            } else if lookahead.peek(syn::Token![,]) {
                let _ = input.parse::<syn::Token![,]>()?;
            } else {
                attributes.warnings.push(lookahead.error());
                let _ = input.parse::<proc_macro2::TokenTree>();
            }
        }

        Ok(attributes)
    }
}

/// Adds `tracing::trace!` events at the start and end of an attributed function.
///
/// Accepts `instrument(...)`, forwarded verbatim to `tracing::instrument`, and
/// `timing(precision = "ns" | "us" | "ms" | "s")`, which appends the elapsed
/// time to the exit event.
///
/// # Panics
///
/// Never at runtime. Applying the attribute to anything other than a function
/// is a compile error.
#[proc_macro_attribute]
pub fn traced(
    args: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let args = parse_macro_input!(args as Attributes);
    let mut item_fn = parse_macro_input!(item as ItemFn);
    let warnings = args.warnings();

    item_fn
        .attrs
        .push(parse_quote! { #[allow(clippy::items_after_statements)] });

    if let Some(fields) = args.instrument {
        item_fn
            .attrs
            .push(parse_quote! { #[::tracing::instrument(#fields)] });
    }

    let id = item_fn.sig.ident.to_string();
    let on_exit: Stmt = match args.timing {
        Some(precision) => {
            let formatter = precision.formatter();
            parse_quote! {
                ::tracing::trace!("OnExit: {} ({})", #id, (#formatter)(self.timer.elapsed()));
            }
        }
        None => parse_quote! { ::tracing::trace!("OnExit: {}", #id); },
    };

    let decl: Vec<Stmt> = parse_quote! {
        #[allow(dead_code)]
        struct __Traced {
            timer: ::std::time::Instant,
        }

        impl __Traced {
            fn enter() -> Self {
                #warnings

                ::tracing::trace!("OnEnter: {}", #id);
                Self {
                    timer: ::std::time::Instant::now(),
                }
            }
        }

        impl ::std::ops::Drop for __Traced {
            fn drop(&mut self) {
                #on_exit
            }
        }

        let __traced = __Traced::enter();
    };

    let body = std::mem::take(&mut item_fn.block.stmts);
    item_fn.block.stmts = decl.into_iter().chain(body).collect();

    proc_macro::TokenStream::from(quote! { #item_fn })
}
