use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{FnArg, ItemFn, Lifetime, ReturnType, Type};

/// Proc macro to denote a Task
///
/// Turns an `async fn` method taking `&mut self` and the user's `&HttpClient` into a function
/// returning a boxed future, so it can be registered with `Task::new`. The body is wrapped in the
/// task hook, which counts successes and failures and records the task latency.
///
/// NOTE: The function must return a `Result<T, E>`; in practice `TaskResult`.
///
/// # Example
/// ```ignore
/// use swarm::prelude::*;
///
/// impl MyUser {
///     #[task]
///     async fn index_page(&mut self, client: &HttpClient) -> TaskResult {
///         client.get("/").await?;
///         Ok(())
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn task(attr: TokenStream, item: TokenStream) -> TokenStream {
    match task_internal(attr.into(), item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn task_internal(_attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let input = syn::parse2::<ItemFn>(item)?;

    let ItemFn {
        attrs,
        vis,
        mut sig,
        block,
    } = input;
    let stmts = &block.stmts;

    if sig.asyncness.take().is_none() {
        return Err(syn::Error::new_spanned(
            sig.fn_token,
            "#[task] only works on async functions",
        ));
    }

    let name = sig.ident.clone();
    let output = match &sig.output {
        ReturnType::Type(_, ty) => ty.clone(),
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                &sig,
                "#[task] functions must return a Result",
            ))
        }
    };

    // Every reference argument shares the lifetime of the returned future.
    let lifetime = Lifetime::new("'__swarm", Span::call_site());
    for input in sig.inputs.iter_mut() {
        match input {
            FnArg::Receiver(receiver) => {
                if let Some((_, receiver_lifetime)) = &mut receiver.reference {
                    receiver_lifetime.get_or_insert_with(|| lifetime.clone());
                    if let Type::Reference(reference) = receiver.ty.as_mut() {
                        reference.lifetime = receiver_lifetime.clone();
                    }
                }
            }
            FnArg::Typed(pat_type) => {
                if let Type::Reference(reference) = pat_type.ty.as_mut() {
                    reference.lifetime.get_or_insert_with(|| lifetime.clone());
                }
            }
        }
    }
    sig.generics
        .params
        .insert(0, syn::parse_quote!(#lifetime));
    sig.output = syn::parse_quote! {
        -> ::std::pin::Pin<::std::boxed::Box<
            dyn ::std::future::Future<Output = #output> + ::std::marker::Send + #lifetime
        >>
    };

    Ok(quote! {
        #(#attrs)* #vis #sig {
            ::std::boxed::Box::pin(async move {
                ::swarm::task::task_hook(
                    ::swarm::core::generate_labels!(#name),
                    async move {
                        let result: #output = { #(#stmts)* };
                        result
                    },
                )
                .await
            })
        }
    })
}
