//! Elixir Term Conversion Utilities
//!
//! Converts catalog results and errors to Elixir terms.

use rustler::{Encoder, Env, NewBinary, NifResult, Term};

use crate::catalog::{Product, SpareParts};
use crate::error::{CatalogError, ErrorKind};
use crate::resource::CursorItem;
use crate::strategy::parallel::CatalogSummary;

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    name,
    image,
    parts,
    products,
    spare_parts,
    more,
    done,
    source_unavailable,
    malformed_document,
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

fn optional_binary<'a>(env: Env<'a>, s: Option<&str>) -> Term<'a> {
    match s {
        Some(s) => str_to_binary(env, s),
        None => rustler::types::atom::nil().encode(env),
    }
}

/// `{:ok, value}`
pub fn ok_tuple<'a>(env: Env<'a>, value: Term<'a>) -> Term<'a> {
    (ok(), value).encode(env)
}

/// `{:error, {kind, message}}`
pub fn error_to_term<'a>(env: Env<'a>, err: &CatalogError) -> Term<'a> {
    let kind = match err.kind() {
        ErrorKind::SourceUnavailable => source_unavailable(),
        ErrorKind::MalformedDocument => malformed_document(),
    };
    (error(), (kind, str_to_binary(env, &err.to_string()))).encode(env)
}

/// `%{name: binary, image: binary | nil}`
pub fn product_to_term<'a>(env: Env<'a>, product: &Product) -> NifResult<Term<'a>> {
    Term::map_from_pairs(
        env,
        &[
            (name().encode(env), str_to_binary(env, &product.name)),
            (image().encode(env), optional_binary(env, product.image.as_deref())),
        ],
    )
}

/// `{name, %{parts: [binary], image: binary | nil}}`
pub fn spare_parts_to_term<'a>(
    env: Env<'a>,
    product: &str,
    spare: &SpareParts,
) -> NifResult<Term<'a>> {
    let mut part_list = Term::list_new_empty(env);
    for part in spare.parts.iter().rev() {
        part_list = part_list.list_prepend(str_to_binary(env, part));
    }
    let details = Term::map_from_pairs(
        env,
        &[
            (parts().encode(env), part_list),
            (image().encode(env), optional_binary(env, spare.image.as_deref())),
        ],
    )?;
    Ok((str_to_binary(env, product), details).encode(env))
}

pub fn products_to_term<'a>(env: Env<'a>, products: &[Product]) -> NifResult<Term<'a>> {
    let mut list = Term::list_new_empty(env);
    for product in products.iter().rev() {
        list = list.list_prepend(product_to_term(env, product)?);
    }
    Ok(list)
}

pub fn spare_parts_list_to_term<'a>(
    env: Env<'a>,
    entries: &[(String, SpareParts)],
) -> NifResult<Term<'a>> {
    let mut list = Term::list_new_empty(env);
    for (product, spare) in entries.iter().rev() {
        list = list.list_prepend(spare_parts_to_term(env, product, spare)?);
    }
    Ok(list)
}

/// `%{products: n, spare_parts: n}`
pub fn summary_to_term<'a>(env: Env<'a>, summary: &CatalogSummary) -> NifResult<Term<'a>> {
    Term::map_from_pairs(
        env,
        &[
            (products().encode(env), summary.products.encode(env)),
            (spare_parts().encode(env), summary.spare_parts.encode(env)),
        ],
    )
}

/// `{:ok, items, :more | :done}`
pub fn batch_to_term<'a>(
    env: Env<'a>,
    items: &[CursorItem],
    finished: bool,
) -> NifResult<Term<'a>> {
    let mut list = Term::list_new_empty(env);
    for item in items.iter().rev() {
        let term = match item {
            CursorItem::Product(product) => product_to_term(env, product)?,
            CursorItem::SpareParts(product, spare) => spare_parts_to_term(env, product, spare)?,
        };
        list = list.list_prepend(term);
    }
    let status = if finished { done() } else { more() };
    Ok((ok(), list, status).encode(env))
}
