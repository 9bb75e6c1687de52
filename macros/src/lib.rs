//! Proc macros for reinhardt-taggable
//!
//! This crate provides the `#[taggable]` attribute macro for zero-boilerplate tagging.

use proc_macro::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{Data, DeriveInput, Fields, LitStr, Path, Type, parse_macro_input};

#[derive(Default)]
struct TaggableArgs {
	content_type: Option<LitStr>,
	table: Option<LitStr>,
	key: Option<LitStr>,
	tags: Option<LitStr>,
	tag_model: Option<Path>,
	soft_deletes: bool,
}

impl TaggableArgs {
	fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
		if meta.path.is_ident("content_type") {
			self.content_type = Some(meta.value()?.parse()?);
		} else if meta.path.is_ident("table") {
			self.table = Some(meta.value()?.parse()?);
		} else if meta.path.is_ident("key") {
			self.key = Some(meta.value()?.parse()?);
		} else if meta.path.is_ident("tags") {
			self.tags = Some(meta.value()?.parse()?);
		} else if meta.path.is_ident("tag_model") {
			self.tag_model = Some(meta.value()?.parse()?);
		} else if meta.path.is_ident("soft_deletes") {
			self.soft_deletes = true;
		} else {
			return Err(meta.error("unsupported #[taggable] option"));
		}
		Ok(())
	}
}

/// `Option<...>` by last path segment
fn is_option(ty: &Type) -> bool {
	match ty {
		Type::Path(type_path) => type_path
			.path
			.segments
			.last()
			.is_some_and(|segment| segment.ident == "Option"),
		_ => false,
	}
}

/// Attribute macro to make a model taggable
///
/// This macro implements the `Taggable` trait for a struct, which in turn
/// provides every `TaggableExt` method.
///
/// # Usage
///
/// ```rust,ignore
/// use reinhardt_taggable::prelude::*;
///
/// #[taggable(content_type = "Food", table = "foods")]
/// pub struct Food {
///     pub id: Option<i64>,
///     pub name: String,
///     pub tags: TagSet,
/// }
/// ```
///
/// # Options
///
/// - `table` (required): entity table queried by tag scopes
/// - `content_type`: discriminator stored with each association, defaults
///   to the struct name
/// - `key`: primary key field and column, defaults to `"id"`
/// - `tags`: the `TagSet` field, defaults to `"tags"`
/// - `tag_model`: tag record type, defaults to `reinhardt_taggable::Tag`
/// - `soft_deletes`: soft deletes keep the tag associations
///
/// # Requirements
///
/// - The key field must be `i64` or `Option<i64>`
/// - The tags field must be a `TagSet` of the tag record type
#[proc_macro_attribute]
pub fn taggable(attr: TokenStream, item: TokenStream) -> TokenStream {
	let mut args = TaggableArgs::default();
	let parser = syn::meta::parser(|meta| args.parse(meta));
	parse_macro_input!(attr with parser);

	let input = parse_macro_input!(item as DeriveInput);
	let name = &input.ident;

	// Ensure it's a struct with named fields
	let Data::Struct(data) = &input.data else {
		return syn::Error::new_spanned(&input, "#[taggable] can only be applied to structs")
			.to_compile_error()
			.into();
	};
	let Fields::Named(fields) = &data.fields else {
		return syn::Error::new_spanned(&input, "#[taggable] requires named fields")
			.to_compile_error()
			.into();
	};

	let Some(table) = args.table else {
		return syn::Error::new_spanned(
			name,
			"#[taggable] requires `table = \"...\"` naming the model's table",
		)
		.to_compile_error()
		.into();
	};

	let content_type = args
		.content_type
		.unwrap_or_else(|| LitStr::new(&name.to_string(), name.span()));
	let key = args
		.key
		.unwrap_or_else(|| LitStr::new("id", proc_macro2::Span::call_site()));
	let tags = args
		.tags
		.unwrap_or_else(|| LitStr::new("tags", proc_macro2::Span::call_site()));
	let tag_model = match args.tag_model {
		Some(path) => quote! { #path },
		None => quote! { ::reinhardt_taggable::Tag },
	};
	let soft_deletes = args.soft_deletes;

	let find_field = |lit: &LitStr| {
		fields
			.named
			.iter()
			.find(|field| field.ident.as_ref().is_some_and(|ident| *ident == lit.value()))
	};

	let Some(key_field) = find_field(&key) else {
		return syn::Error::new_spanned(
			&key,
			format!("#[taggable] key field `{}` not found", key.value()),
		)
		.to_compile_error()
		.into();
	};
	let Some(tags_field) = find_field(&tags) else {
		return syn::Error::new_spanned(
			&tags,
			format!("#[taggable] tags field `{}` not found", tags.value()),
		)
		.to_compile_error()
		.into();
	};

	let key_ident = &key_field.ident;
	let tags_ident = &tags_field.ident;
	let object_id = if is_option(&key_field.ty) {
		quote! { self.#key_ident }
	} else {
		quote! { ::core::option::Option::Some(self.#key_ident) }
	};

	let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

	let expanded = quote! {
		#input

		#[automatically_derived]
		impl #impl_generics ::reinhardt_taggable::Taggable for #name #ty_generics #where_clause {
			type Tag = #tag_model;

			const SOFT_DELETES: bool = #soft_deletes;

			fn content_type_name() -> &'static str {
				#content_type
			}

			fn table_name() -> &'static str {
				#table
			}

			fn key_column() -> &'static str {
				#key
			}

			fn object_id(&self) -> ::core::option::Option<i64> {
				#object_id
			}

			fn tag_set(&self) -> &::reinhardt_taggable::TagSet<#tag_model> {
				&self.#tags_ident
			}

			fn tag_set_mut(&mut self) -> &mut ::reinhardt_taggable::TagSet<#tag_model> {
				&mut self.#tags_ident
			}
		}
	};

	TokenStream::from(expanded)
}
