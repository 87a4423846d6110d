use convert_case::{Boundary, Case, Casing};
use proc_macro2::{Ident, Span};
use quote::format_ident;
use std::collections::HashSet;

/// A Rust identifier for a name from a service description
///
/// Characters that cannot appear in an identifier become `_`; keywords become raw
/// identifiers, or get a trailing `_` when they cannot be raw. Digits never start a new word.
pub fn rust_ident(name: &str, case: Case) -> Ident {
    let converted = sanitize(&name.without_boundaries(&Boundary::digits()).to_case(case));
    if syn::parse_str::<Ident>(&converted).is_ok() {
        return Ident::new(&converted, Span::call_site());
    }
    match converted.as_str() {
        "self" | "Self" | "super" | "crate" | "_" => format_ident!("{}_", converted),
        _ => Ident::new_raw(&converted, Span::call_site()),
    }
}

/// Like [`rust_ident`], numbered when the name is already taken
pub fn unique_ident(name: &str, case: Case, taken: &mut HashSet<String>) -> Ident {
    let base = rust_ident(name, case);
    let mut ident = base.clone();
    let mut counter = 2usize;
    while !taken.insert(ident.to_string()) {
        ident = format_ident!("{}_{}", unraw(&base), counter);
        counter += 1;
    }
    ident
}

fn unraw(ident: &Ident) -> String {
    let text = ident.to_string();
    text.strip_prefix("r#").map(str::to_string).unwrap_or(text)
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    match cleaned.chars().next() {
        None => "unnamed".to_string(),
        Some(first) if first.is_ascii_digit() => format!("_{}", cleaned),
        Some(_) => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_ident() {
        assert_eq!(rust_ident("GetUser", Case::Snake), "get_user");
        assert_eq!(rust_ident("user-service", Case::Pascal), "UserService");
        assert_eq!(rust_ident("type", Case::Snake).to_string(), "r#type");
        assert_eq!(rust_ident("self", Case::Snake), "self_");
        assert_eq!(rust_ident("2fa", Case::Snake), "_2fa");
        assert_eq!(rust_ident("GetUser2Fa", Case::Snake), "get_user2fa");
    }

    #[test]
    fn test_unique_ident() {
        let mut taken: HashSet<String> = ["new".to_string()].into_iter().collect();
        assert_eq!(unique_ident("New", Case::Snake, &mut taken), "new_2");
        assert_eq!(unique_ident("GetUser", Case::Snake, &mut taken), "get_user");
        assert_eq!(unique_ident("get_user", Case::Snake, &mut taken), "get_user_2");
        assert_eq!(unique_ident("type", Case::Snake, &mut taken).to_string(), "r#type");
        assert_eq!(unique_ident("Type", Case::Snake, &mut taken), "type_2");
    }
}
