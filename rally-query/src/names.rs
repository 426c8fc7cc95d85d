//! Attribute name codec.
//!
//! The webservice names elements in PascalCase (`SalesforceCaseID`) and
//! addresses nested attributes with dotted paths (`Card.IterationName`).
//! Callers use snake_case symbols (`salesforce_case_i_d`,
//! `card.iteration_name`). These functions convert between the two.

/// Converts a wire element name into a snake_case symbol.
///
/// The name is split before every uppercase letter and the pieces are joined
/// with underscores, lower-cased. Runs of capitals therefore become runs of
/// single letters: `SalesforceCaseID` becomes `salesforce_case_i_d`.
pub fn underscore(element_name: &str) -> String {
    let mut out = String::with_capacity(element_name.len() + 4);
    for (i, ch) in element_name.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// Converts a symbol or dotted attribute path into its wire form.
///
/// Each dot-separated segment is split on underscores and every word is
/// capitalized: `card.iteration_name` becomes `Card.IterationName`.
pub fn camelize(path: &str) -> String {
    path.split('.')
        .map(camel_case_word)
        .collect::<Vec<_>>()
        .join(".")
}

/// Converts a single snake_case word into PascalCase, ignoring dots.
///
/// Used for resource type names (`use_case` → `UseCase`) and for element
/// names in outgoing payloads.
pub fn camel_case_word(word: &str) -> String {
    word.split('_').map(capitalize).collect()
}

/// Converts a snake_case parameter key into lowerCamelCase
/// (`project_scope_up` → `projectScopeUp`).
pub fn lower_camelize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, word) in key.split('_').enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
