/// Last path segment of a type name, without generic arguments.
pub fn short_type_name(type_name: &str) -> &str {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// `BlogPost` -> `blog_post`. Only ASCII uppercase letters start a new word.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (index, ch) in name.chars().enumerate() {
        if index > 0 && ch.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}

/// `y` -> `ies`; `s`, `x`, `z`, `ch`, `sh` -> `+es`; anything else `+s`.
pub fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        format!("{}ies", stem)
    } else if word.ends_with(&['s', 'x', 'z'][..]) || word.ends_with("ch") || word.ends_with("sh") {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

/// Table name for a fully qualified type name.
pub fn default_table_name(type_name: &str) -> String {
    pluralize(&snake_case(short_type_name(type_name)))
}
