//! Placeholder parser.
//!
//! Prompt authors embed inputs as `{{name:type:required:options}}`, e.g.
//! `{{city}}`, `{{days:integer:false}}` or `{{tone:choices:true:"formal,casual"}}`.
//! The language has no grammar beyond that, so nothing here fails: unknown
//! types become text, odd requiredness tokens mean required, and unusable
//! option lists drop the field.

use std::sync::LazyLock;

use promptify_core::Claims;
use regex::Regex;

use crate::types::{FieldKind, Template, TemplateField};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("placeholder pattern is valid"));

/// Extract the deduplicated field schema from prompt fragments.
///
/// Fields come out in fragment order, then left to right. The first
/// definition of a name wins; later ones are ignored, not merged.
///
/// # Example
/// ```
/// use promptify_template::{extract_fields, FieldKind};
///
/// let fields = extract_fields(["Write about {{topic}} in {{words:number}} words"]);
/// assert_eq!(fields.len(), 2);
/// assert_eq!(fields[1].kind, FieldKind::Number);
/// ```
pub fn extract_fields<I, S>(fragments: I) -> Vec<TemplateField>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut fields: Claims<String, TemplateField> = Claims::new();

    for fragment in fragments {
        for capture in PLACEHOLDER.captures_iter(fragment.as_ref()) {
            let inner = capture.get(1).map_or("", |m| m.as_str());
            let name = inner.split(':').next().unwrap_or_default();

            if fields.is_claimed(name) {
                continue;
            }

            if let Some(field) = parse_placeholder(inner) {
                fields.claim(field.name.clone(), field);
            }
        }
    }

    fields.into_values()
}

impl Template {
    /// Field schema of every prompt, in prompt order.
    pub fn fields(&self) -> Vec<TemplateField> {
        extract_fields(self.prompts.iter().map(|prompt| prompt.content.as_str()))
    }
}

/// Parse the text between `{{` and `}}` into a field.
///
/// Returns `None` for placeholders that cannot become a field: an empty
/// name, or a choice list without a single usable option.
fn parse_placeholder(inner: &str) -> Option<TemplateField> {
    let mut parts = inner.splitn(4, ':');
    let name = parts.next().unwrap_or_default();
    let raw_type = parts.next();
    let raw_required = parts.next();
    let raw_options = parts.next();

    if name.is_empty() {
        tracing::debug!("Skipping placeholder without a name: {{{{{}}}}}", inner);
        return None;
    }

    let kind = FieldKind::from_token(raw_type);

    let choices = match kind {
        FieldKind::Choice => {
            let options = raw_options.map(parse_choices).unwrap_or_default();
            if options.is_empty() {
                tracing::debug!("Dropping choice field '{}' without options", name);
                return None;
            }
            Some(options)
        }
        _ => None,
    };

    let required = raw_required.is_none_or(|token| token.to_lowercase() != "false");

    Some(TemplateField {
        name: name.to_string(),
        display_name: display_name(name),
        kind,
        required,
        choices,
    })
}

/// Options are only read from a double-quoted list: `"a,b,c"`.
fn parse_choices(raw: &str) -> Vec<String> {
    let Some(list) = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return Vec::new();
    };

    let mut options: Claims<String, ()> = Claims::new();
    for option in list.split(',').map(str::trim).filter(|o| !o.is_empty()) {
        options.claim(option.to_string(), ());
    }

    options.into_keys()
}

/// Human-readable label for a field name: `firstName` becomes `First name`.
pub fn display_name(name: &str) -> String {
    let mut spaced = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;

    for ch in name.chars() {
        if ch.is_ascii_uppercase() && previous.is_some_and(|p| p.is_ascii_lowercase()) {
            spaced.push(' ');
        }
        spaced.push(ch);
        previous = Some(ch);
    }

    let lowered = spaced.to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
