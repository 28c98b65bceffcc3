//! Normalization Rules
//!
//! Building blocks for canonical signatures. Two schema objects are compared
//! through the string these helpers produce, never through structural equality,
//! so every vocabulary difference between engines has to be absorbed here.

use once_cell::sync::Lazy;
use regex::Regex;

/// Separator between fields of a canonical signature
pub const FIELD_DELIMITER: &str = "|";

/// Separator between values of a multi-valued field
pub const LIST_DELIMITER: &str = ",";

// Literals are matched so that comment markers inside them are left alone;
// whichever token opens first wins.
static COMMENT_OR_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)'(?:[^']|'')*'|/\*.*?\*/|--[^\n]*").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Upper-case and trim an identifier.
pub fn fold_ident(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Fold a declared type into its canonical bucket.
///
/// Unknown types pass through upper-cased; a missing type becomes `UNKNOWN`.
pub fn fold_type(declared: Option<&str>) -> String {
    let Some(declared) = declared else {
        return "UNKNOWN".to_string();
    };
    let upper = declared.trim().to_uppercase();
    match upper.as_str() {
        "INT" | "INTEGER" | "INT4" => "INTEGER".to_string(),
        "BIGINT" | "INT8" => "BIGINT".to_string(),
        "VARCHAR2" => "VARCHAR".to_string(),
        "NUMBER" => "NUMERIC".to_string(),
        "DATETIME2" | "TIMESTAMP" => "TIMESTAMP".to_string(),
        _ => upper,
    }
}

/// Join a multi-valued field where order carries no meaning.
pub fn sorted_list<S: AsRef<str>>(values: &[S]) -> String {
    let mut folded: Vec<String> = values.iter().map(|v| v.as_ref().to_uppercase()).collect();
    folded.sort();
    folded.join(LIST_DELIMITER)
}

/// Join a multi-valued field where position is significant.
pub fn ordered_list<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| v.as_ref().to_uppercase())
        .collect::<Vec<_>>()
        .join(LIST_DELIMITER)
}

/// Normalize free-text source (routine, trigger, view bodies).
///
/// Strips `--` line comments and `/* */` block comments outside string
/// literals, collapses whitespace runs to one space and upper-cases the result.
pub fn normalize_definition(source: &str) -> String {
    let without_comments = COMMENT_OR_LITERAL.replace_all(source, |caps: &regex::Captures| {
        let token = &caps[0];
        if token.starts_with('\'') {
            token.to_string()
        } else {
            " ".to_string()
        }
    });
    WHITESPACE
        .replace_all(&without_comments, " ")
        .trim()
        .to_uppercase()
}

/// Assemble a signature from its already-normalized fields.
pub fn signature<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| f.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(FIELD_DELIMITER)
}

/// Anything that can be reduced to a canonical signature.
///
/// This is the only equality rule the diff engine uses: same logical object,
/// same signature, always.
pub trait Canonical {
    fn canonical_signature(&self) -> String;
}
