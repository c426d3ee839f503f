use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_]").expect("column-name pattern should parse"));

/// Trim, then strip everything outside `[A-Za-z0-9_]`.
pub fn sanitize_column_name(raw: &str) -> String {
    NON_WORD.replace_all(raw.trim(), "").into_owned()
}

/// Derived output name: `prefix` + the source file name.
pub fn prefixed_file_name(prefix: &str, file_name: &str) -> String {
    format!("{}{}", prefix, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_noise() {
        assert_eq!(sanitize_column_name("  boule_1 "), "boule_1");
        assert_eq!(
            sanitize_column_name("\u{feff}annee_numero_de_tirage"),
            "annee_numero_de_tirage"
        );
        assert_eq!(sanitize_column_name("Unnamed: 49"), "Unnamed49");
        assert_eq!(sanitize_column_name("numéro"), "numro");
        assert_eq!(sanitize_column_name("n1"), sanitize_column_name(&sanitize_column_name("n1")));
    }

    #[test]
    fn prefix_is_prepended() {
        assert_eq!(
            prefixed_file_name("cleaned_", "euromillions_202002.csv"),
            "cleaned_euromillions_202002.csv"
        );
    }
}
