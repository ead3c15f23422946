//! Deterministic batch naming.
//!
//! New batches inherit the base name of the most recent batch serving the
//! same rule ("Mugs - Batch #3" → "Mugs"); the very first batch for a rule
//! composes its base from the rule name and optional variant title.
//! Uniqueness is resolved by counting existing batches whose name starts
//! with the base, scoped to the store: the first instance keeps the bare
//! base name, later ones append " - Batch #{count+1}".

/// Suffix separator appended to disambiguate batches sharing a base name.
const BATCH_SUFFIX: &str = " - Batch #";

/// Strip any " - Batch #N" suffix from an existing batch name.
pub fn base_name_of(batch_name: &str) -> &str {
    match batch_name.find(BATCH_SUFFIX) {
        Some(idx) => &batch_name[..idx],
        None => batch_name,
    }
}

/// Compose the base name for the first batch of a rule.
pub fn compose_base_name(rule_name: &str, variant_title: Option<&str>) -> String {
    match variant_title {
        Some(variant) => format!("{rule_name} - {variant}"),
        None => rule_name.to_string(),
    }
}

/// Pick the unique name for a new batch given how many batches already
/// share the base name in the same store.
pub fn unique_batch_name(base_name: &str, existing_count: i64) -> String {
    if existing_count == 0 {
        base_name.to_string()
    } else {
        format!("{base_name}{BATCH_SUFFIX}{}", existing_count + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_suffix() {
        assert_eq!(base_name_of("Mugs - Batch #3"), "Mugs");
        assert_eq!(base_name_of("Mugs"), "Mugs");
        assert_eq!(base_name_of("Stickers - Large - Batch #12"), "Stickers - Large");
    }

    #[test]
    fn compose_appends_variant_title_when_present() {
        assert_eq!(compose_base_name("Mugs", None), "Mugs");
        assert_eq!(compose_base_name("Stickers", Some("Large")), "Stickers - Large");
    }

    #[test]
    fn first_batch_keeps_bare_base_name() {
        assert_eq!(unique_batch_name("Mugs", 0), "Mugs");
    }

    #[test]
    fn sequence_skips_number_one() {
        // Three batches in a row: "Mugs", "Mugs - Batch #2", "Mugs - Batch #3".
        assert_eq!(unique_batch_name("Mugs", 0), "Mugs");
        assert_eq!(unique_batch_name("Mugs", 1), "Mugs - Batch #2");
        assert_eq!(unique_batch_name("Mugs", 2), "Mugs - Batch #3");
    }
}
