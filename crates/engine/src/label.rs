//! Reverse-tag handling for row labels.
//!
//! A reverse row's label carries a leading `[REV]` marker followed by a space,
//! or is exactly `[REV]` when the rest of the label is empty. A bare `[REV]`
//! glued to other text is part of the label, not a marker. Adding is a no-op
//! when the marker is already present and removing strips every leading copy,
//! so repeated toggles never stack tags or eat label text.

pub const REVERSE_TAG: &str = "[REV]";

const REVERSE_PREFIX: &str = "[REV] ";

/// Add the marker unless the label already starts with it.
pub fn with_reverse_tag(label: &str) -> String {
    if has_reverse_tag(label) {
        return label.to_string();
    }
    if label.is_empty() {
        REVERSE_TAG.to_string()
    } else {
        format!("{REVERSE_PREFIX}{label}")
    }
}

/// Remove every leading marker along with the space that follows it.
pub fn without_reverse_tag(label: &str) -> String {
    let mut rest = label;
    loop {
        if rest == REVERSE_TAG {
            return String::new();
        }
        match rest.strip_prefix(REVERSE_PREFIX) {
            Some(stripped) => rest = stripped,
            None => return rest.to_string(),
        }
    }
}

pub fn has_reverse_tag(label: &str) -> bool {
    label == REVERSE_TAG || label.starts_with(REVERSE_PREFIX)
}

/// Bring a label in line with the row's reverse flag.
pub fn sync_reverse_tag(label: &str, reverse: bool) -> String {
    if reverse {
        with_reverse_tag(label)
    } else {
        without_reverse_tag(label)
    }
}

/// Label with the marker removed and whitespace trimmed, for matching rows across tables.
pub fn label_key(label: &str) -> String {
    without_reverse_tag(label.trim()).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let once = with_reverse_tag("Organic carrot");
        assert_eq!(once, "[REV] Organic carrot");
        assert_eq!(with_reverse_tag(&once), once);
    }

    #[test]
    fn remove_strips_stacked_tags() {
        assert_eq!(without_reverse_tag("[REV] [REV] Onion"), "Onion");
        assert_eq!(without_reverse_tag("Onion"), "Onion");
        assert_eq!(without_reverse_tag("[REV]"), "");
    }

    #[test]
    fn tag_inside_label_is_left_alone() {
        assert_eq!(without_reverse_tag("Box [REV] edition"), "Box [REV] edition");
    }

    #[test]
    fn glued_prefix_is_label_text() {
        assert!(!has_reverse_tag("[REV]IEW kit"));
        let tagged = sync_reverse_tag("[REV]IEW kit", true);
        assert_eq!(tagged, "[REV] [REV]IEW kit");
        assert_eq!(sync_reverse_tag(&tagged, false), "[REV]IEW kit");
        assert_eq!(without_reverse_tag("[REV]IEW kit"), "[REV]IEW kit");
    }

    #[test]
    fn toggle_round_trip_restores_label() {
        for label in ["Organic carrot", "", "[REV]IEW kit", "Box [REV] edition", " padded "] {
            let on = sync_reverse_tag(label, true);
            assert_eq!(sync_reverse_tag(&on, true), on);
            assert_eq!(sync_reverse_tag(&on, false), label);
        }
    }

    #[test]
    fn empty_label_gets_bare_tag() {
        assert_eq!(sync_reverse_tag("", true), "[REV]");
        assert_eq!(sync_reverse_tag("[REV]", false), "");
    }

    #[test]
    fn key_ignores_tag_and_whitespace() {
        assert_eq!(label_key("  [REV] Onion "), "Onion");
    }
}
