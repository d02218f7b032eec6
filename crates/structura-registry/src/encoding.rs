//! Property name encoding on repository nodes
//!
//! Localized values live under `i18n:<locale>-<name>`, unlocalized system
//! values under `sulu:<name>` and unlocalized content under the bare name.
//! A locale counts as available on a node once its
//! `i18n:<locale>-template` property exists.

use crate::node::Node;

pub const SYSTEM_PREFIX: &str = "sulu";
pub const LOCALIZED_PREFIX: &str = "i18n";

/// System property holding the structure type
pub const TEMPLATE_PROPERTY: &str = "template";

pub fn system_name(name: &str) -> String {
    format!("{}:{}", SYSTEM_PREFIX, name)
}

pub fn localized_system_name(name: &str, locale: &str) -> String {
    format!("{}:{}-{}", LOCALIZED_PREFIX, locale, name)
}

pub fn content_name(name: &str) -> String {
    name.to_string()
}

pub fn localized_content_name(name: &str, locale: &str) -> String {
    format!("{}:{}-{}", LOCALIZED_PREFIX, locale, name)
}

/// Locales the node has content for, in the order the node stores them
pub fn locales(node: &Node) -> Vec<String> {
    let suffix = format!("-{}", TEMPLATE_PROPERTY);
    let prefix = format!("{}:", LOCALIZED_PREFIX);

    node.properties
        .keys()
        .filter_map(|name| name.strip_prefix(&prefix)?.strip_suffix(&suffix))
        .filter(|locale| !locale.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_names() {
        assert_eq!(system_name("template"), "sulu:template");
        assert_eq!(localized_system_name("template", "de"), "i18n:de-template");
        assert_eq!(localized_content_name("title", "en_us"), "i18n:en_us-title");
        assert_eq!(content_name("title"), "title");
    }

    #[test]
    fn test_locales_are_read_from_template_properties() {
        let node = Node::new(Uuid::new_v4(), "/cmf/sulu_io/contents/about", "page")
            .with_property("i18n:fr-template", "default")
            .with_property("i18n:fr-title", "À propos")
            .with_property("i18n:de-template", "default")
            .with_property("i18n:en-title", "Orphaned title")
            .with_property("sulu:template", "default");

        assert_eq!(locales(&node), vec!["fr".to_string(), "de".to_string()]);
    }
}
