//! Macros for ergonomic property definition

/// Macro for declarative property lists
///
/// `name: type` declares a mandatory property, `name?: type` an optional
/// one. The content type is taken verbatim from the identifier.
///
/// # Examples
///
/// ```rust
/// use structura::properties;
///
/// let properties = properties! {
///     title: text_line,
///     url: resource_locator,
///     article?: text_editor
/// };
///
/// assert_eq!(properties.len(), 3);
/// assert!(!properties[2].mandatory);
/// ```
#[macro_export]
macro_rules! properties {
    // Trailing comma
    (@parse $props:ident,) => {};

    // Optional property: name?: type
    (@parse $props:ident, $name:ident ?: $type:ident $(, $($rest:tt)*)?) => {
        $props.push($crate::PropertyDefinition::new(stringify!($name), stringify!($type)));
        $(
            $crate::properties!(@parse $props, $($rest)*);
        )?
    };

    // Mandatory property: name: type
    (@parse $props:ident, $name:ident: $type:ident $(, $($rest:tt)*)?) => {
        $props.push(
            $crate::PropertyDefinition::new(stringify!($name), stringify!($type)).mandatory(true),
        );
        $(
            $crate::properties!(@parse $props, $($rest)*);
        )?
    };

    {} => {
        ::std::vec::Vec::<$crate::PropertyDefinition>::new()
    };

    ($($rest:tt)+) => {
        {
            let mut properties = ::std::vec::Vec::<$crate::PropertyDefinition>::new();
            $crate::properties!(@parse properties, $($rest)+);
            properties
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::StructureMetadata;

    #[test]
    fn test_mandatory_and_optional_properties() {
        let properties = properties! {
            title: text_line,
            url: resource_locator,
            article?: text_editor
        };

        assert_eq!(properties.len(), 3);
        assert_eq!(properties[0].name, "title");
        assert_eq!(properties[0].content_type, "text_line");
        assert!(properties[0].mandatory);
        assert!(properties[1].mandatory);
        assert!(!properties[2].mandatory);
        assert!(properties.iter().all(|p| p.multilingual));
    }

    #[test]
    fn test_trailing_comma_and_empty() {
        let properties = properties! {
            title: text_line,
        };
        assert_eq!(properties.len(), 1);

        let empty = properties! {};
        assert!(empty.is_empty());
    }

    #[test]
    fn test_macro_feeds_structure_builder() {
        let structure = StructureMetadata::builder("default")
            .document_type("page")
            .properties(properties! { title: text_line, teaser?: text_area })
            .build();

        assert!(structure.property("teaser").is_some());
        assert!(structure.property("title").unwrap().mandatory);
    }
}
