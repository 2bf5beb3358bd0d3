use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The index section a fragment belongs to.
///
/// Doxygen writes one set of fragments per section, so the same symbol
/// usually appears twice: once under `All` and once under its kind.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    All,
    Classes,
    Namespaces,
    Files,
    Functions,
    Variables,
    Typedefs,
    Enums,
    Enumvalues,
    Related,
    Defines,
    Groups,
    Pages,
    Properties,
    Events,
    Concepts,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Self::All,
        Self::Classes,
        Self::Namespaces,
        Self::Files,
        Self::Functions,
        Self::Variables,
        Self::Typedefs,
        Self::Enums,
        Self::Enumvalues,
        Self::Related,
        Self::Defines,
        Self::Groups,
        Self::Pages,
        Self::Properties,
        Self::Events,
        Self::Concepts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Classes => "classes",
            Self::Namespaces => "namespaces",
            Self::Files => "files",
            Self::Functions => "functions",
            Self::Variables => "variables",
            Self::Typedefs => "typedefs",
            Self::Enums => "enums",
            Self::Enumvalues => "enumvalues",
            Self::Related => "related",
            Self::Defines => "defines",
            Self::Groups => "groups",
            Self::Pages => "pages",
            Self::Properties => "properties",
            Self::Events => "events",
            Self::Concepts => "concepts",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

static FRAGMENT_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]+)_([0-9a-f]+)\.js$").expect("valid fragment regex"));

/// Name of a fragment file: `<category>_<group in lowercase hex>.js`.
///
/// The group is the position of the fragment's first key character among
/// all first characters present in that category, so `all_c.js` is the
/// thirteenth letter group of the `all` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FragmentName {
    pub category: Category,
    pub group: u32,
}

impl FragmentName {
    pub fn new(category: Category, group: u32) -> Self {
        Self { category, group }
    }

    /// Parse a file name such as `functions_c.js`. Returns `None` for other
    /// files found next to fragments (`search.js`, `searchdata.js`, ...).
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = FRAGMENT_FILE.captures(file_name)?;
        let category = Category::from_str(&caps[1])?;
        let group = u32::from_str_radix(&caps[2], 16).ok()?;
        Some(Self { category, group })
    }

    pub fn file_name(&self) -> String {
        format!("{}_{:x}.js", self.category.as_str(), self.group)
    }
}

impl fmt::Display for FragmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:x}.js", self.category.as_str(), self.group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fragment_names() {
        assert_eq!(
            FragmentName::parse("all_c.js"),
            Some(FragmentName::new(Category::All, 12))
        );
        assert_eq!(
            FragmentName::parse("functions_1a.js"),
            Some(FragmentName::new(Category::Functions, 26))
        );
        assert_eq!(
            FragmentName::parse("enumvalues_0.js"),
            Some(FragmentName::new(Category::Enumvalues, 0))
        );
    }

    #[test]
    fn test_rejects_non_fragments() {
        assert_eq!(FragmentName::parse("search.js"), None);
        assert_eq!(FragmentName::parse("searchdata.js"), None);
        assert_eq!(FragmentName::parse("widgets_1.js"), None);
        assert_eq!(FragmentName::parse("all_C.js"), None);
        assert_eq!(FragmentName::parse("all_c.html"), None);
    }

    #[test]
    fn test_file_name_uses_lowercase_hex() {
        assert_eq!(FragmentName::new(Category::All, 12).file_name(), "all_c.js");
        assert_eq!(
            FragmentName::new(Category::Classes, 31).file_name(),
            "classes_1f.js"
        );
    }

    #[test]
    fn test_category_names() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_str("widgets"), None);
    }
}
