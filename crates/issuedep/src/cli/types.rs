//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::projection::FilterField;

/// Rendering of the `graph` command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphFormatArg {
    /// Upstream and downstream trees
    #[default]
    Tree,
    /// Graphviz DOT
    Dot,
}

impl std::fmt::Display for GraphFormatArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tree => write!(f, "tree"),
            Self::Dot => write!(f, "dot"),
        }
    }
}

/// Classification field for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFieldArg {
    /// The state field
    State,
    /// The type field
    #[value(name = "type")]
    Type,
}

impl From<FilterFieldArg> for FilterField {
    fn from(arg: FilterFieldArg) -> Self {
        match arg {
            FilterFieldArg::State => FilterField::State,
            FilterFieldArg::Type => FilterField::Type,
        }
    }
}

impl std::fmt::Display for FilterFieldArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::State => write!(f, "state"),
            Self::Type => write!(f, "type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_field_conversion() {
        assert_eq!(FilterField::from(FilterFieldArg::State), FilterField::State);
        assert_eq!(FilterField::from(FilterFieldArg::Type), FilterField::Type);
    }

    #[test]
    fn test_display_matches_value_names() {
        for format in GraphFormatArg::value_variants() {
            let name = format.to_possible_value().unwrap();
            assert_eq!(name.get_name(), format.to_string());
        }
        for field in FilterFieldArg::value_variants() {
            let name = field.to_possible_value().unwrap();
            assert_eq!(name.get_name(), field.to_string());
        }
    }
}
