use std::fmt::Display;

use crossterm::style::Stylize;
use registry_browser_sdk::models::package::PackageRecord;
use registry_browser_sdk::models::search::{MatchResult, MAX_SUGGESTIONS};

pub const DEFAULT_DESCRIPTION: &str = "<no description provided>";

#[derive(Debug, Clone, PartialEq)]
struct DisplayItem {
    /// Runs of the label, `true` for highlighted runs
    label: Vec<(String, bool)>,
    version: Option<String>,
    description: Option<String>,
}

impl DisplayItem {
    fn from_record(record: &PackageRecord, label: Vec<(String, bool)>) -> Self {
        Self {
            label,
            version: record.version().map(ToString::to_string),
            description: record.description().map(ToString::to_string),
        }
    }

    fn width(&self) -> usize {
        let label: usize = self.label.iter().map(|(text, _)| text.chars().count()).sum();
        let version = self.version.as_ref().map_or(0, |v| v.chars().count() + 1);
        label + version
    }

    fn write_name(&self, f: &mut std::fmt::Formatter<'_>, styled: bool) -> std::fmt::Result {
        for (text, highlighted) in &self.label {
            if styled && *highlighted {
                write!(f, "{}", text.as_str().bold())?;
            } else {
                write!(f, "{text}")?;
            }
        }
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}

/// Packages formatted as a two column list of `name@version` and description.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DisplayPackages {
    items: Vec<DisplayItem>,
    styled: bool,
}

impl DisplayPackages {
    /// Display search matches, highlighted runs are printed bold if `styled`.
    pub(crate) fn from_matches(results: &[MatchResult], styled: bool) -> Self {
        let items = results
            .iter()
            .map(|result| {
                let label = result
                    .parts()
                    .into_iter()
                    .map(|part| (part.text.to_string(), part.highlighted))
                    .collect();
                DisplayItem::from_record(&result.record, label)
            })
            .collect();
        Self { items, styled }
    }

    pub(crate) fn from_records(records: &[PackageRecord]) -> Self {
        let items = records
            .iter()
            .map(|record| DisplayItem::from_record(record, vec![(record.label().to_string(), false)]))
            .collect();
        Self {
            items,
            styled: false,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn truncated_hint(&self) -> Option<String> {
        if self.items.len() < MAX_SUGGESTIONS {
            return None;
        }
        Some(format!(
            "Showing at most {MAX_SUGGESTIONS} matches. Refine the query to narrow them down."
        ))
    }
}

impl Display for DisplayPackages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let column_width = self
            .items
            .iter()
            .map(DisplayItem::width)
            .max()
            .unwrap_or_default();

        let mut items = self.items.iter().peekable();
        while let Some(item) = items.next() {
            let description = item.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION);
            item.write_name(f, self.styled)?;
            // padding is computed on the unstyled width
            write!(
                f,
                "{:pad$}  {description}",
                "",
                pad = column_width - item.width()
            )?;
            if items.peek().is_some() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use registry_browser_sdk::models::search::filter;
    use serde_json::{json, Map, Value};

    use super::*;

    fn record(name: &str, fields: Value) -> PackageRecord {
        let Value::Object(fields) = fields else {
            panic!("fields must be an object");
        };
        PackageRecord::new(name, fields).unwrap()
    }

    fn catalog() -> Vec<PackageRecord> {
        vec![
            record(
                "react",
                json!({ "version": "18.2.0", "description": "UI library" }),
            ),
            record("react-dom", json!({ "version": "18.2.0" })),
            PackageRecord::new("lodash", Map::new()).unwrap(),
        ]
    }

    #[test]
    fn list_in_columns() {
        let display = DisplayPackages::from_records(&catalog());
        assert_eq!(
            display.to_string(),
            [
                "react@18.2.0      UI library",
                "react-dom@18.2.0  <no description provided>",
                "lodash            <no description provided>",
            ]
            .join("\n")
        );
    }

    #[test]
    fn matches_are_highlighted_when_styled() {
        let results = filter(&catalog(), "rea");
        let styled = DisplayPackages::from_matches(&results, true).to_string();
        let plain = DisplayPackages::from_matches(&results, false).to_string();

        assert!(styled.contains(&"rea".bold().to_string()));
        assert_eq!(
            plain,
            [
                "react@18.2.0      UI library",
                "react-dom@18.2.0  <no description provided>",
            ]
            .join("\n")
        );
    }

    #[test]
    fn hint_only_when_capped() {
        let few = DisplayPackages::from_matches(&filter(&catalog(), "re"), false);
        assert_eq!(few.truncated_hint(), None);

        let many: Vec<_> = (0..8)
            .map(|n| PackageRecord::new(format!("pkg-{n}"), Map::new()).unwrap())
            .collect();
        let capped = DisplayPackages::from_matches(&filter(&many, "pkg"), false);
        assert_eq!(
            capped.truncated_hint().as_deref(),
            Some("Showing at most 5 matches. Refine the query to narrow them down.")
        );
        assert!(DisplayPackages::from_records(&[]).is_empty());
    }
}
