//! Plain-text rendering of countries for the terminal.

use crate::country::types::Country;

const NAME_WIDTH: usize = 28;
const CAPITAL_WIDTH: usize = 20;
const REGION_WIDTH: usize = 10;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// One line per country under a header row.
pub fn country_table(countries: &[Country]) -> String {
  if countries.is_empty() {
    return "No countries".to_string();
  }

  let mut lines = Vec::with_capacity(countries.len() + 1);
  lines.push(format!(
    "{:<NAME_WIDTH$}  {:<CAPITAL_WIDTH$}  {:<REGION_WIDTH$}  {:>13}",
    "NAME", "CAPITAL", "REGION", "POPULATION"
  ));

  for country in countries {
    lines.push(format!(
      "{:<NAME_WIDTH$}  {:<CAPITAL_WIDTH$}  {:<REGION_WIDTH$}  {:>13}",
      truncate(&country.name.common, NAME_WIDTH),
      truncate(country.capital.as_deref().unwrap_or("-"), CAPITAL_WIDTH),
      truncate(&country.region, REGION_WIDTH),
      country.formatted_population(),
    ));
  }

  lines.join("\n")
}

/// Multi-line detail view.
pub fn country_details(country: &Country) -> String {
  let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
  let languages = if country.languages.is_empty() {
    "-".to_string()
  } else {
    country.languages.join(", ")
  };

  [
    country.name.common.clone(),
    format!("  Official name: {}", country.name.official),
    format!("  Capital:       {}", or_dash(country.capital.clone())),
    format!("  Region:        {}", country.region),
    format!("  Population:    {}", country.formatted_population()),
    format!("  Area:          {}", or_dash(country.formatted_area())),
    format!(
      "  Currency:      {}",
      or_dash(country.currency.as_ref().map(|c| c.formatted()))
    ),
    format!("  Languages:     {}", languages),
    format!(
      "  Coordinates:   {}",
      or_dash(country.coordinates.map(|c| c.formatted()))
    ),
    format!("  Flag:          {}", or_dash(country.flag_url.clone())),
  ]
  .join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::country::types::{Coordinates, CountryName, Currency};

  fn france() -> Country {
    Country {
      id: "France".to_string(),
      name: CountryName {
        common: "France".to_string(),
        official: "French Republic".to_string(),
      },
      capital: Some("Paris".to_string()),
      currency: Some(Currency {
        name: "Euro".to_string(),
        symbol: "€".to_string(),
      }),
      languages: vec!["French".to_string()],
      flag_url: Some("https://flagcdn.com/w320/fr.png".to_string()),
      coordinates: Some(Coordinates {
        latitude: 46.0,
        longitude: 2.0,
      }),
      population: 67_391_582,
      area: Some(551_695.0),
      region: "Europe".to_string(),
    }
  }

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_counts_chars() {
    assert_eq!(truncate("Côte d'Ivoire", 8), "Côte...");
  }

  #[test]
  fn test_table() {
    let table = country_table(&[france()]);
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("NAME"));
    assert!(lines[1].starts_with("France"));
    assert!(lines[1].contains("Paris"));
    assert!(lines[1].ends_with("67,391,582"));
  }

  #[test]
  fn test_empty_table() {
    assert_eq!(country_table(&[]), "No countries");
  }

  #[test]
  fn test_details() {
    let details = country_details(&france());
    assert!(details.contains("Official name: French Republic"));
    assert!(details.contains("Area:          551,695 km²"));
    assert!(details.contains("Currency:      Euro (€)"));
    assert!(details.contains("Coordinates:   46°, 2°"));
  }

  #[test]
  fn test_details_missing_fields() {
    let mut country = france();
    country.capital = None;
    country.currency = None;
    country.languages.clear();
    let details = country_details(&country);
    assert!(details.contains("Capital:       -"));
    assert!(details.contains("Currency:      -"));
    assert!(details.contains("Languages:     -"));
  }
}
