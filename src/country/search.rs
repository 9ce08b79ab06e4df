//! In-memory filtering and sorting over already-fetched countries.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::cache::Searchable;

use super::types::Country;

/// Sort order for country lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortCriteria {
  /// Common name, A to Z
  Name,
  /// Largest population first
  Population,
  /// Largest area first (unknown area counts as zero)
  Area,
  /// Region, A to Z
  Region,
}

impl SortCriteria {
  fn compare(&self, a: &Country, b: &Country) -> Ordering {
    match self {
      SortCriteria::Name => a.name.common.cmp(&b.name.common),
      SortCriteria::Population => b.population.cmp(&a.population),
      SortCriteria::Area => b
        .area
        .unwrap_or(0.0)
        .total_cmp(&a.area.unwrap_or(0.0)),
      SortCriteria::Region => a.region.cmp(&b.region),
    }
  }
}

impl FromStr for SortCriteria {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "name" => Ok(SortCriteria::Name),
      "population" | "pop" => Ok(SortCriteria::Population),
      "area" => Ok(SortCriteria::Area),
      "region" => Ok(SortCriteria::Region),
      other => Err(format!(
        "unknown sort criteria '{}' (expected name, population, area or region)",
        other
      )),
    }
  }
}

/// Stable sort: countries that compare equal keep their input order.
pub fn sort(countries: &[Country], criteria: SortCriteria) -> Vec<Country> {
  let mut sorted = countries.to_vec();
  sorted.sort_by(|a, b| criteria.compare(a, b));
  sorted
}

/// Countries matching `query`. An empty query returns the input unchanged.
pub fn filter(query: &str, countries: &[Country]) -> Vec<Country> {
  if query.is_empty() {
    return countries.to_vec();
  }
  countries
    .iter()
    .filter(|c| c.matches(query))
    .cloned()
    .collect()
}

/// Exact, case-insensitive match on the common name, then the official name.
pub fn find_by_name<'a>(name: &str, countries: &'a [Country]) -> Option<&'a Country> {
  let wanted = name.trim().to_lowercase();
  countries
    .iter()
    .find(|c| c.name.common.to_lowercase() == wanted)
    .or_else(|| {
      countries
        .iter()
        .find(|c| c.name.official.to_lowercase() == wanted)
    })
}
