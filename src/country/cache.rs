//! Caching implementations for country types.

use crate::cache::{Cacheable, Searchable};

use super::types::Country;

impl Cacheable for Country {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn collection() -> &'static str {
    "countries"
  }
}

impl Searchable for Country {
  /// Matches common name, official name, capital or region.
  fn matches(&self, query: &str) -> bool {
    let query = query.to_lowercase();
    self.name.common.to_lowercase().contains(&query)
      || self.name.official.to_lowercase().contains(&query)
      || self
        .capital
        .as_ref()
        .is_some_and(|c| c.to_lowercase().contains(&query))
      || self.region.to_lowercase().contains(&query)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::country::types::CountryName;

  fn japan() -> Country {
    Country {
      id: "Japan".to_string(),
      name: CountryName {
        common: "Japan".to_string(),
        official: "Japan".to_string(),
      },
      capital: Some("Tokyo".to_string()),
      currency: None,
      languages: vec!["Japanese".to_string()],
      flag_url: None,
      coordinates: None,
      population: 125_836_021,
      area: Some(377_930.0),
      region: "Asia".to_string(),
    }
  }

  #[test]
  fn test_cache_key_is_id() {
    assert_eq!(japan().cache_key(), "Japan");
    assert_eq!(Country::collection(), "countries");
  }

  #[test]
  fn test_matches_each_field_case_insensitively() {
    let c = japan();
    assert!(c.matches("JAP"));
    assert!(c.matches("tokyo"));
    assert!(c.matches("asi"));
    assert!(!c.matches("japanese")); // languages are not searched
    assert!(!c.matches("paris"));
  }

  #[test]
  fn test_missing_capital_never_matches() {
    let mut c = japan();
    c.capital = None;
    assert!(!c.matches("tokyo"));
  }
}
