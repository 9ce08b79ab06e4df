//! Serde-deserializable types matching REST Countries v3.1 responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::types::{Coordinates, Country, CountryName, Currency};

/// Fields requested from the `/all` endpoint, which refuses unfiltered requests.
pub const COUNTRY_FIELDS: &str = "name,capital,currencies,languages,flags,latlng,population,area,region";

#[derive(Debug, Deserialize)]
pub struct ApiName {
  #[serde(default)]
  pub common: String,
  #[serde(default)]
  pub official: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiCurrency {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub symbol: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiFlags {
  #[serde(default)]
  pub png: String,
  #[serde(default)]
  pub svg: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiCountry {
  pub name: ApiName,
  #[serde(default)]
  pub capital: Vec<String>,
  // Keyed by ISO 4217 code
  #[serde(default)]
  pub currencies: BTreeMap<String, ApiCurrency>,
  // Keyed by ISO 639-3 code
  #[serde(default)]
  pub languages: BTreeMap<String, String>,
  #[serde(default)]
  pub flags: ApiFlags,
  #[serde(default)]
  pub latlng: Vec<f64>,
  #[serde(default)]
  pub population: u64,
  pub area: Option<f64>,
  #[serde(default)]
  pub region: String,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiCountry {
  /// Map into a `Country`. Returns `None` when there is no usable common name.
  pub fn into_country(self) -> Option<Country> {
    let common = self.name.common.trim().to_string();
    if common.is_empty() {
      return None;
    }

    let flag_url = [self.flags.png, self.flags.svg]
      .into_iter()
      .find(|url| !url.is_empty());

    let coordinates = match self.latlng.as_slice() {
      [latitude, longitude, ..] => Some(Coordinates {
        latitude: *latitude,
        longitude: *longitude,
      }),
      _ => None,
    };

    Some(Country {
      id: common.clone(),
      name: CountryName {
        official: self.name.official,
        common,
      },
      capital: self.capital.into_iter().next(),
      currency: self.currencies.into_values().next().map(|c| Currency {
        name: c.name,
        symbol: c.symbol,
      }),
      languages: self.languages.into_values().collect(),
      flag_url,
      coordinates,
      population: self.population,
      area: self.area,
      region: self.region,
    })
  }
}

/// Map a response body, skipping entries that cannot become a `Country`.
pub fn into_countries(items: Vec<ApiCountry>) -> Vec<Country> {
  items.into_iter().filter_map(ApiCountry::into_country).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  const FRANCE: &str = r#"{
    "name": {
      "common": "France",
      "official": "French Republic",
      "nativeName": { "fra": { "official": "République française", "common": "France" } }
    },
    "capital": ["Paris"],
    "currencies": { "EUR": { "name": "Euro", "symbol": "€" } },
    "languages": { "fra": "French" },
    "flags": { "png": "https://flagcdn.com/w320/fr.png", "svg": "https://flagcdn.com/fr.svg", "alt": "..." },
    "latlng": [46.0, 2.0],
    "population": 67391582,
    "area": 551695.0,
    "region": "Europe"
  }"#;

  #[test]
  fn test_maps_full_entry() {
    let api: ApiCountry = serde_json::from_str(FRANCE).unwrap();
    let c = api.into_country().unwrap();

    assert_eq!(c.id, "France");
    assert_eq!(c.name.official, "French Republic");
    assert_eq!(c.capital.as_deref(), Some("Paris"));
    assert_eq!(c.currency.unwrap().formatted(), "Euro (€)");
    assert_eq!(c.languages, vec!["French"]);
    assert_eq!(c.flag_url.as_deref(), Some("https://flagcdn.com/w320/fr.png"));
    assert_eq!(
      c.coordinates,
      Some(Coordinates {
        latitude: 46.0,
        longitude: 2.0
      })
    );
    assert_eq!(c.population, 67_391_582);
    assert_eq!(c.area, Some(551_695.0));
    assert_eq!(c.region, "Europe");
  }

  #[test]
  fn test_maps_sparse_entry() {
    let json = r#"{
      "name": { "common": "Antarctica", "official": "Antarctica" },
      "flags": { "png": "", "svg": "https://flagcdn.com/aq.svg" },
      "latlng": [-90.0],
      "population": 1000,
      "region": "Antarctic"
    }"#;
    let c = serde_json::from_str::<ApiCountry>(json)
      .unwrap()
      .into_country()
      .unwrap();

    assert_eq!(c.capital, None);
    assert_eq!(c.currency, None);
    assert!(c.languages.is_empty());
    assert_eq!(c.flag_url.as_deref(), Some("https://flagcdn.com/aq.svg"));
    assert_eq!(c.coordinates, None);
    assert_eq!(c.area, None);
  }

  #[test]
  fn test_first_currency_by_code() {
    let json = r#"{
      "name": { "common": "Panama", "official": "Republic of Panama" },
      "currencies": {
        "USD": { "name": "United States dollar", "symbol": "$" },
        "PAB": { "name": "Panamanian balboa", "symbol": "B/." }
      },
      "population": 4314768,
      "region": "Americas"
    }"#;
    let c = serde_json::from_str::<ApiCountry>(json)
      .unwrap()
      .into_country()
      .unwrap();

    assert_eq!(c.currency.unwrap().name, "Panamanian balboa");
  }

  #[test]
  fn test_blank_name_is_skipped() {
    let json = r#"[
      { "name": { "common": "  ", "official": "Nowhere" }, "population": 1, "region": "" },
      { "name": { "common": "Japan", "official": "Japan" }, "population": 2, "region": "Asia" }
    ]"#;
    let items: Vec<ApiCountry> = serde_json::from_str(json).unwrap();
    let countries = into_countries(items);

    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0].id, "Japan");
  }
}
