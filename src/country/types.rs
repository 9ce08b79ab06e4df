use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A country, identified by its common name.
///
/// Equality and hashing only consider `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
  pub id: String,
  pub name: CountryName,
  pub capital: Option<String>,
  pub currency: Option<Currency>,
  pub languages: Vec<String>,
  pub flag_url: Option<String>,
  pub coordinates: Option<Coordinates>,
  pub population: u64,
  pub area: Option<f64>,
  pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryName {
  pub common: String,
  pub official: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
  pub name: String,
  pub symbol: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub latitude: f64,
  pub longitude: f64,
}

impl PartialEq for Country {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for Country {}

impl Hash for Country {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl Country {
  /// Population with thousands separators, e.g. "67,391,582"
  pub fn formatted_population(&self) -> String {
    group_thousands(&self.population.to_string())
  }

  /// Area in km² with thousands separators and at most two decimals
  pub fn formatted_area(&self) -> Option<String> {
    self.area.map(|area| format!("{} km²", format_decimal(area, 2)))
  }
}

impl Currency {
  /// "Euro (€)"
  pub fn formatted(&self) -> String {
    format!("{} ({})", self.name, self.symbol)
  }
}

impl Coordinates {
  /// "48.86°, 2.35°"
  pub fn formatted(&self) -> String {
    format!(
      "{}°, {}°",
      format_decimal(self.latitude, 2),
      format_decimal(self.longitude, 2)
    )
  }
}

/// Format with at most `max_fraction` decimals, trailing zeros trimmed,
/// and thousands separators in the integer part.
fn format_decimal(value: f64, max_fraction: usize) -> String {
  let fixed = format!("{:.*}", max_fraction, value.abs());
  let (int_part, frac_part) = match fixed.split_once('.') {
    Some((i, f)) => (i, f.trim_end_matches('0')),
    None => (fixed.as_str(), ""),
  };

  let mut out = String::new();
  if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
    out.push('-');
  }
  out.push_str(&group_thousands(int_part));
  if !frac_part.is_empty() {
    out.push('.');
    out.push_str(frac_part);
  }
  out
}

fn group_thousands(digits: &str) -> String {
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  fn country(id: &str) -> Country {
    Country {
      id: id.to_string(),
      name: CountryName {
        common: id.to_string(),
        official: format!("Republic of {}", id),
      },
      capital: None,
      currency: None,
      languages: Vec::new(),
      flag_url: None,
      coordinates: None,
      population: 0,
      area: None,
      region: String::new(),
    }
  }

  #[test]
  fn test_equality_and_hash_use_id_only() {
    let a = country("France");
    let mut b = country("France");
    b.population = 67_391_582;
    b.region = "Europe".to_string();

    assert_eq!(a, b);
    assert_ne!(a, country("Japan"));

    let set: HashSet<Country> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
  }

  #[test]
  fn test_formatted_population() {
    let mut c = country("United States");
    c.population = 331_002_651;
    assert_eq!(c.formatted_population(), "331,002,651");

    c.population = 999;
    assert_eq!(c.formatted_population(), "999");

    c.population = 1000;
    assert_eq!(c.formatted_population(), "1,000");
  }

  #[test]
  fn test_formatted_area() {
    let mut c = country("France");
    assert_eq!(c.formatted_area(), None);

    c.area = Some(551_695.0);
    assert_eq!(c.formatted_area().as_deref(), Some("551,695 km²"));

    c.area = Some(0.44);
    assert_eq!(c.formatted_area().as_deref(), Some("0.44 km²"));

    c.area = Some(1234.567);
    assert_eq!(c.formatted_area().as_deref(), Some("1,234.57 km²"));
  }

  #[test]
  fn test_currency_formatted() {
    let currency = Currency {
      name: "Euro".to_string(),
      symbol: "€".to_string(),
    };
    assert_eq!(currency.formatted(), "Euro (€)");
  }

  #[test]
  fn test_coordinates_formatted() {
    let coords = Coordinates {
      latitude: 46.0,
      longitude: 2.0,
    };
    assert_eq!(coords.formatted(), "46°, 2°");

    let coords = Coordinates {
      latitude: -34.6037,
      longitude: -58.3816,
    };
    assert_eq!(coords.formatted(), "-34.6°, -58.38°");
  }

  #[test]
  fn test_serde_round_trip_is_lossless() {
    let mut c = country("Japan");
    c.capital = Some("Tokyo".to_string());
    c.currency = Some(Currency {
      name: "Japanese yen".to_string(),
      symbol: "¥".to_string(),
    });
    c.languages = vec!["Japanese".to_string()];
    c.flag_url = Some("https://flagcdn.com/w320/jp.png".to_string());
    c.coordinates = Some(Coordinates {
      latitude: 36.0,
      longitude: 138.0,
    });
    c.population = 125_836_021;
    c.area = Some(377_930.0);
    c.region = "Asia".to_string();

    let json = serde_json::to_string(&c).unwrap();
    let back: Country = serde_json::from_str(&json).unwrap();

    assert_eq!(back.name, c.name);
    assert_eq!(back.capital, c.capital);
    assert_eq!(back.currency, c.currency);
    assert_eq!(back.languages, c.languages);
    assert_eq!(back.flag_url, c.flag_url);
    assert_eq!(back.coordinates, c.coordinates);
    assert_eq!(back.population, c.population);
    assert_eq!(back.area, c.area);
    assert_eq!(back.region, c.region);
  }
}
