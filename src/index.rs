//! Indices derived once from the loaded records.
//!
//! Sorted year list, per-year groupings, global extents for the scale
//! domains, and the country-name lookup used to pair boundary features
//! with records.

use std::collections::{BTreeMap, BTreeSet};

use crate::data::Record;
use crate::error::{LoadError, LoadResult};

/// Boundary names that differ from the record names, both sides normalized.
pub const NAME_ALIASES: &[(&str, &str)] = &[
    ("united states of america", "united states"),
    ("dem. rep. congo", "congo, dem. rep."),
    ("democratic republic of the congo", "congo, dem. rep."),
    ("congo", "congo, rep."),
    ("republic of the congo", "congo, rep."),
    ("central african rep.", "central african republic"),
    ("côte d'ivoire", "cote d'ivoire"),
    ("ivory coast", "cote d'ivoire"),
    ("dominican rep.", "dominican republic"),
    ("bosnia and herz.", "bosnia and herzegovina"),
    ("eq. guinea", "equatorial guinea"),
    ("czechia", "czech republic"),
    ("slovakia", "slovak republic"),
    ("north korea", "korea, dem. rep."),
    ("south korea", "korea, rep."),
    ("yemen", "yemen, rep."),
    ("eswatini", "swaziland"),
    ("macedonia", "macedonia, fyr"),
    ("north macedonia", "macedonia, fyr"),
    ("s. sudan", "south sudan"),
    ("w. sahara", "western sahara"),
    ("palestine", "west bank and gaza"),
    ("hong kong", "hong kong, china"),
];

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |acc, v| match acc {
            None => Some(Extent { min: v, max: v }),
            Some(e) => Some(Extent { min: e.min.min(v), max: e.max.max(v) }),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    /// Positive GDP values only; the wealth channel is logarithmic.
    pub gdp: Option<Extent>,
    pub life: Option<Extent>,
    pub pop: Option<Extent>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NameMatch {
    Exact(String),
    Alias(String),
    Substring(String),
    Unmatched,
}

impl NameMatch {
    pub fn key(&self) -> Option<&str> {
        match self {
            NameMatch::Exact(k) | NameMatch::Alias(k) | NameMatch::Substring(k) => Some(k),
            NameMatch::Unmatched => None,
        }
    }
}

pub struct DerivedIndex {
    pub years: Vec<i32>,
    pub by_year: BTreeMap<i32, Vec<Record>>,
    pub extents: Extents,
    /// Normalized country name -> year -> record.
    pub by_country: BTreeMap<String, BTreeMap<i32, Record>>,
    /// Every distinct country name as it appears in the records, sorted.
    pub countries: Vec<String>,
    pub continents: Vec<String>,
}

impl DerivedIndex {
    pub fn build(records: &[Record]) -> LoadResult<Self> {
        let years: Vec<i32> = records.iter().map(|r| r.year).collect::<BTreeSet<_>>().into_iter().collect();
        if years.is_empty() {
            return Err(LoadError::NoYears);
        }

        let mut by_year: BTreeMap<i32, Vec<Record>> = BTreeMap::new();
        let mut by_country: BTreeMap<String, BTreeMap<i32, Record>> = BTreeMap::new();
        let mut countries = BTreeSet::new();
        let mut continents = BTreeSet::new();
        for r in records {
            by_year.entry(r.year).or_default().push(r.clone());
            by_country.entry(normalize_name(&r.country)).or_default().insert(r.year, r.clone());
            countries.insert(r.country.clone());
            if let Some(c) = &r.continent {
                continents.insert(c.clone());
            }
        }

        let extents = Extents {
            gdp: Extent::of(records.iter().filter_map(|r| r.gdp_percap).filter(|&g| g > 0.0)),
            life: Extent::of(records.iter().filter_map(|r| r.life_exp)),
            pop: Extent::of(records.iter().filter_map(|r| r.pop)),
        };

        Ok(Self {
            years,
            by_year,
            extents,
            by_country,
            countries: countries.into_iter().collect(),
            continents: continents.into_iter().collect(),
        })
    }

    pub fn year_position(&self, year: i32) -> Option<usize> {
        self.years.binary_search(&year).ok()
    }

    pub fn record(&self, country: &str, year: i32) -> Option<&Record> {
        self.by_country.get(&normalize_name(country))?.get(&year)
    }

    /// Continent of a country, taken from its first record that names one.
    pub fn continent_of(&self, country: &str) -> Option<&str> {
        self.by_country
            .get(&normalize_name(country))?
            .values()
            .find_map(|r| r.continent.as_deref())
    }

    /// Pairs a boundary feature name with a record country.
    ///
    /// Exact normalized match first, then the alias table, then a substring
    /// match that is accepted only when a single record name qualifies.
    pub fn match_name(&self, feature_name: &str) -> NameMatch {
        let key = normalize_name(feature_name);
        if key.is_empty() {
            return NameMatch::Unmatched;
        }
        if self.by_country.contains_key(&key) {
            return NameMatch::Exact(key);
        }
        if let Some((_, target)) = NAME_ALIASES.iter().find(|(from, _)| *from == key) {
            if self.by_country.contains_key(*target) {
                return NameMatch::Alias(target.to_string());
            }
        }
        let candidates: Vec<&String> = self
            .by_country
            .keys()
            .filter(|k| k.contains(key.as_str()) || key.contains(k.as_str()))
            .collect();
        match candidates.as_slice() {
            [only] => NameMatch::Substring((*only).clone()),
            [] => NameMatch::Unmatched,
            many => {
                log::warn!("ambiguous name match for {:?}: {} candidates, leaving unmatched", feature_name, many.len());
                NameMatch::Unmatched
            }
        }
    }
}
