//! Per-country, per-year indicator records.
//!
//! Records arrive either as a JSON array of objects or as a CSV table with
//! a header row naming the same fields. Values are loosely typed: numbers
//! may arrive as JSON numbers, numeric strings, or null. Anything that is
//! not a finite number is kept as an explicit `None`, never coerced to zero.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{LoadError, LoadResult};

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub country: String,
    pub continent: Option<String>,
    pub year: i32,
    pub life_exp: Option<f64>,
    pub pop: Option<f64>,
    pub gdp_percap: Option<f64>,
}

impl Record {
    /// All three plotted indicators are present.
    pub fn is_complete(&self) -> bool {
        self.life_exp.is_some() && self.pop.is_some() && self.gdp_percap.is_some()
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    country: Value,
    #[serde(default)]
    continent: Value,
    #[serde(default)]
    year: Value,
    #[serde(default, rename = "lifeExp")]
    life_exp: Value,
    #[serde(default)]
    pop: Value,
    #[serde(default, rename = "gdpPercap")]
    gdp_percap: Value,
}

pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn coerce_year(value: &Value) -> Option<i32> {
    let n = coerce_number(value)?;
    if n.fract() != 0.0 || n < i32::MIN as f64 || n > i32::MAX as f64 {
        return None;
    }
    Some(n as i32)
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Splits one CSV line, honouring double-quoted fields with `""` escapes.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }
    fields.push(field);
    fields
}

fn parse_table(text: &str) -> LoadResult<Vec<RawRecord>> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .map(split_row)
        .ok_or_else(|| LoadError::Table("empty document".to_string()))?;
    let column = |name: &str| header.iter().position(|h| h.trim() == name);
    if column("country").is_none() || column("year").is_none() {
        return Err(LoadError::Table(format!("header {:?} lacks country or year", header)));
    }
    let columns = ["country", "continent", "year", "lifeExp", "pop", "gdpPercap"].map(column);
    Ok(lines
        .map(|line| {
            let row = split_row(line);
            let [country, continent, year, life_exp, pop, gdp_percap] = columns.map(|c| {
                c.and_then(|i| row.get(i))
                    .map(|v| Value::String(v.clone()))
                    .unwrap_or(Value::Null)
            });
            RawRecord { country, continent, year, life_exp, pop, gdp_percap }
        })
        .collect())
}

/// Decodes a JSON array of records, or a CSV table when the text is not JSON.
pub fn parse_records(text: &str) -> LoadResult<Vec<Record>> {
    let raw: Vec<RawRecord> = if text.trim_start().starts_with(['[', '{']) {
        serde_json::from_str(text).map_err(|source| LoadError::Json { what: "records", source })?
    } else {
        parse_table(text)?
    };
    let mut records = Vec::with_capacity(raw.len());
    let mut skipped = 0usize;
    for r in raw {
        let (Some(country), Some(year)) = (coerce_text(&r.country), coerce_year(&r.year)) else {
            skipped += 1;
            continue;
        };
        records.push(Record {
            country,
            continent: coerce_text(&r.continent),
            year,
            life_exp: coerce_number(&r.life_exp),
            pop: coerce_number(&r.pop),
            gdp_percap: coerce_number(&r.gdp_percap),
        });
    }
    if skipped > 0 {
        log::warn!("skipped {} records without a usable country or year", skipped);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_mixed_numeric_values() {
        let json = r#"[
            {"country": "Chad", "continent": "Africa", "year": "1952",
             "lifeExp": "38.09", "pop": 2682462, "gdpPercap": null},
            {"country": "Peru", "continent": null, "year": 1957,
             "lifeExp": "n/a", "pop": "", "gdpPercap": 4245.2}
        ]"#;
        let records = parse_records(json).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].year, 1952);
        assert_eq!(records[0].life_exp, Some(38.09));
        assert_eq!(records[0].pop, Some(2682462.0));
        assert_eq!(records[0].gdp_percap, None);
        assert!(!records[0].is_complete());

        assert_eq!(records[1].continent, None);
        assert_eq!(records[1].life_exp, None);
        assert_eq!(records[1].pop, None);
        assert_eq!(records[1].gdp_percap, Some(4245.2));
    }

    #[test]
    fn missing_is_not_zero() {
        let records = parse_records(r#"[{"country": "X", "year": 2000}]"#).unwrap();
        assert_eq!(records[0].gdp_percap, None);
        assert_eq!(records[0].life_exp, None);
    }

    #[test]
    fn skips_records_without_year_or_country() {
        let json = r#"[
            {"country": "A", "year": null},
            {"country": "", "year": 1990},
            {"country": "B", "year": 1990.5},
            {"country": "C", "year": 1990}
        ]"#;
        let records = parse_records(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].country, "C");
    }

    #[test]
    fn reads_csv_tables() {
        let csv = "country,year,pop,continent,lifeExp,gdpPercap\r\n\
                   Afghanistan,1952,8425333,Asia,28.801,779.4453145\r\n\
                   \"Korea, Dem. Rep.\",1957,9411381,Asia,,1571.134655\r\n\
                   ,1962,1,Asia,30,700\r\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].country, "Afghanistan");
        assert_eq!(records[0].continent.as_deref(), Some("Asia"));
        assert_eq!(records[0].pop, Some(8425333.0));
        assert_eq!(records[0].gdp_percap, Some(779.4453145));
        assert_eq!(records[1].country, "Korea, Dem. Rep.");
        assert_eq!(records[1].year, 1957);
        assert_eq!(records[1].life_exp, None);
    }

    #[test]
    fn csv_without_required_columns_is_rejected() {
        assert!(matches!(parse_records("name,when\nA,1990\n"), Err(LoadError::Table(_))));
        assert!(matches!(parse_records("   "), Err(LoadError::Table(_))));
    }

    #[test]
    fn splits_quoted_fields() {
        assert_eq!(split_row(r#"a,"b, c","say ""hi""",,"#), vec!["a", "b, c", r#"say "hi""#, "", ""]);
    }

    #[test]
    fn rejects_non_array_document() {
        assert!(matches!(parse_records("{}"), Err(LoadError::Json { .. })));
    }
}
