//! Secondary filters applied to a scraped batch.
//!
//! The site handles keyword/location/classification through the URL; salary,
//! job type, category and ordering are applied here. This is the only place
//! salary text is turned into numbers.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::aggregate::category_of;
use crate::model::JobRecord;
use crate::text::{normalize, slugify};

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d.,]*)\s*(jt|juta|rb|ribu|k)?\b").expect("static pattern")
});

static AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d+)\+?\s*(menit|minutes?|mins?|m|jam|hours?|h|hari|days?|d|minggu|weeks?|bulan|months?)\b",
    )
    .expect("static pattern")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Document order, as the site ranked it.
    #[default]
    Relevance,
    Latest,
    Salary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub salary_min: Option<u64>,
    pub job_type: Option<String>,
    pub category: Option<String>,
    pub sort: SortOrder,
}

impl SearchFilter {
    pub fn is_noop(&self) -> bool {
        self.salary_min.is_none()
            && self.job_type.is_none()
            && self.category.is_none()
            && self.sort == SortOrder::Relevance
    }

    pub fn apply(&self, records: Vec<JobRecord>) -> Vec<JobRecord> {
        let job_type = self.job_type.as_deref().map(slugify).filter(|s| !s.is_empty());
        let category = self.category.as_deref().map(normalize).filter(|s| !s.is_empty());

        let mut kept: Vec<JobRecord> = records
            .into_iter()
            .filter(|r| match self.salary_min {
                Some(min) => parse_salary_bounds(r.salary_range.as_deref())
                    .is_some_and(|(low, high)| high.unwrap_or(low) >= min),
                None => true,
            })
            .filter(|r| match &job_type {
                Some(wanted) => {
                    let hay = format!("{} {}", r.job_type.as_deref().unwrap_or_default(), r.title);
                    slugify(&hay).contains(wanted.as_str())
                }
                None => true,
            })
            .filter(|r| match &category {
                Some(wanted) => normalize(category_of(r).as_str()).contains(wanted.as_str()),
                None => true,
            })
            .collect();

        match self.sort {
            SortOrder::Relevance => {}
            // unknown ages and salaries sort last; sort_by_key is stable
            SortOrder::Latest => {
                kept.sort_by_key(|r| posted_age_minutes(&r.posted_label).unwrap_or(u64::MAX))
            }
            SortOrder::Salary => kept.sort_by_key(|r| {
                std::cmp::Reverse(
                    parse_salary_bounds(r.salary_range.as_deref()).map(|(low, _)| low),
                )
            }),
        }
        kept
    }
}

/// `(low, high)` in rupiah from text like `Rp 5.000.000 – Rp 7.500.000 per month`.
/// `high` is `None` for a single figure.
pub fn parse_salary_bounds(text: Option<&str>) -> Option<(u64, Option<u64>)> {
    let mut amounts = AMOUNT.captures_iter(text?).filter_map(|c| {
        let unit = match c.get(2).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
            Some("jt" | "juta") => 1_000_000,
            Some("rb" | "ribu" | "k") => 1_000,
            _ => 1,
        };
        amount(c.get(1)?.as_str(), unit)
    });
    let low = amounts.next()?;
    let high = amounts.next();
    Some((low, high))
}

/// `digits` scaled by `unit`. A one- or two-digit tail after the last
/// separator is a fraction: cents without a unit, `5,5 jt` with one.
fn amount(digits: &str, unit: u64) -> Option<u64> {
    let (whole, frac) = match digits.rsplit_once([',', '.']) {
        Some((head, tail)) if (1..=2).contains(&tail.len()) => (head, tail),
        _ => (digits, ""),
    };
    let whole: u64 = whole
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()?;
    let mut value = whole.saturating_mul(unit);
    if unit > 1 && !frac.is_empty() {
        let scale = 10u64.pow(frac.len() as u32);
        value = value.saturating_add(frac.parse::<u64>().ok()?.saturating_mul(unit) / scale);
    }
    Some(value)
}

/// Minutes since posting, read from a relative label. `None` when unknown.
pub fn posted_age_minutes(label: &str) -> Option<u64> {
    let key = normalize(label);
    let fresh = ["baru saja", "just now", "recently", "hari ini", "today"];
    if fresh.iter().any(|w| key.contains(w)) {
        return Some(0);
    }
    if key.contains("kemarin") || key.contains("yesterday") {
        return Some(24 * 60);
    }
    if key.contains("more than") {
        return Some(30 * 24 * 60 + 1);
    }
    let caps = AGE.captures(&key)?;
    let n: u64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str();
    let per = match unit {
        "menit" | "m" => 1,
        u if u.starts_with("min") => 1,
        "jam" | "h" => 60,
        u if u.starts_with("hour") => 60,
        "hari" | "d" => 24 * 60,
        u if u.starts_with("day") => 24 * 60,
        "minggu" => 7 * 24 * 60,
        u if u.starts_with("week") => 7 * 24 * 60,
        _ => 30 * 24 * 60,
    };
    Some(n.saturating_mul(per))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample_records;

    fn rec(title: &str, salary: Option<&str>, posted: &str, job_type: &str) -> JobRecord {
        let mut r = sample_records("https://example.com").remove(0);
        r.title = title.into();
        r.salary_range = salary.map(str::to_string);
        r.posted_label = posted.into();
        r.job_type = Some(job_type.into());
        r
    }

    fn titles(records: &[JobRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn salary_text_parses_to_bounds() {
        assert_eq!(
            parse_salary_bounds(Some("Rp 5.000.000 – Rp 5.750.000 per month")),
            Some((5_000_000, Some(5_750_000)))
        );
        assert_eq!(parse_salary_bounds(Some("Rp 4.500.000 per month")), Some((4_500_000, None)));
        assert_eq!(
            parse_salary_bounds(Some("Rp 8 jt - 12 jt per bulan")),
            Some((8_000_000, Some(12_000_000)))
        );
        assert_eq!(parse_salary_bounds(Some("Rp 3.200.000,00 per month")), Some((3_200_000, None)));
        assert_eq!(parse_salary_bounds(Some("Kompetitif")), None);
    }

    #[test]
    fn decimal_amounts_with_units() {
        assert_eq!(
            parse_salary_bounds(Some("Rp 5.5 jt - 7.5 jt per bulan")),
            Some((5_500_000, Some(7_500_000)))
        );
        assert_eq!(parse_salary_bounds(Some("Rp 5,5 juta per bulan")), Some((5_500_000, None)));
        assert_eq!(parse_salary_bounds(Some("Rp 7,25 jt per bulan")), Some((7_250_000, None)));
        assert_eq!(parse_salary_bounds(Some("Rp 850 rb per minggu")), Some((850_000, None)));
        assert_eq!(parse_salary_bounds(Some("Rp 1.500 rb per bulan")), Some((1_500_000, None)));

        let records = vec![
            rec("Kasir", Some("Rp 4,5 jt per bulan"), "N/A", "Full time"),
            rec("Analis", Some("Rp 5,5 jt per bulan"), "N/A", "Full time"),
        ];
        let filter = SearchFilter {
            salary_min: Some(5_000_000),
            ..SearchFilter::default()
        };
        assert_eq!(titles(&filter.apply(records)), ["Analis"]);
        assert_eq!(parse_salary_bounds(None), None);
    }

    #[test]
    fn relative_labels_to_minutes() {
        assert_eq!(posted_age_minutes("Baru saja"), Some(0));
        assert_eq!(posted_age_minutes("Recently"), Some(0));
        assert_eq!(posted_age_minutes("4 jam yang lalu"), Some(240));
        assert_eq!(posted_age_minutes("2 hari yang lalu"), Some(2880));
        assert_eq!(posted_age_minutes("30+ hari yang lalu"), Some(30 * 1440));
        assert_eq!(posted_age_minutes("3d ago"), Some(3 * 1440));
        assert_eq!(posted_age_minutes("Kemarin"), Some(1440));
        assert_eq!(posted_age_minutes("N/A"), None);
    }

    #[test]
    fn salary_min_excludes_unknown_and_low() {
        let records = vec![
            rec("Kasir", Some("Rp 3.000.000 – Rp 4.000.000 per month"), "N/A", "Full time"),
            rec("Analis", Some("Rp 6.000.000 – Rp 9.000.000 per month"), "N/A", "Full time"),
            rec("Staf", None, "N/A", "Full time"),
            rec("Supervisor", Some("Rp 5.000.000 per month"), "N/A", "Full time"),
        ];
        let filter = SearchFilter {
            salary_min: Some(5_000_000),
            ..SearchFilter::default()
        };
        assert_eq!(titles(&filter.apply(records)), ["Analis", "Supervisor"]);
    }

    #[test]
    fn job_type_and_category_match_loosely() {
        let records = vec![
            rec("Software Engineer", None, "N/A", "Full time"),
            rec("Graphic Designer", None, "N/A", "Kontrak"),
            rec("Backend Developer", None, "N/A", "Part time"),
        ];
        let filter = SearchFilter {
            job_type: Some("full-time".into()),
            ..SearchFilter::default()
        };
        assert_eq!(titles(&filter.apply(records.clone())), ["Software Engineer"]);

        let filter = SearchFilter {
            category: Some("it".into()),
            ..SearchFilter::default()
        };
        assert_eq!(titles(&filter.apply(records)), ["Software Engineer", "Backend Developer"]);
    }

    #[test]
    fn sorting_puts_unknowns_last() {
        let records = vec![
            rec("A", None, "N/A", "x"),
            rec("B", Some("Rp 4.000.000 per month"), "5 hari yang lalu", "x"),
            rec("C", Some("Rp 9.000.000 per month"), "1 jam yang lalu", "x"),
        ];
        let latest = SearchFilter {
            sort: SortOrder::Latest,
            ..SearchFilter::default()
        };
        assert_eq!(titles(&latest.apply(records.clone())), ["C", "B", "A"]);

        let salary = SearchFilter {
            sort: SortOrder::Salary,
            ..SearchFilter::default()
        };
        assert_eq!(titles(&salary.apply(records)), ["C", "B", "A"]);
        assert!(SearchFilter::default().is_noop());
    }
}
