use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::model::{DEFAULT_LOCATION, JobRecord, UNKNOWN_POSTED};
use crate::text::{clean_text, normalize};

pub const GENERAL_CATEGORY: &str = "Umum";

/// Keyword table for records the site left unclassified. First match wins.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "IT",
        &[
            "developer", "programmer", "software", "engineer", "web", "mobile", "frontend",
            "backend", "fullstack", "devops", "data scientist", "qa", "testing", "it support",
            "system",
        ],
    ),
    ("Design", &["designer", "design", "ui/ux", "graphic", "visual", "creative"]),
    (
        "Marketing",
        &["marketing", "digital marketing", "seo", "content", "social media", "brand"],
    ),
    ("Sales", &["sales", "business development", "account executive"]),
    (
        "Finance",
        &["finance", "accounting", "akuntan", "financial analyst", "tax"],
    ),
    ("HR", &["hr", "human resource", "recruitment", "talent"]),
    (
        "Customer Service",
        &["customer service", "support", "cs", "help desk"],
    ),
    (
        "Operations",
        &["operations", "operational", "logistic", "supply chain"],
    ),
    (
        "Management",
        &["manager", "director", "head of", "lead", "supervisor"],
    ),
    ("Education", &["teacher", "guru", "education", "training", "tutor"]),
    ("Healthcare", &["doctor", "nurse", "medical", "pharmacy"]),
    (
        "Engineering",
        &["engineering", "civil engineer", "mechanical", "electrical"],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Category distribution, count descending, ties in first-seen order.
pub fn aggregate(records: &[JobRecord]) -> Vec<CategoryCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<CategoryCount> = Vec::new();
    for record in records {
        let name = category_of(record);
        match index.get(&name) {
            Some(&i) => out[i].count += 1,
            None => {
                index.insert(name.clone(), out.len());
                out.push(CategoryCount { name, count: 1 });
            }
        }
    }
    // stable: equal counts keep insertion order
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Site classification when present, keyword guess otherwise.
pub fn category_of(record: &JobRecord) -> String {
    match record.classification.as_deref().map(clean_text) {
        Some(label) if !label.is_empty() => label,
        _ => infer_category(&record.title).to_string(),
    }
}

/// Keyword guess over a title. Short keywords match whole words only.
pub fn infer_category(title: &str) -> &'static str {
    let title = normalize(title);
    let words: Vec<&str> = title
        .split(|c: char| !c.is_alphanumeric() && c != '/')
        .filter(|w| !w.is_empty())
        .collect();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            keywords.iter().any(|kw| {
                if kw.len() <= 3 {
                    words.contains(kw)
                } else {
                    title.contains(kw)
                }
            })
        })
        .map(|(name, _)| *name)
        .unwrap_or(GENERAL_CATEGORY)
}

/// Sorted distinct locations; sentinels excluded.
pub fn distinct_locations(records: &[JobRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| clean_text(&r.location))
        .filter(|l| !l.is_empty() && l != UNKNOWN_POSTED && l != DEFAULT_LOCATION)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample_records;

    fn record(title: &str, classification: Option<&str>, location: &str) -> JobRecord {
        let mut r = sample_records("https://example.com").remove(0);
        r.title = title.to_string();
        r.classification = classification.map(str::to_string);
        r.location = location.to_string();
        r
    }

    #[test]
    fn counts_sorted_descending() {
        let records = [
            record("A", Some("IT"), "Jakarta"),
            record("B", Some("IT"), "Jakarta"),
            record("C", Some("Sales"), "Jakarta"),
        ];
        assert_eq!(
            aggregate(&records),
            vec![
                CategoryCount { name: "IT".into(), count: 2 },
                CategoryCount { name: "Sales".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let records = [
            record("A", Some("Retail"), "x"),
            record("B", Some("Hospitality"), "x"),
            record("C", Some("Hospitality"), "x"),
            record("D", Some("Retail"), "x"),
            record("E", Some("Logistics"), "x"),
        ];
        let names: Vec<_> = aggregate(&records).into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Retail", "Hospitality", "Logistics"]);
    }

    #[test]
    fn unclassified_records_are_inferred() {
        assert_eq!(infer_category("Senior Backend Developer"), "IT");
        assert_eq!(infer_category("Graphic Designer"), "Design");
        assert_eq!(infer_category("Guru Bahasa Inggris"), "Education");
        assert_eq!(infer_category("HR Generalist"), "HR");
        // "cs" is a whole word, not a substring of "physics"
        assert_eq!(infer_category("Physics Tutor"), "Education");
        assert_eq!(infer_category("Barista"), GENERAL_CATEGORY);

        let records = [record("Akuntan Pajak", None, "x"), record("Kasir", Some("  "), "x")];
        let names: Vec<_> = aggregate(&records).into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Finance", GENERAL_CATEGORY]);
    }

    #[test]
    fn locations_are_distinct_and_sorted() {
        let records = [
            record("A", None, "Surabaya"),
            record("B", None, "Bandung"),
            record("C", None, " Surabaya "),
            record("D", None, "Indonesia"),
            record("E", None, "N/A"),
        ];
        assert_eq!(distinct_locations(&records), ["Bandung", "Surabaya"]);
    }
}
