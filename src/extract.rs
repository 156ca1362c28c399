//! Field extraction from one listing card.
//!
//! Every field is an ordered chain of [`Strategy`] steps: the most specific
//! selector or pattern first, looser ones after, then the field's default.
//! The order is a confidence ranking. When the site's markup drifts, add a
//! step rather than rewriting the extractor.

use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Selector};

use crate::error::{Error, Result};
use crate::model::{DEFAULT_LOCATION, DEFAULT_SNIPPET, UNKNOWN_COMPANY, UNKNOWN_POSTED};
use crate::text::{clean_text, normalize, truncate_chars};

/// Titles shorter than this are not job titles.
pub const MIN_TITLE_LEN: usize = 4;

const SNIPPET_MIN_CHARS: usize = 50;
const SNIPPET_MAX_CHARS: usize = 150;

/// Cities and provinces matched in card text, before any selector.
pub const GAZETTEER: &[&str] = &[
    "Jakarta Selatan",
    "Jakarta Pusat",
    "Jakarta Barat",
    "Jakarta Timur",
    "Jakarta Utara",
    "Jakarta Raya",
    "Jakarta",
    "Tangerang Selatan",
    "Tangerang",
    "Bekasi",
    "Depok",
    "Bogor",
    "Bandung",
    "Cirebon",
    "Semarang",
    "Tegal",
    "Surakarta",
    "Solo",
    "Yogyakarta",
    "Surabaya",
    "Malang",
    "Sidoarjo",
    "Denpasar",
    "Bali",
    "Medan",
    "Batam",
    "Pekanbaru",
    "Padang",
    "Palembang",
    "Lampung",
    "Balikpapan",
    "Samarinda",
    "Banjarmasin",
    "Pontianak",
    "Makassar",
    "Manado",
    "Jayapura",
    "Banten",
    "Aceh",
    "Riau",
    "Papua",
    "Jawa Barat",
    "Jawa Tengah",
    "Jawa Timur",
    "Kalimantan Barat",
    "Kalimantan Tengah",
    "Kalimantan Selatan",
    "Kalimantan Timur",
    "Kalimantan Utara",
    "Sulawesi Utara",
    "Sulawesi Tengah",
    "Sulawesi Selatan",
    "Sulawesi Tenggara",
    "Sumatera Utara",
    "Sumatera Barat",
    "Sumatera Selatan",
];

/// One step of a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Text of the first element in the card matching a CSS selector.
    Selector(String),
    /// Capture `group` of the first regex match over the card's text.
    Pattern { regex: String, group: usize },
}

impl Strategy {
    pub fn selector(css: &str) -> Self {
        Self::Selector(css.to_string())
    }

    pub fn pattern(regex: &str, group: usize) -> Self {
        Self::Pattern {
            regex: regex.to_string(),
            group,
        }
    }
}

enum Step {
    Selector(Selector),
    Pattern(Regex, usize),
}

/// A compiled strategy list.
pub struct Chain {
    steps: Vec<Step>,
}

impl Chain {
    pub fn compile(strategies: &[Strategy]) -> Result<Self> {
        let steps = strategies
            .iter()
            .map(|s| match s {
                Strategy::Selector(css) => Selector::parse(css)
                    .map(Step::Selector)
                    .map_err(|e| Error::invalid("selector", format!("{css}: {e:?}"))),
                Strategy::Pattern { regex, group } => Regex::new(regex)
                    .map(|re| Step::Pattern(re, *group))
                    .map_err(|e| Error::invalid("pattern", e.to_string())),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// First candidate, in step order, that `refine` keeps.
    pub fn first(
        &self,
        card: &Card<'_>,
        refine: impl Fn(String) -> Option<String>,
    ) -> Option<String> {
        self.steps.iter().find_map(|step| {
            let candidate = match step {
                Step::Selector(sel) => card.root.select(sel).next().map(element_text),
                Step::Pattern(re, group) => re
                    .captures(&card.text)
                    .and_then(|caps| caps.get(*group))
                    .map(|m| clean_text(m.as_str())),
            }?;
            refine(candidate)
        })
    }
}

/// The DOM subtree of one listing plus its flattened text.
pub struct Card<'a> {
    root: ElementRef<'a>,
    anchor: Option<ElementRef<'a>>,
    text: String,
}

impl<'a> Card<'a> {
    pub fn new(root: ElementRef<'a>, anchor: Option<ElementRef<'a>>) -> Self {
        Self {
            root,
            anchor,
            text: block_text(root),
        }
    }
}

/// Fields pulled from one card. `id`, URL and provenance are the
/// scraper's business.
#[derive(Debug, Clone, PartialEq)]
pub struct CardFields {
    pub title: String,
    pub company: String,
    pub location: String,
    pub classification: Option<String>,
    pub salary_range: Option<String>,
    pub posted_label: String,
    pub job_type: Option<String>,
    pub description_snippet: String,
}

pub struct Extractors {
    title: Chain,
    company: Chain,
    location: Chain,
    salary: Chain,
    posted: Chain,
    job_type: Chain,
    classification: Chain,
    gazetteer: Vec<String>,
    noise: Regex,
}

impl Default for Extractors {
    fn default() -> Self {
        Self::new(GAZETTEER).expect("built-in extraction patterns compile")
    }
}

impl Extractors {
    pub fn new(gazetteer: &[&str]) -> Result<Self> {
        let mut places: Vec<&str> = gazetteer
            .iter()
            .copied()
            .filter(|p| !p.trim().is_empty())
            .collect();
        // leftmost-first alternation: longer names must be tried first
        places.sort_by_key(|p| std::cmp::Reverse(p.len()));
        let alternation = places
            .iter()
            .map(|p| regex::escape(p.trim()).replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");

        let mut location = vec![Strategy::pattern(r"Limit results to\s+([^\]\n]+)", 1)];
        if !alternation.is_empty() {
            location.push(Strategy::pattern(&format!(r"(?i)\b({alternation})\b"), 1));
        }
        location.extend([
            Strategy::selector(r#"[data-automation="jobLocation"]"#),
            Strategy::selector(r#"[class*="location"]"#),
        ]);

        Ok(Self {
            title: Chain::compile(&[
                Strategy::selector(r#"[data-automation="jobTitle"]"#),
                Strategy::selector("h3"),
                Strategy::selector("h2"),
                Strategy::selector("h1"),
                Strategy::selector(r#"[class*="job-title"]"#),
                Strategy::selector(r#"[class*="jobTitle"]"#),
            ])?,
            company: Chain::compile(&[
                Strategy::pattern(
                    r"(?im)(?:^|\s)(?:lowongan\s+)?(?:di|at)\s+([^\n•·|]+?)(?:\s*[•·|]|\s+(?:akan|dibutuhkan|urgent)\b|\s+\d+\+?\s*(?:hari|jam|menit|minggu|bulan|days?|hours?|minutes?)\b|\s*$)",
                    1,
                ),
                Strategy::selector(r#"[data-automation="jobCompany"]"#),
                Strategy::selector(r#"[data-automation="advertiser-name"]"#),
                Strategy::selector(r#"[class*="company"]"#),
            ])?,
            location: Chain::compile(&location)?,
            salary: Chain::compile(&[Strategy::pattern(
                r"(?i)Rp\s*[\d.,]+(?:\s*[–-]\s*(?:Rp\s*)?[\d.,]+)?\s*per\s*\w+",
                0,
            )])?,
            posted: Chain::compile(&[
                Strategy::pattern(
                    r"(?i)\b\d+\+?\s*(?:hari|jam|menit|minggu|bulan)\s+(?:yang\s+)?lalu\b",
                    0,
                ),
                Strategy::pattern(
                    r"(?i)\b\d+\s*(?:days?|hours?|minutes?|mins?|weeks?|months?|d|h|m)\+?\s+ago\b",
                    0,
                ),
                Strategy::pattern(r"(?i)\blisted\s+more\s+than\s+[a-z]+\s+days?\s+ago\b", 0),
                Strategy::pattern(r"(?i)\b(?:baru\s+saja|just\s+now|recently)\b", 0),
                Strategy::pattern(r"(?i)\b(?:hari\s+ini|today)\b", 0),
                Strategy::pattern(r"(?i)\b(?:kemarin|yesterday)\b", 0),
            ])?,
            job_type: Chain::compile(&[
                Strategy::selector(r#"[data-automation="jobWorkType"]"#),
                Strategy::selector(r#"[class*="work-type"]"#),
                Strategy::selector(r#"[class*="workType"]"#),
                Strategy::pattern(
                    r"(?i)\b(full[\s-]?time|part[\s-]?time|penuh\s+waktu|paruh\s+waktu|kontrak|contract|magang|internship|harian|casual|temporary)\b",
                    1,
                ),
            ])?,
            classification: Chain::compile(&[
                Strategy::selector(r#"[data-automation="jobClassification"]"#),
                Strategy::selector(r#"[class*="classification"]"#),
                Strategy::selector(r#"[class*="category"]"#),
            ])?,
            gazetteer: places.iter().map(|p| p.trim().to_string()).collect(),
            noise: Regex::new(
                r"(?i)akan segera berakhir|dibutuhkan segera|ini adalah lowongan kerja|lowongan di\b|\bfull time\b|\bpart time\b|\bkontrak\b|\bparuh waktu\b|Rp\s*[\d.,]+|[•·|]",
            )
            .map_err(|e| Error::invalid("pattern", e.to_string()))?,
        })
    }

    /// All fields of a card, or `None` when no acceptable title exists.
    pub fn extract(&self, card: &Card<'_>) -> Option<CardFields> {
        let title = self.title(card)?;
        let company = self.company(card);
        let location = self.location(card);
        let classification = self.classification(card);
        let salary_range = self.salary(card);
        let posted_label = self.posted(card);
        let job_type = self.job_type(card);

        let known: Vec<&str> = [
            Some(title.as_str()),
            Some(company.as_str()),
            Some(location.as_str()),
            Some(posted_label.as_str()),
            classification.as_deref(),
            salary_range.as_deref(),
            job_type.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        let description_snippet = self.snippet(card, &known);

        Some(CardFields {
            title,
            company,
            location,
            classification,
            salary_range,
            posted_label,
            job_type,
            description_snippet,
        })
    }

    pub fn title(&self, card: &Card<'_>) -> Option<String> {
        self.title.first(card, accept_title).or_else(|| {
            let anchor = card.anchor?;
            [
                Some(element_text(anchor)),
                anchor.value().attr("aria-label").map(clean_text),
                anchor.value().attr("title").map(clean_text),
            ]
            .into_iter()
            .flatten()
            .find_map(accept_title)
        })
    }

    pub fn company(&self, card: &Card<'_>) -> String {
        self.company
            .first(card, |raw| {
                let name = strip_company_noise(&raw);
                (name.chars().count() > 2 && !normalize(name.as_str()).contains("limit results"))
                    .then_some(name)
            })
            .unwrap_or_else(|| UNKNOWN_COMPANY.to_string())
    }

    pub fn location(&self, card: &Card<'_>) -> String {
        self.location
            .first(card, |raw| (raw.chars().count() > 2).then_some(raw))
            .map(|found| {
                let key = normalize(found.as_str());
                self.gazetteer
                    .iter()
                    .find(|p| normalize(p.as_str()) == key)
                    .cloned()
                    .unwrap_or(found)
            })
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string())
    }

    /// `None` when the card shows no salary; absence is meaningful to
    /// salary filters.
    pub fn salary(&self, card: &Card<'_>) -> Option<String> {
        self.salary.first(card, Some)
    }

    pub fn posted(&self, card: &Card<'_>) -> String {
        self.posted
            .first(card, Some)
            .unwrap_or_else(|| UNKNOWN_POSTED.to_string())
    }

    pub fn job_type(&self, card: &Card<'_>) -> Option<String> {
        self.job_type.first(card, |raw| (raw.chars().count() > 2).then_some(raw))
    }

    pub fn classification(&self, card: &Card<'_>) -> Option<String> {
        self.classification.first(card, |raw| {
            let label =
                clean_text(raw.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace()));
            (label.chars().count() > 2).then_some(label)
        })
    }

    /// Card text with every recognised field removed, capped in length.
    /// Never the full listing body.
    pub fn snippet(&self, card: &Card<'_>, known: &[&str]) -> String {
        let mut rest = card.text.clone();
        for value in known.iter().filter(|v| !v.trim().is_empty()) {
            let pattern = regex::escape(value.trim()).replace(' ', r"\s+");
            if let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() {
                rest = re.replace_all(&rest, " ").into_owned();
            }
        }
        let rest = clean_text(&self.noise.replace_all(&rest, " "));
        if rest.chars().count() < SNIPPET_MIN_CHARS {
            return DEFAULT_SNIPPET.to_string();
        }
        truncate_chars(&rest, SNIPPET_MAX_CHARS)
    }
}

fn accept_title(raw: String) -> Option<String> {
    let key = normalize(raw.as_str());
    (raw.chars().count() >= MIN_TITLE_LEN
        && !key.contains("http")
        && !key.contains("lowongan kerja"))
        .then_some(raw)
}

fn strip_company_noise(raw: &str) -> String {
    let mut name = raw.trim();
    for prefix in ["lowongan di ", "di ", "at "] {
        if let Some(head) = name.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                name = name[prefix.len()..].trim_start();
                break;
            }
        }
    }
    for suffix in [" jobs", " job"] {
        if name.len() > suffix.len() {
            let cut = name.len() - suffix.len();
            if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(suffix) {
                name = &name[..cut];
                break;
            }
        }
    }
    clean_text(name)
}

fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}

fn block_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
