//! Listing parser: search-results HTML → job records.
//!
//! The site renders postings as `.item` blocks inside `.container .vaga`.
//! Posting dates come as a localized partial string ("Publicada em
//! 05-mar") with no year, so the fetch year is combined in and the result
//! resolved to a unix timestamp at local midnight.

use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::{ParseError, ParseResult};
use crate::types::JobRecord;

/// Prefix of the posting-date span
const DATE_PREFIX: &str = "Publicada em ";

/// Month abbreviation (3-letter, lowercase, pt-BR) to 1-12.
fn month_to_number(month: &str) -> Option<u32> {
    match month {
        "jan" => Some(1),
        "fev" => Some(2),
        "mar" => Some(3),
        "abr" => Some(4),
        "mai" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "ago" => Some(8),
        "set" => Some(9),
        "out" => Some(10),
        "nov" => Some(11),
        "dez" => Some(12),
        _ => None,
    }
}

/// Parser for one fetch: holds the site origin and the fetch-time values
/// stamped into every record.
pub struct Parser {
    origin: Url,
    fetch_year: i32,
    fetched_at: i64,
    item_selector: Selector,
    link_selector: Selector,
    heading_selector: Selector,
    meta_selector: Selector,
    description_selector: Selector,
    id_pattern: Regex,
    title_suffix: Regex,
}

impl Parser {
    /// Create a parser. `fetch_year` and `fetched_at` are injected rather
    /// than read from the clock so parses are reproducible in tests.
    pub fn new(origin: Url, fetch_year: i32, fetched_at: i64) -> Self {
        Self {
            origin,
            fetch_year,
            fetched_at,
            item_selector: Selector::parse(".container .vaga .item").unwrap(),
            link_selector: Selector::parse("div.col-md-10 h3 a").unwrap(),
            heading_selector: Selector::parse("div.col-md-10 h3").unwrap(),
            meta_selector: Selector::parse("div.col-md-10 h5 span").unwrap(),
            description_selector: Selector::parse("div.col-md-10 p").unwrap(),
            id_pattern: Regex::new(r"(?i)detalhe/(\d+)").unwrap(),
            title_suffix: Regex::new(r"\s*\([^)]*\)$").unwrap(),
        }
    }

    /// Parse the search-results page into records.
    ///
    /// Zero listing items is a hard failure ([`ParseError::NoListings`]):
    /// an empty page means a markup change, not an empty job market. A
    /// single malformed listing also fails the whole batch, so no id can
    /// silently escape future dedup checks.
    pub fn parse(&self, html: &str) -> ParseResult<Vec<JobRecord>> {
        let document = Html::parse_document(html);

        let items: Vec<ElementRef> = document.select(&self.item_selector).collect();
        if items.is_empty() {
            return Err(ParseError::NoListings);
        }
        debug!(count = items.len(), "Found listing items");

        items.iter().map(|item| self.parse_item(*item)).collect()
    }

    fn parse_item(&self, item: ElementRef) -> ParseResult<JobRecord> {
        let link = item
            .select(&self.link_selector)
            .next()
            .ok_or(ParseError::MissingLink)?;
        let href = link.value().attr("href").ok_or(ParseError::MissingLink)?;

        let id = self
            .id_pattern
            .captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ParseError::MissingId {
                href: href.to_string(),
            })?;

        let url = self
            .origin
            .join(href)
            .map_err(|_| ParseError::MissingId {
                href: href.to_string(),
            })?
            .to_string();

        let heading = element_text(
            item.select(&self.heading_selector)
                .next()
                .ok_or(ParseError::MissingLink)?,
        );
        let title = self.title_suffix.replace(&heading, "").trim().to_string();

        let meta: Vec<String> = item
            .select(&self.meta_selector)
            .map(element_text)
            .collect();
        if meta.len() < 3 {
            return Err(ParseError::IncompleteMetadata {
                detail: format!("expected 3 metadata spans, found {}", meta.len()),
            });
        }
        let company = meta[0].clone();
        let city = meta[1].clone();

        let description = item
            .select(&self.description_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let posted_at = self.parse_posted_at(&meta[2])?;

        Ok(JobRecord {
            id,
            title,
            company,
            city,
            description,
            url,
            posted_at,
            fetched_at: self.fetched_at,
            delivered: false,
            delivered_at: None,
        })
    }

    /// Resolve a "Publicada em 05-mar" span to a unix timestamp at local
    /// midnight of that day in the fetch year.
    fn parse_posted_at(&self, raw: &str) -> ParseResult<i64> {
        let partial = raw.strip_prefix(DATE_PREFIX).unwrap_or(raw).trim();

        let (day, month) = partial.split_once('-').ok_or_else(|| ParseError::InvalidDate {
            detail: format!("expected day-month, got {partial:?}"),
        })?;

        let day: u32 = day.trim().parse().map_err(|_| ParseError::InvalidDate {
            detail: format!("bad day in {partial:?}"),
        })?;

        let month_abbrev = month.trim().to_lowercase();
        let month = month_to_number(&month_abbrev).ok_or(ParseError::UnknownMonth {
            month: month_abbrev,
        })?;

        let date = NaiveDate::from_ymd_opt(self.fetch_year, month, day).ok_or_else(|| {
            ParseError::InvalidDate {
                detail: format!("{}-{month}-{day} is not a calendar date", self.fetch_year),
            }
        })?;

        let midnight = date.and_time(NaiveTime::MIN);
        Local
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.timestamp())
            .ok_or_else(|| ParseError::InvalidDate {
                detail: format!("{midnight} does not exist in the local timezone"),
            })
    }
}

/// Collected, trimmed text of an element.
fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
