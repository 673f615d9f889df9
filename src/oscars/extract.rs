//! Parses the awards database results page into [`AwardRecord`] rows.
//!
//! The results container holds one group per ceremony year:
//!
//! ```text
//! div#resultscontainer
//! └─ div.awards-result-chron.result-group.group-awardcategory-chron
//!    ├─ div.result-group-title          "2023 (95th)"
//!    └─ div.result-subgroup.subgroup-awardcategory-chron   (one per category)
//!       ├─ div.result-subgroup-title    "ACTOR IN A LEADING ROLE"
//!       ├─ span[title=Winner] + div     winning nominee(s)
//!       └─ div.awards-result-film-title (one per nomination, titles may repeat)
//! ```
//!
//! A year title that cannot be parsed aborts the whole extraction. A broken
//! category subgroup is logged and skipped; the rest of its year survives.

use html_scraper::{ElementRef, Html, Selector};
use indexmap::IndexSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use super::errors::ScrapeError;
use super::models::{AwardRecord, AwardStatus};

static RESULTS_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#resultscontainer").unwrap());
static YEAR_GROUP: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.awards-result-chron.result-group.group-awardcategory-chron").unwrap()
});
static YEAR_GROUP_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.result-group-title").unwrap());
static CATEGORY_GROUP: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.result-subgroup.subgroup-awardcategory-chron").unwrap()
});
static CATEGORY_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.result-subgroup-title").unwrap());
static FILM_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.awards-result-film-title").unwrap());
static WINNER_MARKER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"span[title="Winner"]"#).unwrap());
static DIGITS: LazyLock<regex::Regex> = LazyLock::new(|| regex::Regex::new(r"\d+").unwrap());
static LEADING_DIGITS: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^\d+").unwrap());

/// Extract every award row from a results page, in document order.
///
/// A page without a results container (render timeout, error page) yields
/// no rows rather than an error.
pub fn extract_award_records(markup: &str) -> Result<Vec<AwardRecord>, ScrapeError> {
    let html = Html::parse_document(markup);

    let Some(container) = html.select(&RESULTS_CONTAINER).next() else {
        warn!("No results container in page, nothing to extract");
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    let mut groups = 0usize;

    for year_group in container.select(&YEAR_GROUP) {
        records.extend(parse_year_group(year_group)?);
        groups += 1;
    }

    info!(
        year_groups = groups,
        records = records.len(),
        "Extracted award results"
    );
    Ok(records)
}

/// Text content with each text node trimmed and the pieces joined directly.
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// Split a year-group title like `"2023 (95th)"` into `(2023, 95)`.
///
/// The earliest ceremonies cover two seasons and render as `"1927/28 (1st)"`;
/// their award year is the first year shown.
pub fn parse_year_title(title: &str) -> Result<(i32, u32), ScrapeError> {
    let malformed = |reason| ScrapeError::MalformedGroupTitle {
        title: title.to_string(),
        reason,
    };

    let tokens: Vec<&str> = title.split_whitespace().collect();
    let [year_token, ceremony_token] = tokens.as_slice() else {
        return Err(malformed("expected exactly two whitespace-separated tokens"));
    };

    let year: i32 = LEADING_DIGITS
        .find(year_token)
        .ok_or_else(|| malformed("year token does not start with a year"))?
        .as_str()
        .parse()
        .map_err(|_| malformed("year out of range"))?;

    let ceremony: u32 = DIGITS
        .find(ceremony_token)
        .ok_or_else(|| malformed("ceremony token contains no digits"))?
        .as_str()
        .parse()
        .map_err(|_| malformed("ceremony number out of range"))?;

    Ok((year, ceremony))
}

fn parse_year_group(year_group: ElementRef<'_>) -> Result<Vec<AwardRecord>, ScrapeError> {
    let title = year_group
        .select(&YEAR_GROUP_TITLE)
        .next()
        .map(stripped_text)
        .ok_or_else(|| ScrapeError::MalformedGroupTitle {
            title: String::new(),
            reason: "award year group has no title",
        })?;
    let (award_year, ceremony_number) = parse_year_title(&title)?;

    let mut records = Vec::new();
    for category_group in year_group.select(&CATEGORY_GROUP) {
        match parse_category_group(category_group, award_year, ceremony_number) {
            Ok(rows) => records.extend(rows),
            Err(e) => warn!(
                award_year,
                ceremony_number,
                error = %e,
                "Skipping award category group"
            ),
        }
    }

    debug!(
        award_year,
        ceremony_number,
        records = records.len(),
        "Parsed award year group"
    );
    Ok(records)
}

fn parse_category_group(
    group: ElementRef<'_>,
    award_year: i32,
    ceremony_number: u32,
) -> Result<Vec<AwardRecord>, ScrapeError> {
    let category = group
        .select(&CATEGORY_TITLE)
        .next()
        .map(stripped_text)
        .ok_or(ScrapeError::MalformedCategoryGroup {
            category: None,
            reason: "missing category title",
        })?;

    // A film can be listed once per nominee within the same category
    let titles: IndexSet<String> = group
        .select(&FILM_TITLE)
        .map(stripped_text)
        .filter(|t| !t.is_empty())
        .collect();

    if titles.is_empty() {
        debug!(
            award_year,
            category = category.as_str(),
            "No nominated films in category"
        );
        return Ok(Vec::new());
    }

    let winners = collect_winners(group).ok_or_else(|| ScrapeError::MalformedCategoryGroup {
        category: Some(category.clone()),
        reason: "winner marker has no sibling container",
    })?;

    Ok(titles
        .into_iter()
        .map(|movie_title| {
            let status = if winners.contains(&movie_title) {
                AwardStatus::Won
            } else {
                AwardStatus::Nominated
            };
            AwardRecord {
                award_year,
                ceremony_number,
                movie_title,
                award_category: category.clone(),
                status,
            }
        })
        .collect())
}

/// Titles inside the container that follows the winner marker.
///
/// `Some(empty)` when the category has no winner marker at all (honorary and
/// technical categories); `None` when the marker is present but the
/// container after it is missing.
fn collect_winners(group: ElementRef<'_>) -> Option<IndexSet<String>> {
    let Some(marker) = group.select(&WINNER_MARKER).next() else {
        return Some(IndexSet::new());
    };

    let container = marker
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "div")?;

    Some(container.select(&FILM_TITLE).map(stripped_text).collect())
}
