//! Extraction over whole results pages.

mod helpers;

use helpers::{category, results_page, year_group};
use marquee::oscars::{AwardRecord, AwardStatus, ScrapeError, extract_award_records};

fn row(year: i32, ceremony: u32, title: &str, cat: &str, status: AwardStatus) -> AwardRecord {
    AwardRecord {
        award_year: year,
        ceremony_number: ceremony,
        movie_title: title.to_string(),
        award_category: cat.to_string(),
        status,
    }
}

#[test]
fn test_multiple_years_with_broken_category() {
    let broken = r#"<div class="result-subgroup subgroup-awardcategory-chron">
            <div class="awards-result-film-title">Orphan Film</div>
        </div>"#
        .to_string();

    let page = results_page(&[
        year_group(
            "2022 (94th)",
            &[
                category("BEST PICTURE", &["CODA", "Belfast", "Dune"], true),
                broken,
            ],
        ),
        year_group(
            "2023 (95th)",
            &[category("SOUND", &["Top Gun: Maverick", "Elvis"], true)],
        ),
    ]);

    let records = extract_award_records(&page).unwrap();

    assert_eq!(
        records,
        vec![
            row(2022, 94, "CODA", "BEST PICTURE", AwardStatus::Won),
            row(2022, 94, "Belfast", "BEST PICTURE", AwardStatus::Nominated),
            row(2022, 94, "Dune", "BEST PICTURE", AwardStatus::Nominated),
            row(2023, 95, "Top Gun: Maverick", "SOUND", AwardStatus::Won),
            row(2023, 95, "Elvis", "SOUND", AwardStatus::Nominated),
        ]
    );
}

#[test]
fn test_malformed_year_title_discards_everything() {
    let page = results_page(&[
        year_group("2022 (94th)", &[category("EDITING", &["Dune"], true)]),
        year_group("Ceremony 95 (2023)", &[category("SOUND", &["Elvis"], false)]),
    ]);

    let err = extract_award_records(&page).unwrap_err();
    match err {
        ScrapeError::MalformedGroupTitle { title, .. } => assert_eq!(title, "Ceremony 95 (2023)"),
        other => panic!("expected malformed title, got {other:?}"),
    }
}

#[test]
fn test_rows_per_category_match_distinct_titles() {
    let page = results_page(&[year_group(
        "1928/29 (2nd)",
        &[
            category("OUTSTANDING PICTURE", &["The Broadway Melody", "Alibi"], true),
            category("ART DIRECTION", &["The Bridge of San Luis Rey", "Alibi"], false),
        ],
    )]);

    let records = extract_award_records(&page).unwrap();

    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.award_year == 1928 && r.ceremony_number == 2));
    let won: Vec<_> = records
        .iter()
        .filter(|r| r.status == AwardStatus::Won)
        .map(|r| r.movie_title.as_str())
        .collect();
    assert_eq!(won, vec!["The Broadway Melody"]);
}

#[test]
fn test_year_group_without_categories() {
    let page = results_page(&[year_group("2024 (96th)", &[])]);
    assert!(extract_award_records(&page).unwrap().is_empty());
}
