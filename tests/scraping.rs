use std::fs;
use std::path::PathBuf;

use trols_stats::match_scores::{CodedGame, PlayerCode, scrape_match_scores};
use trols_stats::model::MatchRound;
use trols_stats::scrape::{
    scrape_competition_ids, scrape_competition_name, scrape_match_ids, scrape_match_preamble,
    scrape_match_teams, scrape_player_names, scrape_preamble_text,
};

const NEJTA_MATCH: &str = "nejta_saturday_am_autumn_2015--AA039054.html";
const DVTA_MATCH: &str = "dvta_friday_night_autumn_2017--FN004054.html";

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn coded(
    team_mate: Option<PlayerCode>,
    opposition: (PlayerCode, Option<PlayerCode>),
    score_for: u32,
    score_against: u32,
) -> CodedGame {
    CodedGame {
        team_mate,
        opposition,
        score_for,
        score_against,
    }
}

#[test]
fn competition_ids_skip_blank_option() {
    let ids = scrape_competition_ids(&read_fixture("results_page.html")).unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids["GIRLS 1"], "AA026");
    assert_eq!(ids["GIRLS 14"], "AA039");
}

#[test]
fn competition_name_plain_and_tokenised() {
    let html = read_fixture("results_page.html");
    assert_eq!(
        scrape_competition_name(&html, "AA", None, false).unwrap().as_deref(),
        Some("Saturday AM - Autumn 2015")
    );
    assert_eq!(
        scrape_competition_name(&html, "AA", Some("nejta"), true)
            .unwrap()
            .as_deref(),
        Some("nejta_saturday_am_autumn_2015")
    );
    assert_eq!(scrape_competition_name(&html, "ZZ", None, true).unwrap(), None);
}

#[test]
fn competition_ids_from_live_results_page() {
    let ids = scrape_competition_ids(&read_fixture("main_results.php")).unwrap();
    assert_eq!(ids.len(), 40);
    assert_eq!(ids["BOYS 1"], "AA001");
    assert_eq!(ids["BOYS 25"], "AA025");
    assert_eq!(ids["GIRLS 1"], "AA026");
    assert_eq!(ids["GIRLS 15"], "AA040");
    assert!(!ids.contains_key(""));
}

#[test]
fn competition_name_from_live_results_page() {
    let html = read_fixture("main_results.php");
    assert_eq!(
        scrape_competition_name(&html, "AA", None, false).unwrap().as_deref(),
        Some("Saturday AM - Autumn 2015")
    );
    assert_eq!(
        scrape_competition_name(&html, "AA", Some("nejta"), false)
            .unwrap()
            .as_deref(),
        Some("NEJTA Saturday AM - Autumn 2015")
    );
    assert_eq!(
        scrape_competition_name(&html, "AA", Some("nejta"), true)
            .unwrap()
            .as_deref(),
        Some("nejta_saturday_am_autumn_2015")
    );
    assert_eq!(
        scrape_competition_name(&html, "AA", None, true).unwrap().as_deref(),
        Some("saturday_am_autumn_2015")
    );
}

#[test]
fn match_ids_from_live_section_page() {
    let mut ids = scrape_match_ids(&read_fixture("nejta_results.php")).unwrap();
    ids.sort();
    assert_eq!(
        ids,
        vec![
            "AA039011", "AA039013", "AA039014", "AA039022", "AA039023", "AA039024", "AA039042",
            "AA039043", "AA039044", "AA039051", "AA039054",
        ]
    );
}

#[test]
fn match_ids_from_results_page() {
    let ids = scrape_match_ids(&read_fixture("results_page.html")).unwrap();
    assert_eq!(ids, vec!["AA039054", "AA039055"]);
}

#[test]
fn match_teams_with_and_without_colors() {
    let html = read_fixture(NEJTA_MATCH);
    let raw = scrape_match_teams(&html, false).unwrap().unwrap();
    assert_eq!(raw.home_team, "Watsonia ");
    assert_eq!(raw.away_team, "St Marys");

    let resolved = scrape_match_teams(&html, true).unwrap().unwrap();
    assert_eq!(resolved.home_team, "Watsonia Red");
    assert_eq!(resolved.away_team, "St Marys");

    let dvta = scrape_match_teams(&read_fixture(DVTA_MATCH), true)
        .unwrap()
        .unwrap();
    assert_eq!(dvta.home_team, "Eltham");
    assert_eq!(dvta.away_team, "Watsonia Blue");
}

#[test]
fn player_names_in_slot_order() {
    let names = scrape_player_names(&read_fixture(NEJTA_MATCH)).unwrap();
    assert_eq!(names.len(), 8);
    assert_eq!(names[0], (1, "Madeline Doyle".to_string()));
    assert_eq!(names[2], (3, "Isabella Markovski".to_string()));
    assert_eq!(names[4], (5, "Lauren Amsing".to_string()));
    assert_eq!(names[7], (8, "Sophie Yeates".to_string()));
}

#[test]
fn match_preamble_from_page() {
    let html = read_fixture(NEJTA_MATCH);
    assert_eq!(
        scrape_preamble_text(&html).unwrap().as_deref(),
        Some("GIRLS 14\u{a0}\u{a0}Rd.5 on 28th Feb 15")
    );
    let preamble = scrape_match_preamble(&html).unwrap();
    assert_eq!(preamble.competition_type.as_deref(), Some("girls"));
    assert_eq!(preamble.section, Some(14));
    assert_eq!(preamble.date.as_deref(), Some("28 Feb 15"));
    assert_eq!(preamble.match_round, Some(MatchRound::Round(5)));

    let dvta = scrape_match_preamble(&read_fixture(DVTA_MATCH)).unwrap();
    assert_eq!(dvta.competition_type, None);
    assert_eq!(dvta.section, Some(5));
    assert_eq!(dvta.match_round, Some(MatchRound::Round(3)));
}

#[test]
fn nejta_scores_mix_singles_and_doubles() {
    let scores = scrape_match_scores(&read_fixture(NEJTA_MATCH)).unwrap();
    assert_eq!(scores.keys().copied().collect::<Vec<_>>(), (1..=8).collect::<Vec<_>>());

    assert_eq!(
        scores[&1],
        vec![
            coded(None, (5, None), 6, 3),
            coded(Some(2), (5, Some(6)), 3, 6),
            coded(Some(3), (5, Some(7)), 3, 6),
        ]
    );
    assert_eq!(
        scores[&4],
        vec![
            coded(Some(3), (7, Some(8)), 0, 6),
            coded(Some(2), (6, Some(8)), 5, 6),
        ]
    );
    assert_eq!(
        scores[&6],
        vec![
            coded(None, (2, None), 6, 2),
            coded(Some(5), (1, Some(2)), 6, 3),
            coded(Some(8), (2, Some(4)), 6, 5),
        ]
    );
    assert_eq!(
        scores[&8],
        vec![
            coded(Some(7), (3, Some(4)), 6, 0),
            coded(Some(6), (2, Some(4)), 6, 5),
        ]
    );
    assert_eq!(scores.values().map(Vec::len).sum::<usize>(), 22);
}

#[test]
fn dvta_singles_scores() {
    let scores = scrape_match_scores(&read_fixture(DVTA_MATCH)).unwrap();
    let expected: [(PlayerCode, [CodedGame; 2]); 8] = [
        (1, [coded(None, (6, None), 6, 3), coded(None, (5, None), 6, 0)]),
        (2, [coded(None, (5, None), 6, 1), coded(None, (6, None), 6, 0)]),
        (3, [coded(None, (8, None), 6, 3), coded(None, (7, None), 6, 5)]),
        (4, [coded(None, (7, None), 6, 0), coded(None, (8, None), 0, 6)]),
        (5, [coded(None, (2, None), 1, 6), coded(None, (1, None), 0, 6)]),
        (6, [coded(None, (1, None), 3, 6), coded(None, (2, None), 0, 6)]),
        (7, [coded(None, (4, None), 0, 6), coded(None, (3, None), 5, 6)]),
        (8, [coded(None, (3, None), 3, 6), coded(None, (4, None), 6, 0)]),
    ];
    for (code, games) in expected {
        assert_eq!(scores[&code], games.to_vec(), "player code {code}");
    }
}

#[test]
fn page_without_score_table_is_empty() {
    let scores = scrape_match_scores(&read_fixture("results_page.html")).unwrap();
    assert!(scores.is_empty());
}
