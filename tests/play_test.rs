//! Tests for the terminal front ends.

use std::io::Cursor;
use std::time::Duration;

use tresenraya::AppConfig;
use tresenraya::play::{online_demo, play_local, self_play};
use tresenraya_core::{Difficulty, MatchMode, Outcome, Symbol};

#[tokio::test]
async fn test_duel_from_scripted_input() {
    let mut input = Cursor::new("1\n4\n2\n5\n3\n");
    let mut output = Vec::new();

    let outcome = play_local(MatchMode::TwoLocal, Duration::ZERO, &mut input, &mut output)
        .await
        .unwrap();

    assert_eq!(outcome, Some(Outcome::Winner(Symbol::X)));
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("X plays Top-right"), "{}", text);
    assert!(text.contains("X wins!"));
}

#[tokio::test]
async fn test_bad_input_is_reported_and_play_continues() {
    let mut input = Cursor::new("banana\ncenter\ncenter\nq\n");
    let mut output = Vec::new();

    let outcome = play_local(MatchMode::TwoLocal, Duration::ZERO, &mut input, &mut output)
        .await
        .unwrap();

    assert_eq!(outcome, None);
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("'banana' is not a cell"));
    assert!(text.contains("Illegal move"));
}

#[tokio::test]
async fn test_solo_against_hard_ends_without_human_win() {
    let mut input = Cursor::new("1\n2\n3\n4\n5\n6\n7\n8\n9\n".repeat(2));
    let mut output = Vec::new();
    let mode = MatchMode::SoloVsSearch {
        human: Symbol::X,
        difficulty: Difficulty::Hard,
    };

    let outcome = play_local(mode, Duration::ZERO, &mut input, &mut output)
        .await
        .unwrap();
    assert_ne!(outcome, Some(Outcome::Winner(Symbol::X)));
    assert!(outcome.is_some());
}

#[tokio::test]
async fn test_hard_self_play_draws() {
    let mut output = Vec::new();
    let outcome = self_play(Difficulty::Hard, Duration::ZERO, &mut output)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Draw);
}

#[tokio::test]
async fn test_online_demo_plays_to_completion() {
    let config = AppConfig::from_toml("difficulty = \"hard\"").unwrap();
    let mut output = Vec::new();

    let outcome = online_demo(&config, &mut output).await.unwrap();
    assert_eq!(outcome, Outcome::Draw);

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("[Ana] Good luck!"), "{}", text);
    assert!(text.contains("Luis joined with the link"));
    assert!(text.contains("?room="));
}
