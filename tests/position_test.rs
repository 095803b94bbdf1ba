//! Tests for named board positions.

use tresenraya_core::{Board, Position, Symbol};

#[test]
fn test_position_to_index() {
    assert_eq!(Position::TopLeft.to_index(), 0);
    assert_eq!(Position::Center.to_index(), 4);
    assert_eq!(Position::BottomRight.to_index(), 8);
}

#[test]
fn test_position_from_index() {
    assert_eq!(Position::from_index(0), Some(Position::TopLeft));
    assert_eq!(Position::from_index(4), Some(Position::Center));
    assert_eq!(Position::from_index(9), None);
}

#[test]
fn test_parse_numbers_are_one_based() {
    assert_eq!(Position::parse_input("1"), Some(Position::TopLeft));
    assert_eq!(Position::parse_input(" 9 "), Some(Position::BottomRight));
    assert_eq!(Position::parse_input("0"), None);
    assert_eq!(Position::parse_input("10"), None);
}

#[test]
fn test_parse_labels_loosely() {
    assert_eq!(Position::parse_input("center"), Some(Position::Center));
    assert_eq!(Position::parse_input("Top Right"), Some(Position::TopRight));
    assert_eq!(Position::parse_input("bottom_left"), Some(Position::BottomLeft));
    assert_eq!(Position::parse_input("middle"), None);
}

#[test]
fn test_valid_moves_filters_occupied() {
    let board = Board::new()
        .apply(0, Symbol::X)
        .and_then(|b| b.apply(4, Symbol::O))
        .unwrap();

    let valid = Position::valid_moves(&board);
    assert_eq!(valid.len(), 7);
    assert!(!valid.contains(&Position::TopLeft));
    assert!(!valid.contains(&Position::Center));
    assert!(valid.contains(&Position::BottomRight));
}
