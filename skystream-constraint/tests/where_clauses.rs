//! End-to-end WHERE clause handling: parse, canonical render against a
//! table description, compile and evaluate against rows.

use skystream_constraint::ConstraintParser;
use skystream_core::{Column, Row, Table, Value};

fn table() -> Table {
    Table::new(
        "wise.l1b",
        vec![
            Column::new("scan_id").principal(),
            Column::new("frame_num").principal(),
            Column::new("magzp").dbname("magzp_phys"),
            Column::new("band").constant(Value::Int(1)),
            Column::new("date_obs"),
        ],
    )
    .unwrap()
}

fn row(scan: &str, frame: i64, magzp: Option<f64>) -> Row {
    let mut r = Row::default();
    r.insert("scan_id".to_owned(), Value::Str(scan.to_owned()));
    r.insert("frame_num".to_owned(), Value::Int(frame));
    if let Some(m) = magzp {
        r.insert("magzp_phys".to_owned(), Value::Float(m));
    }
    r
}

#[test]
fn render_uses_physical_names_and_canonical_operators() {
    let t = table();
    let ast = ConstraintParser::new()
        .parse("magzp > 20.5 AND scan_id = '01234a' OR frame_num BETWEEN 1 AND 10")
        .unwrap();
    assert_eq!(
        ast.render(&t).unwrap(),
        "(((magzp_phys > 20.5) AND (scan_id == '01234a')) OR (frame_num BETWEEN 1 AND 10))"
    );
}

#[test]
fn constant_columns_render_as_their_value() {
    let t = table();
    let ast = ConstraintParser::new().parse("band = 1").unwrap();
    assert_eq!(ast.render(&t).unwrap(), "(1 == 1)");
}

#[test]
fn compiled_filter_applies_three_valued_logic() {
    let t = table();
    let ast = ConstraintParser::new()
        .parse("magzp > 20 AND frame_num < 100")
        .unwrap();
    let filter = ast.compile(&t).unwrap();

    assert!(filter.matches(&row("a", 5, Some(20.5))));
    assert!(!filter.matches(&row("a", 5, Some(19.0))));
    // NULL magzp makes the conjunction unknown, which is not a match
    assert!(!filter.matches(&row("a", 5, None)));
}

#[test]
fn null_handling_round_trips() {
    let t = table();
    let ast = ConstraintParser::new().parse("magzp IS NULL").unwrap();
    assert_eq!(ast.render(&t).unwrap(), "magzp_phys IS NULL");
    let filter = ast.compile(&t).unwrap();
    assert!(filter.matches(&row("a", 1, None)));
    assert!(!filter.matches(&row("a", 1, Some(20.0))));
}

#[test]
fn like_with_escape_renders_and_matches() {
    let t = table();
    let ast = ConstraintParser::new()
        .parse(r"scan_id LIKE '01!%%' ESCAPE '!'")
        .unwrap();
    assert_eq!(
        ast.render(&t).unwrap(),
        "(scan_id LIKE '01!%%' ESCAPE '!')"
    );
    let filter = ast.compile(&t).unwrap();
    assert!(filter.matches(&row("01%suffix", 1, None)));
    assert!(!filter.matches(&row("01xsuffix", 1, None)));
}

#[test]
fn unknown_columns_are_reported_by_name() {
    let t = table();
    let ast = ConstraintParser::new().parse("nope = 3").unwrap();
    let err = ast.render(&t).unwrap_err();
    assert_eq!(
        err.to_string(),
        "column nope referenced in WHERE clause does not exist"
    );
    assert!(ast.compile(&t).is_err());
}

#[test]
fn extracted_columns_cover_every_reference() {
    let ast = ConstraintParser::new()
        .parse("magzp > 20 OR (scan_id = 'x' AND date_obs < TIMESTAMP '2014-01-01 00:00:00')")
        .unwrap();
    let cols = ast.extract_cols();
    assert_eq!(
        cols.into_iter().collect::<Vec<_>>(),
        ["date_obs", "magzp", "scan_id"].map(String::from)
    );
}
