use expect_test::expect;
use siridb_grammar::{Grammar, GrammarError, SiriGrammar, Token};

fn describe(text: &str) -> String {
    match SiriGrammar::new().parse(text) {
        Ok(result) => {
            let keywords = result
                .expecting()
                .iter()
                .filter_map(Token::keyword)
                .collect::<Vec<_>>();
            format!(
                "pos={} valid={} keywords={}",
                result.pos(),
                result.is_valid(),
                keywords.join(" ")
            )
        }
        Err(err) => format!("error: {err}"),
    }
}

#[test]
fn empty_input_expects_every_statement_keyword() {
    expect![[r#"pos=0 valid=false keywords=select list count show create alter drop grant revoke calc timeit help"#]]
        .assert_eq(&describe(""));
}

#[test]
fn show_without_field_is_valid_and_offers_fields() {
    let result = SiriGrammar::new().parse("show ").expect("parse show");
    assert!(result.is_valid());
    assert_eq!(result.pos(), 5);
    assert!(result
        .expecting()
        .contains(&Token::Keyword("time_precision")));
    assert!(result.expecting().contains(&Token::Rest));
}

#[test]
fn select_stops_at_missing_series_name() {
    expect![[r#"pos=14 valid=false keywords="#]].assert_eq(&describe("select * from "));
    assert!(SiriGrammar::new()
        .parse("select mean(1h) from 'cpu' between now - 1d and now")
        .expect("parse select")
        .is_valid());
}

#[test]
fn keywords_match_case_insensitively() {
    expect![[r#"pos=11 valid=true keywords="#]].assert_eq(&describe("LIST Series"));
}

#[test]
fn grant_offers_target_kinds() {
    expect![[r#"pos=14 valid=false keywords=user group"#]].assert_eq(&describe("grant read to us"));
}

#[test]
fn import_is_not_a_statement() {
    expect![[r#"pos=0 valid=false keywords=select list count show create alter drop grant revoke calc timeit help"#]]
        .assert_eq(&describe("import /tmp/x"));
}

#[test]
fn unterminated_string_is_an_error() {
    let err = SiriGrammar::new()
        .parse("create user 'abc")
        .expect_err("unterminated string");
    assert_eq!(err, GrammarError::UnterminatedString { pos: 12 });
}
