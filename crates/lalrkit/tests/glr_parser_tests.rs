//! Tests for the stack-forking parse engine

use lalrkit::error::ParseError;
use lalrkit::parser::{ArgStyle, ParseOptions, Parser, ParserBuilder, Token, Value};

fn num(n: i64) -> Token<Value> {
    Token::new("NUM").with_value(Value::Int(n))
}

fn word(text: &str) -> Token<Value> {
    Token::new("WORD").with_value(Value::from(text))
}

fn op(kind: &str) -> Token<Value> {
    Token::new(kind)
}

fn int(values: &[Value], index: usize) -> i64 {
    values[index].as_int().unwrap_or_default()
}

fn arithmetic() -> Parser<Value> {
    let mut builder = ParserBuilder::<Value>::new();
    builder.left(&["PLUS", "MINUS"]).unwrap();
    builder.left(&["TIMES"]).unwrap();
    builder
        .production("e", |c| {
            c.clause(".e PLUS .e", |v| Value::Int(int(&v, 0) + int(&v, 1)))?;
            c.clause(".e MINUS .e", |v| Value::Int(int(&v, 0) - int(&v, 1)))?;
            c.clause(".e TIMES .e", |v| Value::Int(int(&v, 0) * int(&v, 1)))?;
            c.clause("LPAREN .e RPAREN", |mut v| v.remove(0))?;
            c.clause("NUM", |mut v| v.remove(0))?;
            Ok(())
        })
        .unwrap();
    builder.finalize().unwrap()
}

/// `e → e PLUS e | NUM` with no precedence, building bracketed strings
fn ambiguous_sum() -> Parser<Value> {
    let mut builder = ParserBuilder::<Value>::new();
    builder
        .rule("e", ".e PLUS .e", |v| {
            Value::from(format!("({}+{})", v[0].as_str().unwrap_or("?"), v[1].as_str().unwrap_or("?")).as_str())
        })
        .unwrap();
    builder
        .rule("e", "NUM", |v| Value::from(v[0].as_int().unwrap_or_default().to_string().as_str()))
        .unwrap();
    builder.finalize().unwrap()
}

#[test]
fn test_precedence_arithmetic() {
    let parser = arithmetic();
    let tokens = vec![num(1), op("PLUS"), num(2), op("TIMES"), num(3)];
    assert_eq!(parser.parse(tokens).unwrap(), Value::Int(7));

    let tokens = vec![num(2), op("TIMES"), num(3), op("PLUS"), num(1)];
    assert_eq!(parser.parse(tokens).unwrap(), Value::Int(7));
}

#[test]
fn test_left_associativity() {
    let parser = arithmetic();
    let tokens = vec![num(10), op("MINUS"), num(3), op("MINUS"), num(2)];
    assert_eq!(parser.parse(tokens).unwrap(), Value::Int(5));
}

#[test]
fn test_parentheses() {
    let parser = arithmetic();
    let tokens = vec![
        op("LPAREN"),
        num(1),
        op("PLUS"),
        num(2),
        op("RPAREN"),
        op("TIMES"),
        num(3),
    ];
    assert_eq!(parser.parse(tokens).unwrap(), Value::Int(9));
}

#[test]
fn test_separated_list() {
    let mut builder = ParserBuilder::<Value>::new();
    builder.list("ident_list", "IDENT", Some("COMMA")).unwrap();
    builder.start("ident_list").unwrap();
    let parser = builder.finalize().unwrap();

    assert_eq!(parser.parse(Vec::new()).unwrap(), Value::List(vec![]));

    let ident = |name: &str| Token::new("IDENT").with_value(Value::from(name));
    let tokens = vec![ident("a"), op("COMMA"), ident("b"), op("COMMA"), ident("c")];
    assert_eq!(
        parser.parse(tokens).unwrap(),
        Value::List(vec![Value::from("a"), Value::from("b"), Value::from("c")])
    );
}

fn ident(name: &str) -> Token<Value> {
    Token::new("IDENT").with_value(Value::from(name))
}

fn append(mut values: Vec<Value>) -> Value {
    let item = values.pop().unwrap_or_default();
    let mut items = match values.pop() {
        Some(Value::List(items)) => items,
        _ => Vec::new(),
    };
    items.push(item);
    Value::List(items)
}

#[test]
fn test_hand_written_left_recursive_list() {
    // list → ε | list COMMA IDENT: every element follows a comma
    let mut builder = ParserBuilder::<Value>::new();
    builder
        .production("list", |c| {
            c.clause("", |_| Value::List(vec![]))?;
            c.clause(".list COMMA .IDENT", append)?;
            Ok(())
        })
        .unwrap();
    let parser = builder.finalize().unwrap();

    assert_eq!(parser.parse(Vec::new()).unwrap(), Value::List(vec![]));
    assert_eq!(
        parser
            .parse(vec![op("COMMA"), ident("a"), op("COMMA"), ident("b")])
            .unwrap(),
        Value::List(vec![Value::from("a"), Value::from("b")])
    );
    assert!(matches!(
        parser.parse(vec![ident("a"), op("COMMA"), ident("b")]),
        Err(ParseError::NotInLanguage { .. })
    ));
}

#[test]
fn test_hand_written_separated_list() {
    let mut builder = ParserBuilder::<Value>::new();
    builder
        .production("list", |c| {
            c.clause("", |_| Value::List(vec![]))?;
            c.clause("items", |mut v| v.remove(0))?;
            Ok(())
        })
        .unwrap();
    builder
        .production("items", |c| {
            c.clause(".IDENT", Value::List)?;
            c.clause(".items COMMA .IDENT", append)?;
            Ok(())
        })
        .unwrap();
    let parser = builder.finalize().unwrap();

    assert_eq!(parser.parse(Vec::new()).unwrap(), Value::List(vec![]));
    assert_eq!(
        parser.parse(vec![ident("a"), op("COMMA"), ident("b")]).unwrap(),
        Value::List(vec![Value::from("a"), Value::from("b")])
    );
}

#[test]
fn test_inline_ebnf() {
    let mut builder = ParserBuilder::<Value>::new();
    builder
        .rule("call", ".NAME LPAREN .ARG* RPAREN", Value::List)
        .unwrap();
    let parser = builder.finalize().unwrap();
    let name = Token::new("NAME").with_value(Value::from("f"));
    let arg = |n: i64| Token::new("ARG").with_value(Value::Int(n));

    let empty = parser
        .parse(vec![name.clone(), op("LPAREN"), op("RPAREN")])
        .unwrap();
    assert_eq!(empty, Value::List(vec![Value::from("f"), Value::List(vec![])]));

    let two = parser
        .parse(vec![name, op("LPAREN"), arg(1), arg(2), op("RPAREN")])
        .unwrap();
    assert_eq!(
        two,
        Value::List(vec![Value::from("f"), Value::List(vec![Value::Int(1), Value::Int(2)])])
    );
}

#[test]
fn test_optional() {
    let mut builder = ParserBuilder::<Value>::new();
    builder.rule("decl", "LET NAME .init?", |mut v| v.remove(0)).unwrap();
    builder.rule("init", "EQ .NUM", |mut v| v.remove(0)).unwrap();
    let parser = builder.finalize().unwrap();

    let name = Token::new("NAME").with_value(Value::from("x"));
    assert_eq!(parser.parse(vec![op("LET"), name.clone()]).unwrap(), Value::Nil);
    assert_eq!(
        parser.parse(vec![op("LET"), name, op("EQ"), num(4)]).unwrap(),
        Value::Int(4)
    );
}

#[test]
fn test_array_arg_style() {
    let mut builder = ParserBuilder::<Value>::new();
    builder.arg_style(ArgStyle::Array);
    builder.rule("pair", ".A .B C", |mut v| v.remove(0)).unwrap();
    let parser = builder.finalize().unwrap();
    let tokens = vec![
        Token::new("A").with_value(Value::Int(1)),
        Token::new("B").with_value(Value::Int(2)),
        Token::new("C").with_value(Value::Int(3)),
    ];
    assert_eq!(
        parser.parse(tokens).unwrap(),
        Value::List(vec![Value::Int(1), Value::Int(2)])
    );
}

#[test]
fn test_unknown_token_type() {
    let parser = arithmetic();
    match parser.parse(vec![num(1), op("BOGUS"), num(2)]) {
        Err(ParseError::BadToken { token }) => assert_eq!(token.kind, "BOGUS"),
        other => panic!("expected BadToken, got {other:?}"),
    }
}

#[test]
fn test_bad_token_is_checked_when_reached() {
    let parser = arithmetic();
    // The parse fails on the second NUM before the unknown token is seen
    match parser.parse(vec![num(1), num(2), op("BOGUS")]) {
        Err(ParseError::NotInLanguage { seen, current, remaining }) => {
            assert_eq!(seen.len(), 1);
            assert_eq!(current.kind, "NUM");
            assert_eq!(remaining.len(), 1);
        }
        other => panic!("expected NotInLanguage, got {other:?}"),
    }
}

#[test]
fn test_not_in_language() {
    let parser = ambiguous_sum();
    match parser.parse(vec![num(1), num(2)]) {
        Err(ParseError::NotInLanguage { seen, current, remaining }) => {
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].kind, "NUM");
            assert_eq!(current.kind, "NUM");
            assert!(remaining.is_empty());
        }
        other => panic!("expected NotInLanguage, got {other:?}"),
    }
}

#[test]
fn test_ambiguity_all_matches() {
    let parser = ambiguous_sum();
    let tokens = vec![num(1), op("PLUS"), num(2), op("PLUS"), num(3)];

    let mut all = parser.parse_all(tokens.clone()).unwrap();
    all.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
    assert_eq!(all, vec![Value::from("((1+2)+3)"), Value::from("(1+(2+3))")]);

    let first = parser.parse(tokens).unwrap();
    assert!(all.contains(&first));
}

#[test]
fn test_ambiguity_grows_with_input() {
    let parser = ambiguous_sum();
    let mut tokens = vec![num(1)];
    for n in 2..=4 {
        tokens.push(op("PLUS"));
        tokens.push(num(n));
    }
    // Catalan number C3
    assert_eq!(parser.parse_all(tokens).unwrap().len(), 5);
}

#[test]
fn test_max_stacks_bounds_forking() {
    let parser = ambiguous_sum().with_options(ParseOptions {
        max_stacks: 1,
        ..ParseOptions::default()
    });
    let tokens = vec![num(1), op("PLUS"), num(2), op("PLUS"), num(3)];
    assert_eq!(parser.parse_all(tokens).unwrap().len(), 1);
}

fn statement_parser() -> Parser<Value> {
    let mut builder = ParserBuilder::<Value>::new();
    builder
        .production("stmt", |c| {
            c.clause("WORD+ SEMI", |mut v| v.remove(0))?;
            c.clause("WORD+ ERROR", |mut v| v.remove(0))?;
            Ok(())
        })
        .unwrap();
    builder.finalize().unwrap()
}

#[test]
fn test_error_production_at_end_of_input() {
    let parser = statement_parser();
    let expected = Value::List(vec![Value::from("a"), Value::from("b")]);

    assert_eq!(
        parser.parse(vec![word("a"), word("b"), op("SEMI")]).unwrap(),
        expected
    );

    let err = parser.parse(vec![word("a"), word("b")]).unwrap_err();
    assert!(err.is_handled());
    let (result, errors) = err.recovered().unwrap();
    assert_eq!(result, expected);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].tokens.is_empty());
}

#[test]
fn test_long_list_is_parsed() {
    let parser = statement_parser();
    let mut tokens: Vec<_> = (0..20_000).map(|i| word(&format!("w{i}"))).collect();
    tokens.push(op("SEMI"));
    match parser.parse(tokens).unwrap() {
        Value::List(items) => {
            assert_eq!(items.len(), 20_000);
            assert_eq!(items[0], Value::from("w0"));
            assert_eq!(items[19_999], Value::from("w19999"));
        }
        other => panic!("expected a list, got {other:?}"),
    }
}

#[test]
fn test_cyclic_grammar_terminates() {
    // a → a derives every parse of X infinitely often
    let mut builder = ParserBuilder::<Value>::new();
    builder
        .production("a", |c| {
            c.clause("a", |mut v| v.remove(0))?;
            c.clause("X", |mut v| v.remove(0))?;
            Ok(())
        })
        .unwrap();
    let parser = builder.finalize().unwrap();
    let x = || Token::new("X").with_value(Value::from("x"));

    assert_eq!(parser.parse(vec![x()]).unwrap(), Value::from("x"));
    let all = parser.parse_all(vec![x()]).unwrap();
    assert!(!all.is_empty());
    assert!(all.iter().all(|value| *value == Value::from("x")));
}

fn program_parser() -> Parser<Value> {
    let mut builder = ParserBuilder::<Value>::new();
    builder.rule("prog", "stmt+", |mut v| v.remove(0)).unwrap();
    builder
        .production("stmt", |c| {
            c.clause("WORD SEMI", |mut v| v.remove(0))?;
            c.clause("ERROR SEMI", |_| Value::from("error"))?;
            Ok(())
        })
        .unwrap();
    builder.finalize().unwrap()
}

#[test]
fn test_recovery_discards_tokens() {
    let parser = program_parser();
    let tokens = vec![
        word("a"),
        op("SEMI"),
        word("b"),
        word("c"),
        op("SEMI"),
        word("d"),
        op("SEMI"),
    ];
    let (result, errors) = parser.parse(tokens).unwrap_err().recovered().unwrap();
    assert_eq!(
        result,
        Value::List(vec![Value::from("a"), Value::from("error"), Value::from("d")])
    );
    assert_eq!(errors.len(), 1);
    let skipped: Vec<_> = errors[0].tokens.iter().map(|t| t.value.clone()).collect();
    assert_eq!(skipped, vec![Some(Value::from("c"))]);
}

#[test]
fn test_recovery_can_be_disabled() {
    let parser = program_parser().with_options(ParseOptions {
        error_recovery: false,
        ..ParseOptions::default()
    });
    let tokens = vec![word("a"), op("SEMI"), word("b"), word("c"), op("SEMI")];
    assert!(matches!(
        parser.parse(tokens),
        Err(ParseError::NotInLanguage { .. })
    ));
}

#[test]
fn test_clean_input_has_no_recovered_errors() {
    let parser = program_parser();
    let tokens = vec![word("a"), op("SEMI"), word("b"), op("SEMI")];
    assert_eq!(
        parser.parse_all(tokens).unwrap(),
        vec![Value::List(vec![Value::from("a"), Value::from("b")])]
    );
}

#[test]
fn test_parser_is_shared_between_threads() {
    let parser = arithmetic();
    std::thread::scope(|scope| {
        for n in 0..4 {
            let parser = parser.clone();
            scope.spawn(move || {
                let tokens = vec![num(n), op("TIMES"), num(n)];
                assert_eq!(parser.parse(tokens).unwrap(), Value::Int(n * n));
            });
        }
    });
}
