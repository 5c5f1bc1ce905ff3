use formsmith_parse::{TokenSubType, TokenType, Tokenizer, parse, substitute_references};

#[test]
fn integration_render_roundtrip_and_coverage() {
    let formulas = [
        "2 + 3 * 4",
        "(1+2)/0",
        "-(4 - 10) * .5",
        "\"Total: \" + 12",
        "price * qty",
        "\"a \\\"quoted\\\" word\" + \"\"",
        "  \t7\n",
    ];

    for formula in formulas {
        let tokenizer = Tokenizer::new(formula).unwrap();
        assert_eq!(tokenizer.render(), formula);
        assert_full_span_coverage(formula, &tokenizer);
    }
}

#[test]
fn integration_strict_errors() {
    assert!(Tokenizer::new("1 + ").is_ok());
    assert!(Tokenizer::new("(1 + 2").is_err());
    assert!(Tokenizer::new("1 + 2)").is_err());
    assert!(Tokenizer::new("\"unterminated").is_err());

    let err = Tokenizer::new("1 + 2)").err().unwrap();
    assert_eq!(err.pos, 5);
}

#[test]
fn integration_substituted_formula_parses() {
    let text = substitute_references("a + b", ["a", "b"], |id| match id {
        "a" => "2".to_string(),
        _ => "3".to_string(),
    });
    assert_eq!(text, "2 + 3");
    let ast = parse(&text).unwrap();
    assert_eq!(ast.to_string(), "BinaryOp(+, Literal(2), Literal(3))");

    let tokenizer = Tokenizer::new(&text).unwrap();
    let kinds: Vec<_> = tokenizer
        .significant()
        .map(|t| (t.token_type, t.subtype))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (TokenType::Operand, TokenSubType::Number),
            (TokenType::OpInfix, TokenSubType::None),
            (TokenType::Operand, TokenSubType::Number),
        ]
    );
}

#[test]
fn integration_property_like_random_coverage() {
    let alphabet = [
        '(', ')', '+', '-', '*', '/', '.', '1', '2', '3', '4', '5', 'a', 'b', 'x', '_', '"', '\\',
        ' ', '\n',
    ];

    let mut state = 0xDEAD_BEEF_CAFE_u64;
    for _ in 0..128 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;

        let len = ((state % 32) as usize) + 1;
        let mut formula = String::with_capacity(len);
        let mut cursor = state;
        for _ in 0..len {
            cursor ^= cursor << 5;
            cursor ^= cursor >> 3;
            cursor ^= cursor << 7;
            formula.push(alphabet[(cursor as usize) % alphabet.len()]);
        }

        // Either a clean error or a lossless token stream; never a panic.
        if let Ok(tokenizer) = Tokenizer::new(&formula) {
            assert_eq!(tokenizer.render(), formula);
            assert_full_span_coverage(&formula, &tokenizer);
            let _ = parse(&formula);
        }
    }
}

fn assert_full_span_coverage(formula: &str, tokenizer: &Tokenizer) {
    let mut covered = vec![false; formula.len()];

    for token in &tokenizer.items {
        assert!(token.start <= token.end, "invalid span order {token:?}");
        assert!(token.end <= formula.len(), "span out of bounds {token:?}");
        assert_eq!(&formula[token.start..token.end], token.value);
        for idx in token.start..token.end {
            assert!(!covered[idx], "overlap at {idx} for formula {formula:?}");
            covered[idx] = true;
        }
    }

    if let Some(idx) = covered.iter().position(|c| !c) {
        panic!("uncovered byte {idx} in formula {formula:?}");
    }
}
