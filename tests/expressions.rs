use twigcore::{
    compile_expression, evaluate, CompileError, Context, EvalError, UndefinedBehavior, Value,
};

fn eval(source: &str) -> Value {
    let ast = compile_expression(source).unwrap();
    evaluate(&ast, &Context::new()).unwrap()
}

fn eval_in(source: &str, ctx: &Context) -> Result<Value, EvalError> {
    evaluate(&compile_expression(source).unwrap(), ctx)
}

// ── Arithmetic and precedence ──

#[test]
fn standard_precedence() {
    assert_eq!(eval("{{ 2 + 5 * 3 + 1 }}"), Value::Number(18.0));
}

#[test]
fn parentheses_override_precedence() {
    assert_eq!(eval("{{ 2 + 5 * (3 + 1) }}"), Value::Number(22.0));
    assert_eq!(eval("{{ (2 + 5) * 3 }}"), Value::Number(21.0));
}

#[test]
fn left_associativity() {
    assert_eq!(eval("{{ 10 - 4 - 3 }}"), Value::Number(3.0));
    assert_eq!(eval("{{ 64 / 4 / 2 }}"), Value::Number(8.0));
    assert_eq!(eval("{{ 2 * 9 / 3 }}"), Value::Number(6.0));
}

#[test]
fn decimals() {
    assert_eq!(eval("{{ 1.5 * 4 }}"), Value::Number(6.0));
    assert_eq!(eval("{{ 0.25 + 0.5 }}"), Value::Number(0.75));
}

#[test]
fn comparison_returns_bool() {
    assert_eq!(eval("{{ 2 > 1 }}"), Value::Bool(true));
    assert_eq!(eval("{{2>1}}"), Value::Bool(true));
    assert_eq!(eval("{{ 1 > 2 }}"), Value::Bool(false));
    assert_eq!(eval("{{ 1 + 1 > 1 }}"), Value::Bool(true));
}

#[test]
fn division_by_zero_is_not_an_error() {
    assert_eq!(eval("{{ 1 / 0 }}"), Value::Number(f64::INFINITY));
    assert_eq!(eval("{{ 0 - 1 / 0 }}"), Value::Number(f64::NEG_INFINITY));
    match eval("{{ 0 / 0 }}") {
        Value::Number(n) => assert!(n.is_nan()),
        other => panic!("expected NaN, got {other:?}"),
    }
}

// ── Literal coercion ──

#[test]
fn quoted_strings_are_preserved() {
    assert_eq!(eval("{{ 'abc' }}"), Value::String("abc".into()));
    assert_eq!(eval("{{ \"two words\" }}"), Value::String("two words".into()));
}

#[test]
fn quoted_numbers_coerce() {
    assert_eq!(eval("{{ '42' }}"), Value::Number(42.0));
    assert_eq!(eval("{{ '40' + 2 }}"), Value::Number(42.0));
}

#[test]
fn partially_numeric_strings_do_not_coerce() {
    match eval_in("{{ 15 + '2a3b' }}", &Context::new()) {
        Ok(Value::Number(n)) => assert!(n.is_nan()),
        other => panic!("expected NaN, got {other:?}"),
    }
    match eval("{{ 'abc' - 1 }}") {
        Value::Number(n) => assert!(n.is_nan()),
        other => panic!("expected NaN, got {other:?}"),
    }
}

// ── Variables ──

#[test]
fn variables_resolve_from_context() {
    let ctx = Context::from_json(serde_json::json!({
        "price": 12.5,
        "qty": 4,
        "data": { "field1_1": 7 }
    }));
    assert_eq!(eval_in("{{ price * qty }}", &ctx), Ok(Value::Number(50.0)));
    assert_eq!(eval_in("{{ data.field1_1 }}", &ctx), Ok(Value::Number(7.0)));
    assert_eq!(eval_in("{{ data.field1_1 > 5 }}", &ctx), Ok(Value::Bool(true)));
}

#[test]
fn missing_variables_are_null_by_default() {
    let ctx = Context::new();
    assert_eq!(eval_in("{{ missing }}", &ctx), Ok(Value::Null));
    assert_eq!(eval_in("{{ missing + 1 }}", &ctx), Ok(Value::Number(1.0)));
}

#[test]
fn missing_variables_fail_when_strict() {
    let ctx = Context::new().with_undefined(UndefinedBehavior::Strict);
    assert_eq!(
        eval_in("{{ 1 + data.field }}", &ctx),
        Err(EvalError::UnresolvedVariable {
            path: "data.field".into()
        })
    );
}

#[test]
fn context_from_hash_map() {
    let mut vars = std::collections::HashMap::new();
    vars.insert("a".to_string(), Value::Number(3.0));
    let ctx = Context::from(vars);
    assert_eq!(eval_in("{{ a * a }}", &ctx), Ok(Value::Number(9.0)));
}

// ── Failures ──

#[test]
fn empty_source() {
    assert!(matches!(
        compile_expression(""),
        Err(CompileError::EmptyInput { .. })
    ));
}

#[test]
fn unterminated_expression() {
    assert!(matches!(
        compile_expression("{{ 1 + 2"),
        Err(CompileError::UnterminatedExpression { .. })
    ));
}

#[test]
fn unmatched_parenthesis() {
    assert!(matches!(
        compile_expression("{{ (1 + 2 }}"),
        Err(CompileError::UnexpectedToken { .. })
    ));
}

#[test]
fn dangling_operator() {
    assert!(matches!(
        compile_expression("{{ 1 * }}"),
        Err(CompileError::UnexpectedEndOfExpression { .. })
    ));
}
