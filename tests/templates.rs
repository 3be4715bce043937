use twigcore::{
    compile_template, evaluate, lexer, Context, DocNode, EvalError, TokenKind, Value,
};

/// Minimal renderer: loops bind their variable in a fresh scope and `set`
/// rebinds the nearest existing variable.
fn render(nodes: &[DocNode], ctx: &mut Context, out: &mut String) -> Result<(), EvalError> {
    for node in nodes {
        match node {
            DocNode::Literal { text } => out.push_str(text),
            DocNode::Expression { ast } => out.push_str(&evaluate(ast, ctx)?.to_string()),
            DocNode::Assignment { name, value, .. } => {
                let value = evaluate(value, ctx)?;
                ctx.assign(name.as_str(), value);
            }
            DocNode::Conditional { condition, body } => {
                if evaluate(condition, ctx)?.is_truthy() {
                    render(body, ctx, out)?;
                }
            }
            DocNode::Loop {
                binding,
                source,
                body,
            } => {
                if let Value::Array(items) = evaluate(source, ctx)? {
                    for item in items {
                        ctx.push_scope();
                        ctx.set(binding.as_str(), item);
                        let rendered = render(body, ctx, out);
                        ctx.pop_scope();
                        rendered?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn data() -> Context {
    Context::from_json(serde_json::json!({
        "data": { "field": [{ "value": 1 }, { "value": 2 }, { "value": 3 }] }
    }))
}

const SUM_TEMPLATE: &str =
    "{% set sum = 0 %}{% for col in data.field %}{% set sum = sum + col.value %}{{ sum }}{% endfor %}";

#[test]
fn nested_block_structure() {
    let nodes = compile_template(SUM_TEMPLATE).unwrap();
    assert_eq!(nodes.len(), 2);
    assert!(matches!(&nodes[0], DocNode::Assignment { name, .. } if name == "sum"));

    let DocNode::Loop {
        binding,
        source,
        body,
    } = &nodes[1]
    else {
        panic!("expected a loop, got {:?}", nodes[1]);
    };
    assert_eq!(binding, "col");
    assert_eq!(source.to_string(), "data.field");
    assert_eq!(body.len(), 2);
    assert!(matches!(
        &body[0],
        DocNode::Assignment { name, value, .. }
            if name == "sum" && value.to_string() == "(sum + col.value)"
    ));
    assert!(matches!(&body[1], DocNode::Expression { ast } if ast.to_string() == "sum"));
}

#[test]
fn loop_accumulates_through_renderer() {
    let nodes = compile_template(SUM_TEMPLATE).unwrap();
    let mut ctx = data();
    let mut out = String::new();
    render(&nodes, &mut ctx, &mut out).unwrap();
    assert_eq!(out, "136");
    assert_eq!(ctx.get("sum"), Some(&Value::Number(6.0)));
}

#[test]
fn literal_text_around_loops() {
    let source = "{% set sum1 = 0 %}{% for col in data.field %}{% set sum1 = sum1 + col.value %}Sum is: {{ sum1 }}{% endfor %}Total: {{ sum1 }} EUR";
    let nodes = compile_template(source).unwrap();
    let mut ctx = data();
    let mut out = String::new();
    render(&nodes, &mut ctx, &mut out).unwrap();
    assert_eq!(out, "Sum is: 1Sum is: 3Sum is: 6Total: 6 EUR");
}

#[test]
fn conditional_inside_loop() {
    let source = "{% for col in data.field %}{% if col.value > 1 %}[{{ col.value }}]{% endif %}{% endfor %}";
    let nodes = compile_template(source).unwrap();
    let mut out = String::new();
    render(&nodes, &mut data(), &mut out).unwrap();
    assert_eq!(out, "[2][3]");
}

#[test]
fn any_end_tag_closes_a_block() {
    let nodes = compile_template("{% if 1 %}x{% end %}y").unwrap();
    assert_eq!(nodes.len(), 2);
}

#[test]
fn html_literals_pass_through() {
    let nodes = compile_template("<b>{{ 2 > 1 }}</b><br/>").unwrap();
    assert_eq!(nodes.len(), 3);
    assert!(matches!(&nodes[0], DocNode::Literal { text } if text == "<b>"));
    assert!(matches!(&nodes[2], DocNode::Literal { text } if text == "</b><br/>"));
}

#[test]
fn literal_tokens_survive_retokenizing() {
    for text in ["plain", "a + b = c", "Total: 6 EUR\n", "<b>bold</b>", "💶 12,50"] {
        let first = lexer::tokenize(text).unwrap();
        assert_eq!(first.len(), 1);
        let token = &first.tokens()[0];
        assert_eq!(token.kind, TokenKind::Text);

        let again = lexer::tokenize(&token.to_string()).unwrap();
        assert_eq!(again.tokens(), first.tokens());
    }
}
