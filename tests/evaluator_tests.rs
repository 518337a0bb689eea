use approx::assert_relative_eq;
use funcplot::error::EvalError;
use funcplot::evaluator::{Bindings, Evaluator, Expression, MAX_DEPTH, MathEvaluator};

fn at(expression: &str, x: f64) -> Result<f64, EvalError> {
    let mut bindings = Bindings::new();
    bindings.insert("x".to_string(), x);
    MathEvaluator.evaluate(expression, &bindings)
}

#[test]
fn polynomials_follow_usual_precedence() {
    assert_eq!(at("2x^2 - 3x + 1", 2.0), Ok(3.0));
    assert_eq!(at("-x^2", 3.0), Ok(-9.0));
    assert_eq!(at("(x + 1) * (x - 1) / 4", 3.0), Ok(2.0));
    assert_eq!(at("7 % 4 + 2 * 3", 0.0), Ok(9.0));
}

#[test]
fn implicit_multiplication() {
    assert_eq!(at("2(x+1)", 3.0), Ok(8.0));
    assert_eq!(at("(x+1)(x-1)", 3.0), Ok(8.0));
    assert_eq!(at("2 sin(0)", 1.0), Ok(0.0));
    assert_relative_eq!(at("2pi", 0.0).unwrap(), std::f64::consts::TAU);
    // Same precedence as `*`: 6 / 2x = (6 / 2) * x
    assert_eq!(at("6 / 2x", 3.0), Ok(9.0));
}

#[test]
fn functions_and_constants() {
    assert_relative_eq!(at("sin(pi / 2)", 0.0).unwrap(), 1.0);
    assert_relative_eq!(at("log(e)", 0.0).unwrap(), 1.0);
    assert_relative_eq!(at("log(100, 10)", 0.0).unwrap(), 2.0, epsilon = 1e-12);
    assert_relative_eq!(at("log10(1000) + log2(8)", 0.0).unwrap(), 6.0, epsilon = 1e-12);
    assert_relative_eq!(at("exp(x)", 1.0).unwrap(), std::f64::consts::E);
    assert_eq!(at("min(3, x, 2)", 1.0), Ok(1.0));
    assert_eq!(at("max(3, x, 2)", 5.0), Ok(5.0));
    assert_eq!(at("abs(x) + floor(2.7) + ceil(0.2)", -4.0), Ok(7.0));
    assert_eq!(at("pow(2, 10)", 0.0), Ok(1024.0));
    assert_relative_eq!(at("atan2(1, 1)", 0.0).unwrap(), std::f64::consts::FRAC_PI_4);
}

#[test]
fn bindings_shadow_constants() {
    let mut bindings = Bindings::new();
    bindings.insert("e".to_string(), 2.0);
    assert_eq!(MathEvaluator.evaluate("e^3", &bindings), Ok(8.0));
}

#[test]
fn domain_errors_are_reported() {
    assert!(matches!(at("1/x", 0.0), Err(EvalError::Domain(_))));
    assert!(matches!(at("x % 0", 3.0), Err(EvalError::Domain(_))));
    assert!(matches!(at("sqrt(x)", -1.0), Err(EvalError::Domain(_))));
    assert!(matches!(at("log(x)", 0.0), Err(EvalError::Domain(_))));
    assert!(matches!(at("asin(x)", 2.0), Err(EvalError::Domain(_))));
    assert!(matches!(at("(-8)^(1/3)", 0.0), Err(EvalError::Domain(_))));
}

#[test]
fn syntax_errors_carry_positions() {
    assert_eq!(at("", 0.0), Err(EvalError::Empty));
    assert_eq!(at("   ", 0.0), Err(EvalError::Empty));
    assert_eq!(at("2 +", 0.0), Err(EvalError::UnexpectedEnd));
    assert_eq!(at("(x", 0.0), Err(EvalError::UnexpectedEnd));
    assert_eq!(
        at("x $ 2", 0.0),
        Err(EvalError::UnexpectedChar { ch: '$', pos: 2 })
    );
    assert_eq!(
        at("x )", 0.0),
        Err(EvalError::UnexpectedToken {
            found: ")".to_string(),
            pos: 2
        })
    );
}

#[test]
fn unknown_names_and_arity() {
    assert_eq!(at("y + 1", 0.0), Err(EvalError::UndefinedSymbol("y".to_string())));
    assert_eq!(at("foo(1)", 0.0), Err(EvalError::UnknownFunction("foo".to_string())));
    assert!(matches!(
        at("sin(1, 2)", 0.0),
        Err(EvalError::Arity { found: 2, .. })
    ));
    assert!(matches!(at("max()", 0.0), Err(EvalError::Arity { found: 0, .. })));
}

#[test]
fn parsed_expression_is_reusable() {
    let expression: Expression = "x^3 - x".parse().unwrap();
    let mut bindings = Bindings::new();
    let values: Vec<f64> = [-1.0, 0.0, 2.0]
        .iter()
        .map(|&x| {
            bindings.insert("x".to_string(), x);
            expression.eval(&bindings).unwrap()
        })
        .collect();
    assert_eq!(values, vec![0.0, 0.0, 6.0]);
}

#[test]
fn closures_are_evaluators() {
    let constant = |_: &str, _: &Bindings| -> Result<f64, EvalError> { Ok(42.0) };
    assert_eq!(constant.evaluate("anything", &Bindings::new()), Ok(42.0));
}

#[test]
fn pathological_nesting_is_rejected() {
    let parens = 200_000;
    let nested = format!("{}x{}", "(".repeat(parens), ")".repeat(parens));
    assert_eq!(at(&nested, 1.0), Err(EvalError::TooDeep(MAX_DEPTH)));

    let signs = format!("{}x", "-".repeat(100_000));
    assert_eq!(at(&signs, 1.0), Err(EvalError::TooDeep(MAX_DEPTH)));

    let calls = format!("{}x{}", "sin(".repeat(50_000), ")".repeat(50_000));
    assert_eq!(at(&calls, 1.0), Err(EvalError::TooDeep(MAX_DEPTH)));

    let towers = vec!["x"; 50_000].join("^");
    assert_eq!(at(&towers, 1.0), Err(EvalError::TooDeep(MAX_DEPTH)));
}

#[test]
fn long_operator_chains_are_rejected() {
    let sum = vec!["x"; 100_000].join("+");
    assert_eq!(at(&sum, 1.0), Err(EvalError::TooDeep(MAX_DEPTH)));

    let product = vec!["x"; 100_000].join(" ");
    assert_eq!(at(&product, 1.0), Err(EvalError::TooDeep(MAX_DEPTH)));
}

#[test]
fn moderate_nesting_still_evaluates() {
    let nested = format!("{}x + 1{}", "(".repeat(50), ")".repeat(50));
    assert_eq!(at(&nested, 2.0), Ok(3.0));

    let sum = vec!["x"; 100].join(" + ");
    assert_eq!(at(&sum, 0.5), Ok(50.0));
    assert_eq!(at("--x", 4.0), Ok(4.0));
}
