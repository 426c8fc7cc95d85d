use pretty_assertions::assert_eq;
use rally_query::{Combinator, Expression, Literal, Operator, build};

fn render(block: impl FnOnce(&mut rally_query::Group)) -> String {
    build(block).expect("expression").render()
}

// ── Single terms ─────────────────────────────────────────────────

#[test]
fn single_statement() {
    assert_eq!(render(|q| { q.equal("name", "name"); }), "(Name = name)");
}

#[test]
fn value_with_spaces_is_quoted() {
    assert_eq!(
        render(|q| { q.equal("name", "My Name"); }),
        "(Name = \"My Name\")"
    );
}

#[test]
fn null_value() {
    assert_eq!(render(|q| { q.equal("name", Literal::Null); }), "(Name = null)");
    let missing: Option<&str> = None;
    assert_eq!(render(|q| { q.equal("name", missing); }), "(Name = null)");
}

#[test]
fn boolean_and_integer_values() {
    assert_eq!(render(|q| { q.equal("blocked", true); }), "(Blocked = true)");
    assert_eq!(render(|q| { q.gt("object_i_d", 0); }), "(ObjectID > 0)");
}

#[test]
fn attribute_is_camelized() {
    assert_eq!(
        render(|q| { q.not_equal("iteration_name", "iteration"); }),
        "(IterationName != iteration)"
    );
}

#[test]
fn attribute_path_is_camelized_per_segment() {
    assert_eq!(
        render(|q| { q.contains("card.iteration_name", "iteration"); }),
        "(Card.IterationName contains iteration)"
    );
}

#[test]
fn every_operator_and_alias() {
    let cases: [(&str, fn(&mut rally_query::Group)); 11] = [
        ("=", |q| { q.equal("a", 1); }),
        ("!=", |q| { q.not_equal("a", 1); }),
        ("contains", |q| { q.contains("a", 1); }),
        (">", |q| { q.greater_than("a", 1); }),
        (">", |q| { q.gt("a", 1); }),
        ("<", |q| { q.less_than("a", 1); }),
        ("<", |q| { q.lt("a", 1); }),
        (">=", |q| { q.greater_than_equal("a", 1); }),
        (">=", |q| { q.gte("a", 1); }),
        ("<=", |q| { q.less_than_equal("a", 1); }),
        ("<=", |q| { q.lte("a", 1); }),
    ];
    for (op, block) in cases {
        assert_eq!(render(block), format!("(A {op} 1)"));
    }
}

// ── Grouping ─────────────────────────────────────────────────────

#[test]
fn default_grouping_is_and() {
    assert_eq!(
        render(|q| {
            q.equal("a", 1);
            q.equal("b", 2);
        }),
        "((A = 1) and (B = 2))"
    );
}

#[test]
fn three_ands_nest_to_the_left() {
    assert_eq!(
        render(|q| {
            q.equal("name", "name");
            q.equal("description", "description");
            q.lte("notes", "notes");
        }),
        "(((Name = name) and (Description = description)) and (Notes <= notes))"
    );
}

#[test]
fn explicit_or() {
    assert_eq!(
        render(|q| {
            q.or(|q| {
                q.equal("name", "name");
                q.gte("description", "description");
            });
        }),
        "((Name = name) or (Description >= description))"
    );
}

#[test]
fn and_inside_or() {
    assert_eq!(
        render(|q| {
            q.or(|q| {
                q.and(|q| {
                    q.equal("name", "name");
                    q.greater_than_equal("description", "description");
                });
                q.equal("notes", "notes");
            });
        }),
        "(((Name = name) and (Description >= description)) or (Notes = notes))"
    );
}

#[test]
fn or_followed_by_sibling_term() {
    assert_eq!(
        render(|q| {
            q.or(|q| {
                q.equal("name", "name");
                q.equal("description", "description");
            });
            q.equal("notes", "notes");
        }),
        "(((Name = name) or (Description = description)) and (Notes = notes))"
    );
}

#[test]
fn or_then_and_group() {
    assert_eq!(
        render(|q| {
            q.or(|q| {
                q.equal("name", "name");
                q.equal("description", "description");
            });
            q.and(|q| {
                q.equal("notes", "notes");
                q.equal("start_date", "start");
            });
        }),
        "(((Name = name) or (Description = description)) and ((Notes = notes) and (StartDate = start)))"
    );
}

#[test]
fn three_ors_with_three_ands() {
    assert_eq!(
        render(|q| {
            q.and(|q| {
                q.or(|q| {
                    q.equal("name", "name1");
                    q.equal("description", "description1");
                    q.equal("other", "other1");
                });
                q.and(|q| {
                    q.equal("notes", "notes2");
                    q.equal("start_date", "start2");
                    q.equal("other", "other2");
                });
            });
        }),
        "((((Name = name1) or (Description = description1)) or (Other = other1)) and (((Notes = notes2) and (StartDate = start2)) and (Other = other2)))"
    );
}

#[test]
fn anded_ors() {
    assert_eq!(
        render(|q| {
            q.or(|q| {
                q.equal("name", "name1");
                q.equal("name", "name2");
            });
            q.or(|q| {
                q.equal("name", "name3");
                q.equal("name", "name4");
            });
        }),
        "(((Name = name1) or (Name = name2)) and ((Name = name3) or (Name = name4)))"
    );
}

#[test]
fn empty_block_builds_nothing() {
    assert!(build(|_| {}).is_none());
}

// ── Tree shape ───────────────────────────────────────────────────

#[test]
fn construction_is_left_leaning_not_balanced() {
    let expr = build(|q| {
        q.equal("a", 1);
        q.equal("b", 2);
        q.equal("c", 3);
    })
    .unwrap();

    let expected = Expression::combine(
        Expression::combine(
            Expression::term("a", Operator::Equal, 1),
            Combinator::And,
            Expression::term("b", Operator::Equal, 2),
        ),
        Combinator::And,
        Expression::term("c", Operator::Equal, 3),
    );
    assert_eq!(expr, expected);
}

#[test]
fn expression_serde_roundtrip() {
    let expr = build(|q| {
        q.or(|q| {
            q.equal("name", "My Name");
            q.equal("state", Literal::Null);
        });
        q.gt("plan_estimate", 3);
    })
    .unwrap();
    let json = serde_json::to_string(&expr).unwrap();
    let back: Expression = serde_json::from_str(&json).unwrap();
    assert_eq!(back, expr);
    assert_eq!(back.render(), expr.render());
}
