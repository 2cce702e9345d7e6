use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kirin_dsl::kirin_core::ExtraConstraint;
use kirin_dsl::{merge_constraints, parse, render, validate};

const DSL_MIN: &str = "functionCall fc where fc.name == \"test\" ;";

const DSL_NESTED: &str = r#"
ifBlock i where and(
    i.condition contain binaryOperation b where or(b.lhs contain literal lit ;, b is instanceofExpression) ;,
    not(i.thenBlock contain functionCall fc where fc.name match "log.*" ;),
    i.elseBlock contain returnStatement r ;
) ;
"#;

fn bench_parse(c: &mut Criterion) {
    c.bench_function("dsl/parse_min", |b| {
        b.iter(|| {
            let parsed = parse(black_box(DSL_MIN)).expect("parse DSL");
            black_box(parsed.query.condition.atomics().len());
        });
    });

    c.bench_function("dsl/parse_nested", |b| {
        b.iter(|| {
            let parsed = parse(black_box(DSL_NESTED)).expect("parse DSL");
            black_box(parsed.all_queries().len());
        });
    });
}

fn bench_validate_render(c: &mut Criterion) {
    let parsed = parse(DSL_NESTED).expect("parse DSL");

    c.bench_function("dsl/validate_nested", |b| {
        b.iter(|| {
            let result = validate(black_box(&parsed.query));
            black_box(result.warnings.len());
        });
    });

    c.bench_function("dsl/render_nested", |b| {
        b.iter(|| black_box(render(black_box(&parsed.query), false)));
    });
}

fn bench_merge(c: &mut Criterion) {
    let constraints = vec![
        ExtraConstraint::edit("fc.name", "match", "\"warn.*\"", None),
        ExtraConstraint::del("b.lhs", "contain", None),
        ExtraConstraint::add("r.returnValue", "==", "null"),
    ];

    c.bench_function("writer/merge_nested", |b| {
        b.iter(|| black_box(merge_constraints(black_box(DSL_NESTED), black_box(&constraints))));
    });
}

criterion_group!(benches, bench_parse, bench_validate_render, bench_merge);
criterion_main!(benches);
