use std::collections::HashMap;
use stencil::{Engine, Value};

fn engine_for(files: &[(&str, &str)]) -> Engine {
    let (engine, provider) = Engine::in_memory();
    for (name, text) in files {
        provider.add(*name, text.as_bytes().to_vec());
    }
    engine
}

fn kwargs(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn scenario_1_hello_world() {
    let engine = engine_for(&[("t.txt", "hello {{ name }}")]);
    let out = engine.render("t.txt", kwargs(&[("name", Value::from("world"))])).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "hello world");
}

#[test]
fn scenario_2_autoescape_escapes_html() {
    let engine = engine_for(&[("t.html", "{{ x }}")]);
    let out = engine.render("t.html", kwargs(&[("x", Value::from("<b>"))])).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "&lt;b&gt;");
}

#[test]
fn scenario_3_if_elif_else() {
    let engine = engine_for(&[(
        "t.txt",
        "{% if n>0 %}pos{% elif n<0 %}neg{% else %}zero{% end %}",
    )]);
    let out = engine.render("t.txt", kwargs(&[("n", Value::Number(0.0))])).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "zero");
}

#[test]
fn scenario_4_inheritance_override() {
    let engine = engine_for(&[
        ("parent.txt", "A[{% block t %}d{% end %}]B"),
        ("child.txt", "{% extends \"parent.txt\" %}{% block t %}X{% end %}"),
    ]);
    let out = engine.render("child.txt", HashMap::new()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "A[X]B");
}

#[test]
fn scenario_5_apply_uppercases() {
    let engine = engine_for(&[("t.txt", "{% apply upper %}hi {{x}}{% end %}")]);
    let mut args = kwargs(&[("x", Value::from("there"))]);
    args.insert(
        "upper".to_string(),
        Value::native(|a| {
            let s = a.first().map(Value::stringify).unwrap_or_default();
            Ok(Value::Str(s.to_uppercase()))
        }),
    );
    let out = engine.render("t.txt", args).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "HI THERE");
}

#[test]
fn scenario_6_break_stops_the_loop() {
    let engine = engine_for(&[(
        "t.txt",
        "{% for i in range(3) %}{{i}}{% if i==1 %}{% break %}{% end %}{% end %}",
    )]);
    let out = engine.render("t.txt", HashMap::new()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "01");
}

#[test]
fn scenario_7_whitespace_oneline_collapses() {
    let engine = engine_for(&[("t.txt", "{% whitespace oneline %}a  \n  b")]);
    let out = engine.render("t.txt", HashMap::new()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "a b");
}

#[test]
fn scenario_8_escaped_double_brace_is_literal() {
    let engine = engine_for(&[("t.txt", "{{! literal }}")]);
    let out = engine.render("t.txt", HashMap::new()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "{{ literal }}");
}

#[test]
fn escape_round_trip_preserves_escaped_directives() {
    let engine = engine_for(&[("t.txt", "{{! a }} and {%! b %}")]);
    let out = engine.render("t.txt", HashMap::new()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "{{ a }} and {% b %}");
}

#[test]
fn raw_bypasses_autoescape() {
    let engine = engine_for(&[("t.html", "{% raw x %}")]);
    let out = engine.render("t.html", kwargs(&[("x", Value::from("<x>"))])).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "<x>");
}

#[test]
fn include_does_not_leak_its_autoescape_directive() {
    let engine = engine_for(&[
        ("outer.html", "{{ a }}{% include \"inner.html\" %}{{ a }}"),
        ("inner.html", "{% autoescape None %}{{ a }}"),
    ]);
    let out = engine.render("outer.html", kwargs(&[("a", Value::from("<x>"))])).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "&lt;x&gt;<x>&lt;x&gt;");
}

#[test]
fn whitespace_mode_is_scoped_to_the_file_that_sets_it() {
    let engine = engine_for(&[
        ("outer.txt", "a  b{% include \"inner.txt\" %}c  d"),
        ("inner.txt", "{% whitespace oneline %}x  \n  y"),
    ]);
    let out = engine.render("outer.txt", HashMap::new()).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("x y"));
    assert!(text.contains("a  b"));
    assert!(text.contains("c  d"));
}

#[test]
fn reserved_prefix_kwarg_is_rejected() {
    let engine = engine_for(&[("t.txt", "{{ _tt_x }}")]);
    let err = engine
        .render("t.txt", kwargs(&[("_tt_x", Value::from("boom"))]))
        .unwrap_err();
    assert!(matches!(err, stencil::EngineError::Render(stencil::RenderError::ReservedArgument(_))));
}

#[test]
fn pre_guard_preserves_whitespace_inside_pre() {
    // `.html` defaults to `single` whitespace mode, which would otherwise
    // collapse the run of spaces and the newline inside `<pre>`.
    let engine = engine_for(&[("t.html", "<pre>a  \n  b</pre>")]);
    let out = engine.render("t.html", HashMap::new()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "<pre>a  \n  b</pre>");
}

#[test]
fn module_without_host_namespace_fails_at_render_time() {
    let engine = engine_for(&[("t.html", "{% module Widget(x) %}")]);
    let err = engine.render("t.html", HashMap::new()).unwrap_err();
    assert!(matches!(
        err,
        stencil::EngineError::Render(stencil::RenderError::MissingModules { .. })
    ));
}

#[test]
fn missing_template_surfaces_as_engine_error() {
    let engine = engine_for(&[]);
    let err = engine.render("missing.txt", HashMap::new()).unwrap_err();
    assert!(matches!(err, stencil::EngineError::Loader(stencil::LoaderError::NotFound(_))));
}

#[test]
fn finally_runs_after_a_caught_exception() {
    let engine = engine_for(&[(
        "t.txt",
        "{% try %}{{ 1/0 }}{% except %}caught{% finally %}done{% end %}",
    )]);
    let out = engine.render("t.txt", HashMap::new()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "caughtdone");
}

#[test]
fn finally_runs_even_when_except_body_itself_raises() {
    let engine = engine_for(&[(
        "t.txt",
        "{% try %}{{ 1/0 }}{% except %}{{ boom }}{% finally %}done{% end %}",
    )]);
    let err = engine.render("t.txt", HashMap::new()).unwrap_err();
    assert!(matches!(err, stencil::EngineError::Render(_)));
}

#[test]
fn set_statement_with_import_like_prefixed_name_binds_correctly() {
    let engine = engine_for(&[("t.txt", "{% set fromCount = 5 %}{{ fromCount }}")]);
    let out = engine.render("t.txt", HashMap::new()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "5");
}

#[test]
fn comment_tag_is_discarded_without_requiring_end() {
    let engine = engine_for(&[("t.txt", "foo{% comment note %}bar")]);
    let out = engine.render("t.txt", HashMap::new()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "foobar");
}

#[test]
fn reset_forces_recompilation() {
    let (engine, provider) = Engine::in_memory();
    provider.add("t.txt", b"v1".to_vec());
    let first = engine.render("t.txt", HashMap::new()).unwrap();
    assert_eq!(first, b"v1".to_vec());
    provider.add("t.txt", b"v2".to_vec());
    // Without a reset the cached compiled template from the first render wins.
    let cached = engine.render("t.txt", HashMap::new()).unwrap();
    assert_eq!(cached, b"v1".to_vec());
    engine.reset();
    let fresh = engine.render("t.txt", HashMap::new()).unwrap();
    assert_eq!(fresh, b"v2".to_vec());
}
