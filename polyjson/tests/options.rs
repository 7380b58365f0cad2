mod support;

use std::collections::HashMap;

use miette::Diagnostic;
use polyjson::{Codec, DecodeOptions, EncodeOptions, JsonErrorKind, Poly, Registry};
use polyjson_testhelpers::{IPanic, test};
use static_assertions::assert_impl_all;
use support::*;

assert_impl_all!(Codec: Send, Sync);
assert_impl_all!(Registry: Send, Sync);
assert_impl_all!(polyjson::JsonError: Send, Sync, std::error::Error);

fn deep_recursor(depth: usize) -> String {
    let mut js = String::from(r#"{"expr":"#);
    for _ in 0..depth {
        js.push_str(r#"{"type":"sub1","expr":"#);
    }
    js.push_str("null");
    js.push_str(&"}".repeat(depth + 1));
    js
}

#[test]
fn codec_is_shared_across_threads() {
    let codec = codec();
    std::thread::scope(|s| {
        for i in 0..4 {
            let codec = &codec;
            s.spawn(move || {
                let js = format!(r#"{{"intf":{{"type":"ImplA","a":"{i}"}}}}"#);
                let c: Cplx = codec.from_str(&js).unwrap();
                assert_eq!(c.intf, impl_a(&i.to_string()));
            });
        }
    });
}

#[test]
fn nesting_is_limited() -> Result<(), IPanic> {
    let js = deep_recursor(200);
    let err = codec().from_str::<Recursor>(&js).unwrap_err();
    assert!(matches!(
        err.kind(),
        JsonErrorKind::DepthLimitExceeded { limit: 128 }
    ));

    let shallow: Recursor = codec().from_str(&deep_recursor(100))?;
    assert!(shallow.expr.is_some());

    let tight = Codec::builder()
        .registry(expr_registry())
        .max_depth(8)
        .build();
    let err = tight.from_str::<Recursor>(&deep_recursor(20)).unwrap_err();
    assert!(matches!(
        err.kind(),
        JsonErrorKind::DepthLimitExceeded { limit: 8 }
    ));
    Ok(())
}

#[test]
fn depth_limit_above_ceiling_is_clamped() {
    assert_eq!(
        DecodeOptions::new().max_depth(512).max_depth,
        DecodeOptions::MAX_DEPTH
    );

    let raised = Codec::builder()
        .registry(expr_registry())
        .decode_options(DecodeOptions::new().max_depth(512))
        .build();
    assert_eq!(raised.decode_options().depth_limit(), 128);
    let err = raised
        .from_str::<Recursor>(&deep_recursor(200))
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        JsonErrorKind::DepthLimitExceeded { limit: 128 }
    ));

    let mut options = DecodeOptions::new();
    options.max_depth = 10_000;
    let direct = Codec::builder()
        .registry(expr_registry())
        .decode_options(options)
        .build();
    let err = direct
        .from_str::<Recursor>(&deep_recursor(200))
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        JsonErrorKind::DepthLimitExceeded { limit: 128 }
    ));
}

fn expr_registry() -> Registry {
    let catalog = catalog();
    Registry::builder()
        .register::<dyn Expr>(&catalog, &expr_mapping())
        .map(|b| b.build())
        .unwrap()
}

#[test]
fn html_characters_can_be_escaped() -> Result<(), IPanic> {
    let c = Cplx {
        intf: impl_a("<b>&"),
    };
    assert_eq!(
        Codec::default().to_string(&c)?,
        r#"{"intf":{"type":"ImplA","a":"<b>&"}}"#
    );

    let escaping = Codec::builder()
        .encode_options(EncodeOptions::new().escape_html(true))
        .build();
    let js = escaping.to_string(&c)?;
    assert_eq!(
        js,
        r#"{"intf":{"type":"ImplA","a":"\u003cb\u003e\u0026"}}"#
    );
    let back: Cplx = codec().from_str(&js)?;
    assert_eq!(back, c);
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct Sparse {
    intf: Poly<dyn Intf>,
    tags: Vec<String>,
    note: Option<String>,
}
polyjson::json_object!(Sparse {
    intf => "intf" [omit_empty],
    tags => "tags" [omit_empty],
    note => "note",
});

#[test]
fn empty_fields_can_be_omitted() -> Result<(), IPanic> {
    let codec = codec();
    let empty = Sparse::default();
    assert_eq!(codec.to_string(&empty)?, r#"{"note":null}"#);
    assert_eq!(codec.from_str::<Sparse>(r#"{"note":null}"#)?, empty);

    let full = Sparse {
        intf: impl_b("x"),
        tags: vec!["t".into()],
        note: Some("n".into()),
    };
    let js = codec.to_string(&full)?;
    assert_eq!(
        js,
        r#"{"intf":{"type":"ImplB","b":"x"},"tags":["t"],"note":"n"}"#
    );
    assert_eq!(codec.to_vec(&full)?, js.as_bytes());
    assert_eq!(codec.from_str::<Sparse>(&js)?, full);
    Ok(())
}

#[test]
fn map_keys_can_be_sorted() -> Result<(), IPanic> {
    let map = HashMap::from([("b", 2u32), ("a", 1), ("c", 3)].map(|(k, v)| (k.to_string(), v)));
    assert_eq!(encoder().to_string(&map)?, r#"{"a":1,"b":2,"c":3}"#);
    Ok(())
}

#[test]
fn errors_are_diagnostics() {
    let input = r#"{"intf":{"type":"Bla","a":"abcd"}}"#;
    let err = codec().from_str::<Cplx>(input).unwrap_err();

    assert_eq!(
        err.code().map(|c| c.to_string()).as_deref(),
        Some("polyjson::unknown_variant")
    );
    assert!(err.source_code().is_some());
    let labels: Vec<_> = err.labels().into_iter().flatten().collect();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].offset(), 16);
    assert_eq!(labels[0].len(), 5);
}

#[test]
fn trailing_characters_are_rejected() {
    let err = codec().from_str::<Cplx>(r#"{"intf":null} {}"#).unwrap_err();
    insta::assert_snapshot!(err, @"trailing characters after value");
}

#[test]
fn syntax_errors_name_what_was_expected() {
    let err = codec().from_str::<Cplx>(r#"{"intf":null "x"}"#).unwrap_err();
    insta::assert_snapshot!(err, @"unexpected token: got string, expected ',' or '}'");
}
