#![allow(dead_code)]

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;

use polyjson::{
    Codec, Decode, Encode, InterfaceBinding, KeyAsStringEncoder, Poly, Registry, StructuredKey,
    TypeCatalog, TypeMapping,
};

pub fn same<T: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

// ----- Intf -----

pub trait Intf: Decode + Encode + Debug {
    fn as_any(&self) -> &dyn Any;
}
polyjson::interface!(dyn Intf);

impl PartialEq for dyn Intf {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.as_any(), other.as_any());
        same::<ImplA>(a, b) || same::<ImplB>(a, b) || same::<Nested>(a, b)
    }
}

pub fn intf(value: impl Intf + 'static) -> Poly<dyn Intf> {
    let value: Box<dyn Intf> = Box::new(value);
    Poly::new(value)
}

#[derive(Debug, Default, PartialEq)]
pub struct ImplA {
    pub ty: String,
    pub a: String,
}
polyjson::json_object!(ImplA { ty => "type", a => "a" });

impl Intf for ImplA {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn impl_a(a: &str) -> Poly<dyn Intf> {
    intf(ImplA {
        ty: "ImplA".into(),
        a: a.into(),
    })
}

#[derive(Debug, Default, PartialEq)]
pub struct ImplB {
    pub ty: String,
    pub b: String,
}
polyjson::json_object!(ImplB { ty => "type", b => "b" });

impl Intf for ImplB {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn impl_b(b: &str) -> Poly<dyn Intf> {
    intf(ImplB {
        ty: "ImplB".into(),
        b: b.into(),
    })
}

#[derive(Debug, Default, PartialEq)]
pub struct Nested {
    pub ty: String,
    pub b: String,
    pub cplx: Option<Cplx>,
    pub d: Poly<dyn Intf>,
}
polyjson::json_object!(Nested { ty => "type", b => "b", cplx => "cplx", d => "d" });

impl Intf for Nested {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Cplx {
    pub intf: Poly<dyn Intf>,
}
polyjson::json_object!(Cplx { intf => "intf" });

#[derive(Debug, Default, PartialEq)]
pub struct Upper {
    pub cplx: Option<Cplx>,
}
polyjson::json_object!(Upper { cplx => "cplx" });

#[derive(Debug, Default, PartialEq)]
pub struct Multi {
    pub right: Poly<dyn Intf>,
    pub left: Poly<dyn Intf>,
}
polyjson::json_object!(Multi { right => "right", left => "left" });

#[derive(Debug, Default, PartialEq)]
pub struct NestedOwner {
    pub nested: Poly<dyn Intf>,
}
polyjson::json_object!(NestedOwner { nested => "nested" });

// ----- Expr -----

pub trait Expr: Decode + Encode + Debug {
    fn as_any(&self) -> &dyn Any;
    fn eval(&self) -> bool;
}
polyjson::interface!(dyn Expr);

impl PartialEq for dyn Expr {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.as_any(), other.as_any());
        same::<Sub1>(a, b)
            || same::<Sub2>(a, b)
            || same::<And>(a, b)
            || same::<Or>(a, b)
            || same::<Boolean>(a, b)
    }
}

pub fn expr(value: impl Expr + 'static) -> Poly<dyn Expr> {
    let value: Box<dyn Expr> = Box::new(value);
    Poly::new(value)
}

fn eval(e: &Poly<dyn Expr>) -> bool {
    e.get().is_some_and(|e| e.eval())
}

#[derive(Debug, Default, PartialEq)]
pub struct Sub1 {
    pub ty: String,
    pub expr: Poly<dyn Expr>,
}
polyjson::json_object!(Sub1 { ty => "type", expr => "expr" });

impl Expr for Sub1 {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eval(&self) -> bool {
        eval(&self.expr)
    }
}

pub fn sub1(inner: Poly<dyn Expr>) -> Poly<dyn Expr> {
    expr(Sub1 {
        ty: "sub1".into(),
        expr: inner,
    })
}

#[derive(Debug, Default, PartialEq)]
pub struct Sub2 {
    pub ty: String,
    pub expr: Poly<dyn Expr>,
}
polyjson::json_object!(Sub2 { ty => "type", expr => "expr" });

impl Expr for Sub2 {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eval(&self) -> bool {
        !eval(&self.expr)
    }
}

pub fn sub2(inner: Poly<dyn Expr>) -> Poly<dyn Expr> {
    expr(Sub2 {
        ty: "sub2".into(),
        expr: inner,
    })
}

#[derive(Debug, Default, PartialEq)]
pub struct And {
    pub ty: String,
    pub exprs: Vec<Poly<dyn Expr>>,
}
polyjson::json_object!(And { ty => "type", exprs => "exprs" });

impl Expr for And {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eval(&self) -> bool {
        self.exprs.iter().all(eval)
    }
}

pub fn and(exprs: Vec<Poly<dyn Expr>>) -> Poly<dyn Expr> {
    expr(And {
        ty: "and".into(),
        exprs,
    })
}

#[derive(Debug, Default, PartialEq)]
pub struct Or {
    pub ty: String,
    pub exprs: Vec<Poly<dyn Expr>>,
}
polyjson::json_object!(Or { ty => "type", exprs => "exprs" });

impl Expr for Or {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eval(&self) -> bool {
        self.exprs.iter().any(eval)
    }
}

pub fn or(exprs: Vec<Poly<dyn Expr>>) -> Poly<dyn Expr> {
    expr(Or {
        ty: "or".into(),
        exprs,
    })
}

#[derive(Debug, Default, PartialEq)]
pub struct Boolean {
    pub ty: String,
    pub val: bool,
}
polyjson::json_object!(Boolean { ty => "type", val => "val" });

impl Expr for Boolean {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eval(&self) -> bool {
        self.val
    }
}

pub fn boolean(val: bool) -> Poly<dyn Expr> {
    expr(Boolean {
        ty: "bool".into(),
        val,
    })
}

#[derive(Debug, Default, PartialEq)]
pub struct Recursor {
    pub expr: Poly<dyn Expr>,
}
polyjson::json_object!(Recursor { expr => "expr" });

#[derive(Debug, Default, PartialEq)]
pub struct Evaluator {
    pub expr: Poly<dyn Expr>,
}
polyjson::json_object!(Evaluator { expr => "expr" });

#[derive(Debug, Default, PartialEq)]
pub struct EvaluatorMap {
    pub exprs: BTreeMap<String, Poly<dyn Expr>>,
}
polyjson::json_object!(EvaluatorMap { exprs => "exprs" });

// ----- map keys -----

pub trait SpecKey: Decode + Encode + Debug {
    fn spec_type(&self) -> &str;
}
polyjson::interface!(dyn SpecKey);

#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpecKeyAudio {
    pub media_type: String,
    pub channels: i64,
}
polyjson::json_object!(SpecKeyAudio { media_type => "media_type", channels => "channels" });
impl StructuredKey for SpecKeyAudio {}

impl SpecKey for SpecKeyAudio {
    fn spec_type(&self) -> &str {
        &self.media_type
    }
}

pub fn audio(channels: i64) -> SpecKeyAudio {
    SpecKeyAudio {
        media_type: "audio".into(),
        channels,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpecKeyVideo {
    pub media_type: String,
    pub height: i64,
    pub width: i64,
}
polyjson::json_object!(SpecKeyVideo {
    media_type => "media_type",
    height => "height",
    width => "width",
});
impl StructuredKey for SpecKeyVideo {}

impl SpecKey for SpecKeyVideo {
    fn spec_type(&self) -> &str {
        &self.media_type
    }
}

pub fn video(height: i64, width: i64) -> SpecKeyVideo {
    SpecKeyVideo {
        media_type: "video".into(),
        height,
        width,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpecKeySubtitle {
    pub media_type: String,
    pub value: String,
}
polyjson::json_object!(SpecKeySubtitle { media_type => "media_type", value => "Value" });
impl StructuredKey for SpecKeySubtitle {}

impl SpecKey for SpecKeySubtitle {
    fn spec_type(&self) -> &str {
        &self.media_type
    }
}

pub fn subtitle(value: &str) -> SpecKeySubtitle {
    SpecKeySubtitle {
        media_type: "subtitle".into(),
        value: value.into(),
    }
}

// ----- registration -----

pub fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    catalog.register::<dyn Intf, ImplA>("support::ImplA", |v| v).unwrap();
    catalog.register::<dyn Intf, ImplB>("support::ImplB", |v| v).unwrap();
    catalog.register::<dyn Intf, Nested>("support::Nested", |v| v).unwrap();

    catalog.register::<dyn Expr, Sub1>("support::Sub1", |v| v).unwrap();
    catalog.register::<dyn Expr, Sub2>("support::Sub2", |v| v).unwrap();
    catalog.register::<dyn Expr, And>("support::And", |v| v).unwrap();
    catalog.register::<dyn Expr, Or>("support::Or", |v| v).unwrap();
    catalog.register::<dyn Expr, Boolean>("support::Boolean", |v| v).unwrap();

    catalog
        .register::<dyn SpecKey, SpecKeyVideo>("support::SpecKeyVideo", |v| v)
        .unwrap();
    catalog
        .register::<dyn SpecKey, SpecKeyAudio>("support::SpecKeyAudio", |v| v)
        .unwrap();
    catalog
        .register::<dyn SpecKey, SpecKeySubtitle>("support::SpecKeySubtitle", |v| v)
        .unwrap();
    catalog
}

pub fn intf_mapping() -> TypeMapping {
    TypeMapping::new("type")
        .sub_type("ImplA", "support::ImplA")
        .sub_type("ImplB", "support::ImplB")
        .sub_type("Nested", "support::Nested")
}

pub fn expr_mapping() -> TypeMapping {
    TypeMapping::new("type")
        .sub_type("sub1", "support::Sub1")
        .sub_type("sub2", "support::Sub2")
        .sub_type("and", "support::And")
        .sub_type("or", "support::Or")
        .sub_type("bool", "support::Boolean")
}

pub fn spec_key_mapping() -> TypeMapping {
    TypeMapping::new("media_type")
        .sub_type("video", "support::SpecKeyVideo")
        .sub_type("audio", "support::SpecKeyAudio")
        .sub_type("subtitle", "support::SpecKeySubtitle")
}

/// `dyn Intf` bound through the builder rather than a catalog.
pub fn intf_binding() -> polyjson::Result<InterfaceBinding<dyn Intf>> {
    InterfaceBinding::<dyn Intf>::builder("type")
        .variant::<ImplA>("ImplA", |v| v)?
        .variant::<ImplB>("ImplB", |v| v)?
        .variant::<Nested>("Nested", |v| v)?
        .build()
}

pub fn key_encoder(catalog: &TypeCatalog) -> KeyAsStringEncoder {
    KeyAsStringEncoder::new()
        .interface::<dyn SpecKey>()
        .implementors::<dyn SpecKey>(catalog)
}

/// Decoding codec with every test interface bound.
pub fn codec() -> Codec {
    let catalog = catalog();
    let registry = Registry::builder()
        .register::<dyn Intf>(&catalog, &intf_mapping())
        .and_then(|b| b.register::<dyn Expr>(&catalog, &expr_mapping()))
        .and_then(|b| b.register::<dyn SpecKey>(&catalog, &spec_key_mapping()))
        .unwrap()
        .build();
    Codec::builder()
        .registry(registry)
        .key_encoder(key_encoder(&catalog))
        .build()
}

/// Encoding codec without bindings and with sorted map keys.
pub fn encoder() -> Codec {
    Codec::builder()
        .sort_map_keys(true)
        .key_encoder(key_encoder(&catalog()))
        .build()
}
