mod support;

use std::any::type_name;
use std::collections::{BTreeMap, HashMap};
use std::error::Error as _;

use polyjson::{Codec, Decoder, JsonErrorKind, KeyAsStringEncoder, PolyKey, resolve_key};
use polyjson_testhelpers::{IPanic, test};
use support::*;

fn key(value: impl SpecKey + 'static) -> PolyKey<dyn SpecKey> {
    let value: Box<dyn SpecKey> = Box::new(value);
    PolyKey::new(value).unwrap()
}

fn media_map() -> BTreeMap<PolyKey<dyn SpecKey>, String> {
    BTreeMap::from([
        (key(video(1080, 1920)), "video1080".to_string()),
        (key(video(720, 1280)), "video720".to_string()),
        (key(audio(1)), "audio1".to_string()),
        (key(audio(6)), "audio6".to_string()),
        (key(subtitle("en")), "subtitle_en".to_string()),
        (key(subtitle("de")), "subtitle_de".to_string()),
    ])
}

#[test]
fn interface_keys_encode_as_json_strings() -> Result<(), IPanic> {
    let single = BTreeMap::from([(key(audio(1)), "audio1".to_string())]);
    let js = encoder().to_string(&single)?;
    assert_eq!(js, r#"{"{\"media_type\":\"audio\",\"channels\":1}":"audio1"}"#);
    Ok(())
}

#[test]
fn keys_compare_by_their_json_text() {
    let a1 = key(audio(1));
    assert_eq!(a1.canonical(), r#"{"media_type":"audio","channels":1}"#);
    assert_eq!(a1, key(audio(1)));
    assert!(a1 < key(audio(6)));
    assert!(key(audio(6)) < key(subtitle("de")));
}

#[test]
fn key_strings_always_escape_html() -> Result<(), IPanic> {
    let mp = BTreeMap::from([(key(subtitle("<b>&")), "<i>".to_string())]);
    let js = encoder().to_string(&mp)?;
    assert_eq!(
        js,
        r#"{"{\"media_type\":\"subtitle\",\"Value\":\"\u003cb\u003e\u0026\"}":"<i>"}"#
    );

    let back: BTreeMap<PolyKey<dyn SpecKey>, String> = codec().from_str(&js)?;
    assert_eq!(back, mp);
    Ok(())
}

#[test]
fn interface_keys_round_trip() -> Result<(), IPanic> {
    let mp = media_map();
    let js = encoder().to_string(&mp)?;

    // as plain strings, every key is the key's own encoding
    let plain: BTreeMap<String, String> = codec().from_str(&js)?;
    assert_eq!(plain.len(), mp.len());
    for (k, v) in &mp {
        let text = Codec::default().to_string(k.get())?;
        assert_eq!(plain.get(&text), Some(v), "key {text}");
    }

    let back: BTreeMap<PolyKey<dyn SpecKey>, String> = codec().from_str(&js)?;
    assert_eq!(back, mp);
    let types: Vec<&str> = back.keys().map(|k| k.get().spec_type()).collect();
    assert_eq!(types.iter().filter(|t| **t == "video").count(), 2);
    Ok(())
}

#[test]
fn interface_keys_in_hash_maps() -> Result<(), IPanic> {
    let mp: HashMap<PolyKey<dyn SpecKey>, u32> =
        HashMap::from([(key(audio(2)), 2), (key(subtitle("fr")), 3)]);
    let js = encoder().to_string(&mp)?;
    let back: HashMap<PolyKey<dyn SpecKey>, u32> = codec().from_str(&js)?;
    assert_eq!(back, mp);
    Ok(())
}

#[test]
fn concrete_keys_from_an_allow_list() -> Result<(), IPanic> {
    let codec = Codec::builder()
        .key_encoder(KeyAsStringEncoder::new().with_type::<SpecKeyVideo>())
        .build();
    let mp = BTreeMap::from([
        (video(480, 640), "sd".to_string()),
        (video(2160, 3840), "uhd".to_string()),
    ]);
    let js = codec.to_string(&mp)?;
    let back: BTreeMap<SpecKeyVideo, String> = codec.from_str(&js)?;
    assert_eq!(back, mp);
    Ok(())
}

#[test]
fn explicitly_listed_key_types_are_named() {
    let catalog = catalog();
    let keys = KeyAsStringEncoder::new()
        .interface::<dyn SpecKey>()
        .implementors::<dyn SpecKey>(&catalog)
        .with_type::<SpecKeyVideo>();
    assert_eq!(
        keys.names(),
        [type_name::<dyn SpecKey>(), type_name::<SpecKeyVideo>()]
    );
}

#[test]
fn catalog_implementors_are_accepted_as_keys() -> Result<(), IPanic> {
    let catalog = catalog();
    let codec = Codec::builder()
        .key_encoder(KeyAsStringEncoder::new().implementors::<dyn SpecKey>(&catalog))
        .build();
    let mp = BTreeMap::from([(audio(2), 1u8)]);
    assert_eq!(
        codec.to_string(&mp)?,
        r#"{"{\"media_type\":\"audio\",\"channels\":2}":1}"#
    );
    Ok(())
}

#[test]
fn unlisted_key_types_are_rejected() {
    let mp = BTreeMap::from([(video(480, 640), "sd".to_string())]);
    let err = Codec::default().to_string(&mp).unwrap_err();
    assert!(matches!(err.kind(), JsonErrorKind::UnsupportedMapKey { .. }));

    // listing the interface does not list its implementors
    let codec = Codec::builder()
        .key_encoder(KeyAsStringEncoder::new().interface::<dyn SpecKey>())
        .build();
    let err = codec.to_string(&mp).unwrap_err();
    assert!(matches!(err.kind(), JsonErrorKind::UnsupportedMapKey { .. }));
}

#[test]
fn undecodable_keys_carry_their_cause() {
    let err = codec()
        .from_str::<BTreeMap<PolyKey<dyn SpecKey>, String>>(
            r#"{"{\"media_type\":\"hologram\"}":"x"}"#,
        )
        .unwrap_err();
    let JsonErrorKind::KeyDecode { key, source, .. } = err.kind() else {
        panic!("expected a key error, got {err}");
    };
    assert_eq!(key, r#"{"media_type":"hologram"}"#);
    assert!(matches!(
        source.kind(),
        JsonErrorKind::UnknownVariant { value, .. } if value == "hologram"
    ));
    assert!(err.source().is_some());
}

#[test]
fn null_keys() -> Result<(), IPanic> {
    let codec = codec();
    let de = Decoder::new(b"", &codec);
    assert!(resolve_key::<dyn SpecKey>(&de, "null")?.is_none());
    assert!(resolve_key::<dyn SpecKey>(&de, r#"{"media_type":"audio"}"#)?.is_some());

    let err = codec
        .from_str::<BTreeMap<PolyKey<dyn SpecKey>, String>>(r#"{"null":"x"}"#)
        .unwrap_err();
    assert!(matches!(err.kind(), JsonErrorKind::KeyDecode { .. }));
    Ok(())
}
