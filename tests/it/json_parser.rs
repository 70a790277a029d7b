// Copyright 2023 Datafuse Labs.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io::Cursor;

use jsonpool::parse_json;
use jsonpool::parse_json_with;
use jsonpool::DeserializeOptions;
use jsonpool::Document;
use jsonpool::Error;
use jsonpool::IoReader;
use jsonpool::JsonOptions;
use jsonpool::SliceReader;

fn parse_with(input: &str, json: JsonOptions) -> Result<Document, Error> {
    let mut doc = Document::new();
    let options = DeserializeOptions::default().with_json(json);
    parse_json_with(&mut doc, SliceReader::new(input.as_bytes()), &options)?;
    Ok(doc)
}

#[test_log::test]
fn test_parse_sample_document() {
    let input = r#"{
        "sensor": "gps",
        "time": 1351824120,
        "data": [48.75608, 2.302038],
        "meta": {"valid": true, "note": null, "unit": "°C"}
    }"#;
    let doc = Document::from_json(input.as_bytes()).unwrap();
    assert_eq!(doc.get("sensor").as_str(), Some("gps"));
    assert_eq!(doc.get("time").as_integral::<i64>(), 1351824120);
    assert_eq!(doc.get("data").len(), 2);
    assert_eq!(doc.get("data").at(0).as_float::<f64>(), 48.75608);
    assert_eq!(doc.get("data").at(1).as_float::<f64>(), 2.302038);
    assert!(doc.get("meta").get("valid").as_bool());
    assert!(doc.get("meta").get("note").is_null());
    assert!(doc.get("meta").contains_key("note"));
    assert!(!doc.get("meta").contains_key("other"));
    assert_eq!(doc.get("meta").get("unit").as_str(), Some("°C"));
    assert_eq!(doc.nesting(), 2);
}

#[test_log::test]
fn test_parse_stream_of_documents() {
    let input = br#"{"id":1} ["two"]  "three""#.to_vec();
    let mut reader = IoReader::new(Cursor::new(input));
    let mut doc = Document::new();
    let options = DeserializeOptions::default();

    parse_json_with(&mut doc, &mut reader, &options).unwrap();
    assert_eq!(doc.to_json_string(), r#"{"id":1}"#);
    parse_json_with(&mut doc, &mut reader, &options).unwrap();
    assert_eq!(doc.to_json_string(), r#"["two"]"#);
    parse_json_with(&mut doc, &mut reader, &options).unwrap();
    assert_eq!(doc.to_json_string(), r#""three""#);
    assert_eq!(
        parse_json_with(&mut doc, &mut reader, &options),
        Err(Error::EmptyInput)
    );
}

#[test_log::test]
fn test_parse_errors() {
    let test_cases = vec![
        ("[1 2]", Error::InvalidInput),
        (r#"{"a" 1}"#, Error::InvalidInput),
        ("{,}", Error::InvalidInput),
        ("tru", Error::IncompleteInput),
        ("trux", Error::InvalidInput),
        (r#""abc"#, Error::IncompleteInput),
        (r#""\x""#, Error::InvalidInput),
        ("-", Error::InvalidInput),
        ("1 x", Error::InvalidInput),
        ("[[[[[[[[[[[]]]]]]]]]]]", Error::TooDeep),
    ];
    for (input, expected) in test_cases {
        let mut doc = Document::new();
        assert_eq!(
            parse_json(&mut doc, input.as_bytes()),
            Err(expected),
            "input {}",
            input
        );
    }
}

#[test_log::test]
fn test_error_keeps_partial_tree() {
    let mut doc = Document::new();
    assert_eq!(
        parse_json(&mut doc, br#"{"a":1,"b":[true,"#),
        Err(Error::IncompleteInput)
    );
    assert_eq!(doc.get("a").as_integral::<i32>(), 1);
    assert!(doc.get("b").at(0).as_bool());
}

#[test_log::test]
fn test_single_quotes_option() {
    let doc = parse_with("{'a':'b'}", JsonOptions::default()).unwrap();
    assert_eq!(doc.to_json_string(), r#"{"a":"b"}"#);

    let strict = JsonOptions::default().with_single_quotes(false);
    assert_eq!(parse_with("'a'", strict).err(), Some(Error::InvalidInput));
    assert_eq!(parse_with("{'a':1}", strict).err(), Some(Error::InvalidInput));
}

#[test_log::test]
fn test_unicode_escapes() {
    let doc = Document::from_json(r#""\ud83d\ude00 \u00e9\u4e2d""#.as_bytes()).unwrap();
    assert_eq!(doc.root().as_str(), Some("😀 é中"));

    // an unpaired surrogate is kept as written
    let doc = Document::from_json(br#""\ud800x""#).unwrap();
    assert_eq!(doc.root().as_str(), Some("\\ud800x"));

    let raw = JsonOptions::default().with_decode_unicode(false);
    let doc = parse_with(r#""\u00e9 \ud83d\ude00""#, raw).unwrap();
    assert_eq!(doc.root().as_str(), Some("\\u00e9 \\ud83d\\ude00"));

    // non-ASCII text passes through unchanged either way
    let doc = parse_with("\"é\"", raw).unwrap();
    assert_eq!(doc.root().as_str(), Some("é"));
}

#[test_log::test]
fn test_comments_between_tokens() {
    let input = "/* head */ { // line\n \"a\" /* k */ : /* v */ [1, /* x */ 2] } ";
    let json = JsonOptions::default().with_comments(true);
    let doc = parse_with(input, json).unwrap();
    assert_eq!(doc.to_json_string(), r#"{"a":[1,2]}"#);

    assert_eq!(
        parse_with(input, JsonOptions::default()).err(),
        Some(Error::InvalidInput)
    );
    assert_eq!(
        parse_with("[1 /* open", json).err(),
        Some(Error::IncompleteInput)
    );
}

#[test_log::test]
fn test_nesting_limit_option() {
    let mut doc = Document::new();
    let input = br#"{"a":{"b":{"c":1}}}"#;
    let options = DeserializeOptions::default().with_nesting_limit(2);
    assert_eq!(
        parse_json_with(&mut doc, SliceReader::new(input), &options),
        Err(Error::TooDeep)
    );
    let options = DeserializeOptions::default().with_nesting_limit(3);
    assert_eq!(
        parse_json_with(&mut doc, SliceReader::new(input), &options),
        Ok(())
    );
    assert_eq!(doc.nesting(), 3);
}
