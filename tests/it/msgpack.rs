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

use jsonpool::measure_msgpack;
use jsonpool::parse_msgpack;
use jsonpool::parse_msgpack_with;
use jsonpool::serialize_msgpack;
use jsonpool::DeserializeOptions;
use jsonpool::Document;
use jsonpool::Error;
use jsonpool::Filter;
use jsonpool::IoReader;
use jsonpool::SliceReader;
use jsonpool::SliceWriter;

#[test_log::test]
fn test_json_to_msgpack_and_back() {
    let json = r#"{"sensor":"gps","time":1351824120,"data":[48.75608,2.302038],"ok":true,"none":null,"neg":-300}"#;
    let doc = Document::from_json(json.as_bytes()).unwrap();
    let bytes = doc.to_msgpack_vec();
    assert_eq!(measure_msgpack(doc.root()), bytes.len());

    let copy = Document::from_msgpack(&bytes).unwrap();
    assert_eq!(copy, doc);
    assert_eq!(copy.to_json_string(), json);
    assert_eq!(copy.to_msgpack_vec(), bytes);
}

#[test_log::test]
fn test_encode_known_vectors() {
    let test_cases: Vec<(&str, Vec<u8>)> = vec![
        ("42", vec![0x2A]),
        ("1000", vec![0xCD, 0x03, 0xE8]),
        ("-1", vec![0xFF]),
        ("0.5", vec![0xCA, 0x3F, 0x00, 0x00, 0x00]),
        (r#""abc""#, vec![0xA3, b'a', b'b', b'c']),
        ("[]", vec![0x90]),
        ("{}", vec![0x80]),
        (
            r#"{"a":[true,null]}"#,
            vec![0x81, 0xA1, b'a', 0x92, 0xC3, 0xC0],
        ),
    ];
    for (json, expected) in test_cases {
        let doc = Document::from_json(json.as_bytes()).unwrap();
        assert_eq!(doc.to_msgpack_vec(), expected, "json {}", json);
    }
}

#[test_log::test]
fn test_reserved_byte_rejected_everywhere() {
    let inputs: Vec<&[u8]> = vec![
        &[0xC1],
        &[0x91, 0xC1],
        &[0x81, 0xA1, b'k', 0xC1],
        &[0x81, 0xC1, 0x01],
    ];
    for input in inputs {
        let mut doc = Document::new();
        assert_eq!(
            parse_msgpack(&mut doc, input),
            Err(Error::InvalidInput),
            "{:02X?}",
            input
        );
    }

    // inside a value dropped by the filter
    let filter = Document::from_json(br#"{"keep":true}"#).unwrap();
    let options = DeserializeOptions::default().with_filter(Filter::from(&filter));
    let input = [0x82, 0xA4, b'd', b'r', b'o', b'p', 0x91, 0xC1, 0xA4, b'k', b'e', b'e', b'p', 0x01];
    let mut doc = Document::new();
    assert_eq!(
        parse_msgpack_with(&mut doc, SliceReader::new(&input), &options),
        Err(Error::InvalidInput)
    );
    let mut fixed = input;
    fixed[7] = 0xC0;
    assert_eq!(
        parse_msgpack_with(&mut doc, SliceReader::new(&fixed), &options),
        Ok(())
    );
    assert_eq!(doc.to_json_string(), r#"{"keep":1}"#);
}

#[test_log::test]
fn test_parse_stream_of_values() {
    let input = vec![0x91, 0x01, 0xA2, b'o', b'k', 0xC3];
    let mut reader = IoReader::new(Cursor::new(input));
    let mut doc = Document::new();
    let options = DeserializeOptions::default();

    parse_msgpack_with(&mut doc, &mut reader, &options).unwrap();
    assert_eq!(doc.to_json_string(), "[1]");
    parse_msgpack_with(&mut doc, &mut reader, &options).unwrap();
    assert_eq!(doc.to_json_string(), r#""ok""#);
    parse_msgpack_with(&mut doc, &mut reader, &options).unwrap();
    assert_eq!(doc.to_json_string(), "true");
    assert_eq!(
        parse_msgpack_with(&mut doc, &mut reader, &options),
        Err(Error::EmptyInput)
    );
}

#[test_log::test]
fn test_binary_survives_round_trip() {
    let input = [0x82, 0xA3, b'b', b'i', b'n', 0xC4, 0x03, 0x00, 0x01, 0x02, 0xA3, b'e', b'x', b't', 0xD5, 0x07, 0xAB, 0xCD];
    let doc = Document::from_msgpack(&input).unwrap();
    assert!(doc.get("bin").is_raw());
    assert_eq!(doc.get("ext").as_raw(), Some(&[0xD5, 0x07, 0xAB, 0xCD][..]));
    assert_eq!(doc.to_msgpack_vec(), input);
}

#[test_log::test]
fn test_serialize_into_small_buffer() {
    let doc = Document::from_json(br#"["hello","world"]"#).unwrap();
    let mut buf = [0u8; 4];
    let mut writer = SliceWriter::new(&mut buf);
    assert_eq!(serialize_msgpack(doc.root(), &mut writer), 4);
    assert_eq!(writer.written(), &[0x92, 0xA5, b'h', b'e']);
    assert_eq!(measure_msgpack(doc.root()), 13);
}
