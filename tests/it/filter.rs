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

use jsonpool::parse_json_with;
use jsonpool::sizeof_array;
use jsonpool::sizeof_object;
use jsonpool::sizeof_string;
use jsonpool::DeserializeOptions;
use jsonpool::Document;
use jsonpool::Error;
use jsonpool::Filter;
use jsonpool::SliceReader;

fn parse_filtered(input: &str, filter: &str) -> Result<Document, Error> {
    let filter = Document::from_json(filter.as_bytes()).unwrap();
    let options = DeserializeOptions::default().with_filter(Filter::from(&filter));
    let mut doc = Document::new();
    parse_json_with(&mut doc, SliceReader::new(input.as_bytes()), &options)?;
    Ok(doc)
}

#[test_log::test]
fn test_filter_keeps_listed_members() {
    let input = r#"{"ignore":[1,2,{"x":"a long string that is never stored"}],"include":42}"#;
    let doc = parse_filtered(input, r#"{"include":true}"#).unwrap();
    assert_eq!(doc.to_json_string(), r#"{"include":42}"#);
    assert_eq!(doc.memory_usage(), sizeof_object(1) + sizeof_string(7));
}

#[test_log::test]
fn test_skipped_value_is_still_validated() {
    let filter = r#"{"include":true}"#;
    let test_cases = vec![
        (r#"{"ignore":[1,2"#, Error::IncompleteInput),
        (r#"{"ignore":"unterminated"#, Error::IncompleteInput),
        (r#"{"ignore":[1 2],"include":1}"#, Error::InvalidInput),
        (r#"{"ignore":"\q","include":1}"#, Error::InvalidInput),
        (r#"{"ignore":[[[[[[[[[[[]]]]]]]]]]],"include":1}"#, Error::TooDeep),
    ];
    for (input, expected) in test_cases {
        assert_eq!(
            parse_filtered(input, filter).err(),
            Some(expected),
            "input {}",
            input
        );
    }
}

#[test_log::test]
fn test_array_filter_applies_first_element() {
    let input = r#"{"list":[{"id":1,"name":"a"},{"id":2,"name":"b"}],"count":2}"#;
    let doc = parse_filtered(input, r#"{"list":[{"id":true}]}"#).unwrap();
    assert_eq!(doc.to_json_string(), r#"{"list":[{"id":1},{"id":2}]}"#);

    // only the first element of the filter array matters
    let doc = parse_filtered(input, r#"{"list":[{"name":true},{"id":true}]}"#).unwrap();
    assert_eq!(doc.to_json_string(), r#"{"list":[{"name":"a"},{"name":"b"}]}"#);
}

#[test_log::test]
fn test_wildcard_member() {
    let input = r#"{"a":{"v":1,"w":2},"b":{"v":3},"c":4}"#;
    let doc = parse_filtered(input, r#"{"*":{"v":true}}"#).unwrap();
    assert_eq!(doc.to_json_string(), r#"{"a":{"v":1},"b":{"v":3},"c":null}"#);
}

#[test_log::test]
fn test_root_filters() {
    let input = r#"{"a":[1,2]}"#;
    let doc = parse_filtered(input, "true").unwrap();
    assert_eq!(doc.to_json_string(), input);

    let doc = parse_filtered(input, "false").unwrap();
    assert!(doc.root().is_null());
    assert_eq!(doc.memory_usage(), 0);

    // a filter expecting an array drops an object
    let doc = parse_filtered(input, "[true]").unwrap();
    assert!(doc.root().is_null());
}

#[test_log::test]
fn test_filter_saves_memory() {
    let input = r#"[{"id":1,"payload":"xxxxxxxxxxxxxxxx"},{"id":2,"payload":"yyyyyyyyyyyyyyyy"}]"#;
    let filter = Document::from_json(br#"[{"id":true}]"#).unwrap();
    let needed = sizeof_array(2) + 2 * sizeof_object(1) + sizeof_string(2);
    let mut doc = Document::with_capacity(needed);
    let options = DeserializeOptions::default().with_filter(Filter::from(&filter));
    assert_eq!(
        parse_json_with(&mut doc, SliceReader::new(input.as_bytes()), &options),
        Ok(())
    );
    assert_eq!(doc.memory_usage(), needed);
    assert_eq!(doc.to_json_string(), r#"[{"id":1},{"id":2}]"#);
}
