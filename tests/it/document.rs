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

use jsonpool::parse_json;
use jsonpool::sizeof_array;
use jsonpool::sizeof_object;
use jsonpool::sizeof_string;
use jsonpool::Document;
use jsonpool::Error;
use jsonpool::Scalar;

#[test]
fn test_build_and_query() {
    let mut doc = Document::new();
    let mut root = doc.root_mut();
    root.insert("name", "device");
    root.insert("id", 7u8);
    {
        let mut readings = root.member_linked("readings").unwrap();
        readings.push(1.5);
        readings.push(-2);
        let mut nested = readings.add_element().unwrap();
        nested.insert("ok", true);
    }

    let root = doc.root();
    assert_eq!(root.len(), 3);
    assert_eq!(root.get("name").as_str(), Some("device"));
    assert_eq!(root.get("readings").at(1).as_integral::<i32>(), -2);
    assert!(root.get("readings").at(2).get("ok").as_bool());
    let keys: Vec<&str> = root.members().map(|(key, _)| key).collect();
    assert_eq!(keys, ["name", "id", "readings"]);
    let sum: f64 = root
        .get("readings")
        .elements()
        .map(|v| v.as_float::<f64>())
        .sum();
    assert_eq!(sum, -0.5);
    assert_eq!(
        doc.to_string(),
        r#"{"name":"device","id":7,"readings":[1.5,-2,{"ok":true}]}"#
    );
}

#[test]
fn test_duplicates_fit_exact_capacity() {
    let mut doc = Document::with_capacity(sizeof_array(2) + sizeof_string(1));
    assert_eq!(parse_json(&mut doc, br#"["x","x"]"#), Ok(()));
    assert_eq!(doc.memory_usage(), doc.capacity());
    assert!(!doc.overflowed());

    let mut doc = Document::with_capacity(sizeof_object(1) + sizeof_string(1));
    assert_eq!(parse_json(&mut doc, br#"{"a":1,"a":2}"#), Ok(()));
    assert_eq!(doc.to_json_string(), r#"{"a":2}"#);
    assert_eq!(doc.memory_usage(), doc.capacity());

    // one byte less and the second element no longer fits
    let mut doc = Document::with_capacity(sizeof_array(2) + sizeof_string(1) - 1);
    assert_eq!(parse_json(&mut doc, br#"["x","x"]"#), Err(Error::NoMemory));
}

#[test]
fn test_many_distinct_strings() {
    let input = format!(
        "[{}]",
        (0..20000)
            .map(|i| format!("\"s{i}\""))
            .collect::<Vec<_>>()
            .join(",")
    );
    let doc = Document::from_json(input.as_bytes()).unwrap();
    assert_eq!(doc.root().len(), 20000);
    assert_eq!(doc.at(12345).as_str(), Some("s12345"));
}

#[test]
fn test_strings_are_deduplicated() {
    let mut doc = Document::new();
    let mut root = doc.root_mut();
    root.push("same");
    root.push("same");
    root.push(Scalar::Linked("linked"));
    assert_eq!(doc.memory_usage(), sizeof_array(3) + sizeof_string(4));

    let doc = Document::from_json(br#"[{"key":"key"},{"key":"value"}]"#).unwrap();
    assert_eq!(
        doc.memory_usage(),
        sizeof_array(2) + 2 * sizeof_object(1) + sizeof_string(3) + sizeof_string(5)
    );
}

#[test]
fn test_removal_leaves_garbage_until_shrink() {
    let mut doc = Document::from_json(br#"["first","second"]"#).unwrap();
    let full = sizeof_array(2) + sizeof_string(5) + sizeof_string(6);
    assert_eq!(doc.memory_usage(), full);

    assert!(doc.root_mut().remove_element(0));
    assert_eq!(doc.memory_usage(), full);
    assert_eq!(doc.to_json_string(), r#"["second"]"#);

    doc.shrink_to_fit();
    assert_eq!(doc.memory_usage(), sizeof_array(1) + sizeof_string(6));
    assert_eq!(doc.to_json_string(), r#"["second"]"#);
}

#[test]
fn test_fixed_capacity_overflow() {
    let mut doc = Document::with_capacity(sizeof_array(2));
    assert_eq!(parse_json(&mut doc, b"[1,2,3]"), Err(Error::NoMemory));
    assert!(doc.overflowed());
    assert_eq!(doc.to_json_string(), "[1,2]");

    // values that cannot be stored read as null
    let mut doc = Document::with_capacity(sizeof_array(1));
    assert!(!doc.root_mut().push("does not fit"));
    assert!(doc.overflowed());
    assert_eq!(doc.to_json_string(), "[null]");

    doc.clear();
    assert!(!doc.overflowed());
    assert!(doc.root().is_null());
    assert_eq!(doc.memory_usage(), 0);
}

#[test]
fn test_copy_between_documents() {
    let src = Document::from_json(br#"{"list":[1,"two",{"three":3.5}]}"#).unwrap();
    let mut dst = Document::with_capacity(1024);
    assert!(dst.root_mut().set_variant(src.get("list")));
    assert_eq!(dst.to_json_string(), r#"[1,"two",{"three":3.5}]"#);
    assert_eq!(dst.root(), src.get("list"));
    assert_eq!(dst.nesting(), 2);
}

#[test]
fn test_numbers_compare_by_value() {
    let a = Document::from_json(b"[1,2.0,-3]").unwrap();
    let b = Document::from_json(b"[1.0,2,-3.0]").unwrap();
    assert_eq!(a, b);
    let c = Document::from_json(b"[1,2,3]").unwrap();
    assert_ne!(a, c);
}
