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

use std::collections::BTreeMap;

use jsonpool::sizeof_object;
use jsonpool::sizeof_string;
use jsonpool::to_document;
use jsonpool::Document;
use serde::Serialize;

#[derive(Serialize)]
struct Telemetry {
    device: String,
    uptime: u64,
    temperature: f64,
    flags: Vec<bool>,
    location: Option<(f64, f64)>,
    labels: BTreeMap<String, String>,
    state: State,
}

#[derive(Serialize)]
enum State {
    Idle,
    Error { code: i32 },
}

fn sample(state: State) -> Telemetry {
    let mut labels = BTreeMap::new();
    labels.insert("room".to_string(), "lab".to_string());
    Telemetry {
        device: "sensor-1".to_string(),
        uptime: 86400,
        temperature: 21.5,
        flags: vec![true, false],
        location: Some((48.75, 2.25)),
        labels,
        state,
    }
}

#[test]
fn test_matches_serde_json() {
    for state in [State::Idle, State::Error { code: -2 }] {
        let telemetry = sample(state);
        let mut doc = Document::new();
        to_document(&telemetry, &mut doc).unwrap();
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            serde_json::to_value(&telemetry).unwrap()
        );
        assert_eq!(
            doc.to_json_string(),
            serde_json::to_string(&telemetry).unwrap()
        );
    }
}

#[test]
fn test_field_names_are_linked() {
    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }
    let mut doc = Document::new();
    to_document(&Point { x: 1, y: 2 }, &mut doc).unwrap();
    assert_eq!(doc.memory_usage(), sizeof_object(2));

    let mut map = BTreeMap::new();
    map.insert("x", 1);
    to_document(&map, &mut doc).unwrap();
    assert_eq!(doc.memory_usage(), sizeof_object(1) + sizeof_string(1));
}

#[test]
fn test_msgpack_from_serde() {
    let mut doc = Document::new();
    to_document(&sample(State::Idle), &mut doc).unwrap();
    let copy = Document::from_msgpack(&doc.to_msgpack_vec()).unwrap();
    assert_eq!(copy, doc);
}
