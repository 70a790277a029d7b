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

use std::io::Write;

use goldenfile::Mint;
use jsonpool::measure_json;
use jsonpool::measure_json_pretty;
use jsonpool::serialize_json;
use jsonpool::serialize_json_pretty;
use jsonpool::serialize_json_with;
use jsonpool::Document;
use jsonpool::FloatFormat;
use jsonpool::IoWriter;
use jsonpool::PrettyOptions;
use jsonpool::SerializeOptions;
use jsonpool::SliceWriter;

#[test]
fn test_pretty_print() {
    let mut mint = Mint::new("tests/it/testdata");
    let mut file = mint.new_goldenfile("pretty.txt").unwrap();
    let cases = &[
        r#"{"sensor":"gps","time":1351824120,"data":[48.75,2.5]}"#,
        r#"[]"#,
        r#"[[],{},[1,[2]]]"#,
        r#"{"a":"line\nbreak","b":null,"c":true}"#,
        r#""text""#,
        r#"-12"#,
    ];

    for case in cases {
        let doc = Document::from_json(case.as_bytes()).unwrap();
        let mut buf = Vec::new();
        let len = serialize_json_pretty(doc.root(), &mut buf, &PrettyOptions::default());
        assert_eq!(len, buf.len());
        assert_eq!(len, measure_json_pretty(doc.root()));
        writeln!(file, "---------- Input ----------").unwrap();
        writeln!(file, "{}", case).unwrap();
        writeln!(file, "---------- Output ---------").unwrap();
        writeln!(file, "{}", String::from_utf8(buf).unwrap()).unwrap();
        writeln!(file, "\n").unwrap();
    }
}

#[test]
fn test_compact_output_matches_input() {
    let cases = &[
        r#"{"sensor":"gps","time":1351824120,"data":[48.75608,2.302038]}"#,
        r#"[true,false,null,0,-1,18446744073709551615]"#,
        r#"{"nested":{"list":[[],{}],"escaped":"tab\tquote\"slash\\"}}"#,
        r#""\u0001""#,
    ];
    for case in cases {
        let doc = Document::from_json(case.as_bytes()).unwrap();
        assert_eq!(doc.to_json_string(), *case);
        assert_eq!(measure_json(doc.root()), case.len());
    }
}

#[test]
fn test_custom_indent() {
    let doc = Document::from_json(br#"{"a":[1]}"#).unwrap();
    let mut buf = Vec::new();
    let options = PrettyOptions::default().with_indent("\t");
    serialize_json_pretty(doc.root(), &mut buf, &options);
    assert_eq!(buf, b"{\n\t\"a\": [\n\t\t1\n\t]\n}");
}

#[test]
fn test_slice_writer_truncates() {
    let doc = Document::from_json(br#"{"hello":"world"}"#).unwrap();
    let mut buf = [0u8; 8];
    let mut writer = SliceWriter::new(&mut buf);
    assert_eq!(serialize_json(doc.root(), &mut writer), 8);
    assert_eq!(writer.written(), br#"{"hello""#);
}

#[test]
fn test_io_writer() {
    let doc = Document::from_json(br#"[1,"two"]"#).unwrap();
    let mut writer = IoWriter::new(Vec::new());
    assert_eq!(serialize_json(doc.root(), &mut writer), 9);
    assert_eq!(writer.into_inner(), br#"[1,"two"]"#);
}

#[test]
fn test_float_formats() {
    let doc = Document::from_json(b"[0.1,100000000.0,1.5e-10,-2.75]").unwrap();
    assert_eq!(doc.to_json_string(), "[0.1,1e8,1.5e-10,-2.75]");

    let mut buf = Vec::new();
    let options = SerializeOptions::default().with_float_format(FloatFormat::Shortest);
    serialize_json_with(doc.root(), &mut buf, &options);
    assert_eq!(buf, b"[0.1,100000000.0,1.5e-10,-2.75]");
}
