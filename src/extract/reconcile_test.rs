use super::*;
use crate::graph::NodeKind;

fn ids(records: &[FinalRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| match r {
            FinalRecord::Node(n) => format!("node:{}", n.id),
            FinalRecord::Edge(e) => format!("edge:{}", e.id),
        })
        .collect()
}

#[test]
fn strip_wrapping_removes_fences_and_language_tag() {
    assert_eq!(strip_wrapping("```json\n{\"nodes\":[]}\n```\n"), "{\"nodes\":[]}");
    assert_eq!(strip_wrapping("  ```\n{}\n```"), "{}");
    assert_eq!(strip_wrapping("```{\"a\":1}```"), "{\"a\":1}");
    assert_eq!(strip_wrapping("{\"edges\":[]}"), "{\"edges\":[]}");
}

#[test]
fn classifies_nodes_then_edges() {
    let buffer = r#"```json
{
  "nodes": [
    {"id":"a1","type":"action","data":{"name":"Phishing"}},
    {"type":"tool","id":"t1","data":{"name":"Mimikatz"}}
  ],
  "edges": [
    {"id":"e1","source":"a1","target":"t1","label":"uses","style":{"stroke":"red"}}
  ]
}
```"#;
    let records = final_records(buffer).unwrap();
    assert_eq!(ids(&records), vec!["node:a1", "node:t1", "edge:e1"]);
    let FinalRecord::Node(tool) = &records[1] else {
        panic!("expected node");
    };
    assert_eq!(tool.kind(), NodeKind::Tool);
}

#[test]
fn edge_inside_nodes_collection_is_routed_to_edges() {
    let buffer = r#"{"nodes":[{"id":"e9","type":"edge","source":"a1","target":"a2"}],"edges":[]}"#;
    let records = final_records(buffer).unwrap();
    assert!(matches!(&records[..], [FinalRecord::Edge(e)] if e.id == "e9"));
}

#[test]
fn invalid_entries_are_skipped_not_fatal() {
    let buffer = r#"{"nodes":[{"id":"x1","type":"campaign","data":{}},{"id":"a1","type":"action","data":{}}],
                    "edges":[{"id":"e1","source":"a1"}]}"#;
    let records = final_records(buffer).unwrap();
    assert_eq!(ids(&records), vec!["node:a1"]);
}

#[test]
fn missing_collections_are_empty() {
    let buffer = r#"{"id":"a1","type":"action","data":{"name":"Phishing"}}"#;
    assert!(final_records(buffer).unwrap().is_empty());
}

#[test]
fn prose_around_document_is_tolerated() {
    let buffer = "Here is the flow:\n{\"nodes\":[{\"id\":\"a1\",\"type\":\"action\",\"data\":{}}]}\nLet me know!";
    assert_eq!(ids(&final_records(buffer).unwrap()), vec!["node:a1"]);
}

#[test]
fn truncated_document_is_an_error() {
    assert!(final_records(r#"{"nodes":[{"id":"a1","type":"action","data":{}"#).is_err());
    assert!(final_records("").is_err());
    assert!(final_records("no json at all").is_err());
}
