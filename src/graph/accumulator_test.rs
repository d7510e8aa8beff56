use std::sync::{Arc, Mutex};

use super::*;
use crate::extract::ExtractionSession;
use crate::test_helpers::sample_flow;

#[test]
fn nothing_is_laid_out_before_a_batch_ends() {
    let mut session = ExtractionSession::new(GraphAccumulator::new(LayoutConfig::default()));
    session.push_delta(r#"{"id":"a1","type":"action","data":{}}"#);

    let acc = session.sink();
    assert_eq!(acc.nodes().len(), 1);
    assert_eq!(acc.layouts(), 0);
    assert!(acc.snapshot().nodes.is_empty());
}

#[test]
fn batch_end_relayouts_only_when_dirty() {
    let mut session = ExtractionSession::new(GraphAccumulator::new(LayoutConfig::default()));
    session.push_delta(r#"{"id":"a1","type":"action","data":{}}"#);
    session.batch_end();
    session.batch_end();
    assert_eq!(session.sink().layouts(), 1);

    session.push_delta(r#"{"id":"a2","type":"action","data":{}}"#);
    session.batch_end();
    let acc = session.sink();
    assert_eq!(acc.layouts(), 2);
    assert_eq!(acc.snapshot().nodes.len(), 2);
    assert!(acc.snapshot().nodes.iter().all(|n| n.position.is_some()));
}

#[test]
fn completion_produces_final_layout_with_every_record() {
    let mut session = ExtractionSession::new(GraphAccumulator::new(LayoutConfig::default()));
    session.push_delta(&sample_flow());
    session.complete();

    let (result, outcome) = session.into_sink().into_parts();
    assert_eq!(outcome, Some(Outcome::Completed));
    assert_eq!(result.nodes.len(), 6);
    assert_eq!(result.edges.len(), 5);
    assert!(result.position_of("a3").is_some());
}

#[test]
fn failure_keeps_partial_graph_laid_out() {
    let mut session = ExtractionSession::new(GraphAccumulator::new(LayoutConfig::default()));
    session.push_delta(r#"{"nodes":[{"id":"a1","type":"action","data":{}},"#);
    session.fail(SessionError::Transport("connection reset".into()));

    let acc = session.into_sink();
    assert_eq!(acc.snapshot().nodes.len(), 1);
    assert!(matches!(acc.outcome(), Some(Outcome::Failed(SessionError::Transport(_)))));
}

#[test]
fn observer_sees_each_snapshot() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    let acc = GraphAccumulator::new(LayoutConfig::default())
        .with_observer(move |snapshot| record.lock().unwrap().push(snapshot.nodes.len()));

    let mut session = ExtractionSession::new(acc);
    session.push_delta(r#"{"id":"a1","type":"action","data":{}}"#);
    session.batch_end();
    session.push_delta(r#"{"id":"a2","type":"tool","data":{}}"#);
    session.complete();

    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
}

#[test]
fn progress_is_remembered() {
    let mut acc = GraphAccumulator::new(LayoutConfig::default());
    acc.on_progress("fetch", "Fetching URL");
    acc.on_progress("generate", "Generating flow");
    assert_eq!(acc.last_progress(), Some(("generate", "Generating flow")));
}
