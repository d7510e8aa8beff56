use std::collections::VecDeque;

use super::*;
use crate::error::TransportError;
use crate::test_helpers::{RecordingSink, Signal, delta_frame, sample_flow};

/// In-memory source; counts how often it was polled.
struct VecSource {
    chunks: VecDeque<Result<Vec<u8>, TransportError>>,
    polls: usize,
}

impl VecSource {
    fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self { chunks: chunks.into_iter().map(Ok).collect(), polls: 0 }
    }

    fn from_text(text: &str, chunk: usize) -> Self {
        Self::new(text.as_bytes().chunks(chunk).map(<[u8]>::to_vec).collect())
    }

    fn then_fail(mut self, error: TransportError) -> Self {
        self.chunks.push_back(Err(error));
        self
    }

    fn remaining(&self) -> usize {
        self.chunks.len()
    }
}

#[async_trait::async_trait]
impl ChunkSource for VecSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        self.polls += 1;
        self.chunks.pop_front().transpose()
    }
}

/// Frame `flow` as deltas of `piece` chars, optionally followed by `[DONE]`.
fn framed(flow: &str, piece: usize, sentinel: bool) -> String {
    let mut out = String::from("data: {\"type\":\"progress\",\"stage\":\"generate\",\"message\":\"Generating\"}\n\n");
    let chars: Vec<char> = flow.chars().collect();
    for part in chars.chunks(piece) {
        out.push_str(&delta_frame(&part.iter().collect::<String>()));
    }
    if sentinel {
        out.push_str("data: [DONE]\n\n");
    }
    out
}

#[tokio::test]
async fn full_stream_delivers_graph_then_completes() {
    let mut source = VecSource::from_text(&framed(&sample_flow(), 16, true), 37);
    let mut session = ExtractionSession::new(RecordingSink::default());

    let outcome = drive(&mut source, &mut session).await;

    assert_eq!(outcome.status, SessionStatus::Completed);
    assert!(outcome.sentinel);
    let sink = session.into_sink();
    sink.assert_referential_integrity();
    sink.assert_single_terminal_last();
    assert_eq!(sink.node_ids(), vec!["a1", "a2", "t1", "g1", "a3", "as1"]);
    assert_eq!(sink.edge_ids(), vec!["e1", "e2", "e3", "e4", "e5"]);
    // Chunks ending before the first full frame only produce batch ends.
    let first = sink.signals.iter().find(|s| !matches!(s, Signal::BatchEnd));
    assert_eq!(first, Some(&Signal::Progress("generate".into(), "Generating".into())));
    assert!(matches!(sink.signals[0], Signal::BatchEnd | Signal::Progress(..)));
}

#[tokio::test]
async fn byte_level_splits_do_not_matter() {
    let text = framed(&sample_flow(), 5, true);
    for chunk in [1, 2, 13, 4096] {
        let mut source = VecSource::from_text(&text, chunk);
        let mut session = ExtractionSession::new(RecordingSink::default());
        drive(&mut source, &mut session).await;

        let sink = session.into_sink();
        sink.assert_referential_integrity();
        assert_eq!(sink.node_ids().len(), 6, "chunk size {chunk}");
        assert_eq!(sink.edge_ids().len(), 5, "chunk size {chunk}");
    }
}

#[tokio::test]
async fn multibyte_text_split_mid_character_survives() {
    let flow = r#"{"id":"a1","type":"action","data":{"name":"Überwachung → Exfiltration"}}"#;
    let mut source = VecSource::from_text(&framed(flow, 1000, true), 1);
    let mut session = ExtractionSession::new(RecordingSink::default());
    drive(&mut source, &mut session).await;

    let sink = session.into_sink();
    assert_eq!(sink.nodes.len(), 1);
    assert_eq!(sink.nodes[0].payload.caption(), Some("Überwachung → Exfiltration"));
}

#[tokio::test]
async fn eof_without_sentinel_completes() {
    let mut source = VecSource::from_text(&framed(&sample_flow(), 64, false), 100);
    let mut session = ExtractionSession::new(RecordingSink::default());

    let outcome = drive(&mut source, &mut session).await;

    assert_eq!(outcome.status, SessionStatus::Completed);
    assert!(!outcome.sentinel);
    assert_eq!(session.sink().edge_ids().len(), 5);
}

#[tokio::test]
async fn unterminated_last_frame_is_flushed_at_eof() {
    let text = format!(
        "{}data: [DONE]",
        delta_frame(r#"{"id":"a1","type":"action","data":{}}"#)
    );
    let mut source = VecSource::from_text(&text, 1000);
    let mut session = ExtractionSession::new(RecordingSink::default());

    let outcome = drive(&mut source, &mut session).await;

    assert!(outcome.sentinel);
    assert_eq!(session.into_sink().graph_signals(), vec![Signal::Node("a1".into()), Signal::Complete]);
}

#[tokio::test]
async fn provider_error_fails_session_and_drains_transport() {
    let text = format!(
        "{}data: {{\"type\":\"error\",\"error\":{{\"message\":\"overloaded\"}}}}\n\n{}data: [DONE]\n\n",
        delta_frame(r#"{"id":"a1","type":"action","data":{}}"#),
        delta_frame(r#"{"id":"a2","type":"action","data":{}}"#),
    );
    let mut source = VecSource::new(
        text.split_inclusive("\n\n")
            .map(|frame| frame.as_bytes().to_vec())
            .collect(),
    );
    let mut session = ExtractionSession::new(RecordingSink::default());

    let outcome = drive(&mut source, &mut session).await;

    assert_eq!(outcome.status, SessionStatus::Failed);
    assert_eq!(source.remaining(), 0);
    let sink = session.into_sink();
    assert_eq!(
        sink.graph_signals(),
        vec![Signal::Node("a1".into()), Signal::Error(SessionError::Provider("overloaded".into()))]
    );
}

#[tokio::test]
async fn transport_error_fails_session_with_partial_graph() {
    let text = delta_frame(r#"{"nodes":[{"id":"a1","type":"action","data":{}},"#);
    let mut source = VecSource::from_text(&text, 1000).then_fail(TransportError::Request("connection reset".into()));
    let mut session = ExtractionSession::new(RecordingSink::default());

    let outcome = drive(&mut source, &mut session).await;

    assert_eq!(outcome.status, SessionStatus::Failed);
    let sink = session.into_sink();
    assert_eq!(sink.node_ids(), vec!["a1"]);
    assert!(matches!(sink.signals.last(), Some(Signal::Error(SessionError::Transport(_)))));
    sink.assert_single_terminal_last();
}

#[tokio::test]
async fn nothing_is_read_past_the_sentinel() {
    let mut source = VecSource::new(vec![
        delta_frame(r#"{"nodes":[]}"#).into_bytes(),
        b"data: [DONE]\n\n".to_vec(),
        delta_frame(r#"{"id":"late","type":"action","data":{}}"#).into_bytes(),
    ]);
    let mut session = ExtractionSession::new(RecordingSink::default());

    let outcome = drive(&mut source, &mut session).await;

    assert_eq!(outcome.chunks, 2);
    assert_eq!(source.polls, 2);
    assert_eq!(source.remaining(), 1);
    assert_eq!(session.into_sink().signals.last(), Some(&Signal::Complete));
}

#[tokio::test]
async fn batch_end_follows_every_chunk_while_streaming() {
    let mut source = VecSource::new(vec![
        delta_frame(r#"{"id":"a1","type":"action","data":{}}"#).into_bytes(),
        b": keep-alive\n\n".to_vec(),
        b"data: [DONE]\n\n".to_vec(),
    ]);
    let mut session = ExtractionSession::new(RecordingSink::default());
    drive(&mut source, &mut session).await;

    assert_eq!(
        session.into_sink().signals,
        vec![Signal::Node("a1".into()), Signal::BatchEnd, Signal::BatchEnd, Signal::Complete]
    );
}

#[tokio::test]
async fn empty_stream_is_a_final_decode_error() {
    let mut source = VecSource::new(Vec::new());
    let mut session = ExtractionSession::new(RecordingSink::default());

    let outcome = drive(&mut source, &mut session).await;

    assert_eq!(outcome.status, SessionStatus::Failed);
    assert!(matches!(session.into_sink().signals.as_slice(), [Signal::Error(SessionError::FinalDecode(_))]));
}
