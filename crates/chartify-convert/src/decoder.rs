//! Multi-document YAML decoder
//!
//! Produces decoded objects in document order. Empty documents are
//! skipped, `List` documents are flattened into their items, and the
//! first malformed document ends the stream with a `Decode` error.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::io::Read;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::error::{ConvertError, Result};
use crate::object::Object;

/// Iterator over the objects of a YAML stream
pub struct Decoder<'de> {
    documents: serde_yaml::Deserializer<'de>,
    index: usize,
    pending: VecDeque<Result<Object>>,
    failed: bool,
}

/// Decode every object from a reader
pub fn decode<'de, R: Read + 'de>(reader: R) -> Decoder<'de> {
    Decoder {
        documents: serde_yaml::Deserializer::from_reader(reader),
        index: 0,
        pending: VecDeque::new(),
        failed: false,
    }
}

/// Decode every object from a string
pub fn decode_str(input: &str) -> Decoder<'_> {
    Decoder {
        documents: serde_yaml::Deserializer::from_str(input),
        index: 0,
        pending: VecDeque::new(),
        failed: false,
    }
}

impl Iterator for Decoder<'_> {
    type Item = Result<Object>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                if item.is_err() {
                    self.failed = true;
                    self.pending.clear();
                }
                return Some(item);
            }
            if self.failed {
                return None;
            }

            let document = self.documents.next()?;
            let index = self.index;
            self.index += 1;

            match JsonValue::deserialize(document) {
                Ok(JsonValue::Null) => continue,
                Ok(value) => self.pending.extend(expand(value, index)),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(ConvertError::Decode {
                        document: index,
                        message: e.to_string(),
                    }));
                }
            }
        }
    }
}

/// One document to its objects; `List` kinds yield their items
fn expand(value: JsonValue, index: usize) -> Vec<Result<Object>> {
    let is_list = value
        .get("kind")
        .and_then(JsonValue::as_str)
        .is_some_and(|kind| kind.ends_with("List"))
        && value.get("items").is_some_and(JsonValue::is_array);

    if !is_list {
        return vec![Object::from_value(value, index)];
    }

    match value {
        JsonValue::Object(mut map) => match map.remove("items") {
            Some(JsonValue::Array(items)) => items
                .into_iter()
                .filter(|item| !item.is_null())
                .map(|item| Object::from_value(item, index))
                .collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Feed decoded objects into a channel until the input ends, the consumer
/// goes away, or the token is cancelled
///
/// Runs on a blocking thread; a decode error is forwarded and ends the stream.
pub fn produce<R: Read>(
    reader: R,
    sender: &UnboundedSender<Result<Object>>,
    token: &CancellationToken,
) -> usize {
    let mut sent = 0;
    for item in decode(reader) {
        if token.is_cancelled() {
            tracing::debug!(sent, "decoder stopped by cancellation");
            break;
        }
        let failed = item.is_err();
        if sender.send(item).is_err() {
            tracing::debug!(sent, "consumer closed, decoder stopping");
            break;
        }
        sent += 1;
        if failed {
            break;
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<String> {
        decode_str(input)
            .map(|item| item.unwrap().kind().to_string())
            .collect()
    }

    #[test]
    fn test_multi_document() {
        let input = "\
apiVersion: v1
kind: Service
metadata:
  name: web
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
";
        assert_eq!(kinds(input), vec!["Service", "Deployment"]);
    }

    #[test]
    fn test_empty_documents_skipped() {
        let input = "---\n# only a comment\n---\napiVersion: v1\nkind: ConfigMap\n---\n";
        assert_eq!(kinds(input), vec!["ConfigMap"]);
    }

    #[test]
    fn test_list_is_flattened() {
        let input = "\
apiVersion: v1
kind: List
items:
- apiVersion: v1
  kind: ServiceAccount
  metadata:
    name: a
- apiVersion: v1
  kind: Secret
  metadata:
    name: b
";
        assert_eq!(kinds(input), vec!["ServiceAccount", "Secret"]);
    }

    #[test]
    fn test_missing_api_version_stops_stream() {
        let input = "kind: Service\n---\napiVersion: v1\nkind: ConfigMap\n";
        let items: Vec<_> = decode_str(input).collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(ConvertError::Decode { document: 0, .. })
        ));
    }

    #[test]
    fn test_syntax_error_reports_document() {
        let input = "apiVersion: v1\nkind: ConfigMap\n---\nkey: [unclosed\n";
        let items: Vec<_> = decode_str(input).collect();
        assert!(items[0].is_ok());
        assert!(items.last().unwrap().is_err());
    }

    #[test]
    fn test_produce_into_channel() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let input = "apiVersion: v1\nkind: ConfigMap\n---\napiVersion: v1\nkind: Secret\n";

        let sent = produce(input.as_bytes(), &tx, &token);
        assert_eq!(sent, 2);
        assert_eq!(rx.try_recv().unwrap().unwrap().kind(), "ConfigMap");
        assert_eq!(rx.try_recv().unwrap().unwrap().kind(), "Secret");
    }

    #[test]
    fn test_produce_respects_cancellation() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let token = CancellationToken::new();
        token.cancel();

        let sent = produce("apiVersion: v1\nkind: ConfigMap\n".as_bytes(), &tx, &token);
        assert_eq!(sent, 0);
        assert!(rx.try_recv().is_err());
    }
}
