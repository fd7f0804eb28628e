use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tracing::debug;

use crate::body::Body;
use crate::error::{Operation, ResponseError};
use crate::header::HeaderMap;

/// The settled outcome of one handler invocation.
///
/// A snapshot taken at the moment the handler completed its response.
/// Anything the handler does to its builder afterwards is not reflected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Body,
    pub headers: HeaderMap,
}

impl HandlerResponse {
    /// The body as text, with structured values rendered as JSON.
    pub fn body_text(&self) -> String {
        self.body.to_string()
    }
}

/// First argument of [`ResponseBuilder::set`]: a single header name or a
/// whole map of headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderField {
    Name(String),
    Map(HeaderMap),
}

impl HeaderField {
    fn shape(&self) -> &'static str {
        match self {
            HeaderField::Name(_) => "string",
            HeaderField::Map(_) => "object",
        }
    }
}

impl From<&str> for HeaderField {
    fn from(name: &str) -> Self {
        HeaderField::Name(name.to_owned())
    }
}

impl From<String> for HeaderField {
    fn from(name: String) -> Self {
        HeaderField::Name(name)
    }
}

impl From<HeaderMap> for HeaderField {
    fn from(map: HeaderMap) -> Self {
        HeaderField::Map(map)
    }
}

/// Stub of the mutable response object that serverless handlers receive.
///
/// Supports the minimal subset needed to observe a final outcome:
/// [`status`](Self::status), [`write`](Self::write), [`end`](Self::end),
/// [`send`](Self::send) and the header setters. Every other member of the
/// mimicked response object is present but returns
/// [`ResponseError::UnsupportedOperation`].
///
/// One builder exists per invocation and the handler owns it outright, so
/// it can be moved into spawned tasks or callbacks freely. Completion goes
/// through a oneshot channel; the first [`end`](Self::end) consumes the
/// sender and later ones have nothing left to settle.
#[derive(Debug)]
pub struct ResponseBuilder {
    status: u16,
    body: Body,
    headers: HeaderMap,
    completion: Option<oneshot::Sender<HandlerResponse>>,
}

impl ResponseBuilder {
    pub(crate) fn new(default_status: u16, completion: oneshot::Sender<HandlerResponse>) -> Self {
        Self {
            status: default_status,
            body: Body::default(),
            headers: HeaderMap::new(),
            completion: Some(completion),
        }
    }

    /// Set the status code reported on completion.
    pub fn status(&mut self, code: u16) -> &mut Self {
        self.status = code;
        self
    }

    /// Buffer a body chunk. Never completes the response.
    pub fn write(&mut self, chunk: &str) -> bool {
        self.body.append(chunk);
        true
    }

    /// Complete the response with the current status, body and headers.
    pub fn end(&mut self) {
        let Some(completion) = self.completion.take() else {
            return;
        };

        let response = HandlerResponse {
            status: self.status,
            body: self.body.clone(),
            headers: self.headers.clone(),
        };
        debug!(
            status = response.status,
            body = response.body.kind(),
            headers = response.headers.len(),
            "handler response completed"
        );

        // A closed receiver means the caller dropped the future.
        let _ = completion.send(response);
    }

    /// Write and complete in one call.
    ///
    /// Text is appended to whatever was already written. An object, array
    /// or `null` replaces the buffered body entirely. Bare numbers and
    /// booleans are not bodies: the buffered body is kept as is and the
    /// response just completes.
    pub fn send(&mut self, body: impl Into<Body>) -> &mut Self {
        match body.into() {
            Body::Text(text) => {
                self.write(&text);
            }
            Body::Json(Value::Number(_) | Value::Bool(_)) => {}
            json @ Body::Json(_) => self.body = json,
        }
        self.end();
        self
    }

    /// Loosely-typed header setter mirroring the two call shapes of the
    /// mimicked `set`: `(name, Some(value))` or `(map, None)`.
    pub fn set(
        &mut self,
        field: impl Into<HeaderField>,
        value: Option<&str>,
    ) -> Result<&mut Self, ResponseError> {
        match (field.into(), value) {
            (HeaderField::Name(name), Some(value)) => Ok(self.set_header(name, value)),
            (HeaderField::Map(map), None) => {
                self.headers.merge(map);
                Ok(self)
            }
            (field, value) => Err(ResponseError::InvalidArgument {
                field: field.shape(),
                value: if value.is_some() { "string" } else { "undefined" },
            }),
        }
    }

    /// Set a single header, overwriting any previous value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Merge several headers at once; later entries win.
    pub fn set_headers<I, N, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        self.headers.merge(headers.into_iter().collect());
        self
    }

    // ── Unsupported properties ──────────────────────────────────────

    pub fn app(&self) -> Result<(), ResponseError> {
        reject(Operation::App)
    }

    pub fn headers_sent(&self) -> Result<bool, ResponseError> {
        reject(Operation::HeadersSent)
    }

    pub fn locals(&self) -> Result<&Map<String, Value>, ResponseError> {
        reject(Operation::Locals)
    }

    pub fn raw_body(&self) -> Result<Bytes, ResponseError> {
        reject(Operation::RawBody)
    }

    // ── Unsupported functions ───────────────────────────────────────

    pub fn append(&mut self, _field: &str, _value: &str) -> Result<&mut Self, ResponseError> {
        reject(Operation::Append)
    }

    pub fn attachment(&mut self, _filename: Option<&str>) -> Result<&mut Self, ResponseError> {
        reject(Operation::Attachment)
    }

    pub fn cookie(&mut self, _name: &str, _value: &str) -> Result<&mut Self, ResponseError> {
        reject(Operation::Cookie)
    }

    pub fn clear_cookie(&mut self, _name: &str) -> Result<&mut Self, ResponseError> {
        reject(Operation::ClearCookie)
    }

    pub fn download(&mut self, _path: &Path) -> Result<(), ResponseError> {
        reject(Operation::Download)
    }

    pub fn format(&mut self, _handlers: Value) -> Result<&mut Self, ResponseError> {
        reject(Operation::Format)
    }

    pub fn get(&self, _field: &str) -> Result<Option<&str>, ResponseError> {
        reject(Operation::Get)
    }

    pub fn json(&mut self, _body: Value) -> Result<&mut Self, ResponseError> {
        reject(Operation::Json)
    }

    pub fn jsonp(&mut self, _body: Value) -> Result<&mut Self, ResponseError> {
        reject(Operation::Jsonp)
    }

    pub fn links(&mut self, _links: &[(&str, &str)]) -> Result<&mut Self, ResponseError> {
        reject(Operation::Links)
    }

    pub fn location(&mut self, _url: &str) -> Result<&mut Self, ResponseError> {
        reject(Operation::Location)
    }

    pub fn redirect(&mut self, _url: &str) -> Result<(), ResponseError> {
        reject(Operation::Redirect)
    }

    pub fn render(&mut self, _view: &str, _locals: Value) -> Result<(), ResponseError> {
        reject(Operation::Render)
    }

    pub fn send_file(&mut self, _path: &Path) -> Result<(), ResponseError> {
        reject(Operation::SendFile)
    }

    pub fn send_status(&mut self, _code: u16) -> Result<&mut Self, ResponseError> {
        reject(Operation::SendStatus)
    }

    /// The mimicked `type` member.
    pub fn content_type(&mut self, _ty: &str) -> Result<&mut Self, ResponseError> {
        reject(Operation::Type)
    }

    pub fn vary(&mut self, _field: &str) -> Result<&mut Self, ResponseError> {
        reject(Operation::Vary)
    }
}

fn reject<T>(op: Operation) -> Result<T, ResponseError> {
    Err(ResponseError::UnsupportedOperation(op))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::oneshot::error::TryRecvError;

    fn builder() -> (ResponseBuilder, oneshot::Receiver<HandlerResponse>) {
        let (tx, rx) = oneshot::channel();
        (ResponseBuilder::new(200, tx), rx)
    }

    #[test]
    fn status_and_write_do_not_complete() {
        let (mut res, mut rx) = builder();
        assert!(res.status(403).write("Something"));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn end_settles_snapshot() {
        let (mut res, mut rx) = builder();
        res.status(201).set_header("X", "1").write("a");
        res.end();

        let settled = rx.try_recv().unwrap();
        assert_eq!(settled.status, 201);
        assert_eq!(settled.body, Body::from("a"));
        assert_eq!(settled.headers.get("X"), Some("1"));
    }

    #[test]
    fn end_without_writes_yields_empty_text() {
        let (mut res, mut rx) = builder();
        res.end();
        let settled = rx.try_recv().unwrap();
        assert_eq!(settled.status, 200);
        assert!(settled.body.is_empty());
        assert!(settled.headers.is_empty());
    }

    #[test]
    fn mutations_after_end_are_not_observed() {
        let (mut res, mut rx) = builder();
        res.send("first");
        res.status(500).write(" more");
        res.end();

        let settled = rx.try_recv().unwrap();
        assert_eq!(settled.status, 200);
        assert_eq!(settled.body_text(), "first");
    }

    #[test]
    fn send_text_appends_to_writes() {
        let (mut res, mut rx) = builder();
        res.write("1");
        res.write("2");
        res.send("3");
        assert_eq!(rx.try_recv().unwrap().body, Body::from("123"));
    }

    #[test]
    fn send_json_discards_writes() {
        let (mut res, mut rx) = builder();
        res.write("a");
        res.write("b");
        res.send(json!({ "foo": "bar" }));

        let settled = rx.try_recv().unwrap();
        assert_eq!(settled.body.as_json(), Some(&json!({ "foo": "bar" })));
        assert_eq!(settled.body_text(), r#"{"foo":"bar"}"#);
    }

    #[test]
    fn send_null_and_array_replace_writes() {
        let (mut res, mut rx) = builder();
        res.write("dropped");
        res.send(json!(null));
        assert_eq!(rx.try_recv().unwrap().body.as_json(), Some(&Value::Null));

        let (mut res, mut rx) = builder();
        res.write("dropped");
        res.send(json!([1, 2]));
        assert_eq!(rx.try_recv().unwrap().body_text(), "[1,2]");
    }

    #[test]
    fn send_scalar_keeps_buffered_body() {
        for scalar in [json!(5), json!(true)] {
            let (mut res, mut rx) = builder();
            res.write("kept");
            res.send(scalar);

            let settled = rx.try_recv().unwrap();
            assert_eq!(settled.body, Body::from("kept"));
            assert_eq!(settled.body.as_json(), None);
        }
    }

    #[test]
    fn set_accepts_name_value_and_map() {
        let (mut res, mut rx) = builder();
        res.set("X", Some("1")).unwrap();
        res.set(HeaderMap::from([("Y", "2"), ("X", "10")]), None)
            .unwrap();
        res.end();

        let headers = rx.try_recv().unwrap().headers;
        assert_eq!(headers.get("X"), Some("10"));
        assert_eq!(headers.get("Y"), Some("2"));
    }

    #[test]
    fn set_rejects_other_shapes() {
        let (mut res, _rx) = builder();

        let err = res.set("X", None).unwrap_err();
        assert_eq!(
            err,
            ResponseError::InvalidArgument {
                field: "string",
                value: "undefined"
            }
        );

        let err = res.set(HeaderMap::new(), Some("1")).unwrap_err();
        assert_eq!(
            err,
            ResponseError::InvalidArgument {
                field: "object",
                value: "string"
            }
        );
    }

    #[test]
    fn set_headers_merges_pairs() {
        let (mut res, mut rx) = builder();
        res.set_headers([("A", "1")]).set_headers(vec![("B".to_string(), "2".to_string())]);
        res.end();
        assert_eq!(rx.try_recv().unwrap().headers.len(), 2);
    }

    #[test]
    fn unsupported_members_name_themselves() {
        let (mut res, _rx) = builder();

        assert_eq!(
            res.redirect("/elsewhere").unwrap_err(),
            ResponseError::UnsupportedOperation(Operation::Redirect)
        );
        assert_eq!(
            res.json(json!({})).unwrap_err(),
            ResponseError::UnsupportedOperation(Operation::Json)
        );
        assert_eq!(
            res.send_file(Path::new("index.html")).unwrap_err(),
            ResponseError::UnsupportedOperation(Operation::SendFile)
        );
        assert_eq!(
            res.content_type("html").unwrap_err(),
            ResponseError::UnsupportedOperation(Operation::Type)
        );
        assert_eq!(
            res.headers_sent().unwrap_err(),
            ResponseError::UnsupportedOperation(Operation::HeadersSent)
        );
        assert_eq!(
            res.raw_body().unwrap_err(),
            ResponseError::UnsupportedOperation(Operation::RawBody)
        );
    }

    #[test]
    fn unsupported_calls_leave_state_untouched() {
        let (mut res, mut rx) = builder();
        res.write("kept");
        let _ = res.cookie("session", "abc");
        let _ = res.send_status(404);
        res.end();

        let settled = rx.try_recv().unwrap();
        assert_eq!(settled.status, 200);
        assert_eq!(settled.body_text(), "kept");
    }

    #[test]
    fn end_tolerates_dropped_receiver() {
        let (mut res, rx) = builder();
        drop(rx);
        res.send("nobody listening");
    }

    #[test]
    fn result_serializes_to_plain_json() {
        let response = HandlerResponse {
            status: 404,
            body: Body::from("Oh no!"),
            headers: HeaderMap::from([("X", "1")]),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "status": 404, "body": "Oh no!", "headers": { "X": "1" } })
        );
    }
}
