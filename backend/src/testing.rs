//! Test doubles shared by the unit tests: a mock vision backend served by a
//! real actix server, a scripted chat client and a fixed credential.

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, web};
use futures::TryStreamExt;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use url::Url;

use crate::llm::{ChatCompletion, CredentialSource, LlmError};

#[derive(Debug, Clone, Default)]
pub struct ReceivedUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Vision backend stand-in answering every `POST /predict` with a fixed
/// status and body, recording what it received.
pub struct MockPredictServer {
    pub base_url: Url,
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
}

impl MockPredictServer {
    /// Must be called from inside an actix runtime.
    pub fn start(status: u16, body: &str) -> Self {
        let uploads = Arc::new(Mutex::new(Vec::new()));
        let recorded = uploads.clone();
        let body = body.to_string();

        let server = HttpServer::new(move || {
            let recorded = recorded.clone();
            let body = body.clone();
            App::new().route(
                "/predict",
                web::post().to(move |payload: Multipart| {
                    let recorded = recorded.clone();
                    let body = body.clone();
                    async move {
                        let upload = read_upload(payload).await;
                        recorded.lock().unwrap().push(upload);
                        HttpResponse::build(StatusCode::from_u16(status).unwrap())
                            .content_type("application/json")
                            .body(body)
                    }
                }),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        Self {
            base_url: Url::parse(&format!("http://{}/", addr)).unwrap(),
            uploads,
        }
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

async fn read_upload(mut payload: Multipart) -> ReceivedUpload {
    let mut upload = ReceivedUpload::default();
    while let Some(mut field) = payload.try_next().await.unwrap() {
        let is_file = field.name() == Some("file");
        if is_file {
            upload.file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(String::from);
            upload.content_type = field.content_type().map(|m| m.to_string());
        }
        while let Some(chunk) = field.try_next().await.unwrap() {
            if is_file {
                upload.bytes.extend_from_slice(&chunk);
            }
        }
    }
    upload
}

/// A base URL nothing listens on.
pub fn unreachable_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap()
}

/// A base URL that accepts connections and never answers them.
pub fn silent_server_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap()
}

/// Chat client returning a scripted reply and recording every call.
pub struct FakeChat {
    reply: Result<String, String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeChat {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// `(api_key, prompt)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ChatCompletion for FakeChat {
    fn complete(&self, api_key: &str, prompt: &str) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((api_key.to_string(), prompt.to_string()));
        self.reply.clone().map_err(LlmError::Invocation)
    }
}

pub struct FixedCredential(pub Option<&'static str>);

impl CredentialSource for FixedCredential {
    fn name(&self) -> &str {
        "TEST_LLM_KEY"
    }

    fn resolve(&self) -> Option<String> {
        self.0.map(String::from)
    }
}

pub const BOUNDARY: &str = "skincheck-test-boundary";

/// Builds a `multipart/form-data` body. `file` is `(filename, content type, bytes)`.
pub fn multipart_body(file: Option<(&str, &str, &[u8])>, fields: &[(&str, &str)]) -> Vec<u8> {
    let fields: Vec<(&str, &[u8])> = fields
        .iter()
        .map(|(name, value)| (*name, value.as_bytes()))
        .collect();
    multipart_body_bytes(file, &fields)
}

/// Like [`multipart_body`], with raw bytes for the text fields.
pub fn multipart_body_bytes(
    file: Option<(&str, &str, &[u8])>,
    fields: &[(&str, &[u8])],
) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(value);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// `q1..q8` all answered with `value`.
pub fn all_answers(value: &'static str) -> Vec<(&'static str, &'static str)> {
    crate::check::models::QUESTION_FIELDS
        .iter()
        .map(|name| (*name, value))
        .collect()
}
