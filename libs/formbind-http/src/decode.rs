use std::io::{self, Write};

use axum::body;
use axum::extract::multipart::Field;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use bytes::{Bytes, BytesMut};
use tempfile::NamedTempFile;
use url::form_urlencoded;

use formbind::{AttachmentSet, Binder, ParameterSet, UploadedEntry};

use crate::config::RequestConfig;
use crate::error::RequestError;

enum BodyKind {
    Urlencoded,
    Multipart,
    Ignored,
}

fn body_kind(req: &Request) -> Result<BodyKind, RequestError> {
    let Some(value) = req.headers().get(CONTENT_TYPE) else {
        return Ok(BodyKind::Ignored);
    };
    let value = value
        .to_str()
        .map_err(|e| RequestError::ContentType(e.to_string()))?;
    let mime = value.split(';').next().unwrap_or_default().trim();

    Ok(if mime.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
        BodyKind::Urlencoded
    } else if mime.eq_ignore_ascii_case("multipart/form-data") {
        BodyKind::Multipart
    } else {
        BodyKind::Ignored
    })
}

/// Decode the query string and form body of `req` into a `Binder`.
///
/// Query pairs come first, then urlencoded body pairs or multipart text
/// parts. Multipart parts with a filename become uploads. Bodies of any
/// other content type are not read.
pub async fn bind_from_request(req: Request, config: &RequestConfig) -> Result<Binder, RequestError> {
    let mut params = ParameterSet::new();
    let mut files = AttachmentSet::new();

    if let Some(query) = req.uri().query() {
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.append(key, value);
        }
    }

    match body_kind(&req)? {
        BodyKind::Urlencoded => {
            let bytes = body::to_bytes(req.into_body(), config.max_body_bytes)
                .await
                .map_err(RequestError::Body)?;
            for (key, value) in form_urlencoded::parse(&bytes) {
                params.append(key, value);
            }
        }
        BodyKind::Multipart => {
            let mut multipart = Multipart::from_request(req, &()).await?;
            while let Some(field) = multipart.next_field().await? {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                match field.file_name().map(str::to_string) {
                    Some(file_name) => {
                        let entry = store(field, file_name, config.spill_threshold).await?;
                        files.append(name, entry);
                    }
                    None => params.append(name, field.text().await?),
                }
            }
        }
        BodyKind::Ignored => {}
    }

    tracing::debug!(params = params.len(), files = files.len(), "request decoded");
    Ok(Binder::with_files(params, files).with_config(config.bind.clone()))
}

/// Read a file part chunk by chunk. Up to `threshold` bytes stay in
/// memory; past that the buffered bytes and every later chunk go to a
/// temp file.
async fn store(mut field: Field<'_>, file_name: String, threshold: u64) -> Result<UploadedEntry, RequestError> {
    let mut buffer = BytesMut::new();
    let mut spilled: Option<NamedTempFile> = None;
    let mut size = 0u64;

    while let Some(chunk) = field.chunk().await? {
        size += chunk.len() as u64;
        if spilled.is_none() && size <= threshold {
            buffer.extend_from_slice(&chunk);
            continue;
        }
        let data = if spilled.is_none() {
            tracing::debug!(file = %file_name, threshold, "spilling upload to temp storage");
            buffer.extend_from_slice(&chunk);
            buffer.split().freeze()
        } else {
            chunk
        };
        let file = append_blocking(spilled.take(), data)
            .await
            .map_err(|source| RequestError::Spill { file: file_name.clone(), source })?;
        spilled = Some(file);
    }

    match spilled {
        None => Ok(UploadedEntry::in_memory(file_name, buffer.freeze())),
        Some(file) => {
            tracing::debug!(file = %file_name, size, "upload stored on disk");
            UploadedEntry::from_temp(file_name.clone(), file.into_temp_path())
                .map_err(|source| RequestError::Spill { file: file_name, source })
        }
    }
}

async fn append_blocking(file: Option<NamedTempFile>, data: Bytes) -> io::Result<NamedTempFile> {
    tokio::task::spawn_blocking(move || -> io::Result<NamedTempFile> {
        let mut file = match file {
            Some(file) => file,
            None => NamedTempFile::new()?,
        };
        file.write_all(&data)?;
        file.flush()?;
        Ok(file)
    })
    .await
    .map_err(io::Error::other)?
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use axum::body::Body;
    use formbind::{Bind, FileHeader, UploadBytes};

    use super::*;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn request(uri: &str, content_type: Option<&str>, body: impl Into<Body>) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(body.into()).unwrap()
    }

    fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> String {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file_name {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: application/octet-stream\r\n"
                )),
                None => body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n")),
            }
            body.push_str("\r\n");
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn multipart_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    #[tokio::test]
    async fn query_then_urlencoded_body() {
        let req = request(
            "/submit?id=5&tags=a",
            Some("application/x-www-form-urlencoded; charset=utf-8"),
            "tags=b&name=r%C3%B6b",
        );
        let binder = bind_from_request(req, &RequestConfig::default()).await.unwrap();

        let mut tags: Vec<String> = Vec::new();
        binder.field("tags", &mut tags).unwrap();
        assert_eq!(tags, vec!["a", "b"]);

        let mut name = String::new();
        binder.field("name", &mut name).unwrap();
        assert_eq!(name, "röb");
    }

    #[tokio::test]
    async fn other_bodies_are_not_read() {
        let req = request("/?id=5", Some("application/json"), r#"{"id": 6}"#);
        let binder = bind_from_request(req, &RequestConfig::default()).await.unwrap();
        assert_eq!(binder.params().len(), 1);
        assert_eq!(binder.params().first("id").map(String::as_str), Some("5"));
    }

    #[tokio::test]
    async fn oversized_urlencoded_body_is_rejected() {
        let config = RequestConfig { max_body_bytes: 4, ..RequestConfig::default() };
        let req = request("/", Some("application/x-www-form-urlencoded"), "name=longer-than-four");
        let err = bind_from_request(req, &config).await.unwrap_err();
        assert!(matches!(err, RequestError::Body(_)));
    }

    #[derive(Bind, Default)]
    pub struct Upload {
        pub title: String,
        pub docs: Vec<FileHeader>,
    }

    #[tokio::test]
    async fn multipart_text_and_files() {
        let body = multipart_body(&[
            ("form.title", None, "report"),
            ("form.docs[]", Some("a.txt"), "content1"),
            ("form.docs[]", Some("b.txt"), "a larger second file"),
        ]);
        let config = RequestConfig { spill_threshold: 8, ..RequestConfig::default() };
        let req = request("/upload", Some(multipart_type().as_str()), body);
        let binder = bind_from_request(req, &config).await.unwrap();

        let in_memory: Vec<bool> = binder
            .files()
            .get("form.docs[]")
            .unwrap()
            .iter()
            .map(|e| e.is_in_memory())
            .collect();
        assert_eq!(in_memory, vec![true, false]);

        let mut upload = Upload::default();
        binder.field("form", &mut upload).unwrap();
        assert_eq!(upload.title, "report");
        assert_eq!(upload.docs.len(), 2);
        assert_eq!(upload.docs[1].filename, "b.txt");

        let mut content = String::new();
        upload.docs[1].open().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "a larger second file");
    }

    #[tokio::test]
    async fn chunked_upload_spills_past_threshold() {
        let content = "0123456789abcdefghijklmnopqrstuvwxyz";
        let body = multipart_body(&[("doc", Some("long.txt"), content), ("small", Some("s.txt"), "tiny")]);
        let chunks: Vec<Result<Bytes, io::Error>> = body
            .as_bytes()
            .chunks(7)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        let stream = Body::from_stream(futures_util::stream::iter(chunks));

        let config = RequestConfig { spill_threshold: 8, ..RequestConfig::default() };
        let req = request("/upload", Some(multipart_type().as_str()), stream);
        let binder = bind_from_request(req, &config).await.unwrap();

        let doc = &binder.files().get("doc").unwrap()[0];
        assert!(!doc.is_in_memory());
        assert_eq!(doc.size(), content.len() as u64);
        assert_eq!(doc.to_bytes().unwrap(), content.as_bytes());

        let small = &binder.files().get("small").unwrap()[0];
        assert!(small.is_in_memory());
        assert_eq!(small.to_bytes().unwrap(), b"tiny");
    }

    #[tokio::test]
    async fn multipart_upload_into_bytes() {
        let body = multipart_body(&[("avatar", Some("me.png"), "PNGDATA")]);
        let req = request("/", Some(multipart_type().as_str()), body);
        let binder = bind_from_request(req, &RequestConfig::default()).await.unwrap();

        let mut avatar = UploadBytes::default();
        binder.field("avatar", &mut avatar).unwrap();
        assert_eq!(avatar.as_ref(), b"PNGDATA");
    }

    #[tokio::test]
    async fn bind_config_is_carried_over() {
        let mut config = RequestConfig::default();
        config.bind.max_sequence_len = 2;
        let req = request("/?ids%5B5%5D=x", None, Body::empty());
        let binder = bind_from_request(req, &config).await.unwrap();

        let mut ids: Vec<String> = Vec::new();
        let err = binder.field("ids", &mut ids).unwrap_err();
        assert_eq!(err.fields().unwrap().errors()[0].kind, formbind::ErrorKind::InvalidIndex);
    }
}
