//! Helpers shared by the upload and router tests.

use bytes::Bytes;
use futures::Stream;
use std::path::{Path, PathBuf};

use crate::config::Config;

pub const BOUNDARY: &str = "reelix-test-boundary";

pub enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        data: Vec<u8>,
    },
}

impl Part {
    pub fn text(name: &str, value: &str) -> Self {
        Part::Text {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn file(name: &str, file_name: &str, data: &[u8]) -> Self {
        Part::File {
            name: name.to_string(),
            file_name: file_name.to_string(),
            data: data.to_vec(),
        }
    }
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: video/mp4\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn body_stream(body: Vec<u8>) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    futures::stream::once(async move { Ok(Bytes::from(body)) })
}

/// Config rooted in `root`, with the staging dir already created.
pub fn test_config(root: &Path) -> Config {
    let staging_dir = root.join("staging");
    std::fs::create_dir_all(&staging_dir).unwrap();
    Config {
        upload_dir: root.join("uploads"),
        static_dir: root.join("web/static"),
        index_file: root.join("web/templates/index.html"),
        staging_dir,
        ..Config::default()
    }
}

/// Entries directly under `dir`; empty if it does not exist.
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}
