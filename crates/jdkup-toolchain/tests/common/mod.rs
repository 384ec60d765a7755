#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use flate2::{write::GzEncoder, Compression};
use jdkup_toolchain::{HttpResponse, HttpTransport, Result, ToolchainError};

pub const CATALOG: &str = "https://catalog.test/disco/v3.0/packages";

/// In-memory catalog and download host.
#[derive(Default)]
pub struct StubTransport {
    responses: HashMap<String, (u16, Vec<u8>)>,
    pub requests: RefCell<Vec<String>>,
}

impl StubTransport {
    pub fn respond(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .insert(url.to_string(), (status, body.into()));
        self
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|u| *u == url).count()
    }

    fn lookup(&self, url: &str) -> (u16, Vec<u8>) {
        self.requests.borrow_mut().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .unwrap_or((404, Vec::new()))
    }
}

impl HttpTransport for StubTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let (status, body) = self.lookup(url);
        Ok(HttpResponse { status, body })
    }

    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        let (status, body) = self.lookup(url);
        if status != 200 {
            return Err(ToolchainError::Transport(format!("{url} returned {status}")));
        }
        dest.write_all(&body)?;
        Ok(body.len() as u64)
    }
}

/// A gzip'd tarball shaped like a Linux JDK distribution.
pub fn jdk_tarball(root: &str) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, body, mode) in [
        (format!("{root}/release"), "JAVA_VERSION=\"17.0.2\"\n", 0o644),
        (format!("{root}/bin/java"), "#!/bin/sh\n", 0o755),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(mode);
        header.set_cksum();
        builder
            .append_data(&mut header, &path, body.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn search_response(file_name: &str, info_url: &str) -> String {
    format!(
        r#"{{"result":[{{"id":"1","filename":"{file_name}","links":{{"pkg_info_uri":"{info_url}","pkg_download_redirect":"ignored"}}}}],"message":""}}"#
    )
}

pub fn info_response(download_url: &str, sha256: Option<&str>) -> String {
    match sha256 {
        Some(sha) => format!(
            r#"{{"result":[{{"direct_download_uri":"{download_url}","checksum":"{sha}","checksum_type":"sha256"}}]}}"#
        ),
        None => format!(r#"{{"result":[{{"direct_download_uri":"{download_url}"}}]}}"#),
    }
}

pub fn write_toolchains(path: &Path, entries: &[(&str, &str, &Path)]) {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<toolchains>\n");
    for (version, vendor, home) in entries {
        xml.push_str(&format!(
            "  <toolchain>\n    <type>jdk</type>\n    <provides>\n      <version>{version}</version>\n      <vendor>{vendor}</vendor>\n    </provides>\n    <configuration>\n      <jdkHome>{}</jdkHome>\n    </configuration>\n  </toolchain>\n",
            home.display()
        ));
    }
    xml.push_str("</toolchains>\n");
    std::fs::write(path, xml).unwrap();
}
