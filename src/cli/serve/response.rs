//! HTTP responses for the dev server.

use super::content::inject_before_body_close;
use super::route::{Reply, route};
use crate::utils::mime::{self, types::HTML};
use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Everything a request handler needs, fixed at server start.
#[derive(Debug)]
pub struct ServeState {
    pub root: PathBuf,
    /// Body of every 404.
    pub not_found: Vec<u8>,
    /// Script injected into HTML responses when live reload is on.
    pub reload_script: Option<String>,
}

pub fn handle(request: Request, state: &ServeState) -> Result<()> {
    match route(request.url(), &state.root) {
        Reply::Redirect(location) => respond_redirect(request, &location),
        Reply::File(path) => respond_file(request, &path, state),
        Reply::NotFound => respond_not_found(request, state),
    }
}

fn respond_redirect(request: Request, location: &str) -> Result<()> {
    let response = Response::empty(StatusCode(302)).with_header(header("Location", location)?);
    request.respond(response)?;
    Ok(())
}

fn respond_file(request: Request, path: &Path, state: &ServeState) -> Result<()> {
    let content_type = mime::from_path(path);
    if request.method() == &Method::Head {
        return send_head(request, 200, content_type);
    }
    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let body = maybe_inject(body, content_type, state);
    send_body(request, 200, content_type, body)
}

fn respond_not_found(request: Request, state: &ServeState) -> Result<()> {
    if request.method() == &Method::Head {
        return send_head(request, 404, HTML);
    }
    let body = maybe_inject(state.not_found.clone(), HTML, state);
    send_body(request, 404, HTML, body)
}

fn maybe_inject(body: Vec<u8>, content_type: &str, state: &ServeState) -> Vec<u8> {
    match &state.reload_script {
        Some(script) if content_type == HTML => inject_before_body_close(&body, script),
        _ => body,
    }
}

fn send_head(request: Request, status: u16, content_type: &str) -> Result<()> {
    let response =
        Response::empty(StatusCode(status)).with_header(header("Content-Type", content_type)?);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", "no-cache")?);
    request.respond(response)?;
    Ok(())
}

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow!("invalid `{name}` header value: {value}"))
}
