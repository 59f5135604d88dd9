//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! `ReleaseSource` (spec §6): the core's only view of a release-hosting
//! backend. `GitHubReleaseSource` is the default implementation; the core
//! itself never imports `reqwest` outside this module.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;

use crate::error::{Result, VouchError};
use crate::model::{Asset, Release};
use crate::urlgate::{self, UrlGateConfig};

pub struct DownloadOptions {
    pub gate: UrlGateConfig,
}

pub struct Downloaded {
    pub bytes: Vec<u8>,
    pub redirect_chain: Vec<String>,
    pub content_type: Option<String>,
}

/// The capability set the verification core needs from a release-hosting
/// backend (spec §1's "deliberately out of scope" collaborator).
pub trait ReleaseSource {
    fn fetch_release(&self, repo: &str, tag: &str) -> Result<Release>;
    fn download(&self, url: &str, options: &DownloadOptions) -> Result<Downloaded>;
}

#[derive(Debug, Deserialize)]
struct GhRelease {
    tag_name: String,
    assets: Vec<GhAsset>,
}

#[derive(Debug, Deserialize)]
struct GhAsset {
    name: String,
    browser_download_url: String,
    size: u64,
}

/// Talks to `api.github.com`. Authentication is attached only when the
/// download target's host is the configured release host, never replayed
/// cross-origin during a redirect (spec §6).
pub struct GitHubReleaseSource {
    client: Client,
    release_host: String,
    github_token: Option<String>,
}

impl GitHubReleaseSource {
    pub fn new(timeout_secs: u64, github_token: Option<String>, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(GitHubReleaseSource {
            client,
            release_host: "api.github.com".to_string(),
            github_token,
        })
    }

    fn auth_headers(&self, host: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if host != self.release_host {
            return headers;
        }
        if let Some(token) = self.github_token.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            if let Ok(hv) = HeaderValue::from_str(&format!("Bearer {token}")) {
                headers.insert(AUTHORIZATION, hv);
            }
        }
        headers
    }
}

impl ReleaseSource for GitHubReleaseSource {
    fn fetch_release(&self, repo: &str, tag: &str) -> Result<Release> {
        let path = if tag == "latest" {
            "latest".to_string()
        } else {
            format!("tags/{tag}")
        };
        let url = format!("https://api.github.com/repos/{repo}/releases/{path}");
        let resp = self
            .client
            .get(&url)
            .headers(self.auth_headers("api.github.com"))
            .send()?
            .error_for_status()?;
        let gh: GhRelease = resp.json()?;
        Ok(Release {
            tag: gh.tag_name,
            assets: gh
                .assets
                .into_iter()
                .map(|a| Asset {
                    name: a.name,
                    download_url: a.browser_download_url,
                    size: a.size,
                })
                .collect(),
        })
    }

    /// Manually walks redirects (rather than delegating to reqwest's
    /// built-in policy) so each hop can be gated and credential-stripped
    /// per spec §4.9 before the next request is issued.
    fn download(&self, url: &str, options: &DownloadOptions) -> Result<Downloaded> {
        let mut current = url::Url::parse(url)?;
        urlgate::check_scheme(&current, &options.gate)?;
        let mut redirect_chain = Vec::new();
        let mut hops = 0usize;

        loop {
            let host = current.host_str().unwrap_or_default().to_string();
            let resp = self
                .client
                .get(current.clone())
                .headers(self.auth_headers(&host))
                .send()?;

            if resp.status().is_redirection() {
                let location = resp
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or(VouchError::RedirectRefused(current.to_string()))?;
                let next = current.join(location)?;
                let gated = urlgate::check_redirect(hops, &next, &options.gate)?;
                redirect_chain.push(gated.to_string());
                hops += 1;
                current = gated;
                continue;
            }

            let resp = resp.error_for_status()?;
            let content_type = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            if let Some(ct) = &content_type {
                urlgate::check_content_type(ct, &options.gate)?;
            }
            let bytes = resp.bytes()?.to_vec();
            return Ok(Downloaded {
                bytes,
                redirect_chain,
                content_type,
            });
        }
    }
}
