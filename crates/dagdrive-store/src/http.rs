//! Blocking client for a content-store daemon's `/api/v0` RPC.
//!
//! Every command is a `POST` with positional arguments passed as repeated
//! `arg` query parameters. Successful responses are JSON (or a raw byte
//! stream for `cat`); failures carry `{"Message", "Code", "Type"}`.

use std::collections::HashMap;
use std::io::Read;

use dagdrive_types::{ContentHash, Identity, Link, LinkKind, ObjectListing};
use reqwest::blocking::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{StoreError, StoreResult};
use crate::traits::{ContentStore, ObjectTemplate};

/// What a failing call was operating on, used to classify daemon errors.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ErrorContext<'a> {
    /// Resolving a path.
    Path(&'a str),
    /// Removing a link by name.
    Link(&'a str),
    Other,
}

#[derive(Debug, Deserialize)]
struct DaemonErrorBody {
    #[serde(rename = "Message")]
    message: String,
}

#[derive(Debug, Deserialize)]
struct HashResponse {
    #[serde(rename = "Hash")]
    hash: ContentHash,
}

#[derive(Debug, Deserialize)]
struct FileLsResponse {
    #[serde(rename = "Arguments")]
    arguments: HashMap<String, String>,
    #[serde(rename = "Objects")]
    objects: HashMap<String, FileLsObject>,
}

#[derive(Debug, Deserialize)]
struct FileLsObject {
    #[serde(rename = "Hash")]
    hash: ContentHash,
    #[serde(rename = "Size", default)]
    size: u64,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Links", default)]
    links: Option<Vec<FileLsLink>>,
}

#[derive(Debug, Deserialize)]
struct FileLsLink {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Hash")]
    hash: ContentHash,
    #[serde(rename = "Size", default)]
    size: u64,
    #[serde(rename = "Type")]
    kind: String,
}

/// Build the RPC base URL from a daemon address.
///
/// Accepts `host:port` (http is assumed) or a full `http(s)://` URL. The
/// result always ends in `/api/v0/`.
pub fn base_url(addr: &str) -> StoreResult<Url> {
    let addr = addr.trim().trim_end_matches('/');
    let url = if addr.contains("://") {
        Url::parse(&format!("{addr}/"))?
    } else {
        Url::parse(&format!("http://{addr}/"))?
    };
    if url.path().trim_end_matches('/').ends_with("api/v0") {
        Ok(url)
    } else {
        Ok(url.join("api/v0/")?)
    }
}

/// Map a daemon failure onto the store error taxonomy.
pub(crate) fn classify(status: u16, body: &str, context: ErrorContext<'_>) -> StoreError {
    let message = serde_json::from_str::<DaemonErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match context {
        ErrorContext::Link(name)
            if message.contains("merkledag: not found")
                || message.contains("no link by that name")
                || message.contains("no link named") =>
        {
            StoreError::LinkNotFound {
                name: name.to_string(),
            }
        }
        ErrorContext::Path(path)
            if message.contains("no link named")
                || message.contains("could not resolve name")
                || message.contains("no such link") =>
        {
            StoreError::NoSuchEntry {
                path: path.to_string(),
            }
        }
        _ => StoreError::Daemon { status, message },
    }
}

fn parse_kind(kind: &str) -> StoreResult<LinkKind> {
    Ok(kind.parse::<LinkKind>()?)
}

/// Query arguments for `name/publish` pointing `name` at `target`, an
/// `/ipfs/<hash>` path.
fn publish_args<'a>(target: &'a str, name: &'a str) -> [(&'static str, &'a str); 3] {
    [("arg", target), ("key", name), ("allow-offline", "true")]
}

/// Decode the body of an `add` call.
///
/// The daemon may stream one JSON object per line; the last one carries the
/// hash of the added content.
fn parse_add_response(body: &str) -> StoreResult<ContentHash> {
    let last = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .ok_or_else(|| StoreError::Serialization("add returned an empty body".into()))?;
    let added: HashResponse =
        serde_json::from_str(last).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(added.hash)
}

/// Pick the object `file/ls` resolved for `path` out of its response.
///
/// `Arguments` maps each requested path to an object key. When the daemon
/// echoes the path in a different spelling, the single argument is used.
fn select_listing(mut response: FileLsResponse, path: &str) -> StoreResult<ObjectListing> {
    let key = response
        .arguments
        .get(path)
        .cloned()
        .or_else(|| response.arguments.values().next().cloned())
        .ok_or_else(|| StoreError::Serialization("file/ls returned no arguments".into()))?;
    let object = response.objects.remove(&key).ok_or_else(|| {
        StoreError::Serialization(format!("file/ls returned no object for {key}"))
    })?;

    let links = object
        .links
        .unwrap_or_default()
        .into_iter()
        .map(|l| -> StoreResult<Link> {
            let kind = parse_kind(&l.kind)?;
            Ok(Link::new(l.name, l.hash, l.size, kind))
        })
        .collect::<StoreResult<Vec<_>>>()?;

    Ok(ObjectListing {
        hash: object.hash,
        kind: parse_kind(&object.kind)?,
        size: object.size,
        links,
    })
}

/// [`ContentStore`] backed by a daemon reachable over HTTP.
///
/// The underlying connection pool is created once and reused for every call.
#[derive(Debug, Clone)]
pub struct HttpContentStore {
    base: Url,
    client: Client,
}

impl HttpContentStore {
    /// Create a client for the daemon at `addr`.
    pub fn new(addr: &str) -> StoreResult<Self> {
        let base = base_url(addr)?;
        let client = Client::builder().build()?;
        debug!(%base, "content store client ready");
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Full URL for `command` with the given query arguments.
    pub fn endpoint(&self, command: &str, args: &[(&str, &str)]) -> StoreResult<Url> {
        let mut url = self.base.join(command)?;
        if !args.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in args {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn call(
        &self,
        command: &str,
        args: &[(&str, &str)],
        context: ErrorContext<'_>,
    ) -> StoreResult<Response> {
        let url = self.endpoint(command, args)?;
        let response = self.client.post(url).send()?;
        Self::check(response, context)
    }

    fn call_json<T: DeserializeOwned>(
        &self,
        command: &str,
        args: &[(&str, &str)],
        context: ErrorContext<'_>,
    ) -> StoreResult<T> {
        Ok(self.call(command, args, context)?.json::<T>()?)
    }

    fn check(response: Response, context: ErrorContext<'_>) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text()?;
        Err(classify(status.as_u16(), &body, context))
    }
}

impl ContentStore for HttpContentStore {
    fn add(&self, data: &mut dyn Read) -> StoreResult<ContentHash> {
        let mut buf = Vec::new();
        data.read_to_end(&mut buf)?;
        let part = multipart::Part::bytes(buf).file_name("data");
        let form = multipart::Form::new().part("file", part);
        let url = self.endpoint("add", &[("pin", "true")])?;
        let response = self.client.post(url).multipart(form).send()?;
        let body = Self::check(response, ErrorContext::Other)?.text()?;
        parse_add_response(&body)
    }

    fn cat(&self, path: &str) -> StoreResult<Box<dyn Read + Send>> {
        let response = self.call("cat", &[("arg", path)], ErrorContext::Path(path))?;
        Ok(Box::new(response))
    }

    fn file_list(&self, path: &str) -> StoreResult<ObjectListing> {
        let response: FileLsResponse =
            self.call_json("file/ls", &[("arg", path)], ErrorContext::Path(path))?;
        select_listing(response, path)
    }

    fn patch_rm_link(&self, hash: &ContentHash, name: &str) -> StoreResult<ContentHash> {
        let patched: HashResponse = self.call_json(
            "object/patch/rm-link",
            &[("arg", hash.as_str()), ("arg", name)],
            ErrorContext::Link(name),
        )?;
        Ok(patched.hash)
    }

    fn patch_add_link(
        &self,
        hash: &ContentHash,
        name: &str,
        target: &ContentHash,
    ) -> StoreResult<ContentHash> {
        let patched: HashResponse = self.call_json(
            "object/patch/add-link",
            &[("arg", hash.as_str()), ("arg", name), ("arg", target.as_str())],
            ErrorContext::Other,
        )?;
        Ok(patched.hash)
    }

    fn new_object(&self, template: ObjectTemplate) -> StoreResult<ContentHash> {
        let created: HashResponse =
            self.call_json("object/new", &[("arg", template.as_str())], ErrorContext::Other)?;
        Ok(created.hash)
    }

    fn publish(&self, name: &str, hash: &ContentHash) -> StoreResult<()> {
        let target = hash.ipfs_path();
        // The daemon accepts a key name or a peer id for `key`.
        self.call("name/publish", &publish_args(&target, name), ErrorContext::Other)?;
        Ok(())
    }

    fn id(&self) -> StoreResult<Identity> {
        self.call_json("id", &[], ErrorContext::Other)
    }
}
