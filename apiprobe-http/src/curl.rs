//! cURL reconstruction of executed requests
//!
//! Produces a shell-command equivalent of a request for human debugging and
//! for the `curl` report attachment. Single quotes in bodies are escaped so
//! the command stays paste-able; beyond that no shell-quoting guarantees are
//! made.

use crate::types::SentRequest;

/// Render a request as an equivalent `curl` invocation.
pub fn to_curl(request: &SentRequest) -> String {
    let mut parts = vec![format!("curl -X {} \"{}\"", request.method, request.url)];

    for (name, value) in &request.headers {
        parts.push(format!("-H \"{}: {}\"", name, value));
    }

    if let Some(body) = &request.body {
        parts.push(format!("-d '{}'", body.replace('\'', "'\\''")));
    }

    parts.join(" ")
}
