//! Live reload signalling.
//!
//! The watch controller publishes a [`ReloadEvent`] after every successful
//! rebuild; each connected browser receives it as JSON over the
//! `/__livereload` WebSocket and either swaps stylesheets or reloads.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

/// WebSocket endpoint path.
pub const SOCKET_PATH: &str = "/__livereload";

/// Client script path.
pub const CLIENT_PATH: &str = "/__livereload.js";

/// Browser side of the reload channel.
pub const CLIENT_SCRIPT: &str = r#"(function () {
  var protocol = location.protocol === 'https:' ? 'wss://' : 'ws://';
  function connect() {
    var socket = new WebSocket(protocol + location.host + '/__livereload');
    socket.onmessage = function (message) {
      var event = JSON.parse(message.data);
      if (event.type !== 'reload') {
        return;
      }
      if (event.css_only) {
        var links = document.querySelectorAll('link[rel="stylesheet"]');
        for (var i = 0; i < links.length; i++) {
          var href = links[i].href.replace(/[?&]livereload=\d+/, '');
          links[i].href = href + (href.indexOf('?') < 0 ? '?' : '&') + 'livereload=' + Date.now();
        }
      } else {
        location.reload();
      }
    };
    socket.onclose = function () {
      setTimeout(connect, 1000);
    };
  }
  connect();
})();
"#;

/// A rebuild that browsers should pick up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "reload")]
pub struct ReloadEvent {
    /// Changed files as URL paths below the served root
    pub paths: Vec<String>,
    /// Only stylesheets changed; clients refresh them in place
    pub css_only: bool,
}

impl ReloadEvent {
    /// Event for files written below `root`.
    pub fn for_written(root: &Path, written: &[PathBuf]) -> Self {
        let paths: Vec<String> = written
            .iter()
            .map(|path| {
                let rel = path.strip_prefix(root).unwrap_or(path);
                let segments: Vec<String> =
                    rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
                format!("/{}", segments.join("/"))
            })
            .collect();
        let css_only = !paths.is_empty() && paths.iter().all(|p| p.ends_with(".css"));
        Self { paths, css_only }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload","paths":[],"css_only":false}"#.to_string())
    }
}

/// Broadcast side of the reload channel.
#[derive(Debug, Clone)]
pub struct LiveReload {
    tx: broadcast::Sender<ReloadEvent>,
}

impl LiveReload {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    /// Send an event to every connected client.
    ///
    /// Returns the number of receivers; zero when nobody is connected.
    pub fn notify(&self, event: ReloadEvent) -> usize {
        tracing::debug!("reload: {}", event.paths.join(", "));
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert the client script tag before `</body>`, or append it.
pub fn inject_client(html: &str) -> String {
    let tag = format!("<script src=\"{}\"></script>", CLIENT_PATH);
    match html.rfind("</body>").or_else(|| html.rfind("</BODY>")) {
        Some(pos) => format!("{}{}\n{}", &html[..pos], tag, &html[pos..]),
        None => format!("{}{}\n", html, tag),
    }
}
