//! Live reload over WebSocket.
//!
//! ```text
//! watch loop -> ServerHandle::reload() -> ReloadServer::broadcast -> browsers
//! ```
//!
//! Pages served with live reload on carry [`reload_script`], which opens a
//! socket to the reload port and reloads the page on any `reload` message.

mod server;

pub use server::ReloadServer;

/// Message sent to every client after a rebuild.
pub const RELOAD_MESSAGE: &str = "reload";

/// Inline client script for the given reload port.
pub fn reload_script(port: u16) -> String {
    format!(
        "<script>(function(){{var s=new WebSocket('ws://'+location.hostname+':{port}/');\
s.onmessage=function(e){{if(e.data==='{RELOAD_MESSAGE}')location.reload();}};}})();</script>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_script_targets_port() {
        let script = reload_script(35729);
        assert!(script.starts_with("<script>"));
        assert!(script.contains(":35729/"));
        assert!(script.contains("'reload'"));
    }
}
