// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Reload notifications over a browser WebSocket.

use axum::extract::ws::{Message, WebSocket};
use tokio::sync::broadcast;

/// Browser client served at `/__refract/livereload.js`.
///
/// The page is rendered by the application server, not by us, so the
/// websocket endpoint is derived from the script's own URL rather than from
/// `window.location`.
pub const CLIENT_SCRIPT: &str = r#"(function () {
    var origin;
    try {
        origin = new URL(document.currentScript.src).origin;
    } catch (err) {
        origin = window.location.origin;
    }
    var endpoint = origin.replace(/^http/, 'ws') + '/__refract/livereload';

    function connect() {
        var ws = new WebSocket(endpoint);
        ws.onmessage = function (event) {
            if (event.data === 'reload') {
                console.log('[refract] Reloading...');
                window.location.reload();
            }
        };
        ws.onclose = function () {
            console.log('[refract] Connection lost, reconnecting...');
            setTimeout(connect, 1000);
        };
        ws.onerror = function (error) {
            console.error('[refract] WebSocket error:', error);
        };
    }

    connect();
})();
"#;

/// Pushes reload notices to one connected browser.
///
/// The task ends when either side goes away. Lagging behind the broadcast
/// only means several changes collapsed into one reload, so it is ignored.
pub async fn relay_reloads(mut socket: WebSocket, mut reloads: broadcast::Receiver<()>) {
    use broadcast::error::RecvError;

    loop {
        tokio::select! {
            notice = reloads.recv() => match notice {
                Ok(()) => {
                    if socket.send(Message::Text("reload".to_string())).await.is_err() {
                        return;
                    }
                }
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return,
            },

            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Ping(payload))) => {
                    if socket.send(Message::Pong(payload)).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                // text and binary from the client carry nothing we act on
                Some(Ok(_)) => {}
            },
        }
    }
}
