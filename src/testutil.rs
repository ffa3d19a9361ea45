//! Test support: a mock remote-debugging endpoint
//!
//! Serves the same surface a debuggable Chrome does on one port: `GET
//! /json/version` and `GET /json` over HTTP, plus a WebSocket answering CDP
//! commands with canned responses. Every command received over the WebSocket
//! is recorded so tests can assert on what was sent, and in what order.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::cdp::transport::{read_ws_frame, ws};

/// Session id handed out by the mock's attach response
const MOCK_SESSION_ID: &str = "mock-session-1";

/// Node id reported for selectors the mock considers present
const MOCK_NODE_ID: i32 = 42;

/// PNG signature, enough for callers that sniff magic bytes
const PNG_STUB: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

struct State {
    tabs: Vec<(String, String)>,
    reject_attach: bool,
    title: String,
    no_title_value: bool,
    selectors: HashSet<String>,
    messages: Mutex<Vec<Value>>,
}

/// Builder for [`MockChrome`]
pub struct MockChromeBuilder {
    tabs: Vec<(String, String)>,
    no_tabs: bool,
    reject_attach: bool,
    title: String,
    no_title_value: bool,
    selectors: HashSet<String>,
}

impl MockChromeBuilder {
    /// Add an open tab with the given id and title
    pub fn tab(mut self, id: &str, title: &str) -> Self {
        self.tabs.push((id.to_string(), title.to_string()));
        self
    }

    /// Report an empty tab list
    pub fn no_tabs(mut self) -> Self {
        self.no_tabs = true;
        self
    }

    /// Answer Target.attachToTarget with a protocol error
    pub fn reject_attach(mut self) -> Self {
        self.reject_attach = true;
        self
    }

    /// Title reported by `document.title`
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Answer `document.title` with a result carrying no value field
    pub fn no_title_value(mut self) -> Self {
        self.no_title_value = true;
        self
    }

    /// Mark a CSS selector as present in the mock DOM
    pub fn selector(mut self, selector: &str) -> Self {
        self.selectors.insert(selector.to_string());
        self
    }

    /// Bind a listener and start serving
    pub fn spawn(self) -> MockChrome {
        let mut tabs = self.tabs;
        if tabs.is_empty() && !self.no_tabs {
            tabs.push(("tab-1".to_string(), "Mock Tab".to_string()));
        }

        let state = Arc::new(State {
            tabs,
            reject_attach: self.reject_attach,
            title: self.title,
            no_title_value: self.no_title_value,
            selectors: self.selectors,
            messages: Mutex::new(Vec::new()),
        });

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock listener");
        let addr = listener.local_addr().expect("mock listener addr");

        let accept_state = Arc::clone(&state);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let state = Arc::clone(&accept_state);
                std::thread::spawn(move || serve_connection(stream, state));
            }
        });

        MockChrome {
            addr: addr.to_string(),
            state,
        }
    }
}

/// A mock debuggable browser bound to a local port
pub struct MockChrome {
    addr: String,
    state: Arc<State>,
}

impl MockChrome {
    pub fn builder() -> MockChromeBuilder {
        MockChromeBuilder {
            tabs: Vec::new(),
            no_tabs: false,
            reject_attach: false,
            title: "Mock Page".to_string(),
            no_title_value: false,
            selectors: HashSet::new(),
        }
    }

    /// The `host:port` debugging address tests point configs at
    pub fn addr(&self) -> String {
        self.addr.clone()
    }

    /// The session id attach responses carry
    pub fn session_id(&self) -> &'static str {
        MOCK_SESSION_ID
    }

    /// Every CDP message received over the WebSocket, in arrival order
    pub fn messages(&self) -> Vec<Value> {
        self.state.messages.lock().unwrap().clone()
    }

    /// Just the method names, in arrival order
    pub fn methods(&self) -> Vec<String> {
        self.messages()
            .iter()
            .filter_map(|m| m["method"].as_str().map(String::from))
            .collect()
    }
}

fn serve_connection(mut stream: TcpStream, state: Arc<State>) {
    // Read the request head
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte) {
            Ok(1) => head.push(byte[0]),
            _ => return,
        }
        if head.len() > 8192 {
            return;
        }
    }
    let head = String::from_utf8_lossy(&head).to_string();

    if head.to_ascii_lowercase().contains("upgrade: websocket") {
        serve_websocket(stream, state);
    } else {
        serve_http(stream, &head, state);
    }
}

fn serve_http(mut stream: TcpStream, head: &str, state: Arc<State>) {
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    let body = match path {
        "/json/version" => json!({
            "browser": "HeadlessChrome/Mock",
            "webSocketDebuggerUrl": format!("ws://{}/devtools/browser/mock", local_addr(&stream)),
        })
        .to_string(),
        "/json" => {
            let tabs: Vec<Value> = state
                .tabs
                .iter()
                .map(|(id, title)| {
                    json!({
                        "id": id,
                        "title": title,
                        "url": "about:blank",
                        "type": "page",
                    })
                })
                .collect();
            Value::Array(tabs).to_string()
        }
        _ => {
            let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
            return;
        }
    };

    let response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

fn local_addr(stream: &TcpStream) -> String {
    stream
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "127.0.0.1:0".to_string())
}

fn serve_websocket(mut stream: TcpStream, state: Arc<State>) {
    // The client only checks for a 101 status
    let _ = stream.write_all(
        b"HTTP/1.1 101 Switching Protocols\r\n\
          Upgrade: websocket\r\n\
          Connection: Upgrade\r\n\
          \r\n",
    );

    loop {
        let (opcode, payload) = match read_ws_frame(&mut stream) {
            Ok(frame) => frame,
            Err(_) => return,
        };

        match opcode {
            ws::OPCODE_TEXT => {
                let Ok(msg) = serde_json::from_slice::<Value>(&payload) else {
                    continue;
                };
                state.messages.lock().unwrap().push(msg.clone());

                let response = respond(&state, &msg);
                if write_server_frame(&mut stream, response.to_string().as_bytes()).is_err() {
                    return;
                }
            }
            ws::OPCODE_CLOSE => {
                let _ = stream.write_all(&[0x80 | ws::OPCODE_CLOSE, 0]);
                return;
            }
            _ => {}
        }
    }
}

/// Craft the canned response for one CDP command
fn respond(state: &State, msg: &Value) -> Value {
    let id = msg["id"].as_u64().unwrap_or(0);
    let method = msg["method"].as_str().unwrap_or("");
    let params = &msg["params"];

    let result = match method {
        "Browser.getVersion" => json!({
            "product": "HeadlessChrome/Mock",
            "userAgent": "Mozilla/5.0 (Mock)",
        }),
        "Browser.close" => json!({}),
        "Target.getTargets" => {
            let infos: Vec<Value> = state
                .tabs
                .iter()
                .map(|(tab_id, title)| {
                    json!({
                        "targetId": tab_id,
                        "type": "page",
                        "title": title,
                        "url": "about:blank",
                        "attached": false,
                    })
                })
                .collect();
            json!({ "targetInfos": infos })
        }
        "Target.createTarget" => json!({ "targetId": "mock-target-new" }),
        "Target.attachToTarget" => {
            if state.reject_attach {
                return json!({
                    "id": id,
                    "error": { "code": -32000, "message": "No target with given id found" },
                });
            }
            json!({ "sessionId": MOCK_SESSION_ID })
        }
        "Page.enable" => json!({}),
        "Page.navigate" => json!({ "frameId": "mock-frame-1" }),
        "Page.getFrameTree" => json!({
            "frameTree": {
                "frame": { "id": "mock-frame-1", "url": "about:blank" },
                "childFrames": [],
            }
        }),
        "Page.captureScreenshot" => {
            use base64::Engine;
            json!({ "data": base64::engine::general_purpose::STANDARD.encode(PNG_STUB) })
        }
        "Runtime.evaluate" => evaluate_result(state, params["expression"].as_str().unwrap_or("")),
        "DOM.getDocument" => json!({ "root": { "nodeId": 1 } }),
        "DOM.querySelector" => {
            let selector = params["selector"].as_str().unwrap_or("");
            let node_id = if state.selectors.contains(selector) {
                MOCK_NODE_ID
            } else {
                0
            };
            json!({ "nodeId": node_id })
        }
        "DOM.querySelectorAll" => {
            let selector = params["selector"].as_str().unwrap_or("");
            let node_ids: Vec<i32> = if state.selectors.contains(selector) {
                vec![MOCK_NODE_ID]
            } else {
                vec![]
            };
            json!({ "nodeIds": node_ids })
        }
        "DOM.getBoxModel" => json!({
            "model": { "content": [100.0, 100.0, 200.0, 100.0, 200.0, 150.0, 100.0, 150.0] }
        }),
        "DOM.getOuterHTML" => json!({ "outerHTML": "<div>mock</div>" }),
        "Input.dispatchMouseEvent" | "Input.dispatchKeyEvent" | "Input.insertText" => json!({}),
        _ => json!({}),
    };

    json!({ "id": id, "result": result })
}

fn evaluate_result(state: &State, expression: &str) -> Value {
    if expression.contains("document.readyState") {
        json!({ "result": { "type": "string", "value": "complete" } })
    } else if expression.contains("document.title") {
        if state.no_title_value {
            json!({ "result": { "type": "undefined" } })
        } else {
            json!({ "result": { "type": "string", "value": state.title } })
        }
    } else if expression.contains("innerText") {
        json!({ "result": { "type": "string", "value": "mock text" } })
    } else {
        // Anything else evaluates to undefined, which carries no value
        json!({ "result": { "type": "undefined" } })
    }
}

/// Write an unmasked server-side text frame
fn write_server_frame<W: Write>(stream: &mut W, data: &[u8]) -> std::io::Result<()> {
    let len = data.len();
    let mut frame = Vec::with_capacity(4 + len);

    frame.push(0x80 | ws::OPCODE_TEXT);
    if len < 126 {
        frame.push(len as u8);
    } else if len < 65536 {
        frame.push(126);
        frame.push((len >> 8) as u8);
        frame.push(len as u8);
    } else {
        frame.push(127);
        for i in (0..8).rev() {
            frame.push((len >> (i * 8)) as u8);
        }
    }
    frame.extend_from_slice(data);

    stream.write_all(&frame)?;
    stream.flush()
}
