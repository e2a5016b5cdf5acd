//! Scripted RouterOS peer for API contract tests
//!
//! Speaks the real framing (via `fwdsync_routeros::codec`) and keeps a small
//! static DNS table, so tests exercise the same byte stream a router would
//! see.

#![allow(dead_code)]

use fwdsync_routeros::codec;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::net::TcpListener;

/// One row of the fake static DNS table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeEntry {
    pub name: String,
    pub kind: String,
    pub forward_to: Option<String>,
    pub match_subdomain: Option<String>,
    pub address_list: Option<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    username: String,
    password: String,
    entries: Vec<FakeEntry>,
    commands: Vec<Vec<String>>,
    rejected_names: HashSet<String>,
    fatal_on_add: bool,
    legacy_login: bool,
    no_empty_reply: bool,
}

/// A fake router; clones share state
#[derive(Clone)]
pub struct FakeRouter {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRouter {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                username: username.to_string(),
                password: password.to_string(),
                ..FakeState::default()
            })),
        }
    }

    /// Seed an entry of the given type (`FWD`, `A`, ...)
    pub fn with_entry(self, name: &str, kind: &str) -> Self {
        self.state.lock().unwrap().entries.push(FakeEntry {
            name: name.to_string(),
            kind: kind.to_string(),
            forward_to: None,
            match_subdomain: None,
            address_list: None,
        });
        self
    }

    /// Trap every add of `name`
    pub fn rejecting(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .rejected_names
            .insert(name.to_string());
        self
    }

    /// Answer the first add with `!fatal` and drop the connection
    pub fn fatal_on_add(self) -> Self {
        self.state.lock().unwrap().fatal_on_add = true;
        self
    }

    /// Answer /login with a pre-6.43 challenge
    pub fn legacy_login(self) -> Self {
        self.state.lock().unwrap().legacy_login = true;
        self
    }

    /// Behave like firmware before 7.18: no `!empty` for row-less replies
    pub fn without_empty_reply(self) -> Self {
        self.state.lock().unwrap().no_empty_reply = true;
        self
    }

    /// Every sentence received, in order
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().commands.clone()
    }

    /// First word of every sentence received
    pub fn command_paths(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter_map(|words| words.into_iter().next())
            .collect()
    }

    pub fn entries(&self) -> Vec<FakeEntry> {
        self.state.lock().unwrap().entries.clone()
    }

    pub fn entry(&self, name: &str) -> Option<FakeEntry> {
        self.entries().into_iter().find(|e| e.name == name)
    }

    /// Serve one client over an in-memory pipe; returns the client end
    pub fn spawn_duplex(&self) -> DuplexStream {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let router = self.clone();
        tokio::spawn(async move { router.serve(server).await });
        client
    }

    /// Accept TCP clients on a loopback port; returns the bound address
    pub async fn spawn_tcp(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let router = router.clone();
                tokio::spawn(async move { router.serve(socket).await });
            }
        });
        addr
    }

    async fn serve<S: AsyncRead + AsyncWrite + Unpin>(&self, mut stream: S) {
        let mut logged_in = false;

        while let Ok(words) = codec::read_sentence(&mut stream).await {
            if words.is_empty() {
                continue;
            }
            let (replies, close) = self.handle(&words, &mut logged_in);
            for reply in &replies {
                if codec::write_sentence(&mut stream, reply.as_slice()).await.is_err() {
                    return;
                }
            }
            if close {
                return;
            }
        }
    }

    fn handle(&self, words: &[String], logged_in: &mut bool) -> (Vec<Vec<String>>, bool) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(words.to_vec());

        let attr = |key: &str| -> Option<String> {
            let prefix = format!("={key}=");
            words
                .iter()
                .find_map(|w| w.strip_prefix(prefix.as_str()).map(str::to_string))
        };
        let trap = |msg: &str| {
            vec![
                vec!["!trap".to_string(), format!("=message={msg}")],
                vec!["!done".to_string()],
            ]
        };

        match words[0].as_str() {
            "/login" => {
                if state.legacy_login {
                    return (vec![vec!["!done".into(), "=ret=0123456789abcdef".into()]], false);
                }
                let ok = attr("name").as_deref() == Some(state.username.as_str())
                    && attr("password").as_deref() == Some(state.password.as_str());
                if ok {
                    *logged_in = true;
                    (vec![vec!["!done".to_string()]], false)
                } else {
                    (trap("invalid user name or password (6)"), false)
                }
            }
            _ if !*logged_in => (trap("not logged in"), false),
            "/ip/dns/static/print" => {
                let type_filter = words
                    .iter()
                    .find_map(|w| w.strip_prefix("?type=").map(str::to_string));
                let mut replies: Vec<Vec<String>> = state
                    .entries
                    .iter()
                    .filter(|e| type_filter.as_deref().is_none_or(|t| t == e.kind))
                    .map(|e| {
                        let mut row = vec!["!re".to_string()];
                        if !e.name.is_empty() {
                            row.push(format!("=name={}", e.name));
                        }
                        row
                    })
                    .collect();
                if replies.is_empty() && !state.no_empty_reply {
                    replies.push(vec!["!empty".to_string()]);
                }
                replies.push(vec!["!done".to_string()]);
                (replies, false)
            }
            "/ip/dns/static/add" => {
                if state.fatal_on_add {
                    return (vec![vec!["!fatal".into(), "connection lost".into()]], true);
                }
                let name = attr("name").unwrap_or_default();
                let kind = attr("type").unwrap_or_else(|| "A".to_string());
                if state.rejected_names.contains(&name) {
                    return (trap("failure: invalid value for argument name"), false);
                }
                if state.entries.iter().any(|e| e.name == name && e.kind == kind) {
                    return (trap("failure: entry already exists"), false);
                }
                state.entries.push(FakeEntry {
                    name,
                    kind,
                    forward_to: attr("forward-to"),
                    match_subdomain: attr("match-subdomain"),
                    address_list: attr("address-list"),
                });
                let id = format!("=ret=*{:X}", state.entries.len());
                (vec![vec!["!done".to_string(), id]], false)
            }
            "/quit" => (
                vec![vec!["!fatal".into(), "session terminated on request".into()]],
                true,
            ),
            _ => (trap("no such command"), false),
        }
    }
}
