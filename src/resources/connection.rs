//! Session lifecycle and reconnect policy.
//!
//! [`ConnectionManager`] is a small state machine over
//! `{Disconnected, Connecting, Connected}` that drives a [`Transport`].
//! Whenever the session drops it schedules one reconnect after a fixed delay.
//! There is no backoff and no attempt cap; a reconnect that comes due while a
//! session is already open or opening is skipped.
//!
//! The manager never blocks: transports report progress through
//! [`Transport::poll`], which [`ConnectionManager::update`] drains once per
//! frame. [`WebSocketTransport`] runs the actual socket on a background
//! thread (see [`crate::systems::network::network_thread`]).

use bevy_ecs::prelude::Resource;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info};

use crate::events::network::{NetCmd, TransportEvent};
use crate::events::server::ClientMessage;
use crate::systems::network::network_thread;

/// Default delay between a session drop and the next attempt.
pub const RECONNECT_DELAY_MS: f64 = 5000.0;

/// Non-blocking session transport.
pub trait Transport: Send + Sync {
    /// Start opening a session; the outcome arrives through [`Transport::poll`].
    fn open(&mut self);
    /// Queue a text frame on the open session.
    fn send_text(&mut self, text: String);
    /// Events produced since the last call.
    fn poll(&mut self) -> Vec<TransportEvent>;
    /// Release the transport for good.
    fn shutdown(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// What happened to the session during one [`ConnectionManager::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    /// The connection attempt failed.
    Failed(String),
    /// An open session closed.
    Lost(Option<String>),
    /// An inbound text frame, not yet parsed.
    Frame(String),
}

#[derive(Resource)]
pub struct ConnectionManager {
    state: ConnectionState,
    transport: Box<dyn Transport>,
    reconnect_delay_ms: f64,
    reconnect_at: Option<f64>,
    attempts: u64,
    started: bool,
}

impl ConnectionManager {
    pub fn new(transport: Box<dyn Transport>, reconnect_delay_ms: f64) -> Self {
        ConnectionManager {
            state: ConnectionState::Disconnected,
            transport,
            reconnect_delay_ms,
            reconnect_at: None,
            attempts: 0,
            started: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connection attempts made so far, the first one included.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// When the pending reconnect is due, in milliseconds.
    pub fn reconnect_at(&self) -> Option<f64> {
        self.reconnect_at
    }

    /// Open the first session. Later calls do nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.connect();
    }

    fn connect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            debug!("[net] reconnect skipped, session is {:?}", self.state);
            return;
        }
        self.state = ConnectionState::Connecting;
        self.attempts += 1;
        debug!("[net] connection attempt #{}", self.attempts);
        self.transport.open();
    }

    fn disconnect(&mut self, now_ms: f64) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.state = ConnectionState::Disconnected;
        if self.reconnect_at.is_none() {
            self.reconnect_at = Some(now_ms + self.reconnect_delay_ms);
        }
    }

    /// Fire a due reconnect, then drain the transport.
    pub fn update(&mut self, now_ms: f64) -> Vec<SessionEvent> {
        if self.reconnect_at.is_some_and(|at| now_ms >= at) {
            self.reconnect_at = None;
            self.connect();
        }

        let mut events = Vec::new();
        for event in self.transport.poll() {
            match event {
                TransportEvent::Opened => {
                    self.state = ConnectionState::Connected;
                    self.transport.send_text(ClientMessage::Subscribe.to_json());
                    info!("[net] session open, subscribed");
                    events.push(SessionEvent::Connected);
                }
                TransportEvent::Text(text) => events.push(SessionEvent::Frame(text)),
                TransportEvent::Failed(error) => {
                    self.disconnect(now_ms);
                    events.push(SessionEvent::Failed(error));
                }
                TransportEvent::Closed(reason) => {
                    if self.state != ConnectionState::Disconnected {
                        self.disconnect(now_ms);
                        events.push(SessionEvent::Lost(reason));
                    }
                }
            }
        }
        events
    }

    pub fn shutdown(&mut self) {
        self.transport.shutdown();
    }
}

/// WebSocket transport backed by a dedicated thread.
pub struct WebSocketTransport {
    tx_cmd: Sender<NetCmd>,
    rx_evt: Receiver<TransportEvent>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl WebSocketTransport {
    /// Spawn the network thread for `url`. Nothing connects until [`Transport::open`].
    pub fn spawn(url: impl Into<String>) -> Self {
        let url = url.into();
        let (tx_cmd, rx_cmd) = unbounded::<NetCmd>();
        let (tx_evt, rx_evt) = unbounded::<TransportEvent>();
        let handle = std::thread::spawn(move || network_thread(url, rx_cmd, tx_evt));
        WebSocketTransport {
            tx_cmd,
            rx_evt,
            handle: Some(handle),
        }
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self) {
        let _ = self.tx_cmd.send(NetCmd::Connect);
    }

    fn send_text(&mut self, text: String) {
        let _ = self.tx_cmd.send(NetCmd::Send(text));
    }

    fn poll(&mut self) -> Vec<TransportEvent> {
        self.rx_evt.try_iter().collect()
    }

    fn shutdown(&mut self) {
        let _ = self.tx_cmd.send(NetCmd::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Transport whose behavior on `open` is scripted by the test.
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        inner: Arc<Mutex<Script>>,
    }

    #[derive(Default)]
    struct Script {
        accept: bool,
        opens: u32,
        sent: Vec<String>,
        queued: Vec<TransportEvent>,
    }

    impl ScriptedTransport {
        fn push(&self, event: TransportEvent) {
            self.inner.lock().unwrap().queued.push(event);
        }
        fn opens(&self) -> u32 {
            self.inner.lock().unwrap().opens
        }
        fn sent(&self) -> Vec<String> {
            self.inner.lock().unwrap().sent.clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn open(&mut self) {
            let mut script = self.inner.lock().unwrap();
            script.opens += 1;
            let event = if script.accept {
                TransportEvent::Opened
            } else {
                TransportEvent::Failed("connection refused".into())
            };
            script.queued.push(event);
        }
        fn send_text(&mut self, text: String) {
            self.inner.lock().unwrap().sent.push(text);
        }
        fn poll(&mut self) -> Vec<TransportEvent> {
            std::mem::take(&mut self.inner.lock().unwrap().queued)
        }
    }

    fn manager(accept: bool) -> (ConnectionManager, ScriptedTransport) {
        let transport = ScriptedTransport::default();
        transport.inner.lock().unwrap().accept = accept;
        let manager = ConnectionManager::new(Box::new(transport.clone()), RECONNECT_DELAY_MS);
        (manager, transport)
    }

    #[test]
    fn failing_transport_retries_once_per_interval() {
        let (mut manager, transport) = manager(false);
        manager.start();

        let mut attempt_times = Vec::new();
        let mut seen = manager.attempts();
        let mut now = 0.0;
        while now <= 16_000.0 {
            manager.update(now);
            if manager.attempts() != seen {
                seen = manager.attempts();
                attempt_times.push(now);
            }
            now += 100.0;
        }

        assert_eq!(attempt_times, vec![5000.0, 10_000.0, 15_000.0]);
        assert_eq!(transport.opens(), 4);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(manager.reconnect_at(), Some(20_000.0));
    }

    #[test]
    fn first_start_does_not_schedule_a_retry() {
        let (mut manager, _transport) = manager(true);
        assert_eq!(manager.reconnect_at(), None);
        manager.start();
        manager.start();
        assert_eq!(manager.attempts(), 1);
        assert_eq!(manager.reconnect_at(), None);
    }

    #[test]
    fn subscribes_as_soon_as_connected() {
        let (mut manager, transport) = manager(true);
        manager.start();
        let events = manager.update(0.0);
        assert_eq!(events, vec![SessionEvent::Connected]);
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(transport.sent(), vec![r#"{"type":"subscribe"}"#.to_string()]);
    }

    #[test]
    fn dropped_session_reconnects_after_delay() {
        let (mut manager, transport) = manager(true);
        manager.start();
        manager.update(0.0);

        transport.push(TransportEvent::Text("{}".into()));
        transport.push(TransportEvent::Closed(Some("bye".into())));
        transport.push(TransportEvent::Closed(None));
        let events = manager.update(1000.0);
        assert_eq!(
            events,
            vec![
                SessionEvent::Frame("{}".into()),
                SessionEvent::Lost(Some("bye".into())),
            ]
        );
        assert_eq!(manager.reconnect_at(), Some(6000.0));

        manager.update(5999.0);
        assert_eq!(transport.opens(), 1);
        manager.update(6000.0);
        assert_eq!(transport.opens(), 2);
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[test]
    fn due_reconnect_is_skipped_while_connecting() {
        let (mut manager, transport) = manager(false);
        manager.start();
        manager.update(0.0);
        assert_eq!(manager.reconnect_at(), Some(5000.0));

        // Someone else already got a session going before the timer fired.
        transport.inner.lock().unwrap().accept = true;
        manager.state = ConnectionState::Connecting;
        transport.push(TransportEvent::Opened);
        manager.update(5000.0);

        assert_eq!(transport.opens(), 1);
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(manager.reconnect_at(), None);
    }
}
