//! Messages exchanged with the background network thread.

/// Commands sent *to* the network thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetCmd {
    /// Open a session unless one is already open.
    Connect,
    /// Send a text frame on the open session.
    Send(String),
    /// Close the session and end the thread.
    Shutdown,
}

/// Session events sent *back* from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The session is established.
    Opened,
    /// A text frame arrived.
    Text(String),
    /// The connection attempt failed.
    Failed(String),
    /// An established session ended.
    Closed(Option<String>),
}
