//! Live session plumbing.
//!
//! This module hosts the background socket thread and the systems that bridge
//! it with the ECS world:
//! - [`network_thread`] runs on its own OS thread, owns the `tungstenite`
//!   socket, and processes [`NetCmd`] messages, emitting [`TransportEvent`]s.
//! - [`poll_connection`] drives the [`ConnectionManager`] each frame, writes
//!   the user-facing connection log lines and turns inbound frames into
//!   [`ServerEvent`] messages.
//! - [`apply_server_events`] is the single state-update step: it applies the
//!   frame's events to the [`GameStateStore`], the avatar animation and the
//!   event log.
//!
//! The socket never blocks the frame loop; a dead or unreachable server only
//! shows up as log lines and a reconnect every few seconds.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};
use thiserror::Error;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::components::animation::AnimationController;
use crate::components::avatar::Avatar;
use crate::components::floatingtext::{FLOATING_TEXT_SECS, FloatingText};
use crate::components::ttl::Ttl;
use crate::events::network::{NetCmd, TransportEvent};
use crate::events::server::{ServerEvent, parse_server_message};
use crate::resources::connection::{ConnectionManager, SessionEvent};
use crate::resources::eventlog::EventLog;
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestatestore::GameStateStore;
use crate::resources::worldtime::WorldTime;

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// How long a socket read waits before the thread checks for commands again.
const READ_TIMEOUT: Duration = Duration::from_millis(20);
/// Upper bound of frames forwarded per loop iteration.
const MAX_FRAMES_PER_PUMP: usize = 64;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket: {0}")]
    Socket(#[from] tungstenite::Error),
    #[error("socket setup: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one read attempt on the open socket.
enum Pump {
    Idle,
    Text(String),
    Closed(Option<String>),
}

fn open_socket(url: &str) -> Result<Socket, TransportError> {
    let (mut socket, _response) = tungstenite::connect(url)?;
    if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
    }
    Ok(socket)
}

fn pump(socket: &mut Socket) -> Pump {
    match socket.read() {
        Ok(Message::Text(text)) => Pump::Text(text),
        Ok(Message::Close(frame)) => Pump::Closed(frame.map(|f| f.reason.into_owned())),
        Ok(_) => Pump::Idle,
        Err(tungstenite::Error::Io(e))
            if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
        {
            Pump::Idle
        }
        Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
            Pump::Closed(None)
        }
        Err(e) => Pump::Closed(Some(e.to_string())),
    }
}

/// Entry point of the dedicated socket thread.
///
/// While no session is open the thread blocks on its command channel. Once a
/// [`NetCmd::Connect`] succeeds it alternates between draining commands and
/// short timed reads, forwarding every text frame as
/// [`TransportEvent::Text`].
///
/// Returns on [`NetCmd::Shutdown`] or when the command sender is dropped.
pub fn network_thread(url: String, rx_cmd: Receiver<NetCmd>, tx_evt: Sender<TransportEvent>) {
    info!(
        "[net] thread starting (id={:?}) url='{}'",
        std::thread::current().id(),
        url
    );
    let mut session: Option<Socket> = None;

    'run: loop {
        if session.is_none() {
            match rx_cmd.recv() {
                Ok(NetCmd::Connect) => match open_socket(&url) {
                    Ok(socket) => {
                        debug!("[net] connected to '{}'", url);
                        session = Some(socket);
                        let _ = tx_evt.send(TransportEvent::Opened);
                    }
                    Err(e) => {
                        debug!("[net] connect to '{}' failed: {}", url, e);
                        let _ = tx_evt.send(TransportEvent::Failed(e.to_string()));
                    }
                },
                Ok(NetCmd::Send(_)) => debug!("[net] no session, outbound frame dropped"),
                Ok(NetCmd::Shutdown) | Err(_) => break 'run,
            }
            continue;
        }
        let Some(socket) = session.as_mut() else {
            continue;
        };

        let mut closed: Option<Option<String>> = None;

        for cmd in rx_cmd.try_iter() {
            match cmd {
                NetCmd::Connect => {}
                NetCmd::Send(text) => {
                    if let Err(e) = socket.send(Message::Text(text)) {
                        closed = Some(Some(e.to_string()));
                        break;
                    }
                }
                NetCmd::Shutdown => {
                    let _ = socket.close(None);
                    let _ = socket.flush();
                    break 'run;
                }
            }
        }

        if closed.is_none() {
            for _ in 0..MAX_FRAMES_PER_PUMP {
                match pump(socket) {
                    Pump::Idle => break,
                    Pump::Text(text) => {
                        let _ = tx_evt.send(TransportEvent::Text(text));
                    }
                    Pump::Closed(reason) => {
                        closed = Some(reason);
                        break;
                    }
                }
            }
        }

        if let Some(reason) = closed {
            debug!("[net] session closed: {:?}", reason);
            session = None;
            let _ = tx_evt.send(TransportEvent::Closed(reason));
        }
    }

    info!("[net] thread exiting");
}

/// Advance the ECS message queue for [`ServerEvent`].
///
/// Run this before [`poll_connection`] so last frame's events are dropped and
/// this frame's become readable by [`apply_server_events`].
pub fn update_server_event_messages(mut messages: ResMut<Messages<ServerEvent>>) {
    messages.update();
}

/// Drive the connection manager and forward parsed frames.
///
/// Malformed frames are logged and dropped; they never affect the session.
pub fn poll_connection(
    connection: Option<ResMut<ConnectionManager>>,
    time: Res<WorldTime>,
    mut log: ResMut<EventLog>,
    mut writer: MessageWriter<ServerEvent>,
) {
    let Some(mut connection) = connection else {
        return;
    };
    let now = time.elapsed;
    for event in connection.update(time.now_ms()) {
        match event {
            SessionEvent::Connected => log.push(now, "Connected to game server"),
            SessionEvent::Lost(reason) => {
                debug!("[net] close reason: {:?}", reason);
                log.push(now, "Connection to server lost");
            }
            // A failed attempt is also a closed session.
            SessionEvent::Failed(error) => {
                debug!("[net] connect error: {}", error);
                log.push(now, "WebSocket error - running in demo mode");
                log.push(now, "Connection to server lost");
            }
            SessionEvent::Frame(text) => match parse_server_message(&text) {
                Ok(Some(server_event)) => {
                    writer.write(server_event);
                }
                Ok(None) => {}
                Err(e) => warn!("[net] dropping server message: {}", e),
            },
        }
    }
}

/// Apply this frame's server events.
pub fn apply_server_events(
    mut reader: MessageReader<ServerEvent>,
    mut store: ResMut<GameStateStore>,
    mut log: ResMut<EventLog>,
    mut avatars: Query<&mut AnimationController, With<Avatar>>,
    time: Res<WorldTime>,
    config: Res<GameConfig>,
    mut commands: Commands,
) {
    for event in reader.read() {
        match event {
            ServerEvent::GameUpdate(snapshot) => store.replace_snapshot(snapshot.clone()),
            ServerEvent::PlayerMove(player) => {
                store.set_player(player.clone());
                for mut controller in avatars.iter_mut() {
                    controller.trigger_walk(time.now_ms());
                }
            }
            ServerEvent::DiceRoll(roll) => {
                log.push(time.elapsed, roll.describe());
                commands.spawn((
                    FloatingText::scattered(
                        roll.roll.to_string(),
                        roll.is_critical,
                        config.window_width,
                        config.window_height,
                    ),
                    Ttl::new(FLOATING_TEXT_SECS),
                ));
            }
        }
    }
}

/// Close the session and join the socket thread, if a connection exists.
pub fn shutdown_network(world: &mut World) {
    if let Some(mut connection) = world.remove_resource::<ConnectionManager>() {
        connection.shutdown();
    }
}
