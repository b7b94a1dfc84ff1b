use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use wirecall::JsonCodec;
use wirecall::prelude::*;

// ---------------------------------------------------------------------------
// RPC surface
// ---------------------------------------------------------------------------

// Client-callable (server side), addressed by wire code on the wire.
const SET_NICK: RpcId = RpcId::from_names("Chat", "SetNick");
const SEND_MESSAGE: RpcId = RpcId::from_names("Chat", "SendMessage");

// Server-callable (client side), addressed by identity on the wire.
const MOTD: RpcId = RpcId::from_names("Chat", "Motd");
const BROADCAST: RpcId = RpcId::from_names("Chat", "Broadcast");

const SERVER_CONN: ConnectionId = ConnectionId::new(1);
const CLIENT_CONN: ConnectionId = ConnectionId::new(7);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatLine {
    from: String,
    text: String,
}

// ---------------------------------------------------------------------------
// Server host
// ---------------------------------------------------------------------------

/// Thunk for Chat.SendMessage: decode the line, queue it for relaying.
fn send_message_handler(
    relay: mpsc::UnboundedSender<ChatLine>,
) -> impl Fn(CallContext<'_>) -> Result<(), HandlerError> + Send + Sync + 'static {
    move |ctx| {
        let line: ChatLine = serde_json::from_slice(ctx.args)
            .map_err(|e| HandlerError::BadArguments(e.to_string()))?;
        relay
            .send(line)
            .map_err(|_| HandlerError::Failed("relay queue closed".into()))?;
        Ok(())
    }
}

/// Drives the server side of the pipe: handshake and greeting up front,
/// then drain inbound frames, relay recorded chat lines, and hot-reload
/// the callable set once after the first relay.
async fn run_server(
    mut server: RpcServer<JsonCodec>,
    mut inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    mut relay: mpsc::UnboundedReceiver<ChatLine>,
    relay_tx: mpsc::UnboundedSender<ChatLine>,
) -> Result<(), WirecallError> {
    // A new connection always gets the current numbering before anything
    // else; the greeting call rides right behind it.
    let hello = server.encode(&server.handshake())?;
    let motd = server.encode(&server.call(MOTD, JsonCodec.encode(&"welcome to the relay")?))?;
    if outbound.send(hello).is_err() || outbound.send(motd).is_err() {
        return Ok(());
    }

    let mut relayed = 0usize;
    let mut reloaded = false;

    while let Some(frame) = inbound.recv().await {
        server.handle_frame(CLIENT_CONN, &frame);

        // Relay whatever the handlers recorded for this frame.
        while let Ok(line) = relay.try_recv() {
            tracing::info!(from = %line.from, text = %line.text, "relaying chat line");
            let frame = server.encode(&server.call(BROADCAST, JsonCodec.encode(&line)?))?;
            if outbound.send(frame).is_err() {
                return Ok(());
            }
            relayed += 1;
        }

        // Simulate a script hot reload once: SetNick does not survive and
        // every wire code is reassigned, so peers must re-handshake.
        if relayed >= 1 && !reloaded {
            reloaded = true;
            let registry = RpcSetup::new()
                .handler(SEND_MESSAGE, send_message_handler(relay_tx.clone()))
                .into_registry()?;
            let broadcast = server.reload(registry);
            if outbound.send(server.encode(&broadcast)?).is_err() {
                return Ok(());
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Client host
// ---------------------------------------------------------------------------

/// Translates and sends one outbound call. Returns `false` when the
/// identity has no wire code under the current definitions.
fn send_call(
    client: &RpcClient<JsonCodec>,
    pipe: &mpsc::UnboundedSender<Vec<u8>>,
    id: RpcId,
    args: Vec<u8>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let Some(message) = client.call(id, args) else {
        return Ok(false);
    };
    pipe.send(client.encode(&message)?)
        .map_err(|_| "server pipe closed")?;
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Byte pipes stand in for the transport.
    let (c2s_tx, c2s_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let (s2c_tx, mut s2c_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let (relay_tx, relay_rx) = mpsc::unbounded_channel::<ChatLine>();

    let server = hook::prepare_server(
        RpcSetup::new()
            .handler(SET_NICK, |ctx| {
                let nick: String = serde_json::from_slice(ctx.args)
                    .map_err(|e| HandlerError::BadArguments(e.to_string()))?;
                tracing::info!(%nick, connection = %ctx.connection, "nick set");
                Ok(())
            })
            .handler(SEND_MESSAGE, send_message_handler(relay_tx.clone())),
    )?;
    let server_task = tokio::spawn(run_server(server, c2s_rx, s2c_tx, relay_rx, relay_tx));

    let mut client = hook::prepare(
        RpcSetup::new()
            .handler(MOTD, |ctx| {
                let motd: String = serde_json::from_slice(ctx.args)
                    .map_err(|e| HandlerError::BadArguments(e.to_string()))?;
                tracing::info!(%motd, "message of the day");
                Ok(())
            })
            .handler(BROADCAST, |ctx| {
                let line: ChatLine = serde_json::from_slice(ctx.args)
                    .map_err(|e| HandlerError::BadArguments(e.to_string()))?;
                tracing::info!(from = %line.from, text = %line.text, "chat received");
                Ok(())
            }),
    )?;

    client.begin_session(SERVER_CONN);

    // Definitions handshake, then the greeting call behind it.
    for _ in 0..2 {
        let frame = s2c_rx.recv().await.ok_or("server closed the pipe")?;
        client.handle_frame(SERVER_CONN, &frame);
    }
    tracing::info!(state = %client.state(), "link established");

    send_call(&client, &c2s_tx, SET_NICK, JsonCodec.encode(&"ada")?)?;
    send_call(
        &client,
        &c2s_tx,
        SEND_MESSAGE,
        JsonCodec.encode(&ChatLine {
            from: "ada".into(),
            text: "hello, relay".into(),
        })?,
    )?;

    // The broadcast for "hello, relay" comes back first.
    let frame = s2c_rx.recv().await.ok_or("server closed the pipe")?;
    client.handle_frame(SERVER_CONN, &frame);

    // The server has hot-reloaded behind that broadcast. This call still
    // carries the dead numbering and the server drops it on arrival.
    send_call(
        &client,
        &c2s_tx,
        SEND_MESSAGE,
        JsonCodec.encode(&ChatLine {
            from: "ada".into(),
            text: "lost to the reload".into(),
        })?,
    )?;

    // Install the reload's definitions and recover.
    let frame = s2c_rx.recv().await.ok_or("server closed the pipe")?;
    client.handle_frame(SERVER_CONN, &frame);

    if !send_call(&client, &c2s_tx, SET_NICK, JsonCodec.encode(&"ada2")?)? {
        tracing::info!("set-nick is no longer callable after the reload");
    }

    send_call(
        &client,
        &c2s_tx,
        SEND_MESSAGE,
        JsonCodec.encode(&ChatLine {
            from: "ada".into(),
            text: "made it through".into(),
        })?,
    )?;
    let frame = s2c_rx.recv().await.ok_or("server closed the pipe")?;
    client.handle_frame(SERVER_CONN, &frame);

    client.end_session();
    drop(c2s_tx);
    server_task.await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_handler_decodes_and_relays() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = send_message_handler(tx);

        let args = serde_json::to_vec(&ChatLine {
            from: "ada".into(),
            text: "hi".into(),
        })
        .unwrap();
        handler(CallContext {
            connection: CLIENT_CONN,
            args: &args,
        })
        .unwrap();

        let line = rx.try_recv().unwrap();
        assert_eq!(line.from, "ada");
        assert_eq!(line.text, "hi");
    }

    #[test]
    fn test_send_message_handler_rejects_garbage() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ChatLine>();
        let handler = send_message_handler(tx);

        let result = handler(CallContext {
            connection: CLIENT_CONN,
            args: b"not a chat line",
        });

        assert!(matches!(result, Err(HandlerError::BadArguments(_))));
        assert!(rx.try_recv().is_err());
    }
}
