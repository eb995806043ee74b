use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::inspector::codec::MAX_MESSAGE_SIZE;
use crate::inspector::message::{self, InspectionRequest, InspectionResponse};

/// What the simulated inspector does with one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(InspectionResponse),
    Raw(Vec<u8>),
    /// Close after reading, without answering.
    Close,
    /// Read the request, never answer, wait for the client to hang up.
    Stall,
}

/// Things the simulated inspector observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seen {
    Request(InspectionRequest),
    Undecodable(Vec<u8>),
    /// The client closed a stalled connection.
    ClientClosed,
}

/// Inspector service stand-in listening on an ephemeral loopback port.
pub struct MockInspector {
    pub addr: SocketAddr,
    pub seen: mpsc::UnboundedReceiver<Seen>,
}

impl MockInspector {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&InspectionRequest) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock inspector");
        let addr = listener.local_addr().expect("local addr");
        let (tx, seen) = mpsc::unbounded_channel();
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    serve_one(stream, handler.as_ref(), tx).await;
                });
            }
        });

        Self { addr, seen }
    }

    /// Answers every request with `response`.
    pub async fn responding(response: InspectionResponse) -> Self {
        Self::start(move |_| Reply::Respond(response.clone())).await
    }

    /// Accepts connections and closes them straight away.
    pub async fn hanging_up() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock inspector");
        let addr = listener.local_addr().expect("local addr");
        let (_tx, seen) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });

        Self { addr, seen }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

async fn serve_one<F>(mut stream: TcpStream, handler: &F, tx: mpsc::UnboundedSender<Seen>)
where
    F: Fn(&InspectionRequest) -> Reply,
{
    let mut buf = vec![0u8; MAX_MESSAGE_SIZE];
    let n = match stream.read(&mut buf).await {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };

    let request = match message::decode_request(&buf[..n]) {
        Ok(request) => request,
        Err(_) => {
            let _ = tx.send(Seen::Undecodable(buf[..n].to_vec()));
            return;
        }
    };
    let reply = handler(&request);
    let _ = tx.send(Seen::Request(request));

    match reply {
        Reply::Respond(response) => {
            let bytes = message::encode_response(&response).expect("encode mock response");
            let _ = stream.write_all(&bytes).await;
        }
        Reply::Raw(bytes) => {
            let _ = stream.write_all(&bytes).await;
        }
        Reply::Close => {}
        Reply::Stall => {
            let mut rest = [0u8; 64];
            loop {
                match stream.read(&mut rest).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => continue,
                }
            }
            let _ = tx.send(Seen::ClientClosed);
        }
    }
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}
