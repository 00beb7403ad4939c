//! In-memory channel transport used by the session tests: both endpoints
//! of a connection live in the same process and exchange bytes over tokio
//! channels, with FIN modeled by dropping the sender half.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use tokio::sync::{mpsc, Mutex};
use url::Url;

use crate::modules::errors::CodecError;
use crate::modules::messages::control_messages::control_message::ControlMessage;
use crate::modules::transport::protocol::TransportProtocol;
use crate::modules::transport::read_error::TransportError;
use crate::modules::transport::transport_connection::TransportConnection;
use crate::modules::transport::transport_connection_creator::TransportConnectionCreator;
use crate::modules::transport::transport_receive_stream::TransportReceiveStream;
use crate::modules::transport::transport_send_stream::TransportSendStream;

pub(crate) struct TestProtocol;

impl TransportProtocol for TestProtocol {
    type ConnectionCreator = TestConnectionCreator;
    type Connection = TestConnection;
    type SendStream = TestSendStream;
    type ReceiveStream = TestReceiveStream;
}

pub(crate) struct TestSendStream {
    chunks: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

#[async_trait]
impl TransportSendStream for TestSendStream {
    async fn send(&mut self, buffer: &BytesMut) -> Result<(), TransportError> {
        let Some(chunks) = &self.chunks else {
            return Err(TransportError::Closed);
        };
        chunks
            .send(buffer.to_vec())
            .map_err(|_| TransportError::Closed)
    }

    async fn finish(&mut self) -> Result<(), TransportError> {
        // Dropping the sender is the FIN: the peer's receiver yields None.
        self.chunks.take().ok_or(TransportError::Closed).map(|_| ())
    }
}

pub(crate) struct TestReceiveStream {
    chunks: mpsc::UnboundedReceiver<Vec<u8>>,
    pending: Vec<u8>,
}

#[async_trait]
impl TransportReceiveStream for TestReceiveStream {
    async fn receive(&mut self, buffer: &mut Vec<u8>) -> Result<Option<usize>, TransportError> {
        if self.pending.is_empty() {
            match self.chunks.recv().await {
                Some(chunk) => self.pending = chunk,
                None => return Ok(None),
            }
        }
        let n = self.pending.len().min(buffer.len());
        buffer[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(Some(n))
    }
}

fn stream_pair() -> (TestSendStream, TestReceiveStream) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        TestSendStream {
            chunks: Some(sender),
        },
        TestReceiveStream {
            chunks: receiver,
            pending: Vec::new(),
        },
    )
}

type BiStreams = (TestSendStream, TestReceiveStream);

pub(crate) struct TestConnection {
    outgoing_bi: mpsc::UnboundedSender<BiStreams>,
    incoming_bi: Mutex<mpsc::UnboundedReceiver<BiStreams>>,
    outgoing_uni: mpsc::UnboundedSender<TestReceiveStream>,
    incoming_uni: Mutex<mpsc::UnboundedReceiver<TestReceiveStream>>,
    outgoing_datagrams: mpsc::UnboundedSender<Bytes>,
    incoming_datagrams: Mutex<mpsc::UnboundedReceiver<Bytes>>,
    closed: AtomicBool,
}

/// Builds both endpoints of an in-memory connection.
pub(crate) fn connection_pair() -> (TestConnection, TestConnection) {
    let (bi_a_to_b_sender, bi_a_to_b_receiver) = mpsc::unbounded_channel();
    let (bi_b_to_a_sender, bi_b_to_a_receiver) = mpsc::unbounded_channel();
    let (uni_a_to_b_sender, uni_a_to_b_receiver) = mpsc::unbounded_channel();
    let (uni_b_to_a_sender, uni_b_to_a_receiver) = mpsc::unbounded_channel();
    let (datagram_a_to_b_sender, datagram_a_to_b_receiver) = mpsc::unbounded_channel();
    let (datagram_b_to_a_sender, datagram_b_to_a_receiver) = mpsc::unbounded_channel();

    let a = TestConnection {
        outgoing_bi: bi_a_to_b_sender,
        incoming_bi: Mutex::new(bi_b_to_a_receiver),
        outgoing_uni: uni_a_to_b_sender,
        incoming_uni: Mutex::new(uni_b_to_a_receiver),
        outgoing_datagrams: datagram_a_to_b_sender,
        incoming_datagrams: Mutex::new(datagram_b_to_a_receiver),
        closed: AtomicBool::new(false),
    };
    let b = TestConnection {
        outgoing_bi: bi_b_to_a_sender,
        incoming_bi: Mutex::new(bi_a_to_b_receiver),
        outgoing_uni: uni_b_to_a_sender,
        incoming_uni: Mutex::new(uni_a_to_b_receiver),
        outgoing_datagrams: datagram_b_to_a_sender,
        incoming_datagrams: Mutex::new(datagram_a_to_b_receiver),
        closed: AtomicBool::new(false),
    };
    (a, b)
}

impl TestConnection {
    /// Test-side helper: accept the bidi stream the session opened.
    pub(crate) async fn accept_bi(&self) -> BiStreams {
        self.incoming_bi
            .lock()
            .await
            .recv()
            .await
            .expect("peer dropped before opening a bidi stream")
    }
}

#[async_trait]
impl TransportConnection for TestConnection {
    type SendStream = TestSendStream;
    type ReceiveStream = TestReceiveStream;

    async fn open_bi(
        &self,
        _send_priority: i32,
    ) -> Result<(TestSendStream, TestReceiveStream), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionLost);
        }
        let (local_send, peer_receive) = stream_pair();
        let (peer_send, local_receive) = stream_pair();
        self.outgoing_bi
            .send((peer_send, peer_receive))
            .map_err(|_| TransportError::ConnectionLost)?;
        Ok((local_send, local_receive))
    }

    async fn open_uni(&self, _send_priority: i32) -> Result<TestSendStream, TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionLost);
        }
        let (local_send, peer_receive) = stream_pair();
        self.outgoing_uni
            .send(peer_receive)
            .map_err(|_| TransportError::ConnectionLost)?;
        Ok(local_send)
    }

    async fn accept_uni(&self) -> Result<TestReceiveStream, TransportError> {
        self.incoming_uni
            .lock()
            .await
            .recv()
            .await
            .ok_or(TransportError::ConnectionLost)
    }

    async fn send_datagram(&self, datagram: Bytes) -> Result<(), TransportError> {
        self.outgoing_datagrams
            .send(datagram)
            .map_err(|_| TransportError::ConnectionLost)
    }

    async fn receive_datagram(&self) -> Result<Bytes, TransportError> {
        self.incoming_datagrams
            .lock()
            .await
            .recv()
            .await
            .ok_or(TransportError::ConnectionLost)
    }

    fn close(&self, _error_code: u64, _reason: &[u8]) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub(crate) struct TestConnectionCreator {
    connection: Mutex<Option<TestConnection>>,
}

impl TestConnectionCreator {
    pub(crate) fn new(connection: TestConnection) -> Self {
        Self {
            connection: Mutex::new(Some(connection)),
        }
    }
}

#[async_trait]
impl TransportConnectionCreator for TestConnectionCreator {
    type Connection = TestConnection;

    async fn connect(&self, _url: &Url) -> Result<TestConnection, TransportError> {
        self.connection
            .lock()
            .await
            .take()
            .ok_or(TransportError::ConnectionLost)
    }
}

/// Fake relay endpoint driving the raw control stream in tests.
pub(crate) struct TestControlPeer {
    send: TestSendStream,
    receive: TestReceiveStream,
    recv_bytes: BytesMut,
}

impl TestControlPeer {
    pub(crate) fn new(streams: BiStreams) -> Self {
        let (send, receive) = streams;
        Self {
            send,
            receive,
            recv_bytes: BytesMut::new(),
        }
    }

    pub(crate) async fn send_message(&mut self, message: &ControlMessage) {
        let framed = message.packetize().expect("framing failed");
        self.send.send(&framed).await.expect("control send failed");
    }

    pub(crate) async fn next_message(&mut self) -> ControlMessage {
        loop {
            let mut cur = Cursor::new(&self.recv_bytes[..]);
            match ControlMessage::depacketize(&mut cur) {
                Ok(message) => {
                    let consumed = cur.position() as usize;
                    self.recv_bytes.advance(consumed);
                    return message;
                }
                Err(CodecError::NotEnoughBytes { .. }) => {
                    let mut buffer = vec![0u8; 1024];
                    match self
                        .receive
                        .receive(&mut buffer)
                        .await
                        .expect("control receive failed")
                    {
                        Some(n) => self.recv_bytes.extend_from_slice(&buffer[..n]),
                        None => panic!("control stream closed while waiting for a message"),
                    }
                }
                Err(error) => panic!("bad control frame: {error:?}"),
            }
        }
    }
}

/// Drains a unidirectional stream to FIN and returns every byte.
pub(crate) async fn read_stream_to_end(mut stream: TestReceiveStream) -> BytesMut {
    let mut collected = BytesMut::new();
    let mut buffer = vec![0u8; 1024];
    loop {
        match stream.receive(&mut buffer).await.expect("stream read failed") {
            Some(n) => collected.extend_from_slice(&buffer[..n]),
            None => return collected,
        }
    }
}
