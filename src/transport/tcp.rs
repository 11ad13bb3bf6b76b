//! Modbus TCP transport implementation.
//!
//! Speaks just enough of the protocol for discovery: function 03 (read
//! holding registers) framed with the MBAP header over a single TCP
//! connection. Each request blocks until the response arrives or the
//! configured response timeout elapses.

use crate::error::{TransportError, TransportResult};
use crate::transport::RegisterTransport;
use crate::types::{RegisterAddress, UnitId};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

/// Modbus function code for reading holding registers.
const FN_READ_HOLDING_REGISTERS: u8 = 0x03;

/// MBAP protocol identifier; always zero for Modbus.
const PROTOCOL_ID: u16 = 0;

/// Size of the MBAP header (transaction, protocol, length, unit).
const MBAP_HEADER_LEN: usize = 7;

/// Protocol ceiling on registers per read request.
pub const MAX_READ_WORDS: u16 = 125;

/// A Modbus TCP master holding one connection to one device.
///
/// Requests are strictly sequential; the transaction identifier increments
/// per request and responses are matched against it.
pub struct ModbusTcpClient {
    stream: TcpStream,
    timeout: Duration,
    peer: String,
    next_txn: u16,
}

impl ModbusTcpClient {
    /// Connect to a device, bounding the connection attempt by `timeout`.
    pub async fn connect(addr: SocketAddr, response_timeout: Duration) -> TransportResult<Self> {
        let stream = match timeout(response_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                return Err(TransportError::ConnectionRefused);
            }
            Ok(Err(e)) => {
                return Err(TransportError::ConnectionFailed {
                    target: addr.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(_) => return Err(TransportError::Timeout),
        };

        stream.set_nodelay(true)?;
        debug!("connected to {}", addr);

        Ok(Self {
            stream,
            timeout: response_timeout,
            peer: addr.to_string(),
            next_txn: 0,
        })
    }

    /// The peer this client is connected to.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Send a request frame and read back the matching response PDU.
    async fn exchange(&mut self, request: &[u8], txn: u16) -> TransportResult<Vec<u8>> {
        match timeout(self.timeout, self.exchange_inner(request, txn)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    async fn exchange_inner(&mut self, request: &[u8], txn: u16) -> TransportResult<Vec<u8>> {
        self.stream.write_all(request).await.map_err(map_io)?;

        let mut header = [0u8; MBAP_HEADER_LEN];
        self.stream
            .read_exact(&mut header)
            .await
            .map_err(map_io)?;

        let response_txn = u16::from_be_bytes([header[0], header[1]]);
        let protocol = u16::from_be_bytes([header[2], header[3]]);
        let length = u16::from_be_bytes([header[4], header[5]]) as usize;

        if protocol != PROTOCOL_ID {
            return Err(TransportError::MalformedResponse(format!(
                "unexpected protocol identifier {}",
                protocol
            )));
        }
        if response_txn != txn {
            return Err(TransportError::MalformedResponse(format!(
                "transaction id mismatch: sent {}, received {}",
                txn, response_txn
            )));
        }
        // Length covers the unit identifier plus the PDU.
        if length < 2 {
            return Err(TransportError::MalformedResponse(format!(
                "frame length {} too short",
                length
            )));
        }

        let mut pdu = vec![0u8; length - 1];
        self.stream.read_exact(&mut pdu).await.map_err(map_io)?;
        trace!("received {} PDU bytes from {}", pdu.len(), self.peer);

        Ok(pdu)
    }
}

#[async_trait]
impl RegisterTransport for ModbusTcpClient {
    async fn read_registers(
        &mut self,
        unit: UnitId,
        start: RegisterAddress,
        count: u16,
    ) -> TransportResult<Vec<u16>> {
        if count == 0 || count > MAX_READ_WORDS {
            return Err(TransportError::ReadTooLarge {
                count,
                limit: MAX_READ_WORDS,
            });
        }

        let txn = self.next_txn;
        self.next_txn = self.next_txn.wrapping_add(1);

        let request = encode_read_request(txn, unit, start, count);
        let pdu = self.exchange(&request, txn).await?;

        decode_read_payload(&pdu, count)
    }
}

/// Map an IO error from a live exchange into the transport taxonomy.
fn map_io(e: std::io::Error) -> TransportError {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof
        | std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::BrokenPipe => TransportError::ConnectionClosed,
        _ => TransportError::Io(e),
    }
}

/// Encode a read-holding-registers request frame (MBAP header + PDU).
fn encode_read_request(txn: u16, unit: UnitId, start: RegisterAddress, count: u16) -> [u8; 12] {
    let mut frame = [0u8; 12];
    frame[0..2].copy_from_slice(&txn.to_be_bytes());
    frame[2..4].copy_from_slice(&PROTOCOL_ID.to_be_bytes());
    // Remaining length: unit id + function + address + count.
    frame[4..6].copy_from_slice(&6u16.to_be_bytes());
    frame[6] = unit.as_u8();
    frame[7] = FN_READ_HOLDING_REGISTERS;
    frame[8..10].copy_from_slice(&start.as_u16().to_be_bytes());
    frame[10..12].copy_from_slice(&count.to_be_bytes());
    frame
}

/// Decode a response PDU into register words, expecting `count` of them.
fn decode_read_payload(pdu: &[u8], count: u16) -> TransportResult<Vec<u16>> {
    let function = *pdu
        .first()
        .ok_or_else(|| TransportError::MalformedResponse("empty PDU".to_string()))?;

    if function == FN_READ_HOLDING_REGISTERS | 0x80 {
        let code = pdu.get(1).copied().unwrap_or(0);
        return Err(TransportError::DeviceException {
            function: FN_READ_HOLDING_REGISTERS,
            code,
        });
    }
    if function != FN_READ_HOLDING_REGISTERS {
        return Err(TransportError::MalformedResponse(format!(
            "unexpected function code {:#04x}",
            function
        )));
    }

    let byte_count = *pdu.get(1).ok_or_else(|| {
        TransportError::MalformedResponse("missing byte count".to_string())
    })? as usize;
    let data = &pdu[2..];

    if data.len() != byte_count || byte_count != count as usize * 2 {
        return Err(TransportError::MalformedResponse(format!(
            "expected {} register bytes, received {}",
            count as usize * 2,
            data.len()
        )));
    }

    Ok(data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}
