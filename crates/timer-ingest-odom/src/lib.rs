use anyhow::Context;
use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, info, warn};
use model::{Position, Velocity};
use std::io::Cursor;
use std::time::Instant;
use timer_ingest_core::*;
use tokio::net::UdpSocket;

/// u32 seq + f64 stamp + 3 x f64 position + 3 x f64 velocity
pub const DATAGRAM_LEN: usize = 4 + 8 * 7;

/// Which clock stamps the samples handed to the timer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StampMode {
    /// Receiver's monotonic clock at arrival, measured from when the source started.
    #[default]
    Arrival,
    /// `stamp_s` carried in the datagram.
    Message,
}

#[derive(Clone, Debug)]
pub struct OdomConfig {
    pub bind_addr: String, // e.g. "0.0.0.0:9870"
    pub stamp: StampMode,
}

impl Default for OdomConfig {
    fn default() -> Self {
        Self { bind_addr: "0.0.0.0:9870".into(), stamp: StampMode::Arrival }
    }
}

/// One decoded odometry datagram.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OdomPacket {
    pub seq: u32,
    pub stamp_s: f64,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
}

impl OdomPacket {
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < DATAGRAM_LEN {
            return None;
        }
        let mut c = Cursor::new(buf);
        let seq = c.read_u32::<LittleEndian>().ok()?;
        let stamp_s = c.read_f64::<LittleEndian>().ok()?;
        let mut position = [0.0; 3];
        for p in position.iter_mut() {
            *p = c.read_f64::<LittleEndian>().ok()?;
        }
        let mut velocity = [0.0; 3];
        for v in velocity.iter_mut() {
            *v = c.read_f64::<LittleEndian>().ok()?;
        }
        Some(Self { seq, stamp_s, position, velocity })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(DATAGRAM_LEN);
        out.extend_from_slice(&self.seq.to_le_bytes());
        out.extend_from_slice(&self.stamp_s.to_le_bytes());
        for p in self.position.iter().chain(self.velocity.iter()) {
            out.extend_from_slice(&p.to_le_bytes());
        }
        out
    }

    /// Altitude (`position[2]`) is dropped here.
    pub fn to_sample(&self, timestamp_s: f64) -> Sample {
        Sample::new(
            Position::new(self.position[0], self.position[1]),
            Velocity::new(self.velocity[0], self.velocity[1], self.velocity[2]),
            timestamp_s,
        )
    }
}

pub struct OdomSource {
    cfg: OdomConfig,
}

impl OdomSource {
    pub fn new(cfg: OdomConfig) -> Self { Self { cfg } }

    /// Serve datagrams from an already bound socket until the receiver hangs up.
    pub async fn run_on(&self, socket: UdpSocket, tx: SampleTx) -> Result<(), IngestError> {
        let started = Instant::now();
        let mut buf = vec![0u8; 2048];
        let mut last_seq: Option<u32> = None;
        let mut dropped: u64 = 0;
        loop {
            let (len, peer) = socket.recv_from(&mut buf).await?;
            let Some(pkt) = OdomPacket::parse(&buf[..len]) else {
                debug!("skipping {} byte datagram from {}", len, peer);
                continue;
            };
            if let Some(prev) = last_seq {
                if pkt.seq != prev.wrapping_add(1) {
                    debug!("odometry seq jumped {} -> {}", prev, pkt.seq);
                }
            }
            last_seq = Some(pkt.seq);

            let t = match self.cfg.stamp {
                StampMode::Arrival => started.elapsed().as_secs_f64(),
                StampMode::Message => pkt.stamp_s,
            };
            if !tx.offer(pkt.to_sample(t))? {
                dropped += 1;
                warn!("sample queue full at seq {}, dropped oldest ({} total)", pkt.seq, dropped);
            }
        }
    }
}

#[async_trait::async_trait]
impl SampleSource for OdomSource {
    async fn run(&self, tx: SampleTx) -> Result<(), IngestError> {
        let socket = UdpSocket::bind(&self.cfg.bind_addr).await
            .with_context(|| format!("bind {}", self.cfg.bind_addr))?;
        info!("listening for odometry on {}", self.cfg.bind_addr);
        self.run_on(socket, tx).await
    }
}
