// HTTP/ICY Stream-Quelle über embassy-net
//
// Pro Session genau eine TCP-Verbindung aus einem Pool der Größe 1.
// Protokoll-Details (Request, Head, Metadaten) kommen aus esp_core::icy.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::net::{IpAddr, Ipv4Addr, SocketAddr};

use defmt::{Debug2Format, debug, info, warn};
use embassy_net::tcp::client::{TcpClient, TcpConnection};
use embassy_net::{IpAddress, Stack, dns::DnsQueryType};
use embassy_time::{Duration, with_timeout};
use embedded_io_async::{Read, Write};
use embedded_nal_async::TcpConnect;
use esp_core::icy::{
    HttpUrl, IcyDemuxer, MAX_HEAD_LEN, MAX_REDIRECTS, ResponseHead, find_head_end, parse_http_url,
};
use esp_core::{SourceError, SourceFactory, StreamSource};

use crate::config::{
    CONNECT_TIMEOUT_SECS, DNS_TIMEOUT_SECS, READ_TIMEOUT_SECS, TCP_CONNECTIONS,
    TCP_RX_BUFFER_SIZE, TCP_TX_BUFFER_SIZE,
};

/// TCP-Client mit statischem Puffer-Pool
pub type StreamClient = TcpClient<'static, TCP_CONNECTIONS, TCP_TX_BUFFER_SIZE, TCP_RX_BUFFER_SIZE>;

type Connection = TcpConnection<'static, TCP_CONNECTIONS, TCP_TX_BUFFER_SIZE, TCP_RX_BUFFER_SIZE>;

/// Öffnet HTTP-Streams (folgt Redirects)
pub struct HttpSources {
    stack: Stack<'static>,
    client: &'static StreamClient,
}

impl HttpSources {
    pub fn new(stack: Stack<'static>, client: &'static StreamClient) -> Self {
        Self { stack, client }
    }

    /// Host → IPv4 (IP-Literale ohne DNS)
    async fn resolve(&self, host: &str) -> Result<Ipv4Addr, SourceError> {
        if let Ok(ip) = host.parse::<Ipv4Addr>() {
            return Ok(ip);
        }

        let result = with_timeout(
            Duration::from_secs(DNS_TIMEOUT_SECS),
            self.stack.dns_query(host, DnsQueryType::A),
        )
        .await;

        match result {
            Ok(Ok(addrs)) => {
                for addr in addrs {
                    if let IpAddress::Ipv4(ipv4) = addr {
                        return Ok(ipv4);
                    }
                }
                Err(SourceError::DnsFailed)
            }
            Ok(Err(e)) => {
                warn!("HTTP: DNS lookup for '{}' failed: {}", host, Debug2Format(&e));
                Err(SourceError::DnsFailed)
            }
            Err(_) => {
                warn!("HTTP: DNS lookup for '{}' timed out", host);
                Err(SourceError::Timeout)
            }
        }
    }

    async fn connect(&self, url: &HttpUrl<'_>) -> Result<Connection, SourceError> {
        if self.stack.config_v4().is_none() {
            return Err(SourceError::NoAddress);
        }

        let ip = self.resolve(url.host).await?;
        let remote = SocketAddr::new(IpAddr::V4(ip), url.port);
        debug!("HTTP: connecting to {}:{}", Debug2Format(&ip), url.port);

        match with_timeout(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            self.client.connect(remote),
        )
        .await
        {
            Ok(Ok(connection)) => Ok(connection),
            Ok(Err(e)) => {
                warn!("HTTP: connect failed: {}", Debug2Format(&e));
                Err(SourceError::ConnectFailed)
            }
            Err(_) => {
                warn!("HTTP: connect timed out");
                Err(SourceError::Timeout)
            }
        }
    }
}

impl SourceFactory for HttpSources {
    type Source = HttpStream;

    async fn open(&mut self, url: &str) -> Result<HttpStream, SourceError> {
        let mut target = String::from(url);

        for _ in 0..=MAX_REDIRECTS {
            let parsed = parse_http_url(&target)?;
            let mut connection = self.connect(&parsed).await?;

            connection
                .write_all(parsed.request().as_bytes())
                .await
                .map_err(|e| {
                    warn!("HTTP: sending request failed: {}", Debug2Format(&e));
                    SourceError::RequestFailed
                })?;

            let (head, body) = read_head(&mut connection).await?;

            if head.is_redirect() {
                let Some(location) = head.location.as_deref() else {
                    warn!("HTTP: redirect {} without Location", head.status);
                    return Err(SourceError::MalformedResponse);
                };
                let next = parsed.resolve(location);
                info!("HTTP: {} redirect to {}", head.status, next.as_str());
                // Verbindung wird hier freigegeben, bevor die nächste aufgeht
                drop(connection);
                target = next;
                continue;
            }

            if !head.is_ok() {
                warn!("HTTP: server answered {}", head.status);
                return Err(SourceError::BadStatus(head.status));
            }

            info!(
                "HTTP: streaming {} ({}, metaint {})",
                head.name.as_deref().unwrap_or("-"),
                head.content_type.as_deref().unwrap_or("unknown type"),
                head.metaint
            );
            return Ok(HttpStream::new(connection, head, body));
        }

        warn!("HTTP: more than {} redirects", MAX_REDIRECTS);
        Err(SourceError::TooManyRedirects)
    }
}

/// Liest bis zur Leerzeile, liefert Head und bereits empfangene Body-Bytes
async fn read_head(connection: &mut Connection) -> Result<(ResponseHead, Vec<u8>), SourceError> {
    let mut buf = vec![0u8; MAX_HEAD_LEN];
    let mut filled = 0;

    loop {
        if let Some(end) = find_head_end(&buf[..filled]) {
            let head = ResponseHead::parse(&buf[..end])?;
            return Ok((head, buf[end..filled].to_vec()));
        }
        if filled == buf.len() {
            warn!("HTTP: response head exceeds {} bytes", MAX_HEAD_LEN);
            return Err(SourceError::MalformedResponse);
        }

        let n = read_timeout(connection, &mut buf[filled..], CONNECT_TIMEOUT_SECS).await?;
        if n == 0 {
            warn!("HTTP: connection closed during response head");
            return Err(SourceError::MalformedResponse);
        }
        filled += n;
    }
}

async fn read_timeout(
    connection: &mut Connection,
    buf: &mut [u8],
    secs: u64,
) -> Result<usize, SourceError> {
    match with_timeout(Duration::from_secs(secs), connection.read(buf)).await {
        Ok(Ok(n)) => Ok(n),
        Ok(Err(e)) => {
            warn!("HTTP: read failed: {}", Debug2Format(&e));
            Err(SourceError::ReadFailed)
        }
        Err(_) => {
            warn!("HTTP: no data for {} s", secs);
            Err(SourceError::Timeout)
        }
    }
}

/// Geöffneter Stream: liefert nur Audio-Bytes
pub struct HttpStream {
    connection: Option<Connection>,
    demux: IcyDemuxer,
    /// Audio-Bytes, die schon mit dem Head kamen
    pending: Vec<u8>,
    pending_pos: usize,
}

impl HttpStream {
    fn new(connection: Connection, head: ResponseHead, mut body: Vec<u8>) -> Self {
        let mut demux = IcyDemuxer::new(head.metaint);
        let audio = demux.process(&mut body);
        body.truncate(audio);

        Self {
            connection: Some(connection),
            demux,
            pending: body,
            pending_pos: 0,
        }
    }
}

impl StreamSource for HttpStream {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        if self.pending_pos < self.pending.len() {
            let rest = &self.pending[self.pending_pos..];
            let n = rest.len().min(buf.len());
            buf[..n].copy_from_slice(&rest[..n]);
            self.pending_pos += n;
            if self.pending_pos == self.pending.len() {
                self.pending = Vec::new();
                self.pending_pos = 0;
            }
            return Ok(n);
        }

        let Some(connection) = self.connection.as_mut() else {
            return Ok(0);
        };

        // Reine Metadaten-Chunks überspringen, 0 heißt immer Stream-Ende
        loop {
            let n = read_timeout(connection, buf, READ_TIMEOUT_SECS).await?;
            if n == 0 {
                info!("HTTP: server closed the stream");
                return Ok(0);
            }
            let audio = self.demux.process(&mut buf[..n]);
            if audio > 0 {
                return Ok(audio);
            }
        }
    }

    fn take_title(&mut self) -> Option<String> {
        self.demux.take_title()
    }

    async fn close(&mut self) {
        self.pending = Vec::new();
        self.pending_pos = 0;
        if let Some(connection) = self.connection.take() {
            // Drop gibt Socket und Puffer an den Pool zurück
            drop(connection);
            debug!("HTTP: connection closed");
        }
    }
}
