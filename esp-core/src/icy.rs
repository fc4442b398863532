//! HTTP/ICY Stream-Protokoll
//!
//! Hardware-unabhängiger Teil der Stream-Quelle: URL zerlegen, Request
//! bauen, Response-Head parsen und Metadaten-Blöcke aus dem Audio-Stream
//! entfernen (SHOUTcast/Icecast `icy-metaint`).

use alloc::string::String;
use alloc::vec::Vec;

use crate::traits::SourceError;

/// Maximale Anzahl verfolgter Redirects pro `open`
pub const MAX_REDIRECTS: u8 = 3;

/// Maximale Größe des Response-Heads
pub const MAX_HEAD_LEN: usize = 1024;

pub const DEFAULT_PORT: u16 = 80;

/// Metadaten-Block: Längenbyte × 16
const MAX_META_LEN: usize = 255 * 16;

/// Zerlegte `http://` URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpUrl<'a> {
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
}

/// Zerlegt eine URL, nur `http://` wird akzeptiert
pub fn parse_http_url(url: &str) -> Result<HttpUrl<'_>, SourceError> {
    let rest = match url.strip_prefix("http://") {
        Some(rest) => rest,
        None if url.contains("://") => return Err(SourceError::UnsupportedScheme),
        None => return Err(SourceError::InvalidUrl),
    };

    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| SourceError::InvalidUrl)?;
            (host, port)
        }
        None => (authority, DEFAULT_PORT),
    };

    if host.is_empty() || port == 0 {
        return Err(SourceError::InvalidUrl);
    }

    Ok(HttpUrl { host, port, path })
}

impl HttpUrl<'_> {
    /// GET-Request (HTTP/1.0, Metadaten angefordert)
    pub fn request(&self) -> String {
        let mut req = String::with_capacity(128 + self.path.len() + self.host.len());
        req.push_str("GET ");
        req.push_str(self.path);
        req.push_str(" HTTP/1.0\r\nHost: ");
        req.push_str(self.host);
        if self.port != DEFAULT_PORT {
            req.push_str(&alloc::format!(":{}", self.port));
        }
        req.push_str("\r\nUser-Agent: esp-mp3-player\r\n");
        req.push_str("Accept: */*\r\n");
        req.push_str("Icy-MetaData: 1\r\n");
        req.push_str("Connection: close\r\n\r\n");
        req
    }

    /// Ziel eines Redirects als absolute URL
    ///
    /// `Location` darf absolut sein oder ein Pfad auf demselben Server.
    pub fn resolve(&self, location: &str) -> String {
        if location.contains("://") {
            return location.into();
        }

        let mut url = String::from("http://");
        url.push_str(self.host);
        if self.port != DEFAULT_PORT {
            url.push_str(&alloc::format!(":{}", self.port));
        }
        if !location.starts_with('/') {
            url.push('/');
        }
        url.push_str(location);
        url
    }
}

/// Position direkt hinter dem Head (Leerzeile), falls vollständig empfangen
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    for i in 0..buf.len() {
        if buf[i..].starts_with(b"\r\n\r\n") {
            return Some(i + 4);
        }
        if buf[i..].starts_with(b"\n\n") {
            return Some(i + 2);
        }
    }
    None
}

/// Geparster Response-Head
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    /// Abstand der Metadaten-Blöcke in Audio-Bytes
    pub metaint: Option<usize>,
    pub location: Option<String>,
    pub content_type: Option<String>,
    pub name: Option<String>,
}

impl ResponseHead {
    /// Parst Status-Zeile (`HTTP/1.x` oder `ICY`) und die bekannten Header
    pub fn parse(head: &[u8]) -> Result<Self, SourceError> {
        let text = core::str::from_utf8(head).map_err(|_| SourceError::MalformedResponse)?;
        let mut lines = text.lines().map(|l| l.trim_end_matches('\r'));

        let status_line = lines.next().ok_or(SourceError::MalformedResponse)?;
        let mut parts = status_line.split_whitespace();
        let protocol = parts.next().ok_or(SourceError::MalformedResponse)?;
        if !protocol.starts_with("HTTP/") && protocol != "ICY" {
            return Err(SourceError::MalformedResponse);
        }
        let status = parts
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or(SourceError::MalformedResponse)?;

        let mut parsed = Self {
            status,
            ..Self::default()
        };

        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();

            if name.eq_ignore_ascii_case("icy-metaint") {
                parsed.metaint = value.parse::<usize>().ok().filter(|&n| n > 0);
            } else if name.eq_ignore_ascii_case("location") {
                parsed.location = Some(value.into());
            } else if name.eq_ignore_ascii_case("content-type") {
                parsed.content_type = Some(value.into());
            } else if name.eq_ignore_ascii_case("icy-name") {
                parsed.name = Some(value.into());
            }
        }

        Ok(parsed)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Extrahiert `StreamTitle='...';` aus einem Metadaten-Block
pub fn parse_stream_title(meta: &[u8]) -> Option<String> {
    let end = meta.iter().position(|&b| b == 0).unwrap_or(meta.len());
    let text = core::str::from_utf8(&meta[..end]).ok()?;

    let start = text.find("StreamTitle='")? + "StreamTitle='".len();
    let rest = &text[start..];
    let title = match rest.find("';") {
        Some(stop) => &rest[..stop],
        None => rest.trim_end_matches('\''),
    };

    let title = title.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DemuxState {
    /// Noch n Audio-Bytes bis zum nächsten Längenbyte
    Audio(usize),
    Length,
    /// Noch n Metadaten-Bytes
    Meta(usize),
}

/// Trennt Audio-Bytes und eingebettete Metadaten
pub struct IcyDemuxer {
    metaint: Option<usize>,
    state: DemuxState,
    meta: Vec<u8>,
    current: Option<String>,
    pending: Option<String>,
}

impl IcyDemuxer {
    /// `metaint = None`: Stream ohne Metadaten, alles ist Audio
    pub fn new(metaint: Option<usize>) -> Self {
        let metaint = metaint.filter(|&n| n > 0);
        Self {
            metaint,
            state: DemuxState::Audio(metaint.unwrap_or(0)),
            meta: Vec::new(),
            current: None,
            pending: None,
        }
    }

    /// Entfernt Metadaten in-place
    ///
    /// Rückgabe: Anzahl Audio-Bytes, die danach vorne in `data` stehen.
    pub fn process(&mut self, data: &mut [u8]) -> usize {
        let Some(metaint) = self.metaint else {
            return data.len();
        };

        let mut out = 0;
        let mut i = 0;
        while i < data.len() {
            match self.state {
                DemuxState::Audio(remaining) => {
                    let n = remaining.min(data.len() - i);
                    data.copy_within(i..i + n, out);
                    out += n;
                    i += n;
                    self.state = if remaining == n {
                        DemuxState::Length
                    } else {
                        DemuxState::Audio(remaining - n)
                    };
                }
                DemuxState::Length => {
                    let len = data[i] as usize * 16;
                    i += 1;
                    self.meta.clear();
                    self.state = if len == 0 {
                        DemuxState::Audio(metaint)
                    } else {
                        DemuxState::Meta(len)
                    };
                }
                DemuxState::Meta(remaining) => {
                    let n = remaining.min(data.len() - i);
                    if self.meta.len() + n <= MAX_META_LEN {
                        self.meta.extend_from_slice(&data[i..i + n]);
                    }
                    i += n;
                    if remaining == n {
                        self.finish_meta();
                        self.state = DemuxState::Audio(metaint);
                    } else {
                        self.state = DemuxState::Meta(remaining - n);
                    }
                }
            }
        }
        out
    }

    fn finish_meta(&mut self) {
        let Some(title) = parse_stream_title(&self.meta) else {
            return;
        };
        if self.current.as_deref() != Some(title.as_str()) {
            self.current = Some(title.clone());
            self.pending = Some(title);
        }
    }

    /// Titel, falls seit dem letzten Aufruf geändert
    pub fn take_title(&mut self) -> Option<String> {
        self.pending.take()
    }
}
