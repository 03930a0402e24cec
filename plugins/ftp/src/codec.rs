//! Control-channel wire format: reply parsing and address encoding.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::FtpError;
use crate::session::Reply;

/// Default FTP control port.
pub const DEFAULT_PORT: u16 = 21;

/// Read one (possibly multi-line) reply.
///
/// A multi-line reply starts with `xyz-` and ends with a line starting
/// `xyz `, where `xyz` is the same code.
pub async fn read_reply<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Reply, FtpError> {
    let first = read_line(reader).await?;
    let (code, sep, text) = split_reply_line(&first)?;
    let mut message = text.to_string();

    if sep == '-' {
        let terminator = format!("{code} ");
        loop {
            let line = read_line(reader).await?;
            if let Some(rest) = line.strip_prefix(&terminator) {
                message.push('\n');
                message.push_str(rest);
                break;
            }
            if line == code.to_string() {
                break;
            }
            message.push('\n');
            message.push_str(line.strip_prefix(&format!("{code}-")).unwrap_or(&line));
        }
    }

    Ok(Reply { code, message })
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String, FtpError> {
    let mut line = String::new();
    let read = reader.read_line(&mut line).await?;
    if read == 0 {
        return Err(FtpError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "control connection closed by server",
        )));
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

fn split_reply_line(line: &str) -> Result<(u16, char, &str), FtpError> {
    let code = line
        .get(..3)
        .filter(|c| c.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| FtpError::protocol(format!("malformed reply line: {line:?}")))?;
    let sep = line[3..].chars().next().unwrap_or(' ');
    let text = if sep == ' ' || sep == '-' {
        line.get(4..).unwrap_or("")
    } else {
        return Err(FtpError::protocol(format!("malformed reply line: {line:?}")));
    };
    Ok((code, sep, text))
}

/// Parse the address out of a `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` reply.
pub fn parse_pasv(message: &str) -> Result<SocketAddrV4, FtpError> {
    let numbers = message
        .split(|c: char| !c.is_ascii_digit() && c != ',')
        .find(|token| token.matches(',').count() == 5)
        .ok_or_else(|| FtpError::protocol(format!("no address in PASV reply: {message:?}")))?;

    let parts: Vec<u8> = numbers
        .split(',')
        .map(str::parse::<u8>)
        .collect::<Result<_, _>>()
        .map_err(|_| FtpError::protocol(format!("bad PASV address: {numbers}")))?;

    let ip = Ipv4Addr::new(parts[0], parts[1], parts[2], parts[3]);
    let port = (u16::from(parts[4]) << 8) | u16::from(parts[5]);
    Ok(SocketAddrV4::new(ip, port))
}

/// Parse the port out of a `229 Entering Extended Passive Mode (|||port|)` reply.
pub fn parse_epsv(message: &str) -> Result<u16, FtpError> {
    let bad = || FtpError::protocol(format!("bad EPSV reply: {message:?}"));
    let open = message.find('(').ok_or_else(bad)?;
    let close = message[open..].find(')').ok_or_else(bad)? + open;
    let inner = &message[open + 1..close];

    let delimiter = inner.chars().next().ok_or_else(bad)?;
    let fields: Vec<&str> = inner.split(delimiter).collect();
    // "|||6446|" splits into ["", "", "", "6446", ""].
    match fields.as_slice() {
        ["", "", "", port, ""] => port.parse().map_err(|_| bad()),
        _ => Err(bad()),
    }
}

/// Argument for `PORT`: `h1,h2,h3,h4,p1,p2`.
pub fn format_port(addr: SocketAddrV4) -> String {
    let [a, b, c, d] = addr.ip().octets();
    let port = addr.port();
    format!("{a},{b},{c},{d},{},{}", port >> 8, port & 0xff)
}

/// Argument for `EPRT`: `|1|ip|port|` or `|2|ip|port|`.
pub fn format_eprt(addr: SocketAddr) -> String {
    let family = match addr.ip() {
        IpAddr::V4(_) => 1,
        IpAddr::V6(_) => 2,
    };
    format!("|{family}|{}|{}|", addr.ip(), addr.port())
}

/// Split `host`, `host:port`, `[v6]:port` or `ftp://host:port` into parts.
pub fn parse_host(raw: &str) -> Result<(String, u16), FtpError> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix("ftp://")
        .or_else(|| raw.strip_prefix("ftps://"))
        .unwrap_or(raw)
        .trim_end_matches('/');
    if raw.is_empty() {
        return Err(FtpError::protocol("empty server name"));
    }

    if let Some(rest) = raw.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| FtpError::protocol(format!("bad server name: {raw}")))?;
        let port = match tail.strip_prefix(':') {
            Some(port) => parse_port(port)?,
            None => DEFAULT_PORT,
        };
        return Ok((host.to_string(), port));
    }

    match raw.rsplit_once(':') {
        // A bare IPv6 address has several colons and no port.
        Some((host, port)) if !host.contains(':') => Ok((host.to_string(), parse_port(port)?)),
        _ => Ok((raw.to_string(), DEFAULT_PORT)),
    }
}

fn parse_port(port: &str) -> Result<u16, FtpError> {
    port.parse()
        .map_err(|_| FtpError::protocol(format!("bad port: {port}")))
}

/// Command text safe to log.
pub fn redact(command: &str) -> &str {
    if command
        .get(..4)
        .is_some_and(|verb| verb.eq_ignore_ascii_case("PASS"))
    {
        "PASS ***"
    } else {
        command
    }
}
