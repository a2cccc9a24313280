use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::broadcast,
};

use crate::{
    protocol::{execute, ERROR},
    RobotLink,
};

/// Serves the remote-control protocol for one robot. Connections are handled one at a
/// time, a second client waits until the first disconnects.
pub struct RemoteServer {
    listener: TcpListener,
}

impl RemoteServer {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind remote control port {}", addr))?;
        log::info!("Remote control listening on {}", addr);
        Ok(RemoteServer { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to get remote control address")
    }

    /// Accepts and serves sessions until `stop_rx` fires.
    pub async fn serve(
        self,
        link: impl RobotLink,
        mut stop_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        loop {
            let (stream, peer) = tokio::select! {
                _ = stop_rx.recv() => break,
                accepted = self.listener.accept() => {
                    accepted.context("Failed to accept remote connection")?
                }
            };

            log::info!("Remote session opened from {}", peer);
            tokio::select! {
                _ = stop_rx.recv() => break,
                result = serve_session(stream, &link) => {
                    if let Err(err) = result {
                        log::warn!("Remote session from {} failed: {:#}", peer, err);
                    }
                }
            }
            log::info!("Remote session from {} closed", peer);
        }

        log::info!("Remote control stopped");
        Ok(())
    }
}

/// Longest accepted command line in bytes, terminator included.
const MAX_LINE_LENGTH: u64 = 256;

/// One line read from a client.
#[derive(Debug, PartialEq)]
enum Line {
    Text(String),
    TooLong,
}

async fn serve_session(mut stream: TcpStream, link: &impl RobotLink) -> Result<()> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    while let Some(line) = read_line(&mut reader, &mut buf)
        .await
        .context("Failed to read from remote connection")?
    {
        let mut reply = match line {
            Line::Text(line) => execute(link, &line),
            Line::TooLong => {
                log::warn!("Rejected remote command longer than {} bytes", MAX_LINE_LENGTH);
                ERROR.to_owned()
            }
        };
        reply.push('\n');
        writer
            .write_all(reply.as_bytes())
            .await
            .context("Failed to write to remote connection")?;
    }
    Ok(())
}

/// Reads up to the next `\n`. Invalid UTF-8 is replaced rather than rejected, so it
/// reaches the parser and gets an `ERROR` reply. The rest of an overlong line is
/// skipped. Returns `None` at the end of the stream.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<Line>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let read = (&mut *reader)
        .take(MAX_LINE_LENGTH)
        .read_until(b'\n', buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }

    if buf.last() != Some(&b'\n') && read as u64 == MAX_LINE_LENGTH {
        loop {
            buf.clear();
            let skipped = (&mut *reader)
                .take(MAX_LINE_LENGTH)
                .read_until(b'\n', buf)
                .await?;
            if skipped == 0 || buf.last() == Some(&b'\n') {
                break;
            }
        }
        return Ok(Some(Line::TooLong));
    }

    let text = String::from_utf8_lossy(buf);
    let text = text.trim_end_matches(|c| c == '\r' || c == '\n');
    Ok(Some(Line::Text(text.to_owned())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::tests::MockLink;

    #[tokio::test]
    async fn test_serves_sessions_over_tcp() {
        let server = RemoteServer::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let link = MockLink::default();
        let (stop_tx, stop_rx) = broadcast::channel(1);
        let task = tokio::spawn(server.serve(link.clone(), stop_rx));

        for _ in 0..2 {
            let mut client = TcpStream::connect(addr).await.unwrap();
            client
                .write_all(b"WHEELS 10 20\nCAM\nPING\n")
                .await
                .unwrap();
            client.shutdown().await.unwrap();

            let mut replies = String::new();
            client.read_to_string(&mut replies).await.unwrap();
            assert_eq!(replies, "OK\n0 0\nERROR\n");
        }

        assert_eq!(*link.wheels.lock().unwrap(), vec![(0.1, 0.2); 2]);

        stop_tx.send(()).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bad_input_keeps_session_open() {
        let server = RemoteServer::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let link = MockLink::default();
        let (stop_tx, stop_rx) = broadcast::channel(1);
        let task = tokio::spawn(server.serve(link.clone(), stop_rx));

        let mut request = b"WHEELS \xff\xfe 1\nCAM\r\n".to_vec();
        request.extend(std::iter::repeat(b'X').take(1000));
        request.extend_from_slice(b"\nKICK\n");

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(&request).await.unwrap();
        client.shutdown().await.unwrap();

        let mut replies = String::new();
        client.read_to_string(&mut replies).await.unwrap();
        assert_eq!(replies, "ERROR\n0 0\nERROR\nOK\n");
        assert_eq!(*link.kicks.lock().unwrap(), 1);

        stop_tx.send(()).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_read_line_splits_and_caps() {
        let mut input: &[u8] = b"GOAL\r\nKI\xffCK\nlast";
        let mut buf = Vec::new();
        let mut lines = Vec::new();
        while let Some(line) = read_line(&mut input, &mut buf).await.unwrap() {
            lines.push(line);
        }
        assert_eq!(
            lines,
            vec![
                Line::Text("GOAL".to_owned()),
                Line::Text("KI\u{fffd}CK".to_owned()),
                Line::Text("last".to_owned()),
            ]
        );

        let long = vec![b'A'; 600];
        let mut input: &[u8] = &long;
        assert_eq!(
            read_line(&mut input, &mut buf).await.unwrap(),
            Some(Line::TooLong)
        );
        assert_eq!(read_line(&mut input, &mut buf).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_bind_failure_is_an_error() {
        let server = RemoteServer::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        assert!(RemoteServer::bind(addr).await.is_err());
    }
}
