use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio_util::codec::{FramedRead, LinesCodec};
use uuid::Uuid;

use crate::reply::Reply;
use crate::Error;

pub struct Connection {
    pub id: Uuid,
    // Incoming bytes are framed into lines by the codec. The codec strips the
    // trailing `\n`; a leftover `\r` is stripped in `read_line`.
    lines: FramedRead<OwnedReadHalf, LinesCodec>,
    writer: OwnedWriteHalf,
}

impl Connection {
    pub fn new(stream: UnixStream) -> Connection {
        let (read_half, write_half) = stream.into_split();

        Connection {
            id: Uuid::new_v4(),
            lines: FramedRead::new(read_half, LinesCodec::new()),
            writer: write_half,
        }
    }

    /// The next request line, or `None` once the peer has closed its end.
    pub async fn read_line(&mut self) -> Result<Option<String>, Error> {
        match self.lines.next().await {
            None => Ok(None),
            Some(Ok(mut line)) => {
                if line.ends_with('\r') {
                    line.pop();
                }
                Ok(Some(line))
            }
            Some(Err(e)) => Err(e.into()),
        }
    }

    pub async fn write_reply(&mut self, reply: Reply) -> Result<(), Error> {
        let bytes: Vec<u8> = reply.into();
        self.writer.write_all(&bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_lines_and_strips_carriage_returns() {
        let (client, server) = UnixStream::pair().unwrap();
        let mut conn = Connection::new(server);

        let (_keep_read, mut client_writer) = client.into_split();
        client_writer.write_all(b"GET key1\r\nGET key2\n").await.unwrap();
        drop(client_writer);

        assert_eq!(conn.read_line().await.unwrap(), Some("GET key1".to_string()));
        assert_eq!(conn.read_line().await.unwrap(), Some("GET key2".to_string()));
        assert_eq!(conn.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn writes_replies_verbatim() {
        let (client, server) = UnixStream::pair().unwrap();
        let mut conn = Connection::new(server);

        conn.write_reply(Reply::Value("Alice".to_string()))
            .await
            .unwrap();
        drop(conn);

        let mut client_conn = Connection::new(client);
        assert_eq!(
            client_conn.read_line().await.unwrap(),
            Some("Alice".to_string())
        );
    }
}
