//! End-to-end tests driving a live server instance over loopback sockets.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio_util::sync::CancellationToken;

use ferroftpd::config::Config;
use ferroftpd::core_auth::AnonymousProvider;
use ferroftpd::core_ftpcommand::handlers::CommandRegistry;
use ferroftpd::core_network::Connection;
use ferroftpd::core_vfs::OsVfs;

struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    root: tempfile::TempDir,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn start_server() -> TestServer {
    start_server_with(|_| {}).await
}

async fn start_server_with(tweak: impl FnOnce(&mut Config)) -> TestServer {
    let root = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.vfs.root_dir = root.path().to_string_lossy().to_string();
    config.pasv.pasv_address = String::from("127.0.0.1");
    // Port 0 makes every PASV listener grab a fresh ephemeral port.
    config.pasv.port_min = 0;
    config.pasv.port_max = 0;
    config.pasv.accept_timeout_secs = 5;
    config.pasv.connect_timeout_secs = 5;
    config.server.idle_timeout_secs = 30;
    tweak(&mut config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();

    let config = Arc::new(config);
    let registry = Arc::new(CommandRegistry::with_builtins());
    let membership = Arc::new(AnonymousProvider);
    let vfs = Arc::new(OsVfs::new(config.vfs.root_dir.clone()));

    let accept_shutdown = shutdown.clone();
    tokio::spawn(async move {
        loop {
            let accepted = tokio::select! {
                _ = accept_shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };
            let Ok((socket, _)) = accepted else { break };
            let connection = Connection::new(
                Arc::clone(&config),
                Arc::clone(&registry),
                membership.clone(),
                vfs.clone(),
                None,
                false,
            );
            tokio::spawn(connection.run(socket, accept_shutdown.clone()));
        }
    });

    TestServer {
        addr,
        shutdown,
        root,
    }
}

struct FtpClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl FtpClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        };
        let greeting = client.read_line().await;
        assert!(greeting.starts_with("220"), "greeting was {:?}", greeting);
        client
    }

    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await.unwrap();
        assert!(n > 0, "control connection closed unexpectedly");
        line.trim_end().to_string()
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }

    /// One command, one single-line reply.
    async fn cmd(&mut self, line: &str) -> String {
        self.send(line).await;
        self.read_line().await
    }

    /// Reads lines until the final line of a (possibly multi-line) reply
    /// with the given code.
    async fn read_until_final(&mut self, code: &str) -> String {
        let prefix = format!("{} ", code);
        loop {
            let line = self.read_line().await;
            if line.starts_with(&prefix) {
                return line;
            }
        }
    }

    async fn login(&mut self) {
        let reply = self.cmd("USER anonymous").await;
        assert!(reply.starts_with("331"), "USER reply was {:?}", reply);
        let reply = self.cmd("PASS x@y").await;
        assert!(reply.starts_with("230"), "PASS reply was {:?}", reply);
    }

    /// PASV, parse the advertised endpoint.
    async fn enter_passive(&mut self) -> SocketAddr {
        let reply = self.cmd("PASV").await;
        assert!(reply.starts_with("227"), "PASV reply was {:?}", reply);
        parse_pasv_reply(&reply)
    }
}

fn parse_pasv_reply(reply: &str) -> SocketAddr {
    let open = reply.find('(').unwrap();
    let close = reply.find(')').unwrap();
    let nums: Vec<u16> = reply[open + 1..close]
        .split(',')
        .map(|n| n.trim().parse().unwrap())
        .collect();
    assert_eq!(nums.len(), 6);
    let port = nums[4] * 256 + nums[5];
    format!("{}.{}.{}.{}:{}", nums[0], nums[1], nums[2], nums[3], port)
        .parse()
        .unwrap()
}

#[tokio::test]
async fn anonymous_login_and_passive_list() {
    let server = start_server().await;
    std::fs::write(server.root.path().join("hello.txt"), b"hi there").unwrap();
    std::fs::create_dir(server.root.path().join("sub")).unwrap();

    let mut client = FtpClient::connect(server.addr).await;
    client.login().await;

    let data_addr = client.enter_passive().await;
    let mut data = TcpStream::connect(data_addr).await.unwrap();

    let reply = client.cmd("LIST").await;
    assert!(reply.starts_with("150"), "LIST reply was {:?}", reply);

    let mut listing = String::new();
    data.read_to_string(&mut listing).await.unwrap();
    assert!(listing.contains("hello.txt"));
    assert!(listing.contains("sub"));
    assert!(listing.ends_with("\r\n"));

    let done = client.read_line().await;
    assert!(done.starts_with("226"), "completion was {:?}", done);
}

#[tokio::test]
async fn commands_require_login() {
    let server = start_server().await;
    let mut client = FtpClient::connect(server.addr).await;

    let reply = client.cmd("PASV").await;
    assert!(reply.starts_with("530"), "PASV reply was {:?}", reply);
    let reply = client.cmd("RETR secret").await;
    assert!(reply.starts_with("530"));

    // FEAT works before login.
    client.send("FEAT").await;
    let reply = client.read_until_final("211").await;
    assert!(reply.starts_with("211"));
}

#[tokio::test]
async fn unknown_and_oversize_commands() {
    let server = start_server().await;
    let mut client = FtpClient::connect(server.addr).await;

    let reply = client.cmd("XYZZY").await;
    assert!(reply.starts_with("500"), "unknown verb reply was {:?}", reply);

    let long = "A".repeat(4096);
    let reply = client.cmd(&long).await;
    assert_eq!(reply, "500 Command line too long.");

    // The parser resynchronised on the next line.
    let reply = client.cmd("NOOP").await;
    assert!(reply.starts_with("200"));
}

#[tokio::test]
async fn cwd_cannot_escape_chroot() {
    let server = start_server().await;
    std::fs::create_dir(server.root.path().join("inner")).unwrap();

    let mut client = FtpClient::connect(server.addr).await;
    client.login().await;

    let reply = client.cmd("CWD ..").await;
    assert!(reply.starts_with("550"), "escape reply was {:?}", reply);
    let reply = client.cmd("PWD").await;
    assert!(reply.contains("\"/\""), "PWD after escape was {:?}", reply);

    assert!(client.cmd("CWD inner").await.starts_with("250"));
    let reply = client.cmd("PWD").await;
    assert!(reply.contains("\"/inner\""));

    // Up to the root is fine, beyond it is not.
    assert!(client.cmd("CDUP").await.starts_with("250"));
    assert!(client.cmd("CDUP").await.starts_with("550"));
}

#[tokio::test]
async fn rename_sequence_and_interruption() {
    let server = start_server().await;
    std::fs::write(server.root.path().join("a"), b"payload").unwrap();

    let mut client = FtpClient::connect(server.addr).await;
    client.login().await;

    // RNFR followed by anything but RNTO drops the pending rename.
    assert!(client.cmd("RNFR a").await.starts_with("350"));
    assert!(client.cmd("NOOP").await.starts_with("200"));
    let reply = client.cmd("RNTO b").await;
    assert!(reply.starts_with("503"), "interrupted RNTO was {:?}", reply);

    assert!(client.cmd("RNFR a").await.starts_with("350"));
    assert!(client.cmd("RNTO b").await.starts_with("250"));
    assert!(client.cmd("SIZE b").await.starts_with("213"));
    assert!(client.cmd("SIZE a").await.starts_with("550"));
}

#[tokio::test]
async fn rest_plus_stor_places_bytes_at_offset() {
    let server = start_server().await;
    let mut client = FtpClient::connect(server.addr).await;
    client.login().await;

    assert!(client.cmd("TYPE I").await.starts_with("200"));
    let reply = client.cmd("REST 1024").await;
    assert!(reply.starts_with("350"), "REST reply was {:?}", reply);

    let data_addr = client.enter_passive().await;
    let mut data = TcpStream::connect(data_addr).await.unwrap();

    let reply = client.cmd("STOR f.bin").await;
    assert!(reply.starts_with("150"), "STOR reply was {:?}", reply);

    data.write_all(b"hello").await.unwrap();
    data.shutdown().await.unwrap();
    drop(data);

    let done = client.read_line().await;
    assert!(done.starts_with("226"), "completion was {:?}", done);

    let reply = client.cmd("SIZE f.bin").await;
    assert_eq!(reply, "213 1029");

    // REST was consumed; the next STOR starts from zero.
    let data_addr = client.enter_passive().await;
    let mut data = TcpStream::connect(data_addr).await.unwrap();
    assert!(client.cmd("STOR g.bin").await.starts_with("150"));
    data.write_all(b"xyz").await.unwrap();
    data.shutdown().await.unwrap();
    drop(data);
    assert!(client.read_line().await.starts_with("226"));
    assert_eq!(client.cmd("SIZE g.bin").await, "213 3");
}

#[tokio::test]
async fn retrieve_round_trip() {
    let server = start_server().await;
    std::fs::write(server.root.path().join("doc.bin"), b"0123456789").unwrap();

    let mut client = FtpClient::connect(server.addr).await;
    client.login().await;
    assert!(client.cmd("TYPE I").await.starts_with("200"));

    // Plain RETR.
    let data_addr = client.enter_passive().await;
    let mut data = TcpStream::connect(data_addr).await.unwrap();
    assert!(client.cmd("RETR doc.bin").await.starts_with("150"));
    let mut body = Vec::new();
    data.read_to_end(&mut body).await.unwrap();
    assert_eq!(body, b"0123456789");
    assert!(client.read_line().await.starts_with("226"));

    // RETR after REST returns the suffix only.
    assert!(client.cmd("REST 4").await.starts_with("350"));
    let data_addr = client.enter_passive().await;
    let mut data = TcpStream::connect(data_addr).await.unwrap();
    assert!(client.cmd("RETR doc.bin").await.starts_with("150"));
    let mut body = Vec::new();
    data.read_to_end(&mut body).await.unwrap();
    assert_eq!(body, b"456789");
    assert!(client.read_line().await.starts_with("226"));
}

#[tokio::test]
async fn ascii_type_translates_line_endings() {
    let server = start_server().await;
    std::fs::write(server.root.path().join("text.txt"), b"one\ntwo\n").unwrap();

    let mut client = FtpClient::connect(server.addr).await;
    client.login().await;
    // ASCII is the default type.

    let data_addr = client.enter_passive().await;
    let mut data = TcpStream::connect(data_addr).await.unwrap();
    assert!(client.cmd("RETR text.txt").await.starts_with("150"));
    let mut body = Vec::new();
    data.read_to_end(&mut body).await.unwrap();
    assert_eq!(body, b"one\r\ntwo\r\n");
    assert!(client.read_line().await.starts_with("226"));
}

#[tokio::test]
async fn abort_mid_retrieve() {
    let server = start_server().await;
    // Large enough that it can't fit in socket buffers.
    let big = vec![0u8; 16 * 1024 * 1024];
    std::fs::write(server.root.path().join("big.bin"), &big).unwrap();

    let mut client = FtpClient::connect(server.addr).await;
    client.login().await;
    assert!(client.cmd("TYPE I").await.starts_with("200"));

    let data_addr = client.enter_passive().await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    assert!(client.cmd("RETR big.bin").await.starts_with("150"));

    // Don't read the data connection; the sender backs up, then we abort.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let reply = client.cmd("ABOR").await;
    assert!(reply.starts_with("426"), "first ABOR reply was {:?}", reply);
    let reply = client.read_line().await;
    assert!(reply.starts_with("226"), "second ABOR reply was {:?}", reply);
    drop(data);

    // The control channel is still healthy.
    assert!(client.cmd("NOOP").await.starts_with("200"));
    assert!(client.cmd("SIZE big.bin").await.starts_with("213"));
}

#[tokio::test]
async fn passive_peer_check_rejects_other_addresses() {
    let server = start_server().await;
    std::fs::write(server.root.path().join("f"), b"data").unwrap();

    let mut client = FtpClient::connect(server.addr).await;
    client.login().await;

    let data_addr = client.enter_passive().await;

    // Dial the data port from 127.0.0.2 while the control connection came
    // from 127.0.0.1.
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.2:0".parse().unwrap()).unwrap();
    let mut rogue = socket.connect(data_addr).await.unwrap();

    assert!(client.cmd("RETR f").await.starts_with("150"));
    let reply = client.read_line().await;
    assert!(reply.starts_with("425"), "rogue-peer reply was {:?}", reply);

    // The rogue socket was closed without any file bytes.
    let mut sink = Vec::new();
    let n = rogue.read_to_end(&mut sink).await.unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn auth_tls_without_certificate_is_rejected() {
    let server = start_server().await;
    let mut client = FtpClient::connect(server.addr).await;

    let reply = client.cmd("AUTH TLS").await;
    assert!(reply.starts_with("534"), "AUTH reply was {:?}", reply);
    let reply = client.cmd("AUTH KERBEROS").await;
    assert!(reply.starts_with("504"));

    // PBSZ/PROT insist on the secured channel.
    assert!(client.cmd("PBSZ 0").await.starts_with("503"));
}

#[tokio::test]
async fn stat_and_quit() {
    let server = start_server().await;
    let mut client = FtpClient::connect(server.addr).await;
    client.login().await;

    client.send("STAT").await;
    let reply = client.read_until_final("211").await;
    assert!(reply.starts_with("211"));

    let reply = client.cmd("QUIT").await;
    assert!(reply.starts_with("221"));

    let mut rest = String::new();
    let n = client.reader.read_line(&mut rest).await.unwrap_or(0);
    assert_eq!(n, 0, "server should close after QUIT");
}

#[tokio::test]
async fn mkd_dele_and_machine_listings() {
    let server = start_server().await;
    std::fs::write(server.root.path().join("keep.txt"), b"abc").unwrap();

    let mut client = FtpClient::connect(server.addr).await;
    client.login().await;

    assert!(client.cmd("MKD box").await.starts_with("257"));

    client.send("MLST keep.txt").await;
    let reply = client.read_until_final("250").await;
    assert!(reply.starts_with("250"));

    let data_addr = client.enter_passive().await;
    let mut data = TcpStream::connect(data_addr).await.unwrap();
    assert!(client.cmd("MLSD").await.starts_with("150"));
    let mut listing = String::new();
    data.read_to_string(&mut listing).await.unwrap();
    assert!(listing.contains("type=dir;"));
    assert!(listing.contains("keep.txt"));
    assert!(client.read_line().await.starts_with("226"));

    assert!(client.cmd("DELE keep.txt").await.starts_with("250"));
    assert!(client.cmd("SIZE keep.txt").await.starts_with("550"));
    assert!(client.cmd("RMD box").await.starts_with("250"));
}
