use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;

use camino::Utf8PathBuf;

use steam_grid_ripper::cdn::{AssetFetcher, CdnHttpClient, fetch_all_assets};
use steam_grid_ripper::config::{Config, ConfigLoader, Overrides, Settings};
use steam_grid_ripper::domain::{ArtworkRequest, AssetKind};

/// Serves the requested path back as the body, except for logos which 404.
fn spawn_cdn() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || serve(stream));
        }
    });
    addr
}

fn serve(mut stream: TcpStream) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) | Err(_) => break,
            Ok(_) if header == "\r\n" => break,
            Ok(_) => {}
        }
    }
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();
    let (status, body) = if path.ends_with("logo.png") {
        ("404 Not Found", b"missing".to_vec())
    } else {
        ("200 OK", path.clone().into_bytes())
    };
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

fn settings_for(addr: SocketAddr) -> Settings {
    let config = Config {
        cdn_base_url: Some(format!("http://{addr}")),
        timeout_secs: Some(5),
        ..Config::default()
    };
    ConfigLoader::resolve_config(config, None, Overrides::default())
}

#[test]
fn one_missing_endpoint_fails_exactly_one_asset() {
    let addr = spawn_cdn();
    let settings = settings_for(addr);
    let client = CdnHttpClient::new(&settings).unwrap();

    let temp = tempfile::tempdir().unwrap();
    let grid = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let request = ArtworkRequest {
        source: "271590".parse().unwrap(),
        target: "999999999".parse().unwrap(),
    };

    let report = fetch_all_assets(&client, &settings.cdn_base_url, &request, &grid);
    assert_eq!(report.assets.len(), 4);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_ok(AssetKind::Logo));

    let cover = std::fs::read(grid.join("999999999p.jpg").as_std_path()).unwrap();
    assert_eq!(cover, b"/steam/apps/271590/library_600x900_2x.jpg");
    let wide = &report.assets[&AssetKind::Wide];
    assert_eq!(wide.bytes, Some("/steam/apps/271590/library_411x184.jpg".len() as u64));
    assert!(grid.join("999999999_hero.jpg").as_std_path().exists());

    let logo = &report.assets[&AssetKind::Logo];
    assert!(logo.error.as_deref().unwrap_or_default().contains("404"));
    assert!(!grid.join("999999999_logo.png").as_std_path().exists());

    let leftovers = std::fs::read_dir(temp.path())
        .unwrap()
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().starts_with('.'))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn unreachable_host_is_a_failed_fetch_not_a_panic() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let settings = settings_for(addr);
    let client = CdnHttpClient::new(&settings).unwrap();

    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("1p.jpg");
    let result = client.fetch_asset(
        &format!("http://{addr}/steam/apps/1/library_600x900_2x.jpg"),
        &dest,
    );
    assert!(result.is_err());
    assert!(!dest.exists());
}
