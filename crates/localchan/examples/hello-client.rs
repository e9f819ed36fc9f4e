//! Greets a local service by name.
//!
//! Run with:
//!   cargo run --example hello-client -- svc bob
//!
//! The client waits for `/tmp/svc.sock` (or `\\.\pipe\svc`) to appear, sends
//! `{"name":"bob"}` and prints the `message` field of the reply. On Unix,
//! pass `--demo` as the first argument to host a throwaway greeter in the
//! same process.

use localchan::{connect, ChannelName, Client};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct Greet {
    name: String,
}

#[derive(Deserialize)]
struct Reply {
    message: String,
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), BoxError> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let demo = args.first().is_some_and(|arg| arg == "--demo");
    if demo {
        args.remove(0);
    }
    let service = args.first().map(String::as_str).unwrap_or("svc");
    let who = args.get(1).map(String::as_str).unwrap_or("bob");

    let name = ChannelName::new(service)?;
    let server = if demo { Some(demo::spawn(&name)?) } else { None };

    eprintln!("dialing {name} (retrying every 100ms until it is up)");
    let mut client: Client<Greet, Reply> = connect(&name)?;
    let reply = client.send(&Greet { name: who.into() })?;
    println!("{}", reply.message);
    client.close();

    if let Some(server) = server {
        server.join().map_err(|_| "demo greeter panicked")??;
    }
    Ok(())
}

#[cfg(unix)]
mod demo {
    use std::os::unix::net::UnixListener;
    use std::thread::{self, JoinHandle};

    use localchan::frame::FramedChannel;
    use localchan::{ChannelName, Endpoint};

    use super::BoxError;

    pub fn spawn(name: &ChannelName) -> Result<JoinHandle<Result<(), BoxError>>, BoxError> {
        let address = Endpoint::resolve(name)?.address().to_path_buf();
        let _ = std::fs::remove_file(&address);
        let listener = UnixListener::bind(&address)?;

        Ok(thread::spawn(move || -> Result<(), BoxError> {
            let (stream, _) = listener.accept()?;
            let mut channel = FramedChannel::new(stream);
            while let Ok(request) = channel.read_message() {
                let request: serde_json::Value = serde_json::from_slice(&request)?;
                let who = request["name"].as_str().unwrap_or("stranger");
                let reply = serde_json::json!({ "message": format!("hello {who}") });
                channel.write_message(&serde_json::to_vec(&reply)?)?;
            }
            let _ = std::fs::remove_file(&address);
            Ok(())
        }))
    }
}

#[cfg(not(unix))]
mod demo {
    use std::thread::JoinHandle;

    use localchan::ChannelName;

    use super::BoxError;

    pub fn spawn(_name: &ChannelName) -> Result<JoinHandle<Result<(), BoxError>>, BoxError> {
        Err("--demo hosts a Unix socket greeter and is only available on Unix".into())
    }
}
