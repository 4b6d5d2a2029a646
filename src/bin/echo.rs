use std::{io, net::{TcpListener, TcpStream}, thread};

use wave_ws::{accept, error::Error, Message};

fn main() -> io::Result<()> {
    let listener = TcpListener::bind("0.0.0.0:8080").expect("Could not bind to address");

    println!("Listening on ws://0.0.0.0:8080");

    for stream in listener.incoming() {
        let stream = stream?;
        thread::spawn(move || {
            if let Err(e) = handle_connection(stream) {
                eprintln!("Error handling connection: {e}");
            }
        });
    }

    Ok(())
}

fn handle_connection(stream: TcpStream) -> Result<(), Error> {
    let peer = stream.peer_addr()?;
    let mut ws = accept(stream)?;
    println!("{peer}: connected");

    loop {
        match ws.read_message() {
            Ok(Message::Close(status)) => {
                match status {
                    Some((code, reason)) => println!("{peer}: closed ({code} {reason})"),
                    None => println!("{peer}: closed"),
                }
                break;
            }
            Ok(Message::Ping(payload)) => ws.send(Message::Pong(payload))?,
            Ok(Message::Pong(_)) => {}
            Ok(msg) => {
                println!("{peer}: {msg}");
                ws.send(msg)?;
            }
            Err(Error::ConnectionClosed) => break,
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
