use log::*;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::time::{Duration, Instant};
use wsconduit::{ClientConfig, Connection, Message};

fn handle_connection(addr: &str) {
    let mut config = ClientConfig::default();
    config.timeout = Duration::from_secs(1);

    let mut conn = match Connection::connect(addr, config) {
        Ok(conn) => conn,
        Err(err) => {
            error!("Error when performing handshake: {}", err);
            return;
        }
    };

    let mut counter = 0;
    let mut next_send = Instant::now() + Duration::from_secs(5);

    loop {
        if Instant::now() >= next_send {
            let random_string = generate_random_string();
            if conn.send_message(Message::Text(random_string)).is_err() {
                eprintln!("Failed to send message");
                break;
            }
            next_send = Instant::now() + Duration::from_secs(5);
        }

        match conn.recv_message() {
            Ok(Some(message)) => {
                info!("Received message: {}", message.as_text().unwrap());
                counter += 1;
                if counter >= 3 {
                    if conn.disconnect().is_err() {
                        error!("Error occurred when closing connection");
                    }
                    break;
                }
            }
            Ok(None) => continue,
            Err(err) => {
                error!("Received error from the stream: {}", err);
                break;
            }
        }
    }
}

fn main() {
    env_logger::init();
    handle_connection("wss://localhost:9002");
}

fn generate_random_string() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}
